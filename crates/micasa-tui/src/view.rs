// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Per-tab table state plus the undo history, and the glue that turns a
//! key-level action into handler calls and rendered lines.

use micasa_app::{EntityStore, FormDraft, FormTarget, HouseProfile, TabKind};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use crate::columns::{ColumnModel, take_cells};
use crate::handlers::{HandlerError, HandlerResult, RowMeta, TableRows, handler_for, tab_handler};
use crate::house::{start_house_form, submit_house_form};
use crate::layout::{LayoutError, Separator, TableLayout, compute_layout};
use crate::stacks::{LadleChrome, render_connector, render_ladle_bottom, render_stack_lines};
use crate::undo::{UndoRestoreError, UndoStack};

pub const ALL_HIDDEN_MESSAGE: &str = "all columns hidden -- press C to show them";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    ColumnHidden(String),
    KeepOneColumnVisible,
    ColumnsShown,
    NoRowSelected,
    Deleted(String),
    Restored(String),
    Saved(String),
    Undone(String),
    NothingToUndo,
}

impl ViewStatus {
    pub fn message(&self) -> String {
        match self {
            Self::ColumnHidden(label) => format!("column hidden: {label}"),
            Self::KeepOneColumnVisible => "keep one column visible".to_owned(),
            Self::ColumnsShown => "all columns shown".to_owned(),
            Self::NoRowSelected => "no row selected".to_owned(),
            Self::Deleted(description) => format!("deleted {description}"),
            Self::Restored(description) => format!("restored {description}"),
            Self::Saved(description) => format!("saved {description}"),
            Self::Undone(description) => format!("undid {description}"),
            Self::NothingToUndo => "nothing to undo".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub tab: TabKind,
    pub columns: ColumnModel,
    pub rows: TableRows,
    pub selected_row: usize,
    /// Full column index, always a visible column while any is visible.
    pub selected_col: usize,
}

impl TableView {
    pub fn new(tab: TabKind) -> Self {
        Self {
            tab,
            columns: ColumnModel::new(tab_handler(tab).columns()),
            rows: TableRows::default(),
            selected_row: 0,
            selected_col: 0,
        }
    }

    pub fn selected_meta(&self) -> Option<RowMeta> {
        self.rows.meta.get(self.selected_row).copied()
    }

    pub fn layout(&self, width: u16) -> Result<TableLayout, LayoutError> {
        compute_layout(self.columns.specs(), width)
    }

    /// Data rows that fit in `height` lines after the header, divider and
    /// stack chrome.
    pub fn body_rows(&self, width: u16, height: u16) -> usize {
        let chrome = self.layout(width).map_or(0, |layout| {
            let depth = layout
                .stacks
                .iter()
                .map(|stack| stack.entries.len())
                .max()
                .unwrap_or(0);
            let connector = usize::from(layout.stacks.iter().any(|stack| !stack.edge));
            let bottom = usize::from(layout.leading || layout.trailing);
            depth + connector + bottom
        });
        usize::from(height).saturating_sub(2 + chrome)
    }

    pub fn move_row(&mut self, delta: isize) {
        let row_count = self.rows.len();
        if row_count == 0 {
            self.selected_row = 0;
            return;
        }
        let next = if delta.is_negative() {
            self.selected_row.saturating_sub(delta.unsigned_abs())
        } else {
            self.selected_row.saturating_add(delta.unsigned_abs())
        };
        self.selected_row = next.min(row_count - 1);
    }

    pub fn jump_first_row(&mut self) {
        self.selected_row = 0;
    }

    pub fn jump_last_row(&mut self) {
        self.selected_row = self.rows.len().saturating_sub(1);
    }

    /// Steps across visible columns only.
    pub fn move_col(&mut self, delta: isize) {
        let visible = self.columns.vis_to_full();
        let Some(position) = visible_position(&visible, self.selected_col) else {
            return;
        };
        let next = if delta.is_negative() {
            position.saturating_sub(delta.unsigned_abs())
        } else {
            position.saturating_add(delta.unsigned_abs())
        };
        self.selected_col = visible[next.min(visible.len() - 1)];
    }

    pub fn jump_first_col(&mut self) {
        if let Some(first) = self.columns.vis_to_full().first() {
            self.selected_col = *first;
        }
    }

    pub fn jump_last_col(&mut self) {
        if let Some(last) = self.columns.vis_to_full().last() {
            self.selected_col = *last;
        }
    }

    pub fn hide_selected_column(&mut self) -> ViewStatus {
        if self.columns.visible_count() <= 1 {
            return ViewStatus::KeepOneColumnVisible;
        }
        self.coerce_selected_col();
        let label = self
            .columns
            .title(self.selected_col)
            .unwrap_or("column")
            .to_owned();
        self.columns.hide(self.selected_col);
        self.coerce_selected_col();
        ViewStatus::ColumnHidden(label)
    }

    pub fn show_all_columns(&mut self) -> ViewStatus {
        self.columns.show_all();
        self.coerce_selected_col();
        ViewStatus::ColumnsShown
    }

    fn clamp_cursor(&mut self) {
        self.selected_row = self.selected_row.min(self.rows.len().saturating_sub(1));
        self.coerce_selected_col();
    }

    fn coerce_selected_col(&mut self) {
        let visible = self.columns.vis_to_full();
        if let Some(position) = visible_position(&visible, self.selected_col) {
            self.selected_col = visible[position];
        }
    }

    /// Header, divider, the rows that fit in `body_rows`, then the collapsed
    /// stack chrome. Every line is framed by the ladle rails when edge
    /// stacks exist.
    pub fn render_lines(
        &self,
        width: u16,
        body_rows: usize,
    ) -> Result<Vec<Line<'static>>, LayoutError> {
        let layout = self.layout(width)?;
        if layout.columns.is_empty() {
            return Ok(vec![Line::from(Span::styled(
                ALL_HIDDEN_MESSAGE,
                Style::default().fg(Color::DarkGray),
            ))]);
        }

        let chrome = LadleChrome::new(layout.leading, layout.trailing);
        let column_space = layout.total_width;
        let mut lines = Vec::new();

        let header_style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        let header = row_line(&layout, |column| {
            let title = self.columns.title(column).unwrap_or_default();
            (title.to_owned(), header_style)
        });
        lines.push(chrome.wrap(header, column_space));
        lines.push(chrome.wrap(divider_line(&layout), column_space));

        let (start, end) = row_window(self.selected_row, self.rows.len(), body_rows);
        for row_index in start..end {
            let deleted = self.rows.meta[row_index].deleted;
            let selected = row_index == self.selected_row;
            let cells = &self.rows.cells[row_index];
            let line = row_line(&layout, |column| {
                let text = cells.get(column).cloned().unwrap_or_default();
                (text, cell_style(deleted, selected, selected && column == self.selected_col))
            });
            lines.push(chrome.wrap(line, column_space));
        }

        if let Some(connector) = render_connector(&layout.stacks) {
            lines.push(chrome.wrap(connector, column_space));
        }
        for stack_line in render_stack_lines(&layout.stacks) {
            lines.push(chrome.wrap(stack_line, column_space));
        }
        if let Some(bottom) = render_ladle_bottom(&layout.stacks, chrome, column_space) {
            lines.push(bottom);
        }
        Ok(lines)
    }
}

fn visible_position(visible: &[usize], selected: usize) -> Option<usize> {
    if visible.is_empty() {
        return None;
    }
    Some(match visible.binary_search(&selected) {
        Ok(position) => position,
        Err(position) => position.min(visible.len() - 1),
    })
}

fn row_window(selected: usize, row_count: usize, body_rows: usize) -> (usize, usize) {
    if body_rows == 0 || row_count == 0 {
        return (0, 0);
    }
    let start = (selected + 1).saturating_sub(body_rows);
    (start, (start + body_rows).min(row_count))
}

fn cell_style(deleted: bool, selected_row: bool, selected_cell: bool) -> Style {
    if selected_cell {
        return Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
    }
    let mut style = Style::default();
    if deleted {
        style = style
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT);
    }
    if selected_row {
        style = style.bg(Color::DarkGray);
    }
    style
}

fn separator_span(separator: Separator) -> Span<'static> {
    match separator {
        Separator::Plain => Span::styled(" │ ", Style::default().fg(Color::DarkGray)),
        Separator::Collapsed => Span::styled(" ⋯ ", Style::default().fg(Color::Magenta)),
    }
}

fn row_line(layout: &TableLayout, mut cell: impl FnMut(usize) -> (String, Style)) -> Line<'static> {
    let mut spans = Vec::with_capacity(layout.columns.len() * 2);
    for (position, column) in layout.columns.iter().enumerate() {
        if position > 0 {
            let separator = layout
                .separators
                .get(position - 1)
                .copied()
                .unwrap_or(Separator::Plain);
            spans.push(separator_span(separator));
        }
        let (text, style) = cell(column.full_index);
        spans.push(Span::styled(fit(&text, column.width), style));
    }
    Line::from(spans)
}

fn divider_line(layout: &TableLayout) -> Line<'static> {
    let text = layout
        .columns
        .iter()
        .map(|column| "─".repeat(usize::from(column.width)))
        .collect::<Vec<_>>()
        .join("─┼─");
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

/// Pads or truncates to exactly `width` terminal cells. Truncation ends in `…`.
fn fit(value: &str, width: u16) -> String {
    let width = usize::from(width);
    let used = value.width();
    if used <= width {
        return format!("{value}{}", " ".repeat(width - used));
    }
    if width == 0 {
        return String::new();
    }
    let (head, head_width) = take_cells(value, width - 1);
    format!("{head}…{}", " ".repeat(width - 1 - head_width))
}

#[derive(Debug, Clone)]
pub struct View {
    tables: Vec<TableView>,
    undo: UndoStack,
    house: Option<HouseProfile>,
}

impl View {
    pub fn new(undo_limit: usize) -> Self {
        Self {
            tables: TabKind::ALL.into_iter().map(TableView::new).collect(),
            undo: UndoStack::new(undo_limit),
            house: None,
        }
    }

    pub fn table(&self, tab: TabKind) -> &TableView {
        &self.tables[tab.index()]
    }

    pub fn table_mut(&mut self, tab: TabKind) -> &mut TableView {
        &mut self.tables[tab.index()]
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    /// The profile as of the last refresh.
    pub fn house(&self) -> Option<&HouseProfile> {
        self.house.as_ref()
    }

    pub fn refresh(
        &mut self,
        store: &dyn EntityStore,
        tab: TabKind,
        include_deleted: bool,
    ) -> HandlerResult<()> {
        self.house = store.get_house_profile().map_err(HandlerError::classify)?;
        let handler = tab_handler(tab);
        let table = self.table_mut(tab);
        handler.sync_fixed_values(store, &mut table.columns)?;
        table.rows = handler.load(store, include_deleted)?;
        table.clamp_cursor();
        debug!(tab = tab.label(), rows = table.rows.len(), "table refreshed");
        Ok(())
    }

    /// Deletes the selected row, or restores it when it is already deleted.
    /// The prior state is pushed onto the undo stack first.
    pub fn toggle_delete_selected(
        &mut self,
        store: &dyn EntityStore,
        tab: TabKind,
    ) -> HandlerResult<ViewStatus> {
        let Some(meta) = self.table(tab).selected_meta() else {
            return Ok(ViewStatus::NoRowSelected);
        };
        let handler = tab_handler(tab);
        let snapshot = handler.snapshot(store, meta.id);
        let description = snapshot.as_ref().map_or_else(
            || format!("{} {}", handler.form_kind().noun(), meta.id),
            |entry| entry.description.clone(),
        );
        let pushed = snapshot.is_some();
        if let Some(entry) = snapshot {
            self.undo.push(entry);
        }

        let result = if meta.deleted {
            handler.restore(store, meta.id)
        } else {
            handler.delete(store, meta.id)
        };
        if let Err(error) = result {
            if pushed {
                self.undo.discard_latest();
            }
            warn!(
                kind = handler.form_kind().noun(),
                id = meta.id,
                error = %error,
                "lifecycle change failed"
            );
            return Err(error);
        }

        Ok(if meta.deleted {
            ViewStatus::Restored(description)
        } else {
            ViewStatus::Deleted(description)
        })
    }

    pub fn undo(&mut self, store: &dyn EntityStore) -> Result<ViewStatus, UndoRestoreError> {
        Ok(match self.undo.undo(store)? {
            Some(entry) => ViewStatus::Undone(entry.description),
            None => ViewStatus::NothingToUndo,
        })
    }

    pub fn start_add_form(
        &self,
        store: &dyn EntityStore,
        tab: TabKind,
    ) -> HandlerResult<FormDraft> {
        tab_handler(tab).start_add_form(store)
    }

    pub fn start_house_form(&self, store: &dyn EntityStore) -> HandlerResult<FormDraft> {
        start_house_form(store)
    }

    pub fn start_edit_form(
        &self,
        store: &dyn EntityStore,
        tab: TabKind,
    ) -> HandlerResult<FormDraft> {
        let meta = self.selected_or_err(tab)?;
        tab_handler(tab).start_edit_form(store, meta.id)
    }

    pub fn start_inline_edit(
        &self,
        store: &dyn EntityStore,
        tab: TabKind,
    ) -> HandlerResult<FormDraft> {
        let meta = self.selected_or_err(tab)?;
        let column = self.table(tab).selected_col;
        tab_handler(tab).inline_edit(store, meta.id, column)
    }

    /// Persists a draft. Edits snapshot the row first so they can be undone.
    /// House profile saves are not undoable.
    pub fn submit_form(
        &mut self,
        store: &dyn EntityStore,
        draft: &FormDraft,
    ) -> HandlerResult<ViewStatus> {
        let Some(handler) = handler_for(draft.kind) else {
            submit_house_form(store, draft)?;
            self.house = store.get_house_profile().map_err(HandlerError::classify)?;
            return Ok(ViewStatus::Saved(draft.kind.noun().to_owned()));
        };
        let pushed = match draft.target {
            FormTarget::Edit(id) => match handler.snapshot(store, id) {
                Some(entry) => {
                    self.undo.push(entry);
                    true
                }
                None => false,
            },
            FormTarget::Create => false,
        };

        match handler.submit_form(store, draft) {
            Ok(id) => Ok(ViewStatus::Saved(format!("{} {id}", draft.kind.noun()))),
            Err(error) => {
                if pushed {
                    self.undo.discard_latest();
                }
                Err(error)
            }
        }
    }

    /// `undo(2): restore project "Kitchen remodel"` or `None` when empty.
    pub fn undo_summary(&self) -> Option<String> {
        self.undo.latest().map(|entry| {
            format!(
                "undo({}): restore {}",
                self.undo.len(),
                entry.description
            )
        })
    }

    fn selected_or_err(&self, tab: TabKind) -> HandlerResult<RowMeta> {
        self.table(tab)
            .selected_meta()
            .ok_or_else(|| HandlerError::Validation("no row selected".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::{TableView, ViewStatus, fit, row_window};
    use crate::handlers::{RowMeta, TableRows};
    use crate::stacks::plain_text;
    use micasa_app::TabKind;
    use ratatui::text::Line;

    fn vendor_table(rows: usize) -> TableView {
        let mut table = TableView::new(TabKind::Vendors);
        table.rows = TableRows {
            cells: (1..=rows)
                .map(|id| {
                    vec![
                        id.to_string(),
                        format!("Vendor {id}"),
                        String::new(),
                        String::new(),
                        String::new(),
                        String::new(),
                    ]
                })
                .collect(),
            meta: (1..=rows)
                .map(|id| RowMeta {
                    id: id as i64,
                    deleted: false,
                })
                .collect(),
        };
        table
    }

    #[test]
    fn hiding_last_visible_column_is_refused() {
        let mut table = vendor_table(1);
        for _ in 0..5 {
            assert!(matches!(
                table.hide_selected_column(),
                ViewStatus::ColumnHidden(_)
            ));
        }
        assert_eq!(table.columns.visible_count(), 1);
        assert_eq!(
            table.hide_selected_column(),
            ViewStatus::KeepOneColumnVisible
        );
        assert_eq!(table.columns.vis_to_full(), vec![table.selected_col]);
    }

    #[test]
    fn column_cursor_skips_hidden_columns() {
        let mut table = vendor_table(1);
        table.selected_col = 1;
        assert_eq!(
            table.hide_selected_column(),
            ViewStatus::ColumnHidden("Name".to_owned())
        );
        assert_eq!(table.selected_col, 2);
        table.move_col(-1);
        assert_eq!(table.selected_col, 0);
        table.jump_last_col();
        assert_eq!(table.selected_col, 5);
        table.move_col(3);
        assert_eq!(table.selected_col, 5);
    }

    #[test]
    fn row_cursor_clamps_to_rows() {
        let mut table = vendor_table(3);
        table.move_row(10);
        assert_eq!(table.selected_row, 2);
        table.move_row(-10);
        assert_eq!(table.selected_row, 0);
        table.jump_last_row();
        assert_eq!(table.selected_row, 2);
    }

    #[test]
    fn render_lines_include_stack_chrome() -> anyhow::Result<()> {
        let mut table = vendor_table(2);
        table.selected_col = 2;
        table.hide_selected_column();
        let lines = table.render_lines(120, 10)?;
        let text = lines.iter().map(plain_text).collect::<Vec<_>>();

        assert!(text[0].contains("ID"));
        assert!(text[0].contains(" ⋯ "));
        assert!(text[2].contains("Vendor 1"));
        assert!(text.iter().any(|line| line.contains("Contact")));
        assert!(text.iter().any(|line| line.trim() == "│"));
        Ok(())
    }

    #[test]
    fn all_hidden_renders_fallback() -> anyhow::Result<()> {
        let mut table = vendor_table(1);
        for index in 0..table.columns.len() {
            table.columns.hide(index);
        }
        let lines = table.render_lines(80, 5)?;
        assert_eq!(lines.len(), 1);
        assert!(plain_text(&lines[0]).contains("press C"));
        Ok(())
    }

    #[test]
    fn row_window_keeps_selection_visible() {
        assert_eq!(row_window(0, 50, 10), (0, 10));
        assert_eq!(row_window(25, 50, 10), (16, 26));
        assert_eq!(row_window(3, 2, 10), (0, 2));
        assert_eq!(row_window(0, 0, 10), (0, 0));
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 4), "abc…");
        assert_eq!(fit("abc", 0), "");
    }

    #[test]
    fn fit_measures_terminal_cells() {
        let clipped = fit("東京電力", 4);
        assert_eq!(clipped, "東… ");
        assert_eq!(Line::from(clipped).width(), 4);
        assert_eq!(fit("東京", 5), "東京 ");
        assert_eq!(Line::from(fit("東京電力", 5)).width(), 5);
    }
}
