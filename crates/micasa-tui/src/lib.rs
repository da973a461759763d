// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod columns;
pub mod handlers;
pub mod house;
pub mod layout;
pub mod logs;
pub mod stacks;
pub mod undo;
pub mod view;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use micasa_app::{
    AppCommand, AppEvent, AppMode, AppState, EntityStore, FormDraft, FormTarget, TabKind,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

use crate::logs::{LogBuffer, LogPane};
use crate::view::{TableView, View, ViewStatus};

const HALF_PAGE_ROWS: isize = 10;
const FULL_PAGE_ROWS: isize = 20;

const NAV_HINTS: &str = "j/k/h/l g/G ^/$ | f/b tabs | c/C cols | i edit | L logs | q quit";
const EDIT_HINTS: &str =
    "a add | e/E edit | d del/restore | u undo | x deleted | p house | esc nav";
const FORM_HINTS: &str = "tab/shift+tab field | enter save | esc cancel";
const LOG_HINTS: &str = "type to filter | up/down scroll | esc close";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableCommand {
    MoveRow(isize),
    MoveColumn(isize),
    MoveHalfPageDown,
    MoveHalfPageUp,
    MoveFullPageDown,
    MoveFullPageUp,
    JumpFirstRow,
    JumpLastRow,
    JumpFirstColumn,
    JumpLastColumn,
    HideCurrentColumn,
    ShowAllColumns,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone)]
struct ViewData {
    view: View,
    status_token: u64,
    logs: LogBuffer,
    /// `Some` while the log overlay is open.
    log_pane: Option<LogPane>,
}

impl ViewData {
    fn new(undo_limit: usize, logs: LogBuffer) -> Self {
        Self {
            view: View::new(undo_limit),
            status_token: 0,
            logs,
            log_pane: None,
        }
    }
}

/// Runs the terminal UI until the user quits. `logs` is the buffer the
/// tracing subscriber writes into, shown by the log overlay.
pub fn run_app(
    state: &mut AppState,
    store: &dyn EntityStore,
    undo_limit: usize,
    logs: LogBuffer,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(undo_limit, logs);
    let (internal_tx, internal_rx) = mpsc::channel();
    refresh_active(state, store, &mut view_data, &internal_tx);
    info!(tab = state.active_tab.label(), undo_limit, "tui started");

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, store, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    info!("tui stopped");
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn refresh_active(
    state: &mut AppState,
    store: &dyn EntityStore,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = view_data
        .view
        .refresh(store, state.active_tab, state.show_deleted)
    {
        error!(tab = state.active_tab.label(), error = %error, "table load failed");
        emit_status(state, view_data, internal_tx, format!("load failed: {error}"));
        return;
    }
    check_layout(state, view_data, internal_tx);
}

/// Column specs only change on refresh and hide/show, so a malformed set is
/// reported there rather than on every frame.
fn check_layout(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(layout_error) = view_data.view.table(state.active_tab).layout(u16::MAX) {
        error!(tab = state.active_tab.label(), error = %layout_error, "invalid column layout");
        emit_status(state, view_data, internal_tx, format!("layout error: {layout_error}"));
    }
}

fn dispatch_and_refresh(
    state: &mut AppState,
    store: &dyn EntityStore,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    if events.iter().any(|event| {
        matches!(
            event,
            AppEvent::TabChanged(_) | AppEvent::DeletedFilterChanged(_) | AppEvent::FormSubmitted(_)
        )
    }) {
        refresh_active(state, store, view_data, internal_tx);
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn handle_key_event(
    state: &mut AppState,
    store: &dyn EntityStore,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if let Some(pane) = view_data.log_pane.as_mut() {
        if handle_log_key(pane, key) {
            view_data.log_pane = None;
        }
        return false;
    }

    if matches!(state.mode, AppMode::Form(_)) {
        handle_form_key(state, store, view_data, internal_tx, key);
        return false;
    }

    if handle_table_key(state, view_data, internal_tx, key) {
        return false;
    }

    match (state.mode, key.code, key.modifiers) {
        (_, KeyCode::Char('f'), KeyModifiers::NONE) => {
            dispatch_and_refresh(state, store, view_data, AppCommand::NextTab, internal_tx);
        }
        (_, KeyCode::Char('b'), KeyModifiers::NONE) => {
            dispatch_and_refresh(state, store, view_data, AppCommand::PrevTab, internal_tx);
        }
        (AppMode::Nav, KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (AppMode::Nav, KeyCode::Char('i'), KeyModifiers::NONE) => {
            dispatch_and_refresh(state, store, view_data, AppCommand::EnterEditMode, internal_tx);
        }
        (AppMode::Nav, KeyCode::Char('L'), _) => {
            view_data.log_pane = Some(LogPane::default());
        }
        (AppMode::Edit, KeyCode::Esc, _) => {
            dispatch_and_refresh(state, store, view_data, AppCommand::ExitToNav, internal_tx);
        }
        (AppMode::Edit, KeyCode::Char('x'), KeyModifiers::NONE) => {
            dispatch_and_refresh(state, store, view_data, AppCommand::ToggleDeleted, internal_tx);
        }
        (AppMode::Edit, KeyCode::Char('a'), KeyModifiers::NONE) => {
            let draft = view_data.view.start_add_form(store, state.active_tab);
            open_form(state, store, view_data, internal_tx, draft);
        }
        (AppMode::Edit, KeyCode::Char('e'), KeyModifiers::NONE) => {
            let draft = view_data.view.start_inline_edit(store, state.active_tab);
            open_form(state, store, view_data, internal_tx, draft);
        }
        (AppMode::Edit, KeyCode::Char('E'), _) => {
            let draft = view_data.view.start_edit_form(store, state.active_tab);
            open_form(state, store, view_data, internal_tx, draft);
        }
        (AppMode::Edit, KeyCode::Char('p'), KeyModifiers::NONE) => {
            let draft = view_data.view.start_house_form(store);
            open_form(state, store, view_data, internal_tx, draft);
        }
        (AppMode::Edit, KeyCode::Char('d'), KeyModifiers::NONE) => {
            let outcome = view_data
                .view
                .toggle_delete_selected(store, state.active_tab);
            match outcome {
                Ok(status) => {
                    refresh_active(state, store, view_data, internal_tx);
                    emit_status(state, view_data, internal_tx, status.message());
                }
                Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
            }
        }
        (AppMode::Edit, KeyCode::Char('u'), KeyModifiers::NONE) => {
            match view_data.view.undo(store) {
                Ok(status) => {
                    if status != ViewStatus::NothingToUndo {
                        refresh_active(state, store, view_data, internal_tx);
                    }
                    emit_status(state, view_data, internal_tx, status.message());
                }
                Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
            }
        }
        _ => {}
    }
    false
}

fn open_form(
    state: &mut AppState,
    store: &dyn EntityStore,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    draft: handlers::HandlerResult<FormDraft>,
) {
    match draft {
        Ok(draft) => {
            dispatch_and_refresh(state, store, view_data, AppCommand::OpenForm(draft), internal_tx);
        }
        Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
    }
}

fn handle_form_key(
    state: &mut AppState,
    store: &dyn EntityStore,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            dispatch_and_refresh(state, store, view_data, AppCommand::CancelForm, internal_tx);
        }
        (KeyCode::Enter, _) => submit_open_form(state, store, view_data, internal_tx),
        (KeyCode::Tab, _) => {
            if let Some(form) = state.form.as_mut() {
                form.focus_next();
            }
        }
        (KeyCode::BackTab, _) => {
            if let Some(form) = state.form.as_mut() {
                form.focus_prev();
            }
        }
        (KeyCode::Backspace, _) => {
            if let Some(form) = state.form.as_mut() {
                form.pop_char();
            }
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(form) = state.form.as_mut() {
                form.push_char(ch);
            }
        }
        _ => {}
    }
}

fn submit_open_form(
    state: &mut AppState,
    store: &dyn EntityStore,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(draft) = state.form.clone() else {
        return;
    };
    match view_data.view.submit_form(store, &draft) {
        Ok(status) => {
            dispatch_and_refresh(state, store, view_data, AppCommand::CompleteForm, internal_tx);
            emit_status(state, view_data, internal_tx, status.message());
        }
        Err(error) => {
            let action = match draft.target {
                FormTarget::Create => "add",
                FormTarget::Edit(_) => "edit",
            };
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{action} {} failed: {error}", draft.kind.noun()),
            );
        }
    }
}

/// Returns `true` when the overlay should close.
fn handle_log_key(pane: &mut LogPane, key: KeyEvent) -> bool {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => return true,
        (KeyCode::Up, _) => pane.scroll_back(1),
        (KeyCode::Down, _) => pane.scroll_forward(1),
        (KeyCode::PageUp, _) => pane.scroll_back(FULL_PAGE_ROWS.unsigned_abs()),
        (KeyCode::PageDown, _) => pane.scroll_forward(FULL_PAGE_ROWS.unsigned_abs()),
        (KeyCode::Backspace, _) => pane.pop_char(),
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            pane.push_char(ch);
        }
        _ => {}
    }
    false
}

fn handle_table_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let Some(command) = table_command_for_key(key) else {
        return false;
    };
    if !table_command_allowed_in_mode(state.mode, command) {
        return false;
    }

    if let Some(status) = apply_table_command(&mut view_data.view, state.active_tab, command) {
        emit_status(state, view_data, internal_tx, status.message());
        check_layout(state, view_data, internal_tx);
    }
    true
}

fn table_command_allowed_in_mode(mode: AppMode, command: TableCommand) -> bool {
    match mode {
        AppMode::Nav => true,
        AppMode::Edit => !matches!(
            command,
            TableCommand::HideCurrentColumn | TableCommand::ShowAllColumns
        ),
        AppMode::Form(_) => false,
    }
}

fn table_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveHalfPageDown)
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveHalfPageUp)
        }
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(TableCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(TableCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(TableCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(TableCommand::MoveColumn(1)),
        (KeyCode::PageDown, _) => Some(TableCommand::MoveFullPageDown),
        (KeyCode::PageUp, _) => Some(TableCommand::MoveFullPageUp),
        (KeyCode::Char('g'), _) => Some(TableCommand::JumpFirstRow),
        (KeyCode::Char('G'), _) => Some(TableCommand::JumpLastRow),
        (KeyCode::Char('^'), _) => Some(TableCommand::JumpFirstColumn),
        (KeyCode::Char('$'), _) => Some(TableCommand::JumpLastColumn),
        (KeyCode::Char('c'), KeyModifiers::NONE) => Some(TableCommand::HideCurrentColumn),
        (KeyCode::Char('C'), _) => Some(TableCommand::ShowAllColumns),
        _ => None,
    }
}

/// Cursor moves return `None`; column visibility changes report a status.
fn apply_table_command(view: &mut View, tab: TabKind, command: TableCommand) -> Option<ViewStatus> {
    let table = view.table_mut(tab);
    match command {
        TableCommand::MoveRow(delta) => table.move_row(delta),
        TableCommand::MoveColumn(delta) => table.move_col(delta),
        TableCommand::MoveHalfPageDown => table.move_row(HALF_PAGE_ROWS),
        TableCommand::MoveHalfPageUp => table.move_row(-HALF_PAGE_ROWS),
        TableCommand::MoveFullPageDown => table.move_row(FULL_PAGE_ROWS),
        TableCommand::MoveFullPageUp => table.move_row(-FULL_PAGE_ROWS),
        TableCommand::JumpFirstRow => table.jump_first_row(),
        TableCommand::JumpLastRow => table.jump_last_row(),
        TableCommand::JumpFirstColumn => table.jump_first_col(),
        TableCommand::JumpLastColumn => table.jump_last_col(),
        TableCommand::HideCurrentColumn => return Some(table.hide_selected_column()),
        TableCommand::ShowAllColumns => return Some(table.show_all_columns()),
    }
    None
}

fn tab_title(tab: TabKind, state: &AppState) -> String {
    if state.active_tab == tab && state.show_deleted {
        format!(" {} +deleted ", tab.label())
    } else {
        format!(" {} ", tab.label())
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let tab_titles = TabKind::ALL
        .iter()
        .map(|tab| tab_title(*tab, state))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title(app_title(view_data)).borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(state.active_tab.index());
    frame.render_widget(tabs, layout[0]);

    render_table(frame, layout[1], state, view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if let Some(form) = &state.form {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(form_lines(form)).block(
            Block::default()
                .title(form_title(form))
                .borders(Borders::ALL),
        );
        frame.render_widget(overlay, area);
    }

    if let Some(pane) = &view_data.log_pane {
        render_logs(frame, pane, &view_data.logs);
    }
}

fn app_title(view_data: &ViewData) -> String {
    match view_data.view.house() {
        Some(house) => format!("micasa | {}", house.headline()),
        None => "micasa".to_owned(),
    }
}

/// `projects (3)`, plus the hidden column titles when any are hidden.
fn table_title(table: &TableView) -> String {
    let title = format!("{} ({})", table.tab.label(), table.rows.len());
    let hidden = table.columns.hidden_titles();
    if hidden.is_empty() {
        title
    } else {
        format!("{title} hidden: {}", hidden.join(", "))
    }
}

fn render_logs(frame: &mut ratatui::Frame<'_>, pane: &LogPane, logs: &LogBuffer) {
    let area = centered_rect(90, 80, frame.area());
    frame.render_widget(Clear, area);
    let level = logs.max_level().map_or("off", |level| level.as_str());
    let block = Block::default()
        .title(format!("logs ({level}, {} kept) | {LOG_HINTS}", logs.len()))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    let filter = Line::from(vec![
        Span::styled("filter: ", Style::default().fg(Color::Cyan)),
        Span::raw(format!("{}▏", pane.input())),
        Span::styled(
            format!("  {}", pane.validity_label()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(filter), sections[0]);

    let highlight = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let lines = pane.visible_lines(&logs.entries(), usize::from(sections[1].height), highlight);
    frame.render_widget(Paragraph::new(lines), sections[1]);
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let table = view_data.view.table(state.active_tab);
    let block = Block::default()
        .title(table_title(table))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    let lines = match table.render_lines(inner.width, table.body_rows(inner.width, inner.height)) {
        Ok(lines) => lines,
        Err(layout_error) => vec![Line::from(Span::styled(
            format!("layout error: {layout_error}"),
            Style::default().fg(Color::Red),
        ))],
    };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn form_title(form: &FormDraft) -> String {
    match form.target {
        FormTarget::Create => format!("add {}", form.kind.noun()),
        FormTarget::Edit(id) => format!("edit {} {id}", form.kind.noun()),
    }
}

fn form_lines(form: &FormDraft) -> Vec<Line<'static>> {
    form.fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            if index == form.focus {
                Line::from(vec![
                    Span::styled(
                        format!("> {}: ", field.label),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(format!("{}▏", field.value)),
                ])
            } else {
                Line::from(format!("  {}: {}", field.label, field.value))
            }
        })
        .collect()
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let (mode, hints) = match state.mode {
        _ if view_data.log_pane.is_some() => ("LOGS", LOG_HINTS),
        AppMode::Nav => ("NAV", NAV_HINTS),
        AppMode::Edit => ("EDIT", EDIT_HINTS),
        AppMode::Form(_) => ("FORM", FORM_HINTS),
    };
    let mut parts = vec![mode.to_owned()];
    if let Some(label) = state.form.as_ref().and_then(FormDraft::focused_label) {
        parts.push(format!("field {label}"));
    }
    if let Some(status) = &state.status_line {
        parts.push(status.clone());
    }
    if let Some(undo) = view_data.view.undo_summary() {
        parts.push(undo);
    }
    parts.push(hints.to_owned());
    parts.join(" | ")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        InternalEvent, ViewData, app_title, handle_key_event, process_internal_events,
        status_text, table_command_for_key, table_title,
    };
    use crate::logs::LogBuffer;
    use anyhow::Result;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use micasa_app::{
        AppMode, AppState, EntityStore, FormKind, ProjectFormInput, ProjectStatus, TabKind,
    };
    use micasa_db::Store;
    use std::sync::mpsc;
    use tracing::Level;

    fn store_with_project(title: &str) -> Result<Store> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let project_type = store.list_project_types()?[0].id;
        store.create_project(&ProjectFormInput {
            title: title.to_owned(),
            project_type_id: project_type,
            status: ProjectStatus::Underway,
            description: String::new(),
            start_date: None,
            end_date: None,
            budget_cents: Some(4_500_000),
            actual_cents: None,
        })?;
        Ok(store)
    }

    fn internal_tx() -> mpsc::Sender<InternalEvent> {
        let (tx, _rx) = mpsc::channel();
        tx
    }

    fn loaded(state: &AppState, store: &Store) -> Result<ViewData> {
        let mut view_data = ViewData::new(50, LogBuffer::default());
        view_data
            .view
            .refresh(store, state.active_tab, state.show_deleted)?;
        Ok(view_data)
    }

    fn press(
        state: &mut AppState,
        store: &Store,
        view_data: &mut ViewData,
        tx: &mpsc::Sender<InternalEvent>,
        code: KeyCode,
    ) -> bool {
        let modifiers = match code {
            KeyCode::Char(ch) if ch.is_ascii_uppercase() => KeyModifiers::SHIFT,
            _ => KeyModifiers::NONE,
        };
        handle_key_event(state, store, view_data, tx, KeyEvent::new(code, modifiers))
    }

    #[test]
    fn quit_keys_exit() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        assert!(press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('q')));
        assert!(handle_key_event(
            &mut state,
            &store,
            &mut view_data,
            &tx,
            KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL),
        ));

        state.mode = AppMode::Edit;
        assert!(!press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('q')));
        Ok(())
    }

    #[test]
    fn edit_mode_round_trip() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('i'));
        assert_eq!(state.mode, AppMode::Edit);
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Esc);
        assert_eq!(state.mode, AppMode::Nav);
        Ok(())
    }

    #[test]
    fn hide_keys_report_status_and_keep_one_column() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('c'));
        assert_eq!(state.status_line.as_deref(), Some("column hidden: ID"));

        for _ in 0..10 {
            press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('c'));
        }
        assert_eq!(
            state.status_line.as_deref(),
            Some("keep one column visible")
        );
        assert_eq!(
            view_data
                .view
                .table(TabKind::Projects)
                .columns
                .visible_count(),
            1
        );

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('C'));
        assert_eq!(state.status_line.as_deref(), Some("all columns shown"));
        Ok(())
    }

    #[test]
    fn delete_then_undo_restores_row() -> Result<()> {
        let store = store_with_project("Kitchen remodel")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('i'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('d'));
        assert_eq!(
            state.status_line.as_deref(),
            Some("deleted project \"Kitchen remodel\"")
        );
        assert!(view_data.view.table(TabKind::Projects).rows.is_empty());
        assert!(status_text(&state, &view_data)
            .contains("undo(1): restore project \"Kitchen remodel\""));

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('u'));
        assert_eq!(
            state.status_line.as_deref(),
            Some("undid project \"Kitchen remodel\"")
        );
        assert_eq!(view_data.view.table(TabKind::Projects).rows.len(), 1);
        assert!(view_data.view.undo_stack().is_empty());

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('u'));
        assert_eq!(state.status_line.as_deref(), Some("nothing to undo"));
        Ok(())
    }

    #[test]
    fn deleted_rows_toggle_back_with_restore() -> Result<()> {
        let store = store_with_project("Fence")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('i'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('d'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('x'));
        assert!(state.show_deleted);
        let table = view_data.view.table(TabKind::Projects);
        assert_eq!(table.rows.len(), 1);
        assert!(table.rows.meta[0].deleted);

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('d'));
        assert_eq!(
            state.status_line.as_deref(),
            Some("restored project \"Fence\"")
        );
        assert!(!view_data.view.table(TabKind::Projects).rows.meta[0].deleted);
        assert_eq!(view_data.view.undo_stack().len(), 2);
        Ok(())
    }

    #[test]
    fn add_form_types_and_submits() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState {
            active_tab: TabKind::Vendors,
            ..AppState::default()
        };
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('i'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('a'));
        assert_eq!(state.mode, AppMode::Form(FormKind::Vendor));
        assert!(status_text(&state, &view_data).contains("field Name"));

        for ch in "Acme".chars() {
            press(&mut state, &store, &mut view_data, &tx, KeyCode::Char(ch));
        }
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Enter);

        assert_eq!(state.mode, AppMode::Edit);
        let table = view_data.view.table(TabKind::Vendors);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows.cells[0][1], "Acme");
        Ok(())
    }

    #[test]
    fn invalid_form_stays_open_with_error() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState {
            active_tab: TabKind::Vendors,
            ..AppState::default()
        };
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('i'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('a'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Enter);

        assert_eq!(state.mode, AppMode::Form(FormKind::Vendor));
        let status = state.status_line.clone().unwrap_or_default();
        assert!(status.starts_with("add vendor failed: vendor name is required"));

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Esc);
        assert_eq!(state.mode, AppMode::Edit);
        Ok(())
    }

    #[test]
    fn inline_edit_updates_single_cell_and_is_undoable() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        view_data.view.table_mut(TabKind::Projects).selected_col = 2;
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('i'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('e'));
        let form = state.form.clone().expect("inline form open");
        assert_eq!(form.fields.len(), 1);
        assert_eq!(form.fields[0].label, "Title");

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('s'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Enter);
        assert_eq!(
            view_data.view.table(TabKind::Projects).rows.cells[0][2],
            "Decks"
        );
        assert_eq!(store.list_projects(false)?[0].budget_cents, Some(4_500_000));

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('u'));
        assert_eq!(
            view_data.view.table(TabKind::Projects).rows.cells[0][2],
            "Deck"
        );
        Ok(())
    }

    #[test]
    fn read_only_column_refuses_inline_edit() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('i'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('e'));
        assert_eq!(state.mode, AppMode::Edit);
        assert_eq!(state.status_line.as_deref(), Some("ID is read-only"));
        Ok(())
    }

    #[test]
    fn tab_keys_refresh_the_new_tab() -> Result<()> {
        let store = store_with_project("Deck")?;
        store.create_vendor(&micasa_app::VendorFormInput {
            name: "Acme".to_owned(),
            contact_name: String::new(),
            email: String::new(),
            phone: String::new(),
            website: String::new(),
            notes: String::new(),
        })?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('b'));
        assert_eq!(state.active_tab, TabKind::Vendors);
        assert_eq!(view_data.view.table(TabKind::Vendors).rows.len(), 1);
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('f'));
        assert_eq!(state.active_tab, TabKind::Projects);
        Ok(())
    }

    #[test]
    fn stale_status_clear_is_ignored() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let (tx, rx) = mpsc::channel();

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('c'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('c'));
        tx.send(InternalEvent::ClearStatus { token: 1 })?;
        process_internal_events(&mut state, &view_data, &rx);
        assert!(state.status_line.is_some());

        tx.send(InternalEvent::ClearStatus {
            token: view_data.status_token,
        })?;
        process_internal_events(&mut state, &view_data, &rx);
        assert!(state.status_line.is_none());
        Ok(())
    }

    #[test]
    fn house_form_opens_from_any_tab_and_saves() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState {
            active_tab: TabKind::Quotes,
            ..AppState::default()
        };
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();
        assert_eq!(app_title(&view_data), "micasa");

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('i'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('p'));
        assert_eq!(state.mode, AppMode::Form(FormKind::House));
        assert!(status_text(&state, &view_data).contains("field Nickname"));

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Enter);
        assert_eq!(state.mode, AppMode::Edit);
        assert_eq!(state.status_line.as_deref(), Some("saved house profile"));
        assert_eq!(app_title(&view_data), "micasa | My house");
        assert!(view_data.view.undo_stack().is_empty());

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('p'));
        let form = state.form.clone().expect("house form open");
        assert!(matches!(form.target, micasa_app::FormTarget::Edit(_)));
        assert_eq!(form.value("Nickname"), "My house");
        Ok(())
    }

    #[test]
    fn log_overlay_captures_keys_until_escape() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();
        view_data.logs.push(Level::INFO, "micasa_tui", "tui started");
        view_data.logs.push(Level::WARN, "micasa_tui", "undo restore failed");

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('L'));
        assert!(view_data.log_pane.is_some());
        assert!(status_text(&state, &view_data).starts_with("LOGS"));

        for ch in "undo|q".chars() {
            assert!(!press(&mut state, &store, &mut view_data, &tx, KeyCode::Char(ch)));
        }
        let pane = view_data.log_pane.as_ref().expect("overlay open");
        assert_eq!(pane.input(), "undo|q");
        assert_eq!(pane.validity_label(), "valid");
        assert!(pane.matches("WARN  micasa_tui: undo restore failed"));
        assert_eq!(state.mode, AppMode::Nav);

        press(&mut state, &store, &mut view_data, &tx, KeyCode::Esc);
        assert!(view_data.log_pane.is_none());
        assert_eq!(state.mode, AppMode::Nav);
        Ok(())
    }

    #[test]
    fn table_title_lists_hidden_columns() -> Result<()> {
        let store = store_with_project("Deck")?;
        let mut state = AppState::default();
        let mut view_data = loaded(&state, &store)?;
        let tx = internal_tx();

        assert_eq!(
            table_title(view_data.view.table(TabKind::Projects)),
            "projects (1)"
        );
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('c'));
        press(&mut state, &store, &mut view_data, &tx, KeyCode::Char('c'));
        assert_eq!(
            table_title(view_data.view.table(TabKind::Projects)),
            "projects (1) hidden: ID, Type"
        );
        Ok(())
    }

    #[test]
    fn control_chords_map_to_page_moves() {
        let key = |ch, modifiers: KeyModifiers| {
            table_command_for_key(KeyEvent::new(KeyCode::Char(ch), modifiers))
        };
        assert!(key('d', KeyModifiers::CONTROL).is_some());
        assert!(key('d', KeyModifiers::NONE).is_none());
        assert!(key('u', KeyModifiers::NONE).is_none());
    }
}
