// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Column geometry for one table render: which columns are visible, how wide
//! each one is, what separates them, and where the badges for hidden columns
//! go.

use std::collections::BTreeMap;

use tracing::debug;

use crate::columns::{ColumnSpec, text_width};

/// Width of `" │ "` and `" ⋯ "`.
pub const SEPARATOR_WIDTH: u16 = 3;
/// Width of one ladle rail plus its padding space.
pub const LADLE_RAIL_WIDTH: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("hide order {order} is shared by `{first}` and `{second}`")]
    DuplicateHideOrder {
        order: u32,
        first: String,
        second: String,
    },
    #[error("column `{title}` has zero width")]
    ZeroWidth { title: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleColumn {
    pub full_index: usize,
    pub width: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    Plain,
    /// At least one hidden column sits in this gap.
    Collapsed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    pub title: String,
    pub full_index: usize,
    pub hide_order: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedStack {
    /// Top of the stack first.
    pub entries: Vec<StackEntry>,
    pub offset: u16,
    pub width: u16,
    /// Leading or trailing run. Edge stacks hang off the ladle rails instead
    /// of a connector.
    pub edge: bool,
}

impl CollapsedStack {
    pub fn end(&self) -> u16 {
        self.offset.saturating_add(self.width)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableLayout {
    pub columns: Vec<VisibleColumn>,
    /// One per gap between consecutive visible columns.
    pub separators: Vec<Separator>,
    pub stacks: Vec<CollapsedStack>,
    /// Hidden columns exist before the first visible one.
    pub leading: bool,
    /// Hidden columns exist after the last visible one.
    pub trailing: bool,
    /// Visible columns plus separators, ladle chrome excluded.
    pub total_width: u16,
}

impl TableLayout {
    pub fn vis_to_full(&self) -> Vec<usize> {
        self.columns.iter().map(|column| column.full_index).collect()
    }

    pub fn chrome_width(&self) -> u16 {
        chrome_width(self.leading, self.trailing)
    }
}

const fn chrome_width(leading: bool, trailing: bool) -> u16 {
    let mut width = 0;
    if leading {
        width += LADLE_RAIL_WIDTH;
    }
    if trailing {
        width += LADLE_RAIL_WIDTH;
    }
    width
}

pub fn compute_layout(specs: &[ColumnSpec], target_width: u16) -> Result<TableLayout, LayoutError> {
    validate_specs(specs)?;

    let vis_to_full = specs
        .iter()
        .enumerate()
        .filter(|(_, spec)| !spec.is_hidden())
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    let (Some(&first), Some(&last)) = (vis_to_full.first(), vis_to_full.last()) else {
        return Ok(TableLayout::default());
    };

    let leading = first > 0;
    let trailing = last + 1 < specs.len();
    let available = target_width.saturating_sub(chrome_width(leading, trailing));
    let widths = negotiate_widths(
        vis_to_full
            .iter()
            .map(|&index| specs[index].natural_width())
            .collect(),
        available,
    );

    let separators = vis_to_full
        .windows(2)
        .map(|pair| {
            if pair[1] > pair[0] + 1 {
                Separator::Collapsed
            } else {
                Separator::Plain
            }
        })
        .collect::<Vec<_>>();
    let total_width = row_width(&widths);
    let stacks = collapsed_stacks(specs, &vis_to_full, &widths, total_width);

    debug!(
        visible = vis_to_full.len(),
        hidden = specs.len() - vis_to_full.len(),
        stacks = stacks.len(),
        total_width,
        "table layout"
    );

    Ok(TableLayout {
        columns: vis_to_full
            .into_iter()
            .zip(widths)
            .map(|(full_index, width)| VisibleColumn { full_index, width })
            .collect(),
        separators,
        stacks,
        leading,
        trailing,
        total_width,
    })
}

fn validate_specs(specs: &[ColumnSpec]) -> Result<(), LayoutError> {
    let mut seen: BTreeMap<u32, &str> = BTreeMap::new();
    for spec in specs {
        if spec.base_width == 0 {
            return Err(LayoutError::ZeroWidth {
                title: spec.title.clone(),
            });
        }
        if !spec.is_hidden() {
            continue;
        }
        if let Some(first) = seen.insert(spec.hide_order, &spec.title) {
            return Err(LayoutError::DuplicateHideOrder {
                order: spec.hide_order,
                first: first.to_owned(),
                second: spec.title.clone(),
            });
        }
    }
    Ok(())
}

fn row_width(widths: &[u16]) -> u16 {
    let gaps = u16::try_from(widths.len().saturating_sub(1)).unwrap_or(u16::MAX);
    widths
        .iter()
        .fold(0u16, |sum, width| sum.saturating_add(*width))
        .saturating_add(gaps.saturating_mul(SEPARATOR_WIDTH))
}

/// Shrinks the widest column one cell at a time until the row fits or every
/// column is down to a single cell.
fn negotiate_widths(mut widths: Vec<u16>, available: u16) -> Vec<u16> {
    while row_width(&widths) > available {
        let widest = widths
            .iter()
            .enumerate()
            .filter(|(_, width)| **width > 1)
            .max_by(|(left_index, left), (right_index, right)| {
                left.cmp(right).then(right_index.cmp(left_index))
            })
            .map(|(index, _)| index);
        let Some(widest) = widest else {
            break;
        };
        widths[widest] -= 1;
    }
    widths
}

fn collapsed_stacks(
    specs: &[ColumnSpec],
    vis_to_full: &[usize],
    widths: &[u16],
    total_width: u16,
) -> Vec<CollapsedStack> {
    let mut stacks = Vec::new();

    if let Some(&first) = vis_to_full.first()
        && let Some(stack) = edge_stack(specs, 0, first, |_| 0)
    {
        stacks.push(stack);
    }

    let mut offset = 0u16;
    for (position, &full_index) in vis_to_full.iter().enumerate() {
        if position > 0 {
            let lo = vis_to_full[position - 1] + 1;
            let entries = hidden_entries(specs, lo, full_index);
            if !entries.is_empty() {
                let width = stack_width(&entries);
                let gap_center = offset.saturating_add(SEPARATOR_WIDTH / 2);
                stacks.push(CollapsedStack {
                    entries,
                    offset: gap_center.saturating_sub(width / 2),
                    width,
                    edge: false,
                });
            }
            offset = offset.saturating_add(SEPARATOR_WIDTH);
        }
        offset = offset.saturating_add(widths[position]);
    }

    if let Some(&last) = vis_to_full.last()
        && let Some(stack) = edge_stack(specs, last + 1, specs.len(), |width| {
            offset.saturating_sub(width)
        })
    {
        stacks.push(stack);
    }

    for stack in &mut stacks {
        stack.width = stack.width.min(total_width);
        stack.offset = stack.offset.min(total_width - stack.width);
    }

    merge_overlapping(stacks, total_width)
}

fn edge_stack(
    specs: &[ColumnSpec],
    lo: usize,
    hi: usize,
    place: impl Fn(u16) -> u16,
) -> Option<CollapsedStack> {
    let entries = hidden_entries(specs, lo, hi);
    if entries.is_empty() {
        return None;
    }
    let width = stack_width(&entries);
    Some(CollapsedStack {
        entries,
        offset: place(width),
        width,
        edge: true,
    })
}

/// Hidden columns in `[lo, hi)`, rightmost first so the column nearest the
/// gap sits on top.
fn hidden_entries(specs: &[ColumnSpec], lo: usize, hi: usize) -> Vec<StackEntry> {
    (lo..hi)
        .rev()
        .filter(|index| specs[*index].is_hidden())
        .map(|index| StackEntry {
            title: specs[index].title.clone(),
            full_index: index,
            hide_order: specs[index].hide_order,
        })
        .collect()
}

fn stack_width(entries: &[StackEntry]) -> u16 {
    entries
        .iter()
        .map(|entry| text_width(&entry.title))
        .max()
        .unwrap_or(0)
        .saturating_add(2)
}

fn merge_overlapping(mut stacks: Vec<CollapsedStack>, total_width: u16) -> Vec<CollapsedStack> {
    stacks.sort_by_key(|stack| stack.offset);

    let mut merged: Vec<CollapsedStack> = Vec::with_capacity(stacks.len());
    for stack in stacks {
        if let Some(last) = merged.last_mut()
            && stack.offset < last.end()
        {
            let end = last.end().max(stack.end());
            last.entries.extend(stack.entries);
            last.width = (end - last.offset).min(total_width);
            last.edge |= stack.edge;
            continue;
        }
        merged.push(stack);
    }

    for stack in &mut merged {
        stack
            .entries
            .sort_by(|left, right| right.full_index.cmp(&left.full_index));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::{LayoutError, Separator, compute_layout};
    use crate::columns::ColumnSpec;

    #[test]
    fn all_visible_has_no_stacks() -> anyhow::Result<()> {
        let specs = vec![
            ColumnSpec::new("ID", 4),
            ColumnSpec::new("Title", 10),
            ColumnSpec::new("End", 6),
        ];
        let layout = compute_layout(&specs, 200)?;
        assert!(layout.stacks.is_empty());
        assert_eq!(layout.separators, vec![Separator::Plain, Separator::Plain]);
        assert_eq!(layout.total_width, 4 + 10 + 6 + 2 * 3);
        assert!(!layout.leading && !layout.trailing);
        Ok(())
    }

    #[test]
    fn all_hidden_yields_empty_layout() -> anyhow::Result<()> {
        let specs = vec![
            ColumnSpec::new("ID", 4).hidden(1),
            ColumnSpec::new("Title", 10).hidden(2),
        ];
        let layout = compute_layout(&specs, 80)?;
        assert!(layout.columns.is_empty());
        assert!(layout.stacks.is_empty());
        assert_eq!(layout.total_width, 0);
        Ok(())
    }

    #[test]
    fn interior_stack_centers_on_gap() -> anyhow::Result<()> {
        let specs = vec![
            ColumnSpec::new("ID", 4),
            ColumnSpec::new("Title", 20),
            ColumnSpec::new("Notes", 8).hidden(1),
            ColumnSpec::new("End", 10),
        ];
        let layout = compute_layout(&specs, 200)?;
        assert_eq!(layout.stacks.len(), 1);
        let stack = &layout.stacks[0];
        // Gap after ID(4) + sep(3) + Title(20) starts at 27; its centre is 28.
        assert_eq!(stack.width, 7);
        assert_eq!(stack.offset, 28 - 3);
        assert!(!stack.edge);
        assert_eq!(
            layout.separators,
            vec![Separator::Plain, Separator::Collapsed]
        );
        Ok(())
    }

    #[test]
    fn trailing_stack_anchors_to_right_edge() -> anyhow::Result<()> {
        let specs = vec![
            ColumnSpec::new("ID", 4),
            ColumnSpec::new("Title", 20),
            ColumnSpec::new("End", 10).hidden(1),
        ];
        let layout = compute_layout(&specs, 200)?;
        let stack = &layout.stacks[0];
        assert!(stack.edge);
        assert_eq!(stack.end(), layout.total_width);
        assert!(layout.trailing);
        assert_eq!(layout.chrome_width(), 2);
        Ok(())
    }

    #[test]
    fn wide_stack_is_clamped_into_row() -> anyhow::Result<()> {
        let specs = vec![
            ColumnSpec::new("A", 1),
            ColumnSpec::new("An exceptionally long title", 4).hidden(1),
        ];
        let layout = compute_layout(&specs, 200)?;
        assert_eq!(layout.total_width, 1);
        let stack = &layout.stacks[0];
        assert_eq!(stack.width, 1);
        assert_eq!(stack.offset, 0);
        Ok(())
    }

    #[test]
    fn overlapping_edge_stacks_merge() -> anyhow::Result<()> {
        let specs = vec![
            ColumnSpec::new("Left", 4).hidden(1),
            ColumnSpec::new("X", 1),
            ColumnSpec::new("Right", 4).hidden(2),
        ];
        let layout = compute_layout(&specs, 200)?;
        assert_eq!(layout.stacks.len(), 1);
        let stack = &layout.stacks[0];
        assert!(stack.edge);
        let indices = stack
            .entries
            .iter()
            .map(|entry| entry.full_index)
            .collect::<Vec<_>>();
        assert_eq!(indices, vec![2, 0]);
        Ok(())
    }

    #[test]
    fn narrow_target_shrinks_widest_columns() -> anyhow::Result<()> {
        let specs = vec![
            ColumnSpec::new("ID", 4),
            ColumnSpec::new("Title", 24),
            ColumnSpec::new("Status", 10),
        ];
        let layout = compute_layout(&specs, 30)?;
        let widths = layout
            .columns
            .iter()
            .map(|column| column.width)
            .collect::<Vec<_>>();
        assert_eq!(layout.total_width, 30);
        assert_eq!(widths, vec![4, 10, 10]);
        Ok(())
    }

    #[test]
    fn shrinking_stops_at_one_cell() -> anyhow::Result<()> {
        let specs = vec![ColumnSpec::new("ID", 4), ColumnSpec::new("Title", 24)];
        let layout = compute_layout(&specs, 2)?;
        assert!(layout.columns.iter().all(|column| column.width == 1));
        assert_eq!(layout.total_width, 1 + 3 + 1);
        Ok(())
    }

    #[test]
    fn chrome_is_reserved_when_edges_are_hidden() -> anyhow::Result<()> {
        let specs = vec![
            ColumnSpec::new("ID", 4).hidden(1),
            ColumnSpec::new("Title", 40),
        ];
        let layout = compute_layout(&specs, 30)?;
        assert_eq!(layout.total_width + layout.chrome_width(), 30);
        Ok(())
    }

    #[test]
    fn duplicate_hide_order_is_rejected() {
        let specs = vec![
            ColumnSpec::new("Type", 4).hidden(2),
            ColumnSpec::new("Title", 4),
            ColumnSpec::new("Status", 4).hidden(2),
        ];
        let error = compute_layout(&specs, 80).expect_err("duplicate order");
        assert_eq!(
            error,
            LayoutError::DuplicateHideOrder {
                order: 2,
                first: "Type".to_owned(),
                second: "Status".to_owned(),
            }
        );
    }

    #[test]
    fn zero_width_is_rejected() {
        let specs = vec![ColumnSpec::new("ID", 0)];
        assert!(matches!(
            compute_layout(&specs, 80),
            Err(LayoutError::ZeroWidth { .. })
        ));
    }
}
