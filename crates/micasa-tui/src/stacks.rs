// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Paints collapsed stacks: one line of badges per stack depth, connectors
//! for interior stacks and the ladle rails that hold edge stacks.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::columns::{take_cells, text_width};
use crate::layout::CollapsedStack;

/// Badge colours, picked by full column index so a column keeps its colour
/// wherever it ends up.
pub const PALETTE: [Color; 5] = [
    Color::Magenta,
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Gray,
];

const BADGE_TEXT: Color = Color::Black;
const RAIL: Color = Color::Cyan;

pub fn badge_color(full_index: usize) -> Color {
    PALETTE[full_index % PALETTE.len()]
}

pub fn rail_style() -> Style {
    Style::default().fg(RAIL)
}

/// One line per depth, top of the stacks first. Empty when there are no
/// stacks.
pub fn render_stack_lines(stacks: &[CollapsedStack]) -> Vec<Line<'static>> {
    let depth = stacks
        .iter()
        .map(|stack| stack.entries.len())
        .max()
        .unwrap_or(0);
    (0..depth)
        .map(|level| render_stack_line(stacks, level))
        .collect()
}

fn render_stack_line(stacks: &[CollapsedStack], depth: usize) -> Line<'static> {
    let mut badges = stacks
        .iter()
        .filter_map(|stack| {
            stack.entries.get(depth).map(|entry| {
                let style = Style::default()
                    .fg(BADGE_TEXT)
                    .bg(badge_color(entry.full_index))
                    .add_modifier(Modifier::BOLD);
                (stack.offset, Span::styled(center(&entry.title, stack.width), style))
            })
        })
        .collect::<Vec<_>>();
    badges.sort_by_key(|(offset, _)| *offset);

    let mut spans = Vec::with_capacity(badges.len() * 2);
    let mut cursor = 0u16;
    for (offset, badge) in badges {
        if offset > cursor {
            spans.push(Span::raw(" ".repeat(usize::from(offset - cursor))));
            cursor = offset;
        }
        cursor = cursor.saturating_add(text_width(&badge.content));
        spans.push(badge);
    }
    Line::from(spans)
}

/// `│` under the middle of every interior stack. `None` when all stacks sit
/// on the edges.
pub fn render_connector(stacks: &[CollapsedStack]) -> Option<Line<'static>> {
    let mut spans = Vec::new();
    let mut cursor = 0u16;
    for stack in stacks.iter().filter(|stack| !stack.edge) {
        let center = stack.offset + stack.width / 2;
        if center > cursor {
            spans.push(Span::raw(" ".repeat(usize::from(center - cursor))));
            cursor = center;
        }
        spans.push(Span::styled("│", rail_style()));
        cursor += 1;
    }
    if spans.is_empty() {
        None
    } else {
        Some(Line::from(spans))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LadleChrome {
    pub left: bool,
    pub right: bool,
}

impl LadleChrome {
    pub const fn new(leading: bool, trailing: bool) -> Self {
        Self {
            left: leading,
            right: trailing,
        }
    }

    pub const fn left_width(self) -> u16 {
        if self.left { 2 } else { 0 }
    }

    pub const fn right_width(self) -> u16 {
        if self.right { 2 } else { 0 }
    }

    /// Frames a body line with the rails, padding it to `width` first so the
    /// right rail lines up.
    pub fn wrap(self, line: Line<'static>, width: u16) -> Line<'static> {
        if !self.left && !self.right {
            return line;
        }
        let mut spans = Vec::with_capacity(line.spans.len() + 3);
        if self.left {
            spans.push(Span::styled("│", rail_style()));
            spans.push(Span::raw(" "));
        }
        let used = text_width(&plain_text(&line));
        spans.extend(line.spans);
        if self.right {
            if width > used {
                spans.push(Span::raw(" ".repeat(usize::from(width - used))));
            }
            spans.push(Span::raw(" "));
            spans.push(Span::styled("│", rail_style()));
        }
        Line::from(spans)
    }
}

/// Closing curve under the badges: `╰──╯` across the line when both edges
/// hold stacks, `╰──` under a leading stack, `──╯` from a trailing stack to
/// the right edge.
pub fn render_ladle_bottom(
    stacks: &[CollapsedStack],
    chrome: LadleChrome,
    column_space: u16,
) -> Option<Line<'static>> {
    let style = rail_style();
    match (chrome.left, chrome.right) {
        (false, false) => None,
        (true, true) => {
            let full = chrome.left_width() + column_space + chrome.right_width();
            (full >= 2).then(|| {
                Line::from(Span::styled(
                    format!("╰{}╯", "─".repeat(usize::from(full - 2))),
                    style,
                ))
            })
        }
        (true, false) => {
            let lead = stacks
                .iter()
                .find(|stack| stack.edge && stack.offset == 0)
                .map(|stack| stack.width)?;
            Some(Line::from(Span::styled(
                format!("╰{}", "─".repeat(usize::from(lead) + 1)),
                style,
            )))
        }
        (false, true) => {
            let trail = stacks
                .iter()
                .find(|stack| stack.edge)
                .map_or(0, |stack| stack.offset);
            let dashes = column_space.saturating_sub(trail) + 1;
            Some(Line::from(vec![
                Span::raw(" ".repeat(usize::from(trail))),
                Span::styled(format!("{}╯", "─".repeat(usize::from(dashes))), style),
            ]))
        }
    }
}

pub fn plain_text(line: &Line<'_>) -> String {
    line.spans
        .iter()
        .map(|span| span.content.as_ref())
        .collect()
}

fn center(label: &str, width: u16) -> String {
    let width = usize::from(width);
    let (label, used) = take_cells(label, width);
    let pad = width - used;
    let left = pad / 2;
    format!("{}{label}{}", " ".repeat(left), " ".repeat(pad - left))
}
