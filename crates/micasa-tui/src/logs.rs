// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! In-memory tail of the tracing output, shown in the log overlay with an
//! optional regex filter.

use std::collections::VecDeque;
use std::io;
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use regex::Regex;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

pub const DEFAULT_LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    pub fn line(&self) -> String {
        format!("{:<5} {}: {}", self.level.as_str(), self.target, self.message)
    }
}

/// Shared ring of recent entries. Cloning shares the ring, so the tracing
/// layer and the overlay see the same entries.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
    max_level: Option<Level>,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(Some(Level::INFO), DEFAULT_LOG_CAPACITY)
    }
}

impl LogBuffer {
    /// `max_level` of `None` keeps nothing.
    pub fn new(max_level: Option<Level>, capacity: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(1_024)))),
            capacity,
            max_level,
        }
    }

    pub fn max_level(&self) -> Option<Level> {
        self.max_level
    }

    /// Drops blank messages and anything more verbose than `max_level`.
    /// A full ring evicts its oldest entry.
    pub fn push(&self, level: Level, target: &str, message: &str) {
        let Some(max_level) = self.max_level else {
            return;
        };
        if level > max_level || self.capacity == 0 || message.trim().is_empty() {
            return;
        }
        let mut entries = self.lock();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            level,
            target: target.to_owned(),
            message: message.trim().to_owned(),
        });
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn writer(&self) -> LogWriter {
        LogWriter {
            buffer: self.clone(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Feeds formatted events from a compact, timeless, ansi-free fmt layer
/// into a [`LogBuffer`].
#[derive(Debug, Clone)]
pub struct LogWriter {
    buffer: LogBuffer,
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(text) = std::str::from_utf8(buf) {
            for raw in text.lines() {
                let (level, target, message) = parse_compact(raw);
                self.buffer.push(level, target, message);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer()
    }
}

/// `" INFO micasa_tui::view: table refreshed rows=3"` split into its level,
/// target and message. Lines without a level prefix are kept as INFO.
fn parse_compact(raw: &str) -> (Level, &str, &str) {
    let trimmed = raw.trim();
    let Some((level, rest)) = trimmed
        .split_once(' ')
        .and_then(|(head, rest)| head.parse::<Level>().ok().map(|level| (level, rest)))
    else {
        return (Level::INFO, "general", trimmed);
    };
    match rest.split_once(": ") {
        Some((target, message)) if !target.is_empty() && !target.contains(' ') => {
            (level, target, message)
        }
        _ => (level, "general", rest),
    }
}

/// Overlay state: the filter being typed and how far the view is scrolled
/// back from the newest line.
#[derive(Debug, Clone, Default)]
pub struct LogPane {
    input: String,
    filter: Option<Regex>,
    filter_error: Option<String>,
    scroll: usize,
}

impl LogPane {
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Empty input clears the filter. An invalid pattern clears it too and
    /// keeps the compile error for [`Self::validity_label`].
    pub fn set_filter(&mut self, pattern: &str) {
        pattern.clone_into(&mut self.input);
        self.scroll = 0;
        if pattern.is_empty() {
            self.filter = None;
            self.filter_error = None;
            return;
        }
        match Regex::new(pattern) {
            Ok(regex) => {
                self.filter = Some(regex);
                self.filter_error = None;
            }
            Err(error) => {
                self.filter = None;
                self.filter_error = Some(error.to_string());
            }
        }
    }

    pub fn push_char(&mut self, ch: char) {
        let mut next = self.input.clone();
        next.push(ch);
        self.set_filter(&next);
    }

    pub fn pop_char(&mut self) {
        let mut next = self.input.clone();
        next.pop();
        self.set_filter(&next);
    }

    /// Every line matches while the filter is unset or invalid.
    pub fn matches(&self, line: &str) -> bool {
        self.filter.as_ref().is_none_or(|regex| regex.is_match(line))
    }

    /// Byte ranges of non-empty matches in `line`.
    pub fn highlights(&self, line: &str) -> Vec<Range<usize>> {
        self.filter.as_ref().map_or_else(Vec::new, |regex| {
            regex
                .find_iter(line)
                .filter(|found| !found.is_empty())
                .map(|found| found.range())
                .collect()
        })
    }

    pub fn validity_label(&self) -> String {
        if self.input.is_empty() {
            return "no filter".to_owned();
        }
        match &self.filter_error {
            Some(error) => format!("invalid: {}", error_summary(error)),
            None => "valid".to_owned(),
        }
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn scroll_back(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_forward(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    /// The last `height` matching lines, ending `scroll` lines before the
    /// newest, with matches styled by `highlight`.
    pub fn visible_lines(
        &self,
        entries: &[LogEntry],
        height: usize,
        highlight: Style,
    ) -> Vec<Line<'static>> {
        let matching = entries
            .iter()
            .map(LogEntry::line)
            .filter(|line| self.matches(line))
            .collect::<Vec<_>>();
        let end = matching.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        matching[start..end]
            .iter()
            .map(|line| apply_highlights(line, &self.highlights(line), highlight))
            .collect()
    }
}

/// Styles `ranges` of `line`. Ranges past the end are clipped, and a range
/// overlapping an earlier one starts where that one ended.
pub fn apply_highlights(line: &str, ranges: &[Range<usize>], style: Style) -> Line<'static> {
    let mut ranges = ranges.to_vec();
    ranges.sort_by_key(|range| range.start);

    let mut spans = Vec::new();
    let mut cursor = 0;
    for range in ranges {
        let start = range.start.max(cursor);
        let end = range.end.min(line.len());
        if start >= end || !line.is_char_boundary(start) || !line.is_char_boundary(end) {
            continue;
        }
        if start > cursor {
            spans.push(Span::raw(line[cursor..start].to_owned()));
        }
        spans.push(Span::styled(line[start..end].to_owned(), style));
        cursor = end;
    }
    if cursor < line.len() {
        spans.push(Span::raw(line[cursor..].to_owned()));
    }
    Line::from(spans)
}

/// Regex compile errors end with an `error: ...` line under a caret diagram.
fn error_summary(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .unwrap_or(text)
}
