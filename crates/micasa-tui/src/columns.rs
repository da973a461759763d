// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Per-tab column schemas and hide/show bookkeeping.

use micasa_app::TabKind;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Column that names a row on another tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Project,
    Vendor,
    Appliance,
}

impl LinkKind {
    pub const fn target(self) -> TabKind {
        match self {
            Self::Project => TabKind::Projects,
            Self::Vendor => TabKind::Vendors,
            Self::Appliance => TabKind::Appliances,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub title: String,
    pub base_width: u16,
    /// `0` while visible. Hidden columns carry a unique positive order, and
    /// a higher order means the column was hidden more recently.
    pub hide_order: u32,
    pub link: Option<LinkKind>,
    /// Lookup labels the column can show. They widen the natural width so
    /// it does not change as rows come and go.
    pub fixed_values: Vec<String>,
}

impl ColumnSpec {
    pub fn new(title: impl Into<String>, base_width: u16) -> Self {
        Self {
            title: title.into(),
            base_width,
            hide_order: 0,
            link: None,
            fixed_values: Vec::new(),
        }
    }

    pub fn linked(mut self, link: LinkKind) -> Self {
        self.link = Some(link);
        self
    }

    pub fn with_fixed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn hidden(mut self, hide_order: u32) -> Self {
        self.hide_order = hide_order;
        self
    }

    pub const fn is_hidden(&self) -> bool {
        self.hide_order > 0
    }

    pub fn natural_width(&self) -> u16 {
        self.fixed_values
            .iter()
            .map(|value| text_width(value))
            .chain([self.base_width, text_width(&self.title)])
            .max()
            .unwrap_or(self.base_width)
    }
}

/// Terminal cells `value` occupies. Wide characters count twice.
pub(crate) fn text_width(value: &str) -> u16 {
    u16::try_from(value.width()).unwrap_or(u16::MAX)
}

/// Longest prefix of `value` that fits in `cells`, with its width. A wide
/// character that would straddle the limit is left out.
pub(crate) fn take_cells(value: &str, cells: usize) -> (&str, usize) {
    let mut used = 0;
    for (index, ch) in value.char_indices() {
        let width = ch.width().unwrap_or(0);
        if used + width > cells {
            return (&value[..index], used);
        }
        used += width;
    }
    (value, used)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnModel {
    specs: Vec<ColumnSpec>,
}

impl ColumnModel {
    pub fn new(specs: Vec<ColumnSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn title(&self, full_index: usize) -> Option<&str> {
        self.specs.get(full_index).map(|spec| spec.title.as_str())
    }

    /// Render position to full index for every visible column.
    pub fn vis_to_full(&self) -> Vec<usize> {
        self.specs
            .iter()
            .enumerate()
            .filter(|(_, spec)| !spec.is_hidden())
            .map(|(index, _)| index)
            .collect()
    }

    /// Titles of hidden columns in column order.
    pub fn hidden_titles(&self) -> Vec<&str> {
        self.specs
            .iter()
            .filter(|spec| spec.is_hidden())
            .map(|spec| spec.title.as_str())
            .collect()
    }

    pub fn visible_count(&self) -> usize {
        self.specs.iter().filter(|spec| !spec.is_hidden()).count()
    }

    /// Returns `false` when the column is missing or already hidden.
    pub fn hide(&mut self, full_index: usize) -> bool {
        let next_order = self
            .specs
            .iter()
            .map(|spec| spec.hide_order)
            .max()
            .unwrap_or(0)
            + 1;
        match self.specs.get_mut(full_index) {
            Some(spec) if !spec.is_hidden() => {
                spec.hide_order = next_order;
                true
            }
            _ => false,
        }
    }

    pub fn show(&mut self, full_index: usize) -> bool {
        match self.specs.get_mut(full_index) {
            Some(spec) if spec.is_hidden() => {
                spec.hide_order = 0;
                true
            }
            _ => false,
        }
    }

    pub fn show_all(&mut self) {
        for spec in &mut self.specs {
            spec.hide_order = 0;
        }
    }

    pub fn set_fixed_values(&mut self, title: &str, values: Vec<String>) {
        if let Some(spec) = self.specs.iter_mut().find(|spec| spec.title == title) {
            spec.fixed_values = values;
        }
    }
}

pub fn columns_for_tab(tab: TabKind) -> Vec<ColumnSpec> {
    match tab {
        TabKind::Projects => vec![
            ColumnSpec::new("ID", 4),
            ColumnSpec::new("Type", 12),
            ColumnSpec::new("Title", 24),
            ColumnSpec::new("Status", 10).with_fixed_values(
                micasa_app::ProjectStatus::ALL.map(micasa_app::ProjectStatus::as_str),
            ),
            ColumnSpec::new("Budget", 12),
            ColumnSpec::new("Actual", 12),
            ColumnSpec::new("Start", 10),
            ColumnSpec::new("End", 10),
        ],
        TabKind::Quotes => vec![
            ColumnSpec::new("ID", 4),
            ColumnSpec::new("Project", 18).linked(LinkKind::Project),
            ColumnSpec::new("Vendor", 16).linked(LinkKind::Vendor),
            ColumnSpec::new("Total", 12),
            ColumnSpec::new("Labor", 12),
            ColumnSpec::new("Mat", 12),
            ColumnSpec::new("Other", 12),
            ColumnSpec::new("Recv", 10),
        ],
        TabKind::Maintenance => vec![
            ColumnSpec::new("ID", 4),
            ColumnSpec::new("Item", 20),
            ColumnSpec::new("Category", 12),
            ColumnSpec::new("Appliance", 14).linked(LinkKind::Appliance),
            ColumnSpec::new("Last", 10),
            ColumnSpec::new("Next", 10),
            ColumnSpec::new("Every", 7),
            ColumnSpec::new("Cost", 10),
        ],
        TabKind::Appliances => vec![
            ColumnSpec::new("ID", 4),
            ColumnSpec::new("Name", 18),
            ColumnSpec::new("Brand", 12),
            ColumnSpec::new("Model", 12),
            ColumnSpec::new("Serial", 12),
            ColumnSpec::new("Location", 12),
            ColumnSpec::new("Purchased", 10),
            ColumnSpec::new("Warranty", 10),
            ColumnSpec::new("Cost", 10),
        ],
        TabKind::Vendors => vec![
            ColumnSpec::new("ID", 4),
            ColumnSpec::new("Name", 18),
            ColumnSpec::new("Contact", 14),
            ColumnSpec::new("Email", 18),
            ColumnSpec::new("Phone", 12),
            ColumnSpec::new("Website", 18),
        ],
    }
}
