// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;

use micasa_app::{Appliance, EntityStore, FormKind, MaintenanceItem, Project, Quote, Vendor};
use tracing::{debug, error};

use crate::handlers::{HandlerError, handler_for};

pub const DEFAULT_UNDO_LIMIT: usize = 50;

/// Full row as it was before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriorState {
    Project(Project),
    Quote(Quote),
    MaintenanceItem(MaintenanceItem),
    Appliance(Appliance),
    Vendor(Vendor),
}

impl PriorState {
    pub const fn kind(&self) -> FormKind {
        match self {
            Self::Project(_) => FormKind::Project,
            Self::Quote(_) => FormKind::Quote,
            Self::MaintenanceItem(_) => FormKind::MaintenanceItem,
            Self::Appliance(_) => FormKind::Appliance,
            Self::Vendor(_) => FormKind::Vendor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub description: String,
    pub kind: FormKind,
    pub entity_id: i64,
    pub prior: PriorState,
}

#[derive(Debug, thiserror::Error)]
#[error("cannot undo {description}: {source}")]
pub struct UndoRestoreError {
    pub description: String,
    #[source]
    pub source: HandlerError,
}

/// Bounded LIFO of snapshots. Pushing past the limit drops the oldest entry.
#[derive(Debug, Clone)]
pub struct UndoStack {
    entries: VecDeque<UndoEntry>,
    limit: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoStack {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&UndoEntry> {
        self.entries.back()
    }

    pub fn push(&mut self, entry: UndoEntry) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        debug!(
            kind = entry.kind.noun(),
            id = entry.entity_id,
            depth = self.entries.len() + 1,
            "undo snapshot"
        );
        self.entries.push_back(entry);
    }

    /// Drops the newest entry. Used when the mutation it guarded failed.
    pub fn discard_latest(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }

    /// Reapplies the newest snapshot. `Ok(None)` when there is nothing to
    /// undo. A failed restore puts the entry back.
    pub fn undo(
        &mut self,
        store: &dyn EntityStore,
    ) -> Result<Option<UndoEntry>, UndoRestoreError> {
        let Some(entry) = self.entries.pop_back() else {
            return Ok(None);
        };
        let restored = handler_for(entry.prior.kind())
            .ok_or_else(|| {
                HandlerError::Validation(format!("{} edits cannot be undone", entry.kind.noun()))
            })
            .and_then(|handler| handler.apply_prior_state(store, &entry.prior));
        match restored {
            Ok(()) => Ok(Some(entry)),
            Err(source) => {
                error!(
                    kind = entry.kind.noun(),
                    id = entry.entity_id,
                    error = %source,
                    "undo restore failed"
                );
                let description = entry.description.clone();
                self.entries.push_back(entry);
                Err(UndoRestoreError {
                    description,
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PriorState, UndoEntry, UndoStack};
    use micasa_app::{FormKind, Vendor, VendorId};
    use time::OffsetDateTime;

    fn entry(id: i64) -> UndoEntry {
        UndoEntry {
            description: format!("vendor \"V{id}\""),
            kind: FormKind::Vendor,
            entity_id: id,
            prior: PriorState::Vendor(Vendor {
                id: VendorId::new(id),
                name: format!("V{id}"),
                contact_name: String::new(),
                email: String::new(),
                phone: String::new(),
                website: String::new(),
                notes: String::new(),
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
                deleted_at: None,
            }),
        }
    }

    #[test]
    fn push_beyond_limit_drops_oldest() {
        let mut stack = UndoStack::new(3);
        for id in 1..=5 {
            stack.push(entry(id));
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.latest().map(|entry| entry.entity_id), Some(5));
        stack.discard_latest();
        stack.discard_latest();
        assert_eq!(stack.latest().map(|entry| entry.entity_id), Some(3));
    }

    #[test]
    fn default_limit_is_fifty() {
        let stack = UndoStack::default();
        assert_eq!(stack.limit(), 50);
        assert!(stack.is_empty());
        assert_eq!(UndoStack::new(0).limit(), 1);
    }

    #[test]
    fn prior_state_reports_kind() {
        assert_eq!(entry(1).prior.kind(), FormKind::Vendor);
    }
}
