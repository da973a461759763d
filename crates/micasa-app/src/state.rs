// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppMode, FormDraft, FormKind, TabKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_tab: TabKind,
    pub show_deleted: bool,
    pub status_line: Option<String>,
    pub form: Option<FormDraft>,
    pub form_submission_count: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_tab: TabKind::Projects,
            show_deleted: false,
            status_line: None,
            form: None,
            form_submission_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    FirstTab,
    LastTab,
    SetActiveTab(TabKind),
    EnterEditMode,
    ExitToNav,
    OpenForm(FormDraft),
    /// The open draft was persisted by its handler.
    CompleteForm,
    CancelForm,
    ToggleDeleted,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    TabChanged(TabKind),
    DeletedFilterChanged(bool),
    FormOpened(FormKind),
    FormSubmitted(FormKind),
    FormCanceled(FormKind),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::FirstTab => self.set_tab(TabKind::ALL[0]),
            AppCommand::LastTab => self.set_tab(TabKind::ALL[TabKind::ALL.len() - 1]),
            AppCommand::SetActiveTab(tab) => self.set_tab(tab),
            AppCommand::EnterEditMode => {
                self.mode = AppMode::Edit;
                self.form = None;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("edit")]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                self.form = None;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("nav")]
            }
            AppCommand::OpenForm(draft) => {
                let kind = draft.kind;
                if kind.tab().is_some_and(|tab| tab != self.active_tab) {
                    return vec![self.set_status("form kind does not match the active tab")];
                }
                self.mode = AppMode::Form(kind);
                self.form = Some(draft);
                vec![AppEvent::ModeChanged(self.mode), AppEvent::FormOpened(kind)]
            }
            AppCommand::CompleteForm => {
                let AppMode::Form(kind) = self.mode else {
                    return vec![self.set_status("form not open")];
                };
                self.mode = AppMode::Edit;
                self.form = None;
                self.form_submission_count += 1;
                vec![
                    AppEvent::ModeChanged(self.mode),
                    AppEvent::FormSubmitted(kind),
                    self.set_status("saved"),
                ]
            }
            AppCommand::CancelForm => {
                let AppMode::Form(kind) = self.mode else {
                    return vec![self.set_status("form not open")];
                };
                self.mode = AppMode::Edit;
                self.form = None;
                vec![
                    AppEvent::ModeChanged(self.mode),
                    AppEvent::FormCanceled(kind),
                    self.set_status("form canceled"),
                ]
            }
            AppCommand::ToggleDeleted => {
                self.show_deleted = !self.show_deleted;
                let label = if self.show_deleted {
                    "deleted shown"
                } else {
                    "deleted hidden"
                };
                vec![
                    AppEvent::DeletedFilterChanged(self.show_deleted),
                    self.set_status(label),
                ]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let len = TabKind::ALL.len() as isize;
        let next = (self.active_tab.index() as isize + delta).rem_euclid(len) as usize;
        self.set_tab(TabKind::ALL[next])
    }

    fn set_tab(&mut self, tab: TabKind) -> Vec<AppEvent> {
        self.active_tab = tab;
        vec![AppEvent::TabChanged(tab)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
