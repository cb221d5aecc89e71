//! Application state definitions

use super::form_panel::FormPanel;
use super::forms::EditorState;
use crate::api::{Document, Patient, Visit};
use std::collections::VecDeque;

/// Current view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Visits,
    Documents,
    Forms,
    /// Visit or document editor, shown over the tab it was opened from
    Editor,
}

impl View {
    /// Tabs of the patient profile, in display order
    pub const TABS: [View; 3] = [View::Visits, View::Documents, View::Forms];

    pub fn is_form_view(&self) -> bool {
        matches!(self, View::Editor)
    }

    pub fn tab_index(&self) -> Option<usize> {
        Self::TABS.iter().position(|t| t == self)
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Visits => "Visits",
            View::Documents => "Documents",
            View::Forms => "Forms",
            View::Editor => "Editor",
        }
    }

    pub fn next_tab(&self) -> View {
        match self.tab_index() {
            Some(i) => Self::TABS[(i + 1) % Self::TABS.len()],
            None => *self,
        }
    }
}

/// Something awaiting a yes/no confirmation before deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Visit(String),
    Document(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub target: DeleteTarget,
    /// Shown in the dialog, e.g. the document name
    pub label: String,
    /// true = "Delete" button highlighted, false = "Cancel"
    pub confirm_selected: bool,
}

impl PendingDelete {
    pub fn new(target: DeleteTarget, label: impl Into<String>) -> Self {
        Self {
            target,
            label: label.into(),
            confirm_selected: false,
        }
    }

    pub fn toggle(&mut self) {
        self.confirm_selected = !self.confirm_selected;
    }
}

/// Main application state
#[derive(Debug, Default)]
pub struct AppState {
    // Navigation
    pub current_view: View,
    pub view_history: Vec<View>,

    // Session
    pub patient_id: String,
    pub clinician_id: Option<String>,

    // Data
    pub patient: Option<Patient>,
    pub visits: Vec<Visit>,
    pub documents: Vec<Document>,

    // Selection
    pub visits_index: usize,
    pub documents_index: usize,

    // Editing
    pub editor: EditorState,
    pub form_panel: FormPanel,

    // Dialogs
    pub pending_delete: Option<PendingDelete>,
    error_queue: VecDeque<String>,
}

impl AppState {
    pub fn new(patient_id: String, clinician_id: Option<String>) -> Self {
        Self {
            patient_id,
            clinician_id,
            ..Default::default()
        }
    }

    /// Queue an error for the modal error dialog
    pub fn push_error(&mut self, message: String) {
        self.error_queue.push_back(message);
    }

    pub fn has_errors(&self) -> bool {
        !self.error_queue.is_empty()
    }

    /// Error shown by the dialog
    pub fn current_error(&self) -> Option<&str> {
        self.error_queue.front().map(String::as_str)
    }

    /// Number of errors waiting behind the current one
    pub fn queued_errors(&self) -> usize {
        self.error_queue.len().saturating_sub(1)
    }

    pub fn dismiss_error(&mut self) {
        self.error_queue.pop_front();
    }

    fn selection(&mut self) -> Option<(&mut usize, usize)> {
        match self.current_view {
            View::Visits => Some((&mut self.visits_index, self.visits.len())),
            View::Documents => Some((&mut self.documents_index, self.documents.len())),
            _ => None,
        }
    }

    /// Move selection down in the current list
    pub fn move_selection_down(&mut self) {
        if let Some((index, max)) = self.selection() {
            if max > 0 && *index < max - 1 {
                *index += 1;
            }
        }
    }

    /// Move selection up in the current list
    pub fn move_selection_up(&mut self) {
        if let Some((index, _)) = self.selection() {
            *index = index.saturating_sub(1);
        }
    }

    /// Keep selections inside their lists after a reload
    pub fn clamp_selection(&mut self) {
        self.visits_index = self.visits_index.min(self.visits.len().saturating_sub(1));
        self.documents_index = self
            .documents_index
            .min(self.documents.len().saturating_sub(1));
    }

    pub fn selected_visit(&self) -> Option<&Visit> {
        self.visits.get(self.visits_index)
    }

    pub fn selected_document(&self) -> Option<&Document> {
        self.documents.get(self.documents_index)
    }

    /// Visits sorted newest first
    pub fn set_visits(&mut self, mut visits: Vec<Visit>) {
        visits.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        self.visits = visits;
        self.clamp_selection();
    }

    pub fn set_documents(&mut self, documents: Vec<Document>) {
        self.documents = documents;
        self.clamp_selection();
    }

    /// Clear editor state
    pub fn clear_form(&mut self) {
        self.editor = EditorState::None;
    }
}
