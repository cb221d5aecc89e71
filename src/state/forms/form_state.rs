//! Editor state management and editor structs for visits and documents

use super::field::InputField;
use crate::api::{Document, DocumentMetadata, NewVisit, Visit, VisitUpdate};
use std::path::PathBuf;

/// Trait for common editor operations
pub trait Form {
    fn fields(&self) -> Vec<&InputField>;
    fn fields_mut(&mut self) -> Vec<&mut InputField>;
    fn active_field(&self) -> usize;
    fn set_active_field(&mut self, index: usize);

    fn field_count(&self) -> usize {
        self.fields().len()
    }
    fn next_field(&mut self) {
        let count = self.field_count();
        let current = self.active_field();
        self.set_active_field((current + 1) % count);
    }
    fn prev_field(&mut self) {
        let count = self.field_count();
        let current = self.active_field();
        if current == 0 {
            self.set_active_field(count - 1);
        } else {
            self.set_active_field(current - 1);
        }
    }
    fn get_active_field_mut(&mut self) -> Option<&mut InputField> {
        let index = self.active_field();
        self.fields_mut().into_iter().nth(index)
    }
    fn get_field(&self, index: usize) -> Option<&InputField> {
        self.fields().into_iter().nth(index)
    }
}

/// The editor currently shown, if any
#[derive(Debug, Clone, Default)]
pub enum EditorState {
    #[default]
    None,
    VisitStart(VisitStartForm),
    VisitEdit(VisitEditForm),
    DocumentUpload(DocumentUploadForm),
    DocumentEdit(DocumentEditForm),
    DocumentReplace(DocumentReplaceForm),
}

impl EditorState {
    pub fn is_open(&self) -> bool {
        !matches!(self, EditorState::None)
    }

    fn form(&self) -> Option<&dyn Form> {
        match self {
            EditorState::None => None,
            EditorState::VisitStart(f) => Some(f),
            EditorState::VisitEdit(f) => Some(f),
            EditorState::DocumentUpload(f) => Some(f),
            EditorState::DocumentEdit(f) => Some(f),
            EditorState::DocumentReplace(f) => Some(f),
        }
    }

    fn form_mut(&mut self) -> Option<&mut dyn Form> {
        match self {
            EditorState::None => None,
            EditorState::VisitStart(f) => Some(f),
            EditorState::VisitEdit(f) => Some(f),
            EditorState::DocumentUpload(f) => Some(f),
            EditorState::DocumentEdit(f) => Some(f),
            EditorState::DocumentReplace(f) => Some(f),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EditorState::None => "",
            EditorState::VisitStart(_) => "Start Visit",
            EditorState::VisitEdit(_) => "Edit Visit",
            EditorState::DocumentUpload(_) => "Upload Document",
            EditorState::DocumentEdit(_) => "Edit Document",
            EditorState::DocumentReplace(_) => "Replace File",
        }
    }

    pub fn fields(&self) -> Vec<&InputField> {
        self.form().map(|f| f.fields()).unwrap_or_default()
    }

    pub fn active_field(&self) -> usize {
        self.form().map_or(0, |f| f.active_field())
    }

    pub fn next_field(&mut self) {
        if let Some(form) = self.form_mut() {
            form.next_field();
        }
    }

    pub fn prev_field(&mut self) {
        if let Some(form) = self.form_mut() {
            form.prev_field();
        }
    }

    pub fn get_active_field_mut(&mut self) -> Option<&mut InputField> {
        self.form_mut().and_then(|f| f.get_active_field_mut())
    }

    pub fn is_active_field_multiline(&self) -> bool {
        self.form()
            .and_then(|f| f.get_field(f.active_field()))
            .is_some_and(|f| f.is_multiline)
    }
}

macro_rules! impl_form {
    ($form:ty, [$($field:ident),+]) => {
        impl Form for $form {
            fn fields(&self) -> Vec<&InputField> {
                vec![$(&self.$field),+]
            }
            fn fields_mut(&mut self) -> Vec<&mut InputField> {
                vec![$(&mut self.$field),+]
            }
            fn active_field(&self) -> usize {
                self.active_field_index
            }
            fn set_active_field(&mut self, index: usize) {
                self.active_field_index = index.min(self.field_count() - 1);
            }
        }
    };
}

// Visit Start Form
#[derive(Debug, Clone)]
pub struct VisitStartForm {
    pub reason: InputField,
    pub active_field_index: usize,
}

impl VisitStartForm {
    pub fn new() -> Self {
        Self {
            reason: InputField::text("reason", "Reason", false),
            active_field_index: 0,
        }
    }

    pub fn to_request(&self, clinician_id: &str) -> Result<NewVisit, String> {
        if self.reason.trimmed().is_empty() {
            return Err("Reason is required".to_string());
        }
        Ok(NewVisit {
            clinician_id: clinician_id.to_string(),
            reason: self.reason.trimmed().to_string(),
        })
    }
}

impl Default for VisitStartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl_form!(VisitStartForm, [reason]);

// Visit Edit Form
#[derive(Debug, Clone)]
pub struct VisitEditForm {
    pub visit_id: String,
    original_note: String,
    pub reason: InputField,
    pub note: InputField,
    pub active_field_index: usize,
}

impl VisitEditForm {
    pub fn from_visit(visit: &Visit) -> Self {
        Self {
            visit_id: visit.id.clone(),
            original_note: visit.note.clone().unwrap_or_default(),
            reason: InputField::text_with_value("reason", "Reason", visit.reason.clone(), false),
            note: InputField::text_with_value(
                "note",
                "Clinical note",
                visit.note.clone().unwrap_or_default(),
                true,
            ),
            active_field_index: 0,
        }
    }

    /// Reason update; the note is saved separately when it changed
    pub fn to_update(&self) -> Result<VisitUpdate, String> {
        if self.reason.trimmed().is_empty() {
            return Err("Reason is required".to_string());
        }
        Ok(VisitUpdate {
            reason: self.reason.trimmed().to_string(),
            note: None,
        })
    }

    /// New note text, if it differs from the one loaded
    pub fn changed_note(&self) -> Option<&str> {
        (self.note.as_text() != self.original_note).then(|| self.note.as_text())
    }
}

impl_form!(VisitEditForm, [reason, note]);

// Document Upload Form
#[derive(Debug, Clone)]
pub struct DocumentUploadForm {
    pub path: InputField,
    pub name: InputField,
    pub description: InputField,
    pub doc_type: InputField,
    pub active_field_index: usize,
}

impl DocumentUploadForm {
    pub fn new() -> Self {
        Self {
            path: InputField::text("path", "File path", false),
            name: InputField::text("name", "Name", false),
            description: InputField::text("description", "Description", true),
            doc_type: InputField::text("type", "Type", false),
            active_field_index: 0,
        }
    }

    pub fn file_path(&self) -> Result<PathBuf, String> {
        file_path(&self.path)
    }

    /// Metadata to send; the name defaults to the file name
    pub fn metadata(&self) -> Result<DocumentMetadata, String> {
        let path = self.file_path()?;
        let name = match self.name.trimmed() {
            "" => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| "Name is required".to_string())?,
            name => name.to_string(),
        };
        Ok(DocumentMetadata {
            name,
            description: self.description.trimmed().to_string(),
            doc_type: self.doc_type.trimmed().to_string(),
        })
    }
}

impl Default for DocumentUploadForm {
    fn default() -> Self {
        Self::new()
    }
}

impl_form!(DocumentUploadForm, [path, name, description, doc_type]);

// Document Edit Form
#[derive(Debug, Clone)]
pub struct DocumentEditForm {
    pub document_id: String,
    pub name: InputField,
    pub description: InputField,
    pub doc_type: InputField,
    pub active_field_index: usize,
}

impl DocumentEditForm {
    pub fn from_document(document: &Document) -> Self {
        Self {
            document_id: document.id.clone(),
            name: InputField::text_with_value("name", "Name", document.name.clone(), false),
            description: InputField::text_with_value(
                "description",
                "Description",
                document.description.clone().unwrap_or_default(),
                true,
            ),
            doc_type: InputField::text_with_value(
                "type",
                "Type",
                document.doc_type.clone().unwrap_or_default(),
                false,
            ),
            active_field_index: 0,
        }
    }

    pub fn metadata(&self) -> Result<DocumentMetadata, String> {
        if self.name.trimmed().is_empty() {
            return Err("Name is required".to_string());
        }
        Ok(DocumentMetadata {
            name: self.name.trimmed().to_string(),
            description: self.description.trimmed().to_string(),
            doc_type: self.doc_type.trimmed().to_string(),
        })
    }
}

impl_form!(DocumentEditForm, [name, description, doc_type]);

// Document Replace Form
#[derive(Debug, Clone)]
pub struct DocumentReplaceForm {
    pub document_id: String,
    pub document_name: String,
    pub path: InputField,
    pub active_field_index: usize,
}

impl DocumentReplaceForm {
    pub fn for_document(document: &Document) -> Self {
        Self {
            document_id: document.id.clone(),
            document_name: document.name.clone(),
            path: InputField::text("path", "New file path", false),
            active_field_index: 0,
        }
    }

    pub fn file_path(&self) -> Result<PathBuf, String> {
        file_path(&self.path)
    }
}

impl_form!(DocumentReplaceForm, [path]);

fn file_path(field: &InputField) -> Result<PathBuf, String> {
    match field.trimmed() {
        "" => Err("File path is required".to_string()),
        raw => Ok(PathBuf::from(raw)),
    }
}
