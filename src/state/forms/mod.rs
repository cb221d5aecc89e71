//! Editor domain layer
//!
//! Type-safe editors for starting and editing visits and for uploading,
//! editing and replacing documents.

mod field;
mod form_state;

pub use field::InputField;
pub use form_state::{
    DocumentEditForm, DocumentReplaceForm, DocumentUploadForm, EditorState, VisitEditForm,
    VisitStartForm,
};
