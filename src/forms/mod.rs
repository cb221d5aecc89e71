//! Dynamic medical forms: templates, section trees, answers, validation and submission

mod catalog;
mod model;
mod responses;
mod structure;
mod submission;
mod validator;

pub use catalog::{fetch_templates, CatalogFetch, PendingOutcome, TemplateCatalog};
pub use model::{
    field_slots, FieldSlot, FormField, FormSection, FormTemplate, InputKind, TemplateId,
};
pub use responses::FormResponses;
pub use structure::{load_structure, StructureFetch};
pub use submission::{
    build_submission, submit, SubmissionRecord, SubmitContext, SubmitError, SubmitMode,
    SubmitOutcome,
};
pub use validator::ValidationReport;

#[cfg(test)]
pub(crate) use model::fixtures;
#[cfg(test)]
pub(crate) use submission::{SubmittedAnswer, COMPLETED_STATUS};
