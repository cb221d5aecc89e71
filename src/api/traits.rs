//! Trait abstraction for the API client to enable mocking in tests

use super::error::Result;
use super::types::{
    Clinician, DataSource, Document, DocumentMetadata, DocumentUpload, FilePayload, NewVisit,
    Patient, Visit, VisitUpdate,
};
use crate::forms::{FormSection, FormTemplate, SubmissionRecord, TemplateId};
use async_trait::async_trait;

/// Operations the patient profile needs from the clinical records backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClinicApi: Send + Sync {
    /// Look up a clinician by id
    async fn get_clinician(&self, source: DataSource, clinician_id: &str) -> Result<Clinician>;

    /// List every clinician
    async fn list_clinicians(&self) -> Result<Vec<Clinician>>;

    /// Get patient demographics
    async fn get_patient(&self, patient_id: &str) -> Result<Patient>;

    /// List visits of a patient
    async fn list_visits(&self, patient_id: &str) -> Result<Vec<Visit>>;

    /// Start a new visit
    async fn start_visit(&self, patient_id: &str, visit: &NewVisit) -> Result<Visit>;

    /// Update reason and note of a visit
    async fn update_visit(&self, visit_id: &str, update: &VisitUpdate) -> Result<Visit>;

    /// Mark a visit as completed
    async fn end_visit(&self, visit_id: &str) -> Result<Visit>;

    /// Delete a visit
    async fn delete_visit(&self, visit_id: &str) -> Result<()>;

    /// Save the clinical note of a visit
    async fn save_visit_note(&self, visit_id: &str, note: &str) -> Result<()>;

    /// List documents of a patient
    async fn list_documents(&self, patient_id: &str) -> Result<Vec<Document>>;

    /// Upload a new document (multipart)
    async fn upload_document(&self, upload: &DocumentUpload) -> Result<Document>;

    /// Update name, description and type of a document
    async fn update_document(
        &self,
        document_id: &str,
        metadata: &DocumentMetadata,
    ) -> Result<Document>;

    /// Replace the file behind a document (multipart)
    async fn replace_document_file(&self, document_id: &str, file: &FilePayload)
        -> Result<Document>;

    /// Delete a document
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    /// List form templates of a specialty
    async fn list_form_templates(
        &self,
        source: DataSource,
        specialty_id: &str,
    ) -> Result<Vec<FormTemplate>>;

    /// Fetch the section tree of a template
    async fn get_form_structure(
        &self,
        source: DataSource,
        template_id: TemplateId,
    ) -> Result<Vec<FormSection>>;

    /// Save a filled form; returns the new form record id
    async fn submit_form(&self, record: &SubmissionRecord) -> Result<i64>;

    /// Generate a PDF from a filled form; returns the PDF URL
    async fn generate_form_pdf(&self, record: &SubmissionRecord) -> Result<String>;
}
