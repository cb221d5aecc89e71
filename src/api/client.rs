//! REST client for the clinical records backend
//!
//! All endpoints live under `base_url`. Form templates, form structures and
//! clinician lookups may also be served from `fallback_base_url` when the
//! caller asks for [`DataSource::Fallback`].

use super::error::{ApiError, Result};
use super::traits::ClinicApi;
use super::types::{
    Clinician, DataSource, Document, DocumentMetadata, DocumentUpload, FilePayload, NewVisit,
    Patient, Visit, VisitUpdate,
};
use crate::forms::{FormSection, FormTemplate, SubmissionRecord, TemplateId};
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Connection settings of the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub fallback_base_url: String,
    pub timeout_secs: Option<u64>,
}

/// Client for the clinical records REST API
pub struct ApiClient {
    config: ApiConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveFormResponse {
    #[serde(rename = "idFormulaire", default)]
    form_id: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PdfResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "pdfUrl", default)]
    pdf_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            config: ApiConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                fallback_base_url: config.fallback_base_url.trim_end_matches('/').to_string(),
                ..config
            },
            client,
        })
    }

    fn base(&self, source: DataSource) -> &str {
        match source {
            DataSource::Primary => &self.config.base_url,
            DataSource::Fallback => &self.config.fallback_base_url,
        }
    }

    fn url(&self, source: DataSource, path: &str) -> String {
        let url = format!("{}{}", self.base(source), path);
        debug!("API request to {url}");
        url
    }

    fn file_part(file: &FilePayload) -> Result<multipart::Part> {
        Ok(multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)?)
    }

    // ==================== Helper Methods ====================

    /// Turn a non-success status into [`ApiError::Status`], reading `message` from the body
    async fn check_status(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        Err(ApiError::Status { status, message })
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check_status(response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
    }

    async fn handle_empty(response: Response) -> Result<()> {
        Self::check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ClinicApi for ApiClient {
    async fn get_clinician(&self, source: DataSource, clinician_id: &str) -> Result<Clinician> {
        let url = self.url(
            source,
            &format!("/medecins/{}", urlencoding::encode(clinician_id)),
        );
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn list_clinicians(&self) -> Result<Vec<Clinician>> {
        let url = self.url(DataSource::Primary, "/medecins");
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn get_patient(&self, patient_id: &str) -> Result<Patient> {
        let url = self.url(
            DataSource::Primary,
            &format!("/patients/{}", urlencoding::encode(patient_id)),
        );
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn list_visits(&self, patient_id: &str) -> Result<Vec<Visit>> {
        let url = self.url(
            DataSource::Primary,
            &format!("/patients/{}/visites", urlencoding::encode(patient_id)),
        );
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn start_visit(&self, patient_id: &str, visit: &NewVisit) -> Result<Visit> {
        let url = self.url(
            DataSource::Primary,
            &format!("/patients/{}/visites", urlencoding::encode(patient_id)),
        );
        let response = self.client.post(&url).json(visit).send().await?;
        Self::handle_response(response).await
    }

    async fn update_visit(&self, visit_id: &str, update: &VisitUpdate) -> Result<Visit> {
        let url = self.url(
            DataSource::Primary,
            &format!("/visites/{}", urlencoding::encode(visit_id)),
        );
        let response = self.client.put(&url).json(update).send().await?;
        Self::handle_response(response).await
    }

    async fn end_visit(&self, visit_id: &str) -> Result<Visit> {
        let url = self.url(
            DataSource::Primary,
            &format!("/visites/{}/terminer", urlencoding::encode(visit_id)),
        );
        let response = self.client.put(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn delete_visit(&self, visit_id: &str) -> Result<()> {
        let url = self.url(
            DataSource::Primary,
            &format!("/visites/{}", urlencoding::encode(visit_id)),
        );
        let response = self.client.delete(&url).send().await?;
        Self::handle_empty(response).await
    }

    async fn save_visit_note(&self, visit_id: &str, note: &str) -> Result<()> {
        let url = self.url(
            DataSource::Primary,
            &format!("/visites/{}/note", urlencoding::encode(visit_id)),
        );
        let response = self
            .client
            .put(&url)
            .json(&serde_json::json!({ "note": note }))
            .send()
            .await?;
        Self::handle_empty(response).await
    }

    async fn list_documents(&self, patient_id: &str) -> Result<Vec<Document>> {
        let url = self.url(
            DataSource::Primary,
            &format!("/patients/{}/documents", urlencoding::encode(patient_id)),
        );
        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<Document> {
        let url = self.url(DataSource::Primary, "/documents");
        let form = multipart::Form::new()
            .part("file", Self::file_part(&upload.file)?)
            .text("nom", upload.metadata.name.clone())
            .text("description", upload.metadata.description.clone())
            .text("type", upload.metadata.doc_type.clone())
            .text("idPatient", upload.patient_id.clone());

        let response = self.client.post(&url).multipart(form).send().await?;
        Self::handle_response(response).await
    }

    async fn update_document(
        &self,
        document_id: &str,
        metadata: &DocumentMetadata,
    ) -> Result<Document> {
        let url = self.url(
            DataSource::Primary,
            &format!("/documents/{}", urlencoding::encode(document_id)),
        );
        let response = self.client.put(&url).json(metadata).send().await?;
        Self::handle_response(response).await
    }

    async fn replace_document_file(
        &self,
        document_id: &str,
        file: &FilePayload,
    ) -> Result<Document> {
        let url = self.url(
            DataSource::Primary,
            &format!("/documents/{}/fichier", urlencoding::encode(document_id)),
        );
        let form = multipart::Form::new().part("file", Self::file_part(file)?);
        let response = self.client.put(&url).multipart(form).send().await?;
        Self::handle_response(response).await
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let url = self.url(
            DataSource::Primary,
            &format!("/documents/{}", urlencoding::encode(document_id)),
        );
        let response = self.client.delete(&url).send().await?;
        Self::handle_empty(response).await
    }

    async fn list_form_templates(
        &self,
        source: DataSource,
        specialty_id: &str,
    ) -> Result<Vec<FormTemplate>> {
        let url = self.url(source, "/templates");
        let response = self
            .client
            .get(&url)
            .query(&[("specialite", specialty_id)])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn get_form_structure(
        &self,
        source: DataSource,
        template_id: TemplateId,
    ) -> Result<Vec<FormSection>> {
        let url = self.url(source, &format!("/templates/{template_id}/structure"));
        let response = self.client.get(&url).send().await?;
        let body: serde_json::Value = Self::handle_response(response).await?;

        if !body.is_array() {
            let shape = match body {
                serde_json::Value::Null => "null",
                serde_json::Value::Bool(_) => "a boolean",
                serde_json::Value::Number(_) => "a number",
                serde_json::Value::String(_) => "a string",
                serde_json::Value::Object(_) => "an object",
                serde_json::Value::Array(_) => "an array",
            };
            return Err(ApiError::MalformedResponse(format!(
                "expected an array of sections for template {template_id}, got {shape}"
            )));
        }

        serde_json::from_value(body).map_err(|e| {
            ApiError::MalformedResponse(format!(
                "invalid section in structure of template {template_id}: {e}"
            ))
        })
    }

    async fn submit_form(&self, record: &SubmissionRecord) -> Result<i64> {
        let url = self.url(DataSource::Primary, "/formulaires");
        let response = self.client.post(&url).json(record).send().await?;
        let body: SaveFormResponse = Self::handle_response(response).await?;
        body.form_id.ok_or(ApiError::Rejected(body.message))
    }

    async fn generate_form_pdf(&self, record: &SubmissionRecord) -> Result<String> {
        let url = self.url(DataSource::Primary, "/formulaires/pdf");
        let response = self.client.post(&url).json(record).send().await?;
        let body: PdfResponse = Self::handle_response(response).await?;
        match body.pdf_url {
            Some(pdf_url) if body.success && !pdf_url.is_empty() => Ok(pdf_url),
            _ => Err(ApiError::Rejected(body.message)),
        }
    }
}
