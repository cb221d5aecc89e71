//! Wire types for the clinical records API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which backend a request goes to.
///
/// Form templates and structures are served by a primary source with a
/// designated fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataSource {
    #[default]
    Primary,
    Fallback,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// A clinician (doctor) record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clinician {
    pub id: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "titre", default)]
    pub title: Option<String>,
    #[serde(rename = "idSpecialite", default)]
    pub specialty_id: Option<String>,
}

impl Clinician {
    /// "title first last", skipping empty parts
    pub fn display_name(&self) -> String {
        [
            self.title.as_deref().unwrap_or(""),
            &self.first_name,
            &self.last_name,
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Patient demographics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    #[serde(rename = "prenom")]
    pub first_name: String,
    #[serde(rename = "nom")]
    pub last_name: String,
    #[serde(rename = "dateNaissance", default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "sexe", default)]
    pub sex: Option<String>,
    #[serde(rename = "telephone", default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "adresse", default)]
    pub address: Option<String>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name.to_uppercase())
    }

    /// Age in whole years on `today`
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.birth_date.and_then(|birth| today.years_since(birth))
    }
}

/// Lifecycle status of a visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VisitStatus {
    InProgress,
    Completed,
    Other(String),
}

impl From<String> for VisitStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            _ => Self::Other(raw),
        }
    }
}

impl From<VisitStatus> for String {
    fn from(status: VisitStatus) -> Self {
        match status {
            VisitStatus::InProgress => "IN_PROGRESS".to_string(),
            VisitStatus::Completed => "COMPLETED".to_string(),
            VisitStatus::Other(raw) => raw,
        }
    }
}

impl VisitStatus {
    pub fn label(&self) -> &str {
        match self {
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
            Self::Other(raw) => raw,
        }
    }
}

/// A visit (consultation) of the patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    #[serde(rename = "idPatient")]
    pub patient_id: String,
    #[serde(rename = "idMedecin", default)]
    pub clinician_id: Option<String>,
    #[serde(rename = "dateDebut")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "dateFin", default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(rename = "motif", default)]
    pub reason: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(rename = "statut")]
    pub status: VisitStatus,
}

impl Visit {
    pub fn is_in_progress(&self) -> bool {
        self.status == VisitStatus::InProgress
    }
}

/// Body of a "start visit" request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVisit {
    #[serde(rename = "idMedecin")]
    pub clinician_id: String,
    #[serde(rename = "motif")]
    pub reason: String,
}

/// Body of a visit update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitUpdate {
    #[serde(rename = "motif")]
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A document attached to the patient record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "idPatient")]
    pub patient_id: String,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "dateUpload", default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Editable metadata of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    #[serde(rename = "nom")]
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

/// File content sent in multipart requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FilePayload {
    /// Build a payload, guessing the MIME type from the extension
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }
}

/// A new document upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub patient_id: String,
    pub metadata: DocumentMetadata,
    pub file: FilePayload,
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clinician_display_name() {
        let doctor = Clinician {
            id: "c1".to_string(),
            first_name: "Jeanne".to_string(),
            last_name: "Martin".to_string(),
            title: Some("Dr.".to_string()),
            specialty_id: None,
        };
        assert_eq!(doctor.display_name(), "Dr. Jeanne Martin");

        let untitled = Clinician {
            title: None,
            ..doctor
        };
        assert_eq!(untitled.display_name(), "Jeanne Martin");
    }

    #[test]
    fn test_visit_status_round_trip_through_strings() {
        let visit: Visit = serde_json::from_str(
            r#"{"id":"v1","idPatient":"p1","dateDebut":"2026-03-01T09:00:00Z","statut":"IN_PROGRESS"}"#,
        )
        .unwrap();
        assert!(visit.is_in_progress());
        assert_eq!(visit.reason, "");

        let other = VisitStatus::from("CANCELLED".to_string());
        assert_eq!(other.label(), "CANCELLED");
        assert_eq!(String::from(VisitStatus::Completed), "COMPLETED");
    }

    #[test]
    fn test_data_source_labels() {
        assert_eq!(DataSource::default().label(), "primary");
        assert_eq!(DataSource::Fallback.label(), "fallback");
    }

    #[test]
    fn test_patient_age() {
        let patient: Patient = serde_json::from_str(
            r#"{"id":"p1","prenom":"Ali","nom":"Benali","dateNaissance":"1990-06-15"}"#,
        )
        .unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 6, 14).unwrap();
        assert_eq!(patient.age_on(today), Some(35));
        assert_eq!(patient.full_name(), "Ali BENALI");
    }

    #[test]
    fn test_visit_update_skips_missing_note() {
        let update = VisitUpdate {
            reason: "Controle".to_string(),
            note: None,
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"motif": "Controle"})
        );
    }

    #[test]
    fn test_file_payload_mime_guess() {
        assert_eq!(FilePayload::new("bilan.PDF", vec![]).mime_type, "application/pdf");
        assert_eq!(FilePayload::new("radio.jpeg", vec![]).mime_type, "image/jpeg");
        assert_eq!(
            FilePayload::new("archive", vec![]).mime_type,
            "application/octet-stream"
        );
    }
}
