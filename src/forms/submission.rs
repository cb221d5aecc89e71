//! Flattening filled forms into submission records and posting them

use super::model::{FieldId, FormSection, SectionId, TemplateId, UNKNOWN_SECTION};
use super::responses::FormResponses;
use super::validator::{validate, ValidationReport};
use crate::api::{ApiError, ClinicApi};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Status every submitted form is recorded with
pub const COMPLETED_STATUS: &str = "COMPLETED";

/// What the user asked the submitter to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Save,
    GeneratePdf,
}

impl SubmitMode {
    pub fn progress_label(&self) -> &'static str {
        match self {
            Self::Save => "Saving form...",
            Self::GeneratePdf => "Generating PDF...",
        }
    }
}

/// One answer as sent to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedAnswer {
    #[serde(rename = "idChamp")]
    pub field_id: FieldId,
    #[serde(rename = "valeur")]
    pub value: String,
    #[serde(rename = "idSection")]
    pub section_id: SectionId,
}

/// A completed form as posted to the save and PDF endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    #[serde(rename = "idPatient")]
    pub patient_id: String,
    #[serde(rename = "idVisite")]
    pub visit_id: String,
    #[serde(rename = "idTemplate")]
    pub template_id: TemplateId,
    #[serde(rename = "idMedecin")]
    pub clinician_id: String,
    #[serde(rename = "statut")]
    pub status: String,
    #[serde(rename = "reponses")]
    pub answers: Vec<SubmittedAnswer>,
}

/// Identifiers a submission needs besides the answers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitContext {
    pub patient_id: Option<String>,
    pub visit_id: Option<String>,
    pub template_id: Option<TemplateId>,
    pub clinician_id: Option<String>,
}

/// Local failure detected before any request is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{} required field(s) are empty", .0.invalid_count)]
    Invalid(ValidationReport),

    #[error("No patient is loaded")]
    MissingPatient,

    #[error("No visit is selected for this form")]
    MissingVisit,

    #[error("No form template is selected")]
    MissingTemplate,

    #[error("No clinician is configured for this session")]
    MissingClinician,

    #[error("Clinician id '{0}' is not a valid identifier")]
    MalformedClinicianId(String),
}

/// Server answer to a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved { form_id: i64 },
    PdfReady { url: String },
}

/// First section in pre-order whose own field list holds `field_id`
pub fn owning_section(sections: &[FormSection], field_id: FieldId) -> SectionId {
    fn search(sections: &[FormSection], field_id: FieldId) -> Option<SectionId> {
        sections.iter().find_map(|section| {
            if section.contains_field(field_id) {
                Some(section.id)
            } else {
                search(&section.children, field_id)
            }
        })
    }

    search(sections, field_id).unwrap_or(UNKNOWN_SECTION)
}

/// One triple per stored answer, empty selections included
pub fn flatten_responses(
    sections: &[FormSection],
    responses: &FormResponses,
) -> Vec<SubmittedAnswer> {
    responses
        .iter()
        .map(|(field_id, value)| SubmittedAnswer {
            field_id,
            value: value.to_string(),
            section_id: owning_section(sections, field_id),
        })
        .collect()
}

/// Validate the answers and check every precondition, then build the record
pub fn build_submission(
    ctx: &SubmitContext,
    sections: &[FormSection],
    responses: &FormResponses,
) -> Result<SubmissionRecord, SubmitError> {
    let report = validate(sections, responses);
    if !report.is_valid() {
        return Err(SubmitError::Invalid(report));
    }

    let patient_id = present(&ctx.patient_id).ok_or(SubmitError::MissingPatient)?;
    let visit_id = present(&ctx.visit_id).ok_or(SubmitError::MissingVisit)?;
    let template_id = ctx.template_id.ok_or(SubmitError::MissingTemplate)?;
    let clinician_id = present(&ctx.clinician_id).ok_or(SubmitError::MissingClinician)?;
    let clinician_id = Uuid::parse_str(clinician_id)
        .map_err(|_| SubmitError::MalformedClinicianId(clinician_id.to_string()))?;

    Ok(SubmissionRecord {
        patient_id: patient_id.to_string(),
        visit_id: visit_id.to_string(),
        template_id,
        clinician_id: clinician_id.hyphenated().to_string(),
        status: COMPLETED_STATUS.to_string(),
        answers: flatten_responses(sections, responses),
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Post the record to the save or PDF endpoint
pub async fn submit(
    api: &dyn ClinicApi,
    mode: SubmitMode,
    record: &SubmissionRecord,
) -> Result<SubmitOutcome, ApiError> {
    match mode {
        SubmitMode::Save => {
            let form_id = api.submit_form(record).await?;
            info!(
                "Saved form {form_id} for visit {} ({} answers)",
                record.visit_id,
                record.answers.len()
            );
            Ok(SubmitOutcome::Saved { form_id })
        }
        SubmitMode::GeneratePdf => {
            let url = api.generate_form_pdf(record).await?;
            info!("Generated PDF for visit {}: {url}", record.visit_id);
            Ok(SubmitOutcome::PdfReady { url })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockClinicApi;
    use crate::forms::model::field_slots;
    use crate::forms::model::fixtures::*;
    use pretty_assertions::assert_eq;

    const CLINICIAN: &str = "0d9c7c36-2a44-4e4c-9d1b-8f0f5b1e2c11";

    fn ctx() -> SubmitContext {
        SubmitContext {
            patient_id: Some("p1".to_string()),
            visit_id: Some("v1".to_string()),
            template_id: Some(4),
            clinician_id: Some(CLINICIAN.to_string()),
        }
    }

    fn filled() -> FormResponses {
        let mut responses = FormResponses::default();
        responses.set(101, "Douleur thoracique");
        responses.set(211, "12/8");
        responses.set(301, "RAS");
        responses
    }

    mod flattening {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_owning_section_in_nested_tree() {
            let tree = consultation_tree();
            assert_eq!(owning_section(&tree, 101), 10);
            assert_eq!(owning_section(&tree, 201), 20);
            assert_eq!(owning_section(&tree, 211), 21);
            assert_eq!(owning_section(&tree, 301), 30);
        }

        #[test]
        fn test_unknown_field_gets_section_zero() {
            assert_eq!(owning_section(&consultation_tree(), 999), UNKNOWN_SECTION);
        }

        #[test]
        fn test_every_answer_maps_to_its_literal_section() {
            let tree = consultation_tree();
            let mut responses = FormResponses::default();
            for slot in field_slots(&tree) {
                responses.set(slot.field.id, "x");
            }
            responses.set(999, "orphan");

            let answers = flatten_responses(&tree, &responses);
            assert_eq!(answers.len(), responses.len());
            for answer in answers {
                let expected = field_slots(&tree)
                    .into_iter()
                    .find(|s| s.field.id == answer.field_id)
                    .map_or(UNKNOWN_SECTION, |s| s.section_id);
                assert_eq!(answer.section_id, expected);
            }
        }

        #[test]
        fn test_empty_selection_is_submitted() {
            let tree = consultation_tree();
            let mut responses = filled();
            responses.toggle_option(102, "Toux", true);
            responses.toggle_option(102, "Toux", false);

            let answers = flatten_responses(&tree, &responses);
            let symptoms = answers.iter().find(|a| a.field_id == 102).unwrap();
            assert_eq!(symptoms.value, "");
            assert_eq!(symptoms.section_id, 10);
        }
    }

    mod preconditions {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_valid_submission() {
            let record = build_submission(&ctx(), &consultation_tree(), &filled()).unwrap();
            assert_eq!(record.status, COMPLETED_STATUS);
            assert_eq!(record.template_id, 4);
            assert_eq!(record.clinician_id, CLINICIAN);
            assert_eq!(record.answers.len(), 3);
        }

        #[test]
        fn test_invalid_answers_come_first() {
            let mut responses = filled();
            responses.remove(101);
            let err = build_submission(&SubmitContext::default(), &consultation_tree(), &responses)
                .unwrap_err();

            match err {
                SubmitError::Invalid(report) => {
                    assert_eq!(report.first().map(|f| f.field_id), Some(101));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_missing_identifiers() {
            let tree = consultation_tree();
            let cases = [
                (SubmitContext { patient_id: None, ..ctx() }, SubmitError::MissingPatient),
                (
                    SubmitContext { visit_id: Some("  ".into()), ..ctx() },
                    SubmitError::MissingVisit,
                ),
                (SubmitContext { template_id: None, ..ctx() }, SubmitError::MissingTemplate),
                (
                    SubmitContext { clinician_id: None, ..ctx() },
                    SubmitError::MissingClinician,
                ),
            ];

            for (context, expected) in cases {
                assert_eq!(
                    build_submission(&context, &tree, &filled()).unwrap_err(),
                    expected
                );
            }
        }

        #[test]
        fn test_malformed_clinician_id_is_never_substituted() {
            let context = SubmitContext {
                clinician_id: Some("dr-martin".to_string()),
                ..ctx()
            };
            assert_eq!(
                build_submission(&context, &consultation_tree(), &filled()).unwrap_err(),
                SubmitError::MalformedClinicianId("dr-martin".to_string())
            );
        }
    }

    mod posting {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_save_mode_posts_record() {
            let record = build_submission(&ctx(), &consultation_tree(), &filled()).unwrap();
            let mut api = MockClinicApi::new();
            api.expect_submit_form().times(1).returning(|_| Ok(42));
            api.expect_generate_form_pdf().never();

            let outcome = submit(&api, SubmitMode::Save, &record).await.unwrap();
            assert_eq!(outcome, SubmitOutcome::Saved { form_id: 42 });
        }

        #[tokio::test]
        async fn test_pdf_mode_returns_url() {
            let record = build_submission(&ctx(), &consultation_tree(), &filled()).unwrap();
            let mut api = MockClinicApi::new();
            api.expect_generate_form_pdf()
                .times(1)
                .returning(|_| Ok("http://files/f.pdf".to_string()));
            api.expect_submit_form().never();

            let outcome = submit(&api, SubmitMode::GeneratePdf, &record).await.unwrap();
            assert_eq!(
                outcome,
                SubmitOutcome::PdfReady {
                    url: "http://files/f.pdf".to_string()
                }
            );
        }

        #[tokio::test]
        async fn test_server_message_is_kept() {
            let record = build_submission(&ctx(), &consultation_tree(), &filled()).unwrap();
            let mut api = MockClinicApi::new();
            api.expect_submit_form().returning(|_| {
                Err(ApiError::Status {
                    status: 422,
                    message: Some("Visite cloturee".to_string()),
                })
            });

            let err = submit(&api, SubmitMode::Save, &record).await.unwrap_err();
            assert_eq!(err.user_message(), "Visite cloturee");
        }
    }
}
