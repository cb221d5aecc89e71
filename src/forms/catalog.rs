//! Form template catalog with primary/fallback source selection

use super::model::{FormTemplate, TemplateId};
use crate::api::{ApiError, ClinicApi, DataSource, Result};
use tracing::{info, warn};

/// Templates returned by one catalog fetch, with the source that served them
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFetch {
    pub templates: Vec<FormTemplate>,
    pub source: DataSource,
}

/// Resolve the clinician's specialty, then list its templates.
///
/// Starting from `start`, a failure of either request on the primary source
/// retries the whole flow once on the fallback source. A fallback failure is
/// returned to the caller.
pub async fn fetch_templates(
    api: &dyn ClinicApi,
    start: DataSource,
    clinician_id: &str,
) -> Result<CatalogFetch> {
    match fetch_from(api, start, clinician_id).await {
        Ok(templates) => Ok(CatalogFetch {
            templates,
            source: start,
        }),
        Err(e) if start == DataSource::Primary => {
            warn!(
                status = ?e.status(),
                "Template list failed on {} source, retrying on {}: {e}",
                start.label(),
                DataSource::Fallback.label()
            );
            let templates = fetch_from(api, DataSource::Fallback, clinician_id).await?;
            info!(
                "Loaded {} templates from {} source",
                templates.len(),
                DataSource::Fallback.label()
            );
            Ok(CatalogFetch {
                templates,
                source: DataSource::Fallback,
            })
        }
        Err(e) => Err(e),
    }
}

async fn fetch_from(
    api: &dyn ClinicApi,
    source: DataSource,
    clinician_id: &str,
) -> Result<Vec<FormTemplate>> {
    let clinician = api.get_clinician(source, clinician_id).await?;
    let specialty_id = clinician
        .specialty_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ApiError::MalformedResponse(format!("clinician {clinician_id} has no specialty"))
        })?;
    api.list_form_templates(source, &specialty_id).await
}

/// What happened to a pending template id once the list arrived
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOutcome {
    /// No template id was pending
    None,
    Selected(FormTemplate),
    NotFound(TemplateId),
}

/// Loaded templates of the current panel session.
///
/// Once a fetch has been served by the fallback source, the catalog keeps
/// using it for the rest of the session.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    pub source: DataSource,
    pub templates: Vec<FormTemplate>,
    pending_template_id: Option<TemplateId>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a template to be selected as soon as the list is loaded
    pub fn set_pending(&mut self, template_id: TemplateId) {
        self.pending_template_id = Some(template_id);
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }

    /// Store a fetch result and settle the pending template id
    pub fn apply(&mut self, fetch: CatalogFetch) -> PendingOutcome {
        if fetch.source == DataSource::Fallback {
            self.source = DataSource::Fallback;
        }
        self.templates = fetch.templates;

        match self.pending_template_id.take() {
            None => PendingOutcome::None,
            Some(id) => match self.find(id) {
                Some(template) => PendingOutcome::Selected(template.clone()),
                None => PendingOutcome::NotFound(id),
            },
        }
    }

    pub fn find(&self, template_id: TemplateId) -> Option<&FormTemplate> {
        self.templates.iter().find(|t| t.id == template_id)
    }
}
