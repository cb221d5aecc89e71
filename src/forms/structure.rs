//! Section tree loading with a per-call fallback

use super::model::{sort_sections, FormSection, TemplateId};
use crate::api::{ClinicApi, DataSource, Result};
use tracing::{debug, warn};

/// A loaded section tree, siblings already in display order
#[derive(Debug, Clone, PartialEq)]
pub struct StructureFetch {
    pub sections: Vec<FormSection>,
    pub source: DataSource,
}

/// Fetch the structure of a template from the primary source, falling back
/// once if that fails.
pub async fn load_structure(api: &dyn ClinicApi, template_id: TemplateId) -> Result<StructureFetch> {
    let (mut sections, source) = match api
        .get_form_structure(DataSource::Primary, template_id)
        .await
    {
        Ok(sections) => (sections, DataSource::Primary),
        Err(e) => {
            warn!(
                status = ?e.status(),
                "Structure of template {template_id} failed on {} source: {e}",
                DataSource::Primary.label()
            );
            let sections = api
                .get_form_structure(DataSource::Fallback, template_id)
                .await?;
            (sections, DataSource::Fallback)
        }
    };

    sort_sections(&mut sections);
    debug!(
        "Loaded {} sections of template {template_id} from {} source",
        sections.len(),
        source.label()
    );
    Ok(StructureFetch { sections, source })
}
