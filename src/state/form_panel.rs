//! Form panel state: template list, structure editing and submission

use crate::api::{ApiError, DataSource};
use crate::forms::{
    build_submission, field_slots, CatalogFetch, FieldSlot, FormResponses, FormSection,
    FormTemplate, InputKind, PendingOutcome, StructureFetch, SubmissionRecord, SubmitContext,
    SubmitError, SubmitMode, TemplateCatalog, TemplateId, ValidationReport,
};

/// Lifecycle of the panel.
///
/// `Closed -> List -> Structure -> Submitting -> List` on success, back to
/// `Structure` on failure. `Esc` from `Structure` returns to `List`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelPhase {
    #[default]
    Closed,
    List,
    Structure,
    Submitting(SubmitMode),
}

/// Every request the panel starts carries the generation it was issued
/// under; results from older generations are dropped.
pub type RequestToken = u64;

#[derive(Debug, Clone, Default)]
pub struct FormPanel {
    pub phase: PanelPhase,
    generation: RequestToken,
    pub visit_id: Option<String>,
    pub catalog: TemplateCatalog,
    pub loading: bool,
    pub list_index: usize,
    pub selected_template: Option<FormTemplate>,
    pub sections: Vec<FormSection>,
    pub structure_source: DataSource,
    pub responses: FormResponses,
    /// Index into the pre-order field list
    pub focus: usize,
    /// Highlighted option of the focused multi-choice field
    pub option_cursor: usize,
    pub report: Option<ValidationReport>,
    /// Set once a submission succeeded, until the form is cleared
    pub completed: bool,
}

impl FormPanel {
    fn next_generation(&mut self) -> RequestToken {
        self.generation += 1;
        self.generation
    }

    fn is_current(&self, token: RequestToken) -> bool {
        token == self.generation && self.phase != PanelPhase::Closed
    }

    pub fn is_open(&self) -> bool {
        self.phase != PanelPhase::Closed
    }

    fn reset_structure(&mut self) {
        self.selected_template = None;
        self.sections.clear();
        self.structure_source = DataSource::Primary;
        self.responses.clear();
        self.focus = 0;
        self.option_cursor = 0;
        self.report = None;
        self.completed = false;
    }

    /// Open the panel for a visit and start loading templates
    pub fn open(&mut self, visit_id: String, pending: Option<TemplateId>) -> RequestToken {
        self.reset_structure();
        self.catalog = TemplateCatalog::new();
        if let Some(id) = pending {
            self.catalog.set_pending(id);
        }
        self.visit_id = Some(visit_id);
        self.list_index = 0;
        self.phase = PanelPhase::List;
        self.loading = true;
        self.next_generation()
    }

    /// Reload the template list of an open panel
    pub fn reload_templates(&mut self) -> RequestToken {
        self.loading = true;
        self.next_generation()
    }

    /// Source the next template fetch starts from
    pub fn catalog_source(&self) -> DataSource {
        self.catalog.source
    }

    /// Store a template fetch result.
    ///
    /// Returns `Ok(None)` for stale results.
    pub fn apply_templates(
        &mut self,
        token: RequestToken,
        result: Result<CatalogFetch, ApiError>,
    ) -> Result<Option<PendingOutcome>, ApiError> {
        if !self.is_current(token) {
            return Ok(None);
        }
        self.loading = false;
        let outcome = self.catalog.apply(result?);
        self.list_index = self
            .list_index
            .min(self.catalog.templates.len().saturating_sub(1));
        Ok(Some(outcome))
    }

    pub fn list_down(&mut self) {
        let count = self.catalog.templates.len();
        if count > 0 && self.list_index < count - 1 {
            self.list_index += 1;
        }
    }

    pub fn list_up(&mut self) {
        self.list_index = self.list_index.saturating_sub(1);
    }

    /// Template under the list cursor
    pub fn highlighted_template(&self) -> Option<&FormTemplate> {
        self.catalog.templates.get(self.list_index)
    }

    /// Switch to the structure phase and start loading it
    pub fn select_template(&mut self, template: FormTemplate) -> RequestToken {
        self.reset_structure();
        self.selected_template = Some(template);
        self.phase = PanelPhase::Structure;
        self.loading = true;
        self.next_generation()
    }

    /// Store a structure fetch result.
    ///
    /// A failed load returns the panel to the template list. Returns
    /// `Ok(false)` for stale results.
    pub fn apply_structure(
        &mut self,
        token: RequestToken,
        result: Result<StructureFetch, ApiError>,
    ) -> Result<bool, ApiError> {
        if !self.is_current(token) || self.phase != PanelPhase::Structure {
            return Ok(false);
        }
        self.loading = false;
        match result {
            Ok(fetch) => {
                self.sections = fetch.sections;
                self.structure_source = fetch.source;
                self.focus = 0;
                self.option_cursor = 0;
                Ok(true)
            }
            Err(e) => {
                self.reset_structure();
                self.phase = PanelPhase::List;
                Err(e)
            }
        }
    }

    /// Leave the structure and drop every answer
    pub fn back_to_list(&mut self) {
        if self.phase != PanelPhase::Structure {
            return;
        }
        self.reset_structure();
        self.phase = PanelPhase::List;
        self.loading = false;
        self.next_generation();
    }

    pub fn close(&mut self) {
        self.reset_structure();
        self.catalog = TemplateCatalog::new();
        self.visit_id = None;
        self.loading = false;
        self.phase = PanelPhase::Closed;
        self.next_generation();
    }

    // ==================== Field editing ====================

    pub fn slots(&self) -> Vec<FieldSlot<'_>> {
        field_slots(&self.sections)
    }

    pub fn focused_slot(&self) -> Option<FieldSlot<'_>> {
        self.slots().get(self.focus).copied()
    }

    fn focused_kind(&self) -> Option<(i64, InputKind, Vec<String>)> {
        self.focused_slot()
            .map(|s| (s.field.id, s.field.kind.clone(), s.field.option_list()))
    }

    fn is_editing(&self) -> bool {
        self.phase == PanelPhase::Structure && !self.loading
    }

    pub fn next_field(&mut self) {
        let count = self.slots().len();
        if count == 0 {
            return;
        }
        self.focus = (self.focus + 1) % count;
        self.option_cursor = 0;
    }

    pub fn prev_field(&mut self) {
        let count = self.slots().len();
        if count == 0 {
            return;
        }
        self.focus = if self.focus == 0 {
            count - 1
        } else {
            self.focus - 1
        };
        self.option_cursor = 0;
    }

    /// Type into the focused field; characters the kind rejects are ignored
    pub fn input_char(&mut self, c: char) {
        if !self.is_editing() {
            return;
        }
        if let Some((id, kind, _)) = self.focused_kind() {
            if kind.accepts_char(c) {
                self.responses.push_char(id, c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if !self.is_editing() {
            return;
        }
        if let Some((id, kind, _)) = self.focused_kind() {
            if kind.accepts_typing() {
                self.responses.pop_char(id);
            }
        }
    }

    /// Insert a line break in a multi-line field
    pub fn newline(&mut self) {
        if !self.is_editing() {
            return;
        }
        if let Some((id, InputKind::MultiLine, _)) = self.focused_kind() {
            self.responses.push_char(id, '\n');
        }
    }

    /// Left/Right: pick the previous/next option of a select or radio field,
    /// or move the highlight of a multi-choice field
    pub fn cycle_option(&mut self, forward: bool) {
        if !self.is_editing() {
            return;
        }
        let Some((id, kind, options)) = self.focused_kind() else {
            return;
        };
        if options.is_empty() {
            return;
        }
        let step = |index: usize| {
            if forward {
                (index + 1) % options.len()
            } else if index == 0 {
                options.len() - 1
            } else {
                index - 1
            }
        };

        match kind {
            InputKind::Select | InputKind::Radio => {
                let current = self
                    .responses
                    .get(id)
                    .and_then(|v| options.iter().position(|o| o == v));
                let next = match current {
                    Some(index) => step(index),
                    None if forward => 0,
                    None => options.len() - 1,
                };
                self.responses.set(id, options[next].clone());
            }
            InputKind::Checkbox => {
                self.option_cursor = step(self.option_cursor.min(options.len() - 1));
            }
            _ => {}
        }
    }

    /// Space: check or uncheck the highlighted multi-choice option
    pub fn toggle_option(&mut self) {
        if !self.is_editing() {
            return;
        }
        if let Some((id, InputKind::Checkbox, options)) = self.focused_kind() {
            if let Some(option) = options.get(self.option_cursor) {
                self.responses.flip_option(id, option);
            }
        }
    }

    // ==================== Submission ====================

    pub fn can_submit(&self) -> bool {
        self.is_editing() && self.selected_template.is_some()
    }

    /// Validate and build the record, entering the submitting phase.
    ///
    /// On a validation failure the report is kept for highlighting and
    /// focus moves to the first flagged field.
    pub fn begin_submit(
        &mut self,
        mode: SubmitMode,
        ctx: SubmitContext,
    ) -> Result<SubmissionRecord, SubmitError> {
        let ctx = SubmitContext {
            visit_id: self.visit_id.clone(),
            template_id: self.selected_template.as_ref().map(|t| t.id),
            ..ctx
        };

        match build_submission(&ctx, &self.sections, &self.responses) {
            Ok(record) => {
                self.report = None;
                self.phase = PanelPhase::Submitting(mode);
                Ok(record)
            }
            Err(SubmitError::Invalid(report)) => {
                if let Some(first) = report.first() {
                    if let Some(index) = self
                        .slots()
                        .iter()
                        .position(|s| s.field.id == first.field_id)
                    {
                        self.focus = index;
                        self.option_cursor = 0;
                    }
                }
                self.report = Some(report.clone());
                Err(SubmitError::Invalid(report))
            }
            Err(e) => Err(e),
        }
    }

    /// Keep everything so the user can retry
    pub fn submit_failed(&mut self) {
        if matches!(self.phase, PanelPhase::Submitting(_)) {
            self.phase = PanelPhase::Structure;
        }
    }

    /// Mark the submission done; returns the token for the delayed clear
    pub fn submit_succeeded(&mut self) -> RequestToken {
        self.completed = true;
        self.next_generation()
    }

    /// Drop the filled form and return to the template list
    pub fn clear_after_submit(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) || !matches!(self.phase, PanelPhase::Submitting(_)) {
            return false;
        }
        self.reset_structure();
        self.phase = PanelPhase::List;
        true
    }
}
