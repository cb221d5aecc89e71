//! Application state and core logic

use crate::api::{ApiClient, ApiError, ClinicApi, DocumentUpload, FilePayload};
use crate::config::AppConfig;
use crate::doctors::{DoctorName, DoctorResolver, LOADING_PLACEHOLDER};
use crate::forms::{
    fetch_templates, load_structure, submit, CatalogFetch, FormTemplate, InputKind,
    PendingOutcome, StructureFetch, SubmitContext, SubmitError, SubmitMode, SubmitOutcome,
    TemplateId,
};
use crate::platform;
use crate::state::{
    AppState, DeleteTarget, DocumentEditForm, DocumentReplaceForm, DocumentUploadForm,
    EditorState, PanelPhase, PendingDelete, RequestToken, View, VisitEditForm, VisitStartForm,
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

/// Results of background work, delivered to the event loop
#[derive(Debug)]
pub enum AppEvent {
    TemplatesLoaded {
        token: RequestToken,
        result: Result<CatalogFetch, ApiError>,
    },
    StructureLoaded {
        token: RequestToken,
        result: Result<StructureFetch, ApiError>,
    },
    SubmitFinished {
        result: Result<SubmitOutcome, ApiError>,
    },
    ClearAfterSubmit {
        token: RequestToken,
    },
}

/// Main application struct
pub struct App {
    /// Current application state
    pub state: AppState,
    /// REST client for the clinical records API
    api: Arc<dyn ClinicApi>,
    /// Shared doctor-name cache
    doctors: DoctorResolver,
    /// Names shown in the visit list
    pub doctor_names: HashMap<String, String>,
    /// Lookups still in flight, removed once they resolve
    doctor_watches: HashMap<String, watch::Receiver<Option<String>>>,
    config: AppConfig,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Template to select when the form panel first loads
    pending_template: Option<TemplateId>,
    /// Whether the app should quit
    quit: bool,
    /// Transient feedback shown in the status bar
    pub status_message: Option<String>,
}

impl App {
    /// Create a new App instance talking to the configured API
    pub async fn new(
        config: AppConfig,
        patient_id: String,
        pending_template: Option<TemplateId>,
    ) -> Result<Self> {
        let api: Arc<dyn ClinicApi> = Arc::new(ApiClient::new(config.api_config())?);
        let mut app = Self::with_api(config, patient_id, api);
        app.pending_template = pending_template;
        app.load_profile().await;
        Ok(app)
    }

    /// Create an App around an existing API implementation
    pub fn with_api(config: AppConfig, patient_id: String, api: Arc<dyn ClinicApi>) -> Self {
        let doctors = DoctorResolver::new(
            Arc::clone(&api),
            config.doctor_debounce(),
            config.doctor_cache_capacity,
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            state: AppState::new(patient_id, config.clinician_id.clone()),
            api,
            doctors,
            doctor_names: HashMap::new(),
            doctor_watches: HashMap::new(),
            config,
            events_tx,
            events_rx,
            pending_template: None,
            quit: false,
            status_message: None,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Push an error message to the error queue for display
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.state.push_error(message.into());
    }

    /// Display name of a doctor, or the loading placeholder
    pub fn doctor_name(&self, clinician_id: &str) -> &str {
        self.doctor_names
            .get(clinician_id)
            .map_or(LOADING_PLACEHOLDER, String::as_str)
    }

    // ==================== Loading ====================

    /// Fetch demographics, visits, documents and the clinician list
    pub async fn load_profile(&mut self) {
        match self.api.get_patient(&self.state.patient_id).await {
            Ok(patient) => {
                info!("Loaded patient {}", patient.id);
                self.state.patient = Some(patient);
            }
            Err(e) => self.push_error(format!("Failed to load patient: {}", e.user_message())),
        }

        match self.api.list_clinicians().await {
            Ok(clinicians) => {
                self.doctors.prime(&clinicians);
                for clinician in &clinicians {
                    self.doctor_names
                        .insert(clinician.id.clone(), clinician.display_name());
                }
            }
            Err(e) => warn!("Clinician list unavailable, names resolve one by one: {e}"),
        }

        self.refresh_visits().await;
        self.refresh_documents().await;
    }

    async fn refresh_visits(&mut self) {
        match self.api.list_visits(&self.state.patient_id).await {
            Ok(visits) => {
                self.state.set_visits(visits);
                self.resolve_visit_doctors();
            }
            Err(e) => self.push_error(format!("Failed to load visits: {}", e.user_message())),
        }
    }

    async fn refresh_documents(&mut self) {
        match self.api.list_documents(&self.state.patient_id).await {
            Ok(documents) => self.state.set_documents(documents),
            Err(e) => self.push_error(format!("Failed to load documents: {}", e.user_message())),
        }
    }

    /// Start name lookups for visit doctors and the session clinician
    fn resolve_visit_doctors(&mut self) {
        let mut ids: Vec<String> = self
            .state
            .visits
            .iter()
            .filter_map(|v| v.clinician_id.clone())
            .chain(self.state.clinician_id.clone())
            .filter(|id| !self.doctor_names.contains_key(id) && !self.doctor_watches.contains_key(id))
            .collect();
        ids.sort();
        ids.dedup();
        for id in ids {
            match self.doctors.resolve(&id) {
                DoctorName::Resolved(name) => {
                    self.doctor_names.insert(id, name);
                }
                DoctorName::Loading => {
                    let watcher = self.doctors.subscribe(&id);
                    self.doctor_watches.insert(id, watcher);
                }
            }
        }
    }

    // ==================== Background events ====================

    /// Apply every finished background result without blocking
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }

        let names = &mut self.doctor_names;
        self.doctor_watches.retain(|id, watcher| match watcher.borrow().as_ref() {
            Some(name) => {
                names.insert(id.clone(), name.clone());
                false
            }
            None => true,
        });
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::TemplatesLoaded { token, result } => {
                match self.state.form_panel.apply_templates(token, result) {
                    Ok(Some(PendingOutcome::Selected(template))) => self.select_template(template),
                    Ok(Some(PendingOutcome::NotFound(id))) => {
                        self.push_error(format!("Form template {id} was not found"));
                    }
                    Ok(_) => {}
                    Err(e) => self.push_error(format!(
                        "Failed to load form templates: {}",
                        e.user_message()
                    )),
                }
            }
            AppEvent::StructureLoaded { token, result } => {
                if let Err(e) = self.state.form_panel.apply_structure(token, result) {
                    self.push_error(format!("Failed to load the form: {}", e.user_message()));
                }
            }
            AppEvent::SubmitFinished { result } => self.finish_submit(result),
            AppEvent::ClearAfterSubmit { token } => {
                self.state.form_panel.clear_after_submit(token);
            }
        }
    }

    fn load_templates(&mut self, token: RequestToken) {
        let Some(clinician_id) = self.state.clinician_id.clone() else {
            self.state.form_panel.loading = false;
            self.push_error("No clinician is configured; form templates cannot be listed");
            return;
        };
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        let start = self.state.form_panel.catalog_source();
        tokio::spawn(async move {
            let result = fetch_templates(api.as_ref(), start, &clinician_id).await;
            let _ = tx.send(AppEvent::TemplatesLoaded { token, result });
        });
    }

    fn select_template(&mut self, template: FormTemplate) {
        let template_id = template.id;
        let token = self.state.form_panel.select_template(template);
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = load_structure(api.as_ref(), template_id).await;
            let _ = tx.send(AppEvent::StructureLoaded { token, result });
        });
    }

    // ==================== Navigation ====================

    /// Navigate to a new view
    pub fn navigate(&mut self, view: View) {
        self.state.view_history.push(self.state.current_view);
        self.state.current_view = view;
    }

    /// Go back to previous view
    pub fn go_back(&mut self) {
        // Skip editor views in history to go back to the last tab
        while let Some(view) = self.state.view_history.pop() {
            if view.is_form_view() {
                continue;
            }
            self.state.current_view = view;
            return;
        }
        self.state.current_view = View::default();
    }

    fn switch_tab(&mut self, view: View) {
        if view != self.state.current_view {
            self.state.view_history.clear();
            self.state.current_view = view;
        }
    }

    fn open_editor(&mut self, editor: EditorState) {
        if !editor.is_open() {
            return;
        }
        self.state.editor = editor;
        self.navigate(View::Editor);
    }

    fn close_editor(&mut self) {
        self.state.clear_form();
        self.go_back();
    }

    // ==================== Key handling ====================

    /// Handle a key event
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle error dialog dismissal first (modal)
        if self.state.has_errors() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.state.dismiss_error();
            }
            return Ok(());
        }

        // Handle delete confirmation (modal)
        if self.state.pending_delete.is_some() {
            self.handle_delete_dialog_key(key).await?;
            return Ok(());
        }

        // Clear any status messages on key press
        self.status_message = None;

        let editing_structure = self.state.current_view == View::Forms
            && self.state.form_panel.phase != PanelPhase::List
            && self.state.form_panel.is_open();

        if self.state.current_view.tab_index().is_some() && !editing_structure {
            match key.code {
                KeyCode::Tab => {
                    self.switch_tab(self.state.current_view.next_tab());
                    return Ok(());
                }
                KeyCode::Char(c @ '1'..='3') => {
                    let index = c as usize - '1' as usize;
                    self.switch_tab(View::TABS[index]);
                    return Ok(());
                }
                KeyCode::Char('q') => {
                    self.quit = true;
                    return Ok(());
                }
                _ => {}
            }
        }

        match self.state.current_view {
            View::Visits => self.handle_visits_key(key).await?,
            View::Documents => self.handle_documents_key(key).await?,
            View::Forms => self.handle_forms_key(key),
            View::Editor => self.handle_editor_key(key).await?,
        }

        Ok(())
    }

    /// Handle keys in Visits view
    async fn handle_visits_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.move_selection_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_selection_up(),
            KeyCode::Char('r') => {
                self.refresh_visits().await;
                self.status_message = Some("Visits refreshed".to_string());
            }
            KeyCode::Char('n') => {
                if self.state.clinician_id.is_none() {
                    self.push_error("No clinician is configured; a visit cannot be started");
                } else {
                    self.open_editor(EditorState::VisitStart(VisitStartForm::new()));
                }
            }
            KeyCode::Char('e') => match self.state.selected_visit() {
                Some(visit) if visit.is_in_progress() => {
                    let form = VisitEditForm::from_visit(visit);
                    self.open_editor(EditorState::VisitEdit(form));
                }
                Some(visit) => {
                    let message = format!(
                        "This visit is {} and can no longer be edited",
                        visit.status.label().to_lowercase()
                    );
                    self.push_error(message);
                }
                None => self.push_error("No visit selected"),
            },
            KeyCode::Char('x') => self.end_selected_visit().await,
            KeyCode::Char('d') => match self.state.selected_visit() {
                Some(visit) => {
                    let label = format!("visit of {}", visit.started_at.format("%d/%m/%Y %H:%M"));
                    self.state.pending_delete = Some(PendingDelete::new(
                        DeleteTarget::Visit(visit.id.clone()),
                        label,
                    ));
                }
                None => self.push_error("No visit selected"),
            },
            KeyCode::Char('f') | KeyCode::Enter => self.open_forms_for_selected_visit(),
            _ => {}
        }
        Ok(())
    }

    async fn end_selected_visit(&mut self) {
        let Some(visit) = self.state.selected_visit() else {
            self.push_error("No visit selected");
            return;
        };
        if !visit.is_in_progress() {
            self.push_error("This visit has already ended");
            return;
        }
        let visit_id = visit.id.clone();

        match self.api.end_visit(&visit_id).await {
            Ok(_) => {
                info!("Ended visit {visit_id}");
                self.status_message = Some("Visit ended".to_string());
                self.refresh_visits().await;
            }
            Err(e) => self.push_error(format!("Failed to end visit: {}", e.user_message())),
        }
    }

    fn open_forms_for_selected_visit(&mut self) {
        let Some(visit_id) = self.state.selected_visit().map(|v| v.id.clone()) else {
            self.push_error("No visit selected");
            return;
        };
        let pending = self.pending_template.take();
        let token = self.state.form_panel.open(visit_id, pending);
        self.switch_tab(View::Forms);
        self.load_templates(token);
    }

    /// Handle keys in Documents view
    async fn handle_documents_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.move_selection_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_selection_up(),
            KeyCode::Char('R') => {
                self.refresh_documents().await;
                self.status_message = Some("Documents refreshed".to_string());
            }
            KeyCode::Char('u') => {
                self.open_editor(EditorState::DocumentUpload(DocumentUploadForm::new()));
            }
            KeyCode::Char('e') => match self.state.selected_document() {
                Some(document) => {
                    let form = DocumentEditForm::from_document(document);
                    self.open_editor(EditorState::DocumentEdit(form));
                }
                None => self.push_error("No document selected"),
            },
            KeyCode::Char('r') => match self.state.selected_document() {
                Some(document) => {
                    let form = DocumentReplaceForm::for_document(document);
                    self.open_editor(EditorState::DocumentReplace(form));
                }
                None => self.push_error("No document selected"),
            },
            KeyCode::Char('d') => match self.state.selected_document() {
                Some(document) => {
                    self.state.pending_delete = Some(PendingDelete::new(
                        DeleteTarget::Document(document.id.clone()),
                        document.name.clone(),
                    ));
                }
                None => self.push_error("No document selected"),
            },
            KeyCode::Char('o') | KeyCode::Enter => {
                let url = self.state.selected_document().and_then(|d| d.url.clone());
                match url {
                    Some(url) => {
                        if let Err(e) = platform::open_url(&url) {
                            self.push_error(format!("Could not open {url}: {e}"));
                        }
                    }
                    None => self.push_error("This document has no file to open"),
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Handle keys in Forms view
    fn handle_forms_key(&mut self, key: KeyEvent) {
        match self.state.form_panel.phase {
            PanelPhase::Closed => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char('f')) {
                    self.open_forms_for_selected_visit();
                }
            }
            PanelPhase::List => self.handle_template_list_key(key),
            PanelPhase::Structure => self.handle_structure_key(key),
            // Wait for the server
            PanelPhase::Submitting(_) => {}
        }
    }

    fn handle_template_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.form_panel.list_down(),
            KeyCode::Char('k') | KeyCode::Up => self.state.form_panel.list_up(),
            KeyCode::Enter => {
                if let Some(template) = self.state.form_panel.highlighted_template().cloned() {
                    self.select_template(template);
                }
            }
            KeyCode::Char('r') => {
                let token = self.state.form_panel.reload_templates();
                self.load_templates(token);
            }
            KeyCode::Esc => {
                self.state.form_panel.close();
                self.switch_tab(View::Visits);
            }
            _ => {}
        }
    }

    fn handle_structure_key(&mut self, key: KeyEvent) {
        let shortcut = platform::is_shortcut(key.modifiers);
        if shortcut {
            match key.code {
                KeyCode::Char('s') => self.submit_form(SubmitMode::Save),
                KeyCode::Char('p') => self.submit_form(SubmitMode::GeneratePdf),
                _ => {}
            }
            return;
        }

        let panel = &mut self.state.form_panel;
        match key.code {
            KeyCode::Esc => panel.back_to_list(),
            KeyCode::Tab | KeyCode::Down => panel.next_field(),
            KeyCode::BackTab | KeyCode::Up => panel.prev_field(),
            KeyCode::Left => panel.cycle_option(false),
            KeyCode::Right => panel.cycle_option(true),
            KeyCode::Char(' ')
                if panel
                    .focused_slot()
                    .is_some_and(|s| s.field.kind == InputKind::Checkbox) =>
            {
                panel.toggle_option();
            }
            KeyCode::Char(c) => panel.input_char(c),
            KeyCode::Backspace => panel.backspace(),
            KeyCode::Enter => panel.newline(),
            _ => {}
        }
    }

    /// Validate locally, then post the form in the background
    fn submit_form(&mut self, mode: SubmitMode) {
        if !self.state.form_panel.can_submit() {
            return;
        }
        let ctx = SubmitContext {
            patient_id: Some(self.state.patient_id.clone()),
            clinician_id: self.state.clinician_id.clone(),
            ..Default::default()
        };

        match self.state.form_panel.begin_submit(mode, ctx) {
            Ok(record) => {
                self.status_message = Some(mode.progress_label().to_string());
                let api = Arc::clone(&self.api);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = submit(api.as_ref(), mode, &record).await;
                    let _ = tx.send(AppEvent::SubmitFinished { result });
                });
            }
            Err(SubmitError::Invalid(report)) => {
                self.status_message = Some(format!(
                    "{} required field(s) are empty; the first one is highlighted",
                    report.invalid_count
                ));
            }
            Err(e) => self.push_error(e.to_string()),
        }
    }

    fn finish_submit(&mut self, result: Result<SubmitOutcome, ApiError>) {
        match result {
            Ok(outcome) => {
                match outcome {
                    SubmitOutcome::Saved { form_id } => {
                        self.status_message = Some(format!("Form saved (record {form_id})"));
                    }
                    SubmitOutcome::PdfReady { url } => {
                        self.status_message = Some("PDF generated".to_string());
                        if let Err(e) = platform::open_url(&url) {
                            self.push_error(format!("PDF ready at {url} but could not be opened: {e}"));
                        }
                    }
                }
                let token = self.state.form_panel.submit_succeeded();
                let delay = self.config.submit_clear_delay();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(AppEvent::ClearAfterSubmit { token });
                });
            }
            Err(e) => {
                warn!("Form submission failed: {e}");
                self.state.form_panel.submit_failed();
                self.push_error(e.user_message());
            }
        }
    }

    /// Handle keys in Editor view
    async fn handle_editor_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab => self.state.editor.next_field(),
            KeyCode::BackTab => self.state.editor.prev_field(),
            // Save (Ctrl+S or Cmd+S)
            KeyCode::Char('s') if platform::is_shortcut(key.modifiers) => {
                self.save_editor().await;
            }
            KeyCode::Esc => self.close_editor(),
            KeyCode::Char(c) => {
                if let Some(field) = self.state.editor.get_active_field_mut() {
                    field.push_char(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.state.editor.get_active_field_mut() {
                    field.pop_char();
                }
            }
            KeyCode::Enter => {
                if let Some(field) = self.state.editor.get_active_field_mut() {
                    field.newline();
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Helper to save the open editor
    async fn save_editor(&mut self) {
        let editor = self.state.editor.clone();
        let saved = match &editor {
            EditorState::None => return,
            EditorState::VisitStart(form) => self.save_visit_start(form).await,
            EditorState::VisitEdit(form) => self.save_visit_edit(form).await,
            EditorState::DocumentUpload(form) => self.save_document_upload(form).await,
            EditorState::DocumentEdit(form) => self.save_document_edit(form).await,
            EditorState::DocumentReplace(form) => self.save_document_replace(form).await,
        };

        match saved {
            Ok(message) => {
                self.status_message = Some(message.to_string());
                self.close_editor();
            }
            Err(message) => self.push_error(message),
        }
    }

    async fn save_visit_start(&mut self, form: &VisitStartForm) -> Result<&'static str, String> {
        let clinician_id = self
            .state
            .clinician_id
            .clone()
            .ok_or_else(|| "No clinician is configured".to_string())?;
        let request = form.to_request(&clinician_id)?;
        let visit = self
            .api
            .start_visit(&self.state.patient_id, &request)
            .await
            .map_err(|e| format!("Failed to start visit: {}", e.user_message()))?;
        info!("Started visit {}", visit.id);
        self.refresh_visits().await;
        Ok("Visit started")
    }

    async fn save_visit_edit(&mut self, form: &VisitEditForm) -> Result<&'static str, String> {
        let update = form.to_update()?;
        self.api
            .update_visit(&form.visit_id, &update)
            .await
            .map_err(|e| format!("Failed to update visit: {}", e.user_message()))?;
        if let Some(note) = form.changed_note() {
            self.api
                .save_visit_note(&form.visit_id, note)
                .await
                .map_err(|e| format!("Failed to save the note: {}", e.user_message()))?;
        }
        self.refresh_visits().await;
        Ok("Visit updated")
    }

    async fn save_document_upload(
        &mut self,
        form: &DocumentUploadForm,
    ) -> Result<&'static str, String> {
        let metadata = form.metadata()?;
        let file = self.read_upload(&form.file_path()?).await?;
        let upload = DocumentUpload {
            patient_id: self.state.patient_id.clone(),
            metadata,
            file,
        };
        let document = self
            .api
            .upload_document(&upload)
            .await
            .map_err(|e| format!("Upload failed: {}", e.user_message()))?;
        info!("Uploaded document {}", document.id);
        self.refresh_documents().await;
        Ok("Document uploaded")
    }

    async fn save_document_edit(&mut self, form: &DocumentEditForm) -> Result<&'static str, String> {
        let metadata = form.metadata()?;
        self.api
            .update_document(&form.document_id, &metadata)
            .await
            .map_err(|e| format!("Failed to update document: {}", e.user_message()))?;
        self.refresh_documents().await;
        Ok("Document updated")
    }

    async fn save_document_replace(
        &mut self,
        form: &DocumentReplaceForm,
    ) -> Result<&'static str, String> {
        let file = self.read_upload(&form.file_path()?).await?;
        self.api
            .replace_document_file(&form.document_id, &file)
            .await
            .map_err(|e| format!("Failed to replace file: {}", e.user_message()))?;
        self.refresh_documents().await;
        Ok("File replaced")
    }

    /// Read a file for upload, refusing files above the configured size
    async fn read_upload(&self, path: &Path) -> Result<FilePayload, String> {
        let unreadable = |e: std::io::Error| ApiError::from(e).user_message();
        let size = tokio::fs::metadata(path).await.map_err(unreadable)?.len();
        if size > self.config.max_upload_bytes {
            return Err(format!(
                "The file is {:.1} MB; the limit is {:.1} MB",
                size as f64 / 1_048_576.0,
                self.config.max_upload_bytes as f64 / 1_048_576.0
            ));
        }
        let bytes = tokio::fs::read(path).await.map_err(unreadable)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(FilePayload::new(file_name, bytes))
    }

    /// Handle keys in the delete confirmation dialog
    async fn handle_delete_dialog_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(pending) = self.state.pending_delete.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h' | 'l') => {
                pending.toggle();
            }
            KeyCode::Esc | KeyCode::Char('n') => self.state.pending_delete = None,
            KeyCode::Char('y') => self.confirm_delete().await,
            KeyCode::Enter => {
                if pending.confirm_selected {
                    self.confirm_delete().await;
                } else {
                    self.state.pending_delete = None;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn confirm_delete(&mut self) {
        let Some(pending) = self.state.pending_delete.take() else {
            return;
        };
        match pending.target {
            DeleteTarget::Visit(id) => match self.api.delete_visit(&id).await {
                Ok(()) => {
                    info!("Deleted visit {id}");
                    if self.state.form_panel.visit_id.as_deref() == Some(id.as_str()) {
                        self.state.form_panel.close();
                    }
                    self.status_message = Some("Visit deleted".to_string());
                    self.refresh_visits().await;
                }
                Err(e) => {
                    self.push_error(format!("Failed to delete visit: {}", e.user_message()));
                }
            },
            DeleteTarget::Document(id) => match self.api.delete_document(&id).await {
                Ok(()) => {
                    info!("Deleted document {id}");
                    self.status_message = Some(format!("Deleted {}", pending.label));
                    self.refresh_documents().await;
                }
                Err(e) => {
                    self.push_error(format!("Failed to delete document: {}", e.user_message()));
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Clinician, DataSource, Document, MockClinicApi, Visit, VisitStatus};
    use crate::forms::fixtures::consultation_tree;
    use chrono::{TimeZone, Utc};
    use crossterm::event::KeyModifiers;
    use mockall::predicate::{always, eq};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const CLINICIAN: &str = "0d9c7c36-2a44-4e4c-9d1b-8f0f5b1e2c11";

    fn test_config() -> AppConfig {
        AppConfig {
            clinician_id: Some(CLINICIAN.to_string()),
            doctor_debounce_ms: 50,
            submit_clear_delay_ms: 100,
            ..Default::default()
        }
    }

    fn test_app(api: MockClinicApi) -> App {
        App::with_api(test_config(), "p1".to_string(), Arc::new(api))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn shortcut(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), platform::SHORTCUT_MODIFIER)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
    }

    /// Let spawned tasks finish under the paused clock, then apply their results
    async fn settle(app: &mut App, duration: Duration) {
        tokio::time::sleep(duration).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        app.drain_events();
    }

    fn visit(id: &str, status: VisitStatus) -> Visit {
        Visit {
            id: id.to_string(),
            patient_id: "p1".to_string(),
            clinician_id: None,
            started_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap(),
            ended_at: None,
            reason: "Controle".to_string(),
            note: Some("RAS".to_string()),
            status,
        }
    }

    fn martin(specialty: Option<&str>) -> Clinician {
        Clinician {
            id: "c1".to_string(),
            first_name: "Jeanne".to_string(),
            last_name: "Martin".to_string(),
            title: Some("Dr.".to_string()),
            specialty_id: specialty.map(str::to_string),
        }
    }

    /// The clinician the test session runs as
    fn self_clinician() -> Clinician {
        Clinician {
            id: CLINICIAN.to_string(),
            first_name: "Paul".to_string(),
            last_name: "Roux".to_string(),
            ..martin(None)
        }
    }

    fn template(id: TemplateId) -> FormTemplate {
        FormTemplate {
            id,
            name: format!("Template {id}"),
            description: None,
        }
    }

    /// App on the Forms tab with the consultation form loaded for visit v1
    fn app_with_loaded_form(api: MockClinicApi) -> App {
        let mut app = test_app(api);
        app.state.visits = vec![visit("v1", VisitStatus::InProgress)];
        app.state.current_view = View::Forms;
        let panel = &mut app.state.form_panel;
        panel.open("v1".to_string(), None);
        let token = panel.select_template(template(4));
        panel
            .apply_structure(
                token,
                Ok(StructureFetch {
                    sections: consultation_tree(),
                    source: DataSource::Primary,
                }),
            )
            .unwrap();
        app
    }

    mod navigation_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_navigate_saves_history() {
            let mut app = test_app(MockClinicApi::new());
            app.navigate(View::Documents);
            assert_eq!(app.state.current_view, View::Documents);
            assert_eq!(app.state.view_history, vec![View::Visits]);
        }

        #[test]
        fn test_go_back_skips_editor_views() {
            let mut app = test_app(MockClinicApi::new());
            app.state.current_view = View::Documents;
            app.state.view_history = vec![View::Visits, View::Editor];
            app.go_back();
            assert_eq!(app.state.current_view, View::Visits);
        }

        #[test]
        fn test_empty_editor_does_not_open() {
            let mut app = test_app(MockClinicApi::new());
            app.open_editor(EditorState::None);
            assert_eq!(app.state.current_view, View::Visits);
            assert!(app.state.view_history.is_empty());
        }

        #[tokio::test]
        async fn test_number_keys_switch_tabs() {
            let mut app = test_app(MockClinicApi::new());
            app.handle_key(key(KeyCode::Char('2'))).await.unwrap();
            assert_eq!(app.state.current_view, View::Documents);
            app.handle_key(key(KeyCode::Tab)).await.unwrap();
            assert_eq!(app.state.current_view, View::Forms);
        }

        #[tokio::test]
        async fn test_error_dialog_is_modal() {
            let mut app = test_app(MockClinicApi::new());
            app.push_error("boom");
            app.handle_key(key(KeyCode::Char('q'))).await.unwrap();
            assert!(!app.should_quit());
            app.handle_key(key(KeyCode::Enter)).await.unwrap();
            assert!(!app.state.has_errors());
            app.handle_key(key(KeyCode::Char('q'))).await.unwrap();
            assert!(app.should_quit());
        }
    }

    mod profile_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test(start_paused = true)]
        async fn test_doctor_names_resolve_after_load() {
            let mut api = MockClinicApi::new();
            api.expect_get_patient().returning(|_| {
                Ok(serde_json::from_str(r#"{"id":"p1","prenom":"Ali","nom":"Benali"}"#).unwrap())
            });
            api.expect_list_clinicians()
                .returning(|| Err(ApiError::Status { status: 503, message: None }));
            api.expect_list_visits().returning(|_| {
                Ok(vec![Visit {
                    clinician_id: Some("c1".to_string()),
                    ..visit("v1", VisitStatus::Completed)
                }])
            });
            api.expect_list_documents().returning(|_| Ok(vec![]));
            api.expect_get_clinician()
                .with(eq(DataSource::Primary), eq("c1"))
                .times(1)
                .returning(|_, _| Ok(martin(None)));
            api.expect_get_clinician()
                .with(eq(DataSource::Primary), eq(CLINICIAN))
                .times(1)
                .returning(|_, _| Ok(self_clinician()));
            let mut app = test_app(api);

            app.load_profile().await;
            assert!(!app.state.has_errors());
            assert_eq!(app.doctor_name("c1"), LOADING_PLACEHOLDER);

            settle(&mut app, Duration::from_millis(200)).await;
            assert_eq!(app.doctor_name("c1"), "Dr. Jeanne Martin");
            assert_eq!(app.doctor_name(CLINICIAN), "Dr. Paul Roux");
        }

        #[tokio::test]
        async fn test_primed_clinicians_need_no_lookup() {
            let mut api = MockClinicApi::new();
            api.expect_get_patient()
                .returning(|_| Err(ApiError::Status { status: 404, message: None }));
            api.expect_list_clinicians()
                .returning(|| Ok(vec![martin(None), self_clinician()]));
            api.expect_list_visits().returning(|_| {
                Ok(vec![Visit {
                    clinician_id: Some("c1".to_string()),
                    ..visit("v1", VisitStatus::Completed)
                }])
            });
            api.expect_list_documents().returning(|_| Ok(vec![]));
            api.expect_get_clinician().never();
            let mut app = test_app(api);

            app.load_profile().await;
            assert_eq!(app.doctor_name("c1"), "Dr. Jeanne Martin");
            assert!(app.state.has_errors());
        }
    }

    mod visit_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_completed_visit_cannot_be_edited() {
            let mut api = MockClinicApi::new();
            api.expect_update_visit().never();
            let mut app = test_app(api);
            app.state.visits = vec![visit("v1", VisitStatus::Completed)];

            app.handle_key(key(KeyCode::Char('e'))).await.unwrap();

            assert!(!app.state.editor.is_open());
            assert_eq!(app.state.current_view, View::Visits);
            assert_eq!(
                app.state.current_error(),
                Some("This visit is completed and can no longer be edited")
            );
        }

        #[tokio::test]
        async fn test_edit_saves_reason_then_changed_note() {
            let mut api = MockClinicApi::new();
            api.expect_update_visit()
                .withf(|id, update| id == "v1" && update.reason == "Controle" && update.note.is_none())
                .times(1)
                .returning(|_, _| Ok(visit("v1", VisitStatus::InProgress)));
            api.expect_save_visit_note()
                .with(eq("v1"), eq("RAS!"))
                .times(1)
                .returning(|_, _| Ok(()));
            api.expect_list_visits()
                .returning(|_| Ok(vec![visit("v1", VisitStatus::InProgress)]));
            api.expect_get_clinician()
                .returning(|_, _| Ok(self_clinician()));
            let mut app = test_app(api);
            app.state.visits = vec![visit("v1", VisitStatus::InProgress)];

            app.handle_key(key(KeyCode::Char('e'))).await.unwrap();
            assert_eq!(app.state.current_view, View::Editor);
            app.handle_key(key(KeyCode::Tab)).await.unwrap();
            type_text(&mut app, "!").await;
            app.handle_key(shortcut('s')).await.unwrap();

            assert_eq!(app.state.current_view, View::Visits);
            assert_eq!(app.status_message.as_deref(), Some("Visit updated"));
        }

        #[tokio::test]
        async fn test_delete_defaults_to_cancel() {
            let mut api = MockClinicApi::new();
            api.expect_delete_visit()
                .with(eq("v1"))
                .times(1)
                .returning(|_| Ok(()));
            api.expect_list_visits().returning(|_| Ok(vec![]));
            api.expect_get_clinician()
                .returning(|_, _| Ok(self_clinician()));
            let mut app = test_app(api);
            app.state.visits = vec![visit("v1", VisitStatus::Completed)];

            app.handle_key(key(KeyCode::Char('d'))).await.unwrap();
            app.handle_key(key(KeyCode::Enter)).await.unwrap();
            assert!(app.state.pending_delete.is_none());
            assert_eq!(app.state.visits.len(), 1);

            app.handle_key(key(KeyCode::Char('d'))).await.unwrap();
            app.handle_key(key(KeyCode::Right)).await.unwrap();
            app.handle_key(key(KeyCode::Enter)).await.unwrap();
            assert!(app.state.visits.is_empty());
            assert_eq!(app.status_message.as_deref(), Some("Visit deleted"));
        }
    }

    mod document_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_oversized_upload_is_refused_locally() {
            let mut api = MockClinicApi::new();
            api.expect_upload_document().never();
            let mut app = App::with_api(
                AppConfig {
                    max_upload_bytes: 4,
                    ..test_config()
                },
                "p1".to_string(),
                Arc::new(api),
            );
            let path = std::env::temp_dir().join(format!("patient-tui-{}.pdf", uuid::Uuid::new_v4()));
            std::fs::write(&path, b"0123456789").unwrap();

            app.state.current_view = View::Documents;
            app.handle_key(key(KeyCode::Char('u'))).await.unwrap();
            type_text(&mut app, &path.to_string_lossy()).await;
            app.handle_key(shortcut('s')).await.unwrap();
            std::fs::remove_file(&path).unwrap();

            assert_eq!(app.state.current_view, View::Editor);
            assert!(app
                .state
                .current_error()
                .is_some_and(|e| e.contains("the limit is")));
        }

        #[tokio::test]
        async fn test_document_without_file_cannot_be_opened() {
            let mut app = test_app(MockClinicApi::new());
            app.state.current_view = View::Documents;
            app.state.documents = vec![Document {
                id: "d1".to_string(),
                patient_id: "p1".to_string(),
                name: "Bilan".to_string(),
                description: None,
                doc_type: None,
                url: None,
                uploaded_at: None,
            }];

            app.handle_key(key(KeyCode::Char('o'))).await.unwrap();
            assert_eq!(
                app.state.current_error(),
                Some("This document has no file to open")
            );
        }
    }

    mod form_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test(start_paused = true)]
        async fn test_primary_failure_falls_back_for_templates() {
            let mut api = MockClinicApi::new();
            api.expect_get_clinician()
                .with(eq(DataSource::Primary), always())
                .returning(|_, _| Err(ApiError::Status { status: 503, message: None }));
            api.expect_get_clinician()
                .with(eq(DataSource::Fallback), eq(CLINICIAN))
                .returning(|_, _| Ok(martin(Some("cardio"))));
            api.expect_list_form_templates()
                .with(eq(DataSource::Fallback), eq("cardio"))
                .times(1)
                .returning(|_, _| Ok(vec![template(1), template(2)]));
            let mut app = test_app(api);
            app.state.visits = vec![visit("v1", VisitStatus::InProgress)];

            app.handle_key(key(KeyCode::Char('f'))).await.unwrap();
            assert_eq!(app.state.current_view, View::Forms);
            assert!(app.state.form_panel.loading);

            settle(&mut app, Duration::from_millis(10)).await;
            let panel = &app.state.form_panel;
            assert!(!panel.loading);
            assert!(panel.catalog.is_fallback());
            assert_eq!(panel.catalog.templates.len(), 2);
            assert!(!app.state.has_errors());
        }

        #[tokio::test]
        async fn test_missing_required_answer_blocks_submit() {
            let mut api = MockClinicApi::new();
            api.expect_submit_form().never();
            let mut app = app_with_loaded_form(api);
            app.state.form_panel.responses.set(211, "12");
            app.state.form_panel.responses.set(301, "RAS");
            app.state.form_panel.focus = 3;

            app.handle_key(shortcut('s')).await.unwrap();

            let panel = &app.state.form_panel;
            assert_eq!(panel.phase, PanelPhase::Structure);
            assert_eq!(panel.focused_slot().map(|s| s.field.id), Some(101));
            assert!(app
                .status_message
                .as_deref()
                .is_some_and(|m| m.starts_with("1 required field(s)")));
        }

        #[tokio::test(start_paused = true)]
        async fn test_saved_form_clears_after_delay() {
            let mut api = MockClinicApi::new();
            api.expect_submit_form()
                .withf(|record| record.visit_id == "v1" && record.template_id == 4)
                .times(1)
                .returning(|_| Ok(42));
            let mut app = app_with_loaded_form(api);
            type_text(&mut app, "Toux").await;
            app.state.form_panel.responses.set(211, "12");
            app.state.form_panel.responses.set(301, "RAS");

            app.handle_key(shortcut('s')).await.unwrap();
            assert_eq!(
                app.state.form_panel.phase,
                PanelPhase::Submitting(SubmitMode::Save)
            );

            settle(&mut app, Duration::from_millis(10)).await;
            assert_eq!(app.status_message.as_deref(), Some("Form saved (record 42)"));
            assert!(app.state.form_panel.completed);

            settle(&mut app, Duration::from_millis(200)).await;
            assert_eq!(app.state.form_panel.phase, PanelPhase::List);
            assert!(app.state.form_panel.responses.is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_failed_pdf_keeps_answers() {
            let mut api = MockClinicApi::new();
            api.expect_generate_form_pdf()
                .times(1)
                .returning(|_| Err(ApiError::Rejected(Some("Template disabled".to_string()))));
            let mut app = app_with_loaded_form(api);
            app.state.form_panel.responses.set(101, "Toux");
            app.state.form_panel.responses.set(211, "12");
            app.state.form_panel.responses.set(301, "RAS");

            app.handle_key(shortcut('p')).await.unwrap();
            settle(&mut app, Duration::from_millis(10)).await;

            assert_eq!(app.state.form_panel.phase, PanelPhase::Structure);
            assert_eq!(app.state.form_panel.responses.len(), 3);
            assert_eq!(app.state.current_error(), Some("Template disabled"));
        }

        #[tokio::test]
        async fn test_esc_from_list_closes_panel() {
            let mut app = app_with_loaded_form(MockClinicApi::new());
            app.handle_key(key(KeyCode::Esc)).await.unwrap();
            assert_eq!(app.state.form_panel.phase, PanelPhase::List);
            app.handle_key(key(KeyCode::Esc)).await.unwrap();
            assert_eq!(app.state.form_panel.phase, PanelPhase::Closed);
            assert_eq!(app.state.current_view, View::Visits);
        }
    }
}
