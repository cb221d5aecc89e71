//! UI module for rendering the TUI

mod components;
mod documents;
mod forms;
mod layout;
mod visits;

use crate::app::App;
use crate::state::View;
use components::{render_confirm_dialog, render_error_dialog};
use ratatui::{
    layout::Rect,
    widgets::{List, ListState},
    Frame,
};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let areas = layout::create_layout(frame.area());

    layout::draw_header(frame, areas.header, app);
    layout::draw_tabs(frame, areas.tabs, app);

    match app.state.current_view {
        View::Visits => visits::draw(frame, areas.content, app),
        View::Documents => documents::draw(frame, areas.content, app),
        View::Forms => forms::draw_panel(frame, areas.content, app),
        View::Editor => forms::draw_editor(frame, areas.content, app),
    }

    layout::draw_status_bar(frame, areas.status, app);

    if let Some(pending) = &app.state.pending_delete {
        render_confirm_dialog(frame, pending);
    }

    // Errors go on top of everything
    if let Some(error) = app.state.current_error() {
        render_error_dialog(frame, error, app.state.queued_errors());
    }
}

/// Render a list scrolled so the selected row stays visible
fn render_scrollable_list(frame: &mut Frame, area: Rect, list: List, selected_index: usize) {
    let mut list_state = ListState::default().with_selected(Some(selected_index));
    frame.render_stateful_widget(list, area, &mut list_state);
}
