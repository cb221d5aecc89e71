//! Form rendering module
//!
//! - `field_renderer`: boxed text inputs used by the editors
//! - `editor`: visit and document editors
//! - `template_list`: form templates of the open visit
//! - `structure_view`: the section tree of the selected template

mod editor;
mod field_renderer;
mod structure_view;
mod template_list;

use crate::app::App;
use crate::state::PanelPhase;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub use editor::draw_editor;

/// Draw the forms tab for the current panel phase
pub fn draw_panel(frame: &mut Frame, area: Rect, app: &App) {
    match app.state.form_panel.phase {
        PanelPhase::Closed => {
            let hint = Paragraph::new(
                "Select a visit and press 'f' (or Enter here) to fill a form for it.",
            )
            .style(Style::default().fg(Color::DarkGray))
            .block(
                Block::default()
                    .title(" Forms ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
            frame.render_widget(hint, area);
        }
        PanelPhase::List => template_list::draw(frame, area, app),
        PanelPhase::Structure | PanelPhase::Submitting(_) => structure_view::draw(frame, area, app),
    }
}
