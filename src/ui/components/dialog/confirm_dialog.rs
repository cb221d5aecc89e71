//! Confirmation dialog for deletions

use super::base::{render_dialog, DialogConfig};
use crate::state::{DeleteTarget, PendingDelete};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Frame,
};

fn option_span(label: &'static str, selected: bool, color: Color) -> Span<'static> {
    if selected {
        Span::styled(
            format!("▸ {label}  "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!("  {label}  "), Style::default().fg(Color::DarkGray))
    }
}

/// Render the delete confirmation with Cancel/Delete options
pub fn render_confirm_dialog(frame: &mut Frame, pending: &PendingDelete) {
    let kind = match pending.target {
        DeleteTarget::Visit(_) => "This visit and its forms",
        DeleteTarget::Document(_) => "This document",
    };
    let message = format!(
        "Delete {}?\n{kind} will be removed from the patient record.",
        pending.label
    );

    let footer = vec![
        Line::from(vec![
            option_span("Cancel", !pending.confirm_selected, Color::White),
            option_span("Delete", pending.confirm_selected, Color::Red),
        ]),
        Line::from(vec![
            Span::styled("←→", Style::default().fg(Color::Cyan)),
            Span::styled(" select  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Enter", Style::default().fg(Color::Cyan)),
            Span::styled(" confirm  ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Cyan)),
            Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    render_dialog(
        frame,
        DialogConfig {
            title: "Confirm Delete",
            accent: Color::Red,
            message: &message,
            footer,
            max_width: 56,
        },
    );
}
