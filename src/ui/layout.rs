//! Layout components (profile header, tabs, status bar)

use super::components::{render_tab_button, BUTTON_HEIGHT};
use crate::app::App;
use crate::forms::SubmitMode;
use crate::platform::{PDF_SHORTCUT, SAVE_SHORTCUT};
use crate::state::{PanelPhase, View};
use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Areas of the main screen
pub struct ScreenAreas {
    pub header: Rect,
    pub tabs: Rect,
    pub content: Rect,
    pub status: Rect,
}

/// Split the screen into header, tab row, content and status bar
pub fn create_layout(area: Rect) -> ScreenAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),             // Patient header
            Constraint::Length(BUTTON_HEIGHT), // Tabs
            Constraint::Min(0),                // Content
            Constraint::Length(1),             // Status bar
        ])
        .split(area);

    ScreenAreas {
        header: chunks[0],
        tabs: chunks[1],
        content: chunks[2],
        status: chunks[3],
    }
}

/// Draw patient demographics
pub fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let dim = Style::default().fg(Color::DarkGray);

    let lines = match &app.state.patient {
        Some(patient) => {
            let age = patient
                .age_on(Local::now().date_naive())
                .map(|years| format!("{years} y"))
                .unwrap_or_else(|| "age unknown".to_string());
            let birth = patient
                .birth_date
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "-".to_string());

            vec![
                Line::from(vec![
                    Span::styled(
                        patient.full_name(),
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("  {age}"), Style::default().fg(Color::Cyan)),
                    Span::styled(
                        format!("  {}", patient.sex.as_deref().unwrap_or("")),
                        dim,
                    ),
                ]),
                Line::from(vec![
                    Span::styled("Born ", dim),
                    Span::raw(birth),
                    Span::styled("  Phone ", dim),
                    Span::raw(patient.phone.clone().unwrap_or_else(|| "-".to_string())),
                    Span::styled("  Email ", dim),
                    Span::raw(patient.email.clone().unwrap_or_else(|| "-".to_string())),
                    Span::styled("  Address ", dim),
                    Span::raw(patient.address.clone().unwrap_or_else(|| "-".to_string())),
                ]),
            ]
        }
        None => vec![Line::from(Span::styled(
            format!("Patient {} (details unavailable)", app.state.patient_id),
            dim,
        ))],
    };

    let header = Paragraph::new(lines).block(
        Block::default()
            .title(" Patient ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(header, area);
}

/// Draw the tab row
pub fn draw_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Min(0),
        ])
        .split(area);

    let active = app.state.current_view.tab_index();
    for (idx, view) in View::TABS.iter().enumerate() {
        render_tab_button(frame, chunks[idx], idx + 1, view.label(), active == Some(idx));
    }
}

/// Draw the status bar
pub fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::raw(" ")];

    let hints = view_hints(app);
    spans.push(Span::styled(hints, Style::default().fg(Color::Gray)));

    if let Some(msg) = &app.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg, Style::default().fg(Color::Green)));
    }

    if let Some(clinician) = &app.state.clinician_id {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("as {}", app.doctor_name(clinician)),
            Style::default().fg(Color::Blue),
        ));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);

    let quit_hint = " ^C:quit ";
    let quit_area = Rect {
        x: area.x + area.width.saturating_sub(quit_hint.len() as u16),
        y: area.y,
        width: (quit_hint.len() as u16).min(area.width),
        height: 1,
    };
    let quit_widget =
        Paragraph::new(quit_hint).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
    frame.render_widget(quit_widget, quit_area);
}

/// Keyboard hints for the current view
fn view_hints(app: &App) -> String {
    match app.state.current_view {
        View::Visits => "j/k:nav  n:new  e:edit  x:end  d:delete  f:forms  r:refresh".to_string(),
        View::Documents => {
            "j/k:nav  u:upload  e:edit  r:replace  o:open  d:delete  R:refresh".to_string()
        }
        View::Forms => match app.state.form_panel.phase {
            PanelPhase::Closed => "Enter:open forms of the selected visit".to_string(),
            PanelPhase::List => "j/k:nav  Enter:fill  r:reload  Esc:close".to_string(),
            PanelPhase::Structure => format!(
                "Tab:next  ←→:choose  Space:check  {SAVE_SHORTCUT}:save  {PDF_SHORTCUT}:PDF  Esc:back"
            ),
            PanelPhase::Submitting(SubmitMode::Save) => "Saving...".to_string(),
            PanelPhase::Submitting(SubmitMode::GeneratePdf) => "Generating PDF...".to_string(),
        },
        View::Editor => format!("Tab:next  {SAVE_SHORTCUT}:save  Esc:cancel"),
    }
}
