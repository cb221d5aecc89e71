//! Visit list and detail pane

use super::render_scrollable_list;
use crate::api::{Visit, VisitStatus};
use crate::app::App;
use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

fn status_color(status: &VisitStatus) -> Color {
    match status {
        VisitStatus::InProgress => Color::Green,
        VisitStatus::Completed => Color::DarkGray,
        VisitStatus::Other(_) => Color::Yellow,
    }
}

fn doctor_label<'a>(app: &'a App, visit: &Visit) -> &'a str {
    match &visit.clinician_id {
        Some(id) => app.doctor_name(id),
        None => "-",
    }
}

/// Draw the visits tab
pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    draw_list(frame, chunks[0], app);
    draw_detail(frame, chunks[1], app);
}

fn draw_list(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(format!(" Visits ({}) ", app.state.visits.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.state.visits.is_empty() {
        let content = Paragraph::new("No visits yet.\nPress 'n' to start one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(content, area);
        return;
    }

    let items: Vec<ListItem> = app
        .state
        .visits
        .iter()
        .enumerate()
        .map(|(idx, visit)| {
            let is_selected = idx == app.state.visits_index;
            let prefix = if is_selected { "▸ " } else { "  " };
            let style = if is_selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(vec![
                Span::styled(prefix, style),
                Span::styled(
                    visit
                        .started_at
                        .with_timezone(&Local)
                        .format("%d/%m/%Y %H:%M")
                        .to_string(),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("{:<12}", visit.status.label()),
                    Style::default().fg(status_color(&visit.status)),
                ),
                Span::styled(doctor_label(app, visit).to_string(), style),
                Span::styled(
                    format!("  {}", visit.reason),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    render_scrollable_list(frame, area, List::new(items).block(block), app.state.visits_index);
}

fn draw_detail(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Visit ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let Some(visit) = app.state.selected_visit() else {
        frame.render_widget(block, area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Doctor  ", label),
            Span::styled(
                doctor_label(app, visit).to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Status  ", label),
            Span::styled(
                visit.status.label().to_string(),
                Style::default().fg(status_color(&visit.status)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Ended   ", label),
            Span::raw(
                visit
                    .ended_at
                    .map(|t| t.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]),
        Line::from(vec![Span::styled("Reason  ", label), Span::raw(visit.reason.clone())]),
        Line::from(""),
        Line::from(Span::styled("Note", label)),
    ];
    match visit.note.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(note) => lines.extend(note.lines().map(|l| Line::from(l.to_string()))),
        None => lines.push(Line::from(Span::styled("(none)", label))),
    }

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}
