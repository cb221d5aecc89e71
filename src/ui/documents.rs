//! Document list and detail pane

use super::render_scrollable_list;
use crate::app::App;
use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Draw the documents tab
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
        .title(format!(" Documents ({}) ", app.state.documents.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if app.state.documents.is_empty() {
        let content = Paragraph::new("No documents.\nPress 'u' to upload one.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(content, area);
        return;
    }

    let items: Vec<ListItem> = app
        .state
        .documents
        .iter()
        .enumerate()
        .map(|(idx, doc)| {
            let is_selected = idx == app.state.documents_index;
            let prefix = if is_selected { "▸ " } else { "  " };
            let style = if is_selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(vec![
                Span::styled(prefix, style),
                Span::styled(
                    format!("{:<14}", doc.doc_type.as_deref().unwrap_or("-")),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(doc.name.clone(), style),
            ]))
        })
        .collect();

    render_scrollable_list(frame, area, List::new(items).block(block), app.state.documents_index);
}

fn draw_detail(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Document ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let Some(doc) = app.state.selected_document() else {
        frame.render_widget(block, area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let lines = vec![
        Line::from(vec![Span::styled("Name      ", label), Span::raw(doc.name.clone())]),
        Line::from(vec![
            Span::styled("Type      ", label),
            Span::raw(doc.doc_type.clone().unwrap_or_else(|| "-".to_string())),
        ]),
        Line::from(vec![
            Span::styled("Uploaded  ", label),
            Span::raw(
                doc.uploaded_at
                    .map(|t| t.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]),
        Line::from(vec![
            Span::styled("File      ", label),
            match &doc.url {
                Some(url) => Span::styled(url.clone(), Style::default().fg(Color::Blue)),
                None => Span::styled("(no file)", label),
            },
        ]),
        Line::from(""),
        Line::from(doc.description.clone().unwrap_or_default()),
    ];

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}
