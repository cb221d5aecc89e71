//! Template list of the form panel

use super::super::render_scrollable_list;
use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Badge appended to titles when data came from the fallback source
pub const FALLBACK_BADGE: &str = "[fallback source]";

pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let panel = &app.state.form_panel;

    let mut title = vec![Span::raw(" Form templates ")];
    if panel.catalog.is_fallback() {
        title.push(Span::styled(
            format!("{FALLBACK_BADGE} "),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if panel.loading {
        frame.render_widget(
            Paragraph::new("Loading templates...")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    if panel.catalog.templates.is_empty() {
        frame.render_widget(
            Paragraph::new("No form templates for this specialty.\nPress 'r' to reload.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = panel
        .catalog
        .templates
        .iter()
        .enumerate()
        .map(|(idx, template)| {
            let is_selected = idx == panel.list_index;
            let prefix = if is_selected { "▸ " } else { "  " };
            let style = if is_selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            let mut spans = vec![
                Span::styled(prefix, style),
                Span::styled(template.name.clone(), style.add_modifier(Modifier::BOLD)),
            ];
            if let Some(description) = template.description.as_deref().filter(|d| !d.is_empty()) {
                spans.push(Span::styled(
                    format!("  {description}"),
                    Style::default().fg(Color::Gray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    render_scrollable_list(frame, area, List::new(items).block(block), panel.list_index);
}
