//! Field rendering utilities for the editors

use crate::state::InputField;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const CURSOR: &str = "▌";

/// Draw a boxed input field; the active one gets a cursor and a cyan border
pub fn draw_field(frame: &mut Frame, area: Rect, field: &InputField, is_active: bool) {
    let accent = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let value = field.as_text();
    let mut lines: Vec<Line> = if value.is_empty() && !is_active {
        vec![Line::from(Span::styled("(empty)", accent))]
    } else if field.is_multiline {
        value.split('\n').map(|l| Line::from(l.to_string())).collect()
    } else {
        vec![Line::from(Span::styled(value.to_string(), accent))]
    };

    if is_active {
        match lines.last_mut() {
            Some(last) => last.spans.push(Span::styled(CURSOR, accent)),
            None => lines.push(Line::from(Span::styled(CURSOR, accent))),
        }
    }

    let block = Block::default()
        .title(format!(" {} ", field.label))
        .borders(Borders::ALL)
        .border_style(accent);

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
        area,
    );
}
