//! Visit and document editors

use super::field_renderer::draw_field;
use crate::app::App;
use crate::platform::SAVE_SHORTCUT;
use crate::state::EditorState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Draw the open editor, one boxed input per field
pub fn draw_editor(frame: &mut Frame, area: Rect, app: &App) {
    let editor = &app.state.editor;
    let fields = editor.fields();

    let mut constraints: Vec<Constraint> = Vec::with_capacity(fields.len() + 2);
    if matches!(editor, EditorState::DocumentReplace(_)) {
        constraints.push(Constraint::Length(1)); // Document being replaced
    }
    constraints.extend(fields.iter().map(|f| {
        if f.is_multiline {
            Constraint::Min(6)
        } else {
            Constraint::Length(3)
        }
    }));
    constraints.push(Constraint::Length(1)); // Help text
    if !fields.iter().any(|f| f.is_multiline) {
        constraints.push(Constraint::Min(0));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(area);

    let block = Block::default()
        .title(format!(" {} ", editor.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block, area);

    let mut next = 0;
    if let EditorState::DocumentReplace(form) = editor {
        frame.render_widget(
            Paragraph::new(format!("Replacing the file of \"{}\"", form.document_name))
                .style(Style::default().fg(Color::Yellow)),
            chunks[next],
        );
        next += 1;
    }

    for (idx, field) in fields.iter().enumerate() {
        draw_field(frame, chunks[next], field, idx == editor.active_field());
        next += 1;
    }

    let key = Style::default().fg(Color::Cyan);
    let mut help = vec![
        Span::styled("Tab", key),
        Span::raw(": next field  "),
        Span::styled(SAVE_SHORTCUT, key),
        Span::raw(": save  "),
        Span::styled("Esc", key),
        Span::raw(": cancel"),
    ];
    if editor.is_active_field_multiline() {
        help.push(Span::raw("  "));
        help.push(Span::styled("Enter", key));
        help.push(Span::raw(": new line"));
    }
    frame.render_widget(
        Paragraph::new(Line::from(help)).style(Style::default().fg(Color::DarkGray)),
        chunks[next],
    );
}
