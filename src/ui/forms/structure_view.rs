//! Section tree of the selected form template
//!
//! Sections are drawn in display order with children indented under their
//! parent. Fields flagged by the last validation are drawn in red.

use super::template_list::FALLBACK_BADGE;
use crate::api::DataSource;
use crate::app::App;
use crate::forms::{FieldSlot, FormField, FormSection, InputKind, SubmitMode};
use crate::state::{FormPanel, PanelPhase};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const INDENT: &str = "  ";

/// Rendered lines and the line of the focused field
pub struct StructureLines {
    pub lines: Vec<Line<'static>>,
    pub focus_line: usize,
}

pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let panel = &app.state.form_panel;
    let template_name = panel
        .selected_template
        .as_ref()
        .map_or("Form", |t| t.name.as_str());

    let mut title = vec![Span::raw(format!(" {template_name} "))];
    if panel.structure_source == DataSource::Fallback {
        title.push(Span::styled(
            format!("{FALLBACK_BADGE} "),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    match panel.phase {
        PanelPhase::Submitting(mode) if panel.completed => {
            let done = match mode {
                SubmitMode::Save => "Saved ",
                SubmitMode::GeneratePdf => "PDF ready ",
            };
            title.push(Span::styled(done, Style::default().fg(Color::Green)));
        }
        PanelPhase::Submitting(mode) => {
            title.push(Span::styled(
                format!("{} ", mode.progress_label()),
                Style::default().fg(Color::Yellow),
            ));
        }
        _ => {}
    }

    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if panel.loading {
        frame.render_widget(
            Paragraph::new("Loading form...")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let rendered = structure_lines(panel);
    // Keep the focused field in the middle third of the view
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = rendered.focus_line.saturating_sub(visible / 3);

    frame.render_widget(
        Paragraph::new(rendered.lines)
            .scroll((scroll as u16, 0))
            .block(block),
        area,
    );
}

/// Build the lines of the whole tree
pub fn structure_lines(panel: &FormPanel) -> StructureLines {
    let slots = panel.slots();
    let focused = slots.get(panel.focus).map(|s| s.field.id);
    let mut out = StructureLines {
        lines: Vec::new(),
        focus_line: 0,
    };

    if panel.sections.is_empty() {
        out.lines.push(Line::from(Span::styled(
            "This template has no sections.",
            Style::default().fg(Color::DarkGray),
        )));
        return out;
    }

    let ctx = RenderContext {
        panel,
        focused,
        editable: panel.phase == PanelPhase::Structure,
    };
    for section in &panel.sections {
        ctx.section_lines(section, 0, &mut out);
    }
    out
}

struct RenderContext<'a> {
    panel: &'a FormPanel,
    focused: Option<i64>,
    editable: bool,
}

impl RenderContext<'_> {
    fn section_lines(&self, section: &FormSection, depth: usize, out: &mut StructureLines) {
        let indent = INDENT.repeat(depth);
        out.lines.push(Line::from(Span::styled(
            format!("{indent}▾ {}", section.name),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )));

        for field in &section.fields {
            let slot = FieldSlot {
                depth,
                field,
            };
            if self.focused == Some(field.id) {
                out.focus_line = out.lines.len();
            }
            self.field_lines(slot, out);
        }

        for child in &section.children {
            self.section_lines(child, depth + 1, out);
        }
    }

    fn field_lines(&self, slot: FieldSlot<'_>, out: &mut StructureLines) {
        let field = slot.field;
        let indent = format!("{}{INDENT}", INDENT.repeat(slot.depth));
        let is_focused = self.editable && self.focused == Some(field.id);
        let flagged = self
            .panel
            .report
            .as_ref()
            .is_some_and(|r| r.is_flagged(field.id));

        let label_style = if flagged {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else if is_focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let mut label = vec![
            Span::raw(indent.clone()),
            Span::styled(if is_focused { "▸ " } else { "  " }, label_style),
            Span::styled(field.name.clone(), label_style),
        ];
        if field.required {
            label.push(Span::styled(" *", Style::default().fg(Color::Red)));
        }
        if let Some(unit) = field.unit.as_deref().filter(|u| !u.is_empty()) {
            label.push(Span::styled(
                format!(" ({unit})"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        if flagged {
            label.push(Span::styled(
                "  required",
                Style::default().fg(Color::Red),
            ));
        }
        out.lines.push(Line::from(label));

        let value_indent = format!("{indent}    ");
        for line in self.value_lines(field, is_focused) {
            let mut spans = vec![Span::raw(value_indent.clone())];
            spans.extend(line.spans);
            out.lines.push(Line::from(spans));
        }
    }

    fn value_lines(&self, field: &FormField, is_focused: bool) -> Vec<Line<'static>> {
        let value = self.panel.responses.get(field.id).unwrap_or("");
        let dim = Style::default().fg(Color::DarkGray);
        let cursor = || Span::styled("▌", Style::default().fg(Color::Cyan));

        match &field.kind {
            InputKind::Select | InputKind::Radio => {
                let options = field.option_list();
                if options.is_empty() {
                    return vec![Line::from(Span::styled("(no options)", dim))];
                }
                let spans = options
                    .into_iter()
                    .map(|option| {
                        let selected = option == value;
                        let marker = match (&field.kind, selected) {
                            (InputKind::Radio, true) => "(•) ",
                            (InputKind::Radio, false) => "( ) ",
                            (_, true) => "‹",
                            (_, false) => " ",
                        };
                        let text = if field.kind == InputKind::Select && selected {
                            format!("{marker}{option}›  ")
                        } else {
                            format!("{marker}{option}  ")
                        };
                        let style = if selected {
                            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                        } else {
                            dim
                        };
                        Span::styled(text, style)
                    })
                    .collect::<Vec<_>>();
                vec![Line::from(spans)]
            }
            InputKind::Checkbox => {
                let options = field.option_list();
                if options.is_empty() {
                    return vec![Line::from(Span::styled("(no options)", dim))];
                }
                let spans = options
                    .iter()
                    .enumerate()
                    .map(|(idx, option)| {
                        let checked = self.panel.responses.is_option_selected(field.id, option);
                        let text = format!("[{}] {option}  ", if checked { 'x' } else { ' ' });
                        let mut style = if checked {
                            Style::default().fg(Color::Green)
                        } else {
                            Style::default()
                        };
                        if is_focused && idx == self.panel.option_cursor {
                            style = style.add_modifier(Modifier::REVERSED);
                        }
                        Span::styled(text, style)
                    })
                    .collect::<Vec<_>>();
                vec![Line::from(spans)]
            }
            InputKind::Unsupported(raw) => {
                let mut spans = vec![Span::styled(
                    format!("[unsupported input type \"{raw}\"] "),
                    Style::default().fg(Color::Yellow),
                )];
                spans.push(Span::raw(value.to_string()));
                if is_focused {
                    spans.push(cursor());
                }
                vec![Line::from(spans)]
            }
            kind => {
                if value.is_empty() && !is_focused {
                    let hint = field
                        .placeholder
                        .clone()
                        .unwrap_or_else(|| format!("({})", kind.label()));
                    return vec![Line::from(Span::styled(hint, dim))];
                }
                let mut lines: Vec<Line<'static>> = value
                    .split('\n')
                    .map(|l| Line::from(l.to_string()))
                    .collect();
                if is_focused {
                    if let Some(last) = lines.last_mut() {
                        last.spans.push(cursor());
                    }
                }
                lines
            }
        }
    }
}
