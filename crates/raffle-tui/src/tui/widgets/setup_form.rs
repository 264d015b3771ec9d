// Setup form widget: range, quota and exception fields shown before a raffle.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::form::{FormField, SetupForm};
use crate::tui::ViewState;

const FORM_WIDTH: u16 = 60;
const FORM_HEIGHT: u16 = 14;
/// Column where field values start.
const LABEL_WIDTH: usize = 14;

/// Render the setup form centered in `area`.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let vertical = Layout::vertical([Constraint::Length(FORM_HEIGHT.min(area.height))])
        .flex(Flex::Center)
        .split(area);
    let form_area = Layout::horizontal([Constraint::Length(FORM_WIDTH.min(area.width))])
        .flex(Flex::Center)
        .split(vertical[0])[0];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(Span::styled(
            " Raffle Setup ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));

    let mut lines = vec![Line::from("")];
    lines.extend(
        FormField::ALL
            .iter()
            .map(|&field| field_line(&state.form, field)),
    );
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Exceptions: comma-separated, e.g. 5, 10, 15",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));
    if let Some(error) = &state.form_error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, form_area);
}

/// One `label: value` row; the focused field gets a cursor and highlight.
pub fn field_line(form: &SetupForm, field: FormField) -> Line<'static> {
    let focused = form.focus == field;
    let marker = if focused { "> " } else { "  " };
    let label = format!("{}{:<w$}", marker, field.label(), w = LABEL_WIDTH);
    let value = if focused {
        format!("{}_", form.value(field))
    } else {
        form.value(field).to_string()
    };

    let (label_style, value_style) = if focused {
        (
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )
    } else {
        (
            Style::default().fg(Color::White),
            Style::default().fg(Color::White),
        )
    };

    Line::from(vec![
        Span::styled(label, label_style),
        Span::styled(value, value_style),
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
