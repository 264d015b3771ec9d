// Ticket widget: the big zero-padded number in the middle of the screen.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

use raffle_core::protocol::Phase;

use crate::tui::ViewState;

/// Render the ticket panel.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let drawing = state.snapshot.phase == Phase::Drawing;
    let fresh = !drawing && state.fresh_winner == Some(state.shown_number);

    let border_color = if drawing { Color::Yellow } else { Color::White };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            " RAFFLE TICKET ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let number_style = if fresh {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    };

    let digits = spaced(&pad_number(state.shown_number, state.number_width()));

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Ticket number", Style::default().fg(Color::Gray))),
        Line::from(""),
        Line::from(Span::styled(format!(" {} ", digits), number_style)),
        Line::from(""),
    ];
    lines.push(Line::from(caption(state)));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// Zero-pad `n` to `width` digits, e.g. `pad_number(7, 3) == "007"`.
pub fn pad_number(n: i64, width: usize) -> String {
    if n < 0 {
        format!("-{:0width$}", n.unsigned_abs(), width = width)
    } else {
        format!("{:0width$}", n, width = width)
    }
}

/// Space the characters out so the number reads larger.
fn spaced(text: &str) -> String {
    text.chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ")
}

fn caption(state: &ViewState) -> Span<'static> {
    match state.snapshot.phase {
        Phase::Drawing => Span::styled(
            "Drawing...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::SLOW_BLINK),
        ),
        Phase::Ready if state.snapshot.winners.is_empty() => Span::styled(
            "Press Space to draw the first winner",
            Style::default().fg(Color::Gray),
        ),
        Phase::Ready => Span::styled(
            format!("Winner #{}", state.snapshot.winners.len()),
            Style::default().fg(Color::Green),
        ),
        Phase::Complete => Span::styled(
            "All draws complete",
            Style::default().fg(Color::Cyan),
        ),
        Phase::Unconfigured => Span::raw(""),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
