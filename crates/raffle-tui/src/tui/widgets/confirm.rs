// Confirmation overlay widget.
//
// Renders a centered modal dialog asking the user to confirm quitting or
// resetting the raffle. Displayed on top of the main layout when
// `ViewState::confirm_quit` or `ViewState::confirm_reset` is set.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

/// Which question the dialog asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialog {
    Quit,
    Reset,
    /// Offered at startup when the saved raffle is unreadable.
    DiscardSaved,
}

impl Dialog {
    fn title(self) -> &'static str {
        match self {
            Dialog::Quit => " Quit? ",
            Dialog::Reset => " Reset? ",
            Dialog::DiscardSaved => " Saved raffle unreadable ",
        }
    }

    fn question(self) -> &'static str {
        match self {
            Dialog::Quit => "Really quit?",
            Dialog::Reset => "Reset raffle?",
            Dialog::DiscardSaved => "Erase saved raffle?",
        }
    }

    /// Extra line under the question, if any.
    fn warning(self) -> Option<&'static str> {
        match self {
            Dialog::Quit => None,
            Dialog::Reset => Some("All winners will be erased."),
            Dialog::DiscardSaved => Some("Otherwise a new raffle replaces it."),
        }
    }

    fn size(self) -> (u16, u16) {
        match self {
            Dialog::Quit => (28, 5),
            Dialog::Reset => (34, 6),
            Dialog::DiscardSaved => (44, 6),
        }
    }

    fn color(self) -> Color {
        match self {
            Dialog::Quit => Color::Yellow,
            Dialog::Reset | Dialog::DiscardSaved => Color::Red,
        }
    }
}

/// Render the confirmation overlay centered on the screen.
pub fn render(frame: &mut Frame, area: Rect, dialog: Dialog) {
    let (width, height) = dialog.size();
    let dialog_area = centered_rect(width, height, area);

    // Clear the area behind the dialog so it renders cleanly on top
    frame.render_widget(Clear, dialog_area);

    let color = dialog.color();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            dialog.title(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));

    let mut lines = vec![Line::from(vec![
        Span::raw(format!("  {} (", dialog.question())),
        Span::styled("y", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw("/"),
        Span::styled("n", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::raw(")"),
    ])];
    if let Some(warning) = dialog.warning() {
        lines.push(Line::from(Span::styled(
            format!("  {}", warning),
            Style::default().fg(Color::Gray),
        )));
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(Color::Black));

    frame.render_widget(paragraph, dialog_area);
}

/// Compute a centered rectangle of the given size within `area`.
///
/// If the area is too small, the dialog is clamped to the available space.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
