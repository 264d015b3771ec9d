// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Ticket (11 rows)                                  |
// +--------------------------------------------------+
// | Winners board (fill)                              |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+
//
// Before a raffle is configured the setup form takes the whole body
// (ticket + winners).

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Height of the ticket panel, borders included.
pub const TICKET_HEIGHT: u16 = 11;

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: phase, range, progress.
    pub status_bar: Rect,
    /// Everything between the status and help bars.
    pub body: Rect,
    /// Upper part of the body: the ticket with the current number.
    pub ticket: Rect,
    /// Lower part of the body: ranked winners and pending slots.
    pub winners: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: status(1) | body(fill) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(6),    // body
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let status_bar = vertical[0];
    let body = vertical[1];
    let help_bar = vertical[2];

    // Body: ticket | winners
    let body_sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(TICKET_HEIGHT), Constraint::Min(3)])
        .split(body);

    AppLayout {
        status_bar,
        body,
        ticket: body_sections[0],
        winners: body_sections[1],
        help_bar,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
