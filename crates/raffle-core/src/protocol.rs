// Messages exchanged between the app orchestrator and the TUI.

pub use crate::draw::engine::{EngineSnapshot, Phase};

/// Commands from the TUI to the app orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    /// Setup form submission, as typed.
    Configure {
        start: String,
        end: String,
        total: String,
        exceptions: String,
    },
    Draw,
    Redraw,
    Reset,
    Quit,
}

/// Updates pushed from the app orchestrator to the TUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    /// Full engine state; sent after every accepted command.
    Snapshot(Box<EngineSnapshot>),
    /// The setup form was rejected; carries the reason to display.
    ConfigureRejected(String),
    /// The suspense window opened.
    DrawStarted,
    /// The suspense window closed with this winner.
    DrawCommitted(i64),
    /// The saved raffle could not be loaded at startup; carries the reason.
    /// Sent once, right after the first snapshot.
    RestoreFailed(String),
}
