// TUI: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors the engine snapshot. The app
// orchestrator pushes `UiUpdate` messages over an mpsc channel; the TUI
// applies them to `ViewState` and re-renders at ~30 fps. The ticket
// animation runs entirely here; it never touches the engine.

pub mod form;
pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use raffle_core::config::{Config, FormDefaults};
use raffle_core::protocol::{EngineSnapshot, Phase, UiUpdate, UserCommand};

use form::SetupForm;
use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Which ticket animation, if any, should be running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    /// Fast cycling while a draw is in its suspense window.
    Shuffle,
    /// Slow cycling before the first draw of a raffle.
    Attract,
}

/// TUI-local state that mirrors the engine for rendering.
///
/// Updated incrementally via `UiUpdate` messages from the app orchestrator.
/// The `render_frame` function reads this struct to draw the screen.
pub struct ViewState {
    /// Latest engine state.
    pub snapshot: EngineSnapshot,
    /// Setup form contents, shown while unconfigured.
    pub form: SetupForm,
    /// Reason the last form submission was rejected.
    pub form_error: Option<String>,
    /// Number currently on the ticket.
    pub shown_number: i64,
    /// Winner committed by the most recent draw, highlighted until the next
    /// draw starts.
    pub fresh_winner: Option<i64>,
    /// Whether the reset confirmation dialog is showing.
    pub confirm_reset: bool,
    /// Whether the quit confirmation dialog is showing.
    pub confirm_quit: bool,
    /// Set when the saved raffle could not be loaded; the reset dialog then
    /// offers to erase it.
    pub restore_error: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::new(&Config::default().form)
    }
}

impl ViewState {
    pub fn new(form_defaults: &FormDefaults) -> Self {
        ViewState {
            snapshot: EngineSnapshot::unconfigured(),
            form: SetupForm::new(form_defaults),
            form_error: None,
            shown_number: 1,
            fresh_winner: None,
            confirm_reset: false,
            confirm_quit: false,
            restore_error: None,
        }
    }

    /// Apply a full engine snapshot.
    pub fn apply_snapshot(&mut self, snapshot: EngineSnapshot) {
        match snapshot.phase {
            Phase::Unconfigured => {
                self.shown_number = 1;
                self.fresh_winner = None;
                self.confirm_reset = false;
                if self.restore_error.take().is_some() {
                    self.form_error = None;
                }
            }
            Phase::Drawing => {}
            Phase::Ready | Phase::Complete => {
                self.form_error = None;
                self.restore_error = None;
                if let Some(&last) = snapshot.winners.last() {
                    self.shown_number = last;
                } else if let Some(config) = &snapshot.config {
                    self.shown_number = config.start();
                }
            }
        }
        self.snapshot = snapshot;
    }

    pub fn is_configured(&self) -> bool {
        self.snapshot.phase != Phase::Unconfigured
    }

    /// The animation the ticket should currently play.
    pub fn animation(&self) -> Option<Animation> {
        match self.snapshot.phase {
            Phase::Drawing => Some(Animation::Shuffle),
            Phase::Ready if self.snapshot.winners.is_empty() => Some(Animation::Attract),
            _ => None,
        }
    }

    /// Put a random in-range number on the ticket.
    pub fn shuffle_ticket(&mut self, rng: &mut impl Rng) {
        if let Some(config) = &self.snapshot.config {
            self.shown_number = rng.gen_range(config.start()..=config.end());
        }
    }

    /// Digits used when padding numbers for display.
    pub fn number_width(&self) -> usize {
        self.snapshot
            .config
            .as_ref()
            .map_or(1, |c| c.number_width())
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            state.apply_snapshot(*snapshot);
        }
        UiUpdate::ConfigureRejected(reason) => {
            state.form_error = Some(reason);
        }
        UiUpdate::DrawStarted => {
            state.fresh_winner = None;
        }
        UiUpdate::DrawCommitted(number) => {
            state.shown_number = number;
            state.fresh_winner = Some(number);
        }
        UiUpdate::RestoreFailed(reason) => {
            state.form_error = Some(format!("Saved raffle could not be loaded: {}", reason));
            state.restore_error = Some(reason);
            state.confirm_reset = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    if state.is_configured() {
        widgets::ticket::render(frame, layout.ticket, state);
        widgets::winners::render(frame, layout.winners, state);
    } else {
        widgets::setup_form::render(frame, layout.body, state);
    }
    render_help_bar(frame, &layout, state);

    if state.confirm_reset {
        let dialog = if state.restore_error.is_some() {
            widgets::confirm::Dialog::DiscardSaved
        } else {
            widgets::confirm::Dialog::Reset
        };
        widgets::confirm::render(frame, frame.area(), dialog);
    }
    if state.confirm_quit {
        widgets::confirm::render(frame, frame.area(), widgets::confirm::Dialog::Quit);
    }
}

/// Key hints for the current phase.
fn help_text(state: &ViewState) -> &'static str {
    match state.snapshot.phase {
        Phase::Unconfigured => " Tab:Next field | Enter:Start raffle | q:Quit",
        Phase::Ready => " Space:Draw | r:Redraw last | x:Reset | q:Quit",
        Phase::Drawing => " Drawing... | q:Quit",
        Phase::Complete => " Raffle complete | r:Redraw last | x:Reset | q:Quit",
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        help_text(state),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, animation and
///    render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    config: &Config,
) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();

    // 2. Set panic hook to restore terminal on crash.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    // 3. Create ViewState and the display-only random source
    let mut view_state = ViewState::new(&config.form);
    let mut rng = StdRng::from_entropy();

    // 4. Create crossterm EventStream for async keyboard input
    let mut event_stream = EventStream::new();

    // 5. Render (~30fps) and animation intervals
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut shuffle_tick = tokio::time::interval(config.shuffle_interval());
    shuffle_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut attract_tick = tokio::time::interval(config.attract_interval());
    attract_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // 6. Main loop
    loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => {
                        debug!("UI channel closed");
                        break;
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events: the next render tick picks up the size
                    }
                    Some(Err(e)) => {
                        warn!("Terminal input error: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            _ = shuffle_tick.tick() => {
                if view_state.animation() == Some(Animation::Shuffle) {
                    view_state.shuffle_ticket(&mut rng);
                }
            }

            _ = attract_tick.tick() => {
                if view_state.animation() == Some(Animation::Attract) {
                    view_state.shuffle_ticket(&mut rng);
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 7. Restore terminal
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
