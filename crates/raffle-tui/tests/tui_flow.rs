// End-to-end flow through the TUI input layer and the app event loop.
//
// Key presses are turned into commands by the input handler, sent to a real
// app loop over an in-memory store, and the resulting updates are applied to
// a ViewState exactly as the TUI does.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use raffle_core::app::{self, AppState};
use raffle_core::config::Config;
use raffle_core::draw::engine::DrawEngine;
use raffle_core::protocol::{Phase, UiUpdate, UserCommand};
use raffle_core::store::{KeyValueStore, MemoryStore, CONFIG_KEY, WINNERS_KEY};
use raffle_tui::tui::form::FormField;
use raffle_tui::tui::{apply_ui_update, input, ViewState};

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Press,
        state: KeyEventState::NONE,
    }
}

struct Harness {
    view: ViewState,
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
}

impl Harness {
    fn start(seed: u64) -> Self {
        Self::start_with(MemoryStore::new(), seed)
    }

    /// Start over `store`, restoring whatever it holds first.
    fn start_with(store: MemoryStore, seed: u64) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, ui_rx) = mpsc::channel(64);
        let engine = DrawEngine::new(store, StdRng::seed_from_u64(seed));
        let mut state = AppState::new(Config::default(), engine);
        app::recover_or_report(&mut state);
        tokio::spawn(app::run(cmd_rx, ui_tx, state));
        Harness {
            view: ViewState::default(),
            cmd_tx,
            ui_rx,
        }
    }

    /// Feed a key through the input handler, forwarding any command.
    async fn press(&mut self, code: KeyCode) {
        if let Some(cmd) = input::handle_key(key(code), &mut self.view) {
            self.cmd_tx.send(cmd).await.unwrap();
        }
    }

    async fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c)).await;
        }
    }

    /// Let the app loop run (and the paused clock advance), then apply
    /// every update it produced.
    async fn settle(&mut self, wait: Duration) {
        tokio::time::sleep(wait).await;
        while let Ok(update) = self.ui_rx.try_recv() {
            apply_ui_update(&mut self.view, update);
        }
    }
}

const SUSPENSE: Duration = Duration::from_millis(3100);
const SHORT: Duration = Duration::from_millis(10);

#[tokio::test(start_paused = true)]
async fn setup_draw_redraw_and_reset() {
    let mut h = Harness::start(21);
    h.settle(SHORT).await;
    assert!(!h.view.is_configured());

    // Fill the form: 1..20, five winners, skip 13.
    h.press(KeyCode::Tab).await;
    h.press(KeyCode::Backspace).await;
    h.press(KeyCode::Backspace).await;
    h.press(KeyCode::Backspace).await;
    h.type_text("20").await;
    h.press(KeyCode::Tab).await;
    h.press(KeyCode::Tab).await;
    assert_eq!(h.view.form.focus, FormField::Exceptions);
    h.type_text("13").await;
    h.press(KeyCode::Enter).await;
    h.settle(SHORT).await;

    assert!(h.view.is_configured());
    assert_eq!(h.view.snapshot.pool_size, 19);
    assert_eq!(h.view.snapshot.phase, Phase::Ready);

    // Draw: the ticket shuffles during suspense, then shows the winner.
    h.press(KeyCode::Char(' ')).await;
    h.settle(SHORT).await;
    assert_eq!(h.view.snapshot.phase, Phase::Drawing);
    h.settle(SUSPENSE).await;
    assert_eq!(h.view.snapshot.winners.len(), 1);
    let first = h.view.snapshot.winners[0];
    assert_eq!(h.view.shown_number, first);
    assert_eq!(h.view.fresh_winner, Some(first));
    assert_ne!(first, 13);

    // Redraw voids it.
    h.press(KeyCode::Char('r')).await;
    h.settle(SUSPENSE).await;
    assert_eq!(h.view.snapshot.winners.len(), 1);
    assert_eq!(h.view.snapshot.voided, vec![first]);
    assert_ne!(h.view.snapshot.winners[0], first);

    // Reset needs confirmation.
    h.press(KeyCode::Char('x')).await;
    h.settle(SHORT).await;
    assert!(h.view.is_configured());
    h.press(KeyCode::Char('y')).await;
    h.settle(SHORT).await;
    assert!(!h.view.is_configured());
    assert!(h.view.snapshot.winners.is_empty());
}

#[tokio::test(start_paused = true)]
async fn rejected_form_shows_reason() {
    let mut h = Harness::start(3);
    h.settle(SHORT).await;

    // Total draws of 0 is invalid.
    h.press(KeyCode::Tab).await;
    h.press(KeyCode::Tab).await;
    h.press(KeyCode::Backspace).await;
    h.type_text("0").await;
    h.press(KeyCode::Enter).await;
    h.settle(SHORT).await;

    assert!(!h.view.is_configured());
    let error = h.view.form_error.clone().expect("form error shown");
    assert!(error.contains("greater than 0"), "unexpected error: {error}");

    // Fixing the field and resubmitting clears the error.
    h.press(KeyCode::Backspace).await;
    h.type_text("2").await;
    h.press(KeyCode::Enter).await;
    h.settle(SHORT).await;
    assert!(h.view.is_configured());
    assert!(h.view.form_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn quit_key_flow_stops_the_app() {
    let mut h = Harness::start(1);
    h.press(KeyCode::Char('q')).await;
    assert!(h.view.confirm_quit);
    h.press(KeyCode::Char('y')).await;
    h.settle(SHORT).await;

    // The loop has exited and dropped its sender.
    assert!(h.ui_rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn unreadable_saved_raffle_offers_reset() {
    let store = MemoryStore::new();
    store
        .set(CONFIG_KEY, r#"{"start": 1, "end": 10, "total": 2, "exceptions": []}"#)
        .unwrap();
    store.set(WINNERS_KEY, "[12]").unwrap();

    let mut h = Harness::start_with(store, 4);
    h.settle(SHORT).await;
    assert!(!h.view.is_configured());
    assert!(h.view.confirm_reset);
    let error = h.view.form_error.clone().expect("restore error shown");
    assert!(error.contains("outside range"), "unexpected error: {error}");

    h.press(KeyCode::Char('y')).await;
    h.settle(SHORT).await;
    assert!(!h.view.confirm_reset);
    assert!(h.view.restore_error.is_none());
    assert!(h.view.form_error.is_none());

    // The setup form works as usual afterwards.
    h.press(KeyCode::Enter).await;
    h.settle(SHORT).await;
    assert!(h.view.is_configured());
}
