// Application state and orchestration logic.
//
// The central event loop that receives user commands from the TUI, drives the
// draw engine, owns the suspense timer, and pushes UI updates back to the TUI
// render loop. Everything runs on one task, so the engine needs no locking.

use anyhow::Context;
use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::draw::engine::{DrawEngine, DrawStart};
use crate::protocol::{UiUpdate, UserCommand};
use crate::store::KeyValueStore;

/// The engine as wired up by the binary.
pub type LiveEngine = DrawEngine<Database, StdRng>;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState<K, R> {
    pub config: Config,
    pub engine: DrawEngine<K, R>,
    /// When the in-flight draw commits. `Some` exactly while the engine is
    /// in `Phase::Drawing`.
    pub pending_draw: Option<Instant>,
    /// Why the saved raffle could not be restored, reported to the TUI when
    /// the event loop starts.
    pub restore_error: Option<String>,
}

impl<K: KeyValueStore, R: Rng> AppState<K, R> {
    pub fn new(config: Config, engine: DrawEngine<K, R>) -> Self {
        AppState {
            config,
            engine,
            pending_draw: None,
            restore_error: None,
        }
    }

    /// Open the suspense window if the engine accepted the request.
    fn schedule(&mut self, start: DrawStart) -> bool {
        if !start.is_started() {
            return false;
        }
        self.pending_draw = Some(Instant::now() + self.config.suspense());
        true
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the application event loop until `Quit` or the command channel closes.
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run<K: KeyValueStore, R: Rng>(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState<K, R>,
) -> anyhow::Result<()> {
    info!("Application event loop started");
    send_snapshot(&state, &ui_tx).await;
    if let Some(reason) = state.restore_error.take() {
        let _ = ui_tx.send(UiUpdate::RestoreFailed(reason)).await;
    }

    loop {
        let deadline = state.pending_draw;

        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Suspense timer (only armed while a draw is pending) ---
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                commit_pending_draw(&mut state, &ui_tx).await;
            }
        }
    }

    // A started draw always commits; skip the rest of the suspense on exit.
    if state.pending_draw.is_some() {
        info!("Committing in-flight draw before exit");
        commit_pending_draw(&mut state, &ui_tx).await;
    }

    info!("Application event loop exiting");
    Ok(())
}

/// Handle a user command from the TUI.
async fn handle_user_command<K: KeyValueStore, R: Rng>(
    state: &mut AppState<K, R>,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::Configure {
            start,
            end,
            total,
            exceptions,
        } => match state
            .engine
            .configure_from_form(&start, &end, &total, &exceptions)
        {
            Ok(()) => send_snapshot(state, ui_tx).await,
            Err(e) => {
                info!("Configuration rejected: {}", e);
                let _ = ui_tx.send(UiUpdate::ConfigureRejected(e.to_string())).await;
            }
        },
        UserCommand::Draw => {
            let start = state.engine.begin_draw();
            if state.schedule(start) {
                let _ = ui_tx.send(UiUpdate::DrawStarted).await;
                send_snapshot(state, ui_tx).await;
            }
        }
        UserCommand::Redraw => {
            let start = state.engine.begin_redraw();
            if state.schedule(start) {
                let _ = ui_tx.send(UiUpdate::DrawStarted).await;
                send_snapshot(state, ui_tx).await;
            }
        }
        UserCommand::Reset => {
            if state.pending_draw.take().is_some() {
                warn!("Reset during a draw; abandoning the pending result");
            }
            state.engine.reset();
            send_snapshot(state, ui_tx).await;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

/// Close the suspense window and publish the winner.
async fn commit_pending_draw<K: KeyValueStore, R: Rng>(
    state: &mut AppState<K, R>,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    state.pending_draw = None;
    match state.engine.complete_draw() {
        Some(number) => {
            let _ = ui_tx.send(UiUpdate::DrawCommitted(number)).await;
        }
        None => debug!("Suspense elapsed with no draw pending"),
    }
    send_snapshot(state, ui_tx).await;
}

async fn send_snapshot<K: KeyValueStore, R: Rng>(
    state: &AppState<K, R>,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let snapshot = state.engine.snapshot();
    let _ = ui_tx.send(UiUpdate::Snapshot(Box::new(snapshot))).await;
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

/// Restore a previously persisted raffle into the engine.
pub fn recover<K: KeyValueStore, R: Rng>(state: &mut AppState<K, R>) -> anyhow::Result<bool> {
    let restored = state
        .engine
        .restore()
        .context("failed to restore raffle state")?;
    if restored {
        info!(
            "Raffle restored: {} winners drawn, {} remaining",
            state.engine.winners().len(),
            state.engine.remaining_draws()
        );
    } else {
        info!("No saved raffle, waiting for setup");
    }
    Ok(restored)
}

/// Like [`recover`], but a saved raffle that cannot be restored does not stop
/// startup: the engine stays unconfigured, the stored keys are left for a
/// Reset (or the next Configure) to replace, and the reason is kept for the
/// TUI. Returns whether a raffle was restored.
pub fn recover_or_report<K: KeyValueStore, R: Rng>(state: &mut AppState<K, R>) -> bool {
    match recover(state) {
        Ok(restored) => restored,
        Err(e) => {
            error!("Recovery failed: {:#}", e);
            state.restore_error = Some(format!("{:#}", e));
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::engine::Phase;
    use crate::protocol::EngineSnapshot;
    use crate::store::MemoryStore;
    use rand::SeedableRng;
    use std::time::Duration;

    fn test_state(seed: u64) -> AppState<MemoryStore, StdRng> {
        let engine = DrawEngine::new(MemoryStore::new(), StdRng::seed_from_u64(seed));
        AppState::new(Config::default(), engine)
    }

    fn configure_cmd(start: &str, end: &str, total: &str, exceptions: &str) -> UserCommand {
        UserCommand::Configure {
            start: start.into(),
            end: end.into(),
            total: total.into(),
            exceptions: exceptions.into(),
        }
    }

    /// Drain every update currently queued.
    fn drain(rx: &mut mpsc::Receiver<UiUpdate>) -> Vec<UiUpdate> {
        let mut out = Vec::new();
        while let Ok(update) = rx.try_recv() {
            out.push(update);
        }
        out
    }

    fn last_snapshot(updates: &[UiUpdate]) -> Option<&EngineSnapshot> {
        updates.iter().rev().find_map(|u| match u {
            UiUpdate::Snapshot(s) => Some(s.as_ref()),
            _ => None,
        })
    }

    fn committed(updates: &[UiUpdate]) -> Vec<i64> {
        updates
            .iter()
            .filter_map(|u| match u {
                UiUpdate::DrawCommitted(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    // -- command handling --

    #[tokio::test]
    async fn configure_command_publishes_snapshot() {
        let mut state = test_state(1);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        handle_user_command(&mut state, configure_cmd("1", "10", "3", "3, 7"), &ui_tx).await;

        let updates = drain(&mut ui_rx);
        let snapshot = last_snapshot(&updates).expect("snapshot sent");
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.pool_size, 8);
    }

    #[tokio::test]
    async fn invalid_configure_reports_reason() {
        let mut state = test_state(1);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        handle_user_command(&mut state, configure_cmd("1", "10", "3", "11"), &ui_tx).await;

        let updates = drain(&mut ui_rx);
        assert_eq!(
            updates,
            vec![UiUpdate::ConfigureRejected(
                "exception number 11 is outside range 1-10".into()
            )]
        );
        assert_eq!(state.engine.phase(), Phase::Unconfigured);
    }

    #[tokio::test(start_paused = true)]
    async fn draw_command_arms_suspense_timer() {
        let mut state = test_state(1);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        handle_user_command(&mut state, configure_cmd("1", "10", "3", ""), &ui_tx).await;
        drain(&mut ui_rx);

        let before = Instant::now();
        handle_user_command(&mut state, UserCommand::Draw, &ui_tx).await;
        assert_eq!(state.pending_draw, Some(before + Duration::from_millis(3000)));
        assert!(state.engine.is_drawing());

        let updates = drain(&mut ui_rx);
        assert_eq!(updates[0], UiUpdate::DrawStarted);
        assert_eq!(last_snapshot(&updates).unwrap().phase, Phase::Drawing);
    }

    #[tokio::test(start_paused = true)]
    async fn second_draw_during_suspense_is_ignored() {
        let mut state = test_state(1);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        handle_user_command(&mut state, configure_cmd("1", "10", "3", ""), &ui_tx).await;
        handle_user_command(&mut state, UserCommand::Draw, &ui_tx).await;
        let deadline = state.pending_draw;
        drain(&mut ui_rx);

        tokio::time::advance(Duration::from_millis(500)).await;
        handle_user_command(&mut state, UserCommand::Draw, &ui_tx).await;
        handle_user_command(&mut state, UserCommand::Redraw, &ui_tx).await;

        assert!(drain(&mut ui_rx).is_empty());
        assert_eq!(state.pending_draw, deadline);
    }

    #[tokio::test]
    async fn reset_cancels_pending_draw() {
        let mut state = test_state(1);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        handle_user_command(&mut state, configure_cmd("1", "10", "3", ""), &ui_tx).await;
        handle_user_command(&mut state, UserCommand::Draw, &ui_tx).await;
        handle_user_command(&mut state, UserCommand::Reset, &ui_tx).await;

        assert!(state.pending_draw.is_none());
        assert_eq!(state.engine.phase(), Phase::Unconfigured);
        let updates = drain(&mut ui_rx);
        assert_eq!(
            last_snapshot(&updates),
            Some(&EngineSnapshot::unconfigured())
        );
    }

    #[tokio::test]
    async fn commit_publishes_winner() {
        let mut state = test_state(3);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        handle_user_command(&mut state, configure_cmd("1", "10", "3", ""), &ui_tx).await;
        handle_user_command(&mut state, UserCommand::Draw, &ui_tx).await;
        drain(&mut ui_rx);

        commit_pending_draw(&mut state, &ui_tx).await;
        let updates = drain(&mut ui_rx);
        let numbers = committed(&updates);
        assert_eq!(numbers.len(), 1);
        assert_eq!(state.engine.winners(), numbers.as_slice());
        assert!(state.pending_draw.is_none());
        assert_eq!(last_snapshot(&updates).unwrap().winners, numbers);
    }

    // -- event loop --

    #[tokio::test(start_paused = true)]
    async fn run_loop_draws_after_suspense() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, test_state(7)));

        cmd_tx.send(configure_cmd("1", "5", "5", "")).await.unwrap();
        for _ in 0..5 {
            cmd_tx.send(UserCommand::Draw).await.unwrap();
            // Let the paused clock run through the suspense window.
            tokio::time::sleep(Duration::from_millis(3100)).await;
        }
        // Quota reached: ignored.
        cmd_tx.send(UserCommand::Draw).await.unwrap();
        cmd_tx.send(UserCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();

        let mut updates = Vec::new();
        while let Some(update) = ui_rx.recv().await {
            updates.push(update);
        }
        let mut numbers = committed(&updates);
        assert_eq!(numbers.len(), 5);
        numbers.sort_unstable();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        let snapshot = last_snapshot(&updates).unwrap();
        assert_eq!(snapshot.phase, Phase::Complete);
        assert_eq!(snapshot.pool_size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_commits_in_flight_draw() {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(64);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, test_state(7)));

        cmd_tx.send(configure_cmd("1", "10", "2", "")).await.unwrap();
        cmd_tx.send(UserCommand::Draw).await.unwrap();
        cmd_tx.send(UserCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();

        let mut updates = Vec::new();
        while let Some(update) = ui_rx.recv().await {
            updates.push(update);
        }
        assert_eq!(committed(&updates).len(), 1);
        assert_eq!(last_snapshot(&updates).unwrap().winners.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_command_channel_stops_loop() {
        let (cmd_tx, cmd_rx) = mpsc::channel::<UserCommand>(4);
        let (ui_tx, _ui_rx) = mpsc::channel(16);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, test_state(1)));
        drop(cmd_tx);
        assert!(handle.await.unwrap().is_ok());
    }

    // -- recovery --

    #[test]
    fn recover_without_saved_state() {
        let mut state = test_state(1);
        assert!(!recover(&mut state).unwrap());
    }

    #[test]
    fn recover_restores_saved_raffle() {
        let mut state = test_state(1);
        state
            .engine
            .configure_from_form("1", "10", "3", "")
            .unwrap();
        state.engine.draw();
        let winners = state.engine.winners().to_vec();

        assert!(recover(&mut state).unwrap());
        assert_eq!(state.engine.winners(), winners.as_slice());
        assert_eq!(state.engine.pool_size(), 9);
    }

    fn corrupt_state(seed: u64) -> AppState<MemoryStore, StdRng> {
        let store = MemoryStore::new();
        store
            .set(
                crate::store::CONFIG_KEY,
                r#"{"start": 1, "end": 10, "total": 3, "exceptions": []}"#,
            )
            .unwrap();
        store.set(crate::store::WINNERS_KEY, "[4, 4]").unwrap();
        let engine = DrawEngine::new(store, StdRng::seed_from_u64(seed));
        AppState::new(Config::default(), engine)
    }

    #[test]
    fn recover_or_report_keeps_reason_for_corrupt_state() {
        let mut state = corrupt_state(1);
        assert!(!recover_or_report(&mut state));
        assert_eq!(state.engine.phase(), Phase::Unconfigured);
        let reason = state.restore_error.clone().expect("reason recorded");
        assert!(reason.contains("failed to restore raffle state"), "{reason}");
        // Nothing is erased until the user asks.
        assert!(state.engine.store().contains_key(crate::store::CONFIG_KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn run_reports_restore_failure_then_accepts_setup() {
        let mut state = corrupt_state(1);
        recover_or_report(&mut state);

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(16);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, state));

        let first = ui_rx.recv().await.unwrap();
        assert_eq!(
            first,
            UiUpdate::Snapshot(Box::new(EngineSnapshot::unconfigured()))
        );
        match ui_rx.recv().await.unwrap() {
            UiUpdate::RestoreFailed(reason) => assert!(reason.contains("more than once"), "{reason}"),
            other => panic!("expected RestoreFailed, got {:?}", other),
        }

        cmd_tx.send(UserCommand::Reset).await.unwrap();
        cmd_tx.send(configure_cmd("1", "5", "2", "")).await.unwrap();
        cmd_tx.send(UserCommand::Quit).await.unwrap();
        handle.await.unwrap().unwrap();

        let mut updates = Vec::new();
        while let Some(update) = ui_rx.recv().await {
            updates.push(update);
        }
        assert!(!updates.iter().any(|u| matches!(u, UiUpdate::RestoreFailed(_))));
        assert_eq!(last_snapshot(&updates).unwrap().phase, Phase::Ready);
    }
}
