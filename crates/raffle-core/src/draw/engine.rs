// Draw engine: pool of undrawn numbers, ordered winners, and the
// Configure / Draw / Redraw / Reset state machine.
//
//   Unconfigured --configure--> Ready --begin_draw--> Drawing --complete_draw--> Ready | Complete
//   Ready | Complete --begin_redraw--> Drawing
//   any --reset--> Unconfigured
//
// The suspense delay lives outside the engine: callers hold the engine in
// `Drawing` between `begin_draw` and `complete_draw`. Every call that arrives
// in the wrong phase is ignored without touching state.

use std::collections::{BTreeSet, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::{parse_form, DrawConfig, InvalidConfiguration};
use crate::store::{KeyValueStore, Repository, SavedState};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Where the engine sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unconfigured,
    Ready,
    Drawing,
    Complete,
}

/// Why a draw or redraw request was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Unconfigured,
    /// A draw is already in flight.
    Busy,
    /// Every requested winner has been drawn.
    QuotaReached,
    /// Redraw with no winners yet.
    NothingToRedraw,
    /// Voiding another number would leave too few to fill the quota.
    NoSpareNumbers,
}

/// Outcome of `begin_draw` / `begin_redraw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStart {
    Started,
    Ignored(IgnoreReason),
}

impl DrawStart {
    pub fn is_started(self) -> bool {
        self == DrawStart::Started
    }
}

#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error(transparent)]
    Invalid(#[from] InvalidConfiguration),

    #[error("a raffle is already configured; reset it first")]
    AlreadyConfigured,
}

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("failed to read persisted raffle state: {0:#}")]
    Store(anyhow::Error),

    #[error("persisted config is invalid: {0}")]
    InvalidConfig(#[from] InvalidConfiguration),

    #[error("persisted draw history is inconsistent: {reason}")]
    Inconsistent { reason: String },
}

/// Read-only view of the engine for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub phase: Phase,
    pub config: Option<DrawConfig>,
    pub pool_size: usize,
    pub winners: Vec<i64>,
    pub voided: Vec<i64>,
}

impl EngineSnapshot {
    pub fn unconfigured() -> Self {
        EngineSnapshot {
            phase: Phase::Unconfigured,
            config: None,
            pool_size: 0,
            winners: Vec::new(),
            voided: Vec::new(),
        }
    }
}

/// State that exists only while a raffle is configured.
#[derive(Debug, Clone)]
struct Session {
    config: DrawConfig,
    /// Undrawn eligible numbers. Order is irrelevant; selection is by index.
    pool: Vec<i64>,
    winners: Vec<i64>,
    voided: Vec<i64>,
}

impl Session {
    fn remaining_draws(&self) -> usize {
        (self.config.total_draws() as usize).saturating_sub(self.winners.len())
    }

    fn settled_phase(&self) -> Phase {
        if self.remaining_draws() == 0 {
            Phase::Complete
        } else {
            Phase::Ready
        }
    }
}

// ---------------------------------------------------------------------------
// DrawEngine
// ---------------------------------------------------------------------------

pub struct DrawEngine<K, R> {
    repo: Repository<K>,
    rng: R,
    phase: Phase,
    session: Option<Session>,
}

impl<K: KeyValueStore> DrawEngine<K, StdRng> {
    /// Engine seeded from the operating system's entropy source.
    pub fn from_entropy(store: K) -> Self {
        DrawEngine::new(store, StdRng::from_entropy())
    }
}

impl<K: KeyValueStore, R: Rng> DrawEngine<K, R> {
    /// Create an unconfigured engine. Call [`DrawEngine::restore`] to pick up
    /// a previously persisted session.
    pub fn new(store: K, rng: R) -> Self {
        DrawEngine {
            repo: Repository::new(store),
            rng,
            phase: Phase::Unconfigured,
            session: None,
        }
    }

    /// Start a raffle. Only valid while unconfigured.
    pub fn configure(&mut self, config: DrawConfig) -> Result<(), ConfigureError> {
        if self.phase != Phase::Unconfigured {
            return Err(ConfigureError::AlreadyConfigured);
        }

        let pool: Vec<i64> = config.eligible_numbers().collect();
        info!(
            "Configured raffle: range {}-{}, {} draws, {} exceptions, pool of {}",
            config.start(),
            config.end(),
            config.total_draws(),
            config.exceptions().len(),
            pool.len()
        );

        let saved = SavedState {
            config: config.clone(),
            winners: Vec::new(),
            voided: Vec::new(),
        };
        if let Err(e) = self.repo.save(&saved) {
            warn!("Failed to persist raffle config: {:#}", e);
        }

        self.session = Some(Session {
            config,
            pool,
            winners: Vec::new(),
            voided: Vec::new(),
        });
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Validate raw setup-form text and configure from it.
    pub fn configure_from_form(
        &mut self,
        start: &str,
        end: &str,
        total: &str,
        exceptions: &str,
    ) -> Result<(), ConfigureError> {
        if self.phase != Phase::Unconfigured {
            return Err(ConfigureError::AlreadyConfigured);
        }
        let config = parse_form(start, end, total, exceptions)?;
        self.configure(config)
    }

    /// Enter the suspense window for the next winner.
    pub fn begin_draw(&mut self) -> DrawStart {
        let start = match self.phase {
            Phase::Ready => DrawStart::Started,
            Phase::Unconfigured => DrawStart::Ignored(IgnoreReason::Unconfigured),
            Phase::Drawing => DrawStart::Ignored(IgnoreReason::Busy),
            Phase::Complete => DrawStart::Ignored(IgnoreReason::QuotaReached),
        };
        match start {
            DrawStart::Started => {
                self.phase = Phase::Drawing;
                debug!("Draw started");
            }
            DrawStart::Ignored(reason) => debug!("Draw ignored: {:?}", reason),
        }
        start
    }

    /// Void the most recent winner and enter the suspense window for its
    /// replacement. The voided number never returns to the pool.
    pub fn begin_redraw(&mut self) -> DrawStart {
        let reason = match (self.phase, self.session.as_ref()) {
            (Phase::Unconfigured, _) | (_, None) => Some(IgnoreReason::Unconfigured),
            (Phase::Drawing, _) => Some(IgnoreReason::Busy),
            (_, Some(s)) if s.winners.is_empty() => Some(IgnoreReason::NothingToRedraw),
            // After voiding, the pool must still cover every outstanding draw
            // plus the replacement.
            (_, Some(s)) if s.pool.len() <= s.remaining_draws() => {
                Some(IgnoreReason::NoSpareNumbers)
            }
            _ => None,
        };
        if let Some(reason) = reason {
            debug!("Redraw ignored: {:?}", reason);
            return DrawStart::Ignored(reason);
        }

        let Some(session) = self.session.as_mut() else {
            return DrawStart::Ignored(IgnoreReason::Unconfigured);
        };
        let Some(voided) = session.winners.pop() else {
            return DrawStart::Ignored(IgnoreReason::NothingToRedraw);
        };
        session.voided.push(voided);
        info!(
            "Voided winner #{} ({}); redrawing",
            session.winners.len() + 1,
            voided
        );

        if let Err(e) = self.repo.save_winners(&session.winners) {
            warn!("Failed to persist winners after void: {:#}", e);
        }
        if let Err(e) = self.repo.save_voided(&session.voided) {
            warn!("Failed to persist voided numbers: {:#}", e);
        }

        self.phase = Phase::Drawing;
        DrawStart::Started
    }

    /// Commit the pending draw: pick one pool number uniformly at random and
    /// append it to the winners. Returns `None` when no draw is pending.
    ///
    /// # Panics
    ///
    /// If the pool is empty while a draw is pending. Configure and redraw
    /// both keep at least one pool number per outstanding draw, so this is a
    /// logic defect rather than a user error.
    pub fn complete_draw(&mut self) -> Option<i64> {
        if self.phase != Phase::Drawing {
            return None;
        }
        let session = self.session.as_mut()?;

        assert!(
            !session.pool.is_empty(),
            "draw pool exhausted with {} of {} winners drawn",
            session.winners.len(),
            session.config.total_draws()
        );

        let idx = self.rng.gen_range(0..session.pool.len());
        let number = session.pool.swap_remove(idx);
        session.winners.push(number);
        info!(
            "Drew winner #{}: {} ({} numbers left in pool)",
            session.winners.len(),
            number,
            session.pool.len()
        );

        if let Err(e) = self.repo.save_winners(&session.winners) {
            warn!("Failed to persist winners: {:#}", e);
        }

        self.phase = session.settled_phase();
        Some(number)
    }

    /// Draw without a suspense window.
    pub fn draw(&mut self) -> Option<i64> {
        if self.begin_draw().is_started() {
            self.complete_draw()
        } else {
            None
        }
    }

    /// Void-and-replace without a suspense window.
    pub fn redraw(&mut self) -> Option<i64> {
        if self.begin_redraw().is_started() {
            self.complete_draw()
        } else {
            None
        }
    }

    /// Discard everything, in memory and in storage. Valid from any phase;
    /// a pending draw is abandoned.
    pub fn reset(&mut self) {
        if let Some(session) = &self.session {
            info!(
                "Resetting raffle ({} winners, {} voided)",
                session.winners.len(),
                session.voided.len()
            );
        }
        self.session = None;
        self.phase = Phase::Unconfigured;
        if let Err(e) = self.repo.clear() {
            warn!("Failed to clear persisted raffle state: {:#}", e);
        }
    }

    /// Rebuild the session from storage. Returns `Ok(true)` when a saved
    /// raffle was found; `Ok(false)` leaves the engine unconfigured.
    pub fn restore(&mut self) -> Result<bool, RestoreError> {
        let Some(saved) = self.repo.load().map_err(RestoreError::Store)? else {
            self.session = None;
            self.phase = Phase::Unconfigured;
            return Ok(false);
        };

        let config = saved.config.validated()?;
        check_history(&config, &saved.winners, &saved.voided)?;

        let drawn: HashSet<i64> = saved
            .winners
            .iter()
            .chain(saved.voided.iter())
            .copied()
            .collect();
        let pool: Vec<i64> = config
            .eligible_numbers()
            .filter(|n| !drawn.contains(n))
            .collect();

        let session = Session {
            config,
            pool,
            winners: saved.winners,
            voided: saved.voided,
        };
        if session.pool.len() < session.remaining_draws() {
            return Err(RestoreError::Inconsistent {
                reason: format!(
                    "{} draws outstanding but only {} numbers left",
                    session.remaining_draws(),
                    session.pool.len()
                ),
            });
        }

        info!(
            "Restored raffle: {} of {} winners drawn, {} numbers left in pool",
            session.winners.len(),
            session.config.total_draws(),
            session.pool.len()
        );
        self.phase = session.settled_phase();
        self.session = Some(session);
        Ok(true)
    }

    // -- read access --

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_configured(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_drawing(&self) -> bool {
        self.phase == Phase::Drawing
    }

    pub fn config(&self) -> Option<&DrawConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    /// Winners in draw order; index 0 is rank #1.
    pub fn winners(&self) -> &[i64] {
        self.session.as_ref().map(|s| s.winners.as_slice()).unwrap_or(&[])
    }

    pub fn voided(&self) -> &[i64] {
        self.session.as_ref().map(|s| s.voided.as_slice()).unwrap_or(&[])
    }

    pub fn pool_size(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.pool.len())
    }

    pub fn pool_contains(&self, n: i64) -> bool {
        self.session.as_ref().is_some_and(|s| s.pool.contains(&n))
    }

    /// Sorted copy of the pool.
    pub fn pool(&self) -> BTreeSet<i64> {
        self.session
            .as_ref()
            .map(|s| s.pool.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn remaining_draws(&self) -> usize {
        self.session.as_ref().map_or(0, Session::remaining_draws)
    }

    pub fn store(&self) -> &K {
        self.repo.inner()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        match &self.session {
            Some(s) => EngineSnapshot {
                phase: self.phase,
                config: Some(s.config.clone()),
                pool_size: s.pool.len(),
                winners: s.winners.clone(),
                voided: s.voided.clone(),
            },
            None => EngineSnapshot::unconfigured(),
        }
    }
}

/// Persisted winners and voids must be distinct eligible numbers, and there
/// cannot be more winners than the quota.
fn check_history(config: &DrawConfig, winners: &[i64], voided: &[i64]) -> Result<(), RestoreError> {
    if winners.len() > config.total_draws() as usize {
        return Err(RestoreError::Inconsistent {
            reason: format!(
                "{} winners recorded for a quota of {}",
                winners.len(),
                config.total_draws()
            ),
        });
    }

    let mut seen = HashSet::new();
    for &n in winners.iter().chain(voided.iter()) {
        if !config.in_range(n) {
            return Err(RestoreError::Inconsistent {
                reason: format!(
                    "{} is outside range {}-{}",
                    n,
                    config.start(),
                    config.end()
                ),
            });
        }
        if config.exceptions().contains(&n) {
            return Err(RestoreError::Inconsistent {
                reason: format!("{} is an exception but was drawn", n),
            });
        }
        if !seen.insert(n) {
            return Err(RestoreError::Inconsistent {
                reason: format!("{} was drawn more than once", n),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
