//! Per-room timeout scheduler for Bluffhall.
//!
//! A room has two suspend points where it waits on a single player:
//!
//! - **Play**: the player to act owes a play (or a challenge).
//! - **Wire**: a penalized player owes a wire choice.
//!
//! They are mutually exclusive, so a scheduler holds at most one armed
//! timer. Arming replaces whatever was armed before; cancelling clears it.
//!
//! # Epoch tokens
//!
//! Every armed timer carries the room's transition counter (its *epoch*)
//! captured at arm time. When the timer fires, the room compares the
//! token against its current epoch and ignores the expiry if the room has
//! moved on. Cancellation is therefore purely logical: a stale expiry
//! that slips through is a no-op, never a wrong transition.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands, then re-arm */ }
//!         expiry = scheduler.wait_for_expiry() => {
//!             if expiry.is_current(room.epoch) { /* apply timeout */ }
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which suspend point a timer guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Waiting for the active player's play or challenge.
    Play,
    /// Waiting for a penalized player's wire choice.
    Wire,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Play => write!(f, "play"),
            Self::Wire => write!(f, "wire"),
        }
    }
}

/// Timeout durations for the two suspend points.
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// How long a player may hold the turn. Default: 120 s.
    pub play_timeout: Duration,
    /// How long a penalized player may take to choose a wire. Default: 120 s.
    pub wire_timeout: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            play_timeout: Duration::from_secs(120),
            wire_timeout: Duration::from_secs(120),
        }
    }
}

impl TimerConfig {
    /// Shortest timeout accepted.
    pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

    /// Creates a config from whole seconds.
    pub fn from_secs(play_secs: u64, wire_secs: u64) -> Self {
        Self {
            play_timeout: Duration::from_secs(play_secs),
            wire_timeout: Duration::from_secs(wire_secs),
        }
    }

    /// Clamp any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TimeoutScheduler::new`]. A zero timeout
    /// would eliminate players the instant their turn starts.
    pub fn validated(mut self) -> Self {
        if self.play_timeout < Self::MIN_TIMEOUT {
            warn!(timeout = ?self.play_timeout, "play timeout below minimum, clamping");
            self.play_timeout = Self::MIN_TIMEOUT;
        }
        if self.wire_timeout < Self::MIN_TIMEOUT {
            warn!(timeout = ?self.wire_timeout, "wire timeout below minimum, clamping");
            self.wire_timeout = Self::MIN_TIMEOUT;
        }
        self
    }

    /// Full configured duration for a kind of timer.
    pub fn duration_for(&self, kind: TimerKind) -> Duration {
        match kind {
            TimerKind::Play => self.play_timeout,
            TimerKind::Wire => self.wire_timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// Expiry (returned to caller when a timer fires)
// ---------------------------------------------------------------------------

/// A fired timer, returned by [`TimeoutScheduler::wait_for_expiry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// Which suspend point timed out.
    pub kind: TimerKind,
    /// The room epoch captured when the timer was armed.
    pub token: u64,
}

impl Expiry {
    /// Returns `true` if the room has not transitioned since this timer
    /// was armed.
    pub fn is_current(&self, epoch: u64) -> bool {
        self.token == epoch
    }
}

/// The currently armed timer.
#[derive(Debug, Clone, Copy)]
pub struct ArmedTimer {
    pub kind: TimerKind,
    pub token: u64,
    pub deadline: TokioInstant,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters for a scheduler's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Timers armed (including re-arms that replaced a pending timer).
    pub armed: u64,
    /// Pending timers discarded by a re-arm or an explicit cancel.
    pub cancelled: u64,
    /// Timers that reached their deadline.
    pub fired: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// One-slot timeout scheduler. One per room actor.
pub struct TimeoutScheduler {
    config: TimerConfig,
    armed: Option<ArmedTimer>,
    stats: TimerStats,
}

impl TimeoutScheduler {
    /// Create a new scheduler with nothing armed.
    pub fn new(config: TimerConfig) -> Self {
        let config = config.validated();
        debug!(
            play_secs = config.play_timeout.as_secs(),
            wire_secs = config.wire_timeout.as_secs(),
            "timeout scheduler created"
        );
        Self {
            config,
            armed: None,
            stats: TimerStats::default(),
        }
    }

    /// Arm a timer of `kind` for its full configured duration.
    ///
    /// Replaces (and thereby cancels) any timer already armed. Returns
    /// the deadline.
    pub fn arm(&mut self, kind: TimerKind, token: u64) -> TokioInstant {
        let duration = self.config.duration_for(kind);
        self.arm_for(kind, token, duration)
    }

    /// Arm a timer with an explicit duration.
    pub fn arm_for(&mut self, kind: TimerKind, token: u64, duration: Duration) -> TokioInstant {
        if let Some(previous) = self.armed.take() {
            self.stats.cancelled += 1;
            trace!(kind = %previous.kind, token = previous.token, "pending timer replaced");
        }
        let deadline = TokioInstant::now() + duration;
        self.armed = Some(ArmedTimer {
            kind,
            token,
            deadline,
        });
        self.stats.armed += 1;
        debug!(%kind, token, secs = duration.as_secs(), "timer armed");
        deadline
    }

    /// Disarm the pending timer, if any.
    ///
    /// Idempotent. Returns the timer that was pending.
    pub fn cancel(&mut self) -> Option<ArmedTimer> {
        let previous = self.armed.take();
        if let Some(timer) = &previous {
            self.stats.cancelled += 1;
            debug!(kind = %timer.kind, token = timer.token, "timer cancelled");
        }
        previous
    }

    /// Wait until the armed timer reaches its deadline.
    ///
    /// With nothing armed this future pends forever, so `tokio::select!`
    /// keeps serving its other branches. The future is cancel-safe: if it
    /// is dropped before the deadline, the timer stays armed.
    pub async fn wait_for_expiry(&mut self) -> Expiry {
        let Some(timer) = self.armed else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(timer.deadline).await;

        self.armed = None;
        self.stats.fired += 1;
        debug!(kind = %timer.kind, token = timer.token, "timer fired");

        Expiry {
            kind: timer.kind,
            token: timer.token,
        }
    }

    /// The pending timer, if any.
    pub fn armed(&self) -> Option<&ArmedTimer> {
        self.armed.as_ref()
    }

    /// Time left before the pending timer fires.
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .map(|t| t.deadline.saturating_duration_since(TokioInstant::now()))
    }

    /// Lifetime counters.
    pub fn stats(&self) -> &TimerStats {
        &self.stats
    }

    /// The validated configuration.
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }
}
