//! Room configuration and the phase state machine.

use bluffhall_protocol::PlayerId;
use bluffhall_timer::TimerConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room in a registry.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Players required before the owner may start.
    pub min_players: usize,

    /// Seats in a room.
    pub max_players: usize,

    /// Cards dealt to every alive player at each round start. The deck
    /// holds exactly this many cards per starting player.
    pub hand_size: usize,

    /// Play and wire timeouts.
    pub timers: TimerConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 5,
            hand_size: 5,
            timers: TimerConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a room is in its game.
///
/// ```text
/// WaitingForPlayers → RoundStart → AwaitingPlay ⇄ AwaitingChallengeOrNextPlay
///                         ↑              ↓                    ↓
///                      RoundEnd ← PenaltyPending ←────────────┘
///                                        ↓
///                                     GameEnd
/// ```
///
/// `RoundStart` and `RoundEnd` are transient: the engine passes through
/// them inside a single transition and never rests there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Lobby. Players join; the owner starts.
    WaitingForPlayers,
    /// Gathering and dealing the deck.
    RoundStart,
    /// `active` owes a play and there is no claim on the table.
    AwaitingPlay { active: PlayerId },
    /// A claim is on the table; `responder` must challenge it or play over it.
    AwaitingChallengeOrNextPlay { responder: PlayerId },
    /// `player` owes a wire choice.
    PenaltyPending { player: PlayerId },
    /// Every alive hand is spent.
    RoundEnd,
    /// Terminal. `winner` is `None` when the room was closed early.
    GameEnd { winner: Option<PlayerId> },
}

/// Everything that can be asked of a room, for the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Join,
    Start,
    Play,
    Challenge,
    CutWire,
    End,
    Status,
    Hand,
    PlayTimeout,
    WireTimeout,
    Reap,
}

impl Phase {
    /// The transition table: whether `action` may be attempted in this
    /// phase. Actor-specific checks (whose turn it is) come afterwards.
    pub fn accepts(&self, action: Action) -> bool {
        use Action::*;
        match (self, action) {
            (_, Status | Hand) => true,
            (Phase::GameEnd { .. }, _) => false,
            (_, End) => true,
            (Phase::WaitingForPlayers, Join | Start | Reap) => true,
            (Phase::AwaitingPlay { .. }, Play | PlayTimeout) => true,
            (Phase::AwaitingChallengeOrNextPlay { .. }, Play | Challenge | PlayTimeout) => true,
            (Phase::PenaltyPending { .. }, CutWire | WireTimeout) => true,
            _ => false,
        }
    }

    /// The player this phase is waiting on, if any.
    pub fn waiting_on(&self) -> Option<&PlayerId> {
        match self {
            Phase::AwaitingPlay { active } => Some(active),
            Phase::AwaitingChallengeOrNextPlay { responder } => Some(responder),
            Phase::PenaltyPending { player } => Some(player),
            _ => None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, Phase::WaitingForPlayers)
    }

    pub fn is_over(&self) -> bool {
        matches!(self, Phase::GameEnd { .. })
    }

    /// Short name for logs and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::WaitingForPlayers => "waiting for players",
            Phase::RoundStart => "round start",
            Phase::AwaitingPlay { .. } => "awaiting play",
            Phase::AwaitingChallengeOrNextPlay { .. } => "awaiting challenge or play",
            Phase::PenaltyPending { .. } => "wire cut pending",
            Phase::RoundEnd => "round end",
            Phase::GameEnd { .. } => "game over",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
