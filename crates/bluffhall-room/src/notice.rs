//! What rooms say to the outside world.
//!
//! The engine does not write text. It emits [`Notice`]s addressed with a
//! [`Recipient`], and the service turns them into chat messages (and
//! images) however it is configured to.

use std::time::Duration;

use bluffhall_protocol::{Card, ChannelId, PlayerId, Recipient, Suit, WireColor};
use serde::{Deserialize, Serialize};

use crate::{CutOutcome, DeckSpec, Elimination, Phase, Verdict, WireStage};

/// A player's id together with the name to show for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTag {
    pub id: PlayerId,
    pub name: String,
}

impl PlayerTag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(id),
            name: name.into(),
        }
    }
}

/// Why a room closed without a winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The owner or an admin ended it.
    EndedBy(PlayerTag),
    /// It sat in the lobby past its TTL.
    Idle,
}

/// Something that happened in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A room was opened.
    RoomCreated {
        owner: PlayerTag,
        max_players: usize,
    },
    /// A player took a seat.
    PlayerJoined {
        player: PlayerTag,
        owner: PlayerTag,
        seated: usize,
        max_players: usize,
        min_players: usize,
    },
    /// The owner started the game and the deck was locked.
    GameStarted {
        players: Vec<PlayerTag>,
        deck: DeckSpec,
    },
    /// Hands were dealt.
    RoundStarted {
        round: u32,
        target: Suit,
        opener: PlayerTag,
        deck: DeckSpec,
        alive: usize,
        undealt: usize,
    },
    /// A player's private hand view.
    Hand(HandView),
    /// Public side of a play.
    CardsPlayed {
        player: PlayerTag,
        count: usize,
        target: Suit,
        responder: PlayerTag,
        remaining: usize,
    },
    /// Private confirmation of a play.
    PlayAccepted { cards: Vec<Card>, remaining: usize },
    /// The engine challenged on a player's behalf.
    AutoChallenge {
        challenger: PlayerTag,
        claimant: PlayerTag,
    },
    /// A claim was revealed.
    ChallengeResolved {
        challenger: PlayerTag,
        claimant: PlayerTag,
        revealed: Vec<Card>,
        target: Suit,
        verdict: Verdict,
        penalized: PlayerTag,
    },
    /// A player must cut a wire.
    PenaltyStarted {
        player: PlayerTag,
        stage: WireStage,
        offered: Vec<WireColor>,
    },
    /// A wire was cut.
    WireCut {
        player: PlayerTag,
        outcome: CutOutcome,
        by_timeout: bool,
        /// The stage the player will face next, when they survived.
        next_stage: Option<WireStage>,
    },
    /// A player ran out of time to play and is out.
    PlayTimedOut { player: PlayerTag },
    /// Control moved to a player.
    TurnPassed {
        player: PlayerTag,
        /// Whether a claim is waiting on them.
        must_respond: bool,
    },
    /// Every alive hand is spent.
    RoundEnded { round: u32 },
    /// One player is left.
    GameOver { winner: Option<PlayerTag> },
    /// The room closed early.
    RoomClosed { reason: CloseReason },
}

/// A notice on its way out of a room actor.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub channel: ChannelId,
    pub to: Recipient,
    pub notice: Notice,
}

/// One player's hand as they see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandView {
    pub channel: ChannelId,
    pub round: u32,
    pub target: Option<Suit>,
    pub cards: Vec<Card>,
    pub alive: bool,
    pub eliminated: Option<Elimination>,
}

/// One seat in a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatView {
    pub player: PlayerTag,
    pub alive: bool,
    pub cards: usize,
    pub wire_stage: WireStage,
    pub eliminated: Option<Elimination>,
}

/// Public snapshot of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub channel: ChannelId,
    pub owner: PlayerTag,
    pub phase: Phase,
    pub round: u32,
    pub target: Option<Suit>,
    pub seats: Vec<SeatView>,
    /// Who must act next, if anyone.
    pub waiting_on: Option<PlayerTag>,
    /// Claimant and declared count of the claim on the table.
    pub claim: Option<(PlayerTag, usize)>,
    /// Stage of the pending wire cut.
    pub penalty_stage: Option<WireStage>,
    pub deck: Option<DeckSpec>,
    pub undealt: usize,
    pub max_players: usize,
    /// Time left on the armed timer.
    pub time_left: Option<Duration>,
}
