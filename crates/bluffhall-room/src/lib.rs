//! Game engine and room lifecycle for Bluffhall.
//!
//! A room is a [`Room`] value (the whole game, serializable as-is) owned
//! by an isolated Tokio task. The task applies commands and timer
//! expiries one at a time, persists the room after every accepted
//! transition and pushes [`Dispatch`]es to whoever delivers messages.
//!
//! # Key types
//!
//! - [`Room`]: game state plus the turn engine transitions
//! - [`Phase`]: the state machine and its transition table
//! - [`DeckAllocator`], [`judge`], [`PenaltyEngine`]: deck, challenge and
//!   wire-cut rules
//! - [`RoomRegistry`]: creates rooms, enforces one room per player,
//!   restores and reaps
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`Notice`]: what a room reports; the service renders it

mod challenge;
mod config;
mod deck;
mod engine;
mod error;
mod manager;
mod notice;
mod penalty;
mod room;

pub use challenge::{judge, Verdict};
pub use config::{Action, Phase, RoomConfig};
pub use deck::{suit_counts, DeckAllocator, DeckSpec};
pub use engine::{Claim, Elimination, Notices, Player, Room};
pub use error::{ErrorKind, RoomError};
pub use manager::RoomRegistry;
pub use notice::{CloseReason, Dispatch, HandView, Notice, PlayerTag, SeatView, StatusView};
pub use penalty::{CutOutcome, PenaltyEngine, PenaltyState, WireStage};
pub use room::{RoomClosed, RoomHandle};
