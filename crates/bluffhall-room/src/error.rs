//! Error types for the room layer.

use bluffhall_protocol::{ChannelId, PlayerId};

/// How an error should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The command was malformed or not allowed right now. Reported to
    /// the issuer.
    Validation,
    /// A seat, room or membership limit was hit. Reported to the issuer.
    Capacity,
    /// A race with another transition. Logged, never reported.
    Conflict,
}

/// Errors that can occur during room operations. None of them mutate
/// state.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The channel already hosts a room.
    #[error("channel {0} already has a room")]
    AlreadyExists(ChannelId),

    /// The player already belongs to a room in another channel.
    #[error("player {player} is already in the room in {channel}")]
    PlayerBusy { player: PlayerId, channel: ChannelId },

    /// Every seat is taken.
    #[error("room {0} is full")]
    RoomFull(ChannelId),

    /// The player is already seated in this room.
    #[error("player {0} already joined")]
    AlreadyJoined(PlayerId),

    /// The command is not accepted in the room's current phase.
    #[error("not allowed while the room is {0}")]
    WrongPhase(&'static str),

    /// Only the owner (or an admin) may do this.
    #[error("player {0} is not allowed to do that")]
    NotAuthorized(PlayerId),

    /// Too few players to start.
    #[error("need at least {needed} players, have {have}")]
    NotEnoughPlayers { needed: usize, have: usize },

    /// The channel has no room.
    #[error("no room in channel {0}")]
    NoRoom(ChannelId),

    /// The player is not seated in any room.
    #[error("player {0} is not in a room")]
    NotInRoom(PlayerId),

    /// Someone else holds the turn.
    #[error("it is {expected}'s turn")]
    NotYourTurn { expected: PlayerId },

    /// Hand positions were empty, repeated, zero or past the end.
    #[error("invalid card positions: {0}")]
    InvalidIndices(String),

    /// The wire slot is not offered at the current stage.
    #[error("wire {choice} is not offered; choose 1..={slots}")]
    InvalidChoice { choice: usize, slots: usize },

    /// Some members cannot receive private messages.
    #[error("unreachable players: {0:?}")]
    Unreachable(Vec<PlayerId>),

    /// The room actor stopped before answering.
    #[error("room {0} is unavailable")]
    Unavailable(ChannelId),
}

impl RoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoomError::AlreadyExists(_)
            | RoomError::PlayerBusy { .. }
            | RoomError::RoomFull(_)
            | RoomError::AlreadyJoined(_) => ErrorKind::Capacity,
            RoomError::Unavailable(_) => ErrorKind::Conflict,
            _ => ErrorKind::Validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_errors_classified() {
        let busy = RoomError::PlayerBusy {
            player: PlayerId::new("a"),
            channel: ChannelId::new("g"),
        };
        assert_eq!(busy.kind(), ErrorKind::Capacity);
        assert_eq!(RoomError::RoomFull(ChannelId::new("g")).kind(), ErrorKind::Capacity);
    }

    #[test]
    fn test_turn_errors_are_validation() {
        let err = RoomError::NotYourTurn {
            expected: PlayerId::new("bob"),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "it is bob's turn");
    }
}
