//! The wire-cut penalty.
//!
//! A penalized player faces a bomb with some wires attached and must cut
//! one. Exactly one wire is live. Surviving strips a wire for next time:
//! three wires, then two, then one, and a single wire always detonates.

use bluffhall_protocol::{PlayerId, WireColor};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::RoomError;

/// A player's persistent stage pointer, 1 through 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireStage(u8);

impl WireStage {
    pub const FIRST: WireStage = WireStage(1);
    pub const LAST: WireStage = WireStage(3);

    /// Builds a stage, clamping into `1..=3`.
    pub fn new(stage: u8) -> Self {
        WireStage(stage.clamp(Self::FIRST.0, Self::LAST.0))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Number of wires offered: 3, 2, then 1.
    pub fn slots(self) -> usize {
        usize::from(4 - self.0)
    }

    /// The wires offered at this stage, in slot order.
    pub fn offered(self) -> &'static [WireColor] {
        WireColor::offered(self.slots())
    }

    /// The stage after surviving this one. Saturates at 3.
    pub fn advanced(self) -> Self {
        WireStage::new(self.0 + 1)
    }
}

impl Default for WireStage {
    fn default() -> Self {
        Self::FIRST
    }
}

impl std::fmt::Display for WireStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The outstanding penalty in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyState {
    pub player: PlayerId,
    pub stage: WireStage,
}

/// Result of one cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutOutcome {
    /// The wire the player cut.
    pub cut: WireColor,
    /// The wire that was live.
    pub live: WireColor,
    /// Stage the cut was made at.
    pub stage: WireStage,
}

impl CutOutcome {
    pub fn exploded(&self) -> bool {
        self.cut == self.live
    }
}

/// Runs the wire-cut draws.
pub struct PenaltyEngine;

impl PenaltyEngine {
    /// Checks `choice` against the wires offered at `stage`.
    pub fn validate(stage: WireStage, choice: usize) -> Result<WireColor, RoomError> {
        let slots = stage.slots();
        if (1..=slots).contains(&choice) {
            Ok(stage.offered()[choice - 1])
        } else {
            Err(RoomError::InvalidChoice { choice, slots })
        }
    }

    /// Draws the live wire uniformly and compares it with `choice`.
    pub fn cut<R: Rng + ?Sized>(
        stage: WireStage,
        choice: usize,
        rng: &mut R,
    ) -> Result<CutOutcome, RoomError> {
        let cut = Self::validate(stage, choice)?;
        let live = stage.offered()[rng.random_range(0..stage.slots())];
        Ok(CutOutcome { cut, live, stage })
    }

    /// A uniformly random wire at `stage`, for timeouts.
    pub fn random_choice<R: Rng + ?Sized>(stage: WireStage, rng: &mut R) -> usize {
        rng.random_range(1..=stage.slots())
    }
}
