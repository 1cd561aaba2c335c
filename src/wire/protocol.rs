//! Wire types for fight records and the replay event stream
//! Raw records arrive with loosely typed numbers and must go through
//! [`crate::wire::decode`] before use

use serde::{Deserialize, Serialize};

use crate::game::{Move, Outcome, ShipId, Side, Slot};

/// A number as sent by the simulator: a JSON integer or a formatted string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireInt {
    Unsigned(u64),
    Signed(i64),
    /// e.g. `"1,234"`
    Text(String),
}

/// A per-ship-type byte array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireBytes {
    /// Hex string, with or without a `0x` prefix
    Hex(String),
    /// One number per ship type
    List(Vec<WireInt>),
}

/// A move before normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMove {
    pub move_type: WireInt,
    pub round: WireInt,
    pub source: WireInt,
    pub target: WireInt,
    pub target_position: WireInt,
    pub damage: WireInt,
}

/// A fight record before normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFightRecord {
    pub seed: WireInt,
    pub selection_lhs: WireBytes,
    pub selection_rhs: WireBytes,
    pub variants_lhs: WireBytes,
    pub variants_rhs: WireBytes,
    pub commander_lhs: WireInt,
    pub commander_rhs: WireInt,
    pub rounds: WireInt,
    pub lhs_moves: Vec<RawMove>,
    pub rhs_moves: Vec<RawMove>,
    pub lhs_dead: bool,
    pub rhs_dead: bool,
    #[serde(default)]
    pub ships_lost_lhs: Option<WireBytes>,
    #[serde(default)]
    pub ships_lost_rhs: Option<WireBytes>,
}

/// Replay callbacks in serialisable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// A new round begins
    RoundStart {
        round: u32,
    },

    /// A group with units left acted
    MoveResolved {
        side: Side,
        mv: Move,
        slot: Slot,
    },

    /// A pool took damage
    DamageApplied {
        /// Side that took the damage
        side: Side,
        ship_type: usize,
        remaining_pool: u64,
    },

    /// A single ship instance was lost
    ShipDestroyed {
        ship: ShipId,
    },

    /// Authoritative result
    Outcome {
        outcome: Outcome,
    },
}
