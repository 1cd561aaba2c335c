//! Combat replay engine

pub mod catalog;
pub mod fleet;
pub mod observers;
pub mod outcome;
pub mod playback;
pub mod record;
pub mod resolver;
pub mod slots;
pub mod snapshot;

pub use catalog::{ShipCatalog, ShipType};
pub use fleet::{FleetSelection, FleetState, FleetVariant, ShipId};
pub use outcome::Outcome;
pub use playback::{PlaybackConfig, PlaybackController, PlaybackReport, ReplayObserver};
pub use record::{FightRecord, Move, MoveType};
pub use resolver::{ResolutionError, ResolverPhase, RoundResolver};
pub use slots::{GroupId, Slot, SlotAllocator};

use serde::{Deserialize, Serialize};

/// Number of ship types; every per-type array has this length
pub const MAX_SHIPS: usize = 4;

/// One of the two opposing fleets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Attacker
    Lhs,
    /// Defender
    Rhs,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Lhs, Side::Rhs];

    pub fn opponent(self) -> Self {
        match self {
            Side::Lhs => Side::Rhs,
            Side::Rhs => Side::Lhs,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Lhs => 0,
            Side::Rhs => 1,
        }
    }

    /// Combat log prefix
    pub fn label(self) -> &'static str {
        match self {
            Side::Lhs => "Attacker",
            Side::Rhs => "Defender",
        }
    }
}
