//! Per-round fleet snapshots

use serde::{Deserialize, Serialize};

use super::fleet::FleetState;
use super::{Side, MAX_SHIPS};

/// Surviving units of one side at the end of a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub round: u32,
    pub side: Side,
    pub ships_remaining: [u32; MAX_SHIPS],
}

impl FleetSnapshot {
    pub fn capture(fleets: &FleetState, round: u32, side: Side) -> Self {
        Self {
            round,
            side,
            ships_remaining: fleets.remaining_per_type(side),
        }
    }

    /// Attacker then defender
    pub fn capture_round(fleets: &FleetState, round: u32) -> [Self; 2] {
        Side::BOTH.map(|side| Self::capture(fleets, round, side))
    }
}

/// Ordered history of snapshots for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotLog {
    entries: Vec<FleetSnapshot>,
}

impl SnapshotLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, snapshots: &[FleetSnapshot]) {
        self.entries.extend_from_slice(snapshots);
    }

    pub fn entries(&self) -> &[FleetSnapshot] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<FleetSnapshot> {
        self.entries
    }

    /// Latest snapshot recorded for `side`
    pub fn last(&self, side: Side) -> Option<&FleetSnapshot> {
        self.entries.iter().rev().find(|s| s.side == side)
    }
}
