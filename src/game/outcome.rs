//! Fight outcome from the authoritative flags, plus a consistency check
//! against the locally reconstructed pools

use serde::{Deserialize, Serialize};

use super::fleet::FleetState;
use super::record::FightRecord;
use super::{Side, MAX_SHIPS};

/// Terminal result of a fight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "side", rename_all = "snake_case")]
pub enum Outcome {
    Win(Side),
    Draw,
}

impl Outcome {
    /// `lhs_dead` wins over `rhs_dead` when both are set
    pub fn from_flags(lhs_dead: bool, rhs_dead: bool) -> Self {
        if lhs_dead {
            Outcome::Win(Side::Rhs)
        } else if rhs_dead {
            Outcome::Win(Side::Lhs)
        } else {
            Outcome::Draw
        }
    }

    pub fn from_record(record: &FightRecord) -> Self {
        Self::from_flags(record.lhs_dead, record.rhs_dead)
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::Win(side) => Some(side),
            Outcome::Draw => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Win(Side::Lhs) => "Attacker Wins",
            Outcome::Win(Side::Rhs) => "Defender Wins",
            Outcome::Draw => "Draw",
        }
    }
}

/// A disagreement between reconstructed pools and the record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    DeadFlag {
        side: Side,
        flagged: bool,
        ships_remaining: u32,
    },
    ShipsLost {
        side: Side,
        ship_type: usize,
        recorded: u32,
        reconstructed: u32,
    },
}

/// Authoritative outcome together with the result of the consistency check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeReport {
    pub outcome: Outcome,
    pub mismatches: Vec<Mismatch>,
}

impl OutcomeReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compare a fully played session against the record.
///
/// The outcome is always taken from the flags; mismatches are only reported.
pub fn evaluate(record: &FightRecord, fleets: &FleetState) -> OutcomeReport {
    let mut mismatches = Vec::new();

    for side in Side::BOTH {
        let ships_remaining = fleets.total_remaining(side);
        let flagged = record.is_dead(side);

        // The attacker is never flagged dead against an empty defending fleet
        let expected = match side {
            Side::Lhs => ships_remaining == 0 && record.selection_rhs.iter().any(|&c| c > 0),
            Side::Rhs => ships_remaining == 0,
        };

        if flagged != expected {
            mismatches.push(Mismatch::DeadFlag {
                side,
                flagged,
                ships_remaining,
            });
        }

        if let Some(lost) = record.ships_lost(side) {
            for ship_type in 0..MAX_SHIPS {
                let reconstructed = fleets.ships_lost(side, ship_type);
                if lost[ship_type] != reconstructed {
                    mismatches.push(Mismatch::ShipsLost {
                        side,
                        ship_type,
                        recorded: lost[ship_type],
                        reconstructed,
                    });
                }
            }
        }
    }

    OutcomeReport {
        outcome: Outcome::from_record(record),
        mismatches,
    }
}
