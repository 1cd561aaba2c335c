//! Typed fight record produced by the authoritative simulator

use serde::{Deserialize, Serialize};

use super::fleet::{FleetSelection, FleetVariant};
use super::Side;

/// What a ship group did in one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    /// No action
    Idle,
    /// Fire on a target group after moving to `target_position`
    Attack,
    /// Move to `target_position` without firing
    Reposition,
}

impl MoveType {
    /// Decode the simulator's numeric move tag
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::Attack),
            2 => Some(Self::Reposition),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Attack => 1,
            Self::Reposition => 2,
        }
    }
}

/// One logged action of one ship group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub round: u32,
    pub move_type: MoveType,
    /// Acting ship type index
    pub source: usize,
    /// Targeted enemy ship type index
    pub target: usize,
    /// Lane the acting group ends up in
    pub target_position: i32,
    /// Precomputed damage, never recomputed during replay
    pub damage: u64,
}

impl Move {
    pub fn attack(round: u32, source: usize, target: usize, target_position: i32, damage: u64) -> Self {
        Self {
            round,
            move_type: MoveType::Attack,
            source,
            target,
            target_position,
            damage,
        }
    }

    pub fn reposition(round: u32, source: usize, target_position: i32) -> Self {
        Self {
            round,
            move_type: MoveType::Reposition,
            source,
            target: 0,
            target_position,
            damage: 0,
        }
    }
}

/// Immutable, authoritative result of one fight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightRecord {
    pub seed: u64,
    pub selection_lhs: FleetSelection,
    pub selection_rhs: FleetSelection,
    pub variants_lhs: FleetVariant,
    pub variants_rhs: FleetVariant,
    pub commander_lhs: u32,
    pub commander_rhs: u32,
    /// Number of rounds the simulator played
    pub rounds: u32,
    pub lhs_moves: Vec<Move>,
    pub rhs_moves: Vec<Move>,
    pub lhs_dead: bool,
    pub rhs_dead: bool,
    /// Per-type losses as reported by the simulator, when it sends them
    #[serde(default)]
    pub ships_lost_lhs: Option<FleetSelection>,
    #[serde(default)]
    pub ships_lost_rhs: Option<FleetSelection>,
}

impl FightRecord {
    pub fn selection(&self, side: Side) -> &FleetSelection {
        match side {
            Side::Lhs => &self.selection_lhs,
            Side::Rhs => &self.selection_rhs,
        }
    }

    pub fn moves(&self, side: Side) -> &[Move] {
        match side {
            Side::Lhs => &self.lhs_moves,
            Side::Rhs => &self.rhs_moves,
        }
    }

    pub fn ships_lost(&self, side: Side) -> Option<&FleetSelection> {
        match side {
            Side::Lhs => self.ships_lost_lhs.as_ref(),
            Side::Rhs => self.ships_lost_rhs.as_ref(),
        }
    }

    pub fn is_dead(&self, side: Side) -> bool {
        match side {
            Side::Lhs => self.lhs_dead,
            Side::Rhs => self.rhs_dead,
        }
    }
}
