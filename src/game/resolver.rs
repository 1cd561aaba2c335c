//! Round resolver - steps through a fight record one round at a time
//!
//! Each call to [`RoundResolver::resolve_next`] applies every move of one round
//! to the session's [`PlaybackState`]: attacker moves first in ascending ship
//! type order, then defender moves in the same order. Damage magnitudes come
//! straight from the record. The resolver never decides who won; see
//! [`Outcome::from_record`].

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::catalog::ShipCatalog;
use super::fleet::{FleetState, ShipId};
use super::outcome::Outcome;
use super::record::{FightRecord, Move, MoveType};
use super::slots::{GroupId, Slot, SlotAllocator};
use super::snapshot::FleetSnapshot;
use super::{Side, MAX_SHIPS};

/// Mutable state of one replay session
#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub fleets: FleetState,
    pub slots: SlotAllocator,
    pub current_round: u32,
}

impl PlaybackState {
    pub fn new(catalog: &ShipCatalog, record: &FightRecord) -> Self {
        Self {
            fleets: FleetState::initialize(catalog, &record.selection_lhs, &record.selection_rhs),
            slots: SlotAllocator::with_starting_lanes(&record.selection_lhs, &record.selection_rhs),
            current_round: 0,
        }
    }
}

/// Resolver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverPhase {
    NotStarted,
    /// Round `r` is the next one to resolve
    RoundInProgress(u32),
    /// Stopped at a round boundary before round `round`
    Interrupted { round: u32 },
    Finished(Outcome),
    /// A malformed move stopped the session; its state is no longer meaningful
    Aborted,
}

/// At most one move per ship type, indexed by the acting type
pub type SideMoves = [Option<Move>; MAX_SHIPS];

/// The non-idle moves of one round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundMoves {
    pub lhs: SideMoves,
    pub rhs: SideMoves,
}

impl RoundMoves {
    pub fn side(&self, side: Side) -> &SideMoves {
        match side {
            Side::Lhs => &self.lhs,
            Side::Rhs => &self.rhs,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideMoves {
        match side {
            Side::Lhs => &mut self.lhs,
            Side::Rhs => &mut self.rhs,
        }
    }

    /// Index a round's moves by source type, validating ship type indices
    pub fn build(round: u32, lhs: &[Move], rhs: &[Move]) -> Result<Self, ResolutionError> {
        let mut table = Self::default();

        for (side, moves) in [(Side::Lhs, lhs), (Side::Rhs, rhs)] {
            for mv in moves.iter().filter(|m| m.move_type != MoveType::Idle) {
                for index in [mv.source, mv.target] {
                    if index >= MAX_SHIPS {
                        return Err(ResolutionError::ShipTypeOutOfRange { side, round, index });
                    }
                }

                let entry = &mut table.side_mut(side)[mv.source];
                if entry.is_some() {
                    return Err(ResolutionError::DuplicateMove {
                        side,
                        round,
                        ship_type: mv.source,
                    });
                }
                *entry = Some(*mv);
            }
        }

        Ok(table)
    }
}

/// Effect of an attack on its target group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DamageReport {
    pub target: GroupId,
    pub amount: u64,
    pub remaining_pool: u64,
    pub ships_remaining: u32,
    /// Instances lost to this hit, lowest ordinal first
    pub destroyed: Vec<ShipId>,
}

/// One resolved move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub side: Side,
    pub mv: Move,
    /// Where the acting group stands afterwards; `None` when it has no units left
    pub slot: Option<Slot>,
    /// Whether the acting group changed lanes
    pub travelled: bool,
    pub damage: Option<DamageReport>,
}

impl StepReport {
    pub fn group(&self) -> GroupId {
        GroupId::new(self.side, self.mv.source)
    }

    pub fn is_presented(&self) -> bool {
        self.slot.is_some()
    }
}

/// Everything that happened in one round, in application order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round: u32,
    pub steps: Vec<StepReport>,
    pub snapshots: [FleetSnapshot; 2],
}

/// Round resolver state machine
pub struct RoundResolver<'a> {
    record: &'a FightRecord,
    moves_by_round: BTreeMap<u32, [Vec<Move>; 2]>,
    state: PlaybackState,
    phase: ResolverPhase,
    short_circuit: bool,
    rounds_resolved: u32,
}

impl<'a> RoundResolver<'a> {
    /// With `short_circuit`, resolution stops at the first round boundary where
    /// either side has no units left.
    pub fn new(catalog: &ShipCatalog, record: &'a FightRecord, short_circuit: bool) -> Self {
        let mut moves_by_round: BTreeMap<u32, [Vec<Move>; 2]> = BTreeMap::new();

        for side in Side::BOTH {
            for mv in record.moves(side) {
                if mv.round >= record.rounds {
                    warn!(
                        side = ?side,
                        round = mv.round,
                        rounds = record.rounds,
                        "Dropping move outside the recorded rounds"
                    );
                    continue;
                }
                moves_by_round.entry(mv.round).or_default()[side.index()].push(*mv);
            }
        }

        Self {
            record,
            moves_by_round,
            state: PlaybackState::new(catalog, record),
            phase: ResolverPhase::NotStarted,
            short_circuit,
            rounds_resolved: 0,
        }
    }

    pub fn phase(&self) -> ResolverPhase {
        self.phase
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn rounds_resolved(&self) -> u32 {
        self.rounds_resolved
    }

    /// True once every recorded round has been applied
    pub fn fully_played(&self) -> bool {
        self.rounds_resolved == self.record.rounds
    }

    /// The authoritative outcome, available at any point
    pub fn outcome(&self) -> Outcome {
        Outcome::from_record(self.record)
    }

    /// Stop at the current round boundary. Only a running resolver can be
    /// interrupted; returns false before the first round and once terminal.
    pub fn interrupt(&mut self) -> bool {
        match self.phase {
            ResolverPhase::RoundInProgress(round) => {
                self.phase = ResolverPhase::Interrupted { round };
                true
            }
            _ => false,
        }
    }

    /// Resolve the next round. `Ok(None)` once the resolver is terminal.
    pub fn resolve_next(&mut self) -> Result<Option<RoundReport>, ResolutionError> {
        let round = match self.phase {
            ResolverPhase::NotStarted => 0,
            ResolverPhase::RoundInProgress(round) => round,
            _ => return Ok(None),
        };

        if round >= self.record.rounds {
            self.phase = ResolverPhase::Finished(self.outcome());
            return Ok(None);
        }

        if self.short_circuit && Side::BOTH.iter().any(|&s| self.state.fleets.is_wiped_out(s)) {
            debug!(round, "A fleet has no units left, skipping remaining rounds");
            self.phase = ResolverPhase::Finished(self.outcome());
            return Ok(None);
        }

        self.phase = ResolverPhase::RoundInProgress(round);
        self.state.current_round = round;

        let table = match self.moves_by_round.get(&round) {
            Some([lhs, rhs]) => RoundMoves::build(round, lhs, rhs),
            None => Ok(RoundMoves::default()),
        };
        let table = match table {
            Ok(table) => table,
            Err(e) => {
                self.phase = ResolverPhase::Aborted;
                return Err(e);
            }
        };

        let mut steps = Vec::new();
        for side in Side::BOTH {
            for mv in table.side(side).iter().flatten() {
                steps.push(self.apply_move(side, mv));
            }
        }

        self.rounds_resolved += 1;
        let snapshots = FleetSnapshot::capture_round(&self.state.fleets, round);

        self.phase = if round + 1 >= self.record.rounds {
            ResolverPhase::Finished(self.outcome())
        } else {
            ResolverPhase::RoundInProgress(round + 1)
        };

        Ok(Some(RoundReport {
            round,
            steps,
            snapshots,
        }))
    }

    fn apply_move(&mut self, side: Side, mv: &Move) -> StepReport {
        let group = GroupId::new(side, mv.source);

        // A group with no units left still deals its recorded damage but is not shown
        let (slot, travelled) = if self.state.fleets.ships_remaining(side, mv.source) > 0 {
            let before = self.state.slots.slot_of(group);
            let slot = self.state.slots.assign(group, mv.target_position);
            (Some(slot), before.map(|b| b.lane) != Some(slot.lane))
        } else {
            (None, false)
        };

        let damage = if mv.move_type == MoveType::Attack {
            Some(self.apply_damage(side.opponent(), mv.target, mv.damage))
        } else {
            None
        };

        debug!(
            side = ?side,
            round = mv.round,
            source = mv.source,
            move_type = ?mv.move_type,
            lane = mv.target_position,
            "Move resolved"
        );

        StepReport {
            side,
            mv: *mv,
            slot,
            travelled,
            damage,
        }
    }

    fn apply_damage(&mut self, side: Side, ship_type: usize, amount: u64) -> DamageReport {
        let fleets = &mut self.state.fleets;
        let initial = fleets.initial_count(side, ship_type);
        let before = fleets.ships_remaining(side, ship_type);

        fleets.apply_damage(side, ship_type, amount);
        let after = fleets.ships_remaining(side, ship_type);

        let destroyed = ((initial - before)..(initial - after))
            .map(|ordinal| ShipId {
                side,
                ship_type,
                ordinal,
            })
            .collect();

        let target = GroupId::new(side, ship_type);
        if before > 0 && after == 0 {
            self.state.slots.release(target);
        }

        DamageReport {
            target,
            amount,
            remaining_pool: self.state.fleets.pool(side, ship_type),
            ships_remaining: after,
            destroyed,
        }
    }
}

/// Errors that abort a replay in progress
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Round {round}: {side:?} move references ship type {index}, expected < {max}", max = MAX_SHIPS)]
    ShipTypeOutOfRange { side: Side, round: u32, index: usize },

    #[error("Round {round}: {side:?} ship type {ship_type} has more than one move")]
    DuplicateMove { side: Side, round: u32, ship_type: usize },
}
