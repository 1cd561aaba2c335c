//! Reference combat simulator
//!
//! Produces authoritative fight records for training fights, ranked attacks
//! and tests. The replay engine never calls into this module; it only consumes
//! the records it returns.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::{FightRecord, FleetSelection, FleetVariant, Move, ShipCatalog, MAX_SHIPS};

/// Hard limit on fight length
pub const MAX_ROUNDS: u32 = 50;

/// Stat shift applied by fitting variants 1 and 2
pub const FIT_TO_STAT: u32 = 20;

/// Starting lane of the attacker's first ship type
const LHS_FIRST_LANE: i32 = 10;
/// Starting lane of the defender's first ship type
const RHS_FIRST_LANE: i32 = -10;

/// Inputs of one fight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightRequest {
    pub seed: u64,
    pub selection_lhs: FleetSelection,
    pub selection_rhs: FleetSelection,
    pub variants_lhs: FleetVariant,
    pub variants_rhs: FleetVariant,
    pub commander_lhs: u32,
    pub commander_rhs: u32,
}

impl FightRequest {
    /// Default variants and commanders on both sides
    pub fn new(seed: u64, selection_lhs: FleetSelection, selection_rhs: FleetSelection) -> Self {
        Self {
            seed,
            selection_lhs,
            selection_rhs,
            variants_lhs: [0; MAX_SHIPS],
            variants_rhs: [0; MAX_SHIPS],
            commander_lhs: 0,
            commander_rhs: 0,
        }
    }
}

/// Source of authoritative fight records
pub trait CombatSimulator: Send + Sync {
    /// Run a fight. Move logs are left empty unless `log_moves` is set.
    fn fight(&self, request: &FightRequest, log_moves: bool) -> FightRecord;
}

/// One side of a fight in progress
struct Fleet {
    positions: [i32; MAX_SHIPS],
    pools: [i64; MAX_SHIPS],
    variables: [u32; MAX_SHIPS],
    variants: FleetVariant,
    /// Lane direction this fleet advances in
    heading: i32,
    moves: Vec<Move>,
}

impl Fleet {
    fn is_dead(&self) -> bool {
        self.pools.iter().all(|&hp| hp <= 0)
    }
}

/// What one group decided to do this turn
struct Action {
    /// Target type and damage
    strike: Option<(usize, u64)>,
    /// Lanes travelled towards the enemy
    advance: i32,
}

/// Port of the on-chain fight resolution
#[derive(Debug, Clone)]
pub struct ReferenceSimulator {
    catalog: Arc<ShipCatalog>,
}

impl ReferenceSimulator {
    pub fn new(catalog: Arc<ShipCatalog>) -> Self {
        Self { catalog }
    }

    fn deploy(&self, selection: &FleetSelection, variants: &FleetVariant, variable_seed: u64, lhs: bool) -> Fleet {
        let ships = self.catalog.ships();
        let (first_lane, heading) = if lhs {
            (LHS_FIRST_LANE, -1)
        } else {
            (RHS_FIRST_LANE, 1)
        };

        Fleet {
            positions: std::array::from_fn(|i| first_lane - heading * i as i32),
            pools: std::array::from_fn(|i| i64::from(ships[i].hp) * i64::from(selection[i])),
            variables: std::array::from_fn(|i| {
                (variable_seed % u64::from(ships[i].attack_variable)) as u32
            }),
            variants: *variants,
            heading,
            moves: Vec::new(),
        }
    }

    /// Pick a target for `ship` and compute its movement.
    ///
    /// Enemy types are scanned from the highest index down. The whole scan is
    /// gated on the enemy group sharing `ship`'s index still having hit points.
    fn decide(&self, ship: usize, own: &Fleet, enemy: &Fleet) -> Action {
        let stats = &self.catalog.ships()[ship];
        let range = stats.range as i32;
        let speed = stats.speed as i32;
        let position = own.positions[ship];

        let target = if enemy.pools[ship] > 0 {
            (0..MAX_SHIPS)
                .rev()
                .find(|&e| (position - enemy.positions[e]).abs() <= range + speed)
        } else {
            None
        };

        match target {
            Some(target) => {
                let distance = (position - enemy.positions[target]).abs();
                Action {
                    strike: Some((target, self.damage(ship, target, own, enemy))),
                    advance: (distance - range).max(0),
                }
            }
            None => Action {
                strike: None,
                advance: speed,
            },
        }
    }

    fn damage(&self, source: usize, target: usize, own: &Fleet, enemy: &Fleet) -> u64 {
        let ships = self.catalog.ships();
        let attacker = &ships[source];
        let defender = &ships[target];

        let attack = attack_stat(attacker.attack_base, own.variants[source]) + own.variables[source];
        let defence = defence_stat(defender.defence, enemy.variants[target]);

        let pool = u64::try_from(own.pools[source]).unwrap_or(0);
        let count = pool / u64::from(attacker.hp) + 1;
        let cap = count * u64::from(defender.hp);

        let mut damage = u64::from(attack.saturating_sub(defence)) * count;
        if source == target + 1 || (source == 0 && target == MAX_SHIPS - 1) {
            damage *= damage / 2;
        }

        damage.min(cap)
    }
}

fn attack_stat(stat: u32, variant: u32) -> u32 {
    match variant {
        0 => stat,
        1 => stat.saturating_sub(FIT_TO_STAT),
        2 => stat + FIT_TO_STAT,
        _ => 0,
    }
}

fn defence_stat(stat: u32, variant: u32) -> u32 {
    match variant {
        0 => stat,
        1 => stat + FIT_TO_STAT,
        2 => stat.saturating_sub(FIT_TO_STAT),
        _ => 0,
    }
}

fn log_action(fleet: &mut Fleet, round: u32, ship: usize, action: &Action, lane: i32) {
    let mv = match action.strike {
        Some((target, damage)) => Move::attack(round, ship, target, lane, damage),
        None => Move::reposition(round, ship, lane),
    };
    fleet.moves.push(mv);
}

impl CombatSimulator for ReferenceSimulator {
    fn fight(&self, request: &FightRequest, log_moves: bool) -> FightRecord {
        let seed = request.seed;
        let mut lhs = self.deploy(&request.selection_lhs, &request.variants_lhs, seed, true);
        let mut rhs = self.deploy(&request.selection_rhs, &request.variants_rhs, seed / 2, false);
        let mut rounds = 0;

        for round in 0..MAX_ROUNDS {
            if lhs.is_dead() || rhs.is_dead() {
                break;
            }
            rounds += 1;

            for ship in 0..MAX_SHIPS {
                let lhs_alive = lhs.pools[ship] > 0;
                let rhs_alive = rhs.pools[ship] > 0;

                // The attacker decides first but its damage lands after the defender's
                let lhs_action = lhs_alive.then(|| self.decide(ship, &lhs, &rhs));
                if let Some(action) = lhs_action.as_ref().filter(|_| log_moves) {
                    let lane = lhs.positions[ship] + lhs.heading * action.advance;
                    log_action(&mut lhs, round, ship, action, lane);
                }

                if rhs_alive {
                    let action = self.decide(ship, &rhs, &lhs);
                    if let Some((target, damage)) = action.strike {
                        lhs.pools[target] -= damage as i64;
                    }
                    rhs.positions[ship] += rhs.heading * action.advance;
                    if log_moves {
                        let lane = rhs.positions[ship];
                        log_action(&mut rhs, round, ship, &action, lane);
                    }
                }

                if let Some(action) = lhs_action {
                    if let Some((target, damage)) = action.strike {
                        rhs.pools[target] -= damage as i64;
                    }
                    lhs.positions[ship] += lhs.heading * action.advance;
                }
            }
        }

        let ships = self.catalog.ships();
        let ships_lost = |selection: &FleetSelection, pools: &[i64; MAX_SHIPS]| -> FleetSelection {
            std::array::from_fn(|i| {
                let hp = i64::from(ships[i].hp);
                ((i64::from(selection[i]) * hp - pools[i].max(0)) / hp) as u32
            })
        };

        let record = FightRecord {
            seed,
            selection_lhs: request.selection_lhs,
            selection_rhs: request.selection_rhs,
            variants_lhs: request.variants_lhs,
            variants_rhs: request.variants_rhs,
            commander_lhs: request.commander_lhs,
            commander_rhs: request.commander_rhs,
            rounds,
            lhs_dead: request.selection_rhs.iter().any(|&n| n > 0) && lhs.is_dead(),
            rhs_dead: rhs.is_dead(),
            ships_lost_lhs: Some(ships_lost(&request.selection_lhs, &lhs.pools)),
            ships_lost_rhs: Some(ships_lost(&request.selection_rhs, &rhs.pools)),
            lhs_moves: lhs.moves,
            rhs_moves: rhs.moves,
        };

        debug!(
            seed,
            rounds,
            lhs_dead = record.lhs_dead,
            rhs_dead = record.rhs_dead,
            "Fight simulated"
        );

        record
    }
}
