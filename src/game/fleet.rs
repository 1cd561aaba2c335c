//! Fleet composition, hit-point pools and combat power

use serde::{Deserialize, Serialize};

use super::catalog::ShipCatalog;
use super::{Side, MAX_SHIPS};

/// Unit count per ship type
pub type FleetSelection = [u32; MAX_SHIPS];

/// Stat-modifier tag per ship type
pub type FleetVariant = [u32; MAX_SHIPS];

/// Arena handle for a single ship instance
///
/// Renderers key their visuals on this triple. Ordinals run from 0 to the
/// selected count minus one; losses always take the lowest surviving ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipId {
    pub side: Side,
    pub ship_type: usize,
    pub ordinal: u32,
}

/// Per-side, per-type hit-point pools for one replay session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetState {
    pools: [[u64; MAX_SHIPS]; 2],
    initial: [FleetSelection; 2],
    hp: [u64; MAX_SHIPS],
}

impl FleetState {
    /// `pool[i] = hp[i] * selection[i]` for both sides
    pub fn initialize(catalog: &ShipCatalog, lhs: &FleetSelection, rhs: &FleetSelection) -> Self {
        let hp: [u64; MAX_SHIPS] = std::array::from_fn(|i| u64::from(catalog.ships()[i].hp));
        let pools = [
            std::array::from_fn(|i| hp[i] * u64::from(lhs[i])),
            std::array::from_fn(|i| hp[i] * u64::from(rhs[i])),
        ];

        Self {
            pools,
            initial: [*lhs, *rhs],
            hp,
        }
    }

    /// Subtract damage from a pool, flooring at zero. Unknown types are ignored.
    pub fn apply_damage(&mut self, side: Side, ship_type: usize, amount: u64) {
        if let Some(pool) = self.pools[side.index()].get_mut(ship_type) {
            *pool = pool.saturating_sub(amount);
        }
    }

    pub fn pool(&self, side: Side, ship_type: usize) -> u64 {
        self.pools[side.index()].get(ship_type).copied().unwrap_or(0)
    }

    pub fn initial_count(&self, side: Side, ship_type: usize) -> u32 {
        self.initial[side.index()].get(ship_type).copied().unwrap_or(0)
    }

    /// `ceil(pool / hp)`, never above the selected count
    pub fn ships_remaining(&self, side: Side, ship_type: usize) -> u32 {
        let Some(&hp) = self.hp.get(ship_type) else {
            return 0;
        };
        let pool = self.pool(side, ship_type);
        let remaining = pool.div_ceil(hp);
        remaining.min(u64::from(self.initial_count(side, ship_type))) as u32
    }

    pub fn total_remaining(&self, side: Side) -> u32 {
        (0..MAX_SHIPS).map(|t| self.ships_remaining(side, t)).sum()
    }

    pub fn ships_lost(&self, side: Side, ship_type: usize) -> u32 {
        self.initial_count(side, ship_type) - self.ships_remaining(side, ship_type)
    }

    pub fn remaining_per_type(&self, side: Side) -> [u32; MAX_SHIPS] {
        std::array::from_fn(|t| self.ships_remaining(side, t))
    }

    pub fn is_wiped_out(&self, side: Side) -> bool {
        self.total_remaining(side) == 0
    }
}

/// Total combat power of a selection: `sum(selection[i] * cp[i])`
pub fn fleet_cp(catalog: &ShipCatalog, selection: &FleetSelection) -> u64 {
    selection
        .iter()
        .zip(catalog.ships())
        .map(|(&count, ship)| u64::from(count) * u64::from(ship.cp))
        .sum()
}

/// Reject a selection whose combat power exceeds `cap`, returning its cp otherwise
pub fn check_cp_cap(
    catalog: &ShipCatalog,
    selection: &FleetSelection,
    cap: u64,
) -> Result<u64, CompositionError> {
    let cp = fleet_cp(catalog, selection);
    if cp > cap {
        return Err(CompositionError::OverCap { cp, cap });
    }
    Ok(cp)
}

/// Fleet composition errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    #[error("Fleet combat power {cp} exceeds the cap of {cap}")]
    OverCap { cp: u64, cap: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(lhs: FleetSelection, rhs: FleetSelection) -> FleetState {
        FleetState::initialize(&ShipCatalog::reference(), &lhs, &rhs)
    }

    #[test]
    fn pools_start_at_hp_times_count() {
        let fleets = state([2, 0, 1, 3], [0, 4, 0, 0]);
        assert_eq!(fleets.pool(Side::Lhs, 0), 240);
        assert_eq!(fleets.pool(Side::Lhs, 1), 0);
        assert_eq!(fleets.pool(Side::Lhs, 3), 1350);
        assert_eq!(fleets.pool(Side::Rhs, 1), 600);
        assert_eq!(fleets.total_remaining(Side::Lhs), 6);
        assert_eq!(fleets.total_remaining(Side::Rhs), 4);
    }

    #[test]
    fn partial_damage_rounds_up() {
        let mut fleets = state([3, 0, 0, 0], [0; 4]);
        fleets.apply_damage(Side::Lhs, 0, 1);
        assert_eq!(fleets.ships_remaining(Side::Lhs, 0), 3);

        fleets.apply_damage(Side::Lhs, 0, 119);
        assert_eq!(fleets.ships_remaining(Side::Lhs, 0), 2);
        assert_eq!(fleets.ships_lost(Side::Lhs, 0), 1);
    }

    #[test]
    fn overkill_floors_at_zero() {
        let mut fleets = state([0; 4], [0, 0, 2, 0]);
        fleets.apply_damage(Side::Rhs, 2, 10_000);
        assert_eq!(fleets.pool(Side::Rhs, 2), 0);
        assert_eq!(fleets.ships_remaining(Side::Rhs, 2), 0);
        assert!(fleets.is_wiped_out(Side::Rhs));

        fleets.apply_damage(Side::Rhs, 2, 5);
        assert_eq!(fleets.pool(Side::Rhs, 2), 0);
    }

    #[test]
    fn damage_is_scoped_to_side_and_type() {
        let mut fleets = state([1, 1, 1, 1], [1, 1, 1, 1]);
        fleets.apply_damage(Side::Rhs, 1, 150);
        assert_eq!(fleets.remaining_per_type(Side::Rhs), [1, 0, 1, 1]);
        assert_eq!(fleets.remaining_per_type(Side::Lhs), [1, 1, 1, 1]);
    }

    #[test]
    fn unknown_type_is_ignored() {
        let mut fleets = state([1, 1, 1, 1], [1, 1, 1, 1]);
        fleets.apply_damage(Side::Lhs, 7, 100);
        assert_eq!(fleets.ships_remaining(Side::Lhs, 7), 0);
        assert_eq!(fleets.total_remaining(Side::Lhs), 4);
    }

    #[test]
    fn cp_of_reference_fleet() {
        let catalog = ShipCatalog::reference();
        assert_eq!(fleet_cp(&catalog, &[35, 25, 15, 10]), 270);
        assert_eq!(fleet_cp(&catalog, &[0; 4]), 0);
    }

    #[test]
    fn cp_cap_enforced() {
        let catalog = ShipCatalog::reference();
        assert_eq!(check_cp_cap(&catalog, &[35, 25, 15, 10], 270), Ok(270));
        assert_eq!(
            check_cp_cap(&catalog, &[35, 25, 15, 11], 270),
            Err(CompositionError::OverCap { cp: 280, cap: 270 })
        );
    }
}
