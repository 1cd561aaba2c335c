//! Collision-free lane/row assignment for ship group visuals

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fleet::FleetSelection;
use super::{Side, MAX_SHIPS};

/// Lane of the attacker's first ship type; later types sit one lane further out
pub const LHS_START_LANE: i32 = 10;
/// Lane of the defender's first ship type
pub const RHS_START_LANE: i32 = -10;

/// Lane a group occupies before the first round
pub fn starting_lane(side: Side, ship_type: usize) -> i32 {
    let offset = ship_type as i32;
    match side {
        Side::Lhs => LHS_START_LANE + offset,
        Side::Rhs => RHS_START_LANE - offset,
    }
}

/// All units of one ship type within one fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId {
    pub side: Side,
    pub ship_type: usize,
}

impl GroupId {
    pub fn new(side: Side, ship_type: usize) -> Self {
        Self { side, ship_type }
    }
}

/// Presentation coordinate of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub lane: i32,
    pub row: u32,
}

/// Lane occupancy for one playback session
///
/// Each (lane, row) pair holds at most one group at any time.
#[derive(Debug, Clone, Default)]
pub struct SlotAllocator {
    occupancy: BTreeMap<i32, BTreeMap<u32, GroupId>>,
    placements: BTreeMap<GroupId, Slot>,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place every selected group at its starting lane, attacker types first
    pub fn with_starting_lanes(lhs: &FleetSelection, rhs: &FleetSelection) -> Self {
        let mut slots = Self::new();
        for (side, selection) in [(Side::Lhs, lhs), (Side::Rhs, rhs)] {
            for ship_type in 0..MAX_SHIPS {
                if selection[ship_type] > 0 {
                    slots.assign(GroupId::new(side, ship_type), starting_lane(side, ship_type));
                }
            }
        }
        slots
    }

    pub fn slot_of(&self, group: GroupId) -> Option<Slot> {
        self.placements.get(&group).copied()
    }

    /// Move `group` to `lane` and return its slot there.
    ///
    /// A group already in the lane keeps its row. Otherwise its previous row is
    /// freed and it takes the smallest row not occupied in the new lane.
    pub fn assign(&mut self, group: GroupId, lane: i32) -> Slot {
        if let Some(current) = self.slot_of(group) {
            if current.lane == lane {
                return current;
            }
            self.release(group);
        }

        let rows = self.occupancy.entry(lane).or_default();
        let row = (0u32..).find(|r| !rows.contains_key(r)).unwrap_or(0);
        rows.insert(row, group);

        let slot = Slot { lane, row };
        self.placements.insert(group, slot);
        slot
    }

    /// Remove a group from the board, freeing its row
    pub fn release(&mut self, group: GroupId) -> Option<Slot> {
        let slot = self.placements.remove(&group)?;
        if let Some(rows) = self.occupancy.get_mut(&slot.lane) {
            rows.remove(&slot.row);
            if rows.is_empty() {
                self.occupancy.remove(&slot.lane);
            }
        }
        Some(slot)
    }

    /// Groups present in a lane, ordered by row
    pub fn groups_at(&self, lane: i32) -> Vec<GroupId> {
        self.occupancy
            .get(&lane)
            .map(|rows| rows.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn occupied_rows(&self, lane: i32) -> Vec<u32> {
        self.occupancy
            .get(&lane)
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every placed group with its slot
    pub fn placements(&self) -> impl Iterator<Item = (GroupId, Slot)> + '_ {
        self.placements.iter().map(|(g, s)| (*g, *s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn lhs(t: usize) -> GroupId {
        GroupId::new(Side::Lhs, t)
    }

    fn rhs(t: usize) -> GroupId {
        GroupId::new(Side::Rhs, t)
    }

    #[test]
    fn starting_lanes_mirror_each_other() {
        assert_eq!(starting_lane(Side::Lhs, 0), 10);
        assert_eq!(starting_lane(Side::Lhs, 3), 13);
        assert_eq!(starting_lane(Side::Rhs, 0), -10);
        assert_eq!(starting_lane(Side::Rhs, 3), -13);
    }

    #[test]
    fn empty_groups_are_not_placed() {
        let slots = SlotAllocator::with_starting_lanes(&[1, 0, 2, 0], &[0, 0, 0, 5]);
        let placed: Vec<GroupId> = slots.placements().map(|(g, _)| g).collect();
        assert_eq!(placed, vec![lhs(0), lhs(2), rhs(3)]);
        assert_eq!(slots.slot_of(rhs(3)), Some(Slot { lane: -13, row: 0 }));
    }

    #[test]
    fn arrivals_stack_in_order() {
        let mut slots = SlotAllocator::new();
        assert_eq!(slots.assign(lhs(0), 0).row, 0);
        assert_eq!(slots.assign(lhs(1), 0).row, 1);
        assert_eq!(slots.assign(rhs(0), 0).row, 2);
        assert_eq!(slots.groups_at(0), vec![lhs(0), lhs(1), rhs(0)]);
    }

    #[test]
    fn freed_row_is_reused_first() {
        let mut slots = SlotAllocator::new();
        slots.assign(lhs(0), 4);
        slots.assign(lhs(1), 4);
        slots.assign(lhs(2), 4);

        slots.assign(lhs(0), 7);
        assert_eq!(slots.occupied_rows(4), vec![1, 2]);

        assert_eq!(slots.assign(rhs(3), 4), Slot { lane: 4, row: 0 });
    }

    #[test]
    fn staying_in_lane_keeps_row() {
        let mut slots = SlotAllocator::new();
        slots.assign(lhs(0), 2);
        slots.assign(lhs(1), 2);
        assert_eq!(slots.assign(lhs(1), 2), Slot { lane: 2, row: 1 });
        assert_eq!(slots.occupied_rows(2), vec![0, 1]);
    }

    #[test]
    fn release_clears_lane() {
        let mut slots = SlotAllocator::new();
        slots.assign(rhs(2), -3);
        assert_eq!(slots.release(rhs(2)), Some(Slot { lane: -3, row: 0 }));
        assert!(slots.groups_at(-3).is_empty());
        assert_eq!(slots.release(rhs(2)), None);
    }

    #[test]
    fn no_two_groups_share_a_slot() {
        let mut slots = SlotAllocator::with_starting_lanes(&[1; 4], &[1; 4]);
        let lanes = [0, 1, 0, 2, 1, 0, 0, 3];
        for step in 0..40 {
            let group = GroupId::new(Side::BOTH[step % 2], (step / 2) % MAX_SHIPS);
            slots.assign(group, lanes[step % lanes.len()]);

            let mut seen = HashSet::new();
            for (_, slot) in slots.placements() {
                assert!(seen.insert(slot), "slot {slot:?} assigned twice");
            }
        }
    }
}
