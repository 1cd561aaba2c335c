//! Ranked defence registry and leaderboard

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::game::fleet::{check_cp_cap, fleet_cp, CompositionError};
use crate::game::{FightRecord, FleetSelection, FleetVariant, Outcome, ShipCatalog, Side};
use crate::sim::{CombatSimulator, FightRequest};

/// A registered defending fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDefence {
    pub selection: FleetSelection,
    pub variants: FleetVariant,
    pub commander: u32,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub address: String,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
}

/// In-memory ranked play
pub struct RankedStore {
    catalog: Arc<ShipCatalog>,
    simulator: Arc<dyn CombatSimulator>,
    defences: DashMap<String, PlayerDefence>,
    rng: Mutex<ChaCha8Rng>,
}

impl RankedStore {
    /// `seed` drives the fight seeds handed to the simulator
    pub fn new(catalog: Arc<ShipCatalog>, simulator: Arc<dyn CombatSimulator>, seed: u64) -> Self {
        Self {
            catalog,
            simulator,
            defences: DashMap::new(),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Register or replace a defence. Replacing resets the record.
    pub fn register_defence(
        &self,
        address: &str,
        selection: FleetSelection,
        variants: FleetVariant,
        commander: u32,
        name: &str,
    ) {
        info!(
            address,
            cp = fleet_cp(&self.catalog, &selection),
            "Defence registered"
        );
        self.defences.insert(
            address.to_string(),
            PlayerDefence {
                selection,
                variants,
                commander,
                name: name.to_string(),
                wins: 0,
                losses: 0,
                registered_at: chrono::Utc::now(),
            },
        );
    }

    pub fn get_own_defence(&self, address: &str) -> Result<PlayerDefence, StoreError> {
        self.defences
            .get(address)
            .map(|d| d.clone())
            .ok_or_else(|| StoreError::NotRegistered(address.to_string()))
    }

    /// Every registered defender, ordered by address
    pub fn get_all_defenders(&self) -> Vec<(String, PlayerDefence)> {
        let mut defenders: Vec<_> = self
            .defences
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        defenders.sort_by(|a, b| a.0.cmp(&b.0));
        defenders
    }

    /// Fight `target`'s registered defence and record the result.
    ///
    /// The attacking fleet may not exceed the defence's combat power.
    pub fn attack(
        &self,
        attacker: &str,
        target: &str,
        selection: FleetSelection,
        variants: FleetVariant,
        commander: u32,
    ) -> Result<FightRecord, StoreError> {
        self.get_own_defence(attacker)?;
        let defence = self.get_own_defence(target)?;

        check_cp_cap(&self.catalog, &selection, fleet_cp(&self.catalog, &defence.selection))?;

        let seed = self.rng.lock().gen::<u64>();
        let request = FightRequest {
            seed,
            selection_lhs: selection,
            selection_rhs: defence.selection,
            variants_lhs: variants,
            variants_rhs: defence.variants,
            commander_lhs: commander,
            commander_rhs: defence.commander,
        };
        let record = self.simulator.fight(&request, true);

        let outcome = Outcome::from_record(&record);
        match outcome.winner() {
            Some(Side::Lhs) => {
                self.mark(attacker, true);
                self.mark(target, false);
            }
            Some(Side::Rhs) => {
                self.mark(target, true);
                self.mark(attacker, false);
            }
            None => {}
        }

        info!(attacker, target, seed, outcome = outcome.label(), "Ranked fight complete");

        Ok(record)
    }

    /// Ranked by wins, then fewest losses, then address
    pub fn get_leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .defences
            .iter()
            .map(|entry| LeaderboardEntry {
                address: entry.key().clone(),
                name: entry.value().name.clone(),
                wins: entry.value().wins,
                losses: entry.value().losses,
            })
            .collect();

        entries.sort_by(|a, b| {
            b.wins
                .cmp(&a.wins)
                .then(a.losses.cmp(&b.losses))
                .then_with(|| a.address.cmp(&b.address))
        });
        entries
    }

    fn mark(&self, address: &str, won: bool) {
        if let Some(mut defence) = self.defences.get_mut(address) {
            if won {
                defence.wins += 1;
            } else {
                defence.losses += 1;
            }
        }
    }
}

/// Ranked store errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("No defence registered for {0}")]
    NotRegistered(String),

    #[error(transparent)]
    Composition(#[from] CompositionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ReferenceSimulator;

    fn store() -> RankedStore {
        let catalog = Arc::new(ShipCatalog::reference());
        let simulator = Arc::new(ReferenceSimulator::new(catalog.clone()));
        RankedStore::new(catalog, simulator, 7)
    }

    #[test]
    fn register_and_fetch() {
        let store = store();
        store.register_defence("alice", [1, 2, 3, 4], [0, 1, 2, 0], 2, "Alice");

        let defence = store.get_own_defence("alice").unwrap();
        assert_eq!(defence.selection, [1, 2, 3, 4]);
        assert_eq!(defence.name, "Alice");
        assert_eq!((defence.wins, defence.losses), (0, 0));

        assert_eq!(
            store.get_own_defence("bob"),
            Err(StoreError::NotRegistered("bob".to_string()))
        );
    }

    #[test]
    fn attack_requires_both_registrations() {
        let store = store();
        store.register_defence("alice", [16; 4], [0; 4], 0, "Alice");

        let err = store.attack("mallory", "alice", [3; 4], [0; 4], 0).unwrap_err();
        assert_eq!(err, StoreError::NotRegistered("mallory".to_string()));

        store.register_defence("mallory", [1; 4], [0; 4], 0, "Mallory");
        assert!(store.attack("mallory", "nobody", [3; 4], [0; 4], 0).is_err());
    }

    #[test]
    fn attack_capped_at_defence_cp() {
        let store = store();
        store.register_defence("alice", [1, 0, 0, 0], [0; 4], 0, "Alice");
        store.register_defence("bob", [1, 0, 0, 0], [0; 4], 0, "Bob");

        let err = store.attack("bob", "alice", [0, 1, 0, 0], [0; 4], 0).unwrap_err();
        assert_eq!(err, StoreError::Composition(CompositionError::OverCap { cp: 3, cap: 1 }));
    }

    #[test]
    fn attack_updates_leaderboard() {
        let store = store();
        store.register_defence("alice", [16; 4], [0; 4], 0, "Alice");
        store.register_defence("bob", [1; 4], [0; 4], 0, "Bob");
        store.register_defence("carol", [0, 0, 0, 1], [0; 4], 0, "Carol");

        // A far smaller fleet cannot survive sixteen of everything
        let record = store.attack("bob", "alice", [3; 4], [0; 4], 0).unwrap();
        assert!(record.lhs_dead);
        assert!(!record.lhs_moves.is_empty());

        let board = store.get_leaderboard();
        let rows: Vec<(&str, u32, u32)> = board
            .iter()
            .map(|e| (e.address.as_str(), e.wins, e.losses))
            .collect();
        assert_eq!(rows, vec![("alice", 1, 0), ("carol", 0, 0), ("bob", 0, 1)]);
    }

    #[test]
    fn defenders_listed_by_address() {
        let store = store();
        store.register_defence("zed", [1; 4], [0; 4], 0, "Zed");
        store.register_defence("amy", [1; 4], [0; 4], 0, "Amy");

        let addresses: Vec<String> = store.get_all_defenders().into_iter().map(|(a, _)| a).collect();
        assert_eq!(addresses, vec!["amy", "zed"]);
    }
}
