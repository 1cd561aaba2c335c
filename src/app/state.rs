//! Application state shared by replay sessions

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::game::catalog::CatalogError;
use crate::game::fleet::{check_cp_cap, fleet_cp, CompositionError};
use crate::game::{FightRecord, PlaybackController, ShipCatalog};
use crate::sim::{CombatSimulator, FightRequest, ReferenceSimulator};
use crate::store::RankedStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<ShipCatalog>,
    pub simulator: Arc<dyn CombatSimulator>,
    pub ranked: Arc<RankedStore>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, CatalogError> {
        let config = Arc::new(config);

        // Ship definitions
        let catalog = match &config.ship_catalog_path {
            Some(path) => {
                info!(path = %path.display(), "Loading ship catalog");
                ShipCatalog::load(path)?
            }
            None => ShipCatalog::reference(),
        };
        let catalog = Arc::new(catalog);

        let simulator: Arc<dyn CombatSimulator> = Arc::new(ReferenceSimulator::new(catalog.clone()));

        let ranked_seed = config.training_seed.unwrap_or_else(rand::random);
        let ranked = Arc::new(RankedStore::new(catalog.clone(), simulator.clone(), ranked_seed));

        Ok(Self {
            config,
            catalog,
            simulator,
            ranked,
        })
    }

    /// Playback controller using the configured pacing
    pub fn controller(&self) -> PlaybackController {
        PlaybackController::new(self.catalog.clone(), self.config.playback_config())
    }

    /// Fight the training opponent. The player's fleet may not exceed the opponent's cp.
    pub fn training_fight(&self, seed: u64) -> Result<FightRecord, CompositionError> {
        let opponent = self.config.training_opponent;
        let cap = fleet_cp(&self.catalog, &opponent);
        let cp = check_cp_cap(&self.catalog, &self.config.training_fleet, cap)?;

        info!(seed, cp, cap, "Starting training fight");

        let request = FightRequest::new(seed, self.config.training_fleet, opponent);
        Ok(self.simulator.fight(&request, true))
    }
}
