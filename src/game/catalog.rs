//! Static ship type definitions

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::MAX_SHIPS;

/// Stats for one ship type, loaded once and indexed 0..MAX_SHIPS
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipType {
    pub name: String,
    /// Combat power cost per unit
    pub cp: u32,
    /// Hit points per unit
    pub hp: u32,
    pub attack_base: u32,
    /// Seed-derived attack bonus is taken modulo this value
    pub attack_variable: u32,
    pub defence: u32,
    /// Lanes travelled per round when no target is in reach
    pub speed: u32,
    /// Firing range in lanes
    pub range: u32,
}

impl ShipType {
    fn new(name: &str, cp: u32, hp: u32, attack: (u32, u32), defence: u32, speed: u32, range: u32) -> Self {
        Self {
            name: name.to_string(),
            cp,
            hp,
            attack_base: attack.0,
            attack_variable: attack.1,
            defence,
            speed,
            range,
        }
    }
}

/// The full, immutable set of ship types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipCatalog {
    ships: [ShipType; MAX_SHIPS],
}

impl ShipCatalog {
    /// The four stock ships
    pub fn reference() -> Self {
        Self {
            ships: [
                ShipType::new("Hunter", 1, 120, (80, 20), 20, 4, 4),
                ShipType::new("Scorpio", 3, 150, (65, 20), 30, 3, 8),
                ShipType::new("Zeneca", 4, 220, (65, 20), 35, 2, 15),
                ShipType::new("Luminaris", 10, 450, (80, 20), 40, 1, 30),
            ],
        }
    }

    /// Build a catalog from explicit definitions
    pub fn from_ships(ships: Vec<ShipType>) -> Result<Self, CatalogError> {
        for (index, ship) in ships.iter().enumerate() {
            if ship.hp == 0 {
                return Err(CatalogError::InvalidShip {
                    index,
                    reason: "hp must be positive",
                });
            }
            if ship.attack_variable == 0 {
                return Err(CatalogError::InvalidShip {
                    index,
                    reason: "attack_variable must be positive",
                });
            }
        }

        let found = ships.len();
        let ships: [ShipType; MAX_SHIPS] = ships
            .try_into()
            .map_err(|_| CatalogError::WrongLength { found })?;

        Ok(Self { ships })
    }

    /// Parse a JSON array of ship definitions
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let ships: Vec<ShipType> = serde_json::from_str(json)?;
        Self::from_ships(ships)
    }

    /// Load a catalog file from disk
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn ships(&self) -> &[ShipType; MAX_SHIPS] {
        &self.ships
    }

    pub fn get(&self, index: usize) -> Option<&ShipType> {
        self.ships.get(index)
    }

    /// Display name, tolerant of bad indices
    pub fn name(&self, index: usize) -> &str {
        self.get(index).map(|s| s.name.as_str()).unwrap_or("Unknown")
    }
}

impl Default for ShipCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

/// Catalog loading errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read ship catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed ship catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ship catalog must define exactly {expected} ships, found {found}", expected = MAX_SHIPS)]
    WrongLength { found: usize },

    #[error("Ship {index} is invalid: {reason}")]
    InvalidShip { index: usize, reason: &'static str },
}
