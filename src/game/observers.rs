//! Stock replay observers

use std::sync::Arc;

use tracing::info;

use crate::wire::protocol::ReplayEvent;

use super::catalog::ShipCatalog;
use super::fleet::ShipId;
use super::outcome::Outcome;
use super::playback::ReplayObserver;
use super::record::Move;
use super::slots::Slot;
use super::Side;

/// Collects every callback as a serialisable event
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<ReplayEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ReplayEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ReplayEvent> {
        self.events
    }
}

impl ReplayObserver for EventRecorder {
    fn on_round_start(&mut self, round: u32) {
        self.events.push(ReplayEvent::RoundStart { round });
    }

    fn on_move_resolved(&mut self, side: Side, mv: &Move, slot: Slot) {
        self.events.push(ReplayEvent::MoveResolved { side, mv: *mv, slot });
    }

    fn on_damage_applied(&mut self, side: Side, ship_type: usize, remaining_pool: u64) {
        self.events.push(ReplayEvent::DamageApplied {
            side,
            ship_type,
            remaining_pool,
        });
    }

    fn on_ship_destroyed(&mut self, ship: ShipId) {
        self.events.push(ReplayEvent::ShipDestroyed { ship });
    }

    fn on_outcome(&mut self, outcome: Outcome) {
        self.events.push(ReplayEvent::Outcome { outcome });
    }
}

/// Human-readable combat log, newest entry last
#[derive(Debug)]
pub struct CombatLog {
    catalog: Arc<ShipCatalog>,
    entries: Vec<String>,
}

impl CombatLog {
    pub fn new(catalog: Arc<ShipCatalog>) -> Self {
        Self {
            catalog,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    fn push(&mut self, entry: String) {
        info!("{entry}");
        self.entries.push(entry);
    }
}

impl ReplayObserver for CombatLog {
    fn on_round_start(&mut self, round: u32) {
        self.push(format!("Round {} begins.", round + 1));
    }

    fn on_attack(&mut self, side: Side, mv: &Move) {
        let entry = format!(
            "[{}] {} hits {} for {} damage.",
            side.label(),
            self.catalog.name(mv.source),
            self.catalog.name(mv.target),
            mv.damage
        );
        self.push(entry);
    }

    fn on_ship_destroyed(&mut self, ship: ShipId) {
        let entry = format!(
            "[{}] {} #{} destroyed.",
            ship.side.label(),
            self.catalog.name(ship.ship_type),
            ship.ordinal + 1
        );
        self.push(entry);
    }

    fn on_outcome(&mut self, outcome: Outcome) {
        self.push(outcome.label().to_string());
    }
}
