//! Playback controller - paces resolved rounds for presentation
//!
//! Rounds are resolved one at a time and presented one ship type index at a
//! time. The attacker's and defender's groups of the same index travel and
//! animate together; their hits land once both have arrived, followed by the
//! attack hold. The next index starts only after that. Cancellation is only
//! observed between rounds.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, join_all, BoxFuture};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::util::time::Timer;

use super::catalog::ShipCatalog;
use super::fleet::ShipId;
use super::outcome::{evaluate, Outcome, OutcomeReport};
use super::record::{FightRecord, Move, MoveType};
use super::resolver::{ResolutionError, ResolverPhase, RoundReport, RoundResolver, StepReport};
use super::slots::Slot;
use super::snapshot::{FleetSnapshot, SnapshotLog};
use super::{Side, MAX_SHIPS};

/// Pacing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Minimum hold after each attack action
    pub action_hold: Duration,
    /// Time a group takes to change lanes
    pub travel: Duration,
    /// Stop presenting once either fleet has no units left
    pub short_circuit: bool,
}

impl PlaybackConfig {
    /// No pacing at all, for headless replays
    pub fn immediate() -> Self {
        Self {
            action_hold: Duration::ZERO,
            travel: Duration::ZERO,
            short_circuit: true,
        }
    }

    /// Time the acting group needs to reach its lane
    pub fn travel_time(&self, step: &StepReport) -> Duration {
        if step.travelled {
            self.travel
        } else {
            Duration::ZERO
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            action_hold: Duration::from_millis(500),
            travel: Duration::from_millis(1000),
            short_circuit: true,
        }
    }
}

/// Callbacks consumed by a renderer
///
/// Events of one round arrive per ship type index in ascending order. For each
/// index the attacker's callbacks come before the defender's, and every move is
/// reported before any of that index's hits.
pub trait ReplayObserver: Send {
    fn on_round_start(&mut self, _round: u32) {}

    /// A group with units left acted and now stands at `slot`
    fn on_move_resolved(&mut self, _side: Side, _mv: &Move, _slot: Slot) {}

    /// Every recorded attack, including those of groups with no units left
    fn on_attack(&mut self, _side: Side, _mv: &Move) {}

    /// `side` is the side that took the damage
    fn on_damage_applied(&mut self, _side: Side, _ship_type: usize, _remaining_pool: u64) {}

    fn on_ship_destroyed(&mut self, _ship: ShipId) {}

    fn on_outcome(&mut self, _outcome: Outcome) {}

    /// Animation of one presented step. Hits of the step's ship type index are
    /// delivered once the animation and any lane travel have completed.
    fn animate(&self, _step: &StepReport) -> BoxFuture<'static, ()> {
        Box::pin(future::ready(()))
    }
}

/// Summary of one playback session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackReport {
    pub session_id: Uuid,
    /// Always the record's authoritative outcome
    pub outcome: Outcome,
    pub rounds_played: u32,
    pub cancelled: bool,
    /// Present only when playback reached the end of the record
    pub consistency: Option<OutcomeReport>,
    pub snapshots: Vec<FleetSnapshot>,
}

/// Drives replay sessions; each call to [`PlaybackController::play`] owns its own state
#[derive(Debug, Clone)]
pub struct PlaybackController {
    catalog: Arc<ShipCatalog>,
    config: PlaybackConfig,
}

impl PlaybackController {
    pub fn new(catalog: Arc<ShipCatalog>, config: PlaybackConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Replay `record` into `observer` until it ends, fails or `cancel` fires
    pub async fn play(
        &self,
        record: &FightRecord,
        observer: &mut dyn ReplayObserver,
        cancel: &CancellationToken,
    ) -> Result<PlaybackReport, ResolutionError> {
        let session_id = Uuid::new_v4();
        let timer = Timer::new();
        let outcome = Outcome::from_record(record);

        info!(
            session_id = %session_id,
            seed = record.seed,
            rounds = record.rounds,
            "Replay started"
        );

        let mut resolver = RoundResolver::new(&self.catalog, record, self.config.short_circuit);
        let mut snapshots = SnapshotLog::new();
        let mut cancelled = false;

        loop {
            // A session cancelled before its first round never starts
            let stopped = cancel.is_cancelled()
                && (resolver.phase() == ResolverPhase::NotStarted || resolver.interrupt());
            if stopped {
                info!(
                    session_id = %session_id,
                    rounds_played = resolver.rounds_resolved(),
                    "Replay cancelled"
                );
                cancelled = true;
                break;
            }

            let report = match resolver.resolve_next() {
                Ok(Some(report)) => report,
                Ok(None) => break,
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Replay aborted");
                    return Err(e);
                }
            };

            self.present_round(session_id, observer, &report).await;
            snapshots.record(&report.snapshots);
        }

        let consistency = matches!(resolver.phase(), ResolverPhase::Finished(_)).then(|| {
            let report = evaluate(record, &resolver.state().fleets);
            if !report.is_consistent() {
                warn!(
                    session_id = %session_id,
                    mismatches = ?report.mismatches,
                    "Reconstructed fleets disagree with the record"
                );
            }
            report
        });

        observer.on_outcome(outcome);

        info!(
            session_id = %session_id,
            outcome = outcome.label(),
            rounds_played = resolver.rounds_resolved(),
            elapsed = ?timer.elapsed(),
            "Replay finished"
        );

        Ok(PlaybackReport {
            session_id,
            outcome,
            rounds_played: resolver.rounds_resolved(),
            cancelled,
            consistency,
            snapshots: snapshots.into_entries(),
        })
    }

    async fn present_round(
        &self,
        session_id: Uuid,
        observer: &mut dyn ReplayObserver,
        report: &RoundReport,
    ) {
        debug!(
            session_id = %session_id,
            round = report.round,
            steps = report.steps.len(),
            "Round started"
        );
        observer.on_round_start(report.round);

        for ship_type in 0..MAX_SHIPS {
            let steps: Vec<&StepReport> = report
                .steps
                .iter()
                .filter(|step| step.mv.source == ship_type)
                .collect();
            if !steps.is_empty() {
                self.present_action(observer, &steps).await;
            }
        }
    }

    /// Present the attacker's and defender's moves of one ship type index
    async fn present_action(&self, observer: &mut dyn ReplayObserver, steps: &[&StepReport]) {
        let mut arrivals = Vec::with_capacity(steps.len());
        for step in steps {
            if let Some(slot) = step.slot {
                observer.on_move_resolved(step.side, &step.mv, slot);
                let animation = observer.animate(step);
                let travel = self.config.travel_time(step);
                arrivals.push(async move {
                    tokio::join!(animation, tokio::time::sleep(travel));
                });
            }
        }
        join_all(arrivals).await;

        let mut attacked = false;
        for step in steps {
            if step.mv.move_type == MoveType::Attack {
                observer.on_attack(step.side, &step.mv);
                attacked = true;
            }

            if let Some(damage) = &step.damage {
                observer.on_damage_applied(
                    damage.target.side,
                    damage.target.ship_type,
                    damage.remaining_pool,
                );
                for ship in &damage.destroyed {
                    observer.on_ship_destroyed(*ship);
                }
            }
        }

        if attacked {
            tokio::time::sleep(self.config.action_hold).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::observers::EventRecorder;
    use crate::wire::protocol::ReplayEvent;

    fn duel() -> FightRecord {
        FightRecord {
            seed: 9,
            selection_lhs: [1, 0, 0, 0],
            selection_rhs: [2, 0, 0, 0],
            variants_lhs: [0; 4],
            variants_rhs: [0; 4],
            commander_lhs: 0,
            commander_rhs: 0,
            rounds: 2,
            lhs_moves: vec![Move::attack(0, 0, 0, 2, 130), Move::attack(1, 0, 0, 2, 110)],
            rhs_moves: vec![Move::attack(0, 0, 0, -2, 50), Move::attack(1, 0, 0, -2, 50)],
            lhs_dead: false,
            rhs_dead: true,
            ships_lost_lhs: None,
            ships_lost_rhs: Some([2, 0, 0, 0]),
        }
    }

    fn controller(config: PlaybackConfig) -> PlaybackController {
        PlaybackController::new(Arc::new(ShipCatalog::reference()), config)
    }

    #[tokio::test(start_paused = true)]
    async fn events_follow_ship_index_order() {
        let record = duel();
        let mut recorder = EventRecorder::new();
        let report = controller(PlaybackConfig::default())
            .play(&record, &mut recorder, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Win(Side::Lhs));
        assert_eq!(report.rounds_played, 2);
        assert!(!report.cancelled);
        assert!(report.consistency.as_ref().unwrap().is_consistent());

        let rhs_hunter = |ordinal| ShipId {
            side: Side::Rhs,
            ship_type: 0,
            ordinal,
        };
        assert_eq!(
            recorder.events(),
            &[
                ReplayEvent::RoundStart { round: 0 },
                ReplayEvent::MoveResolved {
                    side: Side::Lhs,
                    mv: record.lhs_moves[0],
                    slot: Slot { lane: 2, row: 0 },
                },
                ReplayEvent::MoveResolved {
                    side: Side::Rhs,
                    mv: record.rhs_moves[0],
                    slot: Slot { lane: -2, row: 0 },
                },
                ReplayEvent::DamageApplied {
                    side: Side::Rhs,
                    ship_type: 0,
                    remaining_pool: 110,
                },
                ReplayEvent::ShipDestroyed { ship: rhs_hunter(0) },
                ReplayEvent::DamageApplied {
                    side: Side::Lhs,
                    ship_type: 0,
                    remaining_pool: 70,
                },
                ReplayEvent::RoundStart { round: 1 },
                ReplayEvent::MoveResolved {
                    side: Side::Lhs,
                    mv: record.lhs_moves[1],
                    slot: Slot { lane: 2, row: 0 },
                },
                ReplayEvent::DamageApplied {
                    side: Side::Rhs,
                    ship_type: 0,
                    remaining_pool: 0,
                },
                ReplayEvent::ShipDestroyed { ship: rhs_hunter(1) },
                ReplayEvent::DamageApplied {
                    side: Side::Lhs,
                    ship_type: 0,
                    remaining_pool: 20,
                },
                ReplayEvent::Outcome {
                    outcome: Outcome::Win(Side::Lhs),
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rounds_wait_for_slowest_group() {
        let record = duel();
        let start = tokio::time::Instant::now();
        controller(PlaybackConfig::default())
            .play(&record, &mut EventRecorder::new(), &CancellationToken::new())
            .await
            .unwrap();

        // Round 0: both groups travel together (1000ms), then one hold (500ms).
        // Round 1: only the attacker is presented and stays in lane (500ms).
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2100), "{elapsed:?}");
    }

    /// Timestamps every hit relative to the start of playback
    struct HitClock {
        start: tokio::time::Instant,
        hits: Vec<(Side, usize, u128)>,
    }

    impl ReplayObserver for HitClock {
        fn on_damage_applied(&mut self, side: Side, ship_type: usize, _remaining_pool: u64) {
            self.hits.push((side, ship_type, self.start.elapsed().as_millis()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn each_attacking_index_holds_before_the_next() {
        // Every group fires from its starting lane, so nothing travels
        let record = FightRecord {
            selection_lhs: [1; 4],
            selection_rhs: [1; 4],
            rounds: 1,
            lhs_moves: (0..MAX_SHIPS)
                .map(|i| Move::attack(0, i, i, 10 + i as i32, 10))
                .collect(),
            rhs_moves: (0..MAX_SHIPS)
                .map(|i| Move::attack(0, i, i, -10 - i as i32, 10))
                .collect(),
            lhs_dead: false,
            rhs_dead: false,
            ships_lost_lhs: None,
            ships_lost_rhs: None,
            ..duel()
        };

        let start = tokio::time::Instant::now();
        let mut clock = HitClock {
            start,
            hits: Vec::new(),
        };
        controller(PlaybackConfig::default())
            .play(&record, &mut clock, &CancellationToken::new())
            .await
            .unwrap();

        let expected: Vec<(Side, usize, u128)> = (0..MAX_SHIPS)
            .flat_map(|i| {
                let at = 500 * i as u128;
                [(Side::Rhs, i, at), (Side::Lhs, i, at)]
            })
            .collect();
        assert_eq!(clock.hits, expected);
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn hit_on_empty_group_reports_zero_pool() {
        // Both attacker groups fire at the lone defender; the first shot kills it
        let record = FightRecord {
            selection_lhs: [1, 1, 0, 0],
            selection_rhs: [1, 0, 0, 0],
            rounds: 1,
            lhs_moves: vec![Move::attack(0, 0, 0, 10, 500), Move::attack(0, 1, 0, 11, 300)],
            rhs_moves: Vec::new(),
            lhs_dead: false,
            rhs_dead: true,
            ships_lost_lhs: Some([0; 4]),
            ships_lost_rhs: Some([1, 0, 0, 0]),
            ..duel()
        };

        let mut recorder = EventRecorder::new();
        let report = controller(PlaybackConfig::immediate())
            .play(&record, &mut recorder, &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.consistency.unwrap().is_consistent());

        assert_eq!(
            recorder.events(),
            &[
                ReplayEvent::RoundStart { round: 0 },
                ReplayEvent::MoveResolved {
                    side: Side::Lhs,
                    mv: record.lhs_moves[0],
                    slot: Slot { lane: 10, row: 0 },
                },
                ReplayEvent::DamageApplied {
                    side: Side::Rhs,
                    ship_type: 0,
                    remaining_pool: 0,
                },
                ReplayEvent::ShipDestroyed {
                    ship: ShipId {
                        side: Side::Rhs,
                        ship_type: 0,
                        ordinal: 0,
                    },
                },
                ReplayEvent::MoveResolved {
                    side: Side::Lhs,
                    mv: record.lhs_moves[1],
                    slot: Slot { lane: 11, row: 0 },
                },
                ReplayEvent::DamageApplied {
                    side: Side::Rhs,
                    ship_type: 0,
                    remaining_pool: 0,
                },
                ReplayEvent::Outcome {
                    outcome: Outcome::Win(Side::Lhs),
                },
            ]
        );
    }

    #[derive(Default)]
    struct AttackTally {
        attacks: Vec<(Side, usize)>,
    }

    impl ReplayObserver for AttackTally {
        fn on_attack(&mut self, side: Side, mv: &Move) {
            self.attacks.push((side, mv.source));
        }
    }

    #[tokio::test]
    async fn attacks_of_emptied_groups_are_still_reported() {
        let record = duel();
        let mut tally = AttackTally::default();
        controller(PlaybackConfig::immediate())
            .play(&record, &mut tally, &CancellationToken::new())
            .await
            .unwrap();

        // The defender's round 1 shot comes from a group already destroyed
        assert_eq!(
            tally.attacks,
            vec![(Side::Lhs, 0), (Side::Rhs, 0), (Side::Lhs, 0), (Side::Rhs, 0)]
        );
    }

    struct SlowRenderer {
        per_step: Duration,
    }

    impl ReplayObserver for SlowRenderer {
        fn animate(&self, _step: &StepReport) -> BoxFuture<'static, ()> {
            Box::pin(tokio::time::sleep(self.per_step))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn observer_animation_extends_round() {
        let record = duel();
        let start = tokio::time::Instant::now();
        controller(PlaybackConfig::immediate())
            .play(
                &record,
                &mut SlowRenderer {
                    per_step: Duration::from_secs(3),
                },
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(6100), "{elapsed:?}");
    }

    #[tokio::test]
    async fn cancelled_before_start_still_reports_outcome() {
        let record = duel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut recorder = EventRecorder::new();
        let report = controller(PlaybackConfig::immediate())
            .play(&record, &mut recorder, &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.rounds_played, 0);
        assert_eq!(report.outcome, Outcome::Win(Side::Lhs));
        assert_eq!(report.consistency, None);
        assert_eq!(
            recorder.events(),
            &[ReplayEvent::Outcome {
                outcome: Outcome::Win(Side::Lhs)
            }]
        );
    }

    struct CancelOnRound {
        round: u32,
        cancel: CancellationToken,
        rounds_seen: Vec<u32>,
    }

    impl ReplayObserver for CancelOnRound {
        fn on_round_start(&mut self, round: u32) {
            self.rounds_seen.push(round);
            if round == self.round {
                self.cancel.cancel();
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_waits_for_round_boundary() {
        let mut record = duel();
        record.rounds = 3;

        let cancel = CancellationToken::new();
        let mut observer = CancelOnRound {
            round: 0,
            cancel: cancel.clone(),
            rounds_seen: Vec::new(),
        };
        let report = controller(PlaybackConfig::default())
            .play(&record, &mut observer, &cancel)
            .await
            .unwrap();

        assert_eq!(observer.rounds_seen, vec![0]);
        assert_eq!(report.rounds_played, 1);
        assert_eq!(report.snapshots.len(), 2);
        assert!(report.cancelled);
        assert_eq!(report.outcome, Outcome::Win(Side::Lhs));
    }

    #[tokio::test]
    async fn malformed_record_aborts() {
        let mut record = duel();
        record.lhs_moves[1].source = 9;

        let mut recorder = EventRecorder::new();
        let err = controller(PlaybackConfig::immediate())
            .play(&record, &mut recorder, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ResolutionError::ShipTypeOutOfRange { index: 9, .. }));
        assert!(!recorder
            .events()
            .iter()
            .any(|e| matches!(e, ReplayEvent::Outcome { .. })));
    }

    #[tokio::test]
    async fn mismatching_record_is_reported_not_overridden() {
        let mut record = duel();
        record.lhs_moves[1].damage = 10;

        let report = controller(PlaybackConfig::immediate())
            .play(&record, &mut EventRecorder::new(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::Win(Side::Lhs));
        assert!(!report.consistency.unwrap().is_consistent());
    }
}
