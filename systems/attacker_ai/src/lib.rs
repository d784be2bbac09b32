#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Utility-driven controller for attackers advancing toward the goal.
//!
//! Each update captures a fresh [`Snapshot`] of the attacker's surroundings,
//! re-evaluates its [`Intent`](rampart_core::Intent), runs the species
//! strategy, executes scored combat actions and finally takes a random-walk
//! step biased along the assigned path.

mod actions;
mod intent;
mod movement;
mod snapshot;
mod spawn;
mod strategy;

use glam::Vec2;
use rampart_combat::{CombatResolver, Strike};
use rampart_core::{
    AbilityKind, Attacker, BehaviorTuning, Cohort, Defender, Hazard, Intent, Locomotion, Strategy,
};
use rampart_navigation::Grid;
use rampart_spatial::SpatialIndex;
use rampart_status_effects::StatusEffectEngine;
use rand::Rng;
use tracing::debug;

use crate::actions::ActionPlanner;
use crate::movement::{desired_direction, select_step, travel, StepRules, StepWeights};

pub use actions::{plan_blast, BlastPlan};
pub use intent::{choose_intent, forced_intent, intent_weights, roulette, weighted_intent};
pub use snapshot::{AllySighting, DefenderSighting, HazardSighting, Snapshot};
pub use spawn::{spawn_attacker, SpawnPlan};

const DEFAULT_SUPPORT_REACH: f32 = 2.0;

/// World state an attacker may read or act upon during its update.
#[derive(Debug)]
pub struct Surroundings<'a> {
    /// Tile map used for step validation.
    pub grid: &'a Grid,
    /// Neighbour index snapshot.
    pub spatial: &'a SpatialIndex,
    /// Opposing defenders, sorted by id.
    pub defenders: &'a mut [Defender],
    /// Placed hazards, sorted by id.
    pub hazards: &'a mut [Hazard],
    /// Shared damage pipeline.
    pub resolver: &'a mut CombatResolver,
    /// Status effect rules.
    pub effects: &'a StatusEffectEngine,
    /// Behaviour constants.
    pub tuning: &'a BehaviorTuning,
}

/// Observable outcome of one attacker update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AttackerTurn {
    /// Previous and new intent when the intent changed.
    pub intent_change: Option<(Intent, Intent)>,
    /// The attacker's position changed.
    pub moved: bool,
    /// Number of combat actions executed.
    pub actions: usize,
}

/// Stateless controller owning reusable scratch buffers.
#[derive(Debug, Default)]
pub struct AttackerController {
    snapshot: Snapshot,
    planner: ActionPlanner,
    claims: Vec<Vec2>,
}

impl AttackerController {
    /// Creates a controller with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot captured by the most recent update.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Runs one update for `attacker`.
    ///
    /// `allies` holds every other attacker; the ones before it in list order
    /// were already updated this tick. Damage dealt is appended to `strikes`.
    pub fn update<R>(
        &mut self,
        attacker: &mut Attacker,
        allies: &mut Cohort<'_, Attacker>,
        field: &mut Surroundings<'_>,
        dt: f32,
        rng: &mut R,
        strikes: &mut Vec<Strike>,
    ) -> AttackerTurn
    where
        R: Rng + ?Sized,
    {
        let mut turn = AttackerTurn::default();
        if !attacker.agent.is_alive() || attacker.reached_goal {
            return turn;
        }
        tick_timers(attacker, dt);

        self.snapshot.capture(
            attacker.agent.position,
            attacker.stats.detection_radius,
            field.spatial,
            allies,
            field.defenders,
            field.hazards,
        );
        if attacker.agent.derived.stunned {
            return turn;
        }

        turn.intent_change = self.reconsider(attacker, field.tuning, dt, rng);

        strategy::run_strategy(attacker, allies, &self.snapshot, field, dt, rng, strikes);
        self.planner.plan(attacker, &self.snapshot, field.tuning, rng);
        turn.actions = self.planner.execute(attacker, allies, field, rng, strikes);

        if attacker.agent.is_alive() {
            turn.moved = self.step(attacker, allies, field.grid, field.tuning, dt, rng);
        }
        turn
    }

    /// Applies a forced override every tick and a weighted draw whenever the
    /// intent timer runs out.
    fn reconsider<R>(
        &self,
        attacker: &mut Attacker,
        tuning: &BehaviorTuning,
        dt: f32,
        rng: &mut R,
    ) -> Option<(Intent, Intent)>
    where
        R: Rng + ?Sized,
    {
        attacker.intent_timer -= dt;
        let expired = attacker.intent_timer <= 0.0;
        if expired {
            attacker.intent_timer = tuning.intent_interval.max(0.0);
        }

        let next = match forced_intent(attacker, &self.snapshot, tuning) {
            Some(forced) => forced,
            None if expired => weighted_intent(attacker, &self.snapshot, tuning, rng),
            None => return None,
        };
        let previous = attacker.intent;
        if next == previous {
            return None;
        }
        attacker.intent = next;
        debug!(attacker = attacker.id.get(), from = ?previous, to = ?next, "intent changed");
        Some((previous, next))
    }

    fn step<R>(
        &mut self,
        attacker: &mut Attacker,
        allies: &Cohort<'_, Attacker>,
        grid: &Grid,
        tuning: &BehaviorTuning,
        dt: f32,
        rng: &mut R,
    ) -> bool
    where
        R: Rng + ?Sized,
    {
        let Some(current) = attacker.tile() else {
            return false;
        };

        self.claims.clear();
        for ally in allies.iter().filter(|ally| ally.agent.is_alive()) {
            self.claims.push(ally.agent.position);
            if let Some(target) = ally.step_target {
                self.claims.push(target.center());
            }
        }
        let rules = StepRules {
            grid,
            locomotion: if attacker.agent.flying {
                Locomotion::Flying
            } else {
                Locomotion::Ground
            },
            claims: &self.claims,
            personal_space: tuning.personal_space,
        };

        let mut excluded = None;
        if let Some(target) = attacker.step_target {
            if target != current && !rules.is_open(target) {
                excluded = current.direction_to(target);
                attacker.step_target = None;
            }
        }

        if attacker.step_target.is_none() {
            let reach = support_reach(attacker);
            let Some(desired) = desired_direction(attacker, current, &self.snapshot, reach) else {
                return false;
            };
            let weights =
                StepWeights::for_attacker(tuning, matches!(attacker.strategy, Strategy::Engineer));
            let confused = attacker.agent.derived.confused;
            let Some((direction, next)) =
                select_step(current, desired, excluded, confused, weights, &rules, rng)
            else {
                return false;
            };
            attacker.step_target = Some(next);
            attacker.heading = Some(direction);
        }

        let Some(target) = attacker.step_target else {
            return false;
        };
        let before = attacker.agent.position;
        let reach = attacker.agent.derived.speed * dt;
        let (position, arrived) = travel(before, target.center(), reach);
        attacker.agent.position = position;
        if arrived {
            attacker.step_target = None;
            attacker.record_arrival(target);
        }
        position != before
    }
}

fn tick_timers(attacker: &mut Attacker, dt: f32) {
    attacker.attack_timer = (attacker.attack_timer - dt).max(0.0);
    for timer in &mut attacker.ability_timers {
        *timer = (*timer - dt).max(0.0);
    }
}

fn support_reach(attacker: &Attacker) -> f32 {
    attacker
        .stats
        .abilities
        .iter()
        .filter(|data| matches!(data.kind, AbilityKind::HealAllies | AbilityKind::ShieldAllies))
        .filter_map(|data| data.resolve().ok())
        .map(|spec| spec.range)
        .fold(None, |best: Option<f32>, range| Some(best.map_or(range, |b| b.max(range))))
        .unwrap_or(DEFAULT_SUPPORT_REACH)
}
