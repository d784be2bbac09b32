#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Target acquisition, pursuit and ability execution for placed defenders.

mod abilities;
mod movement;
mod passives;
mod placement;
mod targeting;

use rampart_combat::{CombatResolver, Strike};
use rampart_core::{Attacker, AttackerId, Cohort, Defender, Hazard};
use rampart_navigation::Grid;
use rampart_spatial::{SpatialEntry, SpatialIndex};
use rampart_status_effects::StatusEffectEngine;
use rand::Rng;
use tracing::debug;

use crate::abilities::AbilityScratch;

pub use movement::SEPARATION;
pub use passives::detonate;
pub use placement::place_defender;
pub use targeting::{select_target, RETAIN_FACTOR};

/// World state a defender may read or act upon during its update.
#[derive(Debug)]
pub struct Surroundings<'a> {
    /// Tile map used for movement validation.
    pub grid: &'a Grid,
    /// Neighbour index snapshot.
    pub spatial: &'a SpatialIndex,
    /// Opposing attackers, sorted by id.
    pub attackers: &'a mut [Attacker],
    /// Placed hazards, sorted by id.
    pub hazards: &'a mut [Hazard],
    /// Shared damage pipeline.
    pub resolver: &'a mut CombatResolver,
    /// Status effect rules.
    pub effects: &'a StatusEffectEngine,
}

/// Observable outcome of one defender update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DefenderTurn {
    /// Previous and new target when the target changed.
    pub retarget: Option<(Option<AttackerId>, Option<AttackerId>)>,
    /// The basic attack fired.
    pub attacked: bool,
    /// Number of abilities fired.
    pub abilities: usize,
    /// Hit points restored by regeneration.
    pub regenerated: f32,
    /// The one-time frenzy fired this tick.
    pub frenzied: bool,
    /// The defender's position changed.
    pub moved: bool,
}

/// Stateless controller owning reusable scratch buffers.
#[derive(Debug, Default)]
pub struct DefenderController {
    nearby: Vec<SpatialEntry>,
    abilities: AbilityScratch,
}

impl DefenderController {
    /// Creates a controller with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one update for `defender`.
    ///
    /// `allies` holds every other defender; the ones before it in list order
    /// were already updated this tick. Damage dealt is appended to `strikes`.
    pub fn update<R>(
        &mut self,
        defender: &mut Defender,
        allies: &mut Cohort<'_, Defender>,
        field: &mut Surroundings<'_>,
        dt: f32,
        rng: &mut R,
        strikes: &mut Vec<Strike>,
    ) -> DefenderTurn
    where
        R: Rng + ?Sized,
    {
        let mut turn = DefenderTurn::default();
        if !defender.agent.is_alive() {
            return turn;
        }
        tick_timers(defender, dt);

        let passive = passives::run_passives(defender, field.effects, dt);
        turn.regenerated = passive.regenerated;
        turn.frenzied = passive.frenzied;
        if defender.agent.derived.stunned {
            return turn;
        }

        self.nearby.clear();
        field.spatial.query_circle(
            defender.agent.position,
            defender.stats.engagement_range.max(0.0),
            &mut self.nearby,
        );
        let target = select_target(defender, field.attackers, &self.nearby);
        if target != defender.target {
            debug!(
                defender = defender.id.get(),
                from = ?defender.target,
                to = ?target,
                "target changed"
            );
            turn.retarget = Some((defender.target, target));
            defender.target = target;
            if target.is_some() {
                defender.patrol_target = None;
            }
        }

        turn.abilities = self.abilities.run(defender, allies, field, rng, strikes);
        turn.attacked = abilities::attack(defender, field, rng, strikes);
        turn.moved = movement::advance(defender, allies, field.attackers, field.grid, dt, rng);
        turn
    }
}

fn tick_timers(defender: &mut Defender, dt: f32) {
    defender.attack_timer = (defender.attack_timer - dt).max(0.0);
    for timer in &mut defender.ability_timers {
        *timer = (*timer - dt).max(0.0);
    }
}
