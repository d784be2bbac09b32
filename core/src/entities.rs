//! Owned entity records stored in the world's lists.
//!
//! Every entity carries an owned copy of the stats it was created from, so
//! nothing refers back into the species table after spawn.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{
    AbilityData, AbilityKind, Agent, Archetype, AttackProfile, AttackerBehavior, AttackerId,
    DamageType, DefenderExtension, DefenderId, Direction, HazardId, Intent, IntentWeights,
    Locomotion, LowHpBonus, PassiveSpec, SpeciesId, StatusTemplate, TargetFilter, TileCoord,
};

/// Where an attacker's current path came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSource {
    /// Supplied by the spawn request and kept as-is.
    Provided,
    /// Produced by a successful search.
    Planned,
    /// Reused last-known default path after a failed search.
    Fallback,
    /// Degenerate single-tile path; the attacker holds position.
    Stationary,
}

impl PathSource {
    /// Reports whether the path should be recomputed when the cost map changes.
    #[must_use]
    pub const fn is_replannable(self) -> bool {
        !matches!(self, Self::Provided)
    }
}

/// Persistent per-attacker preference added to action scores.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActionBias {
    /// Bias applied to the basic attack.
    pub attack: f32,
    /// Bias per ability kind, indexed by [`AbilityKind::index`].
    pub abilities: [f32; AbilityKind::COUNT],
}

impl ActionBias {
    /// Bias for the provided ability, or for the basic attack when `None`.
    #[must_use]
    pub fn get(&self, ability: Option<AbilityKind>) -> f32 {
        match ability {
            Some(kind) => self.abilities[kind.index()],
            None => self.attack,
        }
    }
}

/// Runtime state of the species strategy chosen at spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    /// No species-specific behaviour.
    Standard,
    /// Hazard-dismantling wanderer.
    Engineer,
    /// Periodic debuff-to-haste converter.
    AuraCaster {
        /// Seconds until the next aura pulse.
        pulse_timer: f32,
    },
    /// Wave leader.
    Boss {
        /// Set once the one-time enrage has fired.
        enraged: bool,
    },
}

impl Strategy {
    /// Initial state for a behaviour tag.
    #[must_use]
    pub const fn for_behavior(behavior: AttackerBehavior) -> Self {
        match behavior {
            AttackerBehavior::Standard => Self::Standard,
            AttackerBehavior::Engineer => Self::Engineer,
            AttackerBehavior::AuraCaster => Self::AuraCaster { pulse_timer: 0.0 },
            AttackerBehavior::Boss => Self::Boss { enraged: false },
        }
    }

    /// Bosses are exempt from the forced regroup.
    #[must_use]
    pub const fn is_boss(&self) -> bool {
        matches!(self, Self::Boss { .. })
    }
}

/// Stats copied out of the species record when an attacker spawns.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackerStats {
    /// Intent weight archetype.
    pub archetype: Archetype,
    /// Radius of the controller's world snapshot.
    pub detection_radius: f32,
    /// Health ratio below which a non-boss must regroup.
    pub regroup_threshold: f32,
    /// Basic attack after level scaling.
    pub attack: Option<AttackProfile>,
    /// Raw ability records after level scaling.
    pub abilities: Vec<AbilityData>,
    /// Reward granted on death.
    pub reward: u32,
    /// Damage dealt to the player on reaching the goal.
    pub leak_damage: u32,
}

/// Agent advancing along a path toward the goal.
#[derive(Clone, Debug)]
pub struct Attacker {
    /// Identifier allocated by the world.
    pub id: AttackerId,
    /// Species the attacker was spawned from.
    pub species: SpeciesId,
    /// Spawn level.
    pub level: u32,
    /// Shared agent state.
    pub agent: Agent,
    /// Owned stat block.
    pub stats: AttackerStats,
    /// Species strategy state.
    pub strategy: Strategy,
    /// Ordered waypoints from spawn to goal.
    pub path: Vec<TileCoord>,
    /// Index of the last waypoint reached.
    pub path_index: usize,
    /// Origin of the current path.
    pub path_source: PathSource,
    /// Destination tile.
    pub goal: TileCoord,
    /// Current high-level behaviour.
    pub intent: Intent,
    /// Seconds until the intent is re-evaluated.
    pub intent_timer: f32,
    /// Per-intent bias rolled once at spawn.
    pub personality: IntentWeights,
    /// Per-action bias rolled once at spawn.
    pub action_bias: ActionBias,
    /// Seconds until the basic attack is ready.
    pub attack_timer: f32,
    /// Seconds until each ability is ready, parallel to `stats.abilities`.
    pub ability_timers: Vec<f32>,
    /// Tile currently being walked toward.
    pub step_target: Option<TileCoord>,
    /// Direction of the last step taken.
    pub heading: Option<Direction>,
    /// Set once the attacker stands on its goal.
    pub reached_goal: bool,
}

impl Attacker {
    /// Tile under the attacker's position.
    #[must_use]
    pub fn tile(&self) -> Option<TileCoord> {
        TileCoord::containing(self.agent.position)
    }

    /// Fraction of the path already walked, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.path.len() <= 1 {
            return 1.0;
        }
        let last = (self.path.len() - 1) as f32;
        (self.path_index as f32 / last).clamp(0.0, 1.0)
    }

    /// Next waypoint after the last one reached, if any remain.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<TileCoord> {
        self.path.get(self.path_index + 1).copied()
    }

    /// Replaces the path, restarting progress at the first waypoint.
    pub fn assign_path(&mut self, path: Vec<TileCoord>, source: PathSource) {
        self.path = path;
        self.path_index = 0;
        self.path_source = source;
    }

    /// Advances `path_index` when `tile` matches a waypoint a few steps ahead.
    pub fn record_arrival(&mut self, tile: TileCoord) {
        const LOOKAHEAD: usize = 4;
        let end = (self.path_index + LOOKAHEAD).min(self.path.len().saturating_sub(1));
        for index in (self.path_index..=end).rev() {
            if self.path.get(index) == Some(&tile) {
                self.path_index = index;
                break;
            }
        }
        if tile == self.goal {
            self.reached_goal = true;
        }
    }
}

/// Stats copied out of the species record when a defender is placed.
#[derive(Clone, Debug, PartialEq)]
pub struct DefenderStats {
    /// Radius within which targets are acquired.
    pub engagement_range: f32,
    /// Target priority filter.
    pub targeting: TargetFilter,
    /// Basic attack.
    pub attack: AttackProfile,
    /// Conditional low-health damage bonus.
    pub low_hp_bonus: Option<LowHpBonus>,
    /// Raw ability records.
    pub abilities: Vec<AbilityData>,
    /// Always-on passives.
    pub passives: Vec<PassiveSpec>,
    /// Terrain class.
    pub locomotion: Locomotion,
    /// Maximum pursuit distance from home.
    pub leash_radius: Option<f32>,
    /// Optional movement extension.
    pub extension: Option<DefenderExtension>,
}

/// Per-passive runtime state, parallel to `DefenderStats::passives`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PassiveState {
    /// Seconds accumulated toward the next periodic pulse.
    pub elapsed: f32,
    /// Set once a one-time passive has fired.
    pub spent: bool,
}

/// Placed agent that resists attackers.
#[derive(Clone, Debug)]
pub struct Defender {
    /// Identifier allocated by the world.
    pub id: DefenderId,
    /// Species the defender was placed from.
    pub species: SpeciesId,
    /// Shared agent state.
    pub agent: Agent,
    /// Owned stat block.
    pub stats: DefenderStats,
    /// Placement position; anchor for leash and patrol.
    pub home: Vec2,
    /// Weak reference to the current target.
    pub target: Option<AttackerId>,
    /// Seconds until the basic attack is ready.
    pub attack_timer: f32,
    /// Seconds until each ability is ready, parallel to `stats.abilities`.
    pub ability_timers: Vec<f32>,
    /// Passive runtime state, parallel to `stats.passives`.
    pub passive_state: Vec<PassiveState>,
    /// Current patrol waypoint while idle.
    pub patrol_target: Option<Vec2>,
}

impl Defender {
    /// Tile under the defender's position.
    #[must_use]
    pub fn tile(&self) -> Option<TileCoord> {
        TileCoord::containing(self.agent.position)
    }
}

/// Visual family of a hazard; the behaviour lives in [`HazardSpec`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    /// Physical spikes.
    Spikes,
    /// Burning pit.
    FirePit,
    /// Slick that oils whoever crosses it.
    OilSlick,
    /// Chilling trap.
    FrostTrap,
    /// Toxic vent.
    PoisonVent,
    /// Automated dart launcher.
    DartTrap,
}

/// Effect descriptor of a hazard.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardSpec {
    /// Visual family.
    pub kind: HazardKind,
    /// Structural hit points.
    pub max_hp: f32,
    /// Trigger radius in tiles around the tile center.
    pub radius: f32,
    /// Seconds between triggers.
    pub cooldown: f32,
    /// Damage dealt on each trigger.
    #[serde(default)]
    pub instant_damage: f32,
    /// Category of the instant damage.
    pub damage_type: DamageType,
    /// Damage-over-time payload; magnitude is damage per second.
    #[serde(default)]
    pub dot: Option<StatusTemplate>,
    /// Non-damaging status payload.
    #[serde(default)]
    pub status: Option<StatusTemplate>,
    /// Ground hazards cannot touch flying attackers.
    #[serde(default = "default_ground_only")]
    pub ground_only: bool,
}

fn default_ground_only() -> bool {
    true
}

impl HazardSpec {
    /// Total damage a single DoT application deals over its duration.
    #[must_use]
    pub fn dot_total(&self) -> f32 {
        self.dot
            .map(|dot| (dot.magnitude * dot.duration).max(0.0))
            .unwrap_or(0.0)
    }

    /// Reports whether the hazard can affect a unit with the given flying flag.
    #[must_use]
    pub const fn affects(&self, flying: bool) -> bool {
        !(self.ground_only && flying)
    }
}

/// Static grid-bound damage or utility source.
#[derive(Clone, Debug, PartialEq)]
pub struct Hazard {
    /// Identifier allocated by the world.
    pub id: HazardId,
    /// Tile the hazard occupies.
    pub tile: TileCoord,
    /// Effect descriptor.
    pub spec: HazardSpec,
    /// Seconds until the hazard can trigger again.
    pub cooldown_timer: f32,
    /// Cached danger score used by the cost map.
    pub danger: f32,
    hp: f32,
}

impl Hazard {
    /// Creates an intact hazard on `tile`.
    #[must_use]
    pub fn new(id: HazardId, tile: TileCoord, spec: HazardSpec) -> Self {
        let hp = if spec.max_hp.is_finite() && spec.max_hp > 0.0 {
            spec.max_hp
        } else {
            1.0
        };
        Self {
            id,
            tile,
            spec,
            cooldown_timer: 0.0,
            danger: 0.0,
            hp,
        }
    }

    /// Center of the hazard's tile.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.tile.center()
    }

    /// Remaining structural hit points.
    #[must_use]
    pub fn hp(&self) -> f32 {
        self.hp
    }

    /// Maximum structural hit points.
    #[must_use]
    pub fn max_hp(&self) -> f32 {
        self.spec.max_hp.max(1.0)
    }

    /// Destroyed hazards stay in the list until the removal pass.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0.0
    }

    /// Reports whether the hazard has lost structural hit points.
    #[must_use]
    pub fn is_damaged(&self) -> bool {
        !self.is_destroyed() && self.hp < self.max_hp()
    }

    /// Removes structural hit points and returns the amount actually lost.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if self.is_destroyed() || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let lost = amount.min(self.hp);
        self.hp -= lost;
        lost
    }

    /// Restores structural hit points and returns the amount repaired.
    pub fn repair(&mut self, amount: f32) -> f32 {
        if self.is_destroyed() || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp());
        self.hp - before
    }
}
