//! Tunable simulation parameters.
//!
//! Every section implements [`Default`] and is marked `#[serde(default)]`, so a
//! TOML file only needs to name the values it overrides.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, StatusKind, StatusTemplate};

/// Top-level configuration injected into the world at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the world's random number generator.
    pub seed: u64,
    /// Upper bound on a single tick's delta time, in seconds.
    pub max_tick_seconds: f32,
    /// Entities a quadtree node holds before it subdivides.
    pub spatial_node_capacity: usize,
    /// Maximum quadtree depth.
    pub spatial_max_depth: u8,
    /// Number of damage records retained for diagnostics.
    pub damage_log_capacity: usize,
    /// Damage pipeline constants.
    pub combat: CombatTuning,
    /// Hazard danger score constants.
    pub danger: DangerTuning,
    /// Controller weights and timers.
    pub behavior: BehaviorTuning,
    /// Status-effect engine constants.
    pub effects: EffectTuning,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_cafe,
            max_tick_seconds: 0.25,
            spatial_node_capacity: 8,
            spatial_max_depth: 8,
            damage_log_capacity: 256,
            combat: CombatTuning::default(),
            danger: DangerTuning::default(),
            behavior: BehaviorTuning::default(),
            effects: EffectTuning::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_tick_seconds.is_finite() && self.max_tick_seconds > 0.0) {
            return Err(ConfigError::Invalid("max_tick_seconds must be positive"));
        }
        if self.spatial_node_capacity == 0 {
            return Err(ConfigError::Invalid("spatial_node_capacity must be non-zero"));
        }
        if self.damage_log_capacity == 0 {
            return Err(ConfigError::Invalid("damage_log_capacity must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.combat.crit_chance) {
            return Err(ConfigError::Invalid("combat.crit_chance must lie in [0, 1]"));
        }
        if self.combat.crit_multiplier < 1.0 {
            return Err(ConfigError::Invalid("combat.crit_multiplier must be at least 1"));
        }
        if self.danger.instant_scale <= 0.0 || self.danger.dot_scale <= 0.0 {
            return Err(ConfigError::Invalid("danger scales must be positive"));
        }
        if self.danger.min_cooldown <= 0.0 || self.danger.reference_cooldown <= 0.0 {
            return Err(ConfigError::Invalid("danger cooldowns must be positive"));
        }
        if self.effects.bleed_stack_cap == 0 {
            return Err(ConfigError::Invalid("effects.bleed_stack_cap must be non-zero"));
        }
        if self.behavior.intent_interval <= 0.0 {
            return Err(ConfigError::Invalid("behavior.intent_interval must be positive"));
        }
        let behavior = &self.behavior;
        let amplitudes = [
            behavior.noise,
            behavior.bias_amplitude,
            behavior.action_bias_amplitude,
            behavior.action_jitter,
        ];
        if !amplitudes.iter().all(|amplitude| is_amplitude(*amplitude)) {
            return Err(ConfigError::Invalid(
                "behavior noise, bias and jitter amplitudes must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Random draws span `-amplitude..=amplitude`, which needs a finite bound.
pub(crate) fn is_amplitude(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

/// Constants of the damage pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Probability that a hit is critical.
    pub crit_chance: f32,
    /// Multiplier applied to critical hits.
    pub crit_multiplier: f32,
    /// Multiplier consumed from shatter-vulnerable targets.
    pub shatter_multiplier: f32,
    /// Multiplier applied to burn ticks while oiled.
    pub burn_oiled_multiplier: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            crit_chance: 0.1,
            crit_multiplier: 1.5,
            shatter_multiplier: 1.3,
            burn_oiled_multiplier: 2.0,
        }
    }
}

/// Constants of the hazard danger score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DangerTuning {
    /// Divisor applied to instant damage.
    pub instant_scale: f32,
    /// Divisor applied to total damage over time.
    pub dot_scale: f32,
    /// Flat contribution of a non-damaging status payload.
    pub status_weight: f32,
    /// Cooldown at which the amplification factor equals one.
    pub reference_cooldown: f32,
    /// Lower clamp on the cooldown before amplification.
    pub min_cooldown: f32,
    /// Upper bound on the danger score.
    pub cap: f32,
}

impl Default for DangerTuning {
    fn default() -> Self {
        Self {
            instant_scale: 10.0,
            dot_scale: 20.0,
            status_weight: 0.5,
            reference_cooldown: 1.0,
            min_cooldown: 0.25,
            cap: 10.0,
        }
    }
}

/// Controller weights and timers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Seconds between intent re-evaluations.
    pub intent_interval: f32,
    /// Bonus granted to the currently active intent.
    pub sticky_bonus: f32,
    /// Amplitude of the per-evaluation intent noise.
    pub noise: f32,
    /// Amplitude of the per-agent intent bias rolled at spawn.
    pub bias_amplitude: f32,
    /// Amplitude of the per-agent action bias rolled at spawn.
    pub action_bias_amplitude: f32,
    /// Amplitude of the per-evaluation action jitter.
    pub action_jitter: f32,
    /// Health ratio below which an ally counts as critical.
    pub critical_ally_ratio: f32,
    /// Health ratio below which an ally counts as injured.
    pub injured_ally_ratio: f32,
    /// Aggregate nearby danger that forces trap pressure for disarmers.
    pub high_danger_threshold: f32,
    /// Weight of unexplored path toward advance.
    pub advance_bonus: f32,
    /// Weight per nearby defender toward hunt.
    pub hunt_bonus: f32,
    /// Weight per point of nearby danger toward pressure_traps.
    pub trap_bonus: f32,
    /// Weight per injured ally toward support.
    pub support_bonus: f32,
    /// Weight of missing health toward regroup.
    pub regroup_bonus: f32,
    /// Random-walk weight of the forward direction.
    pub forward_weight: f32,
    /// Random-walk weight of each lateral direction.
    pub lateral_weight: f32,
    /// Random-walk weight of the backward direction.
    pub backward_weight: f32,
    /// Lateral weight used by wandering engineers.
    pub engineer_lateral_weight: f32,
    /// Minimum distance between two attackers' step targets, in tiles.
    pub personal_space: f32,
    /// Seconds between aura-caster pulses.
    pub aura_interval: f32,
    /// Radius of an aura-caster pulse.
    pub aura_radius: f32,
    /// Buff granted in place of a cleansed debuff.
    pub aura_buff: StatusTemplate,
    /// Structural damage per second an engineer deals while pressuring a hazard.
    pub engineer_disarm_rate: f32,
    /// Boss enrage buffs fire once below this health ratio.
    pub enrage_threshold: f32,
    /// Speed buff granted by the enrage.
    pub enrage_haste: StatusTemplate,
    /// Damage buff granted by the enrage.
    pub enrage_empower: StatusTemplate,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            intent_interval: 1.0,
            sticky_bonus: 0.25,
            noise: 0.15,
            bias_amplitude: 0.2,
            action_bias_amplitude: 0.1,
            action_jitter: 0.05,
            critical_ally_ratio: 0.3,
            injured_ally_ratio: 0.75,
            high_danger_threshold: 6.0,
            advance_bonus: 0.8,
            hunt_bonus: 0.4,
            trap_bonus: 0.15,
            support_bonus: 0.35,
            regroup_bonus: 1.0,
            forward_weight: 6.0,
            lateral_weight: 1.0,
            backward_weight: 0.2,
            engineer_lateral_weight: 2.5,
            personal_space: 0.45,
            aura_interval: 4.0,
            aura_radius: 3.0,
            aura_buff: StatusTemplate::new(StatusKind::Haste, 2.0, 1.25),
            engineer_disarm_rate: 6.0,
            enrage_threshold: 0.5,
            enrage_haste: StatusTemplate::new(StatusKind::Haste, 6.0, 1.5),
            enrage_empower: StatusTemplate::new(StatusKind::Empower, 6.0, 1.5),
        }
    }
}

/// Status-effect engine constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTuning {
    /// Maximum bleed stacks.
    pub bleed_stack_cap: u8,
    /// Duration of the freeze produced by enough chill.
    pub freeze_duration: f32,
    /// Remaining durations at or below this value count as expired.
    pub expiry_epsilon: f32,
    /// Fire vulnerability while oiled.
    pub oiled_fire_vulnerability: f32,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            bleed_stack_cap: 3,
            freeze_duration: 1.5,
            expiry_epsilon: 1e-4,
            oiled_fire_vulnerability: 1.5,
        }
    }
}
