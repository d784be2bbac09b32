//! Shared state of every living unit: vitals, derived per-tick values and
//! the status-effect collection.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{DamageType, StatusEffect, StatusKind};

/// One-time chance to survive a lethal hit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviveRule {
    /// Probability in `[0, 1]` that the revive triggers.
    pub chance: f32,
    /// Fraction of maximum hit points restored on success.
    pub restore_fraction: f32,
}

/// Per-type damage resistances; absent entries mean no resistance.
///
/// Serialised as a list of `{ damage_type, fraction }` records so TOML
/// tables stay free of enum-keyed maps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Resistance>", into = "Vec<Resistance>")]
pub struct Resistances(BTreeMap<DamageType, f32>);

/// Single resistance entry as it appears in data files.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resistance {
    /// Damage category being resisted.
    pub damage_type: DamageType,
    /// Fraction of the damage removed.
    pub fraction: f32,
}

impl From<Vec<Resistance>> for Resistances {
    fn from(entries: Vec<Resistance>) -> Self {
        Self::from_pairs(
            entries
                .into_iter()
                .map(|entry| (entry.damage_type, entry.fraction)),
        )
    }
}

impl From<Resistances> for Vec<Resistance> {
    fn from(resistances: Resistances) -> Self {
        resistances
            .0
            .into_iter()
            .map(|(damage_type, fraction)| Resistance {
                damage_type,
                fraction,
            })
            .collect()
    }
}

impl Resistances {
    /// Creates a resistance table from `(type, fraction)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (DamageType, f32)>) -> Self {
        Self(pairs.into_iter().collect())
    }

    /// Resistance fraction for the provided damage type, if one exists.
    #[must_use]
    pub fn get(&self, damage_type: DamageType) -> Option<f32> {
        self.0.get(&damage_type).copied()
    }
}

/// Values recomputed from scratch every tick by the status-effect engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedState {
    /// Movement speed in tiles per second after modifiers.
    pub speed: f32,
    /// Set while a stun-like effect is active.
    pub stunned: bool,
    /// Set while a confuse effect is active.
    pub confused: bool,
    /// Multiplier applied to incoming fire damage.
    pub fire_vulnerability: f32,
    /// Multiplier applied to outgoing damage by buffs.
    pub damage_multiplier: f32,
}

impl DerivedState {
    /// Baseline derived state for an agent moving at `speed`.
    #[must_use]
    pub const fn baseline(speed: f32) -> Self {
        Self {
            speed,
            stunned: false,
            confused: false,
            fire_vulnerability: 1.0,
            damage_multiplier: 1.0,
        }
    }
}

/// Result of delivering damage to an agent's intake.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Intake {
    /// Damage soaked by the barrier.
    pub absorbed: f32,
    /// Hit points actually removed.
    pub hp_lost: f32,
    /// The agent transitioned to dead.
    pub killed: bool,
    /// A revive rule fired and kept the agent alive.
    pub revived: bool,
}

/// Base state shared by attackers and defenders.
#[derive(Clone, Debug)]
pub struct Agent {
    /// Continuous position in tile units.
    pub position: Vec2,
    /// Movement speed before status modifiers, in tiles per second.
    pub base_speed: f32,
    /// Flying agents ignore ground hazards and ground-only targeting.
    pub flying: bool,
    /// Per-tick derived values; never persisted across ticks.
    pub derived: DerivedState,
    /// Ordered status-effect collection.
    pub effects: Vec<StatusEffect>,
    /// Incoming damage resistances.
    pub resistances: Resistances,
    /// Cumulative outgoing damage modifier owned by the agent.
    pub damage_bonus: f32,
    /// Accumulated chill applications toward a freeze.
    pub ice_stacks: u32,
    /// Chill applications required to freeze; zero means the agent never freezes.
    pub freeze_threshold: u32,
    /// Set by a freeze; consumed by the next hit for bonus damage.
    pub shatter_vulnerable: bool,
    /// One-time revive rule, consumed the first time hp would drop to zero.
    pub revive: Option<ReviveRule>,
    hp: f32,
    max_hp: f32,
    barrier: f32,
    alive: bool,
}

impl Agent {
    /// Creates a healthy agent at full hit points.
    ///
    /// A non-positive or non-finite `max_hp` is raised to one so the
    /// `max_hp > 0` invariant always holds.
    #[must_use]
    pub fn new(position: Vec2, max_hp: f32, base_speed: f32) -> Self {
        let max_hp = if max_hp.is_finite() && max_hp > 0.0 {
            max_hp
        } else {
            1.0
        };
        let base_speed = if base_speed.is_finite() {
            base_speed.max(0.0)
        } else {
            0.0
        };
        Self {
            position,
            base_speed,
            flying: false,
            derived: DerivedState::baseline(base_speed),
            effects: Vec::new(),
            resistances: Resistances::default(),
            damage_bonus: 1.0,
            ice_stacks: 0,
            freeze_threshold: 0,
            shatter_vulnerable: false,
            revive: None,
            hp: max_hp,
            max_hp,
            barrier: 0.0,
            alive: true,
        }
    }

    /// Current hit points, always within `[0, max_hp]`.
    #[must_use]
    pub fn hp(&self) -> f32 {
        self.hp
    }

    /// Maximum hit points, always positive.
    #[must_use]
    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Current barrier, never negative.
    #[must_use]
    pub fn barrier(&self) -> f32 {
        self.barrier
    }

    /// Fraction of maximum hit points remaining.
    #[must_use]
    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0.0 {
            return 0.0;
        }
        (self.hp / self.max_hp).clamp(0.0, 1.0)
    }

    /// Reports whether the agent is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Reports whether the agent has lost any hit points.
    #[must_use]
    pub fn is_injured(&self) -> bool {
        self.alive && self.hp < self.max_hp
    }

    /// Outgoing damage multiplier combining owned bonus and active buffs.
    #[must_use]
    pub fn outgoing_multiplier(&self) -> f32 {
        (self.damage_bonus * self.derived.damage_multiplier).max(0.0)
    }

    /// Reports whether an effect of the given family is active.
    #[must_use]
    pub fn has_effect(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|effect| effect.kind == kind)
    }

    /// Borrowed view of the active effect of the given family.
    #[must_use]
    pub fn effect(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|effect| effect.kind == kind)
    }

    /// Rescales maximum hit points, keeping the current ratio.
    pub fn rescale_max_hp(&mut self, max_hp: f32) {
        if !max_hp.is_finite() || max_hp <= 0.0 {
            return;
        }
        let ratio = self.hp_ratio();
        self.max_hp = max_hp;
        self.hp = (max_hp * ratio).clamp(0.0, max_hp);
    }

    /// Restores hit points up to the maximum and returns the amount healed.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.alive || !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.hp;
        self.hp = (self.hp + amount).min(self.max_hp);
        self.hp - before
    }

    /// Replaces the barrier, clamping at zero.
    pub fn set_barrier(&mut self, barrier: f32) {
        self.barrier = if barrier.is_finite() {
            barrier.max(0.0)
        } else {
            0.0
        };
    }

    /// Raises the barrier to at least `barrier`.
    pub fn grant_barrier(&mut self, barrier: f32) {
        if barrier.is_finite() && barrier > self.barrier {
            self.barrier = barrier;
        }
    }

    /// Marks the agent dead without passing through the intake.
    pub fn kill(&mut self) {
        self.hp = 0.0;
        self.alive = false;
    }

    /// Resets per-tick derived values to their baseline.
    pub fn reset_derived(&mut self) {
        self.derived = DerivedState::baseline(self.base_speed);
    }

    /// Delivers damage: barrier first, then hit points, then the revive check.
    pub fn take_damage<R>(&mut self, amount: f32, rng: &mut R) -> Intake
    where
        R: Rng + ?Sized,
    {
        let mut intake = Intake::default();
        if !self.alive || !amount.is_finite() || amount <= 0.0 {
            return intake;
        }

        intake.absorbed = self.barrier.min(amount);
        self.barrier -= intake.absorbed;
        let excess = amount - intake.absorbed;
        if excess <= 0.0 {
            return intake;
        }

        intake.hp_lost = excess.min(self.hp);
        self.hp = (self.hp - excess).max(0.0);
        if self.hp > 0.0 {
            return intake;
        }

        if let Some(rule) = self.revive.take() {
            if rng.gen::<f32>() < rule.chance {
                let floor = self.max_hp.min(1.0);
                self.hp = (self.max_hp * rule.restore_fraction).clamp(floor, self.max_hp);
                intake.revived = true;
                return intake;
            }
        }

        self.kill();
        intake.killed = true;
        intake
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn agent(max_hp: f32) -> Agent {
        Agent::new(Vec2::ZERO, max_hp, 1.0)
    }

    #[test]
    fn barrier_soaks_damage_before_hp() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut unit = agent(50.0);
        unit.set_barrier(10.0);

        let intake = unit.take_damage(25.0, &mut rng);

        assert_eq!(intake.absorbed, 10.0);
        assert_eq!(intake.hp_lost, 15.0);
        assert_eq!(unit.barrier(), 0.0);
        assert_eq!(unit.hp(), 35.0);
    }

    #[test]
    fn overkill_clamps_hp_at_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut unit = agent(10.0);

        let intake = unit.take_damage(500.0, &mut rng);

        assert!(intake.killed);
        assert_eq!(unit.hp(), 0.0);
        assert!(!unit.is_alive());
    }

    #[test]
    fn guaranteed_revive_fires_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut unit = agent(40.0);
        unit.revive = Some(ReviveRule {
            chance: 1.0,
            restore_fraction: 0.5,
        });

        let first = unit.take_damage(100.0, &mut rng);
        assert!(first.revived);
        assert_eq!(unit.hp(), 20.0);
        assert!(unit.revive.is_none());

        let second = unit.take_damage(100.0, &mut rng);
        assert!(second.killed);
    }

    #[test]
    fn zero_chance_revive_is_still_consumed() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut unit = agent(5.0);
        unit.revive = Some(ReviveRule {
            chance: 0.0,
            restore_fraction: 1.0,
        });

        assert!(unit.take_damage(10.0, &mut rng).killed);
        assert!(unit.revive.is_none());
    }

    #[test]
    fn heal_never_exceeds_maximum() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut unit = agent(30.0);
        let _ = unit.take_damage(10.0, &mut rng);

        assert_eq!(unit.heal(25.0), 10.0);
        assert_eq!(unit.hp(), 30.0);
    }

    #[test]
    fn invalid_max_hp_is_raised() {
        let unit = agent(0.0);
        assert_eq!(unit.max_hp(), 1.0);
        assert_eq!(unit.hp_ratio(), 1.0);
    }
}
