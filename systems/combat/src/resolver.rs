//! The single damage pipeline shared by hazards, defenders and attackers.

use rampart_core::{Agent, CombatTuning, DamageType, EntityRef, Hazard, Intake};
use rand::Rng;
use tracing::trace;

use crate::{DamageLog, DamageRecord};

/// Anything the resolver can deliver damage to.
pub trait Damageable {
    /// Reports whether the target can still take damage.
    fn is_alive(&self) -> bool;

    /// Resistance fraction against `damage_type`, if one is defined.
    fn resistance(&self, damage_type: DamageType) -> Option<f32>;

    /// Multiplier applied to incoming fire damage.
    fn fire_vulnerability(&self) -> f32;

    /// Reports whether the next hit gets the shatter bonus.
    fn is_shatter_vulnerable(&self) -> bool;

    /// Clears the shatter flag.
    fn consume_shatter(&mut self);

    /// Delivers the final amount to the target's intake.
    fn receive<R>(&mut self, amount: f32, rng: &mut R) -> Intake
    where
        R: Rng + ?Sized;
}

impl Damageable for Agent {
    fn is_alive(&self) -> bool {
        Agent::is_alive(self)
    }

    fn resistance(&self, damage_type: DamageType) -> Option<f32> {
        self.resistances.get(damage_type)
    }

    fn fire_vulnerability(&self) -> f32 {
        self.derived.fire_vulnerability
    }

    fn is_shatter_vulnerable(&self) -> bool {
        self.shatter_vulnerable
    }

    fn consume_shatter(&mut self) {
        self.shatter_vulnerable = false;
    }

    fn receive<R>(&mut self, amount: f32, rng: &mut R) -> Intake
    where
        R: Rng + ?Sized,
    {
        self.take_damage(amount, rng)
    }
}

impl Damageable for Hazard {
    fn is_alive(&self) -> bool {
        !self.is_destroyed()
    }

    fn resistance(&self, _damage_type: DamageType) -> Option<f32> {
        None
    }

    fn fire_vulnerability(&self) -> f32 {
        1.0
    }

    fn is_shatter_vulnerable(&self) -> bool {
        false
    }

    fn consume_shatter(&mut self) {}

    fn receive<R>(&mut self, amount: f32, _rng: &mut R) -> Intake
    where
        R: Rng + ?Sized,
    {
        let hp_lost = self.take_damage(amount);
        Intake {
            absorbed: 0.0,
            hp_lost,
            killed: hp_lost > 0.0 && self.is_destroyed(),
            revived: false,
        }
    }
}

/// A hit about to enter the pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Damage before any modifier.
    pub base: f32,
    /// Category of the damage.
    pub damage_type: DamageType,
    /// Entity dealing the damage.
    pub source: Option<EntityRef>,
    /// Attacker's cumulative damage modifier, if the source is an agent.
    pub bonus: Option<f32>,
}

impl Hit {
    /// Hit without a source or modifier.
    #[must_use]
    pub const fn raw(base: f32, damage_type: DamageType) -> Self {
        Self {
            base,
            damage_type,
            source: None,
            bonus: None,
        }
    }

    /// Hit dealt by an agent, carrying its outgoing multiplier.
    #[must_use]
    pub fn from_agent(
        base: f32,
        damage_type: DamageType,
        source: EntityRef,
        agent: &Agent,
    ) -> Self {
        Self {
            base,
            damage_type,
            source: Some(source),
            bonus: Some(agent.outgoing_multiplier()),
        }
    }

    /// Hit dealt by a non-agent source such as a hazard.
    #[must_use]
    pub const fn from_source(base: f32, damage_type: DamageType, source: EntityRef) -> Self {
        Self {
            base,
            damage_type,
            source: Some(source),
            bonus: None,
        }
    }
}

/// Result of resolving a hit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Resolution {
    /// Damage delivered to the intake after every modifier.
    pub applied: f32,
    /// The crit roll succeeded.
    pub critical: bool,
    /// What the intake did with it.
    pub intake: Intake,
}

/// A resolved hit as reported back to the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strike {
    /// Entity that dealt the damage, if known.
    pub source: Option<EntityRef>,
    /// Entity that received the damage.
    pub target: EntityRef,
    /// Category of the damage.
    pub damage_type: DamageType,
    /// Pipeline outcome.
    pub resolution: Resolution,
}

/// Damage pipeline with its diagnostic ring buffer.
///
/// Order of operations: attacker bonus, resistance, conditional multipliers
/// (oiled fire, then shatter, which is consumed), crit roll, clamp at zero,
/// and finally the target's intake.
#[derive(Clone, Debug)]
pub struct CombatResolver {
    tuning: CombatTuning,
    log: DamageLog,
    tick: u64,
}

impl CombatResolver {
    /// Creates a resolver keeping `log_capacity` damage records.
    #[must_use]
    pub fn new(tuning: CombatTuning, log_capacity: usize) -> Self {
        Self {
            tuning,
            log: DamageLog::new(log_capacity),
            tick: 0,
        }
    }

    /// Pipeline constants.
    #[must_use]
    pub const fn tuning(&self) -> &CombatTuning {
        &self.tuning
    }

    /// Diagnostic record of recent hits.
    #[must_use]
    pub const fn log(&self) -> &DamageLog {
        &self.log
    }

    /// Stamps subsequent records with `tick`.
    pub fn begin_tick(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Damage after steps one to three, without rolling or consuming anything.
    #[must_use]
    pub fn modified_damage<T>(&self, hit: &Hit, target: &T) -> f32
    where
        T: Damageable + ?Sized,
    {
        let mut damage = hit.base;
        if let Some(bonus) = hit.bonus {
            damage *= bonus;
        }
        if let Some(resistance) = target.resistance(hit.damage_type) {
            damage *= 1.0 - resistance;
        }
        if hit.damage_type == DamageType::Fire {
            damage *= target.fire_vulnerability().max(0.0);
        }
        if target.is_shatter_vulnerable() {
            damage *= self.tuning.shatter_multiplier;
        }
        damage
    }

    /// Runs the full pipeline against `target` and records the hit.
    pub fn resolve<T, R>(
        &mut self,
        hit: &Hit,
        target_ref: EntityRef,
        target: &mut T,
        rng: &mut R,
    ) -> Resolution
    where
        T: Damageable + ?Sized,
        R: Rng + ?Sized,
    {
        if !target.is_alive() {
            return Resolution::default();
        }

        let mut damage = self.modified_damage(hit, target);
        if target.is_shatter_vulnerable() {
            target.consume_shatter();
        }

        let critical = rng.gen::<f32>() < self.tuning.crit_chance;
        if critical {
            damage *= self.tuning.crit_multiplier;
        }
        let applied = if damage.is_finite() { damage.max(0.0) } else { 0.0 };

        let intake = target.receive(applied, rng);
        let record = DamageRecord {
            tick: self.tick,
            source: hit.source,
            target: target_ref,
            damage_type: hit.damage_type,
            base: hit.base,
            applied,
            critical,
            killed: intake.killed,
        };
        trace!(?record, "damage resolved");
        self.log.push(record);

        Resolution {
            applied,
            critical,
            intake,
        }
    }

    /// Resolves a hit and packages the outcome for event reporting.
    pub fn strike<T, R>(
        &mut self,
        hit: &Hit,
        target_ref: EntityRef,
        target: &mut T,
        rng: &mut R,
    ) -> Strike
    where
        T: Damageable + ?Sized,
        R: Rng + ?Sized,
    {
        let resolution = self.resolve(hit, target_ref, target, rng);
        Strike {
            source: hit.source,
            target: target_ref,
            damage_type: hit.damage_type,
            resolution,
        }
    }
}
