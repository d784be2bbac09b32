//! Per-agent status-effect processing.

use rampart_core::{Agent, EffectTuning, EntityRef, StatusEffect, StatusKind};
use rand::Rng;
use tracing::debug;

/// What [`StatusEffectEngine::add`] did with an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddOutcome {
    /// A new instance joined the collection.
    Inserted,
    /// A stackable instance gained a stack.
    Stacked,
    /// An existing instance's duration was refreshed.
    Refreshed,
    /// Chill reached the freeze threshold and became a freeze.
    Froze,
    /// The effect was rejected (dead agent or zero duration).
    Ignored,
}

/// Outcome of one [`StatusEffectEngine::update`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Damage dealt by damage-over-time effects, barrier included.
    pub damage: f32,
    /// Hit points restored by regeneration.
    pub healed: f32,
    /// Effects that expired this tick.
    pub expired: u32,
    /// The agent died to damage over time.
    pub killed: bool,
    /// A revive fired during damage over time.
    pub revived: bool,
    /// Source of the effect that dealt the final damage.
    pub last_source: Option<EntityRef>,
}

/// Stateless engine applying stacking, refresh, interaction and expiry rules.
#[derive(Clone, Copy, Debug)]
pub struct StatusEffectEngine {
    tuning: EffectTuning,
    burn_oiled_multiplier: f32,
}

impl StatusEffectEngine {
    /// Creates an engine; `burn_oiled_multiplier` scales burn ticks while oiled.
    #[must_use]
    pub const fn new(tuning: EffectTuning, burn_oiled_multiplier: f32) -> Self {
        Self {
            tuning,
            burn_oiled_multiplier,
        }
    }

    /// Engine constants.
    #[must_use]
    pub const fn tuning(&self) -> &EffectTuning {
        &self.tuning
    }

    /// Adds an effect, merging it with an existing instance of the same family.
    ///
    /// Bleed stacks up to the cap, summing magnitude and keeping the longer
    /// duration; at the cap only the duration can grow. Every other family
    /// refreshes the existing instance to the new effect's full duration.
    /// Each chill application also feeds the agent's ice counter and turns
    /// into a freeze at the agent's threshold.
    pub fn add(&self, agent: &mut Agent, effect: StatusEffect) -> AddOutcome {
        if !agent.is_alive() || effect.remaining <= self.tuning.expiry_epsilon {
            return AddOutcome::Ignored;
        }
        let kind = effect.kind;

        if kind == StatusKind::Chill {
            agent.ice_stacks = agent.ice_stacks.saturating_add(1);
            if agent.freeze_threshold > 0 && agent.ice_stacks >= agent.freeze_threshold {
                return self.freeze(agent, effect.source);
            }
        }

        let cap = self.tuning.bleed_stack_cap.max(1);
        let outcome = match agent.effects.iter_mut().find(|live| live.kind == effect.kind) {
            Some(live) if effect.kind.is_stackable() => {
                live.remaining = live.remaining.max(effect.remaining);
                live.duration = live.duration.max(effect.duration);
                if live.stacks < cap {
                    live.stacks += 1;
                    live.magnitude += effect.magnitude;
                    live.source = effect.source.or(live.source);
                    AddOutcome::Stacked
                } else {
                    AddOutcome::Refreshed
                }
            }
            Some(live) => {
                live.remaining = effect.duration;
                live.duration = effect.duration;
                live.source = effect.source.or(live.source);
                if live.kind == StatusKind::Shield {
                    live.magnitude = live.magnitude.max(effect.magnitude);
                    live.granted = false;
                }
                AddOutcome::Refreshed
            }
            None => {
                agent.effects.push(effect);
                AddOutcome::Inserted
            }
        };

        match kind {
            StatusKind::Shield => grant_shields(agent),
            StatusKind::Oiled => {
                agent.derived.fire_vulnerability = agent
                    .derived
                    .fire_vulnerability
                    .max(self.tuning.oiled_fire_vulnerability);
            }
            _ => {}
        }
        outcome
    }

    fn freeze(&self, agent: &mut Agent, source: Option<EntityRef>) -> AddOutcome {
        if let Some(position) = agent
            .effects
            .iter()
            .position(|live| live.kind == StatusKind::Chill)
        {
            let chill = agent.effects.remove(position);
            on_remove(agent, &chill);
        }
        agent.ice_stacks = 0;
        agent.shatter_vulnerable = true;
        agent.derived.stunned = true;

        let duration = self.tuning.freeze_duration;
        match agent
            .effects
            .iter_mut()
            .find(|live| live.kind == StatusKind::Freeze)
        {
            Some(live) => {
                live.remaining = duration;
                live.duration = duration;
            }
            None => agent
                .effects
                .push(StatusEffect::new(StatusKind::Freeze, duration, 0.0).with_source(source)),
        }
        debug!("chill converted into freeze");
        AddOutcome::Froze
    }

    /// Runs one tick: reset derived state, apply every effect, then expire.
    pub fn update<R>(&self, agent: &mut Agent, dt: f32, rng: &mut R) -> TickReport
    where
        R: Rng + ?Sized,
    {
        let mut report = TickReport::default();
        agent.reset_derived();
        if !agent.is_alive() {
            return report;
        }

        let mut effects = std::mem::take(&mut agent.effects);
        let oiled = effects.iter().any(|effect| effect.kind == StatusKind::Oiled);

        for effect in effects.iter_mut() {
            self.apply(agent, effect, dt, oiled, rng, &mut report);
        }

        for effect in effects.iter_mut() {
            effect.remaining -= dt;
        }
        let epsilon = self.tuning.expiry_epsilon;
        let (expired, live): (Vec<_>, Vec<_>) = effects
            .into_iter()
            .partition(|effect| effect.remaining <= epsilon);
        agent.effects = live;
        for effect in &expired {
            on_remove(agent, effect);
        }
        report.expired = expired.len() as u32;
        report
    }

    fn apply<R>(
        &self,
        agent: &mut Agent,
        effect: &mut StatusEffect,
        dt: f32,
        oiled: bool,
        rng: &mut R,
        report: &mut TickReport,
    ) where
        R: Rng + ?Sized,
    {
        match effect.kind {
            StatusKind::Bleed | StatusKind::Poison => {
                deal(agent, effect.magnitude * dt, effect.source, rng, report);
            }
            StatusKind::Burn => {
                let multiplier = if oiled { self.burn_oiled_multiplier } else { 1.0 };
                deal(agent, effect.magnitude * dt * multiplier, effect.source, rng, report);
            }
            StatusKind::Slow | StatusKind::Chill | StatusKind::Haste => {
                agent.derived.speed *= speed_factor(effect);
            }
            StatusKind::Stun | StatusKind::Freeze => agent.derived.stunned = true,
            StatusKind::Oiled => {
                agent.derived.fire_vulnerability = agent
                    .derived
                    .fire_vulnerability
                    .max(self.tuning.oiled_fire_vulnerability);
            }
            StatusKind::Shield => {
                if !effect.granted {
                    agent.grant_barrier(effect.magnitude);
                    effect.granted = true;
                }
            }
            StatusKind::Confuse => agent.derived.confused = true,
            StatusKind::Regen => report.healed += agent.heal(effect.magnitude * dt),
            StatusKind::Empower => {
                agent.derived.damage_multiplier *= effect.magnitude.max(0.0);
            }
            StatusKind::Taunt => {}
        }
    }

    /// Removes the instance of `kind`, running its remove hook.
    pub fn remove(&self, agent: &mut Agent, kind: StatusKind) -> Option<StatusEffect> {
        let position = agent.effects.iter().position(|live| live.kind == kind)?;
        let effect = agent.effects.remove(position);
        on_remove(agent, &effect);
        Some(effect)
    }

    /// Removes every debuff, running each remove hook; returns how many went.
    pub fn cleanse(&self, agent: &mut Agent) -> usize {
        let (debuffs, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut agent.effects)
            .into_iter()
            .partition(|effect| effect.kind.is_debuff());
        agent.effects = kept;
        for effect in &debuffs {
            on_remove(agent, effect);
        }
        debuffs.len()
    }
}

fn deal<R>(
    agent: &mut Agent,
    amount: f32,
    source: Option<EntityRef>,
    rng: &mut R,
    report: &mut TickReport,
) where
    R: Rng + ?Sized,
{
    if amount <= 0.0 || !agent.is_alive() {
        return;
    }
    let intake = agent.take_damage(amount, rng);
    report.damage += intake.absorbed + intake.hp_lost;
    report.killed |= intake.killed;
    report.revived |= intake.revived;
    report.last_source = source.or(report.last_source);
}

fn speed_factor(effect: &StatusEffect) -> f32 {
    match effect.kind {
        StatusKind::Slow | StatusKind::Chill => effect.magnitude.clamp(0.0, 1.0),
        StatusKind::Haste => effect.magnitude.max(1.0),
        _ => 1.0,
    }
}

fn grant_shields(agent: &mut Agent) {
    let mut grant = 0.0_f32;
    for effect in agent
        .effects
        .iter_mut()
        .filter(|effect| effect.kind == StatusKind::Shield && !effect.granted)
    {
        grant = grant.max(effect.magnitude);
        effect.granted = true;
    }
    agent.grant_barrier(grant);
}

/// Undoes the flag-level side effects of an effect leaving the collection.
///
/// Derived values are rebuilt from the baseline and the effects still live,
/// so removing one modifier never disturbs another's contribution.
fn on_remove(agent: &mut Agent, removed: &StatusEffect) {
    match removed.kind {
        StatusKind::Slow | StatusKind::Chill | StatusKind::Haste => {
            let speed = agent
                .effects
                .iter()
                .fold(agent.base_speed, |speed, live| speed * speed_factor(live));
            agent.derived.speed = speed;
            if removed.kind == StatusKind::Chill {
                agent.ice_stacks = 0;
            }
        }
        StatusKind::Stun => {
            agent.derived.stunned = agent.has_effect(StatusKind::Freeze);
        }
        StatusKind::Freeze => {
            agent.derived.stunned = agent.has_effect(StatusKind::Stun);
            agent.shatter_vulnerable = false;
        }
        StatusKind::Oiled => agent.derived.fire_vulnerability = 1.0,
        StatusKind::Confuse => agent.derived.confused = false,
        StatusKind::Shield => agent.set_barrier(0.0),
        StatusKind::Empower => {
            agent.derived.damage_multiplier = agent
                .effects
                .iter()
                .filter(|live| live.kind == StatusKind::Empower)
                .fold(1.0, |multiplier, live| multiplier * live.magnitude.max(0.0));
        }
        StatusKind::Bleed
        | StatusKind::Burn
        | StatusKind::Poison
        | StatusKind::Regen
        | StatusKind::Taunt => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn engine() -> StatusEffectEngine {
        StatusEffectEngine::new(EffectTuning::default(), 2.0)
    }

    fn agent() -> Agent {
        Agent::new(Vec2::ZERO, 100.0, 2.0)
    }

    #[test]
    fn refresh_resets_remaining_to_full_duration() {
        let engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut unit = agent();
        let _ = engine.add(&mut unit, StatusEffect::new(StatusKind::Slow, 2.0, 0.5));
        let _ = engine.update(&mut unit, 1.5, &mut rng);

        let outcome = engine.add(&mut unit, StatusEffect::new(StatusKind::Slow, 3.0, 0.8));
        assert_eq!(outcome, AddOutcome::Refreshed);
        let slow = unit.effect(StatusKind::Slow).expect("slow is live");
        assert_eq!(slow.remaining, 3.0);
        assert_eq!(slow.magnitude, 0.5);
        assert_eq!(unit.effects.len(), 1);
    }

    #[test]
    fn burn_doubles_while_oiled() {
        let engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut dry = agent();
        let mut oiled = agent();
        let _ = engine.add(&mut dry, StatusEffect::new(StatusKind::Burn, 5.0, 4.0));
        let _ = engine.add(&mut oiled, StatusEffect::new(StatusKind::Burn, 5.0, 4.0));
        let _ = engine.add(&mut oiled, StatusEffect::new(StatusKind::Oiled, 5.0, 0.0));

        let dry_report = engine.update(&mut dry, 1.0, &mut rng);
        let oiled_report = engine.update(&mut oiled, 1.0, &mut rng);

        assert_eq!(dry_report.damage, 4.0);
        assert_eq!(oiled_report.damage, 8.0);
        assert_eq!(oiled.derived.fire_vulnerability, 1.5);
    }

    #[test]
    fn shield_grants_barrier_immediately_and_clears_on_expiry() {
        let engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut unit = agent();
        let _ = engine.add(&mut unit, StatusEffect::new(StatusKind::Shield, 1.0, 25.0));
        assert_eq!(unit.barrier(), 25.0);

        let _ = engine.update(&mut unit, 0.5, &mut rng);
        assert_eq!(unit.barrier(), 25.0);
        let report = engine.update(&mut unit, 0.5, &mut rng);
        assert_eq!(report.expired, 1);
        assert_eq!(unit.barrier(), 0.0);
    }

    #[test]
    fn chill_freezes_at_threshold() {
        let engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut unit = agent();
        unit.freeze_threshold = 3;

        let chill = StatusEffect::new(StatusKind::Chill, 4.0, 0.7);
        assert_eq!(engine.add(&mut unit, chill.clone()), AddOutcome::Inserted);
        assert_eq!(engine.add(&mut unit, chill.clone()), AddOutcome::Refreshed);
        assert_eq!(engine.add(&mut unit, chill), AddOutcome::Froze);

        assert!(!unit.has_effect(StatusKind::Chill));
        assert!(unit.has_effect(StatusKind::Freeze));
        assert!(unit.shatter_vulnerable);
        assert_eq!(unit.ice_stacks, 0);

        let _ = engine.update(&mut unit, 0.1, &mut rng);
        assert!(unit.derived.stunned);

        let _ = engine.update(&mut unit, 5.0, &mut rng);
        assert!(!unit.has_effect(StatusKind::Freeze));
        assert!(!unit.shatter_vulnerable);
        assert!(!unit.derived.stunned);
    }

    #[test]
    fn chill_without_threshold_never_freezes() {
        let engine = engine();
        let mut unit = agent();
        for _ in 0..10 {
            let _ = engine.add(&mut unit, StatusEffect::new(StatusKind::Chill, 1.0, 0.5));
        }
        assert!(!unit.has_effect(StatusKind::Freeze));
        assert_eq!(unit.ice_stacks, 10);
    }

    #[test]
    fn expiring_stun_keeps_flag_while_freeze_lives() {
        let engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut unit = agent();
        unit.freeze_threshold = 1;
        let _ = engine.add(&mut unit, StatusEffect::new(StatusKind::Stun, 0.5, 0.0));
        let _ = engine.add(&mut unit, StatusEffect::new(StatusKind::Chill, 1.0, 0.5));

        let report = engine.update(&mut unit, 0.5, &mut rng);
        assert_eq!(report.expired, 1);
        assert!(unit.derived.stunned);
    }

    #[test]
    fn cleanse_removes_only_debuffs() {
        let engine = engine();
        let mut unit = agent();
        let _ = engine.add(&mut unit, StatusEffect::new(StatusKind::Burn, 3.0, 2.0));
        let _ = engine.add(&mut unit, StatusEffect::new(StatusKind::Confuse, 3.0, 0.0));
        let _ = engine.add(&mut unit, StatusEffect::new(StatusKind::Haste, 3.0, 1.3));
        unit.derived.confused = true;

        assert_eq!(engine.cleanse(&mut unit), 2);
        assert_eq!(unit.effects.len(), 1);
        assert!(unit.has_effect(StatusKind::Haste));
        assert!(!unit.derived.confused);
    }

    #[test]
    fn dead_agents_reject_effects() {
        let engine = engine();
        let mut unit = agent();
        unit.kill();
        assert_eq!(
            engine.add(&mut unit, StatusEffect::new(StatusKind::Burn, 3.0, 2.0)),
            AddOutcome::Ignored
        );
    }

    #[test]
    fn regen_heals_over_time() {
        let engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut unit = agent();
        let _ = unit.take_damage(30.0, &mut rng);
        let _ = engine.add(&mut unit, StatusEffect::new(StatusKind::Regen, 2.0, 5.0));

        let report = engine.update(&mut unit, 1.0, &mut rng);
        assert_eq!(report.healed, 5.0);
        assert_eq!(unit.hp(), 75.0);
    }
}
