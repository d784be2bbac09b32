//! Cooldown-gated active abilities and the basic attack.

use rampart_combat::{Hit, Strike};
use rampart_core::{
    find, find_mut, AbilityKind, AbilitySpec, Agent, Cohort, Defender, DefenderId, EntityRef,
    StatusEffect, StatusKind,
};
use rand::Rng;
use tracing::{debug, warn};

use crate::Surroundings;

/// Self shields are raised below this health ratio even without a target.
const SELF_SHIELD_RATIO: f32 = 0.75;

/// Reusable buffers for ally selection.
#[derive(Debug, Default)]
pub(crate) struct AbilityScratch {
    pool: Vec<(f32, DefenderId)>,
}

impl AbilityScratch {
    /// Fires every ready ability whose precondition holds; returns how many fired.
    pub(crate) fn run<R>(
        &mut self,
        defender: &mut Defender,
        allies: &mut Cohort<'_, Defender>,
        field: &mut Surroundings<'_>,
        rng: &mut R,
        strikes: &mut Vec<Strike>,
    ) -> usize
    where
        R: Rng + ?Sized,
    {
        let mut fired = 0;
        for slot in 0..defender.stats.abilities.len() {
            if defender.ability_timers.get(slot).copied().unwrap_or(0.0) > 0.0 {
                continue;
            }
            let spec = match defender.stats.abilities[slot].resolve() {
                Ok(spec) => spec,
                Err(error) => {
                    warn!(defender = defender.id.get(), %error, "skipping malformed ability");
                    continue;
                }
            };

            let used = match spec.kind {
                AbilityKind::SelfShield => self_shield(defender, &spec, field),
                AbilityKind::RepairHazard => repair(defender, &spec, field),
                AbilityKind::HealAllies => self.heal(defender, allies, &spec),
                AbilityKind::ShieldAllies => self.shield(defender, allies, &spec, field),
                AbilityKind::Blast => blast(defender, &spec, field, rng, strikes),
                AbilityKind::Taunt => taunt(defender, &spec, field),
                AbilityKind::Aura => aura(defender, allies, &spec, field),
                AbilityKind::Disarm => false,
            };
            if used {
                if let Some(timer) = defender.ability_timers.get_mut(slot) {
                    *timer = spec.cooldown;
                }
                fired += 1;
            }
        }
        fired
    }

    /// Heals the `max_targets` lowest-health injured defenders in range.
    fn heal(
        &mut self,
        defender: &mut Defender,
        allies: &mut Cohort<'_, Defender>,
        spec: &AbilitySpec,
    ) -> bool {
        self.gather(defender, allies, spec, |agent| agent.is_injured());
        if self.pool.is_empty() {
            return false;
        }
        for &(_, id) in &self.pool {
            let agent = if id == defender.id {
                &mut defender.agent
            } else {
                match allies.get_mut(id) {
                    Some(ally) => &mut ally.agent,
                    None => continue,
                }
            };
            let _ = agent.heal(spec.power);
        }
        true
    }

    /// Shields the most vulnerable defenders in range that lack a barrier.
    fn shield(
        &mut self,
        defender: &mut Defender,
        allies: &mut Cohort<'_, Defender>,
        spec: &AbilitySpec,
        field: &Surroundings<'_>,
    ) -> bool {
        self.gather(defender, allies, spec, |agent| {
            agent.barrier() <= 0.0 && !agent.has_effect(StatusKind::Shield)
        });
        if self.pool.is_empty() {
            return false;
        }
        let source = Some(EntityRef::Defender(defender.id));
        for &(_, id) in &self.pool {
            let agent = if id == defender.id {
                &mut defender.agent
            } else {
                match allies.get_mut(id) {
                    Some(ally) => &mut ally.agent,
                    None => continue,
                }
            };
            let effect = StatusEffect::new(StatusKind::Shield, spec.duration, spec.power);
            let _ = field.effects.add(agent, effect.with_source(source));
        }
        true
    }

    /// Fills the pool with up to `max_targets` defenders in range, lowest health first.
    fn gather<F>(
        &mut self,
        defender: &Defender,
        allies: &Cohort<'_, Defender>,
        spec: &AbilitySpec,
        wanted: F,
    ) where
        F: Fn(&Agent) -> bool,
    {
        self.pool.clear();
        let origin = defender.agent.position;
        if wanted(&defender.agent) {
            self.pool.push((defender.agent.hp_ratio(), defender.id));
        }
        self.pool.extend(
            allies
                .iter()
                .filter(|ally| ally.agent.is_alive() && wanted(&ally.agent))
                .filter(|ally| ally.agent.position.distance(origin) <= spec.range)
                .map(|ally| (ally.agent.hp_ratio(), ally.id)),
        );
        self.pool
            .sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        self.pool.truncate(spec.max_targets as usize);
    }
}

fn self_shield(defender: &mut Defender, spec: &AbilitySpec, field: &Surroundings<'_>) -> bool {
    let agent = &defender.agent;
    if agent.has_effect(StatusKind::Shield) {
        return false;
    }
    if defender.target.is_none() && agent.hp_ratio() >= SELF_SHIELD_RATIO {
        return false;
    }
    let effect = StatusEffect::new(StatusKind::Shield, spec.duration, spec.power)
        .with_source(Some(EntityRef::Defender(defender.id)));
    let _ = field.effects.add(&mut defender.agent, effect);
    true
}

/// Restores the nearest damaged hazard within range.
fn repair(defender: &Defender, spec: &AbilitySpec, field: &mut Surroundings<'_>) -> bool {
    let origin = defender.agent.position;
    let nearest = field
        .hazards
        .iter()
        .filter(|hazard| hazard.is_damaged())
        .map(|hazard| (hazard.position().distance(origin), hazard.id))
        .filter(|(distance, _)| *distance <= spec.range)
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    let Some(hazard) = nearest.and_then(|(_, id)| find_mut(field.hazards, id)) else {
        return false;
    };
    let restored = hazard.repair(spec.power);
    debug!(defender = defender.id.get(), hazard = hazard.id.get(), restored, "hazard repaired");
    restored > 0.0
}

/// Splash damage centred on the current target.
fn blast<R>(
    defender: &Defender,
    spec: &AbilitySpec,
    field: &mut Surroundings<'_>,
    rng: &mut R,
    strikes: &mut Vec<Strike>,
) -> bool
where
    R: Rng + ?Sized,
{
    let Some(target) = defender.target.and_then(|id| find(field.attackers, id)) else {
        return false;
    };
    let center = target.agent.position;
    if center.distance(defender.agent.position) > spec.range {
        return false;
    }

    let me = EntityRef::Defender(defender.id);
    let hit = Hit::from_agent(spec.power, spec.damage_type, me, &defender.agent);
    let filter = defender.stats.targeting;
    for attacker in field.attackers.iter_mut() {
        let agent = &attacker.agent;
        let exposed = agent.is_alive() && !attacker.reached_goal && filter.admits(agent.flying);
        if !exposed || agent.position.distance(center) > spec.radius {
            continue;
        }
        let target = EntityRef::Attacker(attacker.id);
        strikes.push(field.resolver.strike(&hit, target, &mut attacker.agent, rng));
        if let Some(effect) = spec.effect {
            let _ = field.effects.add(&mut attacker.agent, effect.instantiate(Some(me)));
        }
    }
    true
}

fn taunt(defender: &mut Defender, spec: &AbilitySpec, field: &Surroundings<'_>) -> bool {
    if defender.target.is_none() || defender.agent.has_effect(StatusKind::Taunt) {
        return false;
    }
    let effect = StatusEffect::new(StatusKind::Taunt, spec.duration, 0.0)
        .with_source(Some(EntityRef::Defender(defender.id)));
    let _ = field.effects.add(&mut defender.agent, effect);
    true
}

/// Applies the aura effect to every live defender in radius while engaged.
fn aura(
    defender: &mut Defender,
    allies: &mut Cohort<'_, Defender>,
    spec: &AbilitySpec,
    field: &Surroundings<'_>,
) -> bool {
    let Some(template) = spec.effect else {
        return false;
    };
    if defender.target.is_none() {
        return false;
    }
    let origin = defender.agent.position;
    let source = Some(EntityRef::Defender(defender.id));
    let _ = field.effects.add(&mut defender.agent, template.instantiate(source));
    for ally in allies.iter_mut() {
        if ally.agent.is_alive() && ally.agent.position.distance(origin) <= spec.radius {
            let _ = field.effects.add(&mut ally.agent, template.instantiate(source));
        }
    }
    true
}

/// Hits the current target once the attack cooldown has elapsed.
///
/// Returns whether an attack was made.
pub(crate) fn attack<R>(
    defender: &mut Defender,
    field: &mut Surroundings<'_>,
    rng: &mut R,
    strikes: &mut Vec<Strike>,
) -> bool
where
    R: Rng + ?Sized,
{
    if defender.attack_timer > 0.0 {
        return false;
    }
    let Some(id) = defender.target else {
        return false;
    };
    let Some(target) = find_mut(field.attackers, id) else {
        return false;
    };
    let profile = defender.stats.attack;
    if !target.agent.is_alive()
        || target.agent.position.distance(defender.agent.position) > profile.range
    {
        return false;
    }

    let mut damage = profile.damage;
    if let Some(bonus) = defender.stats.low_hp_bonus {
        if defender.agent.hp_ratio() < bonus.threshold {
            damage *= bonus.multiplier;
        }
    }
    let me = EntityRef::Defender(defender.id);
    let hit = Hit::from_agent(damage, profile.damage_type, me, &defender.agent);
    strikes.push(
        field
            .resolver
            .strike(&hit, EntityRef::Attacker(id), &mut target.agent, rng),
    );
    if let Some(effect) = profile.effect {
        let _ = field.effects.add(&mut target.agent, effect.instantiate(Some(me)));
    }
    defender.attack_timer = profile.cooldown.max(0.0);
    true
}
