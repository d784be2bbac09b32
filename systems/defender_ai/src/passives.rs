//! Always-on defender traits.

use rampart_combat::{CombatResolver, Hit, Strike};
use rampart_core::{Attacker, Defender, EntityRef, PassiveSpec, StatusEffect, StatusKind};
use rampart_status_effects::StatusEffectEngine;
use rand::Rng;
use tracing::debug;

/// What the passives did during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PassiveReport {
    pub(crate) regenerated: f32,
    pub(crate) frenzied: bool,
}

/// Advances periodic passives and fires threshold passives.
///
/// Death-triggered passives are left to [`detonate`], which the world calls
/// when it removes the defender.
pub(crate) fn run_passives(
    defender: &mut Defender,
    effects: &StatusEffectEngine,
    dt: f32,
) -> PassiveReport {
    let mut report = PassiveReport::default();
    defender
        .passive_state
        .resize(defender.stats.passives.len(), Default::default());

    for (spec, state) in defender
        .stats
        .passives
        .iter()
        .zip(defender.passive_state.iter_mut())
    {
        match *spec {
            PassiveSpec::Regeneration { amount, interval } => {
                if interval <= 0.0 {
                    continue;
                }
                state.elapsed += dt;
                while state.elapsed >= interval {
                    state.elapsed -= interval;
                    report.regenerated += defender.agent.heal(amount);
                }
            }
            PassiveSpec::Frenzy {
                threshold,
                duration,
                speed,
                damage,
            } => {
                if state.spent || defender.agent.hp_ratio() >= threshold {
                    continue;
                }
                state.spent = true;
                let source = Some(EntityRef::Defender(defender.id));
                let haste = StatusEffect::new(StatusKind::Haste, duration, speed);
                let empower = StatusEffect::new(StatusKind::Empower, duration, damage);
                let _ = effects.add(&mut defender.agent, haste.with_source(source));
                let _ = effects.add(&mut defender.agent, empower.with_source(source));
                report.frenzied = true;
                debug!(defender = defender.id.get(), "defender frenzied");
            }
            PassiveSpec::DeathBurst { .. } => {}
        }
    }
    report
}

/// Resolves every death-burst passive of a fallen defender.
///
/// Each burst hits every live attacker within its radius of the defender's
/// last position. Returns the number of hits dealt.
pub fn detonate<R>(
    defender: &Defender,
    attackers: &mut [Attacker],
    resolver: &mut CombatResolver,
    rng: &mut R,
    strikes: &mut Vec<Strike>,
) -> usize
where
    R: Rng + ?Sized,
{
    let origin = defender.agent.position;
    let source = EntityRef::Defender(defender.id);
    let mut hits = 0;
    for spec in &defender.stats.passives {
        let PassiveSpec::DeathBurst {
            damage,
            radius,
            damage_type,
        } = *spec
        else {
            continue;
        };
        let hit = Hit::from_source(damage, damage_type, source);
        for attacker in attackers.iter_mut() {
            let agent = &attacker.agent;
            if !agent.is_alive() || agent.position.distance(origin) > radius {
                continue;
            }
            let target = EntityRef::Attacker(attacker.id);
            strikes.push(resolver.strike(&hit, target, &mut attacker.agent, rng));
            hits += 1;
        }
    }
    hits
}
