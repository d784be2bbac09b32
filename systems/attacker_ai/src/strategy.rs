//! Species strategies selected once at spawn.

use rampart_combat::{Hit, Strike};
use rampart_core::{find_mut, Attacker, Cohort, DamageType, EntityRef, Intent, Strategy};
use rand::Rng;
use tracing::debug;

use crate::{Snapshot, Surroundings};

const DISMANTLE_REACH: f32 = 1.0;

/// Runs the attacker's strategy hook for this tick.
pub(crate) fn run_strategy<R>(
    attacker: &mut Attacker,
    allies: &mut Cohort<'_, Attacker>,
    snapshot: &Snapshot,
    field: &mut Surroundings<'_>,
    dt: f32,
    rng: &mut R,
    strikes: &mut Vec<Strike>,
) where
    R: Rng + ?Sized,
{
    match attacker.strategy {
        Strategy::Standard => {}
        Strategy::Engineer => dismantle(attacker, snapshot, field, dt, rng, strikes),
        Strategy::AuraCaster { pulse_timer } => {
            let remaining = pulse_timer - dt;
            if remaining > 0.0 {
                attacker.strategy = Strategy::AuraCaster {
                    pulse_timer: remaining,
                };
                return;
            }
            attacker.strategy = Strategy::AuraCaster {
                pulse_timer: field.tuning.aura_interval.max(dt),
            };
            let converted = pulse_aura(attacker, allies, field);
            if converted > 0 {
                debug!(attacker = attacker.id.get(), converted, "aura converted debuffs");
            }
        }
        Strategy::Boss { enraged: false }
            if attacker.agent.hp_ratio() < field.tuning.enrage_threshold =>
        {
            attacker.strategy = Strategy::Boss { enraged: true };
            let source = Some(EntityRef::Attacker(attacker.id));
            let _ = field
                .effects
                .add(&mut attacker.agent, field.tuning.enrage_haste.instantiate(source));
            let _ = field
                .effects
                .add(&mut attacker.agent, field.tuning.enrage_empower.instantiate(source));
            debug!(attacker = attacker.id.get(), "boss enraged");
        }
        Strategy::Boss { .. } => {}
    }
}

/// Engineers chip away at an adjacent hazard while pressuring traps.
fn dismantle<R>(
    attacker: &Attacker,
    snapshot: &Snapshot,
    field: &mut Surroundings<'_>,
    dt: f32,
    rng: &mut R,
    strikes: &mut Vec<Strike>,
) where
    R: Rng + ?Sized,
{
    if attacker.intent != Intent::PressureTraps {
        return;
    }
    let Some(sighting) = snapshot
        .nearest_hazard()
        .filter(|sighting| sighting.distance <= DISMANTLE_REACH)
    else {
        return;
    };
    let Some(hazard) = find_mut(field.hazards, sighting.id) else {
        return;
    };
    let amount = field.tuning.engineer_disarm_rate * dt;
    let hit = Hit::from_agent(
        amount,
        DamageType::Physical,
        EntityRef::Attacker(attacker.id),
        &attacker.agent,
    );
    strikes.push(
        field
            .resolver
            .strike(&hit, EntityRef::Hazard(sighting.id), hazard, rng),
    );
}

/// Swaps one debuff on each ally in range, the caster included, for haste.
fn pulse_aura(
    attacker: &mut Attacker,
    allies: &mut Cohort<'_, Attacker>,
    field: &mut Surroundings<'_>,
) -> usize {
    let origin = attacker.agent.position;
    let radius = field.tuning.aura_radius;
    let source = Some(EntityRef::Attacker(attacker.id));
    let buff = field.tuning.aura_buff;

    let mut converted = 0;
    let recipients = allies
        .iter_mut()
        .filter(|ally| ally.agent.is_alive() && ally.agent.position.distance(origin) <= radius)
        .map(|ally| &mut ally.agent)
        .chain(std::iter::once(&mut attacker.agent));
    for agent in recipients {
        let debuff = agent
            .effects
            .iter()
            .map(|effect| effect.kind)
            .find(|kind| kind.is_debuff());
        let Some(kind) = debuff else {
            continue;
        };
        if field.effects.remove(agent, kind).is_some() {
            let _ = field.effects.add(agent, buff.instantiate(source));
            converted += 1;
        }
    }
    converted
}
