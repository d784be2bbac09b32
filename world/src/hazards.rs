//! Hazard activation against attackers standing in range.

use rampart_combat::{CombatResolver, Hit, Strike};
use rampart_core::{find_mut, Attacker, EntityRef, Hazard};
use rampart_spatial::{SpatialEntry, SpatialIndex};
use rampart_status_effects::StatusEffectEngine;
use rand::Rng;

/// Fires every hazard whose cooldown elapsed and that has a victim in range.
///
/// Candidates come from the spatial snapshot and are re-checked against live
/// positions. A hazard that finds no victim stays armed. Returns the number of
/// hazards that fired.
#[allow(clippy::too_many_arguments)]
pub(crate) fn trigger<R>(
    hazards: &mut [Hazard],
    attackers: &mut [Attacker],
    spatial: &SpatialIndex,
    resolver: &mut CombatResolver,
    effects: &StatusEffectEngine,
    dt: f32,
    rng: &mut R,
    scratch: &mut Vec<SpatialEntry>,
    strikes: &mut Vec<Strike>,
) -> usize
where
    R: Rng + ?Sized,
{
    let mut fired = 0;
    for hazard in hazards.iter_mut() {
        if hazard.is_destroyed() {
            continue;
        }
        hazard.cooldown_timer = (hazard.cooldown_timer - dt).max(0.0);
        if hazard.cooldown_timer > 0.0 {
            continue;
        }

        let center = hazard.position();
        let spec = hazard.spec;
        let me = EntityRef::Hazard(hazard.id);
        scratch.clear();
        spatial.query_circle(center, spec.radius.max(0.0), scratch);
        scratch.sort_by_key(|entry| entry.entity);

        let mut hit_any = false;
        for entry in scratch.iter() {
            let EntityRef::Attacker(id) = entry.entity else {
                continue;
            };
            let Some(attacker) = find_mut(attackers, id) else {
                continue;
            };
            let agent = &attacker.agent;
            if !agent.is_alive() || attacker.reached_goal || !spec.affects(agent.flying) {
                continue;
            }
            if agent.position.distance(center) > spec.radius {
                continue;
            }

            if spec.instant_damage > 0.0 {
                let hit = Hit::from_source(spec.instant_damage, spec.damage_type, me);
                let target = EntityRef::Attacker(id);
                strikes.push(resolver.strike(&hit, target, &mut attacker.agent, rng));
            }
            for template in [spec.dot, spec.status].into_iter().flatten() {
                let _ = effects.add(&mut attacker.agent, template.instantiate(Some(me)));
            }
            hit_any = true;
        }

        if hit_any {
            hazard.cooldown_timer = spec.cooldown.max(0.0);
            fired += 1;
        }
    }
    fired
}
