//! Utility scoring and roulette selection of attacker intents.

use rampart_core::{AbilityKind, Attacker, BehaviorTuning, Intent, IntentWeights, Strategy};
use rand::Rng;

use crate::Snapshot;

const HUNT_SIGHTING_CAP: f32 = 3.0;
const SUPPORT_SIGHTING_CAP: f32 = 4.0;

/// Intent the attacker must take regardless of weights, if any.
///
/// Checked in order: a non-boss below its regroup threshold regroups, a
/// healer or shielder with a critical ally supports, and a disarmer facing
/// high aggregate danger pressures traps.
#[must_use]
pub fn forced_intent(
    attacker: &Attacker,
    snapshot: &Snapshot,
    tuning: &BehaviorTuning,
) -> Option<Intent> {
    if !attacker.strategy.is_boss()
        && attacker.agent.hp_ratio() < attacker.stats.regroup_threshold
    {
        return Some(Intent::Regroup);
    }

    let supportive = has_usable(attacker, |kind| {
        matches!(kind, AbilityKind::HealAllies | AbilityKind::ShieldAllies)
    });
    if supportive
        && snapshot
            .allies_below(tuning.critical_ally_ratio)
            .next()
            .is_some()
    {
        return Some(Intent::Support);
    }

    if has_usable(attacker, |kind| kind == AbilityKind::Disarm)
        && snapshot.total_danger() >= tuning.high_danger_threshold
    {
        return Some(Intent::PressureTraps);
    }

    None
}

/// Effective weights before noise: archetype base, personality, state
/// bonuses and the sticky bonus of the current intent.
#[must_use]
pub fn intent_weights(
    attacker: &Attacker,
    snapshot: &Snapshot,
    tuning: &BehaviorTuning,
) -> IntentWeights {
    let mut weights = attacker
        .stats
        .archetype
        .base_weights()
        .plus(&attacker.personality);

    weights.add(
        Intent::Advance,
        tuning.advance_bonus * (1.0 - attacker.progress()),
    );

    let sighted = (snapshot.defenders.len() as f32).min(HUNT_SIGHTING_CAP);
    weights.add(Intent::Hunt, tuning.hunt_bonus * sighted);

    let danger = snapshot.total_danger();
    weights.add(Intent::PressureTraps, tuning.trap_bonus * danger);
    if matches!(attacker.strategy, Strategy::Engineer) {
        weights.add(Intent::PressureTraps, tuning.trap_bonus * (1.0 + danger));
    }

    let injured = snapshot.allies_below(tuning.injured_ally_ratio).count();
    let critical = snapshot.allies_below(tuning.critical_ally_ratio).count();
    let needy = ((injured + critical) as f32).min(SUPPORT_SIGHTING_CAP);
    weights.add(Intent::Support, tuning.support_bonus * needy);

    weights.add(
        Intent::Regroup,
        tuning.regroup_bonus * (1.0 - attacker.agent.hp_ratio()),
    );
    weights.add(attacker.intent, tuning.sticky_bonus);

    sanitize(&mut weights);
    weights
}

/// Picks an intent by cumulative weight.
///
/// `draw` is a uniform sample in `[0, 1)`; the first bucket whose
/// cumulative weight reaches `draw * total` wins. Zero-weight buckets are
/// never picked. Returns `None` when every weight is zero.
#[must_use]
pub fn roulette(weights: &IntentWeights, draw: f32) -> Option<Intent> {
    let total: f32 = weights.0.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return None;
    }
    let target = draw.clamp(0.0, 1.0) * total;
    let mut cumulative = 0.0;
    let mut last = None;
    for intent in Intent::ALL {
        let weight = weights.get(intent);
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last = Some(intent);
        if cumulative >= target {
            return last;
        }
    }
    last
}

/// Weighted draw with bounded noise, ignoring forced overrides.
pub fn weighted_intent<R>(
    attacker: &Attacker,
    snapshot: &Snapshot,
    tuning: &BehaviorTuning,
    rng: &mut R,
) -> Intent
where
    R: Rng + ?Sized,
{
    let mut weights = intent_weights(attacker, snapshot, tuning);
    let noise = tuning.noise.max(0.0);
    for intent in Intent::ALL {
        weights.add(intent, rng.gen_range(-noise..=noise));
    }
    sanitize(&mut weights);
    roulette(&weights, rng.gen::<f32>()).unwrap_or(attacker.intent)
}

/// Forced override if one applies, otherwise a weighted draw.
pub fn choose_intent<R>(
    attacker: &Attacker,
    snapshot: &Snapshot,
    tuning: &BehaviorTuning,
    rng: &mut R,
) -> Intent
where
    R: Rng + ?Sized,
{
    forced_intent(attacker, snapshot, tuning)
        .unwrap_or_else(|| weighted_intent(attacker, snapshot, tuning, rng))
}

fn has_usable<F>(attacker: &Attacker, predicate: F) -> bool
where
    F: Fn(AbilityKind) -> bool,
{
    attacker
        .stats
        .abilities
        .iter()
        .filter(|data| predicate(data.kind))
        .any(|data| data.resolve().is_ok())
}

fn sanitize(weights: &mut IntentWeights) {
    for weight in &mut weights.0 {
        *weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
    }
}
