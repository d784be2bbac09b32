//! Hazard danger scores and the cost map derived from them.

use rampart_core::{DangerTuning, Hazard, HazardSpec};
use tracing::debug;

use crate::Grid;

/// Normalised threat of a hazard, in `[0, tuning.cap]`.
///
/// Instant damage and total damage over time are each divided by their scale,
/// a flat weight is added for a non-damaging status payload, and the sum is
/// amplified inversely by the trigger cooldown.
#[must_use]
pub fn danger_score(spec: &HazardSpec, tuning: &DangerTuning) -> f32 {
    let instant = spec.instant_damage.max(0.0) / tuning.instant_scale;
    let over_time = spec.dot_total() / tuning.dot_scale;
    let status = if spec.status.is_some() {
        tuning.status_weight
    } else {
        0.0
    };
    let cooldown = spec.cooldown.max(tuning.min_cooldown);
    let amplification = tuning.reference_cooldown / cooldown;

    let score = (instant + over_time + status) * amplification;
    if score.is_finite() {
        score.clamp(0.0, tuning.cap)
    } else {
        0.0
    }
}

/// Path cost contributed by a hazard with the given danger score.
#[must_use]
pub fn tile_cost(danger: f32) -> f32 {
    1.0 + danger.max(0.0)
}

/// Recomputes every tile cost from the currently placed hazards.
///
/// Destroyed hazards contribute nothing. Each live hazard's cached danger
/// score is refreshed as a side effect. The result depends only on the
/// hazard list, so calling this twice in a row yields the same map.
pub fn rebuild_costs(grid: &mut Grid, hazards: &mut [Hazard], tuning: &DangerTuning) {
    grid.reset_costs();
    let mut contributing = 0_usize;
    for hazard in hazards.iter_mut() {
        if hazard.is_destroyed() {
            hazard.danger = 0.0;
            continue;
        }
        hazard.danger = danger_score(&hazard.spec, tuning);
        grid.set_cost(hazard.tile, tile_cost(hazard.danger));
        contributing += 1;
    }
    debug!(hazards = contributing, "cost map rebuilt");
}
