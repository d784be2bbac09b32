//! Pursuit, patrol and collision avoidance for mobile defenders.

use std::f32::consts::FRAC_PI_4;

use glam::Vec2;
use rampart_core::{find, Attacker, Cohort, Defender, DefenderExtension, TileCoord};
use rampart_navigation::Grid;
use rand::Rng;

/// Defenders keep at least this distance from each other, in tiles.
pub const SEPARATION: f32 = 0.6;

const ARRIVAL: f32 = 0.05;
const APPROACH: f32 = 0.9;
const PATROL_ATTEMPTS: usize = 4;

/// Rotations tried in order when the direct heading is blocked.
const PROBES: [f32; 5] = [0.0, FRAC_PI_4, -FRAC_PI_4, 2.0 * FRAC_PI_4, -2.0 * FRAC_PI_4];

/// Moves `defender` toward its target, patrol waypoint or home.
///
/// Returns whether the position changed.
pub(crate) fn advance<R>(
    defender: &mut Defender,
    allies: &Cohort<'_, Defender>,
    attackers: &[Attacker],
    grid: &Grid,
    dt: f32,
    rng: &mut R,
) -> bool
where
    R: Rng + ?Sized,
{
    let speed = defender.agent.derived.speed;
    if speed <= 0.0 || dt <= 0.0 {
        return false;
    }

    let Some(destination) = destination(defender, attackers, grid, rng) else {
        return false;
    };
    let destination = leashed(defender, destination);

    let origin = defender.agent.position;
    let offset = destination - origin;
    let distance = offset.length();
    if distance <= ARRIVAL {
        return false;
    }
    let heading = offset / distance;
    let stride = (speed * dt).min(distance);

    for angle in PROBES {
        let step = Vec2::from_angle(angle).rotate(heading) * stride;
        let next = origin + step;
        if is_open(defender, allies, grid, next) {
            defender.agent.position = next;
            return true;
        }
    }
    false
}

/// Point the defender wants to reach this tick, if any.
fn destination<R>(
    defender: &mut Defender,
    attackers: &[Attacker],
    grid: &Grid,
    rng: &mut R,
) -> Option<Vec2>
where
    R: Rng + ?Sized,
{
    if let Some(target) = defender.target.and_then(|id| find(attackers, id)) {
        let position = target.agent.position;
        let stop = defender.stats.attack.range.max(0.0) * APPROACH;
        if position.distance(defender.agent.position) <= stop {
            return None;
        }
        return Some(position);
    }

    match defender.stats.extension {
        Some(DefenderExtension::Patrol { radius }) => patrol(defender, radius, grid, rng),
        None if defender.agent.position.distance(defender.home) > ARRIVAL => Some(defender.home),
        None => None,
    }
}

/// Keeps a patrol waypoint around home, drawing a new one on arrival.
fn patrol<R>(defender: &mut Defender, radius: f32, grid: &Grid, rng: &mut R) -> Option<Vec2>
where
    R: Rng + ?Sized,
{
    if let Some(waypoint) = defender.patrol_target {
        if waypoint.distance(defender.agent.position) > ARRIVAL {
            return Some(waypoint);
        }
        defender.patrol_target = None;
    }

    if !(radius.is_finite() && radius > 0.0) {
        return None;
    }
    let locomotion = defender.stats.locomotion;
    for _ in 0..PATROL_ATTEMPTS {
        let angle = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
        let reach = rng.gen_range(0.0..=radius);
        let waypoint = defender.home + Vec2::from_angle(angle) * reach;
        let standable = TileCoord::containing(waypoint)
            .map_or(false, |tile| grid.is_traversable(tile, locomotion));
        if standable {
            defender.patrol_target = Some(waypoint);
            return Some(waypoint);
        }
    }
    None
}

/// Pulls a destination back inside the leash around home.
fn leashed(defender: &Defender, destination: Vec2) -> Vec2 {
    match defender.stats.leash_radius {
        Some(leash) => {
            defender.home + (destination - defender.home).clamp_length_max(leash.max(0.0))
        }
        None => destination,
    }
}

fn is_open(defender: &Defender, allies: &Cohort<'_, Defender>, grid: &Grid, next: Vec2) -> bool {
    let Some(tile) = TileCoord::containing(next) else {
        return false;
    };
    if !grid.is_traversable(tile, defender.stats.locomotion) {
        return false;
    }

    let origin = defender.agent.position;
    allies
        .iter()
        .filter(|ally| ally.agent.is_alive())
        .all(|ally| {
            let other = ally.agent.position;
            let closing = next.distance(other) < origin.distance(other);
            !(closing && next.distance(other) < SEPARATION)
        })
}
