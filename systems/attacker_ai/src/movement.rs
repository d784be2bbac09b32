//! Local random-walk stepping layered on top of the assigned path.

use glam::Vec2;
use rampart_core::{Attacker, BehaviorTuning, Direction, Intent, Locomotion, PathSource, TileCoord};
use rampart_navigation::Grid;
use rand::Rng;

use crate::Snapshot;

const REGROUP_SPACING: f32 = 1.5;
const DEFAULT_REACH: f32 = 1.0;

/// Relative weights of the four candidate step directions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StepWeights {
    pub(crate) forward: f32,
    pub(crate) lateral: f32,
    pub(crate) backward: f32,
}

impl StepWeights {
    pub(crate) fn for_attacker(tuning: &BehaviorTuning, engineer: bool) -> Self {
        Self {
            forward: tuning.forward_weight.max(0.0),
            lateral: if engineer {
                tuning.engineer_lateral_weight.max(0.0)
            } else {
                tuning.lateral_weight.max(0.0)
            },
            backward: tuning.backward_weight.max(0.0),
        }
    }

    fn weight(&self, desired: Direction, candidate: Direction) -> f32 {
        if candidate == desired {
            self.forward
        } else if candidate.is_lateral_to(desired) {
            self.lateral
        } else {
            self.backward
        }
    }
}

/// Terrain and crowd constraints a step has to respect.
#[derive(Debug)]
pub(crate) struct StepRules<'a> {
    pub(crate) grid: &'a Grid,
    pub(crate) locomotion: Locomotion,
    pub(crate) claims: &'a [Vec2],
    pub(crate) personal_space: f32,
}

impl StepRules<'_> {
    /// Reports whether the attacker may start walking onto `tile`.
    pub(crate) fn is_open(&self, tile: TileCoord) -> bool {
        if !self.grid.is_walkable(tile, self.locomotion) {
            return false;
        }
        if self.locomotion == Locomotion::Ground
            && self.grid.tile(tile).and_then(|t| t.defender()).is_some()
        {
            return false;
        }
        let center = tile.center();
        !self
            .claims
            .iter()
            .any(|claim| claim.distance(center) < self.personal_space)
    }
}

/// Picks the next step direction from `current`.
///
/// Open directions are weighted forward, lateral or backward relative to
/// `desired`; confused attackers weigh every open direction equally. The
/// `excluded` direction is never picked. Returns `None` when every direction
/// is blocked.
pub(crate) fn select_step<R>(
    current: TileCoord,
    desired: Direction,
    excluded: Option<Direction>,
    confused: bool,
    weights: StepWeights,
    rules: &StepRules<'_>,
    rng: &mut R,
) -> Option<(Direction, TileCoord)>
where
    R: Rng + ?Sized,
{
    let mut options: [Option<(Direction, TileCoord, f32)>; 4] = [None; 4];
    let mut total = 0.0;
    for (slot, direction) in Direction::ALL.into_iter().enumerate() {
        if excluded == Some(direction) {
            continue;
        }
        let Some(next) = current.step(direction) else {
            continue;
        };
        if !rules.is_open(next) {
            continue;
        }
        let weight = if confused {
            1.0
        } else {
            weights.weight(desired, direction)
        };
        if weight <= 0.0 {
            continue;
        }
        total += weight;
        options[slot] = Some((direction, next, weight));
    }

    if total <= 0.0 {
        return None;
    }
    let target = rng.gen::<f32>() * total;
    let mut cumulative = 0.0;
    let mut last = None;
    for (direction, next, weight) in options.into_iter().flatten() {
        cumulative += weight;
        last = Some((direction, next));
        if cumulative >= target {
            break;
        }
    }
    last
}

/// Direction the current intent wants to travel, or `None` to hold.
pub(crate) fn desired_direction(
    attacker: &Attacker,
    current: TileCoord,
    snapshot: &Snapshot,
    support_reach: f32,
) -> Option<Direction> {
    let position = attacker.agent.position;
    let attack_reach = attacker
        .stats
        .attack
        .map_or(DEFAULT_REACH, |attack| attack.range.max(DEFAULT_REACH));

    match attacker.intent {
        Intent::Advance => advance_direction(attacker, current),
        Intent::Hunt => match snapshot.nearest_defender() {
            Some(defender) if defender.distance > attack_reach => {
                Direction::from_vector(defender.position - position)
            }
            Some(_) => None,
            None => advance_direction(attacker, current),
        },
        Intent::PressureTraps => match snapshot.nearest_hazard() {
            Some(hazard) if hazard.distance > attack_reach => {
                Direction::from_vector(hazard.position - position)
            }
            Some(_) => None,
            None => advance_direction(attacker, current),
        },
        Intent::Support => {
            let neediest = snapshot
                .allies
                .iter()
                .filter(|ally| ally.hp_ratio < 1.0)
                .min_by(|a, b| a.hp_ratio.total_cmp(&b.hp_ratio).then(a.id.cmp(&b.id)));
            match neediest {
                Some(ally) if ally.distance > support_reach => {
                    Direction::from_vector(ally.position - position)
                }
                Some(_) => None,
                None => advance_direction(attacker, current),
            }
        }
        Intent::Regroup => match snapshot.allies.first() {
            Some(ally) if ally.distance > REGROUP_SPACING => {
                Direction::from_vector(ally.position - position)
            }
            Some(_) => None,
            None => attacker
                .path_index
                .checked_sub(1)
                .and_then(|index| attacker.path.get(index))
                .and_then(|previous| current.heading_to(*previous)),
        },
    }
}

fn advance_direction(attacker: &Attacker, current: TileCoord) -> Option<Direction> {
    if attacker.path_source == PathSource::Stationary {
        return None;
    }
    match attacker.next_waypoint() {
        Some(waypoint) => current.heading_to(waypoint),
        None => current.heading_to(attacker.goal),
    }
}

/// Moves `position` toward `target` by at most `distance`.
///
/// Returns the new position and whether the target was reached.
pub(crate) fn travel(position: Vec2, target: Vec2, distance: f32) -> (Vec2, bool) {
    let delta = target - position;
    let remaining = delta.length();
    if distance <= 0.0 || !distance.is_finite() {
        return (position, remaining <= f32::EPSILON);
    }
    if distance >= remaining {
        (target, true)
    } else {
        (position + delta / remaining * distance, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const CORRIDOR: &str = "
        .....
        S###G
        .....
    ";

    fn weights() -> StepWeights {
        StepWeights {
            forward: 6.0,
            lateral: 1.0,
            backward: 0.2,
        }
    }

    #[test]
    fn blocked_forward_falls_back_to_an_open_direction() {
        let grid = Grid::parse(CORRIDOR).expect("valid layout");
        let claims = [TileCoord::new(2, 1).center()];
        let rules = StepRules {
            grid: &grid,
            locomotion: Locomotion::Ground,
            claims: &claims,
            personal_space: 0.45,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..32 {
            let step = select_step(
                TileCoord::new(1, 1),
                Direction::East,
                None,
                false,
                weights(),
                &rules,
                &mut rng,
            );
            let (direction, _) = step.expect("lateral and backward tiles are open");
            assert_ne!(direction, Direction::East);
        }
    }

    #[test]
    fn excluded_direction_is_never_chosen() {
        let grid = Grid::parse(CORRIDOR).expect("valid layout");
        let rules = StepRules {
            grid: &grid,
            locomotion: Locomotion::Ground,
            claims: &[],
            personal_space: 0.45,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        for _ in 0..32 {
            let step = select_step(
                TileCoord::new(2, 1),
                Direction::East,
                Some(Direction::East),
                false,
                weights(),
                &rules,
                &mut rng,
            );
            assert_ne!(step.map(|(direction, _)| direction), Some(Direction::East));
        }
    }

    #[test]
    fn fully_boxed_in_attackers_wait() {
        let grid = Grid::parse("^^^\n^#^\n^^^").expect("valid layout");
        let rules = StepRules {
            grid: &grid,
            locomotion: Locomotion::Ground,
            claims: &[],
            personal_space: 0.45,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let step = select_step(
            TileCoord::new(1, 1),
            Direction::North,
            None,
            false,
            weights(),
            &rules,
            &mut rng,
        );
        assert!(step.is_none());
    }

    #[test]
    fn travel_stops_on_the_target() {
        let (position, arrived) = travel(Vec2::ZERO, Vec2::new(1.0, 0.0), 0.4);
        assert!(!arrived);
        assert!((position.x - 0.4).abs() < 1e-6);

        let (position, arrived) = travel(position, Vec2::new(1.0, 0.0), 5.0);
        assert!(arrived);
        assert_eq!(position, Vec2::new(1.0, 0.0));
    }
}
