//! Deterministic target acquisition for defenders.

use rampart_core::{find, Attacker, AttackerId, Defender, EntityRef, StatusKind};
use rampart_spatial::SpatialEntry;

/// A held target survives until it leaves this multiple of the engagement range.
pub const RETAIN_FACTOR: f32 = 1.5;

/// Chooses the attacker `defender` should engage this tick.
///
/// `nearby` is the spatial snapshot around the defender; every entry is
/// re-checked against the live attacker list. A taunting attacker in range
/// wins outright. Otherwise the current target is kept while it stays alive,
/// admitted by the filter and within [`RETAIN_FACTOR`] times the engagement
/// range, and a new target is the nearest admitted attacker in range, lowest
/// id first on ties.
#[must_use]
pub fn select_target(
    defender: &Defender,
    attackers: &[Attacker],
    nearby: &[SpatialEntry],
) -> Option<AttackerId> {
    let origin = defender.agent.position;
    let range = defender.stats.engagement_range.max(0.0);

    let mut best: Option<Choice> = None;
    for entry in nearby {
        let EntityRef::Attacker(id) = entry.entity else {
            continue;
        };
        let Some(attacker) = find(attackers, id) else {
            continue;
        };
        if !admits(defender, attacker) {
            continue;
        }
        let distance = attacker.agent.position.distance(origin);
        if distance > range {
            continue;
        }
        let choice = Choice {
            taunting: attacker.agent.has_effect(StatusKind::Taunt),
            distance,
            id,
        };
        match &mut best {
            Some(existing) => {
                if choice.precedes(existing) {
                    *existing = choice;
                }
            }
            None => best = Some(choice),
        }
    }

    if let Some(choice) = best.filter(|choice| choice.taunting) {
        return Some(choice.id);
    }

    let retained = defender
        .target
        .and_then(|id| find(attackers, id))
        .filter(|attacker| {
            admits(defender, attacker)
                && attacker.agent.position.distance(origin) <= range * RETAIN_FACTOR
        });
    if let Some(current) = retained {
        return Some(current.id);
    }

    best.map(|choice| choice.id)
}

/// Liveness, priority filter and leash checks shared by acquisition and retention.
fn admits(defender: &Defender, attacker: &Attacker) -> bool {
    if !attacker.agent.is_alive() || attacker.reached_goal {
        return false;
    }
    if !defender.stats.targeting.admits(attacker.agent.flying) {
        return false;
    }
    match defender.stats.leash_radius {
        Some(leash) => {
            let reach = leash.max(0.0) + defender.stats.engagement_range.max(0.0);
            attacker.agent.position.distance(defender.home) <= reach
        }
        None => true,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Choice {
    taunting: bool,
    distance: f32,
    id: AttackerId,
}

impl Choice {
    fn precedes(&self, other: &Self) -> bool {
        if self.taunting != other.taunting {
            return self.taunting;
        }

        if self.distance != other.distance {
            return self.distance < other.distance;
        }

        self.id < other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(taunting: bool, distance: f32, id: u32) -> Choice {
        Choice {
            taunting,
            distance,
            id: AttackerId::new(id),
        }
    }

    #[test]
    fn taunt_beats_distance() {
        assert!(choice(true, 4.0, 2).precedes(&choice(false, 1.0, 1)));
        assert!(!choice(false, 1.0, 1).precedes(&choice(true, 4.0, 2)));
    }

    #[test]
    fn equal_distance_prefers_lower_id() {
        assert!(choice(false, 2.0, 3).precedes(&choice(false, 2.0, 5)));
        assert!(choice(false, 1.5, 9).precedes(&choice(false, 2.0, 5)));
    }
}
