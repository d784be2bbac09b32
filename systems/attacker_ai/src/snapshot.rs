//! Read-only view of an attacker's surroundings.
//!
//! The snapshot is captured at the start of the attacker's own update, so it
//! reflects whatever earlier attackers already did this tick.

use glam::Vec2;
use rampart_core::{
    find, Attacker, AttackerId, Cohort, Defender, DefenderId, EntityRef, Hazard, HazardId,
    StatusKind,
};
use rampart_spatial::{SpatialEntry, SpatialIndex};

/// Hazard seen by an attacker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardSighting {
    /// Hazard identifier.
    pub id: HazardId,
    /// Center of the hazard's tile.
    pub position: Vec2,
    /// Distance from the observer.
    pub distance: f32,
    /// Cached danger score.
    pub danger: f32,
}

/// Opposing defender seen by an attacker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenderSighting {
    /// Defender identifier.
    pub id: DefenderId,
    /// Live position.
    pub position: Vec2,
    /// Distance from the observer.
    pub distance: f32,
    /// The defender is taunting.
    pub taunting: bool,
}

/// Same-side attacker seen by an attacker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AllySighting {
    /// Ally identifier.
    pub id: AttackerId,
    /// Live position.
    pub position: Vec2,
    /// Distance from the observer.
    pub distance: f32,
    /// Fraction of maximum hit points remaining.
    pub hp_ratio: f32,
    /// The ally holds a barrier or a live shield effect.
    pub shielded: bool,
    /// The ally carries at least one debuff.
    pub debuffed: bool,
}

/// Everything an attacker knows about its neighbourhood for one update.
///
/// Each list is sorted nearest first, ties broken by id.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Intact hazards in range.
    pub hazards: Vec<HazardSighting>,
    /// Living defenders in range.
    pub defenders: Vec<DefenderSighting>,
    /// Living allies in range, the observer excluded.
    pub allies: Vec<AllySighting>,
    /// Scratch buffer reused for spatial query results.
    pub entries: Vec<SpatialEntry>,
}

impl Snapshot {
    /// Rebuilds the snapshot around `origin`.
    ///
    /// Candidates come from the spatial index; each one is then looked up
    /// live so stale positions and dead entities never leak through.
    pub fn capture(
        &mut self,
        origin: Vec2,
        radius: f32,
        spatial: &SpatialIndex,
        allies: &Cohort<'_, Attacker>,
        defenders: &[Defender],
        hazards: &[Hazard],
    ) {
        self.hazards.clear();
        self.defenders.clear();
        self.allies.clear();
        self.entries.clear();
        if !radius.is_finite() || radius <= 0.0 {
            return;
        }
        spatial.query_circle(origin, radius, &mut self.entries);

        for entry in &self.entries {
            match entry.entity {
                EntityRef::Hazard(id) => {
                    let Some(hazard) = find(hazards, id) else {
                        continue;
                    };
                    let distance = hazard.position().distance(origin);
                    if hazard.is_destroyed() || distance > radius {
                        continue;
                    }
                    self.hazards.push(HazardSighting {
                        id,
                        position: hazard.position(),
                        distance,
                        danger: hazard.danger,
                    });
                }
                EntityRef::Defender(id) => {
                    let Some(defender) = find(defenders, id) else {
                        continue;
                    };
                    let distance = defender.agent.position.distance(origin);
                    if !defender.agent.is_alive() || distance > radius {
                        continue;
                    }
                    self.defenders.push(DefenderSighting {
                        id,
                        position: defender.agent.position,
                        distance,
                        taunting: defender.agent.has_effect(StatusKind::Taunt),
                    });
                }
                EntityRef::Attacker(id) => {
                    let Some(ally) = allies.get(id) else {
                        continue;
                    };
                    let distance = ally.agent.position.distance(origin);
                    if !ally.agent.is_alive() || distance > radius {
                        continue;
                    }
                    self.allies.push(AllySighting {
                        id,
                        position: ally.agent.position,
                        distance,
                        hp_ratio: ally.agent.hp_ratio(),
                        shielded: ally.agent.barrier() > 0.0
                            || ally.agent.has_effect(StatusKind::Shield),
                        debuffed: ally.agent.effects.iter().any(|effect| effect.kind.is_debuff()),
                    });
                }
            }
        }

        self.hazards
            .sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        self.defenders
            .sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        self.allies
            .sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
    }

    /// Sum of the danger scores of every sighted hazard.
    #[must_use]
    pub fn total_danger(&self) -> f32 {
        self.hazards.iter().map(|hazard| hazard.danger.max(0.0)).sum()
    }

    /// Allies whose health ratio is below `ratio`.
    pub fn allies_below(&self, ratio: f32) -> impl Iterator<Item = &AllySighting> + '_ {
        self.allies.iter().filter(move |ally| ally.hp_ratio < ratio)
    }

    /// Nearest defender, preferring a taunting one.
    #[must_use]
    pub fn priority_defender(&self, within: f32) -> Option<&DefenderSighting> {
        let mut in_range = self.defenders.iter().filter(|sighting| sighting.distance <= within);
        let nearest = in_range.clone().next();
        in_range.find(|sighting| sighting.taunting).or(nearest)
    }

    /// Nearest defender regardless of range.
    #[must_use]
    pub fn nearest_defender(&self) -> Option<&DefenderSighting> {
        self.defenders.first()
    }

    /// Nearest hazard regardless of range.
    #[must_use]
    pub fn nearest_hazard(&self) -> Option<&HazardSighting> {
        self.hazards.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(id: u32, distance: f32, taunting: bool) -> DefenderSighting {
        DefenderSighting {
            id: DefenderId::new(id),
            position: Vec2::new(distance, 0.0),
            distance,
            taunting,
        }
    }

    #[test]
    fn taunting_defenders_win_over_nearer_ones() {
        let snapshot = Snapshot {
            defenders: vec![sighting(0, 1.0, false), sighting(1, 2.0, true)],
            ..Snapshot::default()
        };
        assert_eq!(snapshot.priority_defender(3.0).map(|d| d.id), Some(DefenderId::new(1)));
        assert_eq!(snapshot.priority_defender(1.5).map(|d| d.id), Some(DefenderId::new(0)));
        assert!(snapshot.priority_defender(0.5).is_none());
    }

    #[test]
    fn danger_ignores_negative_scores() {
        let snapshot = Snapshot {
            hazards: vec![
                HazardSighting {
                    id: HazardId::new(0),
                    position: Vec2::ZERO,
                    distance: 1.0,
                    danger: 3.0,
                },
                HazardSighting {
                    id: HazardId::new(1),
                    position: Vec2::ZERO,
                    distance: 1.0,
                    danger: -2.0,
                },
            ],
            ..Snapshot::default()
        };
        assert_eq!(snapshot.total_danger(), 3.0);
    }
}
