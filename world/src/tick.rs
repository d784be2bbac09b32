//! One simulation tick, in fixed phase order.

use rampart_attacker_ai as attacker_ai;
use rampart_core::{AttackerId, Cohort, DefenderId, EntityRef, NotificationSink, TileCoord};
use rampart_defender_ai as defender_ai;
use rampart_navigation::Grid;
use rampart_spatial::SpatialEntry;
use tracing::debug;

use crate::{hazards, lifecycle, Event, World};

impl<S: NotificationSink> World<S> {
    /// Runs every phase of one tick.
    ///
    /// Agents update in list order against live state, so later agents see
    /// the moves and damage of earlier ones within the same tick.
    pub(crate) fn tick(&mut self, dt: f32, events: &mut Vec<Event>) {
        let dt = clamp_dt(dt, self.config.max_tick_seconds);
        self.tick_index += 1;
        self.elapsed += dt;
        self.resolver.begin_tick(self.tick_index);
        events.push(Event::TimeAdvanced {
            dt,
            tick: self.tick_index,
        });

        let _ = self.refresh_costs();
        if self.replan_pending {
            self.replan(events);
        }
        self.refresh_spatial();

        self.update_effects(dt, events);
        let fired = hazards::trigger(
            &mut self.hazards,
            &mut self.attackers,
            &self.spatial,
            &mut self.resolver,
            &self.effects,
            dt,
            &mut self.rng,
            &mut self.nearby,
            &mut self.strikes,
        );
        if fired > 0 {
            debug!(hazards = fired, "hazards triggered");
        }
        self.flush_strikes(events);

        let attackers_moved = self.update_attackers(dt, events);
        self.flush_strikes(events);
        let defenders_moved = self.update_defenders(dt);
        self.flush_strikes(events);
        if attackers_moved || defenders_moved {
            self.spatial.mark_dirty();
        }

        self.sweep(events);
    }

    /// Rebuilds the spatial snapshot if anything marked it dirty.
    ///
    /// Besides spawns, removals and hazard changes, any movement during the
    /// previous tick marks the index dirty, so queries never run against
    /// positions more than one tick old.
    fn refresh_spatial(&mut self) {
        let attackers = self
            .attackers
            .iter()
            .filter(|attacker| attacker.agent.is_alive() && !attacker.reached_goal)
            .map(|attacker| SpatialEntry {
                entity: EntityRef::Attacker(attacker.id),
                position: attacker.agent.position,
            });
        let defenders = self
            .defenders
            .iter()
            .filter(|defender| defender.agent.is_alive())
            .map(|defender| SpatialEntry {
                entity: EntityRef::Defender(defender.id),
                position: defender.agent.position,
            });
        let hazards = self
            .hazards
            .iter()
            .filter(|hazard| !hazard.is_destroyed())
            .map(|hazard| SpatialEntry {
                entity: EntityRef::Hazard(hazard.id),
                position: hazard.position(),
            });
        let _ = self
            .spatial
            .rebuild_if_dirty(attackers.chain(defenders).chain(hazards));
    }

    /// Advances status effects on every living agent.
    ///
    /// Damage over time bypasses the combat pipeline; deaths it causes are
    /// collected by the removal pass.
    fn update_effects(&mut self, dt: f32, events: &mut Vec<Event>) {
        let tick = self.tick_index;
        for attacker in &mut self.attackers {
            if !attacker.agent.is_alive() {
                continue;
            }
            let report = self.effects.update(&mut attacker.agent, dt, &mut self.rng);
            if report.revived {
                let target = EntityRef::Attacker(attacker.id);
                lifecycle::report_revive(&mut self.sink, tick, target, events);
            }
        }
        for defender in &mut self.defenders {
            if !defender.agent.is_alive() {
                continue;
            }
            let report = self.effects.update(&mut defender.agent, dt, &mut self.rng);
            if report.revived {
                let target = EntityRef::Defender(defender.id);
                lifecycle::report_revive(&mut self.sink, tick, target, events);
            }
        }
    }

    fn update_attackers(&mut self, dt: f32, events: &mut Vec<Event>) -> bool {
        let mut moved = false;
        for index in 0..self.attackers.len() {
            let Some((attacker, mut allies)) = Cohort::split(&mut self.attackers, index) else {
                break;
            };
            let before = attacker.tile();
            let mut field = attacker_ai::Surroundings {
                grid: &self.grid,
                spatial: &self.spatial,
                defenders: &mut self.defenders,
                hazards: &mut self.hazards,
                resolver: &mut self.resolver,
                effects: &self.effects,
                tuning: &self.config.behavior,
            };
            let turn = self.attacker_ai.update(
                attacker,
                &mut allies,
                &mut field,
                dt,
                &mut self.rng,
                &mut self.strikes,
            );
            moved |= turn.moved;
            track(&mut self.grid, attacker.id, before, attacker.tile());
            if let Some((from, to)) = turn.intent_change {
                events.push(Event::IntentChanged {
                    attacker: attacker.id,
                    from,
                    to,
                });
            }
        }
        moved
    }

    fn update_defenders(&mut self, dt: f32) -> bool {
        let mut moved = false;
        for index in 0..self.defenders.len() {
            let Some((defender, mut allies)) = Cohort::split(&mut self.defenders, index) else {
                break;
            };
            let before = defender.tile();
            let mut field = defender_ai::Surroundings {
                grid: &self.grid,
                spatial: &self.spatial,
                attackers: &mut self.attackers,
                hazards: &mut self.hazards,
                resolver: &mut self.resolver,
                effects: &self.effects,
            };
            let turn = self.defender_ai.update(
                defender,
                &mut allies,
                &mut field,
                dt,
                &mut self.rng,
                &mut self.strikes,
            );
            if turn.moved {
                moved = true;
                relocate(&mut self.grid, defender.id, before, defender.tile());
            }
        }
        moved
    }
}

/// Moves a defender's occupancy back-reference between tiles.
///
/// A tile already claimed by another occupant keeps its claim.
fn relocate(grid: &mut Grid, id: DefenderId, from: Option<TileCoord>, to: Option<TileCoord>) {
    if from == to {
        return;
    }
    if let Some(tile) = from {
        lifecycle::vacate(grid, tile, id);
    }
    if let Some(tile) = to {
        if grid.tile(tile).is_some_and(|slot| !slot.is_occupied()) {
            grid.set_defender(tile, Some(id));
        }
    }
}

/// Moves an attacker's standing record between tiles.
fn track(grid: &mut Grid, id: AttackerId, from: Option<TileCoord>, to: Option<TileCoord>) {
    if from == to {
        return;
    }
    if let Some(tile) = from {
        grid.remove_attacker(tile, id);
    }
    if let Some(tile) = to {
        grid.add_attacker(tile, id);
    }
}

/// Non-finite and negative frame times count as zero.
fn clamp_dt(dt: f32, max: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, max)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_dt_bounds_frame_time() {
        assert_eq!(clamp_dt(0.1, 0.25), 0.1);
        assert_eq!(clamp_dt(5.0, 0.25), 0.25);
        assert_eq!(clamp_dt(-1.0, 0.25), 0.0);
        assert_eq!(clamp_dt(f32::INFINITY, 0.25), 0.0);
    }

    #[test]
    fn relocate_respects_foreign_claims() {
        let mut grid = Grid::new(3, 1).expect("grid");
        let me = DefenderId::new(1);
        let other = DefenderId::new(2);
        let (a, b, c) = (TileCoord::new(0, 0), TileCoord::new(1, 0), TileCoord::new(2, 0));
        grid.set_defender(a, Some(me));
        grid.set_defender(c, Some(other));

        relocate(&mut grid, me, Some(a), Some(b));
        assert_eq!(grid.tile(a).and_then(|t| t.defender()), None);
        assert_eq!(grid.tile(b).and_then(|t| t.defender()), Some(me));

        relocate(&mut grid, me, Some(b), Some(c));
        assert_eq!(grid.tile(b).and_then(|t| t.defender()), None);
        assert_eq!(grid.tile(c).and_then(|t| t.defender()), Some(other));
    }

    #[test]
    fn track_moves_the_standing_record() {
        let mut grid = Grid::new(2, 1).expect("grid");
        let id = AttackerId::new(3);
        let (a, b) = (TileCoord::new(0, 0), TileCoord::new(1, 0));
        track(&mut grid, id, None, Some(a));
        track(&mut grid, id, Some(a), Some(b));

        assert!(grid.tile(a).is_some_and(|t| t.attackers().is_empty()));
        assert_eq!(grid.tile(b).map(|t| t.attackers().to_vec()), Some(vec![id]));
    }
}
