//! Spawning, placement, external damage and the end-of-tick removal pass.

use rampart_combat::Hit;
use rampart_core::{
    find_mut, AttackerId, DamageType, DefenderId, EntityRef, Hazard, HazardId, HazardSpec,
    Locomotion, NoticeLevel, NotificationSink, PathSource, PlacementError, SpawnError, SpeciesId,
    StatusEffect, TileCoord,
};
use rampart_attacker_ai::{spawn_attacker, SpawnPlan};
use rampart_defender_ai::{detonate, place_defender};
use rampart_navigation::{Grid, PlanOutcome, TileKind};
use tracing::{debug, warn};

use crate::{announce, Event, SpawnRequest, World};

impl<S: NotificationSink> World<S> {
    pub(crate) fn configure_grid(&mut self, mut grid: Grid) {
        grid.clear_occupancy();
        self.spatial.set_area(grid.bounds());
        self.grid = grid;
        self.attackers.clear();
        self.defenders.clear();
        self.hazards.clear();
        self.planner.forget_defaults();
        self.costs_dirty = true;
        self.replan_pending = false;
        debug!(bounds = ?self.grid.bounds(), "grid configured");
    }

    pub(crate) fn spawn_attacker(&mut self, request: SpawnRequest, events: &mut Vec<Event>) {
        let _ = self.refresh_costs();
        match self.try_spawn(&request, events) {
            Ok((attacker, path)) => {
                debug!(attacker = attacker.get(), species = request.species.as_str(), "spawned");
                events.push(Event::AttackerSpawned {
                    attacker,
                    species: request.species,
                    tile: request.start,
                    path,
                });
            }
            Err(reason) => {
                warn!(species = request.species.as_str(), %reason, "spawn rejected");
                events.push(Event::SpawnRejected {
                    species: request.species,
                    reason,
                });
            }
        }
    }

    fn try_spawn(
        &mut self,
        request: &SpawnRequest,
        events: &mut Vec<Event>,
    ) -> Result<(AttackerId, PathSource), SpawnError> {
        let species = self
            .species
            .attacker(&request.species)
            .ok_or_else(|| SpawnError::UnknownSpecies(request.species.clone()))?;
        let start = request.start;
        if !self.grid.contains(start) {
            return Err(SpawnError::OutOfBounds(start));
        }
        let locomotion = locomotion_of(species.flying);
        if !self.grid.is_walkable(start, locomotion) {
            return Err(SpawnError::NotTraversable(start));
        }

        let id = AttackerId::new(self.next_attacker);
        let provided = request.path.as_ref().filter(|path| !path.is_empty());
        let (goal, path, path_source) = match provided {
            Some(path) => {
                let goal = path.last().copied().unwrap_or(start);
                (goal, path.clone(), PathSource::Provided)
            }
            None => {
                let goal = nearest_goal(&self.grid, start).ok_or(SpawnError::NoGoal)?;
                let planned = self.planner.plan(&self.grid, start, goal, locomotion);
                if planned.outcome != PlanOutcome::Found {
                    events.push(Event::PathFallback {
                        attacker: id,
                        outcome: planned.outcome,
                    });
                }
                (goal, planned.tiles, path_source_of(planned.outcome))
            }
        };

        let plan = SpawnPlan {
            id,
            level: request.level,
            start,
            goal,
            path,
            path_source,
        };
        let attacker = spawn_attacker(species, plan, &self.config.behavior, &mut self.rng);
        self.next_attacker += 1;
        if let Some(tile) = attacker.tile() {
            self.grid.add_attacker(tile, id);
        }
        self.attackers.push(attacker);
        self.spatial.mark_dirty();
        Ok((id, path_source))
    }

    /// Re-plans every planner-sourced path against the refreshed cost map.
    pub(crate) fn replan(&mut self, events: &mut Vec<Event>) {
        self.replan_pending = false;
        let mut replanned = 0_usize;
        for attacker in &mut self.attackers {
            if !attacker.agent.is_alive()
                || attacker.reached_goal
                || !attacker.path_source.is_replannable()
            {
                continue;
            }
            let Some(start) = attacker.tile() else {
                continue;
            };
            let locomotion = locomotion_of(attacker.agent.flying);
            let planned = self.planner.plan(&self.grid, start, attacker.goal, locomotion);
            if planned.outcome != PlanOutcome::Found {
                events.push(Event::PathFallback {
                    attacker: attacker.id,
                    outcome: planned.outcome,
                });
            }
            attacker.assign_path(planned.tiles, path_source_of(planned.outcome));
            replanned += 1;
        }
        debug!(attackers = replanned, "paths replanned");
    }

    pub(crate) fn place_defender(
        &mut self,
        species: SpeciesId,
        tile: TileCoord,
        events: &mut Vec<Event>,
    ) {
        match self.try_place_defender(&species, tile) {
            Ok(defender) => {
                debug!(defender = defender.get(), ?tile, "defender placed");
                events.push(Event::DefenderPlaced {
                    defender,
                    species,
                    tile,
                });
            }
            Err(reason) => {
                warn!(species = species.as_str(), %reason, "defender placement rejected");
                events.push(Event::PlacementRejected { tile, reason });
            }
        }
    }

    fn try_place_defender(
        &mut self,
        species: &SpeciesId,
        tile: TileCoord,
    ) -> Result<DefenderId, PlacementError> {
        let record = self
            .species
            .defender(species)
            .ok_or_else(|| PlacementError::UnknownSpecies(species.clone()))?;
        check_free(&self.grid, tile)?;
        if !self.grid.is_traversable(tile, record.locomotion) {
            return Err(PlacementError::NotTraversable(tile));
        }

        let id = DefenderId::new(self.next_defender);
        self.next_defender += 1;
        self.defenders.push(place_defender(record, id, tile));
        self.grid.set_defender(tile, Some(id));
        self.spatial.mark_dirty();
        Ok(id)
    }

    pub(crate) fn place_hazard(
        &mut self,
        tile: TileCoord,
        spec: HazardSpec,
        events: &mut Vec<Event>,
    ) {
        if let Err(reason) = check_hazard_tile(&self.grid, tile) {
            warn!(?tile, %reason, "hazard placement rejected");
            events.push(Event::PlacementRejected { tile, reason });
            return;
        }

        let id = HazardId::new(self.next_hazard);
        self.next_hazard += 1;
        self.hazards.push(Hazard::new(id, tile, spec));
        self.grid.set_hazard(tile, Some(id));
        self.costs_dirty = true;
        self.spatial.mark_dirty();
        debug!(hazard = id.get(), ?tile, "hazard placed");
        events.push(Event::HazardPlaced { hazard: id, tile });
    }

    pub(crate) fn remove_hazard(&mut self, hazard: HazardId, events: &mut Vec<Event>) {
        let Ok(index) = self.hazards.binary_search_by_key(&hazard, |placed| placed.id) else {
            debug!(hazard = hazard.get(), "removal of unknown hazard ignored");
            return;
        };
        let removed = self.hazards.remove(index);
        self.grid.set_hazard(removed.tile, None);
        self.costs_dirty = true;
        self.spatial.mark_dirty();
        events.push(Event::HazardRemoved { hazard });
    }

    pub(crate) fn apply_damage(
        &mut self,
        target: EntityRef,
        amount: f32,
        damage_type: DamageType,
        source: Option<EntityRef>,
        events: &mut Vec<Event>,
    ) {
        let hit = Hit {
            source,
            ..Hit::raw(amount, damage_type)
        };
        let resolver = &mut self.resolver;
        let rng = &mut self.rng;
        let strike = match target {
            EntityRef::Attacker(id) => find_mut(&mut self.attackers, id)
                .map(|attacker| resolver.strike(&hit, target, &mut attacker.agent, rng)),
            EntityRef::Defender(id) => find_mut(&mut self.defenders, id)
                .map(|defender| resolver.strike(&hit, target, &mut defender.agent, rng)),
            EntityRef::Hazard(id) => find_mut(&mut self.hazards, id)
                .map(|hazard| resolver.strike(&hit, target, hazard, rng)),
        };
        match strike {
            Some(strike) => self.strikes.push(strike),
            None => debug!(?target, "damage target no longer exists"),
        }
        self.flush_strikes(events);
        self.sweep(events);
    }

    pub(crate) fn inject_effect(&mut self, target: EntityRef, effect: StatusEffect) {
        let agent = match target {
            EntityRef::Attacker(id) => find_mut(&mut self.attackers, id).map(|a| &mut a.agent),
            EntityRef::Defender(id) => find_mut(&mut self.defenders, id).map(|d| &mut d.agent),
            EntityRef::Hazard(_) => None,
        };
        match agent {
            Some(agent) if agent.is_alive() => {
                let outcome = self.effects.add(agent, effect);
                debug!(?target, ?outcome, "status effect injected");
            }
            _ => debug!(?target, "status effect target unavailable"),
        }
    }

    /// Converts pending strikes into events.
    pub(crate) fn flush_strikes(&mut self, events: &mut Vec<Event>) {
        let tick = self.tick_index;
        for strike in self.strikes.drain(..) {
            let resolution = strike.resolution;
            if resolution.applied > 0.0 {
                events.push(Event::DamageDealt {
                    source: strike.source,
                    target: strike.target,
                    damage_type: strike.damage_type,
                    amount: resolution.applied,
                    critical: resolution.critical,
                });
            }
            if resolution.intake.revived {
                report_revive(&mut self.sink, tick, strike.target, events);
            }
        }
    }

    /// Removes fallen and finished entities, reporting each removal.
    ///
    /// Fallen defenders detonate first so their bursts can still claim
    /// attackers in the same pass.
    pub(crate) fn sweep(&mut self, events: &mut Vec<Event>) {
        let tick = self.tick_index;
        let before = self.attackers.len() + self.defenders.len() + self.hazards.len();

        for defender in self.defenders.iter().filter(|d| !d.agent.is_alive()) {
            let _ = detonate(
                defender,
                &mut self.attackers,
                &mut self.resolver,
                &mut self.rng,
                &mut self.strikes,
            );
            if let Some(tile) = defender.tile() {
                vacate(&mut self.grid, tile, defender.id);
            }
            debug!(defender = defender.id.get(), "defender died");
            let message = format!("defender {} ({}) fell", defender.id.get(), defender.species);
            announce(&mut self.sink, tick, NoticeLevel::Warning, &message);
            events.push(Event::DefenderDied {
                defender: defender.id,
            });
        }
        self.defenders.retain(|defender| defender.agent.is_alive());
        self.flush_strikes(events);

        for attacker in &self.attackers {
            let leaving = !attacker.agent.is_alive() || attacker.reached_goal;
            if let Some(tile) = attacker.tile().filter(|_| leaving) {
                self.grid.remove_attacker(tile, attacker.id);
            }
            if !attacker.agent.is_alive() {
                debug!(attacker = attacker.id.get(), "attacker died");
                let message = format!("{} slain", attacker.species);
                announce(&mut self.sink, tick, NoticeLevel::Success, &message);
                events.push(Event::AttackerDied {
                    attacker: attacker.id,
                    reward: attacker.stats.reward,
                });
            } else if attacker.reached_goal {
                debug!(attacker = attacker.id.get(), "attacker reached the goal");
                let message = format!("{} broke through", attacker.species);
                announce(&mut self.sink, tick, NoticeLevel::Warning, &message);
                events.push(Event::AttackerReachedGoal {
                    attacker: attacker.id,
                    leak_damage: attacker.stats.leak_damage,
                });
            }
        }
        self.attackers
            .retain(|attacker| attacker.agent.is_alive() && !attacker.reached_goal);

        let mut destroyed = false;
        for hazard in self.hazards.iter().filter(|hazard| hazard.is_destroyed()) {
            self.grid.set_hazard(hazard.tile, None);
            debug!(hazard = hazard.id.get(), "hazard destroyed");
            let (column, row) = (hazard.tile.column(), hazard.tile.row());
            let message = format!("hazard at ({column}, {row}) destroyed");
            announce(&mut self.sink, tick, NoticeLevel::Info, &message);
            events.push(Event::HazardDestroyed {
                hazard: hazard.id,
                tile: hazard.tile,
            });
            destroyed = true;
        }
        if destroyed {
            self.hazards.retain(|hazard| !hazard.is_destroyed());
            self.costs_dirty = true;
        }

        let after = self.attackers.len() + self.defenders.len() + self.hazards.len();
        if after != before {
            self.spatial.mark_dirty();
        }
    }
}

/// Reports a revive rule firing on an agent.
pub(crate) fn report_revive<S: NotificationSink>(
    sink: &mut S,
    tick: u64,
    target: EntityRef,
    events: &mut Vec<Event>,
) {
    let (event, message) = match target {
        EntityRef::Attacker(attacker) => (
            Event::AttackerRevived { attacker },
            format!("attacker {} revived", attacker.get()),
        ),
        EntityRef::Defender(defender) => (
            Event::DefenderRevived { defender },
            format!("defender {} revived", defender.get()),
        ),
        EntityRef::Hazard(_) => return,
    };
    debug!(?target, "revived");
    announce(sink, tick, NoticeLevel::Info, &message);
    events.push(event);
}

/// Clears a defender back-reference, leaving other occupants alone.
pub(crate) fn vacate(grid: &mut Grid, tile: TileCoord, defender: DefenderId) {
    if grid.tile(tile).and_then(|slot| slot.defender()) == Some(defender) {
        grid.set_defender(tile, None);
    }
}

fn check_free(grid: &Grid, tile: TileCoord) -> Result<(), PlacementError> {
    let slot = grid.tile(tile).ok_or(PlacementError::OutOfBounds(tile))?;
    if slot.is_occupied() {
        return Err(PlacementError::Occupied(tile));
    }
    Ok(())
}

fn check_hazard_tile(grid: &Grid, tile: TileCoord) -> Result<(), PlacementError> {
    check_free(grid, tile)?;
    if !grid.is_walkable(tile, Locomotion::Ground) {
        return Err(PlacementError::NotTraversable(tile));
    }
    Ok(())
}

/// Goal tile closest to `start` by Manhattan distance, first in row-major order on ties.
fn nearest_goal(grid: &Grid, start: TileCoord) -> Option<TileCoord> {
    grid.tiles_of(TileKind::Goal)
        .min_by_key(|goal| goal.manhattan_distance(start))
}

const fn locomotion_of(flying: bool) -> Locomotion {
    if flying {
        Locomotion::Flying
    } else {
        Locomotion::Ground
    }
}

const fn path_source_of(outcome: PlanOutcome) -> PathSource {
    match outcome {
        PlanOutcome::Found => PathSource::Planned,
        PlanOutcome::Fallback => PathSource::Fallback,
        PlanOutcome::Stationary => PathSource::Stationary,
    }
}
