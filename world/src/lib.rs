#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battlefield state for Rampart.
//!
//! The world owns every entity list and drives the systems once per tick in a
//! fixed order. Adapters mutate it only through [`apply`] and read it only
//! through [`query`].

mod command;
mod hazards;
mod lifecycle;
mod tick;

use rampart_attacker_ai::AttackerController;
use rampart_combat::{CombatResolver, Strike};
use rampart_core::{
    Attacker, ConfigError, Defender, Hazard, NoticeLevel, NotificationSink, NullSink,
    SimulationConfig, SimRng, SpeciesTable, TileCoord, WELCOME_BANNER,
};
use rampart_defender_ai::DefenderController;
use rampart_navigation::{rebuild_costs, Grid, PathPlanner};
use rampart_spatial::{SpatialEntry, SpatialIndex};
use rampart_status_effects::StatusEffectEngine;
use rand::SeedableRng;

pub use command::{Command, Event, SpawnRequest};

/// Represents the authoritative Rampart world state.
///
/// `S` receives player-facing notices; the simulation never reads it back.
#[derive(Debug)]
pub struct World<S = NullSink> {
    banner: &'static str,
    config: SimulationConfig,
    species: SpeciesTable,
    grid: Grid,
    planner: PathPlanner,
    spatial: SpatialIndex,
    resolver: CombatResolver,
    effects: StatusEffectEngine,
    attackers: Vec<Attacker>,
    defenders: Vec<Defender>,
    hazards: Vec<Hazard>,
    attacker_ai: AttackerController,
    defender_ai: DefenderController,
    rng: SimRng,
    sink: S,
    costs_dirty: bool,
    replan_pending: bool,
    next_attacker: u32,
    next_defender: u32,
    next_hazard: u32,
    tick_index: u64,
    elapsed: f32,
    strikes: Vec<Strike>,
    nearby: Vec<SpatialEntry>,
}

impl World {
    /// Creates a world that discards notices.
    pub fn new(
        config: SimulationConfig,
        species: SpeciesTable,
        grid: Grid,
    ) -> Result<Self, ConfigError> {
        Self::with_sink(config, species, grid, NullSink)
    }
}

impl<S: NotificationSink> World<S> {
    /// Creates a world reporting notable moments to `sink`.
    ///
    /// Fails when the configuration does not validate.
    pub fn with_sink(
        config: SimulationConfig,
        species: SpeciesTable,
        grid: Grid,
        sink: S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let spatial = SpatialIndex::new(
            grid.bounds(),
            config.spatial_node_capacity,
            config.spatial_max_depth,
        );
        Ok(Self {
            banner: WELCOME_BANNER,
            resolver: CombatResolver::new(config.combat, config.damage_log_capacity),
            effects: StatusEffectEngine::new(config.effects, config.combat.burn_oiled_multiplier),
            rng: SimRng::seed_from_u64(config.seed),
            config,
            species,
            grid,
            planner: PathPlanner::new(),
            spatial,
            attackers: Vec::new(),
            defenders: Vec::new(),
            hazards: Vec::new(),
            attacker_ai: AttackerController::new(),
            defender_ai: DefenderController::new(),
            sink,
            costs_dirty: true,
            replan_pending: false,
            next_attacker: 0,
            next_defender: 0,
            next_hazard: 0,
            tick_index: 0,
            elapsed: 0.0,
            strikes: Vec::new(),
            nearby: Vec::new(),
        })
    }

    /// Cost-optimal ground path between two tiles on the current cost map.
    ///
    /// A cost map made stale by hazard changes is rebuilt first. Returns
    /// `None` when no path exists; the fallback policy is not applied.
    pub fn find_path(&mut self, start: TileCoord, goal: TileCoord) -> Option<Vec<TileCoord>> {
        let _ = self.refresh_costs();
        self.planner.find_path(&self.grid, start, goal)
    }

    /// Consumes the world and returns its notification sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Rebuilds the cost map when hazards changed; returns whether it did.
    fn refresh_costs(&mut self) -> bool {
        if !self.costs_dirty {
            return false;
        }
        rebuild_costs(&mut self.grid, &mut self.hazards, &self.config.danger);
        self.costs_dirty = false;
        self.replan_pending = true;
        true
    }
}

/// Reports a notice and mirrors it into the append-only log.
fn announce<S: NotificationSink>(sink: &mut S, tick: u64, level: NoticeLevel, message: &str) {
    sink.notify(level, message);
    sink.append_log(&format!("[tick {tick}] {message}"));
}

/// Applies the provided command to the world, appending resulting events.
pub fn apply<S: NotificationSink>(
    world: &mut World<S>,
    command: Command,
    out_events: &mut Vec<Event>,
) {
    match command {
        Command::ConfigureGrid { grid } => world.configure_grid(grid),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnAttacker(request) => world.spawn_attacker(request, out_events),
        Command::PlaceHazard { tile, spec } => world.place_hazard(tile, spec, out_events),
        Command::RemoveHazard { hazard } => world.remove_hazard(hazard, out_events),
        Command::PlaceDefender { species, tile } => {
            world.place_defender(species, tile, out_events);
        }
        Command::ApplyDamage {
            target,
            amount,
            damage_type,
            source,
        } => world.apply_damage(target, amount, damage_type, source, out_events),
        Command::InjectStatusEffect { target, effect } => world.inject_effect(target, effect),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use rampart_combat::DamageLog;
    use rampart_core::{
        find, Attacker, Defender, EntityRef, Hazard, SimulationConfig, SpeciesTable,
    };
    use rampart_navigation::Grid;

    use super::World;

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner<S>(world: &World<S>) -> &'static str {
        world.banner
    }

    /// Live attackers, sorted by id.
    #[must_use]
    pub fn attackers<S>(world: &World<S>) -> &[Attacker] {
        &world.attackers
    }

    /// Live defenders, sorted by id.
    #[must_use]
    pub fn defenders<S>(world: &World<S>) -> &[Defender] {
        &world.defenders
    }

    /// Placed hazards, sorted by id.
    #[must_use]
    pub fn hazards<S>(world: &World<S>) -> &[Hazard] {
        &world.hazards
    }

    /// Tile map including costs and occupancy.
    #[must_use]
    pub fn grid<S>(world: &World<S>) -> &Grid {
        &world.grid
    }

    /// Most recent resolved hits.
    #[must_use]
    pub fn damage_log<S>(world: &World<S>) -> &DamageLog {
        world.resolver.log()
    }

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick_index<S>(world: &World<S>) -> u64 {
        world.tick_index
    }

    /// Simulated seconds elapsed.
    #[must_use]
    pub fn elapsed<S>(world: &World<S>) -> f32 {
        world.elapsed
    }

    /// Configuration the world was built with.
    #[must_use]
    pub fn config<S>(world: &World<S>) -> &SimulationConfig {
        &world.config
    }

    /// Species records the world spawns from.
    #[must_use]
    pub fn species<S>(world: &World<S>) -> &SpeciesTable {
        &world.species
    }

    /// Notification sink the world reports to.
    #[must_use]
    pub fn sink<S>(world: &World<S>) -> &S {
        &world.sink
    }

    /// Living entities within `radius` of `point`, sorted.
    ///
    /// Candidates come from the last spatial snapshot and are filtered by
    /// their live position and liveness, so an entity that moved into range
    /// since the last rebuild is missed until the next one.
    #[must_use]
    pub fn agents_in_radius<S>(world: &World<S>, point: Vec2, radius: f32) -> Vec<EntityRef> {
        let mut entries = Vec::new();
        world.spatial.query_circle(point, radius.max(0.0), &mut entries);
        let mut found: Vec<EntityRef> = entries
            .into_iter()
            .filter_map(|entry| {
                let position = match entry.entity {
                    EntityRef::Attacker(id) => find(&world.attackers, id)
                        .filter(|attacker| attacker.agent.is_alive() && !attacker.reached_goal)
                        .map(|attacker| attacker.agent.position),
                    EntityRef::Defender(id) => find(&world.defenders, id)
                        .filter(|defender| defender.agent.is_alive())
                        .map(|defender| defender.agent.position),
                    EntityRef::Hazard(id) => find(&world.hazards, id)
                        .filter(|hazard| !hazard.is_destroyed())
                        .map(Hazard::position),
                }?;
                (position.distance(point) <= radius).then_some(entry.entity)
            })
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{
        DamageType, EntityRef, HazardKind, HazardSpec, PlacementError, RecordingSink,
    };
    use rampart_navigation::TileKind;

    fn lane() -> Grid {
        Grid::parse("S####G").expect("layout")
    }

    fn spikes() -> HazardSpec {
        HazardSpec {
            kind: HazardKind::Spikes,
            max_hp: 50.0,
            radius: 0.8,
            cooldown: 1.0,
            instant_damage: 10.0,
            damage_type: DamageType::Physical,
            dot: None,
            status: None,
            ground_only: true,
        }
    }

    fn world() -> World {
        World::new(SimulationConfig::default(), SpeciesTable::default(), lane()).expect("world")
    }

    #[test]
    fn invalid_configuration_is_refused() {
        let config = SimulationConfig {
            max_tick_seconds: 0.0,
            ..SimulationConfig::default()
        };
        assert!(World::new(config, SpeciesTable::default(), lane()).is_err());
    }

    #[test]
    fn tick_clamps_delta_time() {
        let mut world = world();
        let mut events = Vec::new();

        apply(&mut world, Command::Tick { dt: 3.0 }, &mut events);
        apply(&mut world, Command::Tick { dt: f32::NAN }, &mut events);
        apply(&mut world, Command::Tick { dt: -1.0 }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced { dt: 0.25, tick: 1 },
                Event::TimeAdvanced { dt: 0.0, tick: 2 },
                Event::TimeAdvanced { dt: 0.0, tick: 3 },
            ]
        );
        assert_eq!(query::tick_index(&world), 3);
        assert!((query::elapsed(&world) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn placing_a_hazard_raises_the_tile_cost_once_refreshed() {
        let mut world = world();
        let mut events = Vec::new();
        let tile = TileCoord::new(2, 0);

        apply(&mut world, Command::PlaceHazard { tile, spec: spikes() }, &mut events);
        assert!(matches!(
            events.as_slice(),
            [Event::HazardPlaced { tile: placed, .. }] if *placed == tile
        ));
        assert_eq!(query::grid(&world).cost(tile), Some(1.0));

        let path = world.find_path(TileCoord::new(0, 0), TileCoord::new(5, 0));
        assert_eq!(path.map(|tiles| tiles.len()), Some(6));
        assert!(query::grid(&world).cost(tile).is_some_and(|cost| cost > 1.0));
    }

    #[test]
    fn hazard_placement_rejects_occupied_and_unwalkable_tiles() {
        let mut world = World::new(
            SimulationConfig::default(),
            SpeciesTable::default(),
            Grid::parse("S#^#G").expect("layout"),
        )
        .expect("world");
        let mut events = Vec::new();
        let lane = TileCoord::new(1, 0);
        let ridge = TileCoord::new(2, 0);
        let outside = TileCoord::new(9, 9);

        for tile in [lane, lane, ridge, outside] {
            apply(&mut world, Command::PlaceHazard { tile, spec: spikes() }, &mut events);
        }

        assert_eq!(query::hazards(&world).len(), 1);
        assert_eq!(
            events[1..],
            [
                Event::PlacementRejected {
                    tile: lane,
                    reason: PlacementError::Occupied(lane),
                },
                Event::PlacementRejected {
                    tile: ridge,
                    reason: PlacementError::NotTraversable(ridge),
                },
                Event::PlacementRejected {
                    tile: outside,
                    reason: PlacementError::OutOfBounds(outside),
                },
            ]
        );
    }

    #[test]
    fn destroyed_hazard_is_removed_and_announced() {
        let mut world = World::with_sink(
            SimulationConfig::default(),
            SpeciesTable::default(),
            lane(),
            RecordingSink::default(),
        )
        .expect("world");
        let mut events = Vec::new();
        let tile = TileCoord::new(3, 0);
        apply(&mut world, Command::PlaceHazard { tile, spec: spikes() }, &mut events);
        let hazard = query::hazards(&world)[0].id;
        events.clear();

        apply(
            &mut world,
            Command::ApplyDamage {
                target: EntityRef::Hazard(hazard),
                amount: 500.0,
                damage_type: DamageType::Physical,
                source: None,
            },
            &mut events,
        );

        assert!(query::hazards(&world).is_empty());
        assert_eq!(query::grid(&world).tile(tile).and_then(|t| t.hazard()), None);
        assert!(events.contains(&Event::HazardDestroyed { hazard, tile }));
        assert_eq!(query::sink(&world).count(NoticeLevel::Info), 1);
        assert_eq!(query::sink(&world).log().len(), 1);
    }

    #[test]
    fn removing_a_hazard_restores_base_cost() {
        let mut world = world();
        let mut events = Vec::new();
        let tile = TileCoord::new(2, 0);
        apply(&mut world, Command::PlaceHazard { tile, spec: spikes() }, &mut events);
        let hazard = query::hazards(&world)[0].id;
        let _ = world.find_path(TileCoord::new(0, 0), TileCoord::new(5, 0));

        apply(&mut world, Command::RemoveHazard { hazard }, &mut events);
        let _ = world.find_path(TileCoord::new(0, 0), TileCoord::new(5, 0));

        assert!(events.contains(&Event::HazardRemoved { hazard }));
        assert_eq!(query::grid(&world).cost(tile), Some(1.0));
        assert_eq!(query::grid(&world).tile(tile).and_then(|t| t.hazard()), None);
    }

    #[test]
    fn configure_grid_clears_entities() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceHazard {
                tile: TileCoord::new(1, 0),
                spec: spikes(),
            },
            &mut events,
        );
        let mut grid = Grid::new(4, 4).expect("grid");
        grid.set_kind(TileCoord::new(3, 3), TileKind::Goal);

        apply(&mut world, Command::ConfigureGrid { grid: grid.clone() }, &mut events);

        assert!(query::hazards(&world).is_empty());
        assert_eq!(query::grid(&world), &grid);
    }

    #[test]
    fn welcome_banner_is_exposed() {
        assert_eq!(query::welcome_banner(&world()), WELCOME_BANNER);
    }
}
