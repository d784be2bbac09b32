//! Scripted battle: a default defence, a round-robin spawner and a running tally.

use std::fmt;

use anyhow::{Context, Result};
use rampart_core::{
    DamageType, HazardKind, HazardSpec, Locomotion, NotificationSink, SpeciesId, StatusKind,
    StatusTemplate, TileCoord,
};
use rampart_navigation::{Grid, TileKind};
use rampart_world::{apply, query, Command, Event, SpawnRequest, World};
use tracing::info;

/// Route steps between hazards.
const HAZARD_STRIDE: usize = 5;
/// Route steps between defender posts.
const POST_STRIDE: usize = 3;
/// Steps left clear in front of the spawn.
const FIRST_STEP: usize = 2;

/// Fortifies the route from the first spawn tile to its nearest goal.
pub(crate) fn fortify<S: NotificationSink>(
    world: &mut World<S>,
    events: &mut Vec<Event>,
) -> Result<()> {
    let (spawn, goal) = {
        let grid = query::grid(world);
        let spawn = first_spawn(grid)?;
        let goal = grid
            .tiles_of(TileKind::Goal)
            .min_by_key(|goal| goal.manhattan_distance(spawn))
            .context("layout has no goal tile")?;
        (spawn, goal)
    };
    let route = world
        .find_path(spawn, goal)
        .context("no ground route from spawn to goal")?;

    let roster: Vec<SpeciesId> = query::species(world)
        .defenders()
        .iter()
        .map(|species| species.id.clone())
        .collect();
    let commands = defence_plan(query::grid(world), &roster, &route);
    info!(
        route = route.len(),
        placements = commands.len(),
        "fortifying default route"
    );
    for command in commands {
        apply(world, command, events);
    }
    Ok(())
}

fn first_spawn(grid: &Grid) -> Result<TileCoord> {
    grid.tiles_of(TileKind::Spawn)
        .next()
        .context("layout has no spawn tile")
}

/// Hazards on the route and defenders on free tiles beside it.
///
/// The first and last route tiles are never fortified.
fn defence_plan(grid: &Grid, roster: &[SpeciesId], route: &[TileCoord]) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut claimed: Vec<TileCoord> = Vec::new();
    let interior = route.len().saturating_sub(1);

    for (step, &tile) in route.iter().enumerate().take(interior).skip(FIRST_STEP) {
        if step % HAZARD_STRIDE == 0 {
            commands.push(Command::PlaceHazard {
                tile,
                spec: hazard_rotation(step / HAZARD_STRIDE),
            });
            claimed.push(tile);
            continue;
        }
        if step % POST_STRIDE != 0 || roster.is_empty() {
            continue;
        }
        let post = grid.neighbors(tile).find(|candidate| {
            !route.contains(candidate)
                && !claimed.contains(candidate)
                && grid.is_traversable(*candidate, Locomotion::Ground)
                && grid.tile(*candidate).is_some_and(|slot| !slot.is_occupied())
        });
        if let Some(post) = post {
            let species = roster[(step / POST_STRIDE) % roster.len()].clone();
            commands.push(Command::PlaceDefender {
                species,
                tile: post,
            });
            claimed.push(post);
        }
    }
    commands
}

/// Cycles through the built-in hazard designs.
fn hazard_rotation(index: usize) -> HazardSpec {
    match index % 4 {
        0 => HazardSpec {
            kind: HazardKind::Spikes,
            max_hp: 80.0,
            radius: 0.7,
            cooldown: 1.5,
            instant_damage: 14.0,
            damage_type: DamageType::Physical,
            dot: Some(StatusTemplate::new(StatusKind::Bleed, 3.0, 1.5)),
            status: None,
            ground_only: true,
        },
        1 => HazardSpec {
            kind: HazardKind::FirePit,
            max_hp: 60.0,
            radius: 0.8,
            cooldown: 2.0,
            instant_damage: 6.0,
            damage_type: DamageType::Fire,
            dot: Some(StatusTemplate::new(StatusKind::Burn, 3.0, 3.0)),
            status: None,
            ground_only: true,
        },
        2 => HazardSpec {
            kind: HazardKind::FrostTrap,
            max_hp: 70.0,
            radius: 0.9,
            cooldown: 2.5,
            instant_damage: 4.0,
            damage_type: DamageType::Ice,
            dot: None,
            status: Some(StatusTemplate::new(StatusKind::Chill, 2.0, 0.6)),
            ground_only: false,
        },
        _ => HazardSpec {
            kind: HazardKind::OilSlick,
            max_hp: 50.0,
            radius: 0.8,
            cooldown: 3.0,
            instant_damage: 0.0,
            damage_type: DamageType::Physical,
            dot: None,
            status: Some(StatusTemplate::new(StatusKind::Oiled, 4.0, 1.0)),
            ground_only: true,
        },
    }
}

/// Issues attackers round-robin from the first spawn tile.
///
/// Every full pass over the roster raises the level by one.
#[derive(Debug)]
pub(crate) struct Spawner {
    start: TileCoord,
    roster: Vec<SpeciesId>,
    interval: u64,
    issued: usize,
}

impl Spawner {
    /// Creates a spawner releasing one attacker every `interval` ticks.
    pub(crate) fn new(grid: &Grid, roster: Vec<SpeciesId>, interval: u64) -> Result<Self> {
        Ok(Self {
            start: first_spawn(grid)?,
            roster,
            interval,
            issued: 0,
        })
    }

    /// Request due at `tick`, if any.
    pub(crate) fn request(&mut self, tick: u64) -> Option<SpawnRequest> {
        if self.interval == 0 || self.roster.is_empty() || tick % self.interval != 0 {
            return None;
        }
        let passes = self.issued / self.roster.len();
        let species = self.roster[self.issued % self.roster.len()].clone();
        self.issued += 1;

        let mut request = SpawnRequest::new(species, self.start);
        request.level = 1 + u32::try_from(passes).unwrap_or(u32::MAX - 1);
        Some(request)
    }
}

/// Running totals over every event the battle produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Tally {
    spawned: u32,
    spawn_rejections: u32,
    slain: u32,
    reward: u64,
    leaked: u32,
    leak_damage: u64,
    revived: u32,
    defenders_placed: u32,
    defenders_lost: u32,
    placement_rejections: u32,
    hazards_placed: u32,
    hazards_destroyed: u32,
    path_fallbacks: u32,
    damage: f64,
    critical_hits: u32,
}

impl Tally {
    /// Folds a batch of events into the totals.
    pub(crate) fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::AttackerSpawned { .. } => self.spawned += 1,
                Event::SpawnRejected { .. } => self.spawn_rejections += 1,
                Event::AttackerDied { reward, .. } => {
                    self.slain += 1;
                    self.reward += u64::from(*reward);
                }
                Event::AttackerReachedGoal { leak_damage, .. } => {
                    self.leaked += 1;
                    self.leak_damage += u64::from(*leak_damage);
                }
                Event::AttackerRevived { .. } | Event::DefenderRevived { .. } => self.revived += 1,
                Event::DefenderPlaced { .. } => self.defenders_placed += 1,
                Event::DefenderDied { .. } => self.defenders_lost += 1,
                Event::PlacementRejected { .. } => self.placement_rejections += 1,
                Event::HazardPlaced { .. } => self.hazards_placed += 1,
                Event::HazardDestroyed { .. } => self.hazards_destroyed += 1,
                Event::PathFallback { .. } => self.path_fallbacks += 1,
                Event::DamageDealt {
                    amount, critical, ..
                } => {
                    self.damage += f64::from(*amount);
                    if *critical {
                        self.critical_hits += 1;
                    }
                }
                _ => {}
            }
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "attackers: {} spawned, {} slain ({} reward), {} leaked ({} damage), {} rejected",
            self.spawned,
            self.slain,
            self.reward,
            self.leaked,
            self.leak_damage,
            self.spawn_rejections
        )?;
        writeln!(
            f,
            "defenders: {} placed, {} lost, {} rejected",
            self.defenders_placed, self.defenders_lost, self.placement_rejections
        )?;
        writeln!(
            f,
            "hazards: {} placed, {} destroyed",
            self.hazards_placed, self.hazards_destroyed
        )?;
        write!(
            f,
            "combat: {:.1} damage, {} critical hits, {} revives, {} path fallbacks",
            self.damage, self.critical_hits, self.revived, self.path_fallbacks
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::{AttackerId, DefenderId, EntityRef};

    fn roster(names: &[&str]) -> Vec<SpeciesId> {
        names.iter().map(|name| SpeciesId::new(*name)).collect()
    }

    #[test]
    fn spawner_cycles_the_roster_and_levels_up() {
        let grid = Grid::parse("S..G").expect("layout");
        let mut spawner = Spawner::new(&grid, roster(&["a", "b"]), 10).expect("spawner");

        assert!(spawner.request(3).is_none());
        let issued: Vec<(String, u32)> = [0, 10, 20, 30, 40]
            .into_iter()
            .filter_map(|tick| spawner.request(tick))
            .map(|request| (request.species.to_string(), request.level))
            .collect();
        assert_eq!(
            issued,
            vec![
                ("a".to_owned(), 1),
                ("b".to_owned(), 1),
                ("a".to_owned(), 2),
                ("b".to_owned(), 2),
                ("a".to_owned(), 3),
            ]
        );
    }

    #[test]
    fn spawner_needs_a_spawn_tile() {
        let grid = Grid::parse("...G").expect("layout");
        assert!(Spawner::new(&grid, roster(&["a"]), 1).is_err());
    }

    #[test]
    fn disabled_spawner_stays_quiet() {
        let grid = Grid::parse("S..G").expect("layout");
        let mut spawner = Spawner::new(&grid, roster(&["a"]), 0).expect("spawner");
        assert!(spawner.request(0).is_none());
    }

    #[test]
    fn defence_plan_keeps_posts_off_the_route() {
        let grid = Grid::parse(
            "
            ............
            S##########G
            ............
            ",
        )
        .expect("layout");
        let route: Vec<TileCoord> = (0..12).map(|column| TileCoord::new(column, 1)).collect();
        let commands = defence_plan(&grid, &roster(&["archer", "mage"]), &route);

        let hazards: Vec<TileCoord> = commands
            .iter()
            .filter_map(|command| match command {
                Command::PlaceHazard { tile, .. } => Some(*tile),
                _ => None,
            })
            .collect();
        assert_eq!(hazards, vec![TileCoord::new(5, 1), TileCoord::new(10, 1)]);

        let posts: Vec<(TileCoord, String)> = commands
            .iter()
            .filter_map(|command| match command {
                Command::PlaceDefender { species, tile } => Some((*tile, species.to_string())),
                _ => None,
            })
            .collect();
        assert_eq!(posts.len(), 3);
        for (tile, _) in &posts {
            assert!(!route.contains(tile));
        }
        assert_eq!(posts[0].1, "mage");
        assert_eq!(posts[1].1, "archer");
    }

    #[test]
    fn tally_folds_events() {
        let mut tally = Tally::default();
        tally.record(&[
            Event::AttackerDied {
                attacker: AttackerId::new(1),
                reward: 4,
            },
            Event::AttackerReachedGoal {
                attacker: AttackerId::new(2),
                leak_damage: 3,
            },
            Event::DefenderDied {
                defender: DefenderId::new(0),
            },
            Event::DamageDealt {
                source: None,
                target: EntityRef::Attacker(AttackerId::new(1)),
                damage_type: DamageType::Fire,
                amount: 12.5,
                critical: true,
            },
        ]);

        assert_eq!(tally.slain, 1);
        assert_eq!(tally.reward, 4);
        assert_eq!(tally.leaked, 1);
        assert_eq!(tally.leak_damage, 3);
        assert_eq!(tally.defenders_lost, 1);
        assert_eq!(tally.critical_hits, 1);
        assert!((tally.damage - 12.5).abs() < 1e-9);
        assert!(tally.to_string().contains("1 slain (4 reward)"));
    }
}
