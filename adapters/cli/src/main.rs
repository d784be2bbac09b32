#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Rampart battle and reports the outcome.

mod scenario;

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rampart_core::{EntityRef, RecordingSink, SimulationConfig, SpeciesTable};
use rampart_navigation::Grid;
use rampart_world::{apply, query, Command, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::scenario::{fortify, Spawner, Tally};

const DEFAULT_LAYOUT: &str = include_str!("../../../demos/layout.txt");
const DEFAULT_SPECIES: &str = include_str!("../../../demos/species.toml");
const DEFAULT_CONFIG: &str = include_str!("../../../demos/config.toml");

/// Damage records echoed after the summary.
const LOG_TAIL: usize = 8;
/// Notices echoed after the summary.
const NOTICE_TAIL: usize = 8;

/// Runs a scripted battle against the default defence.
#[derive(Debug, Parser)]
#[command(name = "rampart", version)]
struct Cli {
    /// ASCII layout file; the bundled demo layout when absent.
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Species table in TOML; the bundled demo roster when absent.
    #[arg(long)]
    species: Option<PathBuf>,
    /// Simulation configuration in TOML; the bundled demo config when absent.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Seconds per tick.
    #[arg(long, default_value_t = 0.1)]
    dt: f32,
    /// Overrides the configured random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Ticks between attacker spawns; zero disables spawning.
    #[arg(long, default_value_t = 15)]
    spawn_interval: u64,
}

/// Entry point for the Rampart command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let grid = Grid::parse(&load(cli.layout.as_deref(), DEFAULT_LAYOUT)?)
        .context("failed to parse layout")?;
    let species = SpeciesTable::from_toml_str(&load(cli.species.as_deref(), DEFAULT_SPECIES)?)
        .context("failed to parse species table")?;
    let mut config = SimulationConfig::from_toml_str(&load(cli.config.as_deref(), DEFAULT_CONFIG)?)
        .context("failed to parse simulation config")?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let mut world = World::with_sink(config, species, grid, RecordingSink::default())
        .context("simulation config rejected")?;
    println!("{}", query::welcome_banner(&world));

    let mut events = Vec::new();
    let mut tally = Tally::default();
    fortify(&mut world, &mut events)?;
    tally.record(&events);

    let roster = query::species(&world)
        .attackers()
        .iter()
        .map(|species| species.id.clone())
        .collect();
    let mut spawner = Spawner::new(query::grid(&world), roster, cli.spawn_interval)?;

    for tick in 0..cli.ticks {
        events.clear();
        if let Some(request) = spawner.request(tick) {
            apply(&mut world, Command::SpawnAttacker(request), &mut events);
        }
        apply(&mut world, Command::Tick { dt: cli.dt }, &mut events);
        tally.record(&events);
    }
    info!(
        ticks = query::tick_index(&world),
        elapsed = query::elapsed(&world),
        attackers = query::attackers(&world).len(),
        "battle finished"
    );

    report(&world, &tally);
    Ok(())
}

fn load(path: Option<&Path>, fallback: &str) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => Ok(fallback.to_owned()),
    }
}

fn report(world: &World<RecordingSink>, tally: &Tally) {
    println!(
        "after {} ticks ({:.1}s): {} attackers on the field",
        query::tick_index(world),
        query::elapsed(world),
        query::attackers(world).len()
    );
    println!("{tally}");

    let log = query::damage_log(world);
    if !log.is_empty() {
        println!("last hits ({} recorded):", log.total_recorded());
        let skip = log.len().saturating_sub(LOG_TAIL);
        for record in log.iter().skip(skip) {
            let source = record.source.map_or_else(|| "scripted".to_owned(), describe);
            println!(
                "  tick {:>4}: {source} -> {} {:.1} {:?}{}{}",
                record.tick,
                describe(record.target),
                record.applied,
                record.damage_type,
                if record.critical { " crit" } else { "" },
                if record.killed { " kill" } else { "" },
            );
        }
    }

    let notices = query::sink(world).notices();
    let skip = notices.len().saturating_sub(NOTICE_TAIL);
    for (level, message) in &notices[skip..] {
        println!("  [{level:?}] {message}");
    }
}

fn describe(entity: EntityRef) -> String {
    match entity {
        EntityRef::Attacker(id) => format!("attacker #{}", id.get()),
        EntityRef::Defender(id) => format!("defender #{}", id.get()),
        EntityRef::Hazard(id) => format!("hazard #{}", id.get()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rampart_core::AttackerId;

    #[test]
    fn arguments_are_well_formed() {
        Cli::command().debug_assert();
        let cli = Cli::parse_from(["rampart", "--ticks", "5", "--seed", "9"]);
        assert_eq!(cli.ticks, 5);
        assert_eq!(cli.seed, Some(9));
        assert_eq!(cli.spawn_interval, 15);
    }

    #[test]
    fn bundled_demo_data_loads() {
        let grid = Grid::parse(DEFAULT_LAYOUT).expect("demo layout");
        assert_eq!((grid.columns(), grid.rows()), (16, 6));

        let species = SpeciesTable::from_toml_str(DEFAULT_SPECIES).expect("demo species");
        assert_eq!(species.attackers().len(), 5);
        assert_eq!(species.defenders().len(), 3);
        for attacker in species.attackers() {
            for ability in &attacker.abilities {
                assert!(ability.resolve().is_ok(), "{} ability", attacker.id);
            }
        }
        for defender in species.defenders() {
            for ability in &defender.abilities {
                assert!(ability.resolve().is_ok(), "{} ability", defender.id);
            }
        }

        let config = SimulationConfig::from_toml_str(DEFAULT_CONFIG).expect("demo config");
        assert_eq!(config.seed, 1337);
    }

    #[test]
    fn missing_file_is_reported() {
        let error = load(Some(Path::new("/nonexistent/rampart.toml")), "").unwrap_err();
        assert!(error.to_string().contains("failed to read"));
        assert_eq!(load(None, "fallback").expect("fallback"), "fallback");
    }

    #[test]
    fn entities_are_described_by_kind() {
        assert_eq!(describe(EntityRef::Attacker(AttackerId::new(4))), "attacker #4");
    }
}
