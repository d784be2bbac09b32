#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rampart simulation.
//!
//! This crate defines the data model every other crate speaks: identifiers,
//! tile geometry, the shared [`Agent`] state with its damage intake, status
//! effect payloads, the owned entity records the world stores, immutable
//! species tables and the tunable [`SimulationConfig`]. Systems borrow these
//! types, mutate only what they are handed and report back through return
//! values; the world is the only owner of entity lists.

mod agent;
mod config;
mod effects;
mod entities;
mod error;
mod geometry;
mod ids;
mod notify;
mod roster;
mod species;

pub use agent::{Agent, DerivedState, Intake, Resistance, Resistances, ReviveRule};
pub use config::{BehaviorTuning, CombatTuning, DangerTuning, EffectTuning, SimulationConfig};
pub use effects::{DamageType, StatusEffect, StatusKind, StatusTemplate};
pub use entities::{
    ActionBias, Attacker, AttackerStats, Defender, DefenderStats, Hazard, HazardKind, HazardSpec,
    PassiveState, PathSource, Strategy,
};
pub use error::{AbilityDataError, ConfigError, GridError, PlacementError, SpawnError};
pub use geometry::{Direction, Rect, TileCoord};
pub use ids::{AttackerId, DefenderId, EntityRef, HazardId, SpeciesId};
pub use notify::{NoticeLevel, NotificationSink, NullSink, RecordingSink};
pub use roster::{find, find_mut, Cohort, Keyed};
pub use species::{
    AbilityData, AbilityKind, AbilitySpec, Archetype, AttackProfile, AttackerBehavior,
    AttackerSpecies, DefenderExtension, DefenderSpecies, Intent, IntentWeights, LevelGrowth,
    Locomotion, LowHpBonus, PassiveSpec, SpeciesTable, TargetFilter,
};

/// Seedable random number generator threaded through every system.
pub type SimRng = rand_chacha::ChaCha8Rng;

/// Canonical banner printed by front-ends when a run starts.
pub const WELCOME_BANNER: &str = "Rampart battlefield simulation.";
