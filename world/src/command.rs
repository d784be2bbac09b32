//! Messages accepted and emitted by the world.

use rampart_core::{
    AttackerId, DamageType, DefenderId, EntityRef, HazardId, HazardSpec, Intent, PathSource,
    PlacementError, SpawnError, SpeciesId, StatusEffect, TileCoord,
};
use rampart_navigation::{Grid, PlanOutcome};

/// Request to bring a new attacker into the world.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Species to instantiate.
    pub species: SpeciesId,
    /// Spawn level; zero is treated as one.
    pub level: u32,
    /// Tile the attacker starts on.
    pub start: TileCoord,
    /// Precomputed waypoints; planned from `start` when absent or empty.
    pub path: Option<Vec<TileCoord>>,
}

impl SpawnRequest {
    /// Creates a level-one request that lets the world plan the path.
    #[must_use]
    pub fn new(species: SpeciesId, start: TileCoord) -> Self {
        Self {
            species,
            level: 1,
            start,
            path: None,
        }
    }
}

/// Commands that mutate the world.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the tile map and clears every entity.
    ConfigureGrid {
        /// New tile map.
        grid: Grid,
    },
    /// Advances the simulation by one tick.
    Tick {
        /// Requested frame time in seconds, clamped before use.
        dt: f32,
    },
    /// Spawns an attacker.
    SpawnAttacker(SpawnRequest),
    /// Places a hazard on a free tile.
    PlaceHazard {
        /// Tile receiving the hazard.
        tile: TileCoord,
        /// Behaviour of the hazard.
        spec: HazardSpec,
    },
    /// Removes a placed hazard.
    RemoveHazard {
        /// Hazard to remove.
        hazard: HazardId,
    },
    /// Places a defender on a free tile.
    PlaceDefender {
        /// Species to instantiate.
        species: SpeciesId,
        /// Tile receiving the defender.
        tile: TileCoord,
    },
    /// Deals damage through the combat pipeline.
    ApplyDamage {
        /// Entity receiving the damage.
        target: EntityRef,
        /// Base damage before modifiers.
        amount: f32,
        /// Damage family.
        damage_type: DamageType,
        /// Entity credited with the damage.
        source: Option<EntityRef>,
    },
    /// Attaches a status effect through the stacking rules.
    InjectStatusEffect {
        /// Agent receiving the effect.
        target: EntityRef,
        /// Effect to attach.
        effect: StatusEffect,
    },
}

/// Events reported back by the world, in the order they happened.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A tick started.
    TimeAdvanced {
        /// Clamped delta time actually simulated.
        dt: f32,
        /// Index of the tick, starting at one.
        tick: u64,
    },
    /// An attacker entered the world.
    AttackerSpawned {
        /// Identifier of the new attacker.
        attacker: AttackerId,
        /// Species of the attacker.
        species: SpeciesId,
        /// Tile the attacker starts on.
        tile: TileCoord,
        /// Origin of the attacker's first path.
        path: PathSource,
    },
    /// A spawn request was refused.
    SpawnRejected {
        /// Requested species.
        species: SpeciesId,
        /// Why the request failed.
        reason: SpawnError,
    },
    /// An attacker was killed and removed.
    AttackerDied {
        /// Attacker that died.
        attacker: AttackerId,
        /// Reward granted for the kill.
        reward: u32,
    },
    /// An attacker reached a goal tile and was removed.
    AttackerReachedGoal {
        /// Attacker that leaked through.
        attacker: AttackerId,
        /// Damage the leak inflicts.
        leak_damage: u32,
    },
    /// A defender was placed.
    DefenderPlaced {
        /// Identifier of the new defender.
        defender: DefenderId,
        /// Species of the defender.
        species: SpeciesId,
        /// Tile the defender occupies.
        tile: TileCoord,
    },
    /// A hazard or defender placement was refused.
    PlacementRejected {
        /// Requested tile.
        tile: TileCoord,
        /// Why the placement failed.
        reason: PlacementError,
    },
    /// A defender was killed and removed.
    DefenderDied {
        /// Defender that died.
        defender: DefenderId,
    },
    /// A revive rule kept a defender alive.
    DefenderRevived {
        /// Defender that revived.
        defender: DefenderId,
    },
    /// A revive rule kept an attacker alive.
    AttackerRevived {
        /// Attacker that revived.
        attacker: AttackerId,
    },
    /// A hazard was placed.
    HazardPlaced {
        /// Identifier of the new hazard.
        hazard: HazardId,
        /// Tile the hazard occupies.
        tile: TileCoord,
    },
    /// A hazard was removed on request.
    HazardRemoved {
        /// Hazard that was removed.
        hazard: HazardId,
    },
    /// A hazard lost all hit points and was removed.
    HazardDestroyed {
        /// Hazard that was destroyed.
        hazard: HazardId,
        /// Tile the hazard occupied.
        tile: TileCoord,
    },
    /// The combat pipeline removed hit points or barrier.
    DamageDealt {
        /// Entity credited with the damage.
        source: Option<EntityRef>,
        /// Entity that took the damage.
        target: EntityRef,
        /// Damage family.
        damage_type: DamageType,
        /// Damage after every modifier.
        amount: f32,
        /// The hit was critical.
        critical: bool,
    },
    /// A path search failed and the fallback policy was applied.
    PathFallback {
        /// Attacker that received the fallback path.
        attacker: AttackerId,
        /// Which fallback applied.
        outcome: PlanOutcome,
    },
    /// An attacker switched movement intent.
    IntentChanged {
        /// Attacker whose intent changed.
        attacker: AttackerId,
        /// Previous intent.
        from: Intent,
        /// New intent.
        to: Intent,
    },
}
