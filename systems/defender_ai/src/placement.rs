//! Builds owned defender records from species data.

use rampart_core::{
    Agent, Defender, DefenderId, DefenderSpecies, DefenderStats, Locomotion, PassiveState,
    TileCoord,
};

/// Creates a defender standing on the center of `tile`.
///
/// The stat block is copied out of `species`; the defender never refers
/// back to it.
#[must_use]
pub fn place_defender(species: &DefenderSpecies, id: DefenderId, tile: TileCoord) -> Defender {
    let home = tile.center();
    let mut agent = Agent::new(home, species.max_hp, species.move_speed.max(0.0));
    agent.flying = species.locomotion == Locomotion::Flying;
    agent.resistances = species.resistances.clone();
    agent.freeze_threshold = species.freeze_threshold;
    agent.revive = species.revive;

    Defender {
        id,
        species: species.id.clone(),
        agent,
        stats: DefenderStats {
            engagement_range: species.engagement_range,
            targeting: species.targeting,
            attack: species.attack,
            low_hp_bonus: species.low_hp_bonus,
            abilities: species.abilities.clone(),
            passives: species.passives.clone(),
            locomotion: species.locomotion,
            leash_radius: species.leash_radius,
            extension: species.extension,
        },
        home,
        target: None,
        attack_timer: 0.0,
        ability_timers: vec![0.0; species.abilities.len()],
        passive_state: vec![PassiveState::default(); species.passives.len()],
        patrol_target: None,
    }
}
