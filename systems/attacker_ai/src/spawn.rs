//! Turns a species record and a spawn plan into an owned attacker.

use rampart_core::{
    AbilityKind, ActionBias, Agent, Attacker, AttackerId, AttackerSpecies, AttackerStats,
    BehaviorTuning, Intent, IntentWeights, PathSource, Strategy, TileCoord,
};
use rand::Rng;

/// Where and how a new attacker enters the field.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnPlan {
    /// Identifier allocated by the world.
    pub id: AttackerId,
    /// Spawn level; zero is treated as one.
    pub level: u32,
    /// Starting tile.
    pub start: TileCoord,
    /// Destination tile.
    pub goal: TileCoord,
    /// Waypoints from the start to the goal.
    pub path: Vec<TileCoord>,
    /// Origin of `path`.
    pub path_source: PathSource,
}

/// Builds an attacker with level-scaled stats and freshly rolled biases.
///
/// The personality and action preference are drawn here, once, and never
/// change for the attacker's lifetime.
pub fn spawn_attacker<R>(
    species: &AttackerSpecies,
    plan: SpawnPlan,
    tuning: &BehaviorTuning,
    rng: &mut R,
) -> Attacker
where
    R: Rng + ?Sized,
{
    let level = plan.level.max(1);
    let (hp_scale, damage_scale) = species.growth.multipliers(level);

    let mut agent = Agent::new(plan.start.center(), species.max_hp * hp_scale, species.speed);
    agent.flying = species.flying;
    agent.resistances = species.resistances.clone();
    agent.freeze_threshold = species.freeze_threshold;
    agent.revive = species.revive;

    let attack = species.attack.map(|mut attack| {
        attack.damage *= damage_scale;
        attack
    });
    let abilities: Vec<_> = species
        .abilities
        .iter()
        .cloned()
        .map(|mut data| {
            if matches!(data.kind, AbilityKind::Blast | AbilityKind::Disarm) {
                data.power = data.power.map(|power| power * damage_scale);
            }
            data
        })
        .collect();

    let amplitude = tuning.bias_amplitude.max(0.0);
    let mut personality = IntentWeights::default();
    for intent in Intent::ALL {
        personality.add(intent, rng.gen_range(-amplitude..=amplitude));
    }

    let amplitude = tuning.action_bias_amplitude.max(0.0);
    let mut action_bias = ActionBias {
        attack: rng.gen_range(-amplitude..=amplitude),
        ..ActionBias::default()
    };
    for bias in &mut action_bias.abilities {
        *bias = rng.gen_range(-amplitude..=amplitude);
    }

    let strategy = match Strategy::for_behavior(species.behavior) {
        Strategy::AuraCaster { .. } => Strategy::AuraCaster {
            pulse_timer: tuning.aura_interval,
        },
        other => other,
    };

    let ability_timers = vec![0.0; abilities.len()];
    let mut attacker = Attacker {
        id: plan.id,
        species: species.id.clone(),
        level,
        agent,
        stats: AttackerStats {
            archetype: species.archetype,
            detection_radius: species.detection_radius,
            regroup_threshold: species.regroup_threshold,
            attack,
            abilities,
            reward: species.reward,
            leak_damage: species.leak_damage,
        },
        strategy,
        path: Vec::new(),
        path_index: 0,
        path_source: plan.path_source,
        goal: plan.goal,
        intent: Intent::Advance,
        intent_timer: 0.0,
        personality,
        action_bias,
        attack_timer: 0.0,
        ability_timers,
        step_target: None,
        heading: None,
        reached_goal: false,
    };
    attacker.assign_path(plan.path, plan.path_source);
    attacker.record_arrival(plan.start);
    attacker
}
