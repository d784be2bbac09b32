use glam::Vec2;
use rampart_attacker_ai::{
    choose_intent, forced_intent, spawn_attacker, AllySighting, AttackerController, HazardSighting,
    Snapshot, SpawnPlan, Surroundings,
};
use rampart_combat::CombatResolver;
use rampart_core::{
    AbilityData, AbilityKind, Agent, Archetype, AttackProfile, Attacker, AttackerBehavior,
    AttackerId, AttackerSpecies, BehaviorTuning, Cohort, CombatTuning, DamageType, Defender,
    DefenderId, DefenderStats, EffectTuning, EntityRef, HazardId, Intent, LevelGrowth, Locomotion,
    PathSource, Resistances, SpeciesId, StatusEffect, StatusKind, Strategy, TargetFilter,
    TileCoord,
};
use rampart_navigation::Grid;
use rampart_spatial::{SpatialEntry, SpatialIndex};
use rampart_status_effects::StatusEffectEngine;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn species(archetype: Archetype, behavior: AttackerBehavior) -> AttackerSpecies {
    AttackerSpecies {
        id: SpeciesId::new("grunt"),
        archetype,
        behavior,
        max_hp: 100.0,
        speed: 2.0,
        flying: false,
        detection_radius: 8.0,
        attack: None,
        abilities: Vec::new(),
        resistances: Resistances::default(),
        regroup_threshold: 0.3,
        freeze_threshold: 0,
        reward: 5,
        leak_damage: 1,
        revive: None,
        growth: LevelGrowth::default(),
    }
}

fn spawn(id: u32, species: &AttackerSpecies, start: TileCoord, rng: &mut ChaCha8Rng) -> Attacker {
    let path: Vec<TileCoord> = (start.column()..6)
        .map(|column| TileCoord::new(column, start.row()))
        .collect();
    spawn_attacker(
        species,
        SpawnPlan {
            id: AttackerId::new(id),
            level: 1,
            start,
            goal: TileCoord::new(5, start.row()),
            path,
            path_source: PathSource::Planned,
        },
        &BehaviorTuning::default(),
        rng,
    )
}

fn ability(kind: AbilityKind) -> AbilityData {
    let mut data = AbilityData::new(kind);
    data.cooldown = Some(2.0);
    data.range = Some(6.0);
    data.power = Some(10.0);
    data.radius = Some(1.0);
    data.duration = Some(3.0);
    data
}

fn defender(id: u32, position: Vec2) -> Defender {
    Defender {
        id: DefenderId::new(id),
        species: SpeciesId::new("guard"),
        agent: Agent::new(position, 50.0, 0.0),
        stats: DefenderStats {
            engagement_range: 3.0,
            targeting: TargetFilter::Any,
            attack: AttackProfile {
                damage: 5.0,
                damage_type: DamageType::Physical,
                range: 3.0,
                cooldown: 1.0,
                effect: None,
            },
            low_hp_bonus: None,
            abilities: Vec::new(),
            passives: Vec::new(),
            locomotion: Locomotion::Ground,
            leash_radius: None,
            extension: None,
        },
        home: position,
        target: None,
        attack_timer: 0.0,
        ability_timers: Vec::new(),
        passive_state: Vec::new(),
        patrol_target: None,
    }
}

fn ally(id: u32, hp_ratio: f32) -> AllySighting {
    AllySighting {
        id: AttackerId::new(id),
        position: Vec2::new(2.0, 0.5),
        distance: 1.0,
        hp_ratio,
        shielded: false,
        debuffed: false,
    }
}

#[test]
fn wounded_attackers_regroup_whatever_their_archetype() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let tuning = BehaviorTuning::default();
    for archetype in [
        Archetype::Skirmisher,
        Archetype::Brute,
        Archetype::Sapper,
        Archetype::Mystic,
        Archetype::Boss,
    ] {
        let kind = species(archetype, AttackerBehavior::Standard);
        let mut attacker = spawn(1, &kind, TileCoord::new(0, 0), &mut rng);
        let _ = attacker.agent.take_damage(85.0, &mut rng);
        assert!((attacker.agent.hp_ratio() - 0.15).abs() < 1e-6);

        let snapshot = Snapshot::default();
        assert_eq!(forced_intent(&attacker, &snapshot, &tuning), Some(Intent::Regroup));
        for _ in 0..50 {
            let intent = choose_intent(&attacker, &snapshot, &tuning, &mut rng);
            assert_eq!(intent, Intent::Regroup);
        }
    }
}

#[test]
fn bosses_are_exempt_from_forced_regroup() {
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let boss = species(Archetype::Boss, AttackerBehavior::Boss);
    let mut attacker = spawn(1, &boss, TileCoord::new(0, 0), &mut rng);
    let _ = attacker.agent.take_damage(85.0, &mut rng);

    assert!(attacker.strategy.is_boss());
    assert_eq!(
        forced_intent(&attacker, &Snapshot::default(), &BehaviorTuning::default()),
        None
    );
}

#[test]
fn healers_with_a_critical_ally_must_support() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut mystic = species(Archetype::Brute, AttackerBehavior::Standard);
    mystic.abilities.push(ability(AbilityKind::HealAllies));
    let attacker = spawn(1, &mystic, TileCoord::new(0, 0), &mut rng);
    let tuning = BehaviorTuning::default();

    let calm = Snapshot {
        allies: vec![ally(2, 0.9)],
        ..Snapshot::default()
    };
    assert_eq!(forced_intent(&attacker, &calm, &tuning), None);

    let dire = Snapshot {
        allies: vec![ally(2, 0.9), ally(3, 0.1)],
        ..Snapshot::default()
    };
    assert_eq!(forced_intent(&attacker, &dire, &tuning), Some(Intent::Support));
}

#[test]
fn malformed_support_abilities_do_not_force_support() {
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let mut mystic = species(Archetype::Mystic, AttackerBehavior::Standard);
    let mut broken = ability(AbilityKind::HealAllies);
    broken.power = None;
    mystic.abilities.push(broken);
    let attacker = spawn(1, &mystic, TileCoord::new(0, 0), &mut rng);

    let dire = Snapshot {
        allies: vec![ally(3, 0.1)],
        ..Snapshot::default()
    };
    assert_eq!(forced_intent(&attacker, &dire, &BehaviorTuning::default()), None);
}

#[test]
fn disarmers_facing_heavy_danger_pressure_traps() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut sapper = species(Archetype::Brute, AttackerBehavior::Standard);
    sapper.abilities.push(ability(AbilityKind::Disarm));
    let attacker = spawn(1, &sapper, TileCoord::new(0, 0), &mut rng);

    let hazard = |id: u32, danger: f32| HazardSighting {
        id: HazardId::new(id),
        position: Vec2::new(3.5, 0.5),
        distance: 3.0,
        danger,
    };
    let tuning = BehaviorTuning::default();
    let light = Snapshot {
        hazards: vec![hazard(0, 1.0)],
        ..Snapshot::default()
    };
    assert_eq!(forced_intent(&attacker, &light, &tuning), None);

    let heavy = Snapshot {
        hazards: vec![hazard(0, 4.0), hazard(1, 4.0)],
        ..Snapshot::default()
    };
    assert_eq!(forced_intent(&attacker, &heavy, &tuning), Some(Intent::PressureTraps));
}

#[test]
fn attackers_walk_their_corridor_to_the_goal() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let grid = Grid::parse("S####G").expect("valid layout");
    let spatial = SpatialIndex::new(grid.bounds(), 8, 8);
    let mut resolver = CombatResolver::new(CombatTuning::default(), 16);
    let effects = StatusEffectEngine::new(EffectTuning::default(), 2.0);
    let tuning = BehaviorTuning::default();
    let brute = species(Archetype::Brute, AttackerBehavior::Standard);
    let mut attackers = vec![spawn(1, &brute, TileCoord::new(0, 0), &mut rng)];
    let mut controller = AttackerController::new();
    let mut strikes = Vec::new();

    for _ in 0..600 {
        let (attacker, mut allies) = Cohort::split(&mut attackers, 0).expect("one attacker");
        let mut field = Surroundings {
            grid: &grid,
            spatial: &spatial,
            defenders: &mut [],
            hazards: &mut [],
            resolver: &mut resolver,
            effects: &effects,
            tuning: &tuning,
        };
        let _ = controller.update(
            attacker,
            &mut allies,
            &mut field,
            0.1,
            &mut rng,
            &mut strikes,
        );
        if attacker.reached_goal {
            break;
        }
    }

    assert!(attackers[0].reached_goal);
    assert_eq!(attackers[0].tile(), Some(TileCoord::new(5, 0)));
    assert!(strikes.is_empty());
}

#[test]
fn stunned_attackers_hold_still() {
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let grid = Grid::parse("S####G").expect("valid layout");
    let spatial = SpatialIndex::new(grid.bounds(), 8, 8);
    let mut resolver = CombatResolver::new(CombatTuning::default(), 16);
    let effects = StatusEffectEngine::new(EffectTuning::default(), 2.0);
    let tuning = BehaviorTuning::default();
    let brute = species(Archetype::Brute, AttackerBehavior::Standard);
    let mut attackers = vec![spawn(1, &brute, TileCoord::new(0, 0), &mut rng)];
    attackers[0].agent.derived.stunned = true;
    let start = attackers[0].agent.position;

    let (attacker, mut allies) = Cohort::split(&mut attackers, 0).expect("one attacker");
    let mut field = Surroundings {
        grid: &grid,
        spatial: &spatial,
        defenders: &mut [],
        hazards: &mut [],
        resolver: &mut resolver,
        effects: &effects,
        tuning: &tuning,
    };
    let turn = AttackerController::new().update(
        attacker,
        &mut allies,
        &mut field,
        0.5,
        &mut rng,
        &mut Vec::new(),
    );

    assert!(!turn.moved);
    assert_eq!(attackers[0].agent.position, start);
}

#[test]
fn blast_hits_the_bunched_group_not_the_nearest_defender() {
    let mut rng = ChaCha8Rng::seed_from_u64(14);
    let grid = Grid::parse(&".".repeat(12)).expect("valid layout");
    let mut caster = species(Archetype::Brute, AttackerBehavior::Standard);
    caster.abilities.push(ability(AbilityKind::Blast));
    let mut attackers = vec![spawn(1, &caster, TileCoord::new(1, 0), &mut rng)];
    let origin = attackers[0].agent.position;

    let mut defenders = vec![
        defender(0, origin + Vec2::new(0.0, 2.5)),
        defender(1, origin + Vec2::new(5.0, 0.0)),
        defender(2, origin + Vec2::from_angle(0.1) * 5.0),
        defender(3, origin + Vec2::from_angle(-0.1) * 5.0),
    ];
    let mut spatial = SpatialIndex::new(grid.bounds(), 8, 8);
    let entries: Vec<SpatialEntry> = defenders
        .iter()
        .map(|defender| SpatialEntry {
            entity: EntityRef::Defender(defender.id),
            position: defender.agent.position,
        })
        .collect();
    assert!(spatial.rebuild_if_dirty(entries));

    let mut resolver = CombatResolver::new(
        CombatTuning {
            crit_chance: 0.0,
            ..CombatTuning::default()
        },
        16,
    );
    let effects = StatusEffectEngine::new(EffectTuning::default(), 2.0);
    let tuning = BehaviorTuning::default();
    let mut strikes = Vec::new();

    let (attacker, mut allies) = Cohort::split(&mut attackers, 0).expect("one attacker");
    let mut field = Surroundings {
        grid: &grid,
        spatial: &spatial,
        defenders: &mut defenders,
        hazards: &mut [],
        resolver: &mut resolver,
        effects: &effects,
        tuning: &tuning,
    };
    let turn = AttackerController::new().update(
        attacker,
        &mut allies,
        &mut field,
        0.1,
        &mut rng,
        &mut strikes,
    );

    assert_eq!(turn.actions, 1);
    assert_eq!(defenders[0].agent.hp(), 50.0);
    for bunched in &defenders[1..] {
        assert_eq!(bunched.agent.hp(), 40.0);
    }
    assert_eq!(strikes.len(), 3);
    assert!(attackers[0].ability_timers[0] > 0.0);
}

#[test]
fn aura_casters_turn_ally_debuffs_into_haste() {
    let mut rng = ChaCha8Rng::seed_from_u64(15);
    let grid = Grid::parse("S####G").expect("valid layout");
    let spatial = SpatialIndex::new(grid.bounds(), 8, 8);
    let mut resolver = CombatResolver::new(CombatTuning::default(), 16);
    let effects = StatusEffectEngine::new(EffectTuning::default(), 2.0);
    let tuning = BehaviorTuning::default();
    let caster = species(Archetype::Mystic, AttackerBehavior::AuraCaster);
    let grunt = species(Archetype::Brute, AttackerBehavior::Standard);
    let mut attackers = vec![
        spawn(1, &caster, TileCoord::new(1, 0), &mut rng),
        spawn(2, &grunt, TileCoord::new(2, 0), &mut rng),
    ];
    let burn = StatusEffect::new(StatusKind::Burn, 5.0, 2.0);
    let _ = effects.add(&mut attackers[1].agent, burn);

    let (attacker, mut allies) = Cohort::split(&mut attackers, 0).expect("two attackers");
    let mut field = Surroundings {
        grid: &grid,
        spatial: &spatial,
        defenders: &mut [],
        hazards: &mut [],
        resolver: &mut resolver,
        effects: &effects,
        tuning: &tuning,
    };
    let _ = AttackerController::new().update(
        attacker,
        &mut allies,
        &mut field,
        tuning.aura_interval,
        &mut rng,
        &mut Vec::new(),
    );

    assert!(!attackers[1].agent.has_effect(StatusKind::Burn));
    assert!(attackers[1].agent.has_effect(StatusKind::Haste));
    assert!(matches!(
        attackers[0].strategy,
        Strategy::AuraCaster { pulse_timer } if pulse_timer > 0.0
    ));
}

#[test]
fn bosses_enrage_once_below_half_health() {
    let mut rng = ChaCha8Rng::seed_from_u64(16);
    let grid = Grid::parse("S####G").expect("valid layout");
    let spatial = SpatialIndex::new(grid.bounds(), 8, 8);
    let mut resolver = CombatResolver::new(CombatTuning::default(), 16);
    let effects = StatusEffectEngine::new(EffectTuning::default(), 2.0);
    let tuning = BehaviorTuning::default();
    let boss = species(Archetype::Boss, AttackerBehavior::Boss);
    let mut attackers = vec![spawn(1, &boss, TileCoord::new(0, 0), &mut rng)];
    let _ = attackers[0].agent.take_damage(60.0, &mut rng);

    let (attacker, mut allies) = Cohort::split(&mut attackers, 0).expect("one attacker");
    let mut field = Surroundings {
        grid: &grid,
        spatial: &spatial,
        defenders: &mut [],
        hazards: &mut [],
        resolver: &mut resolver,
        effects: &effects,
        tuning: &tuning,
    };
    let _ = AttackerController::new().update(
        attacker,
        &mut allies,
        &mut field,
        0.1,
        &mut rng,
        &mut Vec::new(),
    );

    assert_eq!(attackers[0].strategy, Strategy::Boss { enraged: true });
    assert!(attackers[0].agent.has_effect(StatusKind::Haste));
    assert!(attackers[0].agent.has_effect(StatusKind::Empower));
}

#[test]
fn spawn_scales_with_level_and_rolls_bounded_biases() {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut grown = species(Archetype::Skirmisher, AttackerBehavior::Standard);
    grown.growth = LevelGrowth { hp: 0.5, damage: 0.25 };
    grown.attack = Some(AttackProfile {
        damage: 8.0,
        damage_type: DamageType::Physical,
        range: 1.5,
        cooldown: 1.0,
        effect: None,
    });
    let tuning = BehaviorTuning::default();
    let attacker = spawn_attacker(
        &grown,
        SpawnPlan {
            id: AttackerId::new(4),
            level: 3,
            start: TileCoord::new(0, 0),
            goal: TileCoord::new(3, 0),
            path: (0..4).map(|column| TileCoord::new(column, 0)).collect(),
            path_source: PathSource::Provided,
        },
        &tuning,
        &mut rng,
    );

    assert_eq!(attacker.agent.max_hp(), 200.0);
    assert_eq!(attacker.stats.attack.map(|attack| attack.damage), Some(12.0));
    assert!(attacker
        .personality
        .0
        .iter()
        .all(|bias| bias.abs() <= tuning.bias_amplitude));
    assert_eq!(attacker.path_index, 0);
    assert_eq!(attacker.intent, Intent::Advance);
}
