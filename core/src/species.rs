//! Immutable species records injected into the world at construction.
//!
//! Records are plain data. Ability entries stay in their raw
//! [`AbilityData`] form until a controller resolves them, so one malformed
//! entry disables one ability instead of the whole species.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    AbilityDataError, ConfigError, DamageType, Resistances, ReviveRule, SpeciesId, StatusTemplate,
};

/// High-level behaviour mode of an attacker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Follow the path toward the goal.
    Advance,
    /// Seek out and suppress nearby hazards.
    PressureTraps,
    /// Engage nearby defenders.
    Hunt,
    /// Heal and shield injured allies.
    Support,
    /// Fall back toward allies or along the path.
    Regroup,
}

impl Intent {
    /// Number of intents.
    pub const COUNT: usize = 5;

    /// Every intent in weight-table order.
    pub const ALL: [Intent; Intent::COUNT] = [
        Intent::Advance,
        Intent::PressureTraps,
        Intent::Hunt,
        Intent::Support,
        Intent::Regroup,
    ];

    /// Position of the intent inside an [`IntentWeights`] table.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Advance => 0,
            Self::PressureTraps => 1,
            Self::Hunt => 2,
            Self::Support => 3,
            Self::Regroup => 4,
        }
    }
}

/// Weight per intent, indexed by [`Intent::index`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentWeights(pub [f32; Intent::COUNT]);

impl IntentWeights {
    /// Weight assigned to `intent`.
    #[must_use]
    pub fn get(&self, intent: Intent) -> f32 {
        self.0[intent.index()]
    }

    /// Adds `amount` to the weight of `intent`.
    pub fn add(&mut self, intent: Intent, amount: f32) {
        self.0[intent.index()] += amount;
    }

    /// Element-wise sum of two tables.
    #[must_use]
    pub fn plus(&self, other: &IntentWeights) -> IntentWeights {
        let mut sum = *self;
        for (slot, extra) in sum.0.iter_mut().zip(other.0.iter()) {
            *slot += extra;
        }
        sum
    }
}

/// Behaviour archetype selecting the static intent base weights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Fast, opportunistic raiders.
    Skirmisher,
    /// Durable front-liners.
    Brute,
    /// Trap breakers.
    Sapper,
    /// Healers and casters.
    Mystic,
    /// Wave leaders.
    Boss,
}

impl Archetype {
    /// Static base weights over `[advance, pressure_traps, hunt, support, regroup]`.
    #[must_use]
    pub const fn base_weights(self) -> IntentWeights {
        match self {
            Self::Skirmisher => IntentWeights([1.0, 0.3, 0.8, 0.2, 0.2]),
            Self::Brute => IntentWeights([1.2, 0.2, 1.0, 0.1, 0.1]),
            Self::Sapper => IntentWeights([0.8, 1.2, 0.3, 0.2, 0.3]),
            Self::Mystic => IntentWeights([0.7, 0.2, 0.3, 1.2, 0.4]),
            Self::Boss => IntentWeights([1.4, 0.4, 0.9, 0.1, 0.0]),
        }
    }
}

/// Species-specific attacker strategy, selected once at spawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackerBehavior {
    /// No species-specific behaviour.
    #[default]
    Standard,
    /// Wanders off the path and dismantles hazards.
    Engineer,
    /// Periodically converts ally debuffs into haste.
    AuraCaster,
    /// Never forced to regroup and enrages once at half health.
    Boss,
}

/// Terrain class a unit can traverse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locomotion {
    /// Restricted to ground-traversable tiles.
    #[default]
    Ground,
    /// May cross any in-bounds tile.
    Flying,
}

/// Priority filter applied before distance comparison during targeting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFilter {
    /// Any opposing unit.
    #[default]
    Any,
    /// Flying units only.
    FlyingOnly,
    /// Ground units only.
    GroundOnly,
}

impl TargetFilter {
    /// Reports whether a unit with the given flying flag passes the filter.
    #[must_use]
    pub const fn admits(self, flying: bool) -> bool {
        match self {
            Self::Any => true,
            Self::FlyingOnly => flying,
            Self::GroundOnly => !flying,
        }
    }
}

/// Basic attack parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Base damage per hit.
    pub damage: f32,
    /// Category of the damage.
    pub damage_type: DamageType,
    /// Reach in tiles.
    pub range: f32,
    /// Seconds between hits.
    pub cooldown: f32,
    /// Status effect applied on hit, if any.
    #[serde(default)]
    pub effect: Option<StatusTemplate>,
}

/// Active ability families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    /// Area damage centred on the best blast point.
    Blast,
    /// Heal the most injured allies in range.
    HealAllies,
    /// Shield allies lacking a barrier.
    ShieldAllies,
    /// Damage a hazard directly.
    Disarm,
    /// Periodic effect on every ally in radius.
    Aura,
    /// Grant the caster a barrier.
    SelfShield,
    /// Restore hit points to the nearest damaged hazard.
    RepairHazard,
    /// Mark the caster as taunting.
    Taunt,
}

impl AbilityKind {
    /// Number of ability kinds.
    pub const COUNT: usize = 8;

    /// Dense index used by per-kind tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Blast => 0,
            Self::HealAllies => 1,
            Self::ShieldAllies => 2,
            Self::Disarm => 3,
            Self::Aura => 4,
            Self::SelfShield => 5,
            Self::RepairHazard => 6,
            Self::Taunt => 7,
        }
    }

    /// Reports whether the ability restores or protects allies.
    #[must_use]
    pub const fn is_supportive(self) -> bool {
        matches!(self, Self::HealAllies | Self::ShieldAllies)
    }
}

/// Raw ability record as it appears in the species table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityData {
    /// Family of the ability.
    pub kind: AbilityKind,
    /// Seconds between activations.
    #[serde(default)]
    pub cooldown: Option<f32>,
    /// Reach in tiles.
    #[serde(default)]
    pub range: Option<f32>,
    /// Damage, healing, barrier or repair amount.
    #[serde(default)]
    pub power: Option<f32>,
    /// Area radius in tiles.
    #[serde(default)]
    pub radius: Option<f32>,
    /// Effect duration in seconds.
    #[serde(default)]
    pub duration: Option<f32>,
    /// Upper bound on affected units.
    #[serde(default)]
    pub max_targets: Option<u32>,
    /// Damage category for offensive abilities.
    #[serde(default)]
    pub damage_type: Option<DamageType>,
    /// Status effect carried by the ability.
    #[serde(default)]
    pub effect: Option<StatusTemplate>,
}

impl AbilityData {
    /// Creates an empty record of the given kind; every field must be filled in.
    #[must_use]
    pub const fn new(kind: AbilityKind) -> Self {
        Self {
            kind,
            cooldown: None,
            range: None,
            power: None,
            radius: None,
            duration: None,
            max_targets: None,
            damage_type: None,
            effect: None,
        }
    }

    /// Validates the record into an executable [`AbilitySpec`].
    pub fn resolve(&self) -> Result<AbilitySpec, AbilityDataError> {
        let kind = self.kind;
        let cooldown = require(kind, "cooldown", self.cooldown)?;
        let (range, power, radius, duration) = match kind {
            AbilityKind::Blast => (
                require(kind, "range", self.range)?,
                require(kind, "power", self.power)?,
                require(kind, "radius", self.radius)?,
                0.0,
            ),
            AbilityKind::HealAllies | AbilityKind::Disarm | AbilityKind::RepairHazard => (
                require(kind, "range", self.range)?,
                require(kind, "power", self.power)?,
                0.0,
                0.0,
            ),
            AbilityKind::ShieldAllies => (
                require(kind, "range", self.range)?,
                require(kind, "power", self.power)?,
                0.0,
                require(kind, "duration", self.duration)?,
            ),
            AbilityKind::Aura => {
                if self.effect.is_none() {
                    return Err(AbilityDataError::MissingField {
                        kind,
                        field: "effect",
                    });
                }
                (0.0, 0.0, require(kind, "radius", self.radius)?, 0.0)
            }
            AbilityKind::SelfShield => (
                0.0,
                require(kind, "power", self.power)?,
                0.0,
                require(kind, "duration", self.duration)?,
            ),
            AbilityKind::Taunt => (0.0, 0.0, 0.0, require(kind, "duration", self.duration)?),
        };

        Ok(AbilitySpec {
            kind,
            cooldown,
            range,
            power,
            radius,
            duration,
            max_targets: self.max_targets.unwrap_or(DEFAULT_MAX_TARGETS).max(1),
            damage_type: self.damage_type.unwrap_or(DamageType::Physical),
            effect: self.effect,
        })
    }
}

const DEFAULT_MAX_TARGETS: u32 = 3;

fn require(
    kind: AbilityKind,
    field: &'static str,
    value: Option<f32>,
) -> Result<f32, AbilityDataError> {
    let value = value.ok_or(AbilityDataError::MissingField { kind, field })?;
    if !value.is_finite() || value < 0.0 {
        return Err(AbilityDataError::InvalidField { kind, field, value });
    }
    Ok(value)
}

/// Validated ability ready for execution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbilitySpec {
    /// Family of the ability.
    pub kind: AbilityKind,
    /// Seconds between activations.
    pub cooldown: f32,
    /// Reach in tiles.
    pub range: f32,
    /// Damage, healing, barrier or repair amount.
    pub power: f32,
    /// Area radius in tiles.
    pub radius: f32,
    /// Effect duration in seconds.
    pub duration: f32,
    /// Upper bound on affected units.
    pub max_targets: u32,
    /// Damage category for offensive abilities.
    pub damage_type: DamageType,
    /// Status effect carried by the ability.
    pub effect: Option<StatusTemplate>,
}

/// Extra damage while the attacker's own health is low.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LowHpBonus {
    /// Health ratio below which the bonus applies.
    pub threshold: f32,
    /// Damage multiplier while below the threshold.
    pub multiplier: f32,
}

/// Always-on defender traits evaluated every tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PassiveSpec {
    /// Heals `amount` every `interval` seconds.
    Regeneration {
        /// Hit points restored per pulse.
        amount: f32,
        /// Seconds between pulses.
        interval: f32,
    },
    /// Damages nearby attackers when the defender dies.
    DeathBurst {
        /// Damage dealt to each attacker in range.
        damage: f32,
        /// Burst radius in tiles.
        radius: f32,
        /// Category of the burst damage.
        damage_type: DamageType,
    },
    /// One-time haste and empower once health drops below `threshold`.
    Frenzy {
        /// Health ratio that unlocks the buff.
        threshold: f32,
        /// Buff duration in seconds.
        duration: f32,
        /// Speed multiplier while frenzied.
        speed: f32,
        /// Damage multiplier while frenzied.
        damage: f32,
    },
}

/// Optional species-specific defender movement extension.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefenderExtension {
    /// Wander around the home tile while idle.
    Patrol {
        /// Maximum patrol distance from home in tiles.
        radius: f32,
    },
}

/// Per-level scaling applied once at spawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelGrowth {
    /// Fractional hit point growth per level above one.
    #[serde(default)]
    pub hp: f32,
    /// Fractional damage growth per level above one.
    #[serde(default)]
    pub damage: f32,
}

impl LevelGrowth {
    /// Multipliers `(hp, damage)` for the given level.
    #[must_use]
    pub fn multipliers(&self, level: u32) -> (f32, f32) {
        let steps = level.saturating_sub(1) as f32;
        (
            (1.0 + self.hp * steps).max(0.0),
            (1.0 + self.damage * steps).max(0.0),
        )
    }
}

/// Template describing an attacking species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackerSpecies {
    /// Unique key.
    pub id: SpeciesId,
    /// Intent weight archetype.
    pub archetype: Archetype,
    /// Species strategy.
    #[serde(default)]
    pub behavior: AttackerBehavior,
    /// Hit points at level one.
    pub max_hp: f32,
    /// Base movement speed in tiles per second.
    pub speed: f32,
    /// Flying units ignore ground hazards.
    #[serde(default)]
    pub flying: bool,
    /// Radius of the controller's world snapshot.
    pub detection_radius: f32,
    /// Basic attack, if the species fights at all.
    #[serde(default)]
    pub attack: Option<AttackProfile>,
    /// Raw ability records.
    #[serde(default)]
    pub abilities: Vec<AbilityData>,
    /// Incoming damage resistances.
    #[serde(default)]
    pub resistances: Resistances,
    /// Health ratio below which a non-boss is forced to regroup.
    #[serde(default = "default_regroup_threshold")]
    pub regroup_threshold: f32,
    /// Chill applications that trigger a freeze; zero disables freezing.
    #[serde(default)]
    pub freeze_threshold: u32,
    /// Reward granted on death.
    #[serde(default)]
    pub reward: u32,
    /// Damage dealt to the player on reaching the goal.
    #[serde(default = "default_leak_damage")]
    pub leak_damage: u32,
    /// Optional one-time revive.
    #[serde(default)]
    pub revive: Option<ReviveRule>,
    /// Per-level scaling.
    #[serde(default)]
    pub growth: LevelGrowth,
}

fn default_regroup_threshold() -> f32 {
    0.3
}

fn default_leak_damage() -> u32 {
    1
}

/// Template describing a defending species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefenderSpecies {
    /// Unique key.
    pub id: SpeciesId,
    /// Hit points.
    pub max_hp: f32,
    /// Movement speed in tiles per second; zero for stationary defenders.
    #[serde(default)]
    pub move_speed: f32,
    /// Terrain class.
    #[serde(default)]
    pub locomotion: Locomotion,
    /// Radius within which targets are acquired.
    pub engagement_range: f32,
    /// Target priority filter.
    #[serde(default)]
    pub targeting: TargetFilter,
    /// Basic attack.
    pub attack: AttackProfile,
    /// Conditional damage bonus at low health.
    #[serde(default)]
    pub low_hp_bonus: Option<LowHpBonus>,
    /// Raw ability records.
    #[serde(default)]
    pub abilities: Vec<AbilityData>,
    /// Always-on passives.
    #[serde(default)]
    pub passives: Vec<PassiveSpec>,
    /// Incoming damage resistances.
    #[serde(default)]
    pub resistances: Resistances,
    /// Optional one-time revive.
    #[serde(default)]
    pub revive: Option<ReviveRule>,
    /// Optional movement extension.
    #[serde(default)]
    pub extension: Option<DefenderExtension>,
    /// Maximum pursuit distance from home; unbounded when absent.
    #[serde(default)]
    pub leash_radius: Option<f32>,
    /// Chill applications that trigger a freeze; zero disables freezing.
    #[serde(default)]
    pub freeze_threshold: u32,
}

/// Immutable roster of every species the world may create.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTable {
    #[serde(default)]
    attackers: Vec<AttackerSpecies>,
    #[serde(default)]
    defenders: Vec<DefenderSpecies>,
    #[serde(skip)]
    attacker_index: BTreeMap<SpeciesId, usize>,
    #[serde(skip)]
    defender_index: BTreeMap<SpeciesId, usize>,
}

impl SpeciesTable {
    /// Builds a table, rejecting duplicate identifiers and unbounded patrols.
    pub fn new(
        attackers: Vec<AttackerSpecies>,
        defenders: Vec<DefenderSpecies>,
    ) -> Result<Self, ConfigError> {
        let mut table = Self {
            attackers,
            defenders,
            attacker_index: BTreeMap::new(),
            defender_index: BTreeMap::new(),
        };
        table.reindex()?;
        Ok(table)
    }

    /// Parses a table from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let parsed: SpeciesTable = toml::from_str(text)?;
        Self::new(parsed.attackers, parsed.defenders)
    }

    /// Looks up an attacking species.
    #[must_use]
    pub fn attacker(&self, id: &SpeciesId) -> Option<&AttackerSpecies> {
        self.attacker_index
            .get(id)
            .and_then(|index| self.attackers.get(*index))
    }

    /// Looks up a defending species.
    #[must_use]
    pub fn defender(&self, id: &SpeciesId) -> Option<&DefenderSpecies> {
        self.defender_index
            .get(id)
            .and_then(|index| self.defenders.get(*index))
    }

    /// Attacking species in declaration order.
    #[must_use]
    pub fn attackers(&self) -> &[AttackerSpecies] {
        &self.attackers
    }

    /// Defending species in declaration order.
    #[must_use]
    pub fn defenders(&self) -> &[DefenderSpecies] {
        &self.defenders
    }

    fn reindex(&mut self) -> Result<(), ConfigError> {
        self.attacker_index.clear();
        self.defender_index.clear();
        for (index, species) in self.attackers.iter().enumerate() {
            if self.attacker_index.insert(species.id.clone(), index).is_some() {
                return Err(ConfigError::DuplicateSpecies(species.id.clone()));
            }
        }
        for (index, species) in self.defenders.iter().enumerate() {
            if self.defender_index.insert(species.id.clone(), index).is_some() {
                return Err(ConfigError::DuplicateSpecies(species.id.clone()));
            }
            if let Some(DefenderExtension::Patrol { radius }) = species.extension {
                if !crate::config::is_amplitude(radius) {
                    return Err(ConfigError::Invalid(
                        "patrol radius must be finite and non-negative",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StatusKind;

    #[test]
    fn blast_requires_radius() {
        let mut data = AbilityData::new(AbilityKind::Blast);
        data.cooldown = Some(2.0);
        data.range = Some(4.0);
        data.power = Some(10.0);

        assert_eq!(
            data.resolve(),
            Err(AbilityDataError::MissingField {
                kind: AbilityKind::Blast,
                field: "radius",
            })
        );

        data.radius = Some(1.5);
        let spec = data.resolve().expect("complete blast record");
        assert_eq!(spec.radius, 1.5);
        assert_eq!(spec.max_targets, DEFAULT_MAX_TARGETS);
        assert_eq!(spec.damage_type, DamageType::Physical);
    }

    #[test]
    fn negative_cooldown_is_rejected() {
        let mut data = AbilityData::new(AbilityKind::Taunt);
        data.cooldown = Some(-1.0);
        data.duration = Some(2.0);
        assert!(matches!(
            data.resolve(),
            Err(AbilityDataError::InvalidField { field: "cooldown", .. })
        ));
    }

    #[test]
    fn aura_requires_effect() {
        let mut data = AbilityData::new(AbilityKind::Aura);
        data.cooldown = Some(3.0);
        data.radius = Some(2.0);
        assert!(data.resolve().is_err());

        data.effect = Some(StatusTemplate::new(StatusKind::Haste, 2.0, 1.3));
        assert!(data.resolve().is_ok());
    }

    #[test]
    fn level_growth_is_linear_above_level_one() {
        let growth = LevelGrowth { hp: 0.5, damage: 0.1 };
        assert_eq!(growth.multipliers(1), (1.0, 1.0));
        let (hp, damage) = growth.multipliers(3);
        assert!((hp - 2.0).abs() < 1e-6);
        assert!((damage - 1.2).abs() < 1e-6);
    }

    #[test]
    fn target_filter_admits_matching_units() {
        assert!(TargetFilter::FlyingOnly.admits(true));
        assert!(!TargetFilter::FlyingOnly.admits(false));
        assert!(TargetFilter::GroundOnly.admits(false));
        assert!(TargetFilter::Any.admits(true));
    }

    #[test]
    fn archetype_weights_are_non_negative() {
        for archetype in [
            Archetype::Skirmisher,
            Archetype::Brute,
            Archetype::Sapper,
            Archetype::Mystic,
            Archetype::Boss,
        ] {
            assert!(archetype.base_weights().0.iter().all(|weight| *weight >= 0.0));
        }
    }

    #[test]
    fn unbounded_patrol_radius_is_rejected() {
        let text = r#"
            [[defenders]]
            id = "sentry"
            max_hp = 50.0
            engagement_range = 3.0
            attack = { damage = 5.0, damage_type = "physical", range = 3.0, cooldown = 1.0 }
            extension = { kind = "patrol", radius = inf }
        "#;
        assert!(matches!(
            SpeciesTable::from_toml_str(text),
            Err(ConfigError::Invalid(_))
        ));
    }
}
