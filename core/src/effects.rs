//! Damage categories and status-effect payloads.

use serde::{Deserialize, Serialize};

use crate::EntityRef;

/// Category of incoming damage used to look up resistances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Blades, arrows and blunt force.
    Physical,
    /// Flames; amplified against oiled targets.
    Fire,
    /// Frost; feeds the chill/freeze interaction.
    Ice,
    /// Toxins.
    Poison,
    /// Electrical discharge.
    Lightning,
    /// Magical force.
    Arcane,
}

/// Semantic family of a status effect.
///
/// At most one live instance per family exists on an agent; only
/// [`StatusKind::Bleed`] stacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Damage over time that stacks up to the bleed cap.
    Bleed,
    /// Fire damage over time, doubled while oiled.
    Burn,
    /// Toxic damage over time.
    Poison,
    /// Multiplies movement speed by the magnitude.
    Slow,
    /// Prevents movement and actions.
    Stun,
    /// Raises fire vulnerability.
    Oiled,
    /// Grants a barrier equal to the magnitude.
    Shield,
    /// Scrambles movement direction choice.
    Confuse,
    /// Ice family: slows and accumulates toward a freeze.
    Chill,
    /// Stun-like state produced by enough chill; leaves the target shatter-vulnerable.
    Freeze,
    /// Multiplies movement speed by the magnitude (buff).
    Haste,
    /// Restores the magnitude in hit points per second.
    Regen,
    /// Multiplies outgoing damage by the magnitude.
    Empower,
    /// Forces opposing target acquisition onto the holder.
    Taunt,
}

impl StatusKind {
    /// Reports whether cleanse removes the effect.
    #[must_use]
    pub const fn is_debuff(self) -> bool {
        matches!(
            self,
            Self::Bleed
                | Self::Burn
                | Self::Poison
                | Self::Slow
                | Self::Stun
                | Self::Oiled
                | Self::Confuse
                | Self::Chill
                | Self::Freeze
        )
    }

    /// Reports whether repeated applications stack instead of refreshing.
    #[must_use]
    pub const fn is_stackable(self) -> bool {
        matches!(self, Self::Bleed)
    }

    /// Reports whether the effect deals damage every tick.
    #[must_use]
    pub const fn is_damage_over_time(self) -> bool {
        matches!(self, Self::Bleed | Self::Burn | Self::Poison)
    }
}

/// Blueprint for a status effect carried by abilities and hazards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusTemplate {
    /// Family of the effect to create.
    pub kind: StatusKind,
    /// Full duration in seconds.
    pub duration: f32,
    /// Family-specific payload (damage per second, speed multiplier, barrier, ...).
    pub magnitude: f32,
}

impl StatusTemplate {
    /// Creates a new template.
    #[must_use]
    pub const fn new(kind: StatusKind, duration: f32, magnitude: f32) -> Self {
        Self {
            kind,
            duration,
            magnitude,
        }
    }

    /// Instantiates a live effect attributed to `source`.
    #[must_use]
    pub fn instantiate(&self, source: Option<EntityRef>) -> StatusEffect {
        StatusEffect::new(self.kind, self.duration, self.magnitude).with_source(source)
    }
}

/// Live status effect attached to an agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Family of the effect.
    pub kind: StatusKind,
    /// Seconds left before the effect expires.
    pub remaining: f32,
    /// Full duration the effect was last refreshed to.
    pub duration: f32,
    /// Family-specific payload.
    pub magnitude: f32,
    /// Number of merged applications; always 1 for non-stackable families.
    pub stacks: u8,
    /// Entity that applied the effect, if any.
    pub source: Option<EntityRef>,
    /// Set once a one-shot grant (such as a shield barrier) has been applied.
    pub granted: bool,
}

impl StatusEffect {
    /// Creates a fresh single-stack effect.
    #[must_use]
    pub fn new(kind: StatusKind, duration: f32, magnitude: f32) -> Self {
        let duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        Self {
            kind,
            remaining: duration,
            duration,
            magnitude,
            stacks: 1,
            source: None,
            granted: false,
        }
    }

    /// Attributes the effect to an entity.
    #[must_use]
    pub fn with_source(mut self, source: Option<EntityRef>) -> Self {
        self.source = source;
        self
    }
}
