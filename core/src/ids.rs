//! Identifiers allocated by the world.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates a new identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

numeric_id!(
    /// Unique identifier assigned to an attacking agent.
    AttackerId
);
numeric_id!(
    /// Unique identifier assigned to a defending agent.
    DefenderId
);
numeric_id!(
    /// Unique identifier assigned to a hazard.
    HazardId
);

/// Weak reference to any entity living in the world.
///
/// References are lookups only; the world may have removed the entity since
/// the reference was captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityRef {
    /// An attacking agent.
    Attacker(AttackerId),
    /// A defending agent.
    Defender(DefenderId),
    /// A hazard placed on the grid.
    Hazard(HazardId),
}

/// Key into the species table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(String);

impl SpeciesId {
    /// Creates a species identifier from any string-like value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrowed string form of the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpeciesId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
