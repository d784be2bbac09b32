//! Typed errors shared across the workspace.

use thiserror::Error;

use crate::{AbilityKind, SpeciesId, TileCoord};

/// Errors raised while building a grid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The layout has zero columns or rows.
    #[error("grid dimensions must be non-zero")]
    EmptyLayout,
    /// A row's length differs from the first row.
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based row index.
        row: u32,
        /// Tiles found on the row.
        found: u32,
        /// Tiles found on the first row.
        expected: u32,
    },
    /// A character does not name a tile kind.
    #[error("unknown tile character {symbol:?} at column {column}, row {row}")]
    UnknownTile {
        /// Offending character.
        symbol: char,
        /// Zero-based column index.
        column: u32,
        /// Zero-based row index.
        row: u32,
    },
}

/// Raised when an ability record lacks or corrupts a field its kind requires.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum AbilityDataError {
    /// A required field is absent.
    #[error("{kind:?} ability is missing required field `{field}`")]
    MissingField {
        /// Ability family.
        kind: AbilityKind,
        /// Name of the missing field.
        field: &'static str,
    },
    /// A field is negative or not finite.
    #[error("{kind:?} ability has invalid `{field}` = {value}")]
    InvalidField {
        /// Ability family.
        kind: AbilityKind,
        /// Name of the invalid field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Reasons a spawn request is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// The species is not in the table.
    #[error("unknown attacker species `{0}`")]
    UnknownSpecies(SpeciesId),
    /// The starting tile lies outside the grid.
    #[error("start tile {0:?} is out of bounds")]
    OutOfBounds(TileCoord),
    /// The starting tile cannot be stood on.
    #[error("start tile {0:?} is not traversable")]
    NotTraversable(TileCoord),
    /// The grid has no goal tile to walk toward.
    #[error("grid has no goal tile")]
    NoGoal,
}

/// Reasons a placement is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// The species is not in the table.
    #[error("unknown defender species `{0}`")]
    UnknownSpecies(SpeciesId),
    /// The tile lies outside the grid.
    #[error("tile {0:?} is out of bounds")]
    OutOfBounds(TileCoord),
    /// Another hazard or defender already holds the tile.
    #[error("tile {0:?} is occupied")]
    Occupied(TileCoord),
    /// The unit's locomotion cannot stand on the tile.
    #[error("tile {0:?} is not traversable for this unit")]
    NotTraversable(TileCoord),
}

/// Errors raised while loading configuration or species data.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text failed to parse.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is outside its accepted range.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    /// Two species share one identifier.
    #[error("species `{0}` is declared more than once")]
    DuplicateSpecies(SpeciesId),
}
