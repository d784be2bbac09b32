//! Dense row-major tile map.

use glam::Vec2;
use rampart_core::{
    AttackerId, DefenderId, Direction, GridError, HazardId, Locomotion, Rect, TileCoord,
};

/// Terrain class of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Open ground.
    Empty,
    /// Marked lane.
    Path,
    /// Attacker entry point.
    Spawn,
    /// Attacker destination.
    Goal,
    /// Raised ground reserved for defenders and flyers.
    Elevated,
    /// Impassable for ground units.
    Pit,
}

impl TileKind {
    /// Parses a layout character.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Self::Empty),
            '#' => Some(Self::Path),
            'S' => Some(Self::Spawn),
            'G' => Some(Self::Goal),
            '^' => Some(Self::Elevated),
            'O' => Some(Self::Pit),
            _ => None,
        }
    }

    /// Layout character of the kind.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Path => '#',
            Self::Spawn => 'S',
            Self::Goal => 'G',
            Self::Elevated => '^',
            Self::Pit => 'O',
        }
    }

    /// Reports whether attackers on foot may walk the tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Empty | Self::Path | Self::Spawn | Self::Goal)
    }
}

/// Single cell of the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    kind: TileKind,
    cost: f32,
    hazard: Option<HazardId>,
    defender: Option<DefenderId>,
    attackers: Vec<AttackerId>,
}

impl Tile {
    const fn new(kind: TileKind) -> Self {
        Self {
            kind,
            cost: 1.0,
            hazard: None,
            defender: None,
            attackers: Vec::new(),
        }
    }

    /// Terrain class.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Reports whether ground attackers may walk the tile.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.kind.is_walkable()
    }

    /// Path cost, never below one.
    #[must_use]
    pub const fn cost(&self) -> f32 {
        self.cost
    }

    /// Hazard placed on the tile.
    #[must_use]
    pub const fn hazard(&self) -> Option<HazardId> {
        self.hazard
    }

    /// Defender placed on the tile.
    #[must_use]
    pub const fn defender(&self) -> Option<DefenderId> {
        self.defender
    }

    /// Attackers standing on the tile, sorted by id.
    #[must_use]
    pub fn attackers(&self) -> &[AttackerId] {
        &self.attackers
    }

    /// Reports whether a hazard or defender holds the tile.
    ///
    /// Attackers never block placement.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.hazard.is_some() || self.defender.is_some()
    }
}

/// Rectangular tile map with per-tile cost and occupancy back-references.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid of empty tiles.
    pub fn new(columns: u32, rows: u32) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::EmptyLayout);
        }
        let count = (columns as usize) * (rows as usize);
        Ok(Self {
            columns,
            rows,
            tiles: vec![Tile::new(TileKind::Empty); count],
        })
    }

    /// Parses an ASCII layout, one text line per row.
    ///
    /// Blank lines and surrounding whitespace are ignored.
    pub fn parse(layout: &str) -> Result<Self, GridError> {
        let lines: Vec<&str> = layout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(first) = lines.first() else {
            return Err(GridError::EmptyLayout);
        };
        let columns = first.chars().count() as u32;
        let mut grid = Self::new(columns, lines.len() as u32)?;

        for (row, line) in lines.iter().enumerate() {
            let row = row as u32;
            let found = line.chars().count() as u32;
            if found != columns {
                return Err(GridError::RaggedRow {
                    row,
                    found,
                    expected: columns,
                });
            }
            for (column, symbol) in line.chars().enumerate() {
                let column = column as u32;
                let kind = TileKind::from_symbol(symbol).ok_or(GridError::UnknownTile {
                    symbol,
                    column,
                    row,
                })?;
                grid.set_kind(TileCoord::new(column, row), kind);
            }
        }
        Ok(grid)
    }

    /// Number of columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Continuous bounds of the map in tile units.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_corners(
            Vec2::ZERO,
            Vec2::new(self.columns as f32, self.rows as f32),
        )
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, tile: TileCoord) -> bool {
        tile.column() < self.columns && tile.row() < self.rows
    }

    /// Tile at the coordinate, or `None` when out of bounds.
    #[must_use]
    pub fn tile(&self, tile: TileCoord) -> Option<&Tile> {
        self.index(tile).and_then(|index| self.tiles.get(index))
    }

    /// Terrain class at the coordinate.
    #[must_use]
    pub fn kind(&self, tile: TileCoord) -> Option<TileKind> {
        self.tile(tile).map(Tile::kind)
    }

    /// Path cost at the coordinate.
    #[must_use]
    pub fn cost(&self, tile: TileCoord) -> Option<f32> {
        self.tile(tile).map(Tile::cost)
    }

    /// Replaces the terrain class; out-of-bounds coordinates are ignored.
    pub fn set_kind(&mut self, tile: TileCoord, kind: TileKind) {
        if let Some(slot) = self.tile_mut(tile) {
            slot.kind = kind;
        }
    }

    /// Reports whether a unit with the given locomotion may stand on the tile.
    ///
    /// Ground attackers use [`Grid::is_walkable`]; this broader test also
    /// admits elevated ground for ground defenders.
    #[must_use]
    pub fn is_traversable(&self, tile: TileCoord, locomotion: Locomotion) -> bool {
        match (self.kind(tile), locomotion) {
            (None, _) => false,
            (Some(_), Locomotion::Flying) => true,
            (Some(kind), Locomotion::Ground) => kind.is_walkable() || kind == TileKind::Elevated,
        }
    }

    /// Reports whether the tile can appear on a path for the given locomotion.
    #[must_use]
    pub fn is_walkable(&self, tile: TileCoord, locomotion: Locomotion) -> bool {
        match (self.kind(tile), locomotion) {
            (None, _) => false,
            (Some(_), Locomotion::Flying) => true,
            (Some(kind), Locomotion::Ground) => kind.is_walkable(),
        }
    }

    /// Coordinates of every tile of the given kind in row-major order.
    pub fn tiles_of(&self, kind: TileKind) -> impl Iterator<Item = TileCoord> + '_ {
        self.coords().filter(move |tile| self.kind(*tile) == Some(kind))
    }

    /// Every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> {
        let columns = self.columns;
        (0..self.rows)
            .flat_map(move |row| (0..columns).map(move |column| TileCoord::new(column, row)))
    }

    /// In-bounds cardinal neighbours in north, east, south, west order.
    pub fn neighbors(&self, tile: TileCoord) -> impl Iterator<Item = TileCoord> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| tile.step(direction))
            .filter(move |neighbor| self.contains(*neighbor))
    }

    /// Records the hazard occupying a tile.
    pub fn set_hazard(&mut self, tile: TileCoord, hazard: Option<HazardId>) {
        if let Some(slot) = self.tile_mut(tile) {
            slot.hazard = hazard;
        }
    }

    /// Records the defender occupying a tile.
    pub fn set_defender(&mut self, tile: TileCoord, defender: Option<DefenderId>) {
        if let Some(slot) = self.tile_mut(tile) {
            slot.defender = defender;
        }
    }

    /// Records an attacker standing on a tile.
    pub fn add_attacker(&mut self, tile: TileCoord, attacker: AttackerId) {
        if let Some(slot) = self.tile_mut(tile) {
            if let Err(index) = slot.attackers.binary_search(&attacker) {
                slot.attackers.insert(index, attacker);
            }
        }
    }

    /// Forgets an attacker standing on a tile.
    pub fn remove_attacker(&mut self, tile: TileCoord, attacker: AttackerId) {
        if let Some(slot) = self.tile_mut(tile) {
            if let Ok(index) = slot.attackers.binary_search(&attacker) {
                let _ = slot.attackers.remove(index);
            }
        }
    }

    /// Resets every tile to the base cost of one.
    pub fn reset_costs(&mut self) {
        for tile in &mut self.tiles {
            tile.cost = 1.0;
        }
    }

    /// Sets a tile's cost, clamping anything below one (or non-finite) to one.
    pub fn set_cost(&mut self, tile: TileCoord, cost: f32) {
        if let Some(slot) = self.tile_mut(tile) {
            slot.cost = if cost.is_finite() { cost.max(1.0) } else { 1.0 };
        }
    }

    /// Removes every occupancy back-reference.
    pub fn clear_occupancy(&mut self) {
        for tile in &mut self.tiles {
            tile.hazard = None;
            tile.defender = None;
            tile.attackers.clear();
        }
    }

    pub(crate) fn index(&self, tile: TileCoord) -> Option<usize> {
        if !self.contains(tile) {
            return None;
        }
        let column = usize::try_from(tile.column()).ok()?;
        let row = usize::try_from(tile.row()).ok()?;
        row.checked_mul(self.columns as usize)?.checked_add(column)
    }

    pub(crate) fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    fn tile_mut(&mut self, tile: TileCoord) -> Option<&mut Tile> {
        let index = self.index(tile)?;
        self.tiles.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str = "
        S##.
        .^#O
        ..#G
    ";

    #[test]
    fn parse_reads_every_symbol() {
        let grid = Grid::parse(LAYOUT).expect("valid layout");
        assert_eq!(grid.columns(), 4);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.kind(TileCoord::new(0, 0)), Some(TileKind::Spawn));
        assert_eq!(grid.kind(TileCoord::new(1, 1)), Some(TileKind::Elevated));
        assert_eq!(grid.kind(TileCoord::new(3, 1)), Some(TileKind::Pit));
        assert_eq!(grid.tiles_of(TileKind::Goal).collect::<Vec<_>>(), vec![TileCoord::new(3, 2)]);
    }

    #[test]
    fn parse_rejects_ragged_rows() {
        assert_eq!(
            Grid::parse("..\n..."),
            Err(GridError::RaggedRow {
                row: 1,
                found: 3,
                expected: 2,
            })
        );
        assert!(matches!(Grid::parse("..x"), Err(GridError::UnknownTile { symbol: 'x', .. })));
        assert_eq!(Grid::parse("  \n"), Err(GridError::EmptyLayout));
    }

    #[test]
    fn out_of_bounds_lookups_return_none() {
        let grid = Grid::new(2, 2).expect("grid");
        assert!(grid.tile(TileCoord::new(2, 0)).is_none());
        assert!(grid.cost(TileCoord::new(0, 5)).is_none());
        assert!(!grid.is_traversable(TileCoord::new(9, 9), Locomotion::Flying));
    }

    #[test]
    fn locomotion_controls_traversal() {
        let grid = Grid::parse(LAYOUT).expect("valid layout");
        let elevated = TileCoord::new(1, 1);
        let pit = TileCoord::new(3, 1);

        assert!(!grid.is_walkable(elevated, Locomotion::Ground));
        assert!(grid.is_traversable(elevated, Locomotion::Ground));
        assert!(!grid.is_traversable(pit, Locomotion::Ground));
        assert!(grid.is_walkable(pit, Locomotion::Flying));
    }

    #[test]
    fn attacker_occupancy_is_tracked_per_tile() {
        let mut grid = Grid::new(2, 1).expect("grid");
        let tile = TileCoord::new(0, 0);
        grid.add_attacker(tile, AttackerId::new(4));
        grid.add_attacker(tile, AttackerId::new(1));
        grid.add_attacker(tile, AttackerId::new(4));
        grid.add_attacker(TileCoord::new(7, 0), AttackerId::new(2));

        let slot = grid.tile(tile).expect("in bounds");
        assert_eq!(slot.attackers(), &[AttackerId::new(1), AttackerId::new(4)]);
        assert!(!slot.is_occupied());

        grid.remove_attacker(tile, AttackerId::new(1));
        grid.remove_attacker(tile, AttackerId::new(9));
        assert_eq!(grid.tile(tile).map(Tile::attackers), Some(&[AttackerId::new(4)][..]));

        grid.clear_occupancy();
        assert!(grid.tile(tile).is_some_and(|slot| slot.attackers().is_empty()));
    }

    #[test]
    fn costs_never_drop_below_one() {
        let mut grid = Grid::new(3, 3).expect("grid");
        let tile = TileCoord::new(1, 1);
        grid.set_cost(tile, 0.2);
        assert_eq!(grid.cost(tile), Some(1.0));
        grid.set_cost(tile, f32::NAN);
        assert_eq!(grid.cost(tile), Some(1.0));
        grid.set_cost(tile, 4.5);
        assert_eq!(grid.cost(tile), Some(4.5));
    }

    #[test]
    fn neighbors_stay_in_bounds() {
        let grid = Grid::new(3, 3).expect("grid");
        let corner: Vec<_> = grid.neighbors(TileCoord::new(0, 0)).collect();
        assert_eq!(corner, vec![TileCoord::new(1, 0), TileCoord::new(0, 1)]);
        assert_eq!(grid.neighbors(TileCoord::new(1, 1)).count(), 4);
    }
}
