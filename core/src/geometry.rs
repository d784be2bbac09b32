//! Tile coordinates, cardinal directions and continuous-space helpers.
//!
//! Continuous positions are expressed in tile units: the tile at column `c`
//! and row `r` spans `[c, c + 1) x [r, r + 1)` and its center sits at
//! `(c + 0.5, r + 0.5)`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Center of the tile in continuous tile units.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.column as f32 + 0.5, self.row as f32 + 0.5)
    }

    /// Tile that contains the provided continuous position, if it is not negative.
    #[must_use]
    pub fn containing(position: Vec2) -> Option<Self> {
        if !position.x.is_finite() || !position.y.is_finite() {
            return None;
        }
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        Some(Self::new(position.x.floor() as u32, position.y.floor() as u32))
    }

    /// Neighbouring coordinate one step in `direction`, unless it underflows.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::East => self
                .column
                .checked_add(1)
                .map(|column| Self::new(column, self.row)),
            Direction::South => self.row.checked_add(1).map(|row| Self::new(self.column, row)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
        }
    }

    /// Direction of a single cardinal step from `self` to `to`.
    #[must_use]
    pub fn direction_to(self, to: TileCoord) -> Option<Direction> {
        let column_diff = self.column.abs_diff(to.column);
        let row_diff = self.row.abs_diff(to.row);
        if column_diff + row_diff != 1 {
            return None;
        }

        if column_diff == 1 {
            if to.column > self.column {
                Some(Direction::East)
            } else {
                Some(Direction::West)
            }
        } else if to.row > self.row {
            Some(Direction::South)
        } else {
            Some(Direction::North)
        }
    }

    /// Dominant cardinal heading from `self` toward `to`, or `None` when equal.
    ///
    /// Horizontal travel wins ties so repeated calls produce the same heading.
    #[must_use]
    pub fn heading_to(self, to: TileCoord) -> Option<Direction> {
        let dx = i64::from(to.column) - i64::from(self.column);
        let dy = i64::from(to.row) - i64::from(self.row);
        if dx == 0 && dy == 0 {
            return None;
        }
        if dx.abs() >= dy.abs() {
            Some(if dx > 0 { Direction::East } else { Direction::West })
        } else {
            Some(if dy > 0 { Direction::South } else { Direction::North })
        }
    }
}

/// Cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// All four directions in clockwise order starting north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Reports whether the two directions are perpendicular.
    #[must_use]
    pub fn is_lateral_to(self, other: Direction) -> bool {
        self != other && self != other.opposite()
    }

    /// Dominant cardinal direction of a continuous vector.
    #[must_use]
    pub fn from_vector(vector: Vec2) -> Option<Self> {
        if vector.length_squared() <= f32::EPSILON {
            return None;
        }
        if vector.x.abs() >= vector.y.abs() {
            Some(if vector.x > 0.0 { Self::East } else { Self::West })
        } else {
            Some(if vector.y > 0.0 { Self::South } else { Self::North })
        }
    }
}

/// Axis-aligned rectangle in continuous tile units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    min: Vec2,
    max: Vec2,
}

impl Rect {
    /// Builds a rectangle from two corners in any order.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Square that bounds a circle.
    #[must_use]
    pub fn around(center: Vec2, radius: f32) -> Self {
        let extent = Vec2::splat(radius.max(0.0));
        Self::from_corners(center - extent, center + extent)
    }

    /// Lower corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper corner.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Center point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Reports whether two rectangles overlap, edges included.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Reports whether the rectangle overlaps a circle.
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }

    /// Splits the rectangle into four equal quadrants: NW, NE, SW, SE.
    #[must_use]
    pub fn quadrants(&self) -> [Rect; 4] {
        let mid = self.center();
        [
            Rect::from_corners(self.min, mid),
            Rect::from_corners(Vec2::new(mid.x, self.min.y), Vec2::new(self.max.x, mid.y)),
            Rect::from_corners(Vec2::new(self.min.x, mid.y), Vec2::new(mid.x, self.max.y)),
            Rect::from_corners(mid, self.max),
        ]
    }
}
