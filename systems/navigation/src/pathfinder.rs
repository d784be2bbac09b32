//! A* search over the tile map and the fallback policy wrapped around it.

use std::collections::BTreeMap;

use rampart_core::{Locomotion, TileCoord};
use tracing::warn;

use crate::{Grid, PriorityQueue};

/// A* search with reusable scratch buffers.
///
/// Expansion is restricted to 4-directional walkable neighbours weighted by
/// the cost of the tile being entered; the heuristic is Manhattan distance,
/// which never overestimates because every tile costs at least one.
#[derive(Debug, Default)]
pub struct PathFinder {
    open: PriorityQueue<TileCoord>,
    best: Vec<f32>,
    parent: Vec<Option<TileCoord>>,
    closed: Vec<bool>,
}

impl PathFinder {
    /// Creates a path finder with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a cost-optimal path from `start` to `goal`, both included.
    ///
    /// Returns `None` when the goal is out of bounds, not walkable for the
    /// locomotion class, or unreachable. The start tile itself is never
    /// checked for walkability so a unit standing on odd terrain can still
    /// leave it.
    pub fn find_path(
        &mut self,
        grid: &Grid,
        start: TileCoord,
        goal: TileCoord,
        locomotion: Locomotion,
    ) -> Option<Vec<TileCoord>> {
        if !grid.contains(start) || !grid.is_walkable(goal, locomotion) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }

        self.reset(grid.tile_count());
        let start_index = grid.index(start)?;
        self.best[start_index] = 0.0;
        self.open.push(start, heuristic(start, goal));

        while let Some((tile, _)) = self.open.pop() {
            let Some(index) = grid.index(tile) else {
                continue;
            };
            if self.closed[index] {
                continue;
            }
            self.closed[index] = true;

            if tile == goal {
                return Some(self.reconstruct(grid, goal));
            }

            let base = self.best[index];
            for neighbor in grid.neighbors(tile) {
                if !grid.is_walkable(neighbor, locomotion) {
                    continue;
                }
                let Some(neighbor_index) = grid.index(neighbor) else {
                    continue;
                };
                if self.closed[neighbor_index] {
                    continue;
                }
                let step = grid.cost(neighbor).unwrap_or(1.0);
                let tentative = base + step;
                if tentative < self.best[neighbor_index] {
                    self.best[neighbor_index] = tentative;
                    self.parent[neighbor_index] = Some(tile);
                    self.open.push(neighbor, tentative + heuristic(neighbor, goal));
                }
            }
        }

        None
    }

    fn reset(&mut self, tiles: usize) {
        self.open.clear();
        self.best.clear();
        self.best.resize(tiles, f32::INFINITY);
        self.parent.clear();
        self.parent.resize(tiles, None);
        self.closed.clear();
        self.closed.resize(tiles, false);
    }

    fn reconstruct(&self, grid: &Grid, goal: TileCoord) -> Vec<TileCoord> {
        let mut path = vec![goal];
        let mut cursor = goal;
        while let Some(previous) = grid
            .index(cursor)
            .and_then(|index| self.parent.get(index).copied().flatten())
        {
            path.push(previous);
            cursor = previous;
        }
        path.reverse();
        path
    }
}

fn heuristic(from: TileCoord, to: TileCoord) -> f32 {
    from.manhattan_distance(to) as f32
}

/// Sum of entry costs along a path, excluding the starting tile.
///
/// Returns `None` if any step leaves the grid.
#[must_use]
pub fn path_cost(grid: &Grid, path: &[TileCoord]) -> Option<f32> {
    path.iter()
        .skip(1)
        .map(|tile| grid.cost(*tile))
        .sum::<Option<f32>>()
}

/// How a [`PlannedPath`] was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanOutcome {
    /// A search succeeded.
    Found,
    /// The search failed and the last-known default path was reused.
    Fallback,
    /// No path and no default exist; the unit holds position.
    Stationary,
}

/// Path handed to a unit; never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedPath {
    /// Ordered waypoints starting at the unit's tile.
    pub tiles: Vec<TileCoord>,
    /// How the waypoints were obtained.
    pub outcome: PlanOutcome,
}

/// Path finder wrapped with the no-path recovery policy.
///
/// Every successful ground search to a goal becomes that goal's default
/// path. A failed search reuses the default, joined from the unit's current
/// tile; with no default the unit receives a single-tile stationary path.
#[derive(Debug, Default)]
pub struct PathPlanner {
    finder: PathFinder,
    defaults: BTreeMap<TileCoord, Vec<TileCoord>>,
}

impl PathPlanner {
    /// Creates a planner without default paths.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw ground search without any fallback.
    pub fn find_path(
        &mut self,
        grid: &Grid,
        start: TileCoord,
        goal: TileCoord,
    ) -> Option<Vec<TileCoord>> {
        self.finder.find_path(grid, start, goal, Locomotion::Ground)
    }

    /// Plans a path, applying the fallback policy on failure.
    pub fn plan(
        &mut self,
        grid: &Grid,
        start: TileCoord,
        goal: TileCoord,
        locomotion: Locomotion,
    ) -> PlannedPath {
        if let Some(tiles) = self.finder.find_path(grid, start, goal, locomotion) {
            if locomotion == Locomotion::Ground {
                let _ = self.defaults.insert(goal, tiles.clone());
            }
            return PlannedPath {
                tiles,
                outcome: PlanOutcome::Found,
            };
        }

        if let Some(default) = self.defaults.get(&goal) {
            warn!(?start, ?goal, "no path found; reusing default path");
            return PlannedPath {
                tiles: join_from(start, default),
                outcome: PlanOutcome::Fallback,
            };
        }

        warn!(?start, ?goal, "no path found and no default; unit holds position");
        PlannedPath {
            tiles: vec![start],
            outcome: PlanOutcome::Stationary,
        }
    }

    /// Replaces the default path toward `goal`.
    pub fn set_default_path(&mut self, goal: TileCoord, path: Vec<TileCoord>) {
        if path.is_empty() {
            let _ = self.defaults.remove(&goal);
        } else {
            let _ = self.defaults.insert(goal, path);
        }
    }

    /// Default path toward `goal`, if one is known.
    #[must_use]
    pub fn default_path(&self, goal: TileCoord) -> Option<&[TileCoord]> {
        self.defaults.get(&goal).map(Vec::as_slice)
    }

    /// Forgets every default path, for example after the grid is replaced.
    pub fn forget_defaults(&mut self) {
        self.defaults.clear();
    }
}

fn join_from(start: TileCoord, default: &[TileCoord]) -> Vec<TileCoord> {
    let nearest = default
        .iter()
        .enumerate()
        .min_by_key(|(index, tile)| (tile.manhattan_distance(start), *index))
        .map_or(0, |(index, _)| index);
    let mut tiles = Vec::with_capacity(default.len() - nearest + 1);
    if default.get(nearest) != Some(&start) {
        tiles.push(start);
    }
    tiles.extend_from_slice(&default[nearest..]);
    tiles
}
