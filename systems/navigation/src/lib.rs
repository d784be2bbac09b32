#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid, priority queue and A* path finding over a hazard-weighted cost map.
//!
//! Tile cost is `1 + danger` for a tile holding a live hazard and `1`
//! everywhere else. [`rebuild_costs`] recomputes the whole map from the
//! hazard list; the world calls it at most once per tick, when placements
//! changed. [`PathPlanner`] wraps the raw search with the recovery policy so
//! a failed search never leaves a unit without a path.

mod danger;
mod grid;
mod heap;
mod pathfinder;

pub use danger::{danger_score, rebuild_costs, tile_cost};
pub use grid::{Grid, Tile, TileKind};
pub use heap::PriorityQueue;
pub use pathfinder::{path_cost, PathFinder, PathPlanner, PlanOutcome, PlannedPath};
