#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Quadtree neighbour index with a once-per-tick rebuild discipline.

mod index;
mod quadtree;

pub use index::{SpatialEntry, SpatialIndex};
pub use quadtree::QuadTree;
