//! Dirty-flag wrapper that rebuilds the quadtree at most once per tick.

use glam::Vec2;
use rampart_core::{EntityRef, Rect};
use tracing::debug;

use crate::QuadTree;

/// Entity position captured at rebuild time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialEntry {
    /// Entity the position belongs to.
    pub entity: EntityRef,
    /// Position when the index was last rebuilt.
    pub position: Vec2,
}

/// Lazily rebuilt neighbour index.
///
/// Queries answer against the snapshot taken by the last rebuild; callers
/// that need exact answers re-check live positions and liveness. Only live
/// entities may be handed to [`SpatialIndex::rebuild_if_dirty`].
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    tree: QuadTree<SpatialEntry>,
    area: Rect,
    dirty: bool,
    rebuilds: u64,
}

impl SpatialIndex {
    /// Creates a dirty, empty index covering `area`.
    #[must_use]
    pub fn new(area: Rect, node_capacity: usize, max_depth: u8) -> Self {
        Self {
            tree: QuadTree::new(area, node_capacity, max_depth),
            area,
            dirty: true,
            rebuilds: 0,
        }
    }

    /// Flags the snapshot as stale.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Reports whether the next rebuild call will do any work.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of rebuilds performed so far.
    #[must_use]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Number of entries in the current snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Reports whether the current snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Replaces the nominal area and marks the index dirty.
    pub fn set_area(&mut self, area: Rect) {
        self.area = area;
        self.dirty = true;
    }

    /// Clears the snapshot without rebuilding it.
    pub fn clear(&mut self) {
        self.tree.reset(self.area);
        self.dirty = true;
    }

    /// Rebuilds from `entries` when dirty; returns whether a rebuild happened.
    ///
    /// The tree's bounds grow to enclose any entry outside the nominal area,
    /// so no live entity is ever dropped from the snapshot.
    pub fn rebuild_if_dirty<I>(&mut self, entries: I) -> bool
    where
        I: IntoIterator<Item = SpatialEntry>,
    {
        if !self.dirty {
            return false;
        }

        let entries: Vec<SpatialEntry> = entries
            .into_iter()
            .filter(|entry| entry.position.is_finite())
            .collect();
        let bounds = entries.iter().fold(self.area, |bounds, entry| {
            Rect::from_corners(
                bounds.min().min(entry.position),
                bounds.max().max(entry.position),
            )
        });

        self.tree.reset(bounds);
        for entry in &entries {
            let _ = self.tree.insert(entry.position, *entry);
        }
        self.dirty = false;
        self.rebuilds += 1;
        debug!(entries = entries.len(), depth = self.tree.depth(), "spatial index rebuilt");
        true
    }

    /// Appends snapshot entries inside `rect`.
    pub fn query_rect(&self, rect: &Rect, out: &mut Vec<SpatialEntry>) {
        self.tree.query_rect(rect, out);
    }

    /// Appends snapshot entries within `radius` of `center`.
    pub fn query_circle(&self, center: Vec2, radius: f32, out: &mut Vec<SpatialEntry>) {
        self.tree.query_circle(center, radius, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_core::AttackerId;

    fn entry(id: u32, x: f32, y: f32) -> SpatialEntry {
        SpatialEntry {
            entity: EntityRef::Attacker(AttackerId::new(id)),
            position: Vec2::new(x, y),
        }
    }

    fn area() -> Rect {
        Rect::from_corners(Vec2::ZERO, Vec2::splat(10.0))
    }

    #[test]
    fn rebuild_only_happens_when_dirty() {
        let mut index = SpatialIndex::new(area(), 4, 6);
        assert!(index.rebuild_if_dirty([entry(0, 1.0, 1.0)]));
        assert!(!index.rebuild_if_dirty([entry(0, 1.0, 1.0), entry(1, 2.0, 2.0)]));
        assert_eq!(index.len(), 1);
        assert_eq!(index.rebuilds(), 1);

        index.mark_dirty();
        assert!(index.rebuild_if_dirty([entry(0, 1.0, 1.0), entry(1, 2.0, 2.0)]));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn snapshot_stays_stale_until_rebuilt() {
        let mut index = SpatialIndex::new(area(), 4, 6);
        let _ = index.rebuild_if_dirty([entry(0, 1.0, 1.0)]);

        let mut found = Vec::new();
        index.query_circle(Vec2::new(8.0, 8.0), 1.0, &mut found);
        assert!(found.is_empty());

        index.mark_dirty();
        let _ = index.rebuild_if_dirty([entry(0, 8.0, 8.0)]);
        index.query_circle(Vec2::new(8.0, 8.0), 1.0, &mut found);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn entries_outside_the_area_are_kept() {
        let mut index = SpatialIndex::new(area(), 4, 6);
        let _ = index.rebuild_if_dirty([entry(0, -3.0, 12.0), entry(1, 5.0, 5.0)]);
        assert_eq!(index.len(), 2);

        let mut found = Vec::new();
        index.query_circle(Vec2::new(-3.0, 12.0), 0.5, &mut found);
        assert_eq!(found, vec![entry(0, -3.0, 12.0)]);
    }
}
