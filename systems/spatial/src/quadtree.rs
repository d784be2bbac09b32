//! Point quadtree storing items by 2D position only.

use glam::Vec2;
use rampart_core::Rect;

/// Point quadtree over a fixed rectangle.
///
/// A leaf splits into four quadrants once it holds more than `capacity`
/// items, unless it already sits at `max_depth`; deep leaves simply grow,
/// so coincident points never recurse forever.
#[derive(Clone, Debug)]
pub struct QuadTree<T> {
    root: Node<T>,
    capacity: usize,
    max_depth: u8,
    len: usize,
}

#[derive(Clone, Debug)]
struct Node<T> {
    bounds: Rect,
    depth: u8,
    items: Vec<(Vec2, T)>,
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T: Copy> QuadTree<T> {
    /// Creates an empty tree covering `bounds`.
    #[must_use]
    pub fn new(bounds: Rect, capacity: usize, max_depth: u8) -> Self {
        Self {
            root: Node::leaf(bounds, 0),
            capacity: capacity.max(1),
            max_depth,
            len: 0,
        }
    }

    /// Area covered by the tree.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the tree stores nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every item and collapses the tree to a single leaf.
    pub fn clear(&mut self) {
        self.root = Node::leaf(self.root.bounds, 0);
        self.len = 0;
    }

    /// Removes every item and moves the tree onto new bounds.
    pub fn reset(&mut self, bounds: Rect) {
        self.root = Node::leaf(bounds, 0);
        self.len = 0;
    }

    /// Stores `item` at `position`; returns `false` if the point lies outside the bounds.
    pub fn insert(&mut self, position: Vec2, item: T) -> bool {
        if !self.root.bounds.contains(position) {
            return false;
        }
        self.root.insert(position, item, self.capacity, self.max_depth);
        self.len += 1;
        true
    }

    /// Appends every item whose position lies inside `rect`.
    pub fn query_rect(&self, rect: &Rect, out: &mut Vec<T>) {
        self.root.query(
            &|bounds| bounds.intersects(rect),
            &|position| rect.contains(position),
            out,
        );
    }

    /// Appends every item within `radius` of `center`, boundary included.
    pub fn query_circle(&self, center: Vec2, radius: f32, out: &mut Vec<T>) {
        if radius < 0.0 || !radius.is_finite() {
            return;
        }
        let radius_sq = radius * radius;
        self.root.query(
            &|bounds| bounds.intersects_circle(center, radius),
            &|position| position.distance_squared(center) <= radius_sq,
            out,
        );
    }

    /// Depth of the deepest node, mostly useful for diagnostics.
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.root.max_depth()
    }
}

impl<T: Copy> Node<T> {
    fn leaf(bounds: Rect, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, position: Vec2, item: T, capacity: usize, max_depth: u8) {
        if let Some(children) = self.children.as_mut() {
            let quadrant = quadrant_of(&self.bounds, position);
            children[quadrant].insert(position, item, capacity, max_depth);
            return;
        }

        self.items.push((position, item));
        if self.items.len() > capacity && self.depth < max_depth {
            self.subdivide(capacity, max_depth);
        }
    }

    fn subdivide(&mut self, capacity: usize, max_depth: u8) {
        let [nw, ne, sw, se] = self.bounds.quadrants();
        let depth = self.depth + 1;
        let mut children = Box::new([
            Node::leaf(nw, depth),
            Node::leaf(ne, depth),
            Node::leaf(sw, depth),
            Node::leaf(se, depth),
        ]);
        for (position, item) in self.items.drain(..) {
            let quadrant = quadrant_of(&self.bounds, position);
            children[quadrant].insert(position, item, capacity, max_depth);
        }
        self.children = Some(children);
    }

    fn query<B, P>(&self, overlaps: &B, accepts: &P, out: &mut Vec<T>)
    where
        B: Fn(&Rect) -> bool,
        P: Fn(Vec2) -> bool,
    {
        if !overlaps(&self.bounds) {
            return;
        }
        out.extend(
            self.items
                .iter()
                .filter(|(position, _)| accepts(*position))
                .map(|(_, item)| *item),
        );
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(overlaps, accepts, out);
            }
        }
    }

    fn max_depth(&self) -> u8 {
        self.children
            .as_ref()
            .map_or(self.depth, |children| {
                children.iter().map(Node::max_depth).max().unwrap_or(self.depth)
            })
    }
}

/// Quadrant index in `Rect::quadrants` order; points on a midline go east/south.
fn quadrant_of(bounds: &Rect, position: Vec2) -> usize {
    let mid = bounds.center();
    let east = usize::from(position.x >= mid.x);
    let south = usize::from(position.y >= mid.y);
    south * 2 + east
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f32) -> Rect {
        Rect::from_corners(Vec2::ZERO, Vec2::splat(size))
    }

    #[test]
    fn subdivides_past_capacity() {
        let mut tree = QuadTree::new(square(8.0), 2, 6);
        for (index, point) in [(1.0, 1.0), (7.0, 1.0), (1.0, 7.0), (7.0, 7.0)]
            .into_iter()
            .enumerate()
        {
            assert!(tree.insert(Vec2::new(point.0, point.1), index));
        }
        assert_eq!(tree.len(), 4);
        assert!(tree.depth() >= 1);

        let mut found = Vec::new();
        tree.query_rect(&Rect::from_corners(Vec2::ZERO, Vec2::splat(4.0)), &mut found);
        assert_eq!(found, vec![0]);
    }

    #[test]
    fn coincident_points_stop_at_max_depth() {
        let mut tree = QuadTree::new(square(4.0), 1, 3);
        for index in 0..32 {
            assert!(tree.insert(Vec2::splat(1.25), index));
        }
        assert_eq!(tree.depth(), 3);

        let mut found = Vec::new();
        tree.query_circle(Vec2::splat(1.25), 0.0, &mut found);
        assert_eq!(found.len(), 32);
    }

    #[test]
    fn rejects_points_outside_bounds() {
        let mut tree = QuadTree::new(square(4.0), 4, 4);
        assert!(!tree.insert(Vec2::new(5.0, 1.0), 0));
        assert!(tree.is_empty());
    }

    #[test]
    fn clear_drops_every_item() {
        let mut tree = QuadTree::new(square(4.0), 1, 4);
        for index in 0..10 {
            let _ = tree.insert(Vec2::new(index as f32 * 0.3, 2.0), index);
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        let mut found = Vec::new();
        tree.query_rect(&square(4.0), &mut found);
        assert!(found.is_empty());
    }
}
