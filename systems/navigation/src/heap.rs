//! Binary min-heap keyed by `f32` priority with FIFO tie-breaking.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Min-priority queue used by the path finder.
///
/// Entries with equal priority pop in insertion order, which keeps A*
/// expansion order (and therefore its chosen path) deterministic.
#[derive(Clone, Debug)]
pub struct PriorityQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    sequence: u64,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            sequence: 0,
        }
    }
}

impl<T> PriorityQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `item` with the given priority.
    pub fn push(&mut self, item: T, priority: f32) {
        let sequence = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        self.heap.push(Entry {
            priority,
            sequence,
            item,
        });
    }

    /// Removes the entry with the lowest priority.
    pub fn pop(&mut self) -> Option<(T, f32)> {
        self.heap.pop().map(|entry| (entry.item, entry.priority))
    }

    /// Lowest queued priority without removing it.
    #[must_use]
    pub fn peek_priority(&self) -> Option<f32> {
        self.heap.peek().map(|entry| entry.priority)
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Reports whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Removes every entry and restarts the insertion sequence.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.sequence = 0;
    }
}

#[derive(Clone, Debug)]
struct Entry<T> {
    priority: f32,
    sequence: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse both keys.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}
