//! Fixed-capacity diagnostic record of resolved hits.

use std::collections::VecDeque;

use rampart_core::{DamageType, EntityRef};

/// One resolved hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageRecord {
    /// Tick on which the hit landed.
    pub tick: u64,
    /// Entity that dealt the damage, if known.
    pub source: Option<EntityRef>,
    /// Entity that received the damage.
    pub target: EntityRef,
    /// Category of the damage.
    pub damage_type: DamageType,
    /// Damage before any modifier.
    pub base: f32,
    /// Damage delivered to the intake.
    pub applied: f32,
    /// The crit roll succeeded.
    pub critical: bool,
    /// The hit killed the target.
    pub killed: bool,
}

/// Ring buffer that drops its oldest record once full.
#[derive(Clone, Debug)]
pub struct DamageLog {
    records: VecDeque<DamageRecord>,
    capacity: usize,
    total: u64,
}

impl DamageLog {
    /// Creates an empty log holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    /// Appends a record, evicting the oldest when full.
    pub fn push(&mut self, record: DamageRecord) {
        if self.records.len() == self.capacity {
            let _ = self.records.pop_front();
        }
        self.records.push_back(record);
        self.total += 1;
    }

    /// Retained records, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DamageRecord> + '_ {
        self.records.iter()
    }

    /// Most recent record.
    #[must_use]
    pub fn latest(&self) -> Option<&DamageRecord> {
        self.records.back()
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Reports whether nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of retained records.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records pushed since creation, evicted ones included.
    #[must_use]
    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    /// Drops every retained record.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
