//! Id lookups over the world's entity lists.
//!
//! Lists only ever grow at the tail with freshly allocated, increasing ids and
//! shrink through an order-preserving `retain`, so they stay sorted by id and
//! lookups can binary search.

use crate::{Attacker, AttackerId, Defender, DefenderId, Hazard, HazardId};

/// Entity stored in an id-sorted list.
pub trait Keyed {
    /// Identifier type.
    type Id: Ord + Copy;

    /// Identifier of the entity.
    fn key(&self) -> Self::Id;
}

impl Keyed for Attacker {
    type Id = AttackerId;

    fn key(&self) -> AttackerId {
        self.id
    }
}

impl Keyed for Defender {
    type Id = DefenderId;

    fn key(&self) -> DefenderId {
        self.id
    }
}

impl Keyed for Hazard {
    type Id = HazardId;

    fn key(&self) -> HazardId {
        self.id
    }
}

/// Finds an entity by id in an id-sorted list.
#[must_use]
pub fn find<T: Keyed>(list: &[T], id: T::Id) -> Option<&T> {
    list.binary_search_by_key(&id, Keyed::key)
        .ok()
        .and_then(|index| list.get(index))
}

/// Mutable variant of [`find`].
pub fn find_mut<T: Keyed>(list: &mut [T], id: T::Id) -> Option<&mut T> {
    let index = list.binary_search_by_key(&id, Keyed::key).ok()?;
    list.get_mut(index)
}

/// Every entity of a list except the one currently being updated.
///
/// Entities before the current one have already been updated this tick and
/// entities after it have not; both halves stay mutable.
#[derive(Debug)]
pub struct Cohort<'a, T> {
    before: &'a mut [T],
    after: &'a mut [T],
}

impl<'a, T: Keyed> Cohort<'a, T> {
    /// Splits `list` into the entity at `index` and the rest.
    pub fn split(list: &'a mut [T], index: usize) -> Option<(&'a mut T, Cohort<'a, T>)> {
        if index >= list.len() {
            return None;
        }
        let (before, rest) = list.split_at_mut(index);
        let (current, after) = rest.split_first_mut()?;
        Some((current, Cohort { before, after }))
    }

    /// Cohort over a whole list, for callers that are not part of it.
    pub fn whole(list: &'a mut [T]) -> Self {
        Cohort {
            before: list,
            after: &mut [],
        }
    }

    /// Number of entities in the cohort.
    #[must_use]
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    /// Reports whether the cohort is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entities in list order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.before.iter().chain(self.after.iter())
    }

    /// Mutable entities in list order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.before.iter_mut().chain(self.after.iter_mut())
    }

    /// Entity with the given id.
    #[must_use]
    pub fn get(&self, id: T::Id) -> Option<&T> {
        find(self.before, id).or_else(|| find(self.after, id))
    }

    /// Mutable entity with the given id.
    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        if let Ok(index) = self.before.binary_search_by_key(&id, Keyed::key) {
            return self.before.get_mut(index);
        }
        find_mut(self.after, id)
    }
}
