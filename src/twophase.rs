//! Two-phase insert and pop: split a lookup from its commit so a caller can
//! build (or tear down) an element after the table has already decided
//! where it goes, without hashing twice or leaving a partially inserted
//! entry behind if the build step fails.
//!
//! Rehashing is paused for the lifetime of a position handle -- between
//! `find_position_for_insert`/`two_phase_pop_find_ref` and the matching
//! commit, the table must not move anything the handle points into.
//! Mutating the table in between is undefined behavior per §4.6, so the
//! commit methods are `unsafe fn`: the contract is documented, not
//! enforced.

use crate::policy::ElementPolicy;
use crate::raw::{Found, InsertSlot, RawHashSet};
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

/// A handle produced by [`RawHashSet::find_position_for_insert`], to be
/// consumed by exactly one call to [`RawHashSet::insert_at_position`].
pub struct InsertPosition(InsertSlot);

/// A handle produced by [`RawHashSet::two_phase_pop_find_ref`], to be
/// consumed by exactly one call to [`RawHashSet::two_phase_pop_delete`].
pub struct PopPosition(Found);

impl<T, P, S> RawHashSet<T, P, S>
where
    P: ElementPolicy<T>,
    S: BuildHasher,
{
    /// Looks up `key`. If present, returns a reference to the existing
    /// element and no position (there is nothing to insert). If absent,
    /// reserves a slot for it and returns a position to commit with
    /// [`Self::insert_at_position`].
    pub fn find_position_for_insert<Q>(&mut self, key: &Q) -> Result<InsertPosition, &T>
    where
        P::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of_key(key);
        if let Some(found) = self.locate(key) {
            let ptr: *const T = unsafe { self.tables[found.table].bucket(found.bucket).slot_ref(found.slot) };
            return Err(unsafe { &*ptr });
        }
        self.pause_rehashing();
        Ok(InsertPosition(self.find_insert_slot_pub(hash)))
    }

    /// Commits `element` into the slot `position` was reserved for.
    ///
    /// # Safety
    /// The caller must not have mutated `self` since the matching
    /// `find_position_for_insert` call, and must pass the position exactly
    /// once.
    pub unsafe fn insert_at_position(&mut self, position: InsertPosition, element: T) {
        self.commit_insert_slot_for_delete(position.0, element);
        self.resume_rehashing();
    }

    /// Looks up `key`; if present, reserves its slot for removal and
    /// returns a position alongside a reference to the element (read it
    /// before committing the delete).
    pub fn two_phase_pop_find_ref<Q>(&mut self, key: &Q) -> Option<(&T, PopPosition)>
    where
        P::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.locate(key)?;
        self.pause_rehashing();
        let ptr: *const T = unsafe { self.tables[found.table].bucket(found.bucket).slot_ref(found.slot) };
        Some((unsafe { &*ptr }, PopPosition(found)))
    }

    /// Removes and returns the element `position` points to.
    ///
    /// # Safety
    /// The caller must not have mutated `self` since the matching
    /// `two_phase_pop_find_ref` call, and must pass the position exactly
    /// once.
    pub unsafe fn two_phase_pop_delete(&mut self, position: PopPosition) -> T {
        let element = self.delete_at(position.0);
        self.resume_rehashing();
        element
    }
}
