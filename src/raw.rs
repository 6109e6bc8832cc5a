//! The core hash table: a pair of [`RawTable`]s, a rehash cursor, and the
//! operations that drive them. Generic over an [`ElementPolicy`] (what a key
//! is, how rehash notifications and the resize gate behave) and a
//! [`BuildHasher`], mirroring the teacher's `Interner<T, S>` split between
//! element storage and hash strategy.

use crate::bucket::SLOTS_PER_BUCKET;
use crate::config::{self, ResizePolicy};
use crate::error::HashSetError;
use crate::hash::{hash_fragment, make_hash, DefaultHashBuilder};
use crate::policy::{ElementPolicy, Identity};
use crate::table::RawTable;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::time::{Duration, Instant};

/// Checked every this many migrated buckets during a time-budgeted rehash.
const REHASH_CLOCK_CHECK_INTERVAL: usize = 128;

/// Default high fill watermark: grow once `table[0]` is at 100% slot fill.
const HIGH_WATERMARK: f64 = 1.0;

/// Hard ceiling multiplier applied under `ResizePolicy::Avoid`.
const AVOID_CEILING_MULTIPLIER: f64 = 5.0;

/// Default low fill watermark: shrink once `table[0]` is below 1/8 full.
const LOW_WATERMARK: f64 = 1.0 / 8.0;

pub(crate) fn size_exp_for_capacity(min_capacity: usize) -> u32 {
    let mut exp = 0u32;
    while ((1usize << exp) * SLOTS_PER_BUCKET) < min_capacity.max(1) {
        exp += 1;
    }
    exp
}

/// Where a key currently lives, for operations that need to touch it again
/// without re-hashing (two-phase commits, found-then-delete).
#[derive(Clone, Copy)]
pub(crate) struct Found {
    pub(crate) table: usize,
    pub(crate) bucket: usize,
    pub(crate) slot: usize,
}

/// Where an absent key should be inserted, plus the chain-flag bookkeeping
/// the commit step must apply. Mirrors `hashsetFindPositionForInsert`'s
/// opaque position handle.
#[derive(Clone, Copy)]
pub(crate) struct InsertSlot {
    pub(crate) table: usize,
    pub(crate) home: usize,
    pub(crate) bucket: usize,
    pub(crate) slot: usize,
    pub(crate) hash: u64,
}

pub struct RawHashSet<T, P = Identity, S = DefaultHashBuilder> {
    pub(crate) tables: [RawTable<T>; 2],
    pub(crate) rehash_cursor: usize,
    pub(crate) pause_rehash: u32,
    pub(crate) pause_auto_shrink: u32,
    pub(crate) policy: P,
    pub(crate) hash_builder: S,
    pub(crate) metadata: P::Metadata,
    /// Forces `!Sync`: nothing else in this struct's fields stops the
    /// auto-trait machinery from granting `Sync` on its own, but shared
    /// references into the table are not safe to hand across threads
    /// without external synchronization. `Cell<()>` is never `Sync`, and
    /// is unconditionally `Send` since `()` is `Send`, so this costs
    /// nothing for the `Send` impl below.
    _not_sync: std::marker::PhantomData<std::cell::Cell<()>>,
}

impl<T, P, S> RawHashSet<T, P, S>
where
    P: ElementPolicy<T> + Default,
    S: Default,
{
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(0, P::default(), S::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, P::default(), S::default())
    }
}

impl<T, P, S> RawHashSet<T, P, S>
where
    P: ElementPolicy<T>,
    S: BuildHasher,
{
    pub fn with_hasher(policy: P, hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, policy, hash_builder)
    }

    pub fn with_capacity_and_hasher(capacity: usize, policy: P, hash_builder: S) -> Self {
        let table0 = if capacity == 0 {
            RawTable::empty()
        } else {
            RawTable::with_size_exp(size_exp_for_capacity(capacity))
        };
        RawHashSet {
            tables: [table0, RawTable::empty()],
            rehash_cursor: 0,
            pause_rehash: 0,
            pause_auto_shrink: 0,
            policy,
            hash_builder,
            metadata: P::Metadata::default(),
            _not_sync: std::marker::PhantomData,
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn metadata(&self) -> &P::Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut P::Metadata {
        &mut self.metadata
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tables[0].used + self.tables[1].used
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn buckets(&self) -> usize {
        self.tables[0].bucket_count() + self.tables[1].bucket_count()
    }

    /// Approximate bytes of bucket storage in use.
    pub fn mem_usage(&self) -> usize {
        (self.tables[0].bucket_count() + self.tables[1].bucket_count()) * std::mem::size_of::<crate::bucket::Bucket<T>>()
    }

    #[inline]
    pub fn is_rehashing(&self) -> bool {
        self.tables[1].is_allocated()
    }

    /// `(fromSize, toSize)` bucket counts, valid only while rehashing.
    pub fn rehashing_info(&self) -> Option<(usize, usize)> {
        if self.is_rehashing() {
            Some((self.tables[0].bucket_count(), self.tables[1].bucket_count()))
        } else {
            None
        }
    }

    #[inline]
    pub fn is_rehashing_paused(&self) -> bool {
        self.pause_rehash > 0
    }

    pub fn pause_rehashing(&mut self) {
        self.pause_rehash += 1;
    }

    pub fn resume_rehashing(&mut self) {
        debug_assert!(self.pause_rehash > 0, "resume_rehashing without a matching pause");
        self.pause_rehash = self.pause_rehash.saturating_sub(1);
    }

    pub fn pause_auto_shrink(&mut self) {
        self.pause_auto_shrink += 1;
    }

    pub fn resume_auto_shrink(&mut self) {
        self.pause_auto_shrink = self.pause_auto_shrink.saturating_sub(1);
    }

    /// A fingerprint of instance state, used by unsafe iterators to detect
    /// mutation between init and reset. Not cryptographic; just needs to
    /// change whenever something an iterator depends on changes.
    pub(crate) fn fingerprint(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for word in [
            self.tables[0].bucket_count() as u64,
            self.tables[0].used as u64,
            self.tables[1].bucket_count() as u64,
            self.tables[1].used as u64,
            self.rehash_cursor as u64,
            self.pause_rehash as u64,
        ] {
            h ^= word;
            h = h.wrapping_mul(0x0000_0100_0000_01B3);
        }
        h
    }

    fn hash_of<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        make_hash(&self.hash_builder, key)
    }

    pub(crate) fn hash_of_key<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.hash_of(key)
    }

    /// Locates `key`, searching whichever tables currently hold live data.
    pub(crate) fn locate<Q>(&self, key: &Q) -> Option<Found>
    where
        P::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        let fragment = hash_fragment(hash);
        for table_idx in self.search_order() {
            let table = &self.tables[table_idx];
            if !table.is_allocated() {
                continue;
            }
            let home = table.home_bucket(hash);
            for bucket_idx in table.probe_seq(home) {
                let bucket = table.bucket(bucket_idx);
                for slot in bucket.meta.matching_slots(fragment) {
                    let element = unsafe { bucket.slot_ref(slot) };
                    if self.policy.key(element).borrow() == key {
                        return Some(Found {
                            table: table_idx,
                            bucket: bucket_idx,
                            slot,
                        });
                    }
                }
                if !bucket.meta.chained() && !bucket.meta.is_full() {
                    break;
                }
            }
        }
        None
    }

    /// Table search order: while rehashing, `table[1]` receives new writes
    /// and already holds migrated elements, so check it first.
    fn search_order(&self) -> [usize; 2] {
        if self.is_rehashing() {
            [1, 0]
        } else {
            [0, 1]
        }
    }

    /// The table new elements are written into.
    #[inline]
    fn write_table_index(&self) -> usize {
        if self.is_rehashing() {
            1
        } else {
            0
        }
    }

    /// Finds the insertion point for an absent key: first bucket along the
    /// probe sequence with a free slot, marking every intermediate bucket
    /// chained. Does not write anything.
    fn find_insert_slot(&self, hash: u64) -> InsertSlot {
        self.find_insert_slot_in_table(self.write_table_index(), hash)
    }

    /// As [`Self::find_insert_slot`], exposed for the two-phase insert
    /// protocol in [`crate::twophase`].
    pub(crate) fn find_insert_slot_pub(&self, hash: u64) -> InsertSlot {
        self.find_insert_slot(hash)
    }

    /// As [`Self::find_insert_slot`], but targeting a specific table
    /// rather than the one that currently receives new writes. Used when
    /// reinserting elements that belong to a specific table's cluster
    /// during deletion's cluster rebuild.
    pub(crate) fn find_insert_slot_for_table(&self, table_idx: usize, hash: u64) -> InsertSlot {
        self.find_insert_slot_in_table(table_idx, hash)
    }

    fn find_insert_slot_in_table(&self, table_idx: usize, hash: u64) -> InsertSlot {
        let table = &self.tables[table_idx];
        let home = table.home_bucket(hash);
        let mut chosen = None;
        for bucket_idx in table.probe_seq(home) {
            if table.bucket(bucket_idx).meta.first_free_slot().is_some() {
                chosen = Some(bucket_idx);
                break;
            }
        }
        let bucket_idx = chosen.expect("table must have a free slot; caller should have grown first");
        let slot = table.bucket(bucket_idx).meta.first_free_slot().unwrap();
        InsertSlot {
            table: table_idx,
            home,
            bucket: bucket_idx,
            slot,
            hash,
        }
    }

    /// As [`Self::commit_insert_slot`], exposed for the two-phase insert
    /// protocol and for deletion's cluster rebuild in [`crate::probe`].
    pub(crate) fn commit_insert_slot_for_delete(&mut self, position: InsertSlot, element: T) {
        self.commit_insert_slot(position, element);
    }

    /// Applies an `InsertSlot`: writes the element, sets presence and
    /// fragment, and marks every bucket strictly between the home bucket
    /// and the chosen bucket as chained.
    fn commit_insert_slot(&mut self, position: InsertSlot, element: T) {
        let table = &mut self.tables[position.table];
        let mut b = position.home;
        while b != position.bucket {
            table.bucket_mut(b).meta.set_chained();
            b = (b + 1) & table.mask();
        }
        let fragment = hash_fragment(position.hash);
        table.bucket_mut(position.bucket).write_slot(position.slot, element, fragment);
        table.used += 1;
    }

    /// `find`: returns a reference to the matching element, if any.
    pub fn find<Q>(&self, key: &Q) -> Option<&T>
    where
        P::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.locate(key)?;
        Some(unsafe { self.tables[found.table].bucket(found.bucket).slot_ref(found.slot) })
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        P::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locate(key).is_some()
    }

    /// `find-ref`: a mutable reference to the matching element in place,
    /// so the caller can update non-key fields without a delete+add round
    /// trip. Mutating the key through this reference so it no longer
    /// matches its own hash is the same misuse the source leaves
    /// undefined for an in-place element update.
    pub fn find_mut<Q>(&mut self, key: &Q) -> Option<&mut T>
    where
        P::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.locate(key)?;
        Some(unsafe { self.tables[found.table].bucket_mut(found.bucket).slot_mut(found.slot) })
    }

    /// `add`: inserts `element`, failing with `DuplicateKey` if its key is
    /// already present.
    pub fn add(&mut self, element: T) -> Result<(), HashSetError> {
        let hash = self.hash_of(self.policy.key(&element));
        if self.key_present_by_hash(&element, hash) {
            return Err(HashSetError::DuplicateKey);
        }
        self.insert_new(element, hash);
        Ok(())
    }

    /// `addOrFind`: inserts `element` if its key is absent; otherwise
    /// returns a reference to the existing element.
    pub fn add_or_find(&mut self, element: T) -> Result<(), &T> {
        let hash = self.hash_of(self.policy.key(&element));
        if let Some(found) = self.find_by_hash(&element, hash) {
            // SAFETY: re-borrow through a raw pointer to detach the lifetime
            // from the short-lived `found` lookup; `self` itself is still
            // borrowed for the whole call via the return value.
            let table = &self.tables[found.table];
            let ptr: *const T = unsafe { table.bucket(found.bucket).slot_ref(found.slot) };
            return Err(unsafe { &*ptr });
        }
        self.insert_new(element, hash);
        Ok(())
    }

    /// `replace`: inserts `element`, returning and dropping any previous
    /// element with the same key.
    pub fn replace(&mut self, element: T) -> Option<T> {
        let hash = self.hash_of(self.policy.key(&element));
        if let Some(found) = self.find_by_hash(&element, hash) {
            let table = &mut self.tables[found.table];
            let old = unsafe { table.bucket_mut(found.bucket).take_slot(found.slot) };
            let fragment = hash_fragment(hash);
            table.bucket_mut(found.bucket).write_slot(found.slot, element, fragment);
            return Some(old);
        }
        self.insert_new(element, hash);
        None
    }

    fn key_present_by_hash(&self, element: &T, hash: u64) -> bool {
        self.find_by_hash(element, hash).is_some()
    }

    fn find_by_hash(&self, element: &T, hash: u64) -> Option<Found> {
        let key = self.policy.key(element);
        self.locate(key)
    }

    fn insert_new(&mut self, element: T, hash: u64) {
        self.rehash_step_if_due();
        if !self.is_rehashing() && self.tables[0].bucket_count() == 0 {
            self.tables[0] = RawTable::with_size_exp(0);
        }
        let position = self.find_insert_slot(hash);
        self.commit_insert_slot(position, element);
        self.maybe_grow();
    }

    /// `delete`: removes the element matching `key`, returning whether one
    /// was found.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        P::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.pop(key).is_some()
    }

    /// `pop`: removes and returns the element matching `key`.
    pub fn pop<Q>(&mut self, key: &Q) -> Option<T>
    where
        P::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.rehash_step_if_due();
        let found = self.locate(key)?;
        let element = self.delete_at(found);
        self.maybe_shrink();
        Some(element)
    }

    /// Removes the element at `found`, compacting its bucket cluster. See
    /// [`crate::probe`] for the cluster-rebuild strategy.
    pub(crate) fn delete_at(&mut self, found: Found) -> T {
        crate::probe::delete_at(self, found)
    }

    /// Grows the table to at least `min_capacity` elements worth of slots,
    /// starting an incremental rehash (or completing it immediately under
    /// instant-rehashing policy).
    pub fn expand(&mut self, min_capacity: usize) {
        self.try_expand(min_capacity).expect("allocation failure during expand");
    }

    pub fn try_expand(&mut self, min_capacity: usize) -> Result<(), HashSetError> {
        if self.is_rehashing() {
            return Ok(());
        }
        let target_exp = size_exp_for_capacity(min_capacity).max(self.tables[0].size_exp().max(0) as u32);
        if (1usize << target_exp) == self.tables[0].bucket_count() {
            return Ok(());
        }
        self.start_rehash(target_exp)
    }

    pub fn expand_if_needed(&mut self) {
        self.maybe_grow();
    }

    pub fn shrink_if_needed(&mut self) {
        self.maybe_shrink();
    }

    fn resize_allowed(&self, target_exp: u32) -> bool {
        if config::resize_policy() == ResizePolicy::Forbid {
            return false;
        }
        let more_mem_bytes = (1usize << target_exp) * std::mem::size_of::<crate::bucket::Bucket<T>>();
        let ratio = self.tables[0].load_ratio();
        self.policy.resize_allowed(more_mem_bytes, ratio)
    }

    fn maybe_grow(&mut self) {
        if self.is_rehashing() {
            return;
        }
        let table = &self.tables[0];
        if table.bucket_count() == 0 {
            if table.used > 0 {
                let _ = self.try_expand(table.used);
            }
            return;
        }
        let ratio = table.load_ratio();
        let policy = config::resize_policy();
        let over_high_watermark = ratio >= HIGH_WATERMARK && policy == ResizePolicy::Allow;
        let over_hard_ceiling = ratio >= HIGH_WATERMARK * AVOID_CEILING_MULTIPLIER && policy != ResizePolicy::Forbid;
        if (over_high_watermark || over_hard_ceiling) && self.resize_allowed(table.size_exp() as u32 + 1) {
            let target_exp = size_exp_for_capacity(table.used * 2).max(table.size_exp() as u32 + 1);
            let _ = self.start_rehash(target_exp);
        }
    }

    fn maybe_shrink(&mut self) {
        if self.is_rehashing() || self.pause_auto_shrink > 0 {
            return;
        }
        if config::resize_policy() != ResizePolicy::Allow {
            return;
        }
        let table = &self.tables[0];
        if table.bucket_count() <= 1 {
            return;
        }
        let ratio = table.load_ratio();
        if ratio < LOW_WATERMARK {
            let target_exp = size_exp_for_capacity(table.used * 4).max(0);
            if target_exp < table.size_exp() as u32 && self.resize_allowed(target_exp) {
                let _ = self.start_rehash(target_exp);
            }
        }
    }

    fn start_rehash(&mut self, target_exp: u32) -> Result<(), HashSetError> {
        self.tables[1] = RawTable::with_size_exp(target_exp);
        self.rehash_cursor = 0;
        self.policy.rehashing_started();
        if self.policy.instant_rehashing() {
            self.rehash_until_complete();
        }
        Ok(())
    }

    fn rehash_step_if_due(&mut self) {
        if !self.is_rehashing() || self.pause_rehash > 0 {
            return;
        }
        self.migrate_one_bucket();
        if !self.is_rehashing() {
            return;
        }
        if self.policy.instant_rehashing() {
            self.rehash_until_complete();
        }
    }

    fn rehash_until_complete(&mut self) {
        while self.is_rehashing() {
            self.migrate_one_bucket();
        }
    }

    /// Migrates the next non-empty source bucket into the target table. A
    /// no-op if not currently rehashing or if the source table is
    /// exhausted (which finishes the rehash).
    pub(crate) fn migrate_one_bucket(&mut self) {
        if !self.is_rehashing() {
            return;
        }
        let source_count = self.tables[0].bucket_count();
        while self.rehash_cursor < source_count {
            let bucket_idx = self.rehash_cursor;
            if self.tables[0].bucket(bucket_idx).meta.is_empty() {
                self.rehash_cursor += 1;
                continue;
            }
            self.migrate_bucket(bucket_idx);
            self.rehash_cursor += 1;
            return;
        }
        self.finish_rehash();
    }

    fn migrate_bucket(&mut self, bucket_idx: usize) {
        let slots: Vec<usize> = self.tables[0].bucket(bucket_idx).meta.occupied_slots().collect();
        for slot in slots {
            let element = unsafe { self.tables[0].bucket_mut(bucket_idx).take_slot(slot) };
            let hash = self.hash_of(self.policy.key(&element));
            let position = self.find_insert_slot(hash);
            self.commit_insert_slot(position, element);
            self.tables[0].used -= 1;
        }
        // Never clear the chained flag here: a chain may have its home
        // bucket already migrated while a later bucket holding one of its
        // members has not yet been reached by the cursor. Chained flags
        // are only meaningful within `table[0]`, which is discarded whole
        // once the rehash completes.
    }

    fn finish_rehash(&mut self) {
        if !self.is_rehashing() || self.rehash_cursor < self.tables[0].bucket_count() {
            return;
        }
        self.tables[0] = std::mem::replace(&mut self.tables[1], RawTable::empty());
        self.rehash_cursor = 0;
        self.policy.rehashing_completed();
    }

    /// Migrates buckets until the rehash completes or `budget` elapses,
    /// checked every 128 buckets.
    pub fn rehash_for_microseconds(&mut self, budget: Duration) -> bool {
        if !self.is_rehashing() {
            return true;
        }
        let start = Instant::now();
        loop {
            for _ in 0..REHASH_CLOCK_CHECK_INTERVAL {
                if !self.is_rehashing() {
                    return true;
                }
                self.migrate_one_bucket();
            }
            if !self.is_rehashing() {
                return true;
            }
            if start.elapsed() >= budget {
                return false;
            }
        }
    }
}

impl<T, P, S> Default for RawHashSet<T, P, S>
where
    P: ElementPolicy<T> + Default,
    S: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: moving the whole table across threads is fine -- it owns its
// elements outright. `Sync` is blocked by the `_not_sync` marker field
// above, since concurrent access from two threads without external
// synchronization is the undefined behavior this crate's Non-goals
// explicitly disclaim.
unsafe impl<T: Send, P: Send, S: Send> Send for RawHashSet<T, P, S> {}
