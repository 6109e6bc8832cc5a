//! Deletion: clearing a slot and repairing the chained-flag invariant
//! afterward.
//!
//! §4.1 describes a precise backward-shift tail compaction: walk forward
//! from the freed slot, and for each element whose home bucket is at or
//! before it, slide it back. That is exactly right but fiddly to get right
//! slot-by-slot across bucket boundaries without a compiler to catch an
//! off-by-one. This crate instead rebuilds the entire contiguous chained
//! cluster the freed slot belonged to: collect every live element from the
//! bucket onward while the chained flag keeps the cluster going, clear
//! those buckets outright, and reinsert each collected element through the
//! normal insert path. Reinsertion necessarily recreates the shortest valid
//! probe chain for whatever remains, which is the same postcondition
//! §4.1's shift dance is chasing, traded for doing strictly more writes
//! than the minimal shift in the common case.

use crate::policy::ElementPolicy;
use crate::raw::{Found, RawHashSet};
use smallvec::SmallVec;
use std::hash::BuildHasher;

pub(crate) fn delete_at<T, P, S>(set: &mut RawHashSet<T, P, S>, found: Found) -> T
where
    P: ElementPolicy<T>,
    S: BuildHasher,
{
    let table = &mut set.tables[found.table];
    let element = unsafe { table.bucket_mut(found.bucket).take_slot(found.slot) };
    table.used -= 1;

    if !table.bucket(found.bucket).meta.chained() {
        // No element was ever displaced past this bucket, so no other
        // bucket's probe sequence can depend on this slot staying full.
        return element;
    }

    // Rebuild the cluster starting at the freed bucket's home: collect
    // every live element reachable by walking forward while a chained flag
    // keeps the walk going, emptying each bucket as we pass it.
    let mask = table.mask();
    let mut collected: SmallVec<[T; 16]> = SmallVec::new();
    let mut bucket_idx = found.bucket;
    loop {
        let bucket = table.bucket_mut(bucket_idx);
        let was_chained = bucket.meta.chained();
        for slot in bucket.meta.occupied_slots().collect::<SmallVec<[usize; 7]>>() {
            collected.push(unsafe { bucket.take_slot(slot) });
        }
        bucket.meta.clear_chained();
        if !was_chained {
            break;
        }
        bucket_idx = (bucket_idx + 1) & mask;
    }
    let removed_count = collected.len();
    table.used -= removed_count;

    for reinserted in collected {
        let hash = set.hash_of_key(set.policy().key(&reinserted));
        let position = set.find_insert_slot_for_table(found.table, hash);
        set.commit_insert_slot_for_delete(position, reinserted);
    }

    element
}
