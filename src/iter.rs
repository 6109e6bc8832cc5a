//! External iteration, in two flavors, mirroring `hashsetIterator`'s
//! explicit `init`/`next`/`reset` shape rather than Rust's `Iterator`
//! trait.
//!
//! A literal `Iterator` impl would need to hold a live borrow of the table
//! across calls that the caller is, by contract, allowed to mutate through
//! in between (`Safe iterator` explicitly permits add/replace/delete while
//! live) -- the borrow checker has no way to admit that. So `Iter` holds
//! its own cursor state and takes `&RawHashSet`/`&mut RawHashSet` fresh on
//! each call, exactly as the C API passes the table pointer to every
//! `hashsetNext` call.

use crate::policy::ElementPolicy;
use crate::raw::RawHashSet;
use std::hash::BuildHasher;

pub struct Iter {
    table_index: usize,
    bucket_index: usize,
    slot_index: usize,
    safe: bool,
    fingerprint: u64,
}

impl<T, P, S> RawHashSet<T, P, S>
where
    P: ElementPolicy<T>,
    S: BuildHasher,
{
    /// Starts an unsafe iterator: does not pause rehashing; detects
    /// mid-iteration mutation via a fingerprint check at `reset`.
    pub fn init_iterator(&self) -> Iter {
        Iter {
            table_index: 0,
            bucket_index: 0,
            slot_index: 0,
            safe: false,
            fingerprint: self.fingerprint(),
        }
    }

    /// Starts a safe iterator: pauses rehashing for as long as it is live.
    pub fn init_safe_iterator(&mut self) -> Iter {
        self.pause_rehashing();
        Iter {
            table_index: 0,
            bucket_index: 0,
            slot_index: 0,
            safe: true,
            fingerprint: 0,
        }
    }

    /// Advances `iter` and returns the next element, or `None` once both
    /// tables are exhausted.
    pub fn next<'a>(&'a self, iter: &mut Iter) -> Option<&'a T> {
        loop {
            let table = &self.tables[iter.table_index];
            if iter.bucket_index >= table.bucket_count() {
                if iter.table_index == 0 {
                    iter.table_index = 1;
                    iter.bucket_index = 0;
                    iter.slot_index = 0;
                    continue;
                }
                return None;
            }
            let bucket = table.bucket(iter.bucket_index);
            while iter.slot_index < crate::bucket::SLOTS_PER_BUCKET {
                let slot = iter.slot_index;
                iter.slot_index += 1;
                if bucket.meta.is_occupied(slot) {
                    return Some(unsafe { bucket.slot_ref(slot) });
                }
            }
            iter.bucket_index += 1;
            iter.slot_index = 0;
        }
    }

    /// Ends `iter`. For a safe iterator, resumes rehashing. For an unsafe
    /// iterator, asserts that the instance's fingerprint has not changed
    /// since `init_iterator` -- a mismatch means the caller mutated the
    /// table mid-iteration, which is reported as a misuse assertion rather
    /// than silently producing bad results.
    pub fn reset_iterator(&mut self, iter: Iter) {
        if iter.safe {
            self.resume_rehashing();
        } else {
            assert_eq!(
                iter.fingerprint,
                self.fingerprint(),
                "unsafe iterator used across a mutation of the hashset"
            );
        }
    }
}
