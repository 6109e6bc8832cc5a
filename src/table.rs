//! A single open-addressed table: a power-of-two array of buckets plus a
//! used-element counter. A [`crate::raw::RawHashSet`] holds two of these,
//! one primary and one rehash target.
//!
//! The teacher's `RawInterner` probes with triangular numbers
//! (`raw::ProbeSeq`) to spread a concurrent workload across cache lines.
//! This table deliberately probes *linearly* instead -- the bucket layout
//! this crate stores (presence mask, chained flag, fragments) only composes
//! correctly with a probe sequence that visits *consecutive* buckets, since
//! the chained flag's meaning ("an element displaced past here is further
//! along this same straight line") depends on it.

use crate::bucket::{Bucket, SLOTS_PER_BUCKET};

/// `sizeExp` for a table that has never been allocated.
pub(crate) const EMPTY_EXP: i32 = -1;

pub(crate) struct RawTable<T> {
    buckets: Box<[Bucket<T>]>,
    size_exp: i32,
    pub(crate) used: usize,
}

impl<T> RawTable<T> {
    pub(crate) fn empty() -> Self {
        RawTable {
            buckets: Box::new([]),
            size_exp: EMPTY_EXP,
            used: 0,
        }
    }

    pub(crate) fn with_size_exp(size_exp: u32) -> Self {
        let count = 1usize << size_exp;
        let mut buckets = Vec::with_capacity(count);
        buckets.resize_with(count, Bucket::default);
        RawTable {
            buckets: buckets.into_boxed_slice(),
            size_exp: size_exp as i32,
            used: 0,
        }
    }

    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        self.size_exp >= 0
    }

    #[inline]
    pub(crate) fn size_exp(&self) -> i32 {
        self.size_exp
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn slot_capacity(&self) -> usize {
        self.buckets.len() * SLOTS_PER_BUCKET
    }

    /// Mask applied to a hash to get its home bucket index. Only valid when
    /// allocated.
    #[inline]
    pub(crate) fn mask(&self) -> usize {
        self.buckets.len() - 1
    }

    #[inline]
    pub(crate) fn home_bucket(&self, hash: u64) -> usize {
        hash as usize & self.mask()
    }

    #[inline]
    pub(crate) fn bucket(&self, index: usize) -> &Bucket<T> {
        &self.buckets[index]
    }

    #[inline]
    pub(crate) fn bucket_mut(&mut self, index: usize) -> &mut Bucket<T> {
        &mut self.buckets[index]
    }

    /// Walks the probe sequence for `home`, yielding consecutive bucket
    /// indices (wrapping) for as many buckets as this table has.
    #[inline]
    pub(crate) fn probe_seq(&self, home: usize) -> ProbeSeq {
        ProbeSeq {
            mask: self.mask(),
            pos: home,
            remaining: self.buckets.len(),
        }
    }

    pub(crate) fn load_ratio(&self) -> f64 {
        if self.buckets.is_empty() {
            0.0
        } else {
            self.used as f64 / self.slot_capacity() as f64
        }
    }
}

/// Linear probe sequence: every bucket index from `home` forward, wrapping
/// at the table's bucket count, visited at most once each.
pub(crate) struct ProbeSeq {
    mask: usize,
    pos: usize,
    remaining: usize,
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.pos;
        self.pos = (self.pos + 1) & self.mask;
        Some(current)
    }
}
