//! Uniform and fair-random element selection, and bulk contiguous
//! sampling.

use crate::bucket::SLOTS_PER_BUCKET;
use crate::policy::ElementPolicy;
use crate::raw::RawHashSet;
use rand::Rng;
use std::hash::BuildHasher;

impl<T, P, S> RawHashSet<T, P, S>
where
    P: ElementPolicy<T>,
    S: BuildHasher,
{
    /// A uniformly random bucket across both tables (weighted by bucket
    /// count), then a uniformly random occupied slot within it, retrying
    /// on empty buckets. Cheap, but biased toward elements that share a
    /// bucket with few others.
    pub fn random_element(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let mut rng = rand::thread_rng();
        loop {
            let table_idx = self.pick_table_weighted(&mut rng)?;
            let table = &self.tables[table_idx];
            let bucket_idx = rng.gen_range(0..table.bucket_count());
            let bucket = table.bucket(bucket_idx);
            let occupied: Vec<usize> = bucket.meta.occupied_slots().collect();
            if occupied.is_empty() {
                continue;
            }
            let slot = occupied[rng.gen_range(0..occupied.len())];
            return Some(unsafe { bucket.slot_ref(slot) });
        }
    }

    fn pick_table_weighted(&self, rng: &mut impl Rng) -> Option<usize> {
        let c0 = self.tables[0].bucket_count();
        let c1 = self.tables[1].bucket_count();
        let total = c0 + c1;
        if total == 0 {
            return None;
        }
        Some(if rng.gen_range(0..total) < c0 { 0 } else { 1 })
    }

    /// Corrects `random_element`'s bias toward sparsely populated buckets
    /// by sampling a window of consecutive buckets and choosing uniformly
    /// among the elements actually present in that window, so selection
    /// probability is proportional to local fill rather than per-bucket
    /// count.
    pub fn fair_random_element(&self, window: usize) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let mut buf: Vec<&T> = Vec::with_capacity(window * SLOTS_PER_BUCKET);
        let mut rng = rand::thread_rng();
        let table_idx = self.pick_table_weighted(&mut rng)?;
        let table = &self.tables[table_idx];
        let start = rng.gen_range(0..table.bucket_count());
        self.collect_window(table_idx, start, window, &mut buf);
        if buf.is_empty() {
            return self.random_element();
        }
        Some(buf[rng.gen_range(0..buf.len())])
    }

    fn collect_window<'a>(&'a self, table_idx: usize, start: usize, window: usize, out: &mut Vec<&'a T>) {
        let table = &self.tables[table_idx];
        let count = table.bucket_count();
        if count == 0 {
            return;
        }
        let steps = window.min(count);
        for i in 0..steps {
            let bucket = table.bucket((start + i) % count);
            for slot in bucket.meta.occupied_slots() {
                out.push(unsafe { bucket.slot_ref(slot) });
            }
        }
    }

    /// Fills `dst` with up to `dst.len()` present elements, starting at a
    /// random bucket and walking forward until `dst` is full or the
    /// starting bucket is revisited. Returns the number filled.
    pub fn sample_elements<'a>(&'a self, dst: &mut [Option<&'a T>]) -> usize {
        if dst.is_empty() || self.is_empty() {
            return 0;
        }
        let mut rng = rand::thread_rng();
        let table_idx = match self.pick_table_weighted(&mut rng) {
            Some(t) => t,
            None => return 0,
        };
        let table = &self.tables[table_idx];
        let count = table.bucket_count();
        let start = rng.gen_range(0..count);
        let mut filled = 0;
        let mut visited = 0;
        let mut bucket_idx = start;
        while filled < dst.len() && visited < count {
            let bucket = table.bucket(bucket_idx);
            for slot in bucket.meta.occupied_slots() {
                if filled >= dst.len() {
                    break;
                }
                dst[filled] = Some(unsafe { bucket.slot_ref(slot) });
                filled += 1;
            }
            bucket_idx = (bucket_idx + 1) % count;
            visited += 1;
        }
        filled
    }
}
