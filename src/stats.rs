//! Per-table statistics: bucket counts, probe chain lengths, fill
//! histogram, memory accounting. Mirrors `hashsetStats`.

use crate::bucket::SLOTS_PER_BUCKET;
use crate::policy::ElementPolicy;
use crate::raw::RawHashSet;
use std::fmt;
use std::hash::BuildHasher;

/// Snapshot of one table's shape.
#[derive(Clone, Debug)]
pub struct HashSetStats {
    pub table_index: usize,
    pub buckets: usize,
    pub used: usize,
    pub slot_capacity: usize,
    pub max_chain_len: usize,
    pub total_chain_len: usize,
    /// `chain_histogram[n]` counts buckets whose probe chain (the run of
    /// consecutive chained buckets it belongs to) has length `n`.
    pub chain_histogram: Vec<usize>,
}

impl fmt::Display for HashSetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "table[{}]: {} buckets, {} elements ({:.1}% full)", self.table_index, self.buckets, self.used, self.load_factor() * 100.0)?;
        writeln!(f, "  max chain length: {}", self.max_chain_len)?;
        if !self.chain_histogram.is_empty() {
            write!(f, "  chain length histogram: {:?}", self.chain_histogram)?;
        }
        Ok(())
    }
}

impl HashSetStats {
    pub fn load_factor(&self) -> f64 {
        if self.slot_capacity == 0 {
            0.0
        } else {
            self.used as f64 / self.slot_capacity as f64
        }
    }

    pub fn average_chain_len(&self) -> f64 {
        if self.buckets == 0 {
            0.0
        } else {
            self.total_chain_len as f64 / self.buckets as f64
        }
    }
}

/// Combines per-table stats, as when reporting a rehashing instance's two
/// tables as one logical picture.
pub fn combine_stats(stats: &[HashSetStats]) -> HashSetStats {
    let mut combined = HashSetStats {
        table_index: usize::MAX,
        buckets: 0,
        used: 0,
        slot_capacity: 0,
        max_chain_len: 0,
        total_chain_len: 0,
        chain_histogram: Vec::new(),
    };
    for s in stats {
        combined.buckets += s.buckets;
        combined.used += s.used;
        combined.slot_capacity += s.slot_capacity;
        combined.max_chain_len = combined.max_chain_len.max(s.max_chain_len);
        combined.total_chain_len += s.total_chain_len;
        if combined.chain_histogram.len() < s.chain_histogram.len() {
            combined.chain_histogram.resize(s.chain_histogram.len(), 0);
        }
        for (i, &count) in s.chain_histogram.iter().enumerate() {
            combined.chain_histogram[i] += count;
        }
    }
    combined
}

impl<T, P, S> RawHashSet<T, P, S>
where
    P: ElementPolicy<T>,
    S: BuildHasher,
{
    /// Stats for `table[table_index]` (0 or 1). Returns `None` if that
    /// table is not currently allocated.
    pub fn stats(&self, table_index: usize) -> Option<HashSetStats> {
        let table = &self.tables[table_index];
        if !table.is_allocated() {
            return None;
        }
        let bucket_count = table.bucket_count();
        let mut max_chain_len = 0usize;
        let mut total_chain_len = 0usize;
        let mut histogram = Vec::new();
        let mut i = 0usize;
        while i < bucket_count {
            if table.bucket(i).meta.chained() {
                let chain_start = i;
                let mut len = 1;
                while i < bucket_count && table.bucket(i).meta.chained() {
                    len += 1;
                    i += 1;
                }
                // include the terminating (non-chained) bucket in the run
                len = len.min(bucket_count - chain_start);
                max_chain_len = max_chain_len.max(len);
                total_chain_len += len;
                if histogram.len() <= len {
                    histogram.resize(len + 1, 0);
                }
                histogram[len] += 1;
            } else {
                i += 1;
            }
        }
        Some(HashSetStats {
            table_index,
            buckets: bucket_count,
            used: table.used,
            slot_capacity: bucket_count * SLOTS_PER_BUCKET,
            max_chain_len,
            total_chain_len,
            chain_histogram: histogram,
        })
    }

    /// The longest probe chain across both tables, used by tests that
    /// assert a bound on worst-case probe length.
    pub fn longest_probe_chain(&self) -> usize {
        [0, 1]
            .into_iter()
            .filter_map(|i| self.stats(i))
            .map(|s| s.max_chain_len)
            .max()
            .unwrap_or(0)
    }
}
