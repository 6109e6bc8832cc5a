//! A cache-friendly, single-threaded, open-addressed hash table with
//! incremental rehashing.
//!
//! Buckets are sized to one cache line: a presence bitmap, a chained-probe
//! flag, seven per-slot hash fragments, and seven element slots. Growth and
//! shrinkage happen incrementally, one bucket migrated per mutating
//! operation (or under an explicit time budget), so no single call pays
//! for a full-table rehash. [`HashSet`] wraps the generic [`RawHashSet`]
//! for the common case where the element type is its own key; callers who
//! need key-projecting elements (e.g. a key-value pair indexed by its key)
//! implement [`ElementPolicy`] directly.
//!
//! This crate does not provide thread safety, persistence, or any
//! ordering guarantee over elements -- callers serialize their own access,
//! exactly as the single-threaded data-server core this design is modeled
//! on does.

mod bucket;
mod config;
mod error;
mod hash;
mod iter;
mod policy;
mod probe;
mod random;
mod raw;
mod scan;
mod stats;
mod table;
mod twophase;

pub use config::{hash_function_seed, resize_policy, set_hash_function_seed, set_resize_policy, ResizePolicy};
pub use error::HashSetError;
pub use hash::{hash_bytes_case_insensitive, DefaultHashBuilder};
pub use iter::Iter;
pub use policy::{ElementPolicy, Identity};
pub use raw::RawHashSet;
pub use scan::{ScanItem, SCAN_EMIT_REF, SCAN_SINGLE_STEP};
pub use stats::{combine_stats, HashSetStats};
pub use twophase::{InsertPosition, PopPosition};

/// A hash table whose elements are their own keys, analogous to
/// `std::collections::HashSet<T>`.
pub type HashSet<T, S = DefaultHashBuilder> = RawHashSet<T, Identity, S>;
