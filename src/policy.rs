//! Translation of the `hashsetType` callback bundle into a trait.
//!
//! The source type descriptor is a behavior bundle attached to an instance:
//! element-to-key projection, rehash notifications, an optional resize gate,
//! optional per-instance metadata, and an `instantRehashing` flag. Rather
//! than a vtable of function pointers, that bundle becomes a trait so the
//! compiler can inline and monomorphize it, the same shift the std library
//! makes from C's `qsort(cmp_fn)` to `Ord`.
//!
//! Descriptor identity must never leak into hashing or equality -- only
//! behavior matters, so `ElementPolicy` carries no state of its own; it is
//! instantiated as a zero-sized marker type per element type.

use std::hash::Hash;

/// Per-instance caller-supplied behavior, mirroring `hashsetType`.
pub trait ElementPolicy<T> {
    /// The projected lookup key type.
    type Key: Hash + Eq + ?Sized;

    /// Per-instance metadata appended after the table pair. Most callers
    /// use `()`.
    type Metadata: Default;

    /// Projects an element to its key. For `Identity`, the element IS the
    /// key.
    fn key<'a>(&self, element: &'a T) -> &'a Self::Key;

    /// Resize gate, mirroring `hashsetType::resizeAllowed`. Returning
    /// `false` defers a growth or shrink that would otherwise proceed.
    /// Default: always allow.
    fn resize_allowed(&self, _more_mem_bytes: usize, _used_ratio: f64) -> bool {
        true
    }

    /// Called once when a rehash begins.
    fn rehashing_started(&self) {}

    /// Called once when a rehash completes.
    fn rehashing_completed(&self) {}

    /// Whether a growth or shrink must complete entirely inside the
    /// triggering mutation (`hashsetType::instant_rehashing`).
    fn instant_rehashing(&self) -> bool {
        false
    }
}

/// Policy for element types that ARE their own key, the common case
/// (`HashSet<T>` over `std::collections::HashSet`'s shape).
#[derive(Clone, Copy, Default, Debug)]
pub struct Identity;

impl<T: Hash + Eq> ElementPolicy<T> for Identity {
    type Key = T;
    type Metadata = ();

    #[inline]
    fn key<'a>(&self, element: &'a T) -> &'a T {
        element
    }
}
