//! Error types for the expected-flow failures `hashset.h` documents.
//!
//! Absence (`NotFound`) is not represented here -- it is communicated
//! through `Option`/`bool` return values throughout the crate, matching how
//! the source never raises an error for a missing key. `IteratorMisuse` is
//! enforced with `assert!` at the call site, not through this enum, since
//! it signals a caller bug rather than an expected-flow condition.

use std::fmt;

/// Errors returned by mutating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashSetError {
    /// `add`/`insert_at_position` was called for a key that is already
    /// present.
    DuplicateKey,
    /// `try_expand`/`try_reserve` could not allocate the requested table.
    AllocationFailure,
}

impl fmt::Display for HashSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashSetError::DuplicateKey => write!(f, "key already present in hashset"),
            HashSetError::AllocationFailure => write!(f, "failed to allocate hashset table"),
        }
    }
}

impl std::error::Error for HashSetError {}
