//! Process-wide configuration: the hash function seed and the global resize
//! policy. Both are set once, before an instance sees traffic, and read far
//! more often than written.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

static HASH_SEED: Mutex<[u8; 16]> = Mutex::new([0u8; 16]);

/// Sets the process-wide seed used by the default hash function.
///
/// Intended to be called once, early, before any hashset sees traffic --
/// mirroring `hashsetSetHashFunctionSeed`.
pub fn set_hash_function_seed(seed: [u8; 16]) {
    *HASH_SEED.lock().unwrap() = seed;
}

/// Returns the current hash function seed.
pub fn hash_function_seed() -> [u8; 16] {
    *HASH_SEED.lock().unwrap()
}

/// Global switch controlling whether growth is allowed to proceed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum ResizePolicy {
    /// Grow/shrink whenever the watermarks say so.
    Allow = 0,
    /// Only grow past the hard ceiling; never auto-shrink.
    Avoid = 1,
    /// Never grow or shrink automatically.
    Forbid = 2,
}

static RESIZE_POLICY: AtomicU8 = AtomicU8::new(ResizePolicy::Allow as u8);

/// Sets the process-wide resize policy.
pub fn set_resize_policy(policy: ResizePolicy) {
    RESIZE_POLICY.store(policy as u8, Ordering::Relaxed);
}

/// Returns the current process-wide resize policy.
pub fn resize_policy() -> ResizePolicy {
    match RESIZE_POLICY.load(Ordering::Relaxed) {
        0 => ResizePolicy::Allow,
        1 => ResizePolicy::Avoid,
        _ => ResizePolicy::Forbid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_roundtrip() {
        let seed = [7u8; 16];
        set_hash_function_seed(seed);
        assert_eq!(hash_function_seed(), seed);
        set_hash_function_seed([0u8; 16]);
    }

    #[test]
    fn policy_roundtrip() {
        set_resize_policy(ResizePolicy::Avoid);
        assert_eq!(resize_policy(), ResizePolicy::Avoid);
        set_resize_policy(ResizePolicy::Allow);
        assert_eq!(resize_policy(), ResizePolicy::Allow);
    }
}
