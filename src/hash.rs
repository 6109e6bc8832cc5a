//! Default hash function: SipHash-1-3 keyed by the process-wide seed from
//! [`crate::config`], plus a case-insensitive variant for byte keys.

use crate::config::hash_function_seed;
use siphasher::sip::SipHasher13;
use std::hash::{BuildHasher, Hash, Hasher};

/// Default [`BuildHasher`] for [`crate::HashSet`], analogous to
/// `std::collections::hash_map::RandomState` but keyed from the process-wide
/// seed rather than a fresh per-map random value, matching
/// `hashsetGenHashFunction`'s use of one global seed.
#[derive(Clone, Copy, Default, Debug)]
pub struct DefaultHashBuilder;

impl BuildHasher for DefaultHashBuilder {
    type Hasher = SipHasher13;

    #[inline]
    fn build_hasher(&self) -> SipHasher13 {
        let seed = hash_function_seed();
        let k0 = u64::from_ne_bytes(seed[0..8].try_into().unwrap());
        let k1 = u64::from_ne_bytes(seed[8..16].try_into().unwrap());
        SipHasher13::new_with_keys(k0, k1)
    }
}

#[inline]
pub(crate) fn make_hash<K: Hash + ?Sized>(hash_builder: &impl BuildHasher, key: &K) -> u64 {
    let mut state = hash_builder.build_hasher();
    key.hash(&mut state);
    state.finish()
}

/// Hashes a byte string case-insensitively (ASCII only), matching
/// `hashsetGenCaseHashFunction`. Useful for key types whose equality is
/// itself case-insensitive.
pub fn hash_bytes_case_insensitive(bytes: &[u8]) -> u64 {
    let seed = hash_function_seed();
    let k0 = u64::from_ne_bytes(seed[0..8].try_into().unwrap());
    let k1 = u64::from_ne_bytes(seed[8..16].try_into().unwrap());
    let mut hasher = SipHasher13::new_with_keys(k0, k1);
    for &b in bytes {
        hasher.write_u8(b.to_ascii_lowercase());
    }
    hasher.finish()
}

/// The top byte of a 64-bit hash, stored per-slot to reject most mismatches
/// without dereferencing the element.
#[inline]
pub(crate) fn hash_fragment(hash: u64) -> u8 {
    (hash >> 56) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_matches_regardless_of_case() {
        assert_eq!(hash_bytes_case_insensitive(b"Hello"), hash_bytes_case_insensitive(b"HELLO"));
        assert_eq!(hash_bytes_case_insensitive(b"Hello"), hash_bytes_case_insensitive(b"hello"));
    }

    #[test]
    fn fragment_is_top_byte() {
        assert_eq!(hash_fragment(0x12_34_56_78_9a_bc_de_f0), 0x12);
    }
}
