use hashset::{ElementPolicy, HashSet, RawHashSet, ResizePolicy, SCAN_SINGLE_STEP};

/// A key-value element whose lookup key is a projection, not the whole
/// value -- the case the `Identity` policy does not cover. Modeled on
/// `test_hashset.c`'s `keyval` element type.
#[derive(Clone, Debug, PartialEq, Eq)]
struct KeyVal {
    key: String,
    value: String,
}

#[derive(Default)]
struct KeyValPolicy;

impl ElementPolicy<KeyVal> for KeyValPolicy {
    type Key = str;
    type Metadata = ();

    fn key<'a>(&self, element: &'a KeyVal) -> &'a str {
        &element.key
    }
}

type KeyValSet = RawHashSet<KeyVal, KeyValPolicy, hashset::DefaultHashBuilder>;

#[test]
fn drop_empty() {
    let set: HashSet<u64> = HashSet::new();
    drop(set);
}

#[test]
fn add_find_delete() {
    let mut set: HashSet<u64> = HashSet::new();
    assert!(set.add(1).is_ok());
    assert!(set.add(2).is_ok());
    assert!(set.add(1).is_err());
    assert_eq!(set.find(&1), Some(&1));
    assert_eq!(set.find(&3), None);
    assert!(set.delete(&1));
    assert!(!set.delete(&1));
    assert_eq!(set.len(), 1);
}

#[test]
fn keyed_element_policy_projects_key() {
    let mut set = KeyValSet::with_hasher(KeyValPolicy, hashset::DefaultHashBuilder);
    set.add(KeyVal {
        key: "alpha".into(),
        value: "1".into(),
    })
    .unwrap();
    set.add(KeyVal {
        key: "beta".into(),
        value: "2".into(),
    })
    .unwrap();

    let found = set.find("alpha").unwrap();
    assert_eq!(found.value, "1");
    assert!(set.find("gamma").is_none());

    let popped = set.pop("alpha").unwrap();
    assert_eq!(popped.value, "1");
    assert!(set.find("alpha").is_none());
}

#[test]
fn add_or_find_returns_existing_without_overwriting() {
    let mut set: HashSet<u64> = HashSet::new();
    assert!(set.add_or_find(5).is_ok());
    let existing = set.add_or_find(5);
    assert_eq!(existing, Err(&5));
    assert_eq!(set.len(), 1);
}

#[test]
fn replace_swaps_in_new_element() {
    let mut set = KeyValSet::with_hasher(KeyValPolicy, hashset::DefaultHashBuilder);
    set.add(KeyVal { key: "a".into(), value: "1".into() }).unwrap();
    let old = set.replace(KeyVal { key: "a".into(), value: "2".into() });
    assert_eq!(old.unwrap().value, "1");
    assert_eq!(set.find("a").unwrap().value, "2");
}

#[test]
fn grow_then_shrink_bucket_counts() {
    hashset::set_resize_policy(hashset::ResizePolicy::Allow);
    let mut set: HashSet<u64> = HashSet::new();
    for i in 0..16u64 {
        set.add(i).unwrap();
    }
    while set.is_rehashing() {
        set.expand_if_needed();
        set.rehash_for_microseconds(std::time::Duration::from_millis(1));
    }
    let buckets_after_16 = set.buckets();
    assert!(buckets_after_16.is_power_of_two());
    assert!(buckets_after_16 * 7 >= 16);
    assert_eq!(set.len(), 16);

    hashset::set_resize_policy(hashset::ResizePolicy::Avoid);
    let avoided_ceiling = 5 * buckets_after_16 as u64;
    for i in 16..avoided_ceiling {
        set.add(i).unwrap();
    }
    let buckets_under_avoid = set.buckets();

    set.add(avoided_ceiling).unwrap();
    while set.is_rehashing() {
        set.rehash_for_microseconds(std::time::Duration::from_millis(1));
    }
    // Under `Avoid`, growth is suppressed below the hard ceiling and forced
    // at or past it regardless of policy -- so the table never shrank below
    // what it needs to hold every element, and ends up at least as big as
    // it was before the final forced growth.
    assert!(set.buckets() >= buckets_under_avoid);
    assert_eq!(set.len() as u64, avoided_ceiling + 1);
    hashset::set_resize_policy(hashset::ResizePolicy::Allow);
}

#[test]
fn add_128_keys_rehashes_without_losing_elements() {
    let mut set: HashSet<u64> = HashSet::new();
    for i in 0..128u64 {
        set.add(i).unwrap();
    }
    while set.is_rehashing() {
        set.rehash_for_microseconds(std::time::Duration::from_millis(1));
    }
    assert_eq!(set.len(), 128);
    assert!(set.buckets().is_power_of_two());
    for i in 0..128u64 {
        assert_eq!(set.find(&i), Some(&i));
    }
}

#[test]
fn two_phase_insert_and_pop_a_million() {
    let mut set: HashSet<u64> = HashSet::with_capacity(1_000_000);
    const N: u64 = 1_000_000;
    for i in 0..N {
        match set.find_position_for_insert(&i) {
            Ok(position) => unsafe { set.insert_at_position(position, i) },
            Err(_) => panic!("unexpected duplicate during fill"),
        }
    }
    assert_eq!(set.len() as u64, N);
    for i in 0..N {
        assert_eq!(set.find(&i), Some(&i));
    }
    for i in 0..N {
        let (value, position) = set.two_phase_pop_find_ref(&i).expect("key must be present");
        assert_eq!(*value, i);
        unsafe {
            set.two_phase_pop_delete(position);
        }
    }
    assert_eq!(set.len(), 0);
}

#[test]
fn instant_rehashing_never_reports_in_progress() {
    #[derive(Default)]
    struct InstantIdentity;
    impl ElementPolicy<u64> for InstantIdentity {
        type Key = u64;
        type Metadata = ();
        fn key<'a>(&self, element: &'a u64) -> &'a u64 {
            element
        }
        fn instant_rehashing(&self) -> bool {
            true
        }
    }
    let mut set: RawHashSet<u64, InstantIdentity, hashset::DefaultHashBuilder> = RawHashSet::new();
    for i in 0..200u64 {
        set.add(i).unwrap();
        assert!(!set.is_rehashing());
        if i % 3 == 0 {
            set.delete(&i);
            assert!(!set.is_rehashing());
        }
    }
}

#[test]
fn bucket_full_probe_saturation_has_no_displacement_deadlock() {
    // 8 buckets (56 slots) filled to 75% -- 42 elements -- with growth and
    // shrinkage both forbidden so the bucket count stays fixed while the
    // repeated sample/delete/refill rounds below run.
    hashset::set_resize_policy(ResizePolicy::Forbid);
    let mut set: HashSet<u64> = HashSet::with_capacity(56);
    assert_eq!(set.buckets(), 8);
    let mut next_key = 0u64;
    for _ in 0..42 {
        set.add(next_key).unwrap();
        next_key += 1;
    }

    let mut cursor = 0u64;
    for round in 0..1000 {
        let mut sampled = Vec::new();
        cursor = set.scan(cursor, SCAN_SINGLE_STEP, |item| match item {
            hashset::ScanItem::Element(e) => sampled.push(*e),
            hashset::ScanItem::Slot(s) => sampled.push(*s),
        });
        for key in &sampled {
            assert!(set.delete(key));
        }
        for _ in 0..sampled.len() {
            set.add(next_key).unwrap();
            next_key += 1;
        }
        assert!(
            set.longest_probe_chain() < set.buckets(),
            "round {round}: probe chain saturated the whole table, a full displacement deadlock"
        );
    }
    hashset::set_resize_policy(ResizePolicy::Allow);
}

#[test]
fn safe_iterator_survives_concurrent_mutation() {
    let mut set: HashSet<u64> = HashSet::new();
    for i in 0..64u64 {
        set.add(i).unwrap();
    }
    let mut iter = set.init_safe_iterator();
    let mut seen = std::collections::HashSet::new();
    let mut steps = 0;
    while let Some(e) = set.next(&mut iter) {
        seen.insert(*e);
        steps += 1;
        if steps == 10 {
            set.delete(&63);
            let _ = set.add(10_000);
        }
    }
    set.reset_iterator(iter);
    for i in 0..63u64 {
        if i != 63 {
            assert!(seen.contains(&i) || i == 10_000);
        }
    }
}
