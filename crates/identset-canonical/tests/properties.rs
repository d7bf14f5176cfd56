//! Property-based tests for identity invariants.

use std::collections::{BTreeMap, HashMap};

use identset_canonical::{identity, identity_record};
use proptest::prelude::*;

identity_record! {
    #[derive(Debug, Clone)]
    struct Entry {
        key: String,
        weight: i64,
        tags: Vec<String>,
        note: String => "-",
    }
}

fn entry() -> impl Strategy<Value = Entry> {
    (
        "[a-z]{0,12}",
        any::<i64>(),
        prop::collection::vec("[a-z]{1,4}", 0..5),
        ".*",
    )
        .prop_map(|(key, weight, tags, note)| Entry {
            key,
            weight,
            tags,
            note,
        })
}

proptest! {
    /// Identity is a pure function of the value.
    #[test]
    fn identity_is_deterministic(e in entry()) {
        prop_assert_eq!(identity(&e).unwrap(), identity(&e.clone()).unwrap());
    }

    /// Values differing only in an excluded field share a digest.
    #[test]
    fn excluded_field_never_matters(e in entry(), other_note in ".*") {
        let mut changed = e.clone();
        changed.note = other_note;
        prop_assert_eq!(identity(&e).unwrap(), identity(&changed).unwrap());
    }

    /// Maps with equal content share a digest regardless of container or insertion order.
    #[test]
    fn map_content_decides_identity(pairs in prop::collection::vec(("[a-z]{1,6}", any::<u32>()), 0..16)) {
        let forward: HashMap<String, u32> = pairs.iter().cloned().collect();
        let mut backward = HashMap::new();
        for (k, v) in forward.iter().collect::<Vec<_>>().into_iter().rev() {
            backward.insert(k.clone(), *v);
        }
        let sorted: BTreeMap<String, u32> = forward.clone().into_iter().collect();

        let id = identity(&forward).unwrap();
        prop_assert_eq!(&id, &identity(&backward).unwrap());
        prop_assert_eq!(&id, &identity(&sorted).unwrap());
    }

    /// Sequence order is significant.
    #[test]
    fn sequence_order_matters(a in any::<u32>(), b in any::<u32>()) {
        prop_assume!(a != b);
        prop_assert_ne!(identity(&vec![a, b]).unwrap(), identity(&vec![b, a]).unwrap());
    }
}
