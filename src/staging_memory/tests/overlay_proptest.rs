use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use staging_memory::{Overlay, OverlayError};

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u32),
    Delete(u8),
    Commit,
    Discard,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..12, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        3 => (0u8..12).prop_map(Op::Delete),
        1 => Just(Op::Commit),
        1 => Just(Op::Discard),
    ]
}

/// Count present keys by scanning every key the overlay could know about.
fn brute_force_len(overlay: &Overlay<'_, u8, u32, BTreeMap<u8, u32>>) -> usize {
    let mut candidates: BTreeSet<u8> = overlay.base().keys().copied().collect();
    candidates.extend(overlay.changed().copied());
    candidates.extend(overlay.deleted().copied());
    candidates
        .into_iter()
        .filter(|k| overlay.contains_key(k).unwrap())
        .count()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Runs random set/delete/commit/discard sequences against a plain
    /// `BTreeMap` model of the view and of the committed base.
    #[test]
    fn overlay_matches_model(
        initial in prop::collection::btree_map(0u8..12, any::<u32>(), 0..8),
        ops in prop::collection::vec(op_strategy(), 1..64),
    ) {
        let mut base = initial.clone();
        let mut committed = initial.clone();
        let mut view = initial;
        let mut overlay = Overlay::new(&mut base).unwrap();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    overlay.set(k, v).unwrap();
                    view.insert(k, v);
                    prop_assert_eq!(overlay.get(&k).unwrap(), v);
                }
                Op::Delete(k) => {
                    let res = overlay.delete(&k);
                    if view.remove(&k).is_some() {
                        prop_assert!(res.is_ok());
                        prop_assert!(overlay.get(&k).is_err());
                    } else {
                        prop_assert!(matches!(res, Err(OverlayError::KeyNotFound(_))));
                    }
                }
                Op::Commit => {
                    overlay.commit().unwrap();
                    committed = view.clone();
                    prop_assert!(!overlay.is_dirty());
                }
                Op::Discard => {
                    overlay.discard().unwrap();
                    view = committed.clone();
                }
            }

            prop_assert_eq!(overlay.len(), brute_force_len(&overlay));
            prop_assert_eq!(overlay.len(), view.len());
            prop_assert_eq!(overlay.snapshot().unwrap(), view.clone());
            prop_assert!(overlay.eq_map(&view).unwrap());
            prop_assert_eq!(overlay.base(), &committed);
        }
    }
}
