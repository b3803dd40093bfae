//! Keyed Differ Tests
//!
//! Edit operations for common reorders, plus a seeded sweep checking that
//! applying the operations always reproduces the new sequence.

#[path = "util.rs"]
mod util;
use util::Lcg;

use std::collections::HashSet;

use trellis_core::differ::{apply_ops, diff_keys, length_delta, EditOp};
use trellis_core::Value;

fn keys(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Keys handed to `Insert` ops, in op order.
fn inserted<K: Clone>(new: &[K], ops: &[EditOp]) -> Vec<K> {
    let mut out = Vec::new();
    for op in ops {
        if let EditOp::Insert { index, count } = *op {
            // indices are positions in the transformed sequence, which lines up with `new`
            out.extend_from_slice(&new[index..index + count]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_move_an_item_to_the_end_through_the_store() {
        let ops = diff_keys(&keys("abcd"), &keys("acdb"));
        assert_eq!(
            ops,
            vec![
                EditOp::Store { index: 1, count: 3 },
                EditOp::Restore {
                    index: 1,
                    count: 2,
                    store_index: 1
                },
                EditOp::Restore {
                    index: 3,
                    count: 1,
                    store_index: 0
                },
            ]
        );
    }

    #[test]
    fn should_replace_disjoint_sequences_with_one_delete_and_one_insert() {
        let ops = diff_keys(&keys("ab"), &keys("cd"));
        assert_eq!(
            ops,
            vec![
                EditOp::Delete { index: 0, count: 2 },
                EditOp::Insert { index: 0, count: 2 },
            ]
        );
    }

    #[test]
    fn should_emit_nothing_for_equal_sequences() {
        assert!(diff_keys(&keys("abc"), &keys("abc")).is_empty());
    }

    #[test]
    fn should_insert_into_the_middle() {
        assert_eq!(
            diff_keys(&keys("ad"), &keys("abcd")),
            vec![EditOp::Insert { index: 1, count: 2 }]
        );
    }

    #[test]
    fn should_clear_a_sequence_with_one_delete() {
        assert_eq!(
            diff_keys(&keys("abc"), &[]),
            vec![EditOp::Delete { index: 0, count: 3 }]
        );
    }

    #[test]
    fn should_handle_a_swap_of_two_items() {
        let old = keys("abcde");
        let new = keys("adcbe");
        let ops = diff_keys(&old, &new);
        assert_eq!(apply_ops(&old, &new, &ops), new);
        assert!(inserted(&new, &ops).is_empty());
    }

    #[test]
    fn should_handle_duplicate_keys() {
        let old = keys("aab");
        let new = keys("baa");
        let ops = diff_keys(&old, &new);
        assert_eq!(apply_ops(&old, &new, &ops), new);
        assert!(inserted(&new, &ops).is_empty());
    }

    #[test]
    fn should_diff_values_with_nan_keys() {
        let old = vec![Value::from(1), Value::Number(f64::NAN), Value::from("x")];
        let new = vec![Value::Number(f64::NAN), Value::from("x"), Value::from(1)];
        let ops = diff_keys(&old, &new);
        assert_eq!(apply_ops(&old, &new, &ops), new);
        assert!(inserted(&new, &ops).is_empty());
    }

    #[test]
    fn should_grow_and_shrink_unkeyed_sequences_at_the_end() {
        assert_eq!(length_delta(0, 2), vec![EditOp::Insert { index: 0, count: 2 }]);
        assert_eq!(length_delta(4, 1), vec![EditOp::Delete { index: 1, count: 3 }]);
    }

    #[test]
    fn should_reproduce_random_permutations_without_recreating_survivors() {
        let mut rng = Lcg::new(7);
        for _ in 0..500 {
            let old_len = rng.below(12);
            let old: Vec<u32> = (0..old_len as u32).collect();

            // drop some, shuffle, then add fresh keys at random positions
            let mut new: Vec<u32> = old.iter().copied().filter(|_| rng.below(4) != 0).collect();
            for i in (1..new.len()).rev() {
                let j = rng.below(i + 1);
                new.swap(i, j);
            }
            let fresh = rng.below(4);
            for k in 0..fresh {
                let at = rng.below(new.len() + 1);
                new.insert(at, 100 + k as u32);
            }

            let ops = diff_keys(&old, &new);
            assert_eq!(apply_ops(&old, &new, &ops), new, "ops {:?}", ops);

            let survivors: HashSet<u32> = old.iter().copied().filter(|k| new.contains(k)).collect();
            for key in inserted(&new, &ops) {
                assert!(!survivors.contains(&key), "survivor {} was recreated: {:?}", key, ops);
            }
            for op in &ops {
                if let EditOp::Delete { index, count } = *op {
                    assert!(count > 0, "empty delete at {}", index);
                }
            }
        }
    }
}
