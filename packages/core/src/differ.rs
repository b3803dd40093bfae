//! Keyed Sequence Differ
//!
//! Computes the edit operations turning an old key sequence into a new one.
//! Indices refer to the sequence as transformed so far; `Store` moves items
//! into a side buffer in emission order and `Restore` takes them back out.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Insert `new[index..index + count]` at `index`.
    Insert { index: usize, count: usize },
    /// Detach and destroy `count` items at `index`.
    Delete { index: usize, count: usize },
    /// Detach `count` items at `index` into the store, keeping them alive.
    Store { index: usize, count: usize },
    /// Reinsert `count` stored items, starting at `store_index`, at `index`.
    Restore {
        index: usize,
        count: usize,
        store_index: usize,
    },
}

type Counts<'a, K> = HashMap<&'a K, usize>;

fn count_keys<K: Eq + Hash>(keys: &[K]) -> Counts<'_, K> {
    let mut counts = HashMap::with_capacity(keys.len());
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

fn available<K: Eq + Hash>(counts: &Counts<'_, K>, key: &K) -> bool {
    counts.get(key).map_or(false, |n| *n > 0)
}

/// Consume one occurrence of `key`. Returns false if none is left.
fn take<'a, K: Eq + Hash>(counts: &mut Counts<'a, K>, key: &K) -> bool {
    match counts.get_mut(key) {
        Some(n) if *n > 0 => {
            *n -= 1;
            true
        }
        _ => false,
    }
}

/// Diff two key sequences.
///
/// Equal or one-sided inputs yield at most one op. Inputs with no key in
/// common yield a `Delete` of the old run followed by an `Insert` of the new
/// one, since no single op replaces a range.
pub fn diff_keys<K: Eq + Hash>(old: &[K], new: &[K]) -> Vec<EditOp> {
    let mut ops = Vec::new();

    // common prefix and suffix
    let mut start = 0;
    while start < old.len() && start < new.len() && old[start] == new[start] {
        start += 1;
    }
    let mut old_end = old.len();
    let mut new_end = new.len();
    while old_end > start && new_end > start && old[old_end - 1] == new[new_end - 1] {
        old_end -= 1;
        new_end -= 1;
    }

    // a single contiguous insert or delete
    if old_end == start && new_end == start {
        return ops;
    }
    if old_end == start {
        ops.push(EditOp::Insert {
            index: start,
            count: new_end - start,
        });
        return ops;
    }
    if new_end == start {
        ops.push(EditOp::Delete {
            index: start,
            count: old_end - start,
        });
        return ops;
    }

    // greedy walk
    let mut new_counts = count_keys(&new[start..new_end]);
    let mut old_counts: Option<Counts<'_, K>> = None;
    let mut oi = start;
    let mut ni = start;
    while oi < old_end && ni < new_end {
        if old[oi] == new[ni] {
            while oi < old_end && ni < new_end && old[oi] == new[ni] {
                take(&mut new_counts, &new[ni]);
                if let Some(counts) = old_counts.as_mut() {
                    take(counts, &old[oi]);
                }
                oi += 1;
                ni += 1;
            }
            continue;
        }

        if !available(&new_counts, &old[oi]) {
            let run = oi;
            while oi < old_end && !available(&new_counts, &old[oi]) {
                if let Some(counts) = old_counts.as_mut() {
                    take(counts, &old[oi]);
                }
                oi += 1;
            }
            ops.push(EditOp::Delete {
                index: ni,
                count: oi - run,
            });
            continue;
        }

        let counts = old_counts.get_or_insert_with(|| count_keys(&old[oi..old_end]));
        if !available(counts, &new[ni]) {
            let run = ni;
            while ni < new_end && !available(counts, &new[ni]) {
                take(&mut new_counts, &new[ni]);
                ni += 1;
            }
            ops.push(EditOp::Insert {
                index: run,
                count: ni - run,
            });
            continue;
        }

        break;
    }

    if oi == old_end && ni == new_end {
        return ops;
    }
    if oi == old_end {
        ops.push(EditOp::Insert {
            index: ni,
            count: new_end - ni,
        });
        return ops;
    }
    if ni == new_end {
        ops.push(EditOp::Delete {
            index: ni,
            count: old_end - oi,
        });
        return ops;
    }

    rebuild(&old[oi..old_end], &new[ni..new_end], ni, new_counts, &mut ops);
    ops
}

/// The earliest stored slot holding `key`.
fn front<K: Eq + Hash>(stored: &HashMap<&K, VecDeque<usize>>, key: &K) -> Option<usize> {
    stored.get(key).and_then(|slots| slots.front().copied())
}

/// Store or delete every remaining old item, then restore or insert every
/// remaining new one. `wanted` counts the keys of `new`.
fn rebuild<'a, K: Eq + Hash>(
    old: &'a [K],
    new: &'a [K],
    index: usize,
    mut wanted: Counts<'a, K>,
    ops: &mut Vec<EditOp>,
) {
    let mut stored: HashMap<&K, VecDeque<usize>> = HashMap::new();
    let mut store_len = 0;

    let mut i = 0;
    while i < old.len() {
        let run = i;
        if take(&mut wanted, &old[i]) {
            loop {
                stored.entry(&old[i]).or_default().push_back(store_len);
                store_len += 1;
                i += 1;
                if i >= old.len() || !take(&mut wanted, &old[i]) {
                    break;
                }
            }
            ops.push(EditOp::Store {
                index,
                count: i - run,
            });
        } else {
            i += 1;
            while i < old.len() && !available(&wanted, &old[i]) {
                i += 1;
            }
            ops.push(EditOp::Delete {
                index,
                count: i - run,
            });
        }
    }

    let mut position = index;
    let mut j = 0;
    while j < new.len() {
        match front(&stored, &new[j]) {
            Some(store_index) => {
                let mut count = 0;
                while j < new.len() && front(&stored, &new[j]) == Some(store_index + count) {
                    if let Some(slots) = stored.get_mut(&new[j]) {
                        slots.pop_front();
                    }
                    count += 1;
                    j += 1;
                }
                ops.push(EditOp::Restore {
                    index: position,
                    count,
                    store_index,
                });
                position += count;
            }
            None => {
                let run = j;
                j += 1;
                while j < new.len() && front(&stored, &new[j]).is_none() {
                    j += 1;
                }
                ops.push(EditOp::Insert {
                    index: position,
                    count: j - run,
                });
                position += j - run;
            }
        }
    }
}

/// Positional fallback for unkeyed sequences: grow or shrink at the end.
pub fn length_delta(old_len: usize, new_len: usize) -> Vec<EditOp> {
    if new_len > old_len {
        vec![EditOp::Insert {
            index: old_len,
            count: new_len - old_len,
        }]
    } else if new_len < old_len {
        vec![EditOp::Delete {
            index: new_len,
            count: old_len - new_len,
        }]
    } else {
        Vec::new()
    }
}

/// Apply `ops` to a copy of `old`, drawing inserted items from `new`.
pub fn apply_ops<K: Clone>(old: &[K], new: &[K], ops: &[EditOp]) -> Vec<K> {
    let mut items: Vec<K> = old.to_vec();
    let mut store: Vec<K> = Vec::new();
    for op in ops {
        match *op {
            EditOp::Insert { index, count } => {
                let inserted = new[index..index + count].iter().cloned();
                items.splice(index..index, inserted);
            }
            EditOp::Delete { index, count } => {
                items.drain(index..index + count);
            }
            EditOp::Store { index, count } => {
                store.extend(items.drain(index..index + count));
            }
            EditOp::Restore {
                index,
                count,
                store_index,
            } => {
                let restored = store[store_index..store_index + count].iter().cloned();
                items.splice(index..index, restored);
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn identical_sequences_need_nothing() {
        assert!(diff_keys(&keys("abcd"), &keys("abcd")).is_empty());
        assert!(diff_keys::<char>(&[], &[]).is_empty());
    }

    #[test]
    fn pure_append_and_prepend() {
        assert_eq!(
            diff_keys(&keys("ab"), &keys("abcd")),
            vec![EditOp::Insert { index: 2, count: 2 }]
        );
        assert_eq!(
            diff_keys(&keys("cd"), &keys("abcd")),
            vec![EditOp::Insert { index: 0, count: 2 }]
        );
    }

    #[test]
    fn single_contiguous_delete() {
        assert_eq!(
            diff_keys(&keys("abcde"), &keys("ae")),
            vec![EditOp::Delete { index: 1, count: 3 }]
        );
    }

    #[test]
    fn move_to_end_restores() {
        let old = keys("abcd");
        let new = keys("acdb");
        let ops = diff_keys(&old, &new);
        assert!(ops.iter().any(|op| matches!(op, EditOp::Restore { .. })));
        assert!(!ops.iter().any(|op| matches!(op, EditOp::Insert { .. })));
        assert_eq!(apply_ops(&old, &new, &ops), new);
    }

    #[test]
    fn length_delta_grows_and_shrinks_at_the_end() {
        assert_eq!(length_delta(2, 5), vec![EditOp::Insert { index: 2, count: 3 }]);
        assert_eq!(length_delta(5, 2), vec![EditOp::Delete { index: 2, count: 3 }]);
        assert!(length_delta(3, 3).is_empty());
    }
}
