use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, BTreeSet};

type Model = BTreeMap<String, BTreeSet<i64>>;

fn validate_trie(t: &PrefixTrie<i64>) {
    let arena = t.arena();
    let root = arena.get(NodeId::ROOT);
    assert!(root.values.is_empty(), "root must never hold values");
    assert!(root.parent.is_none() && root.ch.is_none());

    let mut stack = vec![NodeId::ROOT];
    let mut reachable = 0usize;
    let mut pairs = 0usize;
    while let Some(id) = stack.pop() {
        reachable += 1;
        let node = arena.get(id);
        pairs += node.values.len();

        if id != NodeId::ROOT {
            assert!(!node.is_dead(), "dead node {id:?} left in the tree");
        }
        assert!(
            node.children.windows(2).all(|w| w[0].0 < w[1].0),
            "edges of {id:?} must be strictly sorted"
        );

        for &(ch, child) in &node.children {
            let c = arena.get(child);
            assert_eq!(c.parent, Some(id), "parent handle of {child:?}");
            assert_eq!(c.ch, Some(ch), "edge label of {child:?}");
            stack.push(child);
        }
    }

    assert_eq!(pairs, t.len(), "stored pairs must match PrefixTrie::len");
    assert_eq!(
        reachable,
        t.node_count(),
        "every live node must be reachable from the root"
    );
}

/// Root plus one node per distinct non-empty prefix of a stored key.
fn expected_node_count(m: &Model) -> usize {
    let mut prefixes = BTreeSet::new();
    for key in m.keys() {
        for (end, ch) in key.char_indices() {
            prefixes.insert(&key[..end + ch.len_utf8()]);
        }
    }
    prefixes.len() + 1
}

fn expected_ids(m: &Model, prefix: &str) -> BTreeSet<i64> {
    m.iter()
        .filter(|(key, _)| key.starts_with(prefix))
        .flat_map(|(_, ids)| ids.iter().copied())
        .collect()
}

fn key_strategy() -> impl Strategy<Value = String> {
    // A narrow alphabet so keys share prefixes and branches get pruned.
    "[abcé]{0,5}"
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 5)]
    Insert(
        #[proptest(strategy = "key_strategy()")] String,
        #[proptest(strategy = "0i64..6")] i64,
    ),
    #[proptest(weight = 3)]
    Remove(
        #[proptest(strategy = "key_strategy()")] String,
        #[proptest(strategy = "0i64..6")] i64,
    ),
    #[proptest(weight = 2)]
    Find(
        #[proptest(strategy = "key_strategy()")] String,
        #[proptest(strategy = "0usize..8")] usize,
    ),
}

fn pairs_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec((key_strategy(), 0i64..10), 0..=64)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in prop::collection::vec(any::<Op>(), 0..=400)) {
        let mut t: PrefixTrie<i64> = PrefixTrie::new();
        let mut m: Model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, id) => {
                    let expected = !key.is_empty() && m.entry(key.clone()).or_default().insert(id);
                    prop_assert_eq!(t.insert(&key, id), expected);
                }
                Op::Remove(key, id) => {
                    let expected = m.get_mut(&key).is_some_and(|ids| ids.remove(&id));
                    if m.get(&key).is_some_and(BTreeSet::is_empty) {
                        m.remove(&key);
                    }
                    prop_assert_eq!(t.remove(&key, id), expected);
                }
                Op::Find(prefix, max) => {
                    let got = t.find(&prefix, max);
                    let unique: BTreeSet<i64> = got.iter().copied().collect();
                    prop_assert_eq!(unique.len(), got.len(), "duplicate ids in {:?}", got);

                    if prefix.is_empty() || max == 0 {
                        prop_assert!(got.is_empty());
                    } else {
                        let expected = expected_ids(&m, &prefix);
                        prop_assert!(unique.is_subset(&expected));
                        prop_assert_eq!(got.len(), max.min(expected.len()));
                    }
                }
            }

            prop_assert_eq!(t.len(), m.values().map(BTreeSet::len).sum::<usize>());
        }

        validate_trie(&t);
        prop_assert_eq!(t.node_count(), expected_node_count(&m));
    }

    #[test]
    fn prop_remove_inverts_insert(pairs in pairs_strategy()) {
        let mut t: PrefixTrie<i64> = PrefixTrie::new();
        for (key, id) in &pairs {
            t.insert(key, *id);
        }
        validate_trie(&t);

        for (key, id) in pairs.iter().rev() {
            t.remove(key, *id);
            validate_trie(&t);
        }
        prop_assert_eq!(t.len(), 0);
        prop_assert_eq!(t.node_count(), 1);
    }

    #[test]
    fn prop_every_prefix_finds_its_id(pairs in pairs_strategy()) {
        let t: PrefixTrie<i64> = pairs.iter().map(|(k, id)| (k.as_str(), *id)).collect();

        for (key, id) in pairs.iter().filter(|(k, _)| !k.is_empty()) {
            for (end, ch) in key.char_indices() {
                let prefix = &key[..end + ch.len_utf8()];
                let got = t.find(prefix, usize::MAX);
                prop_assert!(got.contains(id), "{} missing under {:?}", id, prefix);
            }
        }
    }

    #[test]
    fn prop_truncation_is_a_prefix_of_the_full_walk(
        pairs in pairs_strategy(),
        prefix in "[abcé]{1,2}",
        max in 1usize..12,
    ) {
        let t: PrefixTrie<i64> = pairs.iter().map(|(k, id)| (k.as_str(), *id)).collect();

        let full = t.find(&prefix, usize::MAX);
        let truncated = t.find(&prefix, max);
        prop_assert_eq!(truncated.len(), max.min(full.len()));
        prop_assert_eq!(&truncated[..], &full[..truncated.len()]);
        prop_assert_eq!(t.find(&prefix, max), truncated);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_remove_order_small_set() {
    let pairs = [
        ("go", 1i64),
        ("git", 2),
        ("gob", 3),
        ("go", 4),
        ("goal", 5),
        ("foo", 1),
    ];
    let base: PrefixTrie<i64> = pairs.iter().copied().collect();

    for_each_permutation(&pairs, |perm| {
        let mut t = base.clone();
        let mut remaining = pairs.len();
        for (key, id) in perm {
            assert!(t.remove(key, id));
            remaining -= 1;
            assert_eq!(t.len(), remaining);
            validate_trie(&t);
        }
        assert_eq!(t.node_count(), 1);
    });
}

#[test]
fn exhaustive_insert_order_gives_same_find() {
    let pairs = [("ab", 1i64), ("a", 2), ("abc", 3), ("b", 4), ("ab", 5), ("ac", 6)];
    let expected: PrefixTrie<i64> = pairs.iter().copied().collect();
    let expected_a = expected.find("a", usize::MAX);

    for_each_permutation(&pairs, |perm| {
        let t: PrefixTrie<i64> = perm.into_iter().collect();
        validate_trie(&t);
        assert_eq!(t.node_count(), expected.node_count());
        assert_eq!(t.find("a", usize::MAX), expected_a);
    });
}
