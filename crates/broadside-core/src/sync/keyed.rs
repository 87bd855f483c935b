use std::collections::HashMap;
use std::hash::Hash;

use crate::artifacts::SceneRoundKey;

/// Inner join of two keyed collections.
///
/// Keys present on only one side are dropped. Output follows the order of
/// `left`; a left entry matching several right entries yields one row per
/// match, in the right side's arrival order.
pub fn join<K, A, B>(left: Vec<(K, A)>, right: Vec<(K, B)>) -> Vec<(K, A, B)>
where
    K: Eq + Hash + Clone,
    A: Clone,
    B: Clone,
{
    let mut by_key: HashMap<K, Vec<B>> = HashMap::new();
    for (key, value) in right {
        by_key.entry(key).or_default().push(value);
    }

    let mut joined = Vec::new();
    for (key, a) in left {
        if let Some(matches) = by_key.get(&key) {
            for b in matches {
                joined.push((key.clone(), a.clone(), b.clone()));
            }
        }
    }
    joined
}

/// Partition `items` by key.
///
/// Groups appear in first-seen key order and keep their members' arrival
/// order.
pub fn group_by_key<K, V>(items: Vec<(K, V)>) -> Vec<(K, Vec<V>)>
where
    K: Eq + Hash + Clone,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<V>)> = Vec::new();
    for (key, value) in items {
        match index.get(&key) {
            Some(&i) => groups[i].1.push(value),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![value]));
            }
        }
    }
    groups
}

/// Attach each per-round artifact to every (scene, round) pair of that round.
///
/// Pairs rejected by `is_member` are filtered out before the join, so a
/// round's artifact never reaches a scene that lacks the round even when
/// other scenes have it.
pub fn broadcast_to_members<P, T, F>(
    per_round: Vec<(String, P)>,
    pairs: Vec<(SceneRoundKey, T)>,
    is_member: F,
) -> Vec<(SceneRoundKey, T, P)>
where
    P: Clone,
    T: Clone,
    F: Fn(&SceneRoundKey) -> bool,
{
    let by_round: Vec<(String, (SceneRoundKey, T))> = pairs
        .into_iter()
        .filter(|(key, _)| is_member(key))
        .map(|(key, value)| (key.round.clone(), (key, value)))
        .collect();

    join(by_round, per_round)
        .into_iter()
        .map(|(_, (key, value), artifact)| (key, value, artifact))
        .collect()
}
