use std::collections::{HashMap, HashSet};

use crate::discovery::domain::{EntityKey, RankedEntity};

/// Marker operations needed to move from the current marker set to a new result set.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDiff<'a> {
    pub add: Vec<&'a RankedEntity>,
    /// Sorted for deterministic removal order.
    pub remove: Vec<EntityKey>,
    pub retained: Vec<&'a RankedEntity>,
}

impl MarkerDiff<'_> {
    pub fn is_noop(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Pure diff between the keys currently on the map and the next entity set.
///
/// Duplicate keys in `next` keep their first occurrence.
pub fn reconcile<'a, V>(
    current: &HashMap<EntityKey, V>,
    next: &'a [RankedEntity],
) -> MarkerDiff<'a> {
    let mut seen = HashSet::with_capacity(next.len());
    let mut add = Vec::new();
    let mut retained = Vec::new();

    for entity in next {
        let key = entity.key();
        if !seen.insert(key.clone()) {
            continue;
        }
        if current.contains_key(&key) {
            retained.push(entity);
        } else {
            add.push(entity);
        }
    }

    let mut remove: Vec<EntityKey> = current
        .keys()
        .filter(|key| !seen.contains(*key))
        .cloned()
        .collect();
    remove.sort();

    MarkerDiff {
        add,
        remove,
        retained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::tests::common::office;

    fn ranked(id: &str) -> RankedEntity {
        RankedEntity::unranked(office(id))
    }

    fn markers(ids: &[&str]) -> HashMap<EntityKey, ()> {
        ids.iter().map(|id| (ranked(id).key(), ())).collect()
    }

    #[test]
    fn diff_adds_new_and_removes_missing() {
        let current = markers(&["a", "b", "c"]);
        let next = vec![ranked("b"), ranked("d"), ranked("a")];

        let diff = reconcile(&current, &next);
        assert_eq!(diff.add.len(), 1);
        assert_eq!(diff.add[0].entity.id.0, "d");
        assert_eq!(diff.remove, vec![ranked("c").key()]);
        assert_eq!(diff.retained.len(), 2);
    }

    #[test]
    fn identical_sets_produce_no_operations() {
        let current = markers(&["a", "b"]);
        let next = vec![ranked("a"), ranked("b")];
        assert!(reconcile(&current, &next).is_noop());
    }

    #[test]
    fn duplicate_keys_are_added_once() {
        let current: HashMap<EntityKey, ()> = HashMap::new();
        let next = vec![ranked("a"), ranked("a")];
        assert_eq!(reconcile(&current, &next).add.len(), 1);
    }
}
