//! Tag Index Module
//!
//! Maps each tag to the set of keys carrying it, so that group invalidation
//! touches only the matching keys.

use std::collections::{HashMap, HashSet};

// == Tag Index ==
/// Reverse index from tag to cache keys.
///
/// A tag is present only while at least one key carries it.
#[derive(Debug, Default)]
pub struct TagIndex {
    tags: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    // == Constructor ==
    /// Creates an empty tag index.
    pub fn new() -> Self {
        Self {
            tags: HashMap::new(),
        }
    }

    // == Register ==
    /// Registers `key` under every tag in `tags`.
    pub fn register<'a>(&mut self, key: &str, tags: impl IntoIterator<Item = &'a String>) {
        for tag in tags {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    // == Unregister ==
    /// Removes `key` from every tag in `tags`, dropping tags left empty.
    pub fn unregister<'a>(&mut self, key: &str, tags: impl IntoIterator<Item = &'a String>) {
        for tag in tags {
            if let Some(keys) = self.tags.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tags.remove(tag);
                }
            }
        }
    }

    // == Keys For Tags ==
    /// Returns the union of keys registered under any of the given tags.
    pub fn keys_for<S: AsRef<str>>(&self, tags: &[S]) -> HashSet<String> {
        tags.iter()
            .filter_map(|tag| self.tags.get(tag.as_ref()))
            .flat_map(|keys| keys.iter().cloned())
            .collect()
    }

    /// Returns the keys registered under every one of the given tags.
    pub fn keys_for_all<S: AsRef<str>>(&self, tags: &[S]) -> HashSet<String> {
        let mut sets = tags.iter().map(|tag| self.tags.get(tag.as_ref()));
        let first = match sets.next() {
            Some(Some(keys)) => keys.clone(),
            _ => return HashSet::new(),
        };

        sets.try_fold(first, |acc, keys| {
            keys.map(|keys| acc.intersection(keys).cloned().collect())
        })
        .unwrap_or_default()
    }

    /// Returns true if the tag currently has at least one key.
    pub fn contains_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// Keys registered under a single tag.
    pub fn keys_of(&self, tag: &str) -> Option<&HashSet<String>> {
        self.tags.get(tag)
    }

    /// Iterates over every `(tag, keys)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashSet<String>)> {
        self.tags.iter()
    }

    /// Number of live tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut index = TagIndex::new();
        index.register("k1", &tags(&["tenant:A", "analytics"]));
        index.register("k2", &tags(&["tenant:B", "analytics"]));

        assert_eq!(index.len(), 3);
        assert_eq!(index.keys_for(&["analytics"]).len(), 2);
        assert_eq!(
            index.keys_for(&["tenant:A"]),
            HashSet::from(["k1".to_string()])
        );
    }

    #[test]
    fn test_keys_for_is_a_union() {
        let mut index = TagIndex::new();
        index.register("k1", &tags(&["a"]));
        index.register("k2", &tags(&["b"]));
        index.register("k3", &tags(&["a", "b"]));

        let keys = index.keys_for(&["a", "b", "missing"]);
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_keys_for_all_is_an_intersection() {
        let mut index = TagIndex::new();
        index.register("k1", &tags(&["tenant:A", "type:overview"]));
        index.register("k2", &tags(&["tenant:A", "type:revenue"]));
        index.register("k3", &tags(&["tenant:B", "type:overview"]));

        assert_eq!(
            index.keys_for_all(&["tenant:A", "type:overview"]),
            HashSet::from(["k1".to_string()])
        );
        assert!(index.keys_for_all(&["tenant:A", "missing"]).is_empty());
        assert!(index.keys_for_all::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_unregister_prunes_empty_tags() {
        let mut index = TagIndex::new();
        index.register("k1", &tags(&["a", "b"]));
        index.register("k2", &tags(&["b"]));

        index.unregister("k1", &tags(&["a", "b"]));

        assert!(!index.contains_tag("a"));
        assert!(index.contains_tag("b"));
        assert_eq!(index.keys_of("b").map(|k| k.len()), Some(1));

        index.unregister("k2", &tags(&["b"]));
        assert!(index.is_empty());
    }

    #[test]
    fn test_unregister_unknown_key_is_noop() {
        let mut index = TagIndex::new();
        index.register("k1", &tags(&["a"]));

        index.unregister("nope", &tags(&["a", "zzz"]));

        assert_eq!(index.keys_of("a").map(|k| k.len()), Some(1));
    }
}
