//! GUID-keyed ordered index.

use indexmap::IndexMap;
use notecache_protocol::{Note, Notebook};

/// A record addressable by GUID.
pub trait Keyed {
    /// Returns the record's GUID.
    fn guid(&self) -> &str;
}

impl Keyed for Note {
    fn guid(&self) -> &str {
        &self.guid
    }
}

impl Keyed for Notebook {
    fn guid(&self) -> &str {
        &self.guid
    }
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The GUID was not present.
    Inserted,
    /// The GUID was present; the old record was replaced and moved to the end.
    Replaced,
}

/// Ordered mapping from GUID to record.
///
/// Iteration order is first-seen order, except that every upsert of an
/// existing GUID removes the old entry and appends the new one, so the most
/// recently changed records come last. This mirrors the append-only change
/// log the records come from.
#[derive(Debug, Clone)]
pub struct EntityIndex<T> {
    entries: IndexMap<String, T>,
}

/// Equality includes iteration order.
impl<T: PartialEq> PartialEq for EntityIndex<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<T> Default for EntityIndex<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T: Keyed> EntityIndex<T> {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index by upserting records in order.
    pub fn from_records(records: impl IntoIterator<Item = T>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.upsert(record);
        }
        index
    }

    /// Inserts a record, moving it to the end if its GUID was present.
    pub fn upsert(&mut self, record: T) -> Upsert {
        let key = record.guid().to_string();
        let outcome = if self.entries.shift_remove(&key).is_some() {
            Upsert::Replaced
        } else {
            Upsert::Inserted
        };
        self.entries.insert(key, record);
        outcome
    }

    /// Removes a record. Unknown GUIDs are ignored.
    pub fn remove(&mut self, guid: &str) -> Option<T> {
        self.entries.shift_remove(guid)
    }

    /// Returns true if the GUID is present.
    #[must_use]
    pub fn contains(&self, guid: &str) -> bool {
        self.entries.contains_key(guid)
    }

    /// Looks up a record.
    #[must_use]
    pub fn get(&self, guid: &str) -> Option<&T> {
        self.entries.get(guid)
    }

    /// Iterates records in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Iterates GUIDs in index order.
    pub fn guids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a EntityIndex<T> {
    type Item = &'a T;
    type IntoIter = indexmap::map::Values<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notecache_protocol::Usn;
    use proptest::prelude::*;

    fn note(guid: &str, title: &str) -> Note {
        Note::new(guid, title, "nb", Usn::new(1))
    }

    fn order(index: &EntityIndex<Note>) -> Vec<&str> {
        index.guids().collect()
    }

    #[test]
    fn upsert_appends_new_guids() {
        let mut index = EntityIndex::new();
        assert_eq!(index.upsert(note("a", "1")), Upsert::Inserted);
        assert_eq!(index.upsert(note("b", "2")), Upsert::Inserted);
        assert_eq!(order(&index), vec!["a", "b"]);
    }

    #[test]
    fn upsert_moves_updated_entry_to_end() {
        let mut index = EntityIndex::new();
        index.upsert(note("a", "1"));
        index.upsert(note("b", "2"));
        index.upsert(note("c", "3"));

        assert_eq!(index.upsert(note("a", "1 edited")), Upsert::Replaced);
        assert_eq!(order(&index), vec!["b", "c", "a"]);
        assert_eq!(index.get("a").unwrap().title, "1 edited");
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn remove_unknown_guid_is_noop() {
        let mut index = EntityIndex::new();
        index.upsert(note("a", "1"));
        index.upsert(note("b", "2"));

        assert!(index.remove("zzz").is_none());
        assert_eq!(order(&index), vec!["a", "b"]);
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut index = EntityIndex::new();
        for guid in ["a", "b", "c", "d"] {
            index.upsert(note(guid, ""));
        }
        index.remove("b");
        assert_eq!(order(&index), vec!["a", "c", "d"]);
    }

    #[test]
    fn equality_is_order_sensitive() {
        let ab = EntityIndex::from_records(vec![note("a", ""), note("b", "")]);
        let ba = EntityIndex::from_records(vec![note("b", ""), note("a", "")]);
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn from_records_deduplicates_last_wins() {
        let index = EntityIndex::from_records(vec![note("a", "old"), note("b", ""), note("a", "new")]);
        assert_eq!(order(&index), vec!["b", "a"]);
        assert_eq!(index.get("a").unwrap().title, "new");
    }

    /// Reference model: a plain vector with explicit remove-then-push.
    fn model_order(ops: &[u8]) -> Vec<String> {
        let mut model: Vec<String> = Vec::new();
        for op in ops {
            let guid = format!("g{op}");
            model.retain(|g| *g != guid);
            model.push(guid);
        }
        model
    }

    proptest! {
        #[test]
        fn order_is_first_seen_then_moved_to_end(ops in prop::collection::vec(0u8..8, 0..64)) {
            let mut index = EntityIndex::new();
            for op in &ops {
                index.upsert(note(&format!("g{op}"), ""));
            }
            let expected = model_order(&ops);
            let actual: Vec<String> = index.guids().map(str::to_string).collect();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn replaying_a_batch_is_idempotent(ops in prop::collection::vec(0u8..8, 0..32)) {
            let batch: Vec<Note> = ops.iter().map(|op| note(&format!("g{op}"), "t")).collect();

            let mut once = EntityIndex::new();
            for n in batch.iter().cloned() {
                once.upsert(n);
            }
            let mut twice = once.clone();
            for n in batch.iter().cloned() {
                twice.upsert(n);
            }
            prop_assert_eq!(once, twice);
        }
    }
}
