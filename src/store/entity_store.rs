// src/store/entity_store.rs

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use super::Entity;

/// Id-keyed, insertion-ordered container for one entity kind.
///
/// Ids are unique: `ids` and `entities` always hold the same key set.
#[derive(Debug, Clone)]
pub struct EntityStore<T: Entity> {
    ids: Vec<T::Id>,
    entities: HashMap<T::Id, T>,
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            entities: HashMap::new(),
        }
    }

    /// Merges into an existing record in place, or appends a new one.
    pub fn upsert_one(&mut self, record: T) {
        match self.entities.get_mut(record.id()) {
            Some(existing) => existing.merge(record),
            None => {
                let id = record.id().clone();
                self.ids.push(id.clone());
                self.entities.insert(id, record);
            }
        }
    }

    pub fn upsert_many<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = T>,
    {
        for record in records {
            self.upsert_one(record);
        }
    }

    /// Removes a record. Absent ids are a no-op.
    pub fn remove_one<Q>(&mut self, id: &Q) -> Option<T>
    where
        T::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.entities.remove(id)?;
        self.ids.retain(|k| <T::Id as Borrow<Q>>::borrow(k) != id);
        Some(removed)
    }

    pub fn get_by_id<Q>(&self, id: &Q) -> Option<&T>
    where
        T::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entities.get(id)
    }

    pub(crate) fn get_mut<Q>(&mut self, id: &Q) -> Option<&mut T>
    where
        T::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entities.get_mut(id)
    }

    /// All records in insertion order.
    pub fn get_all(&self) -> Vec<&T> {
        self.iter().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.ids.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn ids(&self) -> &[T::Id] {
        &self.ids
    }

    pub fn contains<Q>(&self, id: &Q) -> bool
    where
        T::Id: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        body: String,
        tag: Option<String>,
    }

    impl Entity for Note {
        type Id = String;

        fn id(&self) -> &String {
            &self.id
        }

        fn merge(&mut self, incoming: Self) {
            self.body = incoming.body;
            crate::store::merge_opt(&mut self.tag, incoming.tag);
        }
    }

    fn note(id: &str, body: &str, tag: Option<&str>) -> Note {
        Note {
            id: id.to_string(),
            body: body.to_string(),
            tag: tag.map(str::to_string),
        }
    }

    #[test]
    fn upsert_keeps_position_and_merges_fields() {
        let mut store = EntityStore::new();
        store.upsert_many(vec![note("a", "1", Some("x")), note("b", "2", None)]);
        store.upsert_one(note("a", "3", None));

        assert_eq!(store.ids(), &["a".to_string(), "b".to_string()]);
        assert_eq!(store.get_by_id("a"), Some(&note("a", "3", Some("x"))));
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut store: EntityStore<Note> = EntityStore::new();
        store.upsert_one(note("a", "1", None));

        assert!(store.remove_one("zzz").is_none());
        assert!(store.remove_one("a").is_some());
        assert!(store.remove_one("a").is_none());
        assert!(store.is_empty());
        assert!(store.ids().is_empty());
    }
}
