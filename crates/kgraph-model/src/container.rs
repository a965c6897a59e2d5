//! Indexed entity container
//!
//! Primary store is an `IndexMap` keyed by id (insertion-order iteration
//! for deterministic rendering and layout), with derived secondary
//! indices by type and by tag. Every mutation path updates the indices
//! in the same operation; a rebuild is never required.

use crate::entity::Entity;
use crate::error::{ModelError, Result};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// Insert semantics for [`EntityContainer::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddPolicy {
    /// Add-if-missing: inserting an occupied id is a no-op.
    #[default]
    IfMissing,
    /// Overwrite an occupied id (the new entity's attributes win).
    Replace,
    /// Strict uniqueness: inserting an occupied id is a `DuplicateId` error.
    Unique,
}

/// An indexed collection of entities keyed by id.
#[derive(Debug, Clone)]
pub struct EntityContainer<V: Entity> {
    entries: IndexMap<String, V>,
    by_type: HashMap<String, BTreeSet<String>>,
    by_tag: HashMap<String, BTreeSet<String>>,
}

impl<V: Entity> Default for EntityContainer<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Entity> EntityContainer<V> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            by_type: HashMap::new(),
            by_tag: HashMap::new(),
        }
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Insert an entity under the given policy.
    ///
    /// Returns `Ok(true)` if the container changed, `Ok(false)` for an
    /// `IfMissing` no-op.
    pub fn add(&mut self, entity: V, policy: AddPolicy) -> Result<bool> {
        if self.entries.contains_key(entity.id()) {
            match policy {
                AddPolicy::IfMissing => return Ok(false),
                AddPolicy::Unique => return Err(ModelError::DuplicateId(entity.id().to_string())),
                AddPolicy::Replace => {
                    let id = entity.id().to_string();
                    self.unindex(&id);
                    self.index(&entity);
                    // IndexMap keeps the original insertion slot on overwrite.
                    self.entries.insert(id, entity);
                    return Ok(true);
                }
            }
        }
        self.index(&entity);
        self.entries.insert(entity.id().to_string(), entity);
        Ok(true)
    }

    /// Remove an entity, purging it from the primary store and every
    /// secondary index. `strict` decides whether removing an absent id
    /// is a `NotFound` error or a no-op.
    pub fn remove(&mut self, id: &str, strict: bool) -> Result<Option<V>> {
        if !self.entries.contains_key(id) {
            if strict {
                return Err(ModelError::NotFound(id.to_string()));
            }
            return Ok(None);
        }
        self.unindex(id);
        Ok(self.entries.shift_remove(id))
    }

    /// Mutate an entity in place, re-indexing it afterwards so type/tag
    /// changes are reflected immediately. This is the only mutable access
    /// path; handing out `&mut V` directly would let indices drift.
    pub fn modify(&mut self, id: &str, f: impl FnOnce(&mut V)) -> Result<()> {
        if !self.entries.contains_key(id) {
            return Err(ModelError::NotFound(id.to_string()));
        }
        self.unindex(id);
        let (entity_type, tags) = {
            let entity = self
                .entries
                .get_mut(id)
                .ok_or_else(|| ModelError::NotFound(id.to_string()))?;
            f(entity);
            (
                entity.entity_type().to_string(),
                entity.tags().iter().cloned().collect::<Vec<_>>(),
            )
        };
        self.by_type.entry(entity_type).or_default().insert(id.to_string());
        for tag in tags {
            self.by_tag.entry(tag).or_default().insert(id.to_string());
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_type.clear();
        self.by_tag.clear();
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Get an entity, failing with `NotFound` when absent.
    pub fn get(&self, id: &str) -> Result<&V> {
        self.entries
            .get(id)
            .ok_or_else(|| ModelError::NotFound(id.to_string()))
    }

    /// Get an entity if present; never fails.
    pub fn maybe_get(&self, id: &str) -> Option<&V> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    /// Iterate ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Ids of entities with the given type, backed by the index (no copy
    /// of the entities themselves).
    pub fn ids_by_type(&self, entity_type: &str) -> impl Iterator<Item = &str> {
        self.by_type
            .get(entity_type)
            .into_iter()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    /// Ids of entities carrying the given tag, backed by the index.
    pub fn ids_by_tag(&self, tag: &str) -> impl Iterator<Item = &str> {
        self.by_tag
            .get(tag)
            .into_iter()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    /// Entities with the given type, resolved lazily through the index.
    pub fn iter_by_type<'a>(&'a self, entity_type: &str) -> impl Iterator<Item = &'a V> {
        self.ids_by_type(entity_type)
            .filter_map(move |id| self.entries.get(id))
    }

    /// Entities carrying the given tag, resolved lazily through the index.
    pub fn iter_by_tag<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a V> {
        self.ids_by_tag(tag)
            .filter_map(move |id| self.entries.get(id))
    }

    // =========================================================================
    // INDEX MAINTENANCE
    // =========================================================================

    fn index(&mut self, entity: &V) {
        let id = entity.id().to_string();
        self.by_type
            .entry(entity.entity_type().to_string())
            .or_default()
            .insert(id.clone());
        for tag in entity.tags() {
            self.by_tag.entry(tag.clone()).or_default().insert(id.clone());
        }
    }

    fn unindex(&mut self, id: &str) {
        let Some(entity) = self.entries.get(id) else {
            return;
        };
        let entity_type = entity.entity_type().to_string();
        let tags: Vec<String> = entity.tags().iter().cloned().collect();
        if let Some(ids) = self.by_type.get_mut(&entity_type) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_type.remove(&entity_type);
            }
        }
        for tag in tags {
            if let Some(ids) = self.by_tag.get_mut(&tag) {
                ids.remove(id);
                if ids.is_empty() {
                    self.by_tag.remove(&tag);
                }
            }
        }
    }

    /// Index consistency check: every id referenced by an index entry
    /// exists in the primary store. Exposed for tests and debug asserts.
    pub fn indices_consistent(&self) -> bool {
        self.by_type
            .values()
            .chain(self.by_tag.values())
            .all(|ids| ids.iter().all(|id| self.entries.contains_key(id)))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Node;

    fn container_with(ids: &[&str]) -> EntityContainer<Node> {
        let mut c = EntityContainer::new();
        for id in ids {
            c.add(Node::new(*id).with_type("t").with_tag("g"), AddPolicy::Unique)
                .unwrap();
        }
        c
    }

    #[test]
    fn test_add_if_missing_is_noop() {
        let mut c = container_with(&["a"]);
        let original = c.get("a").unwrap().clone();
        let changed = c
            .add(Node::new("a").with_type("other"), AddPolicy::IfMissing)
            .unwrap();
        assert!(!changed);
        assert_eq!(c.get("a").unwrap(), &original);
    }

    #[test]
    fn test_add_unique_rejects_duplicate() {
        let mut c = container_with(&["a"]);
        let err = c.add(Node::new("a"), AddPolicy::Unique).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateId(id) if id == "a"));
    }

    #[test]
    fn test_replace_reindexes() {
        let mut c = container_with(&["a"]);
        c.add(
            Node::new("a").with_type("person").with_tag("pep"),
            AddPolicy::Replace,
        )
        .unwrap();
        assert_eq!(c.ids_by_type("person").count(), 1);
        assert_eq!(c.ids_by_type("t").count(), 0);
        assert_eq!(c.ids_by_tag("pep").count(), 1);
        assert!(c.indices_consistent());
    }

    #[test]
    fn test_remove_purges_indices() {
        let mut c = container_with(&["a", "b"]);
        c.remove("a", true).unwrap();
        assert_eq!(c.ids_by_type("t").collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(c.ids_by_tag("g").collect::<Vec<_>>(), vec!["b"]);
        assert!(c.indices_consistent());

        // Strict removal of an absent id fails; permissive is a no-op.
        assert!(c.remove("a", true).is_err());
        assert!(c.remove("a", false).unwrap().is_none());
    }

    #[test]
    fn test_modify_keeps_indices_in_sync() {
        let mut c = container_with(&["a"]);
        c.modify("a", |n| {
            n.set_entity_type("fund");
            n.add_tag("lux");
            n.remove_tag("g");
        })
        .unwrap();
        assert_eq!(c.ids_by_type("fund").collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(c.ids_by_tag("g").count(), 0);
        assert_eq!(c.ids_by_tag("lux").collect::<Vec<_>>(), vec!["a"]);
        assert!(c.indices_consistent());
    }

    #[test]
    fn test_iteration_is_insertion_ordered() {
        let c = container_with(&["z", "a", "m"]);
        let ids: Vec<_> = c.ids().collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_index_consistency_under_churn() {
        let mut c = EntityContainer::new();
        for round in 0..10 {
            for i in 0..20 {
                let id = format!("n{i}");
                c.add(
                    Node::new(&id).with_type(format!("t{}", i % 3)).with_tag("all"),
                    AddPolicy::Replace,
                )
                .unwrap();
                if (i + round) % 4 == 0 {
                    c.remove(&id, false).unwrap();
                }
            }
            assert!(c.indices_consistent());
        }
    }
}
