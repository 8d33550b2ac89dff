//! Ordered entity catalogs
//!
//! A catalog keeps its entries sorted by name (supports, releases, sections,
//! materials) or by numeric id (nodes, bars). Inserts and renames splice the
//! entry into place, so iteration is always in ascending key order. Only the
//! model mutates catalogs; callers get read access.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::ids::{EntityKind, Handle};

/// Name no entity may carry
pub const RESERVED_NAME: &str = "None";

/// Ordering key of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey<'a> {
    Number(u32),
    Name(&'a str),
}

/// An entity stored in a [`Catalog`]
pub trait CatalogEntry {
    type Id: Handle;
    const KIND: EntityKind;

    fn id(&self) -> Self::Id;
    fn sort_key(&self) -> SortKey<'_>;
}

/// A catalog entry ordered by a user-visible name
pub trait Named: CatalogEntry {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

/// An ordered, uniquely-keyed collection of entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog<T> {
    entries: Vec<T>,
    /// Lower bound for the next handle, so handles are never reused
    next: u32,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next: 0,
        }
    }
}

impl<T: CatalogEntry> Catalog<T> {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in ascending key order
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    /// Handles of all entries in ascending key order
    pub fn ids(&self) -> Vec<T::Id> {
        self.entries.iter().map(CatalogEntry::id).collect()
    }

    /// Check whether a handle is present
    pub fn contains(&self, id: T::Id) -> bool {
        self.position(id).is_some()
    }

    /// Look up an entry, returning `None` when absent
    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Look up an entry, failing when absent
    pub fn require(&self, id: T::Id) -> ModelResult<&T> {
        self.get(id)
            .ok_or_else(|| ModelError::not_found(T::KIND, id))
    }

    /// The handle the next insert will receive: `max(existing) + 1`, or 0
    /// when empty, never below a handle already given out
    pub fn next_id(&self) -> ModelResult<T::Id> {
        let max = self.entries.iter().map(|e| e.id().raw()).max();
        let after_max = match max {
            Some(raw) => successor::<T>(raw)?,
            None => 0,
        };
        Ok(T::Id::from_raw(after_max.max(self.next)))
    }

    pub(crate) fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    pub(crate) fn require_mut(&mut self, id: T::Id) -> ModelResult<&mut T> {
        self.get_mut(id)
            .ok_or_else(|| ModelError::not_found(T::KIND, id))
    }

    fn position(&self, id: T::Id) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    /// Validate that `key` may be held by the entry `owner`
    pub(crate) fn check_key(&self, key: SortKey<'_>, owner: T::Id) -> ModelResult<()> {
        match key {
            SortKey::Name(name) => {
                if name.is_empty() {
                    return Err(ModelError::EmptyName { kind: T::KIND });
                }
                if name == RESERVED_NAME {
                    return Err(ModelError::ReservedName { kind: T::KIND });
                }
                if self
                    .entries
                    .iter()
                    .any(|e| e.id() != owner && e.sort_key() == key)
                {
                    return Err(ModelError::DuplicateName {
                        kind: T::KIND,
                        name: name.to_string(),
                    });
                }
            }
            SortKey::Number(number) => {
                if self
                    .entries
                    .iter()
                    .any(|e| e.id() != owner && e.sort_key() == key)
                {
                    return Err(ModelError::DuplicateId {
                        kind: T::KIND,
                        id: number,
                    });
                }
            }
        }
        Ok(())
    }

    /// Insert a new entry at its sorted position
    pub(crate) fn insert(&mut self, entry: T) -> ModelResult<T::Id> {
        let id = entry.id();
        if self.contains(id) {
            return Err(ModelError::DuplicateId {
                kind: T::KIND,
                id: id.raw(),
            });
        }
        self.check_key(entry.sort_key(), id)?;
        let after = successor::<T>(id.raw())?;
        self.splice(entry);
        self.next = self.next.max(after);
        Ok(id)
    }

    /// Replace an existing entry (same handle), repositioning it if its key
    /// changed. Returns the previous entry.
    pub(crate) fn replace(&mut self, entry: T) -> ModelResult<T> {
        let id = entry.id();
        let pos = self
            .position(id)
            .ok_or_else(|| ModelError::not_found(T::KIND, id))?;
        self.check_key(entry.sort_key(), id)?;
        let old = self.entries.remove(pos);
        self.splice(entry);
        Ok(old)
    }

    /// Remove an entry
    pub(crate) fn remove(&mut self, id: T::Id) -> Option<T> {
        self.position(id).map(|pos| self.entries.remove(pos))
    }

    /// Check keys and ordering of entries read from outside
    pub(crate) fn check_entries(&self) -> ModelResult<()> {
        for entry in &self.entries {
            self.check_key(entry.sort_key(), entry.id())?;
            if self.entries.iter().filter(|e| e.id() == entry.id()).count() > 1 {
                return Err(ModelError::DuplicateId {
                    kind: T::KIND,
                    id: entry.id().raw(),
                });
            }
        }
        if self
            .entries
            .windows(2)
            .any(|pair| pair[0].sort_key() > pair[1].sort_key())
        {
            return Err(ModelError::InvalidInput(format!(
                "{} catalog is not in ascending order",
                T::KIND
            )));
        }
        Ok(())
    }

    fn splice(&mut self, entry: T) {
        let at = {
            let key = entry.sort_key();
            self.entries
                .iter()
                .position(|e| e.sort_key() >= key)
                .unwrap_or(self.entries.len())
        };
        self.entries.insert(at, entry);
    }
}

fn successor<T: CatalogEntry>(raw: u32) -> ModelResult<u32> {
    raw.checked_add(1).ok_or_else(|| {
        ModelError::InvalidInput(format!("{} handles exhausted after {raw}", T::KIND))
    })
}

impl<T: Named> Catalog<T> {
    /// Look up an entry by exact (case-sensitive) name
    pub fn find_by_name(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Handle of the entry called `name`, failing when absent
    pub fn id_of(&self, name: &str) -> ModelResult<T::Id> {
        self.find_by_name(name)
            .map(CatalogEntry::id)
            .ok_or_else(|| ModelError::not_found(T::KIND, name))
    }

    /// Give an entry a new name and move it to its new sorted position
    pub(crate) fn rename(&mut self, id: T::Id, name: &str) -> ModelResult<()> {
        let pos = self
            .position(id)
            .ok_or_else(|| ModelError::not_found(T::KIND, id))?;
        if self.entries[pos].name() == name {
            return Ok(());
        }
        self.check_key(SortKey::Name(name), id)?;
        let mut entry = self.entries.remove(pos);
        entry.set_name(name.to_string());
        self.splice(entry);
        Ok(())
    }
}

impl<'a, T> IntoIterator for &'a Catalog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SupportId;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        id: SupportId,
        name: String,
    }

    impl CatalogEntry for Entry {
        type Id = SupportId;
        const KIND: EntityKind = EntityKind::Support;

        fn id(&self) -> SupportId {
            self.id
        }

        fn sort_key(&self) -> SortKey<'_> {
            SortKey::Name(&self.name)
        }
    }

    impl Named for Entry {
        fn name(&self) -> &str {
            &self.name
        }

        fn set_name(&mut self, name: String) {
            self.name = name;
        }
    }

    fn add(catalog: &mut Catalog<Entry>, name: &str) -> ModelResult<SupportId> {
        let id = catalog.next_id()?;
        catalog.insert(Entry {
            id,
            name: name.to_string(),
        })
    }

    fn names(catalog: &Catalog<Entry>) -> Vec<&str> {
        catalog.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_insert_keeps_name_order() {
        let mut catalog = Catalog::new();
        for name in ["delta", "alpha", "Charlie", "bravo"] {
            add(&mut catalog, name).unwrap();
        }
        assert_eq!(names(&catalog), vec!["Charlie", "alpha", "bravo", "delta"]);
    }

    #[test]
    fn test_duplicate_and_reserved_names_rejected() {
        let mut catalog = Catalog::new();
        add(&mut catalog, "Pinned").unwrap();
        let before = catalog.clone();

        assert!(matches!(
            add(&mut catalog, "Pinned"),
            Err(ModelError::DuplicateName { .. })
        ));
        assert!(matches!(
            add(&mut catalog, "None"),
            Err(ModelError::ReservedName { .. })
        ));
        assert!(matches!(
            add(&mut catalog, ""),
            Err(ModelError::EmptyName { .. })
        ));
        assert_eq!(catalog, before);

        // Exact match only
        add(&mut catalog, "pinned").unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_rename_repositions() {
        let mut catalog = Catalog::new();
        let a = add(&mut catalog, "a").unwrap();
        add(&mut catalog, "b").unwrap();
        add(&mut catalog, "c").unwrap();

        catalog.rename(a, "z").unwrap();
        assert_eq!(names(&catalog), vec!["b", "c", "z"]);
        assert_eq!(catalog.get(a).unwrap().name, "z");

        assert!(catalog.rename(a, "b").is_err());
        assert_eq!(names(&catalog), vec!["b", "c", "z"]);
    }

    #[test]
    fn test_ids_never_reused() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.next_id().unwrap(), SupportId(0));
        let a = add(&mut catalog, "a").unwrap();
        let b = add(&mut catalog, "b").unwrap();
        assert_eq!((a, b), (SupportId(0), SupportId(1)));

        catalog.remove(b);
        assert_eq!(add(&mut catalog, "c").unwrap(), SupportId(2));
    }

    #[test]
    fn test_last_handle_is_not_overflowed() {
        let mut catalog = Catalog::new();
        let last = Entry {
            id: SupportId(u32::MAX),
            name: "last".to_string(),
        };
        assert!(matches!(
            catalog.insert(last.clone()),
            Err(ModelError::InvalidInput(_))
        ));
        assert!(catalog.is_empty());

        // A catalog read from outside may still hold the last handle
        let mut loaded = Catalog {
            entries: vec![last],
            next: 0,
        };
        let before = loaded.clone();
        assert!(matches!(loaded.next_id(), Err(ModelError::InvalidInput(_))));
        assert!(matches!(
            add(&mut loaded, "another"),
            Err(ModelError::InvalidInput(_))
        ));
        assert_eq!(loaded, before);
    }

    #[test]
    fn test_require_and_find() {
        let mut catalog = Catalog::new();
        let a = add(&mut catalog, "a").unwrap();
        assert_eq!(catalog.id_of("a").unwrap(), a);
        assert!(catalog.find_by_name("x").is_none());
        assert!(matches!(
            catalog.require(SupportId(9)),
            Err(ModelError::NotFound { .. })
        ));
    }
}
