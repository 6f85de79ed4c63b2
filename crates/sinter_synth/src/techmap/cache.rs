//! Memo table of resolved templates.

use crate::techmap::library::Params;
use sinter_common::{ContentHash, IdString};
use sinter_ir::{Cell, Module};
use std::collections::HashMap;

/// The mapping identity of a cell: its type and full parameter map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    pub cell_type: IdString,
    pub params: Params,
}

impl CacheKey {
    pub fn of(cell: &Cell) -> Self {
        Self {
            cell_type: cell.cell_type.clone(),
            params: cell.parameters.clone(),
        }
    }
}

/// The outcome of resolving a key.
pub(crate) enum CacheEntry {
    /// The template to inline.
    Usable(Module),
    /// The template carried a failure marker; instances stay unexpanded.
    Unsupported,
}

/// Resolved templates, valid for one library fingerprint.
#[derive(Default)]
pub(crate) struct TemplateCache {
    fingerprint: Option<ContentHash>,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl TemplateCache {
    /// Drops every entry if the library changed since they were recorded.
    pub fn sync(&mut self, fingerprint: ContentHash) {
        if self.fingerprint != Some(fingerprint) {
            if !self.entries.is_empty() {
                tracing::debug!(dropped = self.entries.len(), "library changed, clearing template cache");
            }
            self.entries.clear();
            self.fingerprint = Some(fingerprint);
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sinter_common::Const;

    fn key(width: u64) -> CacheKey {
        let cell = Cell::new("\\u0", "$and").with_param("\\A_WIDTH", Const::from_u64(width, 32));
        CacheKey::of(&cell)
    }

    #[test]
    fn keys_compare_type_and_params() {
        assert_eq!(key(4), key(4));
        assert_ne!(key(4), key(8));
    }

    #[test]
    fn fingerprint_change_clears() {
        let mut cache = TemplateCache::default();
        cache.sync(ContentHash::from_bytes(b"v1"));
        cache.insert(key(4), CacheEntry::Unsupported);
        cache.sync(ContentHash::from_bytes(b"v1"));
        assert_eq!(cache.len(), 1);
        cache.sync(ContentHash::from_bytes(b"v2"));
        assert_eq!(cache.len(), 0);
        assert!(cache.get(&key(4)).is_none());
    }
}
