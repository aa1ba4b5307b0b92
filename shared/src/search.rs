use std::num::NonZeroUsize;

use lru::LruCache;

use crate::catalog::{Catalog, Location, LocationId};
use crate::SEARCH_CACHE_CAPACITY;

/// Joins a location's categories before substring matching.
pub const CATEGORY_DELIMITER: &str = ",";

/// Does `location` match `query`?
///
/// The query is lower-cased and looked up in the lower-cased,
/// comma-joined category list, then in the search text. The search text
/// itself is not lower-cased, so `"Loading Dock"` is only found by queries
/// that lower-case to a substring of it. An empty query matches nothing.
#[must_use]
pub fn matches(location: &Location, query: &str) -> bool {
    if query.is_empty() {
        return false;
    }
    let needle = query.to_lowercase();

    let categories = location.categories().join(CATEGORY_DELIMITER).to_lowercase();
    if categories.contains(&needle) {
        return true;
    }

    location
        .search_text()
        .is_some_and(|text| text.contains(&needle))
}

/// Ids of every matching location, in catalog order.
#[must_use]
pub fn search(catalog: &Catalog, query: &str) -> Vec<LocationId> {
    catalog
        .locations()
        .iter()
        .filter(|location| matches(location, query))
        .map(Location::id)
        .collect()
}

/// Recently answered queries for the current catalog. Must be cleared
/// whenever the catalog is replaced.
pub struct SearchCache {
    entries: LruCache<String, Vec<LocationId>>,
}

impl SearchCache {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn search(&mut self, catalog: &Catalog, query: &str) -> Vec<LocationId> {
        // Matching only ever sees the lower-cased query.
        let key = query.to_lowercase();
        if let Some(ids) = self.entries.get(&key) {
            return ids.clone();
        }
        let ids = search(catalog, query);
        self.entries.put(key, ids.clone());
        ids
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(SEARCH_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("len", &self.entries.len())
            .finish()
    }
}
