//! Structure cache
//!
//! Holds the most recently introspected structure per datasource. Entries
//! never expire by time: callers opt into freshness per request through
//! `ignore_cache`. Every write is a single map insert, so readers see
//! either the previous entry or the new one.

use super::types::{CachedStructure, DatasourceStructure};
use crate::types::DatasourceId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-datasource structure cache
#[derive(Debug, Default, Clone)]
pub struct StructureCache {
    entries: Arc<RwLock<HashMap<DatasourceId, CachedStructure>>>,
}

impl StructureCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached entry for a datasource
    pub async fn get(&self, id: &DatasourceId) -> Option<CachedStructure> {
        self.entries.read().await.get(id).cloned()
    }

    /// Store a structure, replacing any previous entry
    pub async fn put(&self, id: DatasourceId, structure: DatasourceStructure) -> CachedStructure {
        let entry = CachedStructure::fresh(structure);
        self.entries.write().await.insert(id, entry.clone());
        entry
    }

    /// Drop the entry for a datasource, returning whether one existed
    pub async fn invalidate(&self, id: &DatasourceId) -> bool {
        self.entries.write().await.remove(id).is_some()
    }

    /// Drop all entries
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
