//! Structure fetcher
//!
//! Serves structures from the cache, introspecting through the datasource's
//! driver on a miss or when the caller bypasses the cache.

use super::cache::StructureCache;
use super::types::DatasourceStructure;
use crate::datasource::DatasourceCatalog;
use crate::driver::DriverRegistry;
use crate::error::Result;
use crate::types::DatasourceId;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cache-backed structure lookup
#[derive(Clone)]
pub struct StructureFetcher {
    catalog: Arc<dyn DatasourceCatalog>,
    drivers: Arc<DriverRegistry>,
    cache: StructureCache,
}

impl StructureFetcher {
    /// Create a fetcher over the given collaborators
    pub fn new(
        catalog: Arc<dyn DatasourceCatalog>,
        drivers: Arc<DriverRegistry>,
        cache: StructureCache,
    ) -> Self {
        Self {
            catalog,
            drivers,
            cache,
        }
    }

    /// The cache this fetcher writes to
    pub fn cache(&self) -> &StructureCache {
        &self.cache
    }

    /// Get the structure of a datasource
    ///
    /// With `ignore_cache == false` a cached entry is returned unchanged.
    /// Otherwise the driver introspects the live datasource and the result
    /// replaces the cached entry. A failed introspection leaves the previous
    /// entry in place.
    pub async fn get_structure(
        &self,
        id: &DatasourceId,
        ignore_cache: bool,
    ) -> Result<DatasourceStructure> {
        let datasource = self.catalog.get(id).await?;

        if !ignore_cache {
            if let Some(entry) = self.cache.get(id).await {
                debug!(datasource = %id, fetched_at = %entry.fetched_at, "Structure cache hit");
                return Ok(entry.structure);
            }
        }

        let driver = self.drivers.require(&datasource.config.plugin)?;
        let structure = match driver.introspect(&datasource.config).await {
            Ok(structure) => structure,
            Err(e) => {
                let kept = self.cache.get(id).await.is_some();
                warn!(datasource = %id, error = %e, stale_entry_kept = kept, "Structure introspection failed");
                return Err(e);
            }
        };

        self.cache.put(id.clone(), structure.clone()).await;
        info!(
            datasource = %id,
            tables = structure.tables.len(),
            bypass = ignore_cache,
            "Refreshed datasource structure"
        );
        Ok(structure)
    }
}
