//! Mock dataset catalog
//!
//! Canned datasources that can be provisioned into the catalog for
//! onboarding and demos. Each entry is a datasource template from the
//! configuration; provisioning registers a fresh copy under a new id.

use crate::datasource::{Datasource, DatasourceCatalog, DatasourceConfig};
use crate::error::{Error, Result};
use crate::types::DatasourceId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Mock dataset entry as configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockDatasetConfig {
    /// Catalog name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Datasource template
    pub datasource: DatasourceConfig,
}

/// Mock dataset as listed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockDataset {
    pub name: String,
    pub description: String,
    pub plugin: String,
}

impl From<&MockDatasetConfig> for MockDataset {
    fn from(config: &MockDatasetConfig) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            plugin: config.datasource.plugin.clone(),
        }
    }
}

/// Lists and provisions mock datasets
#[async_trait]
pub trait MockDatasetService: Send + Sync {
    /// Available mock datasets
    async fn list(&self) -> Result<Vec<MockDataset>>;

    /// Create a datasource from the named mock dataset
    async fn provision(&self, name: &str) -> Result<Datasource>;
}

/// Mock catalog backed by configuration templates
pub struct ConfiguredMockCatalog {
    entries: Vec<MockDatasetConfig>,
    catalog: Arc<dyn DatasourceCatalog>,
}

impl ConfiguredMockCatalog {
    pub fn new(entries: Vec<MockDatasetConfig>, catalog: Arc<dyn DatasourceCatalog>) -> Self {
        Self { entries, catalog }
    }
}

impl std::fmt::Debug for ConfiguredMockCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfiguredMockCatalog")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MockDatasetService for ConfiguredMockCatalog {
    async fn list(&self) -> Result<Vec<MockDataset>> {
        Ok(self.entries.iter().map(MockDataset::from).collect())
    }

    async fn provision(&self, name: &str) -> Result<Datasource> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::not_found("Mock dataset", name))?;

        let id = DatasourceId::parse(format!("mock-{}", uuid::Uuid::new_v4().simple()))?;
        let mut config = entry.datasource.clone();
        if config.name.is_empty() {
            config.name = entry.name.clone();
        }

        let datasource = self.catalog.create(Datasource::new(id, config)).await?;
        info!(mock = %name, datasource = %datasource.id, "Provisioned mock datasource");
        Ok(datasource)
    }
}
