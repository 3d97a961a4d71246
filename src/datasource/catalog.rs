//! Datasource catalog
//!
//! The catalog owns datasource identities and their configuration. The
//! gateway only resolves, creates and flags datasources through it.

use super::types::{AuthenticationConfig, Datasource};
use crate::error::{Error, Result};
use crate::types::DatasourceId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Resolves datasource identities to their configuration
#[async_trait]
pub trait DatasourceCatalog: Send + Sync {
    /// Look up a datasource, failing with `NotFound` if unknown
    async fn get(&self, id: &DatasourceId) -> Result<Datasource>;

    /// Register a new datasource
    async fn create(&self, datasource: Datasource) -> Result<Datasource>;

    /// Record that delegated credentials were obtained for a datasource
    async fn mark_authorized(&self, id: &DatasourceId) -> Result<()>;

    /// List all datasources
    async fn list(&self) -> Result<Vec<Datasource>>;
}

/// In-memory catalog, seeded from configuration
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    datasources: Arc<RwLock<HashMap<DatasourceId, Datasource>>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog holding the given datasources
    pub fn with_datasources(datasources: impl IntoIterator<Item = Datasource>) -> Self {
        let map = datasources
            .into_iter()
            .map(|ds| (ds.id.clone(), ds))
            .collect();
        Self {
            datasources: Arc::new(RwLock::new(map)),
        }
    }

    /// Number of registered datasources
    pub async fn len(&self) -> usize {
        self.datasources.read().await.len()
    }

    /// Whether the catalog is empty
    pub async fn is_empty(&self) -> bool {
        self.datasources.read().await.is_empty()
    }
}

#[async_trait]
impl DatasourceCatalog for InMemoryCatalog {
    async fn get(&self, id: &DatasourceId) -> Result<Datasource> {
        self.datasources
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("Datasource", id.as_str()))
    }

    async fn create(&self, datasource: Datasource) -> Result<Datasource> {
        let mut datasources = self.datasources.write().await;
        if datasources.contains_key(&datasource.id) {
            return Err(Error::validation(format!(
                "Datasource '{}' already exists",
                datasource.id
            )));
        }
        debug!(datasource = %datasource.id, plugin = %datasource.config.plugin, "Registered datasource");
        datasources.insert(datasource.id.clone(), datasource.clone());
        Ok(datasource)
    }

    async fn mark_authorized(&self, id: &DatasourceId) -> Result<()> {
        let mut datasources = self.datasources.write().await;
        let datasource = datasources
            .get_mut(id)
            .ok_or_else(|| Error::not_found("Datasource", id.as_str()))?;

        match &mut datasource.config.authentication {
            AuthenticationConfig::Oauth2(oauth) => {
                oauth.is_authorized = true;
                Ok(())
            }
            other => Err(Error::unsupported_auth(
                id.as_str(),
                format!("cannot authorize '{}' authentication", other.type_name()),
            )),
        }
    }

    async fn list(&self) -> Result<Vec<Datasource>> {
        let mut all: Vec<Datasource> = self.datasources.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}
