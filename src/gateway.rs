//! Gateway facade
//!
//! Wires the catalog, drivers, structure cache, OAuth2 flow and mock
//! catalog together and exposes the operations the HTTP routes and the CLI
//! call into.

use crate::config::GatewayConfig;
use crate::datasource::{
    Datasource, DatasourceCatalog, DatasourceConfig, DatasourceTestResult, InMemoryCatalog,
};
use crate::driver::{DriverRegistry, ProbeDriver};
use crate::error::{Error, Result};
use crate::mocks::{ConfiguredMockCatalog, MockDataset, MockDatasetService};
use crate::oauth::{
    AuthorizationFlow, AuthorizationOutcome, CallbackParams, CredentialStore, FlowSettings,
    FlowState, HttpTokenExchange, InMemoryCredentialStore, StateSigner, TokenExchange,
};
use crate::structure::{DatasourceStructure, StructureCache, StructureFetcher};
use crate::types::{DatasourceId, PageContext};
use std::sync::Arc;
use tracing::{debug, info};

/// Collaborators the gateway is assembled from
pub struct GatewayParts {
    pub catalog: Arc<dyn DatasourceCatalog>,
    pub drivers: Arc<DriverRegistry>,
    pub exchange: Arc<dyn TokenExchange>,
    pub credentials: Arc<dyn CredentialStore>,
    pub mocks: Arc<dyn MockDatasetService>,
    pub signer: StateSigner,
    pub settings: FlowSettings,
}

/// The datasource connectivity gateway
pub struct Gateway {
    catalog: Arc<dyn DatasourceCatalog>,
    drivers: Arc<DriverRegistry>,
    structures: StructureFetcher,
    flow: AuthorizationFlow,
    mocks: Arc<dyn MockDatasetService>,
}

impl Gateway {
    /// Build a gateway with in-memory collaborators seeded from configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        config.validate()?;

        let catalog: Arc<dyn DatasourceCatalog> =
            Arc::new(InMemoryCatalog::with_datasources(config.datasources.clone()));
        let drivers = DriverRegistry::new()
            .with_driver(Arc::new(ProbeDriver::new(config.server.request_timeout())?));
        let signer = StateSigner::new(config.oauth.state_secret.as_bytes(), config.oauth.state_ttl())?;

        info!(
            datasources = config.datasources.len(),
            mocks = config.mocks.len(),
            plugins = ?drivers.plugins(),
            "Gateway configured"
        );

        Ok(Self::from_parts(GatewayParts {
            catalog: catalog.clone(),
            drivers: Arc::new(drivers),
            exchange: Arc::new(HttpTokenExchange::new(config.oauth.token_timeout())?),
            credentials: Arc::new(InMemoryCredentialStore::new()),
            mocks: Arc::new(ConfiguredMockCatalog::new(config.mocks.clone(), catalog)),
            signer,
            settings: FlowSettings::from_config(config),
        }))
    }

    /// Build a gateway from explicit collaborators
    pub fn from_parts(parts: GatewayParts) -> Self {
        let structures = StructureFetcher::new(
            parts.catalog.clone(),
            parts.drivers.clone(),
            StructureCache::new(),
        );
        let flow = AuthorizationFlow::new(
            parts.catalog.clone(),
            parts.exchange,
            parts.credentials,
            parts.signer,
            parts.settings,
        );
        Self {
            catalog: parts.catalog,
            drivers: parts.drivers,
            structures,
            flow,
            mocks: parts.mocks,
        }
    }

    /// Test connectivity of a (possibly unsaved) datasource configuration
    pub async fn test_datasource(&self, config: &DatasourceConfig) -> Result<DatasourceTestResult> {
        debug!(plugin = %config.plugin, name = %config.name, "Testing datasource");
        self.drivers.test_datasource(config).await
    }

    /// Test connectivity of a datasource already in the catalog
    pub async fn test_saved_datasource(&self, id: &DatasourceId) -> Result<DatasourceTestResult> {
        let datasource = self.catalog.get(id).await?;
        self.test_datasource(&datasource.config).await
    }

    /// Get the structure of a datasource, from cache unless `ignore_cache`
    pub async fn get_structure(
        &self,
        id: &DatasourceId,
        ignore_cache: bool,
    ) -> Result<DatasourceStructure> {
        self.structures.get_structure(id, ignore_cache).await
    }

    /// Provider authorization URL for a datasource
    pub async fn begin_authorization(
        &self,
        id: &DatasourceId,
        page: &PageContext,
        request_origin: Option<&str>,
    ) -> Result<String> {
        self.flow.begin_authorization(id, page, request_origin).await
    }

    /// Handle a provider callback
    ///
    /// A successful exchange drops the cached structure of the datasource so
    /// the next lookup introspects with the new credentials.
    pub async fn complete_authorization(&self, callback: CallbackParams) -> AuthorizationOutcome {
        let outcome = self.flow.complete_authorization(callback).await;
        if outcome.state == FlowState::Exchanged {
            if let Some(id) = &outcome.datasource {
                if self.structures.cache().invalidate(id).await {
                    debug!(datasource = %id, "Dropped cached structure after authorization");
                }
            }
        }
        outcome
    }

    /// Handle a provider callback whose query could not be read
    pub fn reject_authorization(&self, error: &Error) -> AuthorizationOutcome {
        self.flow.reject_callback(error)
    }

    /// Mock datasets available for provisioning
    pub async fn list_mocks(&self) -> Result<Vec<MockDataset>> {
        self.mocks.list().await
    }

    /// Provision a datasource from a mock dataset
    pub async fn provision_mock(&self, name: &str) -> Result<Datasource> {
        self.mocks.provision(name).await
    }

    /// All datasources in the catalog
    pub async fn list_datasources(&self) -> Result<Vec<Datasource>> {
        self.catalog.list().await
    }

    /// Path component of the OAuth2 callback URL
    pub fn callback_path(&self) -> String {
        let callback = &self.flow.settings().callback_url;
        url::Url::parse(callback)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| callback.clone())
    }

    /// The structure cache
    pub fn structure_cache(&self) -> &StructureCache {
        self.structures.cache()
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("drivers", &self.drivers)
            .field("flow", &self.flow)
            .finish_non_exhaustive()
    }
}
