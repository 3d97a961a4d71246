//! Datasource drivers
//!
//! A driver knows how to test a connection to one kind of datasource and
//! how to introspect its structure. Drivers are looked up by plugin name
//! through the `DriverRegistry`.

mod probe;

pub use probe::ProbeDriver;

use crate::datasource::{DatasourceConfig, DatasourceTestResult};
use crate::error::{Error, Result};
use crate::structure::DatasourceStructure;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Connection testing and structure introspection for one plugin
#[async_trait]
pub trait DatasourceDriver: Send + Sync {
    /// Plugin name this driver is registered under
    fn name(&self) -> &str;

    /// Driver-specific configuration checks, returned as messages
    fn validate(&self, _config: &DatasourceConfig) -> Vec<String> {
        Vec::new()
    }

    /// Try to reach the datasource
    async fn test(&self, config: &DatasourceConfig) -> Result<DatasourceTestResult>;

    /// Describe the datasource's tables and fields
    async fn introspect(&self, config: &DatasourceConfig) -> Result<DatasourceStructure>;
}

/// Plugin name to driver lookup
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatasourceDriver>>,
}

impl DriverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a driver, replacing any driver with the same name
    pub fn register(&mut self, driver: Arc<dyn DatasourceDriver>) {
        self.drivers.insert(driver.name().to_string(), driver);
    }

    /// Builder-style `register`
    pub fn with_driver(mut self, driver: Arc<dyn DatasourceDriver>) -> Self {
        self.register(driver);
        self
    }

    /// Look up a driver by plugin name
    pub fn get(&self, plugin: &str) -> Option<Arc<dyn DatasourceDriver>> {
        self.drivers.get(plugin).cloned()
    }

    /// Look up a driver, failing with `NotFound`
    pub fn require(&self, plugin: &str) -> Result<Arc<dyn DatasourceDriver>> {
        self.get(plugin)
            .ok_or_else(|| Error::not_found("Plugin", plugin))
    }

    /// Registered plugin names, sorted
    pub fn plugins(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Validate a datasource configuration and, if valid, test its connection
    ///
    /// Invalid configurations are reported through `invalids` without
    /// contacting the datasource. Results are never cached.
    pub async fn test_datasource(&self, config: &DatasourceConfig) -> Result<DatasourceTestResult> {
        let mut invalids = Vec::new();
        if config.name.trim().is_empty() {
            invalids.push("Missing datasource name".to_string());
        }

        let Some(driver) = self.get(&config.plugin) else {
            invalids.push(format!("Unknown plugin '{}'", config.plugin));
            return Ok(DatasourceTestResult::invalid(invalids));
        };

        invalids.extend(driver.validate(config));
        if !invalids.is_empty() {
            debug!(plugin = %config.plugin, ?invalids, "Datasource configuration invalid");
            return Ok(DatasourceTestResult::invalid(invalids));
        }

        let result = driver.test(config).await?;
        info!(
            plugin = %config.plugin,
            name = %config.name,
            success = result.success,
            "Tested datasource connection"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("plugins", &self.plugins())
            .finish()
    }
}
