//! HTTP reachability probe driver
//!
//! Tests a datasource by issuing one GET to its connection URL with the
//! configured credentials applied. Introspection performs the same probe
//! and returns the structure declared in the datasource configuration.

use super::DatasourceDriver;
use crate::datasource::{AuthenticationConfig, DatasourceConfig, DatasourceTestResult};
use crate::error::{Error, Result};
use crate::structure::DatasourceStructure;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// Driver that probes a datasource URL over HTTP
#[derive(Debug, Clone)]
pub struct ProbeDriver {
    client: Client,
}

impl ProbeDriver {
    /// Plugin name this driver registers under
    pub const PLUGIN: &'static str = "probe";

    /// Create a probe driver with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("datasource-gateway/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Create a probe driver with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn apply_auth(req: RequestBuilder, auth: &AuthenticationConfig) -> RequestBuilder {
        match auth {
            AuthenticationConfig::None | AuthenticationConfig::Oauth2(_) => req,
            AuthenticationConfig::Basic { username, password } => {
                req.basic_auth(username, Some(password))
            }
            AuthenticationConfig::ApiKey { header, value } => req.header(header.as_str(), value),
        }
    }

    /// Issue the probe request, returning a human-readable failure reason
    async fn probe(&self, config: &DatasourceConfig) -> std::result::Result<(), String> {
        let url = config
            .connection
            .url
            .as_deref()
            .ok_or_else(|| "Missing connection url".to_string())?;

        let req = Self::apply_auth(self.client.get(url), &config.authentication);
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                format!("Timed out reaching {url}")
            } else {
                format!("Failed to reach {url}: {e}")
            }
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(%url, status = status.as_u16(), "Probe succeeded");
            Ok(())
        } else {
            Err(format!("{url} answered HTTP {}", status.as_u16()))
        }
    }
}

#[async_trait]
impl DatasourceDriver for ProbeDriver {
    fn name(&self) -> &str {
        Self::PLUGIN
    }

    fn validate(&self, config: &DatasourceConfig) -> Vec<String> {
        match config.connection.url.as_deref() {
            None | Some("") => vec!["Missing connection url".to_string()],
            Some(url) => match url::Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Vec::new(),
                Ok(parsed) => vec![format!("Unsupported url scheme '{}'", parsed.scheme())],
                Err(e) => vec![format!("Invalid connection url: {e}")],
            },
        }
    }

    async fn test(&self, config: &DatasourceConfig) -> Result<DatasourceTestResult> {
        match self.probe(config).await {
            Ok(()) => Ok(DatasourceTestResult::success()),
            Err(message) => {
                warn!(name = %config.name, %message, "Connection test failed");
                Ok(DatasourceTestResult::failure(message))
            }
        }
    }

    async fn introspect(&self, config: &DatasourceConfig) -> Result<DatasourceStructure> {
        self.probe(config).await.map_err(Error::connection)?;
        Ok(config.structure.clone().unwrap_or_default())
    }
}
