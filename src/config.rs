//! Gateway configuration
//!
//! The gateway is configured from a single YAML file holding server
//! settings, OAuth2 state-token settings, the datasources seeded into the
//! catalog and the mock dataset catalog.

use crate::datasource::Datasource;
use crate::error::{Error, Result};
use crate::mocks::MockDatasetConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding `oauth.state_secret`
pub const STATE_SECRET_ENV: &str = "GATEWAY_STATE_SECRET";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete gateway configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// OAuth2 authorization flow settings
    #[serde(default)]
    pub oauth: OAuthSettings,

    /// Datasources seeded into the catalog
    #[serde(default)]
    pub datasources: Vec<Datasource>,

    /// Mock datasets available for provisioning
    #[serde(default)]
    pub mocks: Vec<MockDatasetConfig>,
}

impl GatewayConfig {
    /// Load configuration from a YAML file, applying environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply overrides from a variable lookup (normally the environment)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(STATE_SECRET_ENV).filter(|s| !s.is_empty()) {
            self.oauth.state_secret = secret;
        }
    }

    /// Check the configuration for problems that would break at runtime
    pub fn validate(&self) -> Result<()> {
        if self.oauth.state_secret.is_empty() {
            return Err(Error::config(format!(
                "oauth.state_secret is required (or set {STATE_SECRET_ENV})"
            )));
        }
        if self.oauth.state_ttl_secs == 0 {
            return Err(Error::config("oauth.state_ttl_secs must be positive"));
        }
        if !self.oauth.callback_path.starts_with('/') {
            return Err(Error::config("oauth.callback_path must start with '/'"));
        }
        url::Url::parse(&self.server.public_url).map_err(|e| {
            Error::config(format!("Invalid server.public_url '{}': {e}", self.server.public_url))
        })?;
        for origin in &self.server.allowed_origins {
            url::Url::parse(origin)
                .map_err(|e| Error::config(format!("Invalid allowed origin '{origin}': {e}")))?;
        }

        let mut seen = HashSet::new();
        for datasource in &self.datasources {
            if !seen.insert(&datasource.id) {
                return Err(Error::config(format!(
                    "Duplicate datasource id '{}'",
                    datasource.id
                )));
            }
        }

        let mut mock_names = HashSet::new();
        for mock in &self.mocks {
            if !mock_names.insert(mock.name.as_str()) {
                return Err(Error::config(format!("Duplicate mock dataset '{}'", mock.name)));
            }
        }
        Ok(())
    }

    /// Public URL without a trailing slash
    pub fn public_url(&self) -> &str {
        self.server.public_url.trim_end_matches('/')
    }

    /// Absolute URL providers redirect back to
    pub fn callback_url(&self) -> String {
        format!("{}{}", self.public_url(), self.oauth.callback_path)
    }
}

// ============================================================================
// Server Settings
// ============================================================================

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally visible base URL of the gateway
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Origins allowed to start an authorization (empty = any)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            request_timeout_secs: default_request_timeout(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

// ============================================================================
// OAuth Settings
// ============================================================================

/// OAuth2 authorization flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    /// Secret used to sign state tokens
    #[serde(default)]
    pub state_secret: String,

    /// State token lifetime in seconds
    #[serde(default = "default_state_ttl")]
    pub state_ttl_secs: u64,

    /// Path of the callback route, appended to `server.public_url`
    #[serde(default = "default_callback_path")]
    pub callback_path: String,

    /// Timeout for token endpoint requests, in seconds
    #[serde(default = "default_token_timeout")]
    pub token_timeout_secs: u64,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            state_secret: String::new(),
            state_ttl_secs: default_state_ttl(),
            callback_path: default_callback_path(),
            token_timeout_secs: default_token_timeout(),
        }
    }
}

impl OAuthSettings {
    /// State token lifetime as a `Duration`
    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state_ttl_secs)
    }

    /// Token request timeout as a `Duration`
    pub fn token_timeout(&self) -> Duration {
        Duration::from_secs(self.token_timeout_secs)
    }
}

fn default_state_ttl() -> u64 {
    600
}

fn default_callback_path() -> String {
    "/api/v1/datasources/authorize".to_string()
}

fn default_token_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SAMPLE: &str = r#"
server:
  port: 9090
  public_url: "https://gateway.example.com/"
  allowed_origins: ["https://app.example.com"]
oauth:
  state_secret: "s3cret"
datasources:
  - id: sheets
    name: "Google Sheets"
    plugin: probe
    connection:
      url: "https://sheets.example.com"
mocks:
  - name: users
    description: "Sample users table"
    datasource:
      plugin: probe
      connection:
        url: "https://mock-db.example.com/users"
"#;

    #[test]
    fn test_parse_sample() {
        let config = GatewayConfig::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.oauth.state_ttl_secs, 600);
        assert_eq!(config.datasources.len(), 1);
        assert_eq!(config.mocks[0].name, "users");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_callback_url_trims_slash() {
        let config = GatewayConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.public_url(), "https://gateway.example.com");
        assert_eq!(
            config.callback_url(),
            "https://gateway.example.com/api/v1/datasources/authorize"
        );
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_yaml("{}").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.oauth.callback_path, "/api/v1/datasources/authorize");
        assert!(config.datasources.is_empty());
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = GatewayConfig::from_yaml("{}").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("state_secret"));
    }

    #[test]
    fn test_env_override() {
        let mut config = GatewayConfig::from_yaml("{}").unwrap();
        config.apply_overrides(|key| {
            (key == STATE_SECRET_ENV).then(|| "from-env".to_string())
        });
        assert_eq!(config.oauth.state_secret, "from-env");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_duplicate_datasource() {
        let yaml = r#"
oauth:
  state_secret: "x"
datasources:
  - id: a
    plugin: probe
  - id: a
    plugin: probe
"#;
        let config = GatewayConfig::from_yaml(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate datasource id 'a'"));
    }

    #[test]
    fn test_validate_callback_path() {
        let mut config = GatewayConfig::from_yaml(SAMPLE).unwrap();
        config.oauth.callback_path = "authorize".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = GatewayConfig::from_file(file.path()).unwrap();
        assert_eq!(config.datasources[0].id.as_str(), "sheets");
    }

    #[test]
    fn test_from_missing_file() {
        let err = GatewayConfig::from_file("/nonexistent/gateway.yaml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
