//! Datasource configuration types
//!
//! These mirror what the datasource catalog stores for every datasource:
//! which driver handles it, how to reach it and how to authenticate.

use crate::structure::DatasourceStructure;
use crate::types::{DatasourceId, StringMap, ValueMap};
use serde::{Deserialize, Serialize};

/// OAuth2 grant type configured on a datasource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Three-legged flow with a user-facing redirect
    #[default]
    AuthorizationCode,
    /// Two-legged machine-to-machine flow
    ClientCredentials,
}

/// OAuth2 settings for a datasource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Config {
    /// Grant type
    #[serde(default)]
    pub grant_type: GrantType,
    /// Provider authorization endpoint
    pub authorization_url: String,
    /// Provider token endpoint
    pub access_token_url: String,
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Requested scopes
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Send client credentials as HTTP Basic instead of form fields
    #[serde(default)]
    pub is_authorization_header: bool,
    /// Extra query parameters for the authorization URL
    #[serde(default)]
    pub custom_authorization_parameters: StringMap,
    /// Set once a token has been obtained for this datasource
    #[serde(default)]
    pub is_authorized: bool,
}

/// Client credentials handed to the token exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// Client ID
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Send as HTTP Basic header
    pub use_basic_auth: bool,
}

impl From<&OAuth2Config> for ClientCredentials {
    fn from(config: &OAuth2Config) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            use_basic_auth: config.is_authorization_header,
        }
    }
}

/// Authentication configuration of a datasource
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthenticationConfig {
    /// No authentication required
    #[default]
    None,

    /// HTTP Basic / username-password authentication
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// Static API key sent in a header
    ApiKey {
        /// Header name
        #[serde(default = "default_api_key_header")]
        header: String,
        /// Key value
        value: String,
    },

    /// Delegated OAuth2 credentials
    Oauth2(OAuth2Config),
}

fn default_api_key_header() -> String {
    "Authorization".to_string()
}

impl AuthenticationConfig {
    /// Short name of the auth type, for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AuthenticationConfig::None => "none",
            AuthenticationConfig::Basic { .. } => "basic",
            AuthenticationConfig::ApiKey { .. } => "api_key",
            AuthenticationConfig::Oauth2(_) => "oauth2",
        }
    }
}

/// How to reach a datasource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Endpoint URL or connection string
    #[serde(default)]
    pub url: Option<String>,
    /// Driver-specific properties
    #[serde(default)]
    pub properties: ValueMap,
}

/// A datasource configuration without an identity
///
/// This is what `POST /test` accepts: the datasource may not have been
/// saved to the catalog yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasourceConfig {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Driver (plugin) name
    pub plugin: String,
    /// Connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Authentication settings
    #[serde(default)]
    pub authentication: AuthenticationConfig,
    /// Structure declared up front, for drivers that cannot introspect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<DatasourceStructure>,
}

impl DatasourceConfig {
    /// The OAuth2 settings, if this datasource uses OAuth2
    pub fn oauth2(&self) -> Option<&OAuth2Config> {
        match &self.authentication {
            AuthenticationConfig::Oauth2(config) => Some(config),
            _ => None,
        }
    }
}

/// A datasource registered in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datasource {
    /// Catalog identity
    pub id: DatasourceId,
    /// Configuration
    #[serde(flatten)]
    pub config: DatasourceConfig,
}

impl Datasource {
    /// Create a datasource from an id and a configuration
    pub fn new(id: DatasourceId, config: DatasourceConfig) -> Self {
        Self { id, config }
    }
}

/// Result of a connection test
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasourceTestResult {
    /// Whether the datasource was reachable
    pub success: bool,
    /// Configuration problems found before any connection attempt
    #[serde(default)]
    pub invalids: Vec<String>,
    /// Diagnostic message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DatasourceTestResult {
    /// Create a successful test result
    pub fn success() -> Self {
        Self {
            success: true,
            invalids: Vec::new(),
            message: None,
        }
    }

    /// Create a failed test result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            invalids: Vec::new(),
            message: Some(message.into()),
        }
    }

    /// Create a result for a configuration that failed validation
    pub fn invalid(invalids: Vec<String>) -> Self {
        Self {
            success: false,
            invalids,
            message: Some("Datasource configuration is invalid".to_string()),
        }
    }
}
