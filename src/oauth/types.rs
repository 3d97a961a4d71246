//! OAuth2 flow types

use crate::types::DatasourceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Query parameters of the provider's redirect back to the gateway
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,
    /// Echoed state token
    pub state: Option<String>,
    /// Provider error code (e.g. `access_denied`)
    pub error: Option<String>,
    /// Provider error description
    pub error_description: Option<String>,
}

/// Lifecycle of one authorization attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    /// State token issued, user sent to the provider
    Initiated,
    /// Provider redirected back with a usable state token
    CallbackReceived,
    /// Code exchanged and token stored
    Exchanged,
    /// State rejected, provider denied, or exchange failed
    Failed,
}

impl FlowState {
    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Exchanged | FlowState::Failed)
    }
}

/// Where to send the caller once a callback has been handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationOutcome {
    /// Terminal state reached
    pub state: FlowState,
    /// Datasource the attempt belonged to, when the state token was readable
    pub datasource: Option<DatasourceId>,
    /// Redirect target
    pub redirect_url: String,
    /// Error code carried in the redirect, if the attempt failed
    pub error: Option<String>,
}

/// Token obtained from a provider's token endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResult {
    /// Access token
    pub access_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// When the token was issued
    pub issued_at: DateTime<Utc>,
    /// When the token expires, if the provider said
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token, if granted
    pub refresh_token: Option<String>,
    /// Granted scope, if reported
    pub scope: Option<String>,
}

impl AccessTokenResult {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }
}

impl fmt::Debug for AccessTokenResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenResult")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("scope", &self.scope)
            .finish()
    }
}
