//! Token exchange client
//!
//! Exchanges an authorization code at the provider's token endpoint. One
//! request per call; retry policy belongs to the caller.

use super::types::AccessTokenResult;
use crate::datasource::ClientCredentials;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Parameters of one authorization-code exchange
#[derive(Debug, Clone, Copy)]
pub struct ExchangeRequest<'a> {
    /// Provider token endpoint
    pub token_url: &'a str,
    /// Authorization code from the callback
    pub code: &'a str,
    /// Redirect URI sent with the authorization request
    pub redirect_uri: &'a str,
    /// Client credentials
    pub credentials: &'a ClientCredentials,
}

/// Exchanges authorization codes for access tokens
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange a code, failing with `Provider` or `Transport`
    async fn exchange(&self, request: &ExchangeRequest<'_>) -> Result<AccessTokenResult>;
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenResponse {
    fn into_result(self) -> AccessTokenResult {
        let issued_at = Utc::now();
        AccessTokenResult {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            issued_at,
            expires_at: self
                .expires_in
                .map(|secs| issued_at + chrono::Duration::seconds(secs)),
            refresh_token: self.refresh_token,
            scope: self.scope,
        }
    }
}

/// OAuth2 error response body
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Token exchange over HTTP
#[derive(Debug, Clone)]
pub struct HttpTokenExchange {
    http_client: Client,
}

impl HttpTokenExchange {
    /// Create an exchange client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http_client })
    }

    /// Create an exchange client with a custom HTTP client
    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl TokenExchange for HttpTokenExchange {
    async fn exchange(&self, request: &ExchangeRequest<'_>) -> Result<AccessTokenResult> {
        let credentials = request.credentials;
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", request.code),
            ("redirect_uri", request.redirect_uri),
        ];

        let mut req = self.http_client.post(request.token_url);
        if credentials.use_basic_auth {
            req = req.basic_auth(&credentials.client_id, Some(&credentials.client_secret));
        } else {
            form.push(("client_id", credentials.client_id.as_str()));
            form.push(("client_secret", credentials.client_secret.as_str()));
        }

        let response = req
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::transport(format!("Token request to {} failed: {e}", request.token_url)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read token response: {e}")))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {description}", err.error),
                    None => err.error,
                },
                Err(_) => format!("Token request failed with status {}: {body}", status.as_u16()),
            };
            return Err(Error::provider(message));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::provider(format!("Malformed token response: {e}")))?;
        debug!(
            token_type = ?token.token_type,
            expires_in = ?token.expires_in,
            has_refresh_token = token.refresh_token.is_some(),
            "Exchanged authorization code"
        );
        Ok(token.into_result())
    }
}
