//! Authorization flow orchestrator
//!
//! Drives one OAuth2 authorization-code attempt from the redirect to the
//! provider through the callback:
//!
//! ```text
//! Initiated ──callback──▶ CallbackReceived ──exchange ok──▶ Exchanged
//!     │                          │
//!     └──bad/expired/replayed──▶ Failed ◀──denied / exchange failed
//! ```
//!
//! Every callback ends in a redirect, including the failed ones.

use super::credentials::CredentialStore;
use super::exchange::{ExchangeRequest, TokenExchange};
use super::state::{StateClaims, StateLedger, StateSigner};
use super::types::{AuthorizationOutcome, CallbackParams, FlowState};
use crate::config::GatewayConfig;
use crate::datasource::{ClientCredentials, Datasource, DatasourceCatalog, GrantType, OAuth2Config};
use crate::error::{Error, Result};
use crate::types::{DatasourceId, PageContext};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Query parameters the gateway sets itself on the authorization URL
const RESERVED_PARAMS: [&str; 4] = ["response_type", "client_id", "redirect_uri", "state"];

/// URL settings of the flow
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Gateway base URL, used when the request carries no origin
    pub public_url: String,
    /// Absolute callback URL registered with providers
    pub callback_url: String,
    /// Origins allowed to start an attempt (empty = any)
    pub allowed_origins: Vec<String>,
}

impl FlowSettings {
    /// Derive the settings from the gateway configuration
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            public_url: config.public_url().to_string(),
            callback_url: config.callback_url(),
            allowed_origins: config
                .server
                .allowed_origins
                .iter()
                .map(|o| o.trim_end_matches('/').to_string())
                .collect(),
        }
    }
}

/// OAuth2 authorization-code orchestrator
pub struct AuthorizationFlow {
    catalog: Arc<dyn DatasourceCatalog>,
    exchange: Arc<dyn TokenExchange>,
    credentials: Arc<dyn CredentialStore>,
    signer: StateSigner,
    ledger: StateLedger,
    settings: FlowSettings,
}

impl AuthorizationFlow {
    /// Create an orchestrator over the given collaborators
    pub fn new(
        catalog: Arc<dyn DatasourceCatalog>,
        exchange: Arc<dyn TokenExchange>,
        credentials: Arc<dyn CredentialStore>,
        signer: StateSigner,
        settings: FlowSettings,
    ) -> Self {
        Self {
            catalog,
            exchange,
            credentials,
            signer,
            ledger: StateLedger::new(),
            settings,
        }
    }

    /// URL settings of this flow
    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    /// Build the provider authorization URL for a datasource
    ///
    /// The returned URL carries a fresh state token binding the datasource,
    /// the page and the request origin.
    pub async fn begin_authorization(
        &self,
        id: &DatasourceId,
        page: &PageContext,
        request_origin: Option<&str>,
    ) -> Result<String> {
        let datasource = self.catalog.get(id).await?;
        let oauth = authorization_code_config(&datasource)?;
        let origin = self.resolve_origin(request_origin)?;
        let state = self.signer.issue(id, page, &origin)?;

        let mut url = Url::parse(&oauth.authorization_url).map_err(|e| {
            Error::config(format!(
                "Datasource '{id}' has an invalid authorization url: {e}"
            ))
        })?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &oauth.client_id)
                .append_pair("redirect_uri", &self.settings.callback_url)
                .append_pair("state", &state);
            if !oauth.scopes.is_empty() {
                query.append_pair("scope", &oauth.scopes.join(" "));
            }

            let mut custom: Vec<_> = oauth.custom_authorization_parameters.iter().collect();
            custom.sort();
            for (key, value) in custom {
                if RESERVED_PARAMS.contains(&key.as_str()) {
                    warn!(datasource = %id, param = %key, "Ignoring reserved authorization parameter");
                    continue;
                }
                query.append_pair(key, value);
            }
        }

        info!(datasource = %id, page = %page, state = ?FlowState::Initiated, "Authorization started");
        Ok(url.into())
    }

    /// Handle the provider's redirect back to the gateway
    ///
    /// Never fails: every outcome carries a redirect, with
    /// `response_status=success` or an error code.
    pub async fn complete_authorization(&self, callback: CallbackParams) -> AuthorizationOutcome {
        let claims = match self.accept_state(callback.state.as_deref()).await {
            Ok(claims) => claims,
            Err(e) => return self.reject_callback(&e),
        };
        debug!(datasource = %claims.ds, page = %claims.page, state = ?FlowState::CallbackReceived, "Authorization callback accepted");

        if let Some(error) = callback.error.as_deref() {
            let status = provider_status(error);
            warn!(
                datasource = %claims.ds,
                %error,
                description = ?callback.error_description,
                state = ?FlowState::Failed,
                "Provider denied authorization"
            );
            return self.failed(&claims, status);
        }

        match self.exchange_code(&claims, callback.code.as_deref()).await {
            Ok(()) => {
                info!(datasource = %claims.ds, state = ?FlowState::Exchanged, "Authorization completed");
                AuthorizationOutcome {
                    state: FlowState::Exchanged,
                    datasource: Some(claims.ds.clone()),
                    redirect_url: self.page_redirect(&claims, "success"),
                    error: None,
                }
            }
            Err(e) => {
                warn!(datasource = %claims.ds, error = %e, state = ?FlowState::Failed, "Token exchange failed");
                self.failed(&claims, e.code().to_string())
            }
        }
    }

    /// Outcome for a callback whose state cannot be trusted
    ///
    /// Also used when the callback query itself could not be read.
    pub fn reject_callback(&self, error: &Error) -> AuthorizationOutcome {
        warn!(%error, state = ?FlowState::Failed, "Rejected authorization callback");
        AuthorizationOutcome {
            state: FlowState::Failed,
            datasource: None,
            redirect_url: self.fallback_redirect(error.code()),
            error: Some(error.code().to_string()),
        }
    }

    /// Verify and consume the state token of a callback
    async fn accept_state(&self, state: Option<&str>) -> Result<StateClaims> {
        let state = state
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::validation("Missing state parameter"))?;
        let claims = self.signer.verify(state)?;
        self.ledger.consume(&claims).await?;
        Ok(claims)
    }

    async fn exchange_code(&self, claims: &StateClaims, code: Option<&str>) -> Result<()> {
        let code = code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::validation("Missing authorization code"))?;
        let datasource = self.catalog.get(&claims.ds).await?;
        let oauth = authorization_code_config(&datasource)?;
        let credentials = ClientCredentials::from(oauth);

        let token = self
            .exchange
            .exchange(&ExchangeRequest {
                token_url: &oauth.access_token_url,
                code,
                redirect_uri: &self.settings.callback_url,
                credentials: &credentials,
            })
            .await?;

        self.credentials.store(&claims.ds, token).await?;
        self.catalog.mark_authorized(&claims.ds).await
    }

    fn resolve_origin(&self, request_origin: Option<&str>) -> Result<String> {
        let Some(raw) = request_origin.map(str::trim).filter(|o| !o.is_empty()) else {
            return Ok(self.settings.public_url.clone());
        };

        let parsed =
            Url::parse(raw).map_err(|_| Error::validation(format!("Invalid request origin '{raw}'")))?;
        let origin = parsed.origin();
        if !origin.is_tuple() {
            return Err(Error::validation(format!("Invalid request origin '{raw}'")));
        }
        let origin = origin.ascii_serialization();

        if !self.settings.allowed_origins.is_empty()
            && !self.settings.allowed_origins.iter().any(|a| *a == origin)
        {
            return Err(Error::validation(format!("Origin '{origin}' is not allowed")));
        }
        Ok(origin)
    }

    fn failed(&self, claims: &StateClaims, status: String) -> AuthorizationOutcome {
        AuthorizationOutcome {
            state: FlowState::Failed,
            datasource: Some(claims.ds.clone()),
            redirect_url: self.page_redirect(claims, &status),
            error: Some(status),
        }
    }

    /// Redirect back to the page that started the attempt
    fn page_redirect(&self, claims: &StateClaims, status: &str) -> String {
        let base = format!(
            "{}/pages/{}/edit/datasources/{}",
            claims.origin.trim_end_matches('/'),
            claims.page,
            claims.ds
        );
        with_status(&base, status)
    }

    /// Redirect used when the state token could not be trusted
    fn fallback_redirect(&self, status: &str) -> String {
        with_status(&format!("{}/datasources", self.settings.public_url), status)
    }
}

impl std::fmt::Debug for AuthorizationFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationFlow")
            .field("settings", &self.settings)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

/// The OAuth2 settings of a datasource that supports the authorization-code flow
fn authorization_code_config(datasource: &Datasource) -> Result<&OAuth2Config> {
    match datasource.config.oauth2() {
        Some(oauth) if oauth.grant_type == GrantType::AuthorizationCode => Ok(oauth),
        Some(_) => Err(Error::unsupported_auth(
            datasource.id.as_str(),
            "OAuth2 grant type is not authorization_code",
        )),
        None => Err(Error::unsupported_auth(
            datasource.id.as_str(),
            format!(
                "'{}' authentication does not use OAuth2",
                datasource.config.authentication.type_name()
            ),
        )),
    }
}

/// Provider error codes are passed through when they look like codes
fn provider_status(error: &str) -> String {
    let well_formed = !error.is_empty()
        && error.len() <= 64
        && error
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if well_formed {
        error.to_string()
    } else {
        "provider_error".to_string()
    }
}

fn with_status(base: &str, status: &str) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("response_status", status);
            url.into()
        }
        Err(_) => format!("{base}?response_status={status}"),
    }
}
