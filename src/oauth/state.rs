//! Authorization state tokens
//!
//! A state token is an HS256 JWT binding a datasource, a page context and
//! the request origin, with an expiry and a unique id. Signature and expiry
//! make it tamper-evident without server-side storage; the `StateLedger`
//! remembers consumed ids until they expire so each token is accepted once.

use crate::error::{Error, Result, ValidationKind};
use crate::types::{DatasourceId, PageContext};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// Claims carried by a state token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateClaims {
    /// Unique token id
    pub jti: String,
    /// Datasource being authorized
    pub ds: DatasourceId,
    /// Page that started the attempt
    pub page: PageContext,
    /// Origin to send the user back to
    pub origin: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Issues and verifies state tokens
#[derive(Clone)]
pub struct StateSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl StateSigner {
    /// Create a signer from a shared secret and token lifetime
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::config("State signing secret must not be empty"));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| Error::config(format!("Invalid state token lifetime: {e}")))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    /// Issue a state token valid from now
    pub fn issue(&self, ds: &DatasourceId, page: &PageContext, origin: &str) -> Result<String> {
        self.issue_at(ds, page, origin, Utc::now())
    }

    /// Issue a state token as if it were created at `now`
    pub(crate) fn issue_at(
        &self,
        ds: &DatasourceId,
        page: &PageContext,
        origin: &str,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let claims = StateClaims {
            jti: uuid::Uuid::new_v4().simple().to_string(),
            ds: ds.clone(),
            page: page.clone(),
            origin: origin.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Other(format!("Failed to sign state token: {e}")))
    }

    /// Verify signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<StateClaims> {
        decode::<StateClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    Error::state(ValidationKind::ExpiredState, "State token has expired")
                }
                _ => Error::state(
                    ValidationKind::InvalidState,
                    format!("State token rejected: {e}"),
                ),
            })
    }
}

impl std::fmt::Debug for StateSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSigner")
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

/// Consumed state token ids, kept until their tokens expire
#[derive(Debug, Default)]
pub struct StateLedger {
    consumed: Mutex<HashMap<String, i64>>,
}

impl StateLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a token as used; fails if it was used before or has expired
    pub async fn consume(&self, claims: &StateClaims) -> Result<()> {
        self.consume_at(claims, Utc::now().timestamp()).await
    }

    /// Mark a token as used at `now` (unix seconds)
    ///
    /// Entries are pruned once past their expiry, so an expired claim must
    /// be refused here or its id could be accepted again.
    pub(crate) async fn consume_at(&self, claims: &StateClaims, now: i64) -> Result<()> {
        let mut consumed = self.consumed.lock().await;
        consumed.retain(|_, exp| *exp >= now);

        if claims.exp < now {
            return Err(Error::state(
                ValidationKind::ExpiredState,
                "State token has expired",
            ));
        }

        if consumed.contains_key(&claims.jti) {
            return Err(Error::state(
                ValidationKind::ReplayedState,
                "State token was already used",
            ));
        }
        consumed.insert(claims.jti.clone(), claims.exp);
        Ok(())
    }

    /// Number of remembered token ids
    pub async fn len(&self) -> usize {
        self.consumed.lock().await.len()
    }

    /// Whether no token ids are remembered
    pub async fn is_empty(&self) -> bool {
        self.consumed.lock().await.is_empty()
    }
}
