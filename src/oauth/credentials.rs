//! Credential store
//!
//! Receives access tokens once a code exchange succeeds. The gateway only
//! ever writes to it.

use super::types::AccessTokenResult;
use crate::error::Result;
use crate::types::DatasourceId;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Persists access tokens for datasources
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store (or replace) the token of a datasource
    async fn store(&self, id: &DatasourceId, token: AccessTokenResult) -> Result<()>;
}

/// In-memory credential store
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    tokens: RwLock<HashMap<DatasourceId, AccessTokenResult>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Token stored for a datasource
    pub async fn get(&self, id: &DatasourceId) -> Option<AccessTokenResult> {
        self.tokens.read().await.get(id).cloned()
    }

    /// Number of stored tokens
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn store(&self, id: &DatasourceId, token: AccessTokenResult) -> Result<()> {
        info!(datasource = %id, expires_at = ?token.expires_at, "Stored datasource credentials");
        self.tokens.write().await.insert(id.clone(), token);
        Ok(())
    }
}
