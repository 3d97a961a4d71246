//! Datasource module
//!
//! Datasource configuration types and the catalog that owns them.
//!
//! Supported authentication: none, Basic, API key, OAuth2 (authorization
//! code or client credentials).

mod catalog;
mod types;

pub use catalog::{DatasourceCatalog, InMemoryCatalog};
pub use types::{
    AuthenticationConfig, ClientCredentials, ConnectionConfig, Datasource, DatasourceConfig,
    DatasourceTestResult, GrantType, OAuth2Config,
};
