// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Datasource Gateway
//!
//! Backend connectivity layer between a low-code application builder and
//! the external datasources its apps talk to.
//!
//! ## Features
//!
//! - **Connection tests**: validate a datasource configuration and probe it
//! - **Structure discovery**: introspect tables and columns, cached per datasource
//! - **OAuth2 handshakes**: authorization-code flow with signed, single-use state
//! - **Mock datasets**: provision canned datasources for onboarding and demos
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use datasource_gateway::{GatewayConfig, Gateway, DatasourceId, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = GatewayConfig::from_file("gateway.yaml")?;
//!     let gateway = Gateway::from_config(&config)?;
//!
//!     let id = DatasourceId::parse("sheets")?;
//!     let structure = gateway.get_structure(&id, false).await?;
//!     println!("{} tables", structure.tables.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │              HTTP routes  /api/v1/datasources/...              │
//! │  POST /test   GET /:id/structure   GET /:id/pages/:page/code   │
//! │  GET /authorize   GET|POST /mocks                              │
//! └────────────────────────────────────────────────────────────────┘
//!                                │
//!                            Gateway
//!                                │
//! ┌──────────────┬───────────────┼───────────────┬─────────────────┐
//! │   Drivers    │   Structure   │    OAuth2     │     Mocks       │
//! ├──────────────┼───────────────┼───────────────┼─────────────────┤
//! │ Registry     │ Cache         │ State tokens  │ Config catalog  │
//! │ Probe (HTTP) │ Fetcher       │ Token exchange│ Provisioning    │
//! │              │               │ Credentials   │                 │
//! └──────────────┴───────────────┴───────────────┴─────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the gateway
pub mod error;

/// Common types and type aliases
pub mod types;

/// Gateway configuration
pub mod config;

/// Datasource model and catalog
pub mod datasource;

/// Datasource drivers
pub mod driver;

/// Structure descriptors, cache and fetcher
pub mod structure;

/// OAuth2 authorization-code flow
pub mod oauth;

/// Mock dataset catalog
pub mod mocks;

/// Gateway facade
pub mod gateway;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::GatewayConfig;
pub use gateway::{Gateway, GatewayParts};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
