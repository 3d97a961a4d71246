//! CLI module
//!
//! Command-line interface for running the gateway.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP gateway
//! - `validate` - Check a configuration file
//! - `test` - Test connectivity of a configured datasource
//! - `structure` - Fetch the structure of a configured datasource
//! - `mocks` - List the mock dataset catalog

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
pub use server::{router, serve, API_PREFIX};
