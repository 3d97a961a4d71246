//! Structure module
//!
//! Structure descriptors, the per-datasource structure cache and the
//! fetcher that fills it.
//!
//! # Overview
//!
//! - `DatasourceStructure` - driver-produced description of tables and fields
//! - `StructureCache` - latest descriptor per datasource, no time-based expiry
//! - `StructureFetcher` - cache lookup with caller-driven bypass

mod cache;
mod fetcher;
mod types;

pub use cache::StructureCache;
pub use fetcher::StructureFetcher;
pub use types::{CachedStructure, Column, DatasourceStructure, Key, Table, TableKind, Template};
