//! Common types used throughout the gateway
//!
//! This module contains the opaque identifiers shared across modules
//! and a few type aliases.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// Generic key-value map with string keys and JSON values
pub type ValueMap = HashMap<String, JsonValue>;

// ============================================================================
// Identifiers
// ============================================================================

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{1,128}$").expect("identifier pattern is valid"));

/// Identifiers end up as URL path segments, so `.` and `..` are refused
fn check_identifier(kind: &str, value: &str) -> Result<()> {
    if !IDENTIFIER.is_match(value) {
        return Err(Error::validation(format!(
            "{kind} must be 1-128 characters of [A-Za-z0-9_.-], got '{value}'"
        )));
    }
    if value.chars().all(|c| c == '.') {
        return Err(Error::validation(format!(
            "{kind} cannot consist only of dots, got '{value}'"
        )));
    }
    Ok(())
}

/// Opaque identifier of a datasource, owned by the datasource catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatasourceId(String);

impl DatasourceId {
    /// Parse and validate a datasource identifier
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        check_identifier("Datasource id", &value)?;
        Ok(Self(value))
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DatasourceId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<DatasourceId> for String {
    fn from(id: DatasourceId) -> Self {
        id.0
    }
}

impl fmt::Display for DatasourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of the UI page that started an authorization attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageContext(String);

impl PageContext {
    /// Parse and validate a page context
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        check_identifier("Page context", &value)?;
        Ok(Self(value))
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PageContext {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<PageContext> for String {
    fn from(page: PageContext) -> Self {
        page.0
    }
}

impl fmt::Display for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
