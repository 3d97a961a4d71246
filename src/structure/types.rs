//! Structure descriptor types
//!
//! A `DatasourceStructure` is produced by a driver's introspection and is
//! served to clients as-is. The gateway never interprets its contents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a structural entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableKind {
    #[default]
    Table,
    View,
    Alias,
    Collection,
}

/// A column or field of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Column name
    pub name: String,
    /// Driver-specific type name
    #[serde(rename = "type", default)]
    pub column_type: Option<String>,
    /// Default value expression, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// A key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Key {
    /// Primary key over one or more columns
    Primary { name: String, columns: Vec<String> },
    /// Foreign key mapping local columns to remote ones
    Foreign {
        name: String,
        from_columns: Vec<String>,
        to_columns: Vec<String>,
    },
}

/// A canned query suggested for a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Short title (e.g. "SELECT")
    pub title: String,
    /// Query body
    pub body: String,
}

/// One table / collection / view of a datasource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Entity kind
    #[serde(rename = "type", default)]
    pub kind: TableKind,
    /// Entity name
    pub name: String,
    /// Columns or fields
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Key constraints
    #[serde(default)]
    pub keys: Vec<Key>,
    /// Suggested queries
    #[serde(default)]
    pub templates: Vec<Template>,
}

/// Structural description of a datasource
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasourceStructure {
    /// Tables, collections and views
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl DatasourceStructure {
    /// Create a structure from a list of tables
    pub fn new(tables: Vec<Table>) -> Self {
        Self { tables }
    }

    /// Find a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// A structure as held by the cache
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedStructure {
    /// The descriptor
    pub structure: DatasourceStructure,
    /// When the descriptor was introspected
    pub fetched_at: DateTime<Utc>,
}

impl CachedStructure {
    /// Wrap a freshly introspected structure
    pub fn fresh(structure: DatasourceStructure) -> Self {
        Self {
            structure,
            fetched_at: Utc::now(),
        }
    }
}
