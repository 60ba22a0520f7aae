//! Extra-config mapping document
//!
//! ```json
//! { "tables": [ { "name": { "original": "t", "new": "t2" },
//!                 "columns": [ { "original": "c", "new": "c2" } ] } ] }
//! ```

use serde::{Deserialize, Serialize};

/// The operator-supplied mapping document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    /// Table entries, in file order
    #[serde(default)]
    pub tables: Vec<TableMapping>,
}

/// A single original/new identifier pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePair {
    pub original: String,
    pub new: String,
}

/// Column renames are plain name pairs scoped to their table
pub type ColumnMapping = NamePair;

/// Mapping entry for one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMapping {
    /// Table name pair
    pub name: NamePair,

    /// Column renames within this table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnMapping>>,
}

impl MappingDocument {
    /// Parse a mapping document from JSON
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Number of table entries
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
