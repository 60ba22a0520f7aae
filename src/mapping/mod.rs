//! Name Mapping Module
//!
//! Translates table and column identifiers between the source schema and
//! a renamed target schema, as described by the extra-config document.

mod document;
mod resolver;

pub use document::{ColumnMapping, MappingDocument, NamePair, TableMapping};
pub use resolver::NameMapper;
