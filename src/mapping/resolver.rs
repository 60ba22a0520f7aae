//! Identifier resolution
//!
//! Lookups are linear scans in document order. The first matching entry
//! wins and an identifier with no entry resolves to itself. Callers on a
//! per-row path should memoize results.

use super::document::{MappingDocument, TableMapping};

/// Resolves identifiers through an optional mapping document
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMapper<'a> {
    document: Option<&'a MappingDocument>,
}

impl<'a> NameMapper<'a> {
    /// Create a mapper; `None` maps every identifier to itself
    pub fn new(document: Option<&'a MappingDocument>) -> Self {
        Self { document }
    }

    fn tables(&self) -> &'a [TableMapping] {
        self.document.map(|d| d.tables.as_slice()).unwrap_or(&[])
    }

    /// Translate a table name.
    ///
    /// With `want_original` the input is treated as a target name and the
    /// source name is returned; otherwise the reverse.
    pub fn table_name<'n>(&self, current: &'n str, want_original: bool) -> &'n str
    where
        'a: 'n,
    {
        for table in self.tables() {
            let (matched, resolved) = if want_original {
                (&table.name.new, &table.name.original)
            } else {
                (&table.name.original, &table.name.new)
            };

            if matched == current {
                return resolved;
            }
        }

        current
    }

    /// Translate a column name of the table whose source name is
    /// `original_table`.
    ///
    /// Columns are always matched on their source name, whichever
    /// direction is requested.
    pub fn column_name<'n>(
        &self,
        original_table: &str,
        current_column: &'n str,
        want_original: bool,
    ) -> &'n str
    where
        'a: 'n,
    {
        let candidates = self
            .tables()
            .iter()
            .filter(|t| t.name.original == original_table)
            .filter_map(|t| t.columns.as_deref());

        for columns in candidates {
            if let Some(column) = columns.iter().find(|c| c.original == current_column) {
                return if want_original {
                    &column.original
                } else {
                    &column.new
                };
            }
        }

        current_column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::document::NamePair;

    fn pair(original: &str, new: &str) -> NamePair {
        NamePair {
            original: original.to_string(),
            new: new.to_string(),
        }
    }

    fn document() -> MappingDocument {
        MappingDocument {
            tables: vec![
                TableMapping {
                    name: pair("t1", "t1_new"),
                    columns: Some(vec![pair("c1", "c1_new")]),
                },
                TableMapping {
                    name: pair("A", "B"),
                    columns: None,
                },
            ],
        }
    }

    #[test]
    fn test_table_name_both_directions() {
        let doc = document();
        let mapper = NameMapper::new(Some(&doc));

        assert_eq!(mapper.table_name("A", false), "B");
        assert_eq!(mapper.table_name("B", true), "A");
        assert_eq!(mapper.table_name("t1", false), "t1_new");
        assert_eq!(mapper.table_name("t1_new", true), "t1");
    }

    #[test]
    fn test_table_name_identity_fallback() {
        let doc = document();
        let mapper = NameMapper::new(Some(&doc));

        for want_original in [true, false] {
            assert_eq!(mapper.table_name("missing", want_original), "missing");
        }
        // Direction matters: a source name looked up as a target name is a miss
        assert_eq!(mapper.table_name("A", true), "A");

        let empty = NameMapper::new(None);
        assert_eq!(empty.table_name("A", false), "A");
    }

    #[test]
    fn test_column_name() {
        let doc = document();
        let mapper = NameMapper::new(Some(&doc));

        assert_eq!(mapper.column_name("t1", "c1", false), "c1_new");
        assert_eq!(mapper.column_name("t1", "c1", true), "c1");
        // Columns are matched on their source name only
        assert_eq!(mapper.column_name("t1", "c1_new", true), "c1_new");
    }

    #[test]
    fn test_column_name_fallbacks() {
        let doc = document();
        let mapper = NameMapper::new(Some(&doc));

        // Unknown table
        assert_eq!(mapper.column_name("t2", "c1", false), "c1");
        // Known table without columns
        assert_eq!(mapper.column_name("A", "c1", false), "c1");
        // Unknown column
        assert_eq!(mapper.column_name("t1", "c9", false), "c9");
    }

    #[test]
    fn test_first_match_wins() {
        let doc = MappingDocument {
            tables: vec![
                TableMapping {
                    name: pair("dup", "first"),
                    columns: Some(vec![pair("x", "x1")]),
                },
                TableMapping {
                    name: pair("dup", "second"),
                    columns: Some(vec![pair("x", "x2"), pair("y", "y2")]),
                },
            ],
        };
        let mapper = NameMapper::new(Some(&doc));

        assert_eq!(mapper.table_name("dup", false), "first");
        assert_eq!(mapper.column_name("dup", "x", false), "x1");
        // Scan continues into later entries for the same table
        assert_eq!(mapper.column_name("dup", "y", false), "y2");
    }
}
