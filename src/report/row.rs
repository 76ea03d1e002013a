//! A single parsed report line.

use indexmap::IndexMap;

/// One line of the stats report, keyed by header column name.
///
/// Columns keep header order. The row is built once by the parser and never
/// modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatRow {
    fields: IndexMap<String, String>,
}

impl StatRow {
    /// Builds a row by zipping header names against cell values.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the cell for `column`, if the report has that column.
    #[inline]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Column names in header order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of columns.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_order() {
        let row = StatRow::from_pairs([("pxname", "web"), ("svname", "srv1"), ("scur", "3")]);

        assert_eq!(row.get("svname"), Some("srv1"));
        assert_eq!(row.get("smax"), None);
        assert_eq!(row.columns().collect::<Vec<_>>(), ["pxname", "svname", "scur"]);
        assert_eq!(row.len(), 3);
    }
}
