//! Caller-supplied field selection for JSON export.

use std::collections::BTreeSet;

/// A set of facet, JSON-key or field names the caller wants exported.
///
/// Exporting without a selection includes everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSelection {
    names: BTreeSet<String>,
}

impl FieldSelection {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .map(|n: String| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list of names.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// True if any of `names` is selected.
    pub fn contains_any<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        names.into_iter().any(|name| self.contains(name))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// True if a field of a facet should be exported: no selection, or the selection names the
/// field itself, the facet, or the facet's JSON container.
pub fn field_selected(
    selection: Option<&FieldSelection>,
    facet: &str,
    json_key: &str,
    field: &str,
) -> bool {
    selection.map_or(true, |s| s.contains_any([facet, json_key, field]))
}
