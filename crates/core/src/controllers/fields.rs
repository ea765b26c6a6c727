//! Declarative field layouts for regular facets.

use crate::selection::field_selected;
use crate::FieldSelection;
use serde_json::{Map, Value};

/// Where a facet's fields sit in the patient JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonLayout {
    /// Inside an object under the given key.
    Nested(&'static str),
    /// Directly at the top level, one key per field.
    Flat,
}

/// How a field is coded on the record and in JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Stored `0`/`1`, exposed as `true`/`false`; anything else is unknown.
    Boolean,
    Integer,
    /// Stored as a list of term ids, exposed as `[{"id", "label"}]`.
    Code,
}

/// The fields one facet owns on the main patient object.
#[derive(Debug)]
pub struct FacetFields {
    pub name: &'static str,
    pub class: &'static str,
    pub layout: JsonLayout,
    pub fields: &'static [&'static str],
    pub boolean_fields: &'static [&'static str],
    pub integer_fields: &'static [&'static str],
    pub code_fields: &'static [&'static str],
}

impl FacetFields {
    pub fn kind(&self, field: &str) -> FieldKind {
        if self.boolean_fields.contains(&field) {
            FieldKind::Boolean
        } else if self.integer_fields.contains(&field) {
            FieldKind::Integer
        } else if self.code_fields.contains(&field) {
            FieldKind::Code
        } else {
            FieldKind::Text
        }
    }

    pub fn owns(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    pub fn json_keys(&self) -> Vec<&'static str> {
        match self.layout {
            JsonLayout::Nested(key) => vec![key],
            JsonLayout::Flat => self.fields.to_vec(),
        }
    }

    fn container_key(&self) -> &'static str {
        match self.layout {
            JsonLayout::Nested(key) => key,
            JsonLayout::Flat => self.name,
        }
    }

    /// True if the selection names the facet, its container, or any of its fields.
    pub fn is_selected(&self, selection: Option<&FieldSelection>) -> bool {
        self.fields
            .iter()
            .any(|field| self.field_selected(selection, field))
    }

    pub fn field_selected(&self, selection: Option<&FieldSelection>, field: &str) -> bool {
        field_selected(selection, self.name, self.container_key(), field)
    }

    /// The object holding the facet's fields in an incoming payload.
    ///
    /// For nested layouts a container that is not an object reads as absent.
    pub fn container<'a>(&self, json: &'a Map<String, Value>) -> Option<&'a Map<String, Value>> {
        match self.layout {
            JsonLayout::Nested(key) => json.get(key).and_then(Value::as_object),
            JsonLayout::Flat => Some(json),
        }
    }

    /// Adds the facet's entries to an outgoing payload. Nothing is written for no entries.
    pub fn emit(&self, json: &mut Map<String, Value>, entries: Map<String, Value>) {
        if entries.is_empty() {
            return;
        }
        match self.layout {
            JsonLayout::Nested(key) => {
                json.insert(key.to_string(), Value::Object(entries));
            }
            JsonLayout::Flat => json.extend(entries),
        }
    }
}
