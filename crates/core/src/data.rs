//! The in-memory value bag produced by a controller's `load` and consumed by its `save`.

use std::collections::BTreeMap;

/// Named collection of facet values.
///
/// A bag holds either a single value, an indexed list of values, or values keyed by name. It is
/// rebuilt from the record on every load and never shared between records.
#[derive(Clone, Debug, PartialEq)]
pub struct PatientData<T> {
    name: String,
    values: DataValues<T>,
}

#[derive(Clone, Debug, PartialEq)]
enum DataValues<T> {
    Value(T),
    Indexed(Vec<T>),
    Named(BTreeMap<String, T>),
}

impl<T> PatientData<T> {
    /// A bag holding one value.
    pub fn value(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            values: DataValues::Value(value),
        }
    }

    /// A bag holding an ordered list of values.
    pub fn indexed(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: name.into(),
            values: DataValues::Indexed(values),
        }
    }

    /// A bag holding values keyed by name.
    pub fn named(name: impl Into<String>, values: BTreeMap<String, T>) -> Self {
        Self {
            name: name.into(),
            values: DataValues::Named(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        match &self.values {
            DataValues::Value(_) => 1,
            DataValues::Indexed(values) => values.len(),
            DataValues::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.values, DataValues::Indexed(_))
    }

    pub fn is_named(&self) -> bool {
        matches!(self.values, DataValues::Named(_))
    }

    /// The value at `index` of an indexed bag.
    pub fn get(&self, index: usize) -> Option<&T> {
        match &self.values {
            DataValues::Indexed(values) => values.get(index),
            _ => None,
        }
    }

    /// The value stored under `key` in a named bag.
    pub fn get_named(&self, key: &str) -> Option<&T> {
        match &self.values {
            DataValues::Named(values) => values.get(key),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get_named(key).is_some()
    }

    /// Keys of a named bag, in order; empty for other shapes.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        let keys = match &self.values {
            DataValues::Named(values) => Some(values.keys().map(String::as_str)),
            _ => None,
        };
        keys.into_iter().flatten()
    }

    /// Every value of the bag, whatever its shape.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match &self.values {
            DataValues::Value(value) => Box::new(std::iter::once(value)),
            DataValues::Indexed(values) => Box::new(values.iter()),
            DataValues::Named(values) => Box::new(values.values()),
        }
    }

    /// `(key, value)` pairs of a named bag; empty for other shapes.
    pub fn named_iter(&self) -> impl Iterator<Item = (&str, &T)> {
        let entries = match &self.values {
            DataValues::Named(values) => Some(values.iter().map(|(k, v)| (k.as_str(), v))),
            _ => None,
        };
        entries.into_iter().flatten()
    }

    /// The single value of a value bag.
    pub fn value_ref(&self) -> Option<&T> {
        match &self.values {
            DataValues::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes the bag, returning its values in iteration order.
    pub fn into_values(self) -> Vec<T> {
        match self.values {
            DataValues::Value(value) => vec![value],
            DataValues::Indexed(values) => values,
            DataValues::Named(values) => values.into_values().collect(),
        }
    }
}

impl<T> IntoIterator for PatientData<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_values().into_iter()
    }
}
