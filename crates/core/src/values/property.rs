//! A generic `(id, label)` reference into a vocabulary.

use crate::json;
use pheno_vocabulary::{VocabularyManager, VocabularyTerm};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A vocabulary reference: a term id with its human-readable label.
///
/// Free text that does not resolve to a term keeps an empty id and the text as its label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct VocabularyProperty {
    id: String,
    name: Option<String>,
}

impl VocabularyProperty {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }

    /// Resolves a term id to its label. Unknown ids keep the id with no label.
    pub fn from_id(id: &str, vocabulary: &VocabularyManager) -> Self {
        let id = id.trim();
        Self::new(id, vocabulary.get_term(id).map(|term| term.name))
    }

    /// Resolves free text to a term. Unresolved text keeps an empty id.
    pub fn from_text(text: &str, vocabulary: &VocabularyManager) -> Self {
        let text = text.trim();
        match vocabulary.resolve_term(text) {
            Some(term) => Self::from(term),
            None => Self::new("", Some(text.to_string())),
        }
    }

    /// Reads a stored value, which is either a term id or free text.
    pub fn from_stored(value: &str, vocabulary: &VocabularyManager) -> Self {
        let value = value.trim();
        if let Some(term) = vocabulary.get_term(value) {
            return Self::from(term);
        }
        if vocabulary.recognises(value) {
            return Self::new(value, None);
        }
        Self::new("", Some(value.to_string()))
    }

    /// Reads `{"id": .., "label": ..}` or a bare string.
    ///
    /// A missing id is resolved from the label; a missing label is resolved from the id.
    /// Returns `None` when neither is given.
    pub fn from_json(value: &Value, vocabulary: &VocabularyManager) -> Option<Self> {
        match value {
            Value::Object(obj) => Self::from_json_object(obj, vocabulary),
            other => json::text(other).map(|text| Self::from_stored(&text, vocabulary)),
        }
    }

    pub(crate) fn from_json_object(
        obj: &Map<String, Value>,
        vocabulary: &VocabularyManager,
    ) -> Option<Self> {
        let id = json::text_at(obj, "id");
        let label = json::text_at(obj, "label").or_else(|| json::text_at(obj, "name"));
        match (id, label) {
            (Some(id), Some(label)) => Some(Self::new(id, Some(label))),
            (Some(id), None) => Some(Self::from_id(&id, vocabulary)),
            (None, Some(label)) => Some(Self::from_text(&label, vocabulary)),
            (None, None) => None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// The value written to the record: the id, or the label for free text.
    pub fn storage_value(&self) -> String {
        if self.has_id() {
            self.id.clone()
        } else {
            self.name.clone().unwrap_or_default()
        }
    }

    /// `{"id": .., "label": ..}`, omitting whichever is unknown.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        self.write_json_fields(&mut obj);
        Value::Object(obj)
    }

    pub(crate) fn write_json_fields(&self, obj: &mut Map<String, Value>) {
        if self.has_id() {
            obj.insert("id".into(), Value::String(self.id.clone()));
        }
        if let Some(name) = &self.name {
            obj.insert("label".into(), Value::String(name.clone()));
        }
    }
}

impl From<VocabularyTerm> for VocabularyProperty {
    fn from(term: VocabularyTerm) -> Self {
        Self::new(term.id, Some(term.name))
    }
}

/// Display order: by label, case-sensitive, with unlabelled entries last.
pub fn compare_by_label(a: &VocabularyProperty, b: &VocabularyProperty) -> Ordering {
    match (a.name(), b.name()) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `properties` in display order. The sort is stable, so equal labels keep their stored order.
pub fn sorted_by_label<'a>(
    properties: impl IntoIterator<Item = &'a VocabularyProperty>,
) -> Vec<&'a VocabularyProperty> {
    let mut sorted: Vec<_> = properties.into_iter().collect();
    sorted.sort_by(|a, b| compare_by_label(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::vocabulary;
    use serde_json::json;

    #[test]
    fn resolves_label_from_id_and_id_from_text() {
        let vocabulary = vocabulary();

        let by_id = VocabularyProperty::from_id("HP:0001250", &vocabulary);
        assert_eq!(by_id.name(), Some("Seizure"));

        let by_text = VocabularyProperty::from_text("seizures", &vocabulary);
        assert_eq!(by_text.id(), "HP:0001250");
        assert_eq!(by_text.name(), Some("Seizure"));
    }

    #[test]
    fn unresolved_text_keeps_an_empty_id() {
        let vocabulary = vocabulary();
        let property = VocabularyProperty::from_text("Very long toes", &vocabulary);
        assert_eq!(property.id(), "");
        assert_eq!(property.name(), Some("Very long toes"));
        assert_eq!(property.storage_value(), "Very long toes");
        assert_eq!(property.to_json(), json!({"label": "Very long toes"}));
    }

    #[test]
    fn stored_unknown_ids_stay_ids() {
        let vocabulary = vocabulary();
        let property = VocabularyProperty::from_stored("HP:9999999", &vocabulary);
        assert_eq!(property.id(), "HP:9999999");
        assert_eq!(property.name(), None);
    }

    #[test]
    fn json_label_is_kept_when_both_are_given() {
        let vocabulary = vocabulary();
        let payload = json!({"id": "HP:0001250", "label": "Fits"});
        let property = VocabularyProperty::from_json(&payload, &vocabulary).unwrap();
        assert_eq!(property.name(), Some("Fits"));
        assert!(VocabularyProperty::from_json(&json!({}), &vocabulary).is_none());
    }

    #[test]
    fn sorts_by_label_with_missing_labels_last() {
        let mut properties = vec![
            VocabularyProperty::new("HP:3", None),
            VocabularyProperty::new("HP:2", Some("seizure".into())),
            VocabularyProperty::new("HP:1", Some("Seizure".into())),
            VocabularyProperty::new("HP:4", Some("Ataxia".into())),
        ];
        properties.sort_by(compare_by_label);
        let ids: Vec<_> = properties.iter().map(VocabularyProperty::id).collect();
        assert_eq!(ids, vec!["HP:4", "HP:1", "HP:2", "HP:3"]);
    }
}
