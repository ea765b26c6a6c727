//! Phenotype observations.

use crate::json;
use crate::values::{sorted_by_label, VocabularyProperty};
use pheno_vocabulary::VocabularyManager;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// One phenotype, observed or explicitly not observed, with its qualifiers and notes.
///
/// Qualifiers are grouped by category (`age_of_onset`, `severity`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhenoTipsFeature {
    term: VocabularyProperty,
    observed: bool,
    qualifiers: BTreeMap<String, Vec<VocabularyProperty>>,
    notes: Option<String>,
}

impl PhenoTipsFeature {
    pub fn new(term: VocabularyProperty, observed: bool) -> Self {
        Self {
            term,
            observed,
            ..Self::default()
        }
    }

    /// Reads `{"id", "label", "observed": "yes"|"no", "qualifiers": [..], "notes"}`.
    ///
    /// `observed` defaults to yes. Entries typed as something other than a phenotype, and
    /// entries with neither id nor label, are skipped.
    pub fn from_json(value: &Value, vocabulary: &VocabularyManager) -> Option<Self> {
        let obj = value.as_object()?;
        if json::text_at(obj, "type").is_some_and(|t| t != "phenotype") {
            return None;
        }
        let term = VocabularyProperty::from_json_object(obj, vocabulary)?;
        let observed = obj.get("observed").and_then(json::flag).unwrap_or(true);

        let mut feature = Self::new(term, observed);
        feature.notes = json::text_at(obj, "notes");
        if let Some(Value::Array(items)) = obj.get("qualifiers") {
            for item in items {
                let category = item.as_object().and_then(|q| json::text_at(q, "type"));
                let Some(category) = category else {
                    continue;
                };
                if let Some(qualifier) = VocabularyProperty::from_json(item, vocabulary) {
                    feature.add_qualifier(&category, qualifier);
                }
            }
        }
        Some(feature)
    }

    /// Merge key: the term id, or the label for free-text features.
    pub fn key(&self) -> String {
        self.term.storage_value()
    }

    pub fn term(&self) -> &VocabularyProperty {
        &self.term
    }

    pub fn id(&self) -> &str {
        self.term.id()
    }

    pub fn name(&self) -> Option<&str> {
        self.term.name()
    }

    pub fn is_observed(&self) -> bool {
        self.observed
    }

    /// True for features that did not resolve to a vocabulary term.
    pub fn is_nonstandard(&self) -> bool {
        !self.term.has_id()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.filter(|n| !n.trim().is_empty());
    }

    pub fn qualifiers(&self) -> &BTreeMap<String, Vec<VocabularyProperty>> {
        &self.qualifiers
    }

    pub fn add_qualifier(&mut self, category: &str, qualifier: VocabularyProperty) {
        let entries = self.qualifiers.entry(category.to_string()).or_default();
        if !entries.contains(&qualifier) {
            entries.push(qualifier);
        }
    }

    /// True if the feature carries qualifiers or notes.
    pub fn has_details(&self) -> bool {
        self.notes.is_some() || !self.qualifiers.is_empty()
    }

    /// Overlays `other`: its observation wins, its qualifier categories replace stored ones,
    /// and its notes replace stored notes when present.
    pub fn merge_data(&mut self, other: &PhenoTipsFeature) {
        self.observed = other.observed;
        if other.term.name().is_some() {
            self.term = other.term.clone();
        }
        for (category, qualifiers) in &other.qualifiers {
            self.qualifiers.insert(category.clone(), qualifiers.clone());
        }
        if other.notes.is_some() {
            self.notes = other.notes.clone();
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        self.term.write_json_fields(&mut obj);
        obj.insert("type".into(), json!("phenotype"));
        obj.insert(
            "observed".into(),
            json!(if self.observed { "yes" } else { "no" }),
        );
        let qualifiers: Vec<Value> = self
            .qualifiers
            .iter()
            .flat_map(|(category, entries)| {
                sorted_by_label(entries).into_iter().map(move |entry| {
                    let mut q = Map::new();
                    entry.write_json_fields(&mut q);
                    q.insert("type".into(), json!(category));
                    Value::Object(q)
                })
            })
            .collect();
        if !qualifiers.is_empty() {
            obj.insert("qualifiers".into(), Value::Array(qualifiers));
        }
        if let Some(notes) = &self.notes {
            obj.insert("notes".into(), json!(notes));
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::vocabulary;

    #[test]
    fn reads_observation_and_qualifiers() {
        let feature = PhenoTipsFeature::from_json(
            &json!({
                "id": "HP:0001250",
                "observed": "no",
                "qualifiers": [
                    {"id": "HP:0003593", "type": "age_of_onset"},
                    {"id": "HP:0003593"},
                ],
                "notes": "during fever only",
            }),
            &vocabulary(),
        )
        .unwrap();

        assert!(!feature.is_observed());
        assert_eq!(feature.name(), Some("Seizure"));
        assert_eq!(feature.qualifiers()["age_of_onset"].len(), 1);
        assert_eq!(
            feature.qualifiers()["age_of_onset"][0].name(),
            Some("Infantile onset")
        );
        assert_eq!(feature.notes(), Some("during fever only"));
    }

    #[test]
    fn free_text_features_are_nonstandard() {
        let payload = json!({"label": "Very long toes"});
        let feature = PhenoTipsFeature::from_json(&payload, &vocabulary()).unwrap();
        assert!(feature.is_observed());
        assert!(feature.is_nonstandard());
        assert_eq!(feature.key(), "Very long toes");
    }

    #[test]
    fn other_types_are_skipped() {
        assert!(PhenoTipsFeature::from_json(
            &json!({"id": "HP:0001250", "type": "prenatal_phenotype"}),
            &vocabulary()
        )
        .is_none());
    }

    #[test]
    fn json_lists_qualifiers_with_their_category() {
        let vocabulary = vocabulary();
        let mut feature =
            PhenoTipsFeature::new(VocabularyProperty::from_id("HP:0001250", &vocabulary), true);
        for id in ["HP:0003593", "HP:0003577"] {
            feature.add_qualifier("age_of_onset", VocabularyProperty::from_id(id, &vocabulary));
        }

        assert_eq!(
            feature.to_json(),
            json!({
                "id": "HP:0001250",
                "label": "Seizure",
                "type": "phenotype",
                "observed": "yes",
                "qualifiers": [
                    {"id": "HP:0003577", "label": "Congenital onset", "type": "age_of_onset"},
                    {"id": "HP:0003593", "label": "Infantile onset", "type": "age_of_onset"},
                ],
            })
        );
    }
}
