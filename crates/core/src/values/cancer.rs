//! Cancer diagnoses and their qualifiers.

use crate::json;
use crate::values::VocabularyProperty;
use pheno_vocabulary::VocabularyManager;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Side of the body a tumour was found on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Laterality {
    Left,
    Right,
    Bilateral,
    Unilateral,
}

impl Laterality {
    pub fn as_str(self) -> &'static str {
        match self {
            Laterality::Left => "l",
            Laterality::Right => "r",
            Laterality::Bilateral => "bi",
            Laterality::Unilateral => "u",
        }
    }
}

impl fmt::Display for Laterality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Laterality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "l" => Ok(Laterality::Left),
            "r" => Ok(Laterality::Right),
            "bi" => Ok(Laterality::Bilateral),
            "u" => Ok(Laterality::Unilateral),
            _ => Err(()),
        }
    }
}

/// One diagnosis of a cancer: when, where and whether it was the primary tumour.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhenoTipsCancerQualifier {
    pub cancer: Option<String>,
    pub age_at_diagnosis: Option<String>,
    pub numeric_age_at_diagnosis: Option<i64>,
    pub primary: Option<bool>,
    pub laterality: Option<Laterality>,
    pub notes: Option<String>,
}

impl PhenoTipsCancerQualifier {
    /// Reads a qualifier object. Unknown laterality values and malformed fields read as absent.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let qualifier = Self {
            cancer: json::text_at(obj, "cancer"),
            age_at_diagnosis: json::text_at(obj, "ageAtDiagnosis"),
            numeric_age_at_diagnosis: obj
                .get("numericAgeAtDiagnosis")
                .and_then(json::integer)
                .filter(|age| *age >= 0),
            primary: obj.get("primary").and_then(json::flag),
            laterality: json::text_at(obj, "laterality").and_then(|l| l.parse().ok()),
            notes: json::text_at(obj, "notes"),
        };
        (!qualifier.is_empty()).then_some(qualifier)
    }

    /// True if nothing beyond the cancer link is known.
    pub fn is_empty(&self) -> bool {
        self.age_at_diagnosis.is_none()
            && self.numeric_age_at_diagnosis.is_none()
            && self.primary.is_none()
            && self.laterality.is_none()
            && self.notes.is_none()
    }

    /// Overwrites fields with the non-null fields of `other`.
    pub fn merge_data(&mut self, other: &PhenoTipsCancerQualifier) {
        if other.cancer.is_some() {
            self.cancer = other.cancer.clone();
        }
        if other.age_at_diagnosis.is_some() {
            self.age_at_diagnosis = other.age_at_diagnosis.clone();
        }
        if other.numeric_age_at_diagnosis.is_some() {
            self.numeric_age_at_diagnosis = other.numeric_age_at_diagnosis;
        }
        if other.primary.is_some() {
            self.primary = other.primary;
        }
        if other.laterality.is_some() {
            self.laterality = other.laterality;
        }
        if other.notes.is_some() {
            self.notes = other.notes.clone();
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(cancer) = &self.cancer {
            obj.insert("cancer".into(), json!(cancer));
        }
        if let Some(age) = &self.age_at_diagnosis {
            obj.insert("ageAtDiagnosis".into(), json!(age));
        }
        if let Some(age) = self.numeric_age_at_diagnosis {
            obj.insert("numericAgeAtDiagnosis".into(), json!(age));
        }
        if let Some(primary) = self.primary {
            obj.insert("primary".into(), json!(primary));
        }
        if let Some(laterality) = self.laterality {
            obj.insert("laterality".into(), json!(laterality.as_str()));
        }
        if let Some(notes) = &self.notes {
            obj.insert("notes".into(), json!(notes));
        }
        Value::Object(obj)
    }
}

/// A cancer the patient has or is known not to have, with its diagnoses.
///
/// Entries are keyed by their term id, or by their label when the label did not resolve.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhenoTipsCancer {
    term: VocabularyProperty,
    affected: Option<bool>,
    qualifiers: Vec<PhenoTipsCancerQualifier>,
}

impl PhenoTipsCancer {
    pub fn new(term: VocabularyProperty, affected: Option<bool>) -> Self {
        Self {
            term,
            affected,
            qualifiers: Vec::new(),
        }
    }

    /// Reads `{"id", "label", "affected", "qualifiers": [..]}`.
    ///
    /// Entries with neither id nor label are skipped.
    pub fn from_json(value: &Value, vocabulary: &VocabularyManager) -> Option<Self> {
        let obj = value.as_object()?;
        let term = VocabularyProperty::from_json_object(obj, vocabulary)?;
        let mut cancer = Self::new(term, obj.get("affected").and_then(json::flag));
        let key = cancer.key();
        if let Some(Value::Array(items)) = obj.get("qualifiers") {
            for qualifier in items.iter().filter_map(PhenoTipsCancerQualifier::from_json) {
                cancer.add_qualifier(PhenoTipsCancerQualifier {
                    cancer: Some(key.clone()),
                    ..qualifier
                });
            }
        }
        Some(cancer)
    }

    /// Merge key: the term id, or the label for unresolved entries.
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

    pub fn affected(&self) -> Option<bool> {
        self.affected
    }

    pub fn qualifiers(&self) -> &[PhenoTipsCancerQualifier] {
        &self.qualifiers
    }

    /// Adds a qualifier unless an identical one is already present.
    pub fn add_qualifier(&mut self, qualifier: PhenoTipsCancerQualifier) {
        if !self.qualifiers.contains(&qualifier) {
            self.qualifiers.push(qualifier);
        }
    }

    /// Overwrites properties with the non-null properties of `other`; qualifiers are
    /// accumulated.
    pub fn merge_data(&mut self, other: &PhenoTipsCancer) {
        if other.term.has_id() {
            self.term = VocabularyProperty::new(
                other.term.id(),
                other.term.name().or(self.term.name()).map(str::to_string),
            );
        } else if let Some(name) = other.term.name() {
            self.term = VocabularyProperty::new(self.term.id(), Some(name.to_string()));
        }
        if other.affected.is_some() {
            self.affected = other.affected;
        }
        for qualifier in &other.qualifiers {
            self.add_qualifier(qualifier.clone());
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        self.term.write_json_fields(&mut obj);
        if let Some(affected) = self.affected {
            obj.insert("affected".into(), json!(affected));
        }
        if !self.qualifiers.is_empty() {
            obj.insert(
                "qualifiers".into(),
                Value::Array(self.qualifiers.iter().map(|q| q.to_json()).collect()),
            );
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::vocabulary;

    #[test]
    fn label_only_entries_resolve_their_id() {
        let payload = json!({"label": "Melanoma", "affected": true});
        let cancer = PhenoTipsCancer::from_json(&payload, &vocabulary()).unwrap();
        assert_eq!(cancer.id(), "HP:0002861");
        assert_eq!(cancer.key(), "HP:0002861");
        assert_eq!(cancer.affected(), Some(true));
    }

    #[test]
    fn unresolved_labels_become_the_key() {
        let cancer =
            PhenoTipsCancer::from_json(&json!({"label": "Odd tumour"}), &vocabulary()).unwrap();
        assert_eq!(cancer.id(), "");
        assert_eq!(cancer.key(), "Odd tumour");
    }

    #[test]
    fn qualifiers_are_linked_and_validated() {
        let cancer = PhenoTipsCancer::from_json(
            &json!({
                "id": "HP:0002861",
                "qualifiers": [
                    {"numericAgeAtDiagnosis": 41, "laterality": "bi", "primary": true},
                    {"laterality": "sideways"},
                    {"numericAgeAtDiagnosis": -3, "notes": "recurrence"},
                ],
            }),
            &vocabulary(),
        )
        .unwrap();

        let qualifiers = cancer.qualifiers();
        assert_eq!(qualifiers.len(), 2);
        assert_eq!(qualifiers[0].cancer.as_deref(), Some("HP:0002861"));
        assert_eq!(qualifiers[0].laterality, Some(Laterality::Bilateral));
        assert_eq!(qualifiers[1].numeric_age_at_diagnosis, None);
        assert_eq!(qualifiers[1].notes.as_deref(), Some("recurrence"));
    }

    #[test]
    fn merge_overwrites_known_fields_and_accumulates_qualifiers() {
        let vocabulary = vocabulary();
        let mut stored = PhenoTipsCancer::from_json(
            &json!({"id": "HP:0002861", "affected": true,
                    "qualifiers": [{"ageAtDiagnosis": "adult"}]}),
            &vocabulary,
        )
        .unwrap();
        let incoming = PhenoTipsCancer::from_json(
            &json!({"id": "HP:0002861",
                    "qualifiers": [{"ageAtDiagnosis": "adult"}, {"laterality": "l"}]}),
            &vocabulary,
        )
        .unwrap();

        stored.merge_data(&incoming);
        assert_eq!(stored.affected(), Some(true));
        assert_eq!(stored.name(), Some("Melanoma"));
        assert_eq!(stored.qualifiers().len(), 2);
    }

    #[test]
    fn qualifier_merge_keeps_unset_fields() {
        let mut stored = PhenoTipsCancerQualifier {
            age_at_diagnosis: Some("child".into()),
            primary: Some(true),
            ..Default::default()
        };
        stored.merge_data(&PhenoTipsCancerQualifier {
            primary: Some(false),
            notes: Some("second opinion".into()),
            ..Default::default()
        });
        assert_eq!(
            stored.to_json(),
            json!({"ageAtDiagnosis": "child", "primary": false, "notes": "second opinion"})
        );
    }
}
