//! Facets mixing text, boolean-coded, numeric and vocabulary-code fields.

use crate::constants::{PARENTAL_INFORMATION_CLASS, PATIENT_CLASS};
use crate::controllers::{
    apply_field_writes, list_value, merge_lists, recover, report, text_value, FacetFields,
    FieldKind, FieldWrite, JsonLayout, PatientDataController, RecordFacts,
};
use crate::values::{sorted_by_label, VocabularyProperty};
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult};
use pheno_vocabulary::VocabularyManager;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub static FAMILY_HISTORY: FacetFields = FacetFields {
    name: "family_history",
    class: PATIENT_CLASS,
    layout: JsonLayout::Nested("family_history"),
    fields: &["consanguinity", "miscarriages", "affectedRelatives"],
    boolean_fields: &["consanguinity", "miscarriages", "affectedRelatives"],
    integer_fields: &[],
    code_fields: &[],
};

pub static PRENATAL_PERINATAL_HISTORY: FacetFields = FacetFields {
    name: "prenatal_perinatal_history",
    class: PATIENT_CLASS,
    layout: JsonLayout::Nested("prenatal_perinatal_history"),
    fields: &[
        "gestation",
        "twinNumber",
        "multipleGestation",
        "ivf",
        "icsi",
        "assistedReproduction_fertilityMeds",
        "assistedReproduction_iui",
        "assistedReproduction_surrogacy",
        "assistedReproduction_donoregg",
        "assistedReproduction_donorsperm",
    ],
    boolean_fields: &[
        "multipleGestation",
        "ivf",
        "icsi",
        "assistedReproduction_fertilityMeds",
        "assistedReproduction_iui",
        "assistedReproduction_surrogacy",
        "assistedReproduction_donoregg",
        "assistedReproduction_donorsperm",
    ],
    integer_fields: &["gestation"],
    code_fields: &[],
};

pub static GLOBAL_QUALIFIERS: FacetFields = FacetFields {
    name: "global_qualifiers",
    class: PATIENT_CLASS,
    layout: JsonLayout::Flat,
    fields: &["global_age_of_onset", "global_mode_of_inheritance"],
    boolean_fields: &[],
    integer_fields: &[],
    code_fields: &["global_age_of_onset", "global_mode_of_inheritance"],
};

pub static PARENTAL_INFORMATION: FacetFields = FacetFields {
    name: "parental_information",
    class: PARENTAL_INFORMATION_CLASS,
    layout: JsonLayout::Nested("parental_information"),
    fields: &["maternal_age", "paternal_age"],
    boolean_fields: &[],
    integer_fields: &["maternal_age", "paternal_age"],
    code_fields: &[],
};

/// One field value of a complex facet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComplexValue {
    /// Free text; empty clears.
    Text(String),
    /// A boolean-coded field; `None` is unknown and clears.
    Flag(Option<bool>),
    /// A whole number; `None` clears.
    Number(Option<i64>),
    /// Vocabulary references.
    Terms(Vec<VocabularyProperty>),
}

impl ComplexValue {
    fn to_field(&self) -> Option<FieldValue> {
        match self {
            ComplexValue::Text(text) => text_value(text),
            ComplexValue::Flag(flag) => flag.map(FieldValue::from),
            ComplexValue::Number(number) => number.map(FieldValue::Integer),
            ComplexValue::Terms(terms) => list_value(storage_ids(terms)),
        }
    }

    fn to_json(&self) -> Option<Value> {
        match self {
            ComplexValue::Text(text) if !text.trim().is_empty() => Some(json!(text)),
            ComplexValue::Flag(Some(flag)) => Some(json!(flag)),
            ComplexValue::Number(Some(number)) => Some(json!(number)),
            ComplexValue::Terms(terms) if !terms.is_empty() => Some(Value::Array(
                sorted_by_label(terms)
                    .into_iter()
                    .map(VocabularyProperty::to_json)
                    .collect(),
            )),
            _ => None,
        }
    }
}

fn storage_ids(terms: &[VocabularyProperty]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::with_capacity(terms.len());
    for id in terms.iter().map(VocabularyProperty::storage_value) {
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Maps a facet's text, boolean, numeric and code fields between the record and JSON.
///
/// Under MERGE, code fields are combined with the stored codes; every other field behaves as
/// under UPDATE.
#[derive(Clone, Debug)]
pub struct ComplexController {
    fields: &'static FacetFields,
    vocabulary: Arc<VocabularyManager>,
}

impl ComplexController {
    pub fn new(fields: &'static FacetFields, vocabulary: Arc<VocabularyManager>) -> Self {
        Self { fields, vocabulary }
    }

    pub fn family_history(vocabulary: Arc<VocabularyManager>) -> Self {
        Self::new(&FAMILY_HISTORY, vocabulary)
    }

    pub fn prenatal_perinatal_history(vocabulary: Arc<VocabularyManager>) -> Self {
        Self::new(&PRENATAL_PERINATAL_HISTORY, vocabulary)
    }

    pub fn global_qualifiers(vocabulary: Arc<VocabularyManager>) -> Self {
        Self::new(&GLOBAL_QUALIFIERS, vocabulary)
    }

    pub fn parental_information(vocabulary: Arc<VocabularyManager>) -> Self {
        Self::new(&PARENTAL_INFORMATION, vocabulary)
    }

    fn load_field(&self, field: &str, stored: FieldValue) -> Option<ComplexValue> {
        match self.fields.kind(field) {
            FieldKind::Boolean => stored.as_bool().map(|b| ComplexValue::Flag(Some(b))),
            FieldKind::Integer => stored.as_integer().map(|n| ComplexValue::Number(Some(n))),
            FieldKind::Code => {
                let terms: Vec<_> = stored
                    .to_list()
                    .iter()
                    .map(|id| VocabularyProperty::from_stored(id, &self.vocabulary))
                    .collect();
                (!terms.is_empty()).then_some(ComplexValue::Terms(terms))
            }
            FieldKind::Text => (!stored.is_empty()).then(|| ComplexValue::Text(stored.to_text())),
        }
    }

    fn read_field(&self, field: &str, value: &Value) -> ComplexValue {
        match self.fields.kind(field) {
            FieldKind::Boolean => ComplexValue::Flag(json::flag(value)),
            FieldKind::Integer => ComplexValue::Number(json::integer(value)),
            FieldKind::Code => ComplexValue::Terms(match value {
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| VocabularyProperty::from_json(item, &self.vocabulary))
                    .collect(),
                other => VocabularyProperty::from_json(other, &self.vocabulary)
                    .into_iter()
                    .collect(),
            }),
            FieldKind::Text => ComplexValue::Text(json::text(value).unwrap_or_default()),
        }
    }

    fn try_load(
        &self,
        record: &dyn RecordAccessor,
    ) -> StoreResult<Option<PatientData<ComplexValue>>> {
        let mut values = BTreeMap::new();
        for field in self.fields.fields {
            let loaded = record
                .get_field(self.fields.class, field)?
                .and_then(|stored| self.load_field(field, stored));
            if let Some(value) = loaded {
                values.insert(field.to_string(), value);
            }
        }
        Ok((!values.is_empty()).then(|| PatientData::named(self.fields.name, values)))
    }

    fn planned_writes(
        &self,
        record: &dyn RecordAccessor,
        data: Option<&PatientData<ComplexValue>>,
        policy: PatientWritePolicy,
    ) -> StoreResult<Vec<FieldWrite>> {
        let class = self.fields.class;
        let Some(data) = data else {
            return Ok(match policy {
                PatientWritePolicy::Replace => {
                    self.fields.fields.iter().map(|f| (class, *f, None)).collect()
                }
                _ => Vec::new(),
            });
        };

        let mut writes = Vec::new();
        for field in self.fields.fields {
            let Some(value) = data.get_named(field) else {
                if policy == PatientWritePolicy::Replace {
                    writes.push((class, *field, None));
                }
                continue;
            };
            let stored_value = match (policy, value) {
                (PatientWritePolicy::Merge, ComplexValue::Terms(terms)) => {
                    let stored = record
                        .get_field(class, field)?
                        .map(|v| v.to_list())
                        .unwrap_or_default();
                    list_value(merge_lists(stored, &storage_ids(terms)))
                }
                _ => value.to_field(),
            };
            writes.push((class, *field, stored_value));
        }
        Ok(writes)
    }
}

impl PatientDataController for ComplexController {
    type Value = ComplexValue;

    fn name(&self) -> &'static str {
        self.fields.name
    }

    fn json_keys(&self) -> Vec<&'static str> {
        self.fields.json_keys()
    }

    fn is_selected(&self, selection: Option<&FieldSelection>) -> bool {
        self.fields.is_selected(selection)
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<ComplexValue>> {
        recover(self.name(), record, self.try_load(record))
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<ComplexValue>>,
        policy: PatientWritePolicy,
        _facts: &RecordFacts,
    ) {
        let record_id = record.record_id().clone();
        let result = self
            .planned_writes(&*record, data, policy)
            .and_then(|writes| apply_field_writes(record, writes));
        report(self.name(), &record_id, result);
    }

    fn write_json(
        &self,
        data: &PatientData<ComplexValue>,
        json: &mut Map<String, Value>,
        selection: Option<&FieldSelection>,
    ) {
        let entries = data
            .named_iter()
            .filter(|(field, _)| {
                self.fields.owns(field) && self.fields.field_selected(selection, field)
            })
            .filter_map(|(field, value)| value.to_json().map(|v| (field.to_string(), v)))
            .collect();
        self.fields.emit(json, entries);
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<ComplexValue>> {
        let container = self.fields.container(json)?;
        let values: BTreeMap<String, ComplexValue> = self
            .fields
            .fields
            .iter()
            .filter_map(|field| {
                container
                    .get(*field)
                    .map(|value| (field.to_string(), self.read_field(field, value)))
            })
            .collect();
        (!values.is_empty()).then(|| PatientData::named(self.fields.name, values))
    }
}
