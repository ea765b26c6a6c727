//! Whether the case is solved, and by which publication and gene.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{
    apply_field_writes, list_value, merge_lists, recover, report, string_array, text_value,
    FieldWrite, PatientDataController, RecordFacts,
};
use crate::selection::field_selected;
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const JSON_KEY: &str = "solved";

const STATUS: &str = "status";
const PUBMED_ID: &str = "pubmed_id";
const GENE: &str = "gene";
const NOTES: &str = "notes";

const SOLVED: &str = "solved";
const UNSOLVED: &str = "unsolved";

/// JSON key and record field of each solved property.
const FIELDS: &[(&str, &str)] = &[
    (STATUS, "solved"),
    (PUBMED_ID, "solved__pubmed_id"),
    (GENE, "solved__gene_id"),
    (NOTES, "solved__notes"),
];

/// Reads one solved property from JSON; `Some(None)` is an explicit clear.
fn read_property(key: &str, value: &Value) -> Option<Option<FieldValue>> {
    if value.is_null() {
        return Some(None);
    }
    match key {
        STATUS => {
            let solved = match json::text(value).as_deref() {
                Some(SOLVED) => true,
                Some(UNSOLVED) => false,
                _ => json::flag(value)?,
            };
            Some(Some(FieldValue::from(solved)))
        }
        PUBMED_ID => {
            let ids = json::string_list(value);
            Some(list_value(ids))
        }
        _ => json::text(value).map(|text| text_value(&text)),
    }
}

fn property_json(key: &str, value: &FieldValue) -> Option<Value> {
    match key {
        STATUS => {
            let solved = value.as_bool()?;
            Some(Value::String(if solved { SOLVED } else { UNSOLVED }.into()))
        }
        PUBMED_ID => {
            let ids = value.to_list();
            (!ids.is_empty()).then(|| string_array(&ids))
        }
        _ => value.as_text().map(|text| Value::String(text.to_string())),
    }
}

/// Solved status. An incoming property set to `null` clears it; MERGE adds Pubmed ids to the
/// stored ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolvedController;

impl SolvedController {
    fn try_load(
        &self,
        record: &dyn RecordAccessor,
    ) -> StoreResult<Option<PatientData<Option<FieldValue>>>> {
        let mut values = BTreeMap::new();
        for &(key, field) in FIELDS {
            if let Some(value) = record.get_field(PATIENT_CLASS, field)? {
                if !value.is_empty() {
                    values.insert(key.to_string(), Some(value));
                }
            }
        }
        Ok((!values.is_empty()).then(|| PatientData::named(JSON_KEY, values)))
    }

    fn planned_writes(
        &self,
        record: &dyn RecordAccessor,
        data: Option<&PatientData<Option<FieldValue>>>,
        policy: PatientWritePolicy,
    ) -> StoreResult<Vec<FieldWrite>> {
        let mut writes = Vec::new();
        for &(key, field) in FIELDS {
            let value = match data.and_then(|d| d.get_named(key)) {
                Some(Some(FieldValue::List(ids))) if policy == PatientWritePolicy::Merge => {
                    let stored = record
                        .get_field(PATIENT_CLASS, field)?
                        .map(|v| v.to_list())
                        .unwrap_or_default();
                    list_value(merge_lists(stored, ids))
                }
                Some(value) => value.clone(),
                None if policy == PatientWritePolicy::Replace => None,
                None => continue,
            };
            writes.push((PATIENT_CLASS, field, value));
        }
        Ok(writes)
    }
}

impl PatientDataController for SolvedController {
    type Value = Option<FieldValue>;

    fn name(&self) -> &'static str {
        "solved"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<Option<FieldValue>>> {
        recover(self.name(), record, self.try_load(record))
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<Option<FieldValue>>>,
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
        data: &PatientData<Option<FieldValue>>,
        json: &mut Map<String, Value>,
        selection: Option<&FieldSelection>,
    ) {
        let entries: Map<String, Value> = FIELDS
            .iter()
            .filter(|(key, _)| field_selected(selection, self.name(), JSON_KEY, key))
            .filter_map(|&(key, _)| {
                let value = data.get_named(key)?.as_ref()?;
                property_json(key, value).map(|v| (key.to_string(), v))
            })
            .collect();
        if !entries.is_empty() {
            json.insert(JSON_KEY.to_string(), Value::Object(entries));
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<Option<FieldValue>>> {
        let container = json.get(JSON_KEY)?.as_object()?;
        let values: BTreeMap<String, Option<FieldValue>> = FIELDS
            .iter()
            .filter_map(|&(key, _)| {
                let value = read_property(key, container.get(key)?)?;
                Some((key.to_string(), value))
            })
            .collect();
        Some(PatientData::named(JSON_KEY, values))
    }
}
