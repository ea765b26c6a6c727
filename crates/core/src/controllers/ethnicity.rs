//! Maternal and paternal ethnicities.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{
    apply_field_writes, list_value, merge_lists, recover, report, string_array, FieldWrite,
    PatientDataController, RecordFacts,
};
use crate::selection::field_selected;
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{RecordAccessor, StoreResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const JSON_KEY: &str = "ethnicity";
const FIELDS: &[&str] = &["maternal_ethnicity", "paternal_ethnicity"];

/// Lists of ethnicities per parent. MERGE adds to the stored lists.
#[derive(Clone, Copy, Debug, Default)]
pub struct EthnicityController;

impl EthnicityController {
    fn try_load(
        &self,
        record: &dyn RecordAccessor,
    ) -> StoreResult<Option<PatientData<Vec<String>>>> {
        let mut values = BTreeMap::new();
        for &field in FIELDS {
            let items = record
                .get_field(PATIENT_CLASS, field)?
                .map(|v| v.to_list())
                .unwrap_or_default();
            if !items.is_empty() {
                values.insert(field.to_string(), items);
            }
        }
        Ok((!values.is_empty()).then(|| PatientData::named(JSON_KEY, values)))
    }

    fn planned_writes(
        &self,
        record: &dyn RecordAccessor,
        data: Option<&PatientData<Vec<String>>>,
        policy: PatientWritePolicy,
    ) -> StoreResult<Vec<FieldWrite>> {
        let mut writes = Vec::new();
        for &field in FIELDS {
            let incoming = data.and_then(|d| d.get_named(field));
            let items = match (incoming, policy) {
                (None, PatientWritePolicy::Replace) => Vec::new(),
                (None, _) => continue,
                (Some(items), PatientWritePolicy::Merge) => {
                    let stored = record
                        .get_field(PATIENT_CLASS, field)?
                        .map(|v| v.to_list())
                        .unwrap_or_default();
                    merge_lists(stored, items)
                }
                (Some(items), _) => items.clone(),
            };
            writes.push((PATIENT_CLASS, field, list_value(items)));
        }
        Ok(writes)
    }
}

impl PatientDataController for EthnicityController {
    type Value = Vec<String>;

    fn name(&self) -> &'static str {
        "ethnicity"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<Vec<String>>> {
        recover(self.name(), record, self.try_load(record))
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<Vec<String>>>,
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
        data: &PatientData<Vec<String>>,
        json: &mut Map<String, Value>,
        selection: Option<&FieldSelection>,
    ) {
        let entries: Map<String, Value> = data
            .named_iter()
            .filter(|(field, items)| {
                !items.is_empty() && field_selected(selection, self.name(), JSON_KEY, field)
            })
            .map(|(field, items)| (field.to_string(), string_array(items)))
            .collect();
        if !entries.is_empty() {
            json.insert(JSON_KEY.to_string(), Value::Object(entries));
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<Vec<String>>> {
        let container = json.get(JSON_KEY)?.as_object()?;
        let values: BTreeMap<String, Vec<String>> = FIELDS
            .iter()
            .filter_map(|&field| {
                container
                    .get(field)
                    .map(|value| (field.to_string(), json::string_list(value)))
            })
            .collect();
        (!values.is_empty()).then(|| PatientData::named(JSON_KEY, values))
    }
}
