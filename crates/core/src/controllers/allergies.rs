//! Allergies, including "no known drug allergies".
//!
//! NKDA is stored as its own boolean field and travels in JSON as an `NKDA` entry of the
//! allergy list.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{
    apply_field_writes, list_value, merge_lists, recover, report, string_array, FieldWrite,
    PatientDataController, RecordFacts,
};
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult};
use serde_json::{Map, Value};

const ALLERGIES: &str = "allergies";
const NKDA_FIELD: &str = "NKDA";
const NKDA: &str = "NKDA";

fn is_nkda(entry: &str) -> bool {
    entry.trim().eq_ignore_ascii_case(NKDA)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AllergiesController;

impl AllergiesController {
    fn stored(&self, record: &dyn RecordAccessor) -> StoreResult<(bool, Vec<String>)> {
        let nkda = record
            .get_field(PATIENT_CLASS, NKDA_FIELD)?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let allergies = record
            .get_field(PATIENT_CLASS, ALLERGIES)?
            .map(|v| v.to_list())
            .unwrap_or_default();
        Ok((nkda, allergies))
    }

    fn try_load(&self, record: &dyn RecordAccessor) -> StoreResult<Option<PatientData<String>>> {
        let (nkda, allergies) = self.stored(record)?;
        let entries: Vec<String> = nkda
            .then(|| NKDA.to_string())
            .into_iter()
            .chain(allergies)
            .collect();
        Ok((!entries.is_empty()).then(|| PatientData::indexed(ALLERGIES, entries)))
    }

    fn planned_writes(
        &self,
        record: &dyn RecordAccessor,
        data: Option<&PatientData<String>>,
        policy: PatientWritePolicy,
    ) -> StoreResult<Vec<FieldWrite>> {
        let Some(data) = data else {
            return Ok(match policy {
                PatientWritePolicy::Replace => vec![
                    (PATIENT_CLASS, NKDA_FIELD, None),
                    (PATIENT_CLASS, ALLERGIES, None),
                ],
                _ => Vec::new(),
            });
        };

        let mut nkda = data.iter().any(|entry| is_nkda(entry));
        let mut allergies: Vec<String> = Vec::new();
        for entry in data.iter().filter(|entry| !is_nkda(entry)) {
            let entry = entry.trim();
            if !entry.is_empty() && !allergies.iter().any(|a| a == entry) {
                allergies.push(entry.to_string());
            }
        }

        if policy == PatientWritePolicy::Merge {
            let (stored_nkda, stored_allergies) = self.stored(record)?;
            nkda |= stored_nkda;
            allergies = merge_lists(stored_allergies, &allergies);
        }

        Ok(vec![
            (PATIENT_CLASS, NKDA_FIELD, nkda.then_some(FieldValue::from(true))),
            (PATIENT_CLASS, ALLERGIES, list_value(allergies)),
        ])
    }
}

impl PatientDataController for AllergiesController {
    type Value = String;

    fn name(&self) -> &'static str {
        "allergies"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![ALLERGIES]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<String>> {
        recover(self.name(), record, self.try_load(record))
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<String>>,
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
        data: &PatientData<String>,
        json: &mut Map<String, Value>,
        _selection: Option<&FieldSelection>,
    ) {
        if !data.is_empty() {
            json.insert(ALLERGIES.to_string(), string_array(data.iter()));
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<String>> {
        let entries = json::string_list(json.get(ALLERGIES)?);
        Some(PatientData::indexed(ALLERGIES, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pheno_store::PatientRecord;
    use serde_json::json;

    fn import(record: &mut PatientRecord, payload: Value, policy: PatientWritePolicy) {
        let controller = AllergiesController;
        let data = controller.read_json(payload.as_object().unwrap());
        controller.save(record, data.as_ref(), policy, &RecordFacts::default());
    }

    fn export(record: &PatientRecord) -> Value {
        let controller = AllergiesController;
        let mut json = Map::new();
        if let Some(data) = controller.load(record, &RecordFacts::default()) {
            controller.write_json(&data, &mut json, None);
        }
        Value::Object(json)
    }

    #[test]
    fn nkda_entry_is_stored_as_a_flag() {
        let mut record = PatientRecord::new();
        import(
            &mut record,
            json!({"allergies": ["nkda", "Latex", "Latex"]}),
            PatientWritePolicy::Update,
        );

        assert_eq!(
            record.get_field(PATIENT_CLASS, NKDA_FIELD).unwrap(),
            Some(FieldValue::Integer(1))
        );
        assert_eq!(
            record.get_field(PATIENT_CLASS, ALLERGIES).unwrap(),
            Some(FieldValue::List(vec!["Latex".into()]))
        );
        assert_eq!(export(&record), json!({"allergies": ["NKDA", "Latex"]}));
    }

    #[test]
    fn merge_unions_with_stored_allergies() {
        let mut record = PatientRecord::new();
        import(&mut record, json!({"allergies": ["Latex"]}), PatientWritePolicy::Update);
        import(
            &mut record,
            json!({"allergies": ["Penicillin"]}),
            PatientWritePolicy::Merge,
        );
        assert_eq!(export(&record), json!({"allergies": ["Latex", "Penicillin"]}));
    }

    #[test]
    fn empty_list_clears_under_update() {
        let mut record = PatientRecord::new();
        import(&mut record, json!({"allergies": ["NKDA"]}), PatientWritePolicy::Update);
        import(&mut record, json!({"allergies": []}), PatientWritePolicy::Update);
        assert_eq!(export(&record), json!({}));
    }
}
