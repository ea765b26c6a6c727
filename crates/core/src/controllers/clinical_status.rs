//! Whether the patient is clinically affected.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{recover, report, PatientDataController, RecordFacts};
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult};
use serde_json::{json, Map, Value};

const FIELD: &str = "unaffected";
const JSON_KEY: &str = "clinicalStatus";

#[derive(Clone, Copy, Debug, Default)]
pub struct ClinicalStatusController;

impl ClinicalStatusController {
    fn try_load(&self, record: &dyn RecordAccessor) -> StoreResult<Option<PatientData<bool>>> {
        Ok(record
            .get_field(PATIENT_CLASS, FIELD)?
            .and_then(|v| v.as_bool())
            .map(|unaffected| PatientData::value(JSON_KEY, unaffected)))
    }
}

impl PatientDataController for ClinicalStatusController {
    type Value = bool;

    fn name(&self) -> &'static str {
        "clinical_status"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<bool>> {
        recover(self.name(), record, self.try_load(record))
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<bool>>,
        policy: PatientWritePolicy,
        _facts: &RecordFacts,
    ) {
        let value = match data.and_then(PatientData::value_ref) {
            Some(unaffected) => Some(FieldValue::from(*unaffected)),
            None if policy == PatientWritePolicy::Replace => None,
            None => return,
        };
        let record_id = record.record_id().clone();
        report(self.name(), &record_id, record.set_field(PATIENT_CLASS, FIELD, value));
    }

    fn write_json(
        &self,
        data: &PatientData<bool>,
        json: &mut Map<String, Value>,
        _selection: Option<&FieldSelection>,
    ) {
        if let Some(unaffected) = data.value_ref() {
            json.insert(JSON_KEY.to_string(), json!({ "unaffected": unaffected }));
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<bool>> {
        let unaffected = json
            .get(JSON_KEY)?
            .as_object()?
            .get("unaffected")
            .and_then(json::flag)?;
        Some(PatientData::value(JSON_KEY, unaffected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pheno_store::PatientRecord;

    #[test]
    fn unaffected_flag_round_trips() {
        let controller = ClinicalStatusController;
        let facts = RecordFacts::default();
        let mut record = PatientRecord::new();

        let payload = json!({"clinicalStatus": {"unaffected": true}});
        let data = controller.read_json(payload.as_object().unwrap());
        controller.save(&mut record, data.as_ref(), PatientWritePolicy::Update, &facts);
        assert_eq!(
            record.get_field(PATIENT_CLASS, FIELD).unwrap(),
            Some(FieldValue::Integer(1))
        );

        let mut json = Map::new();
        controller.write_json(&controller.load(&record, &facts).unwrap(), &mut json, None);
        assert_eq!(Value::Object(json), payload);
    }

    #[test]
    fn unknown_stored_value_reports_nothing() {
        let controller = ClinicalStatusController;
        let mut record = PatientRecord::new();
        record
            .set_field(PATIENT_CLASS, FIELD, Some(FieldValue::Integer(5)))
            .unwrap();
        assert!(controller.load(&record, &RecordFacts::default()).is_none());
    }
}
