//! Patient sex.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{recover, report, PatientDataController, RecordFacts};
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult};
use serde_json::{Map, Value};

const FIELD: &str = "gender";
const JSON_KEY: &str = "sex";
const UNKNOWN: &str = "U";

/// Normalises a sex code to `M`, `F`, `O` or `U`; anything unrecognised is `U`.
pub fn normalise_sex(value: &str) -> &'static str {
    match value.trim().to_ascii_uppercase().as_str() {
        "M" | "MALE" => "M",
        "F" | "FEMALE" => "F",
        "O" | "OTHER" => "O",
        _ => UNKNOWN,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SexController;

impl SexController {
    fn try_load(&self, record: &dyn RecordAccessor) -> StoreResult<Option<PatientData<String>>> {
        Ok(record
            .get_field(PATIENT_CLASS, FIELD)?
            .filter(|value| !value.is_empty())
            .map(|value| {
                PatientData::value(JSON_KEY, normalise_sex(&value.to_text()).to_string())
            }))
    }
}

impl PatientDataController for SexController {
    type Value = String;

    fn name(&self) -> &'static str {
        "sex"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY]
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
        let value = match data.and_then(PatientData::value_ref) {
            Some(sex) => Some(FieldValue::from(normalise_sex(sex))),
            None if policy == PatientWritePolicy::Replace => None,
            None => return,
        };
        let record_id = record.record_id().clone();
        report(self.name(), &record_id, record.set_field(PATIENT_CLASS, FIELD, value));
    }

    fn write_json(
        &self,
        data: &PatientData<String>,
        json: &mut Map<String, Value>,
        _selection: Option<&FieldSelection>,
    ) {
        if let Some(sex) = data.value_ref() {
            json.insert(JSON_KEY.to_string(), Value::String(sex.clone()));
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<String>> {
        let value = json.get(JSON_KEY)?;
        let sex = json::text(value).map_or(UNKNOWN, |s| normalise_sex(&s));
        Some(PatientData::value(JSON_KEY, sex.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pheno_store::PatientRecord;
    use serde_json::json;

    #[test]
    fn unrecognised_codes_become_unknown() {
        assert_eq!(normalise_sex("f"), "F");
        assert_eq!(normalise_sex(" male "), "M");
        assert_eq!(normalise_sex("X"), "U");
    }

    #[test]
    fn round_trips_through_the_gender_field() {
        let controller = SexController;
        let facts = RecordFacts::default();
        let mut record = PatientRecord::new();

        let data = controller.read_json(json!({"sex": "female"}).as_object().unwrap());
        controller.save(&mut record, data.as_ref(), PatientWritePolicy::Update, &facts);
        assert_eq!(
            record.get_field(PATIENT_CLASS, FIELD).unwrap(),
            Some(FieldValue::from("F"))
        );

        let mut json = Map::new();
        controller.write_json(&controller.load(&record, &facts).unwrap(), &mut json, None);
        assert_eq!(Value::Object(json), json!({"sex": "F"}));
    }

    #[test]
    fn absent_key_changes_nothing_unless_replacing() {
        let controller = SexController;
        let facts = RecordFacts::default();
        let mut record = PatientRecord::new();
        record
            .set_field(PATIENT_CLASS, FIELD, Some("M".into()))
            .unwrap();

        let data = controller.read_json(&Map::new());
        controller.save(&mut record, data.as_ref(), PatientWritePolicy::Merge, &facts);
        assert!(controller.load(&record, &facts).is_some());

        controller.save(&mut record, data.as_ref(), PatientWritePolicy::Replace, &facts);
        assert!(controller.load(&record, &facts).is_none());
    }
}
