//! Apgar scores at one and five minutes.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{
    apply_field_writes, recover, report, FieldWrite, PatientDataController, RecordFacts,
};
use crate::selection::field_selected;
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const JSON_KEY: &str = "apgar";
const FIELDS: &[&str] = &["apgar1", "apgar5"];
const UNKNOWN: &str = "unknown";
const MAX_SCORE: i64 = 10;

/// Normalises a score to `"unknown"` or `"0"`..`"10"`; anything else is invalid.
fn normalise_score(value: &Value) -> Option<String> {
    if let Some(score) = json::integer(value) {
        return (0..=MAX_SCORE).contains(&score).then(|| score.to_string());
    }
    json::text(value)
        .filter(|s| s.eq_ignore_ascii_case(UNKNOWN))
        .map(|_| UNKNOWN.to_string())
}

/// Scores stored as text, exposed as numbers (or `"unknown"`).
#[derive(Clone, Copy, Debug, Default)]
pub struct ApgarController;

impl ApgarController {
    fn try_load(&self, record: &dyn RecordAccessor) -> StoreResult<Option<PatientData<String>>> {
        let mut values = BTreeMap::new();
        for &field in FIELDS {
            let score = record
                .get_field(PATIENT_CLASS, field)?
                .and_then(|v| normalise_score(&Value::String(v.to_text())));
            if let Some(score) = score {
                values.insert(field.to_string(), score);
            }
        }
        Ok((!values.is_empty()).then(|| PatientData::named(JSON_KEY, values)))
    }
}

impl PatientDataController for ApgarController {
    type Value = String;

    fn name(&self) -> &'static str {
        "apgar"
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
        let writes: Vec<FieldWrite> = FIELDS
            .iter()
            .filter_map(|&field| match data.and_then(|d| d.get_named(field)) {
                Some(score) if score.is_empty() => Some((PATIENT_CLASS, field, None)),
                Some(score) => Some((PATIENT_CLASS, field, Some(FieldValue::from(score.as_str())))),
                None if policy == PatientWritePolicy::Replace => Some((PATIENT_CLASS, field, None)),
                None => None,
            })
            .collect();
        if writes.is_empty() {
            return;
        }
        let record_id = record.record_id().clone();
        report(self.name(), &record_id, apply_field_writes(record, writes));
    }

    fn write_json(
        &self,
        data: &PatientData<String>,
        json: &mut Map<String, Value>,
        selection: Option<&FieldSelection>,
    ) {
        let entries: Map<String, Value> = data
            .named_iter()
            .filter(|(field, _)| field_selected(selection, self.name(), JSON_KEY, field))
            .filter_map(|(field, score)| {
                let value = match score.parse::<i64>() {
                    Ok(number) => Value::from(number),
                    Err(_) if score == UNKNOWN => Value::String(UNKNOWN.into()),
                    Err(_) => return None,
                };
                Some((field.to_string(), value))
            })
            .collect();
        if !entries.is_empty() {
            json.insert(JSON_KEY.to_string(), Value::Object(entries));
        }
    }

    /// `null` clears a score; invalid scores are ignored.
    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<String>> {
        let container = json.get(JSON_KEY)?.as_object()?;
        let values: BTreeMap<String, String> = FIELDS
            .iter()
            .filter_map(|&field| {
                let value = container.get(field)?;
                let score = if value.is_null() {
                    String::new()
                } else {
                    normalise_score(value)?
                };
                Some((field.to_string(), score))
            })
            .collect();
        (!values.is_empty()).then(|| PatientData::named(JSON_KEY, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pheno_store::PatientRecord;
    use serde_json::json;

    fn round_trip(record: &mut PatientRecord, payload: Value) -> Value {
        let controller = ApgarController;
        let facts = RecordFacts::default();
        let data = controller.read_json(payload.as_object().unwrap());
        controller.save(record, data.as_ref(), PatientWritePolicy::Update, &facts);

        let mut json = Map::new();
        if let Some(data) = controller.load(record, &facts) {
            controller.write_json(&data, &mut json, None);
        }
        Value::Object(json)
    }

    #[test]
    fn scores_are_numbers_or_unknown() {
        let mut record = PatientRecord::new();
        assert_eq!(
            round_trip(&mut record, json!({"apgar": {"apgar1": "7", "apgar5": "UNKNOWN"}})),
            json!({"apgar": {"apgar1": 7, "apgar5": "unknown"}})
        );
        assert_eq!(
            record.get_field(PATIENT_CLASS, "apgar1").unwrap(),
            Some(FieldValue::from("7"))
        );
    }

    #[test]
    fn out_of_range_scores_are_ignored() {
        let mut record = PatientRecord::new();
        assert_eq!(
            round_trip(&mut record, json!({"apgar": {"apgar1": 11, "apgar5": 9}})),
            json!({"apgar": {"apgar5": 9}})
        );
    }

    #[test]
    fn null_clears_a_score() {
        let mut record = PatientRecord::new();
        round_trip(&mut record, json!({"apgar": {"apgar1": 3, "apgar5": 8}}));
        assert_eq!(
            round_trip(&mut record, json!({"apgar": {"apgar1": null}})),
            json!({"apgar": {"apgar5": 8}})
        );
    }
}
