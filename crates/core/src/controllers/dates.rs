//! Birth, death and examination dates.
//!
//! Each date occupies two fields: the earliest calendar date it can stand for (used for
//! sorting and queries) and `<field>_entered`, the fuzzy date as it was entered, kept as JSON
//! text so that precision survives a round trip.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{
    apply_field_writes, recover, report, FieldWrite, PatientDataController, RecordFacts,
};
use crate::selection::field_selected;
use crate::values::PhenoTipsDate;
use crate::{FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DATE_OF_BIRTH: &str = "date_of_birth";
pub const DATE_OF_DEATH: &str = "date_of_death";
pub const EXAM_DATE: &str = "exam_date";

const FIELDS: &[(&str, &str)] = &[
    (DATE_OF_BIRTH, "date_of_birth_entered"),
    (DATE_OF_DEATH, "date_of_death_entered"),
    (EXAM_DATE, "exam_date_entered"),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct DatesController;

impl DatesController {
    /// True if the record stores a date of death. Unreadable records count as no.
    pub fn stored_date_of_death_known(record: &dyn RecordAccessor) -> bool {
        match Self::read_date(record, DATE_OF_DEATH, "date_of_death_entered") {
            Ok(date) => date.is_set(),
            Err(e) => {
                tracing::warn!(
                    "failed to read date of death for record {}: {}",
                    record.record_id(),
                    e
                );
                false
            }
        }
    }

    /// Whether an incoming payload sets a date of death; `None` if it does not mention one.
    pub fn payload_date_of_death_known(json: &Map<String, Value>) -> Option<bool> {
        json.get(DATE_OF_DEATH)
            .map(|value| PhenoTipsDate::from_json(value).is_set())
    }

    fn read_date(
        record: &dyn RecordAccessor,
        field: &'static str,
        entered: &'static str,
    ) -> StoreResult<PhenoTipsDate> {
        let from_entered = record
            .get_field(PATIENT_CLASS, entered)?
            .and_then(|v| v.as_text().map(PhenoTipsDate::from_json_string))
            .filter(PhenoTipsDate::is_set);
        if let Some(date) = from_entered {
            return Ok(date);
        }
        Ok(PhenoTipsDate::from_date(
            record
                .get_field(PATIENT_CLASS, field)?
                .and_then(|v| v.as_date()),
        ))
    }

    fn try_load(
        &self,
        record: &dyn RecordAccessor,
    ) -> StoreResult<Option<PatientData<PhenoTipsDate>>> {
        let mut dates = BTreeMap::new();
        for &(field, entered) in FIELDS {
            let date = Self::read_date(record, field, entered)?;
            if date.is_set() {
                dates.insert(field.to_string(), date);
            }
        }
        Ok((!dates.is_empty()).then(|| PatientData::named(self.name(), dates)))
    }

    fn date_writes(
        field: &'static str,
        entered: &'static str,
        date: Option<&PhenoTipsDate>,
    ) -> [FieldWrite; 2] {
        let date = date.filter(|d| d.is_set());
        [
            (
                PATIENT_CLASS,
                field,
                date.and_then(PhenoTipsDate::to_earliest_possible_iso_date)
                    .map(FieldValue::Date),
            ),
            (
                PATIENT_CLASS,
                entered,
                date.map(|d| FieldValue::Text(d.to_json().to_string())),
            ),
        ]
    }
}

impl PatientDataController for DatesController {
    type Value = PhenoTipsDate;

    fn name(&self) -> &'static str {
        "dates"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        FIELDS.iter().map(|(field, _)| *field).collect()
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<PhenoTipsDate>> {
        recover(self.name(), record, self.try_load(record))
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<PhenoTipsDate>>,
        policy: PatientWritePolicy,
        _facts: &RecordFacts,
    ) {
        let mut writes = Vec::new();
        for &(field, entered) in FIELDS {
            let incoming = data.and_then(|d| d.get_named(field));
            if incoming.is_some() || policy == PatientWritePolicy::Replace {
                writes.extend(Self::date_writes(field, entered, incoming));
            }
        }
        if writes.is_empty() {
            return;
        }
        let record_id = record.record_id().clone();
        report(self.name(), &record_id, apply_field_writes(record, writes));
    }

    fn write_json(
        &self,
        data: &PatientData<PhenoTipsDate>,
        json: &mut Map<String, Value>,
        selection: Option<&FieldSelection>,
    ) {
        for (field, date) in data.named_iter() {
            if date.is_set() && field_selected(selection, self.name(), field, field) {
                json.insert(field.to_string(), date.to_json());
            }
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<PhenoTipsDate>> {
        let dates: BTreeMap<String, PhenoTipsDate> = FIELDS
            .iter()
            .filter_map(|(field, _)| {
                json.get(*field)
                    .map(|value| (field.to_string(), PhenoTipsDate::from_json(value)))
            })
            .collect();
        (!dates.is_empty()).then(|| PatientData::named(self.name(), dates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pheno_store::PatientRecord;
    use serde_json::json;

    fn import(record: &mut PatientRecord, payload: Value, policy: PatientWritePolicy) {
        let controller = DatesController;
        let data = controller.read_json(payload.as_object().unwrap());
        controller.save(record, data.as_ref(), policy, &RecordFacts::default());
    }

    fn export(record: &PatientRecord) -> Value {
        let controller = DatesController;
        let mut json = Map::new();
        if let Some(data) = controller.load(record, &RecordFacts::default()) {
            controller.write_json(&data, &mut json, None);
        }
        Value::Object(json)
    }

    #[test]
    fn stores_earliest_date_and_keeps_entered_precision() {
        let mut record = PatientRecord::new();
        import(
            &mut record,
            json!({"date_of_birth": {"year": 1990, "range": {"years": 10}}}),
            PatientWritePolicy::Update,
        );

        assert_eq!(
            record.get_field(PATIENT_CLASS, DATE_OF_BIRTH).unwrap(),
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()))
        );
        assert_eq!(
            export(&record),
            json!({"date_of_birth": {"year": 1990, "range": {"years": 10}}})
        );
    }

    #[test]
    fn falls_back_to_the_calendar_field() {
        let mut record = PatientRecord::new();
        record
            .set_field(
                PATIENT_CLASS,
                EXAM_DATE,
                Some(FieldValue::Date(NaiveDate::from_ymd_opt(2015, 3, 2).unwrap())),
            )
            .unwrap();

        assert_eq!(
            export(&record),
            json!({"exam_date": {"year": 2015, "month": 3, "day": 2}})
        );
    }

    #[test]
    fn empty_date_clears_both_fields() {
        let mut record = PatientRecord::new();
        import(&mut record, json!({"date_of_death": "2001-07"}), PatientWritePolicy::Update);
        assert!(DatesController::stored_date_of_death_known(&record));

        import(&mut record, json!({"date_of_death": null}), PatientWritePolicy::Update);
        assert_eq!(record.get_field(PATIENT_CLASS, DATE_OF_DEATH).unwrap(), None);
        assert_eq!(
            record.get_field(PATIENT_CLASS, "date_of_death_entered").unwrap(),
            None
        );
        assert!(!DatesController::stored_date_of_death_known(&record));
    }

    #[test]
    fn replace_clears_dates_missing_from_the_payload() {
        let mut record = PatientRecord::new();
        import(
            &mut record,
            json!({"date_of_birth": "1980-02-03", "exam_date": "2010"}),
            PatientWritePolicy::Update,
        );
        import(&mut record, json!({"exam_date": "2011"}), PatientWritePolicy::Replace);

        assert_eq!(export(&record), json!({"exam_date": {"year": 2011}}));
    }

    #[test]
    fn payload_date_of_death_is_reported_only_when_mentioned() {
        let with = json!({"date_of_death": {"year": 2020}});
        let cleared = json!({"date_of_death": {}});
        assert_eq!(
            DatesController::payload_date_of_death_known(with.as_object().unwrap()),
            Some(true)
        );
        assert_eq!(
            DatesController::payload_date_of_death_known(cleared.as_object().unwrap()),
            Some(false)
        );
        assert_eq!(DatesController::payload_date_of_death_known(&Map::new()), None);
    }
}
