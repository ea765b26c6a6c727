//! Whether the patient is alive.
//!
//! A recorded date of death implies the patient is deceased. That fact comes in through
//! [`RecordFacts`]; this facet never reads the date fields itself.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{recover, report, PatientDataController, RecordFacts};
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

const FIELD: &str = "life_status";
const JSON_KEY: &str = "life_status";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LifeStatus {
    #[default]
    Alive,
    Deceased,
}

impl LifeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LifeStatus::Alive => "alive",
            LifeStatus::Deceased => "deceased",
        }
    }
}

impl fmt::Display for LifeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alive" => Ok(LifeStatus::Alive),
            "deceased" => Ok(LifeStatus::Deceased),
            _ => Err(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LifeStatusController;

impl LifeStatusController {
    fn try_load(
        &self,
        record: &dyn RecordAccessor,
        facts: &RecordFacts,
    ) -> StoreResult<Option<PatientData<LifeStatus>>> {
        let stored = record
            .get_field(PATIENT_CLASS, FIELD)?
            .and_then(|v| v.to_text().parse::<LifeStatus>().ok())
            .unwrap_or_default();
        let status = if facts.date_of_death_known {
            LifeStatus::Deceased
        } else {
            stored
        };
        Ok(Some(PatientData::value(JSON_KEY, status)))
    }
}

impl PatientDataController for LifeStatusController {
    type Value = LifeStatus;

    fn name(&self) -> &'static str {
        "life_status"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY]
    }

    /// Always reports a status: `alive` unless the record says otherwise.
    fn load(
        &self,
        record: &dyn RecordAccessor,
        facts: &RecordFacts,
    ) -> Option<PatientData<LifeStatus>> {
        recover(self.name(), record, self.try_load(record, facts))
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<LifeStatus>>,
        policy: PatientWritePolicy,
        facts: &RecordFacts,
    ) {
        let value = match data.and_then(PatientData::value_ref) {
            Some(_) if facts.date_of_death_known => Some(LifeStatus::Deceased),
            Some(status) => Some(*status),
            None if policy == PatientWritePolicy::Replace => None,
            None => return,
        };
        let record_id = record.record_id().clone();
        let result = record.set_field(
            PATIENT_CLASS,
            FIELD,
            value.map(|status| FieldValue::from(status.as_str())),
        );
        report(self.name(), &record_id, result);
    }

    fn write_json(
        &self,
        data: &PatientData<LifeStatus>,
        json: &mut Map<String, Value>,
        _selection: Option<&FieldSelection>,
    ) {
        if let Some(status) = data.value_ref() {
            json.insert(JSON_KEY.to_string(), Value::String(status.to_string()));
        }
    }

    /// Unrecognised statuses read as absent.
    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<LifeStatus>> {
        let status = json::text(json.get(JSON_KEY)?)?.parse().ok()?;
        Some(PatientData::value(JSON_KEY, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pheno_store::PatientRecord;
    use serde_json::json;

    fn export(record: &PatientRecord, facts: &RecordFacts) -> Value {
        let controller = LifeStatusController;
        let mut json = Map::new();
        if let Some(data) = controller.load(record, facts) {
            controller.write_json(&data, &mut json, None);
        }
        Value::Object(json)
    }

    #[test]
    fn defaults_to_alive() {
        let record = PatientRecord::new();
        assert_eq!(
            export(&record, &RecordFacts::default()),
            json!({"life_status": "alive"})
        );
    }

    #[test]
    fn known_date_of_death_means_deceased() {
        let controller = LifeStatusController;
        let facts = RecordFacts {
            date_of_death_known: true,
        };
        let mut record = PatientRecord::new();

        let data = controller.read_json(json!({"life_status": "alive"}).as_object().unwrap());
        controller.save(&mut record, data.as_ref(), PatientWritePolicy::Update, &facts);

        assert_eq!(
            record.get_field(PATIENT_CLASS, FIELD).unwrap(),
            Some(FieldValue::from("deceased"))
        );
        assert_eq!(export(&record, &facts), json!({"life_status": "deceased"}));
    }

    #[test]
    fn unrecognised_status_is_ignored() {
        let controller = LifeStatusController;
        assert!(controller
            .read_json(json!({"life_status": "resting"}).as_object().unwrap())
            .is_none());
    }

    #[test]
    fn replace_without_data_clears_the_field() {
        let controller = LifeStatusController;
        let facts = RecordFacts::default();
        let mut record = PatientRecord::new();
        record
            .set_field(PATIENT_CLASS, FIELD, Some("deceased".into()))
            .unwrap();

        controller.save(&mut record, None, PatientWritePolicy::Replace, &facts);
        assert_eq!(record.get_field(PATIENT_CLASS, FIELD).unwrap(), None);
    }
}
