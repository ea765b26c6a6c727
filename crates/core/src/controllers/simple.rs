//! Facets made of plain text fields.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{
    apply_field_writes, recover, report, text_value, FacetFields, FieldWrite, JsonLayout,
    PatientDataController, RecordFacts,
};
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{RecordAccessor, StoreResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Free-text clinical notes.
pub static NOTES: FacetFields = FacetFields {
    name: "notes",
    class: PATIENT_CLASS,
    layout: JsonLayout::Nested("notes"),
    fields: &[
        "indication_for_referral",
        "family_history_notes",
        "prenatal_development",
        "medical_history",
        "diagnosis_notes",
        "genetic_notes",
    ],
    boolean_fields: &[],
    integer_fields: &[],
    code_fields: &[],
};

/// The patient's identifier in the referring system.
pub static IDENTIFIERS: FacetFields = FacetFields {
    name: "identifiers",
    class: PATIENT_CLASS,
    layout: JsonLayout::Flat,
    fields: &["external_id"],
    boolean_fields: &[],
    integer_fields: &[],
    code_fields: &[],
};

/// Maps a fixed list of text fields one to one between the record and JSON.
#[derive(Clone, Copy, Debug)]
pub struct SimpleController {
    fields: &'static FacetFields,
}

impl SimpleController {
    pub fn new(fields: &'static FacetFields) -> Self {
        Self { fields }
    }

    pub fn notes() -> Self {
        Self::new(&NOTES)
    }

    pub fn identifiers() -> Self {
        Self::new(&IDENTIFIERS)
    }

    fn try_load(&self, record: &dyn RecordAccessor) -> StoreResult<Option<PatientData<String>>> {
        let mut values = BTreeMap::new();
        for field in self.fields.fields {
            if let Some(value) = record.get_field(self.fields.class, field)? {
                if !value.is_empty() {
                    values.insert(field.to_string(), value.to_text());
                }
            }
        }
        Ok((!values.is_empty()).then(|| PatientData::named(self.fields.name, values)))
    }

    fn planned_writes(
        &self,
        data: Option<&PatientData<String>>,
        policy: PatientWritePolicy,
    ) -> Vec<FieldWrite> {
        let class = self.fields.class;
        match (data, policy) {
            (None, PatientWritePolicy::Replace) => {
                self.fields.fields.iter().map(|f| (class, *f, None)).collect()
            }
            (None, _) => Vec::new(),
            (Some(data), PatientWritePolicy::Replace) => self
                .fields
                .fields
                .iter()
                .map(|f| (class, *f, data.get_named(f).and_then(|v| text_value(v))))
                .collect(),
            (Some(data), _) => self
                .fields
                .fields
                .iter()
                .filter_map(|f| data.get_named(f).map(|v| (class, *f, text_value(v))))
                .collect(),
        }
    }
}

impl PatientDataController for SimpleController {
    type Value = String;

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
        let writes = self.planned_writes(data, policy);
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
        let entries = data
            .named_iter()
            .filter(|(field, value)| {
                self.fields.owns(field)
                    && !value.trim().is_empty()
                    && self.fields.field_selected(selection, field)
            })
            .map(|(field, value)| (field.to_string(), Value::String(value.clone())))
            .collect();
        self.fields.emit(json, entries);
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<String>> {
        let container = self.fields.container(json)?;
        let values: BTreeMap<String, String> = self
            .fields
            .fields
            .iter()
            .filter_map(|field| {
                container
                    .get(*field)
                    .map(|value| (field.to_string(), json::text(value).unwrap_or_default()))
            })
            .collect();
        (!values.is_empty()).then(|| PatientData::named(self.fields.name, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FailingRecord;
    use pheno_store::{FieldValue, PatientRecord};
    use serde_json::json;

    fn notes_data() -> PatientData<String> {
        PatientData::named(
            "notes",
            NOTES
                .fields
                .iter()
                .map(|f| (f.to_string(), format!("{f} text")))
                .collect(),
        )
    }

    #[test]
    fn update_round_trip_reproduces_the_data() {
        let controller = SimpleController::notes();
        let facts = RecordFacts::default();
        let mut record = PatientRecord::new();
        let data = notes_data();

        controller.save(&mut record, Some(&data), PatientWritePolicy::Update, &facts);
        let loaded = controller.load(&record, &facts).expect("notes stored");
        let mut json = Map::new();
        controller.write_json(&loaded, &mut json, None);
        let read = controller.read_json(&json).expect("notes in json");

        assert_eq!(read, data);
    }

    #[test]
    fn update_only_touches_fields_present_in_the_data() {
        let controller = SimpleController::notes();
        let facts = RecordFacts::default();
        let mut record = PatientRecord::new();
        record
            .set_field(PATIENT_CLASS, "medical_history", Some("asthma".into()))
            .unwrap();

        let data = PatientData::named(
            "notes",
            BTreeMap::from([("genetic_notes".to_string(), "karyotype normal".to_string())]),
        );
        controller.save(&mut record, Some(&data), PatientWritePolicy::Update, &facts);

        assert_eq!(
            record.get_field(PATIENT_CLASS, "medical_history").unwrap(),
            Some(FieldValue::from("asthma"))
        );
        assert_eq!(
            record.get_field(PATIENT_CLASS, "genetic_notes").unwrap(),
            Some(FieldValue::from("karyotype normal"))
        );
    }

    #[test]
    fn replace_without_data_clears_every_owned_field() {
        let controller = SimpleController::notes();
        let facts = RecordFacts::default();
        let mut record = PatientRecord::new();
        controller.save(&mut record, Some(&notes_data()), PatientWritePolicy::Update, &facts);
        record
            .set_field(PATIENT_CLASS, "gender", Some("F".into()))
            .unwrap();

        controller.save(&mut record, None, PatientWritePolicy::Replace, &facts);

        for field in NOTES.fields {
            assert_eq!(record.get_field(PATIENT_CLASS, field).unwrap(), None);
        }
        assert!(controller.load(&record, &facts).is_none());
        assert_eq!(
            record.get_field(PATIENT_CLASS, "gender").unwrap(),
            Some(FieldValue::from("F"))
        );
    }

    #[test]
    fn null_in_json_clears_under_update() {
        let controller = SimpleController::notes();
        let facts = RecordFacts::default();
        let mut record = PatientRecord::new();
        controller.save(&mut record, Some(&notes_data()), PatientWritePolicy::Update, &facts);

        let payload = json!({"notes": {"diagnosis_notes": null}});
        let data = controller.read_json(payload.as_object().unwrap());
        controller.save(&mut record, data.as_ref(), PatientWritePolicy::Update, &facts);

        assert_eq!(record.get_field(PATIENT_CLASS, "diagnosis_notes").unwrap(), None);
        assert!(record.get_field(PATIENT_CLASS, "genetic_notes").unwrap().is_some());
    }

    #[test]
    fn flat_identifier_is_emitted_at_top_level() {
        let controller = SimpleController::identifiers();
        let facts = RecordFacts::default();
        let mut record = PatientRecord::new();

        let payload = json!({"external_id": "P0042", "notes": {}});
        let data = controller.read_json(payload.as_object().unwrap());
        controller.save(&mut record, data.as_ref(), PatientWritePolicy::Update, &facts);

        let mut json = Map::new();
        controller.write_json(&controller.load(&record, &facts).unwrap(), &mut json, None);
        assert_eq!(Value::Object(json), json!({"external_id": "P0042"}));
    }

    #[test]
    fn field_selection_filters_inside_the_container() {
        let controller = SimpleController::notes();
        let selection = FieldSelection::new(["genetic_notes"]);
        let mut json = Map::new();
        controller.write_json(&notes_data(), &mut json, Some(&selection));
        assert_eq!(
            Value::Object(json),
            json!({"notes": {"genetic_notes": "genetic_notes text"}})
        );
    }

    #[test]
    fn failing_reads_load_nothing() {
        let controller = SimpleController::notes();
        let mut inner = PatientRecord::new();
        inner
            .set_field(PATIENT_CLASS, "medical_history", Some("asthma".into()))
            .unwrap();
        let record = FailingRecord::reads(inner);
        assert!(controller.load(&record, &RecordFacts::default()).is_none());
    }
}
