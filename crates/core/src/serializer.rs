//! Whole-record JSON export and import.
//!
//! The [`PatientSerializer`] runs every registered facet controller over one record, in a
//! fixed order. Facts that several facets depend on are worked out once per call and handed to
//! every facet as [`RecordFacts`].

use crate::constants::{JSON_ID_KEY, JSON_LAST_MODIFIED_KEY};
use crate::controllers::{
    AllergiesController, ApgarController, CancersController, ClinicalStatusController,
    ComplexController, ConsentsController, DatesController, DisordersController,
    EthnicityController, Facet, FeaturesController, GenesController, LifeStatusController,
    RecordFacts, RepeatedGroupController, SexController, SimpleController, SolvedController,
};
use crate::{
    FieldSelection, PatientConsentManager, PatientDataError, PatientDataResult,
    PatientWritePolicy,
};
use chrono::SecondsFormat;
use pheno_store::RecordAccessor;
use pheno_vocabulary::VocabularyManager;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Converts patient records to and from their JSON form.
pub struct PatientSerializer {
    facets: Vec<Box<dyn Facet>>,
}

impl PatientSerializer {
    /// Registers every facet controller.
    pub fn new(vocabulary: Arc<VocabularyManager>, consents: Arc<PatientConsentManager>) -> Self {
        let facets: Vec<Box<dyn Facet>> = vec![
            Box::new(SimpleController::identifiers()),
            Box::new(SexController),
            Box::new(DatesController),
            Box::new(LifeStatusController),
            Box::new(SimpleController::notes()),
            Box::new(ComplexController::family_history(Arc::clone(&vocabulary))),
            Box::new(ComplexController::prenatal_perinatal_history(Arc::clone(
                &vocabulary,
            ))),
            Box::new(ComplexController::parental_information(Arc::clone(
                &vocabulary,
            ))),
            Box::new(ComplexController::global_qualifiers(Arc::clone(&vocabulary))),
            Box::new(EthnicityController),
            Box::new(ApgarController),
            Box::new(ClinicalStatusController),
            Box::new(AllergiesController),
            Box::new(FeaturesController::new(Arc::clone(&vocabulary))),
            Box::new(DisordersController::new(Arc::clone(&vocabulary))),
            Box::new(GenesController::new(Arc::clone(&vocabulary))),
            Box::new(RepeatedGroupController::variants()),
            Box::new(RepeatedGroupController::labeled_eids()),
            Box::new(CancersController::new(vocabulary)),
            Box::new(SolvedController),
            Box::new(ConsentsController::new(consents)),
        ];
        Self { facets }
    }

    /// Names of the registered facets, in the order they run.
    pub fn facet_names(&self) -> Vec<&'static str> {
        self.facets.iter().map(|f| f.facet_name()).collect()
    }

    pub fn facet(&self, name: &str) -> Option<&dyn Facet> {
        self.facets
            .iter()
            .find(|f| f.facet_name() == name)
            .map(|f| &**f)
    }

    /// Exports a record. Without a selection every facet is included; facets with nothing to
    /// report contribute no keys.
    pub fn to_json(
        &self,
        record: &dyn RecordAccessor,
        selection: Option<&FieldSelection>,
    ) -> Value {
        let facts = RecordFacts {
            date_of_death_known: DatesController::stored_date_of_death_known(record),
        };

        let mut json = Map::new();
        json.insert(
            JSON_ID_KEY.to_string(),
            Value::String(record.record_id().to_string()),
        );
        if let Some(modified) = record.last_modified() {
            json.insert(
                JSON_LAST_MODIFIED_KEY.to_string(),
                Value::String(modified.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }
        for facet in &self.facets {
            facet.export_json(record, &facts, &mut json, selection);
        }
        Value::Object(json)
    }

    /// Applies a patient JSON object to a record under `policy`.
    ///
    /// Facets the payload does not mention are left alone, except under
    /// [`PatientWritePolicy::Replace`] where they are cleared. Failures inside a facet are
    /// logged and skip that facet only.
    ///
    /// # Errors
    ///
    /// Returns [`PatientDataError::NotAnObject`] if `json` is not a JSON object.
    pub fn update_from_json(
        &self,
        record: &mut dyn RecordAccessor,
        json: &Value,
        policy: PatientWritePolicy,
    ) -> PatientDataResult<()> {
        let json = json.as_object().ok_or(PatientDataError::NotAnObject)?;
        let payload_fact = DatesController::payload_date_of_death_known(json);
        let date_of_death_known = match policy {
            PatientWritePolicy::Replace => payload_fact.unwrap_or(false),
            _ => payload_fact
                .unwrap_or_else(|| DatesController::stored_date_of_death_known(&*record)),
        };
        let facts = RecordFacts {
            date_of_death_known,
        };
        tracing::debug!(
            "applying patient JSON to record {} with policy {}",
            record.record_id(),
            policy
        );
        for facet in &self.facets {
            facet.import_json(record, json, policy, &facts);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consent::{ConsentDefinition, StaticConsentSource};
    use crate::test_support::vocabulary;
    use pheno_store::PatientRecord;
    use serde_json::json;

    fn serializer() -> PatientSerializer {
        let consents = PatientConsentManager::new(StaticConsentSource::new(vec![
            ConsentDefinition::new("real_consent", "Data is real").required(),
        ]));
        PatientSerializer::new(vocabulary(), Arc::new(consents))
    }

    fn without_header(mut json: Value) -> Value {
        if let Some(obj) = json.as_object_mut() {
            obj.remove(JSON_ID_KEY);
            obj.remove(JSON_LAST_MODIFIED_KEY);
        }
        json
    }

    #[test]
    fn facet_names_are_unique() {
        let names = serializer().facet_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
        assert_eq!(names.first(), Some(&"identifiers"));
        assert!(serializer().facet("genes").is_some());
        assert!(serializer().facet("images").is_none());
    }

    #[test]
    fn empty_record_exports_only_defaults() {
        let serializer = serializer();
        let record = PatientRecord::new();
        let json = serializer.to_json(&record, None);

        assert_eq!(json[JSON_ID_KEY], json!(record.id().to_string()));
        assert!(json[JSON_LAST_MODIFIED_KEY].is_string());
        assert_eq!(
            without_header(json),
            json!({
                "life_status": "alive",
                "consents": [
                    {
                        "id": "real_consent",
                        "label": "Data is real",
                        "status": "no",
                        "required": true,
                    },
                ],
            })
        );
    }

    #[test]
    fn full_payload_round_trips() {
        let serializer = serializer();
        let mut record = PatientRecord::new();
        let payload = json!({
            "external_id": "P0001",
            "sex": "F",
            "date_of_birth": {"year": 1990, "month": 3},
            "life_status": "alive",
            "notes": {"medical_history": "asthma"},
            "features": [
                {"id": "HP:0001250", "label": "Seizure", "type": "phenotype", "observed": "yes"},
            ],
            "genes": [{"id": "ENSG00000012048", "gene": "BRCA1", "status": "candidate"}],
            "solved": {"status": "unsolved"},
            "consents": [
                {"id": "real_consent", "label": "Data is real", "status": "yes", "required": true},
            ],
        });

        serializer
            .update_from_json(&mut record, &payload, PatientWritePolicy::Update)
            .unwrap();
        assert_eq!(without_header(serializer.to_json(&record, None)), payload);
    }

    #[test]
    fn date_of_death_in_payload_makes_the_patient_deceased() {
        let serializer = serializer();
        let mut record = PatientRecord::new();
        serializer
            .update_from_json(
                &mut record,
                &json!({"date_of_death": {"year": 2020}, "life_status": "alive"}),
                PatientWritePolicy::Update,
            )
            .unwrap();

        let json = serializer.to_json(&record, None);
        assert_eq!(json["life_status"], json!("deceased"));
    }

    #[test]
    fn replace_without_date_of_death_keeps_the_incoming_life_status() {
        let serializer = serializer();
        let mut record = PatientRecord::new();
        serializer
            .update_from_json(
                &mut record,
                &json!({"date_of_death": {"year": 2020}}),
                PatientWritePolicy::Update,
            )
            .unwrap();
        serializer
            .update_from_json(
                &mut record,
                &json!({"life_status": "alive"}),
                PatientWritePolicy::Replace,
            )
            .unwrap();

        let json = without_header(serializer.to_json(&record, None));
        assert!(json.get("date_of_death").is_none());
        assert_eq!(json["life_status"], json!("alive"));
    }

    #[test]
    fn update_without_date_of_death_keeps_the_stored_one() {
        let serializer = serializer();
        let mut record = PatientRecord::new();
        serializer
            .update_from_json(
                &mut record,
                &json!({"date_of_death": {"year": 2020}}),
                PatientWritePolicy::Update,
            )
            .unwrap();
        serializer
            .update_from_json(
                &mut record,
                &json!({"life_status": "alive"}),
                PatientWritePolicy::Update,
            )
            .unwrap();

        let json = serializer.to_json(&record, None);
        assert_eq!(json["life_status"], json!("deceased"));
    }

    #[test]
    fn replace_clears_facets_the_payload_omits() {
        let serializer = serializer();
        let mut record = PatientRecord::new();
        serializer
            .update_from_json(
                &mut record,
                &json!({
                    "external_id": "P0001",
                    "genes": [{"gene": "BRCA1"}],
                    "allergies": ["Latex"],
                }),
                PatientWritePolicy::Update,
            )
            .unwrap();
        serializer
            .update_from_json(
                &mut record,
                &json!({"allergies": ["Penicillin"]}),
                PatientWritePolicy::Replace,
            )
            .unwrap();

        let json = without_header(serializer.to_json(&record, None));
        assert_eq!(json["allergies"], json!(["Penicillin"]));
        assert!(json.get("external_id").is_none());
        assert!(json.get("genes").is_none());
    }

    #[test]
    fn selection_limits_the_export() {
        let serializer = serializer();
        let mut record = PatientRecord::new();
        serializer
            .update_from_json(
                &mut record,
                &json!({"sex": "M", "genes": [{"gene": "BRCA2"}]}),
                PatientWritePolicy::Update,
            )
            .unwrap();

        let selection = FieldSelection::parse("genes");
        let json = without_header(serializer.to_json(&record, Some(&selection)));
        assert_eq!(
            json,
            json!({"genes": [{"id": "ENSG00000139618", "gene": "BRCA2", "status": "candidate"}]})
        );
    }

    #[test]
    fn facet_names_do_not_select_note_fields() {
        let serializer = serializer();
        let mut record = PatientRecord::new();
        serializer
            .update_from_json(
                &mut record,
                &json!({
                    "notes": {"family_history_notes": "cousin with seizures"},
                    "family_history": {"consanguinity": true},
                }),
                PatientWritePolicy::Update,
            )
            .unwrap();

        let selection = FieldSelection::parse("family_history");
        let json = without_header(serializer.to_json(&record, Some(&selection)));
        assert_eq!(json, json!({"family_history": {"consanguinity": true}}));

        let selection = FieldSelection::parse("family_history_notes");
        let json = without_header(serializer.to_json(&record, Some(&selection)));
        assert_eq!(
            json,
            json!({"notes": {"family_history_notes": "cousin with seizures"}})
        );
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let mut record = PatientRecord::new();
        let result = serializer().update_from_json(
            &mut record,
            &json!(["not", "an", "object"]),
            PatientWritePolicy::Merge,
        );
        assert!(matches!(result, Err(PatientDataError::NotAnObject)));
    }
}
