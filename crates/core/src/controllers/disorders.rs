//! Diagnosed disorders.

use crate::constants::PATIENT_CLASS;
use crate::controllers::{
    list_value, merge_lists, recover, report, PatientDataController, RecordFacts,
};
use crate::values::{sorted_by_label, VocabularyProperty};
use crate::{FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{RecordAccessor, StoreResult};
use pheno_vocabulary::VocabularyManager;
use serde_json::{Map, Value};
use std::sync::Arc;

const FIELD: &str = "omim_id";
const JSON_KEY: &str = "disorders";

/// Disorder terms, stored as a list of ids (or free text) and exported with their labels.
#[derive(Clone, Debug)]
pub struct DisordersController {
    vocabulary: Arc<VocabularyManager>,
}

impl DisordersController {
    pub fn new(vocabulary: Arc<VocabularyManager>) -> Self {
        Self { vocabulary }
    }

    fn stored(&self, record: &dyn RecordAccessor) -> StoreResult<Vec<String>> {
        Ok(record
            .get_field(PATIENT_CLASS, FIELD)?
            .map(|v| v.to_list())
            .unwrap_or_default())
    }

    fn try_save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<VocabularyProperty>>,
        policy: PatientWritePolicy,
    ) -> StoreResult<()> {
        let mut entries: Vec<String> = Vec::new();
        match data {
            Some(data) => {
                for value in data.iter().map(VocabularyProperty::storage_value) {
                    if !value.is_empty() && !entries.contains(&value) {
                        entries.push(value);
                    }
                }
            }
            None if policy == PatientWritePolicy::Replace => {}
            None => return Ok(()),
        }
        if data.is_some() && policy == PatientWritePolicy::Merge {
            entries = merge_lists(self.stored(&*record)?, &entries);
        }
        record.set_field(PATIENT_CLASS, FIELD, list_value(entries))
    }
}

impl PatientDataController for DisordersController {
    type Value = VocabularyProperty;

    fn name(&self) -> &'static str {
        "disorders"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<VocabularyProperty>> {
        let result = self.stored(record).map(|entries| {
            let disorders: Vec<VocabularyProperty> = entries
                .iter()
                .map(|entry| VocabularyProperty::from_stored(entry, &self.vocabulary))
                .collect();
            (!disorders.is_empty()).then(|| PatientData::indexed(JSON_KEY, disorders))
        });
        recover(self.name(), record, result)
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<VocabularyProperty>>,
        policy: PatientWritePolicy,
        _facts: &RecordFacts,
    ) {
        let record_id = record.record_id().clone();
        let result = self.try_save(record, data, policy);
        report(self.name(), &record_id, result);
    }

    fn write_json(
        &self,
        data: &PatientData<VocabularyProperty>,
        json: &mut Map<String, Value>,
        _selection: Option<&FieldSelection>,
    ) {
        if !data.is_empty() {
            let disorders = sorted_by_label(data.iter())
                .into_iter()
                .map(VocabularyProperty::to_json)
                .collect();
            json.insert(JSON_KEY.to_string(), Value::Array(disorders));
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<VocabularyProperty>> {
        let items = json.get(JSON_KEY)?.as_array()?;
        let disorders = items
            .iter()
            .filter_map(|item| VocabularyProperty::from_json(item, &self.vocabulary))
            .collect();
        Some(PatientData::indexed(JSON_KEY, disorders))
    }
}
