//! Phenotype observations.
//!
//! Observed and explicitly absent phenotypes are stored as two lists on the patient object.
//! Qualifiers and notes of a phenotype live in a separate meta sub-record pointing back at the
//! list entry it describes. Features that did not resolve to a vocabulary term are exported
//! under `nonstandard_features`.

use crate::constants::{PATIENT_CLASS, PHENOTYPE_META_CLASS};
use crate::controllers::{
    list_value, recover, report, replace_sub_records, PatientDataController, RecordFacts,
};
use crate::values::{PhenoTipsFeature, VocabularyProperty};
use crate::{FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult, SubRecord};
use pheno_vocabulary::VocabularyManager;
use serde_json::{Map, Value};
use std::sync::Arc;

const OBSERVED_FIELD: &str = "phenotype";
const NOT_OBSERVED_FIELD: &str = "negative_phenotype";
const JSON_KEY: &str = "features";
const NONSTANDARD_JSON_KEY: &str = "nonstandard_features";

const META_PROPERTY: &str = "target_property_name";
const META_VALUE: &str = "target_property_value";
const META_NOTES: &str = "comments";

fn list_field(observed: bool) -> &'static str {
    if observed {
        OBSERVED_FIELD
    } else {
        NOT_OBSERVED_FIELD
    }
}

#[derive(Clone, Debug)]
pub struct FeaturesController {
    vocabulary: Arc<VocabularyManager>,
}

impl FeaturesController {
    pub fn new(vocabulary: Arc<VocabularyManager>) -> Self {
        Self { vocabulary }
    }

    fn stored_features(&self, record: &dyn RecordAccessor) -> StoreResult<Vec<PhenoTipsFeature>> {
        let metas = record.sub_records(PHENOTYPE_META_CLASS)?;
        let mut features = Vec::new();
        for observed in [true, false] {
            let field = list_field(observed);
            let entries = record
                .get_field(PATIENT_CLASS, field)?
                .map(|v| v.to_list())
                .unwrap_or_default();
            for entry in entries {
                let mut feature = PhenoTipsFeature::new(
                    VocabularyProperty::from_stored(&entry, &self.vocabulary),
                    observed,
                );
                let meta = metas.iter().find(|m| {
                    m.text(META_PROPERTY).as_deref() == Some(field)
                        && m.text(META_VALUE).as_deref() == Some(entry.as_str())
                });
                if let Some(meta) = meta {
                    self.attach_meta(&mut feature, meta);
                }
                features.push(feature);
            }
        }
        Ok(features)
    }

    fn attach_meta(&self, feature: &mut PhenoTipsFeature, meta: &SubRecord) {
        feature.set_notes(meta.text(META_NOTES));
        for (category, value) in meta.fields() {
            if [META_PROPERTY, META_VALUE, META_NOTES].contains(&category) {
                continue;
            }
            for id in value.to_list() {
                feature.add_qualifier(
                    category,
                    VocabularyProperty::from_stored(&id, &self.vocabulary),
                );
            }
        }
    }

    fn meta_record(feature: &PhenoTipsFeature) -> SubRecord {
        let mut meta = SubRecord::new()
            .with(META_PROPERTY, FieldValue::from(list_field(feature.is_observed())))
            .with(META_VALUE, FieldValue::from(feature.key()))
            .with(META_NOTES, feature.notes().map(FieldValue::from));
        for (category, qualifiers) in feature.qualifiers() {
            let ids: Vec<String> = qualifiers.iter().map(|q| q.storage_value()).collect();
            meta.set(category, list_value(ids));
        }
        meta
    }

    fn try_save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<PhenoTipsFeature>>,
        policy: PatientWritePolicy,
    ) -> StoreResult<()> {
        let incoming: Vec<PhenoTipsFeature> = match data {
            Some(data) => data.iter().cloned().collect(),
            None if policy == PatientWritePolicy::Replace => Vec::new(),
            None => return Ok(()),
        };
        let mut features = match policy {
            PatientWritePolicy::Merge => self.stored_features(&*record)?,
            _ => Vec::new(),
        };
        for feature in incoming {
            match features.iter_mut().find(|f| f.key() == feature.key()) {
                Some(existing) => existing.merge_data(&feature),
                None => features.push(feature),
            }
        }

        let ids = |observed: bool| -> Vec<String> {
            features
                .iter()
                .filter(|f| f.is_observed() == observed)
                .map(PhenoTipsFeature::key)
                .collect()
        };
        record.set_field(PATIENT_CLASS, OBSERVED_FIELD, list_value(ids(true)))?;
        record.set_field(PATIENT_CLASS, NOT_OBSERVED_FIELD, list_value(ids(false)))?;
        let metas = features
            .iter()
            .filter(|f| f.has_details())
            .map(Self::meta_record)
            .collect();
        replace_sub_records(record, PHENOTYPE_META_CLASS, metas)
    }
}

impl PatientDataController for FeaturesController {
    type Value = PhenoTipsFeature;

    fn name(&self) -> &'static str {
        "features"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY, NONSTANDARD_JSON_KEY]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<PhenoTipsFeature>> {
        let result = self.stored_features(record).map(|features| {
            (!features.is_empty()).then(|| PatientData::indexed(JSON_KEY, features))
        });
        recover(self.name(), record, result)
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<PhenoTipsFeature>>,
        policy: PatientWritePolicy,
        _facts: &RecordFacts,
    ) {
        let record_id = record.record_id().clone();
        let result = self.try_save(record, data, policy);
        report(self.name(), &record_id, result);
    }

    fn write_json(
        &self,
        data: &PatientData<PhenoTipsFeature>,
        json: &mut Map<String, Value>,
        selection: Option<&FieldSelection>,
    ) {
        let (nonstandard, standard): (Vec<_>, Vec<_>) =
            data.iter().partition(|f| f.is_nonstandard());
        for (key, features) in [(JSON_KEY, standard), (NONSTANDARD_JSON_KEY, nonstandard)] {
            let selected = selection.map_or(true, |s| s.contains_any([self.name(), key]));
            if selected && !features.is_empty() {
                json.insert(
                    key.to_string(),
                    Value::Array(features.iter().map(|f| f.to_json()).collect()),
                );
            }
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<PhenoTipsFeature>> {
        let lists: Vec<&Vec<Value>> = [JSON_KEY, NONSTANDARD_JSON_KEY]
            .iter()
            .filter_map(|key| json.get(*key).and_then(Value::as_array))
            .collect();
        if lists.is_empty() {
            return None;
        }
        let features = lists
            .into_iter()
            .flatten()
            .filter_map(|item| PhenoTipsFeature::from_json(item, &self.vocabulary))
            .collect();
        Some(PatientData::indexed(JSON_KEY, features))
    }
}
