//! Cancer history.
//!
//! Each cancer is one sub-record holding its key and whether the patient is affected. Each
//! diagnosis of a cancer is a separate qualifier sub-record pointing back at the cancer key.

use crate::constants::{CANCER_CLASS, CANCER_QUALIFIER_CLASS};
use crate::controllers::{
    recover, replace_sub_records, report, PatientDataController, RecordFacts,
};
use crate::values::{PhenoTipsCancer, PhenoTipsCancerQualifier, VocabularyProperty};
use crate::{FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult, SubRecord};
use pheno_vocabulary::VocabularyManager;
use serde_json::{Map, Value};
use std::sync::Arc;

const JSON_KEY: &str = "cancers";

const CANCER: &str = "cancer";
const AFFECTED: &str = "affected";
const AGE_AT_DIAGNOSIS: &str = "ageAtDiagnosis";
const NUMERIC_AGE_AT_DIAGNOSIS: &str = "numericAgeAtDiagnosis";
const PRIMARY: &str = "primary";
const LATERALITY: &str = "laterality";
const NOTES: &str = "notes";

fn qualifier_from_sub_record(entry: &SubRecord) -> PhenoTipsCancerQualifier {
    PhenoTipsCancerQualifier {
        cancer: entry.text(CANCER),
        age_at_diagnosis: entry.text(AGE_AT_DIAGNOSIS),
        numeric_age_at_diagnosis: entry.integer(NUMERIC_AGE_AT_DIAGNOSIS).filter(|a| *a >= 0),
        primary: entry.bool(PRIMARY),
        laterality: entry.text(LATERALITY).and_then(|l| l.parse().ok()),
        notes: entry.text(NOTES),
    }
}

fn qualifier_to_sub_record(key: &str, qualifier: &PhenoTipsCancerQualifier) -> SubRecord {
    SubRecord::new()
        .with(CANCER, FieldValue::from(key))
        .with(AGE_AT_DIAGNOSIS, qualifier.age_at_diagnosis.clone().map(FieldValue::from))
        .with(
            NUMERIC_AGE_AT_DIAGNOSIS,
            qualifier.numeric_age_at_diagnosis.map(FieldValue::from),
        )
        .with(PRIMARY, qualifier.primary.map(FieldValue::from))
        .with(LATERALITY, qualifier.laterality.map(|l| FieldValue::from(l.as_str())))
        .with(NOTES, qualifier.notes.clone().map(FieldValue::from))
}

/// Cancers keyed by term id, or by label for unresolved entries.
///
/// MERGE overlays incoming cancers onto stored ones and accumulates their qualifiers.
#[derive(Clone, Debug)]
pub struct CancersController {
    vocabulary: Arc<VocabularyManager>,
}

impl CancersController {
    pub fn new(vocabulary: Arc<VocabularyManager>) -> Self {
        Self { vocabulary }
    }

    fn stored_cancers(&self, record: &dyn RecordAccessor) -> StoreResult<Vec<PhenoTipsCancer>> {
        let entries = record.sub_records(CANCER_CLASS)?;
        let qualifiers = record.sub_records(CANCER_QUALIFIER_CLASS)?;

        let mut cancers: Vec<PhenoTipsCancer> = Vec::new();
        for entry in &entries {
            let Some(key) = entry.text(CANCER) else {
                continue;
            };
            let term = VocabularyProperty::from_stored(&key, &self.vocabulary);
            cancers.push(PhenoTipsCancer::new(term, entry.bool(AFFECTED)));
        }
        for qualifier in qualifiers.iter().map(qualifier_from_sub_record) {
            let Some(key) = qualifier.cancer.clone() else {
                continue;
            };
            if qualifier.is_empty() {
                continue;
            }
            let index = match cancers.iter().position(|c| c.key() == key) {
                Some(index) => index,
                None => {
                    let term = VocabularyProperty::from_stored(&key, &self.vocabulary);
                    cancers.push(PhenoTipsCancer::new(term, None));
                    cancers.len() - 1
                }
            };
            cancers[index].add_qualifier(qualifier);
        }
        Ok(cancers)
    }

    fn try_save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<PhenoTipsCancer>>,
        policy: PatientWritePolicy,
    ) -> StoreResult<()> {
        let incoming: Vec<&PhenoTipsCancer> = match data {
            Some(data) => data.iter().collect(),
            None if policy == PatientWritePolicy::Replace => Vec::new(),
            None => return Ok(()),
        };
        let mut cancers = match policy {
            PatientWritePolicy::Merge => self.stored_cancers(&*record)?,
            _ => Vec::new(),
        };
        for cancer in incoming {
            match cancers.iter_mut().find(|c| c.key() == cancer.key()) {
                Some(existing) => existing.merge_data(cancer),
                None => cancers.push(cancer.clone()),
            }
        }

        let entries = cancers
            .iter()
            .map(|cancer| {
                SubRecord::new()
                    .with(CANCER, FieldValue::from(cancer.key()))
                    .with(AFFECTED, cancer.affected().map(FieldValue::from))
            })
            .collect();
        let qualifiers = cancers
            .iter()
            .flat_map(|cancer| {
                let key = cancer.key();
                cancer
                    .qualifiers()
                    .iter()
                    .map(move |q| qualifier_to_sub_record(&key, q))
            })
            .collect();
        replace_sub_records(record, CANCER_CLASS, entries)?;
        replace_sub_records(record, CANCER_QUALIFIER_CLASS, qualifiers)
    }
}

impl PatientDataController for CancersController {
    type Value = PhenoTipsCancer;

    fn name(&self) -> &'static str {
        "cancers"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<PhenoTipsCancer>> {
        let result = self.stored_cancers(record).map(|cancers| {
            (!cancers.is_empty()).then(|| PatientData::indexed(JSON_KEY, cancers))
        });
        recover(self.name(), record, result)
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<PhenoTipsCancer>>,
        policy: PatientWritePolicy,
        _facts: &RecordFacts,
    ) {
        let record_id = record.record_id().clone();
        let result = self.try_save(record, data, policy);
        report(self.name(), &record_id, result);
    }

    fn write_json(
        &self,
        data: &PatientData<PhenoTipsCancer>,
        json: &mut Map<String, Value>,
        _selection: Option<&FieldSelection>,
    ) {
        if !data.is_empty() {
            let cancers = data.iter().map(PhenoTipsCancer::to_json).collect();
            json.insert(JSON_KEY.to_string(), Value::Array(cancers));
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<PhenoTipsCancer>> {
        let items = json.get(JSON_KEY)?.as_array()?;
        let cancers = items
            .iter()
            .filter_map(|item| PhenoTipsCancer::from_json(item, &self.vocabulary))
            .collect();
        Some(PatientData::indexed(JSON_KEY, cancers))
    }
}
