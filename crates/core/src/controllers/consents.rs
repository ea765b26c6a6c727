//! Consents the patient has granted.

use crate::consent::{ConsentStatus, PatientConsentManager};
use crate::controllers::{PatientDataController, RecordFacts};
use crate::{json, FieldSelection, PatientData, PatientDataResult, PatientWritePolicy};
use pheno_store::RecordAccessor;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

const JSON_KEY: &str = "consents";

/// Exposes every system consent with the patient's status. Storage goes through the
/// [`PatientConsentManager`], which drops ids that are not system consents.
///
/// UPDATE and REPLACE take the incoming granted consents as the complete set; MERGE changes
/// only the consents the payload mentions.
#[derive(Clone, Debug)]
pub struct ConsentsController {
    manager: Arc<PatientConsentManager>,
}

impl ConsentsController {
    pub fn new(manager: Arc<PatientConsentManager>) -> Self {
        Self { manager }
    }

    fn try_load(
        &self,
        record: &dyn RecordAccessor,
    ) -> PatientDataResult<Option<PatientData<ConsentStatus>>> {
        let statuses: BTreeMap<String, ConsentStatus> = self
            .manager
            .patient_consents(record)?
            .into_iter()
            .map(|consent| (consent.definition.id, consent.status))
            .collect();
        Ok((!statuses.is_empty()).then(|| PatientData::named(JSON_KEY, statuses)))
    }

    fn try_save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<ConsentStatus>>,
        policy: PatientWritePolicy,
    ) -> PatientDataResult<()> {
        let mut statuses: BTreeMap<String, ConsentStatus> = match (data, policy) {
            (None, PatientWritePolicy::Replace) => BTreeMap::new(),
            (None, _) => return Ok(()),
            (Some(_), PatientWritePolicy::Merge) => self
                .manager
                .patient_consents(&*record)?
                .into_iter()
                .map(|consent| (consent.definition.id, consent.status))
                .collect(),
            (Some(_), _) => BTreeMap::new(),
        };
        if let Some(data) = data {
            for (id, status) in data.named_iter() {
                statuses.insert(id.to_string(), *status);
            }
        }

        let granted: Vec<&str> = statuses
            .iter()
            .filter(|(_, status)| status.is_granted())
            .map(|(id, _)| id.as_str())
            .collect();
        self.manager.set_patient_consents(record, &granted[..])
    }
}

impl PatientDataController for ConsentsController {
    type Value = ConsentStatus;

    fn name(&self) -> &'static str {
        "consents"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<ConsentStatus>> {
        self.try_load(record).unwrap_or_else(|e| {
            tracing::warn!(
                "failed to load consents for record {}: {}",
                record.record_id(),
                e
            );
            None
        })
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<ConsentStatus>>,
        policy: PatientWritePolicy,
        _facts: &RecordFacts,
    ) {
        let record_id = record.record_id().clone();
        if let Err(e) = self.try_save(record, data, policy) {
            tracing::warn!("failed to save consents for record {}: {}", record_id, e);
        }
    }

    /// Lists consents in configuration order with their labels.
    fn write_json(
        &self,
        data: &PatientData<ConsentStatus>,
        json: &mut Map<String, Value>,
        _selection: Option<&FieldSelection>,
    ) {
        let definitions = match self.manager.system_consents() {
            Ok(definitions) => definitions,
            Err(e) => {
                tracing::warn!("failed to read consent configuration: {}", e);
                return;
            }
        };
        let consents: Vec<Value> = definitions
            .iter()
            .filter_map(|definition| {
                let status = data.get_named(&definition.id)?;
                Some(json!({
                    "id": definition.id,
                    "label": definition.label,
                    "status": status.as_str(),
                    "required": definition.required,
                }))
            })
            .collect();
        if !consents.is_empty() {
            json.insert(JSON_KEY.to_string(), Value::Array(consents));
        }
    }

    /// Accepts `{"id", "status"}` objects or plain ids of granted consents. An object without a
    /// status is granted, a `null` status is not, and an unreadable status drops the entry.
    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<ConsentStatus>> {
        let items = json.get(JSON_KEY)?.as_array()?;
        let statuses: BTreeMap<String, ConsentStatus> = items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => {
                    let id = json::text_at(obj, "id")?;
                    let granted = match obj.get("status") {
                        None => true,
                        Some(Value::Null) => false,
                        Some(status) => json::flag(status)?,
                    };
                    Some((id, ConsentStatus::from(granted)))
                }
                other => json::text(other).map(|id| (id, ConsentStatus::Yes)),
            })
            .collect();
        Some(PatientData::named(JSON_KEY, statuses))
    }
}
