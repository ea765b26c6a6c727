use crate::consent::{
    ConsentConfigurationSource, ConsentDefinition, ConsentStatus, PatientConsent,
};
use crate::constants::PATIENT_CONSENT_CLASS;
use crate::PatientDataResult;
use pheno_store::{FieldValue, RecordAccessor};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

const GRANTED_FIELD: &str = "granted";

#[derive(Default)]
struct CachedDefinitions {
    loaded: bool,
    stamp: Option<SystemTime>,
    definitions: Arc<Vec<ConsentDefinition>>,
}

/// Reads and writes patient consents against the system consent configuration.
///
/// The configuration is cached and reloaded on read whenever the source's last-modified
/// stamp differs from the one it was loaded at. Concurrent readers that both see a stale
/// stamp may both reload; the last one stored wins.
pub struct PatientConsentManager {
    source: Box<dyn ConsentConfigurationSource>,
    cache: Mutex<CachedDefinitions>,
}

impl fmt::Debug for PatientConsentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatientConsentManager").finish_non_exhaustive()
    }
}

impl PatientConsentManager {
    pub fn new(source: impl ConsentConfigurationSource + 'static) -> Self {
        Self::from_source(Box::new(source))
    }

    pub fn from_source(source: Box<dyn ConsentConfigurationSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(CachedDefinitions::default()),
        }
    }

    /// The consents every patient is asked for, in configuration order.
    pub fn system_consents(&self) -> PatientDataResult<Arc<Vec<ConsentDefinition>>> {
        let stamp = self.source.last_modified()?;
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if cache.loaded && cache.stamp == stamp {
                return Ok(Arc::clone(&cache.definitions));
            }
        }

        let definitions = Arc::new(self.source.load_definitions()?);
        tracing::debug!("loaded {} consent definitions", definitions.len());

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        *cache = CachedDefinitions {
            loaded: true,
            stamp,
            definitions: Arc::clone(&definitions),
        };
        Ok(definitions)
    }

    /// Looks up one system consent by id.
    pub fn definition(&self, id: &str) -> PatientDataResult<Option<ConsentDefinition>> {
        Ok(self.system_consents()?.iter().find(|d| d.id == id).cloned())
    }

    /// Every system consent with the patient's status for it.
    pub fn patient_consents(
        &self,
        record: &dyn RecordAccessor,
    ) -> PatientDataResult<Vec<PatientConsent>> {
        let granted = granted_ids(record)?;
        Ok(self
            .system_consents()?
            .iter()
            .map(|definition| PatientConsent {
                status: ConsentStatus::from(granted.contains(&definition.id)),
                definition: definition.clone(),
            })
            .collect())
    }

    pub fn has_consent(&self, record: &dyn RecordAccessor, id: &str) -> PatientDataResult<bool> {
        Ok(self
            .patient_consents(record)?
            .iter()
            .any(|consent| consent.id() == id && consent.is_granted()))
    }

    /// Stores exactly `ids` as the granted consents. Ids that are not system consents are
    /// dropped.
    pub fn set_patient_consents<S: AsRef<str>>(
        &self,
        record: &mut dyn RecordAccessor,
        ids: &[S],
    ) -> PatientDataResult<()> {
        let granted: Vec<String> = self
            .system_consents()?
            .iter()
            .filter(|definition| ids.iter().any(|id| id.as_ref() == definition.id))
            .map(|definition| definition.id.clone())
            .collect();
        record.set_field(
            PATIENT_CONSENT_CLASS,
            GRANTED_FIELD,
            Some(FieldValue::List(granted)),
        )?;
        Ok(())
    }

    /// Grants one consent. Returns false if `id` is not a system consent.
    pub fn grant_consent(
        &self,
        record: &mut dyn RecordAccessor,
        id: &str,
    ) -> PatientDataResult<bool> {
        self.change_consent(record, id, ConsentStatus::Yes)
    }

    /// Revokes one consent. Returns false if `id` is not a system consent.
    pub fn revoke_consent(
        &self,
        record: &mut dyn RecordAccessor,
        id: &str,
    ) -> PatientDataResult<bool> {
        self.change_consent(record, id, ConsentStatus::No)
    }

    fn change_consent(
        &self,
        record: &mut dyn RecordAccessor,
        id: &str,
        status: ConsentStatus,
    ) -> PatientDataResult<bool> {
        if self.definition(id)?.is_none() {
            return Ok(false);
        }
        let mut granted = granted_ids(&*record)?;
        granted.retain(|g| g != id);
        if status.is_granted() {
            granted.push(id.to_string());
        }
        self.set_patient_consents(record, &granted[..])?;
        Ok(true)
    }
}

fn granted_ids(record: &dyn RecordAccessor) -> PatientDataResult<Vec<String>> {
    Ok(record
        .get_field(PATIENT_CONSENT_CLASS, GRANTED_FIELD)?
        .map(|v| v.to_list())
        .unwrap_or_default())
}
