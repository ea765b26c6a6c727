use crate::consent::ConsentDefinition;
use crate::{PatientDataError, PatientDataResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Where the system-wide consent definitions come from.
pub trait ConsentConfigurationSource: Send + Sync {
    /// Version stamp of the configuration. Definitions are reloaded whenever it changes;
    /// `None` means the configuration never changes.
    fn last_modified(&self) -> PatientDataResult<Option<SystemTime>>;

    fn load_definitions(&self) -> PatientDataResult<Vec<ConsentDefinition>>;
}

/// Consent definitions read from a YAML file of the form `consents: [...]`.
#[derive(Clone, Debug)]
pub struct YamlConsentSource {
    path: PathBuf,
}

impl YamlConsentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses consent definitions from YAML text.
    pub fn parse(yaml_text: &str) -> PatientDataResult<Vec<ConsentDefinition>> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = match serde_path_to_error::deserialize::<_, ConsentsWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                return Err(PatientDataError::ConsentConfiguration(format!(
                    "consent schema mismatch at {path}: {source}"
                )));
            }
        };
        validate(&wire.consents)?;
        Ok(wire.consents)
    }
}

impl ConsentConfigurationSource for YamlConsentSource {
    fn last_modified(&self) -> PatientDataResult<Option<SystemTime>> {
        let metadata = std::fs::metadata(&self.path).map_err(PatientDataError::ConfigRead)?;
        Ok(Some(metadata.modified().map_err(PatientDataError::ConfigRead)?))
    }

    fn load_definitions(&self) -> PatientDataResult<Vec<ConsentDefinition>> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(PatientDataError::ConfigRead)?;
        Self::parse(&contents)
    }
}

/// A fixed set of consent definitions.
#[derive(Clone, Debug, Default)]
pub struct StaticConsentSource {
    definitions: Vec<ConsentDefinition>,
}

impl StaticConsentSource {
    pub fn new(definitions: Vec<ConsentDefinition>) -> Self {
        Self { definitions }
    }
}

impl ConsentConfigurationSource for StaticConsentSource {
    fn last_modified(&self) -> PatientDataResult<Option<SystemTime>> {
        Ok(None)
    }

    fn load_definitions(&self) -> PatientDataResult<Vec<ConsentDefinition>> {
        validate(&self.definitions)?;
        Ok(self.definitions.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConsentsWire {
    #[serde(default)]
    consents: Vec<ConsentDefinition>,
}

/// Ids must be non-blank and unique.
pub(crate) fn validate(definitions: &[ConsentDefinition]) -> PatientDataResult<()> {
    let mut seen = HashSet::new();
    for definition in definitions {
        let id = definition.id.trim();
        if id.is_empty() {
            return Err(PatientDataError::ConsentConfiguration(
                "consent id cannot be empty".into(),
            ));
        }
        if !seen.insert(id) {
            return Err(PatientDataError::ConsentConfiguration(format!(
                "duplicate consent id: {id}"
            )));
        }
    }
    Ok(())
}
