//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the core services.
//! Nothing in this crate reads process-wide environment variables while handling a record.

use crate::constants::DEFAULT_PATIENT_DATA_DIR;
use crate::{PatientDataError, PatientDataResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    patient_data_dir: PathBuf,
    vocabulary_file: Option<PathBuf>,
    consent_file: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`PatientDataError::InvalidInput`] if the data directory is empty, or if a
    /// vocabulary or consent file is given but is not a readable file.
    pub fn new(
        patient_data_dir: PathBuf,
        vocabulary_file: Option<PathBuf>,
        consent_file: Option<PathBuf>,
    ) -> PatientDataResult<Self> {
        if patient_data_dir.as_os_str().is_empty() {
            return Err(PatientDataError::InvalidInput(
                "patient_data_dir cannot be empty".into(),
            ));
        }

        for (what, file) in [
            ("vocabulary file", &vocabulary_file),
            ("consent file", &consent_file),
        ] {
            if let Some(path) = file {
                if !path.is_file() {
                    return Err(PatientDataError::InvalidInput(format!(
                        "{what} {} does not exist or is not a file",
                        path.display()
                    )));
                }
            }
        }

        Ok(Self {
            patient_data_dir,
            vocabulary_file,
            consent_file,
        })
    }

    /// Build a configuration from optional raw values (typically environment variables).
    ///
    /// Empty or whitespace-only values count as unset. An unset data directory falls back to
    /// [`DEFAULT_PATIENT_DATA_DIR`].
    pub fn from_env_values(
        patient_data_dir: Option<String>,
        vocabulary_file: Option<String>,
        consent_file: Option<String>,
    ) -> PatientDataResult<Self> {
        fn non_empty(value: Option<String>) -> Option<PathBuf> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        }

        Self::new(
            non_empty(patient_data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PATIENT_DATA_DIR)),
            non_empty(vocabulary_file),
            non_empty(consent_file),
        )
    }

    pub fn patient_data_dir(&self) -> &Path {
        &self.patient_data_dir
    }

    pub fn vocabulary_file(&self) -> Option<&Path> {
        self.vocabulary_file.as_deref()
    }

    pub fn consent_file(&self) -> Option<&Path> {
        self.consent_file.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = CoreConfig::from_env_values(Some("   ".into()), Some("".into()), None)
            .expect("defaults are valid");
        assert_eq!(cfg.patient_data_dir(), Path::new(DEFAULT_PATIENT_DATA_DIR));
        assert!(cfg.vocabulary_file().is_none());
        assert!(cfg.consent_file().is_none());
    }

    #[test]
    fn rejects_missing_vocabulary_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let missing = temp_dir.path().join("missing.yaml");

        let err = CoreConfig::new(temp_dir.path().to_path_buf(), Some(missing), None)
            .expect_err("missing file");
        match err {
            PatientDataError::InvalidInput(msg) => assert!(msg.contains("vocabulary file")),
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_existing_files() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let consents = temp_dir.path().join("consents.yaml");
        std::fs::write(&consents, "consents: []\n").unwrap();

        let cfg = CoreConfig::from_env_values(
            Some(temp_dir.path().display().to_string()),
            None,
            Some(consents.display().to_string()),
        )
        .expect("valid config");
        assert_eq!(cfg.consent_file(), Some(consents.as_path()));
    }

    #[test]
    fn rejects_empty_data_dir() {
        assert!(CoreConfig::new(PathBuf::new(), None, None).is_err());
    }
}
