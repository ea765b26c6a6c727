#[derive(Debug, thiserror::Error)]
pub enum PatientDataError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("record store error: {0}")]
    Store(#[from] pheno_store::StoreError),
    #[error("vocabulary error: {0}")]
    Vocabulary(#[from] pheno_vocabulary::VocabularyError),
    #[error("failed to read configuration file: {0}")]
    ConfigRead(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
    #[error("invalid consent configuration: {0}")]
    ConsentConfiguration(String),
    #[error("failed to serialize JSON: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize JSON: {0}")]
    Deserialization(serde_json::Error),
    #[error("patient JSON must be an object")]
    NotAnObject,
}

pub type PatientDataResult<T> = std::result::Result<T, PatientDataError>;
