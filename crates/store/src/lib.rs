//! # Pheno Store
//!
//! Record model and persistence for patient records.
//!
//! A patient record is a document made of *sub-records*: typed groups of named field values.
//! Each sub-record belongs to a class (for example `PhenoTips.GeneClass`) and a record may hold
//! any number of sub-records of one class. The first sub-record of a class is the record's main
//! object for that class and carries the record's scalar fields.
//!
//! This crate provides:
//! - [`FieldValue`], [`SubRecord`] and [`PatientRecord`], the in-memory record model
//! - [`RecordAccessor`], the narrow get/set/list interface the data controllers are written
//!   against
//! - [`RecordStore`], a file-backed store keeping one YAML document per record in a sharded
//!   directory tree
//!
//! **No serialisation policy lives here**: how facets map onto fields belongs in `pheno-core`.

pub mod record;
pub mod repository;
pub mod value;
mod wire;

pub use record::{PatientRecord, RecordAccessor, SubRecord};
pub use repository::RecordStore;
pub use value::FieldValue;

pub use pheno_uuid::RecordId;

/// Filename of the YAML document holding one record.
pub const RECORD_FILENAME: &str = "record.yaml";

/// Errors returned by the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid record id: {0}")]
    InvalidId(#[from] pheno_uuid::UuidError),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("failed to create record directory: {0}")]
    DirCreation(std::io::Error),

    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),

    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),

    #[error("failed to delete record: {0}")]
    Delete(std::io::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("record access failed: {0}")]
    Access(String),
}

/// Type alias for Results that can fail with a [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;
