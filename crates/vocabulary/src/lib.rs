//! # Pheno Vocabulary
//!
//! Term resolution for the vocabularies a phenotype record refers to: phenotype terms (HPO),
//! disorders, genes (HGNC) and the qualifier scales used alongside them.
//!
//! The ontology service itself is an external collaborator. This crate only defines the narrow
//! contract the data layer relies on ([`Vocabulary`]: look a term up by id, or by exact text) and
//! an in-memory implementation loaded from YAML, which is what tests and the CLI use.
//!
//! [`VocabularyManager`] routes an identifier to the vocabulary owning its prefix, and falls back
//! to an exact text search across every vocabulary when given free text.

pub mod manager;
pub mod term;
pub mod vocabulary;

pub use manager::VocabularyManager;
pub use term::VocabularyTerm;
pub use vocabulary::{InMemoryVocabulary, Vocabulary};

/// Errors returned while loading vocabularies.
#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("duplicate vocabulary identifier: {0}")]
    DuplicateVocabulary(String),
}

/// Type alias for Results that can fail with a [`VocabularyError`].
pub type VocabularyResult<T> = Result<T, VocabularyError>;
