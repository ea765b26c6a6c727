//! # Pheno Core
//!
//! Patient data controllers for the phenotype record system.
//!
//! This crate maps the facets of a clinical record (demographics, dates, phenotype features,
//! genes, cancers, consents and so on) between the stored record and the JSON wire format:
//! - One controller per facet, reading the facet's fields into a [`PatientData`] value bag and
//!   writing it back under a [`PatientWritePolicy`]
//! - Value objects with custom parsing ([`PhenoTipsDate`], [`PhenoTipsGene`],
//!   [`PhenoTipsCancer`], [`PhenoTipsFeature`])
//! - The [`PatientConsentManager`] and its cached consent configuration
//! - The [`PatientSerializer`], which runs every facet over one record
//!
//! **No storage concerns**: records are reached only through
//! [`pheno_store::RecordAccessor`], and terms only through [`pheno_vocabulary::VocabularyManager`].

pub mod config;
pub mod consent;
pub mod constants;
pub mod controllers;
pub mod data;
mod error;
pub mod json;
pub mod policy;
pub mod selection;
pub mod serializer;
pub mod values;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::CoreConfig;
pub use consent::{
    ConsentConfigurationSource, ConsentDefinition, ConsentStatus, PatientConsent,
    PatientConsentManager, StaticConsentSource, YamlConsentSource,
};
pub use controllers::{Facet, PatientDataController, RecordFacts};
pub use data::PatientData;
pub use error::{PatientDataError, PatientDataResult};
pub use policy::PatientWritePolicy;
pub use selection::FieldSelection;
pub use serializer::PatientSerializer;
pub use values::{
    Laterality, PhenoTipsCancer, PhenoTipsCancerQualifier, PhenoTipsDate, PhenoTipsFeature,
    PhenoTipsGene, VocabularyProperty,
};
