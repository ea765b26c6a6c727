//! Constants used throughout the pheno core crate.
//!
//! Storage class names are kept in one place so that no facet spells another facet's class by
//! hand.

/// Default directory for record storage when no explicit directory is configured.
pub const DEFAULT_PATIENT_DATA_DIR: &str = "patient_data";

/// Main patient class: holds every scalar facet field.
pub const PATIENT_CLASS: &str = "PhenoTips.PatientClass";

/// One sub-record per gene entry.
pub const GENE_CLASS: &str = "PhenoTips.GeneClass";

/// One sub-record per variant entry.
pub const GENE_VARIANT_CLASS: &str = "PhenoTips.GeneVariantClass";

/// One sub-record per cancer entry.
pub const CANCER_CLASS: &str = "PhenoTips.CancerClass";

/// One sub-record per cancer qualifier, linked to its cancer by id.
pub const CANCER_QUALIFIER_CLASS: &str = "PhenoTips.CancerQualifierClass";

/// One sub-record per labeled external identifier.
pub const LABELED_IDENTIFIER_CLASS: &str = "PhenoTips.LabeledIdentifierClass";

/// Per-phenotype qualifiers and notes.
pub const PHENOTYPE_META_CLASS: &str = "PhenoTips.PhenotypeMetaClass";

/// Parental information (ages at birth).
pub const PARENTAL_INFORMATION_CLASS: &str = "PhenoTips.ParentalInformationClass";

/// Granted consents of one patient.
pub const PATIENT_CONSENT_CLASS: &str = "PhenoTips.PatientConsentClass";

/// Top-level JSON key carrying the record id.
pub const JSON_ID_KEY: &str = "id";

/// Top-level JSON key carrying the record's last modification time.
pub const JSON_LAST_MODIFIED_KEY: &str = "last_modification_date";
