//! Value objects carried by the facet controllers.

pub mod cancer;
pub mod date;
pub mod feature;
pub mod gene;
pub mod property;

pub use cancer::{Laterality, PhenoTipsCancer, PhenoTipsCancerQualifier};
pub use date::PhenoTipsDate;
pub use feature::PhenoTipsFeature;
pub use gene::PhenoTipsGene;
pub use property::{compare_by_label, sorted_by_label, VocabularyProperty};
