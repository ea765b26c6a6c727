//! Patient consents.
//!
//! The consents a patient can give are defined system-wide by a configuration source. Which
//! of them a patient has granted is stored on the record as a list of consent ids.

mod manager;
mod source;

pub use manager::PatientConsentManager;
pub use source::{ConsentConfigurationSource, StaticConsentSource, YamlConsentSource};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One consent the system asks patients for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsentDefinition {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Required consents must be granted before the record may be edited.
    #[serde(default)]
    pub required: bool,
    /// Facets whose data depends on this consent.
    #[serde(default)]
    pub affected_fields: Vec<String>,
}

impl ConsentDefinition {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            required: false,
            affected_fields: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConsentStatus {
    Yes,
    #[default]
    No,
}

impl ConsentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsentStatus::Yes => "yes",
            ConsentStatus::No => "no",
        }
    }

    pub fn is_granted(self) -> bool {
        self == ConsentStatus::Yes
    }
}

impl From<bool> for ConsentStatus {
    fn from(granted: bool) -> Self {
        if granted {
            ConsentStatus::Yes
        } else {
            ConsentStatus::No
        }
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(ConsentStatus::Yes),
            "no" => Ok(ConsentStatus::No),
            _ => Err(()),
        }
    }
}

/// A system consent together with one patient's answer to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientConsent {
    pub definition: ConsentDefinition,
    pub status: ConsentStatus,
}

impl PatientConsent {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn is_granted(&self) -> bool {
        self.status.is_granted()
    }
}
