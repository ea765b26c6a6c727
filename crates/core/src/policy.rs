//! How incoming data is reconciled with what a record already stores.

use crate::PatientDataError;
use std::fmt;
use std::str::FromStr;

/// Write policy applied by every controller's `save`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PatientWritePolicy {
    /// Overwrite only the fields present in the incoming data.
    #[default]
    Update,
    /// Like `Update` for scalars; keyed collections are merged entry by entry with what is
    /// stored, incoming values winning.
    Merge,
    /// The incoming data is the facet's complete new state; anything absent is cleared.
    Replace,
}

impl PatientWritePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            PatientWritePolicy::Update => "update",
            PatientWritePolicy::Merge => "merge",
            PatientWritePolicy::Replace => "replace",
        }
    }
}

impl fmt::Display for PatientWritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatientWritePolicy {
    type Err = PatientDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "update" => Ok(PatientWritePolicy::Update),
            "merge" => Ok(PatientWritePolicy::Merge),
            "replace" => Ok(PatientWritePolicy::Replace),
            other => Err(PatientDataError::InvalidInput(format!(
                "unknown write policy '{other}' (expected update, merge or replace)"
            ))),
        }
    }
}
