//! On-disk YAML representation of a patient record.
//!
//! Responsibilities:
//! - Define a strict wire model for serialisation/deserialisation
//! - Translate between [`PatientRecord`] and the wire model
//!
//! Each field value is written as a single-key mapping naming its type, so the stored document
//! stays readable and round-trips without YAML tags:
//!
//! ```text
//! id: 550e8400e29b41d4a716446655440000
//! created_at: 2026-01-23T13:58:04.099304Z
//! updated_at: 2026-01-23T13:58:04.099304Z
//! objects:
//!   PhenoTips.PatientClass:
//!     - gender:
//!         text: F
//!       date_of_birth:
//!         date: 1990-01-21
//! ```

use crate::{FieldValue, PatientRecord, RecordId, StoreError, StoreResult, SubRecord};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct RecordWire {
    pub id: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub objects: BTreeMap<String, Vec<BTreeMap<String, FieldWire>>>,
}

/// Exactly one of the members must be present.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct FieldWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<String>>,
}

// ============================================================================
// Public operations (crate-internal)
// ============================================================================

/// Parse a record from YAML text, reporting the failing path on schema mismatch.
pub(crate) fn parse(yaml_text: &str) -> StoreResult<PatientRecord> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    let wire = match serde_path_to_error::deserialize::<_, RecordWire>(deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(StoreError::Translation(format!(
                "record schema mismatch at {path}: {source}"
            )));
        }
    };

    wire_to_domain(wire)
}

/// Render a record as YAML text.
pub(crate) fn render(record: &PatientRecord) -> StoreResult<String> {
    let wire = domain_to_wire(record);
    Ok(serde_yaml::to_string(&wire)?)
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: RecordWire) -> StoreResult<PatientRecord> {
    let id = RecordId::parse(&wire.id)?;

    let mut objects = BTreeMap::new();
    for (class, subs) in wire.objects {
        let mut records = Vec::with_capacity(subs.len());
        for (index, fields) in subs.into_iter().enumerate() {
            let sub = fields
                .into_iter()
                .map(|(name, value)| -> StoreResult<(String, FieldValue)> {
                    let value = field_to_domain(value).ok_or_else(|| {
                        StoreError::Translation(format!(
                            "objects.{class}[{index}].{name} must hold exactly one of text, integer, date or list"
                        ))
                    })?;
                    Ok((name, value))
                })
                .collect::<StoreResult<SubRecord>>()?;
            records.push(sub);
        }
        objects.insert(class, records);
    }

    Ok(PatientRecord::from_parts(
        id,
        wire.created_at,
        wire.updated_at,
        objects,
    ))
}

fn field_to_domain(wire: FieldWire) -> Option<FieldValue> {
    match wire {
        FieldWire {
            text: Some(text),
            integer: None,
            date: None,
            list: None,
        } => Some(FieldValue::Text(text)),
        FieldWire {
            text: None,
            integer: Some(integer),
            date: None,
            list: None,
        } => Some(FieldValue::Integer(integer)),
        FieldWire {
            text: None,
            integer: None,
            date: Some(date),
            list: None,
        } => Some(FieldValue::Date(date)),
        FieldWire {
            text: None,
            integer: None,
            date: None,
            list: Some(list),
        } => Some(FieldValue::List(list)),
        _ => None,
    }
}

fn domain_to_wire(record: &PatientRecord) -> RecordWire {
    let objects = record
        .objects()
        .iter()
        .filter(|(_, subs)| !subs.is_empty())
        .map(|(class, subs)| {
            let subs = subs
                .iter()
                .map(|sub| {
                    sub.fields()
                        .map(|(name, value)| (name.to_string(), field_to_wire(value)))
                        .collect()
                })
                .collect();
            (class.clone(), subs)
        })
        .collect();

    RecordWire {
        id: record.id().to_string(),
        created_at: record.created_at(),
        updated_at: record.updated_at(),
        objects,
    }
}

fn field_to_wire(value: &FieldValue) -> FieldWire {
    match value {
        FieldValue::Text(text) => FieldWire {
            text: Some(text.clone()),
            ..FieldWire::default()
        },
        FieldValue::Integer(integer) => FieldWire {
            integer: Some(*integer),
            ..FieldWire::default()
        },
        FieldValue::Date(date) => FieldWire {
            date: Some(*date),
            ..FieldWire::default()
        },
        FieldValue::List(list) => FieldWire {
            list: Some(list.clone()),
            ..FieldWire::default()
        },
    }
}
