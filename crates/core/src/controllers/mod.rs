//! Facet controllers.
//!
//! Each controller owns one facet of the patient record. It knows the fields the facet occupies
//! on the record, the keys it contributes to the patient JSON, and how incoming data is written
//! back under each [`PatientWritePolicy`].
//!
//! Controllers are written against [`RecordAccessor`] only. A failing accessor never aborts an
//! operation: `load` reports no data and `save` leaves the record as it was, both with a
//! warning. Every `save` performs all of its reads before its first write.
//!
//! Controllers with a regular shape are configured rather than hand-written:
//! [`SimpleController`] and [`ComplexController`] are driven by [`FacetFields`], and
//! [`RepeatedGroupController`] by [`GroupFields`].

pub mod allergies;
pub mod apgar;
pub mod cancers;
pub mod clinical_status;
pub mod complex;
pub mod consents;
pub mod dates;
pub mod disorders;
pub mod ethnicity;
pub mod features;
pub mod fields;
pub mod genes;
pub mod life_status;
pub mod repeated;
pub mod sex;
pub mod simple;
pub mod solved;

pub use allergies::AllergiesController;
pub use apgar::ApgarController;
pub use cancers::CancersController;
pub use clinical_status::ClinicalStatusController;
pub use complex::{ComplexController, ComplexValue};
pub use consents::ConsentsController;
pub use dates::DatesController;
pub use disorders::DisordersController;
pub use ethnicity::EthnicityController;
pub use features::FeaturesController;
pub use fields::{FacetFields, FieldKind, JsonLayout};
pub use genes::GenesController;
pub use life_status::{LifeStatus, LifeStatusController};
pub use repeated::{GroupFields, RepeatedGroupController};
pub use sex::SexController;
pub use simple::SimpleController;
pub use solved::SolvedController;

use crate::{FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, RecordId, StoreResult, SubRecord};
use serde_json::{Map, Value};

/// Facts about a record that more than one facet depends on.
///
/// Computed once per operation and handed read-only to every controller, so that no facet
/// reads another facet's fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordFacts {
    /// A date of death is recorded (or being recorded).
    pub date_of_death_known: bool,
}

/// Typed contract of one facet controller.
pub trait PatientDataController {
    /// Value type held in the facet's [`PatientData`] bag.
    type Value;

    /// Facet name, used in logs and field selections.
    fn name(&self) -> &'static str;

    /// Top-level JSON keys this facet contributes.
    fn json_keys(&self) -> Vec<&'static str>;

    /// True if the facet takes part in an export with this selection.
    fn is_selected(&self, selection: Option<&FieldSelection>) -> bool {
        selection.map_or(true, |s| {
            s.contains(self.name()) || s.contains_any(self.json_keys())
        })
    }

    /// Reads the facet from the record; `None` when there is nothing to report or the record
    /// cannot be read.
    fn load(
        &self,
        record: &dyn RecordAccessor,
        facts: &RecordFacts,
    ) -> Option<PatientData<Self::Value>>;

    /// Writes the facet back under `policy`. `None` data means the caller intends no change,
    /// except under [`PatientWritePolicy::Replace`] where it clears the facet.
    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<Self::Value>>,
        policy: PatientWritePolicy,
        facts: &RecordFacts,
    );

    /// Adds the facet's keys to an outgoing patient JSON object.
    fn write_json(
        &self,
        data: &PatientData<Self::Value>,
        json: &mut Map<String, Value>,
        selection: Option<&FieldSelection>,
    );

    /// Reads the facet from an incoming patient JSON object; `None` when the payload does not
    /// mention the facet.
    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<Self::Value>>;
}

/// Object-safe view of a controller, used by the serializer to run heterogeneous facets.
pub trait Facet: Send + Sync {
    fn facet_name(&self) -> &'static str;

    fn export_json(
        &self,
        record: &dyn RecordAccessor,
        facts: &RecordFacts,
        json: &mut Map<String, Value>,
        selection: Option<&FieldSelection>,
    );

    fn import_json(
        &self,
        record: &mut dyn RecordAccessor,
        json: &Map<String, Value>,
        policy: PatientWritePolicy,
        facts: &RecordFacts,
    );
}

impl<C> Facet for C
where
    C: PatientDataController + Send + Sync,
{
    fn facet_name(&self) -> &'static str {
        self.name()
    }

    fn export_json(
        &self,
        record: &dyn RecordAccessor,
        facts: &RecordFacts,
        json: &mut Map<String, Value>,
        selection: Option<&FieldSelection>,
    ) {
        if !self.is_selected(selection) {
            return;
        }
        if let Some(data) = self.load(record, facts) {
            self.write_json(&data, json, selection);
        }
    }

    fn import_json(
        &self,
        record: &mut dyn RecordAccessor,
        json: &Map<String, Value>,
        policy: PatientWritePolicy,
        facts: &RecordFacts,
    ) {
        let data = self.read_json(json);
        self.save(record, data.as_ref(), policy, facts);
    }
}

// ============================================================================
// Shared routines (crate-internal)
// ============================================================================

/// One pending field write: class, field, new value (`None` clears).
pub(crate) type FieldWrite = (&'static str, &'static str, Option<FieldValue>);

/// Unwraps a load result, logging and reporting no data on failure.
pub(crate) fn recover<T>(
    facet: &str,
    record: &dyn RecordAccessor,
    result: StoreResult<Option<T>>,
) -> Option<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!(
            "failed to load {} for record {}: {}",
            facet,
            record.record_id(),
            e
        );
        None
    })
}

/// Logs a failed save.
pub(crate) fn report(facet: &str, record_id: &RecordId, result: StoreResult<()>) {
    if let Err(e) = result {
        tracing::warn!("failed to save {} for record {}: {}", facet, record_id, e);
    }
}

pub(crate) fn apply_field_writes(
    record: &mut dyn RecordAccessor,
    writes: Vec<FieldWrite>,
) -> StoreResult<()> {
    for (class, field, value) in writes {
        record.set_field(class, field, value)?;
    }
    Ok(())
}

/// Replaces every sub-record of `class` with `entries`.
pub(crate) fn replace_sub_records(
    record: &mut dyn RecordAccessor,
    class: &str,
    entries: Vec<SubRecord>,
) -> StoreResult<()> {
    record.remove_sub_records(class)?;
    for entry in entries {
        record.new_sub_record(class, entry)?;
    }
    Ok(())
}

/// Stored items followed by the incoming items not already present.
pub(crate) fn merge_lists(stored: Vec<String>, incoming: &[String]) -> Vec<String> {
    let mut merged = stored;
    for item in incoming {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

pub(crate) fn text_value(text: &str) -> Option<FieldValue> {
    let text = text.trim();
    (!text.is_empty()).then(|| FieldValue::Text(text.to_string()))
}

pub(crate) fn list_value(items: Vec<String>) -> Option<FieldValue> {
    (!items.is_empty()).then_some(FieldValue::List(items))
}

pub(crate) fn string_array<'a>(items: impl IntoIterator<Item = &'a String>) -> Value {
    Value::Array(items.into_iter().cloned().map(Value::String).collect())
}
