//! In-memory record model and the record accessor interface.
//!
//! Data controllers never touch [`PatientRecord`] internals directly; they go through
//! [`RecordAccessor`], which keeps the controllers independent of how a record is persisted and
//! lets tests substitute accessors that fail.

use crate::{FieldValue, RecordId, StoreResult};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

// ============================================================================
// SUB-RECORDS
// ============================================================================

/// One typed group of named field values attached to a record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl SubRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter; `None` leaves the field unset.
    pub fn with(mut self, field: &str, value: impl Into<Option<FieldValue>>) -> Self {
        self.set(field, value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Sets a field; `None` removes it.
    pub fn set(&mut self, field: &str, value: Option<FieldValue>) {
        match value {
            Some(value) => {
                self.fields.insert(field.to_string(), value);
            }
            None => {
                self.fields.remove(field);
            }
        }
    }

    /// Non-blank text of a field (scalars are rendered as text).
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field)
            .filter(|v| !v.is_empty())
            .map(FieldValue::to_text)
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_integer)
    }

    pub fn bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(FieldValue::as_bool)
    }

    pub fn list(&self, field: &str) -> Vec<String> {
        self.get(field).map(FieldValue::to_list).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, FieldValue)> for SubRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// RECORD ACCESSOR
// ============================================================================

/// Narrow field-level access to a patient record.
///
/// Scalar fields (`get_field` / `set_field`) address the *first* sub-record of a class, which is
/// created on demand when a value is written. Repeated entries (genes, cancers, identifiers) are
/// handled as whole sub-records.
///
/// Every operation is fallible so that callers can degrade when the underlying document cannot
/// be read or written.
pub trait RecordAccessor {
    /// Identity of the record being accessed.
    fn record_id(&self) -> &RecordId;

    /// Last modification time, when the accessor tracks one.
    fn last_modified(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Reads a field of the main sub-record of `class`.
    fn get_field(&self, class: &str, field: &str) -> StoreResult<Option<FieldValue>>;

    /// Writes a field of the main sub-record of `class`; `None` clears it.
    fn set_field(&mut self, class: &str, field: &str, value: Option<FieldValue>)
        -> StoreResult<()>;

    /// All sub-records of `class`, in attachment order.
    fn sub_records(&self, class: &str) -> StoreResult<Vec<SubRecord>>;

    /// Attaches a new sub-record of `class`.
    fn new_sub_record(&mut self, class: &str, sub_record: SubRecord) -> StoreResult<()>;

    /// Removes every sub-record of `class`.
    fn remove_sub_records(&mut self, class: &str) -> StoreResult<()>;
}

// ============================================================================
// PATIENT RECORD
// ============================================================================

/// One patient document: identity, timestamps and attached sub-records grouped by class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRecord {
    id: RecordId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    objects: BTreeMap<String, Vec<SubRecord>>,
}

impl PatientRecord {
    /// Creates an empty record with a fresh id.
    pub fn new() -> Self {
        Self::with_id(RecordId::new())
    }

    /// Creates an empty record with the given id.
    pub fn with_id(id: RecordId) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            objects: BTreeMap::new(),
        }
    }

    pub(crate) fn from_parts(
        id: RecordId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        objects: BTreeMap<String, Vec<SubRecord>>,
    ) -> Self {
        Self {
            id,
            created_at,
            updated_at,
            objects,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Marks the record as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Class names with at least one attached sub-record.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.objects
            .iter()
            .filter(|(_, subs)| !subs.is_empty())
            .map(|(class, _)| class.as_str())
    }

    pub(crate) fn objects(&self) -> &BTreeMap<String, Vec<SubRecord>> {
        &self.objects
    }
}

impl Default for PatientRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordAccessor for PatientRecord {
    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at)
    }

    fn get_field(&self, class: &str, field: &str) -> StoreResult<Option<FieldValue>> {
        Ok(self
            .objects
            .get(class)
            .and_then(|subs| subs.first())
            .and_then(|main| main.get(field))
            .cloned())
    }

    fn set_field(
        &mut self,
        class: &str,
        field: &str,
        value: Option<FieldValue>,
    ) -> StoreResult<()> {
        let subs = self.objects.entry(class.to_string()).or_default();
        if subs.is_empty() {
            if value.is_none() {
                return Ok(());
            }
            subs.push(SubRecord::new());
        }
        subs[0].set(field, value);
        Ok(())
    }

    fn sub_records(&self, class: &str) -> StoreResult<Vec<SubRecord>> {
        Ok(self.objects.get(class).cloned().unwrap_or_default())
    }

    fn new_sub_record(&mut self, class: &str, sub_record: SubRecord) -> StoreResult<()> {
        self.objects
            .entry(class.to_string())
            .or_default()
            .push(sub_record);
        Ok(())
    }

    fn remove_sub_records(&mut self, class: &str) -> StoreResult<()> {
        self.objects.remove(class);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS: &str = "PhenoTips.PatientClass";

    #[test]
    fn set_field_creates_main_object_on_demand() {
        let mut record = PatientRecord::new();
        assert_eq!(record.get_field(CLASS, "gender").unwrap(), None);

        record
            .set_field(CLASS, "gender", Some(FieldValue::from("F")))
            .unwrap();
        assert_eq!(
            record.get_field(CLASS, "gender").unwrap(),
            Some(FieldValue::from("F"))
        );
        assert_eq!(record.sub_records(CLASS).unwrap().len(), 1);
    }

    #[test]
    fn clearing_a_missing_field_does_not_create_an_object() {
        let mut record = PatientRecord::new();
        record.set_field(CLASS, "gender", None).unwrap();
        assert!(record.sub_records(CLASS).unwrap().is_empty());
        assert_eq!(record.classes().count(), 0);
    }

    #[test]
    fn clearing_removes_only_that_field() {
        let mut record = PatientRecord::new();
        record
            .set_field(CLASS, "gender", Some(FieldValue::from("M")))
            .unwrap();
        record
            .set_field(CLASS, "external_id", Some(FieldValue::from("P01")))
            .unwrap();
        record.set_field(CLASS, "gender", None).unwrap();

        assert_eq!(record.get_field(CLASS, "gender").unwrap(), None);
        assert_eq!(
            record.get_field(CLASS, "external_id").unwrap(),
            Some(FieldValue::from("P01"))
        );
    }

    #[test]
    fn sub_records_keep_attachment_order_and_remove_wholesale() {
        let mut record = PatientRecord::new();
        let class = "PhenoTips.GeneClass";
        record
            .new_sub_record(class, SubRecord::new().with("gene", FieldValue::from("A")))
            .unwrap();
        record
            .new_sub_record(class, SubRecord::new().with("gene", FieldValue::from("B")))
            .unwrap();

        let genes: Vec<String> = record
            .sub_records(class)
            .unwrap()
            .iter()
            .filter_map(|s| s.text("gene"))
            .collect();
        assert_eq!(genes, vec!["A", "B"]);

        record.remove_sub_records(class).unwrap();
        assert!(record.sub_records(class).unwrap().is_empty());
    }

    #[test]
    fn sub_record_accessors_read_typed_values() {
        let sub = SubRecord::new()
            .with("affected", FieldValue::from(true))
            .with("strategy", FieldValue::List(vec!["deletion".into()]))
            .with("comments", FieldValue::from("  "));

        assert_eq!(sub.bool("affected"), Some(true));
        assert_eq!(sub.list("strategy"), vec!["deletion"]);
        assert_eq!(sub.text("comments"), None);
        assert!(sub.get("missing").is_none());
        assert!(sub.integer("missing").is_none());
    }
}
