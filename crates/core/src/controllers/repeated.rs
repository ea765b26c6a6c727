//! Facets stored as one sub-record per entry.

use crate::constants::{GENE_VARIANT_CLASS, LABELED_IDENTIFIER_CLASS};
use crate::controllers::{
    recover, replace_sub_records, report, string_array, PatientDataController, RecordFacts,
};
use crate::{json, FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult, SubRecord};
use serde_json::{Map, Value};

/// The shape of a repeated group: its class, fields and natural key.
#[derive(Debug)]
pub struct GroupFields {
    pub name: &'static str,
    pub class: &'static str,
    pub json_key: &'static str,
    /// Fields that together identify an entry. Entries missing any of them are dropped.
    pub key_fields: &'static [&'static str],
    pub fields: &'static [&'static str],
    /// Fields holding lists rather than text.
    pub list_fields: &'static [&'static str],
}

pub static VARIANTS: GroupFields = GroupFields {
    name: "variants",
    class: GENE_VARIANT_CLASS,
    json_key: "variants",
    key_fields: &["gene", "cdna"],
    fields: &[
        "gene",
        "cdna",
        "protein",
        "transcript",
        "dbsnp",
        "zygosity",
        "effect",
        "interpretation",
        "inheritance",
        "evidence",
        "segregation",
        "sanger",
        "comments",
    ],
    list_fields: &["evidence"],
};

pub static LABELED_EIDS: GroupFields = GroupFields {
    name: "labeled_eids",
    class: LABELED_IDENTIFIER_CLASS,
    json_key: "labeled_eids",
    key_fields: &["label"],
    fields: &["label", "value"],
    list_fields: &[],
};

impl GroupFields {
    /// The natural key of an entry, if every key field is set.
    pub fn key(&self, entry: &SubRecord) -> Option<Vec<String>> {
        self.key_fields.iter().map(|f| entry.text(f)).collect()
    }

    fn is_list(&self, field: &str) -> bool {
        self.list_fields.contains(&field)
    }

    /// Overlays `incoming` onto `base` entry by entry: entries with the same key take the
    /// incoming fields and keep the others, new keys are appended.
    pub fn merge(&self, base: Vec<SubRecord>, incoming: &[SubRecord]) -> Vec<SubRecord> {
        let mut merged: Vec<SubRecord> = Vec::with_capacity(base.len() + incoming.len());
        for entry in base.iter().chain(incoming) {
            let Some(key) = self.key(entry) else {
                continue;
            };
            match merged.iter_mut().find(|m| self.key(m).as_ref() == Some(&key)) {
                Some(existing) => {
                    for (field, value) in entry.fields() {
                        existing.set(field, Some(value.clone()));
                    }
                }
                None => merged.push(entry.clone()),
            }
        }
        merged
    }

    fn entry_from_json(&self, obj: &Map<String, Value>) -> Option<SubRecord> {
        let entry: SubRecord = self
            .fields
            .iter()
            .filter_map(|field| {
                let value = obj.get(*field)?;
                let value = if self.is_list(field) {
                    let items = json::string_list(value);
                    (!items.is_empty()).then_some(FieldValue::List(items))?
                } else {
                    FieldValue::Text(json::text(value)?)
                };
                Some((field.to_string(), value))
            })
            .collect();
        self.key(&entry).map(|_| entry)
    }

    fn entry_to_json(&self, entry: &SubRecord) -> Value {
        let mut obj = Map::new();
        for field in self.fields {
            if self.is_list(field) {
                let items = entry.list(field);
                if !items.is_empty() {
                    obj.insert(field.to_string(), string_array(&items));
                }
            } else if let Some(text) = entry.text(field) {
                obj.insert(field.to_string(), Value::String(text));
            }
        }
        Value::Object(obj)
    }
}

/// Maps a list of keyed entries, one sub-record each.
///
/// UPDATE and REPLACE write the incoming list wholesale; MERGE overlays it on the stored
/// entries key by key.
#[derive(Clone, Copy, Debug)]
pub struct RepeatedGroupController {
    group: &'static GroupFields,
}

impl RepeatedGroupController {
    pub fn new(group: &'static GroupFields) -> Self {
        Self { group }
    }

    pub fn variants() -> Self {
        Self::new(&VARIANTS)
    }

    pub fn labeled_eids() -> Self {
        Self::new(&LABELED_EIDS)
    }

    fn try_load(
        &self,
        record: &dyn RecordAccessor,
    ) -> StoreResult<Option<PatientData<SubRecord>>> {
        let entries: Vec<SubRecord> = record
            .sub_records(self.group.class)?
            .into_iter()
            .filter(|entry| self.group.key(entry).is_some())
            .collect();
        Ok((!entries.is_empty()).then(|| PatientData::indexed(self.group.name, entries)))
    }

    fn planned_entries(
        &self,
        record: &dyn RecordAccessor,
        data: Option<&PatientData<SubRecord>>,
        policy: PatientWritePolicy,
    ) -> StoreResult<Option<Vec<SubRecord>>> {
        let incoming: Vec<SubRecord> = match data {
            Some(data) => data.iter().cloned().collect(),
            None if policy == PatientWritePolicy::Replace => Vec::new(),
            None => return Ok(None),
        };
        let base = match policy {
            PatientWritePolicy::Merge => record.sub_records(self.group.class)?,
            _ => Vec::new(),
        };
        Ok(Some(self.group.merge(base, &incoming)))
    }
}

impl PatientDataController for RepeatedGroupController {
    type Value = SubRecord;

    fn name(&self) -> &'static str {
        self.group.name
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![self.group.json_key]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<SubRecord>> {
        recover(self.name(), record, self.try_load(record))
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<SubRecord>>,
        policy: PatientWritePolicy,
        _facts: &RecordFacts,
    ) {
        let record_id = record.record_id().clone();
        let result = self
            .planned_entries(&*record, data, policy)
            .and_then(|entries| match entries {
                Some(entries) => replace_sub_records(record, self.group.class, entries),
                None => Ok(()),
            });
        report(self.name(), &record_id, result);
    }

    fn write_json(
        &self,
        data: &PatientData<SubRecord>,
        json: &mut Map<String, Value>,
        _selection: Option<&FieldSelection>,
    ) {
        let entries: Vec<Value> = data.iter().map(|e| self.group.entry_to_json(e)).collect();
        if !entries.is_empty() {
            json.insert(self.group.json_key.to_string(), Value::Array(entries));
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<SubRecord>> {
        let items = json.get(self.group.json_key)?.as_array()?;
        let entries = items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|obj| self.group.entry_from_json(obj))
            .collect();
        Some(PatientData::indexed(self.group.name, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FailingRecord;
    use pheno_store::PatientRecord;
    use serde_json::json;

    fn import(
        controller: &RepeatedGroupController,
        record: &mut dyn RecordAccessor,
        payload: Value,
        policy: PatientWritePolicy,
    ) {
        let data = controller.read_json(payload.as_object().unwrap());
        controller.save(record, data.as_ref(), policy, &RecordFacts::default());
    }

    fn export(controller: &RepeatedGroupController, record: &dyn RecordAccessor) -> Value {
        let mut json = Map::new();
        if let Some(data) = controller.load(record, &RecordFacts::default()) {
            controller.write_json(&data, &mut json, None);
        }
        Value::Object(json)
    }

    #[test]
    fn merge_overlays_entries_by_label() {
        let controller = RepeatedGroupController::labeled_eids();
        let mut record = PatientRecord::new();
        import(
            &controller,
            &mut record,
            json!({"labeled_eids": [
                {"label": "MRN", "value": "123"},
                {"label": "Biobank", "value": "B-9"},
            ]}),
            PatientWritePolicy::Update,
        );

        import(
            &controller,
            &mut record,
            json!({"labeled_eids": [
                {"label": "MRN", "value": "456"},
                {"label": "Study", "value": "S-1"},
            ]}),
            PatientWritePolicy::Merge,
        );

        assert_eq!(
            export(&controller, &record),
            json!({"labeled_eids": [
                {"label": "MRN", "value": "456"},
                {"label": "Biobank", "value": "B-9"},
                {"label": "Study", "value": "S-1"},
            ]})
        );
    }

    #[test]
    fn merge_keeps_fields_missing_from_the_incoming_entry() {
        let controller = RepeatedGroupController::variants();
        let mut record = PatientRecord::new();
        import(
            &controller,
            &mut record,
            json!({"variants": [{
                "gene": "ENSG00000012048",
                "cdna": "c.68_69delAG",
                "zygosity": "heterozygous",
                "evidence": ["rare", "predicted"],
            }]}),
            PatientWritePolicy::Update,
        );

        import(
            &controller,
            &mut record,
            json!({"variants": [{
                "gene": "ENSG00000012048",
                "cdna": "c.68_69delAG",
                "interpretation": "pathogenic",
            }]}),
            PatientWritePolicy::Merge,
        );

        assert_eq!(
            export(&controller, &record),
            json!({"variants": [{
                "gene": "ENSG00000012048",
                "cdna": "c.68_69delAG",
                "zygosity": "heterozygous",
                "interpretation": "pathogenic",
                "evidence": ["rare", "predicted"],
            }]})
        );
    }

    #[test]
    fn merge_with_nothing_stored_equals_replace() {
        let payload = json!({"variants": [
            {"gene": "ENSG00000139618", "cdna": "c.1A>G"},
            {"gene": "ENSG00000139618", "protein": "p.?"},
        ]});

        let controller = RepeatedGroupController::variants();
        let mut merged = PatientRecord::new();
        let mut replaced = PatientRecord::new();
        import(&controller, &mut merged, payload.clone(), PatientWritePolicy::Merge);
        import(&controller, &mut replaced, payload, PatientWritePolicy::Replace);

        assert_eq!(
            merged.sub_records(GENE_VARIANT_CLASS).unwrap(),
            replaced.sub_records(GENE_VARIANT_CLASS).unwrap()
        );
        assert_eq!(merged.sub_records(GENE_VARIANT_CLASS).unwrap().len(), 1);
    }

    #[test]
    fn update_replaces_the_stored_list() {
        let controller = RepeatedGroupController::labeled_eids();
        let mut record = PatientRecord::new();
        import(
            &controller,
            &mut record,
            json!({"labeled_eids": [{"label": "MRN", "value": "1"}]}),
            PatientWritePolicy::Update,
        );
        import(
            &controller,
            &mut record,
            json!({"labeled_eids": []}),
            PatientWritePolicy::Update,
        );
        assert!(record.sub_records(LABELED_IDENTIFIER_CLASS).unwrap().is_empty());

        import(&controller, &mut record, json!({}), PatientWritePolicy::Update);
        assert_eq!(export(&controller, &record), json!({}));
    }

    #[test]
    fn failing_merge_leaves_the_record_untouched() {
        let controller = RepeatedGroupController::labeled_eids();
        let mut inner = PatientRecord::new();
        inner
            .new_sub_record(
                LABELED_IDENTIFIER_CLASS,
                SubRecord::new()
                    .with("label", FieldValue::from("MRN"))
                    .with("value", FieldValue::from("1")),
            )
            .unwrap();
        let mut record = FailingRecord::reads(inner.clone());

        import(
            &controller,
            &mut record,
            json!({"labeled_eids": [{"label": "MRN", "value": "2"}]}),
            PatientWritePolicy::Merge,
        );

        assert_eq!(record.writes, 0);
        assert_eq!(record.inner, inner);
    }
}
