//! Shared fixtures for unit tests.

use pheno_store::{
    FieldValue, PatientRecord, RecordAccessor, RecordId, StoreError, StoreResult, SubRecord,
};
use pheno_vocabulary::VocabularyManager;
use std::sync::Arc;

const VOCABULARIES: &str = r#"vocabularies:
  - identifier: hpo
    prefixes: ["HP:"]
    terms:
      - id: "HP:0001250"
        name: Seizure
        synonyms: [Seizures]
        ancestors: ["HP:0000118"]
      - id: "HP:0000252"
        name: Microcephaly
        ancestors: ["HP:0000118"]
      - id: "HP:0002861"
        name: Melanoma
        ancestors: ["HP:0002664"]
      - id: "HP:0100013"
        name: Neoplasm of the breast
        ancestors: ["HP:0002664"]
      - id: "HP:0003593"
        name: Infantile onset
      - id: "HP:0003577"
        name: Congenital onset
      - id: "HP:0000006"
        name: Autosomal dominant inheritance
  - identifier: omim
    prefixes: ["MIM:", "OMIM:"]
    terms:
      - id: "MIM:114480"
        name: Breast cancer
      - id: "MIM:300672"
        name: Developmental and epileptic encephalopathy 2
  - identifier: hgnc
    prefixes: ["HGNC:", "ENSG"]
    terms:
      - id: "HGNC:1100"
        name: BRCA1 DNA repair associated
        alt_ids: [ENSG00000012048]
        attributes:
          symbol: BRCA1
          ensembl_gene_id: ENSG00000012048
      - id: "HGNC:1101"
        name: BRCA2 DNA repair associated
        alt_ids: [ENSG00000139618]
        attributes:
          symbol: BRCA2
          ensembl_gene_id: ENSG00000139618
"#;

/// A small vocabulary set covering the terms the tests refer to.
pub(crate) fn vocabulary() -> Arc<VocabularyManager> {
    Arc::new(VocabularyManager::from_yaml_str(VOCABULARIES).expect("fixture vocabularies"))
}

/// A record accessor whose reads and/or writes fail.
///
/// Wraps a real record so that tests can check what was (not) written.
pub(crate) struct FailingRecord {
    pub inner: PatientRecord,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub writes: usize,
}

impl FailingRecord {
    pub fn reads(inner: PatientRecord) -> Self {
        Self {
            inner,
            fail_reads: true,
            fail_writes: false,
            writes: 0,
        }
    }

    pub fn writes(inner: PatientRecord) -> Self {
        Self {
            inner,
            fail_reads: false,
            fail_writes: true,
            writes: 0,
        }
    }

    fn read(&self) -> StoreResult<()> {
        if self.fail_reads {
            return Err(StoreError::Access("read refused".into()));
        }
        Ok(())
    }

    fn write(&mut self) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Access("write refused".into()));
        }
        self.writes += 1;
        Ok(())
    }
}

impl RecordAccessor for FailingRecord {
    fn record_id(&self) -> &RecordId {
        self.inner.id()
    }

    fn get_field(&self, class: &str, field: &str) -> StoreResult<Option<FieldValue>> {
        self.read()?;
        self.inner.get_field(class, field)
    }

    fn set_field(
        &mut self,
        class: &str,
        field: &str,
        value: Option<FieldValue>,
    ) -> StoreResult<()> {
        self.write()?;
        self.inner.set_field(class, field, value)
    }

    fn sub_records(&self, class: &str) -> StoreResult<Vec<SubRecord>> {
        self.read()?;
        self.inner.sub_records(class)
    }

    fn new_sub_record(&mut self, class: &str, sub_record: SubRecord) -> StoreResult<()> {
        self.write()?;
        self.inner.new_sub_record(class, sub_record)
    }

    fn remove_sub_records(&mut self, class: &str) -> StoreResult<()> {
        self.write()?;
        self.inner.remove_sub_records(class)
    }
}
