//! Genes of interest, one sub-record per gene.

use crate::constants::GENE_CLASS;
use crate::controllers::{
    list_value, recover, report, replace_sub_records, PatientDataController, RecordFacts,
};
use crate::values::PhenoTipsGene;
use crate::{FieldSelection, PatientData, PatientWritePolicy};
use pheno_store::{FieldValue, RecordAccessor, StoreResult, SubRecord};
use pheno_vocabulary::VocabularyManager;
use serde_json::{Map, Value};
use std::sync::Arc;

const JSON_KEY: &str = "genes";

const GENE: &str = "gene";
const STATUS: &str = "status";
const STRATEGY: &str = "strategy";
const COMMENTS: &str = "comments";

/// Gene list keyed by the gene's resolved id.
///
/// UPDATE and REPLACE write the incoming list as the complete set of genes. MERGE overlays the
/// incoming entries onto the stored ones, keeping stored fields the incoming entry leaves out.
#[derive(Clone, Debug)]
pub struct GenesController {
    vocabulary: Arc<VocabularyManager>,
}

impl GenesController {
    pub fn new(vocabulary: Arc<VocabularyManager>) -> Self {
        Self { vocabulary }
    }

    fn from_sub_record(&self, entry: &SubRecord) -> Option<PhenoTipsGene> {
        let gene = entry.text(GENE)?;
        Some(
            PhenoTipsGene::resolve(&gene, &self.vocabulary)
                .with_status(entry.text(STATUS).as_deref())
                .with_strategy(entry.list(STRATEGY))
                .with_comment(entry.text(COMMENTS).as_deref()),
        )
    }

    fn to_sub_record(gene: &PhenoTipsGene) -> SubRecord {
        let mut entry = SubRecord::new()
            .with(GENE, FieldValue::from(gene.id()))
            .with(STATUS, FieldValue::from(gene.status_or_default()))
            .with(COMMENTS, gene.comment().map(FieldValue::from));
        entry.set(STRATEGY, list_value(gene.strategy().to_vec()));
        entry
    }

    fn stored_genes(&self, record: &dyn RecordAccessor) -> StoreResult<Vec<PhenoTipsGene>> {
        Ok(record
            .sub_records(GENE_CLASS)?
            .iter()
            .filter_map(|entry| self.from_sub_record(entry))
            .collect())
    }

    fn try_save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<PhenoTipsGene>>,
        policy: PatientWritePolicy,
    ) -> StoreResult<()> {
        let incoming: Vec<&PhenoTipsGene> = match data {
            Some(data) => data.iter().collect(),
            None if policy == PatientWritePolicy::Replace => Vec::new(),
            None => return Ok(()),
        };
        let mut genes = match policy {
            PatientWritePolicy::Merge => self.stored_genes(&*record)?,
            _ => Vec::new(),
        };
        for gene in incoming {
            match genes.iter_mut().find(|g| g.id() == gene.id()) {
                Some(existing) => existing.merge_data(gene),
                None => genes.push(gene.clone()),
            }
        }
        replace_sub_records(record, GENE_CLASS, genes.iter().map(Self::to_sub_record).collect())
    }
}

impl PatientDataController for GenesController {
    type Value = PhenoTipsGene;

    fn name(&self) -> &'static str {
        "genes"
    }

    fn json_keys(&self) -> Vec<&'static str> {
        vec![JSON_KEY]
    }

    fn load(
        &self,
        record: &dyn RecordAccessor,
        _facts: &RecordFacts,
    ) -> Option<PatientData<PhenoTipsGene>> {
        let result = self
            .stored_genes(record)
            .map(|genes| (!genes.is_empty()).then(|| PatientData::indexed(JSON_KEY, genes)));
        recover(self.name(), record, result)
    }

    fn save(
        &self,
        record: &mut dyn RecordAccessor,
        data: Option<&PatientData<PhenoTipsGene>>,
        policy: PatientWritePolicy,
        _facts: &RecordFacts,
    ) {
        let record_id = record.record_id().clone();
        let result = self.try_save(record, data, policy);
        report(self.name(), &record_id, result);
    }

    fn write_json(
        &self,
        data: &PatientData<PhenoTipsGene>,
        json: &mut Map<String, Value>,
        _selection: Option<&FieldSelection>,
    ) {
        if !data.is_empty() {
            let genes = data.iter().map(PhenoTipsGene::to_json).collect();
            json.insert(JSON_KEY.to_string(), Value::Array(genes));
        }
    }

    fn read_json(&self, json: &Map<String, Value>) -> Option<PatientData<PhenoTipsGene>> {
        let items = json.get(JSON_KEY)?.as_array()?;
        let genes = items
            .iter()
            .filter_map(|item| PhenoTipsGene::from_json(item, &self.vocabulary))
            .collect();
        Some(PatientData::indexed(JSON_KEY, genes))
    }
}
