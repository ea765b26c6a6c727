//! Gene entries.

use crate::json;
use pheno_vocabulary::VocabularyManager;
use serde_json::{Map, Value};

/// Allowed gene statuses.
pub const GENE_STATUSES: &[&str] = &[
    "candidate",
    "rejected",
    "rejected_candidate",
    "solved",
    "carrier",
    "previously_tested",
];

/// Allowed testing strategies.
pub const GENE_STRATEGIES: &[&str] = &[
    "sequencing",
    "deletion",
    "familial_mutation",
    "common_mutations",
];

/// Vocabulary gene symbols and Ensembl ids are looked up in.
pub const GENE_VOCABULARY: &str = "hgnc";

/// Status written when an entry carries none.
pub const DEFAULT_GENE_STATUS: &str = "candidate";

/// One gene of interest for a patient.
///
/// `id` is the gene's Ensembl id when the symbol resolves through the gene vocabulary; an
/// unresolved symbol is kept as both id and name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhenoTipsGene {
    id: String,
    name: String,
    status: Option<String>,
    strategy: Vec<String>,
    comment: Option<String>,
}

impl PhenoTipsGene {
    /// Resolves a gene symbol or identifier.
    pub fn resolve(id_or_symbol: &str, vocabulary: &VocabularyManager) -> Self {
        let text = id_or_symbol.trim();
        let resolved = vocabulary.search_in(GENE_VOCABULARY, text).and_then(|term| {
            let ensembl = term.attribute("ensembl_gene_id")?.to_string();
            let symbol = term
                .attribute("symbol")
                .map(str::to_string)
                .unwrap_or(term.name);
            Some((ensembl, symbol))
        });

        let (id, name) = resolved.unwrap_or_else(|| (text.to_string(), text.to_string()));
        Self {
            id,
            name,
            ..Self::default()
        }
    }

    /// Sets the status; values outside [`GENE_STATUSES`] are dropped.
    pub fn with_status(mut self, status: Option<&str>) -> Self {
        self.status = status
            .map(str::trim)
            .filter(|s| GENE_STATUSES.contains(s))
            .map(str::to_string);
        self
    }

    /// Sets the strategies; values outside [`GENE_STRATEGIES`] are dropped.
    pub fn with_strategy<I, S>(mut self, strategy: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.strategy = Vec::new();
        for s in strategy {
            let s = s.as_ref().trim();
            if GENE_STRATEGIES.contains(&s) && !self.strategy.iter().any(|k| k == s) {
                self.strategy.push(s.to_string());
            }
        }
        self
    }

    pub fn with_comment(mut self, comment: Option<&str>) -> Self {
        self.comment = comment
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        self
    }

    /// Reads `{"id" | "gene", "status", "strategy", "comments"}`.
    ///
    /// Entries naming no gene are skipped.
    pub fn from_json(value: &Value, vocabulary: &VocabularyManager) -> Option<Self> {
        let obj = value.as_object()?;
        let gene = json::text_at(obj, "id").or_else(|| json::text_at(obj, "gene"))?;
        Some(
            Self::resolve(&gene, vocabulary)
                .with_status(json::text_at(obj, "status").as_deref())
                .with_strategy(obj.get("strategy").map(json::string_list).unwrap_or_default())
                .with_comment(json::text_at(obj, "comments").as_deref()),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// The status to store: the entry's own, or [`DEFAULT_GENE_STATUS`].
    pub fn status_or_default(&self) -> &str {
        self.status().unwrap_or(DEFAULT_GENE_STATUS)
    }

    pub fn strategy(&self) -> &[String] {
        &self.strategy
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Overlays the non-empty fields of `other` onto this entry.
    pub fn merge_data(&mut self, other: &PhenoTipsGene) {
        if !other.name.is_empty() {
            self.name = other.name.clone();
        }
        if other.status.is_some() {
            self.status = other.status.clone();
        }
        if !other.strategy.is_empty() {
            self.strategy = other.strategy.clone();
        }
        if other.comment.is_some() {
            self.comment = other.comment.clone();
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), Value::String(self.id.clone()));
        obj.insert("gene".into(), Value::String(self.name.clone()));
        if let Some(status) = &self.status {
            obj.insert("status".into(), Value::String(status.clone()));
        }
        if !self.strategy.is_empty() {
            obj.insert(
                "strategy".into(),
                Value::Array(self.strategy.iter().cloned().map(Value::String).collect()),
            );
        }
        if let Some(comment) = &self.comment {
            obj.insert("comments".into(), Value::String(comment.clone()));
        }
        Value::Object(obj)
    }
}
