//! The vocabulary contract and its in-memory implementation.

use crate::VocabularyTerm;
use std::collections::HashMap;

/// A source of vocabulary terms.
pub trait Vocabulary: Send + Sync {
    /// Short identifier of the vocabulary (e.g. `hpo`, `hgnc`).
    fn identifier(&self) -> &str;

    /// Id prefixes owned by this vocabulary (e.g. `HP:`).
    fn prefixes(&self) -> &[String];

    /// Looks a term up by its id or one of its alternative ids.
    fn get_term(&self, id: &str) -> Option<VocabularyTerm>;

    /// Looks a term up by exact text: name, synonym or symbol, ignoring case.
    fn search_exact(&self, text: &str) -> Option<VocabularyTerm>;

    /// True if `id` starts with one of this vocabulary's prefixes.
    fn owns(&self, id: &str) -> bool {
        self.prefixes().iter().any(|p| id.starts_with(p.as_str()))
    }
}

/// Vocabulary held entirely in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryVocabulary {
    identifier: String,
    prefixes: Vec<String>,
    terms: Vec<VocabularyTerm>,
    by_id: HashMap<String, usize>,
    by_text: HashMap<String, usize>,
}

impl InMemoryVocabulary {
    pub fn new(identifier: impl Into<String>, prefixes: Vec<String>) -> Self {
        Self {
            identifier: identifier.into(),
            prefixes,
            ..Self::default()
        }
    }

    /// Builds a vocabulary from a list of terms. Later terms win on duplicate ids or labels.
    pub fn with_terms(
        identifier: impl Into<String>,
        prefixes: Vec<String>,
        terms: impl IntoIterator<Item = VocabularyTerm>,
    ) -> Self {
        let mut vocabulary = Self::new(identifier, prefixes);
        for term in terms {
            vocabulary.insert(term);
        }
        vocabulary
    }

    /// Adds a term and indexes its ids and labels.
    pub fn insert(&mut self, term: VocabularyTerm) {
        let index = self.terms.len();

        self.by_id.insert(term.id.clone(), index);
        for alt_id in &term.alt_ids {
            self.by_id.insert(alt_id.clone(), index);
        }

        let labels = std::iter::once(&term.name)
            .chain(term.synonyms.iter())
            .chain(term.attributes.get("symbol"));
        for label in labels {
            let key = normalise(label);
            if !key.is_empty() {
                self.by_text.insert(key, index);
            }
        }

        self.terms.push(term);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Vocabulary for InMemoryVocabulary {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    fn get_term(&self, id: &str) -> Option<VocabularyTerm> {
        self.by_id
            .get(id.trim())
            .and_then(|&i| self.terms.get(i))
            .cloned()
    }

    fn search_exact(&self, text: &str) -> Option<VocabularyTerm> {
        self.by_text
            .get(&normalise(text))
            .and_then(|&i| self.terms.get(i))
            .cloned()
    }
}

fn normalise(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genes() -> InMemoryVocabulary {
        InMemoryVocabulary::with_terms(
            "hgnc",
            vec!["HGNC:".into(), "ENSG".into()],
            [VocabularyTerm::new("HGNC:1100", "BRCA1 DNA repair associated")
                .with_alt_id("ENSG00000012048")
                .with_attribute("symbol", "BRCA1")
                .with_attribute("ensembl_gene_id", "ENSG00000012048")],
        )
    }

    #[test]
    fn finds_terms_by_id_and_alternative_id() {
        let vocabulary = genes();
        assert_eq!(vocabulary.get_term("HGNC:1100").unwrap().id, "HGNC:1100");
        assert_eq!(
            vocabulary.get_term("ENSG00000012048").unwrap().id,
            "HGNC:1100"
        );
        assert!(vocabulary.get_term("HGNC:9999").is_none());
    }

    #[test]
    fn exact_search_matches_symbol_ignoring_case() {
        let vocabulary = genes();
        let term = vocabulary.search_exact("brca1").expect("symbol match");
        assert_eq!(term.attribute("ensembl_gene_id"), Some("ENSG00000012048"));
        assert!(vocabulary.search_exact("BRCA").is_none());
    }

    #[test]
    fn ownership_follows_prefixes() {
        let vocabulary = genes();
        assert!(vocabulary.owns("ENSG00000012048"));
        assert!(vocabulary.owns("HGNC:1100"));
        assert!(!vocabulary.owns("HP:0000118"));
    }
}
