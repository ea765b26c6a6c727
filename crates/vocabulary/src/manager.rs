//! Vocabulary routing.
//!
//! The manager holds every configured vocabulary and answers "what is this?" for an identifier
//! or a piece of free text:
//!
//! 1. If an id prefix is owned by a vocabulary, that vocabulary is asked for the id.
//! 2. Otherwise (or if the id is unknown) every vocabulary is searched for an exact text match,
//!    in registration order.
//!
//! Vocabularies can be loaded from a YAML document:
//!
//! ```text
//! vocabularies:
//!   - identifier: hpo
//!     prefixes: ["HP:"]
//!     terms:
//!       - id: HP:0001250
//!         name: Seizure
//!         ancestors: [HP:0012638, HP:0000118]
//! ```

use crate::{InMemoryVocabulary, Vocabulary, VocabularyError, VocabularyResult, VocabularyTerm};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Registry of vocabularies with id-prefix routing.
#[derive(Clone, Default)]
pub struct VocabularyManager {
    vocabularies: Vec<Arc<dyn Vocabulary>>,
}

impl std::fmt::Debug for VocabularyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VocabularyManager")
            .field(
                "vocabularies",
                &self
                    .vocabularies
                    .iter()
                    .map(|v| v.identifier())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl VocabularyManager {
    /// Creates a manager with no vocabularies; every lookup fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`VocabularyError::DuplicateVocabulary`] if the identifier is already taken.
    pub fn register(&mut self, vocabulary: Arc<dyn Vocabulary>) -> VocabularyResult<()> {
        if self.vocabulary(vocabulary.identifier()).is_some() {
            return Err(VocabularyError::DuplicateVocabulary(
                vocabulary.identifier().to_string(),
            ));
        }
        self.vocabularies.push(vocabulary);
        Ok(())
    }

    /// Returns a vocabulary by identifier.
    pub fn vocabulary(&self, identifier: &str) -> Option<&Arc<dyn Vocabulary>> {
        self.vocabularies
            .iter()
            .find(|v| v.identifier() == identifier)
    }

    /// Looks a term up by id, in the vocabulary owning the id's prefix.
    pub fn get_term(&self, id: &str) -> Option<VocabularyTerm> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        self.vocabularies
            .iter()
            .filter(|v| v.owns(id))
            .find_map(|v| v.get_term(id))
    }

    /// True if some vocabulary owns the prefix of `id`, whether or not the term is known.
    pub fn recognises(&self, id: &str) -> bool {
        let id = id.trim();
        !id.is_empty() && self.vocabularies.iter().any(|v| v.owns(id))
    }

    /// Resolves an identifier or free text to a term.
    pub fn resolve_term(&self, id_or_text: &str) -> Option<VocabularyTerm> {
        let input = id_or_text.trim();
        if input.is_empty() {
            return None;
        }
        self.get_term(input).or_else(|| {
            self.vocabularies
                .iter()
                .find_map(|v| v.search_exact(input))
        })
    }

    /// Resolves free text within one vocabulary only.
    pub fn search_in(&self, identifier: &str, text: &str) -> Option<VocabularyTerm> {
        let vocabulary = self.vocabulary(identifier)?;
        vocabulary
            .get_term(text.trim())
            .or_else(|| vocabulary.search_exact(text))
    }

    /// Parses vocabularies from YAML text.
    pub fn from_yaml_str(yaml_text: &str) -> VocabularyResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let wire = match serde_path_to_error::deserialize::<_, VocabulariesWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                return Err(VocabularyError::Translation(format!(
                    "vocabulary schema mismatch at {path}: {source}"
                )));
            }
        };

        let mut manager = Self::new();
        for vocabulary in wire.vocabularies {
            let count = vocabulary.terms.len();
            manager.register(Arc::new(InMemoryVocabulary::with_terms(
                vocabulary.identifier.clone(),
                vocabulary.prefixes,
                vocabulary.terms,
            )))?;
            tracing::debug!("loaded vocabulary {} ({} terms)", vocabulary.identifier, count);
        }
        Ok(manager)
    }

    /// Reads vocabularies from a YAML file.
    pub fn from_yaml_file(path: &Path) -> VocabularyResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VocabulariesWire {
    #[serde(default)]
    vocabularies: Vec<VocabularyWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VocabularyWire {
    identifier: String,
    #[serde(default)]
    prefixes: Vec<String>,
    #[serde(default)]
    terms: Vec<VocabularyTerm>,
}
