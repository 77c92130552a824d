// Файл: crates/barrel_index/src/lexicon.rs
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::corpus::Document;
use crate::error::{IndexError, Result};
use crate::normalizer::NormalizerKind;
use crate::persist::{read_json, write_json_atomic};
use crate::{Freq, TermId};

/// Словарь term <-> term_id. term_id = позиция в `terms` + 1.
/// После сохранения только читается.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    terms: Vec<String>,
    ids: HashMap<String, TermId>,
}

/// Формат на диске: `{"lexicon": ["term", ...]}`
#[derive(Serialize, Deserialize)]
struct LexiconFile {
    lexicon: Vec<String>,
}

impl Lexicon {
    /// Id раздаются в лексикографическом порядке, независимо от порядка входа.
    pub fn from_terms<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = terms
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !t.is_empty())
            .collect();
        if set.is_empty() {
            return Err(IndexError::EmptyLexicon);
        }
        Ok(Self::from_ordered(set.into_iter().collect()))
    }

    pub fn from_corpus(docs: &[Document], normalizer: NormalizerKind) -> Result<Self> {
        let counts = term_counts(docs, normalizer);
        let lex = Self::from_terms(counts.into_keys())?;
        info!(terms = lex.len(), docs = docs.len(), "lexicon built");
        Ok(lex)
    }

    fn from_ordered(terms: Vec<String>) -> Self {
        let ids = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as TermId + 1))
            .collect();
        Self { terms, ids }
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        let ix = (id as usize).checked_sub(1)?;
        self.terms.get(ix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// (term_id, term) по возрастанию id
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &str)> {
        self.terms
            .iter()
            .enumerate()
            .map(|(i, t)| (i as TermId + 1, t.as_str()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(
            path,
            &LexiconFile {
                lexicon: self.terms.clone(),
            },
        )?;
        Ok(())
    }

    /// Порядок в файле сохраняется как есть: id уже назначены при сборке.
    pub fn load(path: &Path) -> Result<Self> {
        let file: LexiconFile = read_json(path)?;
        if file.lexicon.is_empty() {
            return Err(IndexError::EmptyLexicon);
        }
        let lex = Self::from_ordered(file.lexicon);
        if lex.ids.len() != lex.terms.len() {
            return Err(IndexError::malformed(path, "duplicate terms in lexicon"));
        }
        if lex.terms.iter().any(String::is_empty) {
            return Err(IndexError::malformed(path, "empty term in lexicon"));
        }
        Ok(lex)
    }
}

/// Суммарные вхождения каждого терма по корпусу
pub fn term_counts(docs: &[Document], normalizer: NormalizerKind) -> HashMap<String, u64> {
    docs.par_iter()
        .map(|d| normalizer.term_frequencies(&d.read_text()))
        .fold(HashMap::new, |mut acc: HashMap<String, u64>, tf: HashMap<String, Freq>| {
            for (t, f) in tf {
                *acc.entry(t).or_insert(0) += f as u64;
            }
            acc
        })
        .reduce(HashMap::new, |mut a, b| {
            for (t, f) in b {
                *a.entry(t).or_insert(0) += f;
            }
            a
        })
}
