// Файл: crates/barrel_index/src/inverted.rs
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::forward::{DocRecord, ForwardIndex};
use crate::persist::{read_json, write_json_atomic};
use crate::{DocId, Freq, Posting, TermId};

/// doc_id -> частота
pub type PostingList = BTreeMap<DocId, Freq>;

/// term_id -> (doc_id -> частота)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    #[serde(with = "crate::persist::nested_string_keys")]
    postings: BTreeMap<TermId, PostingList>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Каждая пара (term_id, doc_id) пишется один раз на документ
    pub fn add_document(&mut self, doc: &DocRecord) {
        for (&term_id, &freq) in &doc.terms {
            self.postings
                .entry(term_id)
                .or_default()
                .insert(doc.doc_id, freq);
        }
    }

    pub fn from_forward(fwd: &ForwardIndex) -> Self {
        let mut idx = Self::new();
        for doc in &fwd.documents {
            idx.add_document(doc);
        }
        info!(
            terms = idx.term_count(),
            postings = idx.posting_count(),
            "inverted index built"
        );
        idx
    }

    /// Слияние аккумуляторов разных воркеров. Документы воркеров не пересекаются.
    pub fn merge(&mut self, other: InvertedIndex) {
        for (term_id, list) in other.postings {
            self.postings.entry(term_id).or_default().extend(list);
        }
    }

    pub fn postings(&self, term_id: TermId) -> Option<&PostingList> {
        self.postings.get(&term_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, &PostingList)> {
        self.postings.iter().map(|(&t, l)| (t, l))
    }

    pub fn term_ids(&self) -> impl Iterator<Item = TermId> + '_ {
        self.postings.keys().copied()
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    pub fn posting_count(&self) -> usize {
        self.postings.values().map(BTreeMap::len).sum()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }
}

pub fn to_postings(list: &PostingList) -> Vec<Posting> {
    list.iter()
        .map(|(&doc_id, &freq)| Posting { doc_id, freq })
        .collect()
}
