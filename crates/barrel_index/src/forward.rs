// Файл: crates/barrel_index/src/forward.rs
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::corpus::Document;
use crate::error::{IndexError, Result};
use crate::lexicon::Lexicon;
use crate::normalizer::NormalizerKind;
use crate::persist::{read_json, write_json_atomic};
use crate::{DocId, Freq, TermId};

/// Прямой индекс одного документа: term_id -> частота
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocRecord {
    pub doc_id: DocId,
    pub file: String,
    #[serde(with = "crate::persist::string_keys")]
    pub terms: BTreeMap<TermId, Freq>,
}

impl DocRecord {
    /// Термы вне лексикона молча пропускаются: у них нет id.
    pub fn from_frequencies(doc: &Document, tf: &HashMap<String, Freq>, lexicon: &Lexicon) -> Self {
        let terms = tf
            .iter()
            .filter(|(_, f)| **f > 0)
            .filter_map(|(t, &f)| lexicon.term_id(t).map(|id| (id, f)))
            .collect();
        Self {
            doc_id: doc.doc_id,
            file: doc.path.to_string_lossy().into_owned(),
            terms,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardIndex {
    pub documents: Vec<DocRecord>,
}

impl ForwardIndex {
    /// Документы обрабатываются независимо; результат всегда в порядке doc_id.
    pub fn build(
        docs: &[Document],
        lexicon: &Lexicon,
        normalizer: NormalizerKind,
        parallel: bool,
    ) -> Self {
        let one = |d: &Document| {
            let tf = normalizer.term_frequencies(&d.read_text());
            let rec = DocRecord::from_frequencies(d, &tf, lexicon);
            debug!(doc_id = d.doc_id, terms = rec.terms.len(), "indexed");
            rec
        };
        let mut documents: Vec<DocRecord> = if parallel {
            docs.par_iter().map(one).collect()
        } else {
            docs.iter().map(one).collect()
        };
        documents.sort_by_key(|r| r.doc_id);
        info!(docs = documents.len(), "forward index built");
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let fwd: ForwardIndex = read_json(path)?;
        for pair in fwd.documents.windows(2) {
            if pair[0].doc_id >= pair[1].doc_id {
                return Err(IndexError::malformed(path, "documents not in doc_id order"));
            }
        }
        Ok(fwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn doc(id: DocId) -> Document {
        Document {
            doc_id: id,
            path: PathBuf::from(format!("d{id}.txt")),
        }
    }

    #[test]
    fn unknown_terms_are_excluded() {
        let lex = Lexicon::from_terms(["fast", "spread"]).unwrap();
        let tf = NormalizerKind::Ascii.term_frequencies("spread spread unknown");
        let rec = DocRecord::from_frequencies(&doc(4), &tf, &lex);
        assert_eq!(rec.doc_id, 4);
        assert_eq!(rec.terms.len(), 1);
        assert_eq!(rec.terms[&2], 2);
    }

    #[test]
    fn build_preserves_doc_order() {
        let dir = tempdir().unwrap();
        let mut docs = Vec::new();
        for (i, text) in ["Virus Virus Spread", "Spread Fast", "fast"].iter().enumerate() {
            let p = dir.path().join(format!("{i}.txt"));
            fs::write(&p, text).unwrap();
            docs.push(Document {
                doc_id: i as DocId + 1,
                path: p,
            });
        }
        let lex = Lexicon::from_corpus(&docs, NormalizerKind::Ascii).unwrap();
        let fwd = ForwardIndex::build(&docs, &lex, NormalizerKind::Ascii, true);
        assert_eq!(
            fwd.documents.iter().map(|d| d.doc_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        let virus = lex.term_id("virus").unwrap();
        assert_eq!(fwd.documents[0].terms[&virus], 2);
        assert_eq!(fwd, ForwardIndex::build(&docs, &lex, NormalizerKind::Ascii, false));
    }

    #[test]
    fn artifact_uses_string_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forward_index.json");
        let mut terms = BTreeMap::new();
        terms.insert(3, 2);
        terms.insert(10, 1);
        let fwd = ForwardIndex {
            documents: vec![DocRecord {
                doc_id: 1,
                file: "a.txt".into(),
                terms,
            }],
        };
        fwd.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["documents"][0]["terms"]["3"], 2);
        assert_eq!(raw["documents"][0]["doc_id"], 1);
        assert_eq!(ForwardIndex::load(&path).unwrap(), fwd);
    }

    #[test]
    fn non_numeric_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forward_index.json");
        fs::write(
            &path,
            r#"{"documents":[{"doc_id":1,"file":"a","terms":{"x":1}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            ForwardIndex::load(&path).unwrap_err(),
            IndexError::Json { .. }
        ));
    }
}
