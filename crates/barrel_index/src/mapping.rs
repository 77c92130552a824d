// Файл: crates/barrel_index/src/mapping.rs
use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{IndexError, Result};
use crate::lexicon::Lexicon;
use crate::partition::PartitionScheme;
use crate::persist::{read_json, write_json_atomic};
use crate::{PartitionId, TermId};

/// term_id -> номер барреля, вычисленный по тексту терма
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarrelMapping {
    #[serde(with = "crate::persist::string_keys")]
    entries: BTreeMap<TermId, PartitionId>,
}

impl BarrelMapping {
    pub fn from_lexicon(lexicon: &Lexicon, scheme: &PartitionScheme) -> Self {
        let entries: BTreeMap<TermId, PartitionId> = lexicon
            .iter()
            .map(|(id, term)| (id, scheme.barrel_of(term)))
            .collect();
        info!(
            terms = entries.len(),
            partitions = scheme.partitions(),
            "barrel mapping built"
        );
        Self { entries }
    }

    pub fn get(&self, term_id: TermId) -> Option<PartitionId> {
        self.entries.get(&term_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, PartitionId)> + '_ {
        self.entries.iter().map(|(&t, &p)| (t, p))
    }

    pub fn remove(&mut self, term_id: TermId) -> Option<PartitionId> {
        self.entries.remove(&term_id)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)?;
        Ok(())
    }

    /// Номера вне схемы: битый артефакт
    pub fn load(path: &Path, scheme: &PartitionScheme) -> Result<Self> {
        let m: BarrelMapping = read_json(path)?;
        if let Some((t, p)) = m.iter().find(|(_, p)| !scheme.contains(*p)) {
            return Err(IndexError::malformed(
                path,
                format!(
                    "term {t} mapped to barrel {p}, scheme has {}",
                    scheme.partitions()
                ),
            ));
        }
        Ok(m)
    }
}
