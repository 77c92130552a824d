// Файл: crates/barrel_index/src/barrel.rs
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::error::{IndexError, Result};
use crate::inverted::{InvertedIndex, PostingList};
use crate::layout::{barrel_file_name, barrel_path};
use crate::lexicon::Lexicon;
use crate::manifest::{BarrelManifest, BarrelMeta, MANIFEST_VERSION};
use crate::mapping::BarrelMapping;
use crate::normalizer::NormalizerKind;
use crate::partition::PartitionScheme;
use crate::persist::{checksum, write_json_atomic};
use crate::{PartitionId, TermId};

/// Содержимое одного барреля: term_id -> постинги
pub type Barrel = BTreeMap<TermId, PostingList>;

/// Сверка инвертированного индекса с лексиконом и маппингом.
/// Всё, что попало в `unknown_terms`/`unmapped_terms`, в баррели не записано.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub assigned: usize,
    /// term_id есть в индексе, но нет в лексиконе
    pub unknown_terms: Vec<TermId>,
    /// term_id есть в индексе, но нет в barrel_mapping
    pub unmapped_terms: Vec<TermId>,
}

impl Reconciliation {
    pub fn dropped(&self) -> usize {
        self.unknown_terms.len() + self.unmapped_terms.len()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub written: Vec<PartitionId>,
    /// (barrel, причина): остальные баррели записаны несмотря на эти ошибки
    pub failed: Vec<(PartitionId, String)>,
    pub reconciliation: Reconciliation,
}

impl BuildReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<PartitionId> {
        self.failed.iter().map(|(id, _)| *id).collect()
    }
}

/// Аккумуляторы всех баррелей в памяти до записи на диск
#[derive(Debug, Clone)]
pub struct BarrelStore {
    scheme: PartitionScheme,
    normalizer: NormalizerKind,
    barrels: Vec<Barrel>,
    reconciliation: Reconciliation,
}

impl BarrelStore {
    /// Раскладывает постинги по баррелям. Маппинг, расходящийся с
    /// `scheme.barrel_of(term)`, даёт `MappingMismatch`; терм лексикона, который
    /// `normalizer` не воспроизводит, даёт `NormalizerMismatch`.
    pub fn assemble(
        inverted: &InvertedIndex,
        lexicon: &Lexicon,
        mapping: &BarrelMapping,
        scheme: PartitionScheme,
        normalizer: NormalizerKind,
    ) -> Result<Self> {
        let mut barrels: Vec<Barrel> = vec![Barrel::new(); scheme.partitions() as usize];
        let mut rec = Reconciliation::default();

        for (term_id, list) in inverted.iter() {
            let Some(term) = lexicon.term(term_id) else {
                rec.unknown_terms.push(term_id);
                continue;
            };
            if !normalizer.is_stable(term) {
                return Err(IndexError::NormalizerMismatch {
                    term_id,
                    term: term.to_string(),
                    normalizer,
                });
            }
            let Some(mapped) = mapping.get(term_id) else {
                rec.unmapped_terms.push(term_id);
                continue;
            };
            let computed = scheme.barrel_of(term);
            if mapped != computed {
                return Err(IndexError::MappingMismatch {
                    term_id,
                    term: term.to_string(),
                    mapped,
                    computed,
                });
            }
            barrels[computed as usize].insert(term_id, list.clone());
            rec.assigned += 1;
        }

        if rec.dropped() > 0 {
            warn!(
                unknown = rec.unknown_terms.len(),
                unmapped = rec.unmapped_terms.len(),
                "terms dropped from barrels"
            );
        }
        info!(
            assigned = rec.assigned,
            partitions = scheme.partitions(),
            "barrels assembled"
        );

        Ok(Self {
            scheme,
            normalizer,
            barrels,
            reconciliation: rec,
        })
    }

    pub fn scheme(&self) -> PartitionScheme {
        self.scheme
    }

    pub fn barrel(&self, id: PartitionId) -> Option<&Barrel> {
        self.barrels.get(id as usize)
    }

    pub fn reconciliation(&self) -> &Reconciliation {
        &self.reconciliation
    }

    /// Пишет все баррели (пустые как `{}`), затем manifest.json.
    /// Ошибка записи одного барреля не останавливает остальные.
    pub fn persist(&self, dir: &Path) -> Result<BuildReport> {
        fs::create_dir_all(dir).map_err(|e| IndexError::io(dir, e))?;

        let results: Vec<(PartitionId, Result<String>)> = self
            .barrels
            .par_iter()
            .enumerate()
            .map(|(i, barrel)| {
                let id = i as PartitionId;
                (id, write_json_atomic(&barrel_path(dir, id), &BarrelRef(barrel)))
            })
            .collect();

        let mut report = BuildReport {
            reconciliation: self.reconciliation.clone(),
            ..Default::default()
        };
        let mut metas = Vec::new();
        for (id, res) in results {
            match res {
                Ok(sum) => {
                    let terms = self.barrels[id as usize].len();
                    debug!(barrel = id, terms, "barrel saved");
                    metas.push(BarrelMeta {
                        id,
                        file: barrel_file_name(id),
                        terms,
                        checksum: sum,
                    });
                    report.written.push(id);
                }
                Err(err) => {
                    warn!(barrel = id, error = %err, "failed to persist barrel");
                    report.failed.push((id, err.to_string()));
                }
            }
        }

        let manifest = BarrelManifest {
            version: MANIFEST_VERSION,
            scheme: self.scheme,
            normalizer: self.normalizer,
            barrels: metas,
            failed: report.failed_ids(),
            dropped_terms: self.reconciliation.dropped(),
        };
        manifest.save(dir)?;

        info!(
            written = report.written.len(),
            failed = report.failed.len(),
            dir = %dir.display(),
            "barrels persisted"
        );
        Ok(report)
    }
}

struct BarrelRef<'a>(&'a Barrel);

impl Serialize for BarrelRef<'_> {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        crate::persist::nested_string_keys::serialize(self.0, s)
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
struct BarrelFile {
    #[serde(with = "crate::persist::nested_string_keys")]
    terms: Barrel,
}

/// Загружает ровно один баррель. Если есть манифест: проверяет,
/// что баррель не помечен сбойным, и сверяет checksum.
pub fn load_barrel(
    dir: &Path,
    id: PartitionId,
    manifest: Option<&BarrelManifest>,
) -> Result<Barrel> {
    if manifest.is_some_and(|m| m.is_failed(id)) {
        return Err(IndexError::BarrelUnavailable { id });
    }
    let path = barrel_path(dir, id);
    let bytes = match fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IndexError::BarrelMissing { id, path });
        }
        Err(e) => return Err(IndexError::io(&path, e)),
    };
    if let Some(meta) = manifest.and_then(|m| m.barrel(id)) {
        let actual = checksum(&bytes);
        if actual != meta.checksum {
            return Err(IndexError::ChecksumMismatch {
                id,
                expected: meta.checksum.clone(),
                actual,
            });
        }
    }
    let file: BarrelFile = serde_json::from_slice(&bytes).map_err(|e| IndexError::json(&path, e))?;
    Ok(file.terms)
}
