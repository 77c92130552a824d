// Файл: crates/barrel_index/src/resolver.rs
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use crate::barrel::load_barrel;
use crate::error::{IndexError, Result};
use crate::inverted::to_postings;
use crate::layout::IndexLayout;
use crate::lexicon::Lexicon;
use crate::manifest::BarrelManifest;
use crate::mapping::BarrelMapping;
use crate::normalizer::NormalizerKind;
use crate::partition::PartitionScheme;
use crate::{PartitionId, Posting, TermId};

/// Ожидаемые исходы поиска. Фатальные ошибки идут отдельно, через `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Запрос пуст после нормализации
    EmptyQuery,
    /// Терма нет в лексиконе
    NotIndexed { term: String },
    /// Терм в лексиконе, но в его барреле нет постингов
    NoPostings {
        term: String,
        term_id: TermId,
        partition: PartitionId,
    },
    Found {
        term: String,
        term_id: TermId,
        partition: PartitionId,
        postings: Vec<Posting>,
    },
}

impl QueryOutcome {
    pub fn postings(&self) -> &[Posting] {
        match self {
            QueryOutcome::Found { postings, .. } => postings,
            _ => &[],
        }
    }
}

/// Точечный поиск: один терм -> один баррель.
/// Между запросами ничего не кэширует и не мутирует, поэтому делится между потоками без блокировок.
#[derive(Debug)]
pub struct QueryResolver {
    lexicon: Lexicon,
    mapping: BarrelMapping,
    manifest: Option<BarrelManifest>,
    scheme: PartitionScheme,
    normalizer: NormalizerKind,
    barrels_dir: PathBuf,
    barrel_loads: AtomicU64,
}

impl QueryResolver {
    /// Схема и нормализатор берутся из манифеста; без манифеста берутся значения по умолчанию.
    pub fn open(layout: &IndexLayout) -> Result<Self> {
        let lexicon = Lexicon::load(&layout.lexicon)?;
        let manifest = BarrelManifest::load_opt(&layout.barrels_dir)?;
        let (scheme, normalizer) = manifest
            .as_ref()
            .map(|m| (m.scheme, m.normalizer))
            .unwrap_or_default();
        let mapping = BarrelMapping::load(&layout.mapping, &scheme)?;
        debug!(
            terms = lexicon.len(),
            mapped = mapping.len(),
            partitions = scheme.partitions(),
            "resolver opened"
        );
        Ok(Self {
            lexicon,
            mapping,
            manifest,
            scheme,
            normalizer,
            barrels_dir: layout.barrels_dir.clone(),
            barrel_loads: AtomicU64::new(0),
        })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn mapping_len(&self) -> usize {
        self.mapping.len()
    }

    pub fn scheme(&self) -> PartitionScheme {
        self.scheme
    }

    pub fn normalizer(&self) -> NormalizerKind {
        self.normalizer
    }

    /// Сколько раз читался баррель с диска за жизнь резолвера
    pub fn barrel_loads(&self) -> u64 {
        self.barrel_loads.load(Ordering::Relaxed)
    }

    pub fn resolve(&self, raw: &str) -> Result<QueryOutcome> {
        // 1) нормализация
        let Some(term) = self.normalizer.normalize_query(raw)? else {
            return Ok(QueryOutcome::EmptyQuery);
        };

        // 2) term -> term_id
        let Some(term_id) = self.lexicon.term_id(&term) else {
            return Ok(QueryOutcome::NotIndexed { term });
        };

        // 3) баррель по тексту терма; маппинг обязан с ним совпадать
        let partition = self.scheme.barrel_of(&term);
        if let Some(mapped) = self.mapping.get(term_id) {
            if mapped != partition {
                return Err(IndexError::MappingMismatch {
                    term_id,
                    term,
                    mapped,
                    computed: partition,
                });
            }
        }
        debug!(%term, term_id, partition, "resolved barrel");

        // 4) читаем ровно один баррель
        self.barrel_loads.fetch_add(1, Ordering::Relaxed);
        let barrel = load_barrel(&self.barrels_dir, partition, self.manifest.as_ref())?;

        // 5) постинги терма внутри барреля
        match barrel.get(&term_id) {
            Some(list) if !list.is_empty() => Ok(QueryOutcome::Found {
                term,
                term_id,
                partition,
                postings: to_postings(list),
            }),
            _ => Ok(QueryOutcome::NoPostings {
                term,
                term_id,
                partition,
            }),
        }
    }
}
