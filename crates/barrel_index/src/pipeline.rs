// Файл: crates/barrel_index/src/pipeline.rs
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::barrel::{BarrelStore, BuildReport};
use crate::corpus::{default_extensions, discover};
use crate::error::Result;
use crate::forward::ForwardIndex;
use crate::inverted::InvertedIndex;
use crate::layout::IndexLayout;
use crate::lexicon::Lexicon;
use crate::mapping::BarrelMapping;
use crate::normalizer::NormalizerKind;
use crate::partition::PartitionScheme;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub scheme: PartitionScheme,
    pub normalizer: NormalizerKind,
    /// Расширения файлов в нижнем регистре, без точки
    pub extensions: Vec<String>,
    /// Токенизировать документы в пуле rayon
    pub parallel: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            scheme: PartitionScheme::default(),
            normalizer: NormalizerKind::default(),
            extensions: default_extensions(),
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub documents: usize,
    pub terms: usize,
    pub indexed_terms: usize,
    pub postings: usize,
    pub barrels: BuildReport,
    pub elapsed_ms: u64,
}

/// Полная сборка: корпус -> лексикон -> прямой -> инвертированный -> маппинг -> баррели.
/// Любая фатальная ошибка останавливает сборку; сбои отдельных баррелей попадают в отчёт.
pub fn build_index(corpus: &Path, layout: &IndexLayout, opts: &BuildOptions) -> Result<PipelineReport> {
    let started = Instant::now();

    let docs = discover(corpus, &opts.extensions)?;
    info!(docs = docs.len(), corpus = %corpus.display(), "corpus discovered");

    let lexicon = Lexicon::from_corpus(&docs, opts.normalizer)?;
    lexicon.save(&layout.lexicon)?;

    let forward = ForwardIndex::build(&docs, &lexicon, opts.normalizer, opts.parallel);
    forward.save(&layout.forward)?;

    let inverted = InvertedIndex::from_forward(&forward);
    inverted.save(&layout.inverted)?;

    let mapping = BarrelMapping::from_lexicon(&lexicon, &opts.scheme);
    mapping.save(&layout.mapping)?;

    let store = BarrelStore::assemble(&inverted, &lexicon, &mapping, opts.scheme, opts.normalizer)?;
    let barrels = store.persist(&layout.barrels_dir)?;

    let report = PipelineReport {
        documents: docs.len(),
        terms: lexicon.len(),
        indexed_terms: inverted.term_count(),
        postings: inverted.posting_count(),
        barrels,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        documents = report.documents,
        terms = report.terms,
        postings = report.postings,
        failed_barrels = report.barrels.failed.len(),
        elapsed_ms = report.elapsed_ms,
        "index built"
    );
    Ok(report)
}
