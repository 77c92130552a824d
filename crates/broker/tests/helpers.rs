// path: crates/broker/tests/helpers.rs
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use barrel_index::pipeline::{build_index, BuildOptions};
use barrel_index::{IndexLayout, NormalizerKind, QueryOutcome, QueryResolver};
use broker::config::BrokerConfig;
use broker::http_api::{router, AppState};
use broker::lookup::types::StatsResponse;
use broker::lookup::{LookupCoordinator, TermSource};
use tempfile::TempDir;

/// Индекс по корпусу "Virus Virus Spread" / "Spread Fast" во временном каталоге
pub fn scenario_a_index() -> (TempDir, IndexLayout) {
    let tmp = TempDir::new().expect("tmpdir");
    let corpus = tmp.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(corpus.join("a.txt"), "Virus Virus Spread").unwrap();
    fs::write(corpus.join("b.txt"), "Spread Fast").unwrap();

    let layout = IndexLayout::new(tmp.path().join("index"));
    build_index(&corpus, &layout, &BuildOptions::default()).expect("build index");
    (tmp, layout)
}

pub fn make_router_with_config(layout: &IndexLayout, cfg: BrokerConfig) -> Router {
    let resolver = QueryResolver::open(layout).expect("open resolver");
    let coord = LookupCoordinator::new(Arc::new(resolver), cfg.parallelism)
        .with_deadline(cfg.deadline());
    router_for(coord)
}

pub fn router_for(coord: LookupCoordinator) -> Router {
    router(AppState {
        coord: Arc::new(coord),
    })
}

/// Источник, который отвечает `not_indexed` не раньше чем через `delay`
pub struct SlowSource {
    pub delay: Duration,
}

impl TermSource for SlowSource {
    fn resolve(&self, raw: &str) -> barrel_index::Result<QueryOutcome> {
        std::thread::sleep(self.delay);
        Ok(QueryOutcome::NotIndexed { term: raw.into() })
    }

    fn stats(&self) -> StatsResponse {
        StatsResponse {
            terms: 0,
            mapped_terms: 0,
            partitions: 0,
            alpha_buckets: 0,
            hash_buckets: 0,
            normalizer: NormalizerKind::default(),
            barrel_loads: 0,
        }
    }
}

pub fn slow_coordinator(delay_ms: u64, parallelism: usize) -> LookupCoordinator {
    LookupCoordinator::new(
        Arc::new(SlowSource {
            delay: Duration::from_millis(delay_ms),
        }),
        parallelism,
    )
}

pub fn make_router_with_parallelism(layout: &IndexLayout, parallelism: usize) -> Router {
    let cfg = BrokerConfig {
        parallelism,
        index_dir: layout_root(layout),
        ..BrokerConfig::default()
    };
    make_router_with_config(layout, cfg)
}

fn layout_root(layout: &IndexLayout) -> String {
    layout
        .lexicon
        .parent()
        .unwrap_or(Path::new("."))
        .display()
        .to_string()
}
