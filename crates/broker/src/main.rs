// Файл: crates/broker/src/main.rs
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use barrel_index::{IndexLayout, QueryResolver};
use tracing_subscriber::{fmt, EnvFilter};

use broker::config::BrokerConfig;
use broker::http_api::{router, AppState};
use broker::lookup::LookupCoordinator;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = BrokerConfig::from_env();
    let layout = IndexLayout::new(&cfg.index_dir);
    let resolver = QueryResolver::open(&layout)
        .with_context(|| format!("open index at {}", cfg.index_dir))?;
    tracing::info!(
        index_dir = %cfg.index_dir,
        terms = resolver.lexicon().len(),
        partitions = resolver.scheme().partitions(),
        "index opened"
    );

    let coord = LookupCoordinator::new(Arc::new(resolver), cfg.parallelism)
        .with_deadline(cfg.deadline());
    let app = router(AppState { coord: Arc::new(coord) });

    let addr: SocketAddr = cfg.addr.parse().with_context(|| format!("bad BZ_ADDR {}", cfg.addr))?;
    tracing::info!(address = %addr, "broker listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
