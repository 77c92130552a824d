use std::sync::Arc;
use std::time::{Duration, Instant};

use barrel_index::{IndexError, QueryOutcome, QueryResolver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::lookup::executor::{LookupTask, LookupTaskOutput, ParallelExecutor};
use crate::lookup::types::*;

pub mod executor;
pub mod types;

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("deadline of {0} ms exceeded")]
    DeadlineExceeded(u128),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("lookup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Источник ответов на точечные запросы. Вызывается из blocking-пула.
pub trait TermSource: Send + Sync + 'static {
    fn resolve(&self, raw: &str) -> barrel_index::Result<QueryOutcome>;
    fn stats(&self) -> StatsResponse;
}

impl TermSource for QueryResolver {
    fn resolve(&self, raw: &str) -> barrel_index::Result<QueryOutcome> {
        QueryResolver::resolve(self, raw)
    }

    fn stats(&self) -> StatsResponse {
        let scheme = self.scheme();
        StatsResponse {
            terms: self.lexicon().len(),
            mapped_terms: self.mapping_len(),
            partitions: scheme.partitions(),
            alpha_buckets: scheme.alpha_buckets(),
            hash_buckets: scheme.hash_buckets(),
            normalizer: self.normalizer(),
            barrel_loads: self.barrel_loads(),
        }
    }
}

/// Поиск по баррелям поверх одного разделяемого источника (обычно `QueryResolver`).
/// Чтение барреля блокирующее, поэтому идёт в blocking-пул tokio.
pub struct LookupCoordinator {
    source: Arc<dyn TermSource>,
    default_parallelism: usize,
    default_deadline: Option<Duration>,
}

impl LookupCoordinator {
    pub fn new(source: Arc<dyn TermSource>, default_parallelism: usize) -> Self {
        Self {
            source,
            default_parallelism,
            default_deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.default_deadline = deadline;
        self
    }

    pub async fn handle(&self, req: LookupRequest) -> Result<LookupResponse, LookupError> {
        let started = Instant::now();
        let deadline = req.deadline(self.default_deadline);

        let source = self.source.clone();
        let term = req.term;
        let job = tokio::task::spawn_blocking(move || source.resolve(&term));

        let outcome = match deadline {
            Some(dl) => match tokio::time::timeout(dl, job).await {
                Ok(joined) => joined??,
                Err(_) => {
                    warn!(deadline_ms = dl.as_millis() as u64, "lookup deadline exceeded");
                    return Err(LookupError::DeadlineExceeded(dl.as_millis()));
                }
            },
            None => job.await??,
        };

        let elapsed_us = started.elapsed().as_micros() as u64;
        debug!(elapsed_us, "lookup done");
        Ok(LookupResponse {
            outcome,
            metrics: LookupMetrics { elapsed_us },
        })
    }

    /// Независимые термы пакета; ошибки и отмены: по каждому терму отдельно.
    pub async fn handle_batch(&self, req: BatchRequest) -> BatchResponse {
        let started = Instant::now();

        let limits = req.limits.unwrap_or_default();
        let parallelism = limits
            .parallelism
            .unwrap_or(self.default_parallelism)
            .max(1);
        let deadline = limits.deadline(self.default_deadline);
        let executor = ParallelExecutor::new(parallelism);

        let tasks: Vec<LookupTask> = req
            .terms
            .into_iter()
            .enumerate()
            .map(|(index, query)| LookupTask { index, query })
            .collect();
        debug!(count = tasks.len(), parallelism, "batch lookup");

        let source = self.source.clone();
        let lookup_fn = move |task: LookupTask, _ct: CancellationToken| {
            let source = source.clone();
            async move {
                let query = task.query.clone();
                let joined = tokio::task::spawn_blocking(move || source.resolve(&query)).await;
                let item = match joined {
                    Ok(Ok(outcome)) => BatchItem::Done(outcome),
                    Ok(Err(err)) => BatchItem::Failed {
                        status: if err.is_bad_request() { "bad_request" } else { "error" },
                        query: task.query,
                        error: err.to_string(),
                    },
                    Err(err) => BatchItem::Failed {
                        status: "error",
                        query: task.query,
                        error: err.to_string(),
                    },
                };
                LookupTaskOutput {
                    index: task.index,
                    item,
                }
            }
        };

        let (parts, deadline_hit, saturated_sem) = executor
            .run_all(CancellationToken::new(), tasks, lookup_fn, deadline)
            .await;

        BatchResponse {
            results: parts.into_iter().map(|p| p.item).collect(),
            metrics: BatchMetrics {
                elapsed_us: started.elapsed().as_micros() as u64,
                deadline_hit,
                saturated_sem,
            },
        }
    }

    pub fn stats(&self) -> StatsResponse {
        self.source.stats()
    }
}
