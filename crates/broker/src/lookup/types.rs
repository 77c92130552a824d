// path: crates/broker/src/lookup/types.rs
use std::time::Duration;

use barrel_index::QueryOutcome;
use serde::{Deserialize, Serialize};

/// 0 == без дедлайна (и в BZ_DEADLINE_MS, и в запросе)
pub fn deadline_from_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

// --- ВХОД ---

#[derive(Debug, Clone, Deserialize)]
pub struct LookupRequest {
    pub term: String,
    pub deadline_ms: Option<u64>,
}

impl LookupRequest {
    /// Присланный `deadline_ms` (включая 0) перекрывает дедлайн брокера
    pub fn deadline(&self, default: Option<Duration>) -> Option<Duration> {
        self.deadline_ms.map_or(default, deadline_from_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupLimits {
    pub parallelism: Option<usize>,
    pub deadline_ms: Option<u64>,
}

impl LookupLimits {
    pub fn deadline(&self, default: Option<Duration>) -> Option<Duration> {
        self.deadline_ms.map_or(default, deadline_from_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub terms: Vec<String>,
    pub limits: Option<LookupLimits>,
}

// --- ВЫХОД ---

/// Истёкший дедлайн одиночного поиска - это 504, а не метрика
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LookupMetrics {
    pub elapsed_us: u64,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    #[serde(flatten)]
    pub outcome: QueryOutcome,
    pub metrics: LookupMetrics,
}

/// Результат одного терма в пакете. Ошибка терма не валит весь пакет.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Done(QueryOutcome),
    Failed {
        /// "bad_request" | "error" | "cancelled"
        status: &'static str,
        query: String,
        error: String,
    },
}

impl BatchItem {
    pub fn cancelled(query: String) -> Self {
        BatchItem::Failed {
            status: "cancelled",
            query,
            error: "deadline exceeded".into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchMetrics {
    pub elapsed_us: u64,
    pub deadline_hit: bool,
    pub saturated_sem: usize,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// В порядке `terms` из запроса
    pub results: Vec<BatchItem>,
    pub metrics: BatchMetrics,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub terms: usize,
    pub mapped_terms: usize,
    pub partitions: u32,
    pub alpha_buckets: u32,
    pub hash_buckets: u32,
    pub normalizer: barrel_index::NormalizerKind,
    pub barrel_loads: u64,
}
