// path: crates/broker/src/config.rs
use std::time::Duration;

use serde::Deserialize;

use crate::lookup::types::deadline_from_ms;

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Каталог с lexicon.json, barrel_mapping.json и barrels/
    #[serde(default = "default_index_dir")]
    pub index_dir: String,
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Дедлайн по умолчанию, если клиент не прислал свой. 0 == без дедлайна
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

fn default_addr() -> String { "0.0.0.0:8080".into() }
fn default_index_dir() -> String { "index".into() }
fn default_parallelism() -> usize { 4 }
fn default_deadline_ms() -> u64 { 1_000 }

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            index_dir: default_index_dir(),
            parallelism: default_parallelism(),
            deadline_ms: default_deadline_ms(),
        }
    }
}

impl BrokerConfig {
    pub fn from_env() -> Self {
        let addr = std::env::var("BZ_ADDR").unwrap_or_else(|_| default_addr());
        let index_dir = std::env::var("BZ_INDEX_DIR").unwrap_or_else(|_| default_index_dir());
        let parallelism = std::env::var("BZ_PARALLELISM").ok().and_then(|s| s.parse().ok()).unwrap_or(default_parallelism());
        let deadline_ms = std::env::var("BZ_DEADLINE_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(default_deadline_ms());

        Self { addr, index_dir, parallelism, deadline_ms }
    }

    pub fn deadline(&self) -> Option<Duration> {
        deadline_from_ms(self.deadline_ms)
    }
}
