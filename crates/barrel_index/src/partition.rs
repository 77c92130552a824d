// Файл: crates/barrel_index/src/partition.rs
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{IndexError, Result};
use crate::PartitionId;

const ALPHABET: u32 = 26;
/// Больше 8 алфавитных корзин дают слишком узкие диапазоны букв
const MAX_ALPHA_BUCKETS: u32 = 8;

/// Схема разбиения на баррели: `alpha_buckets` диапазонов по первой букве,
/// внутри каждого `hash_buckets` подкорзин по стабильному хэшу терма.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawScheme")]
pub struct PartitionScheme {
    alpha_buckets: u32,
    hash_buckets: u32,
}

/// Схема из манифеста проходит ту же валидацию, что и `new`
#[derive(Deserialize)]
struct RawScheme {
    alpha_buckets: u32,
    hash_buckets: u32,
}

impl TryFrom<RawScheme> for PartitionScheme {
    type Error = IndexError;

    fn try_from(raw: RawScheme) -> Result<Self> {
        Self::new(raw.alpha_buckets, raw.hash_buckets)
    }
}

impl Default for PartitionScheme {
    /// 8 × 4 = 32 барреля: a–c, d–f, g–i, j–l, m–o, p–r, s–u, v–z
    fn default() -> Self {
        Self {
            alpha_buckets: 8,
            hash_buckets: 4,
        }
    }
}

impl PartitionScheme {
    pub fn new(alpha_buckets: u32, hash_buckets: u32) -> Result<Self> {
        if alpha_buckets == 0 || hash_buckets == 0 {
            return Err(IndexError::InvalidScheme(format!(
                "buckets must be positive, got {alpha_buckets}x{hash_buckets}"
            )));
        }
        if alpha_buckets > ALPHABET {
            return Err(IndexError::InvalidScheme(format!(
                "at most {ALPHABET} alpha buckets, got {alpha_buckets}"
            )));
        }
        alpha_buckets
            .checked_mul(hash_buckets)
            .ok_or_else(|| IndexError::InvalidScheme("partition count overflows".into()))?;
        Ok(Self {
            alpha_buckets,
            hash_buckets,
        })
    }

    /// Раскладывает общее число баррелей: alpha = наибольший делитель `n`, не больше 8.
    pub fn with_partitions(n: u32) -> Result<Self> {
        if n == 0 {
            return Err(IndexError::InvalidScheme("partition count must be positive".into()));
        }
        let alpha = (1..=MAX_ALPHA_BUCKETS.min(n))
            .rev()
            .find(|a| n % a == 0)
            .unwrap_or(1);
        Self::new(alpha, n / alpha)
    }

    pub fn alpha_buckets(&self) -> u32 {
        self.alpha_buckets
    }

    pub fn hash_buckets(&self) -> u32 {
        self.hash_buckets
    }

    pub fn partitions(&self) -> u32 {
        self.alpha_buckets * self.hash_buckets
    }

    /// Первая буква a..=z делит алфавит на равные непрерывные диапазоны,
    /// хвост алфавита уходит в последнюю корзину. Цифры и прочее тоже в последнюю.
    pub fn alpha_bucket(&self, term: &str) -> u32 {
        let last = self.alpha_buckets - 1;
        match term.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some(c @ 'a'..='z') => {
                let width = (ALPHABET / self.alpha_buckets).max(1);
                ((c as u32 - 'a' as u32) / width).min(last)
            }
            _ => last,
        }
    }

    /// Не зависит от процесса и запуска: xxh3 без сида
    pub fn hash_bucket(&self, term: &str) -> u32 {
        (xxh3_64(term.as_bytes()) % self.hash_buckets as u64) as u32
    }

    pub fn barrel_of(&self, term: &str) -> PartitionId {
        self.alpha_bucket(term) * self.hash_buckets + self.hash_bucket(term)
    }

    pub fn contains(&self, id: PartitionId) -> bool {
        id < self.partitions()
    }
}
