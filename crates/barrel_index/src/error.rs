use std::path::PathBuf;

use thiserror::Error;

use crate::normalizer::NormalizerKind;
use crate::{PartitionId, TermId};

/// Фатальные ошибки сборки и поиска.
/// Ожидаемые исходы (терм не найден, нет постингов) сюда не попадают, см. `QueryOutcome`.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed artifact {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("lexicon is empty: corpus produced no terms")]
    EmptyLexicon,

    #[error("barrel {id} not found at {path}")]
    BarrelMissing { id: PartitionId, path: PathBuf },

    #[error("barrel {id} is unavailable: it failed to persist during build")]
    BarrelUnavailable { id: PartitionId },

    #[error("barrel {id} checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        id: PartitionId,
        expected: String,
        actual: String,
    },

    #[error("term {term_id} ({term}) mapped to barrel {mapped}, partitioner says {computed}")]
    MappingMismatch {
        term_id: TermId,
        term: String,
        mapped: PartitionId,
        computed: PartitionId,
    },

    #[error("term {term_id} ({term}) was not produced by the {normalizer:?} normalizer")]
    NormalizerMismatch {
        term_id: TermId,
        term: String,
        normalizer: NormalizerKind,
    },

    #[error("invalid partition scheme: {0}")]
    InvalidScheme(String),

    #[error("query must contain exactly one term, got {0:?}")]
    MultiTermQuery(Vec<String>),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        IndexError::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IndexError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Ошибка относится к запросу пользователя, а не к состоянию индекса
    pub fn is_bad_request(&self) -> bool {
        matches!(self, IndexError::MultiTermQuery(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_barrel() {
        let err = IndexError::BarrelUnavailable { id: 29 };
        assert!(err.to_string().contains("barrel 29"));
    }

    #[test]
    fn only_multi_term_is_bad_request() {
        assert!(IndexError::MultiTermQuery(vec!["a".into(), "b".into()]).is_bad_request());
        assert!(!IndexError::EmptyLexicon.is_bad_request());
    }
}
