pub mod barrel;
pub mod corpus;
pub mod error;
pub mod forward;
pub mod inverted;
pub mod layout;
pub mod lexicon;
pub mod manifest;
pub mod mapping;
pub mod normalizer;
pub mod partition;
pub mod persist;
pub mod pipeline;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use error::{IndexError, Result};
pub use layout::IndexLayout;
pub use lexicon::Lexicon;
pub use normalizer::NormalizerKind;
pub use partition::PartitionScheme;
pub use resolver::{QueryOutcome, QueryResolver};

/// Идентификатор терма в лексиконе, 1-based
pub type TermId = u32;
/// Идентификатор документа, 1-based, по отсортированному списку путей
pub type DocId = u32;
/// Число вхождений терма в документ (≥ 1)
pub type Freq = u32;
/// Номер барреля в [0, scheme.partitions())
pub type PartitionId = u32;

/// Один ответ резолвера: документ и частота терма в нём
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub freq: Freq,
}
