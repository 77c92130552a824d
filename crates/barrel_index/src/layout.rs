use std::path::{Path, PathBuf};

use crate::PartitionId;

/// Где лежат артефакты индекса. По умолчанию всё внутри одного каталога:
///
/// ```text
/// <root>/lexicon.json
/// <root>/forward_index.json
/// <root>/inverted_index.json
/// <root>/barrel_mapping.json
/// <root>/barrels/barrel_<id>.json
/// <root>/barrels/manifest.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayout {
    pub lexicon: PathBuf,
    pub forward: PathBuf,
    pub inverted: PathBuf,
    pub mapping: PathBuf,
    pub barrels_dir: PathBuf,
}

impl IndexLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            lexicon: root.join("lexicon.json"),
            forward: root.join("forward_index.json"),
            inverted: root.join("inverted_index.json"),
            mapping: root.join("barrel_mapping.json"),
            barrels_dir: root.join("barrels"),
        }
    }

    pub fn with_barrels_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.barrels_dir = dir.into();
        self
    }

    pub fn barrel_path(&self, id: PartitionId) -> PathBuf {
        barrel_path(&self.barrels_dir, id)
    }

    pub fn manifest_path(&self) -> PathBuf {
        manifest_path(&self.barrels_dir)
    }
}

pub fn barrel_file_name(id: PartitionId) -> String {
    format!("barrel_{id}.json")
}

pub fn barrel_path(dir: &Path, id: PartitionId) -> PathBuf {
    dir.join(barrel_file_name(id))
}

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join("manifest.json")
}
