use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::layout::manifest_path;
use crate::normalizer::NormalizerKind;
use crate::partition::PartitionScheme;
use crate::persist::{read_json, write_json_atomic};
use crate::PartitionId;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BarrelMeta {
    pub id: PartitionId,
    pub file: String,
    pub terms: usize,
    /// `xxh3:<hex>` записанных байт
    pub checksum: String,
}

/// Описание набора баррелей; пишется последним, после всех barrel_<id>.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BarrelManifest {
    pub version: u32,
    pub scheme: PartitionScheme,
    pub normalizer: NormalizerKind,
    pub barrels: Vec<BarrelMeta>,
    /// Баррели, которые не удалось записать при сборке
    #[serde(default)]
    pub failed: Vec<PartitionId>,
    /// Термы индекса, не попавшие ни в один баррель
    #[serde(default)]
    pub dropped_terms: usize,
}

impl BarrelManifest {
    pub fn barrel(&self, id: PartitionId) -> Option<&BarrelMeta> {
        self.barrels.iter().find(|b| b.id == id)
    }

    pub fn is_failed(&self, id: PartitionId) -> bool {
        self.failed.contains(&id)
    }

    pub fn save(&self, barrels_dir: &Path) -> Result<()> {
        write_json_atomic(&manifest_path(barrels_dir), self)?;
        Ok(())
    }

    /// Нет манифеста (баррели собраны внешним инструментом) -> `None`.
    /// Битый манифест -> ошибка.
    pub fn load_opt(barrels_dir: &Path) -> Result<Option<Self>> {
        let path = manifest_path(barrels_dir);
        if !path.exists() {
            return Ok(None);
        }
        let m: BarrelManifest = read_json(&path)?;
        if m.version != MANIFEST_VERSION {
            return Err(IndexError::malformed(
                &path,
                format!("unsupported manifest version {}", m.version),
            ));
        }
        Ok(Some(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> BarrelManifest {
        BarrelManifest {
            version: MANIFEST_VERSION,
            scheme: PartitionScheme::with_partitions(4).unwrap(),
            normalizer: NormalizerKind::Folded,
            barrels: vec![BarrelMeta {
                id: 0,
                file: "barrel_0.json".into(),
                terms: 2,
                checksum: "xxh3:00000000deadbeef".into(),
            }],
            failed: vec![3],
            dropped_terms: 1,
        }
    }

    #[test]
    fn roundtrip_manifest() {
        let dir = tempdir().unwrap();
        let m = sample();
        m.save(dir.path()).unwrap();
        let back = BarrelManifest::load_opt(dir.path()).unwrap().unwrap();
        assert_eq!(back, m);
        assert!(back.is_failed(3));
        assert_eq!(back.barrel(0).unwrap().terms, 2);
        assert!(back.barrel(1).is_none());
    }

    #[test]
    fn missing_manifest_is_none() {
        let dir = tempdir().unwrap();
        assert!(BarrelManifest::load_opt(dir.path()).unwrap().is_none());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = tempdir().unwrap();
        let mut m = sample();
        m.version = 99;
        m.save(dir.path()).unwrap();
        assert!(matches!(
            BarrelManifest::load_opt(dir.path()).unwrap_err(),
            IndexError::Malformed { .. }
        ));
    }
}
