// Файл: crates/barrel_index/src/persist.rs
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{IndexError, Result};

/// Читает JSON-артефакт целиком
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).map_err(|e| IndexError::io(path, e))?;
    serde_json::from_reader(BufReader::new(f)).map_err(|e| IndexError::json(path, e))
}

/// Пишет JSON атомарно: .tmp -> flush -> rename.
/// Возвращает checksum записанных байт.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| IndexError::io(parent, e))?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| IndexError::json(path, e))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);
    {
        let f = File::create(tmp).map_err(|e| IndexError::io(tmp, e))?;
        let mut w = BufWriter::new(f);
        w.write_all(&bytes).map_err(|e| IndexError::io(tmp, e))?;
        w.flush().map_err(|e| IndexError::io(tmp, e))?;
        // дескриптор закрыт до rename
    }
    if let Err(e) = fs::rename(tmp, path) {
        let _ = fs::remove_file(tmp);
        return Err(IndexError::io(path, e));
    }
    Ok(checksum(&bytes))
}

/// `xxh3:<16 hex>`
pub fn checksum(data: &[u8]) -> String {
    format!("xxh3:{:016x}", xxh3_64(data))
}

/// JSON не умеет числовые ключи: `{"12": 3}` <-> `BTreeMap<u32, u32>`
pub mod string_keys {
    use std::collections::BTreeMap;
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, s: S) -> Result<S::Ok, S::Error>
    where
        K: Display,
        V: Serialize,
        S: Serializer,
    {
        // порядок ключей в файле числовой, а не строковый
        s.collect_map(map.iter().map(|(k, v)| (k.to_string(), v)))
    }

    pub fn deserialize<'de, K, V, D>(d: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: FromStr + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let raw: BTreeMap<String, V> = BTreeMap::deserialize(d)?;
        raw.into_iter()
            .map(|(k, v)| {
                k.parse::<K>()
                    .map(|k| (k, v))
                    .map_err(|_| D::Error::custom(format!("non-numeric key {k:?}")))
            })
            .collect()
    }
}

/// То же для двух уровней: `{"term_id": {"doc_id": freq}}`
pub mod nested_string_keys {
    use std::collections::BTreeMap;
    use std::fmt::Display;
    use std::str::FromStr;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    struct Inner<'a, K, V>(&'a BTreeMap<K, V>);

    impl<K: Display, V: Serialize> Serialize for Inner<'_, K, V> {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            super::string_keys::serialize(self.0, s)
        }
    }

    pub fn serialize<K1, K2, V, S>(
        map: &BTreeMap<K1, BTreeMap<K2, V>>,
        s: S,
    ) -> Result<S::Ok, S::Error>
    where
        K1: Display,
        K2: Display,
        V: Serialize,
        S: Serializer,
    {
        s.collect_map(map.iter().map(|(k, v)| (k.to_string(), Inner(v))))
    }

    pub fn deserialize<'de, K1, K2, V, D>(d: D) -> Result<BTreeMap<K1, BTreeMap<K2, V>>, D::Error>
    where
        K1: FromStr + Ord,
        K2: FromStr + Ord,
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let raw: BTreeMap<String, BTreeMap<String, V>> = BTreeMap::deserialize(d)?;
        let mut out = BTreeMap::new();
        for (k1, inner) in raw {
            let k1p = k1
                .parse::<K1>()
                .map_err(|_| D::Error::custom(format!("non-numeric key {k1:?}")))?;
            let mut m = BTreeMap::new();
            for (k2, v) in inner {
                let k2p = k2
                    .parse::<K2>()
                    .map_err(|_| D::Error::custom(format!("non-numeric key {k2:?}")))?;
                m.insert(k2p, v);
            }
            out.insert(k1p, m);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_leaves_no_tmp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("x.json");
        let mut m = BTreeMap::new();
        m.insert("1".to_string(), 2u32);
        let sum = write_json_atomic(&path, &m).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("nested").join("x.json.tmp").exists());
        assert_eq!(sum, checksum(&fs::read(&path).unwrap()));

        let back: BTreeMap<String, u32> = read_json(&path).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn rename_onto_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocked.json");
        fs::create_dir_all(&path).unwrap();

        let err = write_json_atomic(&path, &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
        assert!(!dir.path().join("blocked.json.tmp").exists());
    }

    #[test]
    fn read_json_reports_path_on_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_json::<serde_json::Value>(&path).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }
}
