// path: crates/barrel_index/tests/helpers.rs
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Корпус из пар (относительный путь, текст) во временном каталоге
pub fn write_corpus(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("tmpdir");
    let root = tmp.path().join("corpus");
    for (rel, text) in files {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, text).unwrap();
    }
    (tmp, root)
}

pub fn index_dir(tmp: &TempDir) -> PathBuf {
    tmp.path().join("index")
}

/// Корпус из двух документов: "Virus Virus Spread" и "Spread Fast"
pub fn scenario_a() -> (TempDir, PathBuf) {
    write_corpus(&[("a.txt", "Virus Virus Spread"), ("b.txt", "Spread Fast")])
}

pub fn read_bytes(p: &Path) -> Vec<u8> {
    fs::read(p).unwrap()
}
