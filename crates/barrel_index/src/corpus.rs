// Файл: crates/barrel_index/src/corpus.rs
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{IndexError, Result};
use crate::DocId;

/// Расширения, которые индексируются по умолчанию
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "txt", "json", "csv", "xml", "html", "md", "log", "tsv", "yaml", "ini", "cfg",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: DocId,
    pub path: PathBuf,
}

impl Document {
    /// Текст документа. Нечитаемый файл даёт пустой текст, но doc_id остаётся за ним.
    pub fn read_text(&self) -> String {
        match std::fs::read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read document");
                String::new()
            }
        }
    }
}

pub fn is_indexable(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|x| *x == e)
        })
        .unwrap_or(false)
}

/// Обходит корпус, сортирует пути и раздаёт doc_id = 1..=n.
/// Один и тот же корпус всегда даёт одни и те же doc_id.
pub fn discover(root: &Path, extensions: &[String]) -> Result<Vec<Document>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
            IndexError::io(path, io)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !is_indexable(entry.path(), extensions) {
            debug!(path = %entry.path().display(), "skip: unsupported extension");
            continue;
        }
        files.push(entry.into_path());
    }

    files.sort();

    Ok(files
        .into_iter()
        .enumerate()
        .map(|(i, path)| Document {
            doc_id: i as DocId + 1,
            path,
        })
        .collect())
}

pub fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}
