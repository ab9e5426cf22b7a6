// One JSON file per dataset under the data directory.
//
// Writes build the full merged structure in memory and replace the file
// atomically (temp file in the same directory, then rename). A crash at any
// point leaves either the old or the new file, never a partial one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use campus_common::{CategorizedDataset, DatasetKind, FlatDataset, Record};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::MergeError;
use crate::merge::{merge_categories, merge_records};

/// A dataset's persisted shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    /// Identity → Record (events, people).
    Flat(FlatDataset),
    /// Category → items (research, news, general).
    Categorized(CategorizedDataset),
}

impl Dataset {
    pub fn empty(kind: DatasetKind) -> Self {
        if kind.is_categorized() {
            Dataset::Categorized(CategorizedDataset::new())
        } else {
            Dataset::Flat(FlatDataset::new())
        }
    }

    /// Number of records, across categories for nested datasets.
    pub fn len(&self) -> usize {
        match self {
            Dataset::Flat(records) => records.len(),
            Dataset::Categorized(categories) => categories.values().map(|c| c.items.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every record, flattened. Nested datasets yield items category by category.
    pub fn records(&self) -> Vec<&Record> {
        match self {
            Dataset::Flat(records) => records.values().collect(),
            Dataset::Categorized(categories) => categories.values().flat_map(|c| c.items.values()).collect(),
        }
    }

    pub fn into_flat(self) -> Option<FlatDataset> {
        match self {
            Dataset::Flat(records) => Some(records),
            Dataset::Categorized(_) => None,
        }
    }

    pub fn into_categorized(self) -> Option<CategorizedDataset> {
        match self {
            Dataset::Categorized(categories) => Some(categories),
            Dataset::Flat(_) => None,
        }
    }

    fn shape_matches(&self, kind: DatasetKind) -> bool {
        matches!(self, Dataset::Categorized(_)) == kind.is_categorized()
    }
}

/// Serialize as pretty JSON with a trailing newline and replace `path` atomically.
pub fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), MergeError> {
    let mut body = serde_json::to_vec_pretty(value)?;
    body.push(b'\n');
    write_bytes_atomic(path, &body)
}

/// Replace `path` with `body` via a temp file in the same directory.
pub fn write_bytes_atomic(path: &Path, body: &[u8]) -> Result<(), MergeError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|source| MergeError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let io_err = |source| MergeError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(body).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| MergeError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T, MergeError> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| MergeError::Deserialize {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(T::default()),
        Err(source) => Err(MergeError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Dataset files rooted at one directory. Single writer: one synchronization
/// pass at a time.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    dir: PathBuf,
}

impl DatasetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: DatasetKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// The persisted dataset. A missing file is an empty dataset.
    pub fn load(&self, kind: DatasetKind) -> Result<Dataset, MergeError> {
        let path = self.path(kind);
        Ok(if kind.is_categorized() {
            Dataset::Categorized(read_or_default(&path)?)
        } else {
            Dataset::Flat(read_or_default(&path)?)
        })
    }

    fn save(&self, kind: DatasetKind, dataset: &Dataset) -> Result<(), MergeError> {
        let path = self.path(kind);
        match dataset {
            Dataset::Flat(records) => write_atomic(&path, records),
            Dataset::Categorized(categories) => write_atomic(&path, categories),
        }
    }

    /// `merge_and_save(dataset_kind, new_records)`: load, merge, replace.
    ///
    /// Records are only ever added or updated here. Returns the dataset as
    /// persisted.
    pub fn merge_and_save(&self, kind: DatasetKind, new: Dataset) -> Result<Dataset, MergeError> {
        if !new.shape_matches(kind) {
            return Err(MergeError::ShapeMismatch(kind));
        }

        let old = self.load(kind)?;
        let before = old.len();
        let incoming = new.len();

        let merged = match (old, new) {
            (Dataset::Flat(old), Dataset::Flat(new)) => Dataset::Flat(merge_records(old, new)),
            (Dataset::Categorized(old), Dataset::Categorized(new)) => {
                Dataset::Categorized(merge_categories(old, new))
            }
            _ => return Err(MergeError::ShapeMismatch(kind)),
        };

        self.save(kind, &merged)?;
        info!(
            kind = %kind,
            before,
            incoming,
            after = merged.len(),
            "Dataset merged and saved"
        );
        Ok(merged)
    }

    /// Explicitly remove one identity. The only way a record leaves a dataset.
    ///
    /// Returns whether anything was removed; the file is rewritten only then.
    pub fn remove(&self, kind: DatasetKind, identity: &str) -> Result<bool, MergeError> {
        let mut dataset = self.load(kind)?;
        let removed = match &mut dataset {
            Dataset::Flat(records) => records.remove(identity).is_some(),
            Dataset::Categorized(categories) => {
                let mut removed = false;
                for category in categories.values_mut() {
                    if let Some(record) = category.items.remove(identity) {
                        category.subtopics.retain(|t| *t != record.title);
                        removed = true;
                    }
                }
                removed
            }
        };

        if removed {
            self.save(kind, &dataset)?;
            info!(kind = %kind, identity, "Record removed");
        } else {
            warn!(kind = %kind, identity, "Nothing to remove");
        }
        Ok(removed)
    }
}
