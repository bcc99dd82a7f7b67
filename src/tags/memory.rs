use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::paths::{self, TagKind, TagPaths};
use super::{StoreError, TagStore, TagValue};

/// Initial values applied when a store is created from scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSeed {
    /// Shift id the ledger starts in (1..=3).
    pub initial_shift: i64,
    /// Energy target of the starting shift (kWh).
    pub shift_target_kwh: f64,
    /// Relative counter path -> starting value. Integer counters are truncated.
    pub counters: BTreeMap<String, f64>,
}

impl Default for StoreSeed {
    fn default() -> Self {
        Self {
            initial_shift: 1,
            shift_target_kwh: 1500.0,
            counters: BTreeMap::new(),
        }
    }
}

/// Errors from loading or saving a JSON state file.
#[derive(Debug, Error)]
pub enum StateFileError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("state file {path} is not a valid tag snapshot: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tag store backed by an ordered map.
///
/// Writes to tags that were never created are rejected, and a rejected batch
/// leaves the store untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryTagStore {
    tags: BTreeMap<String, TagValue>,
}

impl MemoryTagStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding every tag in [`paths::LAYOUT`] under `base`,
    /// with zero values overlaid by `seed`.
    pub fn seeded(base: &TagPaths, seed: &StoreSeed) -> Self {
        let mut store = Self::new();
        for (path, value) in seed_values(seed) {
            store.tags.insert(base.resolve(path), value);
        }
        store
    }

    /// Adds any layout tag missing from this store, using seeded values.
    ///
    /// Returns the number of tags added.
    pub fn fill_missing(&mut self, base: &TagPaths, seed: &StoreSeed) -> usize {
        let mut added = 0;
        for (path, value) in seed_values(seed) {
            let full = base.resolve(path);
            if !self.tags.contains_key(&full) {
                self.tags.insert(full, value);
                added += 1;
            }
        }
        added
    }

    /// Creates or replaces a tag.
    pub fn insert(&mut self, path: impl Into<String>, value: TagValue) {
        self.tags.insert(path.into(), value);
    }

    /// Removes a tag, returning its last value.
    pub fn remove(&mut self, path: &str) -> Option<TagValue> {
        self.tags.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&TagValue> {
        self.tags.get(path)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Loads a snapshot previously written by [`MemoryTagStore::save_json`].
    pub fn load_json(path: &Path) -> Result<Self, StateFileError> {
        let raw = fs::read_to_string(path).map_err(|source| StateFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StateFileError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes a pretty-printed snapshot, replacing `path` via a temporary file.
    pub fn save_json(&self, path: &Path) -> Result<(), StateFileError> {
        let io_err = |source| StateFileError::Io {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|source| StateFileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }
}

impl TagStore for MemoryTagStore {
    fn read(&self, paths: &[String]) -> Result<Vec<TagValue>, StoreError> {
        paths
            .iter()
            .map(|p| {
                self.tags
                    .get(p)
                    .cloned()
                    .ok_or_else(|| StoreError::UnknownTag(p.clone()))
            })
            .collect()
    }

    fn write(&mut self, paths: &[String], values: &[TagValue]) -> Result<(), StoreError> {
        if paths.len() != values.len() {
            return Err(StoreError::LengthMismatch {
                paths: paths.len(),
                values: values.len(),
            });
        }
        if let Some(missing) = paths.iter().find(|p| !self.tags.contains_key(*p)) {
            return Err(StoreError::UnknownTag(missing.clone()));
        }
        for (path, value) in paths.iter().zip(values) {
            self.tags.insert(path.clone(), value.clone());
        }
        Ok(())
    }
}

/// Relative path -> initial value for every layout tag.
fn seed_values(seed: &StoreSeed) -> Vec<(&'static str, TagValue)> {
    paths::LAYOUT
        .iter()
        .map(|(path, kind)| {
            let value = match *path {
                paths::shift::CURRENT_SHIFT => TagValue::Int(seed.initial_shift),
                paths::shift::SHIFT_TARGET_KWH => TagValue::Float(seed.shift_target_kwh),
                _ => match (seed.counters.get(*path), kind) {
                    (Some(v), TagKind::Int) => TagValue::Int(v.trunc() as i64),
                    (Some(v), TagKind::Float) => TagValue::Float(*v),
                    _ => kind.zero(),
                },
            };
            (*path, value)
        })
        .collect()
}
