//! Template record store.
//!
//! # Storage layout
//!
//! ```text
//! ~/.templar/
//!   config.yaml     (see `config`)
//!   records.yaml    (record collection: mode 0600, rewritten atomically)
//! ```
//!
//! # API pattern
//!
//! Path helpers come in two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Every [`FileRecordStore`] call reads the file, applies one change and
//! writes it back. Calls are independent; there is no cross-call locking.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::types::{StatusUpdate, TemplateName, TemplateRecord};

const STORE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.templar/`
pub fn templar_root(home: &Path) -> PathBuf {
    home.join(".templar")
}

/// `<home>/.templar/records.yaml`: pure, no I/O.
pub fn records_path_at(home: &Path) -> PathBuf {
    templar_root(home).join("records.yaml")
}

/// `records_path_at` convenience wrapper.
pub fn records_path() -> Result<PathBuf, StoreError> {
    Ok(records_path_at(&home()?))
}

// ---------------------------------------------------------------------------
// 2. Trait
// ---------------------------------------------------------------------------

/// Persistence for [`TemplateRecord`]s keyed by template name.
pub trait RecordStore {
    fn find_by_name(&self, name: &TemplateName) -> Result<Option<TemplateRecord>, StoreError>;

    fn exists(&self, name: &TemplateName) -> Result<bool, StoreError> {
        Ok(self.find_by_name(name)?.is_some())
    }

    /// Insert a new record. Fails with [`StoreError::Duplicate`] if the name is taken.
    fn insert(&mut self, record: TemplateRecord) -> Result<(), StoreError>;

    /// Apply `update` to the named record.
    ///
    /// Returns `Ok(false)` without writing when no record has that name.
    fn update_status(
        &mut self,
        name: &TemplateName,
        update: &StatusUpdate,
    ) -> Result<bool, StoreError>;

    /// All records, sorted by name.
    fn list_all(&self) -> Result<Vec<TemplateRecord>, StoreError>;
}

// ---------------------------------------------------------------------------
// 3. YAML file store
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    version: u32,
    #[serde(default)]
    templates: Vec<TemplateRecord>,
}

/// Record store backed by a single YAML file.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: PathBuf,
}

impl FileRecordStore {
    /// Store at an explicit file path. The file is created on first write.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<home>/.templar/records.yaml`.
    pub fn open_at(home: &Path) -> Self {
        Self::at_path(records_path_at(home))
    }

    /// `open_at` convenience wrapper.
    pub fn open() -> Result<Self, StoreError> {
        Ok(Self::open_at(&home()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<TemplateName, TemplateRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| io_err(&self.path, e))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let file: RecordFile = serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(file
            .templates
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect())
    }

    /// Atomically save: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
    fn save(&self, records: BTreeMap<TemplateName, TemplateRecord>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
                set_dir_permissions(dir)?;
            }
        }
        let file = RecordFile {
            version: STORE_VERSION,
            templates: records.into_values().collect(),
        };
        let yaml = serde_yaml::to_string(&file)?;
        let tmp = self.path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }
        Ok(())
    }
}

impl RecordStore for FileRecordStore {
    fn find_by_name(&self, name: &TemplateName) -> Result<Option<TemplateRecord>, StoreError> {
        Ok(self.load()?.remove(name))
    }

    fn insert(&mut self, record: TemplateRecord) -> Result<(), StoreError> {
        let mut records = self.load()?;
        if records.contains_key(&record.name) {
            return Err(StoreError::Duplicate {
                name: record.name.0,
            });
        }
        records.insert(record.name.clone(), record);
        self.save(records)
    }

    fn update_status(
        &mut self,
        name: &TemplateName,
        update: &StatusUpdate,
    ) -> Result<bool, StoreError> {
        let mut records = self.load()?;
        let Some(record) = records.get_mut(name) else {
            return Ok(false);
        };
        update.apply_to(record);
        self.save(records)?;
        Ok(true)
    }

    fn list_all(&self) -> Result<Vec<TemplateRecord>, StoreError> {
        Ok(self.load()?.into_values().collect())
    }
}

// ---------------------------------------------------------------------------
// 4. In-memory store
// ---------------------------------------------------------------------------

/// Record store held in memory; used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: BTreeMap<TemplateName, TemplateRecord>,
    /// Number of successful `update_status` writes.
    pub updates: usize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = TemplateRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.name.clone(), r)).collect(),
            updates: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TemplateRecord> {
        self.records.get(&TemplateName::from(name))
    }
}

impl RecordStore for MemoryRecordStore {
    fn find_by_name(&self, name: &TemplateName) -> Result<Option<TemplateRecord>, StoreError> {
        Ok(self.records.get(name).cloned())
    }

    fn insert(&mut self, record: TemplateRecord) -> Result<(), StoreError> {
        if self.records.contains_key(&record.name) {
            return Err(StoreError::Duplicate {
                name: record.name.0,
            });
        }
        self.records.insert(record.name.clone(), record);
        Ok(())
    }

    fn update_status(
        &mut self,
        name: &TemplateName,
        update: &StatusUpdate,
    ) -> Result<bool, StoreError> {
        let Some(record) = self.records.get_mut(name) else {
            return Ok(false);
        };
        update.apply_to(record);
        self.updates += 1;
        Ok(true)
    }

    fn list_all(&self) -> Result<Vec<TemplateRecord>, StoreError> {
        Ok(self.records.values().cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, StoreError> {
    dirs::home_dir().ok_or(StoreError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
