//! File-backed record store.
//!
//! ## Storage Layout
//!
//! Each record is a single YAML document in a sharded directory tree:
//!
//! ```text
//! <root>/
//!   <s1>/
//!     <s2>/
//!       <id>/
//!         record.yaml
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the record id.
//!
//! Saving a record is the only atomic unit: the document is written to a temporary file in the
//! record directory and renamed over the previous version, so readers never see a partially
//! written document.

use crate::{wire, PatientRecord, RecordId, StoreError, StoreResult, RECORD_FILENAME};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Store of patient records under a root directory.
#[derive(Clone, Debug)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    /// Creates a store rooted at `root`. The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registers a new, empty record and persists it.
    ///
    /// Guards against id collisions (or directories left behind by external interference) by
    /// retrying with a fresh id up to 5 times.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DirCreation`] if no unique directory could be allocated, or a
    /// write error if the initial document cannot be written.
    pub fn create(&self) -> StoreResult<PatientRecord> {
        for _attempt in 0..5 {
            let id = RecordId::new();
            let candidate = id.sharded_dir(&self.root);

            if candidate.exists() {
                continue;
            }

            if let Some(parent) = candidate.parent() {
                fs::create_dir_all(parent).map_err(StoreError::DirCreation)?;
            }

            match fs::create_dir(&candidate) {
                Ok(()) => {
                    let record = PatientRecord::with_id(id);
                    self.write(&record)?;
                    tracing::debug!("created record {}", record.id());
                    return Ok(record);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(StoreError::DirCreation(e)),
            }
        }

        Err(StoreError::DirCreation(io::Error::new(
            ErrorKind::AlreadyExists,
            "failed to allocate a unique record directory after 5 attempts",
        )))
    }

    /// Loads a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordNotFound`] if no document exists for `id`, or a read/parse
    /// error if the document is unreadable.
    pub fn load(&self, id: &RecordId) -> StoreResult<PatientRecord> {
        let path = self.record_path(id);
        if !path.is_file() {
            return Err(StoreError::RecordNotFound(id.to_string()));
        }
        let contents = fs::read_to_string(&path).map_err(StoreError::FileRead)?;
        wire::parse(&contents)
    }

    /// Persists a record, stamping its modification time.
    pub fn save(&self, record: &mut PatientRecord) -> StoreResult<()> {
        record.touch();
        self.write(record)
    }

    /// Deletes a whole record. Records are never partially deleted.
    pub fn delete(&self, id: &RecordId) -> StoreResult<()> {
        let dir = id.sharded_dir(&self.root);
        if !dir.is_dir() {
            return Err(StoreError::RecordNotFound(id.to_string()));
        }
        fs::remove_dir_all(&dir).map_err(StoreError::Delete)
    }

    pub fn exists(&self, id: &RecordId) -> bool {
        self.record_path(id).is_file()
    }

    /// Lists the ids of all stored records.
    ///
    /// Traverses the sharded directory structure; directories that are not canonical ids or do
    /// not hold a record document are skipped with a warning.
    pub fn list(&self) -> Vec<RecordId> {
        let mut ids = Vec::new();

        let s1_iter = match fs::read_dir(&self.root) {
            Ok(it) => it,
            Err(_) => return ids,
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let id_path = id_ent.path();
                    if !id_path.join(RECORD_FILENAME).is_file() {
                        continue;
                    }

                    let name = id_path
                        .file_name()
                        .and_then(|os| os.to_str())
                        .unwrap_or("");
                    match RecordId::parse(name) {
                        Ok(id) => ids.push(id),
                        Err(e) => {
                            tracing::warn!(
                                "skipping record directory {}: {}",
                                id_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        ids.sort();
        ids
    }

    fn record_path(&self, id: &RecordId) -> PathBuf {
        id.sharded_dir(&self.root).join(RECORD_FILENAME)
    }

    fn write(&self, record: &PatientRecord) -> StoreResult<()> {
        let dir = record.id().sharded_dir(&self.root);
        fs::create_dir_all(&dir).map_err(StoreError::DirCreation)?;

        let yaml = wire::render(record)?;
        let tmp = dir.join(format!("{RECORD_FILENAME}.tmp"));
        fs::write(&tmp, yaml).map_err(StoreError::FileWrite)?;
        fs::rename(&tmp, dir.join(RECORD_FILENAME)).map_err(StoreError::FileWrite)
    }
}
