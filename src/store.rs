//! Persistence of the last observed status per job.
//!
//! Only the most recent [`JobStatus`] of each watched job is kept, under the
//! job's key: the Flink job id, or `name:<needle>` for jobs watched by name.
//! [`JsonFileStore`] writes them as one JSON object; [`MemoryStore`] keeps
//! them in a map and is what the tests use.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::reconciler::JobStatus;

pub trait StatusStore {
    fn load(&self, key: &str) -> Result<Option<JobStatus>, StoreError>;

    fn save(&mut self, key: &str, status: &JobStatus) -> Result<(), StoreError>;

    /// Every stored record with its key, ordered by key.
    fn all(&self) -> Result<Vec<(String, JobStatus)>, StoreError>;
}

/// Status records in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, JobStatus>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&contents) {
            Ok(records) => Ok(records),
            Err(e) => {
                // A damaged file only costs us one round of first-seen alerts.
                tracing::warn!(path = %self.path.display(), error = %e, "status file unreadable, starting fresh");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, records: &BTreeMap<String, JobStatus>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(records)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StatusStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<JobStatus>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn save(&mut self, key: &str, status: &JobStatus) -> Result<(), StoreError> {
        let mut records = self.read_all()?;
        records.insert(key.to_string(), status.clone());
        self.write_all(&records)
    }

    fn all(&self) -> Result<Vec<(String, JobStatus)>, StoreError> {
        Ok(self.read_all()?.into_iter().collect())
    }
}

/// Records held in memory only; used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, JobStatus>,
}

impl FromIterator<(String, JobStatus)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (String, JobStatus)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl StatusStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<JobStatus>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn save(&mut self, key: &str, status: &JobStatus) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), status.clone());
        Ok(())
    }

    fn all(&self) -> Result<Vec<(String, JobStatus)>, StoreError> {
        let mut records: Vec<(String, JobStatus)> = self
            .records
            .iter()
            .map(|(key, status)| (key.clone(), status.clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(records)
    }
}
