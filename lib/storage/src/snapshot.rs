//! Binary corpus snapshots.
//!
//! A snapshot is the full indexed corpus serialized with bincode and
//! written atomically, so a reader never sees a partially written file.

use crate::store::{disease_key, CorpusStore, MemoryCorpusStore};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use trialmatch_core::{Error, Result, TrialRecord};

/// Format version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    pub version: u32,
    /// Shared embedding dimension, if any trial has embeddings
    pub dimension: Option<usize>,
    /// Seconds since the Unix epoch
    pub created_at: u64,
    pub records: Vec<TrialRecord>,
}

impl CorpusSnapshot {
    pub fn from_store(store: &MemoryCorpusStore) -> Result<Self> {
        Ok(Self {
            version: SNAPSHOT_VERSION,
            dimension: store.dimension(),
            created_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map_err(|e| Error::Storage(e.to_string()))?
                .as_secs(),
            records: store.records(),
        })
    }

    /// Write the snapshot, replacing any existing file atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = bincode::serialize(self)
            .map_err(|e| Error::Serialization(format!("Snapshot serialization error: {}", e)))?;

        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|file| file.write_all(&data))
            .map_err(|e| Error::Storage(format!("cannot write {}: {}", path.display(), e)))?;

        tracing::info!(
            path = %path.display(),
            trials = self.records.len(),
            bytes = data.len(),
            "saved corpus snapshot"
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let snapshot: CorpusSnapshot = bincode::deserialize(&data)
            .map_err(|e| Error::Serialization(format!("Snapshot deserialization error: {}", e)))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::Storage(format!(
                "{} has snapshot version {}, expected {}",
                path.display(),
                snapshot.version,
                SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }

    pub fn into_store(self) -> Result<MemoryCorpusStore> {
        MemoryCorpusStore::from_records(self.records)
    }
}

/// Corpus store reading its snapshot file on every load.
///
/// Each load sees the last completely written snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotCorpusStore {
    path: PathBuf,
}

impl SnapshotCorpusStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusStore for SnapshotCorpusStore {
    fn load_by_disease(&self, disease: &str) -> Result<Arc<Vec<TrialRecord>>> {
        let key = disease_key(disease);
        let snapshot = CorpusSnapshot::load(&self.path)?;
        let records: Vec<TrialRecord> = snapshot
            .records
            .into_iter()
            .filter(|record| {
                record
                    .disease
                    .as_deref()
                    .is_some_and(|d| disease_key(d) == key)
            })
            .collect();
        tracing::debug!(disease = %key, trials = records.len(), "loaded corpus from snapshot");
        Ok(Arc::new(records))
    }

    fn diseases(&self) -> Result<Vec<String>> {
        CorpusSnapshot::load(&self.path)?.into_store()?.diseases()
    }
}
