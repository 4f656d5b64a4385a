//! Disease-scoped corpus access.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use trialmatch_core::{Error, Result, TrialRecord};

/// Read access to indexed trials, scoped by disease.
///
/// Each load returns a consistent snapshot; later inserts never change a
/// vector a caller already holds.
pub trait CorpusStore: Send + Sync {
    /// Trials whose disease matches `disease` (trimmed, case-insensitive).
    /// An unknown disease yields an empty corpus.
    fn load_by_disease(&self, disease: &str) -> Result<Arc<Vec<TrialRecord>>>;

    /// Disease names with at least one indexed trial
    fn diseases(&self) -> Result<Vec<String>>;
}

/// Lookup key for a disease name
pub fn disease_key(disease: &str) -> String {
    disease.trim().to_lowercase()
}

#[derive(Debug, Default)]
struct DiseaseBucket {
    name: String,
    records: Arc<Vec<TrialRecord>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    buckets: HashMap<String, DiseaseBucket>,
    dimension: Option<usize>,
}

/// In-memory corpus indexed by disease
#[derive(Debug, Default)]
pub struct MemoryCorpusStore {
    inner: RwLock<StoreInner>,
}

impl MemoryCorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = TrialRecord>,
    {
        let store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    /// Index one trial under its disease.
    ///
    /// Every embedding in the store must share one dimension.
    pub fn insert(&self, record: TrialRecord) -> Result<()> {
        let disease = record
            .disease
            .clone()
            .ok_or_else(|| Error::InvalidRecord(format!("{} has no disease", record.label())))?;
        let record_dim = record.embedding_dim()?;

        let mut inner = self.inner.write();
        if let Some(dim) = record_dim {
            match inner.dimension {
                Some(expected) if expected != dim => {
                    return Err(Error::DimensionMismatch {
                        context: format!("embeddings of {}", record.label()),
                        expected,
                        actual: dim,
                    });
                }
                Some(_) => {}
                None => inner.dimension = Some(dim),
            }
        }

        let bucket = inner
            .buckets
            .entry(disease_key(&disease))
            .or_insert_with(|| DiseaseBucket {
                name: disease,
                records: Arc::default(),
            });
        Arc::make_mut(&mut bucket.records).push(record);
        Ok(())
    }

    /// Embedding dimension shared by the stored trials
    pub fn dimension(&self) -> Option<usize> {
        self.inner.read().dimension
    }

    pub fn len(&self) -> usize {
        self.inner.read().buckets.values().map(|b| b.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every stored trial, grouped by disease in name order
    pub fn records(&self) -> Vec<TrialRecord> {
        let inner = self.inner.read();
        let mut buckets: Vec<&DiseaseBucket> = inner.buckets.values().collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        buckets
            .into_iter()
            .flat_map(|bucket| bucket.records.iter().cloned())
            .collect()
    }
}

impl CorpusStore for MemoryCorpusStore {
    fn load_by_disease(&self, disease: &str) -> Result<Arc<Vec<TrialRecord>>> {
        let inner = self.inner.read();
        Ok(inner
            .buckets
            .get(&disease_key(disease))
            .map(|bucket| Arc::clone(&bucket.records))
            .unwrap_or_default())
    }

    fn diseases(&self) -> Result<Vec<String>> {
        let inner = self.inner.read();
        let mut names: Vec<String> = inner.buckets.values().map(|b| b.name.clone()).collect();
        names.sort();
        Ok(names)
    }
}
