//! Per-disease read cache over any [`CorpusStore`].

use crate::store::{disease_key, CorpusStore};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use trialmatch_core::{Result, TrialRecord};

/// Memoizes non-empty disease loads until invalidated.
pub struct CachedCorpusStore<S> {
    inner: S,
    cache: RwLock<AHashMap<String, Arc<Vec<TrialRecord>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: CorpusStore> CachedCorpusStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: RwLock::new(AHashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop the cached corpus for one disease
    pub fn invalidate(&self, disease: &str) -> bool {
        self.cache.write().remove(&disease_key(disease)).is_some()
    }

    pub fn clear(&self) {
        self.cache.write().clear();
    }

    /// Number of diseases currently cached
    pub fn cached_diseases(&self) -> usize {
        self.cache.read().len()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

impl<S: CorpusStore> CorpusStore for CachedCorpusStore<S> {
    fn load_by_disease(&self, disease: &str) -> Result<Arc<Vec<TrialRecord>>> {
        let key = disease_key(disease);
        if let Some(records) = self.cache.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(records));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let records = self.inner.load_by_disease(disease)?;
        // unindexed diseases stay uncached so arbitrary lookups cannot grow the map
        if !records.is_empty() {
            tracing::debug!(disease = %key, trials = records.len(), "cached corpus load");
            self.cache.write().insert(key, Arc::clone(&records));
        }
        Ok(records)
    }

    fn diseases(&self) -> Result<Vec<String>> {
        self.inner.diseases()
    }
}
