//! # trialmatch
//!
//! Ranks indexed clinical trials by similarity to a candidate trial.
//!
//! Each trial carries twelve independently scored fields (drug, phase,
//! population, disease category, outcome and criteria phrases, age and
//! gender limits), each with a raw value and an embedding. Fields are
//! compared by cosine similarity, unknown fields are left out instead of
//! scoring zero, and the remaining scores are combined with weights
//! renormalized per query.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! trialmatch import --input corpus.json --output corpus.snapshot
//! trialmatch rank --corpus corpus.snapshot --query query.json --disease Hypertension
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use trialmatch::prelude::*;
//!
//! let store = MemoryCorpusStore::from_records([
//!     TrialRecord::new(Some("NCT00000002"))
//!         .with_disease("Hypertension")
//!         .with_value(Field::Drug, "Lisinopril")
//!         .with_embedding(Field::Drug, Vector::new(vec![0.6, 0.8])),
//! ])
//! .unwrap();
//!
//! let query = TrialRecord::new(Some("NCT00000001"))
//!     .with_disease("hypertension")
//!     .with_value(Field::Drug, "Amlodipine")
//!     .with_embedding(Field::Drug, Vector::new(vec![1.0, 0.0]));
//!
//! let ranker = TrialRanker::default();
//! let response = find_similar_trials(&store, &ranker, &query, None).unwrap();
//! assert_eq!(response.status, RankingStatus::Ranked);
//! assert_eq!(response.trials.len(), 1);
//! ```
//!
//! ## Crate Structure
//!
//! - [`trialmatch-core`](trialmatch_core) - fields, records, missing-value normalization, vectors
//! - [`trialmatch-similarity`](trialmatch_similarity) - per-field scoring, weights and ranking
//! - [`trialmatch-storage`](trialmatch_storage) - corpus stores, import and snapshots

pub mod pipeline;

// Re-export core types
pub use trialmatch_core::{
    Error, Field, FieldMap, FieldSet, RawTrialRecord, Result, TrialRecord, TrialText, Vector,
};

// Re-export scoring
pub use trialmatch_similarity::{
    Column, Composite, EffectiveWeights, NegativeSimilarity, RankedTrial, RankingOutcome,
    RankingStatus, ScoringConfig, SimilarityStats, TopTrialsResponse, TrialRanker, WeightTable,
};

// Re-export storage
pub use trialmatch_storage::{
    CachedCorpusStore, CorpusSnapshot, CorpusStore, MemoryCorpusStore, SnapshotCorpusStore,
};

pub use pipeline::{find_similar_trials, rank_batch, read_queries, read_query};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        find_similar_trials, CorpusStore, Error, Field, MemoryCorpusStore, RankingStatus,
        Result, ScoringConfig, TopTrialsResponse, TrialRanker, TrialRecord, Vector, WeightTable,
    };
}
