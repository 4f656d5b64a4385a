//! # trialmatch Similarity
//!
//! Per-field similarity scoring and weighted ranking of clinical trials.
//!
//! ## Features
//!
//! - **Per-field cosine similarity** with an exact-text override
//! - **Unknown-value propagation**: unknown fields are not-applicable, never zero
//! - **Weight normalization** per query, driven by the query's unknown fields
//! - **Composite blends** for inclusion, exclusion, title and outcome sections
//! - **Ranking** with self-exclusion and a configurable top-K
//!
//! ## Example
//!
//! ```rust
//! use trialmatch_core::{Field, TrialRecord, Vector};
//! use trialmatch_similarity::{RankingStatus, ScoringConfig, TrialRanker, WeightTable};
//!
//! let weights = WeightTable::from_entries([
//!     ("Drug_similarity", 0.8),
//!     ("IAge_similarity", 0.2),
//! ])
//! .unwrap();
//! let ranker = TrialRanker::new(weights, ScoringConfig::default()).unwrap();
//!
//! let query = TrialRecord::new(Some("NCT-QUERY"))
//!     .with_value(Field::Drug, "Metformin")
//!     .with_embedding(Field::Drug, Vector::new(vec![1.0, 0.0]));
//! let corpus = vec![
//!     TrialRecord::new(Some("NCT-A"))
//!         .with_value(Field::Drug, "metformin")
//!         .with_embedding(Field::Drug, Vector::new(vec![0.0, 1.0])),
//! ];
//!
//! let outcome = ranker.rank(&query, &corpus).unwrap();
//! assert_eq!(outcome.status, RankingStatus::Ranked);
//! assert_eq!(outcome.results[0].score(), 1.0);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Per-field  │────>│   Unknown   │────>│  Composite  │
//! │   cosine    │     │ propagation │     │   blends    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//! ┌─────────────┐     ┌─────────────┐            │
//! │   Weight    │────>│   Ranker    │<───────────┘
//! │ normalizer  │     │ (top-K)     │
//! └─────────────┘     └─────────────┘
//!                            │
//!                     ┌─────────────┐
//!                     │  Explain    │
//!                     │ (response)  │
//!                     └─────────────┘
//! ```

pub mod column;
pub mod config;
pub mod distance;
pub mod explain;
pub mod rerank;
pub mod row;
pub mod unknown;
pub mod weights;

pub use column::{Column, Composite};
pub use config::{NegativeSimilarity, ScoringConfig, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_TOP_K};
pub use distance::{ensure_row_count, CosineScorer};
pub use explain::{RankedTrial, SimilarityStats, TopTrialsResponse};
pub use rerank::{RankedResult, RankingOutcome, RankingStatus, TrialRanker};
pub use row::{blend, SimilarityCell, SimilarityRow};
pub use unknown::{propagate_unknowns, unknown_query_fields};
pub use weights::{EffectiveWeights, WeightError, WeightRow, WeightTable};
