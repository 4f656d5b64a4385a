//! # trialmatch Core
//!
//! Core types for matching a candidate clinical trial against indexed trials.
//!
//! - [`Field`] - the fixed set of independently scored trial attributes
//! - [`FieldMap`] - dense per-field storage
//! - [`TrialRecord`] - query and corpus row shape, built from [`RawTrialRecord`]
//! - [`Vector`] - field embeddings with SIMD dot product and norm
//!
//! ## Example
//!
//! ```rust
//! use trialmatch_core::{Field, TrialRecord, Vector};
//!
//! let query = TrialRecord::new(Some("NCT00000001"))
//!     .with_disease("Hypertension")
//!     .with_value(Field::Drug, "Metformin")
//!     .with_value(Field::IAge, "unknown")
//!     .with_embedding(Field::Drug, Vector::new(vec![0.2, 0.9, 0.1]));
//!
//! assert!(query.is_unknown(Field::IAge));
//! assert_eq!(query.value(Field::Drug), Some("Metformin"));
//! ```

pub mod error;
pub mod field;
pub mod record;
pub mod value;
pub mod vector;

/// SIMD-optimized vector operations
///
/// - AVX2/FMA on x86_64
/// - NEON on ARM64/Apple Silicon
pub mod simd;

pub use error::{Error, Result};
pub use field::{Field, FieldMap, FieldSet};
pub use record::{CorpusRecord, QueryRecord, RawTrialRecord, TrialRecord, TrialText};
pub use value::{is_missing, normalize_value, texts_match, MISSING_SENTINELS};
pub use vector::Vector;
