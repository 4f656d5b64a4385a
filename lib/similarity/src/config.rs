//! Scoring configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use trialmatch_core::{Error, Result};

/// Default number of ranked trials returned
pub const DEFAULT_TOP_K: usize = 10;

/// Corpus size from which per-field cosine scoring runs on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// What to do with negative cosine similarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeSimilarity {
    /// Clamp to [0, 1]; anti-correlated embeddings score as dissimilar
    #[default]
    Clamp,
    /// Keep the full [-1, 1] cosine range
    Preserve,
}

impl NegativeSimilarity {
    /// Score given to a pair involving a zero vector
    #[inline]
    pub fn floor(self) -> f32 {
        match self {
            NegativeSimilarity::Clamp => 0.0,
            NegativeSimilarity::Preserve => -1.0,
        }
    }

    #[inline]
    pub fn apply(self, cosine: f32) -> f32 {
        cosine.clamp(self.floor(), 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Number of trials returned
    pub top_k: usize,
    pub negative_similarity: NegativeSimilarity,
    /// Drop corpus rows sharing the query's identifying key
    pub exclude_self: bool,
    /// Expected embedding dimension D; when set every embedding is checked
    pub expected_dim: Option<usize>,
    pub parallel_threshold: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            negative_similarity: NegativeSimilarity::Clamp,
            exclude_self: true,
            expected_dim: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".to_string()));
        }
        if self.expected_dim == Some(0) {
            return Err(Error::InvalidConfig(
                "expected_dim must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a JSON config file; missing keys take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: ScoringConfig = serde_json::from_str(&json)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }
}
