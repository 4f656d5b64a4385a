//! Per-field similarity engine
//!
//! Cosine similarity between a query field embedding and the same field of
//! every corpus row, with an exact-text override: when both raw values are
//! known and equal after trimming and case folding the score is exactly 1.0.

use crate::config::{NegativeSimilarity, ScoringConfig};
use crate::row::SimilarityCell;
use rayon::prelude::*;
use trialmatch_core::{texts_match, Error, Field, Result, TrialRecord, Vector};

/// Batch cosine scorer for one query vector against many rows.
#[derive(Debug, Clone, Copy)]
pub struct CosineScorer {
    policy: NegativeSimilarity,
    parallel_threshold: usize,
}

impl CosineScorer {
    pub fn new(policy: NegativeSimilarity, parallel_threshold: usize) -> Self {
        Self {
            policy,
            parallel_threshold,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.negative_similarity, config.parallel_threshold)
    }

    pub fn policy(&self) -> NegativeSimilarity {
        self.policy
    }

    /// Cosine similarity of `query` against every row of `matrix`.
    ///
    /// The output has exactly one entry per row. Zero vectors on either side
    /// score the policy floor; the magnitude of any other vector does not
    /// matter. Rows of a different dimension and non-finite results are
    /// errors.
    pub fn score(&self, query: &Vector, matrix: &[&Vector]) -> Result<Vec<f32>> {
        if matrix.is_empty() {
            return Ok(Vec::new());
        }

        if let Some((row, bad)) = matrix
            .iter()
            .enumerate()
            .find(|(_, row)| row.dim() != query.dim())
        {
            return Err(Error::DimensionMismatch {
                context: format!("corpus row {}", row),
                expected: query.dim(),
                actual: bad.dim(),
            });
        }

        let floor = self.policy.floor();
        let Some(unit_query) = query.unit() else {
            return Ok(vec![floor; matrix.len()]);
        };

        let score_row = |row: &&Vector| -> f32 {
            let norm = row.norm();
            if norm == 0.0 {
                return floor;
            }
            let cosine = (f64::from(unit_query.dot(row)) / norm) as f32;
            if !cosine.is_finite() {
                return cosine;
            }
            self.policy.apply(cosine)
        };

        let scores: Vec<f32> = if matrix.len() >= self.parallel_threshold {
            matrix.par_iter().map(score_row).collect()
        } else {
            matrix.iter().map(score_row).collect()
        };

        if let Some(row) = scores.iter().position(|s| !s.is_finite()) {
            return Err(Error::Numeric(format!(
                "cosine similarity for corpus row {} is not finite",
                row
            )));
        }
        ensure_row_count("cosine batch", matrix.len(), scores.len())?;
        Ok(scores)
    }

    /// Similarity cells for one field of the query against every corpus row.
    ///
    /// Returns `None` when the query has no embedding for the field; the
    /// field is then treated as unknown. A corpus row with neither an exact
    /// text match nor an embedding gets a not-applicable cell.
    pub fn score_field(
        &self,
        field: Field,
        query: &TrialRecord,
        corpus: &[&TrialRecord],
    ) -> Result<Option<Vec<SimilarityCell>>> {
        let Some(query_embedding) = query.embedding(field) else {
            return Ok(None);
        };
        let query_value = query.value(field);

        let mut cells = vec![SimilarityCell::NotApplicable; corpus.len()];
        let mut positions = Vec::with_capacity(corpus.len());
        let mut matrix = Vec::with_capacity(corpus.len());

        for (i, record) in corpus.iter().enumerate() {
            if let (Some(ours), Some(theirs)) = (query_value, record.value(field)) {
                if texts_match(ours, theirs) {
                    cells[i] = SimilarityCell::Score(1.0);
                    continue;
                }
            }
            if let Some(embedding) = record.embedding(field) {
                if embedding.dim() != query_embedding.dim() {
                    return Err(Error::DimensionMismatch {
                        context: format!("{} embedding of {}", field, record.label()),
                        expected: query_embedding.dim(),
                        actual: embedding.dim(),
                    });
                }
                positions.push(i);
                matrix.push(embedding);
            }
        }

        let scores = self.score(query_embedding, &matrix)?;
        ensure_row_count(field.similarity_column(), positions.len(), scores.len())?;
        for (i, score) in positions.into_iter().zip(scores) {
            cells[i] = SimilarityCell::Score(score);
        }

        Ok(Some(cells))
    }
}

impl Default for CosineScorer {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

/// Fail unless a per-row result has one entry per corpus row
pub fn ensure_row_count(context: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::LengthMismatch {
            context: context.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
