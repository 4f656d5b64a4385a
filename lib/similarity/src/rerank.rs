//! Aggregation and ranking
//!
//! Scores every corpus trial against a query field by field, removes
//! not-applicable cells, combines the rest with the query's effective
//! weights and returns the best trials.

use crate::config::ScoringConfig;
use crate::distance::{ensure_row_count, CosineScorer};
use crate::row::{SimilarityCell, SimilarityRow};
use crate::unknown::{propagate_unknowns, unknown_query_fields};
use crate::weights::{EffectiveWeights, WeightTable};
use serde::{Deserialize, Serialize};
use trialmatch_core::{Error, Field, FieldMap, FieldSet, Result, TrialRecord};

/// Whether a ranking produced meaningful results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingStatus {
    Ranked,
    /// No corpus trials were left to compare against
    EmptyCorpus,
    /// Every weighted column was unknown in the query
    DegenerateWeights,
}

impl RankingStatus {
    /// User-facing warning for the non-ranked outcomes
    pub fn warning(self) -> Option<&'static str> {
        match self {
            RankingStatus::Ranked => None,
            RankingStatus::EmptyCorpus => Some("no indexed trials match the requested disease"),
            RankingStatus::DegenerateWeights => Some(
                "none of the weighted fields are known for this trial; add more trial details",
            ),
        }
    }
}

/// One ranked corpus trial
#[derive(Debug, Clone)]
pub struct RankedResult<'c> {
    pub record: &'c TrialRecord,
    /// Position of the trial in the corpus passed to [`TrialRanker::rank`]
    pub corpus_index: usize,
    pub row: SimilarityRow,
}

impl RankedResult<'_> {
    #[inline]
    pub fn score(&self) -> f32 {
        self.row.overall
    }
}

#[derive(Debug, Clone)]
pub struct RankingOutcome<'c> {
    pub status: RankingStatus,
    /// Best trials first, at most `top_k`
    pub results: Vec<RankedResult<'c>>,
    /// Corpus trials compared after self-exclusion
    pub candidates: usize,
    pub weights: EffectiveWeights,
    pub unknown_fields: FieldSet,
}

impl<'c> RankingOutcome<'c> {
    fn empty(
        status: RankingStatus,
        candidates: usize,
        weights: EffectiveWeights,
        unknown_fields: FieldSet,
    ) -> Self {
        Self {
            status,
            results: Vec::new(),
            candidates,
            weights,
            unknown_fields,
        }
    }
}

/// Ranks corpus trials against a query trial
#[derive(Debug, Clone)]
pub struct TrialRanker {
    weights: WeightTable,
    config: ScoringConfig,
    scorer: CosineScorer,
}

impl TrialRanker {
    pub fn new(weights: WeightTable, config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        let scorer = CosineScorer::from_config(&config);
        Ok(Self {
            weights,
            config,
            scorer,
        })
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Override the number of returned trials
    pub fn with_top_k(mut self, top_k: usize) -> Result<Self> {
        self.config.top_k = top_k;
        self.config.validate()?;
        Ok(self)
    }

    /// Weights for this query with its unknown fields removed
    pub fn effective_weights(&self, query: &TrialRecord) -> EffectiveWeights {
        EffectiveWeights::for_query(&self.weights, &unknown_query_fields(query))
    }

    /// Per-field similarities of every corpus trial, with unknown cells
    /// already marked not-applicable. `overall` is left at zero.
    pub fn similarity_rows(
        &self,
        query: &TrialRecord,
        corpus: &[&TrialRecord],
    ) -> Result<Vec<SimilarityRow>> {
        let mut cells: Vec<FieldMap<SimilarityCell>> = vec![FieldMap::default(); corpus.len()];

        for field in Field::ALL {
            let Some(column) = self.scorer.score_field(field, query, corpus)? else {
                tracing::debug!(field = %field, "query has no embedding, skipping field");
                continue;
            };
            ensure_row_count(field.similarity_column(), corpus.len(), column.len())?;
            for (row, cell) in cells.iter_mut().zip(column) {
                row[field] = cell;
            }
        }

        let mut rows: Vec<SimilarityRow> = cells.into_iter().map(SimilarityRow::new).collect();
        let marked = propagate_unknowns(query, corpus, &mut rows)?;
        tracing::debug!(marked, "marked unknown similarity cells");
        Ok(rows)
    }

    /// Rank `corpus` against `query`.
    ///
    /// Corpus trials sharing the query's key are dropped first when
    /// `exclude_self` is set. Ties keep corpus order. An empty corpus or
    /// fully unknown weights give an empty result with a non-ranked status.
    pub fn rank<'c>(
        &self,
        query: &TrialRecord,
        corpus: &'c [TrialRecord],
    ) -> Result<RankingOutcome<'c>> {
        query.validate_query()?;
        if let Some(dim) = self.config.expected_dim {
            query.validate_dimension(dim)?;
            for record in corpus {
                record.validate_dimension(dim)?;
            }
        }

        let self_key = query
            .nct_number
            .as_deref()
            .filter(|_| self.config.exclude_self);
        let (indices, candidates): (Vec<usize>, Vec<&TrialRecord>) = corpus
            .iter()
            .enumerate()
            .filter(|(_, record)| !self_key.is_some_and(|key| record.key_matches(key)))
            .unzip();
        if candidates.len() < corpus.len() {
            tracing::debug!(query = query.label(), "excluded query trial from its own corpus");
        }

        let unknown_fields = unknown_query_fields(query);
        let weights = EffectiveWeights::for_query(&self.weights, &unknown_fields);

        if candidates.is_empty() {
            tracing::warn!(query = query.label(), "no corpus trials to rank against");
            return Ok(RankingOutcome::empty(
                RankingStatus::EmptyCorpus,
                0,
                weights,
                unknown_fields,
            ));
        }
        if weights.is_empty() {
            tracing::warn!(
                query = query.label(),
                unknown = unknown_fields.len(),
                "no weighted column is known for the query"
            );
            return Ok(RankingOutcome::empty(
                RankingStatus::DegenerateWeights,
                candidates.len(),
                weights,
                unknown_fields,
            ));
        }

        let rows = self.similarity_rows(query, &candidates)?;
        let mut results = Vec::with_capacity(rows.len());
        let scored = indices.into_iter().zip(candidates.iter().copied()).zip(rows);
        for ((corpus_index, record), mut row) in scored {
            row.overall = row.weighted_score(&weights);
            if !row.overall.is_finite() {
                return Err(Error::Numeric(format!(
                    "overall similarity of {} is not finite",
                    record.label()
                )));
            }
            results.push(RankedResult {
                record,
                corpus_index,
                row,
            });
        }

        // sort_by is stable, so equal scores keep corpus order
        results.sort_by(|a, b| b.score().total_cmp(&a.score()));
        results.truncate(self.config.top_k);

        tracing::debug!(
            query = query.label(),
            candidates = candidates.len(),
            returned = results.len(),
            "ranked corpus"
        );

        Ok(RankingOutcome {
            status: RankingStatus::Ranked,
            results,
            candidates: candidates.len(),
            weights,
            unknown_fields,
        })
    }
}

impl Default for TrialRanker {
    fn default() -> Self {
        let config = ScoringConfig::default();
        Self {
            weights: WeightTable::default(),
            scorer: CosineScorer::from_config(&config),
            config,
        }
    }
}
