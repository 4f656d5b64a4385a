//! Result shaping and ranking statistics.
//!
//! Embeddings and primitive similarity cells are dropped here; only the
//! identifying fields, raw texts, composite similarities and the overall
//! score reach the caller.

use crate::column::{Column, Composite};
use crate::rerank::{RankedResult, RankingOutcome, RankingStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trialmatch_core::Field;

/// One matched trial as returned to API and CLI callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTrial {
    pub nct_number: Option<String>,
    pub study_title: Option<String>,
    pub primary_outcome_measures: Option<String>,
    pub secondary_outcome_measures: Option<String>,
    pub inclusion_criteria: Option<String>,
    pub exclusion_criteria: Option<String>,
    pub disease: Option<String>,
    pub drug: Option<String>,
    pub drug_similarity: Option<f32>,
    pub inclusion_criteria_similarity: Option<f32>,
    pub exclusion_criteria_similarity: Option<f32>,
    pub study_title_similarity: Option<f32>,
    pub primary_outcome_measures_similarity: Option<f32>,
    pub secondary_outcome_measures_similarity: Option<f32>,
    pub overall_similarity: f32,
}

impl From<&RankedResult<'_>> for RankedTrial {
    fn from(result: &RankedResult<'_>) -> Self {
        let record = result.record;
        let row = &result.row;
        let composite = |c: Composite| row.composite(c).score();
        Self {
            nct_number: record.nct_number.clone(),
            study_title: record.text.study_title.clone(),
            primary_outcome_measures: record.text.primary_outcome_measures.clone(),
            secondary_outcome_measures: record.text.secondary_outcome_measures.clone(),
            inclusion_criteria: record.text.inclusion_criteria.clone(),
            exclusion_criteria: record.text.exclusion_criteria.clone(),
            disease: record.disease.clone(),
            drug: record.value(Field::Drug).map(str::to_string),
            drug_similarity: row.primitive(Field::Drug).score(),
            inclusion_criteria_similarity: composite(Composite::InclusionCriteria),
            exclusion_criteria_similarity: composite(Composite::ExclusionCriteria),
            study_title_similarity: composite(Composite::StudyTitle),
            primary_outcome_measures_similarity: composite(Composite::PrimaryOutcomeMeasures),
            secondary_outcome_measures_similarity: composite(Composite::SecondaryOutcomeMeasures),
            overall_similarity: result.score(),
        }
    }
}

/// Summary of one ranking request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityStats {
    pub candidates_count: usize,
    pub results_count: usize,
    pub best_score: Option<f32>,
    pub avg_score: Option<f32>,
    /// Column contributing most weighted similarity across the results
    pub top_contributing_column: Option<String>,
    /// Similarity columns of fields the query left unknown
    pub unknown_fields: Vec<String>,
}

impl SimilarityStats {
    pub fn from_outcome(outcome: &RankingOutcome<'_>) -> Self {
        let scores: Vec<f32> = outcome.results.iter().map(RankedResult::score).collect();
        let best_score = scores.iter().copied().reduce(f32::max);
        let avg_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f32>() / scores.len() as f32)
        };

        let mut totals: HashMap<Column, f32> = HashMap::new();
        for result in &outcome.results {
            for (column, contribution) in result.row.contributions(&outcome.weights) {
                *totals.entry(column).or_insert(0.0) += contribution;
            }
        }
        // ties resolve to the column listed first
        let top_contributing_column = Column::all()
            .filter_map(|column| totals.get(&column).map(|total| (column, *total)))
            .fold(None::<(Column, f32)>, |best, (column, total)| match best {
                Some((_, best_total)) if best_total >= total => best,
                _ => Some((column, total)),
            })
            .map(|(column, _)| column.name().to_string());

        Self {
            candidates_count: outcome.candidates,
            results_count: outcome.results.len(),
            best_score,
            avg_score,
            top_contributing_column,
            unknown_fields: outcome
                .unknown_fields
                .iter()
                .map(|field| field.similarity_column().to_string())
                .collect(),
        }
    }
}

/// Ranked trials plus the request status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTrialsResponse {
    pub status: RankingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub trials: Vec<RankedTrial>,
    pub stats: SimilarityStats,
}

impl TopTrialsResponse {
    pub fn from_outcome(outcome: &RankingOutcome<'_>) -> Self {
        Self {
            status: outcome.status,
            warning: outcome.status.warning().map(str::to_string),
            trials: outcome.results.iter().map(RankedTrial::from).collect(),
            stats: SimilarityStats::from_outcome(outcome),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::rerank::TrialRanker;
    use crate::weights::WeightTable;
    use trialmatch_core::{TrialRecord, TrialText, Vector};

    fn trial(key: &str, drug: &str, embedding: &[f32]) -> TrialRecord {
        TrialRecord::new(Some(key))
            .with_disease("Diabetes")
            .with_text(TrialText {
                study_title: Some(format!("{} study", drug)),
                ..TrialText::default()
            })
            .with_value(Field::Drug, drug)
            .with_embedding(Field::Drug, Vector::from_slice(embedding))
    }

    #[test]
    fn test_response_shape() {
        let ranker = TrialRanker::new(WeightTable::default(), ScoringConfig::default()).unwrap();
        let query = trial("Q", "Metformin", &[1.0, 0.0]);
        let corpus = vec![
            trial("NCT1", "Insulin", &[0.0, 1.0]),
            trial("NCT2", "metformin", &[0.0, 1.0]),
        ];
        let outcome = ranker.rank(&query, &corpus).unwrap();
        let response = TopTrialsResponse::from_outcome(&outcome);

        assert_eq!(response.status, RankingStatus::Ranked);
        assert!(response.warning.is_none());
        assert_eq!(response.trials[0].nct_number.as_deref(), Some("NCT2"));
        assert_eq!(response.trials[0].drug_similarity, Some(1.0));
        assert_eq!(response.trials[0].primary_outcome_measures_similarity, None);
        assert_eq!(response.stats.results_count, 2);
        assert_eq!(
            response.stats.top_contributing_column.as_deref(),
            Some("Study_Title_similarity")
        );

        let json = serde_json::to_value(&response).unwrap();
        let first = &json["trials"][0];
        assert_eq!(first["nctNumber"], "NCT2");
        assert_eq!(first["studyTitle"], "metformin study");
        assert!(first.get("overallSimilarity").is_some());
        assert!(first.get("embeddings").is_none());
        assert_eq!(json["status"], "ranked");
    }

    #[test]
    fn test_warning_for_empty_corpus() {
        let ranker = TrialRanker::default();
        let query = trial("Q", "Metformin", &[1.0, 0.0]);
        let response = TopTrialsResponse::from_outcome(&ranker.rank(&query, &[]).unwrap());

        assert_eq!(response.status, RankingStatus::EmptyCorpus);
        assert!(response.warning.is_some());
        assert!(response.trials.is_empty());
        assert_eq!(response.stats.best_score, None);
        assert_eq!(response.stats.avg_score, None);
    }
}
