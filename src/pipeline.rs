//! Request pipeline: corpus lookup, ranking and response shaping.

use rayon::prelude::*;
use std::path::Path;
use trialmatch_core::{Error, Result, TrialRecord};
use trialmatch_similarity::{TopTrialsResponse, TrialRanker};
use trialmatch_storage::{CorpusRow, CorpusStore};

/// Rank the trials indexed under `disease` against `query`.
///
/// Without an explicit disease the query's own disease selects the corpus.
pub fn find_similar_trials(
    store: &dyn CorpusStore,
    ranker: &TrialRanker,
    query: &TrialRecord,
    disease: Option<&str>,
) -> Result<TopTrialsResponse> {
    query.validate_query()?;
    let disease = disease
        .or(query.disease.as_deref())
        .ok_or_else(|| {
            Error::InvalidRecord(format!("{} names no disease to match within", query.label()))
        })?;

    let corpus = store.load_by_disease(disease)?;
    tracing::debug!(query = query.label(), disease, trials = corpus.len(), "loaded corpus");

    let outcome = ranker.rank(query, &corpus)?;
    let response = TopTrialsResponse::from_outcome(&outcome);
    tracing::info!(
        query = query.label(),
        disease,
        status = ?response.status,
        results = response.trials.len(),
        "ranked similar trials"
    );
    Ok(response)
}

/// Rank several queries in parallel, one result per query in input order
pub fn rank_batch(
    store: &dyn CorpusStore,
    ranker: &TrialRanker,
    queries: &[TrialRecord],
) -> Vec<Result<TopTrialsResponse>> {
    queries
        .par_iter()
        .map(|query| find_similar_trials(store, ranker, query, None))
        .collect()
}

/// Read one query trial from a JSON object
pub fn read_query<P: AsRef<Path>>(path: P, expected_dim: Option<usize>) -> Result<TrialRecord> {
    let json = std::fs::read_to_string(path.as_ref())?;
    let row: CorpusRow = serde_json::from_str(&json)?;
    row.into_record(expected_dim)
}

/// Read query trials from a JSON array
pub fn read_queries<P: AsRef<Path>>(
    path: P,
    expected_dim: Option<usize>,
) -> Result<Vec<TrialRecord>> {
    trialmatch_storage::read_rows(path)?
        .into_iter()
        .map(|row| row.into_record(expected_dim))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialmatch_core::{Field, Vector};
    use trialmatch_similarity::RankingStatus;
    use trialmatch_storage::MemoryCorpusStore;

    fn trial(key: &str, disease: &str, embedding: &[f32]) -> TrialRecord {
        TrialRecord::new(Some(key))
            .with_disease(disease)
            .with_value(Field::Drug, key)
            .with_embedding(Field::Drug, Vector::from_slice(embedding))
    }

    fn store() -> MemoryCorpusStore {
        MemoryCorpusStore::from_records([
            trial("A", "Hypertension", &[1.0, 0.0]),
            trial("B", "Hypertension", &[0.0, 1.0]),
            trial("C", "Diabetes", &[1.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_query_disease_is_fallback() {
        let query = trial("Q", "HYPERTENSION", &[1.0, 0.0]);
        let response =
            find_similar_trials(&store(), &TrialRanker::default(), &query, None).unwrap();
        assert_eq!(response.trials.len(), 2);

        let response =
            find_similar_trials(&store(), &TrialRanker::default(), &query, Some("diabetes"))
                .unwrap();
        assert_eq!(response.trials.len(), 1);
    }

    #[test]
    fn test_missing_disease_is_rejected() {
        let query = TrialRecord::new(Some("Q"))
            .with_value(Field::Drug, "x")
            .with_embedding(Field::Drug, Vector::from_slice(&[1.0, 0.0]));
        assert!(matches!(
            find_similar_trials(&store(), &TrialRanker::default(), &query, None),
            Err(Error::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_batch_keeps_query_order() {
        let queries = vec![
            trial("Q1", "Diabetes", &[1.0, 0.0]),
            trial("Q2", "Malaria", &[1.0, 0.0]),
            trial("Q3", "Hypertension", &[1.0, 0.0]),
        ];
        let results = rank_batch(&store(), &TrialRanker::default(), &queries);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().trials.len(), 1);
        assert_eq!(results[1].as_ref().unwrap().status, RankingStatus::EmptyCorpus);
        assert_eq!(results[2].as_ref().unwrap().trials.len(), 2);
    }
}
