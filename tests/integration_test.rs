// Integration tests for trialmatch
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use trialmatch::prelude::*;
use trialmatch::{Column, CorpusSnapshot, SnapshotCorpusStore};
use trialmatch_similarity::EffectiveWeights;

fn unit(cosine_with_x: f32) -> Vector {
    Vector::new(vec![cosine_with_x, (1.0 - cosine_with_x * cosine_with_x).sqrt()])
}

fn trial(key: &str, disease: &str, drug: &str, embedding: Vector) -> TrialRecord {
    TrialRecord::new(Some(key))
        .with_disease(disease)
        .with_value(Field::Drug, drug)
        .with_embedding(Field::Drug, embedding)
}

fn drug_ranker() -> TrialRanker {
    let weights = WeightTable::from_entries([("Drug_similarity", 1.0)]).unwrap();
    TrialRanker::new(weights, ScoringConfig::default()).unwrap()
}

#[test]
fn test_exact_text_match_scores_one() {
    let store = MemoryCorpusStore::from_records([trial(
        "NCT002",
        "Diabetes",
        "metformin ",
        unit(0.6),
    )])
    .unwrap();
    let query = trial("NCT001", "Diabetes", "Metformin", unit(1.0));

    let response = find_similar_trials(&store, &drug_ranker(), &query, None).unwrap();

    // embeddings are only 0.6 similar, the raw text decides
    assert_eq!(response.trials[0].drug_similarity, Some(1.0));
    assert_eq!(response.trials[0].overall_similarity, 1.0);
}

#[test]
fn test_unknown_query_field_renormalizes_weights() {
    let weights = WeightTable::from_entries([
        ("IAge_similarity", 0.1),
        ("IGender_similarity", 0.1),
        ("Drug_similarity", 0.8),
    ])
    .unwrap();
    let ranker = TrialRanker::new(weights, ScoringConfig::default()).unwrap();

    let query = trial("NCT001", "Asthma", "Albuterol", unit(1.0))
        .with_value(Field::IAge, "unknown")
        .with_value(Field::IGender, "All")
        .with_embedding(Field::IGender, unit(0.5));

    let effective = ranker.effective_weights(&query);
    assert_eq!(effective.len(), 2);
    assert!(effective.get(Column::Primitive(Field::IAge)).is_none());
    assert!((effective.get(Column::Primitive(Field::IGender)).unwrap() - 0.111).abs() < 1e-3);
    assert!((effective.get(Column::Primitive(Field::Drug)).unwrap() - 0.889).abs() < 1e-3);
    assert!((effective.total() - 1.0).abs() < 1e-6);
}

#[test]
fn test_effective_weights_ignore_corpus() {
    let table = WeightTable::default();
    let query = trial("NCT001", "Asthma", "Albuterol", unit(1.0));

    let unknown = trialmatch_similarity::unknown_query_fields(&query);
    let first = EffectiveWeights::for_query(&table, &unknown);
    let second = EffectiveWeights::for_query(&table, &unknown);
    assert_eq!(first, second);
    assert!((first.total() - 1.0).abs() < 1e-6);
}

#[test]
fn test_ranking_order() {
    let store = MemoryCorpusStore::from_records([
        trial("NCT-A", "Hypertension", "a", unit(0.9)),
        trial("NCT-B", "Hypertension", "b", unit(0.3)),
        trial("NCT-C", "Hypertension", "c", unit(0.6)),
    ])
    .unwrap();
    let query = trial("NCT-Q", "Hypertension", "q", unit(1.0));

    let response = find_similar_trials(&store, &drug_ranker(), &query, None).unwrap();
    let order: Vec<&str> = response
        .trials
        .iter()
        .map(|t| t.nct_number.as_deref().unwrap())
        .collect();
    assert_eq!(order, vec!["NCT-A", "NCT-C", "NCT-B"]);
    assert!((response.trials[0].overall_similarity - 0.9).abs() < 1e-5);
}

#[test]
fn test_unindexed_disease_returns_empty() {
    let store = MemoryCorpusStore::from_records([trial("NCT-A", "Hypertension", "a", unit(0.9))])
        .unwrap();
    let query = trial("NCT-Q", "Hypertension", "q", unit(1.0));

    let response = find_similar_trials(&store, &drug_ranker(), &query, Some("Malaria")).unwrap();
    assert_eq!(response.status, RankingStatus::EmptyCorpus);
    assert!(response.trials.is_empty());
}

#[test]
fn test_self_match_never_returned() {
    let store = MemoryCorpusStore::from_records([
        trial("NCT-Q", "Asthma", "q", unit(1.0)),
        trial("NCT-A", "Asthma", "a", unit(0.2)),
    ])
    .unwrap();
    let query = trial("nct-q", "Asthma", "q", unit(1.0));

    let response = find_similar_trials(&store, &drug_ranker(), &query, None).unwrap();
    assert_eq!(response.trials.len(), 1);
    assert_eq!(response.trials[0].nct_number.as_deref(), Some("NCT-A"));
}

#[test]
fn test_output_length_is_capped() {
    for size in [0usize, 4, 10, 23] {
        let records: Vec<TrialRecord> = (0..size)
            .map(|i| trial(&format!("NCT{}", i), "Asthma", "x", unit(i as f32 / 25.0)))
            .collect();
        let query = trial("NCT-Q", "Asthma", "q", unit(1.0));

        let outcome = drug_ranker().rank(&query, &records).unwrap();
        assert_eq!(outcome.results.len(), size.min(10));
    }
}

#[test]
fn test_scores_do_not_depend_on_corpus_order() {
    let records: Vec<TrialRecord> = [0.1, 0.8, 0.45, 0.7, 0.2]
        .iter()
        .enumerate()
        .map(|(i, c)| trial(&format!("NCT{}", i), "Asthma", "x", unit(*c)))
        .collect();
    let mut reversed = records.clone();
    reversed.reverse();
    let query = trial("NCT-Q", "Asthma", "q", unit(1.0));

    let ranker = drug_ranker();
    let forward = ranker.rank(&query, &records).unwrap();
    let backward = ranker.rank(&query, &reversed).unwrap();

    let scores = |outcome: &trialmatch::RankingOutcome<'_>| -> Vec<(String, f32)> {
        outcome
            .results
            .iter()
            .map(|r| (r.record.label().to_string(), r.score()))
            .collect()
    };
    assert_eq!(scores(&forward), scores(&backward));
}

#[test]
fn test_degenerate_query_warns() {
    let store = MemoryCorpusStore::from_records([trial("NCT-A", "Asthma", "a", unit(0.9))])
        .unwrap();
    let query = TrialRecord::new(Some("NCT-Q"))
        .with_disease("Asthma")
        .with_value(Field::IAge, "18-65");

    let response = find_similar_trials(&store, &drug_ranker(), &query, None).unwrap();
    assert_eq!(response.status, RankingStatus::DegenerateWeights);
    assert!(response.warning.is_some());
    assert!(response.trials.is_empty());
}

#[test]
fn test_import_snapshot_and_rank() {
    let mut corpus = NamedTempFile::with_suffix(".json").unwrap();
    let rows = serde_json::json!([
        {
            "NCT_Number": "NCT-A",
            "Disease": "Hypertension",
            "Study_Title": "Lisinopril in adults",
            "values": { "Drug": "Lisinopril", "IAge": "18-65" },
            "embeddings": { "Drug_embeddings": [0.6, 0.8], "IAge": [1.0, 0.0] }
        },
        {
            "NCT_Number": "NCT-B",
            "Disease": "Hypertension",
            "values": { "Drug": "Amlodipine", "IAge": "Not Available" },
            "embeddings": { "Drug_embeddings": [1.0, 0.0] }
        }
    ]);
    corpus.write_all(rows.to_string().as_bytes()).unwrap();

    let dir = TempDir::new().unwrap();
    let snapshot_path = dir.path().join("corpus.snapshot");
    let store = trialmatch_storage::import_corpus(corpus.path(), Some(2)).unwrap();
    CorpusSnapshot::from_store(&store).unwrap().save(&snapshot_path).unwrap();

    let weights = WeightTable::from_entries([("Drug_similarity", 0.5), ("IAge_similarity", 0.5)])
        .unwrap();
    let ranker = TrialRanker::new(weights, ScoringConfig::default()).unwrap();
    let query = TrialRecord::new(Some("NCT-Q"))
        .with_disease("hypertension")
        .with_value(Field::Drug, "Amlodipine")
        .with_embedding(Field::Drug, Vector::new(vec![1.0, 0.0]))
        .with_value(Field::IAge, "18-65")
        .with_embedding(Field::IAge, Vector::new(vec![1.0, 0.0]));

    let snapshot_store = SnapshotCorpusStore::new(&snapshot_path);
    let response = find_similar_trials(&snapshot_store, &ranker, &query, None).unwrap();

    // NCT-A: 0.5 * 0.6 + 0.5 * 1.0; NCT-B: 0.5 * 1.0 with IAge unknown
    assert_eq!(response.trials.len(), 2);
    assert_eq!(response.trials[0].nct_number.as_deref(), Some("NCT-A"));
    assert!((response.trials[0].overall_similarity - 0.8).abs() < 1e-5);
    assert!((response.trials[1].overall_similarity - 0.5).abs() < 1e-5);
    assert_eq!(
        response.trials[0].study_title.as_deref(),
        Some("Lisinopril in adults")
    );
}
