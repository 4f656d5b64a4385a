//! Typed trial records.
//!
//! A [`TrialRecord`] is both the query shape and the corpus row shape: an
//! identifying key, the registered free-text sections, and per-field values
//! and embeddings. Records are built through [`RawTrialRecord`], which is
//! where sentinel values are normalized and embedding dimensions checked.

use crate::field::{Field, FieldMap, FieldSet};
use crate::value::{normalize_value, texts_match};
use crate::{Error, Result, Vector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-text sections of a registered trial, carried through to results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialText {
    pub study_title: Option<String>,
    pub primary_outcome_measures: Option<String>,
    pub secondary_outcome_measures: Option<String>,
    pub inclusion_criteria: Option<String>,
    pub exclusion_criteria: Option<String>,
}

impl TrialText {
    fn is_empty(&self) -> bool {
        self.study_title.is_none()
            && self.primary_outcome_measures.is_none()
            && self.secondary_outcome_measures.is_none()
            && self.inclusion_criteria.is_none()
            && self.exclusion_criteria.is_none()
    }
}

/// One trial: a scoring query or an indexed corpus row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// NCT number or equivalent identifier
    pub nct_number: Option<String>,
    /// Categorical key used to scope the corpus
    pub disease: Option<String>,
    pub text: TrialText,
    /// Normalized field values, `None` when unknown
    pub values: FieldMap<Option<String>>,
    pub embeddings: FieldMap<Option<Vector>>,
}

/// The candidate trial being matched
pub type QueryRecord = TrialRecord;

/// A previously indexed trial
pub type CorpusRecord = TrialRecord;

impl TrialRecord {
    pub fn new(nct_number: Option<&str>) -> Self {
        Self {
            nct_number: normalize_value(nct_number),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_disease(mut self, disease: &str) -> Self {
        self.disease = normalize_value(Some(disease));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: TrialText) -> Self {
        self.text = text;
        self
    }

    /// Set a field value; sentinel values are stored as unknown
    #[must_use]
    pub fn with_value(mut self, field: Field, raw: &str) -> Self {
        self.values[field] = normalize_value(Some(raw));
        self
    }

    #[must_use]
    pub fn with_embedding(mut self, field: Field, embedding: Vector) -> Self {
        self.embeddings[field] = if embedding.is_empty() {
            None
        } else {
            Some(embedding)
        };
        self
    }

    #[inline]
    pub fn value(&self, field: Field) -> Option<&str> {
        self.values[field].as_deref()
    }

    #[inline]
    pub fn embedding(&self, field: Field) -> Option<&Vector> {
        self.embeddings[field].as_ref()
    }

    #[inline]
    pub fn is_unknown(&self, field: Field) -> bool {
        self.values[field].is_none()
    }

    /// Fields whose raw value is unknown
    pub fn unknown_fields(&self) -> FieldSet {
        Field::ALL
            .into_iter()
            .filter(|field| self.is_unknown(*field))
            .collect()
    }

    /// True if this record is identified by `key` (trimmed, case-insensitive)
    pub fn key_matches(&self, key: &str) -> bool {
        self.nct_number
            .as_deref()
            .is_some_and(|own| texts_match(own, key))
    }

    /// Common embedding dimension of the record, if it has any embedding.
    ///
    /// Fails if two embeddings of the same record disagree.
    pub fn embedding_dim(&self) -> Result<Option<usize>> {
        let mut dim: Option<(Field, usize)> = None;
        for (field, embedding) in self.embeddings.iter() {
            let Some(embedding) = embedding else { continue };
            match dim {
                None => dim = Some((field, embedding.dim())),
                Some((first, expected)) if expected != embedding.dim() => {
                    return Err(Error::DimensionMismatch {
                        context: format!(
                            "{} embedding of {} (first seen on {})",
                            field,
                            self.label(),
                            first
                        ),
                        expected,
                        actual: embedding.dim(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(dim.map(|(_, d)| d))
    }

    /// Check every embedding against the expected dimension D
    pub fn validate_dimension(&self, expected: usize) -> Result<()> {
        for (field, embedding) in self.embeddings.iter() {
            if let Some(embedding) = embedding {
                if embedding.dim() != expected {
                    return Err(Error::DimensionMismatch {
                        context: format!("{} embedding of {}", field, self.label()),
                        expected,
                        actual: embedding.dim(),
                    });
                }
            }
        }
        Ok(())
    }

    /// A query must supply at least one field value or free-text section
    pub fn validate_query(&self) -> Result<()> {
        if self.values.iter().all(|(_, v)| v.is_none()) && self.text.is_empty() {
            return Err(Error::InvalidRecord(
                "at least one trial field or text section must be provided".to_string(),
            ));
        }
        Ok(())
    }

    /// Human-readable identifier for log and error messages
    pub fn label(&self) -> &str {
        self.nct_number.as_deref().unwrap_or("<unidentified trial>")
    }
}

/// Untyped record as it arrives from JSON or a database export.
///
/// Field maps are keyed by field name (`"Drug"`) or stored column name
/// (`"Drug_embeddings"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrialRecord {
    #[serde(default, alias = "NCT_Number", alias = "nctNumber")]
    pub nct_number: Option<String>,
    #[serde(default, alias = "Disease")]
    pub disease: Option<String>,
    #[serde(default, alias = "Study_Title", alias = "studyTitle")]
    pub study_title: Option<String>,
    #[serde(default, alias = "Primary_Outcome_Measures", alias = "primaryOutcomeMeasures")]
    pub primary_outcome_measures: Option<String>,
    #[serde(default, alias = "Secondary_Outcome_Measures", alias = "secondaryOutcomeMeasures")]
    pub secondary_outcome_measures: Option<String>,
    #[serde(default, alias = "Inclusion_Criteria", alias = "inclusionCriteria")]
    pub inclusion_criteria: Option<String>,
    #[serde(default, alias = "Exclusion_Criteria", alias = "exclusionCriteria")]
    pub exclusion_criteria: Option<String>,
    #[serde(default)]
    pub values: HashMap<String, Option<String>>,
    #[serde(default)]
    pub embeddings: HashMap<String, Vec<f32>>,
}

impl RawTrialRecord {
    /// Validate and normalize into a typed record.
    ///
    /// Unknown field names, non-finite embedding components and embeddings
    /// whose length differs from `expected_dim` (or from each other) are
    /// rejected. Empty embeddings count as missing.
    pub fn into_record(self, expected_dim: Option<usize>) -> Result<TrialRecord> {
        let mut record = TrialRecord::new(self.nct_number.as_deref());
        record.disease = normalize_value(self.disease.as_deref());
        record.text = TrialText {
            study_title: normalize_value(self.study_title.as_deref()),
            primary_outcome_measures: normalize_value(self.primary_outcome_measures.as_deref()),
            secondary_outcome_measures: normalize_value(
                self.secondary_outcome_measures.as_deref(),
            ),
            inclusion_criteria: normalize_value(self.inclusion_criteria.as_deref()),
            exclusion_criteria: normalize_value(self.exclusion_criteria.as_deref()),
        };

        let mut seen = FieldSet::new();
        for (name, value) in &self.values {
            let field: Field = name.parse()?;
            if !seen.insert(field) {
                return Err(duplicate_key(&record, "value", field));
            }
            record.values[field] = normalize_value(value.as_deref());
        }

        let mut seen = FieldSet::new();
        for (name, data) in self.embeddings {
            let field: Field = name.parse()?;
            if !seen.insert(field) {
                return Err(duplicate_key(&record, "embedding", field));
            }
            if data.is_empty() {
                continue;
            }
            let embedding = Vector::new(data);
            if !embedding.is_finite() {
                return Err(Error::InvalidRecord(format!(
                    "{} embedding of {} contains non-finite values",
                    field,
                    record.label()
                )));
            }
            record.embeddings[field] = Some(embedding);
        }

        match expected_dim {
            Some(dim) => record.validate_dimension(dim)?,
            None => {
                record.embedding_dim()?;
            }
        }

        Ok(record)
    }
}

fn duplicate_key(record: &TrialRecord, kind: &str, field: Field) -> Error {
    Error::InvalidRecord(format!(
        "{} {} of {} is given under more than one key",
        field,
        kind,
        record.label()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_from(value: serde_json::Value) -> RawTrialRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_ingestion_normalizes_sentinels() {
        let raw = raw_from(json!({
            "NCT_Number": "NCT00000001",
            "Disease": "Hypertension",
            "Study_Title": "A study",
            "Exclusion_Criteria": "NA",
            "values": {
                "Drug": "Metformin",
                "Trial_Phase": "Not Available",
                "IAge": "unknown",
                "IGender": null,
                "EAge": ""
            }
        }));
        let record = raw.into_record(None).unwrap();

        assert_eq!(record.nct_number.as_deref(), Some("NCT00000001"));
        assert_eq!(record.value(Field::Drug), Some("Metformin"));
        assert!(record.is_unknown(Field::TrialPhase));
        assert!(record.is_unknown(Field::IAge));
        assert!(record.is_unknown(Field::IGender));
        assert!(record.is_unknown(Field::EAge));
        assert_eq!(record.text.exclusion_criteria, None);
        assert_eq!(record.unknown_fields().len(), Field::COUNT - 1);
    }

    #[test]
    fn test_ingestion_rejects_unknown_field() {
        let raw = raw_from(json!({ "values": { "Dosage": "10mg" } }));
        assert!(matches!(raw.into_record(None), Err(Error::UnknownField(_))));
    }

    #[test]
    fn test_ingestion_checks_dimensions() {
        let raw = raw_from(json!({
            "embeddings": { "Drug_embeddings": [1.0, 0.0, 0.0], "IAge": [1.0, 0.0] }
        }));
        // Fields are checked in declaration order, so Drug sets the dimension
        assert!(matches!(
            raw.into_record(None),
            Err(Error::DimensionMismatch { expected: 3, actual: 2, .. })
        ));

        let raw = raw_from(json!({ "embeddings": { "Drug": [1.0, 0.0, 0.0] } }));
        assert!(matches!(
            raw.into_record(Some(4)),
            Err(Error::DimensionMismatch { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_ingestion_rejects_field_under_two_keys() {
        for _ in 0..16 {
            let raw = raw_from(json!({
                "embeddings": { "Drug": [1.0, 0.0], "Drug_embeddings": [0.0, 1.0] }
            }));
            assert!(matches!(raw.into_record(None), Err(Error::InvalidRecord(_))));
        }

        let raw = raw_from(json!({
            "values": { "IAge": "18-65", "IAge_embeddings": "unknown" }
        }));
        assert!(matches!(raw.into_record(None), Err(Error::InvalidRecord(_))));
    }

    #[test]
    fn test_empty_embedding_is_missing() {
        let raw = raw_from(json!({ "values": { "Drug": "x" }, "embeddings": { "Drug": [] } }));
        let record = raw.into_record(Some(8)).unwrap();
        assert!(record.embedding(Field::Drug).is_none());
    }

    #[test]
    fn test_key_matches() {
        let record = TrialRecord::new(Some("NCT01234567"));
        assert!(record.key_matches(" nct01234567"));
        assert!(!record.key_matches("NCT07654321"));
        assert!(!TrialRecord::new(Some("Not Available")).key_matches("Not Available"));
    }

    #[test]
    fn test_validate_query_requires_input() {
        assert!(TrialRecord::new(None).validate_query().is_err());
        let record = TrialRecord::new(None).with_value(Field::Drug, "Aspirin");
        assert!(record.validate_query().is_ok());
    }
}
