//! JSON corpus import.
//!
//! A corpus file is a JSON array of trial rows. Embeddings may be given as
//! float arrays under `embeddings` or as base64-encoded little-endian
//! float32 blobs under `embedding_blobs`, the way they are stored.

use crate::blob::decode_embedding;
use crate::snapshot::CorpusSnapshot;
use crate::store::MemoryCorpusStore;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use trialmatch_core::{Error, Field, RawTrialRecord, Result, TrialRecord};

/// One trial row of an import file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusRow {
    #[serde(flatten)]
    pub raw: RawTrialRecord,
    /// Base64 float32 blobs keyed by field or `<Field>_embeddings` column
    #[serde(default)]
    pub embedding_blobs: HashMap<String, String>,
}

impl CorpusRow {
    /// Validate and normalize into a typed record
    pub fn into_record(mut self, expected_dim: Option<usize>) -> Result<TrialRecord> {
        for (name, encoded) in std::mem::take(&mut self.embedding_blobs) {
            let field: Field = name.parse()?;
            let blob = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| {
                    Error::InvalidRecord(format!("{} embedding blob is not base64: {}", field, e))
                })?;
            let embedding = decode_embedding(&blob, expected_dim)?;

            let duplicate = self
                .raw
                .embeddings
                .keys()
                .any(|key| key.parse::<Field>().ok() == Some(field));
            if duplicate {
                return Err(Error::InvalidRecord(format!(
                    "{} embedding given both as floats and as a blob",
                    field
                )));
            }
            self.raw
                .embeddings
                .insert(field.name().to_string(), embedding.into_inner());
        }
        self.raw.into_record(expected_dim)
    }
}

pub fn parse_rows(json: &str) -> Result<Vec<CorpusRow>> {
    Ok(serde_json::from_str(json)?)
}

pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<CorpusRow>> {
    let json = std::fs::read_to_string(path.as_ref())?;
    parse_rows(&json)
}

/// Read and validate a JSON corpus file into records
pub fn read_records<P: AsRef<Path>>(
    path: P,
    expected_dim: Option<usize>,
) -> Result<Vec<TrialRecord>> {
    let path = path.as_ref();
    let records = read_rows(path)?
        .into_iter()
        .map(|row| row.into_record(expected_dim))
        .collect::<Result<Vec<_>>>()?;
    tracing::info!(path = %path.display(), trials = records.len(), "read corpus rows");
    Ok(records)
}

/// Build an in-memory store from a JSON corpus file
pub fn import_corpus<P: AsRef<Path>>(
    path: P,
    expected_dim: Option<usize>,
) -> Result<MemoryCorpusStore> {
    MemoryCorpusStore::from_records(read_records(path, expected_dim)?)
}

/// Open a corpus file: `.json` files are imported, anything else is read
/// as a binary snapshot
pub fn open_corpus<P: AsRef<Path>>(
    path: P,
    expected_dim: Option<usize>,
) -> Result<MemoryCorpusStore> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        return import_corpus(path, expected_dim);
    }

    let snapshot = CorpusSnapshot::load(path)?;
    if let (Some(expected), Some(actual)) = (expected_dim, snapshot.dimension) {
        if expected != actual {
            return Err(Error::DimensionMismatch {
                context: format!("snapshot {}", path.display()),
                expected,
                actual,
            });
        }
    }
    snapshot.into_store()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::encode_embedding;
    use crate::store::CorpusStore;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use trialmatch_core::Vector;

    fn blob(values: &[f32]) -> String {
        let bytes = encode_embedding(&Vector::from_slice(values));
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_row_with_blobs() {
        let row: CorpusRow = serde_json::from_value(json!({
            "NCT_Number": "NCT0001",
            "Disease": "Asthma",
            "values": { "Drug": "Albuterol", "EAge": "NA" },
            "embeddings": { "IAge": [0.0, 1.0] },
            "embedding_blobs": { "Drug_embeddings": blob(&[1.0, 0.0]) }
        }))
        .unwrap();

        let record = row.into_record(Some(2)).unwrap();
        assert_eq!(record.nct_number.as_deref(), Some("NCT0001"));
        assert_eq!(record.embedding(Field::Drug).unwrap().as_slice(), &[1.0, 0.0]);
        assert_eq!(record.embedding(Field::IAge).unwrap().as_slice(), &[0.0, 1.0]);
        assert!(record.is_unknown(Field::EAge));
    }

    #[test]
    fn test_blob_dimension_checked() {
        let row: CorpusRow = serde_json::from_value(json!({
            "NCT_Number": "NCT0001",
            "embedding_blobs": { "Drug": blob(&[1.0, 0.0, 0.0]) }
        }))
        .unwrap();
        assert!(matches!(
            row.into_record(Some(2)),
            Err(Error::DimensionMismatch { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let row: CorpusRow = serde_json::from_value(json!({
            "values": { "Dosage": "10mg" }
        }))
        .unwrap();
        assert!(matches!(row.into_record(None), Err(Error::UnknownField(_))));
    }

    #[test]
    fn test_import_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        let rows = json!([
            { "NCT_Number": "A", "Disease": "Asthma", "values": { "Drug": "x" } },
            { "NCT_Number": "B", "Disease": "asthma", "values": { "Drug": "y" } },
            { "NCT_Number": "C", "Disease": "Malaria", "values": { "Drug": "z" } }
        ]);
        file.write_all(rows.to_string().as_bytes()).unwrap();

        let store = open_corpus(file.path(), None).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.load_by_disease("ASTHMA").unwrap().len(), 2);
    }
}
