//! Weight tables.
//!
//! A [`WeightTable`] holds the base weight of each similarity column as
//! configured. [`EffectiveWeights`] are derived per query: columns the query
//! cannot supply are removed and the rest rescaled to sum to 1.0.

use crate::column::{Column, Composite};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use trialmatch_core::{Error, FieldSet};

/// Base weights keyed by similarity column.
///
/// Invariants after construction: at least one entry, every weight finite and
/// non-negative, positive total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightTable {
    weights: BTreeMap<Column, f32>,
}

/// One row of the two-column name/weight table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRow {
    #[serde(alias = "Column_Name")]
    pub column_name: String,
    #[serde(alias = "Weight")]
    pub weight: f32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WeightTableFile {
    Rows(Vec<WeightRow>),
    Map(BTreeMap<String, f32>),
}

impl WeightTable {
    /// Build a table from `(column name, weight)` entries
    pub fn from_entries<I, S>(entries: I) -> Result<Self, WeightError>
    where
        I: IntoIterator<Item = (S, f32)>,
        S: AsRef<str>,
    {
        let mut weights = BTreeMap::new();
        for (name, weight) in entries {
            let name = name.as_ref();
            let column: Column = name
                .parse()
                .map_err(WeightError::UnknownColumn)?;
            if !weight.is_finite() {
                return Err(WeightError::NonFiniteWeight(name.to_string()));
            }
            if weight < 0.0 {
                return Err(WeightError::NegativeWeight(name.to_string()));
            }
            if weights.insert(column, weight).is_some() {
                return Err(WeightError::DuplicateColumn(name.to_string()));
            }
        }

        let table = Self { weights };
        table.validate()?;
        Ok(table)
    }

    /// Parse a JSON weight table: either `{"<column>": weight}` or
    /// `[{"column_name": ..., "weight": ...}]`
    pub fn from_json_str(json: &str) -> Result<Self, WeightError> {
        let file: WeightTableFile =
            serde_json::from_str(json).map_err(|e| WeightError::Malformed(e.to_string()))?;
        match file {
            WeightTableFile::Rows(rows) => {
                Self::from_entries(rows.into_iter().map(|row| (row.column_name, row.weight)))
            }
            WeightTableFile::Map(map) => Self::from_entries(map),
        }
    }

    /// Load a JSON weight table from disk. Any failure is a configuration error.
    pub fn load<P: AsRef<Path>>(path: P) -> trialmatch_core::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("cannot read weight table {}: {}", path.display(), e))
        })?;
        let table = Self::from_json_str(&json)?;
        tracing::info!(path = %path.display(), columns = table.len(), "loaded weight table");
        Ok(table)
    }

    fn validate(&self) -> Result<(), WeightError> {
        if self.weights.is_empty() {
            return Err(WeightError::EmptyTable);
        }
        if self.total() <= 0.0 {
            return Err(WeightError::ZeroTotalWeight);
        }
        Ok(())
    }

    pub fn get(&self, column: Column) -> Option<f32> {
        self.weights.get(&column).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Column, f32)> + '_ {
        self.weights.iter().map(|(column, weight)| (*column, *weight))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f32 {
        self.weights.values().sum()
    }

    /// Rows in the two-column name/weight layout
    pub fn to_rows(&self) -> Vec<WeightRow> {
        self.iter()
            .map(|(column, weight)| WeightRow {
                column_name: column.name().to_string(),
                weight,
            })
            .collect()
    }

    /// The table rescaled to sum to 1.0, with nothing removed
    pub fn normalized(&self) -> EffectiveWeights {
        EffectiveWeights::for_query(self, &FieldSet::new())
    }
}

impl Default for WeightTable {
    /// Weights over the five composite columns
    fn default() -> Self {
        let weights = BTreeMap::from([
            (Column::Composite(Composite::StudyTitle), 0.30),
            (Column::Composite(Composite::PrimaryOutcomeMeasures), 0.20),
            (Column::Composite(Composite::SecondaryOutcomeMeasures), 0.10),
            (Column::Composite(Composite::InclusionCriteria), 0.20),
            (Column::Composite(Composite::ExclusionCriteria), 0.20),
        ]);
        Self { weights }
    }
}

impl<'de> Deserialize<'de> for WeightTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let file = WeightTableFile::deserialize(deserializer)?;
        let table = match file {
            WeightTableFile::Rows(rows) => {
                Self::from_entries(rows.into_iter().map(|row| (row.column_name, row.weight)))
            }
            WeightTableFile::Map(map) => Self::from_entries(map),
        };
        table.map_err(serde::de::Error::custom)
    }
}

/// Per-query weights summing to 1.0, or empty when nothing the query
/// supplied carries weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EffectiveWeights {
    weights: BTreeMap<Column, f32>,
}

impl EffectiveWeights {
    /// Remove the columns the query cannot supply and renormalize.
    ///
    /// A primitive column drops out when its field is unknown in the query;
    /// a composite column drops out when every field it blends is unknown.
    /// Depends only on the unknown set and the base table.
    pub fn for_query(table: &WeightTable, unknown: &FieldSet) -> Self {
        let retained: Vec<(Column, f32)> = table
            .iter()
            .filter(|(column, _)| !is_unsupplied(*column, unknown))
            .collect();

        let total: f32 = retained.iter().map(|(_, weight)| weight).sum();
        if total <= 0.0 {
            return Self::default();
        }

        Self {
            weights: retained
                .into_iter()
                .map(|(column, weight)| (column, weight / total))
                .collect(),
        }
    }

    pub fn get(&self, column: Column) -> Option<f32> {
        self.weights.get(&column).copied()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.weights.contains_key(&column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Column, f32)> + '_ {
        self.weights.iter().map(|(column, weight)| (*column, *weight))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True when ranking cannot proceed meaningfully
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f32 {
        self.weights.values().sum()
    }

    /// Columns present in the base table but removed for this query
    pub fn removed_from(&self, table: &WeightTable) -> Vec<Column> {
        let kept: HashSet<Column> = self.weights.keys().copied().collect();
        table
            .iter()
            .map(|(column, _)| column)
            .filter(|column| !kept.contains(column))
            .collect()
    }
}

fn is_unsupplied(column: Column, unknown: &FieldSet) -> bool {
    column.fields().iter().all(|field| unknown.contains(field))
}

/// Errors that can occur while building a weight table
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightError {
    #[error("Weight table cannot be empty")]
    EmptyTable,

    #[error("Unknown similarity column '{0}'")]
    UnknownColumn(String),

    #[error("Column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("Column '{0}' has negative weight")]
    NegativeWeight(String),

    #[error("Column '{0}' has a non-finite weight")]
    NonFiniteWeight(String),

    #[error("Total weight cannot be zero")]
    ZeroTotalWeight,

    #[error("Malformed weight table: {0}")]
    Malformed(String),
}

impl From<WeightError> for Error {
    fn from(err: WeightError) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
