//! Similarity column names.
//!
//! Weight tables and result rows address scores by column: one primitive
//! `<Field>_similarity` column per field, plus five composite columns that
//! blend primitives into higher-level trial sections.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use trialmatch_core::Field;

/// A composite similarity: a fixed linear blend of primitive field scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Composite {
    InclusionCriteria,
    ExclusionCriteria,
    StudyTitle,
    PrimaryOutcomeMeasures,
    SecondaryOutcomeMeasures,
}

const INCLUSION_CRITERIA_BLEND: [(Field, f32); 3] = [
    (Field::IAge, 0.4),
    (Field::IGender, 0.4),
    (Field::InclusionPhrases, 0.2),
];
const EXCLUSION_CRITERIA_BLEND: [(Field, f32); 3] = [
    (Field::EAge, 0.4),
    (Field::EGender, 0.4),
    (Field::ExclusionPhrases, 0.2),
];
const STUDY_TITLE_BLEND: [(Field, f32); 3] = [
    (Field::Drug, 0.4),
    (Field::DiseaseCategory, 0.4),
    (Field::PopulationSegment, 0.2),
];
const PRIMARY_OUTCOME_BLEND: [(Field, f32); 1] = [(Field::PrimaryPhrases, 1.0)];
const SECONDARY_OUTCOME_BLEND: [(Field, f32); 1] = [(Field::SecondaryPhrases, 1.0)];

impl Composite {
    pub const COUNT: usize = 5;

    pub const ALL: [Composite; Composite::COUNT] = [
        Composite::InclusionCriteria,
        Composite::ExclusionCriteria,
        Composite::StudyTitle,
        Composite::PrimaryOutcomeMeasures,
        Composite::SecondaryOutcomeMeasures,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn column_name(self) -> &'static str {
        match self {
            Composite::InclusionCriteria => "Inclusion_Criteria_similarity",
            Composite::ExclusionCriteria => "Exclusion_Criteria_similarity",
            Composite::StudyTitle => "Study_Title_similarity",
            Composite::PrimaryOutcomeMeasures => "Primary_Outcome_Measures_similarity",
            Composite::SecondaryOutcomeMeasures => "Secondary_Outcome_Measures_similarity",
        }
    }

    /// Blend coefficients over primitive fields. Each blend sums to 1.0.
    pub fn components(self) -> &'static [(Field, f32)] {
        match self {
            Composite::InclusionCriteria => &INCLUSION_CRITERIA_BLEND,
            Composite::ExclusionCriteria => &EXCLUSION_CRITERIA_BLEND,
            Composite::StudyTitle => &STUDY_TITLE_BLEND,
            Composite::PrimaryOutcomeMeasures => &PRIMARY_OUTCOME_BLEND,
            Composite::SecondaryOutcomeMeasures => &SECONDARY_OUTCOME_BLEND,
        }
    }
}

/// Any similarity column that can carry a weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Primitive(Field),
    Composite(Composite),
}

impl Column {
    pub const fn name(self) -> &'static str {
        match self {
            Column::Primitive(field) => field.similarity_column(),
            Column::Composite(composite) => composite.column_name(),
        }
    }

    /// Every column, primitives first
    pub fn all() -> impl Iterator<Item = Column> {
        Field::ALL
            .into_iter()
            .map(Column::Primitive)
            .chain(Composite::ALL.into_iter().map(Column::Composite))
    }

    /// Fields this column is derived from
    pub fn fields(self) -> Vec<Field> {
        match self {
            Column::Primitive(field) => vec![field],
            Column::Composite(composite) => {
                composite.components().iter().map(|(field, _)| *field).collect()
            }
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Column::all()
            .find(|column| column.name() == name)
            .ok_or_else(|| name.to_string())
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse()
            .map_err(|name| serde::de::Error::custom(format!("unknown similarity column '{name}'")))
    }
}
