//! The fixed set of trial fields that are embedded and scored independently.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// A scored trial attribute.
///
/// Each field carries a raw text value, an embedding of that value and a
/// primitive similarity column named `<Field>_similarity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Drug,
    #[serde(rename = "Trial_Phase")]
    TrialPhase,
    #[serde(rename = "Population_Segment")]
    PopulationSegment,
    #[serde(rename = "Disease_Category")]
    DiseaseCategory,
    #[serde(rename = "Primary_Phrases")]
    PrimaryPhrases,
    #[serde(rename = "Secondary_Phrases")]
    SecondaryPhrases,
    #[serde(rename = "Inclusion_Phrases")]
    InclusionPhrases,
    #[serde(rename = "Exclusion_Phrases")]
    ExclusionPhrases,
    IAge,
    IGender,
    EAge,
    EGender,
}

/// A set of fields, iterated in declaration order.
pub type FieldSet = BTreeSet<Field>;

impl Field {
    pub const COUNT: usize = 12;

    pub const ALL: [Field; Field::COUNT] = [
        Field::Drug,
        Field::TrialPhase,
        Field::PopulationSegment,
        Field::DiseaseCategory,
        Field::PrimaryPhrases,
        Field::SecondaryPhrases,
        Field::InclusionPhrases,
        Field::ExclusionPhrases,
        Field::IAge,
        Field::IGender,
        Field::EAge,
        Field::EGender,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Field::Drug => "Drug",
            Field::TrialPhase => "Trial_Phase",
            Field::PopulationSegment => "Population_Segment",
            Field::DiseaseCategory => "Disease_Category",
            Field::PrimaryPhrases => "Primary_Phrases",
            Field::SecondaryPhrases => "Secondary_Phrases",
            Field::InclusionPhrases => "Inclusion_Phrases",
            Field::ExclusionPhrases => "Exclusion_Phrases",
            Field::IAge => "IAge",
            Field::IGender => "IGender",
            Field::EAge => "EAge",
            Field::EGender => "EGender",
        }
    }

    /// Name of the primitive similarity column for this field
    pub const fn similarity_column(self) -> &'static str {
        match self {
            Field::Drug => "Drug_similarity",
            Field::TrialPhase => "Trial_Phase_similarity",
            Field::PopulationSegment => "Population_Segment_similarity",
            Field::DiseaseCategory => "Disease_Category_similarity",
            Field::PrimaryPhrases => "Primary_Phrases_similarity",
            Field::SecondaryPhrases => "Secondary_Phrases_similarity",
            Field::InclusionPhrases => "Inclusion_Phrases_similarity",
            Field::ExclusionPhrases => "Exclusion_Phrases_similarity",
            Field::IAge => "IAge_similarity",
            Field::IGender => "IGender_similarity",
            Field::EAge => "EAge_similarity",
            Field::EGender => "EGender_similarity",
        }
    }

    /// Parse a `<Field>_similarity` column name
    pub fn from_similarity_column(column: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| field.similarity_column() == column)
    }

    /// Parse a field name, also accepting the `<Field>_embeddings` column form
    /// used by stored corpus rows.
    pub fn from_column_name(name: &str) -> Option<Field> {
        let base = name.strip_suffix("_embeddings").unwrap_or(name);
        Field::ALL.into_iter().find(|field| field.name() == base)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::from_column_name(s.trim()).ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// Dense per-field storage indexed by [`Field`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMap<T> {
    slots: [T; Field::COUNT],
}

impl<T> FieldMap<T> {
    pub fn from_fn(f: impl FnMut(Field) -> T) -> Self {
        Self {
            slots: Field::ALL.map(f),
        }
    }

    #[inline]
    pub fn get(&self, field: Field) -> &T {
        &self.slots[field.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, field: Field) -> &mut T {
        &mut self.slots[field.index()]
    }

    #[inline]
    pub fn set(&mut self, field: Field, value: T) {
        self.slots[field.index()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &T)> {
        Field::ALL.into_iter().zip(self.slots.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Field, &T) -> U) -> FieldMap<U> {
        FieldMap::from_fn(|field| f(field, self.get(field)))
    }
}

impl<T: Default> Default for FieldMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Field> for FieldMap<T> {
    type Output = T;

    fn index(&self, field: Field) -> &T {
        self.get(field)
    }
}

impl<T> IndexMut<Field> for FieldMap<T> {
    fn index_mut(&mut self, field: Field) -> &mut T {
        self.get_mut(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_matches_index() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
        }
    }

    #[test]
    fn test_similarity_column_roundtrip() {
        for field in Field::ALL {
            assert_eq!(Field::from_similarity_column(field.similarity_column()), Some(field));
            assert!(field.similarity_column().starts_with(field.name()));
        }
        assert_eq!(Field::from_similarity_column("Study_Title_similarity"), None);
    }

    #[test]
    fn test_parse_field_names() {
        assert_eq!("Drug".parse::<Field>().unwrap(), Field::Drug);
        assert_eq!("Trial_Phase_embeddings".parse::<Field>().unwrap(), Field::TrialPhase);
        assert!(matches!("Dosage".parse::<Field>(), Err(Error::UnknownField(_))));
    }

    #[test]
    fn test_serde_uses_column_names() {
        let json = serde_json::to_string(&Field::PopulationSegment).unwrap();
        assert_eq!(json, "\"Population_Segment\"");
    }

    #[test]
    fn test_field_map_indexing() {
        let mut map: FieldMap<u32> = FieldMap::default();
        map[Field::EGender] = 7;
        assert_eq!(*map.get(Field::EGender), 7);
        assert_eq!(map.iter().filter(|(_, v)| **v == 0).count(), Field::COUNT - 1);

        let doubled = map.map(|_, v| v * 2);
        assert_eq!(doubled[Field::EGender], 14);
    }
}
