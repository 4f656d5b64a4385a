//! Per-row similarity cells and composite blends.

use crate::column::{Column, Composite};
use crate::weights::EffectiveWeights;
use serde::{Serialize, Serializer};
use trialmatch_core::{Field, FieldMap};

/// One similarity score, or an explicit marker that the pair could not be
/// compared and must stay out of the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SimilarityCell {
    Score(f32),
    #[default]
    NotApplicable,
}

impl SimilarityCell {
    #[inline]
    pub fn score(self) -> Option<f32> {
        match self {
            SimilarityCell::Score(score) => Some(score),
            SimilarityCell::NotApplicable => None,
        }
    }

    #[inline]
    pub fn is_applicable(self) -> bool {
        matches!(self, SimilarityCell::Score(_))
    }
}

impl Serialize for SimilarityCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.score().serialize(serializer)
    }
}

/// Similarities of one corpus row against the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityRow {
    primitives: FieldMap<SimilarityCell>,
    composites: [SimilarityCell; Composite::COUNT],
    /// Weighted overall score, set during aggregation
    pub overall: f32,
}

impl SimilarityRow {
    pub fn new(primitives: FieldMap<SimilarityCell>) -> Self {
        let mut row = Self {
            primitives,
            composites: [SimilarityCell::NotApplicable; Composite::COUNT],
            overall: 0.0,
        };
        for composite in Composite::ALL {
            row.composites[composite.index()] = blend(composite, &row.primitives);
        }
        row
    }

    #[inline]
    pub fn primitive(&self, field: Field) -> SimilarityCell {
        self.primitives[field]
    }

    #[inline]
    pub fn composite(&self, composite: Composite) -> SimilarityCell {
        self.composites[composite.index()]
    }

    pub fn cell(&self, column: Column) -> SimilarityCell {
        match column {
            Column::Primitive(field) => self.primitive(field),
            Column::Composite(composite) => self.composite(composite),
        }
    }

    /// Mark a primitive cell not-applicable and re-blend the composites
    /// that depend on it
    pub fn mark_not_applicable(&mut self, field: Field) {
        self.primitives[field] = SimilarityCell::NotApplicable;
        for composite in Composite::ALL {
            if composite.components().iter().any(|(f, _)| *f == field) {
                self.composites[composite.index()] = blend(composite, &self.primitives);
            }
        }
    }

    /// Weighted sum over the weighted columns. Not-applicable cells add
    /// nothing.
    pub fn weighted_score(&self, weights: &EffectiveWeights) -> f32 {
        self.contributions(weights).map(|(_, value)| value).sum()
    }

    /// `weight * score` per weighted column with an applicable cell
    pub fn contributions<'a>(
        &'a self,
        weights: &'a EffectiveWeights,
    ) -> impl Iterator<Item = (Column, f32)> + 'a {
        weights.iter().filter_map(move |(column, weight)| {
            self.cell(column).score().map(|score| (column, weight * score))
        })
    }
}

/// Blend a composite from primitive cells using its fixed coefficients.
///
/// Not-applicable components contribute nothing; the composite itself is
/// not applicable only when all of its components are.
pub fn blend(composite: Composite, primitives: &FieldMap<SimilarityCell>) -> SimilarityCell {
    let mut applicable = false;
    let mut total = 0.0f32;
    for (field, coefficient) in composite.components() {
        if let Some(score) = primitives[*field].score() {
            applicable = true;
            total += coefficient * score;
        }
    }
    if applicable {
        SimilarityCell::Score(total)
    } else {
        SimilarityCell::NotApplicable
    }
}
