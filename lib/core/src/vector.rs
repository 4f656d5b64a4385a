use serde::{Deserialize, Serialize};

/// A field embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// True if every component is a finite number
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Euclidean norm in f64; large or tiny components neither overflow
    /// nor vanish
    #[inline]
    pub fn norm(&self) -> f64 {
        crate::simd::norm_f64(&self.data)
    }

    #[inline]
    pub fn dot(&self, other: &Vector) -> f32 {
        crate::simd::dot_product_simd(&self.data, &other.data)
    }

    /// Unit-length copy, or `None` for a zero (or empty) vector.
    ///
    /// Non-finite components give a non-finite result.
    #[must_use]
    pub fn unit(&self) -> Option<Vector> {
        let norm = self.norm();
        if norm == 0.0 {
            return None;
        }
        Some(Vector::new(
            self.data
                .iter()
                .map(|&x| (f64::from(x) / norm) as f32)
                .collect(),
        ))
    }

    /// Cosine similarity in [-1, 1]. `None` when the dimensions differ or
    /// either vector has zero norm.
    pub fn cosine_similarity(&self, other: &Vector) -> Option<f32> {
        if self.dim() != other.dim() {
            return None;
        }

        let unit_a = self.unit()?;
        let norm_b = other.norm();
        if norm_b == 0.0 {
            return None;
        }

        let cosine = (f64::from(unit_a.dot(other)) / norm_b) as f32;
        Some(if cosine.is_finite() {
            cosine.clamp(-1.0, 1.0)
        } else {
            cosine
        })
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}
