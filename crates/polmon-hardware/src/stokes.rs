//! Stokes-vector and sweep types.
//!
//! These types are instrument-agnostic: the decoder produces them and the
//! analysis and logging layers consume them.

use serde::{Deserialize, Serialize};

use crate::error::{BufferKind, DecodeError};

/// A Stokes vector `(s1, s2, s3)`, i.e. a point on or inside the
/// Poincaré sphere.
///
/// No normalization is applied on construction. The magnitude is the degree
/// of polarization; angle computations only use the direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StokesSample {
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl StokesSample {
    /// Creates a sample from its three components.
    #[must_use]
    pub const fn new(s1: f64, s2: f64, s3: f64) -> Self {
        Self { s1, s2, s3 }
    }

    /// Inner product with another sample.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.s1 * other.s1 + self.s2 * other.s2 + self.s3 * other.s3
    }

    /// Euclidean magnitude (degree of polarization).
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        (self.s1 * self.s1 + self.s2 * self.s2 + self.s3 * self.s3).sqrt()
    }

    /// Returns the unit vector in the same direction.
    ///
    /// A zero-magnitude sample is returned unchanged.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return *self;
        }
        Self::new(self.s1 / magnitude, self.s2 / magnitude, self.s3 / magnitude)
    }
}

/// One decoded sweep: `n` Stokes samples and `n` power readings in
/// acquisition order.
///
/// The two sequences always have the same length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepResult {
    samples: Vec<StokesSample>,
    power: Vec<f64>,
}

impl SweepResult {
    /// Pairs samples with power readings.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::CountMismatch`] if the lengths differ.
    pub fn new(samples: Vec<StokesSample>, power: Vec<f64>) -> Result<Self, DecodeError> {
        if samples.len() != power.len() {
            return Err(DecodeError::CountMismatch {
                buffer: BufferKind::Power,
                expected: samples.len(),
                got: power.len(),
            });
        }
        Ok(Self { samples, power })
    }

    /// Stokes samples in acquisition order.
    #[must_use]
    pub fn samples(&self) -> &[StokesSample] {
        &self.samples
    }

    /// Power readings (W) in acquisition order.
    #[must_use]
    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Number of samples in the sweep.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the sweep holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The first sample and its power reading, if any.
    #[must_use]
    pub fn first(&self) -> Option<(f64, StokesSample)> {
        Some((*self.power.first()?, *self.samples.first()?))
    }

    /// Iterates over `(power, sample)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &StokesSample)> + '_ {
        self.power.iter().copied().zip(self.samples.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_magnitude_and_dot() {
        let a = StokesSample::new(3.0, 4.0, 0.0);
        let b = StokesSample::new(0.0, 1.0, 0.0);
        assert_relative_eq!(a.magnitude(), 5.0);
        assert_relative_eq!(a.dot(&b), 4.0);
    }

    #[test]
    fn test_normalized_has_unit_length() {
        let a = StokesSample::new(0.2, -0.4, 0.1).normalized();
        assert_relative_eq!(a.magnitude(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_vector_normalizes_to_itself() {
        let zero = StokesSample::default();
        assert_eq!(zero.normalized(), zero);
    }

    #[test]
    fn test_sweep_rejects_length_mismatch() {
        let result = SweepResult::new(vec![StokesSample::default(); 2], vec![1e-3]);
        assert!(matches!(result, Err(DecodeError::CountMismatch { expected: 2, got: 1, .. })));
    }

    #[test]
    fn test_first_returns_reference_pair() {
        let sweep = SweepResult::new(
            vec![StokesSample::new(1.0, 0.0, 0.0), StokesSample::new(0.0, 1.0, 0.0)],
            vec![2e-3, 3e-3],
        )
        .unwrap();
        let (power, sample) = sweep.first().unwrap();
        assert_relative_eq!(power, 2e-3);
        assert_eq!(sample, StokesSample::new(1.0, 0.0, 0.0));
        assert!(SweepResult::default().first().is_none());
    }
}
