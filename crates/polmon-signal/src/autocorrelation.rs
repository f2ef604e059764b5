//! Temporal autocorrelation of polarization state.
//!
//! Every Stokes vector is normalized to unit length (zero vectors pass
//! through unchanged), then for each lag `L` in `1..=floor(0.2·n)` the mean
//! inner product of all `n − L` pairs `(v[i], v[i+L])` is reported. A value
//! of 1 means the SOP has not moved over that lag; it decays as the state
//! wanders over the sphere.
//!
//! Operates on a complete in-memory sequence; intended for post-hoc analysis
//! of coarse or transient logs.

use polmon_hardware::StokesSample;
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// One point of an autocorrelation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagPoint {
    /// Index offset, starting at 1.
    pub lag: usize,
    /// Mean inner product of normalized vectors `lag` apart.
    pub mean_inner_product: f64,
}

/// Lag-indexed mean-inner-product curve, lags in ascending order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutocorrelationCurve {
    pub points: Vec<LagPoint>,
}

impl AutocorrelationCurve {
    /// Number of lags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Lag values.
    pub fn lags(&self) -> impl Iterator<Item = usize> + '_ {
        self.points.iter().map(|p| p.lag)
    }

    /// Mean inner products, in lag order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.mean_inner_product)
    }
}

/// Largest lag evaluated for `n` vectors: `floor(0.2·n)`.
#[must_use]
pub fn max_lag(n: usize) -> usize {
    n / 5
}

/// Smallest input length that yields at least one lag.
pub const MIN_VECTORS: usize = 5;

/// Compute the autocorrelation curve of `vectors`.
///
/// # Errors
///
/// [`AnalysisError::InsufficientData`] when fewer than [`MIN_VECTORS`]
/// vectors are given.
pub fn autocorrelate(vectors: &[StokesSample]) -> Result<AutocorrelationCurve, AnalysisError> {
    let n = vectors.len();
    let max_lag = max_lag(n);
    if max_lag < 1 {
        return Err(AnalysisError::InsufficientData {
            n,
            min: MIN_VECTORS,
        });
    }

    let unit: Vec<StokesSample> = vectors.iter().map(StokesSample::normalized).collect();

    let points = (1..=max_lag)
        .map(|lag| {
            let pairs = n - lag;
            let sum: f64 = unit[..pairs]
                .iter()
                .zip(&unit[lag..])
                .map(|(a, b)| a.dot(b))
                .sum();
            LagPoint {
                lag,
                mean_inner_product: sum / pairs as f64,
            }
        })
        .collect();

    Ok(AutocorrelationCurve { points })
}
