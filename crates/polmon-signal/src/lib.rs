//! Polarization signal analysis.
//!
//! Pure, stateless computations over Stokes vectors:
//!
//! - **Deviation**: per-sample angle on the Poincaré sphere relative to a
//!   reference, with an explicit policy for undefined angles
//! - **Capture policy**: whether a sweep's maximum deviation makes it a
//!   transient
//! - **Autocorrelation**: lag-indexed mean inner product of normalized SOPs
//!
//! # Example
//!
//! ```rust
//! use polmon_hardware::StokesSample;
//! use polmon_signal::{max_angle, should_capture, sweep_deviation};
//!
//! let samples = [
//!     StokesSample::new(1.0, 0.0, 0.0),
//!     StokesSample::new(0.0, 1.0, 0.0),
//! ];
//! let angles = sweep_deviation(&samples);
//! assert!((max_angle(&angles) - 90.0).abs() < 1e-9);
//! assert!(should_capture(&angles, 10.0));
//! ```

pub mod autocorrelation;
pub mod capture;
pub mod deviation;

pub use autocorrelation::{autocorrelate, max_lag, AutocorrelationCurve, LagPoint, MIN_VECTORS};
pub use capture::{exceeds_threshold, should_capture};
pub use deviation::{
    angle_between, cosine_ratio, degenerate_angle_policy, deviation, max_angle, sweep_deviation,
    DEGENERATE_ANGLE_DEG,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors from signal analysis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// Too few vectors to evaluate a single lag.
    #[error("insufficient data: {n} vectors, need at least {min}")]
    InsufficientData {
        /// Vectors provided.
        n: usize,
        /// Minimum required.
        min: usize,
    },
}
