//! Angular deviation on the Poincaré sphere.
//!
//! For a reference `a` and sample `b` the deviation is
//!
//! ```text
//! angle = (180/π) · acos( (a·b) / (|a|·|b|) )
//! ```
//!
//! Both vectors are reduced to unit directions before the dot product. Each
//! is first divided by its largest absolute component, so the squares in the
//! magnitude neither overflow near `f64::MAX` nor underflow to zero for
//! subnormal inputs. The cosine ratio is clamped into `[-1, 1]` before
//! `acos`, since rounding can overshoot the domain by an ulp. When either
//! vector has zero magnitude or a non-finite component the ratio is
//! undefined and [`degenerate_angle_policy`] supplies the angle.
//!
//! Identical vectors short-circuit to exactly `0.0`: `a·a / (|a|·|a|)` lands
//! one ulp below 1 for roughly a quarter of all inputs, which would give the
//! reference sample a spurious deviation of ~1e-6 degrees.

use polmon_hardware::StokesSample;

/// Angle (degrees) assigned when the cosine ratio is undefined.
pub const DEGENERATE_ANGLE_DEG: f64 = 0.0;

/// Resolve the angle for a geometrically undefined comparison.
///
/// Undefined angles are non-events: they resolve to
/// [`DEGENERATE_ANGLE_DEG`] so a zero-magnitude sample never triggers a
/// capture on its own.
#[must_use]
pub fn degenerate_angle_policy() -> f64 {
    DEGENERATE_ANGLE_DEG
}

/// Unit vector along `v`, or `None` for a zero or non-finite vector.
fn direction(v: &StokesSample) -> Option<StokesSample> {
    let components = [v.s1, v.s2, v.s3];
    if !components.iter().all(|c| c.is_finite()) {
        return None;
    }
    let scale = components.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    if scale == 0.0 {
        return None;
    }
    let scaled = StokesSample::new(v.s1 / scale, v.s2 / scale, v.s3 / scale);
    let magnitude = scaled.magnitude();
    Some(StokesSample::new(
        scaled.s1 / magnitude,
        scaled.s2 / magnitude,
        scaled.s3 / magnitude,
    ))
}

/// Cosine of the angle between `a` and `b`, clamped into `[-1, 1]`.
///
/// Returns `None` when either vector is zero or has a non-finite component.
#[must_use]
pub fn cosine_ratio(a: &StokesSample, b: &StokesSample) -> Option<f64> {
    let ratio = direction(a)?.dot(&direction(b)?);
    if !ratio.is_finite() {
        return None;
    }
    Some(ratio.clamp(-1.0, 1.0))
}

/// Angle in degrees between two Stokes vectors.
#[must_use]
pub fn angle_between(a: &StokesSample, b: &StokesSample) -> f64 {
    if a == b {
        return 0.0;
    }
    match cosine_ratio(a, b) {
        Some(ratio) => ratio.acos().to_degrees(),
        None => degenerate_angle_policy(),
    }
}

/// Per-sample deviation (degrees) of `samples` from `reference`.
#[must_use]
pub fn deviation(reference: &StokesSample, samples: &[StokesSample]) -> Vec<f64> {
    samples.iter().map(|s| angle_between(reference, s)).collect()
}

/// Largest angle in `angles`, or `0.0` for an empty slice.
///
/// NaN entries are ignored.
#[must_use]
pub fn max_angle(angles: &[f64]) -> f64 {
    angles.iter().copied().fold(0.0, f64::max)
}

/// Deviation of a sweep from its own first sample.
///
/// Returns an empty vector for an empty sweep.
#[must_use]
pub fn sweep_deviation(samples: &[StokesSample]) -> Vec<f64> {
    match samples.first() {
        Some(reference) => deviation(reference, samples),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identical_vectors_have_zero_angle() {
        for k in 1..500 {
            let x = f64::from(k);
            let a = StokesSample::new(0.013 * x, -0.2 + 0.001 * x, 0.9 / x);
            assert_eq!(angle_between(&a, &a), 0.0);
        }
    }

    #[test]
    fn test_orthogonal_vectors_are_ninety_degrees() {
        let a = StokesSample::new(1.0, 0.0, 0.0);
        let b = StokesSample::new(0.0, 0.0, 1.0);
        assert_abs_diff_eq!(angle_between(&a, &b), 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_extreme_magnitudes_keep_their_angle() {
        for m in [1e300, 1e-300, f64::MAX, 5e-324] {
            let a = StokesSample::new(m, m, 0.0);
            let b = StokesSample::new(m, -m, 0.0);
            assert_abs_diff_eq!(angle_between(&a, &b), 90.0, epsilon = 1e-9);

            let c = StokesSample::new(m, 0.0, 0.0);
            assert_abs_diff_eq!(angle_between(&a, &c), 45.0, epsilon = 1e-9);
        }
        let huge = StokesSample::new(1e300, 0.0, 0.0);
        let tiny = StokesSample::new(0.0, 1e-300, 0.0);
        assert_abs_diff_eq!(angle_between(&huge, &tiny), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_infinite_component_is_degenerate() {
        let a = StokesSample::new(1.0, 0.0, 0.0);
        let b = StokesSample::new(f64::INFINITY, 1.0, 0.0);
        assert!(cosine_ratio(&a, &b).is_none());
        assert_eq!(angle_between(&a, &b), DEGENERATE_ANGLE_DEG);
    }

    #[test]
    fn test_antiparallel_vectors_are_one_eighty() {
        let a = StokesSample::new(0.1, 0.2, 0.3);
        let b = StokesSample::new(-0.1, -0.2, -0.3);
        let angle = angle_between(&a, &b);
        assert!(angle.is_finite());
        assert_abs_diff_eq!(angle, 180.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_vector_resolves_to_policy_angle() {
        let a = StokesSample::new(1.0, 0.0, 0.0);
        let zero = StokesSample::default();
        assert_eq!(angle_between(&a, &zero), DEGENERATE_ANGLE_DEG);
        assert_eq!(angle_between(&zero, &a), DEGENERATE_ANGLE_DEG);
        assert_eq!(angle_between(&zero, &zero), DEGENERATE_ANGLE_DEG);
        assert!(cosine_ratio(&a, &zero).is_none());
    }

    #[test]
    fn test_nan_component_is_degenerate() {
        let a = StokesSample::new(1.0, 0.0, 0.0);
        let b = StokesSample::new(f64::NAN, 0.0, 0.0);
        assert_eq!(angle_between(&a, &b), DEGENERATE_ANGLE_DEG);
    }

    #[test]
    fn test_ratio_is_clamped_for_near_parallel_vectors() {
        // Rounding pushes the raw ratio past ±1 for some of these.
        for k in 1..200 {
            let x = f64::from(k);
            let v = StokesSample::new(0.1 * x, 0.7, 0.3 / x);
            let scaled = StokesSample::new(3.0 * v.s1, 3.0 * v.s2, 3.0 * v.s3);
            let flipped = StokesSample::new(-v.s1, -v.s2, -v.s3);

            let ratio = cosine_ratio(&v, &scaled).unwrap();
            assert!((-1.0..=1.0).contains(&ratio));
            assert_abs_diff_eq!(angle_between(&v, &scaled), 0.0, epsilon = 1e-5);
            assert_abs_diff_eq!(angle_between(&v, &flipped), 180.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_sweep_reference_is_first_sample() {
        let samples = [
            StokesSample::new(1.0, 0.0, 0.0),
            StokesSample::new(0.0, 1.0, 0.0),
            StokesSample::new(0.9, 0.1, 0.0),
        ];
        let angles = sweep_deviation(&samples);
        assert_eq!(angles.len(), 3);
        assert_eq!(angles[0], 0.0);
        assert_abs_diff_eq!(angles[1], 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angles[2], 6.340_191_745_909_85, epsilon = 1e-9);
        assert_abs_diff_eq!(max_angle(&angles), 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_max_of_empty_is_zero() {
        assert_eq!(max_angle(&[]), 0.0);
        assert!(sweep_deviation(&[]).is_empty());
    }
}
