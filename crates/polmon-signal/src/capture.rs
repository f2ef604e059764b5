//! Transient capture policy.
//!
//! A sweep is a transient when its maximum deviation strictly exceeds the
//! configured threshold. An angle equal to the threshold does not trigger.

use crate::deviation::max_angle;

/// Decide whether a sweep with these deviations must be stored in full.
#[must_use]
pub fn should_capture(angles: &[f64], threshold_deg: f64) -> bool {
    exceeds_threshold(max_angle(angles), threshold_deg)
}

/// Threshold test on a precomputed maximum.
#[must_use]
pub fn exceeds_threshold(max_angle_deg: f64, threshold_deg: f64) -> bool {
    max_angle_deg > threshold_deg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strictly_greater_triggers() {
        let angles = [0.0, 4.0, 10.0];
        assert!(should_capture(&angles, 9.999));
        assert!(!should_capture(&angles, 10.0));
        assert!(!should_capture(&angles, 95.0));
    }

    #[test]
    fn test_raising_threshold_never_adds_captures() {
        let angles = [0.0, 12.5, 3.0, 7.25];
        let thresholds: Vec<f64> = (0..400).map(|t| f64::from(t) * 0.05).collect();
        let mut previous = true;
        for t in thresholds {
            let fired = should_capture(&angles, t);
            assert!(previous || !fired, "capture re-enabled at threshold {t}");
            assert_eq!(fired, 12.5 > t);
            previous = fired;
        }
    }

    #[test]
    fn test_empty_sweep_never_triggers() {
        assert!(!should_capture(&[], 0.0));
    }
}
