//! Retention estimation from a power-law forgetting curve.
//!
//! ```text
//! R(t) = (1 + t / (9 * I))^-1
//! ```
//!
//! where `t` is days since the last review and `I` the card's interval. At
//! `t = I` (reviewed exactly on schedule) this gives 0.9, the target recall
//! probability the intervals are built around.

use chrono::{DateTime, Utc};

use crate::types::time::days_between;
use crate::types::Card;

/// Curve constant: solves `R(I) = 0.9` for the power-law curve.
pub const CURVE_FACTOR: f64 = 9.0;

/// Intervals below this many days are treated as having no memory model.
pub const MIN_INTERVAL_EPSILON: f64 = 1e-3;

/// Estimates current recall probability of scheduled cards.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetentionEstimator;

impl RetentionEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Retention given an interval and the days elapsed since last review.
    ///
    /// Returns None for intervals too small to model. Negative elapsed time
    /// is treated as zero, so the result is in (0, 1].
    pub fn retention(&self, interval: f64, elapsed_days: f64) -> Option<f64> {
        if !interval.is_finite() || interval < MIN_INTERVAL_EPSILON || elapsed_days.is_nan() {
            return None;
        }
        let elapsed = elapsed_days.max(0.0);
        Some(1.0 / (1.0 + elapsed / (CURVE_FACTOR * interval)))
    }

    /// Current retention of a card at `now`.
    ///
    /// Elapsed time is `interval + (now - due)`. New cards (no due date)
    /// and cards with a degenerate interval are excluded and return None.
    pub fn current_retention(&self, card: &Card, now: DateTime<Utc>) -> Option<f64> {
        let due = card.due?;
        let overdue = days_between(due, now);
        self.retention(card.interval, card.interval + overdue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_retention_at_interval_is_target() {
        let estimator = RetentionEstimator::new();
        let r = estimator.retention(10.0, 10.0).unwrap();
        assert!((r - 0.9).abs() < 1e-12, "R at t=I should be 0.9, got {}", r);
    }

    #[test]
    fn test_retention_at_zero_elapsed() {
        let estimator = RetentionEstimator::new();
        assert_eq!(estimator.retention(10.0, 0.0), Some(1.0));
        assert_eq!(estimator.retention(10.0, -3.0), Some(1.0));
    }

    #[test]
    fn test_retention_decays_over_time() {
        let estimator = RetentionEstimator::new();
        let r1 = estimator.retention(10.0, 1.0).unwrap();
        let r2 = estimator.retention(10.0, 10.0).unwrap();
        let r3 = estimator.retention(10.0, 100.0).unwrap();
        assert!(r1 > r2 && r2 > r3, "R should decrease: {} > {} > {}", r1, r2, r3);
        assert!(r3 > 0.0);
    }

    #[test]
    fn test_degenerate_interval_is_excluded() {
        let estimator = RetentionEstimator::new();
        assert_eq!(estimator.retention(0.0, 5.0), None);
        assert_eq!(estimator.retention(1e-6, 5.0), None);
        assert_eq!(estimator.retention(f64::NAN, 5.0), None);
    }

    #[test]
    fn test_current_retention_for_overdue_card() {
        let estimator = RetentionEstimator::new();
        let now = Utc::now();
        let card = Card::new(1, ["A"]).scheduled(now - Duration::days(5), 30.0, 250, now);
        let r = estimator.current_retention(&card, now).unwrap();
        // elapsed = 35, R = 1 / (1 + 35/270)
        assert!((r - 1.0 / (1.0 + 35.0 / 270.0)).abs() < 1e-9);
    }

    #[test]
    fn test_current_retention_skips_new_cards() {
        let estimator = RetentionEstimator::new();
        assert_eq!(estimator.current_retention(&Card::new(1, ["A"]), Utc::now()), None);
    }
}
