//! Retention estimation and postponement.
//!
//! Models recall probability with a power-law forgetting curve and uses it
//! to push back overdue cards that are still comfortably remembered.

mod estimator;
mod postpone;

pub use estimator::{RetentionEstimator, CURVE_FACTOR, MIN_INTERVAL_EPSILON};
pub use postpone::{PostponeEngine, PostponeReport};
