//! Per-card scheduling: interval and ease after a graded review.

mod engine;
mod load_balance;

pub use engine::{schedule, SchedulingEngine, SchedulingResult};
pub use load_balance::DueDateHistogram;
