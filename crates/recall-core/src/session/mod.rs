//! Review sessions: card-by-card traversal with scheduling and burying.

mod bury;
mod controller;

pub use bury::BuryList;
pub use controller::{ReviewOutcome, ReviewSession, SessionMode};
