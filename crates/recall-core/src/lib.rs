//! recall-core - Core library for recall.
//!
//! This crate provides spaced-repetition scheduling, retention-based
//! postponement and hierarchical review queues for flashcard tools.
//!
//! # Example
//!
//! ```ignore
//! use recall_core::{Card, DeckTree, RecallConfig, ReviewSession};
//!
//! let config = RecallConfig::from_file("~/.recall/config.toml")?;
//! let tree = DeckTree::from_cards(cards);
//! let mut session = ReviewSession::new(tree, config.scheduling);
//!
//! while let Some(card) = session.next_card() {
//!     // Show the card, then grade it with a response index
//!     let outcome = session.review(2, chrono::Utc::now())?;
//!     persist(&outcome.card);
//! }
//! ```

pub mod annotation;
pub mod config;
pub mod deck;
pub mod error;
pub mod retention;
pub mod scheduling;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use annotation::ScheduleAnnotation;
pub use config::{PostponeConfig, RecallConfig, SchedulingConfig};
pub use deck::{CardLocation, DeckCursor, DeckId, DeckSummary, DeckTree, QueueKind};
pub use error::{ErrorCode, RecallError, RecallResult};
pub use retention::{PostponeEngine, PostponeReport, RetentionEstimator};
pub use scheduling::{schedule, DueDateHistogram, SchedulingEngine, SchedulingResult};
pub use session::{BuryList, ReviewOutcome, ReviewSession, SessionMode};
pub use types::{Card, CardId, ResponseKind, ResponseOptions};
