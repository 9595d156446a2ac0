//! Core types for recall.

mod card;
mod response;
pub mod time;

pub use card::{content_hash, Card, CardId, DEFAULT_BASE_EASE, MIN_EASE};
pub use response::{ResponseKind, ResponseOptions};
