//! Hierarchical card queues.
//!
//! A [`DeckTree`] groups queued cards by deck path and keeps live due, new
//! and total counts for every subtree. A [`DeckCursor`] walks a subtree and
//! picks the next card to show.

mod cursor;
mod tree;

pub use cursor::{select_card, DeckCursor};
pub use tree::{CardLocation, Deck, DeckId, DeckSummary, DeckTree, QueueKind};
