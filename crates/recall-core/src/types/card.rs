//! Card descriptor supplied by the collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::time::{add_days, days_between};
use crate::scheduling::SchedulingResult;

/// Ease assigned to cards that were never reviewed, in percent.
pub const DEFAULT_BASE_EASE: u32 = 250;

/// Lowest ease a card can reach, in percent.
pub const MIN_EASE: u32 = 130;

/// Identifier of a card within one review session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reviewable unit with its own schedule.
///
/// A card is "due" once it carries a due date (it has review history) and
/// "new" otherwise. For new cards `ease` holds the initial ease that the
/// first graded review starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Current interval in days.
    #[serde(default = "default_interval")]
    pub interval: f64,
    /// Ease in percent.
    #[serde(default = "default_ease")]
    pub ease: u32,
    /// Next scheduled review; absent for new cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    /// Whether postponement and retention logic consider this card.
    #[serde(default = "default_tracked")]
    pub is_tracked: bool,
    /// Days past the due date when the card came up for review.
    #[serde(default)]
    pub delay_before_review: f64,
    /// Other cards generated from the same source block.
    #[serde(default)]
    pub siblings: Vec<CardId>,
    #[serde(default)]
    pub deck_path: Vec<String>,
    /// Hash of the source block, shared by siblings.
    #[serde(default)]
    pub content_hash: String,
}

fn default_interval() -> f64 {
    1.0
}

fn default_ease() -> u32 {
    DEFAULT_BASE_EASE
}

fn default_tracked() -> bool {
    true
}

impl Card {
    /// Create a new (never reviewed) card placed under `deck_path`.
    pub fn new<S: Into<String>>(id: u64, deck_path: impl IntoIterator<Item = S>) -> Self {
        Self {
            id: CardId(id),
            interval: default_interval(),
            ease: DEFAULT_BASE_EASE,
            due: None,
            is_tracked: true,
            delay_before_review: 0.0,
            siblings: Vec::new(),
            deck_path: deck_path.into_iter().map(Into::into).collect(),
            content_hash: String::new(),
        }
    }

    /// Give the card review history: a due date, interval and ease.
    ///
    /// `delay_before_review` is derived from how far `now` is past `due`.
    pub fn scheduled(
        mut self,
        due: DateTime<Utc>,
        interval: f64,
        ease: u32,
        now: DateTime<Utc>,
    ) -> Self {
        self.due = Some(due);
        self.interval = interval;
        self.ease = ease;
        self.delay_before_review = days_between(due, now).max(0.0);
        self
    }

    /// Builder method to set the initial ease of a new card.
    pub fn with_ease(mut self, ease: u32) -> Self {
        self.ease = ease;
        self
    }

    /// Builder method to set sibling ids.
    pub fn with_siblings(mut self, siblings: impl IntoIterator<Item = CardId>) -> Self {
        let own = self.id;
        self.siblings = siblings.into_iter().filter(|s| *s != own).collect();
        self
    }

    /// Builder method to set the content hash directly.
    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = hash.into();
        self
    }

    /// Builder method to derive the content hash from the source text.
    pub fn with_content(mut self, text: &str) -> Self {
        self.content_hash = content_hash(text);
        self
    }

    /// Builder method to exclude the card from postponement.
    pub fn untracked(mut self) -> Self {
        self.is_tracked = false;
        self
    }

    /// True if the card has scheduling history.
    pub fn is_due(&self) -> bool {
        self.due.is_some()
    }

    /// True if `other` belongs to this card's sibling group.
    pub fn is_sibling_of(&self, other: CardId) -> bool {
        self.siblings.contains(&other)
    }

    /// When the card was last reviewed, reconstructed as `due - interval`.
    pub fn last_review(&self) -> Option<DateTime<Utc>> {
        self.due.map(|due| add_days(due, -self.interval))
    }

    /// Store a scheduling result on the card: new interval and ease, due
    /// `interval` days after `now`.
    pub fn apply_schedule(&mut self, result: SchedulingResult, now: DateTime<Utc>) {
        self.interval = result.interval;
        self.ease = result.ease;
        self.due = Some(add_days(now, result.interval));
        self.delay_before_review = 0.0;
    }
}

/// Hex md5 digest of a card's source text.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", md5::compute(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_card_defaults() {
        let card = Card::new(1, ["A", "B"]);
        assert!(!card.is_due());
        assert_eq!(card.ease, DEFAULT_BASE_EASE);
        assert_eq!(card.interval, 1.0);
        assert!(card.is_tracked);
        assert_eq!(card.deck_path, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_scheduled_card_computes_delay() {
        let due = now() - Duration::days(5);
        let card = Card::new(1, ["A"]).scheduled(due, 30.0, 250, now());
        assert!(card.is_due());
        assert!((card.delay_before_review - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_early_review_has_zero_delay() {
        let due = now() + Duration::days(2);
        let card = Card::new(1, ["A"]).scheduled(due, 10.0, 250, now());
        assert_eq!(card.delay_before_review, 0.0);
    }

    #[test]
    fn test_last_review_reconstructed_from_due() {
        let due = now() - Duration::days(5);
        let card = Card::new(1, ["A"]).scheduled(due, 30.0, 250, now());
        assert_eq!(card.last_review(), Some(now() - Duration::days(35)));
    }

    #[test]
    fn test_last_review_of_huge_interval_saturates() {
        let card = Card::new(1, ["A"]).scheduled(now(), 1e15, 250, now());
        assert_eq!(card.last_review(), Some(DateTime::<Utc>::MIN_UTC));
    }

    #[test]
    fn test_siblings_exclude_self() {
        let card = Card::new(2, ["A"]).with_siblings([CardId(1), CardId(2), CardId(3)]);
        assert_eq!(card.siblings, vec![CardId(1), CardId(3)]);
        assert!(card.is_sibling_of(CardId(3)));
        assert!(!card.is_sibling_of(CardId(2)));
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = Card::new(1, ["A"]).with_content("What is 2+2?::4");
        let b = Card::new(2, ["A"]).with_content("What is 2+2?::4");
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 32);
    }

    #[test]
    fn test_apply_schedule() {
        let mut card = Card::new(1, ["A"]);
        card.apply_schedule(SchedulingResult { interval: 4.0, ease: 270 }, now());
        assert!(card.is_due());
        assert_eq!(card.due, Some(now() + Duration::days(4)));
        assert_eq!(card.ease, 270);
    }

    #[test]
    fn test_deserialize_minimal_descriptor() {
        let card: Card = serde_json::from_str(r#"{"id": 7, "deck_path": ["Geo"]}"#).unwrap();
        assert_eq!(card.id, CardId(7));
        assert!(!card.is_due());
        assert!(card.is_tracked);
        assert_eq!(card.ease, DEFAULT_BASE_EASE);
    }
}
