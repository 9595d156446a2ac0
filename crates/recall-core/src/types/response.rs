//! Review responses.
//!
//! The set of answer buttons is configurable: an ordered list of
//! [`ResponseKind`]s where index 0 is always [`ResponseKind::Reset`] and
//! the remaining entries are in increasing recall quality.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{RecallError, RecallResult};

/// The effect a response has on a card's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseKind {
    /// Forgotten: interval back to one day, ease back to base.
    Reset,
    /// Recalled with difficulty: ease drops, interval grows slowly.
    Hard,
    /// Normal recall: ease unchanged.
    Good,
    /// Effortless recall: ease rises, interval gets a bonus.
    Easy,
}

impl ResponseKind {
    /// Signed ease change for this response, given the configured step.
    pub fn ease_delta(self, step: u32) -> i64 {
        match self {
            ResponseKind::Hard => -(step as i64),
            ResponseKind::Easy => step as i64,
            ResponseKind::Good | ResponseKind::Reset => 0,
        }
    }

    /// Share of the overdue delay credited as extra interval.
    pub fn delay_weight(self) -> f64 {
        match self {
            ResponseKind::Hard => 0.25,
            ResponseKind::Good => 0.5,
            ResponseKind::Easy => 1.0,
            ResponseKind::Reset => 0.0,
        }
    }
}

/// Ordered response options; index 0 is always Reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ResponseKind>", into = "Vec<ResponseKind>")]
pub struct ResponseOptions(Vec<ResponseKind>);

impl ResponseOptions {
    /// Build from an explicit list, checking Reset sits at index 0 only.
    pub fn new(kinds: Vec<ResponseKind>) -> RecallResult<Self> {
        if kinds.first() != Some(&ResponseKind::Reset) {
            return Err(RecallError::validation_with_suggestion(
                "response options must start with reset",
                "Put `reset` first in response_options",
            ));
        }
        if kinds.len() < 2 {
            return Err(RecallError::validation(
                "response options need at least one recall response after reset",
            ));
        }
        if kinds[1..].contains(&ResponseKind::Reset) {
            return Err(RecallError::validation("reset may only appear at index 0"));
        }
        Ok(Self(kinds))
    }

    /// Build a layout with `count` recall buttons after Reset.
    ///
    /// One button is Good, two are Good/Easy, three or more are Hard,
    /// then Good repeated, then Easy.
    pub fn with_count(count: usize) -> Self {
        let mut kinds = vec![ResponseKind::Reset];
        match count {
            0 | 1 => kinds.push(ResponseKind::Good),
            2 => kinds.extend([ResponseKind::Good, ResponseKind::Easy]),
            n => {
                kinds.push(ResponseKind::Hard);
                kinds.extend(std::iter::repeat(ResponseKind::Good).take(n - 2));
                kinds.push(ResponseKind::Easy);
            }
        }
        Self(kinds)
    }

    /// Resolve a response index to its kind.
    pub fn kind(&self, index: usize) -> RecallResult<ResponseKind> {
        self.0.get(index).copied().ok_or(RecallError::InvalidResponse {
            index,
            available: self.0.len(),
        })
    }

    /// Number of options including Reset.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recall responses (excluding Reset).
    pub fn recall_count(&self) -> usize {
        self.0.len() - 1
    }

    /// Index of the highest-quality response.
    pub fn last_index(&self) -> usize {
        self.0.len() - 1
    }

    pub fn iter(&self) -> impl Iterator<Item = ResponseKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ResponseOptions {
    fn default() -> Self {
        Self(vec![
            ResponseKind::Reset,
            ResponseKind::Hard,
            ResponseKind::Good,
            ResponseKind::Easy,
        ])
    }
}

impl TryFrom<Vec<ResponseKind>> for ResponseOptions {
    type Error = RecallError;

    fn try_from(kinds: Vec<ResponseKind>) -> Result<Self, Self::Error> {
        Self::new(kinds)
    }
}

impl From<ResponseOptions> for Vec<ResponseKind> {
    fn from(options: ResponseOptions) -> Self {
        options.0
    }
}
