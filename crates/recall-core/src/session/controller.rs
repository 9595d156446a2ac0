//! Review session over a deck tree.
//!
//! Picks cards with a [`DeckCursor`], applies responses through the
//! [`SchedulingEngine`], and keeps the tree's queues in step: a reviewed
//! or skipped card leaves its queue before the next card is chosen.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::bury::BuryList;
use crate::config::SchedulingConfig;
use crate::deck::{DeckCursor, DeckId, DeckTree};
use crate::error::{RecallError, RecallResult};
use crate::scheduling::{DueDateHistogram, SchedulingEngine, SchedulingResult};
use crate::types::{Card, CardId, ResponseKind};

/// How responses affect cards.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionMode {
    /// Responses reschedule cards.
    #[default]
    Review,
    /// Practice without scheduling. Only the highest response retires a
    /// card; any other response sends it to the back of its queue.
    Cram,
}

/// What a review did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    /// The reviewed card after its schedule was applied.
    pub card: Card,
    pub response: ResponseKind,
    /// New schedule; None in cram mode.
    pub result: Option<SchedulingResult>,
    /// True if the card went back into the queue for this session.
    pub requeued: bool,
    /// Siblings removed from the session, schedules untouched.
    pub buried: Vec<Card>,
}

/// A single pass through a deck subtree.
pub struct ReviewSession<R = StdRng> {
    tree: DeckTree,
    engine: SchedulingEngine,
    mode: SessionMode,
    cursor: Option<DeckCursor>,
    current: Option<CardId>,
    histogram: DueDateHistogram,
    bury_list: BuryList,
    reviewed: usize,
    rng: R,
}

impl ReviewSession<StdRng> {
    /// Create a session seeded from system entropy.
    pub fn new(tree: DeckTree, config: SchedulingConfig) -> Self {
        Self::with_rng(tree, config, StdRng::from_entropy())
    }
}

impl<R: Rng> ReviewSession<R> {
    /// Create a session with an explicit RNG.
    ///
    /// Useful for reproducible testing.
    pub fn with_rng(tree: DeckTree, config: SchedulingConfig, rng: R) -> Self {
        Self {
            tree,
            engine: SchedulingEngine::new(config),
            mode: SessionMode::default(),
            cursor: None,
            current: None,
            histogram: DueDateHistogram::new(),
            bury_list: BuryList::new(),
            reviewed: 0,
            rng,
        }
    }

    /// Builder method to set the session mode.
    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Seed load balancing with reviews already scheduled elsewhere.
    pub fn set_due_histogram(&mut self, histogram: DueDateHistogram) {
        self.histogram = histogram;
    }

    /// Continue a bury list from an earlier session the same day.
    pub fn set_bury_list(&mut self, bury_list: BuryList) {
        self.bury_list = bury_list;
    }

    /// Begin reviewing the subtree under `deck`.
    pub fn start(&mut self, deck: DeckId) -> RecallResult<()> {
        if self.tree.deck(deck).is_none() {
            return Err(RecallError::validation(format!("unknown deck id {}", deck.index())));
        }
        self.cursor = Some(DeckCursor::new(deck));
        self.current = None;
        tracing::debug!(deck = deck.index(), mode = %self.mode, "Review session started");
        Ok(())
    }

    /// Begin reviewing the subtree at `path`.
    pub fn start_path<S: AsRef<str>>(&mut self, path: &[S]) -> RecallResult<DeckId> {
        let deck = self.tree.find(path).ok_or_else(|| RecallError::deck_not_found(path))?;
        self.start(deck)?;
        Ok(deck)
    }

    /// The card to show next, or None once the session's subtree is empty.
    ///
    /// Until the current card is reviewed or skipped, repeated calls return
    /// it again. A session that was never started covers the whole tree.
    pub fn next_card(&mut self) -> Option<&Card> {
        if let Some(id) = self.current {
            if let Some(location) = self.tree.find_card(id) {
                return self.tree.card_at(location);
            }
            self.current = None;
        }

        let randomize = self.engine.config().randomize_card_order;
        let cursor = self.cursor.get_or_insert_with(|| DeckCursor::new(DeckId::ROOT));
        match cursor.next(&self.tree, randomize, &mut self.rng) {
            Some(location) => {
                let card = self.tree.card_at(location)?;
                self.current = Some(card.id);
                Some(card)
            }
            None => {
                tracing::info!(reviewed = self.reviewed, "Review session finished");
                None
            }
        }
    }

    /// The card selected by the last `next_card`, if any.
    pub fn current_card(&self) -> Option<&Card> {
        let location = self.tree.find_card(self.current?)?;
        self.tree.card_at(location)
    }

    /// Apply response `response_index` to the current card.
    ///
    /// The card leaves its queue first. Reset gives it a one-day interval
    /// at base ease and queues it again at the end of the queue it came
    /// from, keeping its due date; nothing is buried. Any other response
    /// schedules it (load-balanced against the session histogram) and
    /// retires it. With sibling burying on, queued siblings are then
    /// removed and all their hashes recorded.
    pub fn review(
        &mut self,
        response_index: usize,
        now: DateTime<Utc>,
    ) -> RecallResult<ReviewOutcome> {
        let id = self.current.ok_or(RecallError::NoCurrentCard)?;
        let options = &self.engine.config().response_options;
        let response = options.kind(response_index)?;
        let is_last = response_index == options.last_index();

        let Some(location) = self.tree.find_card(id) else {
            self.current = None;
            return Err(RecallError::NoCurrentCard);
        };
        let mut card = self
            .tree
            .take(location)
            .ok_or_else(|| RecallError::Internal(format!("card {} vanished from its queue", id)))?;
        self.current = None;

        if self.mode == SessionMode::Cram {
            let requeued = !is_last;
            if requeued {
                self.tree.requeue(location.deck, location.queue, card.clone());
            }
            tracing::debug!(card = %card.id, %response, requeued, "Cram response");
            return Ok(ReviewOutcome {
                card,
                response,
                result: None,
                requeued,
                buried: Vec::new(),
            });
        }

        let result = self.engine.schedule_card(&card, response, Some(&self.histogram));
        self.reviewed += 1;

        let requeued = response == ResponseKind::Reset;
        if requeued {
            card.interval = result.interval;
            card.ease = result.ease;
            self.tree.requeue(location.deck, location.queue, card.clone());
        } else {
            card.apply_schedule(result, now);
            self.histogram.record(result.interval.round() as i64);
        }

        tracing::debug!(
            card = %card.id,
            %response,
            interval = result.interval,
            ease = result.ease,
            requeued,
            "Reviewed card"
        );

        let buried = if self.engine.config().bury_sibling_cards && !requeued {
            self.bury_list.record(card.content_hash.clone());
            self.bury_siblings(&card)
        } else {
            Vec::new()
        };

        Ok(ReviewOutcome {
            card,
            response,
            result: Some(result),
            requeued,
            buried,
        })
    }

    /// Drop the current card and its queued siblings from this session
    /// without scheduling or burying them.
    pub fn skip(&mut self) -> RecallResult<Card> {
        let id = self.current.take().ok_or(RecallError::NoCurrentCard)?;
        let card = self.tree.remove_card(id).ok_or(RecallError::NoCurrentCard)?;
        let skipped_siblings = card
            .siblings
            .iter()
            .filter_map(|sibling| self.tree.remove_card(*sibling))
            .count();
        tracing::debug!(card = %card.id, skipped_siblings, "Skipped card");
        Ok(card)
    }

    fn bury_siblings(&mut self, card: &Card) -> Vec<Card> {
        let mut buried = Vec::new();
        for sibling in &card.siblings {
            let Some(removed) = self.tree.remove_card(*sibling) else {
                continue;
            };
            self.bury_list.record(removed.content_hash.clone());
            tracing::debug!(card = %card.id, sibling = %removed.id, "Buried sibling");
            buried.push(removed);
        }
        buried
    }

    pub fn tree(&self) -> &DeckTree {
        &self.tree
    }

    pub fn bury_list(&self) -> &BuryList {
        &self.bury_list
    }

    pub fn histogram(&self) -> &DueDateHistogram {
        &self.histogram
    }

    pub fn engine(&self) -> &SchedulingEngine {
        &self.engine
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Graded reviews applied so far, excluding cram responses.
    pub fn reviewed(&self) -> usize {
        self.reviewed
    }

    /// End the session, handing back the tree and the bury list.
    pub fn finish(self) -> (DeckTree, BuryList) {
        (self.tree, self.bury_list)
    }
}
