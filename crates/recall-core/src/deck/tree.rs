//! Deck hierarchy with rollup counts.
//!
//! Decks live in an arena owned by [`DeckTree`]; parent and child links are
//! [`DeckId`] indices. Every deck keeps its own due and new queues plus
//! rollup counts covering itself and all descendants:
//!
//! ```text
//! due_count(d)  = |due_queue(d)|  + sum(due_count(c)  for c in children(d))
//! new_count(d)  = |new_queue(d)|  + sum(new_count(c)  for c in children(d))
//! total_count(d) >= due_count(d) + new_count(d)
//! ```
//!
//! Every queue mutation walks the ancestor chain in the same call, so the
//! counts hold after each public operation.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{RecallError, RecallResult};
use crate::types::{Card, CardId};

/// Index of a deck in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(usize);

impl DeckId {
    /// The root deck of every tree.
    pub const ROOT: DeckId = DeckId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Which of a deck's two queues a card sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QueueKind {
    /// Cards with review history.
    Due,
    /// Cards never reviewed.
    New,
}

impl QueueKind {
    /// The queue a card belongs in given its current state.
    pub fn of(card: &Card) -> Self {
        if card.is_due() {
            QueueKind::Due
        } else {
            QueueKind::New
        }
    }
}

/// Where a queued card currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLocation {
    pub deck: DeckId,
    pub queue: QueueKind,
    pub index: usize,
}

/// A node of the deck tree.
#[derive(Debug, Clone)]
pub struct Deck {
    name: String,
    parent: Option<DeckId>,
    children: Vec<DeckId>,
    due_queue: Vec<Card>,
    new_queue: Vec<Card>,
    due_count: usize,
    new_count: usize,
    total_count: usize,
}

impl Deck {
    fn new(name: impl Into<String>, parent: Option<DeckId>) -> Self {
        Self {
            name: name.into(),
            parent,
            children: Vec::new(),
            due_queue: Vec::new(),
            new_queue: Vec::new(),
            due_count: 0,
            new_count: 0,
            total_count: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent deck; None for the root.
    pub fn parent(&self) -> Option<DeckId> {
        self.parent
    }

    pub fn children(&self) -> &[DeckId] {
        &self.children
    }

    pub fn due_queue(&self) -> &[Card] {
        &self.due_queue
    }

    pub fn new_queue(&self) -> &[Card] {
        &self.new_queue
    }

    pub fn queue(&self, kind: QueueKind) -> &[Card] {
        match kind {
            QueueKind::Due => &self.due_queue,
            QueueKind::New => &self.new_queue,
        }
    }

    /// Due cards in this deck and all descendants.
    pub fn due_count(&self) -> usize {
        self.due_count
    }

    /// New cards in this deck and all descendants.
    pub fn new_count(&self) -> usize {
        self.new_count
    }

    /// All cards counted under this deck, including ones not queued today.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Queued cards in this deck and all descendants.
    pub fn rollup(&self) -> usize {
        self.due_count + self.new_count
    }

    /// True if this deck's own queues hold a card.
    pub fn has_own_cards(&self) -> bool {
        !self.due_queue.is_empty() || !self.new_queue.is_empty()
    }

    fn queue_mut(&mut self, kind: QueueKind) -> &mut Vec<Card> {
        match kind {
            QueueKind::Due => &mut self.due_queue,
            QueueKind::New => &mut self.new_queue,
        }
    }

    fn count_mut(&mut self, kind: QueueKind) -> &mut usize {
        match kind {
            QueueKind::Due => &mut self.due_count,
            QueueKind::New => &mut self.new_count,
        }
    }
}

/// Read-only snapshot of a deck and its subtree, for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSummary {
    pub name: String,
    pub path: Vec<String>,
    pub due_count: usize,
    pub new_count: usize,
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DeckSummary>,
}

/// The deck hierarchy of a review session.
#[derive(Debug, Clone)]
pub struct DeckTree {
    decks: Vec<Deck>,
}

impl DeckTree {
    /// Create a tree holding only an unnamed root deck.
    pub fn new() -> Self {
        Self::with_root_name("")
    }

    /// Create a tree whose root deck carries `name`.
    pub fn with_root_name(name: impl Into<String>) -> Self {
        Self {
            decks: vec![Deck::new(name, None)],
        }
    }

    /// Build a tree from cards, creating each card's deck path.
    ///
    /// Children are sorted by name afterwards.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut tree = Self::new();
        for card in cards {
            let deck = tree.create_deck(&card.deck_path);
            tree.push_card(deck, card);
        }
        tree.sort_children();
        tree
    }

    pub fn root(&self) -> DeckId {
        DeckId::ROOT
    }

    pub fn deck(&self, id: DeckId) -> Option<&Deck> {
        self.decks.get(id.0)
    }

    /// Number of decks including the root.
    pub fn len(&self) -> usize {
        self.decks.len()
    }

    /// Always false: the root exists from construction.
    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    /// Create every missing deck along `path` and return the leaf.
    ///
    /// Idempotent: existing decks are reused. An empty path is the root.
    pub fn create_deck<S: AsRef<str>>(&mut self, path: &[S]) -> DeckId {
        let mut current = DeckId::ROOT;
        for segment in path {
            let segment = segment.as_ref();
            current = match self.child_named(current, segment) {
                Some(child) => child,
                None => {
                    let id = DeckId(self.decks.len());
                    self.decks.push(Deck::new(segment, Some(current)));
                    self.decks[current.0].children.push(id);
                    tracing::debug!(deck = segment, parent = current.0, "Created deck");
                    id
                }
            };
        }
        current
    }

    /// Resolve a path to an existing deck.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<DeckId> {
        path.iter()
            .try_fold(DeckId::ROOT, |current, segment| self.child_named(current, segment.as_ref()))
    }

    /// Names from below the root down to `id`.
    pub fn path_of(&self, id: DeckId) -> Vec<String> {
        let mut path: Vec<String> = self
            .ancestors(id)
            .filter(|deck| *deck != DeckId::ROOT)
            .map(|deck| self.decks[deck.0].name.clone())
            .collect();
        path.reverse();
        path
    }

    /// Enqueue a card in the deck at `path`.
    ///
    /// The card goes to the due queue if it has review history and to the
    /// new queue otherwise. Due or new count and total count are incremented
    /// on the deck and every ancestor. The deck must exist.
    pub fn insert_flashcard<S: AsRef<str>>(
        &mut self,
        path: &[S],
        card: Card,
    ) -> RecallResult<DeckId> {
        let deck = self.find(path).ok_or_else(|| RecallError::deck_not_found(path))?;
        self.push_card(deck, card);
        Ok(deck)
    }

    /// Enqueue a card under its own `deck_path`.
    pub fn insert(&mut self, card: Card) -> RecallResult<DeckId> {
        let deck = self
            .find(&card.deck_path)
            .ok_or_else(|| RecallError::deck_not_found(&card.deck_path))?;
        self.push_card(deck, card);
        Ok(deck)
    }

    fn push_card(&mut self, deck: DeckId, card: Card) {
        let kind = QueueKind::of(&card);
        self.decks[deck.0].queue_mut(kind).push(card);
        for id in self.ancestors(deck).collect::<Vec<_>>() {
            let node = &mut self.decks[id.0];
            *node.count_mut(kind) += 1;
            node.total_count += 1;
        }
    }

    /// Remove the card at `index` of a deck's own queue.
    ///
    /// Decrements the matching due or new count on the deck and every
    /// ancestor; total count is left alone. A stale deck or index is a
    /// no-op returning None.
    pub fn delete_flashcard_at_index(
        &mut self,
        deck: DeckId,
        index: usize,
        queue: QueueKind,
    ) -> Option<Card> {
        let Some(node) = self.decks.get_mut(deck.0) else {
            tracing::debug!(deck = deck.0, "Ignoring delete from unknown deck");
            return None;
        };
        let cards = node.queue_mut(queue);
        if index >= cards.len() {
            tracing::debug!(deck = deck.0, index, %queue, "Ignoring delete at stale index");
            return None;
        }
        let card = cards.remove(index);
        for id in self.ancestors(deck).collect::<Vec<_>>() {
            let count = self.decks[id.0].count_mut(queue);
            *count = count.saturating_sub(1);
        }
        Some(card)
    }

    /// Remove a card by location.
    pub fn take(&mut self, location: CardLocation) -> Option<Card> {
        self.delete_flashcard_at_index(location.deck, location.index, location.queue)
    }

    /// Remove a card wherever it is queued.
    pub fn remove_card(&mut self, id: CardId) -> Option<Card> {
        let location = self.find_card(id)?;
        self.take(location)
    }

    /// Put a card back at the end of `queue` in `deck`.
    ///
    /// Used after a card was removed and must come up again in the same
    /// session, in the queue it was taken from. Due or new counts rise
    /// along the chain; total count does not, as the card was already
    /// counted.
    pub fn requeue(&mut self, deck: DeckId, queue: QueueKind, card: Card) {
        if deck.0 >= self.decks.len() {
            tracing::debug!(deck = deck.0, card = %card.id, "Ignoring requeue into unknown deck");
            return;
        }
        self.decks[deck.0].queue_mut(queue).push(card);
        for id in self.ancestors(deck).collect::<Vec<_>>() {
            *self.decks[id.0].count_mut(queue) += 1;
        }
    }

    /// Adjust total count along `path` by `delta` without touching queues.
    ///
    /// Lets the collaborator count cards that exist but are not queued
    /// today (not yet due, or buried).
    pub fn count_flashcard<S: AsRef<str>>(&mut self, path: &[S], delta: i64) -> RecallResult<()> {
        let deck = self.find(path).ok_or_else(|| RecallError::deck_not_found(path))?;
        for id in self.ancestors(deck).collect::<Vec<_>>() {
            let node = &mut self.decks[id.0];
            let floor = node.due_count + node.new_count;
            node.total_count = add_signed(node.total_count, delta).max(floor);
        }
        Ok(())
    }

    /// Sort every deck's children by name, recursively.
    pub fn sort_children(&mut self) {
        for idx in 0..self.decks.len() {
            let mut children = std::mem::take(&mut self.decks[idx].children);
            children.sort_by(|a, b| self.decks[a.0].name.cmp(&self.decks[b.0].name));
            self.decks[idx].children = children;
        }
    }

    /// Locate a queued card by id.
    pub fn find_card(&self, id: CardId) -> Option<CardLocation> {
        self.decks.iter().enumerate().find_map(|(deck, node)| {
            [QueueKind::Due, QueueKind::New].into_iter().find_map(|queue| {
                node.queue(queue)
                    .iter()
                    .position(|card| card.id == id)
                    .map(|index| CardLocation {
                        deck: DeckId(deck),
                        queue,
                        index,
                    })
            })
        })
    }

    /// Card at a location, if still there.
    pub fn card_at(&self, location: CardLocation) -> Option<&Card> {
        self.deck(location.deck)?.queue(location.queue).get(location.index)
    }

    /// Snapshot of the subtree rooted at `id`.
    pub fn summary(&self, id: DeckId) -> Option<DeckSummary> {
        let deck = self.deck(id)?;
        Some(DeckSummary {
            name: deck.name.clone(),
            path: self.path_of(id),
            due_count: deck.due_count,
            new_count: deck.new_count,
            total_count: deck.total_count,
            children: deck.children.iter().filter_map(|child| self.summary(*child)).collect(),
        })
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: DeckId) -> impl Iterator<Item = DeckId> + '_ {
        std::iter::successors(self.deck(id).map(|_| id), move |current| {
            self.decks[current.0].parent
        })
    }

    fn child_named(&self, parent: DeckId, name: &str) -> Option<DeckId> {
        self.decks[parent.0]
            .children
            .iter()
            .copied()
            .find(|child| self.decks[child.0].name == name)
    }
}

impl Default for DeckTree {
    fn default() -> Self {
        Self::new()
    }
}

fn add_signed(value: usize, delta: i64) -> usize {
    if delta >= 0 {
        value.saturating_add(delta as usize)
    } else {
        value.saturating_sub(delta.unsigned_abs() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn due_card(id: u64, path: &[&str]) -> Card {
        let now = Utc::now();
        Card::new(id, path.iter().copied()).scheduled(now - Duration::days(1), 5.0, 250, now)
    }

    fn new_card(id: u64, path: &[&str]) -> Card {
        Card::new(id, path.iter().copied())
    }

    /// Three due and two new cards under A/B.
    fn populated() -> (DeckTree, DeckId, DeckId) {
        let mut tree = DeckTree::new();
        let b = tree.create_deck(&["A", "B"]);
        let a = tree.find(&["A"]).unwrap();
        for id in 1..=3 {
            tree.insert_flashcard(&["A", "B"], due_card(id, &["A", "B"])).unwrap();
        }
        for id in 4..=5 {
            tree.insert_flashcard(&["A", "B"], new_card(id, &["A", "B"])).unwrap();
        }
        (tree, a, b)
    }

    fn assert_rollups_consistent(tree: &DeckTree) {
        for idx in 0..tree.len() {
            let deck = tree.deck(DeckId(idx)).unwrap();
            let due: usize = deck.due_queue().len()
                + deck.children().iter().map(|c| tree.deck(*c).unwrap().due_count()).sum::<usize>();
            let new: usize = deck.new_queue().len()
                + deck.children().iter().map(|c| tree.deck(*c).unwrap().new_count()).sum::<usize>();
            assert_eq!(deck.due_count(), due, "due rollup mismatch at {:?}", deck.name());
            assert_eq!(deck.new_count(), new, "new rollup mismatch at {:?}", deck.name());
            assert!(deck.total_count() >= due + new);
        }
    }

    #[test]
    fn test_create_deck_is_idempotent() {
        let mut tree = DeckTree::new();
        let first = tree.create_deck(&["Spanish", "Verbs"]);
        let second = tree.create_deck(&["Spanish", "Verbs"]);
        assert_eq!(first, second);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.path_of(first), vec!["Spanish", "Verbs"]);
    }

    #[test]
    fn test_empty_path_is_root() {
        let mut tree = DeckTree::new();
        assert_eq!(tree.create_deck::<&str>(&[]), DeckId::ROOT);
        assert_eq!(tree.find::<&str>(&[]), Some(DeckId::ROOT));
        assert!(tree.path_of(DeckId::ROOT).is_empty());
    }

    #[test]
    fn test_insert_rolls_up_counts() {
        let (tree, a, b) = populated();
        let a = tree.deck(a).unwrap();
        let b = tree.deck(b).unwrap();
        assert_eq!((a.due_count(), a.new_count()), (3, 2));
        assert_eq!((b.due_count(), b.new_count()), (3, 2));
        assert_eq!(tree.deck(DeckId::ROOT).unwrap().total_count(), 5);
        assert!(a.due_queue().is_empty(), "cards belong to the leaf deck only");
        assert_rollups_consistent(&tree);
    }

    #[test]
    fn test_insert_into_missing_deck_fails_without_mutation() {
        let mut tree = DeckTree::new();
        tree.create_deck(&["A"]);
        let err = tree
            .insert_flashcard(&["A", "Missing"], new_card(1, &["A", "Missing"]))
            .unwrap_err();
        assert!(matches!(err, RecallError::DeckNotFound { .. }));
        assert_eq!(tree.deck(DeckId::ROOT).unwrap().total_count(), 0);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_delete_decrements_deck_and_ancestors() {
        let (mut tree, a, b) = populated();
        let removed = tree.delete_flashcard_at_index(b, 0, QueueKind::Due).unwrap();
        assert_eq!(removed.id, CardId(1));
        assert_eq!(tree.deck(b).unwrap().due_count(), 2);
        assert_eq!(tree.deck(a).unwrap().due_count(), 2);
        assert_eq!(tree.deck(DeckId::ROOT).unwrap().due_count(), 2);
        assert_eq!(tree.deck(b).unwrap().total_count(), 5);
        assert_rollups_consistent(&tree);
    }

    #[test]
    fn test_delete_at_stale_index_is_noop() {
        let (mut tree, _, b) = populated();
        assert!(tree.delete_flashcard_at_index(b, 10, QueueKind::New).is_none());
        assert!(tree.delete_flashcard_at_index(DeckId(99), 0, QueueKind::Due).is_none());
        assert_eq!(tree.deck(b).unwrap().new_count(), 2);
        assert_rollups_consistent(&tree);
    }

    #[test]
    fn test_count_flashcard_touches_totals_only() {
        let (mut tree, a, b) = populated();
        tree.count_flashcard(&["A", "B"], 4).unwrap();
        assert_eq!(tree.deck(b).unwrap().total_count(), 9);
        assert_eq!(tree.deck(a).unwrap().total_count(), 9);
        assert_eq!(tree.deck(a).unwrap().due_count(), 3);

        // Never drops below what is queued
        tree.count_flashcard(&["A", "B"], -100).unwrap();
        assert_eq!(tree.deck(b).unwrap().total_count(), 5);
        assert!(tree.count_flashcard(&["Nope"], 1).is_err());
    }

    #[test]
    fn test_requeue_restores_queue_counts() {
        let (mut tree, _, b) = populated();
        let card = tree.delete_flashcard_at_index(b, 0, QueueKind::Due).unwrap();
        tree.requeue(b, QueueKind::Due, card);
        let deck = tree.deck(b).unwrap();
        assert_eq!(deck.due_count(), 3);
        assert_eq!(deck.due_queue().last().unwrap().id, CardId(1));
        assert_eq!(deck.total_count(), 5);
        assert_rollups_consistent(&tree);
    }

    #[test]
    fn test_requeue_keeps_given_queue() {
        let (mut tree, a, b) = populated();
        let card = tree.delete_flashcard_at_index(b, 0, QueueKind::New).unwrap();
        let card = Card { interval: 1.0, ..card };
        tree.requeue(b, QueueKind::New, card);
        assert_eq!(tree.deck(b).unwrap().new_count(), 2);
        assert_eq!(tree.deck(a).unwrap().due_count(), 3);
        assert_eq!(tree.find_card(CardId(4)).unwrap().queue, QueueKind::New);
        assert_rollups_consistent(&tree);
    }

    #[test]
    fn test_sort_children_by_name() {
        let mut tree = DeckTree::new();
        tree.create_deck(&["Zoology"]);
        tree.create_deck(&["Art", "Modern"]);
        tree.create_deck(&["Art", "Baroque"]);
        tree.create_deck(&["Music"]);
        tree.sort_children();

        let summary = tree.summary(DeckId::ROOT).unwrap();
        let names: Vec<_> = summary.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Art", "Music", "Zoology"]);
        let art: Vec<_> = summary.children[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(art, vec!["Baroque", "Modern"]);
    }

    #[test]
    fn test_find_card_across_queues() {
        let (tree, _, b) = populated();
        let location = tree.find_card(CardId(5)).unwrap();
        assert_eq!(location, CardLocation { deck: b, queue: QueueKind::New, index: 1 });
        assert_eq!(tree.card_at(location).unwrap().id, CardId(5));
        assert!(tree.find_card(CardId(42)).is_none());
    }

    #[test]
    fn test_from_cards_builds_paths() {
        let tree = DeckTree::from_cards(vec![
            new_card(1, &["Geo", "Europe"]),
            due_card(2, &["Geo"]),
            new_card(3, &["Art"]),
        ]);
        let root = tree.summary(DeckId::ROOT).unwrap();
        assert_eq!(root.total_count, 3);
        assert_eq!(root.children[0].name, "Art");
        let geo = &root.children[1];
        assert_eq!((geo.due_count, geo.new_count), (1, 1));
        assert_eq!(geo.children[0].path, vec!["Geo", "Europe"]);
        assert_rollups_consistent(&tree);
    }

    #[test]
    fn test_queue_kind_strum_names() {
        assert_eq!(QueueKind::Due.to_string(), "due");
        assert_eq!("new".parse::<QueueKind>().unwrap(), QueueKind::New);
    }
}
