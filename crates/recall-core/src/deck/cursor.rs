//! Next-card selection over a deck subtree.

use rand::Rng;

use super::tree::{CardLocation, DeckId, DeckTree, QueueKind};

/// Depth-first position inside the subtree being reviewed.
///
/// The cursor starts at the boundary deck (the one the user opened) and
/// walks towards cards: a deck with queued cards of its own is served
/// first, otherwise the cursor descends into the first child that still has
/// cards, and climbs back to the parent once a subtree is exhausted. The
/// session ends when the boundary deck itself is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckCursor {
    current: DeckId,
    boundary: DeckId,
}

impl DeckCursor {
    /// Start a cursor at `boundary`.
    pub fn new(boundary: DeckId) -> Self {
        Self {
            current: boundary,
            boundary,
        }
    }

    /// Deck the cursor currently points at.
    pub fn current(&self) -> DeckId {
        self.current
    }

    pub fn boundary(&self) -> DeckId {
        self.boundary
    }

    /// Advance to the next card to show, without removing it.
    ///
    /// Returns None once every queue under the boundary is empty.
    pub fn next<R: Rng + ?Sized>(
        &mut self,
        tree: &DeckTree,
        randomize: bool,
        rng: &mut R,
    ) -> Option<CardLocation> {
        let stop_at = tree.deck(self.boundary)?.parent();

        loop {
            let deck = tree.deck(self.current)?;

            if deck.has_own_cards() {
                return select_card(tree, self.current, randomize, rng);
            }

            if deck.rollup() == 0 {
                if deck.parent() == stop_at {
                    tracing::debug!(boundary = self.boundary.index(), "Deck subtree exhausted");
                    return None;
                }
                self.current = deck.parent()?;
                continue;
            }

            let child = deck
                .children()
                .iter()
                .copied()
                .find(|child| tree.deck(*child).map_or(false, |d| d.rollup() > 0));
            match child {
                Some(child) => self.current = child,
                None => {
                    tracing::debug!(
                        deck = self.current.index(),
                        "Rollup count without queued descendants"
                    );
                    return None;
                }
            }
        }
    }
}

/// Pick a card from a deck's own queues: due before new.
///
/// With `randomize` the index within the queue is uniform; otherwise the
/// head is taken. A random new pick is moved back to the earliest card of
/// the contiguous run of its siblings, so siblings come up in source order.
pub fn select_card<R: Rng + ?Sized>(
    tree: &DeckTree,
    deck_id: DeckId,
    randomize: bool,
    rng: &mut R,
) -> Option<CardLocation> {
    let deck = tree.deck(deck_id)?;

    let (queue, cards) = if !deck.due_queue().is_empty() {
        (QueueKind::Due, deck.due_queue())
    } else if !deck.new_queue().is_empty() {
        (QueueKind::New, deck.new_queue())
    } else {
        return None;
    };

    let mut index = if randomize { rng.gen_range(0..cards.len()) } else { 0 };

    if randomize && queue == QueueKind::New {
        let picked = &cards[index];
        while index > 0 {
            let previous = cards[index - 1].id;
            if previous == picked.id || picked.is_sibling_of(previous) {
                index -= 1;
            } else {
                break;
            }
        }
    }

    Some(CardLocation {
        deck: deck_id,
        queue,
        index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Card, CardId};
    use chrono::{Duration, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn due_card(id: u64, path: &[&str]) -> Card {
        let now = Utc::now();
        Card::new(id, path.iter().copied()).scheduled(now - Duration::days(1), 5.0, 250, now)
    }

    fn new_card(id: u64, path: &[&str]) -> Card {
        Card::new(id, path.iter().copied())
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    /// Pull cards until the cursor reports the end, removing each one.
    fn drain(tree: &mut DeckTree, boundary: DeckId, randomize: bool) -> Vec<CardId> {
        let mut cursor = DeckCursor::new(boundary);
        let mut rng = rng();
        let mut seen = Vec::new();
        while let Some(location) = cursor.next(tree, randomize, &mut rng) {
            let card = tree.take(location).expect("cursor pointed at a queued card");
            seen.push(card.id);
        }
        seen
    }

    #[test]
    fn test_due_before_new_in_order() {
        let cards = vec![new_card(1, &["A"]), due_card(2, &["A"]), new_card(3, &["A"])];
        let mut tree = DeckTree::from_cards(cards);
        let a = tree.find(&["A"]).unwrap();
        assert_eq!(drain(&mut tree, a, false), vec![CardId(2), CardId(1), CardId(3)]);
    }

    #[test]
    fn test_own_cards_then_children_depth_first() {
        let mut tree = DeckTree::from_cards(vec![
            new_card(1, &["A", "Y"]),
            new_card(2, &["A", "X", "Deep"]),
            new_card(3, &["A"]),
            new_card(4, &["A", "X"]),
        ]);
        let seen = drain(&mut tree, DeckId::ROOT, false);
        assert_eq!(seen, vec![CardId(3), CardId(4), CardId(2), CardId(1)]);
        assert_eq!(tree.deck(DeckId::ROOT).unwrap().rollup(), 0);
    }

    #[test]
    fn test_boundary_limits_session() {
        let mut tree = DeckTree::from_cards(vec![
            new_card(1, &["A", "X"]),
            new_card(2, &["A", "Y"]),
            new_card(3, &["B"]),
        ]);
        let a = tree.find(&["A"]).unwrap();
        let seen = drain(&mut tree, a, false);
        assert_eq!(seen, vec![CardId(1), CardId(2)]);
        let root = tree.deck(DeckId::ROOT).unwrap();
        assert_eq!(root.new_count(), 1, "cards outside the boundary stay queued");
    }

    #[test]
    fn test_leaf_boundary_ends_when_empty() {
        let mut tree = DeckTree::from_cards(vec![new_card(1, &["A", "X"]), new_card(2, &["A"])]);
        let x = tree.find(&["A", "X"]).unwrap();
        assert_eq!(drain(&mut tree, x, false), vec![CardId(1)]);

        let mut cursor = DeckCursor::new(x);
        assert!(cursor.next(&tree, false, &mut rng()).is_none());
    }

    #[test]
    fn test_empty_tree_ends_immediately() {
        let tree = DeckTree::new();
        let mut cursor = DeckCursor::new(DeckId::ROOT);
        assert!(cursor.next(&tree, true, &mut rng()).is_none());
    }

    #[test]
    fn test_randomized_drain_visits_every_card_once() {
        let cards: Vec<Card> = (1..=20)
            .map(|id| {
                let path: &[&str] = if id % 3 == 0 { &["A", "B"] } else { &["A"] };
                if id % 2 == 0 {
                    due_card(id, path)
                } else {
                    new_card(id, path)
                }
            })
            .collect();
        let mut tree = DeckTree::from_cards(cards);
        let mut seen = drain(&mut tree, DeckId::ROOT, true);
        seen.sort();
        assert_eq!(seen, (1..=20).map(CardId).collect::<Vec<_>>());
    }

    #[test]
    fn test_random_new_pick_prefers_earliest_sibling() {
        let group = [CardId(1), CardId(2), CardId(3)];
        let mut tree = DeckTree::new();
        tree.create_deck(&["A"]);
        for id in 1..=3 {
            tree.insert_flashcard(&["A"], new_card(id, &["A"]).with_siblings(group)).unwrap();
        }
        let a = tree.find(&["A"]).unwrap();

        let mut rng = rng();
        for _ in 0..10 {
            let location = select_card(&tree, a, true, &mut rng).unwrap();
            assert_eq!(location.index, 0, "sibling run must start at its first card");
        }
    }
}
