//! The player's hand and draw queue.
//!
//! Playing a card swaps it for the head of the queue and sends it to the
//! back, so the deck cycles forever.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{ActionError, ActionResult};

/// Cards held at once.
pub const HAND_SIZE: usize = 4;

/// Hand of playable cards plus the queue behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    hand: Vec<String>,
    queue: VecDeque<String>,
}

impl Deck {
    /// Deal the first [`HAND_SIZE`] cards into the hand.
    #[must_use]
    pub fn new(cards: &[String]) -> Self {
        let split = cards.len().min(HAND_SIZE);
        Self {
            hand: cards[..split].to_vec(),
            queue: cards[split..].iter().cloned().collect(),
        }
    }

    /// Cards currently playable, in slot order.
    #[must_use]
    pub fn hand(&self) -> &[String] {
        &self.hand
    }

    /// Cards waiting, head first.
    pub fn queue(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    /// The card that will replace the next one played.
    #[must_use]
    pub fn next_card(&self) -> Option<&str> {
        self.queue.front().map(String::as_str)
    }

    /// Whether `card` is in hand.
    #[must_use]
    pub fn holds(&self, card: &str) -> bool {
        self.hand.iter().any(|c| c == card)
    }

    /// Check that `card` can be played without cycling.
    ///
    /// # Errors
    ///
    /// `CardNotInHand` if it is not held.
    pub fn check(&self, card: &str) -> ActionResult<()> {
        if self.holds(card) {
            Ok(())
        } else {
            Err(ActionError::CardNotInHand(card.to_string()))
        }
    }

    /// Play `card`: refill its slot from the queue and queue it at the back.
    ///
    /// # Errors
    ///
    /// `CardNotInHand` if it is not held.
    pub fn play(&mut self, card: &str) -> ActionResult<()> {
        let slot = self
            .hand
            .iter()
            .position(|c| c == card)
            .ok_or_else(|| ActionError::CardNotInHand(card.to_string()))?;
        if let Some(next) = self.queue.pop_front() {
            let played = std::mem::replace(&mut self.hand[slot], next);
            self.queue.push_back(played);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("c{i}")).collect()
    }

    #[test]
    fn test_initial_deal() {
        let deck = Deck::new(&cards(6));
        assert_eq!(deck.hand(), &cards(6)[..4]);
        assert_eq!(deck.next_card(), Some("c4"));
    }

    #[test]
    fn test_play_cycles_card() {
        let mut deck = Deck::new(&cards(6));
        deck.play("c1").unwrap();
        assert_eq!(deck.hand(), &["c0", "c4", "c2", "c3"]);
        assert_eq!(deck.queue().collect::<Vec<_>>(), vec!["c5", "c1"]);
    }

    #[test]
    fn test_play_missing_card_rejected() {
        let mut deck = Deck::new(&cards(6));
        let before = deck.clone();
        assert_eq!(
            deck.play("c5"),
            Err(ActionError::CardNotInHand("c5".into()))
        );
        assert_eq!(deck, before);
    }

    #[test]
    fn test_exact_hand_size_keeps_card() {
        let mut deck = Deck::new(&cards(4));
        deck.play("c2").unwrap();
        assert!(deck.holds("c2"));
    }
}
