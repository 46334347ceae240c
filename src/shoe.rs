//! The shoe: a consumable, shufflable multi-deck card source.

use rand::RngCore;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::card::{Card, DECK_SIZE, RANKS, SUITS};

/// A multi-deck shoe with penetration-triggered reshuffling.
///
/// Cards are drawn from the head of an internally-maintained ordered
/// sequence. `needs_shuffle` becomes (and stays) true once the dealt
/// fraction reaches `penetration`, until the next `shuffle` resets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shoe {
    num_decks: u8,
    penetration: f64,
    cards: Vec<Card>,
    total_cards: usize,
}

impl Shoe {
    /// Creates a new shoe with `num_decks` full decks, shuffled using the
    /// given random source.
    ///
    /// # Panics
    ///
    /// Panics if `num_decks` is not in `1..=8` or `penetration` is not in
    /// `(0.0, 1.0]`.
    #[must_use]
    pub fn new(num_decks: u8, penetration: f64, rng: &mut dyn RngCore) -> Self {
        assert!((1..=8).contains(&num_decks), "num_decks must be in 1..=8");
        assert!(
            penetration > 0.0 && penetration <= 1.0,
            "penetration must be in (0.0, 1.0]"
        );

        let total_cards = usize::from(num_decks) * DECK_SIZE;
        let mut shoe = Self {
            num_decks,
            penetration,
            cards: Vec::with_capacity(total_cards),
            total_cards,
        };
        shoe.shuffle(rng);
        shoe
    }

    /// Rebuilds a shoe around an already-known card sequence (e.g. one
    /// read back from a [`crate::serialize::GameSnapshot`]), bypassing the
    /// full-composition shuffle `new` performs.
    #[must_use]
    pub fn from_cards(num_decks: u8, penetration: f64, cards: Vec<Card>) -> Self {
        let total_cards = usize::from(num_decks) * DECK_SIZE;
        Self {
            num_decks,
            penetration,
            cards,
            total_cards,
        }
    }

    /// Restores full composition and shuffles uniformly at random.
    pub fn shuffle(&mut self, rng: &mut dyn RngCore) {
        self.cards.clear();
        for _ in 0..self.num_decks {
            for suit in SUITS {
                for rank in RANKS {
                    self.cards.push(Card::new(rank, suit));
                }
            }
        }
        // `SliceRandom::shuffle` wants a `Rng: ?Sized`-friendly impl; a
        // `&mut dyn RngCore` satisfies `RngCore` so this still works.
        self.cards.shuffle(rng);
    }

    /// Draws (removes and returns) one card from the head of the shoe.
    ///
    /// # Panics
    ///
    /// Panics if the shoe is empty. Callers must check `cards_remaining`
    /// (or rely on the engine, which always shuffles before a round would
    /// exhaust the shoe) — drawing from empty is a programmer error, not
    /// a recoverable one.
    pub fn draw(&mut self) -> Card {
        self.cards.pop().expect("draw from an empty shoe")
    }

    /// Number of decks this shoe was built with.
    #[must_use]
    pub const fn num_decks(&self) -> u8 {
        self.num_decks
    }

    /// Configured penetration fraction.
    #[must_use]
    pub const fn penetration(&self) -> f64 {
        self.penetration
    }

    /// Number of cards left undealt.
    #[must_use]
    pub fn cards_remaining(&self) -> usize {
        self.cards.len()
    }

    /// Remaining cards, in draw order (the card returned by the next
    /// `draw` is the *last* element). Used by the serializer.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Whether the dealt fraction has reached `penetration`. Monotonic
    /// within a shoe until the next `shuffle`.
    #[must_use]
    pub fn needs_shuffle(&self) -> bool {
        let dealt = self.total_cards - self.cards.len();
        #[expect(
            clippy::cast_precision_loss,
            reason = "card counts are small; f64 has ample precision here"
        )]
        let dealt_fraction = dealt as f64 / self.total_cards as f64;
        dealt_fraction >= self.penetration
    }
}
