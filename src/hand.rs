//! Player and dealer hand representations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::card::Card;

/// Computes `(value, is_soft)` for a slice of cards: the best total ≤ 21
/// treating aces as 11 where possible, else 1; `is_soft` is true iff at
/// least one ace is still counted as 11 in the returned value.
fn evaluate_cards(cards: &[Card]) -> (u8, bool) {
    let mut value: u16 = 0;
    let mut aces: u8 = 0;

    for card in cards {
        if card.is_ace() {
            aces += 1;
        }
        value += u16::from(card.rank.base_value());
    }

    let mut soft_aces = aces;
    while value > 21 && soft_aces > 0 {
        value -= 10;
        soft_aces -= 1;
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "at most 21 aces plus tens are ever dealt into one hand; value fits in u8 well before overflow"
    )]
    let total = value as u8;
    let is_soft = soft_aces > 0 && total <= 21;
    (total, is_soft)
}

/// A hand of cards, held by the player or the dealer.
///
/// Owns its own bet and flags; split hands and the dealer's hand are both
/// represented by this type. `is_blackjack` is only ever true for a hand
/// dealt its opening two cards — a hand created by a split is marked
/// `is_split_hand` and can never report blackjack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
    bet: Decimal,
    is_doubled: bool,
    is_split_hand: bool,
    is_surrendered: bool,
}

impl Hand {
    /// Creates a new empty hand with the given bet.
    #[must_use]
    pub fn new(bet: Decimal) -> Self {
        Self {
            cards: Vec::new(),
            bet,
            is_doubled: false,
            is_split_hand: false,
            is_surrendered: false,
        }
    }

    /// Creates a new hand from a split, seeded with the one card it kept.
    #[must_use]
    pub fn from_split(card: Card, bet: Decimal) -> Self {
        Self {
            cards: vec![card],
            bet,
            is_doubled: false,
            is_split_hand: true,
            is_surrendered: false,
        }
    }

    /// Adds a card to the hand.
    ///
    /// # Panics
    ///
    /// Panics (debug builds) if the hand has already surrendered — once
    /// surrendered, a hand must never receive further cards.
    pub fn add_card(&mut self, card: Card) {
        debug_assert!(!self.is_surrendered, "cannot deal into a surrendered hand");
        self.cards.push(card);
    }

    /// Returns the cards in the hand.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Returns the number of cards in the hand.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns whether the hand has no cards yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Returns the current bet for this hand.
    #[must_use]
    pub const fn bet(&self) -> Decimal {
        self.bet
    }

    /// Doubles this hand's bet (used by `double_down`).
    pub fn double_bet(&mut self) {
        self.bet += self.bet;
        self.is_doubled = true;
    }

    /// Returns whether this hand has been doubled down.
    #[must_use]
    pub const fn is_doubled(&self) -> bool {
        self.is_doubled
    }

    /// Returns whether this hand originated from a split.
    #[must_use]
    pub const fn is_split_hand(&self) -> bool {
        self.is_split_hand
    }

    /// Marks this hand as split-originated (used when creating the
    /// original hand's sibling during a `split`).
    pub fn mark_split_hand(&mut self) {
        self.is_split_hand = true;
    }

    /// Returns whether this hand has surrendered.
    #[must_use]
    pub const fn is_surrendered(&self) -> bool {
        self.is_surrendered
    }

    /// Marks this hand as surrendered. No further cards may be dealt and
    /// the bet must not be mutated again.
    pub fn surrender(&mut self) {
        self.is_surrendered = true;
    }

    /// Removes and returns the second card, for use when splitting a pair.
    pub fn take_split_card(&mut self) -> Option<Card> {
        if self.cards.len() == 2 { self.cards.pop() } else { None }
    }

    /// The best total ≤ 21 treating aces as 11 where possible, else the
    /// minimum bust total.
    #[must_use]
    pub fn value(&self) -> u8 {
        evaluate_cards(&self.cards).0
    }

    /// Whether at least one ace is currently counted as 11.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        evaluate_cards(&self.cards).1
    }

    /// A two-card hand totalling 21 on the opening deal. Never true for a
    /// split hand, even if it happens to total 21 with two cards.
    #[must_use]
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.value() == 21 && !self.is_split_hand
    }

    /// Whether the hand's value exceeds 21.
    #[must_use]
    pub fn is_busted(&self) -> bool {
        self.value() > 21
    }

    /// Whether the hand is exactly two cards of equal rank for
    /// pair-splitting purposes (all ten-valued ranks are equivalent).
    #[must_use]
    pub fn is_pair(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank.pair_group() == self.cards[1].rank.pair_group()
    }

    /// Whether this hand is eligible to double down: exactly two cards,
    /// not already doubled, not surrendered. Rule-dependent restrictions
    /// (double-on totals, double-after-split) are checked by the engine.
    #[must_use]
    pub fn can_double(&self) -> bool {
        self.cards.len() == 2 && !self.is_doubled && !self.is_surrendered
    }
}
