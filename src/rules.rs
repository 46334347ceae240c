//! Table rules: the immutable value object that drives action legality and
//! payout calculation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conditions under which doubling down is allowed, keyed off the active
/// hand's current total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DoubleOn {
    /// Double down allowed on any total.
    Any,
    /// Double down allowed only on 9, 10, or 11.
    NineToEleven,
    /// Double down allowed only on 10 or 11.
    TenOrEleven,
}

impl DoubleOn {
    /// Whether doubling is permitted at the given hand total.
    #[must_use]
    pub const fn allows(self, total: u8) -> bool {
        match self {
            Self::Any => true,
            Self::NineToEleven => total >= 9 && total <= 11,
            Self::TenOrEleven => total == 10 || total == 11,
        }
    }
}

/// Surrender availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Surrender {
    /// Surrender is not offered at this table.
    None,
    /// Surrender is allowed before the dealer peeks for blackjack.
    Early,
    /// Surrender is allowed only after the dealer has checked for (and
    /// does not have) blackjack — the common US variant.
    Late,
}

/// Errors constructing an invalid [`RuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleSetError {
    /// `num_decks` was outside `1..=8`.
    #[error("num_decks must be between 1 and 8")]
    InvalidDeckCount,
    /// `min_bet` was not strictly positive, or exceeded `max_bet`.
    #[error("min_bet must be positive and not exceed max_bet")]
    InvalidBetRange,
    /// `blackjack_payout` was below 1.0 (a payout can never lose money
    /// relative to the original bet).
    #[error("blackjack_payout must be at least 1.0")]
    InvalidBlackjackPayout,
    /// `max_splits` was zero.
    #[error("max_splits must be at least 1")]
    InvalidMaxSplits,
    /// `penetration` was outside `(0.0, 1.0]`.
    #[error("penetration must be in (0.0, 1.0]")]
    InvalidPenetration,
}

/// Immutable table rules configuration.
///
/// Every field here affects either the legality of a player action or the
/// size of a payout; nothing here is mutated once a [`crate::game::Game`]
/// is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Number of decks in the shoe, 1-8.
    pub num_decks: u8,
    /// Minimum bet.
    pub min_bet: Decimal,
    /// Maximum bet.
    pub max_bet: Decimal,
    /// Whether the dealer hits on a soft 17 (H17) or stands (S17).
    pub dealer_hits_soft_17: bool,
    /// Blackjack payout ratio, typically 1.5 (3:2) or 1.2 (6:5).
    pub blackjack_payout: Decimal,
    /// Whether doubling down is allowed after a split (DAS).
    pub double_after_split: bool,
    /// Totals on which doubling down is permitted.
    pub double_on: DoubleOn,
    /// Whether a pair of split aces may be split again.
    pub resplit_aces: bool,
    /// Whether split aces may receive more than one card.
    pub hit_split_aces: bool,
    /// Maximum number of hands a player may reach by splitting.
    pub max_splits: u8,
    /// Surrender availability.
    pub surrender: Surrender,
    /// Whether insurance is offered when the dealer shows an ace.
    pub insurance_allowed: bool,
    /// Whether the dealer peeks for blackjack (US rules) or not (ENHC).
    pub dealer_peeks: bool,
    /// Deck penetration: fraction of the shoe dealt before a reshuffle is
    /// due.
    pub penetration: f64,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            num_decks: 6,
            min_bet: dec!(10),
            max_bet: dec!(1000),
            dealer_hits_soft_17: true,
            blackjack_payout: dec!(1.5),
            double_after_split: true,
            double_on: DoubleOn::Any,
            resplit_aces: false,
            hit_split_aces: false,
            max_splits: 4,
            surrender: Surrender::Late,
            insurance_allowed: true,
            dealer_peeks: true,
            penetration: 0.75,
        }
    }
}

impl RuleSet {
    /// Validates this rule set, returning an error describing the first
    /// violated invariant if any.
    ///
    /// # Errors
    ///
    /// See [`RuleSetError`] for the individual checks performed.
    pub fn validate(&self) -> Result<(), RuleSetError> {
        if self.num_decks < 1 || self.num_decks > 8 {
            return Err(RuleSetError::InvalidDeckCount);
        }
        if self.min_bet <= Decimal::ZERO || self.min_bet > self.max_bet {
            return Err(RuleSetError::InvalidBetRange);
        }
        if self.blackjack_payout < Decimal::ONE {
            return Err(RuleSetError::InvalidBlackjackPayout);
        }
        if self.max_splits < 1 {
            return Err(RuleSetError::InvalidMaxSplits);
        }
        if self.penetration <= 0.0 || self.penetration > 1.0 {
            return Err(RuleSetError::InvalidPenetration);
        }
        Ok(())
    }

    /// Standard Vegas Strip rules: 6 decks, S17, 3:2 blackjack, DAS, late
    /// surrender.
    #[must_use]
    pub fn vegas_strip() -> Self {
        Self {
            num_decks: 6,
            dealer_hits_soft_17: false,
            blackjack_payout: dec!(1.5),
            double_after_split: true,
            double_on: DoubleOn::Any,
            resplit_aces: false,
            surrender: Surrender::Late,
            ..Self::default()
        }
    }

    /// Downtown Las Vegas rules: typically H17.
    #[must_use]
    pub fn downtown_vegas() -> Self {
        Self {
            num_decks: 6,
            dealer_hits_soft_17: true,
            blackjack_payout: dec!(1.5),
            double_after_split: true,
            double_on: DoubleOn::Any,
            resplit_aces: false,
            surrender: Surrender::Late,
            ..Self::default()
        }
    }

    /// Single deck rules: no DAS, no surrender.
    #[must_use]
    pub fn single_deck() -> Self {
        Self {
            num_decks: 1,
            dealer_hits_soft_17: true,
            blackjack_payout: dec!(1.5),
            double_after_split: false,
            double_on: DoubleOn::Any,
            resplit_aces: false,
            surrender: Surrender::None,
            ..Self::default()
        }
    }

    /// Atlantic City rules: 8 decks, S17, late surrender.
    #[must_use]
    pub fn atlantic_city() -> Self {
        Self {
            num_decks: 8,
            dealer_hits_soft_17: false,
            blackjack_payout: dec!(1.5),
            double_after_split: true,
            double_on: DoubleOn::Any,
            resplit_aces: false,
            surrender: Surrender::Late,
            ..Self::default()
        }
    }
}
