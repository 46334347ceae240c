//! Game state machine: the tagged variant and its adjacency graph.
//!
//! A library-driven transition table is the natural fit when edges alone
//! decide legality; here legality depends on rules, bankroll, and hand
//! contents as well, so each transition is driven by the operation methods
//! on [`crate::game::Game`] rather than a generic `advance(trigger)`
//! dispatcher. `is_valid_transition` still exists as the single source of
//! truth for which edges exist at all, and every state-changing method
//! routes through it.

/// The phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    /// No round in progress; a bet will start one.
    WaitingForBet,
    /// The opening four cards are being dealt.
    Dealing,
    /// The dealer shows an ace and the player must decide on insurance.
    OfferingInsurance,
    /// The player is acting on the hand at `current_hand_index`.
    PlayerTurn,
    /// The dealer is drawing to its own hand.
    DealerTurn,
    /// Hands are being compared against the dealer and payouts computed.
    Resolving,
    /// The round is settled; a new bet returns to `WaitingForBet`.
    RoundComplete,
    /// The bankroll fell below the table minimum; terminal.
    GameOver,
}

impl GameState {
    /// Whether `self → next` is an edge in the round's state graph.
    #[must_use]
    pub const fn is_valid_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::WaitingForBet, Self::Dealing | Self::GameOver)
                | (
                    Self::Dealing,
                    Self::PlayerTurn | Self::OfferingInsurance | Self::Resolving
                )
                | (Self::OfferingInsurance, Self::PlayerTurn | Self::Resolving)
                | (
                    Self::PlayerTurn,
                    Self::PlayerTurn | Self::DealerTurn | Self::Resolving
                )
                | (Self::DealerTurn, Self::Resolving)
                | (Self::Resolving, Self::RoundComplete)
                | (Self::RoundComplete, Self::WaitingForBet | Self::GameOver)
        )
    }

    /// Whether this state is terminal (no outgoing edges).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver)
    }
}

/// Identifies the hand a player action currently targets.
///
/// Only `hand_index` varies within a round (there is exactly one player in
/// scope per the single-player Non-goal); this stays a distinct type
/// rather than a bare `usize` so call sites read as "which hand", not
/// "which number".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnPosition {
    /// Index into the player's hand list.
    pub hand_index: usize,
}
