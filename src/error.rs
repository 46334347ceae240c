//! Error types for game and session operations.

use thiserror::Error;

/// Errors that can occur when placing a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BetError {
    /// The bet is below `RuleSet::min_bet` or above `RuleSet::max_bet`.
    #[error("bet is outside the table's allowed range")]
    OutsideTableLimits,
    /// The bankroll cannot cover the requested bet.
    #[error("insufficient funds")]
    InsufficientFunds,
    /// A bet cannot be placed from the current game state.
    #[error("invalid game state for betting")]
    InvalidState,
}

/// Errors that can occur during a player action (hit, stand, double, split,
/// surrender).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    /// This action cannot be taken from the current game state.
    #[error("invalid game state for this action")]
    InvalidState,
    /// The currently active hand has already resolved (busted, stood,
    /// doubled, or surrendered) and cannot act again.
    #[error("hand is not active")]
    HandNotActive,
    /// Doubling down is not legal here (wrong card count, rule-disallowed
    /// total, or split hand with DAS off).
    #[error("cannot double down on this hand")]
    CannotDouble,
    /// Splitting is not legal here (not a pair, or the split limit has
    /// been reached).
    #[error("cannot split this hand")]
    CannotSplit,
    /// The configured `max_splits` has already been reached.
    #[error("maximum splits reached")]
    MaxSplitsReached,
    /// Surrender is not offered, or is no longer available at this point
    /// in the hand.
    #[error("cannot surrender at this point")]
    CannotSurrender,
    /// The bankroll cannot cover doubling or splitting the current bet.
    #[error("insufficient funds for this action")]
    InsufficientFunds,
}

/// Errors that can occur during an insurance decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsuranceError {
    /// Insurance cannot be decided from the current game state.
    #[error("invalid game state for insurance")]
    InvalidState,
    /// The bankroll cannot cover half the original bet.
    #[error("insufficient funds for insurance")]
    InsufficientFunds,
    /// An insurance decision has already been made for this round.
    #[error("insurance decision already made")]
    AlreadyDecided,
}

/// Errors surfaced by the session store and signer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No session exists for the given identifier, or it has expired.
    #[error("unknown or expired session")]
    UnknownSession,
    /// The signed token's signature did not verify.
    #[error("session token signature is invalid")]
    InvalidSignature,
    /// The signed token's embedded timestamp is older than the
    /// configured max age.
    #[error("session token has expired")]
    TokenExpired,
    /// The token was not validly formatted base64/UTF-8/JSON.
    #[error("malformed session token")]
    MalformedToken,
    /// The persisted session record failed to (de)serialize.
    #[error("session record is corrupt: {0}")]
    CorruptRecord(String),
    /// The underlying store (e.g. Redis) returned an error.
    #[error("session store backend error: {0}")]
    Backend(String),
}
