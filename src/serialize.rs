//! Portable round snapshots and the session record they are embedded in.
//!
//! A [`GameSnapshot`] captures everything [`crate::game::Game::restore`]
//! needs to resume a round exactly where it left off, short of the RNG's
//! internal state (future shuffles reseed from a fresh draw, per the
//! engine's own design note). Round-tripping a snapshot through
//! `serde_json` must reproduce a bit-identical [`GameSnapshot`].

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::game::{Game, GameState, PlayerState};
use crate::hand::Hand;
use crate::rules::RuleSet;
use crate::shoe::Shoe;

/// A complete, serializable snapshot of one [`Game`]'s round state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// The table rules this round is being played under.
    pub rules: RuleSet,
    /// Seed used to reseed the RNG on restore.
    pub seed: u64,
    /// The shoe's remaining cards, in draw order.
    pub shoe: Shoe,
    /// The current phase of the round.
    pub state: GameState,
    /// The player's hands, position, and bankroll.
    pub player: PlayerState,
    /// The dealer's hand, hole card included regardless of reveal state.
    pub dealer_hand: Hand,
    /// Whether the dealer's hole card has been revealed this round.
    pub dealer_hole_revealed: bool,
    /// Whether an insurance decision has been made this round.
    pub insurance_decided: bool,
}

impl GameSnapshot {
    /// Captures the current state of `game`.
    #[must_use]
    pub fn capture(game: &Game, seed: u64) -> Self {
        Self {
            rules: *game.rules(),
            seed,
            shoe: Shoe::from_cards(game.rules().num_decks, game.rules().penetration, game.shoe_cards()),
            state: game.state(),
            player: PlayerState {
                hands: game.player_hands(),
                current_hand_index: game.current_hand_index(),
                bankroll: game.bankroll(),
                insurance_bet: game.insurance_bet(),
                round_start_bankroll: game.round_start_bankroll(),
            },
            dealer_hand: game.dealer_hand(),
            dealer_hole_revealed: game.dealer_hole_revealed(),
            insurance_decided: game.insurance_decided(),
        }
    }

    /// Rebuilds a [`Game`] from this snapshot.
    #[must_use]
    pub fn restore(self) -> Game {
        Game::restore(
            self.rules,
            self.seed,
            self.shoe,
            self.state,
            self.player,
            self.dealer_hand,
            self.dealer_hole_revealed,
            self.insurance_decided,
        )
    }
}

/// Cards a transport may safely echo back to the player before
/// `DEALER_REVEALS`: every player card, plus only the dealer's visible
/// upcard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisibleDealerHand {
    /// The dealer's face-up upcard, if dealt yet.
    pub upcard: Option<Card>,
    /// Whether the hole card has been revealed (and is therefore safe to
    /// request separately).
    pub hole_revealed: bool,
}

/// A persisted session record: the round state plus metadata a store
/// needs for TTL and bookkeeping independent of game logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The embedded round snapshot.
    pub game: GameSnapshot,
    /// Running hand-result counters, surfaced to a training UI.
    pub performance: PerformanceRecord,
    /// Seconds since the Unix epoch when this session was first created.
    pub created_at: f64,
    /// Seconds since the Unix epoch of the most recent action.
    pub last_activity: f64,
}

/// Running tally of round outcomes for a session, independent of any
/// single round's [`GameSnapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Rounds won outright (including blackjack).
    pub wins: u64,
    /// Rounds lost (including bust and dealer blackjack).
    pub losses: u64,
    /// Rounds pushed.
    pub pushes: u64,
    /// Hands surrendered.
    pub surrenders: u64,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{GameSnapshot, SessionRecord, PerformanceRecord};
    use crate::game::Game;
    use crate::rules::RuleSet;

    #[test]
    fn snapshot_round_trips_through_json() {
        let game = Game::new(RuleSet::default(), dec!(1000), 7).expect("valid rules");
        let snapshot = GameSnapshot::capture(&game, 7);

        let json = serde_json::to_string(&snapshot).expect("serialize");
        let restored: GameSnapshot = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(snapshot, restored);
    }

    #[test]
    fn session_record_round_trips_through_json() {
        let game = Game::new(RuleSet::default(), dec!(1000), 11).expect("valid rules");
        let record = SessionRecord {
            game: GameSnapshot::capture(&game, 11),
            performance: PerformanceRecord { wins: 3, losses: 2, pushes: 1, surrenders: 0 },
            created_at: 1_700_000_000.0,
            last_activity: 1_700_000_050.0,
        };

        let json = serde_json::to_string(&record).expect("serialize");
        let restored: SessionRecord = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(record.game, restored.game);
        assert_eq!(record.performance, restored.performance);
    }
}
