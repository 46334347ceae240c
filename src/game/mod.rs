//! Game engine: the round-scoped state machine described in full by the
//! submodules `bet`, `actions`, `insurance`, `dealer`, and `resolve`.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::card::Card;
use crate::event::{EventEmitter, EventType};
use crate::hand::Hand;
use crate::rules::{RuleSet, RuleSetError};
use crate::shoe::Shoe;
use crate::sync::Mutex;

mod actions;
mod bet;
mod dealer;
mod insurance;
pub mod resolve;
pub mod state;

pub use state::{GameState, TurnPosition};

/// The single player's hands, position, and money.
///
/// At most one hand is ever "active" (the
/// one at `current_hand_index`); an index past the end of `hands` means
/// the player's turn is over and play moves to the dealer or resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    /// The player's hands this round, in split order.
    pub hands: Vec<Hand>,
    /// Index into `hands` of the hand currently being played.
    pub current_hand_index: usize,
    /// The player's exact-decimal bankroll.
    pub bankroll: Decimal,
    /// The player's insurance bet for the current round, zero if none.
    pub insurance_bet: Decimal,
    /// Bankroll snapshot taken the instant the current round's bet was
    /// accepted, used to compute `ROUND_ENDED.result` as the net change
    /// relative to the bankroll the player held before wagering anything
    /// this round (main bet, doubles, splits, and insurance alike).
    pub round_start_bankroll: Decimal,
}

impl PlayerState {
    fn new(bankroll: Decimal) -> Self {
        Self {
            hands: Vec::new(),
            current_hand_index: 0,
            bankroll,
            insurance_bet: Decimal::ZERO,
            round_start_bankroll: bankroll,
        }
    }

    /// The hand currently being played, if the turn index still points at
    /// one.
    #[must_use]
    pub fn active_hand(&self) -> Option<&Hand> {
        self.hands.get(self.current_hand_index)
    }
}

/// A round-scoped blackjack engine.
///
/// Owns the shoe, the single player's hands and bankroll, the dealer's
/// hand, and the event emitter. Every operation is synchronous and atomic:
/// it either fully applies (mutating state and emitting every resulting
/// event) or is rejected outright, leaving every field bit-identical to
/// its pre-call value. Fields are wrapped in the poison-recovering
/// [`Mutex`] so the engine can be shared (e.g. behind an `Arc`) without an
/// exclusive borrow for every call, even though exactly one logical actor
/// ever drives a given instance at a time.
pub struct Game {
    rules: RuleSet,
    shoe: Mutex<Shoe>,
    state: Mutex<GameState>,
    player: Mutex<PlayerState>,
    dealer_hand: Mutex<Hand>,
    dealer_hole_revealed: Mutex<bool>,
    insurance_decided: Mutex<bool>,
    rng: Mutex<ChaCha8Rng>,
    events: Mutex<EventEmitter>,
}

impl Game {
    /// Creates a new engine with the given rules, starting bankroll, and
    /// RNG seed.
    ///
    /// # Errors
    ///
    /// Returns the [`RuleSetError`] from `rules.validate()` if the rules
    /// are internally inconsistent.
    pub fn new(rules: RuleSet, bankroll: Decimal, seed: u64) -> Result<Self, RuleSetError> {
        rules.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let shoe = Shoe::new(rules.num_decks, rules.penetration, &mut rng);
        Ok(Self {
            rules,
            shoe: Mutex::new(shoe),
            state: Mutex::new(GameState::WaitingForBet),
            player: Mutex::new(PlayerState::new(bankroll)),
            dealer_hand: Mutex::new(Hand::new(Decimal::ZERO)),
            dealer_hole_revealed: Mutex::new(false),
            insurance_decided: Mutex::new(false),
            rng: Mutex::new(rng),
            events: Mutex::new(EventEmitter::default()),
        })
    }

    /// Rebuilds an engine from a previously serialized snapshot (see
    /// `crate::serialize`). The RNG is reseeded fresh rather than
    /// restored bit-for-bit: only future shuffles depend on it, and the
    /// shoe's current card order is carried over verbatim.
    #[must_use]
    #[expect(clippy::too_many_arguments, reason = "mirrors the snapshot's field set one-to-one")]
    pub fn restore(
        rules: RuleSet,
        seed: u64,
        shoe: Shoe,
        state: GameState,
        player: PlayerState,
        dealer_hand: Hand,
        dealer_hole_revealed: bool,
        insurance_decided: bool,
    ) -> Self {
        Self {
            rules,
            shoe: Mutex::new(shoe),
            state: Mutex::new(state),
            player: Mutex::new(player),
            dealer_hand: Mutex::new(dealer_hand),
            dealer_hole_revealed: Mutex::new(dealer_hole_revealed),
            insurance_decided: Mutex::new(insurance_decided),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            events: Mutex::new(EventEmitter::default()),
        }
    }

    /// The table rules this engine was constructed with.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The current phase of the round.
    #[must_use]
    pub fn state(&self) -> GameState {
        *self.state.lock()
    }

    /// The player's current bankroll.
    #[must_use]
    pub fn bankroll(&self) -> Decimal {
        self.player.lock().bankroll
    }

    /// A clone of the player's current hands.
    #[must_use]
    pub fn player_hands(&self) -> Vec<Hand> {
        self.player.lock().hands.clone()
    }

    /// Index of the hand currently being played.
    #[must_use]
    pub fn current_hand_index(&self) -> usize {
        self.player.lock().current_hand_index
    }

    /// The player's insurance bet for the current round.
    #[must_use]
    pub fn insurance_bet(&self) -> Decimal {
        self.player.lock().insurance_bet
    }

    /// A clone of the dealer's full hand, including the hole card
    /// regardless of whether it has been revealed. Intended for
    /// persistence (see `crate::serialize`), not for forwarding to an
    /// untrusted transport before `DEALER_REVEALS`.
    #[must_use]
    pub fn dealer_hand(&self) -> Hand {
        self.dealer_hand.lock().clone()
    }

    /// Whether the dealer's hole card has been revealed this round.
    #[must_use]
    pub fn dealer_hole_revealed(&self) -> bool {
        *self.dealer_hole_revealed.lock()
    }

    /// Whether an insurance decision has been made this round.
    #[must_use]
    pub fn insurance_decided(&self) -> bool {
        *self.insurance_decided.lock()
    }

    /// Bankroll snapshot taken when the current round's bet was accepted.
    #[must_use]
    pub fn round_start_bankroll(&self) -> Decimal {
        self.player.lock().round_start_bankroll
    }

    /// Cards remaining in the shoe, in draw order.
    #[must_use]
    pub fn shoe_cards(&self) -> Vec<Card> {
        self.shoe.lock().cards().to_vec()
    }

    /// The retained event history.
    #[must_use]
    pub fn event_history(&self) -> Vec<crate::event::GameEvent> {
        self.events.lock().history().to_vec()
    }

    /// Subscribes to events of `event_type`, or every event if `None`.
    pub fn subscribe(
        &self,
        event_type: Option<EventType>,
        callback: crate::event::Subscriber,
    ) {
        self.events.lock().subscribe(event_type, callback);
    }

    fn emit(&self, event_type: EventType, data: Map<String, Value>) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        self.events.lock().emit_new(event_type, data, timestamp);
    }

    fn draw(&self) -> Card {
        self.shoe.lock().draw()
    }

    pub(super) fn card_json(card: Card) -> Value {
        serde_json::to_value(card).expect("Card serialization is infallible")
    }

    /// Shuffles the shoe and emits `SHOE_SHUFFLED` if penetration has been
    /// reached. Called at the start of every `bet()`, before the first
    /// card of the round is dealt.
    fn reshuffle_if_needed(&self) {
        let needs_shuffle = self.shoe.lock().needs_shuffle();
        if needs_shuffle {
            let mut rng = self.rng.lock();
            self.shoe.lock().shuffle(&mut rng);
            drop(rng);
            debug!(num_decks = self.rules.num_decks, penetration = self.rules.penetration, "reshuffled shoe at penetration");
            self.emit(EventType::ShoeShuffled, Map::new());
        }
    }

    fn transition(&self, next: GameState) {
        let mut state = self.state.lock();
        debug_assert!(
            state.is_valid_transition(next),
            "illegal transition {state:?} -> {next:?}"
        );
        trace!(from = ?*state, to = ?next, "state transition");
        *state = next;
    }

    fn reject_invalid_action(&self, message: &str) {
        let mut data = Map::new();
        data.insert("message".to_owned(), Value::String(message.to_owned()));
        self.emit(EventType::InvalidAction, data);
    }

    fn reject_insufficient_funds(&self, required: Decimal, available: Decimal) {
        let mut data = Map::new();
        data.insert("required".to_owned(), Value::String(required.to_string()));
        data.insert(
            "available".to_owned(),
            Value::String(available.to_string()),
        );
        self.emit(EventType::InsufficientFunds, data);
    }

    /// Whether the active hand can be hit: `PLAYER_TURN`, hand exists, and
    /// is not already busted.
    #[must_use]
    pub fn can_hit(&self) -> bool {
        self.state() == GameState::PlayerTurn
            && self
                .player
                .lock()
                .active_hand()
                .is_some_and(|h| !h.is_busted())
    }

    /// Whether the active hand can stand: `PLAYER_TURN` with an active
    /// hand present.
    #[must_use]
    pub fn can_stand(&self) -> bool {
        self.state() == GameState::PlayerTurn && self.player.lock().active_hand().is_some()
    }

    /// Whether the active hand can be doubled down per the current rules.
    #[must_use]
    pub fn can_double(&self) -> bool {
        if self.state() != GameState::PlayerTurn {
            return false;
        }
        let player = self.player.lock();
        let Some(hand) = player.active_hand() else {
            return false;
        };
        hand.can_double()
            && (!hand.is_split_hand() || self.rules.double_after_split)
            && self.rules.double_on.allows(hand.value())
            && player.bankroll >= hand.bet()
    }

    /// Whether the active hand can be split per the current rules.
    #[must_use]
    pub fn can_split(&self) -> bool {
        if self.state() != GameState::PlayerTurn {
            return false;
        }
        let player = self.player.lock();
        if player.hands.len() >= usize::from(self.rules.max_splits) {
            return false;
        }
        let Some(hand) = player.active_hand() else {
            return false;
        };
        if !hand.is_pair() {
            return false;
        }
        let resplitting_aces = hand.cards()[0].is_ace() && hand.is_split_hand();
        if resplitting_aces && !self.rules.resplit_aces {
            return false;
        }
        player.bankroll >= hand.bet()
    }

    /// Whether the active hand can surrender per the current rules.
    #[must_use]
    pub fn can_surrender(&self) -> bool {
        if self.state() != GameState::PlayerTurn || self.rules.surrender == crate::rules::Surrender::None {
            return false;
        }
        let player = self.player.lock();
        player
            .active_hand()
            .is_some_and(|h| h.len() == 2 && !h.is_split_hand())
    }

    /// Whether insurance can currently be decided.
    #[must_use]
    pub fn can_insure(&self) -> bool {
        self.state() == GameState::OfferingInsurance && !*self.insurance_decided.lock()
    }
}
