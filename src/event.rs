//! Event model: the append-only stream of domain events a [`crate::game::Game`]
//! emits as play progresses, plus the subscription machinery that lets a
//! transport layer observe them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kind of domain event a [`GameEvent`] carries.
///
/// Variants mirror the phases of a round: dealing, player decisions, the
/// dealer's play, resolution, and the two rejection events a caller sees
/// when an operation returns `accepted: false`. The wire name (used by
/// `serde`) matches the event vocabulary transports and subscribers key
/// off of, independent of Rust's naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// A new round has started, right after the opening four cards are
    /// dealt.
    #[serde(rename = "ROUND_STARTED")]
    RoundStarted,
    /// The round has been fully resolved and payouts settled.
    #[serde(rename = "ROUND_ENDED")]
    RoundEnded,
    /// The bankroll fell below the table minimum; the game is over.
    #[serde(rename = "GAME_ENDED")]
    GameEnded,
    /// The shoe was reshuffled because penetration was reached.
    #[serde(rename = "SHOE_SHUFFLED")]
    ShoeShuffled,
    /// A card was dealt, to either the player or the dealer.
    #[serde(rename = "CARD_DEALT")]
    CardDealt,
    /// A bet was accepted and a round is starting.
    #[serde(rename = "BET_PLACED")]
    BetPlaced,
    /// Insurance was offered because the dealer shows an ace.
    #[serde(rename = "INSURANCE_OFFERED")]
    InsuranceOffered,
    /// The player took insurance.
    #[serde(rename = "INSURANCE_TAKEN")]
    InsuranceTaken,
    /// The player declined insurance.
    #[serde(rename = "INSURANCE_DECLINED")]
    InsuranceDeclined,
    /// Insurance paid out because the dealer had blackjack.
    #[serde(rename = "INSURANCE_WINS")]
    InsuranceWins,
    /// Insurance lost because the dealer did not have blackjack.
    #[serde(rename = "INSURANCE_LOSES")]
    InsuranceLoses,
    /// The player hit.
    #[serde(rename = "PLAYER_HIT")]
    PlayerHit,
    /// The player stood.
    #[serde(rename = "PLAYER_STAND")]
    PlayerStand,
    /// The player doubled down.
    #[serde(rename = "PLAYER_DOUBLE")]
    PlayerDouble,
    /// The player split a pair.
    #[serde(rename = "PLAYER_SPLIT")]
    PlayerSplit,
    /// The player surrendered.
    #[serde(rename = "PLAYER_SURRENDER")]
    PlayerSurrender,
    /// The player's opening hand is a natural blackjack.
    #[serde(rename = "PLAYER_BLACKJACK")]
    PlayerBlackjack,
    /// A player hand busted.
    #[serde(rename = "PLAYER_BUSTS")]
    PlayerBusts,
    /// The dealer revealed the hole card.
    #[serde(rename = "DEALER_REVEALS")]
    DealerReveals,
    /// The dealer hit.
    #[serde(rename = "DEALER_HITS")]
    DealerHits,
    /// The dealer stood.
    #[serde(rename = "DEALER_STANDS")]
    DealerStands,
    /// The dealer busted.
    #[serde(rename = "DEALER_BUSTS")]
    DealerBusts,
    /// The dealer's opening hand is a natural blackjack.
    #[serde(rename = "DEALER_BLACKJACK")]
    DealerBlackjack,
    /// A player hand beat the dealer.
    #[serde(rename = "PLAYER_WINS")]
    PlayerWins,
    /// A player hand lost to the dealer.
    #[serde(rename = "PLAYER_LOSES")]
    PlayerLoses,
    /// A player hand tied the dealer.
    #[serde(rename = "PUSH")]
    Push,
    /// An operation was rejected because it is illegal in the current
    /// state or against the current rules.
    #[serde(rename = "INVALID_ACTION")]
    InvalidAction,
    /// An operation was rejected because the bankroll cannot cover it.
    #[serde(rename = "INSUFFICIENT_FUNDS")]
    InsufficientFunds,
}

/// The sentinel written into `CARD_DEALT.card` for the dealer's face-down
/// hole card, so a transport cannot infer the rank through type coercion.
pub const HIDDEN_CARD_SENTINEL: &str = "hidden";

/// A single emitted domain event.
///
/// `data` is a free-form JSON object rather than a per-variant payload
/// type: subscribers that only care about a handful of fields (transports
/// serializing to a wire format, a session log) can read it without
/// depending on every event's full Rust type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEvent {
    /// The kind of event.
    pub event_type: EventType,
    /// Event-specific data, keyed by field name.
    pub data: Map<String, Value>,
    /// Seconds since the Unix epoch when the event was emitted.
    pub timestamp: f64,
}

impl GameEvent {
    /// Creates a new event with the given type and data, timestamped by
    /// the caller (the engine itself reads the wall clock only for this
    /// field; every other part of round state is a pure function of
    /// inputs and the injected RNG).
    #[must_use]
    pub const fn new(event_type: EventType, data: Map<String, Value>, timestamp: f64) -> Self {
        Self {
            event_type,
            data,
            timestamp,
        }
    }
}

/// A subscription callback: invoked with each matching event as it is
/// emitted.
pub type Subscriber = Box<dyn FnMut(&GameEvent) + Send>;

struct Subscription {
    event_type: Option<EventType>,
    callback: Subscriber,
}

/// Default cap on retained event history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Publishes [`GameEvent`]s to subscribers and retains a bounded history.
///
/// Subscriptions are either typed (invoked only for a matching
/// [`EventType`]) or wildcard (invoked for every event, `event_type: None`
/// at subscribe time). History is a ring: once `capacity` is reached, the
/// oldest event is dropped to make room for the newest.
///
/// Subscriber callbacks must not call back into the emitting [`crate::game::Game`]
/// while dispatch is in progress; the engine's `Mutex` fields would
/// deadlock on reentrant access, matching the reentrancy note in the
/// engine's design notes.
pub struct EventEmitter {
    subscriptions: Vec<Subscription>,
    history: Vec<GameEvent>,
    capacity: usize,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscriptions", &self.subscriptions.len())
            .field("history", &self.history)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl EventEmitter {
    /// Creates a new emitter retaining at most `capacity` events of
    /// history.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            subscriptions: Vec::new(),
            history: Vec::new(),
            capacity,
        }
    }

    /// Subscribes to every event of `event_type`, or to all events if
    /// `event_type` is `None`. Returns nothing usable for unsubscription;
    /// callers needing that should retain their own handle and filter
    /// inside the callback.
    pub fn subscribe(&mut self, event_type: Option<EventType>, callback: Subscriber) {
        self.subscriptions.push(Subscription {
            event_type,
            callback,
        });
    }

    /// Removes every subscription, typed and wildcard alike.
    pub fn clear_subscriptions(&mut self) {
        self.subscriptions.clear();
    }

    /// Emits an already-constructed event: records it in history and
    /// invokes every matching subscriber in subscription order.
    pub fn emit(&mut self, event: GameEvent) {
        for sub in &mut self.subscriptions {
            if sub.event_type.is_none_or(|t| t == event.event_type) {
                (sub.callback)(&event);
            }
        }
        if self.history.len() == self.capacity {
            self.history.remove(0);
        }
        self.history.push(event);
    }

    /// Builds and emits an event in one step.
    pub fn emit_new(&mut self, event_type: EventType, data: Map<String, Value>, timestamp: f64) {
        self.emit(GameEvent::new(event_type, data, timestamp));
    }

    /// The retained event history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[GameEvent] {
        &self.history
    }

    /// Discards all retained history without affecting subscriptions.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{EventEmitter, EventType};
    use serde_json::Map;
    use std::sync::{Arc, Mutex};

    #[test]
    fn typed_subscriber_only_sees_matching_events() {
        let mut emitter = EventEmitter::default();
        let seen = Arc::new(Mutex::new(0));
        let seen_clone = Arc::clone(&seen);
        emitter.subscribe(
            Some(EventType::PlayerHit),
            Box::new(move |_| {
                *seen_clone.lock().expect("lock") += 1;
            }),
        );
        emitter.emit_new(EventType::PlayerStand, Map::new(), 0.0);
        emitter.emit_new(EventType::PlayerHit, Map::new(), 0.0);
        assert_eq!(*seen.lock().expect("lock"), 1);
    }

    #[test]
    fn wildcard_subscriber_sees_every_event() {
        let mut emitter = EventEmitter::default();
        let seen = Arc::new(Mutex::new(0));
        let seen_clone = Arc::clone(&seen);
        emitter.subscribe(
            None,
            Box::new(move |_| {
                *seen_clone.lock().expect("lock") += 1;
            }),
        );
        emitter.emit_new(EventType::PlayerStand, Map::new(), 0.0);
        emitter.emit_new(EventType::PlayerHit, Map::new(), 0.0);
        assert_eq!(*seen.lock().expect("lock"), 2);
    }

    #[test]
    fn history_is_bounded_and_drops_oldest() {
        let mut emitter = EventEmitter::new(2);
        emitter.emit_new(EventType::PlayerHit, Map::new(), 1.0);
        emitter.emit_new(EventType::PlayerStand, Map::new(), 2.0);
        emitter.emit_new(EventType::DealerHits, Map::new(), 3.0);
        let history = emitter.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].event_type, EventType::PlayerStand);
        assert_eq!(history[1].event_type, EventType::DealerHits);
    }
}
