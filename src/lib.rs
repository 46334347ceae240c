//! A round-scoped blackjack engine and session/persistence core for a
//! card-counting training server.
//!
//! [`game::Game`] administers one round at a time for a single player
//! against the dealer: betting, the opening deal, insurance, every player
//! action, dealer play, and payout resolution, emitting a precise
//! [`event::GameEvent`] stream throughout. The engine is synchronous and
//! single-threaded; [`session`] and [`transport`] provide the
//! asynchronous persistence and push-channel plumbing an HTTP or
//! WebSocket layer built on top of this crate would need, without this
//! crate depending on any particular transport framing.
//!
//! # Example
//!
//! ```
//! use bj_trainer::game::Game;
//! use bj_trainer::rules::RuleSet;
//! use rust_decimal_macros::dec;
//!
//! let game = Game::new(RuleSet::vegas_strip(), dec!(1000), 42).expect("valid rules");
//! game.bet(dec!(50)).expect("bet is within table limits and bankroll");
//! // The opening deal (and, for a natural or an immediate dealer
//! // blackjack, the whole round) has already run synchronously.
//! assert!(game.bankroll() <= dec!(950) || game.bankroll() > dec!(1000));
//! ```

pub mod card;
pub mod config;
pub mod error;
pub mod event;
pub mod game;
pub mod hand;
pub mod rules;
pub mod serialize;
pub mod session;
pub mod shoe;
mod sync;
pub mod transport;

pub use card::{Card, DECK_SIZE, Rank, Suit};
pub use config::AppConfig;
pub use error::{ActionError, BetError, InsuranceError, SessionError};
pub use event::{EventEmitter, EventType, GameEvent};
pub use game::{Game, GameState, PlayerState, TurnPosition};
pub use hand::Hand;
pub use rules::{DoubleOn, RuleSet, RuleSetError, Surrender};
pub use serialize::{GameSnapshot, PerformanceRecord, SessionRecord};
pub use session::{InMemorySessionStore, RedisSessionStore, SessionSigner, SessionStore};
pub use shoe::Shoe;
pub use transport::{Connection, ConnectionManager};
