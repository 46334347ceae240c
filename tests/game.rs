//! Round-level integration tests exercising the concrete scenarios and
//! invariants of a round against the public `Game` API.

use std::sync::{Arc, Mutex};

use bj_trainer::card::{Card, Rank, Suit};
use bj_trainer::event::{EventType, GameEvent};
use bj_trainer::game::{Game, GameState, PlayerState};
use bj_trainer::hand::Hand;
use bj_trainer::rules::{DoubleOn, RuleSet, Surrender};
use bj_trainer::shoe::Shoe;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Builds a one-deck `Game` whose shoe deals exactly `sequence`, in
/// order, before anything else. The remaining cards are filler that a
/// short test scenario never reaches, padded out to a full 52-card deck
/// so `penetration: 1.0` never fires a mid-test reshuffle.
fn rigged_game(rules: RuleSet, bankroll: Decimal, sequence: &[Card]) -> Game {
    assert!(rules.penetration >= 1.0, "rigged tests require penetration 1.0 to avoid a reshuffle clobbering the deck");
    assert_eq!(rules.num_decks, 1, "rigged tests assume a single-deck shoe");

    let filler = Card::new(Rank::Two, Suit::Clubs);
    let mut cards = vec![filler; 52 - sequence.len()];
    cards.extend(sequence.iter().rev().copied());

    let shoe = Shoe::from_cards(1, rules.penetration, cards);
    let player = PlayerState {
        hands: Vec::new(),
        current_hand_index: 0,
        bankroll,
        insurance_bet: Decimal::ZERO,
        round_start_bankroll: bankroll,
    };
    Game::restore(
        rules,
        1,
        shoe,
        GameState::WaitingForBet,
        player,
        Hand::new(Decimal::ZERO),
        false,
        false,
    )
}

fn base_rules() -> RuleSet {
    RuleSet {
        num_decks: 1,
        penetration: 1.0,
        ..RuleSet::default()
    }
}

fn events_of(game: &Game, event_type: EventType) -> Vec<GameEvent> {
    game.event_history()
        .into_iter()
        .filter(|e| e.event_type == event_type)
        .collect()
}

fn c(rank: Rank, suit: Suit) -> Card {
    Card::new(rank, suit)
}

#[test]
fn blackjack_pays_three_to_two() {
    let rules = RuleSet {
        insurance_allowed: true,
        ..base_rules()
    };
    let game = rigged_game(
        rules,
        dec!(1000),
        &[
            c(Rank::Ace, Suit::Spades),   // player
            c(Rank::Nine, Suit::Clubs),   // dealer up
            c(Rank::King, Suit::Diamonds), // player
            c(Rank::Six, Suit::Hearts),   // dealer hole
        ],
    );

    assert!(game.bet(dec!(100)).is_ok());

    assert_eq!(events_of(&game, EventType::PlayerBlackjack).len(), 1);
    let round_ended = events_of(&game, EventType::RoundEnded);
    assert_eq!(round_ended.len(), 1);
    assert_eq!(round_ended[0].data["result"], "150");
    assert_eq!(game.bankroll(), dec!(1150));
    assert_eq!(game.state(), GameState::WaitingForBet);
}

#[test]
fn dealer_bust_pays_even_money() {
    let rules = RuleSet {
        insurance_allowed: true,
        ..base_rules()
    };
    let game = rigged_game(
        rules,
        dec!(1000),
        &[
            c(Rank::Ten, Suit::Spades),    // player
            c(Rank::Ten, Suit::Clubs),     // dealer up
            c(Rank::Eight, Suit::Diamonds), // player
            c(Rank::Six, Suit::Hearts),    // dealer hole
            c(Rank::Nine, Suit::Spades),   // dealer draw -> busts
        ],
    );

    assert!(game.bet(dec!(50)).is_ok());
    assert_eq!(game.state(), GameState::PlayerTurn);
    assert!(game.stand().is_ok());

    assert_eq!(events_of(&game, EventType::DealerBusts).len(), 1);
    let wins = events_of(&game, EventType::PlayerWins);
    assert_eq!(wins.len(), 1);
    assert_eq!(wins[0].data["amount"], "50");
    assert_eq!(game.bankroll(), dec!(1050));
}

#[test]
fn push_on_twenty() {
    let rules = base_rules();
    let game = rigged_game(
        rules,
        dec!(1000),
        &[
            c(Rank::Queen, Suit::Spades), // player
            c(Rank::Ten, Suit::Clubs),    // dealer up
            c(Rank::Jack, Suit::Diamonds), // player
            c(Rank::King, Suit::Hearts),  // dealer hole
        ],
    );

    assert!(game.bet(dec!(20)).is_ok());
    assert!(game.stand().is_ok());

    assert_eq!(events_of(&game, EventType::Push).len(), 1);
    assert_eq!(game.bankroll(), dec!(1000));
}

#[test]
fn split_and_double_after_split() {
    let rules = RuleSet {
        double_after_split: true,
        double_on: DoubleOn::Any,
        ..base_rules()
    };
    let game = rigged_game(
        rules,
        dec!(1000),
        &[
            c(Rank::Eight, Suit::Spades),   // player
            c(Rank::Six, Suit::Clubs),      // dealer up
            c(Rank::Eight, Suit::Diamonds), // player
            c(Rank::Ten, Suit::Hearts),     // dealer hole -> dealer shows 6, holds 16
            c(Rank::Three, Suit::Spades),   // first split hand draw -> 8+3=11
            c(Rank::Seven, Suit::Clubs),    // second split hand draw -> 8+7=15
            c(Rank::Ten, Suit::Diamonds),   // double draw on first hand -> 21
            c(Rank::King, Suit::Hearts),    // dealer hits 16 -> 26, busts
        ],
    );

    assert!(game.bet(dec!(100)).is_ok());
    assert!(game.can_split());
    assert!(game.split().is_ok());

    let hands = game.player_hands();
    assert_eq!(hands.len(), 2);
    assert!(hands[0].is_split_hand());
    assert!(hands[1].is_split_hand());

    assert!(game.double_down().is_ok());
    assert_eq!(game.current_hand_index(), 1);
    assert!(game.stand().is_ok());

    assert_eq!(game.state(), GameState::WaitingForBet);
    let wins = events_of(&game, EventType::PlayerWins);
    assert_eq!(wins.len(), 2);
    let round_ended = events_of(&game, EventType::RoundEnded);
    assert_eq!(round_ended[0].data["result"], "300");
}

#[test]
fn insurance_wins_against_dealer_blackjack() {
    let rules = RuleSet {
        insurance_allowed: true,
        ..base_rules()
    };
    let game = rigged_game(
        rules,
        dec!(1000),
        &[
            c(Rank::Ten, Suit::Spades),  // player
            c(Rank::Ace, Suit::Clubs),   // dealer up
            c(Rank::Ten, Suit::Diamonds), // player
            c(Rank::King, Suit::Hearts), // dealer hole -> blackjack
        ],
    );

    assert!(game.bet(dec!(100)).is_ok());
    assert_eq!(game.state(), GameState::OfferingInsurance);

    assert!(game.take_insurance(Some(dec!(50))).is_ok());
    assert_eq!(events_of(&game, EventType::InsuranceTaken).len(), 1);

    assert_eq!(game.state(), GameState::WaitingForBet);
    assert_eq!(events_of(&game, EventType::DealerBlackjack).len(), 1);
    assert_eq!(events_of(&game, EventType::InsuranceWins).len(), 1);
    let loses = events_of(&game, EventType::PlayerLoses);
    assert_eq!(loses.len(), 1);
    assert_eq!(loses[0].data["amount"], "100");

    // Insurance pays 2:1 (profit 100) and the main bet loses (100): net 0.
    assert_eq!(game.bankroll(), dec!(1000));
}

#[test]
fn late_surrender_disallowed_after_hitting() {
    let rules = RuleSet {
        surrender: Surrender::Late,
        insurance_allowed: false,
        ..base_rules()
    };
    let game = rigged_game(
        rules,
        dec!(1000),
        &[
            c(Rank::Five, Suit::Spades),  // player
            c(Rank::Seven, Suit::Clubs),  // dealer up
            c(Rank::Six, Suit::Diamonds), // player
            c(Rank::Nine, Suit::Hearts),  // dealer hole
            c(Rank::Two, Suit::Spades),   // hit draw
        ],
    );

    assert!(game.bet(dec!(10)).is_ok());
    assert!(game.hit().is_ok());

    let before = game.bankroll();
    assert!(game.surrender().is_err());
    assert_eq!(events_of(&game, EventType::InvalidAction).len(), 1);
    assert_eq!(game.bankroll(), before);
}

#[test]
fn rejected_bet_leaves_every_field_unchanged() {
    let rules = RuleSet {
        max_bet: dec!(5000),
        ..base_rules()
    };
    let game = rigged_game(rules, dec!(1000), &[]);
    let before_state = game.state();
    let before_bankroll = game.bankroll();

    // Within the table's limits but beyond the bankroll.
    assert!(game.bet(dec!(2000)).is_err());

    assert_eq!(game.state(), before_state);
    assert_eq!(game.bankroll(), before_bankroll);
    assert_eq!(events_of(&game, EventType::InsufficientFunds).len(), 1);
}

#[test]
fn bust_ends_the_hand_immediately() {
    let game = rigged_game(
        base_rules(),
        dec!(1000),
        &[
            c(Rank::Ten, Suit::Spades),   // player
            c(Rank::Seven, Suit::Clubs),  // dealer up
            c(Rank::Nine, Suit::Diamonds), // player
            c(Rank::Eight, Suit::Hearts), // dealer hole
            c(Rank::Five, Suit::Spades),  // hit -> busts at 24
        ],
    );

    assert!(game.bet(dec!(25)).is_ok());
    assert!(game.hit().is_ok());

    assert_eq!(events_of(&game, EventType::PlayerBusts).len(), 1);
    assert_eq!(game.state(), GameState::WaitingForBet);
    assert_eq!(game.bankroll(), dec!(975));
}

#[test]
fn bankroll_below_table_minimum_ends_the_game() {
    let rules = RuleSet {
        min_bet: dec!(10),
        max_bet: dec!(1000),
        ..base_rules()
    };
    let game = rigged_game(
        rules,
        dec!(15),
        &[
            c(Rank::Ten, Suit::Spades),    // player
            c(Rank::Seven, Suit::Clubs),   // dealer up
            c(Rank::Nine, Suit::Diamonds), // player
            c(Rank::Eight, Suit::Hearts),  // dealer hole
            c(Rank::King, Suit::Spades),   // hit -> busts
        ],
    );

    assert!(game.bet(dec!(10)).is_ok());
    assert!(game.hit().is_ok());

    assert_eq!(game.bankroll(), dec!(5));
    assert_eq!(game.state(), GameState::GameOver);
    assert_eq!(events_of(&game, EventType::GameEnded).len(), 1);

    assert!(game.bet(dec!(5)).is_err());
}

#[test]
fn state_transitions_never_skip_the_adjacency_graph() {
    // WaitingForBet can reach Dealing or GameOver, never PlayerTurn
    // directly.
    assert!(GameState::WaitingForBet.is_valid_transition(GameState::Dealing));
    assert!(!GameState::WaitingForBet.is_valid_transition(GameState::PlayerTurn));
    assert!(!GameState::WaitingForBet.is_valid_transition(GameState::DealerTurn));
    assert!(!GameState::WaitingForBet.is_valid_transition(GameState::Resolving));
}

#[test]
fn waiting_for_bet_can_only_advance_to_dealing_or_game_over() {
    assert!(GameState::WaitingForBet.is_valid_transition(GameState::Dealing));
    assert!(GameState::WaitingForBet.is_valid_transition(GameState::GameOver));
    assert!(!GameState::WaitingForBet.is_valid_transition(GameState::PlayerTurn));
}

#[test]
fn game_over_is_terminal() {
    assert!(GameState::GameOver.is_terminal());
    assert!(!GameState::GameOver.is_valid_transition(GameState::WaitingForBet));
}

#[test]
fn player_turn_can_self_loop_for_additional_split_hands() {
    assert!(GameState::PlayerTurn.is_valid_transition(GameState::PlayerTurn));
}

#[test]
fn subscribers_observe_events_in_emission_order() {
    let rules = RuleSet {
        insurance_allowed: false,
        ..base_rules()
    };
    let game = rigged_game(
        rules,
        dec!(1000),
        &[
            c(Rank::Nine, Suit::Spades),  // player
            c(Rank::Seven, Suit::Clubs),  // dealer up
            c(Rank::Eight, Suit::Diamonds), // player
            c(Rank::Six, Suit::Hearts),   // dealer hole
        ],
    );

    let seen: Arc<Mutex<Vec<EventType>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    game.subscribe(
        None,
        Box::new(move |event| {
            seen_clone.lock().expect("lock").push(event.event_type);
        }),
    );

    assert!(game.bet(dec!(10)).is_ok());
    assert!(game.stand().is_ok());

    let observed = seen.lock().expect("lock").clone();
    let history: Vec<EventType> = game.event_history().into_iter().map(|e| e.event_type).collect();
    assert_eq!(observed, history);
}
