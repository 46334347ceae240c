//! Round resolution: insurance settlement, per-hand payouts, and the
//! transition back to `WAITING_FOR_BET` or `GAME_OVER`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Value};
use tracing::debug;

use crate::event::EventType;
use crate::hand::Hand;

use super::{Game, GameState};

/// Rounds `amount` to a whole currency unit using banker's rounding, the
/// same strategy a real pit's chip tray settles fractional payouts with.
fn round_payout(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}

/// The outcome of comparing one player hand against the dealer's final
/// hand, independent of money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Surrendered,
    Busted,
    Blackjack,
    Win,
    Lose,
    Push,
}

fn classify(hand: &Hand, dealer_busted: bool, dealer_blackjack: bool, dealer_value: u8) -> Outcome {
    if hand.is_surrendered() {
        return Outcome::Surrendered;
    }
    if hand.is_busted() {
        return Outcome::Busted;
    }
    if hand.is_blackjack() {
        return if dealer_blackjack { Outcome::Push } else { Outcome::Blackjack };
    }
    if dealer_blackjack {
        return Outcome::Lose;
    }
    if dealer_busted {
        return Outcome::Win;
    }
    match hand.value().cmp(&dealer_value) {
        std::cmp::Ordering::Greater => Outcome::Win,
        std::cmp::Ordering::Less => Outcome::Lose,
        std::cmp::Ordering::Equal => Outcome::Push,
    }
}

impl Game {
    /// Settles insurance, compares every hand against the dealer, credits
    /// the bankroll, and ends the round.
    ///
    /// Called only from `RESOLVING`, reached either directly (a dealer or
    /// player blackjack shortcut) or after a full dealer turn.
    pub(super) fn resolve_round(&self) {
        let (dealer_value, dealer_busted, dealer_blackjack) = {
            let dealer = self.dealer_hand.lock();
            (dealer.value(), dealer.is_busted(), dealer.is_blackjack())
        };

        self.resolve_insurance(dealer_blackjack);

        let hands = self.player.lock().hands.clone();
        for (index, hand) in hands.iter().enumerate() {
            let outcome = classify(hand, dealer_busted, dealer_blackjack, dealer_value);
            self.settle_hand(index, hand, outcome);
        }

        let (bankroll, round_start) = {
            let player = self.player.lock();
            (player.bankroll, player.round_start_bankroll)
        };
        let result = bankroll - round_start;
        debug!(%result, %bankroll, "round resolved");

        let mut data = Map::new();
        data.insert("result".to_owned(), Value::String(result.to_string()));
        data.insert("bankroll".to_owned(), Value::String(bankroll.to_string()));
        self.emit(EventType::RoundEnded, data);

        self.transition(GameState::RoundComplete);

        if bankroll < self.rules.min_bet {
            let mut data = Map::new();
            data.insert("reason".to_owned(), Value::String("bankrupt".to_owned()));
            self.emit(EventType::GameEnded, data);
            self.transition(GameState::GameOver);
        } else {
            self.transition(GameState::WaitingForBet);
        }
    }

    /// Settles the side bet: insurance pays 2:1 (`amount` on `INSURANCE_WINS`
    /// is the 2x profit; the bankroll is credited the original bet back
    /// plus that profit, i.e. 3x the insurance bet).
    fn resolve_insurance(&self, dealer_blackjack: bool) {
        let insurance_bet = self.player.lock().insurance_bet;
        if insurance_bet == Decimal::ZERO {
            return;
        }

        if dealer_blackjack {
            let profit = insurance_bet * Decimal::from(2);
            self.player.lock().bankroll += insurance_bet * Decimal::from(3);
            let mut data = Map::new();
            data.insert("amount".to_owned(), Value::String(profit.to_string()));
            self.emit(EventType::InsuranceWins, data);
        } else {
            let mut data = Map::new();
            data.insert("amount".to_owned(), Value::String(insurance_bet.to_string()));
            self.emit(EventType::InsuranceLoses, data);
        }
    }

    fn settle_hand(&self, index: usize, hand: &Hand, outcome: Outcome) {
        let bet = hand.bet();

        match outcome {
            Outcome::Surrendered => {
                let refund = round_payout(bet / Decimal::from(2));
                self.player.lock().bankroll += refund;
                // The forfeited half is the loss; nothing further to emit
                // beyond the refund already reflected in the bankroll.
            }
            Outcome::Busted | Outcome::Lose => {
                let mut data = Map::new();
                data.insert("hand_index".to_owned(), Value::from(index));
                data.insert("amount".to_owned(), Value::String(bet.to_string()));
                self.emit(EventType::PlayerLoses, data);
            }
            Outcome::Blackjack => {
                let profit = round_payout(bet * self.rules.blackjack_payout);
                self.player.lock().bankroll += bet + profit;
                let mut data = Map::new();
                data.insert("hand_index".to_owned(), Value::from(index));
                data.insert("amount".to_owned(), Value::String(profit.to_string()));
                self.emit(EventType::PlayerWins, data);
            }
            Outcome::Win => {
                self.player.lock().bankroll += bet * Decimal::from(2);
                let mut data = Map::new();
                data.insert("hand_index".to_owned(), Value::from(index));
                data.insert("amount".to_owned(), Value::String(bet.to_string()));
                self.emit(EventType::PlayerWins, data);
            }
            Outcome::Push => {
                self.player.lock().bankroll += bet;
                let mut data = Map::new();
                data.insert("hand_index".to_owned(), Value::from(index));
                self.emit(EventType::Push, data);
            }
        }
    }
}
