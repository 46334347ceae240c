//! Bet acceptance and the opening-deal sub-protocol.

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::BetError;
use crate::event::{EventType, HIDDEN_CARD_SENTINEL};
use crate::hand::Hand;

use super::{Game, GameState};

impl Game {
    /// Places a bet and starts a new round.
    ///
    /// Accepted only from `WAITING_FOR_BET`; rejects a bet outside the
    /// table's `[min_bet, max_bet]` range or one the bankroll cannot
    /// cover, leaving every field unchanged. On acceptance, deals the
    /// opening four cards and runs the insurance/peek sub-protocol to
    /// completion before returning.
    ///
    /// # Errors
    ///
    /// Returns [`BetError::InvalidState`] outside `WAITING_FOR_BET`,
    /// [`BetError::OutsideTableLimits`] if `amount` is outside
    /// `[min_bet, max_bet]`, or [`BetError::InsufficientFunds`] if the
    /// bankroll cannot cover it.
    pub fn bet(&self, amount: Decimal) -> Result<(), BetError> {
        if self.state() != GameState::WaitingForBet {
            self.reject_invalid_action("a bet can only be placed while waiting for one");
            return Err(BetError::InvalidState);
        }
        if amount < self.rules.min_bet || amount > self.rules.max_bet {
            self.reject_invalid_action("bet is outside the table's allowed range");
            return Err(BetError::OutsideTableLimits);
        }
        let bankroll = self.bankroll();
        if amount > bankroll {
            self.reject_insufficient_funds(amount, bankroll);
            return Err(BetError::InsufficientFunds);
        }

        self.reshuffle_if_needed();

        {
            let mut player = self.player.lock();
            player.round_start_bankroll = player.bankroll;
            player.bankroll -= amount;
            player.hands = vec![Hand::new(amount)];
            player.current_hand_index = 0;
            player.insurance_bet = Decimal::ZERO;
        }
        *self.dealer_hand.lock() = Hand::new(Decimal::ZERO);
        *self.dealer_hole_revealed.lock() = false;
        *self.insurance_decided.lock() = false;

        self.transition(GameState::Dealing);
        debug!(%amount, "bet accepted, starting round");

        let mut placed = Map::new();
        placed.insert("amount".to_owned(), Value::String(amount.to_string()));
        self.emit(EventType::BetPlaced, placed);

        self.deal_opening_cards();
        self.emit(EventType::RoundStarted, Map::new());
        self.run_opening_deal_subprotocol();

        Ok(())
    }

    fn deal_card_to_player(&self) {
        let card = self.draw();
        let value = {
            let mut player = self.player.lock();
            player.hands[0].add_card(card);
            player.hands[0].value()
        };
        let mut data = Map::new();
        data.insert("card".to_owned(), Self::card_json(card));
        data.insert("hand".to_owned(), Value::String("player".to_owned()));
        data.insert("hand_value".to_owned(), Value::from(value));
        self.emit(EventType::CardDealt, data);
    }

    fn deal_dealer_upcard(&self) {
        let card = self.draw();
        let value = {
            let mut dealer = self.dealer_hand.lock();
            dealer.add_card(card);
            dealer.value()
        };
        let mut data = Map::new();
        data.insert("card".to_owned(), Self::card_json(card));
        data.insert("hand".to_owned(), Value::String("dealer".to_owned()));
        data.insert("hand_value".to_owned(), Value::from(value));
        self.emit(EventType::CardDealt, data);
    }

    fn deal_dealer_hole_card(&self) {
        let card = self.draw();
        self.dealer_hand.lock().add_card(card);
        let mut data = Map::new();
        data.insert(
            "card".to_owned(),
            Value::String(HIDDEN_CARD_SENTINEL.to_owned()),
        );
        data.insert("hand".to_owned(), Value::String("dealer".to_owned()));
        data.insert("hand_value".to_owned(), Value::Null);
        self.emit(EventType::CardDealt, data);
    }

    fn deal_opening_cards(&self) {
        self.deal_card_to_player();
        self.deal_dealer_upcard();
        self.deal_card_to_player();
        self.deal_dealer_hole_card();
    }

    /// Runs the insurance offer and dealer peek after the opening deal.
    fn run_opening_deal_subprotocol(&self) {
        let upcard = self.dealer_hand.lock().cards()[0];
        let player_has_blackjack = self.player.lock().hands[0].is_blackjack();

        if upcard.is_ace() && self.rules.insurance_allowed && !player_has_blackjack {
            self.emit(EventType::InsuranceOffered, Map::new());
            self.transition(GameState::OfferingInsurance);
            return;
        }

        self.resolve_peek_and_continue();
    }

    /// Entry point resumed by `insurance.rs` once a decision has been
    /// made, and called directly above when no insurance was offered.
    pub(super) fn resolve_peek_and_continue(&self) {
        let upcard = self.dealer_hand.lock().cards()[0];
        let should_peek = (upcard.is_ace() || upcard.rank.is_ten_valued()) && self.rules.dealer_peeks;

        if should_peek {
            let dealer_has_blackjack = self.dealer_hand.lock().is_blackjack();
            if dealer_has_blackjack {
                self.reveal_dealer_hole();
                self.emit(EventType::DealerBlackjack, Map::new());
                self.transition(GameState::Resolving);
                self.resolve_round();
                return;
            }
        }

        let player_has_blackjack = self.player.lock().hands[0].is_blackjack();
        if player_has_blackjack {
            // Either the peek above already confirmed the dealer lacks
            // blackjack, or the upcard structurally rules one out (2-9).
            // Either way the outcome is settled without the dealer
            // drawing any further cards — resolution's own blackjack-vs-
            // blackjack check still catches a tying dealer natural under
            // ENHC rules and reports it as a push.
            self.emit(EventType::PlayerBlackjack, Map::new());
            self.reveal_dealer_hole();
            self.transition(GameState::Resolving);
            self.resolve_round();
            return;
        }

        self.transition(GameState::PlayerTurn);
    }
}
