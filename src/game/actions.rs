//! Player actions during `PLAYER_TURN`.

use serde_json::{Map, Value};

use crate::error::ActionError;
use crate::hand::Hand;
use crate::rules::Surrender;

use super::{Game, GameState};

impl Game {
    fn ensure_player_turn(&self) -> Result<(), ActionError> {
        if self.state() != GameState::PlayerTurn {
            return Err(ActionError::InvalidState);
        }
        Ok(())
    }

    /// Draws a card for the active hand. `hit()`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidState`] outside `PLAYER_TURN`, or
    /// [`ActionError::HandNotActive`] if the active hand has already
    /// busted.
    pub fn hit(&self) -> Result<(), ActionError> {
        self.ensure_player_turn()?;
        if !self.can_hit() {
            self.reject_invalid_action("the active hand cannot be hit");
            return Err(ActionError::HandNotActive);
        }

        let card = self.draw();
        let (index, busted) = {
            let mut player = self.player.lock();
            let index = player.current_hand_index;
            let hand = &mut player.hands[index];
            hand.add_card(card);
            (index, hand.is_busted())
        };

        let mut data = Map::new();
        data.insert("card".to_owned(), Self::card_json(card));
        data.insert("hand".to_owned(), Value::String("player".to_owned()));
        data.insert("hand_value".to_owned(), Value::from(self.player.lock().hands[index].value()));
        self.emit(crate::event::EventType::PlayerHit, data);

        if busted {
            let mut data = Map::new();
            data.insert("hand_index".to_owned(), Value::from(index));
            self.emit(crate::event::EventType::PlayerBusts, data);
            self.advance_hand();
        }

        Ok(())
    }

    /// Ends the active hand without drawing. `stand()`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidState`] outside `PLAYER_TURN`.
    pub fn stand(&self) -> Result<(), ActionError> {
        self.ensure_player_turn()?;
        if !self.can_stand() {
            self.reject_invalid_action("there is no active hand to stand on");
            return Err(ActionError::HandNotActive);
        }
        self.emit(crate::event::EventType::PlayerStand, Map::new());
        self.advance_hand();
        Ok(())
    }

    /// Doubles the active hand's bet, draws exactly one card, then ends
    /// the hand regardless of outcome. `double_down()`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidState`] outside `PLAYER_TURN`,
    /// [`ActionError::CannotDouble`] if doubling is not legal here, or
    /// [`ActionError::InsufficientFunds`] if the bankroll cannot cover it.
    pub fn double_down(&self) -> Result<(), ActionError> {
        self.ensure_player_turn()?;

        let bet = {
            let player = self.player.lock();
            let hand = &player.hands[player.current_hand_index];
            if !hand.can_double()
                || (hand.is_split_hand() && !self.rules.double_after_split)
                || !self.rules.double_on.allows(hand.value())
            {
                drop(player);
                self.reject_invalid_action("cannot double down on this hand");
                return Err(ActionError::CannotDouble);
            }
            hand.bet()
        };

        let bankroll = self.bankroll();
        if bankroll < bet {
            self.reject_insufficient_funds(bet, bankroll);
            return Err(ActionError::InsufficientFunds);
        }

        let card = self.draw();
        let index = {
            let mut player = self.player.lock();
            player.bankroll -= bet;
            let index = player.current_hand_index;
            let hand = &mut player.hands[index];
            hand.double_bet();
            hand.add_card(card);
            index
        };

        let mut data = Map::new();
        data.insert("card".to_owned(), Self::card_json(card));
        data.insert("hand".to_owned(), Value::String("player".to_owned()));
        data.insert("hand_value".to_owned(), Value::from(self.player.lock().hands[index].value()));
        self.emit(crate::event::EventType::PlayerDouble, data);

        if self.player.lock().hands[index].is_busted() {
            let mut data = Map::new();
            data.insert("hand_index".to_owned(), Value::from(index));
            self.emit(crate::event::EventType::PlayerBusts, data);
        }

        self.advance_hand();
        Ok(())
    }

    /// Splits a pair into two hands, each dealt one new card. `split()`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidState`] outside `PLAYER_TURN`,
    /// [`ActionError::MaxSplitsReached`] or [`ActionError::CannotSplit`]
    /// if splitting is not legal here, or
    /// [`ActionError::InsufficientFunds`] if the bankroll cannot cover the
    /// new hand's bet.
    pub fn split(&self) -> Result<(), ActionError> {
        self.ensure_player_turn()?;

        if self.player.lock().hands.len() >= usize::from(self.rules.max_splits) {
            self.reject_invalid_action("maximum splits reached");
            return Err(ActionError::MaxSplitsReached);
        }
        if !self.can_split() {
            self.reject_invalid_action("cannot split this hand");
            return Err(ActionError::CannotSplit);
        }

        let (bet, is_ace, index) = {
            let player = self.player.lock();
            let index = player.current_hand_index;
            let hand = &player.hands[index];
            (hand.bet(), hand.cards()[0].is_ace(), index)
        };

        let bankroll = self.bankroll();
        if bankroll < bet {
            self.reject_insufficient_funds(bet, bankroll);
            return Err(ActionError::InsufficientFunds);
        }

        let split_card = {
            let mut player = self.player.lock();
            player.bankroll -= bet;
            player.hands[index]
                .take_split_card()
                .expect("can_split() verified exactly two cards")
        };
        let mut new_hand = Hand::from_split(split_card, bet);
        {
            let mut player = self.player.lock();
            player.hands[index].mark_split_hand();
        }

        let card_a = self.draw();
        let card_b = self.draw();
        {
            let mut player = self.player.lock();
            player.hands[index].add_card(card_a);
            new_hand.add_card(card_b);
            player.hands.insert(index + 1, new_hand);
        }

        self.emit(crate::event::EventType::PlayerSplit, Map::new());

        let auto_stand = is_ace && !self.rules.hit_split_aces;
        if auto_stand {
            let mut player = self.player.lock();
            player.current_hand_index += 1;
            drop(player);
            self.advance_hand();
        }

        Ok(())
    }

    /// Forfeits half the active hand's bet and ends the round for it.
    /// `surrender()`.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::InvalidState`] outside `PLAYER_TURN`, or
    /// [`ActionError::CannotSurrender`] if surrender is disallowed or no
    /// longer available.
    pub fn surrender(&self) -> Result<(), ActionError> {
        self.ensure_player_turn()?;

        if self.rules.surrender == Surrender::None {
            self.reject_invalid_action("surrender is not offered at this table");
            return Err(ActionError::CannotSurrender);
        }
        if !self.can_surrender() {
            self.reject_invalid_action("cannot surrender at this point");
            return Err(ActionError::CannotSurrender);
        }

        {
            let mut player = self.player.lock();
            let index = player.current_hand_index;
            player.hands[index].surrender();
        }
        self.emit(crate::event::EventType::PlayerSurrender, Map::new());
        self.advance_hand();
        Ok(())
    }

    /// Moves to the next hand, or to the dealer/resolution if the round's
    /// hands are exhausted.
    pub(super) fn advance_hand(&self) {
        let past_last = {
            let mut player = self.player.lock();
            player.current_hand_index += 1;
            player.current_hand_index >= player.hands.len()
        };
        if past_last {
            self.enter_dealer_turn_or_resolve();
        }
    }
}
