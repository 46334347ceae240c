//! Insurance decisions: `take_insurance`/`decline_insurance`.

use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::InsuranceError;

use super::{Game, GameState};

impl Game {
    /// Takes insurance for half the main bet, or for `amount` if given (an
    /// amount above half the main bet or above the bankroll is rejected).
    ///
    /// # Errors
    ///
    /// Returns [`InsuranceError::InvalidState`] outside `OFFERING_INSURANCE`,
    /// [`InsuranceError::AlreadyDecided`] if a decision was already made,
    /// or [`InsuranceError::InsufficientFunds`] if the requested amount
    /// exceeds half the main bet or the bankroll.
    pub fn take_insurance(&self, amount: Option<Decimal>) -> Result<(), InsuranceError> {
        if self.state() != GameState::OfferingInsurance {
            return Err(InsuranceError::InvalidState);
        }
        if *self.insurance_decided.lock() {
            return Err(InsuranceError::AlreadyDecided);
        }

        let main_bet = self.player.lock().hands[0].bet();
        let max_insurance = main_bet / Decimal::from(2);
        let amount = amount.unwrap_or(max_insurance);

        let bankroll = self.bankroll();
        if amount > max_insurance || amount > bankroll {
            self.reject_insufficient_funds(amount, bankroll.min(max_insurance));
            return Err(InsuranceError::InsufficientFunds);
        }

        {
            let mut player = self.player.lock();
            player.bankroll -= amount;
            player.insurance_bet = amount;
        }
        *self.insurance_decided.lock() = true;

        let mut data = Map::new();
        data.insert("amount".to_owned(), Value::String(amount.to_string()));
        self.emit(crate::event::EventType::InsuranceTaken, data);

        self.resolve_peek_and_continue();
        Ok(())
    }

    /// Declines insurance.
    ///
    /// # Errors
    ///
    /// Returns [`InsuranceError::InvalidState`] outside `OFFERING_INSURANCE`,
    /// or [`InsuranceError::AlreadyDecided`] if a decision was already made.
    pub fn decline_insurance(&self) -> Result<(), InsuranceError> {
        if self.state() != GameState::OfferingInsurance {
            return Err(InsuranceError::InvalidState);
        }
        if *self.insurance_decided.lock() {
            return Err(InsuranceError::AlreadyDecided);
        }

        self.player.lock().insurance_bet = Decimal::ZERO;
        *self.insurance_decided.lock() = true;

        self.emit(crate::event::EventType::InsuranceDeclined, Map::new());

        self.resolve_peek_and_continue();
        Ok(())
    }
}
