//! Dealer play: hole-card reveal and the draw-to-17 loop.

use serde_json::{Map, Value};

use super::{Game, GameState};

impl Game {
    /// Reveals the dealer's hole card, if it has not been revealed
    /// already this round. Idempotent: a second call is a no-op, so every
    /// call site that might race a prior reveal (the peek shortcuts in
    /// `bet.rs`, the dealer's own turn) can call it unconditionally.
    pub(super) fn reveal_dealer_hole(&self) {
        let mut revealed = self.dealer_hole_revealed.lock();
        if *revealed {
            return;
        }
        *revealed = true;
        drop(revealed);

        let hole_card = self.dealer_hand.lock().cards()[1];
        let mut data = Map::new();
        data.insert("card".to_owned(), Self::card_json(hole_card));
        self.emit(crate::event::EventType::DealerReveals, data);
    }

    /// Decides whether any dealer play is needed: if every hand busted or
    /// surrendered, the dealer's cards never change the outcome and
    /// resolution proceeds directly; otherwise the dealer plays out its
    /// hand first.
    pub(super) fn enter_dealer_turn_or_resolve(&self) {
        let all_hands_done = self
            .player
            .lock()
            .hands
            .iter()
            .all(|h| h.is_busted() || h.is_surrendered());

        if all_hands_done {
            self.transition(GameState::Resolving);
            self.resolve_round();
            return;
        }

        self.transition(GameState::DealerTurn);
        self.play_dealer_turn();
    }

    /// Reveals the hole card, then draws until the dealer's total is 17 or
    /// higher, stopping on a soft 17 unless the rules say to hit it.
    fn play_dealer_turn(&self) {
        self.reveal_dealer_hole();

        loop {
            let (value, is_soft) = {
                let dealer = self.dealer_hand.lock();
                (dealer.value(), dealer.is_soft())
            };
            let must_hit = value < 17 || (value == 17 && is_soft && self.rules.dealer_hits_soft_17);
            if !must_hit {
                break;
            }

            let card = self.draw();
            let new_value = {
                let mut dealer = self.dealer_hand.lock();
                dealer.add_card(card);
                dealer.value()
            };
            let mut data = Map::new();
            data.insert("card".to_owned(), Self::card_json(card));
            data.insert("hand_value".to_owned(), Value::from(new_value));
            self.emit(crate::event::EventType::DealerHits, data);
        }

        let (busted, final_value) = {
            let dealer = self.dealer_hand.lock();
            (dealer.is_busted(), dealer.value())
        };
        if busted {
            let mut data = Map::new();
            data.insert("hand_value".to_owned(), Value::from(final_value));
            self.emit(crate::event::EventType::DealerBusts, data);
        } else {
            let mut data = Map::new();
            data.insert("hand_value".to_owned(), Value::from(final_value));
            self.emit(crate::event::EventType::DealerStands, data);
        }

        self.transition(GameState::Resolving);
        self.resolve_round();
    }
}
