// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Round orchestrator.
//!
//! A [Game] owns the players registry and sequences each round through its
//! phases:
//!
//! ```text
//!   Idle -> BlindsPosted -> PreFlop -> Flop -> Turn -> River -> Showdown
//!        -> RoundComplete -> Idle
//! ```
//!
//! Every street is handled by a fresh [BettingRound], when all players but one
//! fold the pot is awarded immediately and no more cards are dealt.
use log::{error, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::{
    betting::{Action, BettingRound, Pot, SeatStatus},
    config::TableConfig,
    error::GameError,
    poker::{Card, Chips, Deck, HandValue, PlayerCards, PlayerId},
    registry::{Player, PlayerRegistry},
};

/// The round phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// No round in progress.
    Idle,
    /// Blinds have been collected.
    BlindsPosted,
    /// Hole cards dealt, preflop betting.
    PreFlop,
    /// Three board cards dealt, flop betting.
    Flop,
    /// Fourth board card dealt, turn betting.
    Turn,
    /// Fifth board card dealt, river betting.
    River,
    /// Hands are compared.
    Showdown,
    /// The pot has been awarded.
    RoundComplete,
}

/// Public view of a seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatView {
    /// The player id.
    pub player_id: PlayerId,
    /// The player bankroll.
    pub chips: Chips,
    /// The player bet on this street.
    pub bet: Chips,
    /// The player status in the round.
    pub status: SeatStatus,
    /// The player has the button.
    pub has_button: bool,
}

/// Public game state, hole cards are never included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// The round phase.
    pub phase: Phase,
    /// The board cards.
    pub board: Vec<Card>,
    /// The pot.
    pub pot: Chips,
    /// The bet to call on this street.
    pub bet_to_call: Chips,
    /// The player who has to act.
    pub to_act: Option<PlayerId>,
    /// The player who has the button.
    pub button: Option<PlayerId>,
    /// The round small blind.
    pub small_blind: Chips,
    /// The seated players in seat order.
    pub seats: Vec<SeatView>,
}

impl GameState {
    /// Returns a seated player.
    pub fn seat(&self, player_id: PlayerId) -> Option<&SeatView> {
        self.seats.iter().find(|s| s.player_id == player_id)
    }

    /// How much a player has to put in to call.
    pub fn to_call(&self, player_id: PlayerId) -> Chips {
        self.seat(player_id)
            .map(|s| self.bet_to_call - s.bet)
            .unwrap_or_default()
    }
}

/// Chips won by a player at the end of a round.
#[derive(Debug, Clone)]
pub struct Payoff {
    /// The winner.
    pub player_id: PlayerId,
    /// The chips won.
    pub chips: Chips,
    /// The winning hand, none if every other player folded.
    pub hand: Option<HandValue>,
}

/// The outcome of a completed round.
#[derive(Debug, Clone)]
pub struct RoundResult {
    /// The winners, the first one got any odd chips.
    pub payoffs: Vec<Payoff>,
    /// The final board.
    pub board: Vec<Card>,
}

impl RoundResult {
    /// The chips a player won in this round.
    pub fn winnings(&self, player_id: PlayerId) -> Chips {
        self.payoffs
            .iter()
            .filter(|p| p.player_id == player_id)
            .map(|p| p.chips)
            .sum()
    }

    /// Checks if the round ended with a showdown.
    pub fn is_showdown(&self) -> bool {
        self.payoffs.iter().any(|p| p.hand.is_some())
    }
}

/// State of the round in progress.
#[derive(Debug)]
struct Round {
    seats: Vec<PlayerId>,
    button: usize,
    small_blind: Chips,
    deck: Deck,
    board: Vec<Card>,
    pot: Pot,
    street: BettingRound,
}

/// The round orchestrator.
#[derive(Debug)]
pub struct Game {
    config: TableConfig,
    registry: PlayerRegistry,
    rotation: Vec<PlayerId>,
    button: usize,
    phase: Phase,
    round: Option<Round>,
    action_deadline: Option<Instant>,
    rng: StdRng,
}

impl Game {
    /// Creates a new game.
    pub fn new(config: TableConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a new game with user initialized randomness.
    pub fn with_rng(config: TableConfig, rng: StdRng) -> Self {
        Self {
            config,
            registry: PlayerRegistry::new(),
            rotation: Vec::new(),
            button: 0,
            phase: Phase::Idle,
            round: None,
            action_deadline: None,
            rng,
        }
    }

    /// The table config.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// The players registry.
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Registers a new player.
    pub fn register_player(&mut self, nickname: impl Into<String>, chips: Chips) -> PlayerId {
        self.registry.register(nickname, chips)
    }

    /// Changes a player nickname.
    pub fn rename_player(
        &mut self,
        player_id: PlayerId,
        nickname: impl Into<String>,
    ) -> Result<(), GameError> {
        self.registry.rename(player_id, nickname)
    }

    /// Adds chips to a player, a player with no chips can be seated again.
    pub fn credit(&mut self, player_id: PlayerId, chips: Chips) -> Result<(), GameError> {
        self.registry.credit(player_id, chips)
    }

    /// Removes a player from the registry and the rotation.
    ///
    /// Fails if the player is seated in the round in progress.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<Player, GameError> {
        if self
            .round
            .as_ref()
            .is_some_and(|r| r.seats.contains(&player_id))
        {
            return Err(GameError::RoundInProgress);
        }

        let player = self
            .registry
            .remove(player_id)
            .ok_or(GameError::UnknownPlayer(player_id))?;

        if let Some(pos) = self.rotation.iter().position(|&id| id == player_id) {
            self.rotation.remove(pos);
            if pos < self.button {
                self.button -= 1;
            }
            if self.button >= self.rotation.len() {
                self.button = 0;
            }
        }

        info!("Player {player_id} removed");
        Ok(player)
    }

    /// The players rotation in seat order.
    pub fn rotation(&self) -> &[PlayerId] {
        &self.rotation
    }

    /// The player who has the button.
    pub fn button(&self) -> Option<PlayerId> {
        self.rotation.get(self.button).copied()
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// When the player to act will be folded.
    pub fn action_deadline(&self) -> Option<Instant> {
        self.action_deadline
    }

    /// Sets the default small blind, only allowed between rounds.
    pub fn set_small_blind(&mut self, small_blind: Chips) -> Result<(), GameError> {
        if self.round.is_some() {
            return Err(GameError::RoundInProgress);
        }

        self.config.set_small_blind(small_blind)
    }

    /// Starts a round with the configured small blind and a shuffled deck.
    ///
    /// See [Game::start_round].
    pub fn start_default_round(
        &mut self,
        player_ids: &[PlayerId],
    ) -> Result<Option<RoundResult>, GameError> {
        let small_blind = self.config.small_blind();
        self.start_round(player_ids, small_blind)
    }

    /// Starts a round with a shuffled deck.
    ///
    /// The players are given in seat order, the button posts the small blind
    /// and the next player the big blind. Returns a result if the round ended
    /// without any action, when blinds put every player all in.
    pub fn start_round(
        &mut self,
        player_ids: &[PlayerId],
        small_blind: Chips,
    ) -> Result<Option<RoundResult>, GameError> {
        let deck = Deck::new_and_shuffled(&mut self.rng);
        self.start_round_with_deck(player_ids, small_blind, deck)
    }

    /// Starts a round dealing cards from the given deck.
    pub fn start_round_with_deck(
        &mut self,
        player_ids: &[PlayerId],
        small_blind: Chips,
        deck: Deck,
    ) -> Result<Option<RoundResult>, GameError> {
        if self.round.is_some() {
            return Err(GameError::RoundInProgress);
        }

        if small_blind.is_zero() {
            return Err(GameError::InvalidBlind(small_blind));
        }

        if player_ids.len() < 2 {
            return Err(GameError::NotEnoughPlayers(player_ids.len()));
        }

        for (idx, &player_id) in player_ids.iter().enumerate() {
            if player_ids[..idx].contains(&player_id) {
                return Err(GameError::DuplicatePlayer(player_id));
            }

            if self.registry.bankroll(player_id)?.is_zero() {
                return Err(GameError::PlayerBusted(player_id));
            }
        }

        // Keep the button on the same player if still seated.
        if self.rotation != player_ids {
            let holder = self.button();
            self.rotation = player_ids.to_vec();
            self.button = holder
                .and_then(|p| self.rotation.iter().position(|&id| id == p))
                .unwrap_or(self.button % self.rotation.len());
        }

        for &player_id in &self.rotation {
            self.registry.clear_hand(player_id)?;
        }

        let players = self
            .rotation
            .iter()
            .map(|&id| (id, SeatStatus::Live))
            .collect::<Vec<_>>();

        // Preflop action starts after the big blind.
        let street = BettingRound::start(&players, self.button + 2)?;

        self.round = Some(Round {
            seats: self.rotation.clone(),
            button: self.button,
            small_blind,
            deck,
            board: Vec::with_capacity(5),
            pot: Pot::default(),
            street,
        });

        info!(
            "Starting round with {} players, button {}, blinds {}/{}",
            self.rotation.len(),
            self.rotation[self.button],
            small_blind,
            small_blind * 2
        );

        let res = self.post_blinds_and_deal().and_then(|_| self.advance());
        self.check_structural(res)
    }

    /// Handles an action from a player.
    ///
    /// Returns the round result if the action ended the round.
    pub fn submit_action(
        &mut self,
        player_id: PlayerId,
        action: Action,
    ) -> Result<Option<RoundResult>, GameError> {
        let round = self.round.as_mut().ok_or(GameError::NoRoundInProgress)?;
        let res = round
            .street
            .act(&mut self.registry, &mut round.pot, player_id, action);
        self.check_structural(res)?;

        self.action_deadline = None;
        let res = self.advance();
        self.check_structural(res)
    }

    /// Folds the player to act if the action deadline has passed.
    pub fn tick(&mut self) -> Result<Option<RoundResult>, GameError> {
        self.expire_action(Instant::now())
    }

    /// Folds the player to act if the action deadline is before `now`.
    pub fn expire_action(&mut self, now: Instant) -> Result<Option<RoundResult>, GameError> {
        let to_act = self.round.as_ref().and_then(|r| r.street.to_act());
        match (self.action_deadline, to_act) {
            (Some(deadline), Some(player_id)) if now >= deadline => {
                warn!("Player {player_id} didn't act in time, folding");
                self.submit_action(player_id, Action::Fold)
            }
            _ => Ok(None),
        }
    }

    /// Aborts the round in progress giving back all the bets.
    pub fn abort_round(&mut self) -> Result<(), GameError> {
        if self.round.is_none() {
            return Err(GameError::NoRoundInProgress);
        }

        warn!("Round aborted");
        self.refund_round();
        Ok(())
    }

    /// Returns the public game state.
    pub fn state(&self) -> GameState {
        match &self.round {
            Some(round) => {
                let seats = round
                    .seats
                    .iter()
                    .enumerate()
                    .map(|(idx, &player_id)| SeatView {
                        player_id,
                        chips: self.registry.bankroll(player_id).unwrap_or_default(),
                        bet: round.street.contribution(player_id),
                        status: round
                            .street
                            .status(player_id)
                            .unwrap_or(SeatStatus::Folded),
                        has_button: idx == round.button,
                    })
                    .collect();

                GameState {
                    phase: self.phase,
                    board: round.board.clone(),
                    pot: round.pot.chips(),
                    bet_to_call: round.street.bet_to_call(),
                    to_act: round.street.to_act(),
                    button: round.seats.get(round.button).copied(),
                    small_blind: round.small_blind,
                    seats,
                }
            }
            None => {
                let seats = self
                    .rotation
                    .iter()
                    .enumerate()
                    .map(|(idx, &player_id)| SeatView {
                        player_id,
                        chips: self.registry.bankroll(player_id).unwrap_or_default(),
                        bet: Chips::ZERO,
                        status: SeatStatus::Live,
                        has_button: idx == self.button,
                    })
                    .collect();

                GameState {
                    phase: self.phase,
                    board: Vec::new(),
                    pot: Chips::ZERO,
                    bet_to_call: Chips::ZERO,
                    to_act: None,
                    button: self.button(),
                    small_blind: self.config.small_blind(),
                    seats,
                }
            }
        }
    }

    fn post_blinds_and_deal(&mut self) -> Result<(), GameError> {
        let round = self.round.as_mut().ok_or(GameError::NoRoundInProgress)?;
        let n = round.seats.len();

        let sb = round.street.post_blind(
            &mut self.registry,
            &mut round.pot,
            round.button,
            round.small_blind,
        )?;
        let bb = round.street.post_blind(
            &mut self.registry,
            &mut round.pot,
            round.button + 1,
            round.small_blind * 2,
        )?;
        self.phase = Phase::BlindsPosted;

        info!(
            "Player {} posted {sb}, player {} posted {bb}",
            round.seats[round.button],
            round.seats[(round.button + 1) % n]
        );

        // Deal one card at a time starting left of the button.
        let mut hole = vec![Vec::with_capacity(2); n];
        for _ in 0..2 {
            for i in 0..n {
                let idx = (round.button + 1 + i) % n;
                hole[idx].push(round.deck.deal().ok_or(GameError::EmptyDeck)?);
            }
        }

        for (&player_id, cards) in round.seats.iter().zip(hole) {
            self.registry.set_hole_cards(player_id, cards[0], cards[1])?;
        }

        self.phase = Phase::PreFlop;
        Ok(())
    }

    /// Moves to the next street when the current one is complete.
    fn advance(&mut self) -> Result<Option<RoundResult>, GameError> {
        loop {
            let round = self.round.as_mut().ok_or(GameError::NoRoundInProgress)?;

            if !round.street.is_complete() {
                self.action_deadline = Some(Instant::now() + self.config.action_timeout());
                return Ok(None);
            }

            if round.street.live_count() <= 1 {
                return self.finish_uncontested().map(Some);
            }

            let (next, count) = match self.phase {
                Phase::PreFlop => (Phase::Flop, 3),
                Phase::Flop => (Phase::Turn, 1),
                Phase::Turn => (Phase::River, 1),
                _ => return self.showdown().map(Some),
            };

            for _ in 0..count {
                let card = round.deck.deal().ok_or(GameError::EmptyDeck)?;
                round.board.push(card);
            }

            // Post flop the action starts left of the button.
            round.street = BettingRound::start(&round.street.players(), round.button + 1)?;
            self.phase = next;

            info!("{next:?} {}", cards_to_string(&round.board));
        }
    }

    fn finish_uncontested(&mut self) -> Result<RoundResult, GameError> {
        let round = self.round.as_mut().ok_or(GameError::NoRoundInProgress)?;
        let winner = round
            .street
            .players()
            .into_iter()
            .find(|(_, status)| *status != SeatStatus::Folded)
            .map(|(player_id, _)| player_id)
            .ok_or(GameError::NoPlayers)?;

        let chips = round.pot.chips();
        self.registry.credit(winner, chips)?;
        round.pot.take();

        info!("Player {winner} wins {chips} uncontested");

        self.end_round(vec![Payoff {
            player_id: winner,
            chips,
            hand: None,
        }])
    }

    fn showdown(&mut self) -> Result<RoundResult, GameError> {
        self.phase = Phase::Showdown;

        let round = self.round.as_mut().ok_or(GameError::NoRoundInProgress)?;
        let n = round.seats.len();

        // Evaluate hands in post button order so that the first winner is the
        // closest to the button.
        let mut hands = Vec::with_capacity(n);
        for i in 0..n {
            let player_id = round.seats[(round.button + 1 + i) % n];
            if round.street.status(player_id) == Some(SeatStatus::Folded) {
                continue;
            }

            let PlayerCards::Cards(c1, c2) = self.registry.hole_cards(player_id)? else {
                return Err(GameError::MissingHoleCards(player_id));
            };

            let mut cards = vec![c1, c2];
            cards.extend_from_slice(&round.board);
            let value = HandValue::eval(&cards)?;

            info!("Player {player_id} shows {c1} {c2}: {value}");
            hands.push((player_id, value));
        }

        let best = hands
            .iter()
            .map(|(_, value)| *value)
            .max()
            .ok_or(GameError::NoPlayers)?;
        let winners = hands
            .into_iter()
            .filter(|(_, value)| *value == best)
            .collect::<Vec<_>>();

        let pot = round.pot.chips();
        let share = pot / winners.len() as u32;
        let odd_chips = pot % winners.len() as u32;

        let payoffs = winners
            .into_iter()
            .enumerate()
            .map(|(idx, (player_id, value))| Payoff {
                player_id,
                chips: if idx == 0 { share + odd_chips } else { share },
                hand: Some(value),
            })
            .collect::<Vec<_>>();

        // Check all credits first so that the pot is paid in full or not at all.
        for payoff in &payoffs {
            self.registry.can_credit(payoff.player_id, payoff.chips)?;
        }

        for payoff in &payoffs {
            self.registry.credit(payoff.player_id, payoff.chips)?;

            if let Some(hand) = &payoff.hand {
                info!(
                    "Player {} wins {} with {}",
                    payoff.player_id,
                    payoff.chips,
                    hand.rank()
                );
            }
        }

        round.pot.take();
        self.end_round(payoffs)
    }

    fn end_round(&mut self, payoffs: Vec<Payoff>) -> Result<RoundResult, GameError> {
        self.phase = Phase::RoundComplete;
        self.action_deadline = None;

        let round = self.round.take().ok_or(GameError::NoRoundInProgress)?;
        for &player_id in &round.seats {
            self.registry.clear_hand(player_id)?;
        }

        // Players without chips leave the rotation and the button moves to the
        // next player who still has chips.
        let registry = &self.registry;
        let has_chips = |id: PlayerId| registry.bankroll(id).is_ok_and(|c| !c.is_zero());

        let n = self.rotation.len();
        let next_button = (1..=n)
            .map(|i| self.rotation[(self.button + i) % n])
            .find(|&id| has_chips(id));

        for &player_id in self.rotation.iter().filter(|&&id| !has_chips(id)) {
            info!("Player {player_id} is out of chips");
        }

        self.rotation.retain(|&id| has_chips(id));
        self.button = next_button
            .and_then(|p| self.rotation.iter().position(|&id| id == p))
            .unwrap_or(0);

        self.phase = Phase::Idle;

        Ok(RoundResult {
            payoffs,
            board: round.board,
        })
    }

    /// Aborts the round if the error is an engine invariant violation.
    fn check_structural<T>(&mut self, res: Result<T, GameError>) -> Result<T, GameError> {
        if let Err(e) = &res {
            if e.is_structural() {
                error!("Aborting round: {e}");
                self.refund_round();
            }
        }

        res
    }

    fn refund_round(&mut self) {
        if let Some(mut round) = self.round.take() {
            for (player_id, chips) in round.pot.refunds() {
                if let Err(e) = self.registry.credit(player_id, chips) {
                    error!("Refund of {chips} to player {player_id} failed: {e}");
                }
            }

            for &player_id in &round.seats {
                if let Err(e) = self.registry.clear_hand(player_id) {
                    error!("Clearing hand of player {player_id} failed: {e}");
                }
            }
        }

        self.phase = Phase::Idle;
        self.action_deadline = None;
    }
}

fn cards_to_string(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    const SMALL_BLIND: Chips = Chips::new(10);

    fn new_game() -> Game {
        Game::with_rng(TableConfig::default(), StdRng::seed_from_u64(13))
    }

    fn new_players(game: &mut Game, bankrolls: &[u32]) -> Vec<PlayerId> {
        bankrolls
            .iter()
            .enumerate()
            .map(|(i, &chips)| game.register_player(format!("p{i}"), Chips::new(chips)))
            .collect()
    }

    /// A deck that deals the given cards first.
    fn deck(cards: &str) -> Deck {
        let top = cards
            .split_whitespace()
            .map(|c| c.parse().unwrap())
            .collect::<Vec<Card>>();
        Deck::with_top(&top, &mut StdRng::seed_from_u64(1)).unwrap()
    }

    fn bankroll(game: &Game, player_id: PlayerId) -> Chips {
        game.registry().bankroll(player_id).unwrap()
    }

    fn total_chips(game: &Game) -> Chips {
        game.registry().iter().map(|p| p.chips).sum::<Chips>() + game.state().pot
    }

    /// Checks or calls until the round ends.
    fn check_down(game: &mut Game) -> RoundResult {
        loop {
            let state = game.state();
            let player_id = state.to_act.unwrap();
            let action = if state.to_call(player_id).is_zero() {
                Action::Check
            } else {
                Action::Call
            };

            if let Some(res) = game.submit_action(player_id, action).unwrap() {
                return res;
            }
        }
    }

    #[test]
    fn blinds_are_posted() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000]);

        let res = game.start_round(&ids, SMALL_BLIND).unwrap();
        assert!(res.is_none());

        let state = game.state();
        assert_eq!(state.phase, Phase::PreFlop);
        assert_eq!(state.pot, Chips::new(30));
        assert_eq!(state.bet_to_call, Chips::new(20));
        assert_eq!(state.seat(ids[0]).unwrap().bet, Chips::new(10));
        assert_eq!(state.seat(ids[1]).unwrap().bet, Chips::new(20));
        assert!(state.seat(ids[0]).unwrap().has_button);
        assert_eq!(state.button, Some(ids[0]));
        assert_eq!(bankroll(&game, ids[0]), Chips::new(990));
        assert_eq!(bankroll(&game, ids[1]), Chips::new(980));

        // Heads up the button acts first preflop.
        assert_eq!(state.to_act, Some(ids[0]));

        // Each player got two cards.
        for &id in &ids {
            let cards = game.registry().hole_cards(id).unwrap();
            assert!(matches!(cards, PlayerCards::Cards(_, _)));
        }
    }

    #[test]
    fn state_does_not_change_the_game() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000, 1000]);
        game.start_round(&ids, SMALL_BLIND).unwrap();

        let s1 = game.state();
        let s2 = game.state();
        assert_eq!(s1, s2);
        assert_eq!(game.phase(), Phase::PreFlop);
        assert_eq!(s1.to_act, Some(ids[2]));
    }

    #[test]
    fn fold_out_awards_the_pot() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000, 1000]);
        game.start_round(&ids, SMALL_BLIND).unwrap();

        // Three players: button posts small, next big, the third acts first.
        assert_eq!(game.state().to_act, Some(ids[2]));
        assert!(game.submit_action(ids[2], Action::Fold).unwrap().is_none());

        let res = game.submit_action(ids[0], Action::Fold).unwrap().unwrap();
        assert!(!res.is_showdown());
        assert!(res.board.is_empty());
        assert_eq!(res.winnings(ids[1]), Chips::new(30));

        assert_eq!(bankroll(&game, ids[0]), Chips::new(990));
        assert_eq!(bankroll(&game, ids[1]), Chips::new(1010));
        assert_eq!(bankroll(&game, ids[2]), Chips::new(1000));

        let state = game.state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.pot, Chips::ZERO);
        assert!(state.board.is_empty());
        assert_eq!(game.button(), Some(ids[1]));

        for &id in &ids {
            assert_eq!(game.registry().hole_cards(id), Ok(PlayerCards::None));
        }
    }

    #[test]
    fn fold_out_on_the_flop_deals_no_more_cards() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000]);
        game.start_round(&ids, SMALL_BLIND).unwrap();

        game.submit_action(ids[0], Action::Call).unwrap();
        game.submit_action(ids[1], Action::Check).unwrap();

        let state = game.state();
        assert_eq!(state.phase, Phase::Flop);
        assert_eq!(state.board.len(), 3);

        // Post flop the player left of the button acts first.
        assert_eq!(state.to_act, Some(ids[1]));
        game.submit_action(ids[1], Action::Raise(Chips::new(50)))
            .unwrap();

        let res = game.submit_action(ids[0], Action::Fold).unwrap().unwrap();
        assert_eq!(res.board.len(), 3);
        assert_eq!(res.winnings(ids[1]), Chips::new(90));
        assert_eq!(bankroll(&game, ids[1]), Chips::new(1020));
    }

    #[test]
    fn showdown_straight_flush_wins() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000]);

        // Heads up deal order: big blind, button, big blind, button, board.
        let deck = deck("9S AC 9H KC QC JC TC 9D 2S");
        game.start_round_with_deck(&ids, SMALL_BLIND, deck)
            .unwrap();

        let res = check_down(&mut game);
        assert!(res.is_showdown());
        assert_eq!(res.payoffs.len(), 1);

        let payoff = &res.payoffs[0];
        assert_eq!(payoff.player_id, ids[0]);
        assert_eq!(payoff.chips, Chips::new(40));
        assert_eq!(
            payoff.hand.unwrap().rank(),
            crate::poker::HandRank::StraightFlush
        );

        assert_eq!(bankroll(&game, ids[0]), Chips::new(1020));
        assert_eq!(bankroll(&game, ids[1]), Chips::new(980));
    }

    #[test]
    fn split_pot_odd_chip_goes_left_of_the_button() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000, 1000]);

        // Everybody plays the royal flush on the board.
        let deck = deck("2S 3S 4S 2H 3H 4H AC KC QC JC TC");
        game.start_round_with_deck(&ids, Chips::new(5), deck)
            .unwrap();

        game.submit_action(ids[2], Action::Call).unwrap();
        game.submit_action(ids[0], Action::Fold).unwrap();
        game.submit_action(ids[1], Action::Check).unwrap();

        let res = check_down(&mut game);
        assert_eq!(res.board.len(), 5);
        assert_eq!(res.payoffs.len(), 2);

        // Pot is 25, the player after the button gets the odd chip.
        assert_eq!(res.payoffs[0].player_id, ids[1]);
        assert_eq!(res.payoffs[0].chips, Chips::new(13));
        assert_eq!(res.payoffs[1].player_id, ids[2]);
        assert_eq!(res.payoffs[1].chips, Chips::new(12));

        assert_eq!(total_chips(&game), Chips::new(3000));
    }

    #[test]
    fn all_in_runs_out_the_board() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 50]);

        // Big blind makes a full house.
        let deck = deck("KS 2C KH 7D KD 9H 9D 4C 3S");
        game.start_round_with_deck(&ids, SMALL_BLIND, deck)
            .unwrap();

        game.submit_action(ids[0], Action::Raise(Chips::new(1000)))
            .unwrap();
        let state = game.state();
        assert_eq!(state.seat(ids[0]).unwrap().status, SeatStatus::AllIn);

        // The short call puts the big blind all in and the board runs out.
        let res = game.submit_action(ids[1], Action::Call).unwrap().unwrap();
        assert!(res.is_showdown());
        assert_eq!(res.board.len(), 5);
        assert_eq!(res.winnings(ids[1]), Chips::new(1050));

        assert_eq!(bankroll(&game, ids[0]), Chips::ZERO);
        assert_eq!(bankroll(&game, ids[1]), Chips::new(1050));

        // The busted player leaves the rotation but stays registered.
        assert_eq!(game.rotation(), &[ids[1]]);
        assert!(game.registry().contains(ids[0]));
        assert_eq!(
            game.start_round(&ids, SMALL_BLIND).unwrap_err(),
            GameError::PlayerBusted(ids[0])
        );

        // Re-funded players can be seated again.
        game.credit(ids[0], Chips::new(500)).unwrap();
        assert!(game.start_round(&ids, SMALL_BLIND).is_ok());
    }

    #[test]
    fn blinds_all_in_finish_the_round() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[10, 20]);

        let res = game.start_round(&ids, SMALL_BLIND).unwrap().unwrap();
        assert_eq!(res.board.len(), 5);
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(total_chips(&game), Chips::new(30));
    }

    #[test]
    fn button_rotates_every_round() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000, 1000]);

        for round in 0..6 {
            game.start_round(&ids, SMALL_BLIND).unwrap();
            assert_eq!(game.button(), Some(ids[round % 3]));
            let state = game.state();
            assert!(state.seats[round % 3].has_button);

            // Whoever acts first folds, then the small blind folds.
            let first = state.to_act.unwrap();
            game.submit_action(first, Action::Fold).unwrap();
            let second = game.state().to_act.unwrap();
            assert!(game.submit_action(second, Action::Fold).unwrap().is_some());
        }

        assert_eq!(total_chips(&game), Chips::new(3000));
    }

    #[test]
    fn rejected_actions_keep_the_state() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000, 1000]);

        assert_eq!(
            game.submit_action(ids[0], Action::Fold).unwrap_err(),
            GameError::NoRoundInProgress
        );

        game.start_round(&ids, SMALL_BLIND).unwrap();
        let before = game.state();

        assert_eq!(
            game.submit_action(ids[1], Action::Call).unwrap_err(),
            GameError::OutOfTurn { player_id: ids[1] }
        );
        assert!(matches!(
            game.submit_action(ids[2], Action::Check).unwrap_err(),
            GameError::InvalidAction(_)
        ));
        assert!(matches!(
            game.submit_action(ids[2], Action::Raise(Chips::new(20))).unwrap_err(),
            GameError::InvalidAction(_)
        ));

        assert_eq!(game.state(), before);
    }

    #[test]
    fn start_round_validation() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000, 0]);

        assert_eq!(
            game.start_round(&ids[..1], SMALL_BLIND).unwrap_err(),
            GameError::NotEnoughPlayers(1)
        );
        assert_eq!(
            game.start_round(&[ids[0], ids[0]], SMALL_BLIND).unwrap_err(),
            GameError::DuplicatePlayer(ids[0])
        );
        assert_eq!(
            game.start_round(&ids, SMALL_BLIND).unwrap_err(),
            GameError::PlayerBusted(ids[2])
        );
        assert_eq!(
            game.start_round(&ids[..2], Chips::ZERO).unwrap_err(),
            GameError::InvalidBlind(Chips::ZERO)
        );

        let removed = game.remove_player(ids[2]).unwrap();
        assert_eq!(removed.player_id, ids[2]);
        assert_eq!(
            game.start_round(&ids, SMALL_BLIND).unwrap_err(),
            GameError::UnknownPlayer(ids[2])
        );

        game.start_round(&ids[..2], SMALL_BLIND).unwrap();
        assert_eq!(
            game.start_round(&ids[..2], SMALL_BLIND).unwrap_err(),
            GameError::RoundInProgress
        );
        assert_eq!(
            game.set_small_blind(Chips::new(50)).unwrap_err(),
            GameError::RoundInProgress
        );
        assert_eq!(
            game.remove_player(ids[0]).unwrap_err(),
            GameError::RoundInProgress
        );
    }

    #[test]
    fn abort_refunds_all_bets() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000, 1000]);
        game.start_round(&ids, SMALL_BLIND).unwrap();

        game.submit_action(ids[2], Action::Raise(Chips::new(100)))
            .unwrap();
        game.submit_action(ids[0], Action::Call).unwrap();
        assert_eq!(game.state().pot, Chips::new(220));

        game.abort_round().unwrap();
        for &id in &ids {
            assert_eq!(bankroll(&game, id), Chips::new(1000));
            assert_eq!(game.registry().hole_cards(id), Ok(PlayerCards::None));
        }

        let state = game.state();
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.pot, Chips::ZERO);

        // The button doesn't move on abort.
        assert_eq!(game.button(), Some(ids[0]));
        assert_eq!(game.abort_round(), Err(GameError::NoRoundInProgress));
    }

    #[test]
    fn empty_deck_aborts_the_round() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000]);

        let mut deck = Deck::new_and_shuffled(&mut StdRng::seed_from_u64(3));
        while deck.count() > 3 {
            deck.deal();
        }

        let res = game.start_round_with_deck(&ids, SMALL_BLIND, deck);
        assert_eq!(res.unwrap_err(), GameError::EmptyDeck);
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(bankroll(&game, ids[0]), Chips::new(1000));
        assert_eq!(bankroll(&game, ids[1]), Chips::new(1000));
    }

    #[test]
    fn inactive_player_is_folded() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000]);
        game.start_round(&ids, SMALL_BLIND).unwrap();

        let deadline = game.action_deadline().unwrap();
        assert!(game.expire_action(deadline - Duration::from_millis(1)).unwrap().is_none());
        assert_eq!(game.state().to_act, Some(ids[0]));

        let res = game.expire_action(deadline).unwrap().unwrap();
        assert_eq!(res.winnings(ids[1]), Chips::new(30));
        assert_eq!(game.action_deadline(), None);
        assert!(game.tick().unwrap().is_none());
    }

    #[test]
    fn button_stays_with_its_holder_when_seats_change() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000, 1000, 1000]);

        game.start_round(&ids[..3], SMALL_BLIND).unwrap();
        game.abort_round().unwrap();
        assert_eq!(game.button(), Some(ids[0]));

        // A new player joins in front of the button holder.
        let seats = [ids[3], ids[0], ids[1], ids[2]];
        game.start_round(&seats, SMALL_BLIND).unwrap();
        assert_eq!(game.button(), Some(ids[0]));
        assert_eq!(game.rotation(), &seats);
    }

    #[test]
    fn configured_small_blind_is_used() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000, 1000]);

        game.start_default_round(&ids).unwrap();
        assert_eq!(game.state().pot, Chips::new(30));
        game.abort_round().unwrap();

        game.set_small_blind(Chips::new(50)).unwrap();
        assert_eq!(game.config().small_blind(), Chips::new(50));
        assert_eq!(game.state().small_blind, Chips::new(50));

        game.start_default_round(&ids).unwrap();
        let state = game.state();
        assert_eq!(state.small_blind, Chips::new(50));
        assert_eq!(state.bet_to_call, Chips::new(100));
        assert_eq!(state.pot, Chips::new(150));
        assert_eq!(bankroll(&game, ids[0]), Chips::new(950));
        assert_eq!(bankroll(&game, ids[1]), Chips::new(900));
    }

    #[test]
    fn button_skips_busted_player() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 20, 1000, 1000]);

        // The big blind is all in with the worst hand.
        let deck = deck("2C AS 3C 5C 7D AH 4D 6D KS KH 9D 8S JC");
        game.start_round_with_deck(&ids, SMALL_BLIND, deck)
            .unwrap();

        game.submit_action(ids[2], Action::Call).unwrap();
        game.submit_action(ids[3], Action::Fold).unwrap();
        let res = game.submit_action(ids[0], Action::Fold).unwrap().unwrap();
        assert_eq!(res.board.len(), 5);
        assert_eq!(res.winnings(ids[2]), Chips::new(50));

        assert_eq!(bankroll(&game, ids[1]), Chips::ZERO);
        assert_eq!(game.rotation(), &[ids[0], ids[2], ids[3]]);
        assert_eq!(game.button(), Some(ids[2]));

        // Next round the button posts the small blind.
        let seats = game.rotation().to_vec();
        game.start_round(&seats, SMALL_BLIND).unwrap();
        let state = game.state();
        assert_eq!(state.button, Some(ids[2]));
        assert_eq!(state.seat(ids[2]).unwrap().bet, Chips::new(10));
        assert_eq!(state.seat(ids[3]).unwrap().bet, Chips::new(20));
        assert_eq!(state.to_act, Some(ids[0]));
    }

    #[test]
    fn button_moves_on_when_holder_busts() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[10, 1000, 1000]);

        // The button is all in with the small blind and loses.
        let deck = deck("AS 3C 2C AH 4D 7D KS KH 9D 8S JC");
        game.start_round_with_deck(&ids, SMALL_BLIND, deck)
            .unwrap();

        let res = game.submit_action(ids[2], Action::Fold).unwrap().unwrap();
        assert_eq!(res.winnings(ids[1]), Chips::new(30));

        assert_eq!(bankroll(&game, ids[0]), Chips::ZERO);
        assert_eq!(game.rotation(), &[ids[1], ids[2]]);
        assert_eq!(game.button(), Some(ids[1]));
    }

    #[test]
    fn missing_hole_cards_abort_the_round() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[1000, 1000]);
        game.start_round(&ids, SMALL_BLIND).unwrap();
        game.registry.clear_hand(ids[1]).unwrap();

        game.submit_action(ids[0], Action::Call).unwrap();
        game.submit_action(ids[1], Action::Check).unwrap();
        let err = loop {
            let player_id = game.state().to_act.unwrap();
            match game.submit_action(player_id, Action::Check) {
                Ok(res) => assert!(res.is_none()),
                Err(e) => break e,
            }
        };

        assert_eq!(err, GameError::MissingHoleCards(ids[1]));
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(bankroll(&game, ids[0]), Chips::new(1000));
        assert_eq!(bankroll(&game, ids[1]), Chips::new(1000));
    }

    #[test]
    fn payout_overflow_aborts_the_round() {
        let mut game = new_game();
        let ids = new_players(&mut game, &[u32::MAX - 10, 1000]);

        // The button makes a royal flush.
        let deck = deck("9S AC 9H KC QC JC TC 9D 2S");
        game.start_round_with_deck(&ids, SMALL_BLIND, deck)
            .unwrap();

        game.submit_action(ids[0], Action::Call).unwrap();
        let err = loop {
            let player_id = game.state().to_act.unwrap();
            match game.submit_action(player_id, Action::Check) {
                Ok(res) => assert!(res.is_none()),
                Err(e) => break e,
            }
        };

        assert_eq!(err, GameError::ChipsOverflow(ids[0]));
        assert_eq!(game.phase(), Phase::Idle);
        assert_eq!(bankroll(&game, ids[0]), Chips::new(u32::MAX - 10));
        assert_eq!(bankroll(&game, ids[1]), Chips::new(1000));
    }

    proptest! {
        #[test]
        fn chips_are_conserved(seed in any::<u64>(), choices in proptest::collection::vec(0u8..8, 1..200)) {
            let mut game = Game::with_rng(TableConfig::default(), StdRng::seed_from_u64(seed));
            let ids = new_players(&mut game, &[300, 500, 200, 400]);
            let total = Chips::new(1400);

            for choice in choices {
                let state = game.state();
                match state.to_act {
                    None => {
                        let seats = game.rotation().to_vec();
                        let seats = if seats.len() < 2 { ids.clone() } else { seats };
                        if seats.iter().filter(|&&id| !bankroll(&game, id).is_zero()).count() < 2 {
                            break;
                        }
                        let seats = seats
                            .into_iter()
                            .filter(|&id| !bankroll(&game, id).is_zero())
                            .collect::<Vec<_>>();
                        let _ = game.start_round(&seats, SMALL_BLIND);
                    }
                    Some(player_id) => {
                        let to_call = state.to_call(player_id);
                        let chips = state.seat(player_id).unwrap().chips;
                        let action = match choice {
                            0 => Action::Fold,
                            1 | 2 if to_call.is_zero() => Action::Check,
                            1 | 2 => Action::Call,
                            3 => Action::Raise(state.bet_to_call + chips),
                            _ => Action::Raise(state.bet_to_call + Chips::new(20)),
                        };

                        // Rejected actions must not move chips.
                        if game.submit_action(player_id, action).is_err() {
                            let action = if to_call.is_zero() { Action::Check } else { Action::Call };
                            game.submit_action(player_id, action).unwrap();
                        }
                    }
                }

                prop_assert_eq!(total_chips(&game), total);
            }
        }
    }
}
