// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Betting round engine.
//!
//! A [BettingRound] drives a single street: it tracks the bet to call, each
//! player contribution on this street and who has to act next. Chips move
//! from the [PlayerRegistry] to the [Pot] exactly once for each action.
use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    error::{GameError, InvalidAction},
    poker::{Chips, PlayerId},
    registry::PlayerRegistry,
};

/// A player betting action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Give up the hand.
    Fold,
    /// Pass when there is nothing to call.
    Check,
    /// Match the bet to call.
    Call,
    /// Raise the bet to the given street total.
    Raise(Chips),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Fold => write!(f, "fold"),
            Action::Check => write!(f, "check"),
            Action::Call => write!(f, "call"),
            Action::Raise(amount) => write!(f, "raise to {amount}"),
        }
    }
}

/// A player status in the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatStatus {
    /// The player is in the hand and has chips to bet.
    Live,
    /// The player is in the hand with no chips left.
    AllIn,
    /// The player has folded.
    Folded,
}

/// The street state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreetState {
    /// Waiting for the player to act.
    AwaitingAction(PlayerId),
    /// No more actions on this street.
    StreetComplete,
}

/// The chips collected during a round.
#[derive(Debug, Default, Clone)]
pub struct Pot {
    chips: Chips,
    contributions: AHashMap<PlayerId, Chips>,
}

impl Pot {
    /// Adds a player contribution.
    pub fn collect(&mut self, player_id: PlayerId, chips: Chips) {
        self.chips += chips;
        *self.contributions.entry(player_id).or_default() += chips;
    }

    /// The pot total.
    pub fn chips(&self) -> Chips {
        self.chips
    }

    /// How much a player put in the pot.
    pub fn contributed(&self, player_id: PlayerId) -> Chips {
        self.contributions
            .get(&player_id)
            .copied()
            .unwrap_or_default()
    }

    /// Empties the pot returning its chips.
    pub fn take(&mut self) -> Chips {
        self.contributions.clear();
        std::mem::take(&mut self.chips)
    }

    /// Empties the pot returning each player contribution.
    pub fn refunds(&mut self) -> Vec<(PlayerId, Chips)> {
        self.chips = Chips::ZERO;
        self.contributions.drain().collect()
    }
}

#[derive(Debug, Clone)]
struct Seat {
    player_id: PlayerId,
    status: SeatStatus,
    /// Chips put in the pot on this street.
    contribution: Chips,
    /// The player has to act before the street completes.
    pending: bool,
}

/// A betting street.
#[derive(Debug, Clone)]
pub struct BettingRound {
    seats: Vec<Seat>,
    bet_to_call: Chips,
    to_act: Option<usize>,
}

impl BettingRound {
    /// Starts a new street.
    ///
    /// The players are given in seat order with their status, the action
    /// starts from the `starting_actor` seat or the first seat after it that
    /// can act. Fails if there are no players.
    pub fn start(
        players: &[(PlayerId, SeatStatus)],
        starting_actor: usize,
    ) -> Result<Self, GameError> {
        if players.is_empty() {
            return Err(GameError::NoPlayers);
        }

        let seats = players
            .iter()
            .map(|&(player_id, status)| Seat {
                player_id,
                status,
                contribution: Chips::ZERO,
                pending: status == SeatStatus::Live,
            })
            .collect::<Vec<_>>();

        let mut round = Self {
            seats,
            bet_to_call: Chips::ZERO,
            to_act: None,
        };

        round.update_to_act(starting_actor % players.len());
        Ok(round)
    }

    /// Posts a forced bet for the player at `seat`.
    ///
    /// A player who cannot cover the blind goes all in. The bet to call is the
    /// full blind even when the blind is short. Posting a blind doesn't count
    /// as acting. Returns the posted amount.
    pub fn post_blind(
        &mut self,
        registry: &mut PlayerRegistry,
        pot: &mut Pot,
        seat: usize,
        blind: Chips,
    ) -> Result<Chips, GameError> {
        let idx = seat % self.seats.len();
        let player_id = self.seats[idx].player_id;
        let amount = blind.min(registry.bankroll(player_id)?);

        self.commit(registry, pot, idx, amount)?;
        self.bet_to_call = self.bet_to_call.max(blind);

        let from = self.to_act.unwrap_or(idx);
        self.update_to_act(from);

        Ok(amount)
    }

    /// Handles an action from a player.
    ///
    /// Actions from a player who is not the one to act fail with
    /// [GameError::OutOfTurn], illegal actions fail with
    /// [GameError::InvalidAction]; in both cases nothing changes.
    pub fn act(
        &mut self,
        registry: &mut PlayerRegistry,
        pot: &mut Pot,
        player_id: PlayerId,
        action: Action,
    ) -> Result<StreetState, GameError> {
        let idx = match self.to_act {
            Some(idx) if self.seats[idx].player_id == player_id => idx,
            _ => return Err(GameError::OutOfTurn { player_id }),
        };

        let contribution = self.seats[idx].contribution;
        match action {
            Action::Fold => {
                self.seats[idx].status = SeatStatus::Folded;
            }
            Action::Check => {
                if contribution < self.bet_to_call {
                    let to_call = self.bet_to_call - contribution;
                    return Err(InvalidAction::CheckFacingBet { to_call }.into());
                }
            }
            Action::Call => {
                let to_call = self.bet_to_call - contribution;
                if to_call.is_zero() {
                    return Err(InvalidAction::NothingToCall.into());
                }

                // A short call puts the player all in.
                let amount = to_call.min(registry.bankroll(player_id)?);
                self.commit(registry, pot, idx, amount)?;
            }
            Action::Raise(amount) => {
                if amount <= self.bet_to_call {
                    let bet_to_call = self.bet_to_call;
                    return Err(InvalidAction::RaiseTooSmall {
                        amount,
                        bet_to_call,
                    }
                    .into());
                }

                let max = contribution + registry.bankroll(player_id)?;
                if amount > max {
                    return Err(InvalidAction::RaiseExceedsBankroll { amount, max }.into());
                }

                self.commit(registry, pot, idx, amount - contribution)?;
                self.bet_to_call = amount;

                // Everybody else who can still bet has to act again.
                for (i, seat) in self.seats.iter_mut().enumerate() {
                    if i != idx && seat.status == SeatStatus::Live {
                        seat.pending = true;
                    }
                }
            }
        }

        self.seats[idx].pending = false;
        debug!(
            "Player {player_id} {action}, bet to call {}, pot {}",
            self.bet_to_call,
            pot.chips()
        );

        self.update_to_act(idx + 1);
        Ok(self.state())
    }

    /// The current street state.
    pub fn state(&self) -> StreetState {
        match self.to_act {
            Some(idx) => StreetState::AwaitingAction(self.seats[idx].player_id),
            None => StreetState::StreetComplete,
        }
    }

    /// The player who has to act.
    pub fn to_act(&self) -> Option<PlayerId> {
        self.to_act.map(|idx| self.seats[idx].player_id)
    }

    /// The amount each player has to match on this street.
    pub fn bet_to_call(&self) -> Chips {
        self.bet_to_call
    }

    /// A player contribution on this street.
    pub fn contribution(&self, player_id: PlayerId) -> Chips {
        self.seat(player_id)
            .map(|s| s.contribution)
            .unwrap_or_default()
    }

    /// A player status.
    pub fn status(&self, player_id: PlayerId) -> Option<SeatStatus> {
        self.seat(player_id).map(|s| s.status)
    }

    /// The players in seat order with their status.
    pub fn players(&self) -> Vec<(PlayerId, SeatStatus)> {
        self.seats.iter().map(|s| (s.player_id, s.status)).collect()
    }

    /// The number of players who haven't folded.
    pub fn live_count(&self) -> usize {
        self.seats
            .iter()
            .filter(|s| s.status != SeatStatus::Folded)
            .count()
    }

    /// Checks if the street is complete.
    ///
    /// A street completes when a single player is left, when every player
    /// who can bet has acted since the last raise, or when at most one player
    /// has chips behind and has matched the bet.
    pub fn is_complete(&self) -> bool {
        if self.live_count() <= 1 {
            return true;
        }

        if !self.seats.iter().any(|s| s.pending) {
            return true;
        }

        let mut with_chips = self.seats.iter().filter(|s| s.status == SeatStatus::Live);
        with_chips.clone().count() <= 1 && with_chips.all(|s| s.contribution >= self.bet_to_call)
    }

    fn seat(&self, player_id: PlayerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.player_id == player_id)
    }

    fn commit(
        &mut self,
        registry: &mut PlayerRegistry,
        pot: &mut Pot,
        idx: usize,
        amount: Chips,
    ) -> Result<(), GameError> {
        let seat = &mut self.seats[idx];
        registry.debit(seat.player_id, amount)?;
        pot.collect(seat.player_id, amount);
        seat.contribution += amount;

        if registry.bankroll(seat.player_id)?.is_zero() {
            seat.status = SeatStatus::AllIn;
            seat.pending = false;
        }

        Ok(())
    }

    fn update_to_act(&mut self, from: usize) {
        let n = self.seats.len();
        self.to_act = if self.is_complete() {
            None
        } else {
            (0..n)
                .map(|i| (from + i) % n)
                .find(|&i| self.seats[i].pending)
        };
    }
}
