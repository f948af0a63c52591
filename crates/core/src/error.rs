// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Game errors.
use thiserror::Error;

use crate::poker::{Chips, EvalError, PlayerId};

/// Errors returned by the round engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The evaluator was given a malformed hand.
    #[error("invalid hand: {0}")]
    InvalidHand(#[from] EvalError),
    /// A player acted when it wasn't their turn.
    #[error("player {player_id} acted out of turn")]
    OutOfTurn {
        /// The player who tried to act.
        player_id: PlayerId,
    },
    /// A debit beyond a player bankroll.
    #[error("player {player_id} needs {needed} chips but has {available}")]
    InsufficientFunds {
        /// The player being debited.
        player_id: PlayerId,
        /// The debit amount.
        needed: Chips,
        /// The player bankroll.
        available: Chips,
    },
    /// A credit would overflow a player bankroll.
    #[error("player {0} bankroll overflow")]
    ChipsOverflow(PlayerId),
    /// A player in the showdown has no hole cards.
    #[error("player {0} has no hole cards")]
    MissingHoleCards(PlayerId),
    /// More cards were requested than remain in the deck.
    #[error("the deck is empty")]
    EmptyDeck,
    /// An action that is not legal in the current betting state.
    #[error("invalid action: {0}")]
    InvalidAction(#[from] InvalidAction),
    /// The player id is not in the registry.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// The same player was seated twice.
    #[error("player {0} is seated more than once")]
    DuplicatePlayer(PlayerId),
    /// The player cannot be seated without chips.
    #[error("player {0} has no chips")]
    PlayerBusted(PlayerId),
    /// A round needs at least two players.
    #[error("a round needs at least 2 players, got {0}")]
    NotEnoughPlayers(usize),
    /// A betting round was started without players.
    #[error("a betting round needs at least one player")]
    NoPlayers,
    /// The blind must be positive.
    #[error("invalid small blind {0}")]
    InvalidBlind(Chips),
    /// A configuration value is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// The operation is not allowed while a round is in progress.
    #[error("a round is in progress")]
    RoundInProgress,
    /// The operation needs a round in progress.
    #[error("no round in progress")]
    NoRoundInProgress,
}

impl GameError {
    /// Checks if this error is an engine invariant violation.
    ///
    /// A structural error aborts the round in progress, all other errors are
    /// rejected without changing the game state.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GameError::InvalidHand(_)
                | GameError::InsufficientFunds { .. }
                | GameError::ChipsOverflow(_)
                | GameError::MissingHoleCards(_)
                | GameError::EmptyDeck
        )
    }
}

/// The reason a betting action was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidAction {
    /// Check with an outstanding bet.
    #[error("cannot check facing a bet of {to_call}")]
    CheckFacingBet {
        /// The amount the player has to call.
        to_call: Chips,
    },
    /// Call when the player already matches the bet.
    #[error("nothing to call")]
    NothingToCall,
    /// A raise that is not above the current bet.
    #[error("raise to {amount} must be above the bet of {bet_to_call}")]
    RaiseTooSmall {
        /// The requested raise.
        amount: Chips,
        /// The current bet to call.
        bet_to_call: Chips,
    },
    /// A raise the player cannot afford.
    #[error("raise to {amount} exceeds the maximum of {max}")]
    RaiseExceedsBankroll {
        /// The requested raise.
        amount: Chips,
        /// The largest raise the player can make.
        max: Chips,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_errors() {
        assert!(GameError::EmptyDeck.is_structural());
        assert!(GameError::ChipsOverflow(PlayerId::new(1)).is_structural());
        assert!(GameError::MissingHoleCards(PlayerId::new(1)).is_structural());
        assert!(GameError::InvalidHand(EvalError::InvalidSize(3)).is_structural());
        assert!(!GameError::OutOfTurn { player_id: PlayerId::new(1) }.is_structural());
        assert!(!GameError::from(InvalidAction::NothingToCall).is_structural());
    }

    #[test]
    fn error_messages() {
        let e = GameError::from(InvalidAction::CheckFacingBet {
            to_call: Chips::new(1_500),
        });
        assert_eq!(e.to_string(), "invalid action: cannot check facing a bet of 1,500");

        let e = GameError::InsufficientFunds {
            player_id: PlayerId::new(3),
            needed: Chips::new(20),
            available: Chips::new(5),
        };
        assert_eq!(e.to_string(), "player P3 needs 20 chips but has 5");
    }
}
