// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Riverboat No-Limit Texas Hold'em round engine.
//!
//! The [Game] orchestrator owns the [PlayerRegistry] and runs one round at a
//! time, betting on each street is handled by a [BettingRound] and hands are
//! compared with the [HandValue] evaluator.
//!
//! ```
//! use riverboat_core::{Action, Chips, Game, TableConfig};
//!
//! let mut game = Game::new(TableConfig::default());
//! let alice = game.register_player("Alice", Chips::new(1_000));
//! let bob = game.register_player("Bob", Chips::new(1_000));
//!
//! game.start_round(&[alice, bob], Chips::new(10)).unwrap();
//! assert_eq!(game.state().pot, Chips::new(30));
//!
//! let res = game.submit_action(alice, Action::Fold).unwrap().unwrap();
//! assert_eq!(res.winnings(bob), Chips::new(30));
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

pub mod betting;
pub mod config;
pub mod error;
pub mod game;
pub mod poker;
pub mod registry;

pub use betting::{Action, BettingRound, Pot, SeatStatus, StreetState};
pub use config::TableConfig;
pub use error::{GameError, InvalidAction};
pub use game::{Game, GameState, Payoff, Phase, RoundResult, SeatView};
pub use poker::{Card, Chips, Deck, HandRank, HandValue, PlayerCards, PlayerId, Rank, Suit};
pub use registry::{Player, PlayerRegistry};
