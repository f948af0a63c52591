// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Riverboat poker hand evaluator.
//!
//! Poker hand evaluator for 5, 6 and 7 cards hands. The evaluator scores every
//! 5 cards combination of the hand and returns the best one as a [HandValue],
//! values are totally ordered so hands can be compared directly:
//!
//! ```
//! # use riverboat_eval::*;
//! let cards = |s: &str| {
//!     s.split_whitespace()
//!         .map(|c| c.parse::<Card>().unwrap())
//!         .collect::<Vec<_>>()
//! };
//!
//! let full_house = HandValue::eval(&cards("2C 2S 2H 9D 9C")).unwrap();
//! let straight_flush = HandValue::eval(&cards("AC KC QC JC TC")).unwrap();
//! assert_eq!(straight_flush.rank(), HandRank::StraightFlush);
//! assert!(straight_flush > full_house);
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
pub mod eval;
pub use eval::{EvalError, HandRank, HandValue};

// Reexport cards types.
pub use riverboat_cards::{Card, Deck, Rank, Suit};
