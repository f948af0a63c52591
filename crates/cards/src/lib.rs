// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Riverboat cards types.
//!
//! This crate defines the card value types:
//!
//! ```
//! # use riverboat_cards::{Card, Rank, Suit};
//! let ah = Card::new(Rank::Ace, Suit::Hearts);
//! let td: Card = "TD".parse().unwrap();
//! assert_eq!(td.rank(), Rank::Ten);
//! assert_eq!(ah.to_string(), "AH");
//! ```
//!
//! and a [Deck] that deals shuffled cards from the top:
//!
//! ```
//! # use riverboat_cards::Deck;
//! let mut deck = Deck::new_and_shuffled(&mut rand::rng());
//! let mut dealt = 0;
//! while deck.deal().is_some() {
//!     dealt += 1;
//! }
//! assert_eq!(dealt, Deck::SIZE);
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
mod deck;
pub use deck::{Card, Deck, DeckError, ParseCardError, Rank, Suit};
