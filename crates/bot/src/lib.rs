// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Riverboat bots.
//!
//! Runs a table with automated players, each bot is a task that reacts to the
//! table action requests using a [Strategy].
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

mod client;
pub use client::{Config, Strategy, run};

mod strategy;
pub use strategy::{CallOrCheck, Random};

pub use riverboat_table::{self as table, core};
