// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Riverboat table service.
//!
//! A [Table] is a handle to a task that owns a [Game](riverboat_core::Game),
//! requests from many clients are queued and applied one at a time.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

pub mod table;
pub use table::{Table, TableEvent};

pub use riverboat_core as core;
