// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Table configuration.
use std::time::Duration;

use crate::{error::GameError, poker::Chips};

/// Validated table settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    small_blind: Chips,
    action_timeout: Duration,
}

impl TableConfig {
    /// The default small blind, the big blind is always twice the small blind.
    pub const DEFAULT_SMALL_BLIND: Chips = Chips::new(10);
    /// The default time a player has to act before being folded.
    pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(15);

    /// Creates a config, fails if the blind or the timeout are zero.
    pub fn new(small_blind: Chips, action_timeout: Duration) -> Result<Self, GameError> {
        if small_blind.is_zero() {
            return Err(GameError::InvalidBlind(small_blind));
        }

        if action_timeout.is_zero() {
            return Err(GameError::InvalidConfig("action timeout must be positive"));
        }

        Ok(Self {
            small_blind,
            action_timeout,
        })
    }

    /// The small blind.
    pub fn small_blind(&self) -> Chips {
        self.small_blind
    }

    /// The big blind.
    pub fn big_blind(&self) -> Chips {
        self.small_blind * 2
    }

    /// How long a player has to act.
    pub fn action_timeout(&self) -> Duration {
        self.action_timeout
    }

    pub(crate) fn set_small_blind(&mut self, small_blind: Chips) -> Result<(), GameError> {
        *self = Self::new(small_blind, self.action_timeout)?;
        Ok(())
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            small_blind: Self::DEFAULT_SMALL_BLIND,
            action_timeout: Self::DEFAULT_ACTION_TIMEOUT,
        }
    }
}
