// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Bot strategies.
use rand::{Rng, SeedableRng, rngs::StdRng};

use riverboat_table::core::{Action, GameState, PlayerId};

use crate::Strategy;

/// Always calls a bet or checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOrCheck;

impl Strategy for CallOrCheck {
    fn execute(&mut self, player_id: PlayerId, state: &GameState) -> Action {
        if state.to_call(player_id).is_zero() {
            Action::Check
        } else {
            Action::Call
        }
    }
}

/// Plays legal actions at random.
///
/// Folds about 10% of the time when facing a bet, raises about 15% of the
/// time by one to four big blinds, never raising more than the bankroll.
#[derive(Debug, Clone)]
pub struct Random {
    rng: StdRng,
}

impl Random {
    /// Creates a strategy with seeded randomness.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// Creates a strategy with the given rng.
    pub fn with_rng(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl Strategy for Random {
    fn execute(&mut self, player_id: PlayerId, state: &GameState) -> Action {
        let to_call = state.to_call(player_id);
        let (chips, bet) = state
            .seat(player_id)
            .map(|s| (s.chips, s.bet))
            .unwrap_or_default();

        let p = self.rng.random::<f64>();
        if p < 0.1 && !to_call.is_zero() {
            return Action::Fold;
        }

        if p < 0.25 && chips > to_call {
            let big_blind = state.small_blind * 2;
            let raise = big_blind * self.rng.random_range(1..=4);
            let amount = (state.bet_to_call + raise).min(bet + chips);
            if amount > state.bet_to_call {
                return Action::Raise(amount);
            }
        }

        if to_call.is_zero() {
            Action::Check
        } else {
            Action::Call
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}
