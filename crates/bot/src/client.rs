// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Automated table players.
use anyhow::{Result, bail};
use log::{error, info, warn};
use rand::{SeedableRng, rngs::StdRng};
use std::{sync::Arc, time::Duration};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};

use riverboat_table::{
    Table, TableEvent,
    core::{Action, Chips, Game, GameError, GameState, PlayerId, RoundResult, TableConfig},
};

/// A Poker bot strategy.
pub trait Strategy: Send + 'static {
    /// Chooses an action for the player given the game state.
    fn execute(&mut self, player_id: PlayerId, state: &GameState) -> Action;
}

/// Simulation configuration.
#[derive(Debug)]
pub struct Config {
    /// Number of bots at the table.
    pub players: u8,
    /// Starting chips for each bot.
    pub chips: Chips,
    /// The small blind.
    pub small_blind: Chips,
    /// Maximum number of rounds to play.
    pub rounds: usize,
    /// How long a bot has to act.
    pub action_timeout: Duration,
    /// Seed for the table deck, a random seed if none.
    pub seed: Option<u64>,
}

static NICKNAMES: &[&str] = &["Alice", "Bob", "Carol", "Dave", "Frank", "Mike"];

/// Runs a table with bots created by the factory, called with the bot index.
///
/// Plays until one bot has all the chips or the rounds limit is reached and
/// returns each bot final bankroll.
pub async fn run<F, S>(config: Config, factory: F) -> Result<Vec<(PlayerId, Chips)>>
where
    F: Fn(usize) -> S,
    S: Strategy,
{
    let table_config = TableConfig::new(config.small_blind, config.action_timeout)?;
    let game = match config.seed {
        Some(seed) => Game::with_rng(table_config, StdRng::seed_from_u64(seed)),
        None => Game::new(table_config),
    };

    let (shutdown_broadcast_tx, _) = broadcast::channel(1);
    let (shutdown_complete_tx, mut shutdown_complete_rx) = mpsc::channel(1);

    let table = Arc::new(Table::with_game(
        game,
        shutdown_broadcast_tx.subscribe(),
        shutdown_complete_tx.clone(),
    ));

    let mut player_ids = Vec::with_capacity(config.players as usize);
    for idx in 0..config.players as usize {
        let nickname = match NICKNAMES.get(idx) {
            Some(name) => name.to_string(),
            None => format!("Bot{idx}"),
        };

        let player_id = table.register(&nickname, config.chips).await?;
        player_ids.push(player_id);

        let mut client = Client {
            player_id,
            strategy: factory(idx),
            table: table.clone(),
            events_rx: table.subscribe(),
            shutdown_broadcast_rx: shutdown_broadcast_tx.subscribe(),
            _shutdown_complete_tx: shutdown_complete_tx.clone(),
        };

        tokio::spawn(async move {
            if let Err(err) = client.run().await {
                error!("Bot {player_id} error: {err}");
            }

            info!("Bot {player_id} stopped");
        });
    }

    let mut events = table.subscribe();
    let mut seats = player_ids.clone();

    for round in 1..=config.rounds {
        if seats.len() < 2 {
            break;
        }

        info!("Round {round} with {} players", seats.len());
        if let Err(e) = table.start_round(&seats).await {
            error!("Round {round} failed to start: {e}");
            break;
        }

        match wait_round_end(&mut events).await? {
            Some(res) => {
                for payoff in &res.payoffs {
                    match payoff.hand {
                        Some(hand) => info!(
                            "Round {round}: {} wins {} with {}",
                            payoff.player_id,
                            payoff.chips,
                            hand.rank()
                        ),
                        None => info!(
                            "Round {round}: {} wins {}",
                            payoff.player_id, payoff.chips
                        ),
                    }
                }
            }
            None => warn!("Round {round} aborted"),
        }

        seats = table.rotation().await?;
    }

    let mut bankrolls = Vec::with_capacity(player_ids.len());
    for player_id in player_ids {
        bankrolls.push((player_id, table.bankroll(player_id).await?));
    }

    // Signal tasks to shutdown and wait for them to complete.
    drop(shutdown_broadcast_tx);
    drop(shutdown_complete_tx);
    let _ = shutdown_complete_rx.recv().await;

    Ok(bankrolls)
}

/// Waits for the end of the round, returns none if the round was aborted.
async fn wait_round_end(
    events: &mut broadcast::Receiver<TableEvent>,
) -> Result<Option<RoundResult>> {
    loop {
        match events.recv().await {
            Ok(TableEvent::RoundEnded(res)) => return Ok(Some(res)),
            Ok(TableEvent::RoundAborted) => return Ok(None),
            Ok(TableEvent::ActionRequest { .. }) => {}
            Err(RecvError::Lagged(n)) => warn!("Skipped {n} table events"),
            Err(RecvError::Closed) => bail!("Table closed"),
        }
    }
}

/// A bot seated at a table.
struct Client<S> {
    player_id: PlayerId,
    strategy: S,
    table: Arc<Table>,
    events_rx: broadcast::Receiver<TableEvent>,
    /// Channel for listening shutdown notification.
    shutdown_broadcast_rx: broadcast::Receiver<()>,
    /// Sender that drops when this client is done.
    _shutdown_complete_tx: mpsc::Sender<()>,
}

impl<S: Strategy> Client<S> {
    /// Runs the client events loop.
    async fn run(&mut self) -> Result<()> {
        loop {
            let event = tokio::select! {
                _ = self.shutdown_broadcast_rx.recv() => return Ok(()),
                res = self.events_rx.recv() => match res {
                    Ok(event) => event,
                    Err(RecvError::Lagged(n)) => {
                        warn!("Bot {} skipped {n} events", self.player_id);
                        continue;
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
            };

            if let TableEvent::ActionRequest { player_id, state } = event {
                if player_id == self.player_id {
                    self.act(&state).await?;
                }
            }
        }
    }

    async fn act(&mut self, state: &GameState) -> Result<()> {
        let action = self.strategy.execute(self.player_id, state);
        match self.table.act(self.player_id, action).await {
            Ok(_) => Ok(()),
            Err(e) => match e.downcast_ref::<GameError>() {
                // The table may have folded this player on timeout.
                Some(GameError::OutOfTurn { .. }) | Some(GameError::NoRoundInProgress) => Ok(()),
                Some(GameError::InvalidAction(reason)) => {
                    warn!("Bot {} {action} rejected: {reason}", self.player_id);
                    if let Err(e) = self.table.act(self.player_id, Action::Fold).await {
                        warn!("Bot {} fold rejected: {e}", self.player_id);
                    }
                    Ok(())
                }
                Some(err) => {
                    warn!("Bot {} {action} failed: {err}", self.player_id);
                    Ok(())
                }
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CallOrCheck, Random};

    fn config(players: u8, rounds: usize) -> Config {
        Config {
            players,
            chips: Chips::new(1_000),
            small_blind: Chips::new(10),
            rounds,
            action_timeout: Duration::from_secs(5),
            seed: Some(7),
        }
    }

    #[tokio::test]
    async fn call_or_check_bots_conserve_chips() {
        let bankrolls = run(config(3, 5), |_| CallOrCheck).await.unwrap();
        assert_eq!(bankrolls.len(), 3);

        let total = bankrolls.iter().map(|(_, chips)| *chips).sum::<Chips>();
        assert_eq!(total, Chips::new(3_000));
    }

    #[tokio::test]
    async fn random_bots_conserve_chips() {
        let bankrolls = run(config(5, 30), |idx| Random::new(idx as u64))
            .await
            .unwrap();

        let total = bankrolls.iter().map(|(_, chips)| *chips).sum::<Chips>();
        assert_eq!(total, Chips::new(5_000));
    }

    #[tokio::test]
    async fn invalid_config() {
        let mut config = config(2, 1);
        config.small_blind = Chips::ZERO;
        assert!(run(config, |_| CallOrCheck).await.is_err());
    }
}
