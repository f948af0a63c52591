// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Table handle and task.
use anyhow::Result;
use log::{error, info, warn};
use std::time::{Duration, Instant};
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time,
};

use riverboat_core::{
    Action, Chips, Game, GameError, GameState, PlayerId, RoundResult, TableConfig,
};

/// How often the table checks for expired actions.
const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// An event broadcast to the table subscribers.
#[derive(Debug, Clone)]
pub enum TableEvent {
    /// A player has to act.
    ActionRequest {
        /// The player who has to act.
        player_id: PlayerId,
        /// The game state when the request was made.
        state: GameState,
    },
    /// A round has ended and the pot has been awarded.
    RoundEnded(RoundResult),
    /// A round was aborted and all bets were returned.
    RoundAborted,
}

/// Handle to a table task.
#[derive(Debug)]
pub struct Table {
    /// Channel for sending commands.
    commands_tx: mpsc::Sender<TableCommand>,
    /// Channel for the table events.
    events_tx: broadcast::Sender<TableEvent>,
}

type Reply<T> = oneshot::Sender<Result<T, GameError>>;

/// Command for the table task.
#[derive(Debug)]
enum TableCommand {
    /// Register a new player.
    Register {
        nickname: String,
        chips: Chips,
        resp_tx: oneshot::Sender<PlayerId>,
    },
    /// Add chips to a player.
    Credit {
        player_id: PlayerId,
        chips: Chips,
        resp_tx: Reply<()>,
    },
    /// Change the small blind for the next rounds.
    SetSmallBlind {
        small_blind: Chips,
        resp_tx: Reply<()>,
    },
    /// Start a round with the given players.
    StartRound {
        player_ids: Vec<PlayerId>,
        resp_tx: Reply<Option<RoundResult>>,
    },
    /// A player action.
    Act {
        player_id: PlayerId,
        action: Action,
        resp_tx: Reply<Option<RoundResult>>,
    },
    /// Abort the round in progress.
    Abort(Reply<()>),
    /// Get the game state.
    State(oneshot::Sender<GameState>),
    /// Get a player bankroll.
    Bankroll {
        player_id: PlayerId,
        resp_tx: Reply<Chips>,
    },
    /// Get the players rotation.
    Rotation(oneshot::Sender<Vec<PlayerId>>),
}

impl Table {
    /// Creates a new table that owns a game with the given config.
    pub fn new(
        config: TableConfig,
        shutdown_broadcast_rx: broadcast::Receiver<()>,
        shutdown_complete_tx: mpsc::Sender<()>,
    ) -> Self {
        Self::with_game(
            Game::new(config),
            shutdown_broadcast_rx,
            shutdown_complete_tx,
        )
    }

    /// Creates a new table that owns the given game.
    pub fn with_game(
        game: Game,
        shutdown_broadcast_rx: broadcast::Receiver<()>,
        shutdown_complete_tx: mpsc::Sender<()>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(128);
        let (events_tx, _) = broadcast::channel(256);

        let mut task = TableTask {
            game,
            commands_rx,
            events_tx: events_tx.clone(),
            shutdown_broadcast_rx,
            _shutdown_complete_tx: shutdown_complete_tx,
        };

        tokio::spawn(async move {
            if let Err(err) = task.run().await {
                error!("Table error {err}");
            }

            info!("Table task stopped");
        });

        Self {
            commands_tx,
            events_tx,
        }
    }

    /// Subscribes to the table events.
    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.events_tx.subscribe()
    }

    /// Registers a new player.
    pub async fn register(&self, nickname: &str, chips: Chips) -> Result<PlayerId> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(TableCommand::Register {
            nickname: nickname.to_string(),
            chips,
            resp_tx,
        })
        .await?;

        Ok(resp_rx.await?)
    }

    /// Adds chips to a player.
    pub async fn credit(&self, player_id: PlayerId, chips: Chips) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(TableCommand::Credit {
            player_id,
            chips,
            resp_tx,
        })
        .await?;

        Ok(resp_rx.await??)
    }

    /// Sets the small blind used by the next rounds.
    ///
    /// Fails if a round is in progress or the blind is zero.
    pub async fn set_small_blind(&self, small_blind: Chips) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(TableCommand::SetSmallBlind {
            small_blind,
            resp_tx,
        })
        .await?;

        Ok(resp_rx.await??)
    }

    /// Starts a round with the players in seat order and the table blind.
    pub async fn start_round(&self, player_ids: &[PlayerId]) -> Result<Option<RoundResult>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(TableCommand::StartRound {
            player_ids: player_ids.to_vec(),
            resp_tx,
        })
        .await?;

        Ok(resp_rx.await??)
    }

    /// Handles a player action.
    ///
    /// Fails with a [GameError] if the action was rejected.
    pub async fn act(&self, player_id: PlayerId, action: Action) -> Result<Option<RoundResult>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(TableCommand::Act {
            player_id,
            action,
            resp_tx,
        })
        .await?;

        Ok(resp_rx.await??)
    }

    /// Aborts the round in progress.
    pub async fn abort(&self) -> Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(TableCommand::Abort(resp_tx)).await?;
        Ok(resp_rx.await??)
    }

    /// Returns the game state.
    pub async fn state(&self) -> Result<GameState> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(TableCommand::State(resp_tx)).await?;
        Ok(resp_rx.await?)
    }

    /// Returns a player bankroll.
    pub async fn bankroll(&self, player_id: PlayerId) -> Result<Chips> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(TableCommand::Bankroll { player_id, resp_tx })
            .await?;
        Ok(resp_rx.await??)
    }

    /// Returns the players who are still in the rotation.
    pub async fn rotation(&self) -> Result<Vec<PlayerId>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(TableCommand::Rotation(resp_tx)).await?;
        Ok(resp_rx.await?)
    }

    async fn send(&self, cmd: TableCommand) -> Result<()> {
        self.commands_tx
            .send(cmd)
            .await
            .map_err(|_| anyhow::anyhow!("Table task stopped"))
    }
}

struct TableTask {
    /// The game owned by this table.
    game: Game,
    /// Channel for receiving table commands.
    commands_rx: mpsc::Receiver<TableCommand>,
    /// Channel for sending table events.
    events_tx: broadcast::Sender<TableEvent>,
    /// Channel for listening shutdown notification.
    shutdown_broadcast_rx: broadcast::Receiver<()>,
    /// Sender that drops when this table is done.
    _shutdown_complete_tx: mpsc::Sender<()>,
}

impl TableTask {
    async fn run(&mut self) -> Result<()> {
        let mut ticks = time::interval(TICK_INTERVAL);

        loop {
            tokio::select! {
                // Shutting down exit this handler.
                _ = self.shutdown_broadcast_rx.recv() => break Ok(()),
                _ = ticks.tick() => {
                    self.tick();
                }
                // We have received a command from a client.
                res = self.commands_rx.recv() => match res {
                    Some(cmd) => self.command(cmd),
                    None => break Ok(()),
                },
            }
        }
    }

    fn command(&mut self, cmd: TableCommand) {
        match cmd {
            TableCommand::Register {
                nickname,
                chips,
                resp_tx,
            } => {
                let player_id = self.game.register_player(nickname, chips);
                let _ = resp_tx.send(player_id);
            }
            TableCommand::Credit {
                player_id,
                chips,
                resp_tx,
            } => {
                let _ = resp_tx.send(self.game.credit(player_id, chips));
            }
            TableCommand::SetSmallBlind {
                small_blind,
                resp_tx,
            } => {
                let _ = resp_tx.send(self.game.set_small_blind(small_blind));
            }
            TableCommand::StartRound {
                player_ids,
                resp_tx,
            } => {
                let res = self.game.start_default_round(&player_ids);
                self.notify(&res);
                let _ = resp_tx.send(res);
            }
            TableCommand::Act {
                player_id,
                action,
                resp_tx,
            } => {
                let res = self.game.submit_action(player_id, action);
                self.notify(&res);
                let _ = resp_tx.send(res);
            }
            TableCommand::Abort(resp_tx) => {
                let res = self.game.abort_round();
                if res.is_ok() {
                    self.broadcast(TableEvent::RoundAborted);
                }
                let _ = resp_tx.send(res);
            }
            TableCommand::State(resp_tx) => {
                let _ = resp_tx.send(self.game.state());
            }
            TableCommand::Bankroll { player_id, resp_tx } => {
                let _ = resp_tx.send(self.game.registry().bankroll(player_id));
            }
            TableCommand::Rotation(resp_tx) => {
                let _ = resp_tx.send(self.game.rotation().to_vec());
            }
        }
    }

    /// Folds the player to act if the action timer has expired.
    fn tick(&mut self) {
        let now = Instant::now();
        if self.game.action_deadline().is_some_and(|d| now >= d) {
            let res = self.game.expire_action(now);
            if let Err(e) = &res {
                warn!("Timeout fold failed: {e}");
            }
            self.notify(&res);
        }
    }

    /// Broadcasts the events that follow a game update.
    fn notify(&self, res: &Result<Option<RoundResult>, GameError>) {
        match res {
            Ok(Some(result)) => self.broadcast(TableEvent::RoundEnded(result.clone())),
            Ok(None) => {
                let state = self.game.state();
                if let Some(player_id) = state.to_act {
                    self.broadcast(TableEvent::ActionRequest { player_id, state });
                }
            }
            Err(e) if e.is_structural() => self.broadcast(TableEvent::RoundAborted),
            Err(_) => {}
        }
    }

    fn broadcast(&self, event: TableEvent) {
        // Sending fails only when there are no subscribers.
        let _ = self.events_tx.send(event);
    }
}
