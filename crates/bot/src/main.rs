// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0
use clap::{Parser, ValueEnum};
use log::{error, info};
use std::time::Duration;

use riverboat_bot::{CallOrCheck, Random, core::Chips};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyKind {
    /// Always call or check.
    Call,
    /// Random legal actions.
    Random,
}

#[derive(Debug, Parser)]
struct Cli {
    /// Number of bots at the table.
    #[clap(long, short, default_value_t = 4, value_parser = clap::value_parser!(u8).range(2..=10))]
    players: u8,
    /// Starting chips for each bot.
    #[clap(long, short, default_value_t = 1_000)]
    chips: u32,
    /// The small blind, the big blind is twice this amount.
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    small_blind: u32,
    /// Maximum number of rounds.
    #[clap(long, short, default_value_t = 100)]
    rounds: usize,
    /// Seconds a bot has to act before being folded.
    #[clap(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,
    /// Seed for the deck and the bots.
    #[clap(long)]
    seed: Option<u64>,
    /// The bots strategy.
    #[clap(long, short, value_enum, default_value_t = StrategyKind::Random)]
    strategy: StrategyKind,
}

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(rand::random);

    let config = riverboat_bot::Config {
        players: cli.players,
        chips: Chips::new(cli.chips),
        small_blind: Chips::new(cli.small_blind),
        rounds: cli.rounds,
        action_timeout: Duration::from_secs(cli.timeout),
        seed: Some(seed),
    };

    info!("Running {} bots with seed {seed}", cli.players);

    let res = match cli.strategy {
        StrategyKind::Call => riverboat_bot::run(config, |_| CallOrCheck).await,
        StrategyKind::Random => {
            riverboat_bot::run(config, |idx| {
                Random::new(seed.wrapping_add(idx as u64 + 1))
            })
            .await
        }
    };

    match res {
        Ok(bankrolls) => {
            for (player_id, chips) in bankrolls {
                info!("Player {player_id} has {chips} chips");
            }
        }
        Err(e) => error!("{e}"),
    }
}
