// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0
//
// Run with:
//
// ```bash
// $ cargo r --release --example eval_sample
// ```
//
// Deals random 7 cards hands and prints how often each category shows up.

use rand::{SeedableRng, rngs::StdRng};
use std::time::Instant;

use riverboat_eval::*;

const SAMPLES: usize = 1_000_000;

fn main() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut counts = [0usize; 9];

    let now = Instant::now();
    for _ in 0..SAMPLES {
        let mut deck = Deck::new_and_shuffled(&mut rng);
        let hand = (0..7).filter_map(|_| deck.deal()).collect::<Vec<_>>();
        match HandValue::eval(&hand) {
            Ok(value) => counts[value.rank() as usize] += 1,
            Err(e) => eprintln!("{e}"),
        }
    }

    let elapsed = now.elapsed().as_secs_f64();
    println!("Total hands      {SAMPLES}");
    println!("Elapsed:         {:.3}s", elapsed);
    println!("Hands/sec:       {:.0}\n", SAMPLES as f64 / elapsed);

    let ranks = [
        HandRank::HighCard,
        HandRank::OnePair,
        HandRank::TwoPair,
        HandRank::ThreeOfAKind,
        HandRank::Straight,
        HandRank::Flush,
        HandRank::FullHouse,
        HandRank::FourOfAKind,
        HandRank::StraightFlush,
    ];

    for rank in ranks {
        let pct = 100.0 * counts[rank as usize] as f64 / SAMPLES as f64;
        println!("{:<16} {:>8} {pct:>6.2}%", rank.to_string(), counts[rank as usize]);
    }
}
