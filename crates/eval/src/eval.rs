// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Poker hand evaluator.
//!
//! The evaluator scores every 5 cards subset of a 5, 6 or 7 cards hand and
//! keeps the best one, a 7 cards hand has 21 subsets. Each subset score is a
//! [HandRank] category followed by the five card ranks sorted by group size
//! and then by rank, this ordering breaks ties within a category without any
//! category specific comparison code:
//!
//! ```text
//!   four of a kind   Q Q Q Q 7
//!   full house       T T T 4 4
//!   two pair         K K 9 9 3
//!   straight (wheel) 5 4 3 2 A
//! ```
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};
use thiserror::Error;

use riverboat_cards::{Card, Rank};

/// Hand evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The hand doesn't have between 5 and 7 cards.
    #[error("a hand must have 5 to 7 cards, got {0}")]
    InvalidSize(usize),
    /// The hand contains the same card more than once.
    #[error("card {0} appears more than once")]
    DuplicateCard(Card),
}

/// The hand category from the weakest to the strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandRank {
    /// Five unrelated cards.
    HighCard = 0,
    /// Two cards of the same rank.
    OnePair,
    /// Two different pairs.
    TwoPair,
    /// Three cards of the same rank.
    ThreeOfAKind,
    /// Five consecutive ranks.
    Straight,
    /// Five cards of the same suit.
    Flush,
    /// Three of a kind and a pair.
    FullHouse,
    /// Four cards of the same rank.
    FourOfAKind,
    /// A straight of the same suit.
    StraightFlush,
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandRank::HighCard => "High Card",
            HandRank::OnePair => "One Pair",
            HandRank::TwoPair => "Two Pair",
            HandRank::ThreeOfAKind => "Three of a Kind",
            HandRank::Straight => "Straight",
            HandRank::Flush => "Flush",
            HandRank::FullHouse => "Full House",
            HandRank::FourOfAKind => "Four of a Kind",
            HandRank::StraightFlush => "Straight Flush",
        };

        f.write_str(name)
    }
}

/// The value of a poker hand.
///
/// Values are totally ordered, two values compare equal when they have the
/// same category and the same tie-break ranks even if their cards differ.
#[derive(Debug, Clone, Copy)]
pub struct HandValue {
    rank: HandRank,
    ranks: [Rank; 5],
    hand: [Card; 5],
}

impl HandValue {
    /// Evaluates a 5, 6 or 7 cards hand.
    ///
    /// Fails if the hand size is out of range or if a card appears twice.
    pub fn eval(cards: &[Card]) -> Result<HandValue, EvalError> {
        if !(5..=7).contains(&cards.len()) {
            return Err(EvalError::InvalidSize(cards.len()));
        }

        let mut seen = 0u64;
        for card in cards {
            let bit = 1u64 << card.id();
            if seen & bit != 0 {
                return Err(EvalError::DuplicateCard(*card));
            }
            seen |= bit;
        }

        let n = cards.len();
        let mut best: Option<HandValue> = None;
        let mut h = [cards[0]; 5];

        for c1 in 0..n {
            h[0] = cards[c1];
            for c2 in (c1 + 1)..n {
                h[1] = cards[c2];
                for c3 in (c2 + 1)..n {
                    h[2] = cards[c3];
                    for c4 in (c3 + 1)..n {
                        h[3] = cards[c4];
                        for c5 in (c4 + 1)..n {
                            h[4] = cards[c5];

                            let value = Self::eval5(h);
                            if best.is_none_or(|b| value > b) {
                                best = Some(value);
                            }
                        }
                    }
                }
            }
        }

        // There is at least one subset as n >= 5.
        Ok(best.unwrap_or_else(|| Self::eval5(h)))
    }

    /// The hand category.
    pub fn rank(&self) -> HandRank {
        self.rank
    }

    /// The five ranks used for breaking ties within the category.
    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    /// The five cards that make this hand value.
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    fn eval5(mut hand: [Card; 5]) -> HandValue {
        // Count cards by rank.
        let mut counts = [0u8; 13];
        for c in &hand {
            counts[c.rank() as usize] += 1;
        }

        // Sort by group size first and then by rank, so that a full house
        // becomes TTT44 and two pair KK993.
        hand.sort_by(|a, b| {
            let (ra, rb) = (a.rank(), b.rank());
            counts[rb as usize]
                .cmp(&counts[ra as usize])
                .then(rb.cmp(&ra))
        });

        let mut ranks = hand.map(|c| c.rank());
        let is_flush = hand.iter().all(|c| c.suit() == hand[0].suit());

        let distinct = counts.iter().filter(|&&n| n > 0).count();
        let mut is_straight = false;
        if distinct == 5 {
            if ranks[0] as u8 - ranks[4] as u8 == 4 {
                is_straight = true;
            } else if ranks == [Rank::Ace, Rank::Five, Rank::Four, Rank::Trey, Rank::Deuce] {
                // The wheel, the ace plays low.
                is_straight = true;
                ranks.rotate_left(1);
                hand.rotate_left(1);
            }
        }

        let rank = match (counts[ranks[0] as usize], counts[ranks[3] as usize]) {
            _ if is_straight && is_flush => HandRank::StraightFlush,
            (4, _) => HandRank::FourOfAKind,
            (3, 2) => HandRank::FullHouse,
            _ if is_flush => HandRank::Flush,
            _ if is_straight => HandRank::Straight,
            (3, _) => HandRank::ThreeOfAKind,
            (2, 2) => HandRank::TwoPair,
            (2, _) => HandRank::OnePair,
            _ => HandRank::HighCard,
        };

        HandValue { rank, ranks, hand }
    }
}

impl PartialEq for HandValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HandValue {}

impl PartialOrd for HandValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.ranks.cmp(&other.ranks))
    }
}

impl fmt::Display for HandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rank)?;
        for card in &self.hand {
            write!(f, " {card}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use riverboat_cards::{Deck, Suit};

    fn cards(s: &str) -> Vec<Card> {
        s.split_whitespace().map(|c| c.parse().unwrap()).collect()
    }

    fn eval(s: &str) -> HandValue {
        HandValue::eval(&cards(s)).unwrap()
    }

    #[test]
    fn categories() {
        assert_eq!(eval("AC KC QC JC TC").rank(), HandRank::StraightFlush);
        assert_eq!(eval("9S 9H 9D 9C 2S").rank(), HandRank::FourOfAKind);
        assert_eq!(eval("2C 2S 2H 9D 9C").rank(), HandRank::FullHouse);
        assert_eq!(eval("AH 9H 7H 4H 2H").rank(), HandRank::Flush);
        assert_eq!(eval("9C 8D 7H 6S 5C").rank(), HandRank::Straight);
        assert_eq!(eval("7C 7D 7H KS 2C").rank(), HandRank::ThreeOfAKind);
        assert_eq!(eval("KC KD 4H 4S 2C").rank(), HandRank::TwoPair);
        assert_eq!(eval("JC JD 8H 4S 2C").rank(), HandRank::OnePair);
        assert_eq!(eval("AC JD 8H 4S 2C").rank(), HandRank::HighCard);
    }

    #[test]
    fn straight_flush_beats_full_house() {
        let full_house = eval("2C 2S 2H 9D 9C");
        let straight_flush = eval("AC KC QC JC 10C");
        assert!(straight_flush > full_house);
    }

    #[test]
    fn wheel_is_five_high_straight() {
        let wheel = eval("5D 4D 3D 2D AD");
        assert_eq!(wheel.rank(), HandRank::StraightFlush);
        assert_eq!(wheel.ranks()[0], Rank::Five);

        let wheel = eval("5D 4C 3D 2D AD");
        assert_eq!(wheel.rank(), HandRank::Straight);
        assert_eq!(wheel.ranks()[0], Rank::Five);
        assert_eq!(wheel.hand()[4].rank(), Rank::Ace);

        let six_high = eval("6H 5D 4C 3D 2D");
        assert!(wheel < six_high);

        // A wheel is still better than any three of a kind.
        assert!(wheel > eval("AC AD AH KS QC"));

        // Ace high straight is the best straight.
        assert!(eval("AC KD QH JS TC") > eval("KD QH JS TC 9C"));
    }

    #[test]
    fn kickers_break_ties() {
        assert!(eval("9S 9H 9D 9C AS") > eval("9S 9H 9D 9C KS"));
        assert!(eval("TC TS TH 4D 4C") > eval("9C 9S 9H AD AC"));
        assert!(eval("TC TS TH 5D 5C") > eval("TC TS TH 4D 4C"));
        assert!(eval("AH 9H 7H 4H 3H") > eval("AS 9S 7S 4S 2S"));
        assert!(eval("7C 7D 7H KS 3C") > eval("7C 7D 7H QS JC"));
        assert!(eval("KC KD 4H 4S 3C") > eval("KC KD 4H 4S 2C"));
        assert!(eval("KC KD 5H 5S 2C") > eval("KC KD 4H 4S AC"));
        assert!(eval("JC JD 8H 4S 3C") > eval("JC JD 8H 4S 2C"));
        assert!(eval("AC JD 8H 4S 3C") > eval("AC JD 8H 4S 2C"));
    }

    #[test]
    fn equal_values_with_different_suits() {
        let v1 = eval("AC KD 8H 4S 3C");
        let v2 = eval("AD KS 8C 4H 3D");
        assert_eq!(v1, v2);
        assert_eq!(v1.cmp(&v2), Ordering::Equal);
    }

    #[test]
    fn seven_cards_best_hand() {
        // Board pairs and a flush draw but the hole cards make a full house.
        let v = eval("QH QD QS 7H 7C 2H 3H");
        assert_eq!(v.rank(), HandRank::FullHouse);
        assert_eq!(v.ranks(), &[Rank::Queen, Rank::Queen, Rank::Queen, Rank::Seven, Rank::Seven]);

        // Straight hidden in seven cards with an extra pair.
        let v = eval("4C 5D 6H 7S 8C 8D KH");
        assert_eq!(v.rank(), HandRank::Straight);
        assert_eq!(v.ranks()[0], Rank::Eight);

        // Six cards flush picks the best five.
        let v = eval("AH 2H 5H 9H JH KH");
        assert_eq!(v.rank(), HandRank::Flush);
        assert_eq!(v.ranks(), &[Rank::Ace, Rank::King, Rank::Jack, Rank::Nine, Rank::Five]);
    }

    #[test]
    fn invalid_hands() {
        assert_eq!(
            HandValue::eval(&cards("AC KC QC JC")).unwrap_err(),
            EvalError::InvalidSize(4)
        );
        assert_eq!(
            HandValue::eval(&cards("AC KC QC JC TC 9C 8C 7C")).unwrap_err(),
            EvalError::InvalidSize(8)
        );
        assert_eq!(
            HandValue::eval(&cards("AC KC QC JC AC")).unwrap_err(),
            EvalError::DuplicateCard(Card::new(Rank::Ace, Suit::Clubs))
        );
    }

    fn seven_cards() -> impl Strategy<Value = Vec<Card>> {
        let deck = Deck::default().into_iter().collect::<Vec<_>>();
        proptest::sample::subsequence(deck, 7).prop_shuffle()
    }

    proptest! {
        #[test]
        fn eval_is_order_independent(cards in seven_cards(), rotate in 0usize..7) {
            let v1 = HandValue::eval(&cards).unwrap();

            let mut shuffled = cards.clone();
            shuffled.rotate_left(rotate);
            shuffled.reverse();
            let v2 = HandValue::eval(&shuffled).unwrap();

            prop_assert_eq!(v1, v2);
            prop_assert_eq!(v1.rank(), v2.rank());
        }

        #[test]
        fn best_hand_is_made_of_input_cards(cards in seven_cards()) {
            let v = HandValue::eval(&cards).unwrap();
            prop_assert!(v.hand().iter().all(|c| cards.contains(c)));

            // Evaluating the best five cards alone gives the same value.
            let v5 = HandValue::eval(v.hand()).unwrap();
            prop_assert_eq!(v, v5);
        }

        #[test]
        fn straight_flush_beats_other_hands(cards in seven_cards(), high in 3usize..13, suit in 0usize..4) {
            let suit = Suit::suits().nth(suit).unwrap();
            let ranks = Rank::ranks().collect::<Vec<_>>();
            let mut sf = (0..5)
                .map(|i| {
                    // A 5 high straight flush uses the ace.
                    let idx = (high + 13 - i) % 13;
                    let idx = if high == 3 && i == 4 { 12 } else { idx };
                    Card::new(ranks[idx], suit)
                })
                .collect::<Vec<_>>();
            sf.sort_by_key(|c| c.id());

            let sf_value = HandValue::eval(&sf).unwrap();
            prop_assert_eq!(sf_value.rank(), HandRank::StraightFlush);

            let other = HandValue::eval(&cards).unwrap();
            if other.rank() != HandRank::StraightFlush {
                prop_assert!(sf_value > other);
            }
        }
    }
}
