// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Players registry.
use ahash::AHashMap;
use log::info;

use crate::{
    error::GameError,
    poker::{Card, Chips, PlayerCards, PlayerId},
};

/// A registered player.
#[derive(Debug, Clone)]
pub struct Player {
    /// The player id.
    pub player_id: PlayerId,
    /// This player nickname.
    pub nickname: String,
    /// This player bankroll.
    pub chips: Chips,
    /// This player private cards.
    pub hole_cards: PlayerCards,
}

/// The players registry.
///
/// Owns every player and issues their ids, ids are never reused.
#[derive(Debug)]
pub struct PlayerRegistry {
    players: AHashMap<PlayerId, Player>,
    last_id: u32,
}

impl PlayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            players: AHashMap::default(),
            last_id: 0,
        }
    }

    /// Adds a player and returns its new id.
    pub fn register(&mut self, nickname: impl Into<String>, chips: Chips) -> PlayerId {
        self.last_id += 1;
        let player_id = PlayerId::new(self.last_id);
        let nickname = nickname.into();

        info!("Registered player {player_id} {nickname} with {chips} chips");

        self.players.insert(
            player_id,
            Player {
                player_id,
                nickname,
                chips,
                hole_cards: PlayerCards::None,
            },
        );

        player_id
    }

    /// Removes a player from the registry.
    pub fn remove(&mut self, player_id: PlayerId) -> Option<Player> {
        self.players.remove(&player_id)
    }

    /// Changes a player nickname.
    pub fn rename(
        &mut self,
        player_id: PlayerId,
        nickname: impl Into<String>,
    ) -> Result<(), GameError> {
        self.player_mut(player_id)?.nickname = nickname.into();
        Ok(())
    }

    /// Returns a player.
    pub fn get(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    /// Checks if a player is registered.
    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.players.contains_key(&player_id)
    }

    /// Returns an iterator to all players in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Returns the number of registered players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Checks if there are no players.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Returns a player bankroll.
    pub fn bankroll(&self, player_id: PlayerId) -> Result<Chips, GameError> {
        self.player(player_id).map(|p| p.chips)
    }

    /// Takes chips from a player bankroll.
    pub fn debit(&mut self, player_id: PlayerId, amount: Chips) -> Result<(), GameError> {
        let player = self.player_mut(player_id)?;
        if player.chips < amount {
            return Err(GameError::InsufficientFunds {
                player_id,
                needed: amount,
                available: player.chips,
            });
        }

        player.chips -= amount;
        Ok(())
    }

    /// Adds chips to a player bankroll.
    ///
    /// Fails without changing the bankroll if the credit overflows.
    pub fn credit(&mut self, player_id: PlayerId, amount: Chips) -> Result<(), GameError> {
        let player = self.player_mut(player_id)?;
        player.chips = player
            .chips
            .checked_add(amount)
            .ok_or(GameError::ChipsOverflow(player_id))?;
        Ok(())
    }

    /// Checks that a credit would not overflow a player bankroll.
    pub fn can_credit(&self, player_id: PlayerId, amount: Chips) -> Result<(), GameError> {
        self.player(player_id)?
            .chips
            .checked_add(amount)
            .map(|_| ())
            .ok_or(GameError::ChipsOverflow(player_id))
    }

    /// Gives hole cards to a player.
    pub fn set_hole_cards(
        &mut self,
        player_id: PlayerId,
        c1: Card,
        c2: Card,
    ) -> Result<(), GameError> {
        self.player_mut(player_id)?.hole_cards = PlayerCards::Cards(c1, c2);
        Ok(())
    }

    /// Returns a player hole cards.
    pub fn hole_cards(&self, player_id: PlayerId) -> Result<PlayerCards, GameError> {
        self.player(player_id).map(|p| p.hole_cards)
    }

    /// Clears a player hole cards.
    pub fn clear_hand(&mut self, player_id: PlayerId) -> Result<(), GameError> {
        self.player_mut(player_id)?.hole_cards = PlayerCards::None;
        Ok(())
    }

    fn player(&self, player_id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .get(&player_id)
            .ok_or(GameError::UnknownPlayer(player_id))
    }

    fn player_mut(&mut self, player_id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(&player_id)
            .ok_or(GameError::UnknownPlayer(player_id))
    }
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poker::{Rank, Suit};

    #[test]
    fn ids_are_unique_and_increasing() {
        let mut registry = PlayerRegistry::new();
        let p1 = registry.register("Alice", Chips::new(100));
        let p2 = registry.register("Bob", Chips::new(100));
        assert!(p2 > p1);

        registry.remove(p2);
        let p3 = registry.register("Carol", Chips::new(100));
        assert!(p3 > p2);
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(p2));
    }

    #[test]
    fn debit_and_credit() {
        let mut registry = PlayerRegistry::new();
        let p1 = registry.register("Alice", Chips::new(100));

        registry.debit(p1, Chips::new(30)).unwrap();
        assert_eq!(registry.bankroll(p1), Ok(Chips::new(70)));

        assert_eq!(
            registry.debit(p1, Chips::new(71)),
            Err(GameError::InsufficientFunds {
                player_id: p1,
                needed: Chips::new(71),
                available: Chips::new(70),
            })
        );
        assert_eq!(registry.bankroll(p1), Ok(Chips::new(70)));

        registry.credit(p1, Chips::new(5)).unwrap();
        assert_eq!(registry.bankroll(p1), Ok(Chips::new(75)));
    }

    #[test]
    fn credit_overflow() {
        let mut registry = PlayerRegistry::new();
        let p1 = registry.register("Alice", Chips::new(u32::MAX - 10));

        assert_eq!(registry.can_credit(p1, Chips::new(10)), Ok(()));
        assert_eq!(
            registry.credit(p1, Chips::new(11)),
            Err(GameError::ChipsOverflow(p1))
        );
        assert_eq!(registry.bankroll(p1), Ok(Chips::new(u32::MAX - 10)));

        registry.credit(p1, Chips::new(10)).unwrap();
        assert_eq!(registry.bankroll(p1), Ok(Chips::new(u32::MAX)));
    }

    #[test]
    fn unknown_player() {
        let mut registry = PlayerRegistry::new();
        let p1 = registry.register("Alice", Chips::new(100));
        registry.remove(p1);

        assert_eq!(registry.bankroll(p1), Err(GameError::UnknownPlayer(p1)));
        assert_eq!(
            registry.credit(p1, Chips::new(1)),
            Err(GameError::UnknownPlayer(p1))
        );
        assert!(registry.rename(p1, "Bob").is_err());
    }

    #[test]
    fn hole_cards_and_rename() {
        let mut registry = PlayerRegistry::new();
        let p1 = registry.register("Alice", Chips::new(100));

        let c1 = Card::new(Rank::Ace, Suit::Spades);
        let c2 = Card::new(Rank::King, Suit::Spades);
        registry.set_hole_cards(p1, c1, c2).unwrap();
        assert_eq!(registry.hole_cards(p1), Ok(PlayerCards::Cards(c1, c2)));

        registry.clear_hand(p1).unwrap();
        assert_eq!(registry.hole_cards(p1), Ok(PlayerCards::None));

        registry.rename(p1, "Alicia").unwrap();
        assert_eq!(registry.get(p1).unwrap().nickname, "Alicia");
    }
}
