//! Game records placed into competition calendars.
//!
//! A game is the atomic match unit: it knows its round, its sequence number
//! inside the competition, its participants and its outcome once played.
//! Two shapes exist: [`DuelGame`] for two-player encounters (round-robin,
//! Swiss, brackets) and [`PerformancesGame`] for multi-player scored rounds
//! (elimination contests). Schedulers create games when filling calendar
//! slots; callers only fill in outcomes.

mod duel;
mod performances;

pub use duel::{DuelGame, DuelResult};
pub use performances::PerformancesGame;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::PlayerKey;

/// Per-player outcome data attached to a game: scored performances,
/// spent expenses and flat bonus/malus points.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    performances: BTreeMap<PlayerKey, BTreeMap<String, i64>>,
    expenses: BTreeMap<PlayerKey, BTreeMap<String, i64>>,
    bonuses: BTreeMap<PlayerKey, i64>,
    maluses: BTreeMap<PlayerKey, i64>,
}

impl GameOutcome {
    pub fn set_performance(&mut self, player: &str, kind: &str, value: i64) {
        self.performances
            .entry(player.to_string())
            .or_default()
            .insert(kind.to_string(), value);
    }

    pub fn performance(&self, player: &str, kind: &str) -> Option<i64> {
        self.performances.get(player)?.get(kind).copied()
    }

    pub fn performances_of(&self, player: &str) -> Option<&BTreeMap<String, i64>> {
        self.performances.get(player)
    }

    pub fn set_expense(&mut self, player: &str, kind: &str, value: i64) {
        self.expenses
            .entry(player.to_string())
            .or_default()
            .insert(kind.to_string(), value);
    }

    pub fn expenses_of(&self, player: &str) -> Option<&BTreeMap<String, i64>> {
        self.expenses.get(player)
    }

    pub fn set_bonus(&mut self, player: &str, value: i64) {
        self.bonuses.insert(player.to_string(), value);
    }

    pub fn bonus_of(&self, player: &str) -> i64 {
        self.bonuses.get(player).copied().unwrap_or(0)
    }

    pub fn set_malus(&mut self, player: &str, value: i64) {
        self.maluses.insert(player.to_string(), value);
    }

    pub fn malus_of(&self, player: &str) -> i64 {
        self.maluses.get(player).copied().unwrap_or(0)
    }
}

/// A calendar slot entry, one of the two game shapes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Game {
    Duel(DuelGame),
    Performances(PerformancesGame),
}

impl Game {
    pub fn number(&self) -> usize {
        match self {
            Game::Duel(game) => game.number(),
            Game::Performances(game) => game.number(),
        }
    }

    pub(crate) fn set_number(&mut self, number: usize) {
        match self {
            Game::Duel(game) => game.set_number(number),
            Game::Performances(game) => game.set_number(number),
        }
    }

    pub fn round(&self) -> usize {
        match self {
            Game::Duel(game) => game.round(),
            Game::Performances(game) => game.round(),
        }
    }

    pub(crate) fn set_round(&mut self, round: usize) {
        match self {
            Game::Duel(game) => game.set_round(round),
            Game::Performances(game) => game.set_round(round),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Game::Duel(game) => game.name(),
            Game::Performances(game) => game.name(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Game::Duel(game) => game.set_name(name),
            Game::Performances(game) => game.set_name(name),
        }
    }

    pub fn is_played(&self) -> bool {
        match self {
            Game::Duel(game) => game.is_played(),
            Game::Performances(game) => game.is_played(),
        }
    }

    /// Participant keys, in the game's own order. A duel bye yields a
    /// single key.
    pub fn player_keys(&self) -> Vec<&PlayerKey> {
        match self {
            Game::Duel(game) => game.player_keys(),
            Game::Performances(game) => game.players().iter().collect(),
        }
    }

    pub fn as_duel(&self) -> Option<&DuelGame> {
        match self {
            Game::Duel(game) => Some(game),
            Game::Performances(_) => None,
        }
    }

    pub fn as_duel_mut(&mut self) -> Option<&mut DuelGame> {
        match self {
            Game::Duel(game) => Some(game),
            Game::Performances(_) => None,
        }
    }

    pub fn as_performances(&self) -> Option<&PerformancesGame> {
        match self {
            Game::Performances(game) => Some(game),
            Game::Duel(_) => None,
        }
    }

    pub fn as_performances_mut(&mut self) -> Option<&mut PerformancesGame> {
        match self {
            Game::Performances(game) => Some(game),
            Game::Duel(_) => None,
        }
    }
}
