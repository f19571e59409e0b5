//! Per-player cumulative ranking entry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::holder::PointsTable;
use crate::PlayerKey;
use crate::game::{DuelGame, DuelResult, GameOutcome, PerformancesGame};

/// Accumulated results for one player (or one team, when combined) inside
/// a single competition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    key: PlayerKey,
    seed: usize,
    played: usize,
    won: usize,
    drawn: usize,
    lost: usize,
    byes: usize,
    /// in-game rank -> count, for multi-player games
    positions: BTreeMap<usize, usize>,
    points: i64,
    performances: BTreeMap<String, i64>,
    expenses: BTreeMap<String, i64>,
    bonus: i64,
    malus: i64,
    opponents: Vec<PlayerKey>,
}

impl RankingEntry {
    pub(crate) fn new(key: PlayerKey, seed: usize) -> Self {
        Self {
            key,
            seed,
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            byes: 0,
            positions: BTreeMap::new(),
            points: 0,
            performances: BTreeMap::new(),
            expenses: BTreeMap::new(),
            bonus: 0,
            malus: 0,
            opponents: Vec::new(),
        }
    }

    pub fn key(&self) -> &PlayerKey {
        &self.key
    }

    pub fn seed(&self) -> usize {
        self.seed
    }

    pub(crate) fn set_seed(&mut self, seed: usize) {
        self.seed = seed;
    }

    pub fn played(&self) -> usize {
        self.played
    }

    /// Won games, byes included: a bye is an automatic win.
    pub fn wins(&self) -> usize {
        self.won + self.byes
    }

    pub fn drawn(&self) -> usize {
        self.drawn
    }

    pub fn lost(&self) -> usize {
        self.lost
    }

    pub fn byes(&self) -> usize {
        self.byes
    }

    /// How many games ended at the given in-game rank (multi-player games).
    pub fn played_at_rank(&self, rank: usize) -> usize {
        self.positions.get(&rank).copied().unwrap_or(0)
    }

    /// Point total: result points plus bonus, minus malus.
    pub fn points(&self) -> i64 {
        self.points + self.bonus - self.malus
    }

    pub fn bonus(&self) -> i64 {
        self.bonus
    }

    pub fn malus(&self) -> i64 {
        self.malus
    }

    pub fn performance_total(&self, kind: &str) -> i64 {
        self.performances.get(kind).copied().unwrap_or(0)
    }

    pub fn expense_total(&self) -> i64 {
        self.expenses.values().sum()
    }

    pub fn has_played_against(&self, key: &str) -> bool {
        self.opponents.iter().any(|opponent| opponent == key)
    }

    pub fn opponents(&self) -> &[PlayerKey] {
        &self.opponents
    }

    /// Fold a played duel into this entry. The entry must belong to one of
    /// the two sides.
    pub(crate) fn record_duel(&mut self, game: &DuelGame, table: &PointsTable) {
        let Some(result) = game.result() else {
            return;
        };
        self.played += 1;
        self.absorb_outcome(game.outcome());

        if game.is_bye() {
            self.byes += 1;
            self.points += table.bye;
            return;
        }

        let at_home = *game.home_key() == self.key;
        if let Some(opponent) = if at_home {
            game.away_key()
        } else {
            Some(game.home_key())
        } {
            self.opponents.push(opponent.clone());
        }
        match (result, at_home) {
            (DuelResult::HomeWin, true) | (DuelResult::AwayWin, false) => {
                self.won += 1;
                self.points += table.won;
            }
            (DuelResult::Draw, _) => {
                self.drawn += 1;
                self.points += table.drawn;
            }
            (DuelResult::AwayWin, true) | (DuelResult::HomeWin, false) => {
                self.lost += 1;
                self.points += table.loss;
            }
        }
    }

    /// Fold a played multi-player game into this entry.
    pub(crate) fn record_performances(&mut self, game: &PerformancesGame, table: &PointsTable) {
        if !game.is_played() {
            return;
        }
        self.played += 1;
        self.absorb_outcome(game.outcome());
        if let Some(rank) = game.rank_of(&self.key) {
            *self.positions.entry(rank).or_insert(0) += 1;
            self.points += table.position_points(rank);
        }
    }

    fn absorb_outcome(&mut self, outcome: &GameOutcome) {
        if let Some(values) = outcome.performances_of(&self.key) {
            for (kind, value) in values {
                *self.performances.entry(kind.clone()).or_insert(0) += value;
            }
        }
        if let Some(values) = outcome.expenses_of(&self.key) {
            for (kind, value) in values {
                *self.expenses.entry(kind.clone()).or_insert(0) += value;
            }
        }
        self.bonus += outcome.bonus_of(&self.key);
        self.malus += outcome.malus_of(&self.key);
    }

    /// Sum another entry into this one; used for team aggregation. Key and
    /// seed stay untouched.
    pub(crate) fn absorb(&mut self, other: &RankingEntry) {
        self.played += other.played;
        self.won += other.won;
        self.drawn += other.drawn;
        self.lost += other.lost;
        self.byes += other.byes;
        for (rank, count) in &other.positions {
            *self.positions.entry(*rank).or_insert(0) += count;
        }
        self.points += other.points;
        for (kind, value) in &other.performances {
            *self.performances.entry(kind.clone()).or_insert(0) += value;
        }
        for (kind, value) in &other.expenses {
            *self.expenses.entry(kind.clone()).or_insert(0) += value;
        }
        self.bonus += other.bonus;
        self.malus += other.malus;
        self.opponents.extend(other.opponents.iter().cloned());
    }
}
