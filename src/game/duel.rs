//! Two-player game record.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::GameOutcome;
use crate::PlayerKey;

/// Result of a duel, seen from the home side.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum DuelResult {
    HomeWin,
    Draw,
    AwayWin,
}

impl fmt::Display for DuelResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HomeWin => "home win",
            Self::Draw => "draw",
            Self::AwayWin => "away win",
        };
        write!(f, "{repr}")
    }
}

/// A two-player encounter. A missing away player is a bye: the game is
/// recorded as won by the home player the moment the bye is sealed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelGame {
    number: usize,
    round: usize,
    name: Option<String>,
    home: PlayerKey,
    away: Option<PlayerKey>,
    result: Option<DuelResult>,
    outcome: GameOutcome,
}

impl DuelGame {
    pub(crate) fn new(home: PlayerKey, away: Option<PlayerKey>, round: usize) -> Self {
        Self {
            number: 0,
            round,
            name: None,
            home,
            away,
            result: None,
            outcome: GameOutcome::default(),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: usize) {
        self.number = number;
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub(crate) fn set_round(&mut self, round: usize) {
        self.round = round;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn home_key(&self) -> &PlayerKey {
        &self.home
    }

    pub fn away_key(&self) -> Option<&PlayerKey> {
        self.away.as_ref()
    }

    pub fn is_bye(&self) -> bool {
        self.away.is_none()
    }

    pub fn is_played(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<DuelResult> {
        self.result
    }

    /// Record the outcome. Recording onto a bye always lands as a home win.
    pub fn set_result(&mut self, result: DuelResult) {
        self.result = if self.is_bye() {
            Some(DuelResult::HomeWin)
        } else {
            Some(result)
        };
    }

    /// Seal a bye game as an automatic home win.
    pub(crate) fn seal_bye(&mut self) {
        self.result = Some(DuelResult::HomeWin);
    }

    pub fn has_away_won(&self) -> bool {
        matches!(self.result, Some(DuelResult::AwayWin))
    }

    pub fn is_drawn(&self) -> bool {
        matches!(self.result, Some(DuelResult::Draw))
    }

    /// Winner key once played. A draw counts as a home win: brackets do
    /// not admit draws, the home side advances.
    pub fn winner_key(&self) -> Option<&PlayerKey> {
        match self.result? {
            DuelResult::AwayWin => self.away.as_ref(),
            DuelResult::HomeWin | DuelResult::Draw => Some(&self.home),
        }
    }

    /// Loser key once played; `None` on a bye.
    pub fn loser_key(&self) -> Option<&PlayerKey> {
        match self.result? {
            DuelResult::AwayWin => Some(&self.home),
            DuelResult::HomeWin | DuelResult::Draw => self.away.as_ref(),
        }
    }

    /// Swap home and away sides. Only meaningful before the game is played;
    /// byes keep their single player at home.
    pub(crate) fn reverse_home_away(&mut self) {
        if let Some(away) = self.away.take() {
            self.away = Some(std::mem::replace(&mut self.home, away));
        }
    }

    pub fn player_keys(&self) -> Vec<&PlayerKey> {
        match &self.away {
            Some(away) => vec![&self.home, away],
            None => vec![&self.home],
        }
    }

    pub fn outcome(&self) -> &GameOutcome {
        &self.outcome
    }

    pub fn outcome_mut(&mut self) -> &mut GameOutcome {
        &mut self.outcome
    }
}
