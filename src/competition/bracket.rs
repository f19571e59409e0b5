//! Seeded single-elimination bracket.

use rand::rngs::StdRng;

use super::Scheduling;
use super::core::CompetitionCore;
use crate::PlayerKey;
use crate::errors::{CompetitionError, CompetitionResult};
use crate::game::Game;
use crate::ranking::{RankingKind, RankingsHolder};

/// Single elimination over a power-of-2 field. The round-1 order comes
/// from a folded seed-pairing table that keeps top seeds apart for as
/// long as possible; later rounds pair the previous round's winners in
/// winner-list order, generated once that round has been fully played.
#[derive(Clone, Debug)]
pub struct Bracket {
    best_seed_home: bool,
}

impl Bracket {
    pub(crate) fn new(best_seed_home: bool) -> Self {
        Self { best_seed_home }
    }

    /// Whether the numerically lower seed is always listed as home.
    pub fn is_best_seed_home(&self) -> bool {
        self.best_seed_home
    }

    fn check_power_of_two(count: usize, round: usize) -> CompetitionResult<()> {
        if count == 0 || !count.is_power_of_two() {
            return Err(CompetitionError::Structure(format!(
                "cannot pair a field of {count} players on round {round}: not a power of 2"
            )));
        }
        Ok(())
    }

    /// Seed pairings for round 1: start from N/2 singleton parts pairing
    /// seed i with seed N+1−i, then repeatedly fold the second half of
    /// the parts onto the first half in reverse order. For 8 players this
    /// yields (1,8), (4,5), (2,7), (3,6).
    fn duel_table(players: usize, round: usize) -> CompetitionResult<Vec<(usize, usize)>> {
        Self::check_power_of_two(players, round)?;
        let mut parts: Vec<Vec<(usize, usize)>> = (1..=players / 2)
            .map(|seed| vec![(seed, players + 1 - seed)])
            .collect();
        while parts.len() > 1 {
            let count = parts.len();
            let tail = parts.split_off(count / 2);
            for (offset, part) in tail.into_iter().enumerate() {
                let target = count / 2 - 1 - offset;
                parts[target].extend(part);
            }
        }
        Ok(parts.pop().unwrap_or_default())
    }

    fn add_duel(
        &self,
        core: &mut CompetitionCore,
        round: usize,
        home: PlayerKey,
        away: Option<PlayerKey>,
    ) {
        let (home, away) = match &away {
            Some(away_key)
                if self.best_seed_home && core.seed_of(away_key) < core.seed_of(&home) =>
            {
                (away_key.clone(), Some(home))
            }
            _ => (home, away),
        };
        core.push_duel(round, home, away);
    }
}

impl Scheduling for Bracket {
    fn kind(&self) -> RankingKind {
        RankingKind::Duel
    }

    fn min_player_count(&self) -> usize {
        4
    }

    fn build_rankings_holder(&self) -> RankingsHolder {
        RankingsHolder::new(RankingKind::Duel)
    }

    fn generate_calendar(
        &mut self,
        core: &mut CompetitionCore,
        _rng: &mut StdRng,
    ) -> CompetitionResult<()> {
        let players = core.player_count();
        let table = Self::duel_table(players, 1)?;
        core.round_count = players.ilog2() as usize;
        core.current_round = 1;
        for (seed_home, seed_away) in table {
            if let (Some(home), Some(away)) =
                (core.initial_key(seed_home), core.initial_key(seed_away))
            {
                self.add_duel(core, 1, home, Some(away));
            }
        }
        Ok(())
    }

    fn extend_calendar(&mut self, core: &mut CompetitionCore) -> CompetitionResult<bool> {
        if core.current_round >= core.round_count {
            return Ok(false);
        }
        let finished_round = core.current_round;
        let mut winners: Vec<PlayerKey> = Vec::new();
        let mut losers: Vec<PlayerKey> = Vec::new();
        for game in core.games_in_round(finished_round) {
            let Game::Duel(duel) = game else { continue };
            if !duel.is_played() {
                continue;
            }
            if let Some(winner) = duel.winner_key() {
                winners.push(winner.clone());
            }
            // a bye has no loser to track
            if let Some(loser) = duel.loser_key() {
                losers.push(loser.clone());
            }
        }
        for loser in losers {
            core.set_elimination_round(loser, finished_round);
        }
        Self::check_power_of_two(winners.len(), finished_round + 1)?;
        core.current_round = finished_round + 1;
        let next_round = core.current_round;
        for pair in winners.chunks(2) {
            self.add_duel(core, next_round, pair[0].clone(), pair.get(1).cloned());
        }
        Ok(true)
    }

    fn max_points_for_game(&self, core: &CompetitionCore) -> Option<i64> {
        let table = core.rankings.points_table();
        Some(table.won.max(table.bye))
    }

    fn min_points_for_game(&self, core: &CompetitionCore) -> i64 {
        core.rankings.points_table().loss
    }

    fn min_game_count_per_player(&self, _core: &CompetitionCore) -> usize {
        1
    }

    fn max_game_count_for_player(&self, core: &CompetitionCore, key: Option<&str>) -> usize {
        core.base_max_game_count(key)
    }

    fn players_to_start_round(&self, core: &CompetitionCore, round: usize) -> usize {
        if round < 1 || round > core.round_count {
            return 0;
        }
        core.player_count() >> (round - 1)
    }
}
