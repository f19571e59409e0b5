//! Round-robin championship calendar, built with the circle method.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::Scheduling;
use super::core::CompetitionCore;
use crate::PlayerKey;
use crate::errors::CompetitionResult;
use crate::game::Game;
use crate::ranking::{RankingKind, RankingsHolder};

/// Every pair of players meets once per series. Even fields rotate through
/// N−1 rounds; odd fields take N rounds with one idle player each round.
/// Extra series replay the base calendar with home/away reversed on
/// alternating rounds; an optional shuffle permutes round order inside
/// each series without touching pairings.
#[derive(Clone, Debug)]
pub struct RoundRobin {
    series: usize,
    shuffle_rounds: bool,
}

impl RoundRobin {
    pub(crate) fn new(series: usize, shuffle_rounds: bool) -> Self {
        Self {
            series: series.max(1),
            shuffle_rounds,
        }
    }

    pub fn series(&self) -> usize {
        self.series
    }

    pub fn shuffles_rounds(&self) -> bool {
        self.shuffle_rounds
    }

    fn generate_base_even(&self, core: &mut CompetitionCore) {
        core.round_count = core.player_count() - 1;
        // seed 1 meets every other seed in ascending order, one per round
        for round in 1..=core.round_count {
            if let (Some(home), Some(away)) = (core.initial_key(1), core.initial_key(round + 1)) {
                core.push_duel(round, home, Some(away));
            }
        }
        // each later seed opens against the last seed on the round after it
        // met its predecessor, then walks the remaining seeds on
        // consecutive wrapping rounds
        let mut round_when_match_next = 1;
        for seed_home in 2..core.player_count() {
            let mut round = core.round_gap(round_when_match_next, 1);
            if let (Some(home), Some(away)) = (
                core.initial_key(seed_home),
                core.initial_key(core.player_count()),
            ) {
                core.push_duel(round, home, Some(away));
            }
            round_when_match_next = core.round_gap(round, 1);
            for seed_away in (seed_home + 1)..core.player_count() {
                round = core.round_gap(round, 1);
                if let (Some(home), Some(away)) =
                    (core.initial_key(seed_home), core.initial_key(seed_away))
                {
                    core.push_duel(round, home, Some(away));
                }
            }
        }
    }

    fn generate_base_odd(&self, core: &mut CompetitionCore) {
        core.round_count = core.player_count();
        // one player idles per round; walk opponents at gap -2 steps and
        // only register a pairing when the opponent seed is higher, which
        // deduplicates against earlier rounds
        let mut round = 1;
        for seed_home in 1..=core.player_count() {
            let mut seed_away = seed_home;
            for _ in 1..core.player_count() {
                seed_away = core.seed_gap(seed_away, -2);
                if seed_home < seed_away {
                    if let (Some(home), Some(away)) =
                        (core.initial_key(seed_home), core.initial_key(seed_away))
                    {
                        core.push_duel(round, home, Some(away));
                    }
                }
                round = core.round_gap(round, 1);
            }
        }
    }

    fn replicate_series(&self, core: &mut CompetitionCore) {
        if self.series == 1 {
            return;
        }
        let base_rounds = core.round_count;
        let base: Vec<(usize, Vec<(PlayerKey, Option<PlayerKey>)>)> = core
            .calendar
            .iter()
            .map(|(round, games)| {
                let pairings = games
                    .iter()
                    .filter_map(Game::as_duel)
                    .map(|duel| (duel.home_key().clone(), duel.away_key().cloned()))
                    .collect();
                (*round, pairings)
            })
            .collect();

        let mut round = base_rounds + 1;
        for series in 2..=self.series {
            for (base_round, pairings) in &base {
                for (home, away) in pairings {
                    // reverse home/away on alternating rounds; with an odd
                    // series total only even series reverse, keeping the
                    // leftover imbalance on the first seeds
                    let mut reverse = (series % 2 == 0 && base_round % 2 == 1)
                        || (series % 2 == 1 && base_round % 2 == 0);
                    if self.series % 2 == 1 {
                        reverse = series % 2 == 0;
                    }
                    match (away, reverse) {
                        (Some(away), true) => {
                            core.push_duel(round, away.clone(), Some(home.clone()));
                        }
                        _ => {
                            core.push_duel(round, home.clone(), away.clone());
                        }
                    }
                }
                round += 1;
            }
        }

        // with an even series total, the first series balances itself by
        // reversing its even rounds in place
        if self.series % 2 == 0 {
            for round in (2..=base_rounds).step_by(2) {
                if let Some(games) = core.calendar.get_mut(&round) {
                    for game in games {
                        if let Game::Duel(duel) = game {
                            duel.reverse_home_away();
                        }
                    }
                }
            }
        }

        core.round_count = base_rounds * self.series;
    }

    fn shuffle_series_rounds(&self, core: &mut CompetitionCore, rng: &mut StdRng) {
        let base_rounds = core.round_count / self.series;
        let mut rounds: Vec<Vec<Game>> = core.calendar.values().cloned().collect();
        core.calendar.clear();
        let mut round = 1;
        for chunk in rounds.chunks_mut(base_rounds) {
            chunk.shuffle(rng);
            for games in chunk.iter_mut() {
                let mut games = std::mem::take(games);
                for game in &mut games {
                    game.set_round(round);
                }
                core.calendar.insert(round, games);
                round += 1;
            }
        }
    }
}

impl Scheduling for RoundRobin {
    fn kind(&self) -> RankingKind {
        RankingKind::Duel
    }

    fn min_player_count(&self) -> usize {
        3
    }

    fn build_rankings_holder(&self) -> RankingsHolder {
        RankingsHolder::new(RankingKind::Duel)
    }

    fn generate_calendar(
        &mut self,
        core: &mut CompetitionCore,
        rng: &mut StdRng,
    ) -> CompetitionResult<()> {
        if core.player_count() % 2 == 0 {
            self.generate_base_even(core);
        } else {
            self.generate_base_odd(core);
        }
        self.replicate_series(core);
        if self.shuffle_rounds {
            self.shuffle_series_rounds(core, rng);
        }
        Ok(())
    }

    fn extend_calendar(&mut self, _core: &mut CompetitionCore) -> CompetitionResult<bool> {
        Ok(false)
    }

    fn max_points_for_game(&self, core: &CompetitionCore) -> Option<i64> {
        let table = core.rankings.points_table();
        Some(table.won.max(table.bye))
    }

    fn min_points_for_game(&self, core: &CompetitionCore) -> i64 {
        core.rankings.points_table().loss
    }

    fn min_game_count_per_player(&self, core: &CompetitionCore) -> usize {
        core.round_count
    }

    fn max_game_count_for_player(&self, core: &CompetitionCore, key: Option<&str>) -> usize {
        let base = core.base_max_game_count(key);
        if core.player_count() % 2 == 1 {
            // odd field: one idle round per player, per series
            base.saturating_sub(self.series)
        } else {
            base
        }
    }

    fn players_to_start_round(&self, core: &CompetitionCore, round: usize) -> usize {
        if round < 1 || round > core.round_count {
            return 0;
        }
        if core.player_count() % 2 == 1 {
            core.player_count() - 1
        } else {
            core.player_count()
        }
    }
}
