//! Elimination contest: one scored game per round, bottom cuts.

use rand::rngs::StdRng;

use super::Scheduling;
use super::builder::Retention;
use super::core::CompetitionCore;
use crate::PlayerKey;
use crate::errors::{CompetitionError, CompetitionResult};
use crate::game::Game;
use crate::ranking::{RankingKind, RankingsHolder};

/// All remaining players share a single scored game each round; the
/// round's ranking is the descending sum of the declared performance
/// types. Survivors continue under the retention rule, either an explicit
/// per-round survivor-count list or a fixed cut per round.
#[derive(Clone, Debug)]
pub struct Contest {
    performance_types: Vec<String>,
    passing_counts: Vec<usize>,
    eliminated_per_round: usize,
    last_round_added: usize,
}

impl Contest {
    pub(crate) fn new(
        performance_types: Vec<String>,
        retention: Retention,
    ) -> CompetitionResult<Self> {
        if performance_types.is_empty() {
            return Err(CompetitionError::parameter(
                "performance types",
                "cannot create a contest without a performance type to sum",
            ));
        }
        let (passing_counts, eliminated_per_round) = match retention {
            Retention::PassingCounts(counts) => {
                if counts.iter().any(|count| *count == 0) {
                    return Err(CompetitionError::parameter(
                        "passing counts",
                        "every per-round survivor count must be >= 1",
                    ));
                }
                (counts, 0)
            }
            Retention::EliminatedPerRound(count) => {
                if count < 1 {
                    return Err(CompetitionError::parameter(
                        "eliminated per round",
                        "required >= 1",
                    ));
                }
                (Vec::new(), count)
            }
        };
        Ok(Self {
            performance_types,
            passing_counts,
            eliminated_per_round,
            last_round_added: 0,
        })
    }

    pub fn performance_types(&self) -> &[String] {
        &self.performance_types
    }

    pub fn passing_counts(&self) -> &[usize] {
        &self.passing_counts
    }

    pub fn eliminated_per_round(&self) -> usize {
        self.eliminated_per_round
    }

    fn add_round_game(&mut self, core: &mut CompetitionCore, round: usize, players: Vec<PlayerKey>) {
        core.push_performances(round, players, self.performance_types.clone());
        self.last_round_added = round;
    }

    fn expected_starters(&self, core: &CompetitionCore, round: usize) -> usize {
        if round < 1 || round > core.round_count {
            return 0;
        }
        if round == 1 {
            return core.player_count();
        }
        if !self.passing_counts.is_empty() {
            // survivor counts are declared per completed round
            self.passing_counts.get(round - 2).copied().unwrap_or(0)
        } else {
            core.player_count()
                .saturating_sub(self.eliminated_per_round * (round - 1))
        }
    }
}

impl Scheduling for Contest {
    fn kind(&self) -> RankingKind {
        RankingKind::Performances
    }

    fn min_player_count(&self) -> usize {
        3
    }

    fn build_rankings_holder(&self) -> RankingsHolder {
        let mut holder = RankingsHolder::new(RankingKind::Performances);
        for kind in &self.performance_types {
            holder.add_performance_type(kind.clone());
        }
        holder
    }

    fn generate_calendar(
        &mut self,
        core: &mut CompetitionCore,
        _rng: &mut StdRng,
    ) -> CompetitionResult<()> {
        core.round_count = if self.passing_counts.is_empty() {
            core.player_count()
                .div_ceil(self.eliminated_per_round)
                .saturating_sub(1)
        } else {
            self.passing_counts.len() + 1
        };
        let players = core.players.clone();
        self.add_round_game(core, 1, players);
        Ok(())
    }

    fn extend_calendar(&mut self, core: &mut CompetitionCore) -> CompetitionResult<bool> {
        let potential_round = self.last_round_added + 1;
        let expected = self.expected_starters(core, potential_round);
        if expected <= 1 {
            return Ok(false);
        }
        let ranked: Vec<PlayerKey> = {
            let last_game = core
                .games_in_round(self.last_round_added)
                .iter()
                .find_map(Game::as_performances);
            let Some(game) = last_game else {
                return Ok(false);
            };
            game.game_ranks().into_iter().cloned().collect()
        };
        core.current_round += 1;
        let cut = expected.min(ranked.len());
        let survivors = ranked[..cut].to_vec();
        let eliminated_round = core.current_round - 1;
        for key in &ranked[cut..] {
            core.set_elimination_round(key.clone(), eliminated_round);
        }
        self.add_round_game(core, potential_round, survivors);
        Ok(true)
    }

    fn max_points_for_game(&self, _core: &CompetitionCore) -> Option<i64> {
        // scores are open-ended, every rank stays reachable
        None
    }

    fn min_points_for_game(&self, _core: &CompetitionCore) -> i64 {
        0
    }

    fn min_game_count_per_player(&self, _core: &CompetitionCore) -> usize {
        1
    }

    fn max_game_count_for_player(&self, core: &CompetitionCore, key: Option<&str>) -> usize {
        core.base_max_game_count(key)
    }

    fn players_to_start_round(&self, core: &CompetitionCore, round: usize) -> usize {
        self.expected_starters(core, round)
    }
}

#[cfg(test)]
mod tests {
    use crate::PlayerKey;
    use crate::competition::{Competition, Retention};
    use crate::errors::CompetitionError;
    use crate::game::Game;

    fn keys(count: usize) -> Vec<PlayerKey> {
        (1..=count).map(|index| format!("p{index}")).collect()
    }

    fn types() -> Vec<String> {
        vec!["score".to_string()]
    }

    /// Score the current round so p1 beats p2 beats p3 and so on, then
    /// sweep it in.
    fn play_round(competition: &mut Competition, round: usize) {
        let number = competition.games_by_round(round)[0].number();
        let game = competition
            .game_by_number_mut(number)
            .and_then(Game::as_performances_mut)
            .unwrap();
        let players = game.players().to_vec();
        let count = players.len() as i64;
        for (index, key) in players.iter().enumerate() {
            game.set_player_performance(key, "score", (count - index as i64) * 10);
        }
        game.set_played(true);
        competition.update_games_played().unwrap();
    }

    #[test]
    fn test_requires_a_performance_type() {
        let err =
            Competition::contest(keys(4), Vec::new(), Retention::EliminatedPerRound(1)).unwrap_err();
        assert!(matches!(
            err,
            CompetitionError::Parameter {
                parameter: "performance types",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_degenerate_retention() {
        assert!(
            Competition::contest(keys(4), types(), Retention::EliminatedPerRound(0)).is_err()
        );
        assert!(
            Competition::contest(keys(4), types(), Retention::PassingCounts(vec![2, 0])).is_err()
        );
    }

    #[test]
    fn test_fixed_cut_round_count() {
        let competition =
            Competition::contest(keys(6), types(), Retention::EliminatedPerRound(2)).unwrap();
        assert_eq!(competition.round_count(), 2);
        assert_eq!(competition.players_to_start_round(1), 6);
        assert_eq!(competition.players_to_start_round(2), 4);
        assert_eq!(competition.players_to_start_round(3), 0);
    }

    #[test]
    fn test_bottom_performers_cut_each_round() {
        let mut competition =
            Competition::contest(keys(6), types(), Retention::EliminatedPerRound(2)).unwrap();
        play_round(&mut competition, 1);
        // p5 and p6 scored lowest and leave after round 1
        assert_eq!(competition.player_elimination_round("p5"), Some(1));
        assert_eq!(competition.player_elimination_round("p6"), Some(1));
        assert_eq!(competition.player_elimination_round("p4"), None);
        let round_two = competition.games_by_round(2)[0].as_performances().unwrap();
        assert_eq!(round_two.players(), keys(4).as_slice());

        play_round(&mut competition, 2);
        assert!(competition.is_completed());
        assert_eq!(competition.game_count(), 2);
        // game numbers equal their round
        assert_eq!(competition.game_by_number(2).unwrap().round(), 2);
    }

    #[test]
    fn test_passing_counts_drive_survivors() {
        let mut competition =
            Competition::contest(keys(6), types(), Retention::PassingCounts(vec![3])).unwrap();
        assert_eq!(competition.round_count(), 2);
        play_round(&mut competition, 1);
        let round_two = competition.games_by_round(2)[0].as_performances().unwrap();
        assert_eq!(round_two.players(), keys(3).as_slice());
        assert_eq!(competition.player_elimination_round("p4"), Some(1));
    }

    #[test]
    fn test_rankings_follow_performance_sums() {
        let mut competition =
            Competition::contest(keys(6), types(), Retention::EliminatedPerRound(2)).unwrap();
        play_round(&mut competition, 1);
        play_round(&mut competition, 2);
        let order: Vec<&str> = competition
            .rankings()
            .iter()
            .map(|entry| entry.key().as_str())
            .collect();
        assert_eq!(order, ["p1", "p2", "p3", "p4", "p5", "p6"]);
        // an eliminated player stays unreachable, everyone else open
        assert!(!competition.can_player_win("p6"));
        assert!(competition.can_player_win("p4"));
    }
}
