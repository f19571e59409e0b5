//! Swiss-system championship: rounds paired lazily on current rankings.

use rand::rngs::StdRng;

use super::Scheduling;
use super::core::CompetitionCore;
use crate::PlayerKey;
use crate::errors::CompetitionResult;
use crate::ranking::{RankingKind, RankingsHolder};

/// Fixed number of rounds, each generated once the previous one has been
/// fully played. Closely ranked players who have not met yet are paired
/// first; with an odd pool the lowest-ranked player without a bye sits
/// the round out with an automatic win.
#[derive(Clone, Debug)]
pub struct Swiss {
    round_count: usize,
}

impl Swiss {
    pub(crate) fn new(round_count: usize) -> Self {
        Self { round_count }
    }

    pub fn planned_rounds(&self) -> usize {
        self.round_count
    }

    fn generate_next_round(&self, core: &mut CompetitionCore) {
        core.current_round += 1;
        let round = core.current_round;

        let mut pool: Vec<PlayerKey> = core
            .rankings
            .rankings()
            .into_iter()
            .map(|entry| entry.key().clone())
            .collect();

        // odd pool: bye for the lowest-ranked player that has none yet
        if pool.len() % 2 == 1 {
            let mut bye_index = None;
            for index in (1..pool.len()).rev() {
                let had_bye = core
                    .rankings
                    .entry(&pool[index])
                    .is_some_and(|entry| entry.byes() > 0);
                if !had_bye {
                    bye_index = Some(index);
                    break;
                }
            }
            if let Some(index) = bye_index {
                let key = pool.remove(index);
                core.push_duel(round, key, None).seal_bye();
            }
        }

        // pair the rest in ranking order: nearest not-yet-met opponent,
        // forced rematch with the next entry when none qualifies. The scan
        // stops before the last pool index.
        while pool.len() >= 2 {
            let home = pool[0].clone();
            let mut chosen = 1;
            for index in 1..pool.len().saturating_sub(1) {
                let rematch = core
                    .rankings
                    .entry(&home)
                    .is_some_and(|entry| entry.has_played_against(&pool[index]));
                if !rematch {
                    chosen = index;
                    break;
                }
            }
            let away = pool[chosen].clone();
            core.push_duel(round, home, Some(away));
            pool.remove(chosen);
            pool.remove(0);
        }
    }
}

impl Scheduling for Swiss {
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
        _rng: &mut StdRng,
    ) -> CompetitionResult<()> {
        core.round_count = self.round_count;
        self.generate_next_round(core);
        Ok(())
    }

    fn extend_calendar(&mut self, core: &mut CompetitionCore) -> CompetitionResult<bool> {
        if core.current_round >= core.round_count {
            return Ok(false);
        }
        self.generate_next_round(core);
        Ok(true)
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
        core.base_max_game_count(key)
    }

    fn players_to_start_round(&self, core: &CompetitionCore, round: usize) -> usize {
        if round < 1 || round > core.round_count {
            return 0;
        }
        core.player_count()
    }
}

#[cfg(test)]
mod tests {
    use crate::PlayerKey;
    use crate::competition::Competition;
    use crate::errors::CompetitionError;
    use crate::game::{DuelResult, Game};
    use std::collections::BTreeSet;

    fn keys(count: usize) -> Vec<PlayerKey> {
        (1..=count).map(|index| format!("p{index}")).collect()
    }

    fn play_through(competition: &mut Competition) {
        loop {
            competition.update_games_played().unwrap();
            let Some(number) = competition.next_game().map(Game::number) else {
                break;
            };
            competition.record_duel_result(number, DuelResult::HomeWin);
        }
    }

    #[test]
    fn test_round_count_bounds() {
        assert_eq!(
            Competition::swiss(keys(5), 1).unwrap_err(),
            CompetitionError::Parameter {
                parameter: "round count",
                reason: "required >= 2 for a swiss pairing".to_string(),
            }
        );
        assert_eq!(
            Competition::swiss(keys(5), 5).unwrap_err(),
            CompetitionError::PlayerCount {
                context: "to play that many swiss rounds",
                required: 6,
            }
        );
    }

    #[test]
    fn test_rounds_appear_lazily() {
        let mut competition = Competition::swiss(keys(5), 3).unwrap();
        assert_eq!(competition.round_count(), 3);
        // only round 1 exists up front: 2 duels + 1 bye
        assert_eq!(competition.game_count(), 3);
        play_through(&mut competition);
        assert!(competition.is_completed());
        assert_eq!(competition.game_count(), 9);
        assert_eq!(competition.current_round(), 3);
    }

    #[test]
    fn test_one_bye_per_round_never_repeated() {
        let mut competition = Competition::swiss(keys(5), 3).unwrap();
        play_through(&mut competition);

        let mut bye_recipients: BTreeSet<String> = BTreeSet::new();
        for round in 1..=3 {
            let byes: Vec<String> = competition
                .games_by_round(round)
                .iter()
                .filter_map(Game::as_duel)
                .filter(|duel| duel.is_bye())
                .map(|duel| duel.home_key().clone())
                .collect();
            assert_eq!(byes.len(), 1, "round {round} grants exactly one bye");
            assert!(
                bye_recipients.insert(byes[0].clone()),
                "bye granted twice to {}",
                byes[0]
            );
        }
    }

    #[test]
    fn test_pairs_nearest_unplayed_opponent() {
        let mut competition = Competition::swiss(keys(4), 3).unwrap();

        let pairs_of = |competition: &Competition, round: usize| -> Vec<(String, String)> {
            competition
                .games_by_round(round)
                .iter()
                .filter_map(Game::as_duel)
                .map(|duel| {
                    (
                        duel.home_key().clone(),
                        duel.away_key().cloned().unwrap_or_default(),
                    )
                })
                .collect()
        };

        play_through(&mut competition);
        assert_eq!(
            pairs_of(&competition, 1),
            [
                ("p1".to_string(), "p2".to_string()),
                ("p3".to_string(), "p4".to_string())
            ]
        );
        // round 2 pairs winners together: p1 and p3 lead after round 1
        assert_eq!(
            pairs_of(&competition, 2),
            [
                ("p1".to_string(), "p3".to_string()),
                ("p2".to_string(), "p4".to_string())
            ]
        );
        // round 3: every fresh opponent of p1 sits at the final pool index,
        // which the scan leaves out, so the rematch with p2 is forced
        assert_eq!(
            pairs_of(&competition, 3),
            [
                ("p1".to_string(), "p2".to_string()),
                ("p3".to_string(), "p4".to_string())
            ]
        );
    }

    #[test]
    fn test_rematches_only_forced_at_the_pool_tail() {
        let mut competition = Competition::swiss(keys(6), 3).unwrap();
        play_through(&mut competition);

        let mut met: BTreeSet<(String, String)> = BTreeSet::new();
        let mut rematches: Vec<(usize, (String, String))> = Vec::new();
        for round in 1..=3 {
            for duel in competition
                .games_by_round(round)
                .iter()
                .filter_map(Game::as_duel)
            {
                let Some(away) = duel.away_key() else { continue };
                let home = duel.home_key().clone();
                let pair = if home < *away {
                    (home, away.clone())
                } else {
                    (away.clone(), home)
                };
                if !met.insert(pair.clone()) {
                    rematches.push((round, pair));
                }
            }
        }
        // with all-home-wins standings, only the final leftover pair of
        // round 3 ever repeats
        assert_eq!(
            rematches,
            [(3, ("p4".to_string(), "p6".to_string()))]
        );
    }
}
