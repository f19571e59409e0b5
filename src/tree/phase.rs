//! Runtime phase: parallel competition groups started together.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::builder::PickupMethod;
use crate::PlayerKey;
use crate::competition::Competition;
use crate::errors::CompetitionResult;
use crate::game::Game;
use crate::ranking::{RankingEntry, RankingError};

/// The three spot families a competition partitions its final ranking
/// into.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotKind {
    Qualification,
    Stagnation,
    Elimination,
}

/// A named set of groups played in parallel. The phase is complete when
/// every group is; its "next game" is the earliest unplayed game over all
/// groups, declaration order breaking round ties.
#[derive(Clone, Debug)]
pub struct Phase {
    name: String,
    groups: Vec<(String, Competition)>,
    completed: bool,
}

impl Phase {
    pub(crate) fn new(name: String, groups: Vec<(String, Competition)>) -> Self {
        Self {
            name,
            groups,
            completed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &[(String, Competition)] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Competition> {
        self.groups
            .iter()
            .find(|(group, _)| group == name)
            .map(|(_, competition)| competition)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Competition> {
        self.groups
            .iter_mut()
            .find(|(group, _)| group == name)
            .map(|(_, competition)| competition)
    }

    /// Earliest unplayed game over all groups with its group name; lowest
    /// round wins, first declared group breaks ties. `None` marks the
    /// phase complete.
    pub fn next_game(&mut self) -> Option<(&str, &Game)> {
        if self.completed {
            return None;
        }
        let mut best: Option<(usize, usize)> = None;
        for (index, (_, competition)) in self.groups.iter_mut().enumerate() {
            let Some(game) = competition.next_game() else {
                continue;
            };
            let round = game.round();
            if best.is_none_or(|(_, held)| round < held) {
                best = Some((index, round));
            }
        }
        let Some((index, _)) = best else {
            self.completed = true;
            return None;
        };
        let (name, competition) = self.groups.get_mut(index)?;
        let game = competition.next_game()?;
        Some((name.as_str(), game))
    }

    /// Round of the next game, `None` once complete.
    pub fn current_round(&mut self) -> Option<usize> {
        let (_, game) = self.next_game()?;
        Some(game.round())
    }

    pub fn is_completed(&mut self) -> bool {
        if self.completed {
            return true;
        }
        self.next_game().is_none()
    }

    /// Sweep played games in every group, letting lazily growing formats
    /// schedule their next rounds.
    pub fn update_games_played(&mut self) -> CompetitionResult<()> {
        for (_, competition) in &mut self.groups {
            competition.update_games_played()?;
        }
        Ok(())
    }

    /// Games of one round across all groups, declaration order.
    pub fn games_by_round(&self, round: usize) -> Vec<&Game> {
        self.groups
            .iter()
            .flat_map(|(_, competition)| competition.games_by_round(round))
            .collect()
    }

    pub fn game_count(&self) -> usize {
        self.groups
            .iter()
            .map(|(_, competition)| competition.game_count())
            .sum()
    }

    pub fn games_completed_count(&self) -> usize {
        self.groups
            .iter()
            .map(|(_, competition)| competition.games_completed_count())
            .sum()
    }

    pub fn games_to_play_count(&self) -> usize {
        self.game_count() - self.games_completed_count()
    }

    pub fn round_count(&self) -> usize {
        self.groups
            .iter()
            .map(|(_, competition)| competition.round_count())
            .sum()
    }

    pub fn qualification_spots(&self) -> usize {
        self.groups
            .iter()
            .map(|(_, competition)| competition.qualification_spots())
            .sum()
    }

    pub fn elimination_spots(&self) -> usize {
        self.groups
            .iter()
            .map(|(_, competition)| competition.elimination_spots())
            .sum()
    }

    /// Per-group rankings, declaration order.
    pub fn rankings(&self, by_expenses: bool) -> Vec<(&str, Vec<&RankingEntry>)> {
        self.groups
            .iter()
            .map(|(name, competition)| {
                let entries = if by_expenses {
                    competition.rankings_by_expenses()
                } else {
                    competition.rankings()
                };
                (name.as_str(), entries)
            })
            .collect()
    }

    /// Per-group team rankings, declaration order.
    pub fn team_rankings(&self) -> Vec<(&str, Vec<RankingEntry>)> {
        self.groups
            .iter()
            .map(|(name, competition)| (name.as_str(), competition.team_rankings()))
            .collect()
    }

    /// One ranking across all groups: entries of every group merged into
    /// a fresh holder of the first group's kind and re-ordered. Fails when
    /// group kinds differ or a key shows up twice.
    pub fn mixed_rankings(&self, by_expenses: bool) -> Result<Vec<RankingEntry>, RankingError> {
        let Some((_, first)) = self.groups.first() else {
            return Ok(Vec::new());
        };
        let mut mixed = first.rankings_holder().duplicate_empty();
        for (_, competition) in &self.groups {
            mixed.merge_from(competition.rankings_holder())?;
        }
        mixed.compute_order();
        let entries = if by_expenses {
            mixed.rankings_by_expenses()
        } else {
            mixed.rankings()
        };
        Ok(entries.into_iter().cloned().collect())
    }

    /// Mixed rankings narrowed to the given keys, mixed order preserved.
    pub fn mixed_rankings_for_keys(
        &self,
        keys: &[PlayerKey],
        by_expenses: bool,
    ) -> Result<Vec<RankingEntry>, RankingError> {
        let mixed = self.mixed_rankings(by_expenses)?;
        Ok(mixed
            .into_iter()
            .filter(|entry| keys.contains(entry.key()))
            .collect())
    }

    pub fn mixed_rankings_for_qualification(&self) -> Result<Vec<RankingEntry>, RankingError> {
        self.mixed_rankings_for_keys(&self.spot_keys(SpotKind::Qualification, PickupMethod::ByGroup, None), false)
    }

    pub fn mixed_rankings_for_stagnation(&self) -> Result<Vec<RankingEntry>, RankingError> {
        self.mixed_rankings_for_keys(&self.spot_keys(SpotKind::Stagnation, PickupMethod::ByGroup, None), false)
    }

    pub fn mixed_rankings_for_elimination(&self) -> Result<Vec<RankingEntry>, RankingError> {
        self.mixed_rankings_for_keys(&self.spot_keys(SpotKind::Elimination, PickupMethod::ByGroup, None), false)
    }

    /// Team ranking across all groups; a team fielded in several groups
    /// shows up once per group, which is a duplicate and fails the merge.
    pub fn mixed_team_rankings(&self) -> Result<Vec<RankingEntry>, RankingError> {
        let Some((_, first)) = self.groups.first() else {
            return Ok(Vec::new());
        };
        let mut mixed = first.rankings_holder().duplicate_empty();
        for (_, competition) in &self.groups {
            let kind = competition.rankings_holder().kind();
            if kind != mixed.kind() {
                return Err(RankingError::KindMismatch {
                    expected: mixed.kind(),
                    found: kind,
                });
            }
            for entry in competition.team_rankings() {
                mixed.integrate_entry(entry)?;
            }
        }
        mixed.compute_order();
        Ok(mixed.rankings().into_iter().cloned().collect())
    }

    /// Keys of one spot family over all groups, read in the given pickup
    /// order. `ByRankShuffled` needs the rng; without one the tiers stay
    /// in group order.
    pub fn spot_keys(
        &self,
        spot: SpotKind,
        pickup: PickupMethod,
        mut rng: Option<&mut StdRng>,
    ) -> Vec<PlayerKey> {
        let group_spots: Vec<Vec<PlayerKey>> = self
            .groups
            .iter()
            .map(|(_, competition)| match spot {
                SpotKind::Qualification => competition.player_keys_for_qualification(),
                SpotKind::Stagnation => competition.player_keys_for_stagnation(),
                SpotKind::Elimination => competition.player_keys_for_elimination(),
            })
            .collect();

        match pickup {
            PickupMethod::ByGroup => group_spots.into_iter().flatten().collect(),
            PickupMethod::ByRankInGroup | PickupMethod::ByRankShuffled => {
                let tier_count = group_spots
                    .iter()
                    .map(Vec::len)
                    .max()
                    .unwrap_or(0);
                let mut keys = Vec::new();
                for tier in 0..tier_count {
                    let mut tier_keys: Vec<PlayerKey> = group_spots
                        .iter()
                        .filter_map(|spots| spots.get(tier).cloned())
                        .collect();
                    if pickup == PickupMethod::ByRankShuffled {
                        match rng {
                            Some(ref mut rng) => tier_keys.shuffle(*rng),
                            None => log::debug!("no rng for shuffled pickup, keeping group order"),
                        }
                    }
                    keys.extend(tier_keys);
                }
                keys
            }
            PickupMethod::ByRankInPhase => {
                let keys: Vec<PlayerKey> = group_spots.into_iter().flatten().collect();
                match self.mixed_rankings_for_keys(&keys, false) {
                    Ok(entries) => entries.into_iter().map(|entry| entry.key().clone()).collect(),
                    Err(err) => {
                        log::warn!(
                            "mixed rankings unavailable for phase {}, keeping group order: {err}",
                            self.name
                        );
                        keys
                    }
                }
            }
        }
    }
}
