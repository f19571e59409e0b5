//! Shared state for all competition formats: roster and seeds, calendar,
//! game numbering, rankings holder, spots and elimination tracking.

use std::collections::BTreeMap;
use std::fmt;

use crate::game::{DuelGame, Game, PerformancesGame};
use crate::ranking::RankingsHolder;
use crate::rating::{self, SharedRatingAdapter};
use crate::{PlayerKey, TeamKey};

/// Format-independent competition state. Formats read and extend it while
/// generating calendars; the owning [`super::Competition`] exposes the
/// query surface.
#[derive(Clone)]
pub(crate) struct CompetitionCore {
    /// roster in creation order; index + 1 is the creation seed
    pub(crate) players: Vec<PlayerKey>,
    /// current seed mapping, replaced as a whole on re-seeding
    pub(crate) seeds: BTreeMap<PlayerKey, usize>,
    pub(crate) seed_version: usize,
    pub(crate) team_comp: Vec<(TeamKey, Vec<PlayerKey>)>,
    pub(crate) qualification_spots: usize,
    pub(crate) elimination_spots: usize,
    /// player key -> round on which the player was eliminated
    pub(crate) elimination_rounds: BTreeMap<PlayerKey, usize>,
    /// round -> games of the round, dense from round 1
    pub(crate) calendar: BTreeMap<usize, Vec<Game>>,
    /// game number - 1 -> (round, index in round)
    pub(crate) game_locations: Vec<(usize, usize)>,
    /// cursor on the first game not yet swept; `None` once exhausted
    pub(crate) next_game_number: Option<usize>,
    pub(crate) round_count: usize,
    pub(crate) current_round: usize,
    pub(crate) rankings: RankingsHolder,
    pub(crate) rating_adapter: Option<SharedRatingAdapter>,
}

// hand-written: the rating adapter is a caller-supplied trait object
// without a Debug bound
impl fmt::Debug for CompetitionCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompetitionCore")
            .field("players", &self.players)
            .field("seeds", &self.seeds)
            .field("round_count", &self.round_count)
            .field("current_round", &self.current_round)
            .field("next_game_number", &self.next_game_number)
            .field("games", &self.game_locations.len())
            .field("qualification_spots", &self.qualification_spots)
            .field("elimination_spots", &self.elimination_spots)
            .field("has_rating_adapter", &self.rating_adapter.is_some())
            .finish_non_exhaustive()
    }
}

impl CompetitionCore {
    pub(crate) fn new(players: Vec<PlayerKey>, rankings: RankingsHolder) -> Self {
        let seeds = players
            .iter()
            .enumerate()
            .map(|(index, key)| (key.clone(), index + 1))
            .collect();
        Self {
            players,
            seeds,
            seed_version: 0,
            team_comp: Vec::new(),
            qualification_spots: 0,
            elimination_spots: 0,
            elimination_rounds: BTreeMap::new(),
            calendar: BTreeMap::new(),
            game_locations: Vec::new(),
            next_game_number: Some(1),
            round_count: 1,
            current_round: 0,
            rankings,
            rating_adapter: None,
        }
    }

    pub(crate) fn player_count(&self) -> usize {
        self.players.len()
    }

    pub(crate) fn seed_of(&self, key: &str) -> usize {
        self.seeds.get(key).copied().unwrap_or(0)
    }

    /// Key holding a seed at creation time. Calendar generation runs before
    /// any re-seeding, so the roster order is authoritative here.
    pub(crate) fn initial_key(&self, seed: usize) -> Option<PlayerKey> {
        if seed == 0 {
            return None;
        }
        self.players.get(seed - 1).cloned()
    }

    /// Key currently holding a seed.
    pub(crate) fn key_on_seed(&self, seed: usize) -> Option<&PlayerKey> {
        self.seeds
            .iter()
            .find(|(_, held)| **held == seed)
            .map(|(key, _)| key)
    }

    /// Wrap a seed displacement over the player count, as a single fold.
    pub(crate) fn seed_gap(&self, current: usize, gap: i64) -> usize {
        let count = self.players.len() as i64;
        let mut next = current as i64 + gap;
        if next > count {
            next -= count;
        }
        if next < 1 {
            next += count;
        }
        next as usize
    }

    /// Wrap a round displacement over the round count, as a single fold.
    pub(crate) fn round_gap(&self, current: usize, gap: i64) -> usize {
        let count = self.round_count as i64;
        let mut next = current as i64 + gap;
        if next > count {
            next -= count;
        }
        if next < 1 {
            next += count;
        }
        next as usize
    }

    /// Append a duel to a round. The game gets its number at the next
    /// consolidation.
    pub(crate) fn push_duel(
        &mut self,
        round: usize,
        home: PlayerKey,
        away: Option<PlayerKey>,
    ) -> &mut DuelGame {
        let games = self.calendar.entry(round).or_default();
        games.push(Game::Duel(DuelGame::new(home, away, round)));
        match games.last_mut() {
            Some(Game::Duel(duel)) => duel,
            _ => unreachable!("just pushed a duel"),
        }
    }

    /// Append a multi-player scored game to a round.
    pub(crate) fn push_performances(
        &mut self,
        round: usize,
        players: Vec<PlayerKey>,
        types_to_sum: Vec<String>,
    ) -> &mut PerformancesGame {
        let games = self.calendar.entry(round).or_default();
        games.push(Game::Performances(PerformancesGame::new(
            players,
            types_to_sum,
            round,
        )));
        match games.last_mut() {
            Some(Game::Performances(game)) => game,
            _ => unreachable!("just pushed a performances game"),
        }
    }

    /// Number every not-yet-numbered game, walking rounds in ascending
    /// order. Lazily added rounds always come after the numbered ones, so
    /// numbering stays dense and round-major.
    pub(crate) fn consolidate_calendar(&mut self) {
        let mut number = self.game_locations.len() + 1;
        let rounds: Vec<usize> = self.calendar.keys().copied().collect();
        for round in rounds {
            let Some(games) = self.calendar.get_mut(&round) else {
                continue;
            };
            for (index, game) in games.iter_mut().enumerate() {
                if game.number() == 0 {
                    game.set_number(number);
                    self.game_locations.push((round, index));
                    number += 1;
                }
            }
        }
    }

    pub(crate) fn game_count(&self) -> usize {
        self.game_locations.len()
    }

    pub(crate) fn game_by_number(&self, number: usize) -> Option<&Game> {
        let (round, index) = *self.game_locations.get(number.checked_sub(1)?)?;
        self.calendar.get(&round)?.get(index)
    }

    pub(crate) fn game_by_number_mut(&mut self, number: usize) -> Option<&mut Game> {
        let (round, index) = *self.game_locations.get(number.checked_sub(1)?)?;
        self.calendar.get_mut(&round)?.get_mut(index)
    }

    pub(crate) fn games_in_round(&self, round: usize) -> &[Game] {
        self.calendar
            .get(&round)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn set_next_game(&mut self, number: usize) {
        self.next_game_number = if number >= 1 && number <= self.game_count() {
            Some(number)
        } else {
            None
        };
    }

    /// Fold a range of games into the rankings (and the rating adapter,
    /// when present), then recompute the order once.
    pub(crate) fn update_rankings_range(&mut self, from: usize, to: usize) {
        for number in from..=to {
            let Some(&(round, index)) = self.game_locations.get(number.wrapping_sub(1)) else {
                continue;
            };
            let Some(game) = self.calendar.get(&round).and_then(|games| games.get(index)) else {
                continue;
            };
            if let Err(err) = self.rankings.record_game(game) {
                log::error!("rankings update skipped for game {number}: {err}");
            }
            if let Some(adapter) = &self.rating_adapter {
                rating::update_for_game(adapter, game);
            }
        }
        self.rankings.compute_order();
    }

    pub(crate) fn set_elimination_round(&mut self, key: PlayerKey, round: usize) {
        self.elimination_rounds.insert(key, round);
    }

    pub(crate) fn elimination_round(&self, key: &str) -> Option<usize> {
        self.elimination_rounds.get(key).copied()
    }

    /// Remaining-game ceiling ignoring format specifics: the elimination
    /// round when eliminated, the full round count otherwise.
    pub(crate) fn base_max_game_count(&self, key: Option<&str>) -> usize {
        key.and_then(|key| self.elimination_round(key))
            .unwrap_or(self.round_count)
    }
}
