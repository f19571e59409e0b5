//! Competition formats and the shared scheduling surface.
//!
//! A [`Competition`] pairs format-independent state (roster, seeds,
//! calendar, rankings) with one of a closed set of formats. The format set
//! is fixed and enumerable, so dispatch goes through `enum_dispatch` over
//! the [`Format`] enum rather than virtual inheritance: each format
//! implements one scheduling capability (calendar generation, lazy
//! extension, point bounds) and shares everything else.
//!
//! Formats:
//! - [`RoundRobin`]: circle-method championship, optional series and round
//!   shuffling
//! - [`Swiss`]: fixed round count, rounds paired lazily on current rankings
//! - [`Bracket`]: seeded single elimination, power-of-2 fields only
//! - [`Contest`]: multi-player scored rounds with bottom cuts

mod bracket;
mod builder;
mod contest;
mod core;
mod round_robin;
mod swiss;

pub use bracket::Bracket;
pub use builder::{FormatOptions, GroupLayout, Retention};
pub use contest::Contest;
pub use round_robin::RoundRobin;
pub use swiss::Swiss;

use enum_dispatch::enum_dispatch;
use rand::SeedableRng;
use rand::rngs::StdRng;

use self::core::CompetitionCore;
use crate::errors::{CompetitionError, CompetitionResult};
use crate::game::{DuelResult, Game};
use crate::ranking::{RankingEntry, RankingKind, RankingsHolder};
use crate::rating::{Elo, SharedRatingAdapter};
use crate::{PlayerKey, TeamKey};

/// Scheduling capability implemented by every format.
#[enum_dispatch]
pub(crate) trait Scheduling {
    /// Ranking kind accumulated by this format's games.
    fn kind(&self) -> RankingKind;

    /// Smallest roster this format accepts.
    fn min_player_count(&self) -> usize;

    /// Fresh holder configured for this format.
    fn build_rankings_holder(&self) -> RankingsHolder;

    /// Fill the calendar at construction time.
    fn generate_calendar(
        &mut self,
        core: &mut CompetitionCore,
        rng: &mut StdRng,
    ) -> CompetitionResult<()>;

    /// Called when the cursor ran past the last game; formats growing
    /// lazily add the next round here and report `true`.
    fn extend_calendar(&mut self, core: &mut CompetitionCore) -> CompetitionResult<bool>;

    /// Most points a single game can add to an entry; `None` when the
    /// format defines no bound.
    fn max_points_for_game(&self, core: &CompetitionCore) -> Option<i64>;

    /// Fewest points a single game can add to an entry.
    fn min_points_for_game(&self, core: &CompetitionCore) -> i64;

    /// Games every player is guaranteed to play.
    fn min_game_count_per_player(&self, core: &CompetitionCore) -> usize;

    /// Games a player can still reach in total, elimination considered.
    fn max_game_count_for_player(&self, core: &CompetitionCore, key: Option<&str>) -> usize;

    /// How many players are expected to start the given round.
    fn players_to_start_round(&self, core: &CompetitionCore, round: usize) -> usize;
}

/// Closed set of competition formats.
#[enum_dispatch(Scheduling)]
#[derive(Clone, Debug)]
pub enum Format {
    RoundRobin,
    Swiss,
    Bracket,
    Contest,
}

/// One scheduled competition: a roster, a calendar and live rankings.
///
/// All mutation happens inline in direct calls; repeated queries without
/// new results are idempotent. Instances assume exclusive single-owner
/// access.
#[derive(Clone, Debug)]
pub struct Competition {
    core: CompetitionCore,
    format: Format,
}

impl Competition {
    /// Round-robin championship. Every pair meets once per series; the rng
    /// is drawn from only when `shuffle_rounds` is set.
    pub fn round_robin(
        players: Vec<PlayerKey>,
        series: usize,
        shuffle_rounds: bool,
        rng: &mut StdRng,
    ) -> CompetitionResult<Self> {
        let format = Format::from(RoundRobin::new(series, shuffle_rounds));
        Self::assemble(format, players, rng)
    }

    /// Swiss championship over a fixed number of rounds.
    pub fn swiss(players: Vec<PlayerKey>, round_count: usize) -> CompetitionResult<Self> {
        if round_count < 2 {
            return Err(CompetitionError::parameter(
                "round count",
                "required >= 2 for a swiss pairing",
            ));
        }
        if round_count >= players.len() {
            return Err(CompetitionError::player_count(
                "to play that many swiss rounds",
                round_count + 1,
            ));
        }
        let format = Format::from(Swiss::new(round_count));
        let mut rng = StdRng::from_os_rng();
        Self::assemble(format, players, &mut rng)
    }

    /// Seeded single-elimination bracket; the field size must be a power
    /// of 2.
    pub fn bracket(players: Vec<PlayerKey>, best_seed_home: bool) -> CompetitionResult<Self> {
        let format = Format::from(Bracket::new(best_seed_home));
        let mut rng = StdRng::from_os_rng();
        Self::assemble(format, players, &mut rng)
    }

    /// Elimination contest: one scored game per round, bottom performers
    /// cut under the given retention rule.
    pub fn contest(
        players: Vec<PlayerKey>,
        performance_types: Vec<String>,
        retention: Retention,
    ) -> CompetitionResult<Self> {
        let format = Format::from(Contest::new(performance_types, retention)?);
        let mut rng = StdRng::from_os_rng();
        Self::assemble(format, players, &mut rng)
    }

    pub(crate) fn assemble(
        mut format: Format,
        players: Vec<PlayerKey>,
        rng: &mut StdRng,
    ) -> CompetitionResult<Self> {
        let required = format.min_player_count();
        if players.len() < required {
            return Err(CompetitionError::player_count(
                "to create a competition",
                required,
            ));
        }
        let mut holder = format.build_rankings_holder();
        for (index, key) in players.iter().enumerate() {
            holder.add_entry(key.clone(), index + 1)?;
        }
        holder.compute_order();
        let mut core = CompetitionCore::new(players, holder);
        format.generate_calendar(&mut core, rng)?;
        core.consolidate_calendar();
        Ok(Self { core, format })
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn kind(&self) -> RankingKind {
        self.format.kind()
    }

    // ---- roster & seeds ----------------------------------------------

    pub fn player_count(&self) -> usize {
        self.core.player_count()
    }

    /// Roster in creation order.
    pub fn players(&self) -> &[PlayerKey] {
        &self.core.players
    }

    /// Roster in current ranking order.
    pub fn players_ranked(&self) -> Vec<&PlayerKey> {
        self.core
            .rankings
            .rankings()
            .into_iter()
            .map(RankingEntry::key)
            .collect()
    }

    /// Current seed of a player, 0 when unknown.
    pub fn player_seed(&self, key: &str) -> usize {
        self.core.seed_of(key)
    }

    pub fn player_key_on_seed(&self, seed: usize) -> Option<&PlayerKey> {
        self.core.key_on_seed(seed)
    }

    /// Keys ordered by their current seed.
    pub fn player_keys_seeded(&self) -> Vec<&PlayerKey> {
        let mut by_seed: Vec<(&usize, &PlayerKey)> = self
            .core
            .seeds
            .iter()
            .map(|(key, seed)| (seed, key))
            .collect();
        by_seed.sort();
        by_seed.into_iter().map(|(_, key)| key).collect()
    }

    /// How many times the seed mapping has been replaced.
    pub fn seed_version(&self) -> usize {
        self.core.seed_version
    }

    /// Recompute seeds from the duels of a round: every away winner takes
    /// over its opponent's seed, the opponent slips one down. The new
    /// mapping replaces the old one in a single swap.
    pub fn reseed_from_round(&mut self, round: usize) {
        let mut swaps: Vec<(PlayerKey, PlayerKey)> = Vec::new();
        for game in self.core.games_in_round(round) {
            if let Game::Duel(duel) = game {
                if duel.has_away_won() {
                    if let Some(away) = duel.away_key() {
                        swaps.push((duel.home_key().clone(), away.clone()));
                    }
                }
            }
        }
        if swaps.is_empty() {
            return;
        }
        let mut next = self.core.seeds.clone();
        for (home, away) in swaps {
            let home_seed = self.core.seed_of(&home);
            next.insert(home.clone(), home_seed + 1);
            next.insert(away.clone(), home_seed);
        }
        self.core.seeds = next;
        self.core.seed_version += 1;
        let seeds: Vec<(PlayerKey, usize)> = self
            .core
            .seeds
            .iter()
            .map(|(key, seed)| (key.clone(), *seed))
            .collect();
        for (key, seed) in seeds {
            self.core.rankings.set_entry_seed(&key, seed);
        }
        self.core.rankings.compute_order();
    }

    // ---- teams --------------------------------------------------------

    /// Attach an externally owned team composition: team key -> member
    /// player keys. Referenced for aggregation only.
    pub fn set_team_composition(&mut self, team_comp: Vec<(TeamKey, Vec<PlayerKey>)>) {
        self.core.team_comp = team_comp;
    }

    pub fn team_composition(&self) -> &[(TeamKey, Vec<PlayerKey>)] {
        &self.core.team_comp
    }

    pub fn team_count(&self) -> usize {
        self.core.team_comp.len()
    }

    pub fn team_keys(&self) -> Vec<&TeamKey> {
        self.core.team_comp.iter().map(|(key, _)| key).collect()
    }

    /// Team seed is declaration order, 0 when unknown.
    pub fn team_seed(&self, key: &str) -> usize {
        self.core
            .team_comp
            .iter()
            .position(|(team, _)| team == key)
            .map(|index| index + 1)
            .unwrap_or(0)
    }

    pub fn team_key_on_seed(&self, seed: usize) -> Option<&TeamKey> {
        self.core
            .team_comp
            .get(seed.checked_sub(1)?)
            .map(|(key, _)| key)
    }

    pub fn player_keys_in_team(&self, key: &str) -> &[PlayerKey] {
        self.core
            .team_comp
            .iter()
            .find(|(team, _)| team == key)
            .map(|(_, members)| members.as_slice())
            .unwrap_or_default()
    }

    /// Whether a team fields at least one player of this competition. In a
    /// tree the composition lives at tree level and a group may hold only
    /// part of every team.
    pub fn is_team_with_players(&self, key: &str) -> bool {
        self.player_keys_in_team(key)
            .iter()
            .any(|member| self.core.rankings.entry(member).is_some())
    }

    /// Team rankings over teams with at least one present member.
    pub fn team_rankings(&self) -> Vec<RankingEntry> {
        let present: Vec<(TeamKey, Vec<PlayerKey>)> = self
            .core
            .team_comp
            .iter()
            .filter(|(key, _)| self.is_team_with_players(key))
            .cloned()
            .collect();
        self.core.rankings.team_rankings(&present)
    }

    // ---- calendar & games --------------------------------------------

    pub fn game_count(&self) -> usize {
        self.core.game_count()
    }

    /// All games in number order.
    pub fn games(&self) -> Vec<&Game> {
        (1..=self.core.game_count())
            .filter_map(|number| self.core.game_by_number(number))
            .collect()
    }

    pub fn games_by_round(&self, round: usize) -> &[Game] {
        self.core.games_in_round(round)
    }

    pub fn game_by_number(&self, number: usize) -> Option<&Game> {
        self.core.game_by_number(number)
    }

    pub fn game_by_number_mut(&mut self, number: usize) -> Option<&mut Game> {
        self.core.game_by_number_mut(number)
    }

    /// Round of a game number, when the game exists.
    pub fn game_round(&self, number: usize) -> Option<usize> {
        self.core
            .game_locations
            .get(number.checked_sub(1)?)
            .map(|(round, _)| *round)
    }

    /// Record a duel outcome by game number.
    pub fn record_duel_result(&mut self, number: usize, result: DuelResult) -> bool {
        match self.core.game_by_number_mut(number).and_then(Game::as_duel_mut) {
            Some(duel) => {
                duel.set_result(result);
                true
            }
            None => false,
        }
    }

    /// Assign display names to games in number order.
    pub fn rename_games(&mut self, names: &[&str]) {
        for (index, name) in names.iter().enumerate() {
            match self.core.game_by_number_mut(index + 1) {
                Some(game) => game.set_name(*name),
                None => break,
            }
        }
    }

    pub fn round_count(&self) -> usize {
        self.core.round_count
    }

    pub fn current_round(&self) -> usize {
        self.core.current_round
    }

    pub fn players_to_start_round(&self, round: usize) -> usize {
        self.format.players_to_start_round(&self.core, round)
    }

    // ---- play progression --------------------------------------------

    /// First unplayed game, sweeping any freshly played games into the
    /// rankings on the way and letting lazily growing formats schedule
    /// their next round when the calendar ran dry.
    pub fn next_game(&mut self) -> Option<&Game> {
        self.sweep_played_games();
        // an extension failure cannot yield a next game either way
        if let Err(err) = self.extend_if_exhausted() {
            log::error!("calendar extension failed: {err}");
        }
        let number = self.core.next_game_number?;
        self.core.game_by_number(number)
    }

    /// Sweep played games into the rankings and, when a lazily growing
    /// format ran out of games, generate its next round. Idempotent when
    /// nothing new was played.
    pub fn update_games_played(&mut self) -> CompetitionResult<()> {
        self.sweep_played_games();
        self.extend_if_exhausted()
    }

    fn extend_if_exhausted(&mut self) -> CompetitionResult<()> {
        if self.core.next_game_number.is_none() {
            let before = self.core.game_count();
            if self.format.extend_calendar(&mut self.core)? {
                self.core.consolidate_calendar();
                self.core.set_next_game(before + 1);
            }
        }
        Ok(())
    }

    fn sweep_played_games(&mut self) {
        let Some(start) = self.core.next_game_number else {
            return;
        };
        if start == 1 {
            self.core.current_round = 1;
        }
        let mut number = start;
        loop {
            let round = match self.core.game_by_number(number) {
                Some(game) if game.is_played() => game.round(),
                _ => break,
            };
            self.core.current_round = round;
            number += 1;
        }
        if number != start {
            self.core.update_rankings_range(start, number - 1);
            self.core.set_next_game(number);
        }
    }

    /// Completed once every scheduled game is played and no format wants
    /// to extend the calendar any further.
    pub fn is_completed(&self) -> bool {
        self.core.next_game_number.is_none() && self.core.game_count() != 0
    }

    pub fn games_completed_count(&self) -> usize {
        match self.core.next_game_number {
            None => self.core.game_count(),
            Some(next) => next - 1,
        }
    }

    pub fn games_to_play_count(&self) -> usize {
        self.core.game_count() - self.games_completed_count()
    }

    pub fn min_game_count_per_player(&self) -> usize {
        self.format.min_game_count_per_player(&self.core)
    }

    pub fn max_game_count_for_player(&self, key: Option<&str>) -> usize {
        self.format.max_game_count_for_player(&self.core, key)
    }

    // ---- rankings -----------------------------------------------------

    pub fn rankings_holder(&self) -> &RankingsHolder {
        &self.core.rankings
    }

    /// Entries from first to last.
    pub fn rankings(&self) -> Vec<&RankingEntry> {
        self.core.rankings.rankings()
    }

    /// Entries ordered by the expense metric instead of points.
    pub fn rankings_by_expenses(&self) -> Vec<&RankingEntry> {
        self.core.rankings.rankings_by_expenses()
    }

    pub fn player_ranking(&self, key: &str) -> Option<&RankingEntry> {
        self.core.rankings.entry(key)
    }

    pub fn player_rank(&self, key: &str) -> Option<usize> {
        self.core.rankings.rank_of(key)
    }

    pub fn max_points_for_game(&self) -> Option<i64> {
        self.format.max_points_for_game(&self.core)
    }

    pub fn min_points_for_game(&self) -> i64 {
        self.format.min_points_for_game(&self.core)
    }

    // ---- spots & elimination -----------------------------------------

    /// Spots opened for qualification at the end of the competition.
    pub fn set_qualification_spots(&mut self, spots: usize) -> CompetitionResult<()> {
        if spots + self.core.elimination_spots > self.core.player_count() {
            return Err(CompetitionError::parameter(
                "qualification spots",
                "qualification and elimination spots exceed the player count",
            ));
        }
        self.core.qualification_spots = spots;
        Ok(())
    }

    pub fn qualification_spots(&self) -> usize {
        self.core.qualification_spots
    }

    /// Spots opened for elimination at the end of the competition.
    pub fn set_elimination_spots(&mut self, spots: usize) -> CompetitionResult<()> {
        if self.core.qualification_spots + spots > self.core.player_count() {
            return Err(CompetitionError::parameter(
                "elimination spots",
                "qualification and elimination spots exceed the player count",
            ));
        }
        self.core.elimination_spots = spots;
        Ok(())
    }

    pub fn elimination_spots(&self) -> usize {
        self.core.elimination_spots
    }

    pub fn first_elimination_rank(&self) -> usize {
        self.core.player_count() - self.core.elimination_spots + 1
    }

    /// Keys currently sitting in the qualification spots, best first.
    pub fn player_keys_for_qualification(&self) -> Vec<PlayerKey> {
        self.ranked_slice(0, self.core.qualification_spots)
    }

    /// Keys neither qualified nor eliminated, in ranking order.
    pub fn player_keys_for_stagnation(&self) -> Vec<PlayerKey> {
        let spots = self
            .core
            .player_count()
            .saturating_sub(self.core.qualification_spots + self.core.elimination_spots);
        self.ranked_slice(self.core.qualification_spots, spots)
    }

    /// Keys currently sitting in the elimination spots, best first.
    pub fn player_keys_for_elimination(&self) -> Vec<PlayerKey> {
        if self.core.elimination_spots == 0 {
            return Vec::new();
        }
        let start = self
            .core
            .player_count()
            .saturating_sub(self.core.elimination_spots);
        self.ranked_slice(start, self.core.elimination_spots)
    }

    fn ranked_slice(&self, start: usize, length: usize) -> Vec<PlayerKey> {
        self.core
            .rankings
            .rankings()
            .into_iter()
            .skip(start)
            .take(length)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Round on which a player got eliminated, `None` while still in.
    pub fn player_elimination_round(&self, key: &str) -> Option<usize> {
        self.core.elimination_round(key)
    }

    // ---- reachability -------------------------------------------------

    pub fn can_player_win(&self, key: &str) -> bool {
        self.can_player_reach_rank(key, 1)
    }

    pub fn can_player_reach_rank(&self, key: &str, rank: usize) -> bool {
        let (Some(target), Some(player)) = (
            self.core.rankings.entry_at_rank(rank),
            self.core.rankings.entry(key),
        ) else {
            return false;
        };
        self.can_entry_reach_entry(player, target)
    }

    pub fn can_player_drop_to_rank(&self, key: &str, rank: usize) -> bool {
        let (Some(target), Some(player)) = (
            self.core.rankings.entry_at_rank(rank),
            self.core.rankings.entry(key),
        ) else {
            return false;
        };
        self.can_entry_reach_entry(target, player)
    }

    /// True when `a` can still end with at least as many points as `b`:
    /// `a` is not eliminated and its best case beats `b`'s worst case. A
    /// format with no per-game point bound keeps everything reachable.
    fn can_entry_reach_entry(&self, a: &RankingEntry, b: &RankingEntry) -> bool {
        if self.core.elimination_round(a.key()).is_some() {
            return false;
        }
        let Some(max_points) = self.max_points_for_game() else {
            return true;
        };
        let to_play_a = self
            .max_game_count_for_player(Some(a.key()))
            .saturating_sub(a.played()) as i64;
        let to_play_b = self
            .max_game_count_for_player(Some(b.key()))
            .saturating_sub(b.played()) as i64;
        let best_a = a.points() + to_play_a * max_points;
        let worst_b = b.points() + to_play_b * self.min_points_for_game();
        best_a >= worst_b
    }

    pub fn can_player_lose(&self, key: &str) -> bool {
        self.can_player_drop_to_rank(key, 2)
    }

    pub fn can_player_be_last(&self, key: &str) -> bool {
        self.can_player_drop_to_rank(key, self.core.player_count())
    }

    /// Tightest still-reachable rank, scanning upward from the current one.
    pub fn best_reachable_rank(&self, key: &str) -> Option<usize> {
        if self.can_player_win(key) {
            return Some(1);
        }
        let player_rank = self.core.rankings.rank_of(key)?;
        let mut rank = player_rank.saturating_sub(1);
        while rank > 1 {
            if !self.can_player_reach_rank(key, rank) {
                return Some(rank + 1);
            }
            rank -= 1;
        }
        Some(rank + 1)
    }

    /// Tightest still-droppable rank, scanning downward from the current
    /// one.
    pub fn worst_droppable_rank(&self, key: &str) -> Option<usize> {
        if self.can_player_be_last(key) {
            return Some(self.core.player_count());
        }
        let player_rank = self.core.rankings.rank_of(key)?;
        let mut rank = player_rank + 1;
        while rank < self.core.player_count() {
            if !self.can_player_drop_to_rank(key, rank) {
                return Some(rank - 1);
            }
            rank += 1;
        }
        Some(rank - 1)
    }

    /// In re-seeding play, a seed is reachable when enough games remain to
    /// climb that far.
    pub fn can_player_reach_seed(&self, key: &str, seed: usize) -> bool {
        let Some(entry) = self.core.rankings.entry(key) else {
            return false;
        };
        let Some(rank) = self.core.rankings.rank_of(key) else {
            return false;
        };
        let to_play = self
            .max_game_count_for_player(Some(key))
            .saturating_sub(entry.played());
        to_play as i64 >= rank as i64 - seed as i64
    }

    pub fn can_player_drop_to_seed(&self, key: &str, seed: usize) -> bool {
        let Some(entry) = self.core.rankings.entry(key) else {
            return false;
        };
        let Some(rank) = self.core.rankings.rank_of(key) else {
            return false;
        };
        let to_play = self
            .max_game_count_for_player(Some(key))
            .saturating_sub(entry.played());
        to_play as i64 >= seed as i64 - rank as i64
    }

    // ---- ratings ------------------------------------------------------

    /// Attach a rating adapter; without one, rating tracking stays off.
    pub fn set_rating_adapter(&mut self, adapter: SharedRatingAdapter) {
        self.core.rating_adapter = Some(adapter);
    }

    pub fn is_using_ratings(&self) -> bool {
        self.core.rating_adapter.is_some()
    }

    /// Rated players best first; empty without an adapter.
    pub fn rating_rankings(&self) -> Vec<(PlayerKey, Elo)> {
        let Some(adapter) = &self.core.rating_adapter else {
            return Vec::new();
        };
        let adapter = adapter.borrow();
        let mut rated: Vec<(PlayerKey, Elo)> = self
            .player_keys_seeded()
            .into_iter()
            .filter_map(|key| adapter.rating(key).map(|elo| (key.clone(), elo)))
            .collect();
        rated.sort_by(|a, b| b.1.cmp(&a.1));
        rated
    }

    /// Teams best first by average member rating; teams with an unrated
    /// member are skipped.
    pub fn team_rating_rankings(&self) -> Vec<(TeamKey, Elo)> {
        let Some(adapter) = &self.core.rating_adapter else {
            return Vec::new();
        };
        let adapter = adapter.borrow();
        let mut rated: Vec<(TeamKey, Elo)> = Vec::new();
        for (team, members) in &self.core.team_comp {
            let mut total = 0i64;
            let mut counted = 0i64;
            for member in members {
                match adapter.rating(member) {
                    Some(elo) => {
                        total += i64::from(elo);
                        counted += 1;
                    }
                    None => {
                        counted = 0;
                        break;
                    }
                }
            }
            if counted > 0 {
                rated.push((team.clone(), (total / counted) as Elo));
            }
        }
        rated.sort_by(|a, b| b.1.cmp(&a.1));
        rated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    pub(crate) fn keys(count: usize) -> Vec<PlayerKey> {
        (1..=count).map(|index| format!("p{index}")).collect()
    }

    pub(crate) fn seeded_rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_construction_rejects_small_rosters() {
        let mut rng = seeded_rng();
        let err = Competition::round_robin(keys(2), 1, false, &mut rng).unwrap_err();
        assert_eq!(
            err,
            CompetitionError::PlayerCount {
                context: "to create a competition",
                required: 3
            }
        );
    }

    #[test]
    fn test_seeds_follow_roster_order() {
        let mut rng = seeded_rng();
        let competition = Competition::round_robin(keys(4), 1, false, &mut rng).unwrap();
        assert_eq!(competition.player_seed("p1"), 1);
        assert_eq!(competition.player_seed("p4"), 4);
        assert_eq!(competition.player_seed("ghost"), 0);
        assert_eq!(
            competition.player_key_on_seed(2).map(String::as_str),
            Some("p2")
        );
    }

    #[test]
    fn test_next_game_is_idempotent() {
        let mut rng = seeded_rng();
        let mut competition = Competition::round_robin(keys(4), 1, false, &mut rng).unwrap();
        let first = competition.next_game().map(Game::number);
        let again = competition.next_game().map(Game::number);
        assert_eq!(first, again);
        competition.update_games_played().unwrap();
        competition.update_games_played().unwrap();
        assert_eq!(competition.next_game().map(Game::number), first);
        assert_eq!(competition.games_completed_count(), 0);
    }

    #[test]
    fn test_playing_through_completes() {
        let mut rng = seeded_rng();
        let mut competition = Competition::round_robin(keys(4), 1, false, &mut rng).unwrap();
        let total = competition.game_count();
        for number in 1..=total {
            competition.record_duel_result(number, DuelResult::HomeWin);
        }
        competition.update_games_played().unwrap();
        assert!(competition.is_completed());
        assert_eq!(competition.games_completed_count(), total);
        assert_eq!(competition.games_to_play_count(), 0);
        // a second sweep with no new results changes nothing
        let before: Vec<PlayerKey> = competition
            .rankings()
            .iter()
            .map(|e| e.key().clone())
            .collect();
        competition.update_games_played().unwrap();
        let after: Vec<PlayerKey> = competition
            .rankings()
            .iter()
            .map(|e| e.key().clone())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_spot_sets_partition_rankings() {
        let mut rng = seeded_rng();
        let mut competition = Competition::round_robin(keys(6), 1, false, &mut rng).unwrap();
        competition.set_qualification_spots(2).unwrap();
        competition.set_elimination_spots(2).unwrap();
        assert_eq!(competition.first_elimination_rank(), 5);
        let qualified = competition.player_keys_for_qualification();
        let stagnant = competition.player_keys_for_stagnation();
        let eliminated = competition.player_keys_for_elimination();
        assert_eq!(qualified.len(), 2);
        assert_eq!(stagnant.len(), 2);
        assert_eq!(eliminated.len(), 2);
        let mut all = qualified;
        all.extend(stagnant);
        all.extend(eliminated);
        let mut sorted = all.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 6);
    }

    #[test]
    fn test_spots_cannot_exceed_players() {
        let mut rng = seeded_rng();
        let mut competition = Competition::round_robin(keys(4), 1, false, &mut rng).unwrap();
        competition.set_qualification_spots(3).unwrap();
        assert!(competition.set_elimination_spots(2).is_err());
    }

    #[test]
    fn test_reseed_swaps_seats_functionally() {
        let mut rng = seeded_rng();
        let mut competition = Competition::round_robin(keys(4), 1, false, &mut rng).unwrap();
        let round_one: Vec<usize> = competition
            .games_by_round(1)
            .iter()
            .map(Game::number)
            .collect();
        // make every away side win round 1
        for number in round_one {
            competition.record_duel_result(number, DuelResult::AwayWin);
        }
        competition.update_games_played().unwrap();
        let version = competition.seed_version();
        competition.reseed_from_round(1);
        assert_eq!(competition.seed_version(), version + 1);
        // round 1 of a 4-player circle pairs 1v2 and 3v4
        assert_eq!(competition.player_seed("p2"), 1);
        assert_eq!(competition.player_seed("p1"), 2);
        assert_eq!(competition.player_seed("p4"), 3);
        assert_eq!(competition.player_seed("p3"), 4);
    }

    #[test]
    fn test_team_rankings_only_count_present_teams() {
        let mut rng = seeded_rng();
        let mut competition = Competition::round_robin(keys(4), 1, false, &mut rng).unwrap();
        competition.set_team_composition(vec![
            ("north".to_string(), vec!["p1".to_string(), "p2".to_string()]),
            ("south".to_string(), vec!["p3".to_string(), "p4".to_string()]),
            ("ghosts".to_string(), vec!["q9".to_string()]),
        ]);
        assert_eq!(competition.team_seed("south"), 2);
        assert!(!competition.is_team_with_players("ghosts"));
        assert_eq!(competition.team_rankings().len(), 2);
    }

    #[test]
    fn test_rename_games_in_number_order() {
        let mut rng = seeded_rng();
        let mut competition = Competition::round_robin(keys(4), 1, false, &mut rng).unwrap();
        competition.rename_games(&["opener", "second"]);
        assert_eq!(competition.game_by_number(1).unwrap().name(), Some("opener"));
        assert_eq!(competition.game_by_number(2).unwrap().name(), Some("second"));
        assert_eq!(competition.game_by_number(3).unwrap().name(), None);
    }

    #[test]
    fn test_reachability_narrows_as_games_pass() {
        let mut rng = seeded_rng();
        let mut competition = Competition::round_robin(keys(4), 1, false, &mut rng).unwrap();
        assert!(competition.can_player_win("p4"));
        // p4 loses every game; p1 wins every game
        let numbers: Vec<usize> = (1..=competition.game_count()).collect();
        for number in numbers {
            let game = competition.game_by_number(number).unwrap();
            let duel = game.as_duel().unwrap();
            let p1_home = duel.home_key() == "p1";
            let p4_home = duel.home_key() == "p4";
            let result = if p1_home || !p4_home {
                DuelResult::HomeWin
            } else {
                DuelResult::AwayWin
            };
            let result = if duel.away_key().map(String::as_str) == Some("p1") {
                DuelResult::AwayWin
            } else {
                result
            };
            competition.record_duel_result(number, result);
            competition.update_games_played().unwrap();
        }
        assert!(competition.is_completed());
        assert!(!competition.can_player_win("p4"));
        assert_eq!(competition.best_reachable_rank("p1"), Some(1));
    }
}
