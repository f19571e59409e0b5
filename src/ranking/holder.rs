//! Rankings holder: entry ownership, points table and total-order
//! computation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::entry::RankingEntry;
use super::errors::RankingError;
use crate::game::Game;
use crate::{PlayerKey, TeamKey};

/// Which shape of games a holder accumulates and which tie-break cascade
/// it applies.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum RankingKind {
    /// Two-player games: win/draw/loss tallies drive the order.
    Duel,
    /// Multi-player scored games: performance sums drive the order.
    Performances,
}

impl fmt::Display for RankingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Duel => "duel",
            Self::Performances => "performances",
        };
        write!(f, "{repr}")
    }
}

/// Points awarded per game result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsTable {
    pub won: i64,
    pub drawn: i64,
    pub loss: i64,
    pub bye: i64,
    /// in-game rank -> points, for multi-player games
    pub by_position: BTreeMap<usize, i64>,
}

impl PointsTable {
    /// Default duel attribution: win 3, draw 1, loss 0, bye as a win.
    pub fn duel_default() -> Self {
        Self {
            won: 3,
            drawn: 1,
            loss: 0,
            bye: 3,
            by_position: BTreeMap::new(),
        }
    }

    /// Default attribution for scored games: no result points, the
    /// performance sums carry the ranking.
    pub fn performances_default() -> Self {
        Self {
            won: 0,
            drawn: 0,
            loss: 0,
            bye: 0,
            by_position: BTreeMap::new(),
        }
    }

    pub fn position_points(&self, rank: usize) -> i64 {
        self.by_position.get(&rank).copied().unwrap_or(0)
    }
}

/// Owns all ranking entries of one competition, the points table, the
/// performance types used as secondary tie-breaks and the computed order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingsHolder {
    kind: RankingKind,
    points: PointsTable,
    performance_types: Vec<String>,
    entries: BTreeMap<PlayerKey, RankingEntry>,
    order: Vec<PlayerKey>,
}

impl RankingsHolder {
    pub fn new(kind: RankingKind) -> Self {
        let points = match kind {
            RankingKind::Duel => PointsTable::duel_default(),
            RankingKind::Performances => PointsTable::performances_default(),
        };
        Self {
            kind,
            points,
            performance_types: Vec::new(),
            entries: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    pub fn kind(&self) -> RankingKind {
        self.kind
    }

    pub fn points_table(&self) -> &PointsTable {
        &self.points
    }

    pub fn set_points_table(&mut self, points: PointsTable) {
        self.points = points;
    }

    /// Declare a performance type used as a tie-break; comparison order
    /// follows declaration order.
    pub fn add_performance_type(&mut self, kind: impl Into<String>) {
        let kind = kind.into();
        if !self.performance_types.contains(&kind) {
            self.performance_types.push(kind);
        }
    }

    pub fn performance_types(&self) -> &[String] {
        &self.performance_types
    }

    pub fn add_entry(&mut self, key: PlayerKey, seed: usize) -> Result<(), RankingError> {
        if self.entries.contains_key(&key) {
            return Err(RankingError::DuplicateEntry(key));
        }
        self.entries.insert(key.clone(), RankingEntry::new(key, seed));
        Ok(())
    }

    pub fn entry(&self, key: &str) -> Option<&RankingEntry> {
        self.entries.get(key)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn set_entry_seed(&mut self, key: &str, seed: usize) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.set_seed(seed);
        }
    }

    /// Fold a played game into the affected entries. The caller recomputes
    /// the order after a batch of updates.
    pub fn record_game(&mut self, game: &Game) -> Result<(), RankingError> {
        match (self.kind, game) {
            (RankingKind::Duel, Game::Duel(duel)) => {
                let table = &self.points;
                for key in duel.player_keys() {
                    if let Some(entry) = self.entries.get_mut(key.as_str()) {
                        entry.record_duel(duel, table);
                    }
                }
                Ok(())
            }
            (RankingKind::Performances, Game::Performances(scored)) => {
                let table = &self.points;
                for key in scored.players() {
                    if let Some(entry) = self.entries.get_mut(key.as_str()) {
                        entry.record_performances(scored, table);
                    }
                }
                Ok(())
            }
            (kind, Game::Duel(_)) => Err(RankingError::GameKindMismatch { kind, game: "duel" }),
            (kind, Game::Performances(_)) => Err(RankingError::GameKindMismatch {
                kind,
                game: "performances",
            }),
        }
    }

    /// Recompute the total order. The cascade ends at the seed (then the
    /// key, which only matters in merged holders where seeds can collide),
    /// so the order is strict: no unresolved ties.
    pub fn compute_order(&mut self) {
        let mut ranked: Vec<&RankingEntry> = self.entries.values().collect();
        ranked.sort_by(|a, b| self.compare_entries(a, b));
        let order: Vec<PlayerKey> = ranked.into_iter().map(|entry| entry.key().clone()).collect();
        self.order = order;
    }

    /// Tie-break cascade, best entry first.
    pub fn compare_entries(&self, a: &RankingEntry, b: &RankingEntry) -> Ordering {
        let head = match self.kind {
            RankingKind::Duel => b
                .points()
                .cmp(&a.points())
                .then_with(|| b.wins().cmp(&a.wins()))
                .then_with(|| b.drawn().cmp(&a.drawn())),
            RankingKind::Performances => b
                .points()
                .cmp(&a.points())
                .then_with(|| b.played_at_rank(1).cmp(&a.played_at_rank(1)))
                .then_with(|| b.played_at_rank(2).cmp(&a.played_at_rank(2)))
                .then_with(|| b.played_at_rank(3).cmp(&a.played_at_rank(3))),
        };
        head.then_with(|| self.compare_performances(a, b))
            .then_with(|| a.played().cmp(&b.played()))
            .then_with(|| a.seed().cmp(&b.seed()))
            .then_with(|| a.key().cmp(b.key()))
    }

    fn compare_performances(&self, a: &RankingEntry, b: &RankingEntry) -> Ordering {
        for kind in &self.performance_types {
            let step = b.performance_total(kind).cmp(&a.performance_total(kind));
            if step != Ordering::Equal {
                return step;
            }
        }
        Ordering::Equal
    }

    /// Entries from best to worst, as last computed.
    pub fn rankings(&self) -> Vec<&RankingEntry> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key))
            .collect()
    }

    /// Entries ordered by the expense metric: fewer total expenses first,
    /// then the usual cascade tail.
    pub fn rankings_by_expenses(&self) -> Vec<&RankingEntry> {
        let mut ranked: Vec<&RankingEntry> = self.entries.values().collect();
        ranked.sort_by(|a, b| {
            a.expense_total()
                .cmp(&b.expense_total())
                .then_with(|| a.played().cmp(&b.played()))
                .then_with(|| a.seed().cmp(&b.seed()))
                .then_with(|| a.key().cmp(b.key()))
        });
        ranked
    }

    /// 1-based rank of a key, `None` if absent.
    pub fn rank_of(&self, key: &str) -> Option<usize> {
        self.order
            .iter()
            .position(|ranked| ranked == key)
            .map(|index| index + 1)
    }

    /// Entry currently sitting at the given 1-based rank.
    pub fn entry_at_rank(&self, rank: usize) -> Option<&RankingEntry> {
        let key = self.order.get(rank.checked_sub(1)?)?;
        self.entries.get(key)
    }

    /// Fresh holder with the same kind, points table and performance types
    /// but no entries; the receiving end of a mixed-rankings merge.
    pub fn duplicate_empty(&self) -> Self {
        Self {
            kind: self.kind,
            points: self.points.clone(),
            performance_types: self.performance_types.clone(),
            entries: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Adopt a foreign entry, keeping its accumulated stats.
    pub fn integrate_entry(&mut self, entry: RankingEntry) -> Result<(), RankingError> {
        if self.entries.contains_key(entry.key()) {
            return Err(RankingError::DuplicateEntry(entry.key().clone()));
        }
        self.entries.insert(entry.key().clone(), entry);
        Ok(())
    }

    /// Adopt every entry of another holder of the same kind.
    pub fn merge_from(&mut self, other: &RankingsHolder) -> Result<(), RankingError> {
        if other.kind != self.kind {
            return Err(RankingError::KindMismatch {
                expected: self.kind,
                found: other.kind,
            });
        }
        for entry in other.entries.values() {
            self.integrate_entry(entry.clone())?;
        }
        Ok(())
    }

    /// Rank teams by combining their members' entries. Teams without a
    /// single present member are left out; team seed is declaration order.
    pub fn team_rankings(&self, team_comp: &[(TeamKey, Vec<PlayerKey>)]) -> Vec<RankingEntry> {
        let mut teams: Vec<RankingEntry> = Vec::new();
        for (index, (team_key, members)) in team_comp.iter().enumerate() {
            let present: Vec<&RankingEntry> = members
                .iter()
                .filter_map(|member| self.entries.get(member))
                .collect();
            if present.is_empty() {
                continue;
            }
            let mut combined = RankingEntry::new(team_key.clone(), index + 1);
            for entry in present {
                combined.absorb(entry);
            }
            teams.push(combined);
        }
        teams.sort_by(|a, b| self.compare_entries(a, b));
        teams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{DuelGame, DuelResult};
    use proptest::prelude::*;

    fn holder_with(keys: &[&str]) -> RankingsHolder {
        let mut holder = RankingsHolder::new(RankingKind::Duel);
        for (index, key) in keys.iter().enumerate() {
            holder.add_entry(key.to_string(), index + 1).unwrap();
        }
        holder.compute_order();
        holder
    }

    fn played_duel(home: &str, away: &str, result: DuelResult) -> Game {
        let mut game = DuelGame::new(home.to_string(), Some(away.to_string()), 1);
        game.set_result(result);
        Game::Duel(game)
    }

    #[test]
    fn test_initial_order_follows_seeds() {
        let holder = holder_with(&["c", "a", "b"]);
        let order: Vec<&str> = holder.rankings().iter().map(|e| e.key().as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_entry_rejected() {
        let mut holder = holder_with(&["a"]);
        assert_eq!(
            holder.add_entry("a".to_string(), 2),
            Err(RankingError::DuplicateEntry("a".to_string()))
        );
    }

    #[test]
    fn test_points_drive_order() {
        let mut holder = holder_with(&["a", "b", "c"]);
        holder.record_game(&played_duel("b", "a", DuelResult::HomeWin)).unwrap();
        holder.record_game(&played_duel("c", "a", DuelResult::Draw)).unwrap();
        holder.compute_order();
        let order: Vec<&str> = holder.rankings().iter().map(|e| e.key().as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert_eq!(holder.rank_of("a"), Some(3));
        assert_eq!(holder.entry_at_rank(1).unwrap().key(), "b");
    }

    #[test]
    fn test_record_wrong_game_kind() {
        let mut holder = RankingsHolder::new(RankingKind::Performances);
        holder.add_entry("a".to_string(), 1).unwrap();
        let err = holder
            .record_game(&played_duel("a", "b", DuelResult::HomeWin))
            .unwrap_err();
        assert_eq!(
            err,
            RankingError::GameKindMismatch {
                kind: RankingKind::Performances,
                game: "duel"
            }
        );
    }

    #[test]
    fn test_merge_rejects_kind_mismatch() {
        let duel = holder_with(&["a"]);
        let mut mixed = RankingsHolder::new(RankingKind::Performances);
        assert_eq!(
            mixed.merge_from(&duel),
            Err(RankingError::KindMismatch {
                expected: RankingKind::Performances,
                found: RankingKind::Duel,
            })
        );
    }

    #[test]
    fn test_merge_rejects_duplicate_keys() {
        let group_a = holder_with(&["a", "b"]);
        let mut mixed = group_a.duplicate_empty();
        mixed.merge_from(&group_a).unwrap();
        assert_eq!(
            mixed.merge_from(&group_a),
            Err(RankingError::DuplicateEntry("a".to_string()))
        );
    }

    #[test]
    fn test_team_rankings_skip_absent_teams() {
        let mut holder = holder_with(&["a", "b", "c", "d"]);
        holder.record_game(&played_duel("a", "c", DuelResult::HomeWin)).unwrap();
        holder.record_game(&played_duel("b", "d", DuelResult::HomeWin)).unwrap();
        holder.compute_order();
        let comp = vec![
            ("reds".to_string(), vec!["a".to_string(), "b".to_string()]),
            ("blues".to_string(), vec!["c".to_string(), "d".to_string()]),
            ("ghosts".to_string(), vec!["z".to_string()]),
        ];
        let teams = holder.team_rankings(&comp);
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].key(), "reds");
        assert_eq!(teams[0].points(), 6);
        assert_eq!(teams[1].key(), "blues");
    }

    #[test]
    fn test_expense_order_prefers_thrift() {
        let mut holder = holder_with(&["a", "b"]);
        let mut game = DuelGame::new("a".to_string(), Some("b".to_string()), 1);
        game.set_result(DuelResult::HomeWin);
        game.outcome_mut().set_expense("a", "fuel", 10);
        game.outcome_mut().set_expense("b", "fuel", 4);
        holder.record_game(&Game::Duel(game)).unwrap();
        holder.compute_order();
        let by_expenses: Vec<&str> = holder
            .rankings_by_expenses()
            .iter()
            .map(|e| e.key().as_str())
            .collect();
        assert_eq!(by_expenses, ["b", "a"]);
    }

    proptest! {
        /// The cascade is a strict total order whenever seeds are distinct:
        /// antisymmetric, transitive by construction of lexicographic
        /// comparison, and never `Equal` for two different entries.
        #[test]
        fn test_comparator_is_strict_total_order(
            stats in prop::collection::vec((0i64..20, 0usize..6, 0usize..6, 0usize..6), 2..8)
        ) {
            let mut holder = RankingsHolder::new(RankingKind::Duel);
            for (index, _) in stats.iter().enumerate() {
                holder.add_entry(format!("p{index}"), index + 1).unwrap();
            }
            let entries: Vec<RankingEntry> = stats
                .iter()
                .enumerate()
                .map(|(index, (points, won, drawn, played))| {
                    let mut entry = RankingEntry::new(format!("p{index}"), index + 1);
                    for _ in 0..*won {
                        let mut game = DuelGame::new(format!("p{index}"), Some("x".to_string()), 1);
                        game.set_result(DuelResult::HomeWin);
                        entry.record_duel(&game, holder.points_table());
                    }
                    for _ in 0..*drawn {
                        let mut game = DuelGame::new(format!("p{index}"), Some("x".to_string()), 1);
                        game.set_result(DuelResult::Draw);
                        entry.record_duel(&game, holder.points_table());
                    }
                    for _ in *won + *drawn..*played {
                        let mut game = DuelGame::new(format!("p{index}"), Some("x".to_string()), 1);
                        game.set_result(DuelResult::AwayWin);
                        entry.record_duel(&game, holder.points_table());
                    }
                    let mut bonus = DuelGame::new(format!("p{index}"), Some("x".to_string()), 1);
                    bonus.outcome_mut().set_bonus(&format!("p{index}"), *points);
                    bonus.set_result(DuelResult::Draw);
                    entry.record_duel(&bonus, holder.points_table());
                    entry
                })
                .collect();

            for a in &entries {
                for b in &entries {
                    let forward = holder.compare_entries(a, b);
                    let backward = holder.compare_entries(b, a);
                    if a.key() == b.key() {
                        prop_assert_eq!(forward, Ordering::Equal);
                    } else {
                        prop_assert_ne!(forward, Ordering::Equal);
                        prop_assert_eq!(forward, backward.reverse());
                    }
                }
            }
        }
    }
}
