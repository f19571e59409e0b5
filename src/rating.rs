//! Rating capability and Elo update math.
//!
//! Competitions never own ratings. A caller that wants rating tracking
//! supplies a [`RatingAdapter`] mapping player keys to stored ratings;
//! without one, rating tracking is disabled entirely. The adapter is an
//! explicit getter/setter pair, one implementation per storage shape;
//! there is no runtime probing of player objects.

use std::cell::RefCell;
use std::rc::Rc;

use crate::PlayerKey;
use crate::game::{DuelResult, Game};

/// Elo-style rating value.
pub type Elo = i32;

/// Starting rating for players an adapter has not seen yet.
pub const DEFAULT_ELO: Elo = 1500;

/// K-factor for duel updates.
pub const K_FACTOR: f64 = 32.0;

/// Caller-supplied access to player ratings.
pub trait RatingAdapter {
    /// Current rating for a key, `None` when the player has no rating.
    fn rating(&self, key: &str) -> Option<Elo>;

    /// Store a new rating; returns false when the adapter refuses the key.
    fn set_rating(&mut self, key: &str, rating: Elo) -> bool;
}

/// Shared single-owner handle to an adapter. The crate is single-threaded
/// per instance, so a plain `Rc<RefCell<..>>` carries the shared mutability
/// across the groups of one tree.
pub type SharedRatingAdapter = Rc<RefCell<dyn RatingAdapter>>;

/// Ready-made adapter over an in-memory map of ratings.
#[derive(Clone, Debug, Default)]
pub struct MapRatingAdapter {
    ratings: std::collections::BTreeMap<PlayerKey, Elo>,
}

impl MapRatingAdapter {
    pub fn new(ratings: std::collections::BTreeMap<PlayerKey, Elo>) -> Self {
        Self { ratings }
    }

    pub fn ratings(&self) -> &std::collections::BTreeMap<PlayerKey, Elo> {
        &self.ratings
    }

    pub fn into_shared(self) -> SharedRatingAdapter {
        Rc::new(RefCell::new(self))
    }
}

impl RatingAdapter for MapRatingAdapter {
    fn rating(&self, key: &str) -> Option<Elo> {
        self.ratings.get(key).copied()
    }

    fn set_rating(&mut self, key: &str, rating: Elo) -> bool {
        match self.ratings.get_mut(key) {
            Some(stored) => {
                *stored = rating;
                true
            }
            None => false,
        }
    }
}

fn expected_score(own: Elo, other: Elo) -> f64 {
    1.0 / (1.0 + 10f64.powf(f64::from(other - own) / 400.0))
}

fn shifted(rating: Elo, score: f64, expected: f64, k: f64) -> Elo {
    rating + (k * (score - expected)).round() as Elo
}

/// Update both sides of a duel; `home_score` is 1.0 / 0.5 / 0.0. Nothing
/// happens unless both players carry a rating.
pub fn update_duel(adapter: &SharedRatingAdapter, home: &str, away: &str, home_score: f64) {
    let mut adapter = adapter.borrow_mut();
    let (Some(home_elo), Some(away_elo)) = (adapter.rating(home), adapter.rating(away)) else {
        return;
    };
    let expected_home = expected_score(home_elo, away_elo);
    adapter.set_rating(home, shifted(home_elo, home_score, expected_home, K_FACTOR));
    adapter.set_rating(
        away,
        shifted(away_elo, 1.0 - home_score, 1.0 - expected_home, K_FACTOR),
    );
}

/// Update a whole field given its finishing order, best first. Each pair of
/// players is treated as a virtual duel at a reduced K so a single round
/// carries about the weight of one game. Skipped entirely when any player
/// lacks a rating.
pub fn update_field(adapter: &SharedRatingAdapter, ordered: &[&PlayerKey]) {
    if ordered.len() < 2 {
        return;
    }
    let mut adapter = adapter.borrow_mut();
    let mut ratings = Vec::with_capacity(ordered.len());
    for key in ordered {
        match adapter.rating(key) {
            Some(elo) => ratings.push(elo),
            None => return,
        }
    }
    let k = K_FACTOR / (ordered.len() - 1) as f64;
    let mut updated = ratings.clone();
    for i in 0..ordered.len() {
        for j in (i + 1)..ordered.len() {
            let expected = expected_score(ratings[i], ratings[j]);
            updated[i] = shifted(updated[i], 1.0, expected, k);
            updated[j] = shifted(updated[j], 0.0, 1.0 - expected, k);
        }
    }
    for (key, rating) in ordered.iter().zip(updated) {
        adapter.set_rating(key, rating);
    }
}

/// Fold one played game into the adapter. Byes never move ratings.
pub(crate) fn update_for_game(adapter: &SharedRatingAdapter, game: &Game) {
    match game {
        Game::Duel(duel) => {
            if !duel.is_played() || duel.is_bye() {
                return;
            }
            let Some(away) = duel.away_key() else { return };
            let home_score = match duel.result() {
                Some(DuelResult::HomeWin) => 1.0,
                Some(DuelResult::Draw) => 0.5,
                Some(DuelResult::AwayWin) => 0.0,
                None => return,
            };
            update_duel(adapter, duel.home_key(), away, home_score);
        }
        Game::Performances(scored) => {
            if !scored.is_played() {
                return;
            }
            let ordered = scored.game_ranks();
            update_field(adapter, &ordered);
        }
    }
}
