//! # Matchplay
//!
//! A tournament scheduling and ranking library.
//!
//! Matchplay schedules multi-round competitions over a roster of players,
//! tracks game outcomes, computes rankings with deterministic tie-break
//! cascades, and orchestrates multi-phase tournament trees where cohorts
//! of players flow between phases under declarative selection rules.
//!
//! The format set is closed and enumerable (round-robin, Swiss, bracket
//! elimination, elimination contest), so competitions dispatch their
//! scheduling capability through `enum_dispatch` rather than inheritance.
//!
//! ## Architecture
//!
//! - [`game`]: game records placed into calendars (duels and multi-player
//!   scored games)
//! - [`ranking`]: per-player cumulative entries, points tables, tie-break
//!   cascades, mixed and team rankings
//! - [`competition`]: the four formats, calendar generation and the shared
//!   query surface
//! - [`tree`]: declarative multi-phase blueprints and their runtime
//!   iterations
//! - [`rating`]: optional Elo tracking through a caller-supplied adapter
//!
//! Everything is synchronous and single-threaded: no I/O, no suspension
//! points, every algorithm bounded by a precomputable game count. Callers
//! own concurrency; an instance expects a single owner. Stochastic steps
//! (calendar shuffles, roster dispatch) draw from injectable random
//! sources so results reproduce under test.
//!
//! ## Example
//!
//! ```
//! use matchplay::Competition;
//! use matchplay::game::DuelResult;
//!
//! let players = vec!["ada".to_string(), "ben".to_string(), "cleo".to_string(), "dov".to_string()];
//! let mut championship = Competition::swiss(players, 2).unwrap();
//! while let Some(number) = championship.next_game().map(|game| game.number()) {
//!     championship.record_duel_result(number, DuelResult::HomeWin);
//!     championship.update_games_played().unwrap();
//! }
//! assert!(championship.is_completed());
//! ```

/// Opaque caller-supplied player identifier. Never owned beyond the key
/// itself: player payloads stay with the caller.
pub type PlayerKey = String;

/// Opaque caller-supplied team identifier.
pub type TeamKey = String;

/// Competition formats, calendar generation and the query surface.
pub mod competition;
pub use competition::{Competition, Format, FormatOptions, GroupLayout, Retention};

/// Error types shared across the crate.
pub mod errors;
pub use errors::{CompetitionError, CompetitionResult};

/// Game records: duels and multi-player scored games.
pub mod game;

/// Ranking entries, holders and tie-break cascades.
pub mod ranking;

/// Optional rating tracking through a caller-supplied adapter.
pub mod rating;
pub use rating::{RatingAdapter, SharedRatingAdapter};

/// Multi-phase tournament trees: blueprints and runtime iterations.
pub mod tree;
pub use tree::{PhaseLayout, PlayerSelector, Tree, TreeLayout};
