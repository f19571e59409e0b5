//! Ranking engine: per-player cumulative stats and tie-break ordering.
//!
//! Every competition owns one [`RankingsHolder`] with one [`RankingEntry`]
//! per player. Entries accumulate results as games complete; the holder
//! recomputes a strict total order after each batch of updates by applying
//! a fixed tie-break cascade that always terminates at the player's seed.
//!
//! Holders of the same kind can be merged ("mixed") to rank players across
//! parallel groups of a phase, and entries can be combined to rank teams.

mod entry;
mod errors;
mod holder;

pub use entry::RankingEntry;
pub use errors::RankingError;
pub use holder::{PointsTable, RankingKind, RankingsHolder};
