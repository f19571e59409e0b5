//! Ranking error types.

use thiserror::Error;

use super::RankingKind;
use crate::PlayerKey;

/// Ranking errors
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RankingError {
    /// An entry is already registered for this key
    #[error("entry already registered for {0}")]
    DuplicateEntry(PlayerKey),

    /// Holders of different kinds cannot be merged
    #[error("cannot mix {found} rankings into {expected} rankings")]
    KindMismatch {
        expected: RankingKind,
        found: RankingKind,
    },

    /// A game of the wrong shape was recorded into this holder
    #[error("cannot record a {game} game into {kind} rankings")]
    GameKindMismatch {
        kind: RankingKind,
        game: &'static str,
    },
}
