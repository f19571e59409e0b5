//! Competition error types.

use thiserror::Error;

use crate::ranking::RankingError;

/// Errors raised by competition construction and scheduling.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompetitionError {
    /// Not enough players for the requested operation
    #[error("need at least {required} players {context}")]
    PlayerCount {
        context: &'static str,
        required: usize,
    },

    /// An option value is out of its accepted range
    #[error("invalid {parameter}: {reason}")]
    Parameter {
        parameter: &'static str,
        reason: String,
    },

    /// Illegal structural operation on an otherwise valid competition
    #[error("{0}")]
    Structure(String),

    /// Ranking failure surfaced through a competition operation
    #[error("ranking error: {0}")]
    Ranking(#[from] RankingError),
}

impl CompetitionError {
    pub(crate) fn player_count(context: &'static str, required: usize) -> Self {
        Self::PlayerCount { context, required }
    }

    pub(crate) fn parameter(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::Parameter {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Result type for competition operations
pub type CompetitionResult<T> = Result<T, CompetitionError>;
