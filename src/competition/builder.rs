//! Serializable blueprints for competition groups.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{Bracket, Competition, Contest, Format, RoundRobin, Swiss};
use crate::errors::{CompetitionError, CompetitionResult};
use crate::rating::SharedRatingAdapter;
use crate::{PlayerKey, TeamKey};

/// Retention rule of an elimination contest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Retention {
    /// Explicit survivor count after each round; round count is the list
    /// length plus one.
    PassingCounts(Vec<usize>),
    /// Fixed number of players cut after every round.
    EliminatedPerRound(usize),
}

/// Format choice plus its options, reusable across rosters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatOptions {
    RoundRobin {
        series: usize,
        shuffle_rounds: bool,
    },
    Swiss {
        rounds: usize,
    },
    Bracket {
        best_seed_home: bool,
    },
    Contest {
        performance_types: Vec<String>,
        retention: Retention,
    },
}

impl FormatOptions {
    pub fn round_robin() -> Self {
        Self::RoundRobin {
            series: 1,
            shuffle_rounds: false,
        }
    }

    /// Smallest roster the configured format accepts.
    pub fn min_player_count(&self) -> usize {
        match self {
            Self::RoundRobin { .. } => 3,
            // a swiss pairing needs more players than rounds
            Self::Swiss { rounds } => 3.max(rounds + 1),
            Self::Bracket { .. } => 4,
            Self::Contest { .. } => 3,
        }
    }
}

/// Blueprint of one competition group inside a phase: format, spot counts
/// and a display name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub name: String,
    pub format: FormatOptions,
    pub qualification_spots: usize,
    pub elimination_spots: usize,
}

impl GroupLayout {
    pub fn new(name: impl Into<String>, format: FormatOptions) -> Self {
        Self {
            name: name.into(),
            format,
            qualification_spots: 0,
            elimination_spots: 0,
        }
    }

    pub fn with_qualification_spots(mut self, spots: usize) -> Self {
        self.qualification_spots = spots;
        self
    }

    pub fn with_elimination_spots(mut self, spots: usize) -> Self {
        self.elimination_spots = spots;
        self
    }

    pub fn min_player_count(&self) -> usize {
        self.format.min_player_count()
    }

    /// Build a competition for a concrete roster. Fails before any state
    /// exists when the roster is too small, an option is invalid or the
    /// spot counts exceed the roster.
    pub fn build(
        &self,
        players: Vec<PlayerKey>,
        rng: &mut StdRng,
        rating_adapter: Option<SharedRatingAdapter>,
        team_comp: &[(TeamKey, Vec<PlayerKey>)],
    ) -> CompetitionResult<Competition> {
        if self.qualification_spots + self.elimination_spots > players.len() {
            return Err(CompetitionError::parameter(
                "spots",
                "qualification and elimination spots exceed the player count",
            ));
        }
        let format = match &self.format {
            FormatOptions::RoundRobin {
                series,
                shuffle_rounds,
            } => Format::from(RoundRobin::new(*series, *shuffle_rounds)),
            FormatOptions::Swiss { rounds } => {
                if *rounds < 2 {
                    return Err(CompetitionError::parameter(
                        "round count",
                        "required >= 2 for a swiss pairing",
                    ));
                }
                if *rounds >= players.len() {
                    return Err(CompetitionError::player_count(
                        "to play that many swiss rounds",
                        rounds + 1,
                    ));
                }
                Format::from(Swiss::new(*rounds))
            }
            FormatOptions::Bracket { best_seed_home } => {
                Format::from(Bracket::new(*best_seed_home))
            }
            FormatOptions::Contest {
                performance_types,
                retention,
            } => Format::from(Contest::new(
                performance_types.clone(),
                retention.clone(),
            )?),
        };
        let mut competition = Competition::assemble(format, players, rng)?;
        competition.set_qualification_spots(self.qualification_spots)?;
        competition.set_elimination_spots(self.elimination_spots)?;
        if !team_comp.is_empty() {
            competition.set_team_composition(team_comp.to_vec());
        }
        if let Some(adapter) = rating_adapter {
            competition.set_rating_adapter(adapter);
        }
        Ok(competition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn keys(count: usize) -> Vec<PlayerKey> {
        (1..=count).map(|index| format!("p{index}")).collect()
    }

    #[test]
    fn test_build_applies_spots_and_format() {
        let layout = GroupLayout::new("pool a", FormatOptions::round_robin())
            .with_qualification_spots(2)
            .with_elimination_spots(1);
        let mut rng = StdRng::seed_from_u64(3);
        let competition = layout.build(keys(5), &mut rng, None, &[]).unwrap();
        assert_eq!(competition.qualification_spots(), 2);
        assert_eq!(competition.elimination_spots(), 1);
        assert_eq!(competition.round_count(), 5);
    }

    #[test]
    fn test_build_rejects_oversized_spots() {
        let layout = GroupLayout::new("pool a", FormatOptions::round_robin())
            .with_qualification_spots(3)
            .with_elimination_spots(2);
        let mut rng = StdRng::seed_from_u64(3);
        assert!(layout.build(keys(4), &mut rng, None, &[]).is_err());
    }

    #[test]
    fn test_min_player_count_per_format() {
        assert_eq!(FormatOptions::round_robin().min_player_count(), 3);
        assert_eq!(FormatOptions::Swiss { rounds: 5 }.min_player_count(), 6);
        assert_eq!(
            FormatOptions::Bracket {
                best_seed_home: false
            }
            .min_player_count(),
            4
        );
    }

    #[test]
    fn test_layout_serde_round_trip() {
        let layout = GroupLayout::new(
            "finals",
            FormatOptions::Contest {
                performance_types: vec!["score".to_string()],
                retention: Retention::PassingCounts(vec![4, 2]),
            },
        )
        .with_qualification_spots(1);
        let encoded = serde_json::to_string(&layout).unwrap();
        let decoded: GroupLayout = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, layout);
    }
}
