//! Blueprint types: tree, phase, selector.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::phase::Phase;
use super::runtime::Tree;
use crate::competition::GroupLayout;
use crate::errors::{CompetitionError, CompetitionResult};
use crate::rating::SharedRatingAdapter;
use crate::{PlayerKey, TeamKey};

/// How a phase roster is split across its groups.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMethod {
    /// Deal players to groups in roster order, one each in turn.
    #[default]
    Deal,
    /// Shuffle the roster first, then deal.
    Random,
}

/// Which pool of a source phase a selector draws from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerPack {
    /// Never-used players plus the phase's qualified players.
    #[default]
    UnusedAndQualified,
    /// Players in the qualification spots.
    Qualified,
    /// Players neither qualified nor eliminated.
    Stagnation,
    /// Players that have not been fielded in any phase yet.
    Unused,
}

/// Read order of a pool when composing a phase roster.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupMethod {
    /// All players of the first group, then the second, ...
    #[default]
    ByGroup,
    /// All rank-1 finishers across groups, then all rank-2, ...; group
    /// declaration order inside a tier.
    ByRankInGroup,
    /// Same tiers, each tier's group order shuffled.
    ByRankShuffled,
    /// Ignore groups: the phase's mixed cross-group order.
    ByRankInPhase,
}

/// Declares where the players of a phase come from. Without an explicit
/// source phase the last completed phase applies; with no completed phase
/// at all, the tree's pool of never-used players.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerSelector {
    pub phase_name: Option<String>,
    pub pack: PlayerPack,
    pub pickup: PickupMethod,
    /// 1-based rank to start picking at.
    pub start_at_rank: usize,
    /// 0 picks everything from the start rank on.
    pub length: usize,
}

impl Default for PlayerSelector {
    fn default() -> Self {
        Self {
            phase_name: None,
            pack: PlayerPack::default(),
            pickup: PickupMethod::default(),
            start_at_rank: 1,
            length: 0,
        }
    }
}

impl PlayerSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_phase(mut self, name: impl Into<String>) -> Self {
        self.phase_name = Some(name.into());
        self
    }

    pub fn from_pack(mut self, pack: PlayerPack) -> Self {
        self.pack = pack;
        self
    }

    pub fn with_pickup(mut self, pickup: PickupMethod) -> Self {
        self.pickup = pickup;
        self
    }

    pub fn starting_at_rank(mut self, rank: usize) -> Self {
        self.start_at_rank = rank.max(1);
        self
    }

    pub fn taking(mut self, length: usize) -> Self {
        self.length = length;
        self
    }
}

/// Blueprint of one phase: named groups, dispatch method and selectors.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PhaseLayout {
    name: String,
    dispatch: DispatchMethod,
    groups: Vec<GroupLayout>,
    selectors: Vec<PlayerSelector>,
}

impl PhaseLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dispatch: DispatchMethod::default(),
            groups: Vec::new(),
            selectors: Vec::new(),
        }
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMethod) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn with_group(mut self, group: GroupLayout) -> Self {
        self.groups.push(group);
        self
    }

    /// Add a selector; without any, the phase draws unused and qualified
    /// players from the last completed phase.
    pub fn with_selector(mut self, selector: PlayerSelector) -> Self {
        self.selectors.push(selector);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatch(&self) -> DispatchMethod {
        self.dispatch
    }

    pub fn groups(&self) -> &[GroupLayout] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&GroupLayout> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn selectors(&self) -> &[PlayerSelector] {
        &self.selectors
    }

    /// Smallest roster this phase accepts: the sum of its groups'
    /// minimums.
    pub fn min_player_count(&self) -> usize {
        self.groups
            .iter()
            .map(GroupLayout::min_player_count)
            .sum()
    }

    pub fn qualification_spots(&self) -> usize {
        self.groups
            .iter()
            .map(|group| group.qualification_spots)
            .sum()
    }

    pub fn elimination_spots(&self) -> usize {
        self.groups
            .iter()
            .map(|group| group.elimination_spots)
            .sum()
    }

    /// Dispatch a roster and build every group. The minimum-player check
    /// runs before any competition is constructed.
    pub(crate) fn start_phase(
        &self,
        players: Vec<PlayerKey>,
        rng: &mut StdRng,
        rating_adapter: Option<SharedRatingAdapter>,
        team_comp: &[(TeamKey, Vec<PlayerKey>)],
    ) -> CompetitionResult<Phase> {
        if self.groups.is_empty() {
            return Err(CompetitionError::parameter(
                "phase",
                format!("phase {} declares no groups", self.name),
            ));
        }
        let required = self.min_player_count();
        if players.len() < required {
            return Err(CompetitionError::player_count("to start a phase", required));
        }

        let mut pool = players;
        if self.dispatch == DispatchMethod::Random {
            pool.shuffle(rng);
        }
        let mut buckets: Vec<Vec<PlayerKey>> = vec![Vec::new(); self.groups.len()];
        for (index, key) in pool.into_iter().enumerate() {
            buckets[index % self.groups.len()].push(key);
        }

        let mut groups = Vec::with_capacity(self.groups.len());
        for (layout, bucket) in self.groups.iter().zip(buckets) {
            let competition = layout.build(bucket, rng, rating_adapter.clone(), team_comp)?;
            groups.push((layout.name.clone(), competition));
        }
        Ok(Phase::new(self.name.clone(), groups))
    }
}

/// Blueprint of a whole tree: ordered named phases. Immutable once built,
/// reusable across any number of iterations.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TreeLayout {
    name: String,
    phases: Vec<PhaseLayout>,
    expected_players_count: usize,
}

impl TreeLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phases: Vec::new(),
            expected_players_count: 0,
        }
    }

    pub fn with_phase(mut self, phase: PhaseLayout) -> Self {
        self.phases.push(phase);
        self
    }

    /// Advisory roster size hint, not enforced.
    pub fn with_expected_players_count(mut self, count: usize) -> Self {
        self.expected_players_count = count;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phases(&self) -> &[PhaseLayout] {
        &self.phases
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseLayout> {
        self.phases.iter().find(|phase| phase.name() == name)
    }

    /// Phase declared right after the named one.
    pub fn phase_after(&self, name: &str) -> Option<&PhaseLayout> {
        let index = self.phases.iter().position(|phase| phase.name() == name)?;
        self.phases.get(index + 1)
    }

    pub fn expected_players_count(&self) -> usize {
        self.expected_players_count
    }

    /// Smallest roster the tree accepts: the largest phase minimum, since
    /// every player flows through the tree one phase at a time.
    pub fn min_player_count(&self) -> usize {
        self.phases
            .iter()
            .map(PhaseLayout::min_player_count)
            .max()
            .unwrap_or(0)
    }

    /// Start an independent iteration against a concrete roster.
    pub fn start_iteration(
        &self,
        players: Vec<PlayerKey>,
        iteration_name: impl Into<String>,
    ) -> CompetitionResult<Tree> {
        self.start_iteration_with(
            players,
            iteration_name,
            StdRng::from_os_rng(),
            None,
            Vec::new(),
        )
    }

    /// Start an iteration with an injected random source, an optional
    /// rating adapter shared by every group, and a team composition.
    pub fn start_iteration_with(
        &self,
        players: Vec<PlayerKey>,
        iteration_name: impl Into<String>,
        rng: StdRng,
        rating_adapter: Option<SharedRatingAdapter>,
        team_comp: Vec<(TeamKey, Vec<PlayerKey>)>,
    ) -> CompetitionResult<Tree> {
        if self.phases.is_empty() {
            return Err(CompetitionError::parameter(
                "tree",
                format!("tree {} declares no phases", self.name),
            ));
        }
        let required = self.min_player_count();
        if players.len() < required {
            return Err(CompetitionError::player_count("to start a tree", required));
        }
        Tree::start(
            self.clone(),
            players,
            iteration_name.into(),
            rng,
            rating_adapter,
            team_comp,
        )
    }
}
