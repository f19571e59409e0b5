//! Runtime tree: one iteration of a layout over a concrete roster.

use rand::rngs::StdRng;
use std::collections::BTreeSet;
use std::fmt;

use super::builder::{PhaseLayout, PlayerPack, PlayerSelector, TreeLayout};
use super::phase::{Phase, SpotKind};
use crate::errors::CompetitionResult;
use crate::rating::SharedRatingAdapter;
use crate::{PlayerKey, TeamKey};

/// One running instance of a [`TreeLayout`], bound to a fixed roster.
///
/// Phase 1 starts immediately; each later phase starts lazily the first
/// time [`Tree::current_phase`] reaches it, with its roster computed from
/// the layout's selectors. Consumed keys leave the pool of never-used
/// players, which only ever shrinks.
pub struct Tree {
    layout: TreeLayout,
    iteration_name: String,
    players: Vec<PlayerKey>,
    unused: Vec<PlayerKey>,
    phases: Vec<Phase>,
    last_completed: Option<String>,
    completed: bool,
    team_comp: Vec<(TeamKey, Vec<PlayerKey>)>,
    rating_adapter: Option<SharedRatingAdapter>,
    rng: StdRng,
}

// hand-written: the rating adapter is a caller-supplied trait object
// without a Debug bound
impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("layout", &self.layout.name())
            .field("iteration_name", &self.iteration_name)
            .field("players", &self.players)
            .field("unused", &self.unused)
            .field("phases", &self.phases)
            .field("last_completed", &self.last_completed)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

impl Tree {
    pub(crate) fn start(
        layout: TreeLayout,
        players: Vec<PlayerKey>,
        iteration_name: String,
        rng: StdRng,
        rating_adapter: Option<SharedRatingAdapter>,
        team_comp: Vec<(TeamKey, Vec<PlayerKey>)>,
    ) -> CompetitionResult<Self> {
        let mut tree = Self {
            layout,
            iteration_name,
            unused: players.clone(),
            players,
            phases: Vec::new(),
            last_completed: None,
            completed: false,
            team_comp,
            rating_adapter,
            rng,
        };
        if let Some(first) = tree.layout.phases().first().cloned() {
            tree.start_phase(&first)?;
        }
        Ok(tree)
    }

    /// Layout name, with the iteration name appended when given.
    pub fn name(&self) -> String {
        if self.iteration_name.is_empty() {
            self.layout.name().to_string()
        } else {
            format!("{} {}", self.layout.name(), self.iteration_name)
        }
    }

    pub fn iteration_name(&self) -> &str {
        &self.iteration_name
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn players(&self) -> &[PlayerKey] {
        &self.players
    }

    /// Players not fielded in any phase yet.
    pub fn unused_players(&self) -> &[PlayerKey] {
        &self.unused
    }

    pub fn team_composition(&self) -> &[(TeamKey, Vec<PlayerKey>)] {
        &self.team_comp
    }

    pub fn is_using_ratings(&self) -> bool {
        self.rating_adapter.is_some()
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.name() == name)
    }

    pub fn phase_mut(&mut self, name: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|phase| phase.name() == name)
    }

    /// Most recently started phase.
    pub fn last_phase(&self) -> Option<&Phase> {
        self.phases.last()
    }

    /// The phase currently being played. Walks started phases in order,
    /// starts the next declared phase when all of them are complete, and
    /// returns `None` once the whole tree is done. Starting a phase can
    /// fail on its minimum-player check.
    pub fn current_phase(&mut self) -> CompetitionResult<Option<&mut Phase>> {
        if self.completed {
            return Ok(None);
        }
        let mut candidate = None;
        for index in 0..self.phases.len() {
            if !self.phases[index].is_completed() {
                candidate = Some(index);
                break;
            }
            self.last_completed = Some(self.phases[index].name().to_string());
        }
        if let Some(index) = candidate {
            return Ok(self.phases.get_mut(index));
        }
        let next_layout = self
            .last_completed
            .as_ref()
            .and_then(|name| self.layout.phase_after(name))
            .cloned();
        let Some(next_layout) = next_layout else {
            self.completed = true;
            return Ok(None);
        };
        self.start_phase(&next_layout)?;
        Ok(self.phases.last_mut())
    }

    pub fn is_completed(&mut self) -> CompetitionResult<bool> {
        if self.completed {
            return Ok(true);
        }
        Ok(self.current_phase()?.is_none())
    }

    fn start_phase(&mut self, layout: &PhaseLayout) -> CompetitionResult<()> {
        let keys = self.compute_players_for_phase(layout);
        let phase = layout.start_phase(
            keys.clone(),
            &mut self.rng,
            self.rating_adapter.clone(),
            &self.team_comp,
        )?;
        // consumed keys leave the never-used pool
        self.unused.retain(|key| !keys.contains(key));
        self.phases.push(phase);
        Ok(())
    }

    fn phase_index(&self, name: &str) -> Option<usize> {
        self.phases.iter().position(|phase| phase.name() == name)
    }

    /// Resolve every selector of a phase layout into one de-duplicated key
    /// list, first occurrence winning.
    fn compute_players_for_phase(&mut self, layout: &PhaseLayout) -> Vec<PlayerKey> {
        let default_selectors = [PlayerSelector::default()];
        let selectors: &[PlayerSelector] = if layout.selectors().is_empty() {
            &default_selectors
        } else {
            layout.selectors()
        };

        let mut keys: Vec<PlayerKey> = Vec::new();
        for selector in selectors {
            // explicit phase name first, then the last completed phase;
            // with neither, the pool of never-used players
            let source = selector
                .phase_name
                .as_ref()
                .and_then(|name| self.phase_index(name))
                .or_else(|| {
                    self.last_completed
                        .as_ref()
                        .and_then(|name| self.phase_index(name))
                });

            let pack_keys: Vec<PlayerKey> = match source {
                None => self.unused.clone(),
                Some(index) => match selector.pack {
                    PlayerPack::Qualified => self.phases[index].spot_keys(
                        SpotKind::Qualification,
                        selector.pickup,
                        Some(&mut self.rng),
                    ),
                    PlayerPack::Stagnation => self.phases[index].spot_keys(
                        SpotKind::Stagnation,
                        selector.pickup,
                        Some(&mut self.rng),
                    ),
                    PlayerPack::Unused => self.unused.clone(),
                    PlayerPack::UnusedAndQualified => {
                        let mut pool = self.unused.clone();
                        pool.extend(self.phases[index].spot_keys(
                            SpotKind::Qualification,
                            selector.pickup,
                            Some(&mut self.rng),
                        ));
                        pool
                    }
                },
            };

            // slice the window when a start rank or length is set; a start
            // past the pool selects nothing
            let selected: Vec<PlayerKey> = if selector.start_at_rank != 1 || selector.length != 0 {
                let skipped = pack_keys
                    .into_iter()
                    .skip(selector.start_at_rank.saturating_sub(1));
                if selector.length > 0 {
                    skipped.take(selector.length).collect()
                } else {
                    skipped.collect()
                }
            } else {
                pack_keys
            };
            keys.extend(selected);
        }

        let mut seen: BTreeSet<PlayerKey> = BTreeSet::new();
        keys.retain(|key| seen.insert(key.clone()));
        keys
    }

    /// Every player with the last phase it reached, best placed first:
    /// phases are read from the latest backwards, each contributing its
    /// (mixed or group-major) ranking order. Players never fielded come
    /// first with no phase. A failing mixed ranking degrades that phase to
    /// no contribution instead of aborting.
    pub fn ranked_player_keys(
        &self,
        mix_groups: bool,
        by_expenses: bool,
    ) -> Vec<(PlayerKey, Option<String>)> {
        self.ranked_entity_keys(false, mix_groups, by_expenses)
    }

    /// Every team with the last phase it reached, best placed first.
    pub fn ranked_team_keys(&self, mix_groups: bool) -> Vec<(TeamKey, Option<String>)> {
        self.ranked_entity_keys(true, mix_groups, false)
    }

    fn ranked_entity_keys(
        &self,
        for_teams: bool,
        mix_groups: bool,
        by_expenses: bool,
    ) -> Vec<(String, Option<String>)> {
        let mut remaining: Vec<String> = if for_teams {
            self.team_comp.iter().map(|(key, _)| key.clone()).collect()
        } else {
            self.players.clone()
        };
        let mut ranked: Vec<(String, Option<String>)> = Vec::new();

        for phase in self.phases.iter().rev() {
            if remaining.is_empty() {
                break;
            }
            let phase_order: Vec<String> = if mix_groups {
                let mixed = if for_teams {
                    phase.mixed_team_rankings()
                } else {
                    phase.mixed_rankings(by_expenses)
                };
                match mixed {
                    Ok(entries) => entries.into_iter().map(|entry| entry.key().clone()).collect(),
                    Err(err) => {
                        log::warn!(
                            "mixed rankings unavailable for phase {}: {err}",
                            phase.name()
                        );
                        Vec::new()
                    }
                }
            } else if for_teams {
                phase
                    .team_rankings()
                    .into_iter()
                    .flat_map(|(_, entries)| {
                        entries.into_iter().map(|entry| entry.key().clone())
                    })
                    .collect()
            } else {
                phase
                    .rankings(by_expenses)
                    .into_iter()
                    .flat_map(|(_, entries)| {
                        entries.into_iter().map(|entry| entry.key().clone())
                    })
                    .collect()
            };

            for key in phase_order {
                if let Some(position) = remaining.iter().position(|held| *held == key) {
                    remaining.remove(position);
                    ranked.push((key, Some(phase.name().to_string())));
                }
            }
        }

        // entities left were never fielded; they sit on top, planned for
        // phases that have not occurred yet
        let mut result: Vec<(String, Option<String>)> =
            remaining.into_iter().map(|key| (key, None)).collect();
        result.extend(ranked);
        result
    }
}
