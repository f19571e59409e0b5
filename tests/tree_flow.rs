//! End-to-end flow: a two-phase tree with swiss qualifiers feeding a
//! knockout bracket, rating tracking and team digests along the way.

use std::collections::BTreeMap;

use matchplay::competition::{FormatOptions, GroupLayout};
use matchplay::game::DuelResult;
use matchplay::rating::MapRatingAdapter;
use matchplay::tree::{PhaseLayout, PickupMethod, PlayerPack, PlayerSelector, Tree, TreeLayout};
use matchplay::PlayerKey;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn players(count: usize) -> Vec<PlayerKey> {
    (1..=count).map(|index| format!("p{index}")).collect()
}

fn cup_layout() -> TreeLayout {
    TreeLayout::new("winter cup")
        .with_phase(
            PhaseLayout::new("qualifiers").with_group(
                GroupLayout::new("swiss", FormatOptions::Swiss { rounds: 3 })
                    .with_qualification_spots(4),
            ),
        )
        .with_phase(
            PhaseLayout::new("knockout")
                .with_group(GroupLayout::new(
                    "bracket",
                    FormatOptions::Bracket {
                        best_seed_home: false,
                    },
                ))
                .with_selector(
                    PlayerSelector::new()
                        .from_pack(PlayerPack::Qualified)
                        .with_pickup(PickupMethod::ByRankInGroup),
                ),
        )
}

/// Drive every phase to completion, home side always winning.
fn play_out(tree: &mut Tree) {
    loop {
        let Some(phase) = tree.current_phase().unwrap() else {
            break;
        };
        phase.update_games_played().unwrap();
        let Some((group, number)) = phase
            .next_game()
            .map(|(group, game)| (group.to_string(), game.number()))
        else {
            continue;
        };
        phase
            .group_mut(&group)
            .unwrap()
            .record_duel_result(number, DuelResult::HomeWin);
    }
}

#[test]
fn test_full_tree_runs_to_completion() {
    let layout = cup_layout();
    let mut tree = layout
        .start_iteration(players(8), "season one")
        .unwrap();
    assert_eq!(tree.name(), "winter cup season one");
    assert_eq!(tree.phases().len(), 1);

    play_out(&mut tree);
    assert!(tree.is_completed().unwrap());
    assert_eq!(tree.phases().len(), 2);

    // the bracket fielded exactly the swiss qualification spots, in
    // swiss ranking order
    let qualifiers = tree.phase("qualifiers").unwrap();
    let qualified = qualifiers.group("swiss").unwrap().player_keys_for_qualification();
    let knockout = tree.phase("knockout").unwrap();
    let fielded = knockout.group("bracket").unwrap().players().to_vec();
    assert_eq!(fielded, qualified);
    assert_eq!(fielded.len(), 4);

    // swiss: 3 rounds of 4 games each; bracket: 4 + 2 + 1... the bracket
    // over 4 players holds 3 games over 2 rounds
    assert_eq!(qualifiers.game_count(), 12);
    assert_eq!(knockout.game_count(), 3);
    assert_eq!(knockout.games_to_play_count(), 0);
}

#[test]
fn test_tree_digest_and_idempotent_queries() {
    let layout = cup_layout();
    let mut tree = layout
        .start_iteration_with(
            players(8),
            "season two",
            StdRng::seed_from_u64(42),
            None,
            vec![
                ("alpha".to_string(), vec!["p1".to_string(), "p2".to_string()]),
                ("beta".to_string(), vec!["p3".to_string(), "p4".to_string()]),
            ],
        )
        .unwrap();
    play_out(&mut tree);

    let ranked = tree.ranked_player_keys(true, false);
    assert_eq!(ranked.len(), 8);
    // the four knockout players lead the digest, everyone else fell out
    // in the qualifiers
    assert!(ranked[..4]
        .iter()
        .all(|(_, phase)| phase.as_deref() == Some("knockout")));
    assert!(ranked[4..]
        .iter()
        .all(|(_, phase)| phase.as_deref() == Some("qualifiers")));

    let teams = tree.ranked_team_keys(true);
    assert_eq!(teams.len(), 2);

    // repeated digest queries are pure
    assert_eq!(tree.ranked_player_keys(true, false), ranked);

    // repeated sweeps on a finished tree change nothing
    let knockout_before: Vec<String> = tree
        .phase("knockout")
        .unwrap()
        .mixed_rankings(false)
        .unwrap()
        .iter()
        .map(|entry| entry.key().clone())
        .collect();
    tree.phase_mut("knockout")
        .unwrap()
        .update_games_played()
        .unwrap();
    let knockout_after: Vec<String> = tree
        .phase("knockout")
        .unwrap()
        .mixed_rankings(false)
        .unwrap()
        .iter()
        .map(|entry| entry.key().clone())
        .collect();
    assert_eq!(knockout_before, knockout_after);
}

#[test]
fn test_ratings_move_through_the_adapter() {
    let ratings: BTreeMap<PlayerKey, i32> = players(8)
        .into_iter()
        .map(|key| (key, 1500))
        .collect();
    let adapter = MapRatingAdapter::new(ratings).into_shared();

    let layout = cup_layout();
    let mut tree = layout
        .start_iteration_with(
            players(8),
            "rated",
            StdRng::seed_from_u64(7),
            Some(adapter.clone()),
            Vec::new(),
        )
        .unwrap();
    assert!(tree.is_using_ratings());
    play_out(&mut tree);

    let snapshot = adapter.borrow();
    let final_ratings: Vec<i32> = players(8)
        .iter()
        .map(|key| snapshot.rating(key).unwrap())
        .collect();
    // games moved ratings off the shared starting point, zero-sum
    assert!(final_ratings.iter().any(|rating| *rating != 1500));
    let total: i64 = final_ratings.iter().map(|rating| i64::from(*rating)).sum();
    assert_eq!(total, 1500 * 8);
}
