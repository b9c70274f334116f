//! Voting, the Butler's restriction, dead votes and nomination eligibility.

mod common;

use clocktower_rules::{DecisionKind, GameState, Role, vote_threshold};
use common::{FailingOracle, ScriptedHuman, ScriptedOracle, game, seat, table};

fn butler_table(master: u8) -> GameState {
    let mut state = table(
        &[
            Role::Chef,
            Role::Butler,
            Role::Monk,
            Role::Imp,
            Role::Soldier,
            Role::Empath,
        ],
        1,
    );
    state.player_mut(seat(2)).expect("seat").master = Some(seat(master));
    state.begin_day();
    state
}

#[test]
fn test_thresholds_after_deaths() {
    assert_eq!(vote_threshold(5), 3);
    assert_eq!(vote_threshold(4), 2);
}

#[tokio::test]
async fn test_butler_hand_forced_down_when_master_abstained() {
    // Order after seat 4: 5, 6, 1, 2, 3, 4. The master (6) votes no before the Butler.
    let oracle = ScriptedOracle::new().vote(5, true).vote(6, false).vote(2, true);
    let human = ScriptedHuman::new(&["y"]);
    let mut game = game(butler_table(6), oracle, human.clone());

    let passed = game
        .run_voting_phase(seat(3), seat(4))
        .await
        .expect("vote");

    assert!(!passed);
    assert!(!game.state().player(seat(2)).expect("seat").has_voted_this_round);
    assert!(game.state().player(seat(5)).expect("seat").has_voted_this_round);
    assert!(human.saw("Seat 2's master did not vote"));
    assert!(
        game.state()
            .public_history()
            .iter()
            .any(|line| line.contains("2 of 3 needed"))
    );
}

#[tokio::test]
async fn test_butler_free_when_master_votes_later() {
    let oracle = ScriptedOracle::new().vote(5, true).vote(2, true);
    let mut game = game(butler_table(3), oracle, ScriptedHuman::new(&["y"]));

    let passed = game
        .run_voting_phase(seat(3), seat(4))
        .await
        .expect("vote");

    assert!(passed);
    assert!(game.state().player(seat(2)).expect("seat").has_voted_this_round);
}

#[tokio::test]
async fn test_butler_follows_master_who_voted() {
    let oracle = ScriptedOracle::new().vote(6, true).vote(2, true);
    let mut game = game(butler_table(6), oracle, ScriptedHuman::new(&["n"]));

    let passed = game
        .run_voting_phase(seat(3), seat(4))
        .await
        .expect("vote");

    assert!(!passed);
    assert!(game.state().player(seat(2)).expect("seat").has_voted_this_round);
    assert!(game.state().player(seat(6)).expect("seat").has_voted_this_round);
}

#[tokio::test]
async fn test_poisoned_butler_votes_freely() {
    let mut state = butler_table(6);
    state.player_mut(seat(2)).expect("seat").is_poisoned = true;
    let oracle = ScriptedOracle::new().vote(5, true).vote(2, true);
    let mut game = game(state, oracle, ScriptedHuman::new(&["y"]));

    let passed = game
        .run_voting_phase(seat(3), seat(4))
        .await
        .expect("vote");

    assert!(passed);
}

#[tokio::test]
async fn test_dead_seat_votes_once_per_game() {
    let mut state = table(
        &[
            Role::Chef,
            Role::Empath,
            Role::Monk,
            Role::Imp,
            Role::Soldier,
            Role::Poisoner,
        ],
        1,
    );
    state.player_mut(seat(5)).expect("seat").kill();
    state.begin_day();
    let oracle = ScriptedOracle::new().vote(5, true).vote(5, true);
    let mut game = game(state, oracle.clone(), ScriptedHuman::new(&["n", "n"]));

    let first = game
        .run_voting_phase(seat(4), seat(2))
        .await
        .expect("vote");
    assert!(!first);
    assert!(game.state().player(seat(5)).expect("seat").dead_vote_used);
    assert_eq!(game.state().player(seat(5)).expect("seat").vote_power(), 0);

    game.run_voting_phase(seat(6), seat(3))
        .await
        .expect("vote");

    let asked: Vec<_> = oracle
        .requests_of(DecisionKind::Vote)
        .into_iter()
        .filter(|c| c.seat == seat(5))
        .collect();
    assert_eq!(asked.len(), 1);
}

#[tokio::test]
async fn test_failing_oracle_votes_no() {
    let mut state = table(
        &[
            Role::Chef,
            Role::Empath,
            Role::Monk,
            Role::Imp,
            Role::Soldier,
            Role::Poisoner,
        ],
        1,
    );
    state.begin_day();
    let mut game = game(state, FailingOracle, ScriptedHuman::new(&["y"]));

    let passed = game
        .run_voting_phase(seat(4), seat(2))
        .await
        .expect("vote");

    assert!(!passed);
    let raised: Vec<_> = game
        .state()
        .players()
        .iter()
        .filter(|p| p.has_voted_this_round)
        .map(|p| p.seat)
        .collect();
    assert_eq!(raised, vec![seat(1)]);
}

#[tokio::test]
async fn test_dead_nominee_is_ignored() {
    let mut state = table(
        &[
            Role::Chef,
            Role::Empath,
            Role::Monk,
            Role::Imp,
            Role::Soldier,
            Role::Poisoner,
        ],
        1,
    );
    state.player_mut(seat(3)).expect("seat").kill();
    state.begin_day();
    let oracle = ScriptedOracle::new();
    let mut game = game(state, oracle.clone(), ScriptedHuman::new(&["3", "they are suspicious"]));

    game.run_nomination_phase().await.expect("nominations");

    assert!(game.state().nominated_today().is_empty());
    assert!(!game.state().player(seat(1)).expect("seat").has_nominated);
    assert!(oracle.requests_of(DecisionKind::Vote).is_empty());
}

#[tokio::test]
async fn test_seat_nominated_once_per_day() {
    let mut state = table(
        &[
            Role::Chef,
            Role::Empath,
            Role::Monk,
            Role::Imp,
            Role::Soldier,
            Role::Poisoner,
        ],
        1,
    );
    state.begin_day();
    let oracle = ScriptedOracle::new()
        .targets(2, DecisionKind::Nomination, &[4])
        .targets(3, DecisionKind::Nomination, &[4]);
    let human = ScriptedHuman::new(&["4", "quiet all day", "n"]);
    let mut game = game(state, oracle.clone(), human);

    game.run_nomination_phase().await.expect("nominations");

    assert_eq!(game.state().nominated_today(), &[seat(4)]);
    assert_eq!(oracle.requests_of(DecisionKind::Defense).len(), 1);
    assert!(!game.state().player(seat(2)).expect("seat").has_nominated);
    assert!(game.state().player(seat(4)).expect("seat").is_alive);
}
