//! Engine lifecycle tests through the public API.

use blockfall::core::{EngineConfig, GameState, FAIR_OPENERS};
use blockfall::types::{EngineStatus, GameAction, GameEvent};

fn play_until_over(state: &mut GameState) {
    while !state.is_over() {
        state.hard_drop();
    }
}

#[test]
fn test_game_lifecycle() {
    let mut state = GameState::with_seed(12345);
    assert_eq!(state.status(), EngineStatus::Idle);
    assert!(state.active().is_none());

    assert!(state.start());
    assert!(state.is_running());
    assert!(state.active().is_some());
    assert!(state.next().is_some());
    assert_eq!((state.score(), state.level(), state.lines()), (0, 1, 0));
    assert_eq!(state.take_events(), vec![GameEvent::Started]);

    // Already running.
    assert!(!state.start());
}

#[test]
fn test_same_seed_same_pieces() {
    let mut a = GameState::with_seed(99);
    let mut b = GameState::with_seed(99);
    a.start();
    b.start();
    for _ in 0..10 {
        assert_eq!(a.active().map(|p| p.kind), b.active().map(|p| p.kind));
        assert_eq!(a.next(), b.next());
        a.hard_drop();
        b.hard_drop();
    }
}

#[test]
fn test_battle_engine_opens_fair() {
    for seed in 0..20 {
        let mut state = GameState::new(EngineConfig::battle(Some(seed)));
        state.start();
        let kind = state.active().unwrap().kind;
        assert!(FAIR_OPENERS.contains(&kind), "seed {seed} opened with {kind:?}");
    }
}

#[test]
fn test_gravity_follows_drop_interval() {
    let mut state = GameState::with_seed(7);
    state.start();
    let y0 = state.active().unwrap().y;

    assert_eq!(state.tick(799), 0);
    assert_eq!(state.tick(1), 1);
    assert_eq!(state.active().unwrap().y, y0 + 1);
}

#[test]
fn test_pause_freezes_everything() {
    let mut state = GameState::with_seed(7);
    state.start();
    let before = state.active();

    assert!(state.apply_action(GameAction::Pause));
    assert!(state.is_paused());
    assert_eq!(state.tick(5_000), 0);
    assert!(!state.apply_action(GameAction::MoveLeft));
    assert!(!state.apply_action(GameAction::Rotate));
    assert!(!state.apply_action(GameAction::HardDrop));
    assert_eq!(state.active(), before);

    assert!(state.apply_action(GameAction::Pause));
    assert!(state.is_running());
}

#[test]
fn test_game_over_and_restart() {
    let mut state = GameState::with_seed(4);
    state.start();
    play_until_over(&mut state);

    let stats = state.final_stats().unwrap();
    assert_eq!(stats, state.stats());
    let events = state.take_events();
    let overs = events
        .iter()
        .filter(|e| matches!(e, GameEvent::GameOver(_)))
        .count();
    assert_eq!(overs, 1);

    // Everything but start is rejected once over.
    assert!(!state.move_left());
    assert!(state.hard_drop().is_none());
    assert_eq!(state.tick(10_000), 0);
    assert_eq!(state.inject_penalty(3), 0);

    assert!(state.apply_action(GameAction::Start));
    assert!(state.is_running());
    assert_eq!(state.board().filled_count(), 0);
    assert_eq!(state.final_stats(), None);
}

#[test]
fn test_ghost_lands_where_hard_drop_does() {
    let mut state = GameState::with_seed(21);
    state.start();
    state.inject_penalty(4);
    let ghost = state.ghost().unwrap();
    let kind = state.active().unwrap().kind;
    let travelled = state.hard_drop().unwrap();

    assert_eq!(ghost.kind, kind);
    assert_eq!(ghost.y, travelled as i8);
    if state.lines() > 0 {
        // The drop plugged a penalty hole and the rows shifted.
        return;
    }
    for (x, y) in ghost.cells() {
        assert!(state.board().get(x, y).unwrap().is_filled());
    }
}

#[test]
fn test_penalty_leaves_score_alone() {
    let mut state = GameState::with_seed(21);
    state.start();
    assert_eq!(state.inject_penalty(2), 2);
    assert_eq!(state.board().filled_count(), 18);
    assert_eq!(state.score(), 0);
    assert!(state
        .take_events()
        .contains(&GameEvent::PenaltyReceived { count: 2 }));
}

#[test]
fn test_snapshot_wire_format() {
    let mut state = GameState::with_seed(5);
    state.start();
    state.inject_penalty(1);
    let snapshot = state.snapshot();

    let json: serde_json::Value = serde_json::to_value(snapshot).unwrap();
    let obj = json.as_object().unwrap();
    let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["board", "gameOver", "level", "lines", "score"]);
    assert_eq!(json["board"].as_array().unwrap().len(), 20);
    assert_eq!(json["board"][0].as_array().unwrap().len(), 10);
    assert!(json["board"][0][0].is_null());
    assert!(json["board"][19]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c == "#ff6b35"));

    // Independent of the live engine.
    state.inject_penalty(3);
    assert_eq!(snapshot.filled_count(), 9);
}
