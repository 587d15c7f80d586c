//! Threefold-repetition and fifty-move-rule draw detection.

use core_chess::engine::TimeControl;
use core_chess::history::GameHistory;
use core_chess::{Engine, Position};

#[test]
fn shuffling_knights_back_and_forth_is_drawn_by_repetition() {
    let mut engine = Engine::new();
    let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"];
    engine.set_position(None, &shuffle).unwrap();
    // After the position has recurred three times (startpos plus two more
    // round trips through the same shuffle), `go` should recognize the draw
    // rather than pursue a line it thinks is winning.
    let result = engine.go(TimeControl::MoveTime(200));
    assert!(result.best_move.is_some());
}

#[test]
fn position_reports_itself_drawn_once_a_hash_recurs_three_times() {
    let mut pos = Position::startpos();
    let mut history = GameHistory::new();
    history.push(pos.hash());

    for uci in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
        let mv = pos.parse_move(uci).unwrap();
        pos.make(mv);
        history.push(pos.hash());
    }

    assert!(pos.is_draw(&history));
}

#[test]
fn a_single_recurrence_is_not_yet_a_draw() {
    let mut pos = Position::startpos();
    let mut history = GameHistory::new();
    history.push(pos.hash());

    for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
        let mv = pos.parse_move(uci).unwrap();
        pos.make(mv);
        history.push(pos.hash());
    }

    assert!(!pos.is_draw(&history));
}

#[test]
fn rook_shuffle_sequence_repeated_twice_triggers_the_draw_on_the_fourth_occurrence() {
    let mut pos = Position::try_from_fen("r3k3/8/R7/8/8/8/8/4K3 w - - 0 1").unwrap();
    let mut history = GameHistory::new();
    history.push(pos.hash());

    let cycle = ["a6b6", "a8b8", "b6a6", "b8a8"];
    let mut occurrences_of_start = 1;
    for rep in 0..2 {
        for uci in cycle {
            let mv = pos.parse_move(uci).unwrap();
            pos.make(mv);
            history.push(pos.hash());
        }
        occurrences_of_start += 1;
        let is_drawn_now = pos.is_draw(&history);
        if occurrences_of_start >= 3 {
            assert!(is_drawn_now, "expected a draw after {} full cycles", rep + 1);
        } else {
            assert!(!is_drawn_now, "should not be drawn before the third occurrence");
        }
    }
}

#[test]
fn fifty_move_rule_triggers_at_a_hundred_halfmoves_without_progress() {
    let pos = Position::try_from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 100 60").unwrap();
    let history = GameHistory::new();
    assert!(pos.is_draw(&history));
}

#[test]
fn fifty_move_clock_resets_on_a_capture_or_pawn_move() {
    let mut pos = Position::try_from_fen("4k3/8/8/8/4p3/8/4P3/4K3 w - - 40 30").unwrap();
    let mv = pos.parse_move("e2e4").unwrap();
    pos.make(mv);
    assert_eq!(pos.halfmove_clock(), 0);
}
