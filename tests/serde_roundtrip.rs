//! Serialization round-trips for the core value types, gated behind the
//! optional `serde` feature.

#![cfg(feature = "serde")]

use core_chess::{Color, Move, Piece, Square};

#[test]
fn square_round_trips_through_json() {
    let sq = Square::new(3, 4);
    let json = serde_json::to_string(&sq).unwrap();
    let back: Square = serde_json::from_str(&json).unwrap();
    assert_eq!(sq, back);
}

#[test]
fn piece_and_color_round_trip_through_json() {
    let piece = Piece::Knight;
    let color = Color::Black;
    let piece_json = serde_json::to_string(&piece).unwrap();
    let color_json = serde_json::to_string(&color).unwrap();
    assert_eq!(serde_json::from_str::<Piece>(&piece_json).unwrap(), piece);
    assert_eq!(serde_json::from_str::<Color>(&color_json).unwrap(), color);
}

#[test]
fn move_round_trips_through_json_ignoring_result_flags() {
    let mv = Move::capture(Square::new(1, 4), Square::new(3, 4), Piece::Pawn);
    let json = serde_json::to_string(&mv).unwrap();
    let back: Move = serde_json::from_str(&json).unwrap();
    assert_eq!(mv, back);
    assert_eq!(mv.is_capture(), back.is_capture());
}
