//! Static position evaluation.
//!
//! Five terms, each a small unadjusted centipawn constant rather than a
//! tuned parameter: material, pawn structure, central control, development,
//! and castling. The result is from the side-to-move's perspective, as
//! negamax search expects.

use crate::bitboard::{Bitboard, FILES};
use crate::history::GameHistory;
use crate::piece::{Color, Piece};
use crate::position::{is_square_attacked, Position};
use crate::square::Square;

/// Magnitude used for a checkmate score; search subtracts the mating ply
/// from this so shorter mates are preferred over longer ones.
pub const MATE_SCORE: i32 = 1_000_000;

const CENTRAL_PAWN_BONUS: i32 = 10;
const ISOLATED_PAWN_PENALTY: i32 = 15;
const CENTRAL_CONTROL_WEIGHT: i32 = 5;
const DEVELOPMENT_WEIGHT: i32 = 10;
const CASTLING_BONUS: i32 = 30;

const MATERIAL_PIECE_KINDS: [Piece; 5] = [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

fn adjacent_file_mask(file: usize) -> Bitboard {
    let mut mask = Bitboard::EMPTY;
    if file > 0 {
        mask = mask.or(FILES[file - 1]);
    }
    if file < 7 {
        mask = mask.or(FILES[file + 1]);
    }
    mask
}

fn material(position: &Position) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        for piece in MATERIAL_PIECE_KINDS {
            let count = position.pieces(color).bitboard(piece).popcount() as i32;
            score += sign * count * piece.value();
        }
    }
    score
}

fn pawn_structure(position: &Position) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        let pawns = position.pieces(color).bitboard(Piece::Pawn);
        for sq in pawns.iter() {
            if Bitboard::CENTER.contains(sq) {
                score += sign * CENTRAL_PAWN_BONUS;
            }
            if pawns.and(adjacent_file_mask(sq.file())).is_empty() {
                score -= sign * ISOLATED_PAWN_PENALTY;
            }
        }
    }
    score
}

fn central_control(position: &Position) -> i32 {
    let mut white = 0;
    let mut black = 0;
    for sq in Bitboard::CENTER.iter() {
        if is_square_attacked(position, sq, Color::White) {
            white += 1;
        }
        if is_square_attacked(position, sq, Color::Black) {
            black += 1;
        }
    }
    (white - black) * CENTRAL_CONTROL_WEIGHT
}

fn development(position: &Position) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        let home_rank = if color == Color::White { 0 } else { 7 };
        let mut developed = 0;
        for (file, expected) in [(1, Piece::Knight), (2, Piece::Bishop), (5, Piece::Bishop), (6, Piece::Knight)] {
            let sq = Square::new(home_rank, file);
            if position.piece_at(sq) != Some((color, expected)) {
                developed += 1;
            }
        }
        score += sign * developed * DEVELOPMENT_WEIGHT;
    }
    score
}

fn castling_bonus(position: &Position) -> i32 {
    let mut score = 0;
    if position.has_castled(Color::White) {
        score += CASTLING_BONUS;
    }
    if position.has_castled(Color::Black) {
        score -= CASTLING_BONUS;
    }
    score
}

/// Static evaluation from the side-to-move's perspective. Returns zero for
/// a stalemate or a position drawn by the 50-move rule or threefold
/// repetition, and `-MATE_SCORE` for the side to move being checkmated.
#[must_use]
pub fn evaluate(position: &Position, history: &GameHistory) -> i32 {
    if position.is_draw(history) {
        return 0;
    }
    if position.generate_legal_moves().is_empty() {
        return if position.in_check() { -MATE_SCORE } else { 0 };
    }

    let white_perspective =
        material(position) + pawn_structure(position) + central_control(position) + development(position) + castling_bonus(position);

    if position.side_to_move() == Color::White {
        white_perspective
    } else {
        -white_perspective
    }
}
