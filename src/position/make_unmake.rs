//! Incremental make/unmake with Zobrist hash maintenance.

use crate::castling::castle_bit;
use crate::moves::Move;
use crate::piece::{Color, Piece};
use crate::square::Square;
use crate::zobrist::ZOBRIST;

use super::Position;

/// Everything [`Position::unmake`] needs to undo a [`Position::make`] call.
/// Restored fields are snapshotted wholesale rather than reconstructed by
/// reversing each incremental update, so unmake is a handful of assignments.
pub struct UnmakeInfo {
    captured: Option<(Color, Piece, Square)>,
    previous_en_passant_target: Option<Square>,
    previous_castling_rights: crate::castling::CastlingRights,
    previous_hash: u64,
    previous_halfmove_clock: u32,
    previous_fullmove_number: u32,
    previous_castled: [bool; 2],
}

impl Position {
    fn clear_castling_right(&mut self, color: Color, kingside: bool) {
        if self.castling_rights.has(color, kingside) {
            let side_char = if kingside { 'K' } else { 'Q' };
            self.hash ^= ZOBRIST.castling_key(castle_bit(color, side_char));
            self.castling_rights.remove(color, kingside);
        }
    }

    fn update_castling_rights_for_move(&mut self, us: Color, moving: Piece, from: Square) {
        let home_rank = if us == Color::White { 0 } else { 7 };
        match moving {
            Piece::King => {
                self.clear_castling_right(us, true);
                self.clear_castling_right(us, false);
            }
            Piece::Rook => {
                if from == Square::new(home_rank, 0) {
                    self.clear_castling_right(us, false);
                } else if from == Square::new(home_rank, 7) {
                    self.clear_castling_right(us, true);
                }
            }
            _ => {}
        }
    }

    fn update_castling_rights_on_rook_loss(&mut self, color: Color, captured_sq: Square) {
        let home_rank = if color == Color::White { 0 } else { 7 };
        if captured_sq == Square::new(home_rank, 0) {
            self.clear_castling_right(color, false);
        } else if captured_sq == Square::new(home_rank, 7) {
            self.clear_castling_right(color, true);
        }
    }

    fn castling_rook_squares(home_rank: usize, kingside: bool) -> (Square, Square) {
        if kingside {
            (Square::new(home_rank, 7), Square::new(home_rank, 5))
        } else {
            (Square::new(home_rank, 0), Square::new(home_rank, 3))
        }
    }

    /// Applies `mv` to the position and returns the saved state needed to
    /// undo it, along with `mv` enriched with the check/mate/stalemate flags
    /// that describe the position this move produced.
    pub fn make(&mut self, mv: Move) -> (UnmakeInfo, Move) {
        let us = self.side_to_move;
        let opp = us.opponent();
        let from = mv.from();
        let to = mv.to();
        let moving = mv.moving_piece();

        let mut info = UnmakeInfo {
            captured: None,
            previous_en_passant_target: self.en_passant_target,
            previous_castling_rights: self.castling_rights,
            previous_hash: self.hash,
            previous_halfmove_clock: self.halfmove_clock,
            previous_fullmove_number: self.fullmove_number,
            previous_castled: self.castled,
        };

        if let Some(ep) = self.en_passant_target {
            self.hash ^= ZOBRIST.en_passant_key(ep.file());
        }
        self.en_passant_target = None;

        if mv.is_en_passant() {
            let captured_sq = Square::new(from.rank(), to.file());
            self.remove_piece(captured_sq, opp, Piece::Pawn);
            self.hash ^= ZOBRIST.piece_key(Piece::Pawn, opp, captured_sq);
            info.captured = Some((opp, Piece::Pawn, captured_sq));
        } else if mv.is_capture() {
            let (_, captured_piece) = self.piece_at(to).expect("capture move must target an occupied square");
            self.remove_piece(to, opp, captured_piece);
            self.hash ^= ZOBRIST.piece_key(captured_piece, opp, to);
            info.captured = Some((opp, captured_piece, to));
            if captured_piece == Piece::Rook {
                self.update_castling_rights_on_rook_loss(opp, to);
            }
        }

        self.remove_piece(from, us, moving);
        self.hash ^= ZOBRIST.piece_key(moving, us, from);
        let placed_piece = mv.promotion_piece().unwrap_or(moving);
        self.set_piece(to, us, placed_piece);
        self.hash ^= ZOBRIST.piece_key(placed_piece, us, to);

        if mv.is_castling() {
            let (rook_from, rook_to) = Self::castling_rook_squares(from.rank(), to.file() == 6);
            self.remove_piece(rook_from, us, Piece::Rook);
            self.hash ^= ZOBRIST.piece_key(Piece::Rook, us, rook_from);
            self.set_piece(rook_to, us, Piece::Rook);
            self.hash ^= ZOBRIST.piece_key(Piece::Rook, us, rook_to);
            self.castled[us.index()] = true;
        }

        self.update_castling_rights_for_move(us, moving, from);

        if mv.is_double_pawn_push() {
            let ep_sq = Square::new((from.rank() + to.rank()) / 2, from.file());
            self.en_passant_target = Some(ep_sq);
            self.hash ^= ZOBRIST.en_passant_key(ep_sq.file());
        }

        if moving == Piece::Pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        self.hash ^= ZOBRIST.black_to_move_key;
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = opp;

        let now_in_check = self.in_check();
        let has_replies = !self.generate_legal_moves().is_empty();
        let enriched = mv.with_result_flags(now_in_check, has_replies);

        (info, enriched)
    }

    /// Reverses a prior [`Position::make`] call. `mv` must be the same move
    /// (equality ignores result flags) and `info` must be the value that
    /// call returned.
    pub fn unmake(&mut self, mv: Move, info: UnmakeInfo) {
        let us = self.side_to_move.opponent();
        let from = mv.from();
        let to = mv.to();
        let moving = mv.moving_piece();
        let placed_piece = mv.promotion_piece().unwrap_or(moving);

        if mv.is_castling() {
            let (rook_from, rook_to) = Self::castling_rook_squares(from.rank(), to.file() == 6);
            self.remove_piece(rook_to, us, Piece::Rook);
            self.set_piece(rook_from, us, Piece::Rook);
        }

        self.remove_piece(to, us, placed_piece);
        self.set_piece(from, us, moving);

        if let Some((color, piece, sq)) = info.captured {
            self.set_piece(sq, color, piece);
        }

        self.side_to_move = us;
        self.castling_rights = info.previous_castling_rights;
        self.en_passant_target = info.previous_en_passant_target;
        self.halfmove_clock = info.previous_halfmove_clock;
        self.fullmove_number = info.previous_fullmove_number;
        self.castled = info.previous_castled;
        self.hash = info.previous_hash;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_unmake_restores_hash_and_fen() {
        let mut pos = Position::startpos();
        let before_fen = pos.to_fen();
        let before_hash = pos.hash();
        let mv = pos.parse_move("e2e4").unwrap();
        let (info, enriched) = pos.make(mv);
        assert_eq!(enriched.from(), mv.from());
        assert_ne!(pos.hash(), before_hash);
        pos.unmake(mv, info);
        assert_eq!(pos.to_fen(), before_fen);
        assert_eq!(pos.hash(), before_hash);
    }

    #[test]
    fn castling_move_relocates_rook_and_unmake_restores_it() {
        let mut pos = Position::try_from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let mv = pos.parse_move("e1g1").unwrap();
        assert!(mv.is_castling());
        let before = pos.to_fen();
        let (info, _) = pos.make(mv);
        assert_eq!(pos.piece_at(Square::new(0, 5)), Some((Color::White, Piece::Rook)));
        pos.unmake(mv, info);
        assert_eq!(pos.to_fen(), before);
    }

    #[test]
    fn en_passant_capture_removes_the_correct_pawn() {
        let mut pos = Position::try_from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let mv = pos.parse_move("e5d6").unwrap();
        assert!(mv.is_en_passant());
        let before = pos.to_fen();
        let (info, _) = pos.make(mv);
        assert!(pos.piece_at(Square::new(4, 3)).is_none());
        pos.unmake(mv, info);
        assert_eq!(pos.to_fen(), before);
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_move_and_capture() {
        let mut pos = Position::startpos();
        let mv = pos.parse_move("e2e4").unwrap();
        let (_, _) = pos.make(mv);
        assert_eq!(pos.halfmove_clock(), 0);
    }

    #[test]
    fn fullmove_number_increments_after_black_moves() {
        let mut pos = Position::startpos();
        let mv1 = pos.parse_move("e2e4").unwrap();
        pos.make(mv1);
        assert_eq!(pos.fullmove_number(), 1);
        let mv2 = pos.parse_move("e7e5").unwrap();
        pos.make(mv2);
        assert_eq!(pos.fullmove_number(), 2);
    }
}
