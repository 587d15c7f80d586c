//! Position representation, invariants, and FEN I/O.

mod make_unmake;
mod movegen;

use std::fmt;
use std::str::FromStr;

use crate::bitboard::Bitboard;
use crate::castling::{castle_bit, CastlingRights, CASTLE_BLACK_K, CASTLE_BLACK_Q, CASTLE_WHITE_K, CASTLE_WHITE_Q};
use crate::error::{FenError, MoveParseError};
use crate::moves::Move;
use crate::piece::{Color, Piece};
use crate::square::Square;
use crate::zobrist::ZOBRIST;

pub use make_unmake::UnmakeInfo;

fn file_to_index(file: char) -> usize {
    file as usize - ('a' as usize)
}

fn rank_to_index(rank: char) -> usize {
    (rank as usize) - ('0' as usize) - 1
}

/// The six piece bitboards for one color, plus their cached union.
#[derive(Clone, Debug)]
pub struct PieceSet {
    pieces: [Bitboard; 6],
    occupied: Bitboard,
}

impl PieceSet {
    const fn empty() -> Self {
        PieceSet {
            pieces: [Bitboard(0); 6],
            occupied: Bitboard(0),
        }
    }

    #[inline]
    #[must_use]
    pub fn bitboard(&self, piece: Piece) -> Bitboard {
        self.pieces[piece.index()]
    }

    #[inline]
    #[must_use]
    pub const fn occupied(&self) -> Bitboard {
        self.occupied
    }

    #[inline]
    fn set(&mut self, piece: Piece, sq: Square) {
        let bit = 1u64 << sq.index();
        self.pieces[piece.index()].0 |= bit;
        self.occupied.0 |= bit;
    }

    #[inline]
    fn clear(&mut self, piece: Piece, sq: Square) {
        let bit = 1u64 << sq.index();
        self.pieces[piece.index()].0 &= !bit;
        self.occupied.0 &= !bit;
    }
}

/// A full chess position: piece placement, side to move, castling rights,
/// en-passant target, move counters, and the incremental Zobrist fingerprint.
#[derive(Clone, Debug)]
pub struct Position {
    sets: [PieceSet; 2],
    side_to_move: Color,
    en_passant_target: Option<Square>,
    castling_rights: CastlingRights,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
    /// Per-color "has castled" flag, used by the castling evaluation term.
    castled: [bool; 2],
}

impl Position {
    fn empty() -> Self {
        Position {
            sets: [PieceSet::empty(), PieceSet::empty()],
            side_to_move: Color::White,
            en_passant_target: None,
            castling_rights: CastlingRights::none(),
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            castled: [false, false],
        }
    }

    /// The standard chess starting position.
    #[must_use]
    pub fn startpos() -> Self {
        Self::try_from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("startpos FEN is valid")
    }

    #[inline]
    #[must_use]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    #[must_use]
    pub const fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    #[must_use]
    pub const fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub const fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline]
    #[must_use]
    pub const fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    #[inline]
    #[must_use]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline]
    #[must_use]
    pub fn has_castled(&self, color: Color) -> bool {
        self.castled[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn pieces(&self, color: Color) -> &PieceSet {
        &self.sets[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn occupied(&self, color: Color) -> Bitboard {
        self.sets[color.index()].occupied()
    }

    #[inline]
    #[must_use]
    pub fn all_occupied(&self) -> Bitboard {
        self.occupied(Color::White).or(self.occupied(Color::Black))
    }

    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        let bb = self.pieces(color).bitboard(Piece::King);
        Square::from_index(bb.0.trailing_zeros() as usize)
    }

    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<(Color, Piece)> {
        let bit = 1u64 << sq.index();
        for color in [Color::White, Color::Black] {
            if self.occupied(color).0 & bit != 0 {
                for piece in [
                    Piece::Pawn,
                    Piece::Knight,
                    Piece::Bishop,
                    Piece::Rook,
                    Piece::Queen,
                    Piece::King,
                ] {
                    if self.sets[color.index()].bitboard(piece).0 & bit != 0 {
                        return Some((color, piece));
                    }
                }
            }
        }
        None
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.all_occupied().0 & (1u64 << sq.index()) == 0
    }

    fn set_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        self.sets[color.index()].set(piece, sq);
    }

    fn remove_piece(&mut self, sq: Square, color: Color, piece: Piece) {
        self.sets[color.index()].clear(piece, sq);
    }

    pub(crate) fn has_castling_right(&self, color: Color, side: char) -> bool {
        self.castling_rights.as_u8() & castle_bit(color, side) != 0
    }

    /// Recomputes the Zobrist fingerprint from scratch. Used only at
    /// construction time; incremental updates happen in make/unmake.
    fn calculate_initial_hash(&self) -> u64 {
        let mut hash = 0u64;
        for rank in 0..8 {
            for file in 0..8 {
                let sq = Square::new(rank, file);
                if let Some((color, piece)) = self.piece_at(sq) {
                    hash ^= ZOBRIST.piece_key(piece, color, sq);
                }
            }
        }
        if self.side_to_move == Color::Black {
            hash ^= ZOBRIST.black_to_move_key;
        }
        for bit in [CASTLE_WHITE_K, CASTLE_WHITE_Q, CASTLE_BLACK_K, CASTLE_BLACK_Q] {
            if self.castling_rights.as_u8() & bit != 0 {
                hash ^= ZOBRIST.castling_key(bit);
            }
        }
        if let Some(ep) = self.en_passant_target {
            hash ^= ZOBRIST.en_passant_key(ep.file());
        }
        hash
    }

    /// Debug-only structural invariant check; compiled out of release builds.
    pub fn assert_invariants(&self) {
        debug_assert!(
            self.occupied(Color::White).is_disjoint(self.occupied(Color::Black)),
            "white and black occupancy overlap"
        );
        for color in [Color::White, Color::Black] {
            let mut union = Bitboard::EMPTY;
            for piece in [
                Piece::Pawn,
                Piece::Knight,
                Piece::Bishop,
                Piece::Rook,
                Piece::Queen,
                Piece::King,
            ] {
                let bb = self.sets[color.index()].bitboard(piece);
                debug_assert!(union.is_disjoint(bb), "overlapping piece bitboards");
                union = union.or(bb);
            }
            debug_assert_eq!(union, self.occupied(color), "occupancy cache out of sync");
            debug_assert_eq!(
                self.sets[color.index()].bitboard(Piece::King).popcount(),
                1,
                "exactly one king per side required"
            );
        }
        debug_assert_eq!(self.hash, self.calculate_initial_hash(), "fingerprint drift");
    }

    /// Parse a position from FEN. Fails on structurally malformed input;
    /// does not itself enforce full chess legality.
    pub fn try_from_fen(fen: &str) -> Result<Self, FenError> {
        let mut pos = Position::empty();
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        for (rank_idx, rank_str) in parts[0].split('/').enumerate() {
            if rank_idx >= 8 {
                return Err(FenError::InvalidRank { rank: rank_idx });
            }
            let mut file = 0usize;
            for c in rank_str.chars() {
                if c.is_ascii_digit() {
                    file += c.to_digit(10).unwrap() as usize;
                } else {
                    let color = if c.is_uppercase() { Color::White } else { Color::Black };
                    let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    if file >= 8 {
                        return Err(FenError::TooManyFiles {
                            rank: rank_idx,
                            files: file + 1,
                        });
                    }
                    pos.set_piece(Square::new(7 - rank_idx, file), color, piece);
                    file += 1;
                }
            }
        }

        match parts[1] {
            "w" => pos.side_to_move = Color::White,
            "b" => pos.side_to_move = Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        }

        let mut rights = 0u8;
        for c in parts[2].chars() {
            match c {
                'K' => rights |= CASTLE_WHITE_K,
                'Q' => rights |= CASTLE_WHITE_Q,
                'k' => rights |= CASTLE_BLACK_K,
                'q' => rights |= CASTLE_BLACK_Q,
                '-' => {}
                _ => return Err(FenError::InvalidCastling { char: c }),
            }
        }
        pos.castling_rights = CastlingRights::from_u8(rights);

        pos.en_passant_target = if parts[3] == "-" {
            None
        } else {
            let chars: Vec<char> = parts[3].chars().collect();
            if chars.len() == 2 && ('a'..='h').contains(&chars[0]) && ('1'..='8').contains(&chars[1]) {
                let rank = rank_to_index(chars[1]);
                if rank != 2 && rank != 5 {
                    return Err(FenError::InvalidEnPassant {
                        found: parts[3].to_string(),
                    });
                }
                Some(Square::new(rank, file_to_index(chars[0])))
            } else {
                return Err(FenError::InvalidEnPassant {
                    found: parts[3].to_string(),
                });
            }
        };

        if parts.len() >= 5 {
            pos.halfmove_clock = parts[4].parse().unwrap_or(0);
        }
        if parts.len() >= 6 {
            pos.fullmove_number = parts[5].parse().unwrap_or(1).max(1);
        }

        pos.hash = pos.calculate_initial_hash();
        Ok(pos)
    }

    /// Parse a position from FEN.
    ///
    /// # Panics
    /// Panics if the FEN string is invalid. Use [`Position::try_from_fen`] for
    /// fallible parsing.
    #[must_use]
    pub fn from_fen(fen: &str) -> Self {
        Self::try_from_fen(fen).expect("invalid FEN string")
    }

    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut rows = Vec::new();
        for rank in (0..8).rev() {
            let mut row = String::new();
            let mut empty = 0;
            for file in 0..8 {
                let sq = Square::new(rank, file);
                if let Some((color, piece)) = self.piece_at(sq) {
                    if empty > 0 {
                        row.push_str(&empty.to_string());
                        empty = 0;
                    }
                    row.push(piece.to_fen_char(color));
                } else {
                    empty += 1;
                }
            }
            if empty > 0 {
                row.push_str(&empty.to_string());
            }
            rows.push(row);
        }

        let active = if self.side_to_move == Color::White { "w" } else { "b" };
        let mut castling = String::new();
        if self.castling_rights.as_u8() & CASTLE_WHITE_K != 0 {
            castling.push('K');
        }
        if self.castling_rights.as_u8() & CASTLE_WHITE_Q != 0 {
            castling.push('Q');
        }
        if self.castling_rights.as_u8() & CASTLE_BLACK_K != 0 {
            castling.push('k');
        }
        if self.castling_rights.as_u8() & CASTLE_BLACK_Q != 0 {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }
        let ep = self
            .en_passant_target
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());

        format!(
            "{} {} {} {} {} {}",
            rows.join("/"),
            active,
            castling,
            ep,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Parses a UCI long-algebraic move string and resolves it against this
    /// position's legal moves.
    pub fn parse_move(&self, uci: &str) -> Result<Move, MoveParseError> {
        if uci.len() < 4 || uci.len() > 5 {
            return Err(MoveParseError::InvalidLength { len: uci.len() });
        }
        let chars: Vec<char> = uci.chars().collect();
        if !('a'..='h').contains(&chars[0])
            || !('1'..='8').contains(&chars[1])
            || !('a'..='h').contains(&chars[2])
            || !('1'..='8').contains(&chars[3])
        {
            return Err(MoveParseError::InvalidSquare {
                notation: uci.to_string(),
            });
        }
        let from_sq = Square::new(rank_to_index(chars[1]), file_to_index(chars[0]));
        let to_sq = Square::new(rank_to_index(chars[3]), file_to_index(chars[2]));

        let promotion = if uci.len() == 5 {
            let piece = Piece::from_char(chars[4]).ok_or(MoveParseError::InvalidPromotion { char: chars[4] })?;
            if matches!(piece, Piece::Pawn | Piece::King) {
                return Err(MoveParseError::InvalidPromotion { char: chars[4] });
            }
            Some(piece)
        } else {
            None
        };

        let legal_moves = self.generate_legal_moves();
        for mv in legal_moves.iter() {
            if mv.from() == from_sq && mv.to() == to_sq && mv.promotion_piece() == promotion {
                return Ok(*mv);
            }
        }

        Err(MoveParseError::IllegalMove {
            notation: uci.to_string(),
        })
    }

    /// Returns true if the halfmove clock or the given game history indicate
    /// a draw by the 50-move rule or threefold repetition.
    #[must_use]
    pub fn is_draw(&self, history: &crate::history::GameHistory) -> bool {
        self.halfmove_clock >= 100 || history.repetition_count(self.hash) >= 3
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::try_from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

pub use movegen::is_square_attacked;
