//! Holds the current chess position and the invariants needed to
//! incrementally make and undo moves: the board array, king squares,
//! castling rights, en-passant square, side to move, halfmove clock,
//! Zobrist hash, and a position-occurrence multiset for repetition
//! detection.
//!
//! `Position` does not know anything about chess strategy; it only
//! knows how to apply and revert one move at a time while keeping its
//! own bookkeeping consistent. Move generation lives in
//! `move_generation`, static evaluation in `evaluator`.

use attacks::is_square_attacked;
use basetypes::*;
use castling_rights::{self, CastlingRights};
use chess_move::*;
use engine::EngineError;
use notation::{self, ParsedFen};
use std::collections::HashMap;
use zobrist::ZobristArrays;

/// Everything needed to undo `Position::flip_for_second_move`.
#[derive(Clone, Copy)]
pub struct TurnFlip {
    prev_ep_square: Option<Square>,
}

/// Everything needed to perfectly reverse one `make_move` call.
#[derive(Clone, Copy)]
pub struct UndoInfo {
    captured: Piece,
    prev_castling: CastlingRights,
    prev_ep_square: Option<Square>,
    moved_piece: Piece,
    prev_halfmove_clock: u32,
    prev_hash: u64,
}

#[derive(Clone)]
pub struct Position {
    board: [Piece; BOARD_SIZE],
    king_sq: [Square; 2],
    castling: CastlingRights,
    ep_square: Option<Square>,
    side_to_move: Color,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
    history: HashMap<u64, u8>,
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Position, EngineError> {
        Position::from_parsed(notation::parse_fen(fen)?)
    }

    pub fn new_initial() -> Position {
        Position::from_fen(notation::START_POSITION_FEN).expect("built-in FEN is valid")
    }

    fn from_parsed(parsed: ParsedFen) -> Result<Position, EngineError> {
        let mut king_sq = [0u8; 2];
        let mut king_count = [0u8; 2];
        for sq in 0..BOARD_SIZE as Square {
            if is_interior(sq) {
                let piece = parsed.board[sq as usize];
                if piece == KING {
                    king_sq[WHITE] = sq;
                    king_count[WHITE] += 1;
                } else if piece == -KING {
                    king_sq[BLACK] = sq;
                    king_count[BLACK] += 1;
                }
            }
        }
        if king_count[WHITE] != 1 || king_count[BLACK] != 1 {
            return Err(EngineError::BadFen("position must have exactly one king per side".to_string()));
        }

        let mut position = Position {
            board: parsed.board,
            king_sq,
            castling: parsed.castling,
            ep_square: parsed.ep_square,
            side_to_move: parsed.side_to_move,
            halfmove_clock: parsed.halfmove_clock,
            fullmove_number: parsed.fullmove_number,
            hash: 0,
            history: HashMap::new(),
        };
        position.hash = position.compute_hash();
        *position.history.entry(position.hash).or_insert(0) += 1;

        if is_square_attacked(&position.board, position.king_sq[opposite(position.side_to_move)], position.side_to_move) {
            return Err(EngineError::BadFen("side not to move is in check".to_string()));
        }
        Ok(position)
    }

    // -- accessors -----------------------------------------------------

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Piece {
        self.board[sq as usize]
    }

    #[inline]
    pub fn board(&self) -> &[Piece; BOARD_SIZE] {
        &self.board
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.king_sq[color]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    pub fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline]
    pub fn is_in_check(&self, color: Color) -> bool {
        is_square_attacked(&self.board, self.king_sq[color], opposite(color))
    }

    /// Number of times the current position has occurred (including
    /// now), counting only positions reached from the FEN this
    /// `Position` was constructed from.
    pub fn occurrences_of_current(&self) -> u8 {
        *self.history.get(&self.hash).unwrap_or(&0)
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.occurrences_of_current() >= 3
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Recomputes the Zobrist hash from scratch, for consistency
    /// checks in tests and debug assertions.
    pub fn compute_hash(&self) -> u64 {
        let z = ZobristArrays::get();
        let mut hash = 0u64;
        for sq in 0..BOARD_SIZE as Square {
            if is_interior(sq) {
                let piece = self.board[sq as usize];
                if piece != EMPTY {
                    hash ^= z.piece(color_of(piece), kind_of(piece), sq64(sq));
                }
            }
        }
        hash ^= z.castling(self.castling.bits());
        hash ^= z.en_passant_file(self.ep_square.map(file_of).unwrap_or(8));
        if self.side_to_move == BLACK {
            hash ^= z.side_to_move();
        }
        hash
    }

    // -- make / undo -----------------------------------------------------

    /// Applies `mv`, which must be a pseudo-legal move in the current
    /// position, and returns the information needed to undo it.
    pub fn make_move(&mut self, mv: Move) -> UndoInfo {
        let z = ZobristArrays::get();
        let us = self.side_to_move;
        let them = opposite(us);
        let from = mv.from();
        let to = mv.to();
        let moved_piece = self.board[from as usize];
        debug_assert!(moved_piece != EMPTY && moved_piece != OFF_BOARD);
        debug_assert_eq!(color_of(moved_piece), us);

        let undo = UndoInfo {
            captured: mv.captured(),
            prev_castling: self.castling,
            prev_ep_square: self.ep_square,
            moved_piece,
            prev_halfmove_clock: self.halfmove_clock,
            prev_hash: self.hash,
        };

        // Remove the moving piece from its origin.
        self.hash ^= z.piece(us, kind_of(moved_piece), sq64(from));
        self.board[from as usize] = EMPTY;

        // Remove any captured piece (en-passant captures a pawn that is
        // not on the destination square).
        match mv.flag() {
            EN_PASSANT => {
                let captured_sq = square(file_of(to), rank_of(from));
                let captured_piece = self.board[captured_sq as usize];
                debug_assert_eq!(kind_of(captured_piece), PAWN);
                self.hash ^= z.piece(them, PAWN, sq64(captured_sq));
                self.board[captured_sq as usize] = EMPTY;
            }
            _ => {
                if mv.captured() != EMPTY {
                    self.hash ^= z.piece(them, mv.captured(), sq64(to));
                }
            }
        }

        // Place the arriving piece (possibly promoted).
        let arriving = if mv.promotion() != EMPTY {
            piece_of(mv.promotion(), us)
        } else {
            moved_piece
        };
        self.board[to as usize] = arriving;
        self.hash ^= z.piece(us, kind_of(arriving), sq64(to));

        if kind_of(moved_piece) == KING {
            self.king_sq[us] = to;
        }

        // Castling: move the rook too.
        if mv.flag() == CASTLE {
            let rank = rank_of(from);
            let (rook_from, rook_to) = if file_of(to) == FILE_G {
                (square(FILE_H, rank), square(FILE_F, rank))
            } else {
                (square(FILE_A, rank), square(FILE_D, rank))
            };
            let rook = self.board[rook_from as usize];
            self.hash ^= z.piece(us, ROOK, sq64(rook_from));
            self.board[rook_from as usize] = EMPTY;
            self.board[rook_to as usize] = rook;
            self.hash ^= z.piece(us, ROOK, sq64(rook_to));
        }

        // Castling rights bookkeeping.
        let old_castling_bits = self.castling.bits();
        if kind_of(moved_piece) == KING {
            self.castling.remove_all_for(us);
        }
        strip_rook_right(&mut self.castling, us, from);
        strip_rook_right(&mut self.castling, them, to);
        if old_castling_bits != self.castling.bits() {
            self.hash ^= z.castling(old_castling_bits);
            self.hash ^= z.castling(self.castling.bits());
        }

        // En-passant square bookkeeping.
        let old_ep_file = self.ep_square.map(file_of).unwrap_or(8);
        self.ep_square = if mv.flag() == DOUBLE_PUSH {
            Some(square(file_of(from), (rank_of(from) + rank_of(to)) / 2))
        } else {
            None
        };
        let new_ep_file = self.ep_square.map(file_of).unwrap_or(8);
        if old_ep_file != new_ep_file {
            self.hash ^= z.en_passant_file(old_ep_file);
            self.hash ^= z.en_passant_file(new_ep_file);
        }

        // Halfmove clock.
        if kind_of(moved_piece) == PAWN || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        if us == BLACK {
            self.fullmove_number += 1;
        }

        self.hash ^= z.side_to_move();
        self.side_to_move = them;

        *self.history.entry(self.hash).or_insert(0) += 1;

        undo
    }

    /// Reverts the effects of `make_move(mv)`, restoring the exact
    /// prior state (board, king squares, castling, ep, hash, halfmove,
    /// side to move).
    pub fn undo_move(&mut self, mv: Move, undo: UndoInfo) {
        if let Some(count) = self.history.get_mut(&self.hash) {
            *count -= 1;
            if *count == 0 {
                self.history.remove(&self.hash);
            }
        }

        let them = self.side_to_move;
        let us = opposite(them);
        self.side_to_move = us;
        if us == BLACK {
            self.fullmove_number -= 1;
        }

        let from = mv.from();
        let to = mv.to();

        self.board[from as usize] = undo.moved_piece;
        self.board[to as usize] = EMPTY;

        match mv.flag() {
            EN_PASSANT => {
                let captured_sq = square(file_of(to), rank_of(from));
                self.board[captured_sq as usize] = piece_of(PAWN, them);
            }
            _ => {
                if undo.captured != EMPTY {
                    self.board[to as usize] = piece_of(undo.captured, them);
                }
            }
        }

        if mv.flag() == CASTLE {
            let rank = rank_of(from);
            let (rook_from, rook_to) = if file_of(to) == FILE_G {
                (square(FILE_H, rank), square(FILE_F, rank))
            } else {
                (square(FILE_A, rank), square(FILE_D, rank))
            };
            let rook = self.board[rook_to as usize];
            self.board[rook_to as usize] = EMPTY;
            self.board[rook_from as usize] = rook;
        }

        if kind_of(undo.moved_piece) == KING {
            self.king_sq[us] = from;
        }

        self.castling = undo.prev_castling;
        self.ep_square = undo.prev_ep_square;
        self.halfmove_clock = undo.prev_halfmove_clock;
        self.hash = undo.prev_hash;
    }

    /// `make_move` always toggles `side_to_move`, the way an ordinary
    /// chess engine's would. Between the two moves of a double-move
    /// turn the side to move does not actually change -- the same
    /// side plays again -- and any en-passant target the first move
    /// just created is no longer capturable (a side can't en-passant
    /// its own pawn), so it must be cleared. Callers that apply or
    /// generate a turn's second move call this between the two
    /// `make_move`s, and `unflip_for_second_move` to reverse it
    /// before undoing the first move.
    pub fn flip_for_second_move(&mut self) -> TurnFlip {
        let z = ZobristArrays::get();
        let prev_ep_square = self.ep_square;
        if prev_ep_square.is_some() {
            self.hash ^= z.en_passant_file(prev_ep_square.map(file_of).unwrap());
            self.hash ^= z.en_passant_file(8);
            self.ep_square = None;
        }
        self.hash ^= z.side_to_move();
        self.side_to_move = opposite(self.side_to_move);
        TurnFlip { prev_ep_square }
    }

    /// Reverses `flip_for_second_move`. Must be called after the
    /// turn's second move (if any) has been undone and before undoing
    /// the first move.
    pub fn unflip_for_second_move(&mut self, flip: TurnFlip) {
        let z = ZobristArrays::get();
        self.hash ^= z.side_to_move();
        self.side_to_move = opposite(self.side_to_move);
        if flip.prev_ep_square != self.ep_square {
            self.hash ^= z.en_passant_file(self.ep_square.map(file_of).unwrap_or(8));
            self.hash ^= z.en_passant_file(flip.prev_ep_square.map(file_of).unwrap_or(8));
            self.ep_square = flip.prev_ep_square;
        }
    }
}

/// If `sq` is a castling rook's home square, strips the matching
/// right from `castling` for `color` (used both when the rook itself
/// moves and when it gets captured there).
fn strip_rook_right(castling: &mut CastlingRights, color: Color, sq: Square) {
    let rank = if color == WHITE { RANK_1 } else { RANK_8 };
    if rank_of(sq) != rank {
        return;
    }
    if file_of(sq) == FILE_A {
        castling.remove(if color == WHITE {
            castling_rights::WHITE_QUEENSIDE
        } else {
            castling_rights::BLACK_QUEENSIDE
        });
    } else if file_of(sq) == FILE_H {
        castling.remove(if color == WHITE {
            castling_rights::WHITE_KINGSIDE
        } else {
            castling_rights::BLACK_KINGSIDE
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notation::START_POSITION_FEN;

    #[test]
    fn initial_position_hash_matches_recomputation() {
        let p = Position::new_initial();
        assert_eq!(p.hash(), p.compute_hash());
    }

    #[test]
    fn make_undo_is_an_involution() {
        let mut p = Position::new_initial();
        let before_board = p.board;
        let before_hash = p.hash;
        let before_castling = p.castling;
        let before_ep = p.ep_square;
        let before_clock = p.halfmove_clock;
        let before_side = p.side_to_move;

        let mv = Move::new(square(FILE_E, RANK_2), square(FILE_E, RANK_4), EMPTY, EMPTY, DOUBLE_PUSH);
        let undo = p.make_move(mv);
        assert_ne!(p.board, before_board);
        p.undo_move(mv, undo);

        assert_eq!(p.board, before_board);
        assert_eq!(p.hash, before_hash);
        assert_eq!(p.castling, before_castling);
        assert_eq!(p.ep_square, before_ep);
        assert_eq!(p.halfmove_clock, before_clock);
        assert_eq!(p.side_to_move, before_side);
        assert_eq!(p.hash, p.compute_hash());
    }

    #[test]
    fn castling_move_relocates_rook_and_loses_rights() {
        let mut p = Position::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let mv = Move::new(square(FILE_E, RANK_1), square(FILE_G, RANK_1), EMPTY, EMPTY, CASTLE);
        let undo = p.make_move(mv);
        assert_eq!(p.piece_at(square(FILE_F, RANK_1)), ROOK);
        assert_eq!(p.piece_at(square(FILE_H, RANK_1)), EMPTY);
        assert!(!p.castling().kingside(WHITE));
        assert_eq!(p.hash(), p.compute_hash());
        p.undo_move(mv, undo);
        assert_eq!(p.piece_at(square(FILE_H, RANK_1)), ROOK);
        assert!(p.castling().kingside(WHITE));
    }

    #[test]
    fn en_passant_capture_removes_the_passing_pawn() {
        let mut p = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let mv = Move::new(square(FILE_E, RANK_5), square(FILE_D, RANK_6), PAWN, EMPTY, EN_PASSANT);
        let undo = p.make_move(mv);
        assert_eq!(p.piece_at(square(FILE_D, RANK_5)), EMPTY);
        assert_eq!(p.piece_at(square(FILE_D, RANK_6)), PAWN);
        assert_eq!(p.hash(), p.compute_hash());
        p.undo_move(mv, undo);
        assert_eq!(p.piece_at(square(FILE_D, RANK_5)), -PAWN);
    }

    #[test]
    fn threefold_repetition_is_detected() {
        let mut p = Position::from_fen(START_POSITION_FEN).unwrap();
        let wf = Move::new(square(FILE_G, RANK_1), square(FILE_F, RANK_3), EMPTY, EMPTY, NORMAL);
        let wb = Move::new(square(FILE_F, RANK_3), square(FILE_G, RANK_1), EMPTY, EMPTY, NORMAL);
        let bf = Move::new(square(FILE_G, RANK_8), square(FILE_F, RANK_6), EMPTY, EMPTY, NORMAL);
        let bb = Move::new(square(FILE_F, RANK_6), square(FILE_G, RANK_8), EMPTY, EMPTY, NORMAL);
        for _ in 0..2 {
            p.make_move(wf);
            p.make_move(bf);
            p.make_move(wb);
            p.make_move(bb);
        }
        assert!(p.is_threefold_repetition());
    }

    #[test]
    fn flip_for_second_move_keeps_the_same_side_to_move() {
        let mut p = Position::from_fen(START_POSITION_FEN).unwrap();
        let white_first = Move::new(square(FILE_E, RANK_2), square(FILE_E, RANK_4), EMPTY, EMPTY, DOUBLE_PUSH);
        let undo1 = p.make_move(white_first);
        assert_eq!(p.side_to_move(), BLACK);
        assert_eq!(p.ep_square(), Some(square(FILE_E, RANK_3)));

        let flip = p.flip_for_second_move();
        assert_eq!(p.side_to_move(), WHITE);
        assert_eq!(p.ep_square(), None, "own ep target is not capturable by the same side");
        assert_eq!(p.hash(), p.compute_hash());

        let white_second = Move::new(square(FILE_G, RANK_1), square(FILE_F, RANK_3), EMPTY, EMPTY, NORMAL);
        let undo2 = p.make_move(white_second);
        assert_eq!(p.side_to_move(), BLACK);
        assert_eq!(p.hash(), p.compute_hash());

        p.undo_move(white_second, undo2);
        p.unflip_for_second_move(flip);
        assert_eq!(p.side_to_move(), BLACK);
        assert_eq!(p.ep_square(), Some(square(FILE_E, RANK_3)));
        assert_eq!(p.hash(), p.compute_hash());
        p.undo_move(white_first, undo1);
        assert_eq!(p.side_to_move(), WHITE);
        assert_eq!(p.hash(), p.compute_hash());
    }
}
