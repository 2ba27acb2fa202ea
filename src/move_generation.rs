//! Pseudo-legal and legal move generation, plus the tactical-only
//! generator used for second-move pruning (see `turn`) and for SEE's
//! "which captures exist here" callers.
//!
//! Pseudo-legal generation walks the 64 interior squares and dispatches
//! per piece type. The *legal* generator tries each pseudo-legal move
//! via make/undo and keeps only those leaving the mover's king
//! un-attacked.

use attacks::is_square_attacked;
use basetypes::*;
use board::Position;
use chess_move::*;

const KNIGHT_OFFSETS: [i32; 8] = [-21, -19, -12, -8, 8, 12, 19, 21];
const KING_OFFSETS: [i32; 8] = [-11, -10, -9, -1, 1, 9, 10, 11];
const BISHOP_DIRS: [i32; 4] = [-11, -9, 9, 11];
const ROOK_DIRS: [i32; 4] = [-10, -1, 1,10];
const PROMOTION_KINDS: [Piece; 4] = [QUEEN, ROOK, BISHOP, KNIGHT];

/// Generates every pseudo-legal move for the side to move. All
/// generated moves for non-king pieces are legal; some king moves may
/// leave the king on an attacked square (callers filter with
/// `is_square_attacked` or use `generate_legal`).
pub fn generate_pseudo_legal(pos: &Position, moves: &mut Vec<Move>) {
    let us = pos.side_to_move();
    let board = pos.board();
    for sq in 0..BOARD_SIZE as Square {
        if !is_interior(sq) {
            continue;
        }
        let piece = board[sq as usize];
        if piece == EMPTY || color_of(piece) != us {
            continue;
        }
        match kind_of(piece) {
            PAWN => generate_pawn_moves(pos, sq, moves),
            KNIGHT => generate_jump_moves(pos, sq, &KNIGHT_OFFSETS, moves),
            KING => generate_jump_moves(pos, sq, &KING_OFFSETS, moves),
            BISHOP => generate_sliding_moves(pos, sq, &BISHOP_DIRS, moves),
            ROOK => generate_sliding_moves(pos, sq, &ROOK_DIRS, moves),
            QUEEN => {
                generate_sliding_moves(pos, sq, &BISHOP_DIRS, moves);
                generate_sliding_moves(pos, sq, &ROOK_DIRS, moves);
            }
            _ => unreachable!("unknown piece kind"),
        }
    }
    generate_castling_moves(pos, moves);
}

/// Generates only captures, en-passant captures, and promotions (all
/// promotion kinds) -- used for quiescence-style pruning, never quiet
/// moves.
pub fn generate_pseudo_legal_tactical(pos: &Position, moves: &mut Vec<Move>) {
    let mut all = Vec::with_capacity(8);
    generate_pseudo_legal(pos, &mut all);
    moves.extend(all.into_iter().filter(|m| m.is_capture() || m.is_promotion()));
}

/// Filters pseudo-legal moves down to legal ones: each candidate is
/// played via make/undo and kept only if it does not leave the
/// mover's own king attacked.
pub fn generate_legal(pos: &Position, moves: &mut Vec<Move>) {
    let mut candidates = Vec::with_capacity(48);
    generate_pseudo_legal(pos, &mut candidates);
    let us = pos.side_to_move();
    let mut scratch = pos.clone();
    for mv in candidates {
        let undo = scratch.make_move(mv);
        if !scratch.is_in_check(us) {
            moves.push(mv);
        }
        scratch.undo_move(mv, undo);
    }
}

/// Legal captures and promotions only.
pub fn generate_legal_tactical(pos: &Position, moves: &mut Vec<Move>) {
    let mut candidates = Vec::with_capacity(16);
    generate_pseudo_legal_tactical(pos, &mut candidates);
    let us = pos.side_to_move();
    let mut scratch = pos.clone();
    for mv in candidates {
        let undo = scratch.make_move(mv);
        if !scratch.is_in_check(us) {
            moves.push(mv);
        }
        scratch.undo_move(mv, undo);
    }
}

fn generate_jump_moves(pos: &Position, from: Square, offsets: &[i32], moves: &mut Vec<Move>) {
    let us = pos.side_to_move();
    let board = pos.board();
    for &offset in offsets {
        let idx = from as i32 + offset;
        if idx < 0 || idx >= BOARD_SIZE as i32 {
            continue;
        }
        let to = idx as Square;
        let target = board[to as usize];
        if target == OFF_BOARD {
            continue;
        }
        if target == EMPTY {
            moves.push(Move::new(from, to, EMPTY, EMPTY, NORMAL));
        } else if color_of(target) != us {
            moves.push(Move::new(from, to, kind_of(target), EMPTY, NORMAL));
        }
    }
}

fn generate_sliding_moves(pos: &Position, from: Square, dirs: &[i32], moves: &mut Vec<Move>) {
    let us = pos.side_to_move();
    let board = pos.board();
    for &dir in dirs {
        let mut idx = from as i32 + dir;
        while idx >= 0 && idx < BOARD_SIZE as i32 {
            let to = idx as Square;
            let target = board[to as usize];
            if target == OFF_BOARD {
                break;
            }
            if target == EMPTY {
                moves.push(Move::new(from, to, EMPTY, EMPTY, NORMAL));
            } else {
                if color_of(target) != us {
                    moves.push(Move::new(from, to, kind_of(target), EMPTY, NORMAL));
                }
                break;
            }
            idx += dir;
        }
    }
}

fn generate_pawn_moves(pos: &Position, from: Square, moves: &mut Vec<Move>) {
    let us = pos.side_to_move();
    let board = pos.board();
    let forward: i32 = if us == WHITE { 10 } else { -10 };
    let start_rank = if us == WHITE { RANK_2 } else { RANK_7 };
    let promotion_rank = if us == WHITE { RANK_8 } else { RANK_1 };

    // Single push.
    let one_idx = from as i32 + forward;
    let one_to = one_idx as Square;
    if board[one_to as usize] == EMPTY {
        push_pawn_move(from, one_to, EMPTY, promotion_rank, moves);

        // Double push, only from the start rank and only if both
        // squares ahead are empty.
        if rank_of(from) == start_rank {
            let two_idx = one_idx + forward;
            let two_to = two_idx as Square;
            if board[two_to as usize] == EMPTY {
                moves.push(Move::new(from, two_to, EMPTY, EMPTY, DOUBLE_PUSH));
            }
        }
    }

    // Diagonal captures (and en-passant).
    for &side in &[-1i32, 1i32] {
        let idx = from as i32 + forward + side;
        if idx < 0 || idx >= BOARD_SIZE as i32 {
            continue;
        }
        let to = idx as Square;
        let target = board[to as usize];
        if target == OFF_BOARD {
            continue;
        }
        if target != EMPTY && color_of(target) != us {
            push_pawn_move(from, to, kind_of(target), promotion_rank, moves);
        } else if target == EMPTY && Some(to) == pos.ep_square() {
            // En-passant is only legal if an enemy pawn actually sits
            // on the square the passing pawn skipped over.
            let captured_sq = square(file_of(to), rank_of(from));
            if board[captured_sq as usize] == piece_of(PAWN, opposite(us)) {
                moves.push(Move::new(from, to, PAWN, EMPTY, EN_PASSANT));
            }
        }
    }
}

fn push_pawn_move(from: Square, to: Square, captured: Piece, promotion_rank: Rank, moves: &mut Vec<Move>) {
    if rank_of(to) == promotion_rank {
        for &kind in &PROMOTION_KINDS {
            moves.push(Move::new(from, to, captured, kind, NORMAL));
        }
    } else {
        moves.push(Move::new(from, to, captured, EMPTY, NORMAL));
    }
}

fn generate_castling_moves(pos: &Position, moves: &mut Vec<Move>) {
    let us = pos.side_to_move();
    let board = pos.board();
    let rank = if us == WHITE { RANK_1 } else { RANK_8 };
    let king_from = square(FILE_E, rank);
    if board[king_from as usize] != piece_of(KING, us) {
        return;
    }
    if pos.is_in_check(us) {
        return;
    }
    let them = opposite(us);

    if pos.castling().kingside(us) {
        let f = square(FILE_F, rank);
        let g = square(FILE_G, rank);
        let h = square(FILE_H, rank);
        if board[f as usize] == EMPTY
            && board[g as usize] == EMPTY
            && board[h as usize] == piece_of(ROOK, us)
            && !is_square_attacked(board, f, them)
            && !is_square_attacked(board, g, them)
        {
            moves.push(Move::new(king_from, g, EMPTY, EMPTY, CASTLE));
        }
    }
    if pos.castling().queenside(us) {
        let d = square(FILE_D, rank);
        let c = square(FILE_C, rank);
        let b = square(FILE_B, rank);
        let a = square(FILE_A, rank);
        if board[d as usize] == EMPTY
            && board[c as usize] == EMPTY
            && board[b as usize] == EMPTY
            && board[a as usize] == piece_of(ROOK, us)
            && !is_square_attacked(board, d, them)
            && !is_square_attacked(board, c, them)
        {
            moves.push(Move::new(king_from, c, EMPTY, EMPTY, CASTLE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notation::START_POSITION_FEN;

    #[test]
    fn initial_position_has_twenty_legal_moves() {
        let pos = Position::from_fen(START_POSITION_FEN).unwrap();
        let mut moves = Vec::new();
        generate_legal(&pos, &mut moves);
        assert_eq!(moves.len(), 20);
    }

    #[test]
    fn legal_is_subset_of_pseudo_legal() {
        let pos = Position::from_fen(START_POSITION_FEN).unwrap();
        let mut pseudo = Vec::new();
        generate_pseudo_legal(&pos, &mut pseudo);
        let mut legal = Vec::new();
        generate_legal(&pos, &mut legal);
        for mv in &legal {
            assert!(pseudo.contains(mv));
        }
    }

    #[test]
    fn pinned_piece_cannot_move_pseudo_legally_into_check() {
        // White king on e1, white rook pinned on e2 by black rook on e8.
        let pos = Position::from_fen("4r3/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        let mut legal = Vec::new();
        generate_legal(&pos, &mut legal);
        // The pinned rook may only move along the e-file.
        for mv in &legal {
            if mv.from() == square(FILE_E, RANK_2) {
                assert_eq!(file_of(mv.to()), FILE_E);
            }
        }
    }

    #[test]
    fn en_passant_only_generated_when_a_pawn_can_actually_capture() {
        let pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let mut moves = Vec::new();
        generate_pseudo_legal(&pos, &mut moves);
        assert!(moves.iter().any(|m| m.is_en_passant()));
    }

    #[test]
    fn castling_requires_empty_and_unattacked_squares() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let mut moves = Vec::new();
        generate_pseudo_legal(&pos, &mut moves);
        assert!(moves.iter().any(|m| m.is_castle() && m.to() == square(FILE_G, RANK_1)));
        assert!(moves.iter().any(|m| m.is_castle() && m.to() == square(FILE_C, RANK_1)));
    }

    #[test]
    fn promotions_generate_all_four_piece_kinds() {
        let pos = Position::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut moves = Vec::new();
        generate_pseudo_legal(&pos, &mut moves);
        let promos: Vec<_> = moves
            .iter()
            .filter(|m| m.from() == square(FILE_A, RANK_7))
            .map(|m| m.promotion())
            .collect();
        assert_eq!(promos.len(), 4);
        for kind in [QUEEN, ROOK, BISHOP, KNIGHT] {
            assert!(promos.contains(&kind));
        }
    }
}
