//! The Attack Oracle: "is square S attacked by color C".
//!
//! Walks jump offsets for knights, kings, and pawns, and slides rays
//! for bishops/rooks/queens, stopping at the first non-empty square or
//! at an `OFF_BOARD` sentinel -- the payoff of the 10x12 padded
//! mailbox is that off-board detection is a single equality check,
//! with no extra file/rank bounds arithmetic needed.

use basetypes::*;

const KNIGHT_OFFSETS: [i32; 8] = [-21, -19, -12, -8, 8, 12, 19, 21];
const KING_OFFSETS: [i32; 8] = [-11, -10, -9, -1, 1, 9, 10, 11];
const BISHOP_DIRS: [i32; 4] = [-11, -9, 9, 11];
const ROOK_DIRS: [i32; 4] = [-10, -1, 1, 10];

/// Squares (relative to the target) from which a pawn of `by_color`
/// could deliver a capture onto the target square.
#[inline]
fn pawn_attacker_offsets(by_color: Color) -> [i32; 2] {
    if by_color == WHITE {
        [-11, -9]
    } else {
        [9, 11]
    }
}

#[inline]
fn at(board: &[Piece; BOARD_SIZE], sq: Square, offset: i32) -> Piece {
    let idx = sq as i32 + offset;
    if idx < 0 || idx >= BOARD_SIZE as i32 {
        OFF_BOARD
    } else {
        board[idx as usize]
    }
}

/// Returns `true` if `sq` is attacked by any piece of `by_color` in
/// `board`.
pub fn is_square_attacked(board: &[Piece; BOARD_SIZE], sq: Square, by_color: Color) -> bool {
    for &offset in &KNIGHT_OFFSETS {
        if at(board, sq, offset) == piece_of(KNIGHT, by_color) {
            return true;
        }
    }
    for &offset in &KING_OFFSETS {
        if at(board, sq, offset) == piece_of(KING, by_color) {
            return true;
        }
    }
    for &offset in &pawn_attacker_offsets(by_color) {
        if at(board, sq, offset) == piece_of(PAWN, by_color) {
            return true;
        }
    }
    for &dir in &BISHOP_DIRS {
        if ray_hits(board, sq, dir, by_color, &[BISHOP, QUEEN]) {
            return true;
        }
    }
    for &dir in &ROOK_DIRS {
        if ray_hits(board, sq, dir, by_color, &[ROOK, QUEEN]) {
            return true;
        }
    }
    false
}

/// Walks a sliding ray from `sq` in direction `dir`, returning `true`
/// if the first piece encountered belongs to `by_color` and its kind
/// is one of `kinds`.
fn ray_hits(board: &[Piece; BOARD_SIZE], sq: Square, dir: i32, by_color: Color, kinds: &[Piece]) -> bool {
    let mut idx = sq as i32 + dir;
    loop {
        if idx < 0 || idx >= BOARD_SIZE as i32 {
            return false;
        }
        let piece = board[idx as usize];
        if piece == OFF_BOARD {
            return false;
        }
        if piece == EMPTY {
            idx += dir;
            continue;
        }
        return color_of(piece) == by_color && kinds.contains(&kind_of(piece));
    }
}

/// Returns a bitboard-free list of squares from which `by_color`
/// attacks `sq`, used by SEE to find the least valuable attacker.
pub fn attackers_of(board: &[Piece; BOARD_SIZE], sq: Square, by_color: Color) -> Vec<Square> {
    let mut attackers = Vec::new();
    for &offset in &KNIGHT_OFFSETS {
        if at(board, sq, offset) == piece_of(KNIGHT, by_color) {
            attackers.push((sq as i32 + offset) as Square);
        }
    }
    for &offset in &KING_OFFSETS {
        if at(board, sq, offset) == piece_of(KING, by_color) {
            attackers.push((sq as i32 + offset) as Square);
        }
    }
    for &offset in &pawn_attacker_offsets(by_color) {
        if at(board, sq, offset) == piece_of(PAWN, by_color) {
            attackers.push((sq as i32 + offset) as Square);
        }
    }
    for &dir in &BISHOP_DIRS {
        if let Some(from) = ray_attacker(board, sq, dir, by_color, &[BISHOP, QUEEN]) {
            attackers.push(from);
        }
    }
    for &dir in &ROOK_DIRS {
        if let Some(from) = ray_attacker(board, sq, dir, by_color, &[ROOK, QUEEN]) {
            attackers.push(from);
        }
    }
    attackers
}

fn ray_attacker(
    board: &[Piece; BOARD_SIZE],
    sq: Square,
    dir: i32,
    by_color: Color,
    kinds: &[Piece],
) -> Option<Square> {
    let mut idx = sq as i32 + dir;
    loop {
        if idx < 0 || idx >= BOARD_SIZE as i32 {
            return None;
        }
        let piece = board[idx as usize];
        if piece == OFF_BOARD {
            return None;
        }
        if piece == EMPTY {
            idx += dir;
            continue;
        }
        return if color_of(piece) == by_color && kinds.contains(&kind_of(piece)) {
            Some(idx as Square)
        } else {
            None
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notation::parse_fen;

    fn board_from(fen: &str) -> [Piece; BOARD_SIZE] {
        parse_fen(fen).unwrap().board
    }

    #[test]
    fn rook_attacks_along_open_file() {
        let board = board_from("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        assert!(is_square_attacked(&board, square(FILE_A, RANK_8), WHITE));
    }

    #[test]
    fn rook_attack_blocked_by_piece() {
        let board = board_from("4k3/8/8/8/4p3/8/8/R3K3 w - - 0 1");
        assert!(!is_square_attacked(&board, square(FILE_A, RANK_5), WHITE));
    }

    #[test]
    fn pawn_attacks_diagonally_forward() {
        let board = board_from("4k3/8/8/8/3P4/8/8/4K3 w - - 0 1");
        assert!(is_square_attacked(&board, square(FILE_E, RANK_5), WHITE));
        assert!(is_square_attacked(&board, square(FILE_C, RANK_5), WHITE));
        assert!(!is_square_attacked(&board, square(FILE_D, RANK_5), WHITE));
    }

    #[test]
    fn knight_attacks_l_shape() {
        let board = board_from("4k3/8/8/8/4N3/8/8/4K3 w - - 0 1");
        assert!(is_square_attacked(&board, square(FILE_F, RANK_6), WHITE));
        assert!(is_square_attacked(&board, square(FILE_C, RANK_5), WHITE));
        assert!(!is_square_attacked(&board, square(FILE_E, RANK_6), WHITE));
    }
}
