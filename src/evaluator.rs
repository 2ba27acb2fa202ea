//! The variant-tuned static evaluator.
//!
//! Returns a score in centipawn-like units from White's perspective,
//! combining material, piece-square tables, development, bishop pair,
//! king safety, castling bonuses, central control, anti-trade bonus,
//! and an early-queen penalty. Pawns are deliberately undervalued (80,
//! not 100): in Double-Move Chess a whole turn spent grabbing a pawn
//! while the opponent develops two pieces is a losing trade, so the
//! evaluator must say so.

use attacks::is_square_attacked;
use basetypes::*;
use board::Position;
use value::Value;

pub const PAWN_VALUE: Value = 80;
pub const KNIGHT_VALUE: Value = 320;
pub const BISHOP_VALUE: Value = 330;
pub const ROOK_VALUE: Value = 500;
pub const QUEEN_VALUE: Value = 900;
pub const KING_VALUE: Value = 20000;

#[inline]
pub fn piece_value(kind: Piece) -> Value {
    match kind {
        PAWN => PAWN_VALUE,
        KNIGHT => KNIGHT_VALUE,
        BISHOP => BISHOP_VALUE,
        ROOK => ROOK_VALUE,
        QUEEN => QUEEN_VALUE,
        KING => KING_VALUE,
        _ => 0,
    }
}

#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10,-20,-20, 10, 10,  5,
     5, -5,-10,  0,  0,-10, -5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5,  5, 10, 25, 25, 10,  5,  5,
    10, 10, 20, 30, 30, 20, 10, 10,
    50, 50, 50, 50, 50, 50, 50, 50,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
     0,  0,  0,  5,  5,  0,  0,  0,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     5, 10, 10, 10, 10, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -10,  5,  5,  5,  5,  5,  0,-10,
      0,  0,  5,  5,  5,  5,  0, -5,
     -5,  0,  5,  5,  5,  5,  0, -5,
    -10,  0,  5,  5,  5,  5,  0,-10,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_PST: [i32; 64] = [
     20, 30, 10,  0,  0, 10, 30, 20,
     20, 20,  0,  0,  0,  0, 20, 20,
    -10,-20,-20,-20,-20,-20,-20,-10,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
];

#[inline]
fn pst(kind: Piece, color: Color, sq64: usize) -> i32 {
    // PSTs above are written rank-8-down-to-rank-1 (White's view from
    // the top), so White reads them mirrored vertically; Black reads
    // them directly.
    let idx = if color == WHITE { sq64 ^ 56 } else { sq64 };
    let table: &[i32; 64] = match kind {
        PAWN => &PAWN_PST,
        KNIGHT => &KNIGHT_PST,
        BISHOP => &BISHOP_PST,
        ROOK => &ROOK_PST,
        QUEEN => &QUEEN_PST,
        KING => &KING_PST,
        _ => unreachable!(),
    };
    table[idx]
}

const CENTRAL_SQUARES: [(File, Rank); 4] =
    [(FILE_D, RANK_4), (FILE_E, RANK_4), (FILE_D, RANK_5), (FILE_E, RANK_5)];

/// Evaluates `pos` from White's perspective. Does not include the
/// search-time hanging-piece adjustment; see `evaluate_for_search`.
pub fn evaluate(pos: &Position) -> Value {
    let board = pos.board();
    let mut score: Value = 0;

    let mut minor_count = [0i32; 2];
    let mut major_minor_count = [0i32; 2];
    let mut bishops = [0i32; 2];
    let mut developed_minors = [0i32; 2];
    let mut queen_home = [true; 2];
    let mut traded_pieces = [0i32; 2];

    for sq in 0..BOARD_SIZE as Square {
        if !is_interior(sq) {
            continue;
        }
        let piece = board[sq as usize];
        if piece == EMPTY {
            continue;
        }
        let color = color_of(piece);
        let kind = kind_of(piece);
        let sign: Value = if color == WHITE { 1 } else { -1 };

        score += sign * piece_value(kind);
        score += sign * pst(kind, color, sq64(sq)) as Value;

        match kind {
            BISHOP => bishops[color] += 1,
            KNIGHT | QUEEN | ROOK => {}
            _ => {}
        }
        if kind == KNIGHT || kind == BISHOP {
            minor_count[color] += 1;
            let home_rank = if color == WHITE { RANK_1 } else { RANK_8 };
            if rank_of(sq) != home_rank {
                developed_minors[color] += 1;
            }
        }
        if matches!(kind, KNIGHT | BISHOP | ROOK | QUEEN) {
            major_minor_count[color] += 1;
        }
        if kind == QUEEN {
            let home_sq = square(FILE_D, if color == WHITE { RANK_1 } else { RANK_8 });
            if sq != home_sq {
                queen_home[color] = false;
            }
        }
    }

    // Development: +60 per developed minor piece off its home square.
    score += 60 * (developed_minors[WHITE] - developed_minors[BLACK]);

    // Bishop pair: +150 per side holding both bishops.
    if bishops[WHITE] >= 2 {
        score += 150;
    }
    if bishops[BLACK] >= 2 {
        score -= 150;
    }

    // Piece-count bonus: +25 per minor/major piece on board, per side.
    score += 25 * (major_minor_count[WHITE] - major_minor_count[BLACK]);

    // Starting count of minors+majors (not counting king/pawns) is 7
    // per side (2N+2B+2R+1Q); pieces missing from that count are
    // "traded", feeding the anti-trade bonus below.
    traded_pieces[WHITE] = 7 - major_minor_count[WHITE];
    traded_pieces[BLACK] = 7 - major_minor_count[BLACK];

    for &color in &[WHITE, BLACK] {
        let sign: Value = if color == WHITE { 1 } else { -1 };
        let king_sq = pos.king_square(color);
        let them = opposite(color);

        // King attackers: -30 per enemy piece attacking the 8-ring
        // and knight-jumps around own king.
        let mut attackers = 0;
        for offset in king_ring_offsets() {
            let idx = king_sq as i32 + offset;
            if idx < 0 || idx >= BOARD_SIZE as i32 {
                continue;
            }
            if is_square_attacked(board, idx as Square, them) {
                attackers += 1;
            }
        }
        score -= sign * 30 * attackers;

        // Pawn shield: -150 if f-pawn missing with king on e/g file,
        // additional -80 if g-pawn also missing with a castled king.
        let king_file = file_of(king_sq);
        let home_rank = if color == WHITE { RANK_1 } else { RANK_8 };
        let pawn_rank = if color == WHITE { RANK_2 } else { RANK_7 };
        if rank_of(king_sq) == home_rank && (king_file == FILE_E || king_file == FILE_G) {
            let f_pawn = board[square(FILE_F, pawn_rank) as usize];
            let g_pawn = board[square(FILE_G, pawn_rank) as usize];
            let has_f = f_pawn == piece_of(PAWN, color);
            let has_g = g_pawn == piece_of(PAWN, color);
            if !has_f {
                score -= sign * 150;
                if king_file == FILE_G && !has_g {
                    score -= sign * 80;
                }
            }
        }

        // Castling rights / castled king / bad king square.
        let castling = pos.castling();
        if rank_of(king_sq) == home_rank && king_file == FILE_E {
            if castling.kingside(color) {
                score += sign * 40;
            }
            if castling.queenside(color) {
                score += sign * 20;
            }
        } else if king_file == FILE_G && rank_of(king_sq) == home_rank {
            score += sign * 150;
        } else if king_file == FILE_C && rank_of(king_sq) == home_rank {
            score += sign * 120;
        } else if king_file == FILE_F {
            score -= sign * 200;
        } else if rank_of(king_sq) != home_rank || (king_file != FILE_E) {
            score -= sign * 120;
        }

        // Lost castling penalties, scaled by how many minors have
        // developed (losing the right to castle hurts more the
        // longer the king has been exposed by its own development).
        if !castling.any_for(color) && king_file == FILE_E && rank_of(king_sq) == home_rank {
            score -= sign * 10 * developed_minors[color];
        }
    }

    // Center control: +15 per unit; central pawn = 2, piece = 1.
    for &(file, rank) in &CENTRAL_SQUARES {
        let piece = board[square(file, rank) as usize];
        if piece == EMPTY {
            continue;
        }
        let color = color_of(piece);
        let sign: Value = if color == WHITE { 1 } else { -1 };
        let units = if kind_of(piece) == PAWN { 2 } else { 1 };
        score += sign * 15 * units;
    }

    // Early queen: -50 if queen off home while >= 2 minors undeveloped.
    for &color in &[WHITE, BLACK] {
        let sign: Value = if color == WHITE { 1 } else { -1 };
        if !queen_home[color] && minor_count[color] - developed_minors[color] >= 2 {
            score -= sign * 50;
        }
    }

    // Anti-trade: +40 per piece already traded while >= 2 of the
    // side's own minors remain undeveloped.
    for &color in &[WHITE, BLACK] {
        let sign: Value = if color == WHITE { 1 } else { -1 };
        if minor_count[color] - developed_minors[color] >= 2 {
            score += sign * 40 * traded_pieces[opposite(color)];
        }
    }

    score
}

fn king_ring_offsets() -> [i32; 16] {
    [-11, -10, -9, -1, 1, 9, 10, 11, -21, -19, -12, -8, 8, 12, 19, 21]
}

/// Returns `true` if the piece on `sq` (belonging to `color`) is
/// "hanging": attacked and not adequately defended, *or* reachable by
/// an enemy pawn that can advance one or two squares and then capture
/// it within the same turn -- the signature Double-Move tactic.
fn is_hanging(pos: &Position, sq: Square, color: Color) -> bool {
    let them = opposite(color);
    let board = pos.board();
    if is_square_attacked(board, sq, them) && !is_square_attacked(board, sq, color) {
        return true;
    }
    // Advance-then-capture: an enemy pawn one or two squares short of
    // a diagonal attack on `sq`. `final_idx` is the square the pawn
    // would occupy right before the diagonal capture; `push_len` is
    // how many squares it must advance (1 or 2) to reach it.
    let forward: i32 = if them == WHITE { 10 } else { -10 };
    let start_rank = if them == WHITE { RANK_2 } else { RANK_7 };
    for &side in &[-1i32, 1i32] {
        let final_idx = sq as i32 - forward - side;
        for push_len in 1..=2i32 {
            let pawn_idx = final_idx - forward * push_len;
            if pawn_idx < 0 || pawn_idx >= BOARD_SIZE as i32 {
                continue;
            }
            let pawn_sq = pawn_idx as Square;
            if !is_interior(pawn_sq) {
                continue;
            }
            if board[pawn_sq as usize] != piece_of(PAWN, them) {
                continue;
            }
            if push_len == 2 && rank_of(pawn_sq) != start_rank {
                continue;
            }
            // The push path (1 or 2 squares ahead of the pawn,
            // including the square it would capture from) must be
            // clear.
            let mut path_clear = true;
            for step in 1..=push_len {
                let mid_idx = pawn_idx + forward * step;
                if mid_idx < 0 || mid_idx >= BOARD_SIZE as i32 {
                    path_clear = false;
                    break;
                }
                if board[mid_idx as usize] != EMPTY {
                    path_clear = false;
                    break;
                }
            }
            if path_clear {
                return true;
            }
        }
    }
    false
}

/// Wraps `evaluate` with the hanging-piece adjustment used during
/// search: subtracts 80% of the value of the side's own hanging
/// pieces, adds the symmetric value of the opponent's hangers.
pub fn evaluate_for_search(pos: &Position, color: Color) -> Value {
    let base = evaluate(pos);
    let base = if color == WHITE { base } else { -base };

    let board = pos.board();
    let mut adjustment: Value = 0;
    for sq in 0..BOARD_SIZE as Square {
        if !is_interior(sq) {
            continue;
        }
        let piece = board[sq as usize];
        if piece == EMPTY || kind_of(piece) == KING {
            continue;
        }
        let piece_color = color_of(piece);
        if is_hanging(pos, sq, piece_color) {
            let v = (piece_value(kind_of(piece)) * 4) / 5; // 80%
            if piece_color == color {
                adjustment -= v;
            } else {
                adjustment += v;
            }
        }
    }
    let score = base + adjustment;

    let plies_to_fifty = 100u32.saturating_sub(pos.halfmove_clock());
    let draw_weight = if plies_to_fifty <= 5 {
        70
    } else if plies_to_fifty <= 10 {
        40
    } else if plies_to_fifty <= 20 {
        20
    } else {
        0
    };
    if draw_weight == 0 {
        score
    } else {
        let draw = contempt_draw_score(evaluate(pos), color);
        (score * (100 - draw_weight) + draw * draw_weight) / 100
    }
}

/// Contempt-adjusted draw score, from the perspective of `color`,
/// given the material evaluation of the position (White's
/// perspective, before the `color` flip).
pub fn contempt_draw_score(material_eval_white: Value, color: Color) -> Value {
    let score = if material_eval_white > 150 {
        -(50 + (material_eval_white / 10).min(200))
    } else if material_eval_white < -150 {
        50 + (-material_eval_white / 10).min(200)
    } else {
        -25
    };
    if color == WHITE {
        score
    } else {
        -score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notation::START_POSITION_FEN;

    #[test]
    fn initial_position_is_balanced() {
        let pos = Position::from_fen(START_POSITION_FEN).unwrap();
        assert_eq!(evaluate(&pos), 0);
    }

    #[test]
    fn extra_knight_is_worth_roughly_a_knight() {
        let base = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let with_knight = Position::from_fen("4k3/8/8/8/8/8/3N4/4K3 w - - 0 1").unwrap();
        let diff = evaluate(&with_knight) - evaluate(&base);
        assert!(diff > 250 && diff < 400, "diff was {}", diff);
    }

    #[test]
    fn bishop_pair_bonus_applies() {
        let one_bishop = Position::from_fen("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1").unwrap();
        let two_bishops = Position::from_fen("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1").unwrap();
        let diff = evaluate(&two_bishops) - evaluate(&one_bishop) - BISHOP_VALUE as Value;
        assert_eq!(diff, 150);
    }

    #[test]
    fn hanging_piece_is_flagged() {
        // White rook on d1 attacks straight up the open d-file onto
        // the black knight on d4: a direct (non-advance) hang.
        let pos = Position::from_fen("4k3/8/8/8/3n4/8/8/3RK3 w - - 0 1").unwrap();
        assert!(is_hanging(&pos, square(FILE_D, RANK_4), BLACK));
    }

    #[test]
    fn single_push_then_capture_flags_as_hanging() {
        // White pawn on c3 does not attack d5 directly, but a c3-c4
        // push followed by c4xd5 captures the knight within one turn.
        let pos = Position::from_fen("4k3/8/8/3n4/8/2P5/8/4K3 w - - 0 1").unwrap();
        assert!(is_hanging(&pos, square(FILE_D, RANK_5), BLACK));
    }

    #[test]
    fn double_push_then_capture_flags_as_hanging() {
        // White pawn on c2 does not attack d5 directly, but a double
        // push c2-c4 followed by c4xd5 captures the knight within one
        // turn. Requires both c3 and c4 to be empty.
        let pos = Position::from_fen("4k3/8/8/3n4/8/8/2P5/4K3 w - - 0 1").unwrap();
        assert!(is_hanging(&pos, square(FILE_D, RANK_5), BLACK));
    }

    #[test]
    fn single_push_blocked_path_is_not_hanging() {
        // Same as the single-push case, but a knight (which does not
        // itself attack d5) occupies c4, so the c3 pawn cannot
        // actually advance there.
        let pos = Position::from_fen("4k3/8/8/3n4/2N5/2P5/8/4K3 w - - 0 1").unwrap();
        assert!(!is_hanging(&pos, square(FILE_D, RANK_5), BLACK));
    }

    #[test]
    fn contempt_favors_draw_when_behind() {
        let behind = contempt_draw_score(-300, BLACK);
        let ahead = contempt_draw_score(-300, WHITE);
        assert!(behind > 0);
        assert!(ahead < 0);
    }

    #[test]
    fn near_fifty_move_boundary_blends_toward_draw_score() {
        // White is up a whole rook; at halfmove clock 0 the search-time
        // score should track the large material lead closely. One ply
        // from the fifty-move draw (clock 99) it must blend hard toward
        // the (here, contempt-negative-for-White) draw score instead.
        let fresh = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let stale = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 1").unwrap();
        let fresh_score = evaluate_for_search(&fresh, WHITE);
        let stale_score = evaluate_for_search(&stale, WHITE);
        assert!(stale_score < fresh_score);
    }
}
