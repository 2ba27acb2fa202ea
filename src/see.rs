//! Static Exchange Evaluation: simulates the full recapture sequence
//! on one square, using least-valuable-attacker order, and returns the
//! material balance for the side that initiates the exchange.
//!
//! The mailbox analogue of the bitboard x-ray trick is to simply
//! recompute attackers of the target square against a mutated copy of
//! the board after every simulated capture -- a vacated square is
//! automatically visible to sliders behind it, so x-rays fall out for
//! free at the cost of a few extra square scans (not on the hot search
//! path).

use attacks::attackers_of;
use basetypes::*;
use board::Position;
use chess_move::Move;

const PIECE_VALUE: [i32; 7] = [0, 80, 320, 330, 500, 900, 20000];

#[inline]
fn value_of(kind: Piece) -> i32 {
    PIECE_VALUE[kind as usize]
}

/// Evaluates the capture sequence started by `mv` and returns the
/// material gain for the side making `mv`, assuming best play by both
/// sides restricted to captures on `mv.to()`.
pub fn see(pos: &Position, mv: Move) -> i32 {
    let target_sq = mv.to();
    let mut occ = *pos.board();

    let initial_captured = if mv.is_en_passant() {
        PAWN
    } else {
        mv.captured()
    };

    let mut attacking_color = pos.side_to_move();
    // A promoting capture places the promoted piece on `target_sq`, not
    // the pawn that made the move -- both the scratch-board occupancy
    // below and the first gain-array entry must value it that way.
    let mut attacking_piece = if mv.is_promotion() { mv.promotion() } else { kind_of(pos.piece_at(mv.from())) };
    let mut from_sq = mv.from();

    // Apply the first move on the scratch board so subsequent attacker
    // scans see the right occupancy.
    occ[from_sq as usize] = EMPTY;
    if mv.is_en_passant() {
        let captured_sq = square(file_of(target_sq), rank_of(from_sq));
        occ[captured_sq as usize] = EMPTY;
    }
    occ[target_sq as usize] = piece_of(attacking_piece, attacking_color);

    let mut gain = [0i32; 34];
    let mut depth = 0usize;
    gain[0] = value_of(initial_captured);

    loop {
        attacking_color = opposite(attacking_color);
        let attackers = attackers_of(&occ, target_sq, attacking_color);
        let next = attackers
            .into_iter()
            .min_by_key(|&sq| value_of(kind_of(occ[sq as usize])));
        let (next_sq, next_piece) = match next {
            Some(sq) => (sq, kind_of(occ[sq as usize])),
            None => break,
        };

        depth += 1;
        gain[depth] = value_of(attacking_piece) - gain[depth - 1];
        if std::cmp::max(-gain[depth - 1], gain[depth]) < 0 {
            break;
        }

        occ[from_sq as usize] = EMPTY; // no-op after the first ply, harmless
        occ[next_sq as usize] = EMPTY;
        occ[target_sq as usize] = piece_of(next_piece, attacking_color);
        from_sq = next_sq;
        attacking_piece = next_piece;
    }

    while depth > 0 {
        gain[depth - 1] = -std::cmp::max(-gain[depth - 1], gain[depth]);
        depth -= 1;
    }
    gain[0]
}
