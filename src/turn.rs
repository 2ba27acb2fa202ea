//! Turn generation: enumerates legal *turns* (one or two consecutive
//! moves by the same side) with the pruning tiers that keep
//! second-move expansion affordable.
//!
//! The double move is what makes this engine's search different from
//! an ordinary chess engine's: the branching factor at a turn is not
//! "number of legal moves" but "number of legal moves, times the
//! number of legal replies available after each one". Fully expanding
//! every first move would be far too slow, so only the first-move
//! candidates that look most promising get the full second-move
//! treatment; the rest fall back to cheaper tiers.

use basetypes::*;
use board::Position;
use chess_move::{self, Move, Turn};
use move_generation::{generate_legal, generate_legal_tactical};
use see::see;

const FULL_EXPANSION_CUTOFF: usize = 15;
const TACTICAL_ONLY_CUTOFF: usize = 25;

/// Generates every turn available to the side to move, applying the
/// tiered pruning described above. `pos` is left unchanged.
pub fn generate_turns(pos: &Position, max_moves: u32) -> Vec<Turn> {
    if max_moves <= 1 {
        let mut firsts = Vec::new();
        generate_legal(pos, &mut firsts);
        return firsts.into_iter().map(Turn::one).collect();
    }

    let mut firsts = Vec::new();
    generate_legal(pos, &mut firsts);
    firsts.sort_by_key(|&m| std::cmp::Reverse(score_first_move(pos, m)));

    let mut turns = Vec::with_capacity(firsts.len() * 4);
    let mut scratch = pos.clone();

    for (index, mv) in firsts.into_iter().enumerate() {
        let undo = scratch.make_move(mv);
        let gives_check = scratch.is_in_check(scratch.side_to_move());

        if gives_check {
            turns.push(Turn::one(mv));
        } else if index < FULL_EXPANSION_CUTOFF {
            let flip = scratch.flip_for_second_move();
            let mut seconds = Vec::new();
            generate_legal(&scratch, &mut seconds);
            scratch.unflip_for_second_move(flip);
            if seconds.is_empty() {
                // The first move stalemated the opponent (checkmate
                // would have been caught by `gives_check` above): the
                // turn ends here, per the variant's early-termination
                // rule.
                turns.push(Turn::one(mv));
            } else {
                for second in seconds {
                    turns.push(Turn::two(mv, second));
                }
            }
        } else if index < TACTICAL_ONLY_CUTOFF {
            let flip = scratch.flip_for_second_move();
            let mut seconds = Vec::new();
            generate_legal_tactical(&scratch, &mut seconds);
            scratch.unflip_for_second_move(flip);
            if seconds.is_empty() {
                turns.push(Turn::one(mv));
            } else {
                for second in seconds {
                    turns.push(Turn::two(mv, second));
                }
            }
        } else {
            turns.push(Turn::one(mv));
        }

        scratch.undo_move(mv, undo);
    }

    turns
}

/// Scores a first move for tier-selection purposes only (higher moves
/// first into the full-expansion tier). Not used for search ordering
/// directly -- see `turn::score_turn` for that.
fn score_first_move(pos: &Position, mv: Move) -> i32 {
    let mut score = 0i32;

    if mv.is_capture() {
        let gain = see(pos, mv);
        score += 500 + gain;
    }
    if mv.is_promotion() {
        score += 400;
    }

    let to_file = file_of(mv.to());
    let to_rank = rank_of(mv.to());
    if (to_file == FILE_D || to_file == FILE_E) && (to_rank == RANK_4 || to_rank == RANK_5) {
        score += 30;
    }

    let moved = pos.piece_at(mv.from());
    let kind = kind_of(moved);
    let color = color_of(moved);
    let home_rank = if color == WHITE { RANK_1 } else { RANK_8 };
    if (kind == KNIGHT || kind == BISHOP) && rank_of(mv.from()) == home_rank {
        score += 50;
    }

    if kind == KING && mv.is_castle() {
        score += 300;
    } else if kind == KING && pos.castling().any_for(color) {
        score -= 1000;
    }

    score += enable_capture_bonus(pos, mv);

    score
}

/// Bonuses a first move if, after playing it, the moved piece (or a
/// pawn it just advanced past its start square) threatens a capture
/// on the opponent's weakest defended piece next move -- the
/// "set up the second move" heuristic that is the heart of good
/// double-move play.
fn enable_capture_bonus(pos: &Position, mv: Move) -> i32 {
    let mut scratch = pos.clone();
    let undo = scratch.make_move(mv);
    let mut bonus = 0i32;

    let flip = scratch.flip_for_second_move();
    let mut tactical = Vec::new();
    generate_legal_tactical(&scratch, &mut tactical);
    for cap in &tactical {
        if cap.from() == mv.to() {
            let gain = see(&scratch, *cap);
            if gain > 0 {
                bonus = bonus.max(60 + gain / 10);
            }
        }
    }
    scratch.unflip_for_second_move(flip);

    scratch.undo_move(mv, undo);
    bonus
}
