//! Turn-level negamax search with alpha-beta pruning, a transposition
//! table, contempt-aware draw scoring, and the ordering heuristics
//! described alongside `turn::generate_turns`.
//!
//! A "ply" here is one full turn (one or two moves), not one move; the
//! recursion always flips the side to move exactly once per node,
//! regardless of whether the turn it applied was one move or two.

use basetypes::*;
use board;
use board::Position;
use chess_move::{Move, Turn, CASTLE};
use evaluator;
use evaluator::{contempt_draw_score, evaluate, evaluate_for_search};
use tt::{self, Bound, TranspositionTable};
use turn::generate_turns;
use value::{Value, CHECKMATE};

const CAPTURE_BASE: Value = 1000;
const BISHOP_PAIR_CAPTURE_BONUS: Value = 1500;
const PROMOTION_BASE: Value = 800;
const CASTLE_BONUS: Value = 8000;
const KING_MOVE_WITH_RIGHTS_PENALTY: Value = -10000;
const KING_MOVE_WITHOUT_RIGHTS_PENALTY: Value = -3000;
const ROOK_VACATES_KINGSIDE_PENALTY: Value = -1000;
const ROOK_VACATES_QUEENSIDE_PENALTY: Value = -500;
const SINGLE_MOVE_TURN_BONUS: Value = 500;

/// Outcome of a finished search, used by the request dispatcher to
/// build the response.
pub struct SearchResult {
    pub best_turn: Option<Turn>,
    pub score: Value,
    pub nodes: u64,
}

/// Runs a fixed-depth search from `pos` for `max_moves` (1 or 2) moves
/// per turn, returning the best turn found and its score from the
/// side-to-move's perspective.
pub fn find_best_turn(pos: &Position, depth: u32, max_moves: u32, tt: &mut TranspositionTable) -> SearchResult {
    tt.new_search();
    let mut nodes = 0u64;
    let color = pos.side_to_move();
    let mut scratch = pos.clone();

    let turns = generate_turns(&scratch, max_moves);
    if turns.is_empty() {
        return SearchResult { best_turn: None, score: terminal_score(&scratch, color, 0), nodes: 1 };
    }

    let mut scored: Vec<(Turn, Value, Value)> = Vec::with_capacity(turns.len());
    for turn in turns {
        let undo = apply_turn(&mut scratch, turn);
        let child = search_turn(&mut scratch, depth.saturating_sub(1), -CHECKMATE - 1, CHECKMATE + 1, opposite(color), 1, tt, &mut nodes);
        let score = -child;
        let quiet = quiet_score(pos, turn, color);
        undo_turn(&mut scratch, turn, undo);
        scored.push((turn, score, quiet));
    }

    scored.sort_by(|a, b| (b.1, b.2).cmp(&(a.1, a.2)));
    let best = scored[0];
    SearchResult { best_turn: Some(best.0), score: best.1, nodes }
}

/// Negamax over turns. Returns the score from `color`'s perspective.
fn search_turn(
    pos: &mut Position,
    depth: u32,
    mut alpha: Value,
    beta: Value,
    color: Color,
    ply: u32,
    tt: &mut TranspositionTable,
    nodes: &mut u64,
) -> Value {
    *nodes += 1;

    if pos.is_fifty_move_draw() || pos.is_threefold_repetition() {
        return contempt_draw_score(evaluate(pos), color);
    }

    if depth == 0 {
        return evaluate_for_search(pos, color);
    }

    let original_alpha = alpha;
    let key = pos.hash();
    if let tt::Probe::Hit(score) = tt.probe(key, depth, alpha, beta) {
        return score;
    }

    let turns = generate_turns(pos, 2);
    if turns.is_empty() {
        return if pos.is_in_check(color) {
            -CHECKMATE + ply as Value
        } else {
            contempt_draw_score(evaluate(pos), color)
        };
    }

    let mut ordered: Vec<(Turn, Value)> = turns
        .into_iter()
        .map(|t| {
            let s = score_turn(pos, t);
            (t, s)
        })
        .collect();
    ordered.sort_by_key(|&(_, s)| std::cmp::Reverse(s));

    let mut best = -CHECKMATE - 1;
    for (turn, _) in ordered {
        let undo = apply_turn(pos, turn);
        let repetitions = pos.occurrences_of_current();
        let child_score = if repetitions >= 3 {
            -contempt_draw_score(evaluate(pos), opposite(color))
        } else if repetitions == 2 {
            // The opponent, to move next, can return to this position a
            // third time and force the draw. Don't credit `color` with
            // more than that opponent would tolerate: clamp the raw
            // recursive score toward the draw value.
            let raw = -search_turn(pos, depth - 1, -beta, -alpha, opposite(color), ply + 1, tt, nodes);
            let draw = -contempt_draw_score(evaluate(pos), opposite(color));
            raw.min(draw)
        } else {
            -search_turn(pos, depth - 1, -beta, -alpha, opposite(color), ply + 1, tt, nodes)
        };
        undo_turn(pos, turn, undo);

        if child_score > best {
            best = child_score;
        }
        if best > alpha {
            alpha = best;
        }
        if alpha >= beta {
            break;
        }
    }

    let bound = if best <= original_alpha {
        Bound::Upper
    } else if best >= beta {
        Bound::Lower
    } else {
        Bound::Exact
    };
    tt.store(key, depth, best, bound);

    best
}

fn terminal_score(pos: &Position, color: Color, ply: u32) -> Value {
    if pos.is_in_check(color) {
        -CHECKMATE + ply as Value
    } else {
        contempt_draw_score(evaluate(pos), color)
    }
}

struct TurnUndo {
    first: board::UndoInfo,
    // The same side plays both moves of a turn, so between them the
    // engine must flip `side_to_move` back and clear the first move's
    // en-passant target (see `Position::flip_for_second_move`). `None`
    // for single-move turns, which really do hand the move to the
    // opponent next.
    second: Option<(board::TurnFlip, Move, board::UndoInfo)>,
}

fn apply_turn(pos: &mut Position, turn: Turn) -> TurnUndo {
    let first = pos.make_move(turn.first());
    let second = turn.second().map(|m| {
        let flip = pos.flip_for_second_move();
        let undo = pos.make_move(m);
        (flip, m, undo)
    });
    TurnUndo { first, second }
}

fn undo_turn(pos: &mut Position, turn: Turn, undo: TurnUndo) {
    if let Some((flip, mv, second_undo)) = undo.second {
        pos.undo_move(mv, second_undo);
        pos.unflip_for_second_move(flip);
    }
    pos.undo_move(turn.first(), undo.first);
}

/// Orders a turn already applied to the board's perspective before the
/// turn started (i.e. before `apply_turn`), using the static move
/// properties -- capture value, promotion, castling, king-safety.
fn score_turn(pos: &Position, turn: Turn) -> Value {
    let mut score = 0;
    score += score_move(pos, turn.first());
    if let Some(second) = turn.second() {
        let mut scratch = pos.clone();
        let undo = scratch.make_move(turn.first());
        score += score_move(&scratch, second);
        scratch.undo_move(turn.first(), undo);
    } else if !turn.first().is_castle() {
        score += SINGLE_MOVE_TURN_BONUS;
    }
    score
}

fn score_move(pos: &Position, mv: Move) -> Value {
    let mut score = 0;
    let moved = pos.piece_at(mv.from());
    let kind = kind_of(moved);
    let color = color_of(moved);

    if mv.is_capture() {
        let victim_value = evaluator::piece_value(mv.captured());
        score += CAPTURE_BASE + 10 * victim_value;
        if kind_of(mv.captured()) == BISHOP && opponent_has_bishop_pair(pos, opposite(color)) {
            score += BISHOP_PAIR_CAPTURE_BONUS;
        }
    }
    if mv.is_promotion() {
        score += PROMOTION_BASE + evaluator::piece_value(mv.promotion());
    }
    if mv.flag() == CASTLE {
        score += CASTLE_BONUS;
    } else if kind == KING {
        if pos.castling().any_for(color) {
            score += KING_MOVE_WITH_RIGHTS_PENALTY;
        } else {
            score += KING_MOVE_WITHOUT_RIGHTS_PENALTY;
        }
    } else if kind == ROOK {
        let home_rank = if color == WHITE { RANK_1 } else { RANK_8 };
        if rank_of(mv.from()) == home_rank {
            if file_of(mv.from()) == FILE_H && pos.castling().kingside(color) {
                score += ROOK_VACATES_KINGSIDE_PENALTY;
            } else if file_of(mv.from()) == FILE_A && pos.castling().queenside(color) {
                score += ROOK_VACATES_QUEENSIDE_PENALTY;
            }
        }
    }
    score
}

fn opponent_has_bishop_pair(pos: &Position, color: Color) -> bool {
    let board = pos.board();
    let mut count = 0;
    for sq in 0..BOARD_SIZE as Square {
        if is_interior(sq) && board[sq as usize] == piece_of(BISHOP, color) {
            count += 1;
        }
    }
    count >= 2
}

/// The root-only quiet-score tiebreaker: rewards development and
/// central pawn pushes and castling, penalizes early captures, edge
/// moves, king moves, and retreats to the back rank.
fn quiet_score(pos: &Position, turn: Turn, color: Color) -> Value {
    let mut score = 0;
    let mut scratch = pos.clone();
    let moves = turn.moves();
    for (i, mv) in moves.iter().copied().enumerate() {
        if i > 0 {
            scratch.flip_for_second_move();
        }
        let moved = scratch.piece_at(mv.from());
        let kind = kind_of(moved);
        let home_rank = if color == WHITE { RANK_1 } else { RANK_8 };

        if mv.flag() == CASTLE {
            score += 100;
        } else {
            if mv.is_capture() {
                score -= 20;
            }
            if file_of(mv.to()) == FILE_A || file_of(mv.to()) == FILE_H {
                score -= 10;
            }
            if (kind == KNIGHT || kind == BISHOP) && rank_of(mv.from()) == home_rank {
                score += 15;
            }
            if kind == PAWN {
                let to_file = file_of(mv.to());
                if to_file == FILE_D || to_file == FILE_E {
                    score += 10;
                }
            }
            if kind == KING {
                score -= 40;
            }
            if rank_of(mv.to()) == home_rank && kind != KING {
                score -= 5;
            }
        }
        scratch.make_move(mv);
    }
    score
}
