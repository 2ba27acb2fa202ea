//! The error taxonomy, wire-format request/response types, and the
//! `Dispatcher` that wires FEN parsing, search, and SAN rendering into
//! the single `find_best_turn` entry point a host process calls.

use basetypes::*;
use board::Position;
use chess_move;
use chess_move::Move;
use log::{error, info};
use move_generation::generate_legal;
use search;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic;
use tt::TranspositionTable;

/// Depth (in turns, not half-moves) searched for each skill level,
/// indexed `skill - 1`. Spec.md leaves the exact numbers to the
/// caller's UX; these are documented defaults, not a contractual
/// guarantee.
pub const SKILL_DEPTH: [u32; 3] = [3, 5, 7];

const DEFAULT_TT_CAPACITY: usize = 1 << 20;

/// Every way a request to this engine can fail, short of a genuine
/// internal bug (`InvariantViolation`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The FEN string could not be parsed or described an impossible
    /// position (wrong king count, side not to move in check, ...).
    BadFen(String),
    /// `max_moves` was not `1` or `2`.
    BadMaxMoves(u8),
    /// `skill` was outside `1..=3`.
    BadSkill(u8),
    /// The position has no legal first move for the side to move.
    NoLegalMoves,
    /// An internal consistency check failed. `debug_assert!`s across
    /// make/undo and hashing are expected to catch the underlying bug
    /// in debug builds well before this is ever observed; in release
    /// builds `Dispatcher::dispatch` catches the resulting panic at the
    /// boundary and reports this instead of letting it unwind into the
    /// caller.
    InvariantViolation(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::BadFen(fen) => write!(f, "invalid FEN: {}", fen),
            EngineError::BadMaxMoves(n) => write!(f, "max_moves must be 1 or 2, got {}", n),
            EngineError::BadSkill(n) => write!(f, "skill must be 1, 2, or 3, got {}", n),
            EngineError::NoLegalMoves => write!(f, "no legal moves"),
            EngineError::InvariantViolation(msg) => write!(f, "internal invariant violation: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug, Clone, Deserialize)]
pub struct FindBestTurnRequest {
    pub kind: String,
    pub fen: String,
    pub skill: u8,
    pub max_moves: u8,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveDescription {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    pub san: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Response {
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "best_turn")]
    BestTurn { request_id: String, moves: Vec<MoveDescription> },
    #[serde(rename = "error")]
    Error { request_id: String, message: String },
}

/// Terminal classification of a position, for callers that want to
/// know why a turn search came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Checkmate,
    Stalemate,
    FiftyMove,
    Repetition,
    None,
}

pub fn game_result(pos: &Position) -> GameResult {
    let mut moves = Vec::new();
    generate_legal(pos, &mut moves);
    if moves.is_empty() {
        return if pos.is_in_check(pos.side_to_move()) {
            GameResult::Checkmate
        } else {
            GameResult::Stalemate
        };
    }
    if pos.is_fifty_move_draw() {
        return GameResult::FiftyMove;
    }
    if pos.is_threefold_repetition() {
        return GameResult::Repetition;
    }
    GameResult::None
}

/// Holds state that should persist across requests within one process:
/// the transposition table. Position repetition history is seeded only
/// from the request's own FEN (per request), never from a prior
/// dispatch, so one dispatcher instance can safely serve unrelated
/// positions without leaking repetition counts between them.
pub struct Dispatcher {
    tt: TranspositionTable,
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher { tt: TranspositionTable::with_capacity(DEFAULT_TT_CAPACITY) }
    }

    /// Clears the transposition table, for callers that want a clean
    /// slate between unrelated games.
    pub fn new_game(&mut self) {
        self.tt.clear();
    }

    /// Parses one raw wire message and dispatches it. `"init"` needs no
    /// other fields and always yields `{kind: "ready"}"`; every other
    /// recognized `kind` is deserialized into its own request shape and
    /// routed accordingly. Malformed JSON or an unrecognized `kind`
    /// yields a generic `Response::Error` with no `request_id` to echo.
    pub fn dispatch_message(&mut self, raw: &str) -> Response {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                return Response::Error { request_id: String::new(), message: format!("malformed request: {}", err) }
            }
        };
        match value.get("kind").and_then(|k| k.as_str()) {
            Some("init") => Response::Ready,
            Some("find_best_turn") => match serde_json::from_value::<FindBestTurnRequest>(value) {
                Ok(request) => self.dispatch(&request),
                Err(err) => {
                    Response::Error { request_id: String::new(), message: format!("malformed request: {}", err) }
                }
            },
            _ => Response::Error {
                request_id: String::new(),
                message: "unrecognized request kind".to_string(),
            },
        }
    }

    pub fn dispatch(&mut self, request: &FindBestTurnRequest) -> Response {
        info!("dispatch: request_id={} skill={} max_moves={}", request.request_id, request.skill, request.max_moves);
        // A genuine internal bug (corrupted make/undo bookkeeping, a
        // `debug_assert!` that only fires in debug builds, an
        // out-of-bounds index on state that should never be reachable)
        // must not unwind past this boundary and crash the host
        // process -- catch it here and fold it into the same
        // `InvariantViolation` path a caller-visible check would use.
        let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| self.handle(request)));
        let result = match outcome {
            Ok(result) => result,
            Err(payload) => Err(EngineError::InvariantViolation(panic_message(&payload))),
        };
        match result {
            Ok(moves) => Response::BestTurn { request_id: request.request_id.clone(), moves },
            Err(EngineError::InvariantViolation(msg)) => {
                error!("invariant violation while handling request_id={}: {}", request.request_id, msg);
                Response::Error {
                    request_id: request.request_id.clone(),
                    message: "internal error".to_string(),
                }
            }
            Err(err) => {
                info!("request_id={} rejected: {}", request.request_id, err);
                Response::Error { request_id: request.request_id.clone(), message: err.to_string() }
            }
        }
    }

    fn handle(&mut self, request: &FindBestTurnRequest) -> Result<Vec<MoveDescription>, EngineError> {
        if request.max_moves != 1 && request.max_moves != 2 {
            return Err(EngineError::BadMaxMoves(request.max_moves));
        }
        if request.skill < 1 || request.skill > 3 {
            return Err(EngineError::BadSkill(request.skill));
        }
        let pos = Position::from_fen(&request.fen)?;

        let mut legal = Vec::new();
        generate_legal(&pos, &mut legal);
        if legal.is_empty() {
            return Err(EngineError::NoLegalMoves);
        }

        let depth = SKILL_DEPTH[(request.skill - 1) as usize];
        let result = search::find_best_turn(&pos, depth, request.max_moves as u32, &mut self.tt);
        info!("request_id={} searched {} nodes, score={}", request.request_id, result.nodes, result.score);

        let turn = result.best_turn.ok_or(EngineError::NoLegalMoves)?;
        Ok(describe_turn(&pos, turn))
    }
}

impl Default for Dispatcher {
    fn default() -> Dispatcher {
        Dispatcher::new()
    }
}

/// Pulls a human-readable message out of a caught panic's payload.
/// `panic!`/`assert!`/`unwrap` payloads are almost always `&str` or
/// `String`; anything else reports a generic message rather than
/// failing to extract one.
fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn describe_turn(pos: &Position, turn: chess_move::Turn) -> Vec<MoveDescription> {
    let moves = turn.moves();
    let mut descriptions = Vec::with_capacity(moves.len());
    let mut scratch = pos.clone();
    for (i, mv) in moves.into_iter().enumerate() {
        if i > 0 {
            // The same side plays the turn's second move: undo the
            // ordinary side-to-move toggle the first `make_move` left
            // behind, and clear its now-irrelevant en-passant target,
            // before rendering or applying this move.
            scratch.flip_for_second_move();
        }
        let san = move_to_san(&scratch, mv);
        descriptions.push(MoveDescription {
            from: square_to_algebraic(mv.from()),
            to: square_to_algebraic(mv.to()),
            promotion: if mv.promotion() != EMPTY {
                Some(kind_to_promotion_letter(mv.promotion()).to_string())
            } else {
                None
            },
            san,
        });
        scratch.make_move(mv);
    }
    descriptions
}

/// Renders `mv`, played from `pos`, in Standard Algebraic Notation,
/// including disambiguation and check/checkmate suffixes.
fn move_to_san(pos: &Position, mv: Move) -> String {
    if mv.is_castle() {
        let base = if file_of(mv.to()) == FILE_G { "O-O" } else { "O-O-O" };
        return format!("{}{}", base, check_suffix(pos, mv));
    }

    let moved = pos.piece_at(mv.from());
    let kind = kind_of(moved);
    let mut san = String::new();

    if kind == PAWN {
        if mv.is_capture() {
            san.push(file_to_char(file_of(mv.from())));
            san.push('x');
        }
    } else {
        san.push(kind_to_upper_letter(kind));
        san.push_str(&disambiguation(pos, mv));
        if mv.is_capture() {
            san.push('x');
        }
    }

    san.push_str(&square_to_algebraic(mv.to()));

    if mv.is_promotion() {
        san.push('=');
        san.push(kind_to_promotion_letter(mv.promotion()).to_ascii_uppercase());
    }

    san.push_str(&check_suffix(pos, mv));
    san
}

fn kind_to_upper_letter(kind: Piece) -> char {
    match kind {
        KNIGHT => 'N',
        BISHOP => 'B',
        ROOK => 'R',
        QUEEN => 'Q',
        KING => 'K',
        _ => panic!("pawns have no SAN letter"),
    }
}

fn file_to_char(file: File) -> char {
    (b'a' + file as u8) as char
}

/// Returns a file, rank, or full-square disambiguation suffix if more
/// than one like piece could legally reach `mv.to()`.
fn disambiguation(pos: &Position, mv: Move) -> String {
    let moved = pos.piece_at(mv.from());
    let kind = kind_of(moved);
    let color = color_of(moved);

    let mut legal = Vec::new();
    generate_legal(pos, &mut legal);
    let rivals: Vec<Move> = legal
        .into_iter()
        .filter(|&m| {
            m.to() == mv.to()
                && m.from() != mv.from()
                && kind_of(pos.piece_at(m.from())) == kind
                && color_of(pos.piece_at(m.from())) == color
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    let same_file = rivals.iter().any(|m| file_of(m.from()) == file_of(mv.from()));
    let same_rank = rivals.iter().any(|m| rank_of(m.from()) == rank_of(mv.from()));
    if !same_file {
        file_to_char(file_of(mv.from())).to_string()
    } else if !same_rank {
        ((b'1' + rank_of(mv.from()) as u8) as char).to_string()
    } else {
        square_to_algebraic(mv.from())
    }
}

fn check_suffix(pos: &Position, mv: Move) -> String {
    let mut scratch = pos.clone();
    scratch.make_move(mv);
    let them = scratch.side_to_move();
    if !scratch.is_in_check(them) {
        return String::new();
    }
    let mut replies = Vec::new();
    generate_legal(&scratch, &mut replies);
    if replies.is_empty() {
        "#".to_string()
    } else {
        "+".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notation::START_POSITION_FEN;

    #[test]
    fn rejects_bad_max_moves() {
        let mut dispatcher = Dispatcher::new();
        let request = FindBestTurnRequest {
            kind: "find_best_turn".to_string(),
            fen: START_POSITION_FEN.to_string(),
            skill: 1,
            max_moves: 3,
            request_id: "r1".to_string(),
        };
        match dispatcher.dispatch(&request) {
            Response::Error { message, .. } => assert!(message.contains("max_moves")),
            other => panic!("expected an error response, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_skill() {
        let mut dispatcher = Dispatcher::new();
        let request = FindBestTurnRequest {
            kind: "find_best_turn".to_string(),
            fen: START_POSITION_FEN.to_string(),
            skill: 9,
            max_moves: 1,
            request_id: "r2".to_string(),
        };
        match dispatcher.dispatch(&request) {
            Response::Error { message, .. } => assert!(message.contains("skill")),
            other => panic!("expected an error response, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_fen() {
        let mut dispatcher = Dispatcher::new();
        let request = FindBestTurnRequest {
            kind: "find_best_turn".to_string(),
            fen: "garbage".to_string(),
            skill: 1,
            max_moves: 1,
            request_id: "r3".to_string(),
        };
        match dispatcher.dispatch(&request) {
            Response::Error { message, .. } => assert!(message.contains("FEN")),
            other => panic!("expected an error response, got {:?}", other),
        }
    }

    #[test]
    fn finds_a_best_turn_from_start_position() {
        let mut dispatcher = Dispatcher::new();
        let request = FindBestTurnRequest {
            kind: "find_best_turn".to_string(),
            fen: START_POSITION_FEN.to_string(),
            skill: 1,
            max_moves: 1,
            request_id: "r4".to_string(),
        };
        match dispatcher.dispatch(&request) {
            Response::BestTurn { moves, .. } => assert_eq!(moves.len(), 1),
            other => panic!("expected success, got: {:?}", other),
        }
    }

    #[test]
    fn init_message_yields_ready_with_no_request_id() {
        let mut dispatcher = Dispatcher::new();
        match dispatcher.dispatch_message(r#"{"kind":"init"}"#) {
            Response::Ready => {}
            other => panic!("expected ready, got: {:?}", other),
        }
    }

    #[test]
    fn unrecognized_kind_is_rejected() {
        let mut dispatcher = Dispatcher::new();
        match dispatcher.dispatch_message(r#"{"kind":"not_a_real_kind"}"#) {
            Response::Error { message, .. } => assert!(message.contains("kind")),
            other => panic!("expected an error response, got {:?}", other),
        }
    }

    #[test]
    fn find_best_turn_message_dispatches_through_the_wire_format() {
        let mut dispatcher = Dispatcher::new();
        let raw = format!(
            r#"{{"kind":"find_best_turn","fen":"{}","skill":1,"max_moves":1,"request_id":"w1"}}"#,
            START_POSITION_FEN
        );
        match dispatcher.dispatch_message(&raw) {
            Response::BestTurn { request_id, moves } => {
                assert_eq!(request_id, "w1");
                assert_eq!(moves.len(), 1);
            }
            other => panic!("expected success, got: {:?}", other),
        }
    }

    #[test]
    fn mate_in_one_turn_san_ends_with_hash() {
        // Fool's mate: after 1.f3 e5 2.g4, Black's queen mates on h4.
        let pos =
            Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2").unwrap();
        let mv = Move::new(square(FILE_D, RANK_8), square(FILE_H, RANK_4), EMPTY, EMPTY, chess_move::NORMAL);
        let san = move_to_san(&pos, mv);
        assert!(san.ends_with('#'));
    }

    #[test]
    fn game_result_detects_checkmate() {
        let pos =
            Position::from_fen("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2").unwrap();
        let mut scratch = pos.clone();
        let mv = Move::new(square(FILE_D, RANK_8), square(FILE_H, RANK_4), EMPTY, EMPTY, chess_move::NORMAL);
        scratch.make_move(mv);
        assert_eq!(game_result(&scratch), GameResult::Checkmate);
    }
}
