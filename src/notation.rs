//! FEN (Forsyth-Edwards Notation) parsing.
//!
//! The engine requires at least the first four FEN fields (piece
//! placement, side to move, castling rights, en-passant target); the
//! halfmove clock and fullmove number default to `0` and `1`
//! respectively when absent, per spec.

use basetypes::*;
use castling_rights;
use castling_rights::CastlingRights;
use engine::EngineError;
use lazy_static::lazy_static;
use regex::Regex;

/// The outcome of parsing a FEN string: everything needed to build a
/// `Position`, still in "dumb data" form.
pub struct ParsedFen {
    pub board: [Piece; BOARD_SIZE],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub ep_square: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

pub const START_POSITION_FEN: &str =
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

lazy_static! {
    static ref FEN_RE: Regex = Regex::new(
        r"^\s*([pnbrqkPNBRQK1-8/]+)\s+([wb])\s+(-|[KQkq]{1,4})\s+(-|[a-h][36])(\s+(\d+)\s+(\d+))?\s*$"
    ).unwrap();
}

fn piece_from_char(c: char) -> Option<Piece> {
    let kind = match c.to_ascii_lowercase() {
        'p' => PAWN,
        'n' => KNIGHT,
        'b' => BISHOP,
        'r' => ROOK,
        'q' => QUEEN,
        'k' => KING,
        _ => return None,
    };
    Some(if c.is_ascii_uppercase() { kind } else { -kind })
}

/// Parses a FEN string into a `ParsedFen`. Returns `EngineError::BadFen`
/// on any malformed input.
pub fn parse_fen(fen: &str) -> Result<ParsedFen, EngineError> {
    let caps = FEN_RE
        .captures(fen.trim())
        .ok_or_else(|| EngineError::BadFen(fen.to_string()))?;

    let placement = &caps[1];
    let mut board = [OFF_BOARD; BOARD_SIZE];
    for sq in 0..BOARD_SIZE {
        if is_interior(sq as Square) {
            board[sq] = EMPTY;
        }
    }

    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(EngineError::BadFen(fen.to_string()));
    }
    // FEN ranks run from rank 8 down to rank 1.
    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0usize;
        for c in rank_str.chars() {
            if let Some(n) = c.to_digit(9) {
                file += n as usize;
            } else {
                let piece = piece_from_char(c).ok_or_else(|| EngineError::BadFen(fen.to_string()))?;
                if file >= 8 {
                    return Err(EngineError::BadFen(fen.to_string()));
                }
                board[square(file, rank) as usize] = piece;
                file += 1;
            }
        }
        if file != 8 {
            return Err(EngineError::BadFen(fen.to_string()));
        }
    }

    let side_to_move = if &caps[2] == "w" { WHITE } else { BLACK };

    let castling_str = &caps[3];
    let mut castling_bits = 0u8;
    if castling_str != "-" {
        for c in castling_str.chars() {
            castling_bits |= match c {
                'K' => castling_rights::WHITE_KINGSIDE,
                'Q' => castling_rights::WHITE_QUEENSIDE,
                'k' => castling_rights::BLACK_KINGSIDE,
                'q' => castling_rights::BLACK_QUEENSIDE,
                _ => return Err(EngineError::BadFen(fen.to_string())),
            };
        }
    }
    let castling = CastlingRights::from_bits(castling_bits);

    let ep_str = &caps[4];
    let ep_square = if ep_str == "-" {
        None
    } else {
        Some(square_from_algebraic(ep_str).ok_or_else(|| EngineError::BadFen(fen.to_string()))?)
    };

    let halfmove_clock = caps
        .get(6)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let fullmove_number = caps
        .get(7)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1);

    Ok(ParsedFen {
        board,
        side_to_move,
        castling,
        ep_square,
        halfmove_clock,
        fullmove_number,
    })
}
