//! A Double-Move ("Marseillais") chess engine: each turn is one or two
//! consecutive moves by the same side, ending early if the first move
//! delivers check. See `engine::Dispatcher` for the entry point a host
//! process drives.

pub mod attacks;
pub mod basetypes;
pub mod board;
pub mod castling_rights;
pub mod chess_move;
pub mod engine;
pub mod evaluator;
pub mod move_generation;
pub mod notation;
pub mod search;
pub mod see;
pub mod tt;
pub mod turn;
pub mod value;
pub mod zobrist;
