//! Defines types and constants related to position evaluation.

/// Evaluation value in centipawn-like units, from the perspective of
/// the color to move unless otherwise noted (the Evaluator itself
/// always reports from White's perspective; the search negates as it
/// recurses).
pub type Value = i32;

/// A checkmate score. Scores closer to zero than this by up to
/// `MAX_PLY` represent "mate in N" at various distances; the search
/// subtracts the current ply so that faster mates score higher.
pub const CHECKMATE: Value = 1_000_000;

/// Any score at least this close to `CHECKMATE` represents a forced
/// mate rather than a material/positional evaluation.
pub const MATE_THRESHOLD: Value = CHECKMATE - 1_000;

/// The maximum turn-search depth this engine will ever be asked for.
pub const MAX_PLY: u32 = 255;
