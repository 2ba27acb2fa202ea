//! Zobrist hashing tables.
//!
//! The key property of Zobrist hashing is that two similar positions
//! generate unrelated hash numbers, by XOR-combining per-feature keys
//! drawn once from a fixed-seed PRNG (not system randomness -- the
//! tables must be identical across runs so persisted/replayed
//! positions hash the same way).

use basetypes::{Color, Piece, BLACK, KING, PAWN, WHITE};
use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct ZobristArrays {
    /// `piece_keys[color][kind][sq64]`.
    piece_keys: [[[u64; 64]; 7]; 2],
    castling_keys: [u64; 16],
    en_passant_file_keys: [u64; 9], // index 8 means "no ep file"
    side_to_move_key: u64,
}

impl ZobristArrays {
    pub fn get() -> &'static ZobristArrays {
        &ZOBRIST
    }

    fn new() -> ZobristArrays {
        let mut rng = StdRng::seed_from_u64(0x5EED_D06E_5EED_D06E);
        let mut piece_keys = [[[0u64; 64]; 7]; 2];
        for color in 0..2 {
            for kind in PAWN as usize..=KING as usize {
                for sq in 0..64 {
                    piece_keys[color][kind][sq] = rng.gen();
                }
            }
        }
        let mut castling_keys = [0u64; 16];
        for key in castling_keys.iter_mut() {
            *key = rng.gen();
        }
        let mut en_passant_file_keys = [0u64; 9];
        for key in en_passant_file_keys.iter_mut().take(8) {
            *key = rng.gen();
        }
        // Index 8 ("no ep file") contributes nothing.
        en_passant_file_keys[8] = 0;
        ZobristArrays {
            piece_keys,
            castling_keys,
            en_passant_file_keys,
            side_to_move_key: rng.gen(),
        }
    }

    #[inline]
    pub fn piece(&self, color: Color, kind: Piece, sq64: usize) -> u64 {
        self.piece_keys[color][kind as usize][sq64]
    }

    #[inline]
    pub fn castling(&self, castling_bits: u8) -> u64 {
        self.castling_keys[castling_bits as usize]
    }

    /// `ep_file` is `0..=7`, or `8` for "no en-passant square".
    #[inline]
    pub fn en_passant_file(&self, ep_file: usize) -> u64 {
        self.en_passant_file_keys[ep_file]
    }

    #[inline]
    pub fn side_to_move(&self) -> u64 {
        self.side_to_move_key
    }
}

lazy_static! {
    static ref ZOBRIST: ZobristArrays = ZobristArrays::new();
}
