//! Zobrist keys for SameGame layouts.

use engine_core::EMPTY;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Fixed seed so every board instance with the same dimensions agrees on keys.
const ZOBRIST_SEED: u64 = 0x5a3e_6a3e_0b1d_2c4f;

/// One random 64-bit key per (cell, color) pair.
#[derive(Debug, Clone)]
pub struct ZobristKeys {
    num_colors: usize,
    keys: Vec<u64>,
}

impl ZobristKeys {
    pub fn new(cells: usize, num_colors: u8) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(ZOBRIST_SEED);
        let num_colors = num_colors as usize;
        let keys = (0..cells * num_colors).map(|_| rng.next_u64()).collect();
        Self { num_colors, keys }
    }

    #[inline]
    pub fn key(&self, cell: usize, color: u8) -> u64 {
        self.keys[cell * self.num_colors + (color as usize - 1)]
    }

    /// XOR of the keys of every occupied cell.
    pub fn hash(&self, cells: &[u8]) -> u64 {
        cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != EMPTY)
            .fold(0u64, |h, (i, &c)| h ^ self.key(i, c))
    }
}
