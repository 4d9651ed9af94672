//! Board trait consumed by the search engine
//!
//! A board is a flat array of color indices over a fixed `width × height`
//! grid. Index 0 ([`EMPTY`]) marks an empty cell. Implementations own the
//! rules: which groups are removable, how blocks fall, how a finished board
//! is scored and how a layout is fingerprinted.

use std::fmt;

use crate::scoring::move_score;

/// Color index of an empty cell.
pub const EMPTY: u8 = 0;

/// A removable group, identified by one of its cells.
///
/// A move is only meaningful for the board snapshot it was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Move {
    /// Index of a cell inside the group
    pub cell: u16,
    /// Number of blocks in the group (always >= 2 for generated moves)
    pub area: u16,
}

impl Move {
    pub fn new(cell: u16, area: u16) -> Self {
        Self { cell, area }
    }

    /// Immediate score of the move: `(area - 2)²`.
    #[inline]
    pub fn score(self) -> i32 {
        move_score(self.area)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cell, self.area)
    }
}

/// Rules authority for one board layout.
///
/// The search clones a board whenever it needs a private copy (one per
/// expanded node and one per playout), so implementations should keep
/// cloning cheap.
///
/// # Required operations
///
/// * `moves_into` / `tabu_moves_into` enumerate removable groups
/// * `do_move` applies a move in place and returns the updated score
/// * `canonical_hash` fingerprints the layout for transposition detection
/// * `end_score` scores a finished board
/// * `upper_score` gives an optimistic bound on the remaining score
pub trait Board: Clone + Send + Sync + fmt::Debug + 'static {
    /// Number of columns.
    fn width(&self) -> usize;

    /// Number of rows.
    fn height(&self) -> usize;

    /// Number of distinct block colors (colors are `1..=num_colors`).
    fn num_colors(&self) -> u8;

    /// Flat cell array, `width * height` entries.
    fn cells(&self) -> &[u8];

    /// Append every removable group (area >= 2) to `out`.
    ///
    /// `out` is cleared first. Each group appears exactly once.
    fn moves_into(&self, out: &mut Vec<Move>);

    /// Like [`Board::moves_into`] but skipping groups of color `tabu`.
    fn tabu_moves_into(&self, tabu: u8, out: &mut Vec<Move>);

    /// Remove the group of `mv`, apply gravity and column collapse.
    ///
    /// Returns `prior_score + (area - 2)²`.
    fn do_move(&mut self, mv: Move, prior_score: i32) -> i32;

    /// 64-bit fingerprint of the layout. Equal layouts hash equal.
    fn canonical_hash(&self) -> u64;

    /// Score of a board on which play stops.
    fn end_score(&self) -> i32;

    /// Optimistic bound on the score still achievable from this layout.
    fn upper_score(&self) -> i32;

    /// Whether every cell is empty.
    fn is_empty(&self) -> bool {
        self.cells().iter().all(|&c| c == EMPTY)
    }

    /// Color of the given cell.
    #[inline]
    fn color_at(&self, cell: usize) -> u8 {
        self.cells()[cell]
    }

    /// Number of non-empty cells.
    fn block_count(&self) -> usize {
        self.cells().iter().filter(|&&c| c != EMPTY).count()
    }

    /// Blocks per color; index 0 counts empty cells.
    fn color_counts(&self) -> Vec<u32> {
        let mut counts = vec![0u32; self.num_colors() as usize + 1];
        for &c in self.cells() {
            counts[c as usize] += 1;
        }
        counts
    }

    /// Convenience wrapper around [`Board::moves_into`].
    fn moves(&self) -> Vec<Move> {
        let mut out = Vec::new();
        self.moves_into(&mut out);
        out
    }

    /// Convenience wrapper around [`Board::tabu_moves_into`].
    fn tabu_moves(&self, tabu: u8) -> Vec<Move> {
        let mut out = Vec::new();
        self.tabu_moves_into(tabu, &mut out);
        out
    }
}

/// Errors raised when building boards or validating user-supplied moves.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid board dimensions: expected {expected} cells but got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Color {color} out of range (board has {num_colors} colors)")]
    ColorOutOfRange { color: u8, num_colors: u8 },
    #[error("Cell {cell} outside of a {width}x{height} board")]
    CellOutOfRange {
        cell: usize,
        width: usize,
        height: usize,
    },
    #[error("Board with {0} cells exceeds the supported size")]
    TooLarge(usize),
    #[error("Board needs at least one color")]
    NoColors,
    #[error("Cell {0} is empty")]
    EmptyCell(usize),
    #[error("Cell {0} belongs to a single block, which cannot be removed")]
    SingletonGroup(usize),
    #[error("Failed to parse board: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_score() {
        assert_eq!(Move::new(0, 2).score(), 0);
        assert_eq!(Move::new(7, 6).score(), 16);
    }

    #[test]
    fn test_move_display() {
        assert_eq!(Move::new(12, 4).to_string(), "12x4");
    }

    #[test]
    fn test_error_messages() {
        let err = BoardError::DimensionMismatch {
            expected: 16,
            actual: 15,
        };
        assert!(err.to_string().contains("expected 16 cells"));
        assert!(BoardError::SingletonGroup(3)
            .to_string()
            .contains("single block"));
    }
}
