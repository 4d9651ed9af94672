//! SameGame board implementation for the solver engine
//!
//! SameGame is a single-player tile-elimination puzzle. Clicking a connected
//! group of at least two same-colored blocks removes it, the blocks above
//! fall down, and empty columns collapse to the left. Removing a group of
//! `n` blocks scores `(n - 2)²`; clearing the whole board earns a bonus.
//!
//! # Board Layout
//!
//! Cells are stored column-major with row 0 at the top:
//! ```text
//!          Col 0  1  2
//! Row 0:  [ 0][ 3][ 6]  <- Top
//! Row 1:  [ 1][ 4][ 7]
//! Row 2:  [ 2][ 5][ 8]  <- Bottom
//! ```
//! so `index = x * height + y`. Color 0 is empty, colors are `1..=num_colors`.
//!
//! # Usage
//!
//! ```rust
//! use engine_core::Board;
//! use games_samegame::SameGame;
//!
//! let board = SameGame::parse("1 1 2\n2 2 2").unwrap();
//! assert_eq!(board.moves().len(), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use engine_core::{
    move_score, singleton_penalty, Board, BoardError, Move, EMPTY, FULL_CLEAR_BONUS, MAX_CELLS,
};
use rand::Rng;

mod zobrist;

pub use zobrist::ZobristKeys;

/// SameGame board state
///
/// Clones share the Zobrist key table, so copying a board costs one
/// allocation for the cell array.
#[derive(Clone)]
pub struct SameGame {
    width: usize,
    height: usize,
    num_colors: u8,
    /// Column-major cells, row 0 at the top
    cells: Vec<u8>,
    keys: Arc<ZobristKeys>,
}

impl SameGame {
    /// Create a board from a column-major cell array.
    ///
    /// The layout is settled first: blocks fall to the bottom of their
    /// column and empty columns collapse to the left.
    pub fn new(
        width: usize,
        height: usize,
        num_colors: u8,
        cells: Vec<u8>,
    ) -> Result<Self, BoardError> {
        let expected = width * height;
        if cells.len() != expected {
            return Err(BoardError::DimensionMismatch {
                expected,
                actual: cells.len(),
            });
        }
        if expected > MAX_CELLS {
            return Err(BoardError::TooLarge(expected));
        }
        if let Some(&color) = cells.iter().find(|&&c| c > num_colors) {
            return Err(BoardError::ColorOutOfRange { color, num_colors });
        }

        let mut board = Self {
            width,
            height,
            num_colors,
            cells,
            keys: Arc::new(ZobristKeys::new(expected, num_colors)),
        };
        board.settle();
        Ok(board)
    }

    /// Create a board from rows, top row first.
    ///
    /// The number of colors is the largest color present.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, BoardError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if height == 0 || width == 0 {
            return Err(BoardError::Parse("board has no cells".to_string()));
        }

        let mut cells = vec![EMPTY; width * height];
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(BoardError::Parse(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            for (x, &color) in row.iter().enumerate() {
                cells[x * height + y] = color;
            }
        }

        let num_colors = cells.iter().copied().max().unwrap_or(EMPTY);
        Self::new(width, height, num_colors, cells)
    }

    /// Parse a board from text: one row per line, top row first,
    /// whitespace-separated color numbers. Blank lines and lines starting
    /// with `#` are ignored.
    pub fn parse(text: &str) -> Result<Self, BoardError> {
        let rows = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                line.split_whitespace()
                    .map(|token| {
                        token.parse::<u8>().map_err(|_| {
                            BoardError::Parse(format!("invalid color '{}'", token))
                        })
                    })
                    .collect::<Result<Vec<u8>, BoardError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_rows(&rows)
    }

    /// Fill a board with uniformly random colors.
    pub fn random<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        num_colors: u8,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        if num_colors == 0 {
            return Err(BoardError::NoColors);
        }
        let cells = (0..width * height)
            .map(|_| rng.gen_range(1..=num_colors))
            .collect();
        Self::new(width, height, num_colors, cells)
    }

    /// Convert column and row to a cell index.
    #[inline]
    pub fn cell_index(&self, x: usize, y: usize) -> usize {
        x * self.height + y
    }

    /// Convert a cell index to (column, row).
    #[inline]
    pub fn coords(&self, cell: usize) -> (usize, usize) {
        (cell / self.height, cell % self.height)
    }

    /// Validate that `cell` can be clicked and return the resulting move.
    pub fn legal_move_at(&self, cell: usize) -> Result<Move, BoardError> {
        if cell >= self.cells.len() {
            return Err(BoardError::CellOutOfRange {
                cell,
                width: self.width,
                height: self.height,
            });
        }
        if self.cells[cell] == EMPTY {
            return Err(BoardError::EmptyCell(cell));
        }

        let mut visited = vec![false; self.cells.len()];
        let area = self.flood(cell, &mut visited, &mut Vec::new(), |_| {});
        if area < 2 {
            return Err(BoardError::SingletonGroup(cell));
        }
        Ok(Move::new(cell as u16, area as u16))
    }

    /// Click `cell`, returning the score of the removed group.
    pub fn apply(&mut self, cell: usize) -> Result<i32, BoardError> {
        let mv = self.legal_move_at(cell)?;
        Ok(self.do_move(mv, 0))
    }

    /// Flood-fill the group containing `start`, marking `visited` and
    /// calling `on_cell` for every member. Returns the group size.
    fn flood(
        &self,
        start: usize,
        visited: &mut [bool],
        stack: &mut Vec<usize>,
        mut on_cell: impl FnMut(usize),
    ) -> usize {
        let color = self.cells[start];
        let h = self.height;

        stack.clear();
        stack.push(start);
        visited[start] = true;

        let mut area = 0;
        while let Some(i) = stack.pop() {
            area += 1;
            on_cell(i);

            let (x, y) = (i / h, i % h);
            if y > 0 {
                self.push_same(i - 1, color, visited, stack);
            }
            if y + 1 < h {
                self.push_same(i + 1, color, visited, stack);
            }
            if x > 0 {
                self.push_same(i - h, color, visited, stack);
            }
            if x + 1 < self.width {
                self.push_same(i + h, color, visited, stack);
            }
        }

        area
    }

    #[inline]
    fn push_same(&self, i: usize, color: u8, visited: &mut [bool], stack: &mut Vec<usize>) {
        if !visited[i] && self.cells[i] == color {
            visited[i] = true;
            stack.push(i);
        }
    }

    /// Enumerate removable groups, optionally skipping one color.
    fn collect_groups(&self, skip: Option<u8>, out: &mut Vec<Move>) {
        out.clear();
        let mut visited = vec![false; self.cells.len()];
        let mut stack = Vec::new();

        for i in 0..self.cells.len() {
            let color = self.cells[i];
            if color == EMPTY || visited[i] {
                continue;
            }
            let area = self.flood(i, &mut visited, &mut stack, |_| {});
            if area >= 2 && skip != Some(color) {
                out.push(Move::new(i as u16, area as u16));
            }
        }
    }

    /// Let blocks fall and collapse empty columns to the left.
    fn settle(&mut self) {
        let h = self.height;
        let mut target = 0;

        for x in 0..self.width {
            let col = x * h;

            // Gravity: compact the column towards the bottom row
            let mut write = h;
            for y in (0..h).rev() {
                let color = self.cells[col + y];
                if color != EMPTY {
                    write -= 1;
                    self.cells[col + write] = color;
                }
            }
            self.cells[col..col + write].fill(EMPTY);

            if write == h {
                continue; // Empty column
            }
            if target != x {
                self.cells.copy_within(col..col + h, target * h);
                self.cells[col..col + h].fill(EMPTY);
            }
            target += 1;
        }
    }
}

impl Board for SameGame {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn num_colors(&self) -> u8 {
        self.num_colors
    }

    fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn moves_into(&self, out: &mut Vec<Move>) {
        self.collect_groups(None, out);
    }

    fn tabu_moves_into(&self, tabu: u8, out: &mut Vec<Move>) {
        self.collect_groups(Some(tabu), out);
    }

    fn do_move(&mut self, mv: Move, prior_score: i32) -> i32 {
        let start = mv.cell as usize;
        debug_assert_ne!(self.cells[start], EMPTY, "move on empty cell {}", start);

        let mut visited = vec![false; self.cells.len()];
        let mut members = Vec::with_capacity(mv.area as usize);
        let area = self.flood(start, &mut visited, &mut Vec::new(), |i| members.push(i));
        debug_assert_eq!(area, mv.area as usize, "stale move {}", mv);

        for i in members {
            self.cells[i] = EMPTY;
        }
        self.settle();

        prior_score + move_score(area as u16)
    }

    fn canonical_hash(&self) -> u64 {
        self.keys.hash(&self.cells)
    }

    fn end_score(&self) -> i32 {
        if self.is_empty() {
            return FULL_CLEAR_BONUS;
        }

        let mut singletons = vec![0u32; self.num_colors as usize + 1];
        let mut visited = vec![false; self.cells.len()];
        let mut stack = Vec::new();
        let mut score = 0;

        for i in 0..self.cells.len() {
            let color = self.cells[i];
            if color == EMPTY || visited[i] {
                continue;
            }
            let area = self.flood(i, &mut visited, &mut stack, |_| {});
            if area > 1 {
                score += move_score(area as u16);
            } else {
                singletons[color as usize] += 1;
            }
        }

        for &count in &singletons[1..] {
            score -= singleton_penalty(count);
        }
        score
    }

    fn upper_score(&self) -> i32 {
        let counts = self.color_counts();
        let mut bound = 0;
        let mut clearable = true;

        for &n in &counts[1..] {
            match n {
                0 => {}
                1 => clearable = false,
                n => bound += move_score(n as u16),
            }
        }

        if clearable {
            bound += FULL_CLEAR_BONUS;
        }
        bound
    }
}

impl PartialEq for SameGame {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.num_colors == other.num_colors
            && self.cells == other.cells
    }
}

impl Eq for SameGame {}

impl fmt::Debug for SameGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SameGame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("num_colors", &self.num_colors)
            .field("blocks", &self.block_count())
            .finish()
    }
}

impl fmt::Display for SameGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            let row = (0..self.width)
                .map(|x| self.cells[self.cell_index(x, y)].to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
