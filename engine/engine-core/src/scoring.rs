//! Scoring rules shared by every board implementation.

/// Bonus awarded when a board is cleared completely.
pub const FULL_CLEAR_BONUS: i32 = 1000;

/// Largest supported number of cells.
///
/// The total of a game is at most `(cells - 2)²` plus the clear bonus,
/// which has to fit in an `i32` together with the end-of-game penalties.
pub const MAX_CELLS: usize = 46_000;

/// Score for removing a group of `area` blocks: `(area - 2)²`.
///
/// Groups smaller than two blocks cannot be removed; callers only ever pass
/// legal areas, but the formula is still well defined for them.
///
/// # Example
/// ```
/// use engine_core::move_score;
///
/// assert_eq!(move_score(2), 0);
/// assert_eq!(move_score(5), 9);
/// assert_eq!(move_score(16), 196);
/// ```
#[inline]
pub fn move_score(area: u16) -> i32 {
    let excess = area as i32 - 2;
    excess * excess
}

/// Terminal penalty for `singletons` stranded blocks of one color: `(k - 2)²`.
///
/// The penalty is applied to every color of the board, including colors
/// with no stranded blocks at all.
#[inline]
pub fn singleton_penalty(singletons: u32) -> i32 {
    let excess = singletons as i32 - 2;
    excess * excess
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_score() {
        assert_eq!(move_score(2), 0);
        assert_eq!(move_score(3), 1);
        assert_eq!(move_score(10), 64);
    }

    #[test]
    fn test_largest_board_score_fits() {
        let top = move_score(MAX_CELLS as u16) as i64 + FULL_CLEAR_BONUS as i64;
        assert!(top < i32::MAX as i64);
        // Worst end penalty: every block a stranded singleton of one color,
        // with 254 more colors missing
        let penalty = singleton_penalty(MAX_CELLS as u32) as i64 + 254 * 4;
        assert!(penalty < i32::MAX as i64);
    }

    #[test]
    fn test_singleton_penalty() {
        // Two stranded blocks of a color cost nothing
        assert_eq!(singleton_penalty(2), 0);
        // No stranded blocks still costs 4
        assert_eq!(singleton_penalty(0), 4);
        assert_eq!(singleton_penalty(5), 9);
    }
}
