//! Resource accounting.
//!
//! [`Budget`] counts the units left for a solve. [`ResourceSchedule`] splits
//! the budget into frames for the first plies: when a frame is used up the
//! move at that ply is finalized and exploration moves one ply deeper.

/// Global resource counter for one solve.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    total: u64,
    remaining: i64,
}

impl Budget {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            remaining: total.min(i64::MAX as u64) as i64,
        }
    }

    /// Consume `units`. The counter may go negative within an iteration.
    #[inline]
    pub fn charge(&mut self, units: i64) {
        self.remaining -= units;
    }

    /// Drop every remaining unit so the driver stops after this iteration.
    pub fn exhaust(&mut self) {
        self.remaining = self.remaining.min(0);
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining <= 0
    }

    /// Whether less than `limit` of the budget is left.
    #[inline]
    pub fn is_urgent(&self, limit: f64) -> bool {
        (self.remaining as f64) < self.total as f64 * limit
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    pub fn used(&self) -> u64 {
        (self.total as i64 - self.remaining).max(0) as u64
    }
}

/// Per-ply allocation of the budget and the finalize frontier.
#[derive(Debug, Clone)]
pub struct ResourceSchedule {
    frames: Vec<i64>,
    frame_left: i64,
    break_depth: usize,
}

impl ResourceSchedule {
    /// Allocate `max(floor, left / divisor)` to each of the first `plies`
    /// plies, where `left` is what the previous plies did not take.
    pub fn new(budget: u64, plies: usize, floor: u64, divisor: f64) -> Self {
        let floor = floor as f64;
        let mut left = budget as f64;
        let frames: Vec<i64> = (0..plies)
            .map(|_| {
                let frame = floor.max(left / divisor) as i64;
                left -= frame as f64;
                frame
            })
            .collect();
        let frame_left = frames.first().copied().unwrap_or(budget as i64);

        Self {
            frames,
            frame_left,
            break_depth: 0,
        }
    }

    /// Charge the units an iteration used against the current frame. Once
    /// the frame is spent the frontier advances; beyond the scheduled plies
    /// the next frame is whatever budget remains.
    pub fn consume(&mut self, used: i64, remaining: i64) {
        self.frame_left -= used;
        if self.frame_left <= 0 {
            self.break_depth += 1;
            self.frame_left = self
                .frames
                .get(self.break_depth)
                .copied()
                .unwrap_or(remaining);
            tracing::debug!(
                break_depth = self.break_depth,
                frame = self.frame_left,
                "finalize frontier advanced"
            );
        }
    }

    /// Pull the frontier back one ply after an iteration found nothing to
    /// follow at a finalized depth.
    pub fn recede(&mut self) {
        self.break_depth = self.break_depth.saturating_sub(1);
    }

    /// Whether the move chosen at `depth` is finalized.
    #[inline]
    pub fn is_finalized(&self, depth: usize) -> bool {
        depth <= self.break_depth
    }

    pub fn break_depth(&self) -> usize {
        self.break_depth
    }

    pub fn frames(&self) -> &[i64] {
        &self.frames
    }
}
