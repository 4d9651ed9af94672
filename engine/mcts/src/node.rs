//! Search node representation.
//!
//! Each node stands for one board state. Its move list and per-move scores
//! are fixed at creation; the statistics aggregate the samples credited
//! through the edge the node is currently owned by.

use engine_core::{Board, Move};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node of the search graph.
#[derive(Debug, Clone)]
pub struct SearchNode<B> {
    /// Current owner (NONE for the root). Reassigned on reparenting.
    pub parent: NodeId,

    /// Slot of this node in the owner's child array
    pub slot: usize,

    /// Board state at this node
    pub board: B,

    /// Legal moves, fixed at creation
    pub moves: Vec<Move>,

    /// Immediate score of each move
    pub scores: Vec<i32>,

    /// Child per move. NONE until the move is expanded.
    pub children: Vec<NodeId>,

    /// Whether this node owns (credits statistics through) each child slot.
    /// Unexpanded slots start owned.
    pub owned: Vec<bool>,

    /// Number of owned slots
    pub active: usize,

    /// Number of child slots not yet known to be solved
    pub live: usize,

    /// Best cumulative score known to reach this node
    pub cum: i32,

    /// Number of samples credited to this node
    pub visits: u32,

    /// True once the node's value is known exactly. Solved nodes are never
    /// sampled again and `top_score` is frozen.
    pub solved: bool,

    /// Running mean of sampled scores, relative to this node
    pub avg: f64,

    /// Best sampled score, relative to this node
    pub top_score: i32,

    /// Exploration constant `c`
    pub exploration: f64,

    /// Optimistic bound on the score still achievable from this node
    pub upper_score: i32,

    /// Whether a terminal state was ever reached below this node
    pub has_leaf_hit: bool,
}

impl<B: Board> SearchNode<B> {
    /// Create a root node for the given board.
    pub fn new_root(board: B, exploration: f64) -> Self {
        let moves = board.moves();
        let scores = moves.iter().map(|mv| mv.score()).collect();
        let count = moves.len();
        let upper_score = board.upper_score();

        Self {
            parent: NodeId::NONE,
            slot: 0,
            board,
            moves,
            scores,
            children: vec![NodeId::NONE; count],
            owned: vec![true; count],
            active: count,
            live: count,
            cum: 0,
            visits: 0,
            solved: false,
            avg: 0.0,
            top_score: i32::MIN,
            exploration,
            upper_score,
            has_leaf_hit: false,
        }
    }

    /// Create a child node reached from `parent` through `slot` with
    /// cumulative score `cum`.
    pub fn new_child(parent: NodeId, slot: usize, board: B, cum: i32, exploration: f64) -> Self {
        Self {
            parent,
            slot,
            cum,
            ..Self::new_root(board, exploration)
        }
    }
}

impl<B> SearchNode<B> {
    /// Whether the board has no legal move.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.moves.is_empty()
    }

    /// Record one sampled score (relative to this node).
    pub fn record_sample(&mut self, sample: i32) {
        if self.solved {
            return;
        }
        self.visits += 1;
        self.avg += (sample as f64 - self.avg) / self.visits as f64;
        self.top_score = self.top_score.max(sample);
    }

    /// UCB score of this node as seen from its parent, where `edge_score`
    /// is the cumulative score at this node along the parent's edge.
    ///
    /// `edge + avg + c * sqrt(ln(t_parent) / t)`, unbounded when unvisited.
    #[inline]
    pub fn ucb_score(&self, edge_score: i32, ln_parent_visits: f64, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        edge_score as f64
            + self.avg
            + exploration * (ln_parent_visits / self.visits as f64).sqrt()
    }

    /// Number of owned slots, recomputed from the flags.
    pub fn owned_count(&self) -> usize {
        self.owned.iter().filter(|&&own| own).count()
    }
}
