//! MCTS search driver.
//!
//! One iteration descends from the root:
//! 1. Selection: at finalized depths follow the best known child, elsewhere
//!    pick by UCB. Unexpanded children always win.
//! 2. Expansion: create the child or link it through the transposition
//!    table, possibly taking over its ownership.
//! 3. Evaluation: run a playout from a fresh node, or read the known
//!    optimal line off a solved one.
//! 4. Backpropagation: on the way back every level records the move, adds
//!    its score and samples the total, and marks itself solved once all
//!    its children are.

use std::time::{Duration, Instant};

use engine_core::{Board, Move};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::MctsConfig;
use crate::node::NodeId;
use crate::playout::PlayoutPolicy;
use crate::schedule::{Budget, ResourceSchedule};
use crate::tree::{Expansion, LeafHitBoost, SearchTree, TreeError, TreeStats};

/// Errors that can occur when setting up or checking a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("Search tree invariant violated: {0}")]
    Tree(#[from] TreeError),
}

/// A complete move sequence and its total score, end score included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub score: i32,
    pub moves: Vec<Move>,
}

impl Solution {
    /// Placeholder that any real solution beats.
    pub fn none() -> Self {
        Self {
            score: i32::MIN,
            moves: Vec::new(),
        }
    }

    /// Cells to click, in order.
    pub fn cells(&self) -> Vec<usize> {
        self.moves.iter().map(|mv| mv.cell as usize).collect()
    }
}

/// Counters collected during one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    pub iterations: u64,
    pub playouts: u64,
    pub playout_moves: u64,
    pub nodes_created: u64,
    pub transpositions: u64,
    pub dead_links: u64,
    pub reparentings: u64,
    pub solved_replays: u64,
    pub terminal_hits: u64,
    pub full_clears: u64,
    pub pruned: u64,
    pub best_updates: u64,
    pub budget_used: u64,
    pub elapsed: Duration,
}

impl SearchStats {
    /// Combine counters of independent runs.
    pub fn merge(&mut self, other: &SearchStats) {
        self.iterations += other.iterations;
        self.playouts += other.playouts;
        self.playout_moves += other.playout_moves;
        self.nodes_created += other.nodes_created;
        self.transpositions += other.transpositions;
        self.dead_links += other.dead_links;
        self.reparentings += other.reparentings;
        self.solved_replays += other.solved_replays;
        self.terminal_hits += other.terminal_hits;
        self.full_clears += other.full_clears;
        self.pruned += other.pruned;
        self.best_updates += other.best_updates;
        self.budget_used += other.budget_used;
        self.elapsed += other.elapsed;
    }
}

/// Result of a search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best solution found
    pub solution: Solution,

    /// Counters of the run that produced `solution` (summed over all runs
    /// for the multi-run drivers)
    pub stats: SearchStats,

    /// Shape of the final tree of the run that produced `solution`
    pub tree: TreeStats,

    /// Index of the run that produced `solution`
    pub run: usize,
}

/// Move record of the current iteration.
#[derive(Debug, Default)]
struct Episode {
    /// Score accumulated from the current level downwards
    score: i32,
    /// Move chosen at depth `d` is stored at index `d - 1`
    moves: Vec<Move>,
    /// Set when the result was read off a solved subtree; such results are
    /// not sampled into node statistics.
    from_solved: bool,
}

/// Child choice at one level.
enum Selection {
    Child(usize),
    /// A solved line was replayed; the episode has `len` moves.
    Finished(usize),
    /// Nothing to follow from this node.
    Abandon,
}

/// State of one solve: tree, table, random source, budget, schedule and
/// best solution. Nothing outlives it.
pub struct MctsSearch<B: Board, P: PlayoutPolicy<B>> {
    tree: SearchTree<B>,
    config: MctsConfig,
    policy: P,
    rng: ChaCha20Rng,
    budget: Budget,
    schedule: ResourceSchedule,
    boost: LeafHitBoost,
    best: Solution,
    episode: Episode,
    stats: SearchStats,
}

impl<B: Board, P: PlayoutPolicy<B>> MctsSearch<B, P> {
    /// Create a search over `board` with `budget` units and a seeded
    /// random source.
    pub fn new(
        board: B,
        config: &MctsConfig,
        policy: P,
        budget: u64,
        seed: u64,
    ) -> Result<Self, SearchError> {
        config.validate()?;

        let schedule = ResourceSchedule::new(
            budget,
            config.schedule_plies,
            config.schedule_floor,
            config.schedule_divisor,
        );
        let boost = LeafHitBoost {
            initial: config.leaf_hit_boost,
            decay: config.leaf_hit_decay,
            floor: config.leaf_hit_floor,
        };

        Ok(Self {
            tree: SearchTree::new(board, config.exploration),
            config: config.clone(),
            policy,
            rng: ChaCha20Rng::seed_from_u64(seed),
            budget: Budget::new(budget),
            schedule,
            boost,
            best: Solution::none(),
            episode: Episode::default(),
            stats: SearchStats::default(),
        })
    }

    /// Run iterations until the budget is spent. At least one iteration
    /// always runs, so a board with legal moves always gets a solution.
    pub fn run(&mut self) -> &Solution {
        let start = Instant::now();
        let root = self.tree.root();

        if self.tree.get(root).is_terminal() {
            let score = self.tree.get(root).board.end_score();
            self.best = Solution {
                score,
                moves: Vec::new(),
            };
            self.stats.elapsed = start.elapsed();
            debug!(score, "root has no legal move");
            return &self.best;
        }

        loop {
            let before = self.budget.remaining();
            self.episode.from_solved = false;
            self.stats.iterations += 1;

            let result = self.iterate(root, 0, 1);
            if let Some(len) = result {
                if self.episode.score > self.best.score {
                    self.best = Solution {
                        score: self.episode.score,
                        moves: self.episode.moves[..len].to_vec(),
                    };
                    self.stats.best_updates += 1;
                    debug!(
                        score = self.best.score,
                        moves = len,
                        iteration = self.stats.iterations,
                        remaining = self.budget.remaining(),
                        "new best solution"
                    );
                }
            }

            // An iteration that touched nothing billable still costs a unit
            // so the loop always terminates.
            let mut used = before - self.budget.remaining();
            if used == 0 {
                self.budget.charge(1);
                used = 1;
            }
            self.schedule.consume(used, self.budget.remaining());

            if self.budget.is_exhausted() {
                break;
            }
        }

        self.stats.budget_used = self.budget.used();
        self.stats.elapsed = start.elapsed();
        debug!(
            score = self.best.score,
            iterations = self.stats.iterations,
            nodes = self.tree.len(),
            break_depth = self.schedule.break_depth(),
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "search finished"
        );
        &self.best
    }

    /// One descent step at `id`, reached with cumulative score `cum`.
    /// `depth` is the 1-based index of the move chosen here. Returns the
    /// length of the finished episode, if any.
    fn iterate(&mut self, id: NodeId, cum: i32, depth: usize) -> Option<usize> {
        let (solved, terminal, upper) = {
            let node = self.tree.get(id);
            (node.solved, node.is_terminal(), node.upper_score)
        };

        // Only the root is ever descended into once solved
        if solved {
            self.budget.exhaust();
            return None;
        }

        if terminal {
            self.tree.leaf_hit(id, self.boost);
            self.tree.deactivate(id);
            self.tree.get_mut(id).solved = true;
            self.budget.charge(1);
            self.episode.from_solved = true;
            self.stats.terminal_hits += 1;
            return None;
        }

        if self.config.upper_bound_pruning
            && id != self.tree.root()
            && cum.saturating_add(upper) <= self.best.score
        {
            self.tree.leaf_hit(id, self.boost);
            self.tree.cancel(id);
            self.budget.charge(1);
            self.stats.pruned += 1;
            return None;
        }

        if depth % self.config.traversal_cost_interval == 0 {
            self.budget.charge(1);
        }

        if self.budget.is_urgent(self.config.urgency_limit) {
            let node = self.tree.get_mut(id);
            if !node.has_leaf_hit {
                node.exploration = (node.exploration * self.config.urgency_decay)
                    .max(self.config.urgency_floor);
            }
        }

        let slot = if self.schedule.is_finalized(depth) {
            match self.finalized_choice(id, cum) {
                Some(slot) => slot,
                None => {
                    self.schedule.recede();
                    return None;
                }
            }
        } else {
            match self.exploration_choice(id, cum, depth) {
                Selection::Child(slot) => slot,
                Selection::Finished(len) => return Some(len),
                Selection::Abandon => return None,
            }
        };

        let (kid, mv) = {
            let node = self.tree.get(id);
            (node.children[slot], node.moves[slot])
        };

        let (next, dead) = if kid.is_none() {
            match self.tree.expand(id, slot, cum, self.config.exploration) {
                Expansion::Created(next) => {
                    self.stats.nodes_created += 1;
                    (next, false)
                }
                Expansion::Transposed(next) => {
                    self.stats.transpositions += 1;
                    self.stats.reparentings += 1;
                    (next, false)
                }
                Expansion::Dead(next) => {
                    self.stats.transpositions += 1;
                    self.stats.dead_links += 1;
                    (next, true)
                }
                Expansion::Solved(next) => {
                    self.stats.transpositions += 1;
                    self.stats.solved_replays += 1;
                    (next, false)
                }
            }
        } else {
            (kid, false)
        };

        // The child may have been solved through another parent
        let leaf_hit_choice = dead || self.tree.get(next).solved;

        let result = if dead {
            None
        } else {
            let (next_solved, next_visits) = {
                let node = self.tree.get(next);
                (node.solved, node.visits)
            };
            if next_solved {
                Some(self.solved_playout(next, depth + 1))
            } else if next_visits == 0 {
                Some(self.playout(next, depth + 1))
            } else {
                self.iterate(next, cum + mv.score(), depth + 1)
            }
        };

        if result.is_some() {
            self.episode.moves[depth - 1] = mv;
            self.episode.score += mv.score();
            if !self.episode.from_solved {
                let sample = self.episode.score;
                self.tree.get_mut(id).record_sample(sample);
            }
        }

        if self.tree.get(next).solved {
            if leaf_hit_choice {
                self.tree.leaf_hit(id, self.boost);
            }
            let node = self.tree.get_mut(id);
            node.live = node.live.saturating_sub(1);
            if node.live == 0 {
                self.tree.deactivate(id);
                self.tree.get_mut(id).solved = true;
                trace!(node = id.0, depth, "node solved");
            }
        }

        result
    }

    /// Choice at a finalized depth: an unexpanded child if any (reservoir
    /// sampled), else the owned unsolved child with the best top score.
    /// Children reachable here at least as cheaply as through their
    /// current owner are taken over first, unless they cannot be owned.
    fn finalized_choice(&mut self, id: NodeId, cum: i32) -> Option<usize> {
        let len = self.tree.get(id).moves.len();
        let mut best: Option<(usize, i32)> = None;
        let mut null_slot = None;
        let mut null_count = 0u32;

        for slot in 0..len {
            let (kid, owned, edge) = self.edge(id, slot, cum);
            if kid.is_none() {
                null_count += 1;
                if self.rng.gen::<f64>() * null_count as f64 <= 1.0 {
                    null_slot = Some(slot);
                }
                continue;
            }

            if !owned && edge >= self.tree.get(kid).cum && self.tree.can_own(kid) {
                self.tree.activate(id, slot, edge);
                self.stats.reparentings += 1;
            }

            let owned = self.tree.get(id).owned[slot];
            let child = self.tree.get(kid);
            if owned && !child.solved && best.map_or(true, |(_, top)| child.top_score > top) {
                best = Some((slot, child.top_score));
            }
        }

        null_slot.or(best.map(|(slot, _)| slot))
    }

    /// Choice at an exploration depth by UCB. Unexpanded children win
    /// (reservoir sampled). A child owned elsewhere but reachable here with
    /// a strictly better cumulative score is reconquered: a solved one is
    /// replayed if it beats the best solution, an unsolved one is taken
    /// over and competes by UCB.
    fn exploration_choice(&mut self, id: NodeId, cum: i32, depth: usize) -> Selection {
        let (len, ln_visits, c) = {
            let node = self.tree.get(id);
            (
                node.moves.len(),
                (node.visits.max(1) as f64).ln(),
                node.exploration,
            )
        };

        let mut best_slot = None;
        let mut best_ucb = f64::NEG_INFINITY;
        let mut null_slot = None;
        let mut null_count = 0u32;

        for slot in 0..len {
            let (kid, owned, edge) = self.edge(id, slot, cum);
            if kid.is_none() {
                null_count += 1;
                if self.rng.gen::<f64>() * null_count as f64 <= 1.0 {
                    null_slot = Some(slot);
                }
                continue;
            }

            let (solved, kid_cum, top) = {
                let child = self.tree.get(kid);
                (child.solved, child.cum, child.top_score)
            };

            if owned && !solved {
                let ucb = self.tree.get(kid).ucb_score(edge, ln_visits, c);
                if ucb > best_ucb {
                    best_slot = Some(slot);
                    best_ucb = ucb;
                }
            } else if !owned && edge > kid_cum {
                if solved {
                    self.tree.get_mut(kid).cum = edge;
                    if edge.saturating_add(top) > self.best.score {
                        self.stats.solved_replays += 1;
                        let len = self.solved_playout(kid, depth + 1);
                        let mv = self.tree.get(id).moves[slot];
                        self.episode.moves[depth - 1] = mv;
                        self.episode.score += mv.score();
                        return Selection::Finished(len);
                    }
                    continue;
                }
                if !self.tree.can_own(kid) {
                    continue;
                }

                self.tree.activate(id, slot, edge);
                self.stats.reparentings += 1;

                let ucb = self.tree.get(kid).ucb_score(edge, ln_visits, c);
                if ucb > best_ucb {
                    best_slot = Some(slot);
                    best_ucb = ucb;
                }
            }
        }

        if let Some(slot) = null_slot.or(best_slot) {
            return Selection::Child(slot);
        }

        // Starved: nothing owned and unsolved, nothing to expand
        self.tree.deactivate(id);
        if !self.tree.is_alive(id) {
            self.tree.leaf_hit(id, self.boost);
            let node = self.tree.get_mut(id);
            node.live = 0;
            node.solved = true;
            trace!(node = id.0, depth, "node solved by exhaustion");
        } else if id == self.tree.root() {
            self.budget.exhaust();
        }
        Selection::Abandon
    }

    /// Child, ownership flag and cumulative score at the child along `slot`.
    #[inline]
    fn edge(&self, id: NodeId, slot: usize, cum: i32) -> (NodeId, bool, i32) {
        let node = self.tree.get(id);
        (node.children[slot], node.owned[slot], cum + node.scores[slot])
    }

    /// Sample `leaf` with the playout policy; the first simulated move is
    /// move number `depth`.
    fn playout(&mut self, leaf: NodeId, depth: usize) -> usize {
        self.budget.charge(1);
        self.stats.playouts += 1;

        let mut board = self.tree.get(leaf).board.clone();
        self.episode.moves.resize(depth - 1, Move::default());

        let outcome = self.policy.play(
            &mut board,
            &mut self.rng,
            &mut self.budget,
            &mut self.episode.moves,
        );

        let len = self.episode.moves.len();
        self.stats.playout_moves += (len + 1 - depth) as u64;
        if outcome.cleared {
            self.stats.full_clears += 1;
        }

        self.episode.score = outcome.score;
        if !self.episode.from_solved {
            self.tree.get_mut(leaf).record_sample(outcome.score);
        }
        len
    }

    /// Follow the best known line of the solved node `start`, whose first
    /// move is move number `depth`.
    fn solved_playout(&mut self, start: NodeId, depth: usize) -> usize {
        self.episode.from_solved = true;
        self.episode.score = 0;
        self.episode.moves.resize(depth - 1, Move::default());

        let mut id = start;
        let mut depth = depth;
        loop {
            if depth % self.config.traversal_cost_interval == 0 {
                self.budget.charge(1);
            }

            let node = self.tree.get(id);
            let mut best: Option<(usize, i32)> = None;
            for (slot, &kid) in node.children.iter().enumerate() {
                if kid.is_none() {
                    continue;
                }
                let value = self.tree.get(kid).top_score.saturating_add(node.scores[slot]);
                if best.map_or(true, |(_, top)| value > top) {
                    best = Some((slot, value));
                }
            }

            let Some((slot, _)) = best else {
                self.episode.score = self.episode.score.saturating_add(node.top_score);
                if node.board.is_empty() {
                    self.stats.full_clears += 1;
                }
                return self.episode.moves.len();
            };

            let (mv, next) = (node.moves[slot], node.children[slot]);
            self.episode.score += mv.score();
            self.episode.moves.push(mv);
            id = next;
            depth += 1;
        }
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &SearchTree<B> {
        &self.tree
    }

    /// Best solution so far.
    pub fn best(&self) -> &Solution {
        &self.best
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    /// Consume the search, keeping the solution and statistics.
    pub fn into_result(self, run: usize) -> SearchResult {
        SearchResult {
            tree: self.tree.stats(),
            solution: self.best,
            stats: self.stats,
            run,
        }
    }
}
