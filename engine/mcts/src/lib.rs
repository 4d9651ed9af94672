//! Budgeted Monte Carlo Tree Search for single-player SameGame boards.
//!
//! The search works with any board implementing the `engine-core` `Board`
//! trait. It maximizes the final score of one game, so there is no opponent
//! and no value network: leaves are scored by random playouts.
//!
//! # Overview
//!
//! Every iteration walks from the root to a leaf and back:
//!
//! 1. **Selection**: among the children a node owns, pick by UCB over the
//!    mean playout score plus the edge score. Past the finalize frontier the
//!    best known child is followed instead.
//! 2. **Expansion**: play the chosen move and look the resulting layout up in
//!    the transposition table. A layout reached by a better path moves under
//!    the new parent, a worse path becomes a dead link.
//! 3. **Playout**: finish the game from the new node with a [`PlayoutPolicy`].
//! 4. **Backpropagation**: record the sample at every node on the path, shift
//!    its score by each edge on the way up.
//!
//! Nodes whose subtree is fully known are marked solved and their best line is
//! replayed instead of sampled.
//!
//! # Usage
//!
//! ```rust,ignore
//! use games_samegame::SameGame;
//! use mcts::{solve_runs, MctsConfig};
//!
//! let board = SameGame::parse("1 1 2\n2 1 2\n2 2 1")?;
//! let config = MctsConfig::default().with_budget(100_000).with_runs(4);
//! let result = solve_runs(&board, &config)?;
//!
//! println!("score {} in {} moves", result.solution.score, result.solution.moves.len());
//! ```
//!
//! # Budget
//!
//! Cost is counted in abstract units: one per playout move, one per terminal
//! hit and one per [`MctsConfig::traversal_cost_interval`] levels descended.
//! The [`ResourceSchedule`] splits the budget over the first plies so the
//! opening moves get finalized in order.

pub mod config;
pub mod node;
pub mod playout;
pub mod runs;
pub mod schedule;
pub mod search;
pub mod tree;

// Re-export main types
pub use config::{MctsConfig, PlayoutKind};
pub use node::{NodeId, SearchNode};
pub use playout::{tabu_color, PlayoutOutcome, PlayoutPolicy, TabuColorPlayout, UniformPlayout};
pub use runs::{solve, solve_runs, solve_runs_parallel};
pub use schedule::{Budget, ResourceSchedule};
pub use search::{MctsSearch, SearchError, SearchResult, SearchStats, Solution};
pub use tree::{Expansion, LeafHitBoost, SearchTree, TreeError, TreeStats};
