//! MCTS configuration parameters.

use std::fmt;
use std::str::FromStr;

use crate::search::SearchError;

/// Leaf evaluation strategy used for playouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayoutKind {
    /// Avoid the most populous color while many blocks remain.
    #[default]
    TabuColor,
    /// Uniformly random legal moves.
    Uniform,
}

impl FromStr for PlayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tabu" | "tabu_color" | "tabucolor" => Ok(Self::TabuColor),
            "uniform" | "random" => Ok(Self::Uniform),
            other => Err(format!(
                "unknown playout policy '{}' (expected 'tabu' or 'uniform')",
                other
            )),
        }
    }
}

impl fmt::Display for PlayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TabuColor => write!(f, "tabu"),
            Self::Uniform => write!(f, "uniform"),
        }
    }
}

/// Configuration for one solve (or one batch of independent runs).
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Total resource units. One unit is charged per playout, per simulated
    /// playout move and per `traversal_cost_interval` levels of descent.
    pub budget: u64,

    /// Number of independent runs for the multi-run drivers. Each run gets
    /// `budget / runs` units.
    pub runs: usize,

    /// Seed of the first run; run `i` uses `seed + i`.
    pub seed: u64,

    /// Initial exploration constant `c` of every node.
    pub exploration: f64,

    /// Fraction of the budget below which nodes that never reached a
    /// terminal state start decaying their exploration constant.
    pub urgency_limit: f64,

    /// Per-visit multiplier applied to `c` under urgency.
    pub urgency_decay: f64,

    /// Lower bound for `c` under urgency.
    pub urgency_floor: f64,

    /// Multiplier applied to the terminal node's `c` on a leaf hit. Each
    /// ancestor gets a slightly smaller boost.
    pub leaf_hit_boost: f64,

    /// Decay of the leaf-hit multiplier per ancestor level.
    pub leaf_hit_decay: f64,

    /// The leaf-hit multiplier never drops below this value.
    pub leaf_hit_floor: f64,

    /// Number of leading plies that get a dedicated budget frame.
    pub schedule_plies: usize,

    /// Minimum size of a ply's frame.
    pub schedule_floor: u64,

    /// Each frame takes `remaining / schedule_divisor` of the budget.
    pub schedule_divisor: f64,

    /// One unit of budget is charged every this many levels of descent.
    pub traversal_cost_interval: usize,

    /// Tabu playouts restrict moves while more than this many blocks remain.
    pub tabu_threshold: usize,

    /// Playout policy.
    pub playout: PlayoutKind,

    /// Cancel subtrees whose optimistic bound cannot beat the best score.
    pub upper_bound_pruning: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            budget: 5_000_000,
            runs: 1,
            seed: 42,
            exploration: 0.021 * 5000.0,
            urgency_limit: 0.30,
            urgency_decay: 0.9995,
            urgency_floor: 8.0,
            leaf_hit_boost: 1.05,
            leaf_hit_decay: 0.999,
            leaf_hit_floor: 1.001,
            schedule_plies: 30,
            schedule_floor: 64 * 32,
            schedule_divisor: 7.0,
            traversal_cost_interval: 8,
            tabu_threshold: 48,
            playout: PlayoutKind::TabuColor,
            upper_bound_pruning: false,
        }
    }
}

impl MctsConfig {
    /// Create a small config for tests and benches.
    pub fn for_testing() -> Self {
        Self {
            budget: 2_000,
            schedule_floor: 64,
            ..Self::default()
        }
    }

    /// Builder pattern: set the total budget.
    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = budget;
        self
    }

    /// Builder pattern: set the number of independent runs.
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    /// Builder pattern: set the seed of the first run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder pattern: set the initial exploration constant.
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration = c;
        self
    }

    /// Builder pattern: set the urgency threshold.
    pub fn with_urgency_limit(mut self, limit: f64) -> Self {
        self.urgency_limit = limit;
        self
    }

    /// Builder pattern: set the playout policy.
    pub fn with_playout(mut self, playout: PlayoutKind) -> Self {
        self.playout = playout;
        self
    }

    /// Builder pattern: set the tabu block threshold.
    pub fn with_tabu_threshold(mut self, threshold: usize) -> Self {
        self.tabu_threshold = threshold;
        self
    }

    /// Builder pattern: set the per-ply schedule.
    pub fn with_schedule(mut self, plies: usize, floor: u64) -> Self {
        self.schedule_plies = plies;
        self.schedule_floor = floor;
        self
    }

    /// Builder pattern: toggle upper-bound pruning.
    pub fn with_upper_bound_pruning(mut self, enabled: bool) -> Self {
        self.upper_bound_pruning = enabled;
        self
    }

    /// Check that the configuration describes a runnable search.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.runs == 0 {
            return Err(SearchError::InvalidConfig("runs must be at least 1".into()));
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(SearchError::InvalidConfig(format!(
                "exploration must be a non-negative number, got {}",
                self.exploration
            )));
        }
        if !(0.0..=1.0).contains(&self.urgency_limit) {
            return Err(SearchError::InvalidConfig(format!(
                "urgency_limit must be within [0, 1], got {}",
                self.urgency_limit
            )));
        }
        if self.schedule_divisor < 1.0 {
            return Err(SearchError::InvalidConfig(format!(
                "schedule_divisor must be at least 1, got {}",
                self.schedule_divisor
            )));
        }
        if self.traversal_cost_interval == 0 {
            return Err(SearchError::InvalidConfig(
                "traversal_cost_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert_eq!(config.budget, 5_000_000);
        assert!((config.exploration - 105.0).abs() < 1e-9);
        assert_eq!(config.schedule_floor, 2048);
        assert_eq!(config.playout, PlayoutKind::TabuColor);
        assert!(!config.upper_bound_pruning);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_budget(100)
            .with_runs(4)
            .with_playout(PlayoutKind::Uniform);

        assert_eq!(config.budget, 100);
        assert_eq!(config.runs, 4);
        assert_eq!(config.playout, PlayoutKind::Uniform);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(MctsConfig::default().with_runs(0).validate().is_err());
        assert!(MctsConfig::default().with_exploration(-1.0).validate().is_err());
        assert!(MctsConfig::default()
            .with_urgency_limit(1.5)
            .validate()
            .is_err());
    }

    #[test]
    fn test_playout_kind_parsing() {
        assert_eq!("tabu".parse::<PlayoutKind>(), Ok(PlayoutKind::TabuColor));
        assert_eq!("Uniform".parse::<PlayoutKind>(), Ok(PlayoutKind::Uniform));
        assert!("greedy".parse::<PlayoutKind>().is_err());
        assert_eq!(PlayoutKind::TabuColor.to_string(), "tabu");
    }
}
