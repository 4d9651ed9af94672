//! Configuration for the solver binary
//!
//! Configuration is loaded from config.toml with environment variable overrides.
//! CLI arguments take highest priority, followed by env vars, then config.toml.

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use engine_config::{load_config, CentralConfig};
use mcts::{MctsConfig, PlayoutKind};
use once_cell::sync::Lazy;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

// Load central config once at startup
static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

// Default value functions that read from central config
fn default_budget() -> u64 {
    CENTRAL_CONFIG.search.budget
}

fn default_runs() -> usize {
    CENTRAL_CONFIG.search.runs
}

fn default_seed() -> u64 {
    CENTRAL_CONFIG.search.seed
}

fn default_exploration() -> f64 {
    CENTRAL_CONFIG.search.exploration
}

fn default_urgency_limit() -> f64 {
    CENTRAL_CONFIG.search.urgency_limit
}

fn default_playout() -> String {
    CENTRAL_CONFIG.search.playout.clone()
}

fn default_tabu_threshold() -> usize {
    CENTRAL_CONFIG.search.tabu_threshold
}

fn default_schedule_plies() -> usize {
    CENTRAL_CONFIG.search.schedule_plies
}

fn default_schedule_floor() -> u64 {
    CENTRAL_CONFIG.search.schedule_floor
}

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(&CENTRAL_CONFIG.common.output_dir)
}

#[derive(Parser, Debug, Clone)]
#[command(name = "solver")]
#[command(about = "SameGame solver - budgeted Monte Carlo tree search")]
#[command(
    long_about = "Reads a SameGame board (one row per line, top row first, whitespace
separated color numbers, 0 for empty) and searches for the highest scoring
sequence of clicks.

Configuration is loaded from config.toml with environment variable overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Board file to solve
    pub board: PathBuf,

    /// Total resource units, split evenly over the runs
    #[arg(long, default_value_t = default_budget())]
    pub budget: u64,

    /// Independent restarts, each with a fresh tree
    #[arg(long, default_value_t = default_runs())]
    pub runs: usize,

    /// Seed of the first run; run i uses seed + i
    #[arg(long, default_value_t = default_seed())]
    pub seed: u64,

    /// Playout policy (tabu, uniform)
    #[arg(long, default_value_t = default_playout())]
    pub playout: String,

    /// Execute the runs on all cores (`--parallel=false` to turn off)
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = CENTRAL_CONFIG.search.parallel
    )]
    pub parallel: bool,

    /// UCB exploration constant, in score units
    #[arg(long, default_value_t = default_exploration())]
    pub exploration: f64,

    /// Fraction of the budget below which exploration starts to decay
    #[arg(long, default_value_t = default_urgency_limit())]
    pub urgency_limit: f64,

    /// Blocks left on the board above which playouts avoid the majority color
    #[arg(long, default_value_t = default_tabu_threshold())]
    pub tabu_threshold: usize,

    /// Plies that get a dedicated share of the budget
    #[arg(long, default_value_t = default_schedule_plies())]
    pub schedule_plies: usize,

    /// Smallest share a scheduled ply gets
    #[arg(long, default_value_t = default_schedule_floor())]
    pub schedule_floor: u64,

    /// Cancel subtrees whose optimistic bound cannot beat the best solution
    /// (`--upper-bound-pruning=false` to turn off)
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        default_value_t = CENTRAL_CONFIG.search.upper_bound_pruning
    )]
    pub upper_bound_pruning: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Write a JSON report to this path
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write a JSON report named after the board into --output-dir
    #[arg(long)]
    pub report: bool,

    /// Directory for reports written with --report
    #[arg(long, default_value_os_t = default_output_dir())]
    pub output_dir: PathBuf,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.budget == 0 {
            return Err(anyhow!("budget must be greater than 0"));
        }

        if self.runs == 0 {
            return Err(anyhow!("runs must be greater than 0"));
        }

        if self.runs as u64 > self.budget {
            return Err(anyhow!(
                "runs ({}) cannot exceed budget ({})",
                self.runs,
                self.budget
            ));
        }

        self.playout_kind()?;

        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(anyhow!("exploration must be a non-negative number"));
        }

        if !(0.0..=1.0).contains(&self.urgency_limit) {
            return Err(anyhow!("urgency_limit must be between 0 and 1"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    /// Where to write the JSON report, if anywhere. An explicit `--output`
    /// wins; `--report` names the file after the board inside `output_dir`.
    pub fn report_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.output {
            return Some(path.clone());
        }
        if !self.report {
            return None;
        }
        let mut name = self
            .board
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "board".into());
        name.push(format!("-{}.json", self.seed));
        Some(self.output_dir.join(name))
    }

    pub fn playout_kind(&self) -> Result<PlayoutKind> {
        self.playout
            .parse::<PlayoutKind>()
            .map_err(|e| anyhow!("playout: {}", e))
    }

    /// Search settings for the engine. Constants without a flag keep the
    /// engine defaults.
    pub fn mcts_config(&self) -> Result<MctsConfig> {
        Ok(MctsConfig::default()
            .with_budget(self.budget)
            .with_runs(self.runs)
            .with_seed(self.seed)
            .with_exploration(self.exploration)
            .with_urgency_limit(self.urgency_limit)
            .with_playout(self.playout_kind()?)
            .with_tabu_threshold(self.tabu_threshold)
            .with_schedule(self.schedule_plies, self.schedule_floor)
            .with_upper_bound_pruning(self.upper_bound_pruning))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            board: PathBuf::from("boards/sample.txt"),
            budget: 10_000,
            runs: 2,
            seed: 7,
            playout: "tabu".into(),
            parallel: false,
            exploration: 105.0,
            urgency_limit: 0.3,
            tabu_threshold: 48,
            schedule_plies: 30,
            schedule_floor: 2048,
            upper_bound_pruning: false,
            log_level: "info".into(),
            output: None,
            report: false,
            output_dir: PathBuf::from("./data"),
        }
    }

    #[test]
    fn validate_accepts_valid_configuration() {
        let cfg = base_config();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_budget() {
        let mut cfg = base_config();
        cfg.budget = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("budget"));
    }

    #[test]
    fn validate_rejects_zero_runs() {
        let mut cfg = base_config();
        cfg.runs = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("runs"));
    }

    #[test]
    fn validate_rejects_more_runs_than_budget() {
        let mut cfg = base_config();
        cfg.budget = 3;
        cfg.runs = 4;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("cannot exceed budget"));
    }

    #[test]
    fn validate_rejects_unknown_playout() {
        let mut cfg = base_config();
        cfg.playout = "greedy".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("playout"));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "nope".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn validate_rejects_out_of_range_urgency() {
        let mut cfg = base_config();
        cfg.urgency_limit = 1.5;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("urgency_limit"));
    }

    #[test]
    fn report_path_prefers_explicit_output() {
        let mut cfg = base_config();
        assert_eq!(cfg.report_path(), None);

        cfg.report = true;
        assert_eq!(
            cfg.report_path(),
            Some(PathBuf::from("./data").join("sample-7.json"))
        );

        cfg.output_dir = PathBuf::from("/tmp/reports");
        assert_eq!(
            cfg.report_path(),
            Some(PathBuf::from("/tmp/reports/sample-7.json"))
        );

        cfg.output = Some(PathBuf::from("out/solve.json"));
        assert_eq!(cfg.report_path(), Some(PathBuf::from("out/solve.json")));
    }

    #[test]
    fn boolean_flags_can_be_switched_both_ways() {
        let cfg = Config::try_parse_from(["solver", "board.txt", "--parallel", "--runs", "2"])
            .unwrap();
        assert!(cfg.parallel);
        assert_eq!(cfg.runs, 2);

        let cfg = Config::try_parse_from([
            "solver",
            "board.txt",
            "--parallel=false",
            "--upper-bound-pruning=false",
        ])
        .unwrap();
        assert!(!cfg.parallel);
        assert!(!cfg.upper_bound_pruning);

        let cfg =
            Config::try_parse_from(["solver", "--upper-bound-pruning=true", "board.txt"]).unwrap();
        assert!(cfg.upper_bound_pruning);
        assert_eq!(cfg.board, PathBuf::from("board.txt"));
    }

    #[test]
    fn mcts_config_carries_flags() {
        let mut cfg = base_config();
        cfg.playout = "uniform".into();
        cfg.upper_bound_pruning = true;

        let mcts = cfg.mcts_config().unwrap();
        assert_eq!(mcts.budget, 10_000);
        assert_eq!(mcts.runs, 2);
        assert_eq!(mcts.seed, 7);
        assert_eq!(mcts.playout, PlayoutKind::Uniform);
        assert_eq!(mcts.schedule_floor, 2048);
        assert!(mcts.upper_bound_pruning);
        assert!(mcts.validate().is_ok());
    }
}
