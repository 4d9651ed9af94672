//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_output_dir() -> String {
    defaults::output_dir().into()
}
fn d_budget() -> u64 {
    defaults::budget()
}
fn d_runs() -> usize {
    defaults::runs()
}
fn d_seed() -> u64 {
    defaults::seed()
}
fn d_exploration() -> f64 {
    defaults::exploration()
}
fn d_urgency_limit() -> f64 {
    defaults::urgency_limit()
}
fn d_playout() -> String {
    defaults::playout().into()
}
fn d_tabu_threshold() -> usize {
    defaults::tabu_threshold()
}
fn d_schedule_plies() -> usize {
    defaults::schedule_plies()
}
fn d_schedule_floor() -> u64 {
    defaults::schedule_floor()
}
fn d_upper_bound_pruning() -> bool {
    defaults::upper_bound_pruning()
}
fn d_parallel() -> bool {
    defaults::parallel()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Settings shared by every command
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
    /// Directory for JSON reports when no explicit output path is given
    #[serde(default = "d_output_dir")]
    pub output_dir: String,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
            output_dir: defaults::output_dir().into(),
        }
    }
}

/// Search settings
///
/// `playout` stays a string here so this crate does not depend on the
/// search engine; the binary parses it.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Total resource units over all runs
    #[serde(default = "d_budget")]
    pub budget: u64,
    #[serde(default = "d_runs")]
    pub runs: usize,
    #[serde(default = "d_seed")]
    pub seed: u64,
    /// UCB exploration constant, in score units
    #[serde(default = "d_exploration")]
    pub exploration: f64,
    /// Fraction of the budget below which exploration decays
    #[serde(default = "d_urgency_limit")]
    pub urgency_limit: f64,
    /// `tabu` or `uniform`
    #[serde(default = "d_playout")]
    pub playout: String,
    #[serde(default = "d_tabu_threshold")]
    pub tabu_threshold: usize,
    #[serde(default = "d_schedule_plies")]
    pub schedule_plies: usize,
    #[serde(default = "d_schedule_floor")]
    pub schedule_floor: u64,
    #[serde(default = "d_upper_bound_pruning")]
    pub upper_bound_pruning: bool,
    /// Run restarts on the rayon pool
    #[serde(default = "d_parallel")]
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            budget: defaults::budget(),
            runs: defaults::runs(),
            seed: defaults::seed(),
            exploration: defaults::exploration(),
            urgency_limit: defaults::urgency_limit(),
            playout: defaults::playout().into(),
            tabu_threshold: defaults::tabu_threshold(),
            schedule_plies: defaults::schedule_plies(),
            schedule_floor: defaults::schedule_floor(),
            upper_bound_pruning: defaults::upper_bound_pruning(),
            parallel: defaults::parallel(),
        }
    }
}
