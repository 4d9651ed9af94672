//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::Path;
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from subdirectory)
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by SAMEGAME_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    // Check for explicit config path
    if let Ok(path) = std::env::var("SAMEGAME_CONFIG") {
        let path = Path::new(&path);
        if path.exists() {
            info!("Loading config from SAMEGAME_CONFIG: {}", path.display());
            return load_from_path(path);
        }
        warn!(
            "SAMEGAME_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    // Search default locations
    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    // Fall back to defaults
    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (u64, f64, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        if let Ok(v) =
            std::env::var($key).and_then(|s| s.parse().map_err(|_| std::env::VarError::NotPresent))
        {
            $config.$section.$field = v;
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: SAMEGAME_<SECTION>_<KEY>.
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.log_level, "SAMEGAME_COMMON_LOG_LEVEL");
    env_override!(config, common.output_dir, "SAMEGAME_COMMON_OUTPUT_DIR");

    // Search
    env_override!(config, search.budget, "SAMEGAME_SEARCH_BUDGET", parse);
    env_override!(config, search.runs, "SAMEGAME_SEARCH_RUNS", parse);
    env_override!(config, search.seed, "SAMEGAME_SEARCH_SEED", parse);
    env_override!(
        config,
        search.exploration,
        "SAMEGAME_SEARCH_EXPLORATION",
        parse
    );
    env_override!(
        config,
        search.urgency_limit,
        "SAMEGAME_SEARCH_URGENCY_LIMIT",
        parse
    );
    env_override!(config, search.playout, "SAMEGAME_SEARCH_PLAYOUT");
    env_override!(
        config,
        search.tabu_threshold,
        "SAMEGAME_SEARCH_TABU_THRESHOLD",
        parse
    );
    env_override!(
        config,
        search.schedule_plies,
        "SAMEGAME_SEARCH_SCHEDULE_PLIES",
        parse
    );
    env_override!(
        config,
        search.schedule_floor,
        "SAMEGAME_SEARCH_SCHEDULE_FLOOR",
        parse
    );
    env_override!(
        config,
        search.upper_bound_pruning,
        "SAMEGAME_SEARCH_UPPER_BOUND_PRUNING",
        parse
    );
    env_override!(config, search.parallel, "SAMEGAME_SEARCH_PARALLEL", parse);

    config
}
