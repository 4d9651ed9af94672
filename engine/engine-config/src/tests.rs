//! Tests for the configuration module.

use super::*;

#[test]
fn test_default_config() {
    let config = CentralConfig::default();
    assert_eq!(config.common.log_level, "info");
    assert_eq!(config.common.output_dir, "./data");
    assert_eq!(config.search.budget, 5_000_000);
    assert_eq!(config.search.runs, 1);
    assert_eq!(config.search.seed, 42);
}

#[test]
fn test_search_defaults() {
    let config = CentralConfig::default();
    assert!((config.search.exploration - 105.0).abs() < f64::EPSILON);
    assert!((config.search.urgency_limit - 0.30).abs() < f64::EPSILON);
    assert_eq!(config.search.playout, "tabu");
    assert_eq!(config.search.tabu_threshold, 48);
    assert_eq!(config.search.schedule_plies, 30);
    assert_eq!(config.search.schedule_floor, 2048);
    assert!(!config.search.upper_bound_pruning);
    assert!(!config.search.parallel);
}

#[test]
fn test_samegame_env_overrides() {
    std::env::set_var("SAMEGAME_SEARCH_RUNS", "8");
    std::env::set_var("SAMEGAME_SEARCH_PLAYOUT", "uniform");
    std::env::set_var("SAMEGAME_SEARCH_PARALLEL", "true");
    std::env::set_var("SAMEGAME_SEARCH_EXPLORATION", "not-a-number");

    let config = apply_env_overrides(CentralConfig::default());
    assert_eq!(config.search.runs, 8);
    assert_eq!(config.search.playout, "uniform");
    assert!(config.search.parallel);
    // Unparseable values keep the previous setting
    assert!((config.search.exploration - 105.0).abs() < f64::EPSILON);

    std::env::remove_var("SAMEGAME_SEARCH_RUNS");
    std::env::remove_var("SAMEGAME_SEARCH_PLAYOUT");
    std::env::remove_var("SAMEGAME_SEARCH_PARALLEL");
    std::env::remove_var("SAMEGAME_SEARCH_EXPLORATION");
}

#[test]
fn test_parse_config_toml() {
    let toml_content = r#"
[common]
log_level = "debug"
output_dir = "/custom/data"

[search]
budget = 1000000
runs = 4
playout = "uniform"
upper_bound_pruning = true
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.common.log_level, "debug");
    assert_eq!(config.common.output_dir, "/custom/data");
    assert_eq!(config.search.budget, 1_000_000);
    assert_eq!(config.search.runs, 4);
    assert_eq!(config.search.playout, "uniform");
    assert!(config.search.upper_bound_pruning);
}

#[test]
fn test_partial_config() {
    let toml_content = r#"
[search]
seed = 7
"#;
    let config: CentralConfig = toml::from_str(toml_content).unwrap();
    assert_eq!(config.search.seed, 7);
    assert_eq!(config.search.budget, 5_000_000); // Default
    assert_eq!(config.search.tabu_threshold, 48); // Default
    assert_eq!(config.common.log_level, "info"); // Default
}

#[test]
fn test_load_from_missing_path_falls_back_to_defaults() {
    let config = load_from_path(std::path::Path::new("/nonexistent/samegame/config.toml"));
    assert_eq!(config.search.schedule_floor, 2048);
}
