//! Centralized configuration loading from config.toml.
//!
//! This crate provides the configuration structs and loading logic used by
//! the solver binary.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Command-line flags (handled by the binary)
//! 2. Environment variables (`SAMEGAME_<SECTION>_<KEY>`)
//! 3. config.toml file
//! 4. Built-in defaults
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! SAMEGAME_<SECTION>_<KEY>=value
//!
//! Examples:
//!     SAMEGAME_COMMON_LOG_LEVEL=debug
//!     SAMEGAME_COMMON_OUTPUT_DIR=/data
//!     SAMEGAME_SEARCH_BUDGET=20000000
//!     SAMEGAME_SEARCH_PLAYOUT=uniform
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;

#[cfg(test)]
mod tests;
