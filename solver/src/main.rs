//! Solver - command-line front end for the SameGame MCTS engine
//!
//! A one-shot process that:
//! 1. Loads a board file
//! 2. Runs one or several budgeted searches (optionally on all cores)
//! 3. Replays the best move list on a fresh board to validate it
//! 4. Prints the score and clicks, and optionally writes a JSON report

use anyhow::{anyhow, Result};
use clap::Parser;
use engine_core::Board;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{error, info};

mod board_file;
mod config;
mod report;

use crate::board_file::load_board;
use crate::config::Config;
use crate::report::{format_moves, replay, SolveReport};

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Spinner on stderr while the search runs, only when stderr is a TTY.
fn spinner(message: String) -> Option<ProgressBar> {
    if !std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({elapsed})")
    {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

fn run(config: &Config) -> Result<()> {
    let board = load_board(&config.board)?;
    let search_config = config.mcts_config()?;

    info!(
        budget = search_config.budget,
        runs = search_config.runs,
        seed = search_config.seed,
        playout = %search_config.playout,
        parallel = config.parallel,
        "Starting search"
    );

    let progress = spinner(format!(
        "searching {}x{} board",
        board.width(),
        board.height()
    ));
    let outcome = if search_config.runs == 1 {
        mcts::solve(&board, &search_config)
    } else if config.parallel {
        mcts::solve_runs_parallel(&board, &search_config)
    } else {
        mcts::solve_runs(&board, &search_config)
    };
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let result = outcome.map_err(|e| anyhow!("search failed: {}", e))?;

    let replayed =
        replay(&board, &result).map_err(|e| anyhow!("solution failed validation: {}", e))?;
    info!(
        score = replayed.total,
        moves = replayed.clicks.len(),
        cleared = replayed.cleared,
        best_run = result.run,
        iterations = result.stats.iterations,
        nodes = result.tree.total_nodes,
        transpositions = result.stats.transpositions,
        elapsed_ms = result.stats.elapsed.as_millis() as u64,
        "Search finished"
    );

    println!("score: {}", replayed.total);
    println!("moves: {}", replayed.clicks.len());
    println!("{}", format_moves(&replayed.clicks));

    if let Some(path) = config.report_path() {
        SolveReport::new(&config.board, &board, &search_config, &result, &replayed)
            .write(&path)?;
        info!(path = %path.display(), "Report written");
    }

    Ok(())
}

fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Validate configuration
    config.validate()?;

    // Initialize tracing
    init_tracing(&config.log_level)?;
    info!(log_level = %config.log_level, "Tracing initialized");

    match run(&config) {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Solver failed: {}", e);
            Err(e)
        }
    }
}
