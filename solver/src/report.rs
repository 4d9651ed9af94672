//! Solution replay and the JSON report.
//!
//! The returned move list is replayed click by click on a fresh copy of the
//! input board before anything is printed, so a reported score is always one
//! the board actually produces.

use anyhow::{anyhow, Result};
use engine_core::Board;
use games_samegame::SameGame;
use mcts::SearchResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// One click, in board coordinates (`y = 0` is the top row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Click {
    pub x: usize,
    pub y: usize,
    pub area: u16,
    pub score: i32,
}

/// Outcome of replaying a solution on the input board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    pub clicks: Vec<Click>,
    pub end_score: i32,
    pub total: i32,
    pub cleared: bool,
}

/// Click every move of `result` on a copy of `board` and compare the total
/// with the score the search reported.
pub fn replay(board: &SameGame, result: &SearchResult) -> Result<Replay> {
    let mut scratch = board.clone();
    let mut clicks = Vec::with_capacity(result.solution.moves.len());
    let mut total = 0;

    for (ply, mv) in result.solution.moves.iter().enumerate() {
        let cell = mv.cell as usize;
        // Coordinates are taken before the click: the cell is gone afterwards
        let (x, y) = scratch.coords(cell);
        let score = scratch
            .apply(cell)
            .map_err(|e| anyhow!("move {} ({}) is not legal: {}", ply + 1, mv, e))?;
        total += score;
        clicks.push(Click {
            x,
            y,
            area: mv.area,
            score,
        });
    }

    if !scratch.moves().is_empty() {
        return Err(anyhow!(
            "solution stops after {} moves with groups left on the board",
            clicks.len()
        ));
    }

    let end_score = scratch.end_score();
    total += end_score;
    if total != result.solution.score {
        return Err(anyhow!(
            "replayed score {} differs from reported score {}",
            total,
            result.solution.score
        ));
    }

    Ok(Replay {
        clicks,
        end_score,
        total,
        cleared: scratch.is_empty(),
    })
}

/// Serializable summary of a solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    pub board: String,
    pub width: usize,
    pub height: usize,
    pub colors: u8,
    pub score: i32,
    pub end_score: i32,
    pub cleared: bool,
    pub moves: Vec<Click>,
    pub budget: u64,
    pub runs: usize,
    pub seed: u64,
    pub playout: String,
    pub best_run: usize,
    pub iterations: u64,
    pub playouts: u64,
    pub nodes: usize,
    pub transpositions: u64,
    pub elapsed_seconds: f64,
    pub timestamp: u64,
}

impl SolveReport {
    pub fn new(
        board_path: &Path,
        board: &SameGame,
        config: &mcts::MctsConfig,
        result: &SearchResult,
        replay: &Replay,
    ) -> Self {
        Self {
            board: board_path.display().to_string(),
            width: board.width(),
            height: board.height(),
            colors: board.num_colors(),
            score: replay.total,
            end_score: replay.end_score,
            cleared: replay.cleared,
            moves: replay.clicks.clone(),
            budget: config.budget,
            runs: config.runs,
            seed: config.seed,
            playout: config.playout.to_string(),
            best_run: result.run,
            iterations: result.stats.iterations,
            playouts: result.stats.playouts,
            nodes: result.tree.total_nodes,
            transpositions: result.stats.transpositions,
            elapsed_seconds: result.stats.elapsed.as_secs_f64(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Write the report as JSON (write-then-rename).
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| anyhow!("failed to serialize report: {}", e))?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| anyhow!("failed to create {}: {}", dir.display(), e))?;
        }

        // Write to temp file then rename (atomic on most filesystems)
        let temp_path = path.with_extension("json.tmp");
        let mut file = fs::File::create(&temp_path)
            .map_err(|e| anyhow!("failed to create {}: {}", temp_path.display(), e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| anyhow!("failed to write {}: {}", temp_path.display(), e))?;

        if let Err(e) = fs::rename(&temp_path, path) {
            // Try to clean up temp file
            let _ = fs::remove_file(&temp_path);
            return Err(anyhow!(
                "failed to rename report to {}: {}",
                path.display(),
                e
            ));
        }

        debug!("Wrote report to {}", path.display());
        Ok(())
    }
}

/// Human readable move list, `x,y` per click.
pub fn format_moves(clicks: &[Click]) -> String {
    clicks
        .iter()
        .map(|c| format!("{},{}", c.x, c.y))
        .collect::<Vec<_>>()
        .join(" ")
}
