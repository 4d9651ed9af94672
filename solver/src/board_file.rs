//! Board file loading.

use anyhow::{anyhow, Result};
use engine_core::Board;
use games_samegame::SameGame;
use std::fs;
use std::path::Path;
use tracing::info;

/// Read and parse a board file.
pub fn load_board(path: &Path) -> Result<SameGame> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read board file {}: {}", path.display(), e))?;
    let board = SameGame::parse(&text)
        .map_err(|e| anyhow!("failed to parse board file {}: {}", path.display(), e))?;

    info!(
        path = %path.display(),
        width = board.width(),
        height = board.height(),
        colors = board.num_colors(),
        blocks = board.block_count(),
        "Board loaded"
    );
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_board_reads_rows_top_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("board.txt");
        fs::write(&path, "# sample\n1 2 2\n1 1 3\n").unwrap();

        let board = load_board(&path).unwrap();
        assert_eq!(board.width(), 3);
        assert_eq!(board.height(), 2);
        assert_eq!(board.num_colors(), 3);
        assert_eq!(board.block_count(), 6);
    }

    #[test]
    fn load_board_reports_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_board(&dir.path().join("missing.txt")).unwrap_err();
        assert!(err.to_string().contains("failed to read board file"));
    }

    #[test]
    fn load_board_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, "1 2\n1 x\n").unwrap();

        let err = load_board(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse board file"));
    }
}
