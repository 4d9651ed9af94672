//! Solve entry points: one run, several independent restarts, or several
//! restarts spread over a rayon thread pool.

use std::sync::Mutex;

use engine_core::Board;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{MctsConfig, PlayoutKind};
use crate::playout::{PlayoutPolicy, TabuColorPlayout, UniformPlayout};
use crate::search::{MctsSearch, SearchError, SearchResult};

/// Solve `board` with a single run of `config.budget` units seeded with
/// `config.seed`.
pub fn solve<B: Board>(board: &B, config: &MctsConfig) -> Result<SearchResult, SearchError> {
    config.validate()?;
    run_once(board, config, config.budget, config.seed, 0)
}

/// Solve `board` with `config.runs` independent runs of
/// `budget / runs` units each, run `i` seeded with `seed + i`. Every run
/// starts from an empty tree. The best score wins, ties go to the earlier
/// run.
pub fn solve_runs<B: Board>(board: &B, config: &MctsConfig) -> Result<SearchResult, SearchError> {
    config.validate()?;
    let per_run = run_budget(config);

    let mut best: Option<SearchResult> = None;
    let mut total = crate::search::SearchStats::default();
    for run in 0..config.runs {
        let result = run_once(board, config, per_run, run_seed(config, run), run)?;
        total.merge(&result.stats);
        if best
            .as_ref()
            .map_or(true, |b| result.solution.score > b.solution.score)
        {
            best = Some(result);
        }
    }

    finish(best, total)
}

/// Same result as [`solve_runs`], with the runs executed in parallel.
///
/// Runs share nothing but the best-result record, which is a
/// compare-and-update under a mutex using the same tie rule.
pub fn solve_runs_parallel<B: Board>(
    board: &B,
    config: &MctsConfig,
) -> Result<SearchResult, SearchError> {
    config.validate()?;
    let per_run = run_budget(config);

    let best: Mutex<(Option<SearchResult>, crate::search::SearchStats)> =
        Mutex::new((None, Default::default()));

    (0..config.runs)
        .into_par_iter()
        .try_for_each(|run| -> Result<(), SearchError> {
            let result = run_once(board, config, per_run, run_seed(config, run), run)?;

            let mut guard = best.lock().unwrap_or_else(|e| e.into_inner());
            let (record, total) = &mut *guard;
            total.merge(&result.stats);
            let better = match record {
                None => true,
                Some(b) => {
                    result.solution.score > b.solution.score
                        || (result.solution.score == b.solution.score && result.run < b.run)
                }
            };
            if better {
                *record = Some(result);
            }
            Ok(())
        })?;

    let (record, total) = best.into_inner().unwrap_or_else(|e| e.into_inner());
    finish(record, total)
}

fn run_budget(config: &MctsConfig) -> u64 {
    (config.budget / config.runs as u64).max(1)
}

fn run_seed(config: &MctsConfig, run: usize) -> u64 {
    config.seed.wrapping_add(run as u64)
}

fn finish(
    best: Option<SearchResult>,
    total: crate::search::SearchStats,
) -> Result<SearchResult, SearchError> {
    let mut result =
        best.ok_or_else(|| SearchError::InvalidConfig("no run was executed".into()))?;
    info!(
        score = result.solution.score,
        moves = result.solution.moves.len(),
        best_run = result.run,
        iterations = total.iterations,
        "all runs finished"
    );
    result.stats = total;
    Ok(result)
}

fn run_once<B: Board>(
    board: &B,
    config: &MctsConfig,
    budget: u64,
    seed: u64,
    run: usize,
) -> Result<SearchResult, SearchError> {
    match config.playout {
        PlayoutKind::TabuColor => run_with(
            board,
            config,
            TabuColorPlayout::new(config.tabu_threshold),
            budget,
            seed,
            run,
        ),
        PlayoutKind::Uniform => run_with(board, config, UniformPlayout, budget, seed, run),
    }
}

fn run_with<B: Board, P: PlayoutPolicy<B>>(
    board: &B,
    config: &MctsConfig,
    policy: P,
    budget: u64,
    seed: u64,
    run: usize,
) -> Result<SearchResult, SearchError> {
    debug!(run, budget, seed, playout = %config.playout, "starting run");

    let mut search = MctsSearch::new(board.clone(), config, policy, budget, seed)?;
    search.run();
    if cfg!(debug_assertions) {
        search.tree().check_invariants()?;
    }

    let result = search.into_result(run);
    debug!(
        run,
        score = result.solution.score,
        iterations = result.stats.iterations,
        nodes = result.tree.total_nodes,
        "run finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_samegame::SameGame;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn random_board(seed: u64) -> SameGame {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        SameGame::random(8, 8, 4, &mut rng).unwrap()
    }

    fn replay(start: &SameGame, cells: &[usize]) -> i32 {
        let mut board = start.clone();
        let mut score = 0;
        for &cell in cells {
            score += board.apply(cell).unwrap();
        }
        score + board.end_score()
    }

    #[test]
    fn test_solve_uses_configured_seed() {
        let board = random_board(1);
        let config = MctsConfig::for_testing().with_seed(9);

        let a = solve(&board, &config).unwrap();
        let b = solve(&board, &config).unwrap();
        assert_eq!(a.solution, b.solution);
        assert_eq!(a.run, 0);
        assert_eq!(replay(&board, &a.solution.cells()), a.solution.score);
    }

    #[test]
    fn test_solve_small_boards_across_seeds() {
        for seed in 0..40 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let board = SameGame::random(5, 5, 3, &mut rng).unwrap();
            let config = MctsConfig::default().with_budget(1_000).with_seed(0);

            let result = solve(&board, &config)
                .unwrap_or_else(|e| panic!("seed {} failed: {}", seed, e));
            assert_eq!(replay(&board, &result.solution.cells()), result.solution.score);
        }
    }

    #[test]
    fn test_solve_rejects_invalid_config() {
        let board = random_board(1);
        let config = MctsConfig::for_testing().with_runs(0);
        assert!(matches!(
            solve_runs(&board, &config),
            Err(SearchError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_solve_runs_keeps_best_run() {
        let board = random_board(2);
        let config = MctsConfig::for_testing().with_budget(3_000).with_runs(3);

        let best = solve_runs(&board, &config).unwrap();

        // Each run on its own, with its share of the budget and its seed
        let singles: Vec<i32> = (0..3)
            .map(|run| {
                let single = config
                    .clone()
                    .with_budget(1_000)
                    .with_runs(1)
                    .with_seed(config.seed + run);
                solve(&board, &single).unwrap().solution.score
            })
            .collect();

        let top = *singles.iter().max().unwrap();
        let first_top = singles.iter().position(|&s| s == top).unwrap();
        assert_eq!(best.solution.score, top);
        assert_eq!(best.run, first_top);
        assert_eq!(replay(&board, &best.solution.cells()), top);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let board = random_board(3);
        let config = MctsConfig::for_testing()
            .with_budget(4_000)
            .with_runs(4)
            .with_playout(PlayoutKind::Uniform);

        let sequential = solve_runs(&board, &config).unwrap();
        let parallel = solve_runs_parallel(&board, &config).unwrap();

        assert_eq!(sequential.solution, parallel.solution);
        assert_eq!(sequential.run, parallel.run);
        assert_eq!(sequential.stats.iterations, parallel.stats.iterations);
    }
}
