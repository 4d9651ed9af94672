//! MCTS benchmarks for performance profiling.
//!
//! Run with: `cargo bench -p mcts`
//!
//! These benchmarks measure:
//! - Full searches with varying budgets on a standard 15x15 board
//! - Playout throughput for both policies
//! - Multi-run drivers, sequential against parallel

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use games_samegame::SameGame;
use mcts::{
    solve_runs, solve_runs_parallel, Budget, MctsConfig, MctsSearch, PlayoutKind, PlayoutPolicy,
    TabuColorPlayout, UniformPlayout,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn standard_board(seed: u64) -> SameGame {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    SameGame::random(15, 15, 5, &mut rng).unwrap()
}

// =============================================================================
// Full search
// =============================================================================

fn bench_search_budget(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_search_budget");
    group.sample_size(20);
    let board = standard_board(42);

    for budget in [10_000u64, 50_000, 200_000] {
        group.throughput(Throughput::Elements(budget));
        group.bench_with_input(BenchmarkId::new("tabu", budget), &budget, |b, &budget| {
            let config = MctsConfig::default().with_budget(budget);
            b.iter(|| {
                let policy = TabuColorPlayout::new(config.tabu_threshold);
                let mut search =
                    MctsSearch::new(board.clone(), &config, policy, budget, config.seed).unwrap();
                black_box(search.run().score)
            });
        });
    }

    group.finish();
}

// =============================================================================
// Playouts
// =============================================================================

fn bench_playouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_playouts");
    let board = standard_board(7);

    group.bench_function("uniform", |b| {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut moves = Vec::with_capacity(128);
        b.iter(|| {
            let mut scratch = board.clone();
            let mut budget = Budget::new(u64::MAX);
            moves.clear();
            black_box(UniformPlayout.play(&mut scratch, &mut rng, &mut budget, &mut moves))
        });
    });

    group.bench_function("tabu_color", |b| {
        let policy = TabuColorPlayout::new(48);
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut moves = Vec::with_capacity(128);
        b.iter(|| {
            let mut scratch = board.clone();
            let mut budget = Budget::new(u64::MAX);
            moves.clear();
            black_box(policy.play(&mut scratch, &mut rng, &mut budget, &mut moves))
        });
    });

    group.finish();
}

// =============================================================================
// Multi-run drivers
// =============================================================================

fn bench_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_runs");
    group.sample_size(10);
    let board = standard_board(3);
    let config = MctsConfig::default()
        .with_budget(100_000)
        .with_runs(4)
        .with_playout(PlayoutKind::TabuColor);

    group.bench_function("sequential_4", |b| {
        b.iter(|| black_box(solve_runs(&board, &config).map(|r| r.solution.score)));
    });

    group.bench_function("parallel_4", |b| {
        b.iter(|| black_box(solve_runs_parallel(&board, &config).map(|r| r.solution.score)));
    });

    group.finish();
}

criterion_group!(benches, bench_search_budget, bench_playouts, bench_runs);
criterion_main!(benches);
