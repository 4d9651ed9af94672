use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use engine_core::Board;
use games_samegame::SameGame;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn standard_board(seed: u64) -> SameGame {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    SameGame::random(15, 15, 5, &mut rng).unwrap()
}

fn bench_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("samegame_moves");
    let board = standard_board(42);

    group.bench_function("moves_into", |b| {
        let mut out = Vec::with_capacity(64);
        b.iter(|| {
            board.moves_into(&mut out);
            out.len()
        });
    });

    group.bench_function("tabu_moves_into", |b| {
        let mut out = Vec::with_capacity(64);
        b.iter(|| {
            board.tabu_moves_into(1, &mut out);
            out.len()
        });
    });

    group.finish();
}

fn bench_do_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("samegame_do_move");
    let board = standard_board(7);
    let mv = board.moves()[0];

    group.bench_function("first_group", |b| {
        b.iter_batched(
            || board.clone(),
            |mut state| state.do_move(mv, 0),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("samegame_scoring");
    let board = standard_board(11);

    group.bench_function("canonical_hash", |b| b.iter(|| board.canonical_hash()));
    group.bench_function("end_score", |b| b.iter(|| board.end_score()));
    group.bench_function("upper_score", |b| b.iter(|| board.upper_score()));

    group.finish();
}

criterion_group!(benches, bench_moves, bench_do_move, bench_scoring);
criterion_main!(benches);
