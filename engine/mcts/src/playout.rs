//! Playout policies: turn a leaf board into a finished-game score sample.

use engine_core::{Board, Move};
use rand::Rng;

use crate::schedule::Budget;

/// Result of one playout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayoutOutcome {
    /// Score of the simulated moves plus the terminal score
    pub score: i32,
    /// Whether the playout cleared the board
    pub cleared: bool,
}

/// A leaf evaluation strategy.
///
/// Implementations play `board` until no legal move is left, charging one
/// budget unit per simulated move and appending every chosen move to
/// `moves`.
pub trait PlayoutPolicy<B: Board>: Send + Sync {
    fn play<R: Rng + ?Sized>(
        &self,
        board: &mut B,
        rng: &mut R,
        budget: &mut Budget,
        moves: &mut Vec<Move>,
    ) -> PlayoutOutcome;
}

/// Pick uniformly among all legal moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPlayout;

impl<B: Board> PlayoutPolicy<B> for UniformPlayout {
    fn play<R: Rng + ?Sized>(
        &self,
        board: &mut B,
        rng: &mut R,
        budget: &mut Budget,
        moves: &mut Vec<Move>,
    ) -> PlayoutOutcome {
        let mut legal = Vec::new();
        let mut score = 0;

        loop {
            board.moves_into(&mut legal);
            if legal.is_empty() {
                return finish(board, score);
            }
            let mv = legal[rng.gen_range(0..legal.len())];
            moves.push(mv);
            score = board.do_move(mv, score);
            budget.charge(1);
        }
    }
}

/// Avoid the most populous color while more than `threshold` blocks
/// remain, then play uniformly.
///
/// Keeping the majority color intact tends to produce one large late
/// group instead of many small ones.
#[derive(Debug, Clone, Copy)]
pub struct TabuColorPlayout {
    pub threshold: usize,
}

impl TabuColorPlayout {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl<B: Board> PlayoutPolicy<B> for TabuColorPlayout {
    fn play<R: Rng + ?Sized>(
        &self,
        board: &mut B,
        rng: &mut R,
        budget: &mut Budget,
        moves: &mut Vec<Move>,
    ) -> PlayoutOutcome {
        let counts = board.color_counts();
        let tabu = tabu_color(&counts, rng);
        let mut blocks: usize = counts[1..].iter().map(|&n| n as usize).sum();

        let mut legal = Vec::new();
        let mut score = 0;

        loop {
            if blocks > self.threshold {
                board.tabu_moves_into(tabu, &mut legal);
                // Only the tabu color is left to play: fall back to it
                // rather than stop early.
                if legal.is_empty() {
                    board.moves_into(&mut legal);
                }
            } else {
                board.moves_into(&mut legal);
            }

            if legal.is_empty() {
                return finish(board, score);
            }
            let mv = legal[rng.gen_range(0..legal.len())];
            moves.push(mv);
            score = board.do_move(mv, score);
            blocks -= mv.area as usize;
            budget.charge(1);
        }
    }
}

/// Most populous color, ties broken uniformly by reservoir sampling.
/// `counts[0]` (empty cells) is ignored.
pub fn tabu_color<R: Rng + ?Sized>(counts: &[u32], rng: &mut R) -> u8 {
    let mut tabu = 1;
    let mut ties = 1u32;
    for color in 2..counts.len() {
        if counts[color] > counts[tabu] {
            tabu = color;
            ties = 1;
        } else if counts[color] == counts[tabu] {
            ties += 1;
            if rng.gen::<f64>() * (ties as f64) < 1.0 {
                tabu = color;
            }
        }
    }
    tabu as u8
}

fn finish<B: Board>(board: &B, score: i32) -> PlayoutOutcome {
    PlayoutOutcome {
        score: score + board.end_score(),
        cleared: board.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use games_samegame::SameGame;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// Replay `moves` on `start`, checking each one against the legal list
    /// at the moment it is played, and return the final score.
    fn replay(start: &SameGame, moves: &[Move]) -> i32 {
        let mut board = start.clone();
        let mut score = 0;
        for &mv in moves {
            assert!(
                board.moves().contains(&mv),
                "move {} is not legal on\n{}",
                mv,
                board
            );
            score = board.do_move(mv, score);
        }
        assert!(board.moves().is_empty());
        score + board.end_score()
    }

    fn check_policy<P: PlayoutPolicy<SameGame>>(policy: P) {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for _ in 0..20 {
            let start = SameGame::random(10, 10, 4, &mut rng).unwrap();
            let mut board = start.clone();
            let mut budget = Budget::new(10_000);
            let mut moves = Vec::new();

            let outcome = policy.play(&mut board, &mut rng, &mut budget, &mut moves);

            assert_eq!(outcome.score, replay(&start, &moves));
            assert_eq!(outcome.cleared, board.is_empty());
            assert_eq!(budget.used(), moves.len() as u64);
        }
    }

    #[test]
    fn test_uniform_playout_is_legal() {
        check_policy(UniformPlayout);
    }

    #[test]
    fn test_tabu_playout_is_legal() {
        check_policy(TabuColorPlayout::new(48));
    }

    #[test]
    fn test_tabu_playout_avoids_majority_color() {
        // Color 1 dominates; with a high threshold the first move must not
        // touch it while another group exists
        let start = SameGame::parse("1 1 1 1\n1 1 1 1\n2 2 3 3").unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(9);

        for _ in 0..10 {
            let mut board = start.clone();
            let mut budget = Budget::new(100);
            let mut moves = Vec::new();
            TabuColorPlayout::new(1).play(&mut board, &mut rng, &mut budget, &mut moves);
            assert_ne!(start.color_at(moves[0].cell as usize), 1);
        }
    }

    #[test]
    fn test_tabu_playout_falls_back_when_only_tabu_moves_remain() {
        let start = SameGame::parse("1 1\n1 1").unwrap();
        let mut board = start.clone();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut budget = Budget::new(100);
        let mut moves = Vec::new();

        let outcome = TabuColorPlayout::new(0).play(&mut board, &mut rng, &mut budget, &mut moves);
        assert_eq!(moves, vec![Move::new(0, 4)]);
        assert!(outcome.cleared);
        assert_eq!(outcome.score, 4 + engine_core::FULL_CLEAR_BONUS);
    }

    #[test]
    fn test_playout_on_terminal_board() {
        let start = SameGame::parse("1 2\n2 1").unwrap();
        let mut board = start.clone();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let mut budget = Budget::new(100);
        let mut moves = Vec::new();

        let outcome = UniformPlayout.play(&mut board, &mut rng, &mut budget, &mut moves);
        assert!(moves.is_empty());
        assert_eq!(outcome.score, start.end_score());
        assert_eq!(budget.used(), 0);
    }

    #[test]
    fn test_tabu_color_tie_breaking() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        assert_eq!(tabu_color(&[0, 3, 7, 2], &mut rng), 2);

        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[tabu_color(&[0, 5, 5, 5], &mut rng) as usize] = true;
        }
        assert_eq!(seen, [false, true, true, true]);
    }
}
