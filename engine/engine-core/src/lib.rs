//! Core traits and types for the SameGame solver
//!
//! This crate defines the contract between the search engine and the
//! board rules:
//! - `Board`: rules authority (move enumeration, move application, scoring, hashing)
//! - `Move`: a removable group identified by one of its cells and its size
//! - `scoring`: the scoring rules every board implementation shares
//!
//! The search never inspects cells directly beyond color tallies; everything
//! else goes through `Board`.

pub mod board;
pub mod scoring;

// Re-export main types for convenience
pub use board::{Board, BoardError, Move, EMPTY};
pub use scoring::{move_score, singleton_penalty, FULL_CLEAR_BONUS, MAX_CELLS};
