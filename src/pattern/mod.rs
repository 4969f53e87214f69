//! Gesture grid geometry and candidate generation
//!
//! The candidate pool is every path of 4 to 9 distinct points on the 3x3
//! grid that never jumps over an unvisited point.

pub mod grid;
pub mod code;
pub mod generator;

pub use grid::{is_valid_move, middle_of, Point, JUMP_PAIRS};
pub use code::{Code, MAX_CODE_LEN, MIN_CODE_LEN};
pub use generator::{generate_codes, CandidatePool, PoolStats, TOTAL_CODES};
