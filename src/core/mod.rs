//! Core deterministic primitives.
//!
//! Integer ratio math and the seeded PRNG used by every room.
//! Nothing in here touches I/O, clocks, or global state.

pub mod permille;
pub mod rng;

// Re-export core types
pub use permille::{Permille, PERMILLE_ONE, apply_permille, clamp_permille};
pub use rng::{DeterministicRng, HitRoll, derive_room_seed};
