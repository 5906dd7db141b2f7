//! Core deterministic primitives.
//!
//! Seeded randomness, fixed-point arena coordinates and state hashing.
//! Nothing in here reads the clock or the OS entropy pool, so a
//! playthrough is fully reproducible from its seed.

pub mod fixed;
pub mod rng;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, HashField, StateHash, StateHasher};
