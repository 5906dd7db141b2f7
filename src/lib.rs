//! # Stage Quest
//!
//! Cross-stage game state and scoring engine for a five-stage educational
//! game: jigsaw puzzle, quiz, memory match, catch-the-ideology and fill in
//! the blanks.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        STAGE QUEST                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 arena coordinates                  │
//! │  ├── rng.rs      - Deterministic Xoroshiro128+ PRNG          │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Game state (deterministic)                │
//! │  ├── state.rs    - Stage, GameState, stage sub-states        │
//! │  ├── award.rs    - Award-once ledger                         │
//! │  ├── rules.rs    - Point values                              │
//! │  ├── events.rs   - Engine event log                          │
//! │  ├── engine.rs   - The only mutation surface                 │
//! │  └── summary.rs  - Max score, percentage, rating             │
//! │                                                              │
//! │  content/        - Stage content bank (JSON)                 │
//! │                                                              │
//! │  stages/         - Headless stage engines                    │
//! │  ├── timer.rs    - Stage-local interval timers               │
//! │  └── puzzle, quiz, memory, catch, fill_blank                 │
//! │                                                              │
//! │  session/        - Presentation shell                        │
//! │  ├── shell.rs    - Playthrough navigator, HUD                │
//! │  └── live.rs     - Real-time catch driver (tokio)            │
//! │                                                              │
//! │  config.rs       - GameConfig, JSON loading                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scoring Guarantees
//!
//! Stage engines propose score changes; `GameEngine` decides what lands:
//! - The cumulative score never goes below zero
//! - One-time awards (puzzle bonus, each quiz question, memory pool,
//!   catch commit, each fill-blank template) apply at most once per
//!   playthrough
//! - Nothing from the catch stage lands after its final commit
//!
//! ## Determinism
//!
//! Everything below `session/live.rs` is deterministic: seeded RNG,
//! integer arithmetic, BTreeMap/BTreeSet ordering and timers driven by
//! elapsed time rather than the wall clock. A playthrough replayed from
//! the same id with the same inputs ends in the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod content;
pub mod stages;
pub mod session;
pub mod config;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::core::hash::StateHash;
pub use config::{ConfigError, GameConfig, CONFIG_ENV_VAR};
pub use content::{ContentBank, ContentError};
pub use game::{CompletionSummary, GameEngine, GameEvent, GameState, QuestionId, Rating, ScoringRules, Stage};
pub use session::{Playthrough, SessionError};
pub use stages::StageError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
