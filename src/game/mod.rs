//! Game State Module
//!
//! The cross-stage state container and the only code that mutates it.
//! 100% deterministic.
//!
//! ## Module Structure
//!
//! - `state`: Stage, GameState and the stage sub-states
//! - `award`: Award-once ledger
//! - `rules`: Point values
//! - `events`: Events recorded by the engine for replay/audit
//! - `engine`: The mutation contract
//! - `summary`: Max score, percentage and rating tier

pub mod state;
pub mod award;
pub mod rules;
pub mod events;
pub mod engine;
pub mod summary;

// Re-export key types
pub use state::{GameState, QuestionId, Stage, Stage3Pool};
pub use award::{AwardKey, AwardLedger};
pub use rules::ScoringRules;
pub use events::{GameEvent, GameEventData, ScoreReason};
pub use engine::GameEngine;
pub use summary::{CompletionSummary, Rating, RoundSizes};
