//! Stage Engines
//!
//! Headless versions of the five mini-games. Each one owns its own
//! interaction state and talks to the `GameEngine` only through its
//! public operations, at the moments listed below:
//!
//! - `puzzle`: last piece placed -> `complete_stage1`
//! - `quiz`: each submitted answer -> `answer_stage2`
//! - `memory`: entering -> `start_stage3`, mismatch -> `record_stage3_move`,
//!   last pair -> `complete_stage3`
//! - `catch`: end of round -> `commit_stage4` (or live `add_stage4_score`,
//!   rolled back with `rollback_stage4_score` unless the round is won)
//! - `fill_blank`: each submitted template -> `answer_stage5`
//!
//! `timer` provides the interval timers the catch stage runs on.

pub mod timer;
pub mod puzzle;
pub mod quiz;
pub mod memory;
pub mod catch;
pub mod fill_blank;

pub use timer::{Fired, TimerSet};
pub use puzzle::{Placement, PuzzleBoard, PuzzleConfig, PuzzleLevel};
pub use quiz::{AnswerFeedback, QuizConfig, QuizProgress, QuizRound};
pub use memory::{FlipOutcome, MemoryBoard, MemoryCard, MemoryConfig};
pub use catch::{
    BasketMove, CatchConfig, CatchEvent, CatchGame, CatchPhase, CatchTimer, ComboRule, CommitMode,
    FallingItem,
};
pub use fill_blank::{FillBlankRound, FillFeedback, FillProgress, Segment, BLANK_TOKEN};

/// Illegal interactions with a stage engine.
///
/// These come from the player's input (or a buggy shell), never from the
/// scoring engine, which cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    /// The content pool for this stage is empty.
    #[error("Content pool for {0} is empty")]
    EmptyPool(&'static str),

    /// No puzzle piece with this id.
    #[error("Unknown puzzle piece {0}")]
    UnknownPiece(u32),

    /// Drop target outside the board.
    #[error("Cell ({col}, {row}) is outside the board")]
    CellOutOfBounds {
        /// Column
        col: u32,
        /// Row
        row: u32,
    },

    /// No memory card with this id.
    #[error("Unknown card {0}")]
    UnknownCard(String),

    /// Card was already matched.
    #[error("Card {0} is already matched")]
    CardAlreadyMatched(String),

    /// Card is already face up.
    #[error("Card {0} is already face up")]
    CardAlreadyFaceUp(String),

    /// Option index outside the question's options.
    #[error("Option {0} is out of range")]
    InvalidOption(usize),

    /// Blank index outside the template.
    #[error("Blank {0} is out of range")]
    InvalidBlank(usize),

    /// Submit without a selected option.
    #[error("No option selected")]
    NoSelection,

    /// The shown question was already submitted.
    #[error("Question already answered")]
    AlreadyAnswered,

    /// Tried to move on before answering.
    #[error("Question not answered yet")]
    NotAnswered,

    /// Some blanks are still empty.
    #[error("All blanks must be filled")]
    IncompleteBlanks,

    /// The stage has already ended.
    #[error("Stage already finished")]
    StageFinished,

    /// The stage has not been started.
    #[error("Stage not started")]
    NotStarted,
}
