//! Presentation Shell
//!
//! Drives a playthrough from the home screen to the completion screen.
//! The shell owns the engine and whichever stage engine is active, so
//! leaving a stage always tears its timers down.
//!
//! - `shell`: `Playthrough` navigator, stage factories, HUD snapshot
//! - `live`: real-time tokio driver for the catch stage

pub mod shell;
pub mod live;

pub use shell::{ActiveStage, CatchHud, HudSnapshot, Playthrough};
pub use live::{run_catch_live, LiveOutcome};

use crate::config::ConfigError;
use crate::content::ContentError;
use crate::game::state::Stage;
use crate::stages::StageError;

/// Session errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Content bank rejected.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Stage engine rejected the interaction.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Operation belongs to another stage.
    #[error("Expected stage {expected}, currently at {actual}")]
    WrongStage {
        /// Stage the operation needs
        expected: Stage,
        /// Stage the playthrough is at
        actual: Stage,
    },

    /// Only mini-stages can be advanced or re-entered.
    #[error("Not in a mini-stage (at {0})")]
    NotInMiniStage(Stage),

    /// Summary requested before the last stage was finished.
    #[error("Playthrough not completed")]
    NotCompleted,
}
