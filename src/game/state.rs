//! Game State Definitions
//!
//! The single aggregate every stage reads from. Fields are crate-private:
//! outside the crate the state is only ever seen through `&GameState`,
//! and the only way to change it is `GameEngine`.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::game::award::AwardLedger;

// =============================================================================
// QUESTION ID
// =============================================================================

/// Identifier of a quiz question or fill-blank template.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    /// Create from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An id made only of whitespace counts as empty.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for QuestionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for QuestionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// STAGE
// =============================================================================

/// Position of the player in the playthrough.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Stage {
    /// Not started / home screen
    #[default]
    Home = 0,
    /// Stage 1: drag-and-drop jigsaw
    Puzzle = 1,
    /// Stage 2: multiple-choice quiz
    Quiz = 2,
    /// Stage 3: memory card matching
    Memory = 3,
    /// Stage 4: catch the falling ideologies
    Catch = 4,
    /// Stage 5: fill in the blanks
    FillBlank = 5,
    /// All stages complete
    Completed = 6,
}

impl Stage {
    /// The five playable stages, in playthrough order.
    pub const MINI_STAGES: [Stage; 5] = [
        Stage::Puzzle,
        Stage::Quiz,
        Stage::Memory,
        Stage::Catch,
        Stage::FillBlank,
    ];

    /// Get stage from index (0-6).
    pub fn from_index(index: u8) -> Option<Stage> {
        match index {
            0 => Some(Stage::Home),
            1 => Some(Stage::Puzzle),
            2 => Some(Stage::Quiz),
            3 => Some(Stage::Memory),
            4 => Some(Stage::Catch),
            5 => Some(Stage::FillBlank),
            6 => Some(Stage::Completed),
            _ => None,
        }
    }

    /// Numeric index (0 = home, 6 = completed).
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Next stage in playthrough order (None once completed).
    pub fn next(self) -> Option<Stage> {
        Stage::from_index(self.index() + 1)
    }

    /// Is this one of the five playable stages?
    pub fn is_mini_stage(self) -> bool {
        !matches!(self, Stage::Home | Stage::Completed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Home => "home",
            Stage::Puzzle => "puzzle",
            Stage::Quiz => "quiz",
            Stage::Memory => "memory",
            Stage::Catch => "catch",
            Stage::FillBlank => "fill-blank",
            Stage::Completed => "completed",
        };
        f.write_str(name)
    }
}

// =============================================================================
// STAGE 3 POOL
// =============================================================================

/// Stage-local point budget of the memory stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage3Pool {
    pub(crate) points: u32,
    pub(crate) moves: u32,
    pub(crate) completed: bool,
}

impl Stage3Pool {
    /// Points still available to be merged into the score.
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Number of penalised moves made since the stage was entered.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Has the stage been completed since it was last entered?
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of one playthrough.
///
/// `GameState::default()` is the fresh-session state, and `reset_game`
/// restores exactly that value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub(crate) current_stage: Stage,
    pub(crate) score: u32,
    pub(crate) stage1_completed: bool,
    pub(crate) stage2_answers: BTreeMap<QuestionId, usize>,
    pub(crate) stage3: Stage3Pool,
    pub(crate) stage4_committed: bool,
    pub(crate) stage5_answers: BTreeMap<QuestionId, bool>,
    pub(crate) awards: AwardLedger,
}

impl GameState {
    /// Stage the presentation shell should render.
    pub fn current_stage(&self) -> Stage {
        self.current_stage
    }

    /// Cumulative score. Never negative by construction.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Has the puzzle been solved this playthrough?
    pub fn stage1_completed(&self) -> bool {
        self.stage1_completed
    }

    /// Last submitted option per quiz question.
    pub fn stage2_answers(&self) -> &BTreeMap<QuestionId, usize> {
        &self.stage2_answers
    }

    /// Memory stage pool, move counter and completion flag.
    pub fn stage3(&self) -> &Stage3Pool {
        &self.stage3
    }

    /// Has the catch stage's final score been committed?
    pub fn stage4_committed(&self) -> bool {
        self.stage4_committed
    }

    /// Last submitted correctness per fill-blank template.
    pub fn stage5_answers(&self) -> &BTreeMap<QuestionId, bool> {
        &self.stage5_answers
    }

    /// One-time awards granted so far.
    pub fn awards(&self) -> &AwardLedger {
        &self.awards
    }

    /// Is this the untouched fresh-session state?
    pub fn is_fresh(&self) -> bool {
        *self == GameState::default()
    }

    /// Compute hash of current state for replay verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.current_stage.index(), self.score, |hasher| {
            hasher.field(&self.stage1_completed);

            hasher.len_prefix(self.stage2_answers.len());
            for (id, option) in &self.stage2_answers {
                hasher.field(id.as_str()).field(option);
            }

            hasher
                .field(&self.stage3.points)
                .field(&self.stage3.moves)
                .field(&self.stage3.completed)
                .field(&self.stage4_committed);

            hasher.len_prefix(self.stage5_answers.len());
            for (id, correct) in &self.stage5_answers {
                hasher.field(id.as_str()).field(correct);
            }

            self.awards.hash_into(hasher);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_progression() {
        assert_eq!(Stage::Home.next(), Some(Stage::Puzzle));
        assert_eq!(Stage::Puzzle.next(), Some(Stage::Quiz));
        assert_eq!(Stage::FillBlank.next(), Some(Stage::Completed));
        assert_eq!(Stage::Completed.next(), None);
    }

    #[test]
    fn test_stage_index_round_trip() {
        for index in 0..=6u8 {
            let stage = Stage::from_index(index).unwrap();
            assert_eq!(stage.index(), index);
        }
        assert_eq!(Stage::from_index(7), None);
    }

    #[test]
    fn test_mini_stages() {
        assert!(!Stage::Home.is_mini_stage());
        assert!(!Stage::Completed.is_mini_stage());
        assert!(Stage::MINI_STAGES.iter().all(|s| s.is_mini_stage()));
    }

    #[test]
    fn test_default_state_is_fresh() {
        let state = GameState::default();
        assert!(state.is_fresh());
        assert_eq!(state.current_stage(), Stage::Home);
        assert_eq!(state.score(), 0);
        assert!(state.awards().is_empty());
    }

    #[test]
    fn test_hash_tracks_ledgers() {
        let base = GameState::default();
        let mut answered = GameState::default();
        answered.stage2_answers.insert(QuestionId::from("q1"), 2);

        assert_eq!(base.compute_hash(), GameState::default().compute_hash());
        assert_ne!(base.compute_hash(), answered.compute_hash());
    }

    #[test]
    fn test_blank_question_id() {
        assert!(QuestionId::from("   ").is_blank());
        assert!(!QuestionId::from("q7").is_blank());
    }
}
