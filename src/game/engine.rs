//! Game State Engine
//!
//! Owns the `GameState` and is the only code allowed to mutate it.
//! Stage engines and the presentation shell call the methods below;
//! every method leaves the state invariants intact:
//!
//! - the score never goes below zero,
//! - each one-time award is applied at most once per playthrough,
//! - the memory pool never goes below zero,
//! - after the catch stage's final commit no further catch deltas land.
//!
//! None of the operations can fail. Malformed arguments are programmer
//! errors: they assert in debug builds and are ignored in release builds.

use tracing::{debug, info, warn};

use crate::game::award::AwardKey;
use crate::game::events::{GameEvent, GameEventData, ScoreReason};
use crate::game::rules::ScoringRules;
use crate::game::state::{GameState, QuestionId, Stage};

/// Report a misuse of the engine API.
///
/// Panics in debug builds; logs and lets the caller no-op otherwise.
fn programmer_error(message: &str) {
    warn!("Rejected engine call: {}", message);
    debug_assert!(false, "{}", message);
}

/// The single mutation surface over `GameState`.
#[derive(Debug, Default)]
pub struct GameEngine {
    state: GameState,
    rules: ScoringRules,
    pending_events: Vec<GameEvent>,
    next_seq: u64,
}

impl GameEngine {
    /// Create an engine with a fresh state.
    pub fn new(rules: ScoringRules) -> Self {
        Self {
            state: GameState::default(),
            rules,
            pending_events: Vec::new(),
            next_seq: 0,
        }
    }

    /// Read-only view of the state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Scoring rules in effect.
    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Cumulative score.
    pub fn score(&self) -> u32 {
        self.state.score
    }

    /// Current stage.
    pub fn current_stage(&self) -> Stage {
        self.state.current_stage
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn push_event(&mut self, data: GameEventData) {
        let event = GameEvent::new(self.next_seq, self.state.current_stage, data);
        self.next_seq += 1;

        #[cfg(feature = "debug-tracing")]
        tracing::trace!(seq = event.seq, stage = %event.stage, data = ?event.data, "game event");

        self.pending_events.push(event);
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Set the current stage. Does not touch any stage sub-state.
    pub fn move_to_stage(&mut self, stage: Stage) {
        let from = self.state.current_stage;
        self.state.current_stage = stage;
        info!("Stage {} -> {}", from, stage);
        self.push_event(GameEventData::StageEntered { from, to: stage });
    }

    /// Set the current stage from a raw index (0-6).
    ///
    /// Out-of-range indices are rejected. Returns whether the move happened.
    pub fn move_to_stage_index(&mut self, index: i64) -> bool {
        let stage = u8::try_from(index).ok().and_then(Stage::from_index);
        match stage {
            Some(stage) => {
                self.move_to_stage(stage);
                true
            }
            None => {
                programmer_error(&format!("stage index {index} out of range 0..=6"));
                false
            }
        }
    }

    // =========================================================================
    // SCORE
    // =========================================================================

    /// Add a (possibly negative) delta to the score, clamped at zero.
    ///
    /// Returns the new score.
    pub fn add_score(&mut self, delta: i32) -> u32 {
        self.apply_delta(delta.into(), ScoreReason::Direct);
        self.state.score
    }

    /// Apply a delta and record it. Returns the delta actually applied.
    fn apply_delta(&mut self, delta: i64, reason: ScoreReason) -> i64 {
        let before = i64::from(self.state.score);
        let after = before.saturating_add(delta).clamp(0, i64::from(u32::MAX));
        self.state.score = after as u32;

        let applied = after - before;
        self.push_event(GameEventData::ScoreChanged {
            reason,
            requested: delta,
            applied,
            new_score: self.state.score,
        });
        applied
    }

    /// Apply `points` only if `key` has never been granted.
    ///
    /// Returns whether the award was granted.
    fn award_once(&mut self, key: AwardKey, points: u32, reason: ScoreReason) -> bool {
        if !self.state.awards.grant(key.clone()) {
            warn!("Award {} already granted, ignoring", key);
            self.push_event(GameEventData::AwardRepeated { key });
            return false;
        }

        self.apply_delta(points.into(), reason);
        debug!("Award {} granted: +{} (score {})", key, points, self.state.score);
        self.push_event(GameEventData::AwardGranted { key, points });
        true
    }

    // =========================================================================
    // STAGE 1: PUZZLE
    // =========================================================================

    /// Mark the puzzle solved and grant the one-time bonus.
    ///
    /// Idempotent: returns `true` only on the call that granted the bonus.
    pub fn complete_stage1(&mut self) -> bool {
        if self.state.stage1_completed {
            return false;
        }

        self.state.stage1_completed = true;
        self.push_event(GameEventData::StageCompleted { stage: Stage::Puzzle });
        self.award_once(AwardKey::Stage1Complete, self.rules.puzzle_bonus, ScoreReason::PuzzleBonus)
    }

    // =========================================================================
    // STAGE 2: QUIZ
    // =========================================================================

    /// Record the submitted option for audit. Never changes the score.
    ///
    /// A later call for the same question overwrites the stored option.
    pub fn record_stage2_answer(&mut self, question_id: impl Into<QuestionId>, option: usize) {
        let question_id = question_id.into();
        if question_id.is_blank() {
            programmer_error("stage 2 answer recorded with an empty question id");
            return;
        }

        self.state.stage2_answers.insert(question_id.clone(), option);
        self.push_event(GameEventData::AnswerRecorded { stage: Stage::Quiz, question_id });
    }

    /// Award `points` for a question, at most once per question id.
    pub fn award_stage2(&mut self, question_id: impl Into<QuestionId>, points: u32) -> bool {
        let question_id = question_id.into();
        if question_id.is_blank() {
            programmer_error("stage 2 award with an empty question id");
            return false;
        }

        self.award_once(AwardKey::Stage2Question(question_id), points, ScoreReason::QuizAnswer)
    }

    /// Record an answer and, if correct, award the quiz reward once.
    ///
    /// Returns whether points were awarded by this call.
    pub fn answer_stage2(
        &mut self,
        question_id: impl Into<QuestionId>,
        option: usize,
        correct: bool,
    ) -> bool {
        let question_id = question_id.into();
        if question_id.is_blank() {
            programmer_error("stage 2 answer with an empty question id");
            return false;
        }

        self.record_stage2_answer(question_id.clone(), option);
        if !correct {
            return false;
        }
        self.award_stage2(question_id, self.rules.quiz_reward)
    }

    // =========================================================================
    // STAGE 3: MEMORY
    // =========================================================================

    /// Enter the memory stage: hard reset of pool, moves and completion flag.
    ///
    /// The one-time pool award is not reset; only `reset_game` clears it.
    pub fn start_stage3(&mut self) {
        self.state.stage3.points = self.rules.memory_pool_start;
        self.state.stage3.moves = 0;
        self.state.stage3.completed = false;
        debug!("Memory pool reset to {}", self.state.stage3.points);
        self.push_event(GameEventData::MemoryStarted { pool: self.state.stage3.points });
    }

    /// Count a mismatched pair and deduct the penalty from the pool.
    ///
    /// Returns the remaining pool.
    pub fn record_stage3_move(&mut self) -> u32 {
        let pool = &mut self.state.stage3;
        pool.moves = pool.moves.saturating_add(1);
        pool.points = pool.points.saturating_sub(self.rules.memory_mismatch_penalty);

        let (moves, points) = (pool.moves, pool.points);
        self.push_event(GameEventData::MemoryMismatch { moves, pool: points });
        points
    }

    /// Complete the memory stage and merge the remaining pool into the score.
    ///
    /// No-op while the completion flag is set. Returns whether the pool
    /// was awarded by this call.
    pub fn complete_stage3(&mut self) -> bool {
        if self.state.stage3.completed {
            return false;
        }

        self.state.stage3.completed = true;
        self.push_event(GameEventData::StageCompleted { stage: Stage::Memory });
        let pool = self.state.stage3.points;
        self.award_once(AwardKey::Stage3Complete, pool, ScoreReason::MemoryPool)
    }

    // =========================================================================
    // STAGE 4: CATCH
    // =========================================================================

    /// Apply a catch-stage delta computed by the stage engine.
    ///
    /// The engine trusts the delta (combo math is the stage's business)
    /// but still enforces the zero floor. Deltas arriving after the final
    /// commit are ignored.
    ///
    /// Returns the delta that actually landed after the floor, or `None`
    /// if the stage is already committed.
    pub fn add_stage4_score(&mut self, delta: i32) -> Option<i32> {
        if self.state.stage4_committed {
            warn!("Catch delta {} arrived after final commit, ignoring", delta);
            self.push_event(GameEventData::LateScoreIgnored { requested: delta });
            return None;
        }

        // Never larger in magnitude than the request.
        let applied = self.apply_delta(delta.into(), ScoreReason::CatchLive);
        Some(applied as i32)
    }

    /// Take back the live deltas of a catch attempt that did not win.
    ///
    /// `applied` is the sum of what `add_stage4_score` returned during the
    /// attempt. Nothing is taken back once the stage is committed.
    /// Returns the amount removed from the score.
    pub fn rollback_stage4_score(&mut self, applied: i64) -> i64 {
        if applied == 0 {
            return 0;
        }
        if self.state.stage4_committed {
            warn!("Catch rollback of {} after final commit, ignoring", applied);
            return 0;
        }

        let removed = -self.apply_delta(-applied, ScoreReason::CatchRollback);
        debug!("Catch attempt rolled back: -{} (score {})", removed, self.state.score);
        removed
    }

    /// Commit the catch stage's final score, exactly once per playthrough.
    pub fn commit_stage4(&mut self, points: u32) -> bool {
        if !self.award_once(AwardKey::Stage4Final, points, ScoreReason::CatchFinal) {
            return false;
        }

        self.state.stage4_committed = true;
        self.push_event(GameEventData::StageCompleted { stage: Stage::Catch });
        true
    }

    // =========================================================================
    // STAGE 5: FILL BLANK
    // =========================================================================

    /// Record correctness for a template and award the reward once.
    ///
    /// The ledger always holds the latest submission; only the first
    /// correct one is rewarded. Returns whether points were awarded.
    pub fn answer_stage5(&mut self, question_id: impl Into<QuestionId>, correct: bool) -> bool {
        let question_id = question_id.into();
        if question_id.is_blank() {
            programmer_error("stage 5 answer with an empty question id");
            return false;
        }

        self.state.stage5_answers.insert(question_id.clone(), correct);
        self.push_event(GameEventData::AnswerRecorded {
            stage: Stage::FillBlank,
            question_id: question_id.clone(),
        });

        if !correct {
            return false;
        }
        self.award_once(
            AwardKey::Stage5Question(question_id),
            self.rules.fill_blank_reward,
            ScoreReason::FillBlankAnswer,
        )
    }

    // =========================================================================
    // RESET
    // =========================================================================

    /// Restore the fresh-session state. Safe from any state.
    pub fn reset_game(&mut self) {
        let final_score = self.state.score;
        self.state = GameState::default();
        info!("Game reset (final score was {})", final_score);
        self.push_event(GameEventData::GameReset { final_score });
    }
}

// =============================================================================
// TESTS
// =============================================================================
