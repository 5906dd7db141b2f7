//! Playthrough Navigator
//!
//! Home -> stages 1..5 -> completed. The navigator decides when stages
//! change; the engine only records it. Entering a stage builds its engine
//! from the content bank, leaving it drops the engine (aborting a running
//! catch round first).

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config::GameConfig;
use crate::content::ContentBank;
use crate::core::hash::StateHash;
use crate::core::rng::{derive_playthrough_seed, DeterministicRng};
use crate::game::engine::GameEngine;
use crate::game::events::GameEvent;
use crate::game::state::Stage;
use crate::game::summary::{max_score, CompletionSummary, RoundSizes};
use crate::session::SessionError;
use crate::stages::{
    AnswerFeedback, BasketMove, CatchEvent, CatchGame, FillBlankRound, FillFeedback, FillProgress,
    FlipOutcome, MemoryBoard, Placement, PuzzleBoard, QuizProgress, QuizRound,
};

/// The stage engine currently on screen.
#[derive(Debug)]
pub enum ActiveStage {
    /// Stage 1
    Puzzle(PuzzleBoard),
    /// Stage 2
    Quiz(QuizRound),
    /// Stage 3
    Memory(MemoryBoard),
    /// Stage 4
    Catch(CatchGame),
    /// Stage 5
    FillBlank(FillBlankRound),
}

/// Catch-stage part of the HUD.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatchHud {
    /// Seconds left on the countdown
    pub remaining_secs: u32,
    /// Stage-local score
    pub stage_score: u32,
    /// Target to win
    pub target_score: u32,
    /// Correct-catch streak
    pub streak: u32,
}

/// Everything the header bar and progress strip show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HudSnapshot {
    /// Playthrough id
    pub playthrough_id: Uuid,
    /// Current stage
    pub stage: Stage,
    /// Cumulative score
    pub score: u32,
    /// Best achievable score
    pub max_score: u32,
    /// Memory pool left
    pub memory_pool: u32,
    /// Memory mismatches
    pub memory_moves: u32,
    /// Quiz questions answered
    pub quiz_answered: usize,
    /// Fill-blank templates answered
    pub fill_answered: usize,
    /// Present while the catch stage is on screen
    pub catch: Option<CatchHud>,
}

/// One playthrough of the five stages.
#[derive(Debug)]
pub struct Playthrough {
    id: Uuid,
    seed: u64,
    started_at: DateTime<Utc>,
    config: GameConfig,
    content: ContentBank,
    engine: GameEngine,
    rng: DeterministicRng,
    active: Option<ActiveStage>,
}

impl Playthrough {
    /// Create a playthrough with a fresh id.
    pub fn new(config: GameConfig, content: ContentBank) -> Result<Self, SessionError> {
        Self::with_id(Uuid::new_v4(), config, content)
    }

    /// Create a playthrough with a known id. Same id, same random draws.
    pub fn with_id(id: Uuid, config: GameConfig, content: ContentBank) -> Result<Self, SessionError> {
        config.validate()?;
        content.validate()?;
        content.check_capacity(config.memory.pairs)?;

        let seed = derive_playthrough_seed(id.as_bytes());
        info!("Playthrough {} created (seed {})", id, seed);

        Ok(Self {
            id,
            seed,
            started_at: Utc::now(),
            engine: GameEngine::new(config.rules.clone()),
            rng: DeterministicRng::new(seed),
            config,
            content,
            active: None,
        })
    }

    /// Playthrough id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Seed derived from the id.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// When the playthrough was created.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Configuration in effect.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Content bank in use.
    pub fn content(&self) -> &ContentBank {
        &self.content
    }

    /// Read-only engine access.
    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.engine.current_stage()
    }

    /// Cumulative score.
    pub fn score(&self) -> u32 {
        self.engine.score()
    }

    /// State digest, for replay checks.
    pub fn state_hash(&self) -> StateHash {
        self.engine.state().compute_hash()
    }

    /// Drain the engine's event log.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.engine.take_events()
    }

    /// Stage engine on screen, if any.
    pub fn active(&self) -> Option<&ActiveStage> {
        self.active.as_ref()
    }

    /// Stage engine and engine together, for drivers that need both.
    pub fn active_with_engine(&mut self) -> (Option<&mut ActiveStage>, &mut GameEngine) {
        (self.active.as_mut(), &mut self.engine)
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Leave the home screen for stage 1.
    pub fn start(&mut self) -> Result<(), SessionError> {
        let actual = self.stage();
        if actual != Stage::Home {
            return Err(SessionError::WrongStage { expected: Stage::Home, actual });
        }
        self.engine.move_to_stage(Stage::Puzzle);
        self.enter_stage()
    }

    /// Move from the current mini-stage to the next (5 -> completed).
    ///
    /// Returns the stage now on screen.
    pub fn advance(&mut self) -> Result<Stage, SessionError> {
        let current = self.stage();
        let next = match current.next() {
            Some(next) if current.is_mini_stage() => next,
            _ => return Err(SessionError::NotInMiniStage(current)),
        };

        self.leave_stage();
        self.engine.move_to_stage(next);
        self.enter_stage()?;
        Ok(next)
    }

    /// Play the current mini-stage again with a fresh stage engine.
    ///
    /// Re-entering the memory stage resets its pool; already granted
    /// awards stay granted.
    pub fn reenter_stage(&mut self) -> Result<(), SessionError> {
        let current = self.stage();
        if !current.is_mini_stage() {
            return Err(SessionError::NotInMiniStage(current));
        }
        self.leave_stage();
        self.enter_stage()
    }

    /// Back to the home screen. Discards the playthrough's progress.
    pub fn home(&mut self) {
        self.leave_stage();
        self.engine.reset_game();
    }

    /// Discard progress and start again at stage 1.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.home();
        self.start()
    }

    fn leave_stage(&mut self) {
        if let Some(ActiveStage::Catch(game)) = self.active.as_mut() {
            game.abort(&mut self.engine);
        }
        self.active = None;
    }

    /// Build the engine for the stage the playthrough is at.
    fn enter_stage(&mut self) -> Result<(), SessionError> {
        let content = &self.content;
        let config = &self.config;
        let rng = &mut self.rng;

        self.active = match self.engine.current_stage() {
            Stage::Puzzle => Some(ActiveStage::Puzzle(PuzzleBoard::new(&content.stage1, &config.puzzle, rng)?)),
            Stage::Quiz => Some(ActiveStage::Quiz(QuizRound::new(&content.stage2, &config.quiz, rng)?)),
            Stage::Memory => Some(ActiveStage::Memory(MemoryBoard::enter(
                &content.stage3,
                &config.memory,
                rng,
                &mut self.engine,
            )?)),
            Stage::Catch => Some(ActiveStage::Catch(CatchGame::new(&content.stage4, &config.catch, rng)?)),
            Stage::FillBlank => Some(ActiveStage::FillBlank(FillBlankRound::new(&content.stage5)?)),
            Stage::Home | Stage::Completed => None,
        };
        Ok(())
    }

    fn wrong_stage(&self, expected: Stage) -> SessionError {
        SessionError::WrongStage { expected, actual: self.stage() }
    }

    // =========================================================================
    // STAGE 1
    // =========================================================================

    /// Puzzle board on screen.
    pub fn puzzle(&self) -> Option<&PuzzleBoard> {
        match self.active.as_ref() {
            Some(ActiveStage::Puzzle(board)) => Some(board),
            _ => None,
        }
    }

    /// Drop a piece on a cell.
    pub fn place_piece(&mut self, piece_id: u32, col: u32, row: u32) -> Result<Placement, SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::Puzzle(board)) => Ok(board.place(piece_id, col, row, &mut self.engine)?),
            _ => Err(self.wrong_stage(Stage::Puzzle)),
        }
    }

    // =========================================================================
    // STAGE 2
    // =========================================================================

    /// Quiz round on screen.
    pub fn quiz(&self) -> Option<&QuizRound> {
        match self.active.as_ref() {
            Some(ActiveStage::Quiz(round)) => Some(round),
            _ => None,
        }
    }

    /// Select an option for the shown question.
    pub fn quiz_select(&mut self, option: usize) -> Result<(), SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::Quiz(round)) => Ok(round.select(option)?),
            _ => Err(self.wrong_stage(Stage::Quiz)),
        }
    }

    /// Submit the selected option.
    pub fn quiz_submit(&mut self) -> Result<AnswerFeedback, SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::Quiz(round)) => Ok(round.submit(&mut self.engine)?),
            _ => Err(self.wrong_stage(Stage::Quiz)),
        }
    }

    /// Go to the next question.
    pub fn quiz_next(&mut self) -> Result<QuizProgress, SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::Quiz(round)) => Ok(round.next()?),
            _ => Err(self.wrong_stage(Stage::Quiz)),
        }
    }

    // =========================================================================
    // STAGE 3
    // =========================================================================

    /// Memory board on screen.
    pub fn memory(&self) -> Option<&MemoryBoard> {
        match self.active.as_ref() {
            Some(ActiveStage::Memory(board)) => Some(board),
            _ => None,
        }
    }

    /// Flip a card.
    pub fn flip_card(&mut self, card_id: &str) -> Result<FlipOutcome, SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::Memory(board)) => Ok(board.flip(card_id, &mut self.engine)?),
            _ => Err(self.wrong_stage(Stage::Memory)),
        }
    }

    // =========================================================================
    // STAGE 4
    // =========================================================================

    /// Catch round on screen.
    pub fn catch_game(&self) -> Option<&CatchGame> {
        match self.active.as_ref() {
            Some(ActiveStage::Catch(game)) => Some(game),
            _ => None,
        }
    }

    /// Start (or retry) the catch round.
    pub fn catch_start(&mut self) -> Result<(), SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::Catch(game)) => {
                game.start(&mut self.engine);
                Ok(())
            }
            _ => Err(self.wrong_stage(Stage::Catch)),
        }
    }

    /// Move the basket.
    pub fn catch_move(&mut self, direction: BasketMove) -> Result<i32, SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::Catch(game)) => Ok(game.move_basket(direction)?),
            _ => Err(self.wrong_stage(Stage::Catch)),
        }
    }

    /// Run the catch round's timers for `elapsed_ms`.
    pub fn catch_advance(&mut self, elapsed_ms: u64) -> Result<Vec<CatchEvent>, SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::Catch(game)) => Ok(game.advance(elapsed_ms, &mut self.engine)),
            _ => Err(self.wrong_stage(Stage::Catch)),
        }
    }

    // =========================================================================
    // STAGE 5
    // =========================================================================

    /// Fill-blank round on screen.
    pub fn fill_blank(&self) -> Option<&FillBlankRound> {
        match self.active.as_ref() {
            Some(ActiveStage::FillBlank(round)) => Some(round),
            _ => None,
        }
    }

    /// Type into a blank.
    pub fn fill_set_blank(&mut self, blank: usize, value: impl Into<String>) -> Result<(), SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::FillBlank(round)) => Ok(round.set_blank(blank, value)?),
            _ => Err(self.wrong_stage(Stage::FillBlank)),
        }
    }

    /// Submit the shown template.
    pub fn fill_submit(&mut self) -> Result<FillFeedback, SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::FillBlank(round)) => Ok(round.submit(&mut self.engine)?),
            _ => Err(self.wrong_stage(Stage::FillBlank)),
        }
    }

    /// Go to the next template.
    pub fn fill_next(&mut self) -> Result<FillProgress, SessionError> {
        match self.active.as_mut() {
            Some(ActiveStage::FillBlank(round)) => Ok(round.next()?),
            _ => Err(self.wrong_stage(Stage::FillBlank)),
        }
    }

    // =========================================================================
    // DERIVED VIEWS
    // =========================================================================

    /// Round sizes for this config and content.
    pub fn round_sizes(&self) -> RoundSizes {
        RoundSizes {
            quiz_questions: self.config.quiz.questions_per_round.min(self.content.stage2.len()),
            catch_target: self.config.catch.target_score,
            fill_templates: self.content.stage5.len(),
        }
    }

    /// Best achievable score.
    pub fn max_score(&self) -> u32 {
        max_score(&self.config.rules, self.round_sizes())
    }

    /// HUD snapshot.
    pub fn hud(&self) -> HudSnapshot {
        let state = self.engine.state();
        let catch = self.catch_game().map(|game| CatchHud {
            remaining_secs: game.remaining_secs(),
            stage_score: game.stage_score(),
            target_score: game.config().target_score,
            streak: game.streak(),
        });

        HudSnapshot {
            playthrough_id: self.id,
            stage: state.current_stage(),
            score: state.score(),
            max_score: self.max_score(),
            memory_pool: state.stage3().points(),
            memory_moves: state.stage3().moves(),
            quiz_answered: state.stage2_answers().len(),
            fill_answered: state.stage5_answers().len(),
            catch,
        }
    }

    /// Completion screen data. Only available once every stage is done.
    pub fn summary(&self) -> Result<CompletionSummary, SessionError> {
        if self.stage() != Stage::Completed {
            return Err(SessionError::NotCompleted);
        }
        Ok(CompletionSummary::from_state(self.engine.state(), self.max_score()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{CatchPhase, CommitMode};

    fn playthrough() -> Playthrough {
        let id = Uuid::from_bytes([7; 16]);
        Playthrough::with_id(id, GameConfig::default(), ContentBank::builtin().unwrap()).unwrap()
    }

    #[test]
    fn test_new_playthrough_is_home() {
        let p = playthrough();
        assert_eq!(p.stage(), Stage::Home);
        assert!(p.active().is_none());
        assert_eq!(p.max_score(), 1300);
        assert!(p.engine().state().is_fresh());
    }

    #[test]
    fn test_same_id_same_seed() {
        let a = playthrough();
        let b = playthrough();
        assert_eq!(a.seed(), b.seed());
    }

    #[test]
    fn test_start_enters_puzzle() {
        let mut p = playthrough();
        p.start().unwrap();
        assert_eq!(p.stage(), Stage::Puzzle);
        assert!(p.puzzle().is_some());

        assert!(matches!(
            p.start(),
            Err(SessionError::WrongStage { expected: Stage::Home, actual: Stage::Puzzle })
        ));
    }

    #[test]
    fn test_advance_walks_every_stage() {
        let mut p = playthrough();
        p.start().unwrap();

        let mut visited = vec![p.stage()];
        while p.stage() != Stage::Completed {
            visited.push(p.advance().unwrap());
        }

        assert_eq!(
            visited,
            vec![
                Stage::Puzzle,
                Stage::Quiz,
                Stage::Memory,
                Stage::Catch,
                Stage::FillBlank,
                Stage::Completed
            ]
        );
        assert!(p.active().is_none());
        assert!(matches!(p.advance(), Err(SessionError::NotInMiniStage(Stage::Completed))));
    }

    #[test]
    fn test_entering_memory_resets_pool() {
        let mut p = playthrough();
        p.start().unwrap();
        p.advance().unwrap();
        p.advance().unwrap();

        assert_eq!(p.stage(), Stage::Memory);
        assert_eq!(p.hud().memory_pool, 500);
        assert_eq!(p.memory().unwrap().pair_count(), 6);
    }

    #[test]
    fn test_operations_check_stage() {
        let mut p = playthrough();
        p.start().unwrap();

        assert!(matches!(
            p.quiz_select(0),
            Err(SessionError::WrongStage { expected: Stage::Quiz, actual: Stage::Puzzle })
        ));
        assert!(p.flip_card("x").is_err());
        assert!(p.catch_advance(16).is_err());
    }

    #[test]
    fn test_leaving_catch_aborts_round() {
        let mut p = playthrough();
        p.start().unwrap();
        for _ in 0..3 {
            p.advance().unwrap();
        }
        p.catch_start().unwrap();
        p.catch_advance(2_000).unwrap();
        assert_eq!(p.catch_game().unwrap().phase(), CatchPhase::Playing);
        assert!(p.hud().catch.is_some());

        p.advance().unwrap();
        assert!(p.catch_game().is_none());
        assert!(!p.engine().state().stage4_committed());
    }

    #[test]
    fn test_leaving_live_catch_rolls_back_score() {
        let mut config = GameConfig::default();
        config.catch.commit_mode = CommitMode::Live;
        config.catch.basket_width = config.catch.arena_width;
        config.catch.target_score = 10_000;
        let mut content = ContentBank::builtin().unwrap();
        content.stage4.retain(|item| item.is_correct);

        let mut p = Playthrough::with_id(Uuid::from_bytes([7; 16]), config, content).unwrap();
        p.start().unwrap();
        let pieces = p.puzzle().unwrap().pieces().to_vec();
        for piece in pieces {
            p.place_piece(piece.id, piece.col, piece.row).unwrap();
        }
        for _ in 0..3 {
            p.advance().unwrap();
        }
        assert_eq!(p.score(), 100);

        p.catch_start().unwrap();
        p.catch_advance(20_000).unwrap();
        assert_eq!(p.catch_game().unwrap().phase(), CatchPhase::Playing);
        assert!(p.score() > 100);

        p.catch_start().unwrap();
        assert_eq!(p.score(), 100);
        p.catch_advance(20_000).unwrap();
        assert!(p.score() > 100);

        p.advance().unwrap();
        assert_eq!(p.stage(), Stage::FillBlank);
        assert_eq!(p.score(), 100);
    }

    #[test]
    fn test_home_resets_progress() {
        let mut p = playthrough();
        p.start().unwrap();
        let pieces = p.puzzle().unwrap().pieces().to_vec();
        for piece in pieces {
            p.place_piece(piece.id, piece.col, piece.row).unwrap();
        }
        assert_eq!(p.score(), 100);

        p.home();
        assert_eq!(p.stage(), Stage::Home);
        assert!(p.engine().state().is_fresh());

        p.restart().unwrap();
        assert_eq!(p.stage(), Stage::Puzzle);
        assert_eq!(p.score(), 0);
    }

    #[test]
    fn test_summary_only_when_completed() {
        let mut p = playthrough();
        assert!(matches!(p.summary(), Err(SessionError::NotCompleted)));

        p.start().unwrap();
        while p.stage() != Stage::Completed {
            p.advance().unwrap();
        }
        let summary = p.summary().unwrap();
        assert_eq!(summary.score, 0);
        assert_eq!(summary.max_score, 1300);
    }

    #[test]
    fn test_hud_serializes() {
        let p = playthrough();
        let json = serde_json::to_value(p.hud()).unwrap();
        assert_eq!(json["stage"], serde_json::json!("Home"));
        assert_eq!(json["score"], 0);
    }
}
