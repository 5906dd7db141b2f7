//! Stage 2: Quiz
//!
//! A round draws `questions_per_round` distinct questions from the pool.
//! The player selects an option, submits once, reads the explanation and
//! moves on. The round keeps its own HUD tally; the cumulative score is
//! the engine's.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::content::QuizQuestion;
use crate::core::rng::DeterministicRng;
use crate::game::engine::GameEngine;
use crate::stages::StageError;

/// Configuration for stage 2.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Questions drawn per round (capped at the pool size)
    pub questions_per_round: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self { questions_per_round: 10 }
    }
}

impl QuizConfig {
    /// A round needs at least one question.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.questions_per_round == 0 {
            return Err(ConfigError::Invalid("quiz.questions_per_round must be > 0".into()));
        }
        Ok(())
    }
}

/// Result of submitting an answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerFeedback {
    /// Selected option was correct
    pub correct: bool,
    /// Index of the correct option
    pub correct_option: usize,
    /// Explanation text
    pub explanation: String,
    /// Did this submission add points?
    pub awarded: bool,
}

/// Where the round stands after `next`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizProgress {
    /// Showing the question with this index
    Question(usize),
    /// Every question was answered
    Finished,
}

/// One quiz round.
#[derive(Clone, Debug)]
pub struct QuizRound {
    questions: Vec<QuizQuestion>,
    index: usize,
    selected: Option<usize>,
    submitted: bool,
    finished: bool,
    correct_count: usize,
    local_score: u32,
}

impl QuizRound {
    /// Draw a round from `pool`.
    pub fn new(
        pool: &[QuizQuestion],
        config: &QuizConfig,
        rng: &mut DeterministicRng,
    ) -> Result<Self, StageError> {
        if pool.is_empty() {
            return Err(StageError::EmptyPool("stage2"));
        }

        let questions = rng.sample(pool, config.questions_per_round);
        info!("Quiz round drawn: {} of {} questions", questions.len(), pool.len());

        Ok(Self {
            questions,
            index: 0,
            selected: None,
            submitted: false,
            finished: false,
            correct_count: 0,
            local_score: 0,
        })
    }

    /// Question currently shown.
    pub fn current(&self) -> Option<&QuizQuestion> {
        if self.finished {
            return None;
        }
        self.questions.get(self.index)
    }

    /// Questions in this round, in play order.
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Index of the current question.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of questions in the round.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Round has no questions?
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Currently selected option.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Correct answers this round.
    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    /// Points this round has earned, for the stage HUD.
    pub fn local_score(&self) -> u32 {
        self.local_score
    }

    /// Every question answered?
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Select an option. Allowed until the answer is submitted.
    pub fn select(&mut self, option: usize) -> Result<(), StageError> {
        if self.finished {
            return Err(StageError::StageFinished);
        }
        if self.submitted {
            return Err(StageError::AlreadyAnswered);
        }
        let question = &self.questions[self.index];
        if option >= question.options.len() {
            return Err(StageError::InvalidOption(option));
        }
        self.selected = Some(option);
        Ok(())
    }

    /// Submit the selected option and report it to the engine.
    pub fn submit(&mut self, engine: &mut GameEngine) -> Result<AnswerFeedback, StageError> {
        if self.finished {
            return Err(StageError::StageFinished);
        }
        if self.submitted {
            return Err(StageError::AlreadyAnswered);
        }
        let option = self.selected.ok_or(StageError::NoSelection)?;

        let question = &self.questions[self.index];
        let correct = question.is_correct(option);
        let awarded = engine.answer_stage2(question.id.clone(), option, correct);

        self.submitted = true;
        if correct {
            self.correct_count += 1;
        }
        if awarded {
            self.local_score += engine.rules().quiz_reward;
        }
        debug!("Quiz {} answered with {}: correct={}", question.id, option, correct);

        Ok(AnswerFeedback {
            correct,
            correct_option: question.correct,
            explanation: question.explanation.clone(),
            awarded,
        })
    }

    /// Move on once the current question was submitted.
    pub fn next(&mut self) -> Result<QuizProgress, StageError> {
        if self.finished {
            return Err(StageError::StageFinished);
        }
        if !self.submitted {
            return Err(StageError::NotAnswered);
        }

        self.selected = None;
        self.submitted = false;
        if self.index + 1 >= self.questions.len() {
            self.finished = true;
            info!("Quiz round finished: {}/{} correct", self.correct_count, self.questions.len());
            return Ok(QuizProgress::Finished);
        }

        self.index += 1;
        Ok(QuizProgress::Question(self.index))
    }
}
