//! Completion Summary
//!
//! Values derived from a finished `GameState`: the best achievable score
//! for the configured round sizes, the percentage reached and a rating
//! tier for the completion screen.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::game::award::AwardKey;
use crate::game::rules::ScoringRules;
use crate::game::state::GameState;

/// Rating tier by percentage of the maximum score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    /// Below 60%
    KeepLearning,
    /// 60% or more
    Proficient,
    /// 80% or more
    Mastered,
    /// Exactly 100%
    Exemplary,
}

impl Rating {
    /// Tier for a percentage in 0..=100.
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            100..=u8::MAX => Rating::Exemplary,
            80..=99 => Rating::Mastered,
            60..=79 => Rating::Proficient,
            _ => Rating::KeepLearning,
        }
    }

    /// Message shown on the completion screen.
    pub fn message(self) -> &'static str {
        match self {
            Rating::Exemplary => "An exemplary citizen of the Ho Chi Minh generation!",
            Rating::Mastered => "You have mastered the knowledge about Ho Chi Minh!",
            Rating::Proficient => "You have a good understanding of Ho Chi Minh.",
            Rating::KeepLearning => "Keep going to learn more about Ho Chi Minh!",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rating::Exemplary => "exemplary",
            Rating::Mastered => "mastered",
            Rating::Proficient => "proficient",
            Rating::KeepLearning => "keep-learning",
        };
        f.write_str(name)
    }
}

/// Round sizes the maximum score depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundSizes {
    /// Questions in a quiz round
    pub quiz_questions: usize,
    /// Catch-stage target score
    pub catch_target: u32,
    /// Fill-blank templates
    pub fill_templates: usize,
}

/// Best achievable score:
/// puzzle bonus + quiz reward x questions + pool start + catch target
/// + fill reward x templates.
pub fn max_score(rules: &ScoringRules, sizes: RoundSizes) -> u32 {
    let quiz = rules.quiz_reward as u64 * sizes.quiz_questions as u64;
    let fill = rules.fill_blank_reward as u64 * sizes.fill_templates as u64;
    let total = rules.puzzle_bonus as u64
        + quiz
        + rules.memory_pool_start as u64
        + sizes.catch_target as u64
        + fill;
    total.min(u32::MAX as u64) as u32
}

/// Rounded percentage of `max`, capped at 100.
pub fn percentage(score: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    let pct = (score as u64 * 100 + max as u64 / 2) / max as u64;
    pct.min(100) as u8
}

/// What the completion screen shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    /// Cumulative score
    pub score: u32,
    /// Best achievable score
    pub max_score: u32,
    /// Rounded, capped percentage
    pub percentage: u8,
    /// Tier
    pub rating: Rating,
    /// Puzzle bonus earned
    pub puzzle_completed: bool,
    /// Quiz questions rewarded
    pub quiz_correct: usize,
    /// Memory pool merged into the score, if the board was cleared
    pub memory_points: Option<u32>,
    /// Catch stage committed
    pub catch_committed: bool,
    /// Fill-blank templates rewarded
    pub fill_correct: usize,
}

impl CompletionSummary {
    /// Summarise `state` against `max_score`.
    pub fn from_state(state: &GameState, max_score: u32) -> Self {
        let percentage = percentage(state.score(), max_score);
        let awards = state.awards();

        let quiz_correct = awards
            .iter()
            .filter(|key| matches!(key, AwardKey::Stage2Question(_)))
            .count();
        let fill_correct = awards
            .iter()
            .filter(|key| matches!(key, AwardKey::Stage5Question(_)))
            .count();
        let memory_points = awards
            .is_granted(&AwardKey::Stage3Complete)
            .then(|| state.stage3().points());

        Self {
            score: state.score(),
            max_score,
            percentage,
            rating: Rating::from_percentage(percentage),
            puzzle_completed: state.stage1_completed(),
            quiz_correct,
            memory_points,
            catch_committed: state.stage4_committed(),
            fill_correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::GameEngine;

    fn sizes() -> RoundSizes {
        RoundSizes { quiz_questions: 10, catch_target: 100, fill_templates: 5 }
    }

    #[test]
    fn test_default_max_score() {
        // 100 + 10*10 + 500 + 100 + 100*5
        assert_eq!(max_score(&ScoringRules::default(), sizes()), 1300);
    }

    #[test]
    fn test_percentage_rounds_and_caps() {
        assert_eq!(percentage(0, 1300), 0);
        assert_eq!(percentage(650, 1300), 50);
        assert_eq!(percentage(1293, 1300), 99);
        assert_eq!(percentage(1294, 1300), 100);
        assert_eq!(percentage(2000, 1300), 100);
        assert_eq!(percentage(10, 0), 0);
    }

    #[test]
    fn test_rating_tiers() {
        assert_eq!(Rating::from_percentage(100), Rating::Exemplary);
        assert_eq!(Rating::from_percentage(99), Rating::Mastered);
        assert_eq!(Rating::from_percentage(80), Rating::Mastered);
        assert_eq!(Rating::from_percentage(79), Rating::Proficient);
        assert_eq!(Rating::from_percentage(60), Rating::Proficient);
        assert_eq!(Rating::from_percentage(59), Rating::KeepLearning);
        assert_eq!(Rating::from_percentage(0), Rating::KeepLearning);
    }

    #[test]
    fn test_summary_from_state() {
        let mut engine = GameEngine::new(ScoringRules::default());
        engine.complete_stage1();
        engine.answer_stage2("q1", 0, true);
        engine.answer_stage2("q2", 1, false);
        engine.start_stage3();
        engine.record_stage3_move();
        engine.complete_stage3();
        engine.answer_stage5("fill1", true);

        let summary = CompletionSummary::from_state(engine.state(), 1300);
        assert_eq!(summary.score, 100 + 10 + 490 + 100);
        assert_eq!(summary.percentage, 54);
        assert_eq!(summary.rating, Rating::KeepLearning);
        assert!(summary.puzzle_completed);
        assert_eq!(summary.quiz_correct, 1);
        assert_eq!(summary.memory_points, Some(490));
        assert!(!summary.catch_committed);
        assert_eq!(summary.fill_correct, 1);
    }
}
