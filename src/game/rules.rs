//! Scoring Rules
//!
//! Fixed point values of every award the engine can grant.

use serde::{Serialize, Deserialize};

use crate::config::ConfigError;

/// Point values applied by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// One-time bonus for solving the puzzle
    pub puzzle_bonus: u32,
    /// Reward per quiz question, first correct answer only
    pub quiz_reward: u32,
    /// Memory pool value on entering stage 3
    pub memory_pool_start: u32,
    /// Pool deduction per mismatched pair
    pub memory_mismatch_penalty: u32,
    /// Reward per fill-blank template, first correct answer only
    pub fill_blank_reward: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            puzzle_bonus: 100,
            quiz_reward: 10,
            memory_pool_start: 500,
            memory_mismatch_penalty: 10,
            fill_blank_reward: 100,
        }
    }
}

impl ScoringRules {
    /// Largest single award must fit an `i32` delta.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let largest = [
            self.puzzle_bonus,
            self.quiz_reward,
            self.memory_pool_start,
            self.fill_blank_reward,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        if largest > i32::MAX as u32 {
            return Err(ConfigError::Invalid(format!(
                "award of {largest} points does not fit a score delta"
            )));
        }
        Ok(())
    }
}
