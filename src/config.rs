//! Game Configuration
//!
//! Every tunable in one serde struct. Missing fields fall back to the
//! defaults, so a config file only needs to name what it changes.

use std::path::Path;
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::game::rules::ScoringRules;
use crate::stages::catch::CatchConfig;
use crate::stages::memory::MemoryConfig;
use crate::stages::puzzle::PuzzleConfig;
use crate::stages::quiz::QuizConfig;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "STAGE_QUEST_CONFIG";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema.
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Full game configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Point values used by the engine
    pub rules: ScoringRules,
    /// Stage 1 level table
    pub puzzle: PuzzleConfig,
    /// Stage 2 round size
    pub quiz: QuizConfig,
    /// Stage 3 board size
    pub memory: MemoryConfig,
    /// Stage 4 arena, timers and scoring
    pub catch: CatchConfig,
}

impl GameConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rules.validate()?;
        self.puzzle.validate()?;
        self.quiz.validate()?;
        self.memory.validate()?;
        self.catch.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = GameConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_nested_override() {
        let config = GameConfig::from_json_str(
            r#"{ "quiz": { "questions_per_round": 5 }, "catch": { "target_score": 50 } }"#,
        )
        .unwrap();

        assert_eq!(config.quiz.questions_per_round, 5);
        assert_eq!(config.catch.target_score, 50);
        assert_eq!(config.catch.duration_secs, 30);
    }

    #[test]
    fn test_invalid_value_rejected() {
        let err = GameConfig::from_json_str(r#"{ "memory": { "pairs": 0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_overflowing_puzzle_grid_rejected() {
        let err = GameConfig::from_json_str(
            r#"{"puzzle":{"levels":[{"pieces":0,"cols":65536,"rows":65536,"weight_bp":1}]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = GameConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
