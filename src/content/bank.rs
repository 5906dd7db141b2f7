//! Content Bank
//!
//! Read-only stage content. The engine never looks at it; only the stage
//! engines draw from it.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::game::state::QuestionId;
use crate::stages::fill_blank::count_blanks;

/// Built-in content shipped with the crate.
const BUILTIN_JSON: &str = include_str!("builtin.json");

/// Content errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// Content is not valid JSON for this schema.
    #[error("Invalid content JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A stage has nothing to draw from.
    #[error("Content pool for {0} is empty")]
    EmptyPool(&'static str),

    /// Two records in one pool share an id.
    #[error("Duplicate id {id} in {pool}")]
    DuplicateId {
        /// Pool name
        pool: &'static str,
        /// Offending id
        id: String,
    },

    /// A record is internally inconsistent.
    #[error("Invalid record {id}: {reason}")]
    InvalidRecord {
        /// Offending id
        id: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Stage 1 image to cut into pieces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleImage {
    /// Image id
    pub id: String,
    /// Full image URL
    pub image: String,
    /// Title shown above the board
    pub title: String,
    /// Short description
    pub description: String,
}

/// Stage 2 multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Question id
    pub id: QuestionId,
    /// Question text
    pub question: String,
    /// Answer options
    pub options: Vec<String>,
    /// Index of the correct option
    pub correct: usize,
    /// Shown after answering
    pub explanation: String,
}

impl QuizQuestion {
    /// Is `option` the correct answer?
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct
    }
}

/// Stage 3 card image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryImage {
    /// Image id
    pub id: String,
    /// Image URL
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    /// Caption
    pub title: String,
}

/// Stage 4 falling label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallingIdeology {
    /// Item id
    pub id: String,
    /// Text on the falling item
    pub label: String,
    /// true = worth catching, false = to be avoided
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

/// Stage 5 sentence with blanks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillBlankTemplate {
    /// Template id
    pub id: QuestionId,
    /// Sentence with `{blank}` placeholders
    pub text: String,
    /// Expected value per placeholder, in order
    pub blanks: Vec<String>,
    /// Shown after answering
    pub explanation: String,
}

/// All stage content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBank {
    /// Stage 1 images
    pub stage1: Vec<PuzzleImage>,
    /// Stage 2 question pool
    pub stage2: Vec<QuizQuestion>,
    /// Stage 3 image pool
    pub stage3: Vec<MemoryImage>,
    /// Stage 4 labels
    pub stage4: Vec<FallingIdeology>,
    /// Stage 5 templates
    pub stage5: Vec<FillBlankTemplate>,
}

impl ContentBank {
    /// The bank shipped with the crate.
    pub fn builtin() -> Result<Self, ContentError> {
        Self::from_json_str(BUILTIN_JSON)
    }

    /// Parse and validate a bank.
    pub fn from_json_str(json: &str) -> Result<Self, ContentError> {
        let bank: ContentBank = serde_json::from_str(json)?;
        bank.validate()?;
        Ok(bank)
    }

    /// Structural checks that do not depend on configuration.
    pub fn validate(&self) -> Result<(), ContentError> {
        unique_ids("stage1", self.stage1.iter().map(|p| p.id.as_str()))?;
        unique_ids("stage2", self.stage2.iter().map(|q| q.id.as_str()))?;
        unique_ids("stage3", self.stage3.iter().map(|m| m.id.as_str()))?;
        unique_ids("stage4", self.stage4.iter().map(|f| f.id.as_str()))?;
        unique_ids("stage5", self.stage5.iter().map(|t| t.id.as_str()))?;

        for question in &self.stage2 {
            if question.id.is_blank() {
                return Err(invalid("", "quiz question without id"));
            }
            if question.correct >= question.options.len() {
                return Err(invalid(
                    question.id.as_str(),
                    &format!(
                        "correct option {} but only {} options",
                        question.correct,
                        question.options.len()
                    ),
                ));
            }
        }

        for template in &self.stage5 {
            if template.id.is_blank() {
                return Err(invalid("", "fill-blank template without id"));
            }
            let placeholders = count_blanks(&template.text);
            if placeholders == 0 || placeholders != template.blanks.len() {
                return Err(invalid(
                    template.id.as_str(),
                    &format!(
                        "{} placeholders but {} expected values",
                        placeholders,
                        template.blanks.len()
                    ),
                ));
            }
        }

        if !self.stage4.iter().any(|item| item.is_correct) {
            return Err(invalid("stage4", "no catchable item"));
        }

        Ok(())
    }

    /// Check the bank can feed a round of every stage.
    pub fn check_capacity(&self, memory_pairs: usize) -> Result<(), ContentError> {
        if self.stage1.is_empty() {
            return Err(ContentError::EmptyPool("stage1"));
        }
        if self.stage2.is_empty() {
            return Err(ContentError::EmptyPool("stage2"));
        }
        if self.stage3.len() < memory_pairs {
            return Err(invalid(
                "stage3",
                &format!("{} images for {} pairs", self.stage3.len(), memory_pairs),
            ));
        }
        if self.stage4.is_empty() {
            return Err(ContentError::EmptyPool("stage4"));
        }
        if self.stage5.is_empty() {
            return Err(ContentError::EmptyPool("stage5"));
        }
        Ok(())
    }
}

fn unique_ids<'a>(
    pool: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ContentError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ContentError::DuplicateId { pool, id: id.to_string() });
        }
    }
    Ok(())
}

fn invalid(id: &str, reason: &str) -> ContentError {
    ContentError::InvalidRecord {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_bank_is_valid() {
        let bank = ContentBank::builtin().unwrap();

        assert_eq!(bank.stage1.len(), 3);
        assert_eq!(bank.stage2.len(), 20);
        assert_eq!(bank.stage3.len(), 6);
        assert_eq!(bank.stage4.len(), 10);
        assert_eq!(bank.stage5.len(), 5);
        assert!(bank.check_capacity(6).is_ok());
    }

    #[test]
    fn test_capacity_needs_enough_memory_images() {
        let bank = ContentBank::builtin().unwrap();
        assert!(bank.check_capacity(7).is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut bank = ContentBank::builtin().unwrap();
        let dup = bank.stage2[0].clone();
        bank.stage2.push(dup);

        assert!(matches!(
            bank.validate(),
            Err(ContentError::DuplicateId { pool: "stage2", .. })
        ));
    }

    #[test]
    fn test_correct_option_must_exist() {
        let mut bank = ContentBank::builtin().unwrap();
        bank.stage2[0].correct = 9;

        assert!(matches!(bank.validate(), Err(ContentError::InvalidRecord { .. })));
    }

    #[test]
    fn test_placeholder_count_must_match() {
        let mut bank = ContentBank::builtin().unwrap();
        bank.stage5[0].blanks.pop();

        assert!(matches!(bank.validate(), Err(ContentError::InvalidRecord { .. })));
    }

    #[test]
    fn test_quiz_question_correctness() {
        let bank = ContentBank::builtin().unwrap();
        let q1 = &bank.stage2[0];
        assert!(q1.is_correct(q1.correct));
        assert!(!q1.is_correct(q1.correct + 1));
    }
}
