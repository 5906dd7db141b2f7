//! Stage 5: Fill in the Blanks
//!
//! Templates are played in bank order. Each shown template is submitted
//! exactly once; the engine rewards the first correct submission per id.

use tracing::debug;

use crate::content::FillBlankTemplate;
use crate::game::engine::GameEngine;
use crate::stages::StageError;

/// Placeholder token inside template text.
pub const BLANK_TOKEN: &str = "{blank}";

/// Piece of a template, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text
    Text(&'a str),
    /// Input box for the blank with this index
    Blank(usize),
}

/// Number of placeholders in a template.
pub fn count_blanks(text: &str) -> usize {
    text.matches(BLANK_TOKEN).count()
}

/// Split a template into text and numbered blanks.
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    for (index, part) in text.split(BLANK_TOKEN).enumerate() {
        if index > 0 {
            out.push(Segment::Blank(index - 1));
        }
        if !part.is_empty() {
            out.push(Segment::Text(part));
        }
    }
    out
}

/// Compare one entry against its expected value: trimmed, case-insensitive.
pub fn blank_matches(expected: &str, given: &str) -> bool {
    expected.trim().to_lowercase() == given.trim().to_lowercase()
}

/// Result of submitting a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillFeedback {
    /// Every blank matched
    pub correct: bool,
    /// Expected values, for the reveal
    pub expected: Vec<String>,
    /// Explanation text
    pub explanation: String,
    /// Did this submission add points?
    pub awarded: bool,
}

/// Where the round stands after `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillProgress {
    /// Showing the template with this index
    Template(usize),
    /// Every template was submitted
    Finished,
}

/// One pass over the fill-blank templates.
#[derive(Debug, Clone)]
pub struct FillBlankRound {
    templates: Vec<FillBlankTemplate>,
    index: usize,
    entries: Vec<String>,
    submitted: bool,
    finished: bool,
    correct_count: usize,
}

impl FillBlankRound {
    /// Start a round over `templates`.
    pub fn new(templates: &[FillBlankTemplate]) -> Result<Self, StageError> {
        let first = templates.first().ok_or(StageError::EmptyPool("stage5"))?;
        let entries = vec![String::new(); first.blanks.len()];

        Ok(Self {
            templates: templates.to_vec(),
            index: 0,
            entries,
            submitted: false,
            finished: false,
            correct_count: 0,
        })
    }

    /// Template currently shown.
    pub fn current(&self) -> Option<&FillBlankTemplate> {
        if self.finished {
            return None;
        }
        self.templates.get(self.index)
    }

    /// Index of the current template.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of templates in the round.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Round has no templates?
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Current entries, one per blank.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Templates answered correctly this round.
    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    /// Every template submitted?
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Type into one blank.
    pub fn set_blank(&mut self, blank: usize, value: impl Into<String>) -> Result<(), StageError> {
        if self.finished {
            return Err(StageError::StageFinished);
        }
        if self.submitted {
            return Err(StageError::AlreadyAnswered);
        }
        let slot = self.entries.get_mut(blank).ok_or(StageError::InvalidBlank(blank))?;
        *slot = value.into();
        Ok(())
    }

    /// Check the entries and report the result to the engine.
    pub fn submit(&mut self, engine: &mut GameEngine) -> Result<FillFeedback, StageError> {
        if self.finished {
            return Err(StageError::StageFinished);
        }
        if self.submitted {
            return Err(StageError::AlreadyAnswered);
        }
        if self.entries.iter().any(|entry| entry.trim().is_empty()) {
            return Err(StageError::IncompleteBlanks);
        }

        let template = &self.templates[self.index];
        let correct = template
            .blanks
            .iter()
            .zip(&self.entries)
            .all(|(expected, given)| blank_matches(expected, given));

        let awarded = engine.answer_stage5(template.id.clone(), correct);
        self.submitted = true;
        if correct {
            self.correct_count += 1;
        }
        debug!("Fill-blank {} submitted: correct={}", template.id, correct);

        Ok(FillFeedback {
            correct,
            expected: template.blanks.clone(),
            explanation: template.explanation.clone(),
            awarded,
        })
    }

    /// Move to the next template once the current one was submitted.
    pub fn next(&mut self) -> Result<FillProgress, StageError> {
        if self.finished {
            return Err(StageError::StageFinished);
        }
        if !self.submitted {
            return Err(StageError::NotAnswered);
        }

        if self.index + 1 >= self.templates.len() {
            self.finished = true;
            return Ok(FillProgress::Finished);
        }

        self.index += 1;
        self.submitted = false;
        self.entries = vec![String::new(); self.templates[self.index].blanks.len()];
        Ok(FillProgress::Template(self.index))
    }
}
