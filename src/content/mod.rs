//! Stage content: schema and the built-in bank.

pub mod bank;

pub use bank::{
    ContentBank, ContentError, FallingIdeology, FillBlankTemplate, MemoryImage, PuzzleImage,
    QuizQuestion,
};
