//! Stage 1: Jigsaw Puzzle
//!
//! One image from the bank is cut into a grid whose size is drawn from a
//! weighted level table. A piece dropped on its own cell sticks; any
//! other drop is rejected. The drop that places the last piece completes
//! the stage.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::content::PuzzleImage;
use crate::core::rng::DeterministicRng;
use crate::game::engine::GameEngine;
use crate::stages::StageError;

/// Largest grid a level may cut an image into.
pub const MAX_PUZZLE_PIECES: u32 = 256;

/// One entry of the level table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleLevel {
    /// Number of pieces (cols * rows)
    pub pieces: u32,
    /// Grid columns
    pub cols: u32,
    /// Grid rows
    pub rows: u32,
    /// Draw weight in basis points (10000 = 100%)
    pub weight_bp: u32,
}

/// Configuration for stage 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    /// Weighted level table
    pub levels: Vec<PuzzleLevel>,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            levels: vec![
                PuzzleLevel { pieces: 6, cols: 3, rows: 2, weight_bp: 500 },
                PuzzleLevel { pieces: 8, cols: 4, rows: 2, weight_bp: 2375 },
                PuzzleLevel { pieces: 12, cols: 4, rows: 3, weight_bp: 2375 },
                PuzzleLevel { pieces: 14, cols: 7, rows: 2, weight_bp: 2375 },
                PuzzleLevel { pieces: 16, cols: 4, rows: 4, weight_bp: 2375 },
            ],
        }
    }
}

impl PuzzleConfig {
    /// Every level must be a non-empty grid of at most `MAX_PUZZLE_PIECES`
    /// cells and some level must be drawable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::Invalid("puzzle level table is empty".into()));
        }
        for level in &self.levels {
            if level.pieces == 0 || level.cols.checked_mul(level.rows) != Some(level.pieces) {
                return Err(ConfigError::Invalid(format!(
                    "puzzle level {}x{} cannot hold {} pieces",
                    level.cols, level.rows, level.pieces
                )));
            }
            if level.pieces > MAX_PUZZLE_PIECES {
                return Err(ConfigError::Invalid(format!(
                    "puzzle level has {} pieces, at most {} allowed",
                    level.pieces, MAX_PUZZLE_PIECES
                )));
            }
        }
        if self.levels.iter().all(|level| level.weight_bp == 0) {
            return Err(ConfigError::Invalid("every puzzle level has zero weight".into()));
        }
        Ok(())
    }

    /// Draw a level according to the weights.
    pub fn pick_level(&self, rng: &mut DeterministicRng) -> Option<PuzzleLevel> {
        let weights: Vec<u32> = self.levels.iter().map(|level| level.weight_bp).collect();
        rng.weighted_index(&weights).map(|index| self.levels[index])
    }
}

/// A piece and the cell it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PuzzlePiece {
    /// Piece id (row-major index of its home cell)
    pub id: u32,
    /// Home column
    pub col: u32,
    /// Home row
    pub row: u32,
}

/// Result of dropping a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Piece stuck; this many remain
    Placed { remaining: u32 },
    /// Last piece placed, stage complete
    Solved { awarded: bool },
    /// Dropped on the wrong cell
    Rejected,
    /// Piece was already on its cell
    AlreadyPlaced,
}

/// Puzzle board for one image.
#[derive(Clone, Debug)]
pub struct PuzzleBoard {
    image: PuzzleImage,
    level: PuzzleLevel,
    tray: Vec<PuzzlePiece>,
    placed: BTreeSet<u32>,
    solved: bool,
}

impl PuzzleBoard {
    /// Pick an image and a level, cut and shuffle the pieces.
    pub fn new(
        images: &[PuzzleImage],
        config: &PuzzleConfig,
        rng: &mut DeterministicRng,
    ) -> Result<Self, StageError> {
        let image = rng.choose(images).cloned().ok_or(StageError::EmptyPool("stage1"))?;
        let level = config.pick_level(rng).ok_or(StageError::EmptyPool("puzzle levels"))?;

        let mut tray: Vec<PuzzlePiece> = (0..level.rows)
            .flat_map(|row| (0..level.cols).map(move |col| (row, col)))
            .map(|(row, col)| PuzzlePiece { id: row * level.cols + col, col, row })
            .collect();
        rng.shuffle(&mut tray);

        info!("Puzzle {} cut into {} pieces ({}x{})", image.id, level.pieces, level.cols, level.rows);

        Ok(Self {
            image,
            level,
            tray,
            placed: BTreeSet::new(),
            solved: false,
        })
    }

    /// Image being assembled.
    pub fn image(&self) -> &PuzzleImage {
        &self.image
    }

    /// Grid size drawn for this board.
    pub fn level(&self) -> PuzzleLevel {
        self.level
    }

    /// Pieces in tray (shuffled) order, placed or not.
    pub fn pieces(&self) -> &[PuzzlePiece] {
        &self.tray
    }

    /// Is this piece already on its cell?
    pub fn is_placed(&self, piece_id: u32) -> bool {
        self.placed.contains(&piece_id)
    }

    /// Pieces still to place.
    pub fn remaining(&self) -> u32 {
        self.level.pieces - self.placed.len() as u32
    }

    /// Has the last piece been placed?
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Drop `piece_id` on cell (`col`, `row`).
    pub fn place(
        &mut self,
        piece_id: u32,
        col: u32,
        row: u32,
        engine: &mut GameEngine,
    ) -> Result<Placement, StageError> {
        if self.solved {
            return Err(StageError::StageFinished);
        }
        if col >= self.level.cols || row >= self.level.rows {
            return Err(StageError::CellOutOfBounds { col, row });
        }

        let piece = self
            .tray
            .iter()
            .find(|piece| piece.id == piece_id)
            .copied()
            .ok_or(StageError::UnknownPiece(piece_id))?;

        if self.placed.contains(&piece.id) {
            return Ok(Placement::AlreadyPlaced);
        }
        if piece.col != col || piece.row != row {
            debug!("Piece {} rejected at ({}, {})", piece.id, col, row);
            return Ok(Placement::Rejected);
        }

        self.placed.insert(piece.id);
        let remaining = self.remaining();
        if remaining > 0 {
            return Ok(Placement::Placed { remaining });
        }

        self.solved = true;
        let awarded = engine.complete_stage1();
        info!("Puzzle {} solved", self.image.id);
        Ok(Placement::Solved { awarded })
    }
}
