//! Stage 3: Memory Match
//!
//! `pairs` images are drawn, each becomes two cards (`<id>-1`, `<id>-2`)
//! and the deck is shuffled. Two face-up cards resolve immediately: a
//! match stays face up, a mismatch turns both back and costs the pool
//! the mismatch penalty. The last match merges the pool into the score.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::content::MemoryImage;
use crate::core::rng::DeterministicRng;
use crate::game::engine::GameEngine;
use crate::stages::StageError;

/// Configuration for stage 3.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Image pairs on the board
    pub pairs: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { pairs: 6 }
    }
}

impl MemoryConfig {
    /// A board needs at least one pair.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairs == 0 {
            return Err(ConfigError::Invalid("memory.pairs must be > 0".into()));
        }
        Ok(())
    }
}

/// One card on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCard {
    /// Card id: `<image id>-1` or `<image id>-2`
    pub id: String,
    /// Image this card shows
    pub image_id: String,
    /// Caption
    pub title: String,
    /// Image URL
    pub image_url: String,
    /// Pair index; both cards of a pair share it
    pub pair: usize,
    /// Pair already found
    pub matched: bool,
}

/// What a flip did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    /// First card of a pair turned up
    Revealed,
    /// Second card matched the first
    Matched {
        /// That was the last pair
        completed: bool,
    },
    /// Second card did not match; both turned back
    Mismatched {
        /// The two cards involved
        cards: (String, String),
        /// Pool left after the penalty
        pool: u32,
    },
}

/// Memory board for one visit to the stage.
#[derive(Clone, Debug)]
pub struct MemoryBoard {
    cards: Vec<MemoryCard>,
    face_up: Option<usize>,
    attempts: u32,
    matches: usize,
}

impl MemoryBoard {
    /// Deal a fresh board and reset the engine's memory pool.
    pub fn enter(
        images: &[MemoryImage],
        config: &MemoryConfig,
        rng: &mut DeterministicRng,
        engine: &mut GameEngine,
    ) -> Result<Self, StageError> {
        let chosen = rng.sample(images, config.pairs);
        if chosen.is_empty() {
            return Err(StageError::EmptyPool("stage3"));
        }

        let mut cards: Vec<MemoryCard> = chosen
            .iter()
            .enumerate()
            .flat_map(|(pair, image)| {
                [1, 2].map(|copy| MemoryCard {
                    id: format!("{}-{}", image.id, copy),
                    image_id: image.id.clone(),
                    title: image.title.clone(),
                    image_url: image.image_url.clone(),
                    pair,
                    matched: false,
                })
            })
            .collect();
        rng.shuffle(&mut cards);

        engine.start_stage3();
        info!("Memory board dealt: {} pairs", chosen.len());

        Ok(Self {
            cards,
            face_up: None,
            attempts: 0,
            matches: 0,
        })
    }

    /// Cards in board order.
    pub fn cards(&self) -> &[MemoryCard] {
        &self.cards
    }

    /// Pairs on the board.
    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    /// Pairs found so far.
    pub fn matches(&self) -> usize {
        self.matches
    }

    /// Pairs of cards turned up, matched or not.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Card waiting for its partner, if any.
    pub fn face_up(&self) -> Option<&MemoryCard> {
        self.face_up.map(|index| &self.cards[index])
    }

    /// Every pair found?
    pub fn is_completed(&self) -> bool {
        self.matches == self.pair_count()
    }

    /// Turn a card face up.
    pub fn flip(&mut self, card_id: &str, engine: &mut GameEngine) -> Result<FlipOutcome, StageError> {
        if self.is_completed() {
            return Err(StageError::StageFinished);
        }

        let index = self
            .cards
            .iter()
            .position(|card| card.id == card_id)
            .ok_or_else(|| StageError::UnknownCard(card_id.to_string()))?;

        if self.cards[index].matched {
            return Err(StageError::CardAlreadyMatched(card_id.to_string()));
        }

        let first = match self.face_up {
            None => {
                self.face_up = Some(index);
                return Ok(FlipOutcome::Revealed);
            }
            Some(first) if first == index => {
                return Err(StageError::CardAlreadyFaceUp(card_id.to_string()));
            }
            Some(first) => first,
        };

        self.face_up = None;
        self.attempts += 1;

        if self.cards[first].pair != self.cards[index].pair {
            let pool = engine.record_stage3_move();
            debug!("Mismatch {} / {} (pool {})", self.cards[first].id, card_id, pool);
            return Ok(FlipOutcome::Mismatched {
                cards: (self.cards[first].id.clone(), card_id.to_string()),
                pool,
            });
        }

        self.cards[first].matched = true;
        self.cards[index].matched = true;
        self.matches += 1;

        let completed = self.is_completed();
        if completed {
            engine.complete_stage3();
            info!("Memory board cleared in {} attempts", self.attempts);
        }
        Ok(FlipOutcome::Matched { completed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentBank;
    use crate::game::rules::ScoringRules;

    fn images() -> Vec<MemoryImage> {
        ContentBank::builtin().unwrap().stage3
    }

    fn board(pairs: usize, engine: &mut GameEngine) -> MemoryBoard {
        let mut rng = DeterministicRng::new(21);
        MemoryBoard::enter(&images(), &MemoryConfig { pairs }, &mut rng, engine).unwrap()
    }

    /// Card ids grouped by pair.
    fn pairs_of(board: &MemoryBoard) -> Vec<(String, String)> {
        (0..board.pair_count())
            .map(|pair| {
                let ids: Vec<String> = board
                    .cards()
                    .iter()
                    .filter(|c| c.pair == pair)
                    .map(|c| c.id.clone())
                    .collect();
                (ids[0].clone(), ids[1].clone())
            })
            .collect()
    }

    #[test]
    fn test_deal_builds_two_cards_per_image() {
        let mut engine = GameEngine::new(ScoringRules::default());
        let board = board(6, &mut engine);

        assert_eq!(board.cards().len(), 12);
        for (a, b) in pairs_of(&board) {
            assert!(a.ends_with("-1") || a.ends_with("-2"));
            assert_eq!(a[..a.len() - 2], b[..b.len() - 2]);
        }
        assert_eq!(engine.state().stage3().points(), 500);
    }

    #[test]
    fn test_perfect_game_awards_full_pool() {
        let mut engine = GameEngine::new(ScoringRules::default());
        let mut board = board(3, &mut engine);

        for (a, b) in pairs_of(&board) {
            assert_eq!(board.flip(&a, &mut engine), Ok(FlipOutcome::Revealed));
            board.flip(&b, &mut engine).unwrap();
        }

        assert!(board.is_completed());
        assert_eq!(engine.score(), 500);
        assert_eq!(engine.state().stage3().moves(), 0);
    }

    #[test]
    fn test_mismatch_costs_pool() {
        let mut engine = GameEngine::new(ScoringRules::default());
        let mut board = board(2, &mut engine);
        let pairs = pairs_of(&board);

        board.flip(&pairs[0].0, &mut engine).unwrap();
        let outcome = board.flip(&pairs[1].0, &mut engine).unwrap();

        assert_eq!(
            outcome,
            FlipOutcome::Mismatched { cards: (pairs[0].0.clone(), pairs[1].0.clone()), pool: 490 }
        );
        assert!(board.face_up().is_none());
        assert_eq!(engine.state().stage3().moves(), 1);

        for (a, b) in &pairs {
            board.flip(a, &mut engine).unwrap();
            board.flip(b, &mut engine).unwrap();
        }
        assert_eq!(engine.score(), 490);
        assert_eq!(board.attempts(), 3);
    }

    #[test]
    fn test_illegal_flips() {
        let mut engine = GameEngine::new(ScoringRules::default());
        let mut board = board(2, &mut engine);
        let pairs = pairs_of(&board);

        assert_eq!(
            board.flip("nope", &mut engine),
            Err(StageError::UnknownCard("nope".into()))
        );

        board.flip(&pairs[0].0, &mut engine).unwrap();
        assert_eq!(
            board.flip(&pairs[0].0, &mut engine),
            Err(StageError::CardAlreadyFaceUp(pairs[0].0.clone()))
        );
        board.flip(&pairs[0].1, &mut engine).unwrap();
        assert_eq!(
            board.flip(&pairs[0].1, &mut engine),
            Err(StageError::CardAlreadyMatched(pairs[0].1.clone()))
        );
    }

    #[test]
    fn test_reentering_resets_pool_but_not_award() {
        let mut engine = GameEngine::new(ScoringRules::default());
        let mut first = board(1, &mut engine);
        let (a, b) = pairs_of(&first).remove(0);
        first.flip(&a, &mut engine).unwrap();
        first.flip(&b, &mut engine).unwrap();
        assert_eq!(engine.score(), 500);

        let mut second = board(1, &mut engine);
        assert_eq!(engine.state().stage3().points(), 500);
        let (a, b) = pairs_of(&second).remove(0);
        second.flip(&a, &mut engine).unwrap();
        assert_eq!(second.flip(&b, &mut engine), Ok(FlipOutcome::Matched { completed: true }));

        assert_eq!(engine.score(), 500);
    }

    #[test]
    fn test_empty_pool() {
        let mut engine = GameEngine::new(ScoringRules::default());
        let mut rng = DeterministicRng::new(1);
        assert!(matches!(
            MemoryBoard::enter(&[], &MemoryConfig::default(), &mut rng, &mut engine),
            Err(StageError::EmptyPool(_))
        ));
    }
}
