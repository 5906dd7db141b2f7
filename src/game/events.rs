//! Game Events
//!
//! Every mutation the engine performs leaves an event behind, so the
//! presentation shell can show feedback and tests can audit exactly
//! which awards fired.

use serde::{Serialize, Deserialize};

use crate::game::award::AwardKey;
use crate::game::state::{QuestionId, Stage};

/// Why the cumulative score moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreReason {
    /// Raw `add_score` call
    Direct,
    /// Puzzle completion bonus
    PuzzleBonus,
    /// Quiz reward
    QuizAnswer,
    /// Memory pool merged on completion
    MemoryPool,
    /// Live catch-stage delta
    CatchLive,
    /// Catch-stage final commit
    CatchFinal,
    /// Live catch deltas taken back after a lost or abandoned attempt
    CatchRollback,
    /// Fill-blank reward
    FillBlankAnswer,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEventData {
    /// The shell moved the player to another stage
    StageEntered {
        from: Stage,
        to: Stage,
    },

    /// Cumulative score changed (or a delta was fully absorbed by the floor)
    ScoreChanged {
        reason: ScoreReason,
        requested: i64,
        applied: i64,
        new_score: u32,
    },

    /// A one-time award was granted
    AwardGranted {
        key: AwardKey,
        points: u32,
    },

    /// A one-time award was requested again and ignored
    AwardRepeated {
        key: AwardKey,
    },

    /// An answer was written to a ledger
    AnswerRecorded {
        stage: Stage,
        question_id: QuestionId,
    },

    /// Memory stage entered and its pool reset
    MemoryStarted {
        pool: u32,
    },

    /// Memory stage mismatch penalty
    MemoryMismatch {
        moves: u32,
        pool: u32,
    },

    /// Stage completion flag set
    StageCompleted {
        stage: Stage,
    },

    /// A catch-stage delta arrived after the final commit
    LateScoreIgnored {
        requested: i32,
    },

    /// Playthrough reset to defaults
    GameReset {
        final_score: u32,
    },
}

/// A game event with its position in the event log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Monotonic sequence number (restarts only with a new engine)
    pub seq: u64,

    /// Stage the player was on when the event happened
    pub stage: Stage,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(seq: u64, stage: Stage, data: GameEventData) -> Self {
        Self { seq, stage, data }
    }

    /// Points granted by this event, if it is an award.
    pub fn awarded_points(&self) -> Option<u32> {
        match &self.data {
            GameEventData::AwardGranted { points, .. } => Some(*points),
            _ => None,
        }
    }

    /// Is this a rejected duplicate award?
    pub fn is_repeat(&self) -> bool {
        matches!(self.data, GameEventData::AwardRepeated { .. })
    }
}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.seq.cmp(&other.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering_by_sequence() {
        let early = GameEvent::new(1, Stage::Quiz, GameEventData::GameReset { final_score: 0 });
        let late = GameEvent::new(2, Stage::Home, GameEventData::StageCompleted { stage: Stage::Puzzle });

        assert!(early < late);
    }

    #[test]
    fn test_awarded_points() {
        let granted = GameEvent::new(
            0,
            Stage::Puzzle,
            GameEventData::AwardGranted { key: AwardKey::Stage1Complete, points: 100 },
        );
        let repeated = GameEvent::new(
            1,
            Stage::Puzzle,
            GameEventData::AwardRepeated { key: AwardKey::Stage1Complete },
        );

        assert_eq!(granted.awarded_points(), Some(100));
        assert_eq!(repeated.awarded_points(), None);
        assert!(repeated.is_repeat());
    }
}
