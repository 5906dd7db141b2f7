//! Property tests for the scoring engine.
//!
//! Random operation sequences are checked against a small reference
//! model of the award and floor rules.

use std::collections::BTreeSet;

use proptest::prelude::*;
use stage_quest::game::{GameEngine, GameState, ScoringRules, Stage};

#[derive(Debug, Clone)]
enum Op {
    AddScore(i32),
    CompleteStage1,
    AnswerStage2(u8, bool),
    StartStage3,
    Stage3Mismatch,
    CompleteStage3,
    AddStage4(i32),
    CommitStage4(u32),
    AnswerStage5(u8, bool),
    MoveTo(u8),
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-1_000i32..1_000).prop_map(Op::AddScore),
        Just(Op::CompleteStage1),
        (0u8..5, any::<bool>()).prop_map(|(q, correct)| Op::AnswerStage2(q, correct)),
        Just(Op::StartStage3),
        Just(Op::Stage3Mismatch),
        Just(Op::CompleteStage3),
        (-200i32..200).prop_map(Op::AddStage4),
        (0u32..500).prop_map(Op::CommitStage4),
        (0u8..5, any::<bool>()).prop_map(|(q, correct)| Op::AnswerStage5(q, correct)),
        (0u8..=6).prop_map(Op::MoveTo),
        Just(Op::Reset),
    ]
}

/// Reference model of the score rules.
#[derive(Debug, Default)]
struct Model {
    score: i64,
    awards: BTreeSet<String>,
    stage1_completed: bool,
    pool: u32,
    pool_completed: bool,
    stage4_committed: bool,
}

impl Model {
    fn add(&mut self, delta: i64) {
        self.score = (self.score + delta).clamp(0, u32::MAX as i64);
    }

    fn award(&mut self, key: String, points: u32) {
        if self.awards.insert(key) {
            self.add(points as i64);
        }
    }

    fn apply(&mut self, op: &Op, rules: &ScoringRules) {
        match op {
            Op::AddScore(delta) => self.add(*delta as i64),
            Op::CompleteStage1 => {
                if !self.stage1_completed {
                    self.stage1_completed = true;
                    self.award("s1".into(), rules.puzzle_bonus);
                }
            }
            Op::AnswerStage2(q, correct) => {
                if *correct {
                    self.award(format!("s2:{q}"), rules.quiz_reward);
                }
            }
            Op::StartStage3 => {
                self.pool = rules.memory_pool_start;
                self.pool_completed = false;
            }
            Op::Stage3Mismatch => {
                self.pool = self.pool.saturating_sub(rules.memory_mismatch_penalty);
            }
            Op::CompleteStage3 => {
                if !self.pool_completed {
                    self.pool_completed = true;
                    self.award("s3".into(), self.pool);
                }
            }
            Op::AddStage4(delta) => {
                if !self.stage4_committed {
                    self.add(*delta as i64);
                }
            }
            Op::CommitStage4(points) => {
                if self.awards.insert("s4".into()) {
                    self.add(*points as i64);
                    self.stage4_committed = true;
                }
            }
            Op::AnswerStage5(q, correct) => {
                if *correct {
                    self.award(format!("s5:{q}"), rules.fill_blank_reward);
                }
            }
            Op::MoveTo(_) => {}
            Op::Reset => *self = Model::default(),
        }
    }
}

fn apply(engine: &mut GameEngine, op: &Op) {
    match op {
        Op::AddScore(delta) => {
            engine.add_score(*delta);
        }
        Op::CompleteStage1 => {
            engine.complete_stage1();
        }
        Op::AnswerStage2(q, correct) => {
            engine.answer_stage2(format!("q{q}"), 0, *correct);
        }
        Op::StartStage3 => engine.start_stage3(),
        Op::Stage3Mismatch => {
            engine.record_stage3_move();
        }
        Op::CompleteStage3 => {
            engine.complete_stage3();
        }
        Op::AddStage4(delta) => {
            engine.add_stage4_score(*delta);
        }
        Op::CommitStage4(points) => {
            engine.commit_stage4(*points);
        }
        Op::AnswerStage5(q, correct) => {
            engine.answer_stage5(format!("t{q}"), *correct);
        }
        Op::MoveTo(index) => {
            if let Some(stage) = Stage::from_index(*index) {
                engine.move_to_stage(stage);
            }
        }
        Op::Reset => engine.reset_game(),
    }
}

proptest! {
    #[test]
    fn engine_matches_reference_model(ops in prop::collection::vec(op(), 0..80)) {
        let rules = ScoringRules::default();
        let mut engine = GameEngine::new(rules.clone());
        let mut model = Model::default();

        for op in &ops {
            apply(&mut engine, op);
            model.apply(op, &rules);
            prop_assert_eq!(engine.score() as i64, model.score, "after {:?}", op);
            prop_assert_eq!(engine.state().stage4_committed(), model.stage4_committed);
            prop_assert_eq!(engine.state().awards().len(), model.awards.len());
        }
    }

    #[test]
    fn negative_deltas_stop_at_zero(deltas in prop::collection::vec(-500i32..100, 1..40)) {
        let mut engine = GameEngine::new(ScoringRules::default());
        let mut expected: i64 = 0;
        for delta in deltas {
            expected = (expected + delta as i64).max(0);
            prop_assert_eq!(engine.add_score(delta) as i64, expected);
        }
    }

    #[test]
    fn repeated_awards_grant_once(repeats in 2usize..10, points in 0u32..1_000) {
        let mut engine = GameEngine::new(ScoringRules::default());

        let granted: Vec<bool> = (0..repeats).map(|_| engine.complete_stage1()).collect();
        prop_assert_eq!(granted.iter().filter(|g| **g).count(), 1);

        for _ in 0..repeats {
            engine.answer_stage2("q1", 1, true);
            engine.answer_stage5("t1", true);
        }
        let commits = (0..repeats).filter(|_| engine.commit_stage4(points)).count();
        prop_assert_eq!(commits, 1);

        prop_assert_eq!(engine.score(), 100 + 10 + 100 + points);
    }

    #[test]
    fn memory_pool_follows_mismatch_count(mismatches in 0u32..120) {
        let mut engine = GameEngine::new(ScoringRules::default());
        engine.start_stage3();
        for _ in 0..mismatches {
            engine.record_stage3_move();
        }
        prop_assert!(engine.complete_stage3());

        let expected = 500i64 - 10 * mismatches as i64;
        prop_assert_eq!(engine.score() as i64, expected.max(0));
        prop_assert_eq!(engine.state().stage3().moves(), mismatches);
    }

    #[test]
    fn reset_restores_fresh_state(ops in prop::collection::vec(op(), 0..60)) {
        let mut engine = GameEngine::new(ScoringRules::default());
        for op in &ops {
            apply(&mut engine, op);
        }

        engine.reset_game();
        prop_assert_eq!(engine.state(), &GameState::default());
        prop_assert_eq!(engine.state().compute_hash(), GameState::default().compute_hash());
        prop_assert_eq!(engine.current_stage(), Stage::Home);
    }

    #[test]
    fn late_catch_deltas_are_ignored(points in 0u32..500, late in prop::collection::vec(-100i32..100, 1..10)) {
        let mut engine = GameEngine::new(ScoringRules::default());
        engine.commit_stage4(points);
        for delta in late {
            prop_assert_eq!(engine.add_stage4_score(delta), None);
        }
        prop_assert_eq!(engine.score(), points);
    }
}
