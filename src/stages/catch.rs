//! Stage 4: Catch the Ideology
//!
//! Labels fall from the top of the arena and the player moves a basket
//! along the bottom edge. Three stage-local timers drive the round:
//!
//! ```text
//!   Countdown (1 s)   remaining_secs -= 1, round ends at zero
//!   Spawn (700 ms)    new item above the arena at a random column
//!   Frame (16 ms)     move items, resolve catches and misses
//! ```
//!
//! The stage keeps its own score (clamped at zero) and combo streak. How
//! that score reaches the engine depends on `CommitMode`:
//!
//! - `Final`: nothing is reported during play; a won round commits the
//!   stage score once through `commit_stage4`.
//! - `Live`: every non-zero delta goes through `add_stage4_score`; a won
//!   round then latches the stage with `commit_stage4(0)`.
//!
//! A lost or aborted round commits nothing and can be restarted. In
//! `Live` mode the deltas it already streamed are rolled back first, so
//! the cumulative score is back where it was before the attempt.

use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::config::ConfigError;
use crate::content::FallingIdeology;
use crate::core::fixed::{from_px, to_float, Fixed};
use crate::core::rng::DeterministicRng;
use crate::game::engine::GameEngine;
use crate::stages::timer::TimerSet;
use crate::stages::StageError;

/// Countdown resolution.
const COUNTDOWN_INTERVAL_MS: u64 = 1_000;

/// Largest arena edge that still fits Q16.16 with headroom.
const MAX_ARENA_PX: i32 = 8_192;

/// Combo multiplier for consecutive correct catches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboRule {
    /// Streak length from which the multiplier applies (0 disables combos)
    pub threshold: u32,
    /// Multiplier applied to the base points
    pub multiplier: u32,
}

impl Default for ComboRule {
    fn default() -> Self {
        Self { threshold: 5, multiplier: 2 }
    }
}

impl ComboRule {
    /// Points for a correct catch that brings the streak to `streak`.
    pub fn points_for(&self, base: u32, streak: u32) -> u32 {
        if self.threshold > 0 && streak >= self.threshold {
            base.saturating_mul(self.multiplier)
        } else {
            base
        }
    }
}

/// How the stage score reaches the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// One commit of the final stage score on a win
    #[default]
    Final,
    /// Deltas applied as they happen, latched on a win
    Live,
}

/// Configuration for stage 4. Geometry is in pixels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchConfig {
    /// Arena width
    pub arena_width: i32,
    /// Arena height
    pub arena_height: i32,
    /// Basket width
    pub basket_width: i32,
    /// Basket height
    pub basket_height: i32,
    /// Gap between the basket and the arena floor
    pub basket_margin: i32,
    /// Falling item edge length
    pub item_size: i32,
    /// Basket travel per move
    pub basket_step: i32,
    /// Round length in seconds
    pub duration_secs: u32,
    /// Time between spawns
    pub spawn_interval_ms: u64,
    /// Time between physics frames
    pub frame_interval_ms: u64,
    /// Slowest fall speed, px per frame
    pub min_fall_speed: i32,
    /// Fastest fall speed, px per frame
    pub max_fall_speed: i32,
    /// Base points for catching a correct item
    pub correct_points: u32,
    /// Points lost for catching a wrong item
    pub wrong_penalty: u32,
    /// Points lost when a correct item hits the floor
    pub miss_penalty: u32,
    /// Combo rule for consecutive correct catches
    pub combo: ComboRule,
    /// Stage score that wins the round
    pub target_score: u32,
    /// How the stage score is reported
    pub commit_mode: CommitMode,
}

impl Default for CatchConfig {
    fn default() -> Self {
        Self {
            arena_width: 480,
            arena_height: 520,
            basket_width: 70,
            basket_height: 22,
            basket_margin: 8,
            item_size: 26,
            basket_step: 30,
            duration_secs: 30,
            spawn_interval_ms: 700,
            frame_interval_ms: 16,
            min_fall_speed: 2,
            max_fall_speed: 4,
            correct_points: 10,
            wrong_penalty: 5,
            miss_penalty: 0,
            combo: ComboRule::default(),
            target_score: 100,
            commit_mode: CommitMode::Final,
        }
    }
}

impl CatchConfig {
    /// Reject geometry and timing the round cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(format!("catch: {msg}")));

        if self.arena_width <= 0 || self.arena_height <= 0 {
            return invalid("arena must be non-empty");
        }
        if self.arena_width > MAX_ARENA_PX || self.arena_height > MAX_ARENA_PX {
            return invalid("arena too large");
        }
        if self.basket_width <= 0 || self.basket_height <= 0 || self.basket_width > self.arena_width {
            return invalid("basket must fit the arena");
        }
        if self.basket_margin < 0 || self.basket_height + self.basket_margin >= self.arena_height {
            return invalid("basket must sit inside the arena");
        }
        if self.item_size <= 0 || self.item_size >= self.arena_width {
            return invalid("item size must be smaller than the arena");
        }
        if self.basket_step <= 0 {
            return invalid("basket_step must be > 0");
        }
        if self.duration_secs == 0 || self.spawn_interval_ms == 0 || self.frame_interval_ms == 0 {
            return invalid("durations and intervals must be > 0");
        }
        if self.min_fall_speed <= 0 || self.min_fall_speed > self.max_fall_speed {
            return invalid("fall speed range must be positive and ordered");
        }
        if self.max_fall_speed > self.arena_height {
            return invalid("max fall speed exceeds the arena height");
        }
        if self.combo.multiplier == 0 {
            return invalid("combo multiplier must be > 0");
        }
        if self.target_score == 0 {
            return invalid("target_score must be > 0");
        }
        Ok(())
    }

    /// Basket start position: centred.
    pub fn basket_start(&self) -> i32 {
        (self.arena_width - self.basket_width) / 2
    }
}

/// Timers owned by a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatchTimer {
    /// One-second countdown
    Countdown,
    /// Item spawner
    Spawn,
    /// Physics frame
    Frame,
}

/// Basket input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BasketMove {
    /// One step left
    Left,
    /// One step right
    Right,
}

/// An item on its way down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallingItem {
    /// Spawn order within the round
    pub serial: u64,
    /// Text on the item
    pub label: String,
    /// Worth catching?
    pub is_correct: bool,
    /// Left edge
    pub x: Fixed,
    /// Top edge
    pub y: Fixed,
    /// Fall per frame
    pub speed: Fixed,
}

impl FallingItem {
    /// Left edge in pixels, for rendering.
    pub fn x_px(&self) -> f32 {
        to_float(self.x)
    }

    /// Top edge in pixels, for rendering.
    pub fn y_px(&self) -> f32 {
        to_float(self.y)
    }
}

/// Round lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatchPhase {
    /// Not started yet
    Ready,
    /// Timers running
    Playing,
    /// Target reached
    Won,
    /// Time ran out below the target
    Lost,
    /// Left the stage mid-round
    Aborted,
}

impl CatchPhase {
    /// Round ended one way or another?
    pub fn is_over(self) -> bool {
        matches!(self, CatchPhase::Won | CatchPhase::Lost | CatchPhase::Aborted)
    }
}

/// Something that happened during `advance`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatchEvent {
    /// New item entered above the arena
    Spawned {
        /// Item serial
        serial: u64,
        /// Item text
        label: String,
    },
    /// Item landed in the basket
    Caught {
        /// Item serial
        serial: u64,
        /// Was it a correct item?
        correct: bool,
        /// Change to the stage score
        delta: i32,
        /// Correct-catch streak after this catch
        streak: u32,
        /// Stage score after this catch
        stage_score: u32,
    },
    /// Correct item hit the floor
    Missed {
        /// Item serial
        serial: u64,
        /// Change to the stage score
        delta: i32,
        /// Stage score after the miss
        stage_score: u32,
    },
    /// Countdown ticked
    Tick {
        /// Seconds left
        remaining_secs: u32,
    },
    /// Round ended
    Finished {
        /// Target reached?
        won: bool,
        /// Final stage score
        stage_score: u32,
        /// Did the engine accept the commit?
        committed: bool,
    },
}

/// One catch-stage round.
#[derive(Clone, Debug)]
pub struct CatchGame {
    config: CatchConfig,
    pool: Vec<FallingIdeology>,
    rng: DeterministicRng,
    timers: TimerSet<CatchTimer>,
    phase: CatchPhase,
    items: Vec<FallingItem>,
    basket_x: i32,
    stage_score: u32,
    streak: u32,
    remaining_secs: u32,
    next_serial: u64,
    caught: u32,
    finalized: bool,
    /// Net live delta the engine accepted this attempt
    live_applied: i64,
}

impl CatchGame {
    /// Set up a round over `pool`. The round gets its own RNG stream.
    pub fn new(
        pool: &[FallingIdeology],
        config: &CatchConfig,
        rng: &mut DeterministicRng,
    ) -> Result<Self, StageError> {
        if pool.is_empty() {
            return Err(StageError::EmptyPool("stage4"));
        }

        Ok(Self {
            config: config.clone(),
            pool: pool.to_vec(),
            rng: DeterministicRng::new(rng.next_u64()),
            timers: TimerSet::new(),
            phase: CatchPhase::Ready,
            items: Vec::new(),
            basket_x: config.basket_start(),
            stage_score: 0,
            streak: 0,
            remaining_secs: config.duration_secs,
            next_serial: 0,
            caught: 0,
            finalized: false,
            live_applied: 0,
        })
    }

    /// Configuration in effect.
    pub fn config(&self) -> &CatchConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> CatchPhase {
        self.phase
    }

    /// Stage-local score.
    pub fn stage_score(&self) -> u32 {
        self.stage_score
    }

    /// Current correct-catch streak.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Countdown seconds left.
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Items currently falling.
    pub fn items(&self) -> &[FallingItem] {
        &self.items
    }

    /// Basket left edge in pixels.
    pub fn basket_x(&self) -> i32 {
        self.basket_x
    }

    /// Items caught this round, correct or not.
    pub fn caught_count(&self) -> u32 {
        self.caught
    }

    /// Round-local clock.
    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    /// Are any timers still armed?
    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }

    /// Start the round, or restart it from scratch.
    ///
    /// Every timer of the previous attempt is cancelled first, and any
    /// live score it streamed without winning is rolled back.
    pub fn start(&mut self, engine: &mut GameEngine) {
        self.rollback_live(engine);
        self.timers = TimerSet::new();
        self.timers.schedule(CatchTimer::Countdown, COUNTDOWN_INTERVAL_MS);
        self.timers.schedule(CatchTimer::Spawn, self.config.spawn_interval_ms);
        self.timers.schedule(CatchTimer::Frame, self.config.frame_interval_ms);

        self.phase = CatchPhase::Playing;
        self.items.clear();
        self.basket_x = self.config.basket_start();
        self.stage_score = 0;
        self.streak = 0;
        self.remaining_secs = self.config.duration_secs;
        self.next_serial = 0;
        self.caught = 0;
        self.finalized = false;

        info!("Catch round started ({} s, target {})", self.config.duration_secs, self.config.target_score);
    }

    /// Leave mid-round: cancel timers, commit nothing.
    ///
    /// Returns whether a running round was aborted.
    pub fn abort(&mut self, engine: &mut GameEngine) -> bool {
        if self.phase != CatchPhase::Playing {
            return false;
        }
        self.rollback_live(engine);
        self.timers.clear();
        self.phase = CatchPhase::Aborted;
        info!("Catch round aborted at stage score {}", self.stage_score);
        true
    }

    /// Move the basket one step, clamped to the arena.
    pub fn move_basket(&mut self, direction: BasketMove) -> Result<i32, StageError> {
        match self.phase {
            CatchPhase::Playing => {}
            CatchPhase::Ready => return Err(StageError::NotStarted),
            _ => return Err(StageError::StageFinished),
        }

        let step = match direction {
            BasketMove::Left => -self.config.basket_step,
            BasketMove::Right => self.config.basket_step,
        };
        let max_x = self.config.arena_width - self.config.basket_width;
        self.basket_x = (self.basket_x + step).clamp(0, max_x);
        Ok(self.basket_x)
    }

    /// Run the round's timers for `elapsed_ms` of stage time.
    ///
    /// Timers fire in due order. Once the round ends, nothing else in the
    /// window is processed.
    pub fn advance(&mut self, elapsed_ms: u64, engine: &mut GameEngine) -> Vec<CatchEvent> {
        let mut events = Vec::new();
        if self.phase != CatchPhase::Playing {
            return events;
        }

        let deadline = self.timers.now_ms() + elapsed_ms;
        while self.phase == CatchPhase::Playing {
            let Some(fired) = self.timers.fire_next(deadline) else {
                break;
            };
            match fired.key {
                CatchTimer::Countdown => self.countdown(engine, &mut events),
                CatchTimer::Spawn => self.spawn(&mut events),
                CatchTimer::Frame => self.frame(engine, &mut events),
            }
        }
        self.timers.settle(deadline);

        events
    }

    fn countdown(&mut self, engine: &mut GameEngine, events: &mut Vec<CatchEvent>) {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        events.push(CatchEvent::Tick { remaining_secs: self.remaining_secs });

        if self.remaining_secs == 0 {
            let won = self.stage_score >= self.config.target_score;
            self.finish(won, engine, events);
        }
    }

    fn spawn(&mut self, events: &mut Vec<CatchEvent>) {
        let Some(source) = self.rng.choose(&self.pool).cloned() else {
            return;
        };

        let max_x = from_px(self.config.arena_width - self.config.item_size);
        let x = self.rng.next_int(max_x as u32) as Fixed;
        let speed_span = from_px(self.config.max_fall_speed - self.config.min_fall_speed);
        let speed = from_px(self.config.min_fall_speed) + self.rng.next_int(speed_span as u32 + 1) as Fixed;

        let serial = self.next_serial;
        self.next_serial += 1;

        events.push(CatchEvent::Spawned { serial, label: source.label.clone() });
        self.items.push(FallingItem {
            serial,
            label: source.label,
            is_correct: source.is_correct,
            x,
            y: -from_px(self.config.item_size),
            speed,
        });
    }

    /// Move every item, then resolve each against the basket where it is now.
    fn frame(&mut self, engine: &mut GameEngine, events: &mut Vec<CatchEvent>) {
        let size = from_px(self.config.item_size);
        let catch_line = from_px(
            self.config.arena_height - self.config.basket_height - self.config.basket_margin,
        );
        let floor = from_px(self.config.arena_height);

        for item in &mut self.items {
            item.y += item.speed;
        }

        let items = std::mem::take(&mut self.items);
        let mut still_falling = Vec::with_capacity(items.len());
        for item in items {
            if self.phase != CatchPhase::Playing {
                still_falling.push(item);
                continue;
            }

            let basket_left = from_px(self.basket_x);
            let basket_right = from_px(self.basket_x + self.config.basket_width);
            let in_basket = item.y + size >= catch_line
                && item.x + size > basket_left
                && item.x < basket_right;

            if in_basket {
                self.caught_item(&item, engine, events);
            } else if item.y >= floor {
                self.dropped_item(&item, engine, events);
            } else {
                still_falling.push(item);
            }
        }
        self.items = still_falling;
    }

    fn caught_item(&mut self, item: &FallingItem, engine: &mut GameEngine, events: &mut Vec<CatchEvent>) {
        let before = self.stage_score;
        if item.is_correct {
            self.streak += 1;
            let points = self.config.combo.points_for(self.config.correct_points, self.streak);
            self.stage_score = self.stage_score.saturating_add(points);
        } else {
            self.streak = 0;
            self.stage_score = self.stage_score.saturating_sub(self.config.wrong_penalty);
        }
        self.caught += 1;

        let delta = score_delta(before, self.stage_score);
        self.report(delta, engine);
        debug!("Caught {} ({}): {:+} -> {}", item.serial, item.label, delta, self.stage_score);
        events.push(CatchEvent::Caught {
            serial: item.serial,
            correct: item.is_correct,
            delta,
            streak: self.streak,
            stage_score: self.stage_score,
        });

        if self.stage_score >= self.config.target_score {
            self.finish(true, engine, events);
        }
    }

    fn dropped_item(&mut self, item: &FallingItem, engine: &mut GameEngine, events: &mut Vec<CatchEvent>) {
        if !item.is_correct {
            return;
        }

        let before = self.stage_score;
        self.streak = 0;
        self.stage_score = self.stage_score.saturating_sub(self.config.miss_penalty);

        let delta = score_delta(before, self.stage_score);
        self.report(delta, engine);
        events.push(CatchEvent::Missed {
            serial: item.serial,
            delta,
            stage_score: self.stage_score,
        });
    }

    fn report(&mut self, delta: i32, engine: &mut GameEngine) {
        if self.config.commit_mode != CommitMode::Live || delta == 0 {
            return;
        }
        if let Some(applied) = engine.add_stage4_score(delta) {
            self.live_applied += i64::from(applied);
        }
    }

    fn rollback_live(&mut self, engine: &mut GameEngine) {
        if self.live_applied != 0 {
            engine.rollback_stage4_score(self.live_applied);
            self.live_applied = 0;
        }
    }

    /// End the round. Runs at most once per attempt.
    fn finish(&mut self, won: bool, engine: &mut GameEngine, events: &mut Vec<CatchEvent>) {
        if self.finalized {
            warn!("Catch round already finalized, ignoring second finish");
            return;
        }
        self.finalized = true;
        self.timers.clear();
        self.phase = if won { CatchPhase::Won } else { CatchPhase::Lost };

        let committed = won
            && match self.config.commit_mode {
                CommitMode::Final => engine.commit_stage4(self.stage_score),
                CommitMode::Live => engine.commit_stage4(0),
            };
        if won {
            self.live_applied = 0;
        } else {
            self.rollback_live(engine);
        }

        info!(
            "Catch round {} with {} (committed: {})",
            if won { "won" } else { "lost" },
            self.stage_score,
            committed
        );
        events.push(CatchEvent::Finished { won, stage_score: self.stage_score, committed });
    }

    /// Drop an item at a fixed position.
    #[cfg(test)]
    fn place_item(&mut self, is_correct: bool, x_px: i32, y_px: i32, speed_px: i32) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        let max_x = self.config.arena_width - self.config.item_size;
        self.items.push(FallingItem {
            serial,
            label: format!("item-{serial}"),
            is_correct,
            x: from_px(x_px.clamp(0, max_x)),
            y: from_px(y_px),
            speed: from_px(speed_px),
        });
        serial
    }
}

fn score_delta(before: u32, after: u32) -> i32 {
    let delta = after as i64 - before as i64;
    delta.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
