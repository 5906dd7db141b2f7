//! Real-Time Catch Driver
//!
//! Runs a `CatchGame` against the tokio clock: a frame interval feeds the
//! round the real elapsed time, basket moves arrive over an mpsc channel
//! and a broadcast shutdown aborts the round. The round itself stays
//! deterministic; only the elapsed times fed to it come from the clock.

use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::game::engine::GameEngine;
use crate::stages::{BasketMove, CatchEvent, CatchGame, CatchPhase};

/// How a live round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveOutcome {
    /// Target reached
    Won,
    /// Countdown ran out
    Lost,
    /// Shutdown received mid-round
    Aborted,
}

/// Play one catch round in real time.
///
/// The round is (re)started on entry. Returns once the round ends or the
/// shutdown signal fires; an aborted round commits nothing. Dropping the
/// shutdown sender only stops listening for the signal.
pub async fn run_catch_live(
    game: &mut CatchGame,
    engine: &mut GameEngine,
    mut moves: mpsc::Receiver<BasketMove>,
    mut shutdown: broadcast::Receiver<()>,
) -> LiveOutcome {
    game.start(engine);
    let started = Instant::now();

    let mut frames = interval(Duration::from_millis(game.config().frame_interval_ms));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Live catch round running");
    let mut listening = true;

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let target_ms = started.elapsed().as_millis() as u64;
                let elapsed = target_ms.saturating_sub(game.now_ms());
                for event in game.advance(elapsed, engine) {
                    if let CatchEvent::Finished { won, stage_score, .. } = event {
                        debug!("Live round finished: won={} stage_score={}", won, stage_score);
                    }
                }
            }
            Some(direction) = moves.recv() => {
                // Input racing the final frame lands on a finished round.
                if let Err(err) = game.move_basket(direction) {
                    debug!("Basket move dropped: {}", err);
                }
            }
            signal = shutdown.recv(), if listening => match signal {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    info!("Shutdown signal received, aborting catch round");
                    game.abort(engine);
                    return LiveOutcome::Aborted;
                }
                Err(RecvError::Closed) => {
                    debug!("Shutdown sender dropped, round keeps running");
                    listening = false;
                }
            },
        }

        match game.phase() {
            CatchPhase::Won => return LiveOutcome::Won,
            CatchPhase::Lost => return LiveOutcome::Lost,
            CatchPhase::Aborted => return LiveOutcome::Aborted,
            CatchPhase::Ready | CatchPhase::Playing => {}
        }
    }
}
