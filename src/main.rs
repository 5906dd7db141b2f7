//! Stage Quest
//!
//! Headless demo: plays one scripted playthrough of all five stages,
//! prints the completion summary, then replays the same playthrough id
//! and checks that both runs end in the same state hash.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use uuid::Uuid;

use stage_quest::{
    config::GameConfig,
    content::ContentBank,
    core::fixed::to_px,
    game::{CompletionSummary, Stage},
    session::Playthrough,
    stages::{BasketMove, CatchEvent, CatchGame, CatchPhase, FillProgress, QuizProgress},
    CONFIG_ENV_VAR, VERSION,
};

/// Frame step the scripted player uses in the catch stage.
const CATCH_STEP_MS: u64 = 16;

/// Catch attempts before the script gives up on the stage.
const CATCH_ATTEMPTS: u32 = 3;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Stage Quest v{}", VERSION);

    let config = load_config()?;
    let content = ContentBank::builtin().context("Built-in content is invalid")?;

    demo_playthrough(config, content)
}

/// Config from `STAGE_QUEST_CONFIG`, else the first argument, else defaults.
fn load_config() -> Result<GameConfig> {
    let path = std::env::var(CONFIG_ENV_VAR).ok().or_else(|| std::env::args().nth(1));
    match path {
        Some(path) => GameConfig::load(&path).with_context(|| format!("Failed to load config {path}")),
        None => {
            info!("No config given, using defaults");
            Ok(GameConfig::default())
        }
    }
}

fn demo_playthrough(config: GameConfig, content: ContentBank) -> Result<()> {
    info!("=== Starting Demo Playthrough ===");

    let id = Uuid::new_v4();
    let mut playthrough = Playthrough::with_id(id, config.clone(), content.clone())?;
    info!("Playthrough ID: {}", hex::encode(id.as_bytes()));
    info!("Started at: {}", playthrough.started_at().to_rfc3339());
    info!("RNG Seed: {}", playthrough.seed());

    let summary = play_scripted(&mut playthrough)?;

    info!("=== Results ===");
    info!("Score: {} / {} ({}%)", summary.score, summary.max_score, summary.percentage);
    info!("Rating: {} - {}", summary.rating, summary.rating.message());
    info!(
        "Puzzle: {} | Quiz: {} correct | Memory: {:?} | Catch committed: {} | Fill: {} correct",
        summary.puzzle_completed,
        summary.quiz_correct,
        summary.memory_points,
        summary.catch_committed,
        summary.fill_correct
    );

    let hash = playthrough.state_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let mut replay = Playthrough::with_id(id, config, content)?;
    let replay_summary = play_scripted(&mut replay)?;
    let replay_hash = replay.state_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash || summary != replay_summary {
        bail!("DETERMINISM FAILURE: replay diverged");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}

/// Play every stage with a fixed script and return the completion summary.
///
/// The script is deliberately imperfect: one rejected puzzle drop, every
/// fourth quiz answer wrong, one memory mismatch and a wrong last blank.
fn play_scripted(playthrough: &mut Playthrough) -> Result<CompletionSummary> {
    playthrough.start()?;

    play_puzzle(playthrough)?;
    playthrough.advance()?;
    play_quiz(playthrough)?;
    playthrough.advance()?;
    play_memory(playthrough)?;
    playthrough.advance()?;
    play_catch(playthrough)?;
    playthrough.advance()?;
    play_fill_blank(playthrough)?;
    playthrough.advance()?;

    let events = playthrough.take_events();
    info!("Engine recorded {} events", events.len());

    debug_assert_eq!(playthrough.stage(), Stage::Completed);
    Ok(playthrough.summary()?)
}

fn play_puzzle(playthrough: &mut Playthrough) -> Result<()> {
    let Some(board) = playthrough.puzzle() else {
        bail!("puzzle board missing");
    };
    let level = board.level();
    let pieces = board.pieces().to_vec();
    info!("Puzzle: {} pieces ({}x{})", level.pieces, level.cols, level.rows);

    if let Some(first) = pieces.first() {
        let wrong_col = (first.col + 1) % level.cols;
        if wrong_col != first.col {
            playthrough.place_piece(first.id, wrong_col, first.row)?;
        }
    }
    for piece in &pieces {
        playthrough.place_piece(piece.id, piece.col, piece.row)?;
    }
    Ok(())
}

fn play_quiz(playthrough: &mut Playthrough) -> Result<()> {
    loop {
        let Some(round) = playthrough.quiz() else {
            bail!("quiz round missing");
        };
        let index = round.index();
        let Some(question) = round.current() else {
            break;
        };
        let option = if index % 4 == 3 {
            (question.correct + 1) % question.options.len()
        } else {
            question.correct
        };

        playthrough.quiz_select(option)?;
        let feedback = playthrough.quiz_submit()?;
        info!("Quiz #{}: correct={} awarded={}", index + 1, feedback.correct, feedback.awarded);

        if playthrough.quiz_next()? == QuizProgress::Finished {
            break;
        }
    }
    Ok(())
}

fn play_memory(playthrough: &mut Playthrough) -> Result<()> {
    let Some(board) = playthrough.memory() else {
        bail!("memory board missing");
    };
    let cards = board.cards().to_vec();
    let pairs = board.pair_count();

    if let Some(first) = cards.first() {
        if let Some(other) = cards.iter().find(|card| card.pair != first.pair) {
            playthrough.flip_card(&first.id)?;
            playthrough.flip_card(&other.id)?;
        }
    }

    for pair in 0..pairs {
        let ids: Vec<&str> = cards
            .iter()
            .filter(|card| card.pair == pair)
            .map(|card| card.id.as_str())
            .collect();
        for id in ids {
            playthrough.flip_card(id)?;
        }
    }

    info!("Memory: pool {} after {} mismatches", playthrough.hud().memory_pool, playthrough.hud().memory_moves);
    Ok(())
}

fn play_catch(playthrough: &mut Playthrough) -> Result<()> {
    for attempt in 1..=CATCH_ATTEMPTS {
        playthrough.catch_start()?;

        loop {
            let (over, direction) = match playthrough.catch_game() {
                Some(game) => (game.phase().is_over(), steer(game)),
                None => bail!("catch round missing"),
            };
            if over {
                break;
            }
            if let Some(direction) = direction {
                playthrough.catch_move(direction)?;
            }
            for event in playthrough.catch_advance(CATCH_STEP_MS)? {
                if let CatchEvent::Finished { won, stage_score, committed } = event {
                    info!("Catch attempt {}: won={} score={} committed={}", attempt, won, stage_score, committed);
                }
            }
        }

        if playthrough.catch_game().map(CatchGame::phase) == Some(CatchPhase::Won) {
            return Ok(());
        }
    }

    warn!("Catch stage not won after {} attempts", CATCH_ATTEMPTS);
    Ok(())
}

/// Move toward the lowest correct item still above the basket.
fn steer(game: &CatchGame) -> Option<BasketMove> {
    let config = game.config();
    let catch_line = config.arena_height - config.basket_height - config.basket_margin;

    let target = game
        .items()
        .iter()
        .filter(|item| item.is_correct && to_px(item.y) + config.item_size < catch_line)
        .max_by_key(|item| item.y)?;

    let gap = (to_px(target.x) + config.item_size / 2) - (game.basket_x() + config.basket_width / 2);
    if gap > config.basket_step / 2 {
        Some(BasketMove::Right)
    } else if gap < -config.basket_step / 2 {
        Some(BasketMove::Left)
    } else {
        None
    }
}

fn play_fill_blank(playthrough: &mut Playthrough) -> Result<()> {
    loop {
        let Some(round) = playthrough.fill_blank() else {
            bail!("fill-blank round missing");
        };
        let last = round.index() + 1 == round.len();
        let Some(template) = round.current() else {
            break;
        };
        let mut answers = template.blanks.clone();
        if last {
            if let Some(first) = answers.first_mut() {
                *first = "?".to_string();
            }
        }

        for (blank, answer) in answers.into_iter().enumerate() {
            playthrough.fill_set_blank(blank, answer)?;
        }
        let feedback = playthrough.fill_submit()?;
        info!("Fill-blank: correct={} awarded={}", feedback.correct, feedback.awarded);

        if playthrough.fill_next()? == FillProgress::Finished {
            break;
        }
    }
    Ok(())
}
