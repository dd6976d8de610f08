//! Interactive play session against a local UCI engine.
//!
//! The human enters moves as square pairs (`e2e4`); the controller validates
//! them, plays the engine's answer and keeps the move history. Session
//! commands mirror the buttons of a board UI: hint, flip, reset, position
//! load, history navigation and engine settings.

use std::time::Duration;

use shakmaty::Square;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use play_session::{
    AppConfig, BoardRenderer, GameStatus, ProcessEngine, SearchBackend, SessionError, TextBoard,
    TurnController,
};

const HELP: &str = "commands: a move like e2e4, hint, flip, reset, fen <fen>, jump <n>, latest, \
moves <square>, set <depth> <movetime_ms>, history, export, quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let config = AppConfig::load()?;
    info!(
        engine_path = %config.engine_path,
        depth = config.search_depth,
        movetime_ms = config.move_time_ms,
        "Session config loaded"
    );

    let engine = ProcessEngine::spawn(
        &config.engine_path,
        Duration::from_secs(config.engine_timeout_secs),
    )
    .await?;
    info!("Engine ready");

    let mut controller = TurnController::new(
        engine,
        TextBoard::new(),
        Duration::from_millis(config.engine_settle_ms),
    );
    controller.update_settings(config.search_depth, config.move_time_ms)?;

    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        if let Err(e) = dispatch(&mut controller, line).await {
            println!("error: {e}");
        }
    }

    info!("Shutting down engine");
    controller.shutdown().await?;
    Ok(())
}

async fn dispatch<E, R>(
    controller: &mut TurnController<E, R>,
    line: &str,
) -> Result<(), SessionError>
where
    E: SearchBackend,
    R: BoardRenderer,
{
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("");

    match command {
        "help" => println!("{HELP}"),
        "hint" => {
            let uci = controller.hint().await?;
            println!("Best move: {} to {}", &uci[0..2], &uci[2..4]);
        }
        "flip" => controller.flip_orientation(),
        "reset" => {
            controller.reset();
            println!("New game.");
        }
        "fen" => {
            let fen = line.trim_start_matches("fen").trim();
            if fen.is_empty() {
                return Err(SessionError::InvalidFen(String::new()));
            }
            controller.load_position(fen)?;
        }
        "jump" => {
            let n: usize = words
                .next()
                .and_then(|w| w.parse().ok())
                .ok_or(SessionError::UnknownPly(0))?;
            println!("{}", controller.jump_to_ply(n)?);
        }
        "latest" => println!("{}", controller.jump_to_latest()?),
        "moves" => {
            let square = parse_square(words.next().unwrap_or(""))?;
            let targets: Vec<String> = controller
                .legal_targets(square)
                .into_iter()
                .map(|s| s.to_string())
                .collect();
            if targets.is_empty() {
                println!("no moves from {square}");
            } else {
                println!("{square}: {}", targets.join(" "));
            }
        }
        "set" => {
            let depth: u8 = words
                .next()
                .and_then(|w| w.parse().ok())
                .ok_or(SessionError::InvalidSettings("depth must be at least 1"))?;
            let movetime_ms: u32 = words.next().and_then(|w| w.parse().ok()).ok_or(
                SessionError::InvalidSettings("move time must be at least 1ms"),
            )?;
            controller.update_settings(depth, movetime_ms)?;
            println!("Settings updated: depth {depth}, movetime {movetime_ms}ms");
        }
        "history" => println!("{}", controller.session().rendered_move_list()),
        "export" => println!("{}", controller.export_history()?),
        _ => play(controller, line).await?,
    }
    Ok(())
}

/// Treat the input as a square pair, `e2e4` or `e2 e4`.
async fn play<E, R>(controller: &mut TurnController<E, R>, input: &str) -> Result<(), SessionError>
where
    E: SearchBackend,
    R: BoardRenderer,
{
    let compact: String = input.split_whitespace().collect();
    if !compact.is_ascii() || compact.len() != 4 {
        return Err(SessionError::InvalidMove(input.to_string()));
    }
    let from = parse_square(&compact[0..2])?;
    let to = parse_square(&compact[2..4])?;

    let report = controller.play_human_move(from, to).await?;
    println!("you: {}", report.human.san);
    if let Some(engine) = &report.engine {
        println!("engine: {}", engine.san);
    }
    match report.status {
        GameStatus::Checkmate => println!("Checkmate"),
        GameStatus::Stalemate => println!("Stalemate"),
        GameStatus::Drawn => println!("Draw"),
        GameStatus::Ongoing => {}
    }
    Ok(())
}

fn parse_square(s: &str) -> Result<Square, SessionError> {
    s.parse()
        .map_err(|_| SessionError::InvalidMove(s.to_string()))
}
