//! Annotate a chess game with a local UCI engine.
//!
//! Usage: annotate-game [--fen FEN] [--json] (--pgn FILE | --hint | MOVE...)

use std::path::PathBuf;

use anyhow::{bail, Context};
use chess_core::{ChessRules, Rules};
use serde::Serialize;
use tracing::{debug, info};

use game_annotator::{
    suggest_move, AnnotatorConfig, GamePipeline, GameSummary, MoveAnnotation, UciEngine,
};

#[derive(Debug, Default)]
struct CliArgs {
    fen: Option<String>,
    json: bool,
    pgn: Option<PathBuf>,
    hint: bool,
    moves: Vec<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut cli = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fen" => cli.fen = Some(args.next().context("--fen needs a FEN string")?),
            "--pgn" => cli.pgn = Some(args.next().context("--pgn needs a file path")?.into()),
            "--json" => cli.json = true,
            "--hint" => cli.hint = true,
            flag if flag.starts_with("--") => bail!("Unknown option {flag}"),
            _ => cli.moves.push(arg),
        }
    }
    if cli.pgn.is_some() && !cli.moves.is_empty() {
        bail!("Pass either --pgn or moves, not both");
    }
    Ok(cli)
}

#[derive(Serialize)]
struct GameReport<'a> {
    annotations: &'a [MoveAnnotation],
    key_moments: &'a [usize],
    summary: GameSummary,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let cli = parse_args(std::env::args().skip(1))?;
    let config = AnnotatorConfig::load()?;
    info!(stockfish_path = %config.stockfish_path, depth = config.analysis_depth, "Config loaded");

    let mut engine = UciEngine::spawn(&config).await?;

    if cli.hint {
        let fen = match cli.fen {
            Some(fen) => fen,
            None => ChessRules::new().to_fen(),
        };
        let hint = suggest_move(&mut engine, &fen, config.hint_profile()).await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&hint)?);
        } else {
            match &hint.san {
                Some(san) => println!("Suggested move: {san}"),
                None => println!("No move to suggest"),
            }
            println!("{}", hint.explanation);
        }
        engine.quit().await;
        return Ok(());
    }

    let (start_fen, tokens) = match &cli.pgn {
        Some(path) => {
            let pgn = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let game = chess_core::pgn::parse_pgn(&pgn).context("No moves found in PGN")?;
            info!(white = %game.metadata.white, black = %game.metadata.black, "Loaded PGN");
            (cli.fen.clone().or(game.start_fen), game.moves)
        }
        None => (cli.fen.clone(), cli.moves.clone()),
    };

    let rules = match &start_fen {
        Some(fen) => ChessRules::from_fen(fen)?,
        None => ChessRules::new(),
    };

    let mut pipeline = GamePipeline::new(engine, rules, &tokens, config.analysis_profile())?;
    pipeline
        .run(|progress| debug!(current = progress.current, total = progress.total, "Progress"))
        .await?;

    if cli.json {
        let report = GameReport {
            annotations: pipeline.annotations(),
            key_moments: pipeline.key_moments(),
            summary: pipeline.summary(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for index in 0..pipeline.annotations().len() {
            if let Some(text) = pipeline.explain_position(index) {
                println!("{text}\n");
            }
        }
        println!("{}", pipeline.formatted_report());
    }

    let mut engine = pipeline.into_engine();
    engine.quit().await;
    Ok(())
}
