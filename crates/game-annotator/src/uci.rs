//! UCI engine wrapper over a child process (async I/O)

use std::process::Stdio;
use std::str::FromStr;

use async_trait::async_trait;
use chess_core::PlyMove;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::config::AnnotatorConfig;
use crate::engine::{SearchEngine, SearchInfo, SearchLimit, SearchUpdate};
use crate::error::AnnotateError;
use crate::score::Score;

/// UCI engine instance, e.g. Stockfish
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    /// A `go` is outstanding and its `bestmove` has not been read yet
    searching: bool,
}

impl UciEngine {
    /// Spawn the configured engine and initialize UCI
    pub async fn spawn(config: &AnnotatorConfig) -> Result<Self, AnnotateError> {
        Self::new(
            &config.stockfish_path,
            config.engine_threads,
            config.engine_hash_mb,
        )
        .await
    }

    pub async fn new(path: &str, threads: u32, hash_mb: u32) -> Result<Self, AnnotateError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AnnotateError::Engine(format!("Failed to spawn engine at {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| AnnotateError::Engine("Engine stdin unavailable".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| AnnotateError::Engine("Engine stdout unavailable".to_string()))?;

        let mut engine = Self {
            process,
            stdin,
            lines: BufReader::new(stdout).lines(),
            searching: false,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine
            .send(&format!("setoption name Threads value {threads}"))
            .await?;
        engine
            .send(&format!("setoption name Hash value {hash_mb}"))
            .await?;
        engine.send("setoption name UCI_AnalyseMode value true").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), AnnotateError> {
        debug!(cmd, "UCI <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| AnnotateError::Engine(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| AnnotateError::Engine(format!("Failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    /// Read one line. `Lines::next_line` is cancellation safe, so this may sit inside a timeout.
    async fn read_line(&mut self) -> Result<String, AnnotateError> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(AnnotateError::Engine("Engine closed its output".to_string())),
            Err(e) => Err(AnnotateError::Engine(format!("Failed to read from engine: {e}"))),
        }
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), AnnotateError> {
        loop {
            let line = self.read_line().await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "UCI >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Finish a search left running by an abandoned caller so its `bestmove`
    /// is not mistaken for the next one.
    async fn abandon_search(&mut self) -> Result<(), AnnotateError> {
        self.send("stop").await?;
        while self.searching {
            let line = self.read_line().await?;
            if line.trim_start().starts_with("bestmove") {
                self.searching = false;
            }
        }
        Ok(())
    }

    /// Send quit and wait for the process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.process.start_kill();
    }
}

#[async_trait]
impl SearchEngine for UciEngine {
    async fn set_position(&mut self, fen: &str) -> Result<(), AnnotateError> {
        if self.searching {
            debug!("Previous search still running, stopping it");
            self.abandon_search().await?;
        }
        self.send(&format!("position fen {fen}")).await
    }

    async fn start_search(&mut self, limit: SearchLimit) -> Result<(), AnnotateError> {
        self.send(&go_command(limit)).await?;
        self.searching = true;
        Ok(())
    }

    async fn next_update(&mut self) -> Result<SearchUpdate, AnnotateError> {
        loop {
            let line = self.read_line().await?;
            let trimmed = line.trim();
            if trimmed.starts_with("bestmove") {
                debug!(line = trimmed, "UCI >");
                self.searching = false;
                return Ok(SearchUpdate::BestMove(parse_bestmove(trimmed)));
            }
            if let Some(info) = parse_info(trimmed) {
                return Ok(SearchUpdate::Info(info));
            }
        }
    }

    async fn stop(&mut self) -> Result<(), AnnotateError> {
        if self.searching {
            self.send("stop").await?;
        }
        Ok(())
    }
}

fn go_command(limit: SearchLimit) -> String {
    let mut cmd = String::from("go");
    if let Some(depth) = limit.depth {
        cmd.push_str(&format!(" depth {depth}"));
    }
    if let Some(movetime) = limit.movetime {
        cmd.push_str(&format!(" movetime {}", movetime.as_millis()));
    }
    if limit.depth.is_none() && limit.movetime.is_none() {
        cmd.push_str(" infinite");
    }
    cmd
}

/// Parse the token following `key`
fn value_after<T: FromStr>(line: &str, key: &str) -> Option<T> {
    let mut parts = line.split_whitespace();
    parts.find(|part| *part == key)?;
    parts.next()?.parse().ok()
}

fn parse_depth(line: &str) -> Option<u32> {
    value_after(line, "depth")
}

fn parse_cp(line: &str) -> Option<i32> {
    value_after(line, "cp")
}

fn parse_mate(line: &str) -> Option<i32> {
    value_after(line, "mate")
}

/// PV runs to the end of the line or the first token that is not a move
fn parse_pv(line: &str) -> Vec<PlyMove> {
    line.split_whitespace()
        .skip_while(|part| *part != "pv")
        .skip(1)
        .map_while(|part| part.parse().ok())
        .collect()
}

/// Parse a scored `info` line. Lines without depth or score, and secondary
/// multipv lines, yield `None`.
fn parse_info(line: &str) -> Option<SearchInfo> {
    if !line.starts_with("info") {
        return None;
    }
    if value_after::<u32>(line, "multipv").is_some_and(|idx| idx != 1) {
        return None;
    }
    let depth = parse_depth(line)?;
    let score = match (parse_cp(line), parse_mate(line)) {
        (_, Some(mate)) => Score::Mate(mate),
        (Some(cp), None) => Score::Centipawns(cp),
        (None, None) => return None,
    };
    Some(SearchInfo {
        depth,
        score,
        pv: parse_pv(line),
    })
}

/// `bestmove (none)` and unparseable moves become `None`
fn parse_bestmove(line: &str) -> Option<PlyMove> {
    line.split_whitespace().nth(1)?.parse().ok()
}
