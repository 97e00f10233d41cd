//! Search-engine contract and depth-or-timeout evaluation polling.
//!
//! An engine instance holds one global "current position", so requests are strictly
//! serial: `&mut self` on every call keeps two searches from overlapping.

use std::time::Duration;

use async_trait::async_trait;
use chess_core::PlyMove;
use serde::Serialize;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::error::AnnotateError;
use crate::score::Score;

/// How long to wait for `bestmove` after asking the engine to stop
const STOP_GRACE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimit {
    pub depth: Option<u32>,
    pub movetime: Option<Duration>,
}

impl SearchLimit {
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            movetime: None,
        }
    }

    pub fn movetime(movetime: Duration) -> Self {
        Self {
            depth: None,
            movetime: Some(movetime),
        }
    }
}

/// One incremental search report
#[derive(Debug, Clone, PartialEq)]
pub struct SearchInfo {
    pub depth: u32,
    pub score: Score,
    pub pv: Vec<PlyMove>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    Info(SearchInfo),
    /// Search finished; `None` when the engine had no move to play
    BestMove(Option<PlyMove>),
}

/// External search engine: set a position, start a search, then pull updates
/// at increasing depth until `BestMove`.
#[async_trait]
pub trait SearchEngine: Send {
    async fn set_position(&mut self, fen: &str) -> Result<(), AnnotateError>;

    async fn start_search(&mut self, limit: SearchLimit) -> Result<(), AnnotateError>;

    async fn next_update(&mut self) -> Result<SearchUpdate, AnnotateError>;

    /// Advisory; the engine still reports `BestMove` afterwards.
    async fn stop(&mut self) -> Result<(), AnnotateError>;
}

/// "Good enough" depth and wall-clock budget for one caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthProfile {
    pub target_depth: u32,
    pub timeout: Duration,
}

impl DepthProfile {
    /// Post-game verification analysis
    pub const ANALYSIS: DepthProfile = DepthProfile {
        target_depth: 18,
        timeout: Duration::from_secs(5),
    };

    /// Live hinting during play
    pub const HINT: DepthProfile = DepthProfile {
        target_depth: 12,
        timeout: Duration::from_secs(3),
    };
}

/// Highest-depth result observed for one position
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub depth: u32,
    /// Relative to the side to move
    pub score: Score,
    pub pv: Vec<PlyMove>,
    pub best_move: Option<PlyMove>,
    /// The budget ran out before the target depth
    pub timed_out: bool,
}

impl Evaluation {
    /// Overwrite with a report that is at least as deep. Shallower reports are dropped.
    fn latch(&mut self, info: SearchInfo) {
        if info.depth < self.depth {
            return;
        }
        self.depth = info.depth;
        self.score = info.score;
        // Best move and line always come from the same report
        self.best_move = info.pv.first().copied();
        self.pv = info.pv;
    }
}

/// Evaluate `fen` until the profile's target depth is reached or its timeout elapses.
///
/// On timeout the engine is told to stop and the deepest result seen so far is returned
/// with `timed_out` set; this is never an error.
pub async fn evaluate<E>(
    engine: &mut E,
    fen: &str,
    profile: DepthProfile,
) -> Result<Evaluation, AnnotateError>
where
    E: SearchEngine + ?Sized,
{
    engine.set_position(fen).await?;
    engine
        .start_search(SearchLimit::depth(profile.target_depth))
        .await?;

    let deadline = Instant::now() + profile.timeout;
    let mut evaluation = Evaluation::default();

    loop {
        let update = match timeout_at(deadline, engine.next_update()).await {
            Ok(update) => update?,
            Err(_) => {
                warn!(
                    fen,
                    depth = evaluation.depth,
                    target = profile.target_depth,
                    "Evaluation timed out, using best result so far"
                );
                evaluation.timed_out = true;
                engine.stop().await?;
                finish_search(engine, &mut evaluation).await?;
                return Ok(evaluation);
            }
        };

        match update {
            SearchUpdate::Info(info) => {
                evaluation.latch(info);
                if evaluation.depth >= profile.target_depth {
                    engine.stop().await?;
                    finish_search(engine, &mut evaluation).await?;
                    return Ok(evaluation);
                }
            }
            SearchUpdate::BestMove(best) => {
                if evaluation.best_move.is_none() {
                    evaluation.best_move = best;
                }
                return Ok(evaluation);
            }
        }
    }
}

/// Drain reports after a stop until `bestmove`. Reports arriving after the cutoff are ignored.
async fn finish_search<E>(engine: &mut E, evaluation: &mut Evaluation) -> Result<(), AnnotateError>
where
    E: SearchEngine + ?Sized,
{
    let grace = Instant::now() + STOP_GRACE;
    loop {
        match timeout_at(grace, engine.next_update()).await {
            Ok(Ok(SearchUpdate::BestMove(best))) => {
                if evaluation.best_move.is_none() {
                    evaluation.best_move = best;
                }
                return Ok(());
            }
            Ok(Ok(SearchUpdate::Info(_))) => continue,
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                debug!("Engine did not confirm stop within grace period");
                return Ok(());
            }
        }
    }
}
