//! Shared helpers for integration tests: a scripted search engine.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use chess_core::PlyMove;
use game_annotator::{
    AnnotateError, DepthProfile, Score, SearchEngine, SearchInfo, SearchLimit, SearchUpdate,
};

/// Shallow profile so scripted searches finish in a few reports and timeouts fire quickly
pub const TEST_PROFILE: DepthProfile = DepthProfile {
    target_depth: 3,
    timeout: Duration::from_millis(300),
};

/// One search's worth of engine output
pub struct ScriptedSearch {
    updates: Vec<SearchUpdate>,
    best: Option<PlyMove>,
    /// Go silent after the last report instead of finishing
    hangs: bool,
}

impl ScriptedSearch {
    /// Reports at depths 1..=target with a fixed side-to-move score
    pub fn cp(cp: i32, pv: &[&str]) -> Self {
        Self::with_score(Score::Centipawns(cp), pv, TEST_PROFILE.target_depth)
    }

    pub fn mate(moves: i32, pv: &[&str]) -> Self {
        Self::with_score(Score::Mate(moves), pv, TEST_PROFILE.target_depth)
    }

    /// Reports up to `depth` and then never finishes on its own
    pub fn stalls_at(depth: u32, cp: i32, pv: &[&str]) -> Self {
        let mut search = Self::with_score(Score::Centipawns(cp), pv, depth);
        search.hangs = true;
        search
    }

    fn with_score(score: Score, pv: &[&str], depth: u32) -> Self {
        let pv: Vec<PlyMove> = pv.iter().map(|m| m.parse().unwrap()).collect();
        let updates = (1..=depth)
            .map(|depth| {
                SearchUpdate::Info(SearchInfo {
                    depth,
                    score,
                    pv: pv.clone(),
                })
            })
            .collect();
        Self {
            updates,
            best: pv.first().copied(),
            hangs: false,
        }
    }
}

struct RunningSearch {
    updates: VecDeque<SearchUpdate>,
    best: Option<PlyMove>,
    hangs: bool,
    stopped: bool,
}

/// Plays back scripted searches in order and rejects overlapping requests
pub struct ScriptedEngine {
    script: VecDeque<ScriptedSearch>,
    running: Option<RunningSearch>,
    /// Every position the engine was asked to search
    pub positions: Vec<String>,
    pub stop_calls: usize,
}

impl ScriptedEngine {
    pub fn new(script: Vec<ScriptedSearch>) -> Self {
        Self {
            script: script.into(),
            running: None,
            positions: Vec::new(),
            stop_calls: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

#[async_trait]
impl SearchEngine for ScriptedEngine {
    async fn set_position(&mut self, fen: &str) -> Result<(), AnnotateError> {
        if self.running.is_some() {
            return Err(AnnotateError::Engine("position set during a search".to_string()));
        }
        self.positions.push(fen.to_string());
        Ok(())
    }

    async fn start_search(&mut self, _limit: SearchLimit) -> Result<(), AnnotateError> {
        if self.running.is_some() {
            return Err(AnnotateError::Engine("overlapping search".to_string()));
        }
        let search = self
            .script
            .pop_front()
            .ok_or_else(|| AnnotateError::Engine("script exhausted".to_string()))?;
        self.running = Some(RunningSearch {
            updates: search.updates.into(),
            best: search.best,
            hangs: search.hangs,
            stopped: false,
        });
        Ok(())
    }

    async fn next_update(&mut self) -> Result<SearchUpdate, AnnotateError> {
        let Some(search) = self.running.as_mut() else {
            return Err(AnnotateError::Engine("no search running".to_string()));
        };
        if !search.stopped {
            if let Some(update) = search.updates.pop_front() {
                return Ok(update);
            }
            if search.hangs {
                std::future::pending::<()>().await;
            }
        }
        let best = search.best;
        self.running = None;
        Ok(SearchUpdate::BestMove(best))
    }

    async fn stop(&mut self) -> Result<(), AnnotateError> {
        self.stop_calls += 1;
        if let Some(search) = self.running.as_mut() {
            search.stopped = true;
        }
        Ok(())
    }
}
