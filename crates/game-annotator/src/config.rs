//! Annotator configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::DepthProfile;
use crate::error::AnnotateError;

#[derive(Clone, Debug)]
pub struct AnnotatorConfig {
    /// Path to the UCI engine binary
    pub stockfish_path: String,

    /// Target depth for post-game analysis
    pub analysis_depth: u32,

    /// Wall-clock budget per analyzed position
    pub analysis_timeout: Duration,

    /// Target depth for live hints
    pub hint_depth: u32,

    pub hint_timeout: Duration,

    /// Engine `Threads` option
    pub engine_threads: u32,

    /// Engine `Hash` option in MB
    pub engine_hash_mb: u32,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            stockfish_path: "/usr/local/bin/stockfish".to_string(),
            analysis_depth: DepthProfile::ANALYSIS.target_depth,
            analysis_timeout: DepthProfile::ANALYSIS.timeout,
            hint_depth: DepthProfile::HINT.target_depth,
            hint_timeout: DepthProfile::HINT.timeout,
            engine_threads: 1,
            engine_hash_mb: 64,
        }
    }
}

impl AnnotatorConfig {
    /// Load configuration from environment variables, falling back to defaults
    /// for anything unset. Values that are set but malformed are errors.
    pub fn load() -> Result<Self, AnnotateError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AnnotateError> {
        let defaults = Self::default();

        let stockfish_path = lookup("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path);

        let analysis_depth = parse_var(&lookup, "ANALYSIS_DEPTH")?.unwrap_or(defaults.analysis_depth);
        let analysis_timeout = parse_var(&lookup, "ANALYSIS_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.analysis_timeout);

        let hint_depth = parse_var(&lookup, "HINT_DEPTH")?.unwrap_or(defaults.hint_depth);
        let hint_timeout = parse_var(&lookup, "HINT_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.hint_timeout);

        let engine_threads = parse_var(&lookup, "ENGINE_THREADS")?.unwrap_or(defaults.engine_threads);
        let engine_hash_mb = parse_var(&lookup, "ENGINE_HASH_MB")?.unwrap_or(defaults.engine_hash_mb);

        if analysis_depth == 0 || hint_depth == 0 {
            return Err(AnnotateError::Config("search depth must be at least 1".into()));
        }

        Ok(Self {
            stockfish_path,
            analysis_depth,
            analysis_timeout,
            hint_depth,
            hint_timeout,
            engine_threads,
            engine_hash_mb,
        })
    }

    pub fn analysis_profile(&self) -> DepthProfile {
        DepthProfile {
            target_depth: self.analysis_depth,
            timeout: self.analysis_timeout,
        }
    }

    pub fn hint_profile(&self) -> DepthProfile {
        DepthProfile {
            target_depth: self.hint_depth,
            timeout: self.hint_timeout,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, AnnotateError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AnnotateError::Config(format!("{key} is not a valid number: {raw}"))),
    }
}
