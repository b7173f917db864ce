//! Generator configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use movebranch_core::{CountStrategy, SampleDistribution};

use crate::error::WorkerError;

#[derive(Clone, Debug)]
pub struct GenConfig {
    /// Path to the engine binary (needs `genmoves` and `featextract`)
    pub stockfish_path: String,

    /// Thinking budget per continuation move
    pub movetime_ms: u32,

    /// Engine follow-up plies after each first move
    pub continuation_length: usize,

    pub distribution: SampleDistribution,

    pub count: CountStrategy,

    /// Base seed; each game samples with `seed + game id`
    pub seed: u64,

    /// Bound on every engine response line
    pub engine_timeout: Duration,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            stockfish_path: "/usr/local/bin/stockfish".to_string(),
            movetime_ms: 20,
            continuation_length: 6,
            distribution: SampleDistribution::Normal,
            count: CountStrategy::Percentage(10.0),
            seed: 42,
            engine_timeout: Duration::from_secs(30),
        }
    }
}

impl GenConfig {
    /// Load configuration from environment variables.
    /// Unset variables fall back to defaults; unparsable ones are errors.
    pub fn load() -> Result<Self, WorkerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WorkerError> {
        let defaults = Self::default();

        let stockfish_path = lookup("STOCKFISH_PATH").unwrap_or(defaults.stockfish_path);
        let movetime_ms = parse_var(&lookup, "MOVETIME_MS")?.unwrap_or(defaults.movetime_ms);
        let continuation_length =
            parse_var(&lookup, "CONTINUATION_LENGTH")?.unwrap_or(defaults.continuation_length);
        let distribution =
            parse_var(&lookup, "SAMPLE_DISTRIBUTION")?.unwrap_or(defaults.distribution);

        let count = match parse_var(&lookup, "SAMPLE_EXACT")? {
            Some(n) => CountStrategy::Exact(n),
            None => match parse_var::<f64>(&lookup, "SAMPLE_PERCENT")? {
                Some(pct) if !(0.0..=100.0).contains(&pct) => {
                    return Err(WorkerError::Config(format!(
                        "SAMPLE_PERCENT must be within 0..=100, got {pct}"
                    )))
                }
                Some(pct) => CountStrategy::Percentage(pct),
                None => defaults.count,
            },
        };

        let seed = parse_var(&lookup, "SAMPLE_SEED")?.unwrap_or(defaults.seed);
        let engine_timeout = parse_var(&lookup, "ENGINE_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.engine_timeout);

        Ok(Self {
            stockfish_path,
            movetime_ms,
            continuation_length,
            distribution,
            count,
            seed,
            engine_timeout,
        })
    }

    /// Sampling seed for one game.
    pub fn game_seed(&self, game_id: u32) -> u64 {
        self.seed.wrapping_add(u64::from(game_id))
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, WorkerError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| WorkerError::Config(format!("{key} has invalid value {raw:?}")))
        })
        .transpose()
}
