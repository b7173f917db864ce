//! Worker error types

use movebranch_core::RecordError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Engine did not answer {cmd:?} within {secs}s")]
    EngineTimeout { cmd: String, secs: u64 },

    #[error("Malformed engine response to {cmd:?}: {line:?}")]
    MalformedResponse { cmd: String, line: String },

    #[error("Game {game_id}: played move {mv} is not legal at ply {ply}")]
    PlayedMoveNotLegal { game_id: u32, ply: usize, mv: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl WorkerError {
    /// Whether the pipeline may drop the current record and carry on.
    ///
    /// Record-local failures leave the engine session usable. Anything that
    /// touches the session or the output does not.
    pub fn skips_record(&self) -> bool {
        matches!(
            self,
            WorkerError::Record(_)
                | WorkerError::MalformedResponse { .. }
                | WorkerError::PlayedMoveNotLegal { .. }
        )
    }
}
