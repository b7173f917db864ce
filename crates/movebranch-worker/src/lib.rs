pub mod branch;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod stages;

pub use config::GenConfig;
pub use engine::{EngineSession, StockfishEngine};
pub use error::WorkerError;
pub use pipeline::{run, OutputFormat, RunSummary, Stage};
