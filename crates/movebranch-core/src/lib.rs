//! Game records, index sampling and the derived stages built on top of them.
//!
//! Everything here is pure data and text. Engine access lives in
//! `movebranch-worker`.

pub mod comparison;
pub mod error;
pub mod features;
pub mod lines;
pub mod record;
pub mod sampler;
pub mod stages;
pub mod train;

pub use comparison::{comparison_header, comparison_pair, ComparisonRow, PairLabel};
pub use error::RecordError;
pub use features::{FeatureSnapshot, FeatureValue, FEATURE_COUNT, FEATURE_NAMES};
pub use lines::RECORD_TERMINATOR;
pub use record::{GameMove, GameRecord, GameResult, Side};
pub use sampler::{CountStrategy, SampleDistribution};
pub use stages::{AlternativesStage, ContinuationsStage, SampledMovesStage};
pub use train::{MoveBranch, TrainGame};
