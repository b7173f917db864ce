//! Derived record stages.
//!
//! Each stage owns a copy of the stage below it plus its own additions.
//! `to_lines` of a stage starts with the `to_lines` of the stage below, then
//! appends a section opened by the stage's marker line. `from_lines` splits
//! at that marker and hands the prefix to the stage below.

pub mod alternatives;
pub mod continuations;
pub mod sampled;

pub use alternatives::AlternativesStage;
pub use continuations::ContinuationsStage;
pub use sampled::SampledMovesStage;

use crate::error::RecordError;
use crate::record::{GameRecord, Side};

/// Column widths for (sampled move, alternative move) lines.
///
/// Black moves sit one column further right, like in the move list.
pub(crate) fn winner_columns(record: &GameRecord) -> Result<(usize, usize), RecordError> {
    match record.winner() {
        Some(Side::White) => Ok((12, 15)),
        Some(Side::Black) => Ok((24, 27)),
        None => Err(RecordError::NoWinner(record.id)),
    }
}
