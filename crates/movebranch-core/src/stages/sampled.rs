//! Record plus a sample of its move pairs.

use std::collections::HashSet;

use crate::error::RecordError;
use crate::lines::{format_move_line, parse_move_line, split_section};
use crate::record::GameRecord;
use crate::sampler::{sample_count, sample_indices, CountStrategy, SampleDistribution};

pub const MOVES_SAMPLED_MARKER: &str = "MovesSampled";

#[derive(Debug, Clone, PartialEq)]
pub struct SampledMovesStage {
    record: GameRecord,
    indices: Vec<usize>,
}

impl SampledMovesStage {
    /// Wrap a record and a set of move pair indices.
    pub fn new(record: GameRecord, indices: Vec<usize>) -> Result<Self, RecordError> {
        let len = record.moves().len();
        let mut seen = HashSet::with_capacity(indices.len());
        for &index in &indices {
            if index >= len {
                return Err(RecordError::IndexOutOfRange { index, len });
            }
            if !seen.insert(index) {
                return Err(RecordError::DuplicateIndex(index));
            }
        }
        Ok(Self { record, indices })
    }

    /// Sample move pairs of `record` in which the winner moved.
    pub fn sample(
        record: GameRecord,
        distribution: SampleDistribution,
        strategy: CountStrategy,
        seed: u64,
    ) -> Self {
        let population = record.winner_pair_count();
        let count = sample_count(strategy, population);
        let indices = sample_indices(distribution, population, count, seed);
        Self { record, indices }
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    /// 0-based move pair indices.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = self.record.to_lines();
        lines.push(MOVES_SAMPLED_MARKER.to_string());
        for &index in &self.indices {
            let m = &self.record.moves()[index];
            lines.push(format_move_line(index + 1, m.white(), m.black()));
        }
        lines
    }

    pub fn from_lines(lines: &[String]) -> Result<Self, RecordError> {
        let (record_lines, sampled_lines) = split_section(lines, MOVES_SAMPLED_MARKER)?;
        let record = GameRecord::from_lines(record_lines)?;

        let mut indices = Vec::with_capacity(sampled_lines.len());
        for line in sampled_lines.iter().filter(|l| !l.trim().is_empty()) {
            let (number, white, black) = parse_move_line(line)?;
            let index = number
                .checked_sub(1)
                .ok_or_else(|| RecordError::malformed(line, "move numbers start at 1"))?;
            let m = record
                .moves()
                .get(index)
                .ok_or(RecordError::IndexOutOfRange {
                    index,
                    len: record.moves().len(),
                })?;
            if m.white() != white || m.black() != black {
                return Err(RecordError::MoveMismatch {
                    index,
                    expected: format!("{} {}", m.white(), m.black().unwrap_or("")),
                    found: format!("{} {}", white, black.unwrap_or("")),
                });
            }
            indices.push(index);
        }

        Self::new(record, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> GameRecord {
        let lines: Vec<String> = [
            "GameId       9",
            "Result       1-0",
            "PlyCount       7",
            "WhiteElo       1500",
            "BlackElo       1480",
            "Moves",
            "1      e2e4      e7e5",
            "2      d1h5      b8c6",
            "3      f1c4      g8f6",
            "4      h5f7",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        GameRecord::from_lines(&lines).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let stage = SampledMovesStage::new(record(), vec![1, 3]).unwrap();
        let lines = stage.to_lines();
        assert!(lines.starts_with(&stage.record().to_lines()));
        assert_eq!(lines[lines.len() - 3], MOVES_SAMPLED_MARKER);
        assert_eq!(SampledMovesStage::from_lines(&lines).unwrap(), stage);
    }

    #[test]
    fn test_sample_respects_count() {
        let stage = SampledMovesStage::sample(
            record(),
            SampleDistribution::Uniform,
            CountStrategy::Percentage(50.0),
            3,
        );
        assert_eq!(stage.indices().len(), 2);
        assert!(stage.indices().iter().all(|&i| i < 4));
    }

    #[test]
    fn test_sample_skips_pair_without_winner_half() {
        let lines: Vec<String> = [
            "GameId       21",
            "Result       0-1",
            "PlyCount       3",
            "WhiteElo       1400",
            "BlackElo       1400",
            "Moves",
            "1      e2e4      e7e5",
            "2      d1h5",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let record = GameRecord::from_lines(&lines).unwrap();

        for distribution in [SampleDistribution::Uniform, SampleDistribution::Normal] {
            let stage =
                SampledMovesStage::sample(record.clone(), distribution, CountStrategy::Exact(2), 5);
            assert_eq!(stage.indices(), &[0]);
        }
    }

    #[test]
    fn test_rejects_bad_indices() {
        assert_eq!(
            SampledMovesStage::new(record(), vec![4]),
            Err(RecordError::IndexOutOfRange { index: 4, len: 4 })
        );
        assert_eq!(
            SampledMovesStage::new(record(), vec![1, 1]),
            Err(RecordError::DuplicateIndex(1))
        );
    }

    #[test]
    fn test_mismatched_sampled_move() {
        let mut lines = SampledMovesStage::new(record(), vec![0]).unwrap().to_lines();
        let last = lines.len() - 1;
        lines[last] = "  1      e2e4      c7c5".to_string();
        assert!(matches!(
            SampledMovesStage::from_lines(&lines),
            Err(RecordError::MoveMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(
            SampledMovesStage::from_lines(&record().to_lines()),
            Err(RecordError::MissingSection(MOVES_SAMPLED_MARKER))
        );
    }
}
