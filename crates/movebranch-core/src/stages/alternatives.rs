//! Sampled moves plus the legal alternatives to each.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::RecordError;
use crate::lines::{parse_int, split_section};
use crate::record::GameRecord;
use crate::stages::sampled::SampledMovesStage;
use crate::stages::winner_columns;

pub const ALT_MOVES_MARKER: &str = "AltMoves";

#[derive(Debug, Clone, PartialEq)]
pub struct AlternativesStage {
    sampled: SampledMovesStage,
    alternatives: BTreeMap<usize, Vec<String>>,
}

impl AlternativesStage {
    /// Attach alternatives to every sampled move pair.
    ///
    /// Keys must be exactly the sampled indices, and no alternative may be
    /// the move the winner played.
    pub fn new(
        sampled: SampledMovesStage,
        alternatives: BTreeMap<usize, Vec<String>>,
    ) -> Result<Self, RecordError> {
        let record = sampled.record();
        winner_columns(record)?;

        let expected: BTreeSet<usize> = sampled.indices().iter().copied().collect();
        let found: BTreeSet<usize> = alternatives.keys().copied().collect();
        if expected != found {
            return Err(RecordError::inconsistent(
                ALT_MOVES_MARKER,
                format!("sampled indices {expected:?}, alternatives for {found:?}"),
            ));
        }

        for (&index, moves) in &alternatives {
            let played = record.winner_move(index)?;
            let mut seen = BTreeSet::new();
            for mv in moves {
                if mv == played {
                    return Err(RecordError::inconsistent(
                        ALT_MOVES_MARKER,
                        format!("played move {played} listed as alternative at {}", index + 1),
                    ));
                }
                if !seen.insert(mv.as_str()) {
                    return Err(RecordError::inconsistent(
                        ALT_MOVES_MARKER,
                        format!("alternative {mv} repeated at {}", index + 1),
                    ));
                }
            }
        }

        Ok(Self {
            sampled,
            alternatives,
        })
    }

    pub fn sampled(&self) -> &SampledMovesStage {
        &self.sampled
    }

    pub fn record(&self) -> &GameRecord {
        self.sampled.record()
    }

    pub fn alternatives(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.alternatives
    }

    /// Alternatives at sampled move pair `index`.
    pub fn alternatives_at(&self, index: usize) -> Option<&[String]> {
        self.alternatives.get(&index).map(Vec::as_slice)
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = self.sampled.to_lines();
        lines.push(ALT_MOVES_MARKER.to_string());

        let record = self.record();
        // checked in `new`
        let (played_width, alt_width) = winner_columns(record).unwrap_or((12, 15));
        for &index in self.sampled.indices() {
            let alts = &self.alternatives[&index];
            let played = record.winner_move(index).unwrap_or_default();
            lines.push(format!(
                "{:>3}{:>4}{played:>played_width$}",
                index + 1,
                alts.len()
            ));
            lines.extend(alts.iter().map(|mv| format!("{mv:>alt_width$}")));
        }
        lines
    }

    pub fn from_lines(lines: &[String]) -> Result<Self, RecordError> {
        let (sampled_lines, alt_lines) = split_section(lines, ALT_MOVES_MARKER)?;
        let sampled = SampledMovesStage::from_lines(sampled_lines)?;
        let record = sampled.record();

        let mut alternatives = BTreeMap::new();
        let mut iter = alt_lines.iter().filter(|l| !l.trim().is_empty());
        while let Some(line) = iter.next() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [number, count, played] = fields[..] else {
                return Err(RecordError::malformed(line, "expected `number count move`"));
            };
            let index = parse_int::<usize>("move number", number)?
                .checked_sub(1)
                .ok_or_else(|| RecordError::malformed(line, "move numbers start at 1"))?;
            let count: usize = parse_int("alternative count", count)?;

            let expected = record.winner_move(index)?;
            if played != expected {
                return Err(RecordError::MoveMismatch {
                    index,
                    expected: expected.to_string(),
                    found: played.to_string(),
                });
            }

            let mut moves = Vec::with_capacity(count);
            for _ in 0..count {
                let alt = iter.next().ok_or_else(|| {
                    RecordError::inconsistent(
                        ALT_MOVES_MARKER,
                        format!("expected {count} alternatives at {}", index + 1),
                    )
                })?;
                let fields: Vec<&str> = alt.split_whitespace().collect();
                let [mv] = fields[..] else {
                    return Err(RecordError::malformed(alt, "expected one move"));
                };
                moves.push(mv.to_string());
            }

            if alternatives.insert(index, moves).is_some() {
                return Err(RecordError::DuplicateIndex(index));
            }
        }

        Self::new(sampled, alternatives)
    }
}
