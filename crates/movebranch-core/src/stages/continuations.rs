//! Engine follow-up lines after each sampled move and each alternative.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::RecordError;
use crate::lines::{
    format_header, join_moves, parse_continuation_length, parse_int, split_arrow, split_section,
    CONTINUATION_ARROW, CONTINUATION_LENGTH_KEY,
};
use crate::record::GameRecord;
use crate::stages::alternatives::AlternativesStage;
use crate::stages::winner_columns;

pub const CONTINUATIONS_MARKER: &str = "Continuations";

#[derive(Debug, Clone, PartialEq)]
pub struct ContinuationsStage {
    alternatives: AlternativesStage,
    length: usize,
    played: BTreeMap<usize, Vec<String>>,
    alternative_lines: BTreeMap<usize, Vec<Vec<String>>>,
}

impl ContinuationsStage {
    /// Attach follow-up lines of at most `length` plies.
    ///
    /// `played` maps each sampled index to the line after the winner's move;
    /// `alternative_lines` maps it to one line per alternative, in the
    /// alternatives' order.
    pub fn new(
        alternatives: AlternativesStage,
        length: usize,
        played: BTreeMap<usize, Vec<String>>,
        alternative_lines: BTreeMap<usize, Vec<Vec<String>>>,
    ) -> Result<Self, RecordError> {
        let sampled: BTreeSet<usize> = alternatives.sampled().indices().iter().copied().collect();
        let played_keys: BTreeSet<usize> = played.keys().copied().collect();
        let alt_keys: BTreeSet<usize> = alternative_lines.keys().copied().collect();
        if played_keys != sampled || alt_keys != sampled {
            return Err(RecordError::inconsistent(
                CONTINUATIONS_MARKER,
                format!("sampled {sampled:?}, played {played_keys:?}, alternatives {alt_keys:?}"),
            ));
        }

        for (&index, lines) in &alternative_lines {
            let expected = alternatives.alternatives_at(index).map_or(0, <[String]>::len);
            if lines.len() != expected {
                return Err(RecordError::inconsistent(
                    CONTINUATIONS_MARKER,
                    format!(
                        "{} lines for {expected} alternatives at {}",
                        lines.len(),
                        index + 1
                    ),
                ));
            }
        }

        let too_long = played
            .values()
            .chain(alternative_lines.values().flatten())
            .find(|line| line.len() > length);
        if let Some(line) = too_long {
            return Err(RecordError::inconsistent(
                CONTINUATIONS_MARKER,
                format!("line of {} plies exceeds length {length}", line.len()),
            ));
        }

        Ok(Self {
            alternatives,
            length,
            played,
            alternative_lines,
        })
    }

    pub fn alternatives(&self) -> &AlternativesStage {
        &self.alternatives
    }

    pub fn record(&self) -> &GameRecord {
        self.alternatives.record()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Follow-up line after the winner's move at `index`.
    pub fn played_line(&self, index: usize) -> Option<&[String]> {
        self.played.get(&index).map(Vec::as_slice)
    }

    /// Follow-up lines after each alternative at `index`.
    pub fn alternative_lines(&self, index: usize) -> Option<&[Vec<String>]> {
        self.alternative_lines.get(&index).map(Vec::as_slice)
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = self.alternatives.to_lines();
        lines.push(CONTINUATIONS_MARKER.to_string());
        lines.push(format_header(CONTINUATION_LENGTH_KEY, self.length));

        let record = self.record();
        let (played_width, alt_width) = winner_columns(record).unwrap_or((12, 15));
        for &index in self.alternatives.sampled().indices() {
            let alts = self.alternatives.alternatives_at(index).unwrap_or_default();
            let played = record.winner_move(index).unwrap_or_default();
            lines.push(format!(
                "{:>3}{:>4}{played:>played_width$} {CONTINUATION_ARROW}{}",
                index + 1,
                alts.len(),
                join_moves(&self.played[&index])
            ));
            for (mv, line) in alts.iter().zip(&self.alternative_lines[&index]) {
                lines.push(format!(
                    "{mv:>alt_width$} {CONTINUATION_ARROW}{}",
                    join_moves(line)
                ));
            }
        }
        lines
    }

    pub fn from_lines(lines: &[String]) -> Result<Self, RecordError> {
        let (alt_stage_lines, cont_lines) = split_section(lines, CONTINUATIONS_MARKER)?;
        let alternatives = AlternativesStage::from_lines(alt_stage_lines)?;
        let (length, cont_lines) = parse_continuation_length(cont_lines, CONTINUATIONS_MARKER)?;

        let mut played = BTreeMap::new();
        let mut alternative_lines = BTreeMap::new();
        let mut iter = cont_lines.iter().filter(|l| !l.trim().is_empty());
        while let Some(line) = iter.next() {
            let (left, follow_up) = split_arrow(line)?;
            let [number, count, mv] = left[..] else {
                return Err(RecordError::malformed(line, "expected `number count move ->`"));
            };
            let index = parse_int::<usize>("move number", number)?
                .checked_sub(1)
                .ok_or_else(|| RecordError::malformed(line, "move numbers start at 1"))?;
            let count: usize = parse_int("alternative count", count)?;

            let expected = alternatives.record().winner_move(index)?;
            if mv != expected {
                return Err(RecordError::MoveMismatch {
                    index,
                    expected: expected.to_string(),
                    found: mv.to_string(),
                });
            }

            let alts = alternatives.alternatives_at(index).unwrap_or_default();
            if alts.len() != count {
                return Err(RecordError::inconsistent(
                    CONTINUATIONS_MARKER,
                    format!("{count} alternatives at {}, expected {}", index + 1, alts.len()),
                ));
            }

            let mut alt_lines = Vec::with_capacity(count);
            for alt in alts {
                let line = iter.next().ok_or_else(|| {
                    RecordError::inconsistent(
                        CONTINUATIONS_MARKER,
                        format!("missing line for alternative {alt} at {}", index + 1),
                    )
                })?;
                let (left, follow_up) = split_arrow(line)?;
                if left[..] != [alt.as_str()] {
                    return Err(RecordError::malformed(line, "alternative out of order"));
                }
                alt_lines.push(follow_up);
            }

            if played.insert(index, follow_up).is_some() {
                return Err(RecordError::DuplicateIndex(index));
            }
            alternative_lines.insert(index, alt_lines);
        }

        Self::new(alternatives, length, played, alternative_lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::SampledMovesStage;

    fn moves(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn alternatives() -> AlternativesStage {
        let lines = moves(&[
            "GameId       4",
            "Result       1-0",
            "PlyCount       7",
            "WhiteElo       1500",
            "BlackElo       1480",
            "Moves",
            "1      e2e4      e7e5",
            "2      d1h5      b8c6",
            "3      f1c4      g8f6",
            "4      h5f7",
        ]);
        let record = GameRecord::from_lines(&lines).unwrap();
        let sampled = SampledMovesStage::new(record, vec![1, 3]).unwrap();
        let mut map = BTreeMap::new();
        map.insert(1, moves(&["g1f3", "d2d4"]));
        map.insert(3, moves(&["h5e5"]));
        AlternativesStage::new(sampled, map).unwrap()
    }

    fn stage() -> ContinuationsStage {
        let mut played = BTreeMap::new();
        played.insert(1, moves(&["b8c6", "f1c4"]));
        played.insert(3, vec![]);
        let mut alt_lines = BTreeMap::new();
        alt_lines.insert(1, vec![moves(&["b8c6", "f1b5"]), moves(&["e5d4"])]);
        alt_lines.insert(3, vec![moves(&["f8e7", "h5e5"])]);
        ContinuationsStage::new(alternatives(), 2, played, alt_lines).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let stage = stage();
        let lines = stage.to_lines();
        assert!(lines.starts_with(&stage.alternatives().to_lines()));
        assert_eq!(ContinuationsStage::from_lines(&lines).unwrap(), stage);
    }

    #[test]
    fn test_empty_follow_up_survives() {
        let stage = stage();
        let reparsed = ContinuationsStage::from_lines(&stage.to_lines()).unwrap();
        assert_eq!(reparsed.played_line(3), Some(&[][..]));
        assert_eq!(reparsed.alternative_lines(1).unwrap().len(), 2);
    }

    #[test]
    fn test_line_longer_than_length() {
        let mut played = BTreeMap::new();
        played.insert(1, moves(&["b8c6", "f1c4", "g8f6"]));
        played.insert(3, vec![]);
        let mut alt_lines = BTreeMap::new();
        alt_lines.insert(1, vec![vec![], vec![]]);
        alt_lines.insert(3, vec![vec![]]);
        assert!(ContinuationsStage::new(alternatives(), 2, played, alt_lines).is_err());
    }

    #[test]
    fn test_alternative_count_checked() {
        let mut played = BTreeMap::new();
        played.insert(1, vec![]);
        played.insert(3, vec![]);
        let mut alt_lines = BTreeMap::new();
        alt_lines.insert(1, vec![vec![]]);
        alt_lines.insert(3, vec![vec![]]);
        assert!(ContinuationsStage::new(alternatives(), 2, played, alt_lines).is_err());
    }

    #[test]
    fn test_missing_length_line() {
        let mut lines = stage().to_lines();
        let marker = lines.iter().position(|l| l == CONTINUATIONS_MARKER).unwrap();
        lines.remove(marker + 1);
        assert!(ContinuationsStage::from_lines(&lines).is_err());
    }
}
