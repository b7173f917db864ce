//! Training game: sampled winner plies and the branches rooted at them.

use std::collections::BTreeSet;

use crate::comparison::{comparison_pair, ComparisonRow};
use crate::error::RecordError;
use crate::features::FeatureSnapshot;
use crate::lines::{
    format_header, join_moves, parse_continuation_length, parse_int, split_section,
    CONTINUATION_LENGTH_KEY,
};
use crate::record::{GameRecord, Side};
use crate::sampler::{sample_count, sample_indices, CountStrategy, SampleDistribution};

pub const SAMPLED_WINNER_MOVES_MARKER: &str = "SampledWinnerMoves";
pub const SAMPLED_MOVE_BRANCHES_MARKER: &str = "SampledMoveBranches";

const BRANCH_KEY: &str = "Branch";
const TRUE_KEY: &str = "True";
const ALT_KEY: &str = "Alt";
const FEATURES_KEY: &str = "Features";

//
// -> -> -> ->        true continuation
//       -> ->        alternative continuations
//       -> ->
//
#[derive(Debug, Clone, PartialEq)]
pub struct MoveBranch {
    init_move_line: Vec<String>,
    true_continuation: Vec<String>,
    true_continuation_features: FeatureSnapshot,
    alt_continuations: Vec<Vec<String>>,
    alt_continuations_features: Vec<FeatureSnapshot>,
}

impl MoveBranch {
    /// Assemble a branch. Every continuation starts with its first move.
    pub fn new(
        init_move_line: Vec<String>,
        true_continuation: Vec<String>,
        true_continuation_features: FeatureSnapshot,
        alt_continuations: Vec<Vec<String>>,
        alt_continuations_features: Vec<FeatureSnapshot>,
    ) -> Result<Self, RecordError> {
        let played = true_continuation
            .first()
            .ok_or_else(|| RecordError::inconsistent(BRANCH_KEY, "empty true continuation"))?;
        if alt_continuations.len() != alt_continuations_features.len() {
            return Err(RecordError::inconsistent(
                BRANCH_KEY,
                format!(
                    "{} alternative lines but {} feature snapshots",
                    alt_continuations.len(),
                    alt_continuations_features.len()
                ),
            ));
        }

        let mut firsts = BTreeSet::new();
        for line in &alt_continuations {
            let first = line
                .first()
                .ok_or_else(|| RecordError::inconsistent(BRANCH_KEY, "empty alternative line"))?;
            if first == played || !firsts.insert(first.as_str()) {
                return Err(RecordError::inconsistent(
                    BRANCH_KEY,
                    format!("alternative {first} duplicates another first move"),
                ));
            }
        }

        Ok(Self {
            init_move_line,
            true_continuation,
            true_continuation_features,
            alt_continuations,
            alt_continuations_features,
        })
    }

    /// Half-move index of the branching ply.
    pub fn ply(&self) -> usize {
        self.init_move_line.len()
    }

    pub fn init_move_line(&self) -> &[String] {
        &self.init_move_line
    }

    pub fn played_move(&self) -> &str {
        &self.true_continuation[0]
    }

    pub fn true_continuation(&self) -> &[String] {
        &self.true_continuation
    }

    pub fn true_continuation_features(&self) -> &FeatureSnapshot {
        &self.true_continuation_features
    }

    pub fn alt_continuations(&self) -> &[Vec<String>] {
        &self.alt_continuations
    }

    pub fn alt_continuations_features(&self) -> &[FeatureSnapshot] {
        &self.alt_continuations_features
    }

    /// Two mirrored rows per alternative.
    pub fn comparison_rows(&self) -> Vec<ComparisonRow> {
        self.alt_continuations_features
            .iter()
            .flat_map(|alt| comparison_pair(&self.true_continuation_features, alt))
            .collect()
    }

    fn longest_line(&self) -> usize {
        self.alt_continuations
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.true_continuation.len()))
            .max()
            .unwrap_or(0)
    }

    fn push_lines(&self, lines: &mut Vec<String>) {
        lines.push(format!(
            "{BRANCH_KEY:<8}{:>6}{:>6}",
            self.ply() + 1,
            self.alt_continuations.len()
        ));
        lines.push(format!("{TRUE_KEY:<8}{}", join_moves(&self.true_continuation)));
        lines.push(format!(
            "{FEATURES_KEY:<10}{}",
            self.true_continuation_features.to_tokens()
        ));
        for (line, features) in self
            .alt_continuations
            .iter()
            .zip(&self.alt_continuations_features)
        {
            lines.push(format!("{ALT_KEY:<8}{}", join_moves(line)));
            lines.push(format!("{FEATURES_KEY:<10}{}", features.to_tokens()));
        }
    }
}

/// Half-move indices of the winner's moves.
pub fn winner_plies(record: &GameRecord) -> Result<Vec<usize>, RecordError> {
    let start = match record.winner() {
        Some(Side::White) => 0,
        Some(Side::Black) => 1,
        None => return Err(RecordError::NoWinner(record.id)),
    };
    Ok((start..record.ply_count as usize).step_by(2).collect())
}

/// Sample among the winner's plies.
pub fn sample_winner_plies(
    record: &GameRecord,
    distribution: SampleDistribution,
    strategy: CountStrategy,
    seed: u64,
) -> Result<Vec<usize>, RecordError> {
    let plies = winner_plies(record)?;
    let count = sample_count(strategy, plies.len());
    Ok(sample_indices(distribution, plies.len(), count, seed)
        .into_iter()
        .map(|i| plies[i])
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainGame {
    record: GameRecord,
    move_line: Vec<String>,
    continuation_length: usize,
    sampled_plies: Vec<usize>,
    branches: Vec<MoveBranch>,
}

impl TrainGame {
    /// Check the branches against the record and wrap them.
    ///
    /// `sampled_plies` must be ascending winner plies, one branch each, and
    /// no continuation may exceed its first move plus `continuation_length`.
    pub fn new(
        record: GameRecord,
        continuation_length: usize,
        sampled_plies: Vec<usize>,
        branches: Vec<MoveBranch>,
    ) -> Result<Self, RecordError> {
        let move_line = record.half_moves();
        let winner: BTreeSet<usize> = winner_plies(&record)?.into_iter().collect();

        if !sampled_plies.windows(2).all(|w| w[0] < w[1]) {
            return Err(RecordError::inconsistent(
                SAMPLED_WINNER_MOVES_MARKER,
                format!("plies not strictly ascending: {sampled_plies:?}"),
            ));
        }
        if let Some(&ply) = sampled_plies.iter().find(|&&p| !winner.contains(&p)) {
            return Err(RecordError::inconsistent(
                SAMPLED_WINNER_MOVES_MARKER,
                format!("ply {} is not a winner move", ply + 1),
            ));
        }
        if branches.len() != sampled_plies.len() {
            return Err(RecordError::inconsistent(
                SAMPLED_MOVE_BRANCHES_MARKER,
                format!("{} branches for {} plies", branches.len(), sampled_plies.len()),
            ));
        }

        for (&ply, branch) in sampled_plies.iter().zip(&branches) {
            if branch.ply() != ply || branch.init_move_line() != &move_line[..ply] {
                return Err(RecordError::inconsistent(
                    SAMPLED_MOVE_BRANCHES_MARKER,
                    format!("branch does not start at ply {}", ply + 1),
                ));
            }
            if branch.played_move() != move_line[ply] {
                return Err(RecordError::MoveMismatch {
                    index: ply,
                    expected: move_line[ply].clone(),
                    found: branch.played_move().to_string(),
                });
            }
            if branch.longest_line() > continuation_length + 1 {
                return Err(RecordError::inconsistent(
                    SAMPLED_MOVE_BRANCHES_MARKER,
                    format!("continuation at ply {} exceeds length", ply + 1),
                ));
            }
        }

        Ok(Self {
            record,
            move_line,
            continuation_length,
            sampled_plies,
            branches,
        })
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn move_line(&self) -> &[String] {
        &self.move_line
    }

    pub fn continuation_length(&self) -> usize {
        self.continuation_length
    }

    pub fn sampled_plies(&self) -> &[usize] {
        &self.sampled_plies
    }

    pub fn branches(&self) -> &[MoveBranch] {
        &self.branches
    }

    pub fn comparison_rows(&self) -> Vec<ComparisonRow> {
        self.branches
            .iter()
            .flat_map(MoveBranch::comparison_rows)
            .collect()
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = self.record.to_lines();
        lines.push(SAMPLED_WINNER_MOVES_MARKER.to_string());
        lines.extend(
            self.sampled_plies
                .iter()
                .map(|&ply| format!("{:>4}{:>10}", ply + 1, self.move_line[ply])),
        );
        lines.push(SAMPLED_MOVE_BRANCHES_MARKER.to_string());
        lines.push(format_header(CONTINUATION_LENGTH_KEY, self.continuation_length));
        for branch in &self.branches {
            branch.push_lines(&mut lines);
        }
        lines
    }

    pub fn from_lines(lines: &[String]) -> Result<Self, RecordError> {
        let (record_lines, rest) = split_section(lines, SAMPLED_WINNER_MOVES_MARKER)?;
        let record = GameRecord::from_lines(record_lines)?;
        let move_line = record.half_moves();

        let (ply_lines, branch_lines) = split_section(rest, SAMPLED_MOVE_BRANCHES_MARKER)?;
        let mut sampled_plies = Vec::new();
        for line in ply_lines.iter().filter(|l| !l.trim().is_empty()) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [number, mv] = fields[..] else {
                return Err(RecordError::malformed(line, "expected `ply move`"));
            };
            let ply = parse_int::<usize>("ply", number)?
                .checked_sub(1)
                .ok_or_else(|| RecordError::malformed(line, "plies start at 1"))?;
            let expected = move_line.get(ply).ok_or(RecordError::IndexOutOfRange {
                index: ply,
                len: move_line.len(),
            })?;
            if expected != mv {
                return Err(RecordError::MoveMismatch {
                    index: ply,
                    expected: expected.clone(),
                    found: mv.to_string(),
                });
            }
            sampled_plies.push(ply);
        }

        let (continuation_length, branch_lines) =
            parse_continuation_length(branch_lines, SAMPLED_MOVE_BRANCHES_MARKER)?;
        let mut iter = branch_lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.trim().is_empty());
        let mut branches = Vec::new();
        while let Some(line) = iter.next() {
            let fields = keyed_fields(line, BRANCH_KEY)?;
            let [ply, count] = fields[..] else {
                return Err(RecordError::malformed(line, "expected `Branch ply count`"));
            };
            let ply = parse_int::<usize>("ply", ply)?
                .checked_sub(1)
                .ok_or_else(|| RecordError::malformed(line, "plies start at 1"))?;
            let count: usize = parse_int("alternative count", count)?;
            let init_move_line = move_line
                .get(..ply)
                .ok_or(RecordError::IndexOutOfRange {
                    index: ply,
                    len: move_line.len(),
                })?
                .to_vec();

            let (true_continuation, true_features) = next_line_with_features(&mut iter, TRUE_KEY)?;
            let mut alt_continuations = Vec::with_capacity(count);
            let mut alt_features = Vec::with_capacity(count);
            for _ in 0..count {
                let (line, features) = next_line_with_features(&mut iter, ALT_KEY)?;
                alt_continuations.push(line);
                alt_features.push(features);
            }

            branches.push(MoveBranch::new(
                init_move_line,
                true_continuation,
                true_features,
                alt_continuations,
                alt_features,
            )?);
        }

        Self::new(record, continuation_length, sampled_plies, branches)
    }
}

/// Fields after `key` on a line that must start with `key`.
fn keyed_fields<'a>(line: &'a str, key: &'static str) -> Result<Vec<&'a str>, RecordError> {
    let mut fields = line.split_whitespace();
    if fields.next() != Some(key) {
        return Err(RecordError::inconsistent(
            SAMPLED_MOVE_BRANCHES_MARKER,
            format!("expected {key} line, found {line:?}"),
        ));
    }
    Ok(fields.collect())
}

fn next_line_with_features<'a>(
    iter: &mut impl Iterator<Item = &'a str>,
    key: &'static str,
) -> Result<(Vec<String>, FeatureSnapshot), RecordError> {
    let missing = || {
        RecordError::inconsistent(
            SAMPLED_MOVE_BRANCHES_MARKER,
            format!("branch ended before {key} line"),
        )
    };
    let moves_line = iter.next().ok_or_else(missing)?;
    let moves = keyed_fields(moves_line, key)?
        .into_iter()
        .map(str::to_string)
        .collect();
    let features_line = iter.next().ok_or_else(missing)?;
    let features = FeatureSnapshot::from_tokens(keyed_fields(features_line, FEATURES_KEY)?)?;
    Ok((moves, features))
}
