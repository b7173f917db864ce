//! Flattened feature-difference rows for the pairwise classifier.

use std::fmt;

use crate::features::{FeatureSnapshot, FEATURE_NAMES};

/// Column groups of a comparison row, in output order.
pub const COMPARISON_PREFIXES: [&str; 4] = ["LeftWhite", "LeftBlack", "RightWhite", "RightBlack"];

pub const LABEL_COLUMN: &str = "Winner";

/// Which side of a row holds the line the winner actually played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairLabel {
    Left,
    Right,
}

impl PairLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PairLabel::Left => "Left",
            PairLabel::Right => "Right",
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            PairLabel::Left => PairLabel::Right,
            PairLabel::Right => PairLabel::Left,
        }
    }
}

impl fmt::Display for PairLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `<prefix>---<feature>` for every prefix and feature, then `Winner`.
pub fn comparison_header() -> Vec<String> {
    COMPARISON_PREFIXES
        .iter()
        .flat_map(|prefix| FEATURE_NAMES.iter().map(move |name| format!("{prefix}---{name}")))
        .chain(std::iter::once(LABEL_COLUMN.to_string()))
        .collect()
}

/// Values are `i64` so differences and negations of any two engine `i32`
/// values stay exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub values: Vec<i64>,
    pub label: PairLabel,
}

impl ComparisonRow {
    /// Same row seen from the other side: every value negated, label flipped.
    pub fn negated(&self) -> Self {
        Self {
            values: self.values.iter().map(|v| -v).collect(),
            label: self.label.flipped(),
        }
    }

    /// Values followed by the label, ready for a CSV record.
    pub fn to_fields(&self) -> Vec<String> {
        self.values
            .iter()
            .map(i64::to_string)
            .chain(std::iter::once(self.label.to_string()))
            .collect()
    }
}

/// Rows comparing the played line (left) against one alternative (right).
///
/// The second row is the first with sides swapped, which for difference
/// columns is exactly the negation.
pub fn comparison_pair(played: &FeatureSnapshot, alternative: &FeatureSnapshot) -> [ComparisonRow; 2] {
    let diffs: Vec<(i64, i64)> = played
        .values()
        .iter()
        .zip(alternative.values())
        .map(|(p, a)| {
            (
                i64::from(p.white) - i64::from(a.white),
                i64::from(p.black) - i64::from(a.black),
            )
        })
        .collect();

    let mut values = Vec::with_capacity(diffs.len() * COMPARISON_PREFIXES.len());
    values.extend(diffs.iter().map(|d| d.0));
    values.extend(diffs.iter().map(|d| d.1));
    values.extend(diffs.iter().map(|d| -d.0));
    values.extend(diffs.iter().map(|d| -d.1));

    let row = ComparisonRow {
        values,
        label: PairLabel::Left,
    };
    let mirrored = row.negated();
    [row, mirrored]
}
