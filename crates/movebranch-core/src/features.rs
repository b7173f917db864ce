//! Positional feature catalogue and snapshots.

use crate::error::RecordError;
use crate::lines::parse_int;

/// Feature names in the order the engine reports them.
pub const FEATURE_NAMES: [&str; 81] = [
    "bishop/minor-behind-pawn",
    "bishop/pawn-supported-occupied-outpost",
    "bishop/pawn-supported-reachable-outpost",
    "bishop/pawn-unsupported-occupied-outpost",
    "bishop/pawn-unsupported-reachable-outpost",
    "bishop/pawns-on-same-color-squares",
    "king/castle-king-side",
    "king/castle-queen-side",
    "king/close-enemies-one",
    "king/close-enemies-two",
    "king/enemy-other-bishop-check",
    "king/enemy-other-knight-check",
    "king/enemy-other-rook-check",
    "king/enemy-safe-bishop-check",
    "king/enemy-safe-knight-check",
    "king/enemy-safe-queen-check",
    "king/enemy-safe-rook-check",
    "king/king-adj-zone-attacks-count",
    "king/king-attackers-count",
    "king/king-only-defended",
    "king/min-king-pawn-distance",
    "king/not-defended-larger-king-ring",
    "king/pawnless-flank",
    "king/shelter-rank-us",
    "king/shelter-storm-edge-distance",
    "king/storm-rank-them",
    "king/storm-type-blocked-by-king",
    "king/storm-type-blocked-by-pawn",
    "king/storm-type-unblocked",
    "king/storm-type-unopposed",
    "knight/minor-behind-pawn",
    "knight/pawn-supported-occupied-outpost",
    "knight/pawn-supported-reachable-outpost",
    "knight/pawn-unsupported-occupied-outpost",
    "knight/pawn-unsupported-reachable-outpost",
    "material/bishop",
    "material/knight",
    "material/pawn",
    "material/queen",
    "material/rook",
    "mobility/all",
    "mobility/bishop",
    "mobility/knight",
    "mobility/queen",
    "mobility/rook",
    "passed-pawns/average-candidate-passers",
    "passed-pawns/blocksq-our-king-distance",
    "passed-pawns/blocksq-their-king-distance",
    "passed-pawns/defended-block-square",
    "passed-pawns/empty-blocksq",
    "passed-pawns/friendly-occupied-blocksq",
    "passed-pawns/fully-defended-path",
    "passed-pawns/hindered-passed-pawn",
    "passed-pawns/no-unsafe-blocksq",
    "passed-pawns/no-unsafe-squares",
    "passed-pawns/two-blocksq-our-king-distance",
    "queen/weak",
    "rook/castle",
    "rook/rook-on-open-file",
    "rook/rook-on-pawn",
    "rook/rook-on-semi-open-file",
    "rook/trapped",
    "space/extra-safe-squares",
    "space/safe-squares",
    "threats/hanging",
    "threats/hanging-pawn",
    "threats/king-threat-by-minor",
    "threats/king-threat-by-rook",
    "threats/minor-threat-by-minor",
    "threats/minor-threat-by-rook",
    "threats/pawn-push",
    "threats/pawn-threat-by-minor",
    "threats/pawn-threat-by-rook",
    "threats/queen-threat-by-minor",
    "threats/queen-threat-by-rook",
    "threats/rook-threat-by-minor",
    "threats/rook-threat-by-rook",
    "threats/safe-pawn",
    "threats/threat-by-king",
    "threats/threat-by-minor-rank",
    "threats/threat-by-rook-rank",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Index of a feature in [`FEATURE_NAMES`].
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// Value of one feature for both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureValue {
    pub white: i32,
    pub black: i32,
}

impl FeatureValue {
    pub fn new(white: i32, black: i32) -> Self {
        Self { white, black }
    }

    /// White count minus black count.
    pub fn net(&self) -> i32 {
        self.white - self.black
    }
}

/// One value pair per catalogue feature, taken at a single position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSnapshot {
    values: Vec<FeatureValue>,
}

impl FeatureSnapshot {
    /// Wrap values given in catalogue order. The length must match the catalogue.
    pub fn new(values: Vec<FeatureValue>) -> Result<Self, RecordError> {
        if values.len() != FEATURE_COUNT {
            return Err(RecordError::inconsistent(
                "Features",
                format!("expected {FEATURE_COUNT} values, got {}", values.len()),
            ));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<FeatureValue> {
        feature_index(name).map(|i| self.values[i])
    }

    /// `w/b` tokens separated by spaces.
    pub fn to_tokens(&self) -> String {
        self.values
            .iter()
            .map(|v| format!("{}/{}", v.white, v.black))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Result<Self, RecordError> {
        let values = tokens
            .into_iter()
            .map(|token| {
                let (white, black) = token
                    .split_once('/')
                    .ok_or_else(|| RecordError::malformed(token, "expected `white/black`"))?;
                Ok(FeatureValue::new(
                    parse_int("feature value", white)?,
                    parse_int("feature value", black)?,
                ))
            })
            .collect::<Result<Vec<_>, RecordError>>()?;
        Self::new(values)
    }
}
