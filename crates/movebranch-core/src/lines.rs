//! Shared helpers for the column-aligned line format.
//!
//! Column widths are cosmetic. Parsing only relies on whitespace separated
//! fields and on section marker lines matching exactly.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::RecordError;

/// Ends one record in a stream of records.
pub const RECORD_TERMINATOR: &str = "----------------------------------------";

/// Header line carrying the continuation length of a section.
pub const CONTINUATION_LENGTH_KEY: &str = "ContinuationLength";

/// Separates a first move from its follow-up plies.
pub const CONTINUATION_ARROW: &str = "->";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)\s+(\S+)\s*$").expect("valid header regex"));

static MOVE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+)\s+(\S+)(?:\s+(\S+))?\s*$").expect("valid move line regex")
});

/// Split `lines` at the first line equal to `marker`.
///
/// Returns the lines before the marker and the lines after it.
pub fn split_section<'a>(
    lines: &'a [String],
    marker: &'static str,
) -> Result<(&'a [String], &'a [String]), RecordError> {
    let pos = lines
        .iter()
        .position(|l| l == marker)
        .ok_or(RecordError::MissingSection(marker))?;
    Ok((&lines[..pos], &lines[pos + 1..]))
}

/// `Key   value`
pub fn format_header(key: &str, value: impl std::fmt::Display) -> String {
    format!("{key:<14}{value}")
}

/// Parse a `Key   value` line.
pub fn parse_header(line: &str) -> Result<(&str, &str), RecordError> {
    let caps = HEADER_RE
        .captures(line)
        .ok_or_else(|| RecordError::malformed(line, "expected `key value`"))?;
    let key = caps.get(1).map_or("", |m| m.as_str());
    let value = caps.get(2).map_or("", |m| m.as_str());
    Ok((key, value))
}

/// `  7      e2e4      e7e5`, 1-based move number.
pub fn format_move_line(number: usize, white: &str, black: Option<&str>) -> String {
    match black {
        Some(black) => format!("{number:>3}{white:>10}{black:>10}"),
        None => format!("{number:>3}{white:>10}"),
    }
}

/// Parse a move line into its number and half-moves.
pub fn parse_move_line(line: &str) -> Result<(usize, &str, Option<&str>), RecordError> {
    let caps = MOVE_LINE_RE
        .captures(line)
        .ok_or_else(|| RecordError::malformed(line, "expected `number white [black]`"))?;
    let number = parse_int("move number", caps.get(1).map_or("", |m| m.as_str()))?;
    let white = caps.get(2).map_or("", |m| m.as_str());
    let black = caps.get(3).map(|m| m.as_str());
    Ok((number, white, black))
}

pub fn parse_int<T: FromStr>(field: &'static str, value: &str) -> Result<T, RecordError> {
    value.parse().map_err(|_| RecordError::InvalidInteger {
        field,
        value: value.to_string(),
    })
}

/// Read the `ContinuationLength n` line that opens a continuation section.
pub fn parse_continuation_length<'a>(
    lines: &'a [String],
    section: &'static str,
) -> Result<(usize, &'a [String]), RecordError> {
    let (first, rest) = lines
        .split_first()
        .ok_or_else(|| RecordError::inconsistent(section, "missing continuation length"))?;
    let (key, value) = parse_header(first)?;
    if key != CONTINUATION_LENGTH_KEY {
        return Err(RecordError::inconsistent(
            section,
            format!("expected {CONTINUATION_LENGTH_KEY}, found {key}"),
        ));
    }
    Ok((parse_int("continuation length", value)?, rest))
}

/// Format moves as right-aligned 6-wide columns.
pub fn join_moves(moves: &[String]) -> String {
    moves.iter().map(|m| format!("{m:>6}")).collect()
}

/// Split a `first -> c1 c2 ...` line.
pub fn split_arrow(line: &str) -> Result<(Vec<&str>, Vec<String>), RecordError> {
    let (left, right) = line
        .split_once(CONTINUATION_ARROW)
        .ok_or_else(|| RecordError::malformed(line, "missing `->`"))?;
    let left = left.split_whitespace().collect();
    let right = right.split_whitespace().map(str::to_string).collect();
    Ok((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_section_first_marker() {
        let lines = owned(&["a", "X", "b", "X", "c"]);
        let (before, after) = split_section(&lines, "X").unwrap();
        assert_eq!(before, &owned(&["a"])[..]);
        assert_eq!(after, &owned(&["b", "X", "c"])[..]);
    }

    #[test]
    fn test_split_section_missing() {
        let lines = owned(&["a", "b"]);
        assert_eq!(
            split_section(&lines, "X"),
            Err(RecordError::MissingSection("X"))
        );
    }

    #[test]
    fn test_move_line() {
        let line = format_move_line(12, "e2e4", Some("e7e5"));
        assert_eq!(line, " 12      e2e4      e7e5");
        assert_eq!(parse_move_line(&line).unwrap(), (12, "e2e4", Some("e7e5")));

        let last = format_move_line(3, "d1h5", None);
        assert_eq!(parse_move_line(&last).unwrap(), (3, "d1h5", None));
    }

    #[test]
    fn test_move_line_rejects_extra_fields() {
        assert!(parse_move_line("1 e2e4 e7e5 g1f3").is_err());
        assert!(parse_move_line("x e2e4 e7e5").is_err());
    }

    #[test]
    fn test_header() {
        let line = format_header("WhiteElo", 1834);
        assert_eq!(parse_header(&line).unwrap(), ("WhiteElo", "1834"));
        assert!(parse_header("WhiteElo").is_err());
    }

    #[test]
    fn test_split_arrow_empty_tail() {
        let (left, right) = split_arrow("  2  29      d8h4 ->").unwrap();
        assert_eq!(left, vec!["2", "29", "d8h4"]);
        assert!(right.is_empty());
    }
}
