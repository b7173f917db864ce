//! Game record model and its base line format.

use std::fmt;
use std::str::FromStr;

use shakmaty::uci::UciMove;

use crate::error::RecordError;
use crate::lines::{format_header, format_move_line, parse_header, parse_int, parse_move_line};

pub const MOVES_MARKER: &str = "Moves";

const GAME_ID: &str = "GameId";
const RESULT: &str = "Result";
const PLY_COUNT: &str = "PlyCount";
const WHITE_ELO: &str = "WhiteElo";
const BLACK_ELO: &str = "BlackElo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    WhiteWon,
    BlackWon,
    Draw,
}

impl GameResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameResult::WhiteWon => "1-0",
            GameResult::BlackWon => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }

    pub fn winner(&self) -> Option<Side> {
        match self {
            GameResult::WhiteWon => Some(Side::White),
            GameResult::BlackWon => Some(Side::Black),
            GameResult::Draw => None,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameResult {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1-0" => Ok(GameResult::WhiteWon),
            "0-1" => Ok(GameResult::BlackWon),
            "1/2-1/2" => Ok(GameResult::Draw),
            other => Err(RecordError::InvalidResult(other.to_string())),
        }
    }
}

/// One move pair in coordinate notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMove {
    white: String,
    black: Option<String>,
}

impl GameMove {
    /// Build a move pair, checking that both halves are UCI coordinate moves.
    pub fn new(white: &str, black: Option<&str>) -> Result<Self, RecordError> {
        Ok(Self {
            white: checked_uci(white)?,
            black: black.map(checked_uci).transpose()?,
        })
    }

    pub fn white(&self) -> &str {
        &self.white
    }

    pub fn black(&self) -> Option<&str> {
        self.black.as_deref()
    }

    pub fn half(&self, side: Side) -> Option<&str> {
        match side {
            Side::White => Some(self.white()),
            Side::Black => self.black(),
        }
    }

    fn plies(&self) -> usize {
        1 + usize::from(self.black.is_some())
    }
}

fn checked_uci(text: &str) -> Result<String, RecordError> {
    match text.parse::<UciMove>() {
        Ok(UciMove::Null) | Err(_) => Err(RecordError::InvalidMove(text.to_string())),
        Ok(_) => Ok(text.to_string()),
    }
}

/// One parsed game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: u32,
    pub result: GameResult,
    pub ply_count: u32,
    pub white_elo: u32,
    pub black_elo: u32,
    moves: Vec<GameMove>,
}

impl GameRecord {
    /// Build a record, validating the move list and ply count.
    pub fn new(
        id: u32,
        result: GameResult,
        ply_count: u32,
        white_elo: u32,
        black_elo: u32,
        moves: Vec<GameMove>,
    ) -> Result<Self, RecordError> {
        if let Some(pos) = moves
            .iter()
            .take(moves.len().saturating_sub(1))
            .position(|m| m.black.is_none())
        {
            return Err(RecordError::MissingBlackMove { index: pos + 1 });
        }

        let plies: usize = moves.iter().map(GameMove::plies).sum();
        if plies != ply_count as usize {
            return Err(RecordError::PlyCountMismatch {
                ply_count,
                moves: moves.len(),
            });
        }

        Ok(Self {
            id,
            result,
            ply_count,
            white_elo,
            black_elo,
            moves,
        })
    }

    pub fn moves(&self) -> &[GameMove] {
        &self.moves
    }

    pub fn winner(&self) -> Option<Side> {
        self.result.winner()
    }

    /// All half-moves in play order.
    pub fn half_moves(&self) -> Vec<String> {
        let mut line = Vec::with_capacity(self.ply_count as usize);
        for m in &self.moves {
            line.push(m.white.clone());
            if let Some(black) = &m.black {
                line.push(black.clone());
            }
        }
        line
    }

    /// Number of leading move pairs with a winner half-move. Every pair for a
    /// draw. Only the last pair can lack one.
    pub fn winner_pair_count(&self) -> usize {
        match (self.winner(), self.moves.last()) {
            (Some(side), Some(last)) if last.half(side).is_none() => self.moves.len() - 1,
            _ => self.moves.len(),
        }
    }

    /// The winner's half of move pair `index`.
    pub fn winner_move(&self, index: usize) -> Result<&str, RecordError> {
        let side = self.winner().ok_or(RecordError::NoWinner(self.id))?;
        let m = self.moves.get(index).ok_or(RecordError::IndexOutOfRange {
            index,
            len: self.moves.len(),
        })?;
        m.half(side)
            .ok_or(RecordError::MissingWinnerMove { id: self.id, index })
    }

    /// Half-moves played before the winner's move in pair `index`.
    pub fn line_before_winner_move(&self, index: usize) -> Result<Vec<String>, RecordError> {
        self.winner_move(index)?;
        let ply = match self.winner() {
            Some(Side::Black) => 2 * index + 1,
            _ => 2 * index,
        };
        let mut line = self.half_moves();
        line.truncate(ply);
        Ok(line)
    }

    /// Parse the base record format.
    pub fn from_lines(lines: &[String]) -> Result<Self, RecordError> {
        let lines: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return Err(RecordError::Empty);
        }

        let mut id = None;
        let mut result = None;
        let mut ply_count = None;
        let mut white_elo = None;
        let mut black_elo = None;

        let mut has_marker = false;
        let mut iter = lines.into_iter();
        for line in iter.by_ref() {
            if line.trim() == MOVES_MARKER {
                has_marker = true;
                break;
            }
            let (key, value) = parse_header(line)?;
            let slot_taken = match key {
                GAME_ID => id.replace(parse_int(GAME_ID, value)?).is_some(),
                RESULT => result.replace(value.parse::<GameResult>()?).is_some(),
                PLY_COUNT => ply_count.replace(parse_int(PLY_COUNT, value)?).is_some(),
                WHITE_ELO => white_elo.replace(parse_int(WHITE_ELO, value)?).is_some(),
                BLACK_ELO => black_elo.replace(parse_int(BLACK_ELO, value)?).is_some(),
                other => return Err(RecordError::UnknownHeader(other.to_string())),
            };
            if slot_taken {
                return Err(RecordError::DuplicateHeader(key.to_string()));
            }
        }
        if !has_marker {
            return Err(RecordError::MissingSection(MOVES_MARKER));
        }

        let mut moves = Vec::new();
        for line in iter {
            let (number, white, black) = parse_move_line(line)?;
            let expected = moves.len() + 1;
            if number != expected {
                return Err(RecordError::MoveNumber {
                    expected,
                    found: number,
                });
            }
            moves.push(GameMove::new(white, black)?);
        }

        Self::new(
            id.ok_or(RecordError::MissingHeader(GAME_ID))?,
            result.ok_or(RecordError::MissingHeader(RESULT))?,
            ply_count.ok_or(RecordError::MissingHeader(PLY_COUNT))?,
            white_elo.ok_or(RecordError::MissingHeader(WHITE_ELO))?,
            black_elo.ok_or(RecordError::MissingHeader(BLACK_ELO))?,
            moves,
        )
    }

    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format_header(GAME_ID, self.id),
            format_header(RESULT, self.result),
            format_header(PLY_COUNT, self.ply_count),
            format_header(WHITE_ELO, self.white_elo),
            format_header(BLACK_ELO, self.black_elo),
            MOVES_MARKER.to_string(),
        ];
        lines.extend(
            self.moves
                .iter()
                .enumerate()
                .map(|(i, m)| format_move_line(i + 1, m.white(), m.black())),
        );
        lines
    }
}
