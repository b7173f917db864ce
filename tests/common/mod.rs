#![allow(dead_code)]

use movebranch_core::features::feature_index;
use movebranch_core::{FeatureSnapshot, FeatureValue, GameRecord, FEATURE_COUNT};
use movebranch_worker::{EngineSession, WorkerError};
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, Move, Position, Role};

/// In-process engine built on shakmaty.
///
/// Best move: a mating move if there is one, else the lexicographically
/// first legal move. Features: piece counts under `material/*`, the rest 0.
#[derive(Default)]
pub struct ShakmatyEngine {
    pos: Chess,
    pub commands: usize,
}

impl ShakmatyEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

fn uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}

fn gives_mate(pos: &Chess, mv: &Move) -> bool {
    let mut after = pos.clone();
    after.play_unchecked(*mv);
    after.is_checkmate()
}

impl EngineSession for ShakmatyEngine {
    async fn set_position(&mut self, moves: &[String]) -> Result<(), WorkerError> {
        self.commands += 1;
        let mut pos = Chess::default();
        for text in moves {
            let mv = text
                .parse::<UciMove>()
                .ok()
                .and_then(|u| u.to_move(&pos).ok())
                .ok_or_else(|| WorkerError::Engine(format!("illegal move {text}")))?;
            pos.play_unchecked(mv);
        }
        self.pos = pos;
        Ok(())
    }

    async fn best_move(&mut self, _movetime_ms: u32) -> Result<Option<String>, WorkerError> {
        self.commands += 1;
        let legal = self.pos.legal_moves();
        if let Some(mate) = legal.iter().find(|mv| gives_mate(&self.pos, mv)) {
            return Ok(Some(uci(mate)));
        }
        Ok(legal.iter().map(uci).min())
    }

    async fn legal_moves(&mut self) -> Result<Vec<String>, WorkerError> {
        self.commands += 1;
        Ok(self
            .pos
            .legal_moves()
            .iter()
            .map(uci)
            .collect())
    }

    async fn features(&mut self) -> Result<FeatureSnapshot, WorkerError> {
        self.commands += 1;
        let mut values = vec![FeatureValue::default(); FEATURE_COUNT];
        let board = self.pos.board();
        for (name, role) in [
            ("material/pawn", Role::Pawn),
            ("material/knight", Role::Knight),
            ("material/bishop", Role::Bishop),
            ("material/rook", Role::Rook),
            ("material/queen", Role::Queen),
        ] {
            if let Some(i) = feature_index(name) {
                values[i] = FeatureValue::new(
                    board.by_piece(role.of(Color::White)).count() as i32,
                    board.by_piece(role.of(Color::Black)).count() as i32,
                );
            }
        }
        FeatureSnapshot::new(values).map_err(WorkerError::from)
    }
}

/// Engine double that forgets one legal move, to provoke consistency errors.
pub struct BlindEngine {
    pub inner: ShakmatyEngine,
    pub hidden: String,
}

impl EngineSession for BlindEngine {
    async fn set_position(&mut self, moves: &[String]) -> Result<(), WorkerError> {
        self.inner.set_position(moves).await
    }

    async fn best_move(&mut self, movetime_ms: u32) -> Result<Option<String>, WorkerError> {
        self.inner.best_move(movetime_ms).await
    }

    async fn legal_moves(&mut self) -> Result<Vec<String>, WorkerError> {
        let mut moves = self.inner.legal_moves().await?;
        moves.retain(|mv| *mv != self.hidden);
        Ok(moves)
    }

    async fn features(&mut self) -> Result<FeatureSnapshot, WorkerError> {
        self.inner.features().await
    }
}

pub fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

/// f2f3 e7e6 g2g4 d8h4, Black mates on ply 4.
pub fn fools_mate_lines(id: u32) -> Vec<String> {
    let mut lines = owned(&[
        "GameId       0",
        "Result       0-1",
        "PlyCount       4",
        "WhiteElo       1000",
        "BlackElo       1000",
        "Moves",
        "1      f2f3      e7e6",
        "2      g2g4      d8h4",
    ]);
    lines[0] = format!("GameId        {id}");
    lines
}

pub fn fools_mate(id: u32) -> GameRecord {
    GameRecord::from_lines(&fools_mate_lines(id)).unwrap()
}

/// e2e4 e7e5 d1h5 b8c6 f1c4 g8f6 h5f7, White mates on ply 7.
pub fn scholars_mate_lines(id: u32) -> Vec<String> {
    let mut lines = owned(&[
        "GameId       0",
        "Result       1-0",
        "PlyCount       7",
        "WhiteElo       1200",
        "BlackElo       1150",
        "Moves",
        "1      e2e4      e7e5",
        "2      d1h5      b8c6",
        "3      f1c4      g8f6",
        "4      h5f7",
    ]);
    lines[0] = format!("GameId        {id}");
    lines
}

pub fn scholars_mate(id: u32) -> GameRecord {
    GameRecord::from_lines(&scholars_mate_lines(id)).unwrap()
}
