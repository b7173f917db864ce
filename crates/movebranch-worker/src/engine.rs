//! Engine session over the UCI protocol (async I/O)
//!
//! The engine binary must understand two commands beyond plain UCI:
//! `genmoves` (one legal move per line) and `featextract` (one line per
//! catalogue feature). Neither ends with a marker of its own, so both are
//! followed by `isready` and read up to `readyok`.

use std::time::Duration;

use movebranch_core::{FeatureSnapshot, FeatureValue, FEATURE_COUNT, FEATURE_NAMES};
use shakmaty::uci::UciMove;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::error::WorkerError;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A stateful engine session. Each call works on the position last set.
///
/// One session serves one caller at a time; parallel workers each need their
/// own.
#[allow(async_fn_in_trait)]
pub trait EngineSession {
    /// Set the position to the start position advanced by `moves`.
    async fn set_position(&mut self, moves: &[String]) -> Result<(), WorkerError>;

    /// Best move within `movetime_ms`, or `None` if there is no legal move.
    async fn best_move(&mut self, movetime_ms: u32) -> Result<Option<String>, WorkerError>;

    /// Every legal move in the current position.
    async fn legal_moves(&mut self) -> Result<Vec<String>, WorkerError>;

    /// Feature snapshot of the current position.
    async fn features(&mut self) -> Result<FeatureSnapshot, WorkerError>;
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    timeout: Duration,
}

impl StockfishEngine {
    /// Spawn a new engine process and initialize UCI
    pub async fn new(path: &str, timeout: Duration) -> Result<Self, WorkerError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::Engine(format!("Failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| WorkerError::Engine("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| WorkerError::Engine("engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            timeout,
        };

        engine.send("uci").await?;
        engine.wait_for("uci", "uciok").await?;
        engine.send("setoption name Threads value 1").await?;
        engine.sync("isready").await?;

        Ok(engine)
    }

    /// Send a command to the engine
    async fn send(&mut self, cmd: &str) -> Result<(), WorkerError> {
        debug!(cmd, "engine <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| WorkerError::Engine(format!("Failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| WorkerError::Engine(format!("Failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    /// Read one trimmed response line, bounded by the session timeout.
    async fn read_line(&mut self, cmd: &str) -> Result<String, WorkerError> {
        let mut line = String::new();
        let read = tokio::time::timeout(self.timeout, self.stdout.read_line(&mut line))
            .await
            .map_err(|_| WorkerError::EngineTimeout {
                cmd: cmd.to_string(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| WorkerError::Engine(format!("Failed to read from engine: {e}")))?;
        if read == 0 {
            return Err(WorkerError::Engine(format!(
                "engine closed its output while answering {cmd:?}"
            )));
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "engine >");
        Ok(trimmed)
    }

    /// Skip lines until `expected`
    async fn wait_for(&mut self, cmd: &str, expected: &str) -> Result<(), WorkerError> {
        while self.read_line(cmd).await? != expected {}
        Ok(())
    }

    /// Send `isready` and collect everything printed before `readyok`.
    async fn sync(&mut self, cmd: &str) -> Result<Vec<String>, WorkerError> {
        self.send("isready").await?;
        let mut lines = Vec::new();
        loop {
            let line = self.read_line(cmd).await?;
            if line == "readyok" {
                return Ok(lines);
            }
            if !line.is_empty() {
                lines.push(line);
            }
        }
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl EngineSession for StockfishEngine {
    async fn set_position(&mut self, moves: &[String]) -> Result<(), WorkerError> {
        self.send(&position_command(moves)).await
    }

    async fn best_move(&mut self, movetime_ms: u32) -> Result<Option<String>, WorkerError> {
        let cmd = format!("go movetime {movetime_ms}");
        self.send(&cmd).await?;
        loop {
            let line = self.read_line(&cmd).await?;
            if line.starts_with("bestmove") {
                return parse_bestmove(&line).ok_or(WorkerError::MalformedResponse { cmd, line });
            }
        }
    }

    async fn legal_moves(&mut self) -> Result<Vec<String>, WorkerError> {
        self.send("genmoves").await?;
        let lines = self.sync("genmoves").await?;
        parse_move_list(&lines).map_err(|line| WorkerError::MalformedResponse {
            cmd: "genmoves".into(),
            line,
        })
    }

    async fn features(&mut self) -> Result<FeatureSnapshot, WorkerError> {
        self.send("featextract").await?;
        let lines = self.sync("featextract").await?;
        parse_features(&lines).map_err(|line| WorkerError::MalformedResponse {
            cmd: "featextract".into(),
            line,
        })
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

fn position_command(moves: &[String]) -> String {
    if moves.is_empty() {
        format!("position fen {START_FEN}")
    } else {
        format!("position fen {START_FEN} moves {}", moves.join(" "))
    }
}

/// Parse `bestmove <move> [ponder <move>]`. The outer `None` means malformed.
fn parse_bestmove(line: &str) -> Option<Option<String>> {
    let mv = line.split_whitespace().nth(1)?;
    match mv {
        "(none)" | "0000" => Some(None),
        mv => is_uci(mv).then(|| Some(mv.to_string())),
    }
}

fn is_uci(text: &str) -> bool {
    matches!(text.parse::<UciMove>(), Ok(m) if m != UciMove::Null)
}

/// Engine chatter that may precede `readyok` in any response.
fn is_info_string(line: &str) -> bool {
    line.starts_with("info string")
}

/// Parse `genmoves` output. On failure returns the offending line.
fn parse_move_list(lines: &[String]) -> Result<Vec<String>, String> {
    lines
        .iter()
        .filter(|l| !is_info_string(l))
        .map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(mv), None) if is_uci(mv) => Ok(mv.to_string()),
                _ => Err(line.clone()),
            }
        })
        .collect()
}

/// Parse `featextract` output: `name white black` or `name net` per line,
/// in catalogue order. On failure returns the offending line.
fn parse_features(lines: &[String]) -> Result<FeatureSnapshot, String> {
    let lines: Vec<&String> = lines
        .iter()
        .filter(|l| !is_info_string(l))
        .collect();
    if lines.len() != FEATURE_COUNT {
        return Err(format!(
            "{} feature lines, expected {FEATURE_COUNT}",
            lines.len()
        ));
    }

    let mut values = Vec::with_capacity(FEATURE_COUNT);
    for (line, expected) in lines.into_iter().zip(FEATURE_NAMES) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let value = match fields[..] {
            [name, white, black] if name == expected => white
                .parse()
                .ok()
                .zip(black.parse().ok())
                .map(|(w, b)| FeatureValue::new(w, b)),
            [name, net] if name == expected => net.parse().ok().map(|n| FeatureValue::new(n, 0)),
            _ => None,
        };
        values.push(value.ok_or_else(|| line.clone())?);
    }
    FeatureSnapshot::new(values).map_err(|e| e.to_string())
}
