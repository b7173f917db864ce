//! Branch assembly: engine continuations and alternatives around one ply.

use movebranch_core::{FeatureSnapshot, GameRecord, MoveBranch, RecordError};
use tracing::debug;

use crate::engine::EngineSession;
use crate::error::WorkerError;

/// Follow-up plies after `prefix`, asking the engine for its best move until
/// `length` plies are collected or the position has no legal move.
pub async fn follow_up<E: EngineSession>(
    engine: &mut E,
    prefix: &[String],
    length: usize,
    movetime_ms: u32,
) -> Result<Vec<String>, WorkerError> {
    let mut line = prefix.to_vec();
    for _ in 0..length {
        engine.set_position(&line).await?;
        match engine.best_move(movetime_ms).await? {
            Some(mv) => line.push(mv),
            None => break,
        }
    }
    Ok(line.split_off(prefix.len()))
}

/// `first` followed by its engine follow-up, plus the features at its end.
async fn continuation<E: EngineSession>(
    engine: &mut E,
    before: &[String],
    first: &str,
    length: usize,
    movetime_ms: u32,
) -> Result<(Vec<String>, FeatureSnapshot), WorkerError> {
    let mut prefix = before.to_vec();
    prefix.push(first.to_string());
    let follow = follow_up(engine, &prefix, length, movetime_ms).await?;
    prefix.extend(follow);

    engine.set_position(&prefix).await?;
    let features = engine.features().await?;
    Ok((prefix.split_off(before.len()), features))
}

/// Legal moves after `before`, minus `played`.
///
/// The played move must be among the legal moves; if it is not, the record
/// and the engine disagree about the position.
pub async fn alternatives<E: EngineSession>(
    engine: &mut E,
    game_id: u32,
    before: &[String],
    played: &str,
) -> Result<Vec<String>, WorkerError> {
    engine.set_position(before).await?;
    let legal = engine.legal_moves().await?;
    if !legal.iter().any(|mv| mv == played) {
        return Err(WorkerError::PlayedMoveNotLegal {
            game_id,
            ply: before.len(),
            mv: played.to_string(),
        });
    }
    let alts: Vec<String> = legal.into_iter().filter(|mv| mv != played).collect();
    debug!(game_id, ply = before.len(), count = alts.len(), "alternatives");
    Ok(alts)
}

/// Build the branch rooted at half-move `ply` of `record`.
pub async fn build_branch<E: EngineSession>(
    engine: &mut E,
    record: &GameRecord,
    ply: usize,
    continuation_length: usize,
    movetime_ms: u32,
) -> Result<MoveBranch, WorkerError> {
    let mut line = record.half_moves();
    if ply >= line.len() {
        return Err(RecordError::IndexOutOfRange {
            index: ply,
            len: line.len(),
        }
        .into());
    }
    let played = line[ply].clone();
    line.truncate(ply);
    let init_move_line = line;

    let (true_continuation, true_features) = continuation(
        engine,
        &init_move_line,
        &played,
        continuation_length,
        movetime_ms,
    )
    .await?;

    let alts = alternatives(engine, record.id, &init_move_line, &played).await?;
    let mut alt_continuations = Vec::with_capacity(alts.len());
    let mut alt_features = Vec::with_capacity(alts.len());
    for alt in &alts {
        let (line, features) =
            continuation(engine, &init_move_line, alt, continuation_length, movetime_ms).await?;
        alt_continuations.push(line);
        alt_features.push(features);
    }

    debug!(
        game_id = record.id,
        ply,
        alternatives = alts.len(),
        "branch assembled"
    );
    Ok(MoveBranch::new(
        init_move_line,
        true_continuation,
        true_features,
        alt_continuations,
        alt_features,
    )?)
}
