//! Engine-driven builders for the derived stages.
//!
//! Each builder takes the stage below by value and computes its own section
//! right away.

use std::collections::BTreeMap;

use movebranch_core::train::sample_winner_plies;
use movebranch_core::{
    AlternativesStage, ContinuationsStage, CountStrategy, GameRecord, SampleDistribution,
    SampledMovesStage, TrainGame,
};
use tracing::debug;

use crate::branch::{alternatives, build_branch, follow_up};
use crate::engine::EngineSession;
use crate::error::WorkerError;

pub async fn build_alternatives<E: EngineSession>(
    engine: &mut E,
    sampled: SampledMovesStage,
) -> Result<AlternativesStage, WorkerError> {
    let record = sampled.record();
    let mut map = BTreeMap::new();
    for &index in sampled.indices() {
        let before = record.line_before_winner_move(index)?;
        let played = record.winner_move(index)?;
        map.insert(index, alternatives(engine, record.id, &before, played).await?);
    }
    Ok(AlternativesStage::new(sampled, map)?)
}

pub async fn build_continuations<E: EngineSession>(
    engine: &mut E,
    alts: AlternativesStage,
    length: usize,
    movetime_ms: u32,
) -> Result<ContinuationsStage, WorkerError> {
    let record = alts.record();
    let mut played_lines = BTreeMap::new();
    let mut alt_lines = BTreeMap::new();

    for (&index, moves) in alts.alternatives() {
        let before = record.line_before_winner_move(index)?;
        let played = record.winner_move(index)?;

        let mut prefix = before.clone();
        prefix.push(played.to_string());
        played_lines.insert(index, follow_up(engine, &prefix, length, movetime_ms).await?);

        let mut lines = Vec::with_capacity(moves.len());
        for mv in moves {
            prefix.truncate(before.len());
            prefix.push(mv.clone());
            lines.push(follow_up(engine, &prefix, length, movetime_ms).await?);
        }
        alt_lines.insert(index, lines);
    }

    Ok(ContinuationsStage::new(alts, length, played_lines, alt_lines)?)
}

/// Sample the winner's plies of `record` and build a branch at each.
pub async fn build_train_game<E: EngineSession>(
    engine: &mut E,
    record: GameRecord,
    distribution: SampleDistribution,
    count: CountStrategy,
    seed: u64,
    continuation_length: usize,
    movetime_ms: u32,
) -> Result<TrainGame, WorkerError> {
    let plies = sample_winner_plies(&record, distribution, count, seed)?;
    debug!(game_id = record.id, ?plies, "sampled winner plies");

    let mut branches = Vec::with_capacity(plies.len());
    for &ply in &plies {
        branches.push(build_branch(engine, &record, ply, continuation_length, movetime_ms).await?);
    }
    Ok(TrainGame::new(record, continuation_length, plies, branches)?)
}
