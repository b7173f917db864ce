//! Sequential record pipeline: read, build the requested stage, write.

use std::io::{BufRead, Write};

use clap::ValueEnum;
use movebranch_core::{GameRecord, SampledMovesStage, TrainGame};
use tracing::{error, info};

use crate::config::GenConfig;
use crate::engine::EngineSession;
use crate::error::WorkerError;
use crate::io::{read_record_lines, write_record_lines, CsvSink};
use crate::stages::{build_alternatives, build_continuations, build_train_game};

/// Which derived record to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    Sampled,
    Alternatives,
    Continuations,
    Train,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Lines,
    Csv,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
}

enum Built {
    Lines(Vec<String>),
    Train(TrainGame),
}

enum Sink<W: Write> {
    Lines(W),
    Csv(CsvSink<W>),
}

impl<W: Write> Sink<W> {
    fn write(&mut self, built: Built) -> Result<(), WorkerError> {
        match (self, built) {
            (Sink::Lines(w), Built::Lines(lines)) => write_record_lines(w, &lines),
            (Sink::Lines(w), Built::Train(game)) => write_record_lines(w, &game.to_lines()),
            (Sink::Csv(sink), Built::Train(game)) => sink.write_rows(&game.comparison_rows()),
            (Sink::Csv(_), Built::Lines(_)) => Err(WorkerError::Config(
                "csv output needs the train stage".to_string(),
            )),
        }
    }

    fn flush(&mut self) -> Result<(), WorkerError> {
        match self {
            Sink::Lines(w) => w.flush()?,
            Sink::Csv(sink) => sink.flush()?,
        }
        Ok(())
    }
}

/// Run every record of `input` through `stage` and write the result.
///
/// Records that fail on their own are logged and skipped. Engine and output
/// failures end the run.
pub async fn run<E, R, W>(
    engine: &mut E,
    config: &GenConfig,
    stage: Stage,
    format: OutputFormat,
    mut input: R,
    output: W,
) -> Result<RunSummary, WorkerError>
where
    E: EngineSession,
    R: BufRead,
    W: Write,
{
    let mut sink = match format {
        OutputFormat::Lines => Sink::Lines(output),
        OutputFormat::Csv if stage == Stage::Train => Sink::Csv(CsvSink::new(output)?),
        OutputFormat::Csv => {
            return Err(WorkerError::Config(format!(
                "csv output needs the train stage, not {stage:?}"
            )))
        }
    };

    let mut summary = RunSummary::default();
    let mut position = 0usize;
    loop {
        // An undecodable record comes back as a record error, already consumed
        let built = match read_record_lines(&mut input) {
            Ok(Some(lines)) => build(engine, config, stage, &lines).await,
            Ok(None) => break,
            Err(e) => Err(e),
        };
        position += 1;
        match built {
            Ok(built) => {
                sink.write(built)?;
                summary.processed += 1;
            }
            Err(e) if e.skips_record() => {
                error!(record = position, error = %e, "Skipping record");
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    sink.flush()?;

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        "Run complete"
    );
    Ok(summary)
}

async fn build<E: EngineSession>(
    engine: &mut E,
    config: &GenConfig,
    stage: Stage,
    lines: &[String],
) -> Result<Built, WorkerError> {
    let record = GameRecord::from_lines(lines)?;
    let game_id = record.id;
    let seed = config.game_seed(game_id);

    if stage == Stage::Train {
        let game = build_train_game(
            engine,
            record,
            config.distribution,
            config.count,
            seed,
            config.continuation_length,
            config.movetime_ms,
        )
        .await?;
        info!(game_id, branches = game.branches().len(), "Game processed");
        return Ok(Built::Train(game));
    }

    let sampled = SampledMovesStage::sample(record, config.distribution, config.count, seed);
    let lines = match stage {
        Stage::Sampled => sampled.to_lines(),
        Stage::Alternatives => build_alternatives(engine, sampled).await?.to_lines(),
        _ => {
            let alts = build_alternatives(engine, sampled).await?;
            build_continuations(engine, alts, config.continuation_length, config.movetime_ms)
                .await?
                .to_lines()
        }
    };
    info!(game_id, ?stage, "Game processed");
    Ok(Built::Lines(lines))
}
