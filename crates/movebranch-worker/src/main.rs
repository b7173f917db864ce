//! Training data generator
//!
//! Reads game records, samples anchor moves, branches them with the engine
//! and writes the derived records or the flattened CSV rows.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use movebranch_worker::{run, GenConfig, OutputFormat, Stage, StockfishEngine};

#[derive(Parser, Debug)]
#[command(name = "movebranch-gen", about = "Branch sampled game moves into training data")]
struct Cli {
    /// Game records separated by terminator lines
    input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Stage::Train)]
    stage: Stage,

    #[arg(long, value_enum, default_value_t = OutputFormat::Lines)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout may carry records
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    if cli.format == OutputFormat::Csv && cli.stage != Stage::Train {
        anyhow::bail!("--format csv requires --stage train");
    }

    let config = GenConfig::load()?;
    info!(
        stockfish_path = %config.stockfish_path,
        movetime_ms = config.movetime_ms,
        continuation_length = config.continuation_length,
        distribution = %config.distribution,
        "Generator config loaded"
    );

    let input = File::open(&cli.input)
        .with_context(|| format!("Failed to open {}", cli.input.display()))?;
    let output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut engine = StockfishEngine::new(&config.stockfish_path, config.engine_timeout).await?;
    info!("Engine ready");

    let result = run(
        &mut engine,
        &config,
        cli.stage,
        cli.format,
        BufReader::new(input),
        output,
    )
    .await;

    engine.quit().await;
    let summary = result?;
    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        "Shutting down"
    );
    Ok(())
}
