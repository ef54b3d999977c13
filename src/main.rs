use anyhow::{Context, Result};
use clap::Parser;
use screencast_reporter::{
    init_tracing, run_events, BridgeOutcome, RecordingSessionController, ReporterConfig,
    ReporterOptions,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Reporter options as a JSON file
    #[arg(short, long)]
    config: PathBuf,

    /// Log capture tool output and recorder decisions
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut options = ReporterOptions::from_file(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    options.debug |= args.debug;
    init_tracing(options.debug);

    let config = ReporterConfig::from_options(options).context("Invalid reporter options")?;
    let mut controller = RecordingSessionController::with_defaults(config);

    let outcome = run_events(
        &mut controller,
        BufReader::new(tokio::io::stdin()),
        &mut tokio::io::stdout(),
        &mut tokio::io::stderr(),
    )
    .await
    .context("Lifecycle bridge I/O failed")?;

    Ok(match outcome {
        BridgeOutcome::Completed => ExitCode::SUCCESS,
        BridgeOutcome::Failed => ExitCode::FAILURE,
    })
}
