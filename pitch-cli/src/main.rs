//! # Pitch - Monophonic Pitch Tracker CLI
//!
//! Command-line front end for the pitch-core pipeline. It plays the two
//! collaborators the core leaves outside: a PCM source (live microphone
//! capture or a raw file) and a display (printed lines).
//!
//! ## Architecture
//! - **Audio Thread**: CPAL callback converting device buffers to s16le chunks
//! - **Main Thread**: processing loop owning the pipeline
//! - **Communication**: Crossbeam channels for chunks, failures and the stop timer

mod capture;
mod output;

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, select};
use log::{info, warn};
use pitch_core::{EstimatorKind, PipelineConfig, PitchPipeline};

use output::Reporter;

/// Capture buffers queued between the audio callback and the loop.
const CHUNK_QUEUE: usize = 64;

/// Estimate the pitch of a sung or played note.
#[derive(Parser, Debug)]
#[command(name = "pitch", version, about, long_about = None)]
struct Cli {
    /// JSON file overriding pipeline parameters
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Period estimator to run
    #[arg(short, long, global = true, value_enum)]
    estimator: Option<EstimatorArg>,

    /// Print one JSON object per update
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Track the default microphone until the stream stops
    Listen {
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<f64>,
    },
    /// Track a raw s16le mono PCM file
    Analyze {
        /// Path of the raw PCM file
        file: PathBuf,

        /// Bytes fed to the pipeline per chunk
        #[arg(long, default_value_t = 4096)]
        chunk_bytes: usize,
    },
    /// Print the effective configuration as JSON
    PrintConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EstimatorArg {
    Yin,
    Autocorrelation,
}

impl From<EstimatorArg> for EstimatorKind {
    fn from(arg: EstimatorArg) -> Self {
        match arg {
            EstimatorArg::Yin => EstimatorKind::Yin,
            EstimatorArg::Autocorrelation => EstimatorKind::Autocorrelation,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.estimator)?;
    let reporter = Reporter::new(io::stdout().lock(), cli.json);

    match cli.command {
        Command::Listen { duration } => listen(config, reporter, duration),
        Command::Analyze { file, chunk_bytes } => analyze(config, reporter, &file, chunk_bytes),
        Command::PrintConfig => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

/// Defaults, then the config file, then command-line overrides.
fn load_config(path: Option<&Path>, estimator: Option<EstimatorArg>) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(estimator) = estimator {
        config.estimator = estimator.into();
    }
    config.validate()?;
    Ok(config)
}

/// Runs the pipeline on live microphone input.
fn listen<W: io::Write>(
    mut config: PipelineConfig,
    mut reporter: Reporter<W>,
    duration: Option<f64>,
) -> Result<()> {
    let (chunk_tx, chunk_rx) = crossbeam_channel::bounded::<Vec<u8>>(CHUNK_QUEUE);
    let (failure_tx, failure_rx) = crossbeam_channel::bounded::<String>(1);
    let (stream, sample_rate) = capture::start_capture(chunk_tx, failure_tx, config.sample_rate)?;
    if sample_rate != config.sample_rate {
        warn!(
            "[MAIN] Device runs at {} Hz instead of {} Hz",
            sample_rate, config.sample_rate
        );
        config.sample_rate = sample_rate;
    }

    let mut pipeline = PitchPipeline::new(config)?;
    pipeline.start();

    let deadline = match duration {
        Some(secs) if secs > 0.0 => crossbeam_channel::after(Duration::from_secs_f64(secs)),
        _ => crossbeam_channel::never(),
    };

    let tracked = track(&mut pipeline, &mut reporter, &chunk_rx, &failure_rx, &deadline);

    // Stop delivery before dropping pipeline state.
    if let Err(e) = stream.pause() {
        warn!("[MAIN] Error pausing stream: {}", e);
    }
    drop(stream);
    pipeline.stop();
    tracked
}

/// Feeds captured chunks to the pipeline until the stream fails, the
/// capture channel closes, or the deadline fires.
///
/// A failure is checked on its own channel, so it ends the loop even while
/// the chunk queue is full. A failed stream is reported and never restarted.
fn track<W: io::Write>(
    pipeline: &mut PitchPipeline,
    reporter: &mut Reporter<W>,
    chunk_rx: &Receiver<Vec<u8>>,
    failure_rx: &Receiver<String>,
    deadline: &Receiver<Instant>,
) -> Result<()> {
    loop {
        select! {
            recv(failure_rx) -> msg => {
                let reason = msg.unwrap_or_else(|_| "capture stream dropped".to_string());
                let stopped = pipeline.handle_capture_error(reason);
                reporter.stopped(&stopped)?;
                return Ok(());
            },
            recv(chunk_rx) -> msg => match msg {
                Ok(bytes) => {
                    if let Some(result) = pipeline.process_chunk(&bytes) {
                        reporter.emit(&result)?;
                        // No animation here: the pointer lands on its target.
                        if let Some(update) = result.indicator {
                            pipeline.indicator_mut().set_current(update.target_cents);
                        }
                    }
                }
                Err(_) => {
                    let stopped = pipeline.handle_capture_error("capture channel closed");
                    reporter.stopped(&stopped)?;
                    return Ok(());
                }
            },
            recv(deadline) -> _ => {
                info!("[MAIN] Duration elapsed");
                return Ok(());
            },
        }
    }
}

/// Runs the pipeline over a raw PCM file as if it were streamed.
fn analyze<W: io::Write>(
    config: PipelineConfig,
    mut reporter: Reporter<W>,
    file: &Path,
    chunk_bytes: usize,
) -> Result<()> {
    if chunk_bytes == 0 || chunk_bytes % 2 != 0 {
        bail!("--chunk-bytes must be a positive even number, got {}", chunk_bytes);
    }
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    info!(
        "[MAIN] Analyzing {} ({} samples)",
        file.display(),
        bytes.len() / 2
    );

    let mut pipeline = PitchPipeline::new(config)?;
    pipeline.start();
    let mut emitted = 0usize;
    for chunk in bytes.chunks(chunk_bytes) {
        if let Some(result) = pipeline.process_chunk(chunk) {
            reporter.emit(&result)?;
            if let Some(update) = result.indicator {
                pipeline.indicator_mut().set_current(update.target_cents);
            }
            emitted += 1;
        }
    }
    pipeline.stop();
    info!("[MAIN] {} updates emitted", emitted);
    Ok(())
}
