//! Pulse CLI - Command-line interface for Synheart Stream
//!
//! Commands:
//! - stream: Decode NDJSON packets into a calibrated NDJSON sample stream
//! - channels: Print the output channel catalogue

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use synheart_stream::{
    ChannelRegistry, JsonLineSink, Modality, StreamError, StreamInfo, StreamProcessor,
    TaggedPacket, DEFAULT_SAMPLE_RATE_HZ, STREAM_VERSION,
};

/// Pulse - On-device streaming engine for calibrated biosensor samples
#[derive(Parser)]
#[command(name = "pulse")]
#[command(author = "Synheart AI Inc")]
#[command(version = STREAM_VERSION)]
#[command(about = "Decode, calibrate, and stream biosensor samples", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode NDJSON packets into a calibrated NDJSON sample stream
    Stream {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Declared stream name
        #[arg(long, default_value = "BiosensorStream")]
        name: String,

        /// Stable source identifier (generated when omitted)
        #[arg(long)]
        source_id: Option<String>,

        /// Nominal sample rate in Hz
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
        sample_rate: f64,

        /// Comma-separated modalities to emit, in emission order
        #[arg(long, default_value = "gsr,ppg,accel,gyro,mag,battery")]
        modalities: String,

        /// Flush output after each sample
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Print the output channel catalogue
    Channels {
        /// Comma-separated modalities, in emission order
        #[arg(long, default_value = "gsr,ppg,accel,gyro,mag,battery")]
        modalities: String,

        /// Print the full stream descriptor as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    init_diagnostics();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Install the line-oriented diagnostic channel on stderr.
///
/// Sticky modality errors from the core surface here; sample output stays
/// clean on stdout.
fn init_diagnostics() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    match cli.command {
        Commands::Stream {
            input,
            output,
            name,
            source_id,
            sample_rate,
            modalities,
            flush,
        } => cmd_stream(
            &input,
            &output,
            &name,
            source_id.as_deref(),
            sample_rate,
            &modalities,
            flush,
        ),

        Commands::Channels { modalities, json } => cmd_channels(&modalities, json),
    }
}

fn cmd_stream(
    input: &PathBuf,
    output: &PathBuf,
    name: &str,
    source_id: Option<&str>,
    sample_rate: f64,
    modalities: &str,
    flush: bool,
) -> Result<(), PulseCliError> {
    let registry = ChannelRegistry::new(parse_modalities(modalities)?)?;

    let mut info = StreamInfo::new(name, &registry).with_sample_rate(sample_rate);
    if let Some(id) = source_id {
        info = info.with_source_id(id);
    }

    let writer: Box<dyn Write> = if output.to_string_lossy() == "-" {
        Box::new(io::stdout().lock())
    } else {
        Box::new(fs::File::create(output)?)
    };
    let sink = JsonLineSink::new(writer).with_flush(flush);

    let mut processor = StreamProcessor::new(registry, info, sink)?;

    let reader: Box<dyn BufRead> = if input.to_string_lossy() == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(fs::File::open(input)?))
    };

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let packet: TaggedPacket = match serde_json::from_str(trimmed) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("skipping malformed packet record: {e}");
                continue;
            }
        };

        processor.process(&packet);
    }

    info!(
        samples = processor.samples_emitted(),
        degraded_modalities = processor.tracker().reported_count(),
        "stream finished"
    );

    Ok(())
}

fn cmd_channels(modalities: &str, json: bool) -> Result<(), PulseCliError> {
    let registry = ChannelRegistry::new(parse_modalities(modalities)?)?;

    if json {
        let info = StreamInfo::new("BiosensorStream", &registry);
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    for spec in registry.channels() {
        writeln!(stdout, "{:>3}  {:<12} {}", spec.index, spec.label, spec.unit)?;
    }
    Ok(())
}

fn parse_modalities(list: &str) -> Result<Vec<Modality>, PulseCliError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|id| Modality::from_id(id).ok_or_else(|| PulseCliError::UnknownModality(id.to_string())))
        .collect()
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Stream(StreamError),
    UnknownModality(String),
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

impl From<StreamError> for PulseCliError {
    fn from(e: StreamError) -> Self {
        PulseCliError::Stream(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PulseCliError::Stream(e) => CliError {
                code: "STREAM_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check stream configuration before starting".to_string()),
            },
            PulseCliError::UnknownModality(name) => CliError {
                code: "UNKNOWN_MODALITY".to_string(),
                message: format!("unknown modality: {name}"),
                hint: Some("Valid modalities: gsr, ppg, accel, gyro, mag, battery".to_string()),
            },
        }
    }
}
