use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use bowing_coach_core::{
    AppConfig, JsonLinesSource, Point, PoseSource, PracticeSession, Side,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

fn main() -> bowing_coach_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            config,
            output,
            bow_hand,
            frog,
            tip,
            summary_only,
        } => run_analyze(AnalyzeArgs {
            input,
            config,
            output,
            bow_hand,
            calibration: frog.zip(tip),
            summary_only,
        }),
        Commands::Config { output } => run_config(output.as_deref()),
    }
}

struct AnalyzeArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    bow_hand: Option<BowHand>,
    calibration: Option<(Point, Point)>,
    summary_only: bool,
}

fn run_analyze(args: AnalyzeArgs) -> bowing_coach_core::Result<()> {
    tracing::info!(input = ?args.input, config = ?args.config, "analysing pose stream");

    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(hand) = args.bow_hand {
        config = config.with_bow_side(hand.into());
    }

    let mut session = PracticeSession::new(config)?;
    if let Some((frog, tip)) = args.calibration {
        session.calibrate(frog, tip)?;
    }

    let mut source = JsonLinesSource::new(BufReader::new(File::open(&args.input)?));
    let mut out = open_output(args.output.as_deref())?;

    while let Some(frame) = source.next_frame()? {
        let report = session.process(&frame);
        if args.summary_only {
            continue;
        }
        serde_json::to_writer(&mut out, &report)?;
        writeln!(out)?;
    }

    let summary = session.summary();
    for (fault, frames) in summary.posture_faults.iter().take(3) {
        tracing::info!(frames, "{}", fault.message());
    }
    if args.summary_only {
        serde_json::to_writer_pretty(&mut out, &summary)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

fn run_config(output: Option<&Path>) -> bowing_coach_core::Result<()> {
    let json = AppConfig::default().to_json_pretty()?;
    let mut out = open_output(output)?;
    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(())
}

fn open_output(path: Option<&Path>) -> bowing_coach_core::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{value}`"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f32>()
            .map_err(|err| format!("invalid coordinate `{s}`: {err}"))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Violin posture and bowing analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BowHand {
    Left,
    Right,
}

impl From<BowHand> for Side {
    fn from(hand: BowHand) -> Self {
        match hand {
            BowHand::Left => Side::Left,
            BowHand::Right => Side::Right,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse a recorded pose stream (one JSON frame per line).
    Analyze {
        /// Path to the JSON-lines pose recording.
        input: PathBuf,
        /// Optional configuration file; defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Where to write per-frame reports. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Hand holding the bow; overrides the configuration file.
        #[arg(long, value_enum)]
        bow_hand: Option<BowHand>,
        /// Bow-hand position at the frog, as `x,y`.
        #[arg(long, value_parser = parse_point, requires = "tip")]
        frog: Option<Point>,
        /// Bow-hand position at the tip, as `x,y`.
        #[arg(long, value_parser = parse_point, requires = "frog")]
        tip: Option<Point>,
        /// Only print the end-of-session summary.
        #[arg(long)]
        summary_only: bool,
    },
    /// Print the default configuration as JSON.
    Config {
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
