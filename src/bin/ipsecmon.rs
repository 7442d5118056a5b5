//! ipsecmon - IPsec tunnel discovery and monitoring
//!
//! Turns `ipsec statusall` output into JSON for a monitoring agent.
//!
//! # Usage
//!
//! ```bash
//! # Low-level discovery of tunnels and their subnets
//! ipsec statusall | ipsecmon -a discover
//!
//! # Current byte counters per tunnel
//! ipsec statusall | ipsecmon -a monitor
//!
//! # Let ipsecmon run the status command itself
//! sudo ipsecmon -a monitor --exec
//! ```

use anyhow::Context;
use clap::{CommandFactory, Parser};
use libipsecmon::config::IpsecmonConfig;
use libipsecmon::source::{CommandSource, StatusSource, StdinSource};
use libipsecmon::{correlator, render};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt as log_fmt, EnvFilter};

/// IPsec tunnel discovery and monitoring
#[derive(Parser, Debug)]
#[command(name = "ipsecmon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parse ipsec statusall output into discovery or monitoring JSON", long_about = None)]
struct Args {
    /// Action to perform: discover or monitor
    #[arg(short = 'a', long = "action", value_name = "MODE")]
    action: Option<String>,

    /// Run the status command instead of reading standard input
    #[arg(long)]
    exec: bool,

    /// Configuration file (TOML)
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pretty-print the JSON payload
    #[arg(long)]
    pretty: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Discover,
    Monitor,
}

impl Mode {
    fn from_flag(value: &str) -> Option<Self> {
        match value {
            "discover" => Some(Mode::Discover),
            "monitor" => Some(Mode::Monitor),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Discover => write!(f, "discover"),
            Mode::Monitor => write!(f, "monitor"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let Some(mode) = args.action.as_deref().and_then(Mode::from_flag) else {
        eprintln!("{}", Args::command().render_help());
        return Ok(());
    };

    let config = match &args.config {
        Some(path) => IpsecmonConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => IpsecmonConfig::default(),
    };
    let pretty = args.pretty || config.output.pretty;

    let mut source: Box<dyn StatusSource> = if args.exec {
        Box::new(CommandSource::new(&config.status))
    } else {
        StdinSource::ensure_piped()?;
        Box::new(StdinSource::new())
    };

    let lines = source
        .read_lines()
        .await
        .with_context(|| format!("Failed to read status output from {}", source.name()))?;

    let snapshot = correlator::parse(&lines);
    info!(
        "Parsed {} tunnels from {} lines (version {:?})",
        snapshot.tunnels.len(),
        lines.len(),
        snapshot.version
    );

    let rendered = match mode {
        Mode::Discover => render::to_json(&render::discover(&snapshot), pretty),
        Mode::Monitor => render::to_json(&render::monitor(&snapshot), pretty),
    };

    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to render {} payload: {}", mode, e),
    }

    Ok(())
}

/// Initialize logging based on command-line arguments
///
/// Logs go to stderr so stdout carries nothing but the JSON payload.
fn init_logging(args: &Args) {
    let log_level = if args.verbose {
        "debug"
    } else {
        args.log_level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new(format!("ipsecmon={},libipsecmon={}", log_level, log_level))
        });

    log_fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .init();
}
