//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config file used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "etc/shot_config.toml";

#[derive(Parser, Debug)]
#[command(name = "shot", version, about = "Espresso shot analyser")]
pub struct Cli {
    /// Path to config TOML (default: etc/shot_config.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Output format for results.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Format {
    Table,
    Json,
    Csv,
}

impl From<shot_config::OutputFormat> for Format {
    fn from(f: shot_config::OutputFormat) -> Self {
        match f {
            shot_config::OutputFormat::Table => Format::Table,
            shot_config::OutputFormat::Json => Format::Json,
            shot_config::OutputFormat::Csv => Format::Csv,
        }
    }
}

/// Delay overrides shared by `analyze` and `calibrate`.
#[derive(Args, Debug, Default, Clone)]
pub struct DelayArgs {
    /// Override analysis.sensor_delay_ms
    #[arg(long, value_name = "MS")]
    pub sensor_delay_ms: Option<f64>,
    /// Override analysis.scale_delay_ms
    #[arg(long, value_name = "MS")]
    pub scale_delay_ms: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explain each phase of a recorded shot
    Analyze {
        /// Shot JSON file
        shot: PathBuf,
        /// Profile JSON file (one profile or an array); repeatable
        #[arg(long, value_name = "FILE")]
        profile: Vec<PathBuf>,
        #[command(flatten)]
        delays: DelayArgs,
        /// Force sensor-delay auto-calibration on
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_auto_delay")]
        auto_delay: bool,
        /// Force sensor-delay auto-calibration off
        #[arg(long, action = ArgAction::SetTrue)]
        no_auto_delay: bool,
        /// Output format (default from [output].format)
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
    /// Print header facts for a shot (profile, dose, yield, ratio)
    Summary {
        /// Shot JSON file
        shot: PathBuf,
        /// Output format (csv prints the table layout)
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
    /// Compare the configured sensor delay against the high-latency candidate
    Calibrate {
        /// Shot JSON file
        shot: PathBuf,
        /// Profile JSON file (one profile or an array); repeatable
        #[arg(long, value_name = "FILE", required = true)]
        profile: Vec<PathBuf>,
        /// Override analysis.sensor_delay_ms
        #[arg(long, value_name = "MS")]
        sensor_delay_ms: Option<f64>,
        /// Output format (csv prints the table layout)
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}
