//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Drone Bridge - UDP pose telemetry bridge for a simulated actor
#[derive(Parser, Debug)]
#[command(
    name = "drone-bridge",
    author,
    version,
    about = "Drone UDP telemetry bridge",
    long_about = "Receives best-effort UDP pose telemetry from a drone, converts it into the\n\
                  consumer coordinate frame, rate-limits position updates and produces a\n\
                  smoothed target pose every host tick."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DRONE_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DRONE_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge host loop
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),

    /// Send synthetic telemetry to a running bridge
    Emit(EmitArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults are used if missing
    #[arg(
        short,
        long,
        default_value = "bridge.toml",
        env = "DRONE_BRIDGE_CONFIG"
    )]
    pub config: PathBuf,

    /// Override listen port from configuration
    #[arg(long, env = "DRONE_BRIDGE_PORT")]
    pub port: Option<u16>,

    /// Enable port discovery regardless of configuration
    #[arg(long)]
    pub discover: bool,

    /// Override maximum full-update frequency (0 = unlimited)
    #[arg(long)]
    pub max_update_hz: Option<f64>,

    /// Override coordinate scale
    #[arg(long)]
    pub scale: Option<f64>,

    /// Stop after this many host ticks (0 = unlimited)
    #[arg(long, default_value = "0", env = "DRONE_BRIDGE_MAX_TICKS")]
    pub max_ticks: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "DRONE_BRIDGE_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DRONE_BRIDGE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults are shown if missing
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long, conflicts_with = "toml")]
    pub json: bool,

    /// Output as TOML (suitable as a starting config file)
    #[arg(long)]
    pub toml: bool,
}

/// Arguments for the `emit` command
#[derive(Parser, Debug)]
pub struct EmitArgs {
    /// Destination address of the bridge
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    pub target: SocketAddr,

    /// Send rate in Hz
    #[arg(short, long, default_value = "30")]
    pub rate: f64,

    /// Duration in seconds (0 = until Ctrl+C)
    #[arg(short, long, default_value = "10")]
    pub duration: f64,

    /// Radius of the circular trajectory in meters
    #[arg(long, default_value = "5")]
    pub radius: f64,

    /// Flight altitude in meters
    #[arg(long, default_value = "2")]
    pub altitude: f64,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
