//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "hrc", version, about = "Heart-rate challenge kiosk client")]
pub struct Cli {
    /// Path to config TOML; defaults apply when the file is absent
    #[arg(long, value_name = "FILE", default_value = "etc/hrc.toml")]
    pub config: PathBuf,

    /// Log and print results as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides RUST_LOG and the config
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Use the in-process simulated monitor instead of the HTTP service
    #[arg(long, action = ArgAction::SetTrue)]
    pub simulate: bool,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one unattended session: connect, baseline, challenge, finish
    Session {
        /// Challenge duration in ms (takes precedence over config)
        #[arg(long, value_name = "MS")]
        challenge_ms: Option<u64>,
    },
    /// Interactive kiosk: read connect|baseline|challenge|finish|quit from stdin
    Kiosk,
    /// Check that the service answers a series read
    Health,
    /// Validate configuration and print the effective settings
    SelfCheck,
}
