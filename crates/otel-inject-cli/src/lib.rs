//! otel-inject CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};
use otel_inject_common::telemetry::LogFormat;

/// otel-inject - inject instrumentation agents into Pod manifests
#[derive(Parser, Debug)]
#[command(name = "otel-inject")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log line format (pretty or json)
    #[arg(long, global = true, default_value = "pretty", env = "OTEL_INJECT_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inject a runtime's agent into a Pod manifest and print the result
    Inject(commands::inject::InjectArgs),
    /// List known runtime profiles
    Runtimes(commands::runtimes::RuntimesArgs),
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Inject(args) => commands::inject::run(args),
            Commands::Runtimes(args) => commands::runtimes::run(args),
        }
    }
}
