//! otel-inject CLI
//!
//! Applies auto-instrumentation injection to Pod manifests.

use clap::Parser;
use otel_inject_common::telemetry::{init_logging, LoggingConfig};

use otel_inject_cli::{Cli, Result};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LoggingConfig {
        format: cli.log_format,
        ..Default::default()
    })?;

    cli.run()
}
