//! `otel-inject runtimes` - list runtime profiles

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;
use otel_inject_common::CONFIG_PATH_ENV;
use otel_inject_instrumentation::{MergePolicy, RuntimeProfile, RuntimeRegistry};

use super::load_config;
use crate::Result;

/// Arguments for the runtimes command
#[derive(Args, Debug)]
pub struct RuntimesArgs {
    /// Instrumentation configuration whose custom profiles should be included
    #[arg(long, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,
}

/// Run the runtimes command
pub fn run(args: RuntimesArgs) -> Result<()> {
    let registry = match &args.config {
        Some(path) => load_config(path)?.registry()?,
        None => RuntimeRegistry::builtin(),
    };

    for profile in registry.profiles() {
        print!("{}", describe(profile));
    }
    Ok(())
}

/// Human-readable listing of one profile
pub fn describe(profile: &RuntimeProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} (payload: {})",
        profile.name, profile.payload_source_path
    );
    for var in &profile.env {
        let mode = match var.merge {
            MergePolicy::Preserve => "preserve",
            MergePolicy::Concatenate => "concatenate",
        };
        let _ = writeln!(out, "  {:<26} {:<11} {}", var.name, mode, var.value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_dotnet() {
        let text = describe(&RuntimeProfile::dotnet());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "dotnet (payload: /autoinstrumentation)");
        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("  CORECLR_ENABLE_PROFILING"));
        assert!(lines[4].contains("concatenate"));
        assert!(lines[6].contains("preserve"));
    }

    #[test]
    fn test_run_builtin() {
        assert!(run(RuntimesArgs { config: None }).is_ok());
    }
}
