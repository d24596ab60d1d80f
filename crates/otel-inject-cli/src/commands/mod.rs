//! CLI subcommands

pub mod inject;
pub mod runtimes;

use std::path::Path;

use otel_inject_instrumentation::InstrumentationConfig;

use crate::{Error, Result};

/// Read a file to a string, attaching the path to any IO error
pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::read(path, e))
}

/// Load an instrumentation configuration file
pub(crate) fn load_config(path: &Path) -> Result<InstrumentationConfig> {
    let text = read_file(path)?;
    let source = path.display().to_string();
    Ok(InstrumentationConfig::from_yaml(&text, &source)?)
}
