//! Common building blocks for otel-inject: errors, logging setup, YAML parsing

#![deny(missing_docs)]

pub mod error;
pub mod telemetry;
pub mod yaml;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Environment variable consulted for the instrumentation configuration file
pub const CONFIG_PATH_ENV: &str = "OTEL_INJECT_CONFIG";
