//! Error types for otel-inject
//!
//! The injection path itself never fails: conflicts are reported through
//! structured outcomes. These errors cover configuration loading and
//! runtime profile validation, where a bad input must stop the caller.

use thiserror::Error;

use crate::yaml::YamlError;

/// Main error type for otel-inject operations
#[derive(Debug, Error)]
pub enum Error {
    /// A runtime profile failed validation
    #[error("invalid runtime profile {profile}: {message}")]
    InvalidProfile {
        /// Name of the offending profile
        profile: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "env[2].name")
        field: Option<String>,
    },

    /// No runtime profile is registered under the requested name
    #[error("unknown runtime: {name}")]
    UnknownRuntime {
        /// Requested runtime name
        name: String,
    },

    /// The instrumentation configuration is unusable
    #[error("configuration error [{context}]: {message}")]
    Config {
        /// Description of what failed
        message: String,
        /// Where the configuration came from (file path, "inline", ...)
        context: String,
    },

    /// YAML could not be parsed
    #[error("yaml error: {0}")]
    Yaml(#[from] YamlError),

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The document kind being (de)serialized, if known
        kind: Option<String>,
    },
}

impl Error {
    /// Create a profile validation error pointing at a specific field
    pub fn invalid_profile_field(
        profile: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::InvalidProfile {
            profile: profile.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create an unknown runtime error
    pub fn unknown_runtime(name: impl Into<String>) -> Self {
        Self::UnknownRuntime { name: name.into() }
    }

    /// Create a configuration error
    pub fn config(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Create a serialization error for a document kind
    pub fn serialization_for(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// The offending field path, for validation errors that carry one
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidProfile { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
            kind: None,
        }
    }
}
