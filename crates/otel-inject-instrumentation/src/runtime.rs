//! Runtime profiles
//!
//! A profile is the data that makes one managed runtime injectable: the
//! ordered variables its agent reads at startup and where its distribution
//! image keeps the agent payload. Adding a runtime means adding a profile,
//! either to [`RuntimeRegistry::builtin`] or through configuration.
//!
//! Variable names and values are a contract with the agent payload running
//! inside the container. Changing one requires a matching agent release.

use std::collections::BTreeMap;
use std::collections::HashSet;

use otel_inject_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::env::MergePolicy;
use crate::sdk::INSTRUMENTATION_MOUNT_PATH;

/// Name of the built-in .NET profile
pub const DOTNET_RUNTIME: &str = "dotnet";

/// Where distribution images keep the agent payload by default
pub const DEFAULT_PAYLOAD_SOURCE_PATH: &str = "/autoinstrumentation";

/// A variable the runtime's agent requires
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredEnvVar {
    /// Variable name
    pub name: String,
    /// Value to inject
    pub value: String,
    /// How to treat a value the container already defines
    #[serde(default)]
    pub merge: MergePolicy,
}

impl RequiredEnvVar {
    /// A variable where the owner's value wins
    pub fn preserve(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            merge: MergePolicy::Preserve,
        }
    }

    /// A path-list variable that is appended to the owner's value
    pub fn concatenate(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            merge: MergePolicy::Concatenate,
        }
    }
}

/// Everything needed to inject one runtime's agent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeProfile {
    /// Runtime name (e.g. "dotnet")
    pub name: String,
    /// Directory inside the distribution image holding the agent payload
    #[serde(default = "default_payload_source_path")]
    pub payload_source_path: String,
    /// Required variables, applied in order
    #[serde(default)]
    pub env: Vec<RequiredEnvVar>,
}

fn default_payload_source_path() -> String {
    DEFAULT_PAYLOAD_SOURCE_PATH.to_string()
}

impl RuntimeProfile {
    /// The .NET CLR profiler and startup hook profile
    pub fn dotnet() -> Self {
        let home = INSTRUMENTATION_MOUNT_PATH;
        Self {
            name: DOTNET_RUNTIME.to_string(),
            payload_source_path: DEFAULT_PAYLOAD_SOURCE_PATH.to_string(),
            env: vec![
                RequiredEnvVar::preserve("CORECLR_ENABLE_PROFILING", "1"),
                RequiredEnvVar::preserve(
                    "CORECLR_PROFILER",
                    "{918728DD-259F-4A6A-AC2B-B85E1B658318}",
                ),
                RequiredEnvVar::preserve(
                    "CORECLR_PROFILER_PATH",
                    format!("{home}/OpenTelemetry.AutoInstrumentation.Native.so"),
                ),
                RequiredEnvVar::concatenate(
                    "DOTNET_STARTUP_HOOKS",
                    format!(
                        "{home}/netcoreapp3.1/OpenTelemetry.AutoInstrumentation.StartupHook.dll"
                    ),
                ),
                RequiredEnvVar::concatenate(
                    "DOTNET_ADDITIONAL_DEPS",
                    format!("{home}/AdditionalDeps"),
                ),
                RequiredEnvVar::preserve("OTEL_DOTNET_AUTO_HOME", home),
                RequiredEnvVar::concatenate("DOTNET_SHARED_STORE", format!("{home}/store")),
            ],
        }
    }

    /// Check the profile can be applied as a single injection sequence.
    ///
    /// A variable listed twice would be concatenated onto itself, so names
    /// must be unique within a profile.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_profile_field(
                "<unnamed>",
                "name",
                "profile name must not be empty",
            ));
        }

        if !self.payload_source_path.starts_with('/') {
            return Err(Error::invalid_profile_field(
                &self.name,
                "payloadSourcePath",
                format!(
                    "payload source path must be absolute, got '{}'",
                    self.payload_source_path
                ),
            ));
        }

        let mut seen = HashSet::new();
        for (i, var) in self.env.iter().enumerate() {
            if var.name.is_empty() {
                return Err(Error::invalid_profile_field(
                    &self.name,
                    format!("env[{i}].name"),
                    "env var name must not be empty",
                ));
            }
            if !seen.insert(var.name.as_str()) {
                return Err(Error::invalid_profile_field(
                    &self.name,
                    format!("env[{i}].name"),
                    format!("env var {} is listed more than once", var.name),
                ));
            }
        }

        Ok(())
    }
}

/// Known runtime profiles, keyed by name
#[derive(Clone, Debug)]
pub struct RuntimeRegistry {
    profiles: BTreeMap<String, RuntimeProfile>,
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuntimeRegistry {
    /// Registry holding only the profiles shipped with this crate
    pub fn builtin() -> Self {
        let dotnet = RuntimeProfile::dotnet();
        Self {
            profiles: BTreeMap::from([(dotnet.name.clone(), dotnet)]),
        }
    }

    /// Validate and add a profile, replacing any profile of the same name
    pub fn register(&mut self, profile: RuntimeProfile) -> Result<()> {
        profile.validate()?;
        self.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Result<&RuntimeProfile> {
        self.profiles
            .get(name)
            .ok_or_else(|| Error::unknown_runtime(name))
    }

    /// Registered profiles in name order
    pub fn profiles(&self) -> impl Iterator<Item = &RuntimeProfile> {
        self.profiles.values()
    }
}
