//! Instrumentation configuration
//!
//! The per-runtime injection input (image and user variables) as supplied by
//! the cluster's instrumentation resource, plus optional custom runtime
//! profiles. Field names follow Kubernetes camelCase conventions.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::EnvVar;
use otel_inject_common::yaml::from_yaml_str;
use otel_inject_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::runtime::{RuntimeProfile, RuntimeRegistry};

/// Injection input for one runtime
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInjectionSpec {
    /// Distribution image that carries the agent payload
    pub image: String,
    /// User-declared variables, added only where the container has none
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

impl RuntimeInjectionSpec {
    /// Create a spec for the given distribution image
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            env: Vec::new(),
        }
    }

    /// Add a literal user variable
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        });
        self
    }
}

/// Full instrumentation configuration document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentationConfig {
    /// Injection input per runtime name
    #[serde(default)]
    pub runtimes: BTreeMap<String, RuntimeInjectionSpec>,
    /// Additional runtime profiles, overriding built-ins of the same name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<RuntimeProfile>,
}

impl InstrumentationConfig {
    /// Parse a YAML or JSON configuration document.
    ///
    /// `source` names the document in errors (usually the file path).
    pub fn from_yaml(input: &str, source: &str) -> Result<Self> {
        let config: Self = from_yaml_str(input, "InstrumentationConfig")?;
        config.validate(source)?;
        Ok(config)
    }

    /// Check every runtime entry names an image
    pub fn validate(&self, source: &str) -> Result<()> {
        for (name, spec) in &self.runtimes {
            if spec.image.trim().is_empty() {
                return Err(Error::config(
                    source,
                    format!("runtime {} has no image", name),
                ));
            }
        }
        Ok(())
    }

    /// Built-in profiles plus the ones declared in this configuration
    pub fn registry(&self) -> Result<RuntimeRegistry> {
        let mut registry = RuntimeRegistry::builtin();
        for profile in &self.profiles {
            registry.register(profile.clone())?;
        }
        Ok(registry)
    }

    /// Injection input for a runtime
    pub fn runtime(&self, name: &str) -> Result<&RuntimeInjectionSpec> {
        self.runtimes.get(name).ok_or_else(|| Error::unknown_runtime(name))
    }
}
