//! Conflict-aware auto-instrumentation injection for Kubernetes Pods
//!
//! Rewrites an in-flight Pod so a runtime's instrumentation agent is loaded
//! at container start, without the workload owner touching image or
//! manifest. Values the owner set are never overwritten, path-list variables
//! are appended to, and the shared payload volume and its init container are
//! added once per Pod no matter how many containers are instrumented.
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = InstrumentationConfig::from_yaml(&text, "instrumentation.yaml")?;
//! let registry = config.registry()?;
//! let injector = Injector::new(registry.get("dotnet")?, config.runtime("dotnet")?);
//! let injected = injector.inject_containers(pod, &[0, 1]);
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod env;
pub mod runtime;
pub mod sdk;

pub use config::{InstrumentationConfig, RuntimeInjectionSpec};
pub use env::{try_set_env_var, EnvConflict, EnvMerge, MergePolicy};
pub use runtime::{RequiredEnvVar, RuntimeProfile, RuntimeRegistry};
pub use sdk::{Injection, InjectionOutcome, Injector, MultiInjection, SkipReason};
