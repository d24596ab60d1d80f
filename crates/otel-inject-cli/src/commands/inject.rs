//! `otel-inject inject` - run the injector over a Pod manifest
//!
//! Reads the instrumentation configuration and a Pod (YAML or JSON), injects
//! the selected runtime's agent into the named containers (all containers
//! when none are named) and prints the resulting Pod as JSON on stdout.
//! Per-container outcomes are logged; a skipped container is not an error.

use std::path::PathBuf;

use clap::Args;
use k8s_openapi::api::core::v1::Pod;
use otel_inject_common::yaml::from_yaml_str;
use otel_inject_common::CONFIG_PATH_ENV;
use otel_inject_instrumentation::{
    InjectionOutcome, Injector, InstrumentationConfig, MultiInjection, SkipReason,
};
use tracing::{info, warn};

use super::{load_config, read_file};
use crate::{Error, Result};

/// Arguments for the inject command
#[derive(Args, Debug)]
pub struct InjectArgs {
    /// Instrumentation configuration file (YAML or JSON)
    #[arg(long, env = CONFIG_PATH_ENV)]
    pub config: PathBuf,

    /// Pod manifest to mutate (YAML or JSON)
    #[arg(long)]
    pub pod: PathBuf,

    /// Runtime profile to inject
    #[arg(long, default_value = "dotnet")]
    pub runtime: String,

    /// Container to instrument; repeat for several, omit for all
    #[arg(long = "container")]
    pub containers: Vec<String>,
}

/// Run the inject command
pub fn run(args: InjectArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let pod: Pod = from_yaml_str(&read_file(&args.pod)?, "Pod")?;

    let injected = inject_pod(&config, pod, &args.runtime, &args.containers)?;
    report(&args.runtime, &injected.outcomes);

    println!("{}", serde_json::to_string_pretty(&injected.pod)?);
    Ok(())
}

/// Inject `runtime` into the named containers of `pod`.
///
/// An empty `containers` list selects every container in declaration order.
pub fn inject_pod(
    config: &InstrumentationConfig,
    pod: Pod,
    runtime: &str,
    containers: &[String],
) -> Result<MultiInjection> {
    let registry = config.registry()?;
    let profile = registry.get(runtime)?;
    let spec = config.runtime(runtime)?;

    let indices = resolve_container_indices(&pod, containers)?;
    Ok(Injector::new(profile, spec).inject_containers(pod, &indices))
}

/// Map container names to their index in the Pod's container list
pub fn resolve_container_indices(pod: &Pod, names: &[String]) -> Result<Vec<usize>> {
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .ok_or_else(|| Error::validation("pod has no spec"))?;

    if names.is_empty() {
        return Ok((0..containers.len()).collect());
    }

    names
        .iter()
        .map(|name| {
            containers
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| Error::ContainerNotFound { name: name.clone() })
        })
        .collect()
}

fn report(runtime: &str, outcomes: &[InjectionOutcome]) {
    for outcome in outcomes {
        match outcome {
            InjectionOutcome::Injected {
                container,
                provisioned,
            } => info!(runtime, container = %container, provisioned, "Container instrumented"),
            InjectionOutcome::Skipped(SkipReason::Conflict(conflict)) => warn!(
                runtime,
                container = %conflict.container,
                env_var = %conflict.env_var,
                "Container left uninstrumented: {}",
                conflict
            ),
            InjectionOutcome::Skipped(SkipReason::ContainerNotFound { index }) => {
                warn!(runtime, index, "Container left uninstrumented: no such container")
            }
        }
    }
}
