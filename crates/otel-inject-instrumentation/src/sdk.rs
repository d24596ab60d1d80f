//! Agent injection into a Pod
//!
//! [`Injector`] applies one runtime profile to one container of a Pod:
//!
//! 1. User-declared variables from the [`RuntimeInjectionSpec`] are added
//!    where the container has none.
//! 2. The profile's required variables are merged in order. The first
//!    conflict abandons the container and the Pod is handed back untouched.
//! 3. The shared volume is mounted into the container, and declared on the
//!    Pod unless a volume of that name already exists.
//! 4. If the Pod has no init container staging the agent payload yet, it is
//!    added and the Pod is annotated as provisioned. Only the init container
//!    decides this; the annotation is a marker for humans and other tooling.
//!
//! Injection never fails the admission: every skip is reported as an
//! [`InjectionOutcome`] and the Pod is admitted as-is.
//!
//! Calls for several containers of the same Pod must run one after another
//! on the Pod returned by the previous call. [`Injector::inject_containers`]
//! does exactly that.

use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, Pod, PodSpec, Volume, VolumeMount,
};
use tracing::{debug, info, warn};

use crate::config::RuntimeInjectionSpec;
use crate::env::{set_env_var_if_absent, try_set_env_var, EnvConflict, EnvMerge};
use crate::runtime::RuntimeProfile;

/// Mount path of the shared volume in every instrumented container
pub const INSTRUMENTATION_MOUNT_PATH: &str = "/otel-auto-instrumentation";

/// Name of the shared `emptyDir` volume
pub const INSTRUMENTATION_VOLUME_NAME: &str = "opentelemetry-auto-instrumentation";

/// Name of the init container that stages the agent payload
pub const INSTRUMENTATION_INIT_CONTAINER_NAME: &str = "opentelemetry-auto-instrumentation";

/// Annotation set on a Pod when the init container is added
pub const PROVISIONED_ANNOTATION: &str =
    "instrumentation.opentelemetry.io/auto-instrumentation-provisioned";

/// Why a container was left uninstrumented
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// A required variable is sourced via `valueFrom`
    Conflict(EnvConflict),
    /// The Pod has no container at the requested index
    ContainerNotFound {
        /// Requested index
        index: usize,
    },
}

/// What happened to one container
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InjectionOutcome {
    /// The agent was injected
    Injected {
        /// Instrumented container
        container: String,
        /// Whether this call added the init container
        provisioned: bool,
    },
    /// The container was left as it was
    Skipped(SkipReason),
}

impl InjectionOutcome {
    /// Whether the container was instrumented
    pub fn is_injected(&self) -> bool {
        matches!(self, Self::Injected { .. })
    }

    /// The conflicting variable, when a conflict caused the skip
    pub fn conflict(&self) -> Option<&EnvConflict> {
        match self {
            Self::Skipped(SkipReason::Conflict(c)) => Some(c),
            _ => None,
        }
    }
}

/// A Pod after one injection attempt
#[derive(Clone, Debug)]
pub struct Injection {
    /// Resulting Pod
    pub pod: Pod,
    /// What happened
    pub outcome: InjectionOutcome,
}

/// A Pod after injecting several containers in sequence
#[derive(Clone, Debug)]
pub struct MultiInjection {
    /// Resulting Pod
    pub pod: Pod,
    /// One outcome per requested index, in request order
    pub outcomes: Vec<InjectionOutcome>,
}

/// Applies one runtime profile with its injection input
#[derive(Clone, Copy, Debug)]
pub struct Injector<'a> {
    profile: &'a RuntimeProfile,
    spec: &'a RuntimeInjectionSpec,
}

impl<'a> Injector<'a> {
    /// Create an injector for a runtime profile and its injection input
    pub fn new(profile: &'a RuntimeProfile, spec: &'a RuntimeInjectionSpec) -> Self {
        Self { profile, spec }
    }

    /// Inject the agent into the container at `index`.
    ///
    /// On any skip the returned Pod is the input Pod, unchanged.
    pub fn inject(&self, mut pod: Pod, index: usize) -> Injection {
        let runtime = self.profile.name.as_str();

        let Some(mut container) = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.containers.get(index))
            .cloned()
        else {
            warn!(
                runtime,
                index,
                pod = ?pod.metadata.name,
                "No container at index, skipping instrumentation injection"
            );
            return Injection {
                pod,
                outcome: InjectionOutcome::Skipped(SkipReason::ContainerNotFound { index }),
            };
        };

        for env in &self.spec.env {
            set_env_var_if_absent(&mut container, env);
        }

        for required in &self.profile.env {
            let merged = try_set_env_var(
                &mut container,
                &required.name,
                &required.value,
                required.merge,
            );
            if let EnvMerge::Conflict(conflict) = merged {
                info!(
                    runtime,
                    container = %conflict.container,
                    env_var = %conflict.env_var,
                    "Instrumentation injection skipped"
                );
                return Injection {
                    pod,
                    outcome: InjectionOutcome::Skipped(SkipReason::Conflict(conflict)),
                };
            }
        }

        let mounts = container.volume_mounts.get_or_insert_with(Vec::new);
        if !mounts.iter().any(is_shared_mount) {
            mounts.push(shared_volume_mount());
        }

        let container_name = container.name.clone();
        ensure_shared_volume(&mut pod);
        let provisions_now = !is_provisioned(&pod);
        if provisions_now {
            self.provision(&mut pod);
        }

        if let Some(slot) = pod
            .spec
            .as_mut()
            .and_then(|spec| spec.containers.get_mut(index))
        {
            *slot = container;
        }

        info!(
            runtime,
            container = %container_name,
            provisioned = provisions_now,
            "Injected instrumentation agent"
        );

        Injection {
            pod,
            outcome: InjectionOutcome::Injected {
                container: container_name,
                provisioned: provisions_now,
            },
        }
    }

    /// Inject the agent into each container index in order.
    ///
    /// A skipped container does not stop the remaining ones.
    pub fn inject_containers(&self, pod: Pod, indices: &[usize]) -> MultiInjection {
        let mut pod = pod;
        let mut outcomes = Vec::with_capacity(indices.len());
        for &index in indices {
            let injection = self.inject(pod, index);
            pod = injection.pod;
            outcomes.push(injection.outcome);
        }
        MultiInjection { pod, outcomes }
    }

    fn provision(&self, pod: &mut Pod) {
        pod.spec
            .get_or_insert_with(PodSpec::default)
            .init_containers
            .get_or_insert_with(Vec::new)
            .push(self.init_container());

        pod.metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert(PROVISIONED_ANNOTATION.to_string(), "true".to_string());
    }

    fn init_container(&self) -> Container {
        let source = self.profile.payload_source_path.trim_end_matches('/');
        Container {
            name: INSTRUMENTATION_INIT_CONTAINER_NAME.to_string(),
            image: Some(self.spec.image.clone()),
            command: Some(vec![
                "cp".to_string(),
                "-a".to_string(),
                format!("{source}/."),
                format!("{INSTRUMENTATION_MOUNT_PATH}/"),
            ]),
            volume_mounts: Some(vec![shared_volume_mount()]),
            ..Default::default()
        }
    }
}

/// Whether the Pod already has the init container that stages the payload.
///
/// The provisioning annotation is not consulted: it survives copying a Pod
/// manifest into a template, the init container does not.
pub fn is_provisioned(pod: &Pod) -> bool {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.init_containers.as_ref())
        .is_some_and(|inits| {
            inits
                .iter()
                .any(|c| c.name == INSTRUMENTATION_INIT_CONTAINER_NAME)
        })
}

// The mount added to the container must always resolve to a Pod volume.
fn ensure_shared_volume(pod: &mut Pod) {
    let volumes = pod
        .spec
        .get_or_insert_with(PodSpec::default)
        .volumes
        .get_or_insert_with(Vec::new);

    if volumes.iter().any(|v| v.name == INSTRUMENTATION_VOLUME_NAME) {
        debug!(
            volume = INSTRUMENTATION_VOLUME_NAME,
            "Shared volume already declared, reusing it"
        );
        return;
    }

    volumes.push(Volume {
        name: INSTRUMENTATION_VOLUME_NAME.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Default::default()
    });
}

fn shared_volume_mount() -> VolumeMount {
    VolumeMount {
        name: INSTRUMENTATION_VOLUME_NAME.to_string(),
        mount_path: INSTRUMENTATION_MOUNT_PATH.to_string(),
        ..Default::default()
    }
}

fn is_shared_mount(mount: &VolumeMount) -> bool {
    mount.name == INSTRUMENTATION_VOLUME_NAME && mount.mount_path == INSTRUMENTATION_MOUNT_PATH
}
