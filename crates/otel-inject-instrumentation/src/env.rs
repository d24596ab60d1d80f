//! Environment variable merging
//!
//! Decides, for one desired variable, whether to add it, leave the owner's
//! value alone, or concatenate onto it. A variable whose value comes from a
//! `valueFrom` reference is never touched: the injection sequence treats it
//! as a conflict and gives up on the container.

use k8s_openapi::api::core::v1::{Container, EnvVar};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Separator used when concatenating onto an existing value
pub const ENV_VALUE_SEPARATOR: char = ':';

/// How a desired value interacts with one the container already defines
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergePolicy {
    /// Existing literal value wins
    #[default]
    Preserve,
    /// Append as `<existing>:<value>`, for search-path style variables
    Concatenate,
}

/// A variable that cannot be injected because the owner sources it by reference
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("container '{container}' defines env var '{env_var}' via valueFrom")]
pub struct EnvConflict {
    /// Name of the container being instrumented
    pub container: String,
    /// Name of the conflicting variable
    pub env_var: String,
}

/// Result of merging one desired variable into a container
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvMerge {
    /// The variable was absent and has been appended
    Added,
    /// A literal value already exists and was kept
    AlreadySet,
    /// The value was appended to the existing literal
    Concatenated,
    /// The existing entry uses `valueFrom`; nothing was changed
    Conflict(EnvConflict),
}

impl EnvMerge {
    /// Whether the desired value is in effect (everything except a conflict)
    pub fn is_applied(&self) -> bool {
        !matches!(self, Self::Conflict(_))
    }
}

/// Position of `name` in the container's env list, first occurrence wins
pub fn index_of_env(env: &[EnvVar], name: &str) -> Option<usize> {
    env.iter().position(|e| e.name == name)
}

/// Set `name` to `value` on the container according to `merge`.
///
/// The container is only mutated when the result is applied.
pub fn try_set_env_var(
    container: &mut Container,
    name: &str,
    value: &str,
    merge: MergePolicy,
) -> EnvMerge {
    let container_name = container.name.clone();
    let env = container.env.get_or_insert_with(Vec::new);

    let Some(idx) = index_of_env(env, name) else {
        env.push(EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            value_from: None,
        });
        return EnvMerge::Added;
    };

    let existing = &mut env[idx];
    if existing.value_from.is_some() {
        info!(
            env_var = %name,
            container = %container_name,
            "Skipping instrumentation injection, the container defines env var value via valueFrom"
        );
        return EnvMerge::Conflict(EnvConflict {
            container: container_name,
            env_var: name.to_string(),
        });
    }

    match merge {
        MergePolicy::Preserve => EnvMerge::AlreadySet,
        MergePolicy::Concatenate => {
            let current = existing.value.as_deref().unwrap_or_default();
            existing.value = Some(format!("{current}{ENV_VALUE_SEPARATOR}{value}"));
            EnvMerge::Concatenated
        }
    }
}

/// Append `env` unless the container already defines a variable of that name.
///
/// Used for user-declared variables, which rank below everything the owner
/// wrote and never cause the injection to fail. Returns whether it was added.
pub fn set_env_var_if_absent(container: &mut Container, env: &EnvVar) -> bool {
    let existing = container.env.get_or_insert_with(Vec::new);
    if index_of_env(existing, &env.name).is_some() {
        return false;
    }
    existing.push(env.clone());
    true
}
