//! JSON patch operations that graft entries onto existing containers.
//!
//! Entries already present on a container always win: a desired entry that
//! conflicts with an existing one is skipped, never overwritten. Running the
//! same injection against an already patched pod therefore yields no
//! operations.

use json_patch::{AddOperation, PatchOperation, jsonptr::PointerBuf};
use k8s_openapi::api::core::v1::{Container, EnvVar, VolumeMount};
use serde::Serialize;
use serde_json::json;

use crate::Defaults;

/// Array-valued container field that the injector appends to.
pub trait PatchEntry: Clone + Serialize {
    /// JSON field name on the container.
    const FIELD: &'static str;

    /// Entries currently declared on `container`.
    fn existing(container: &Container) -> &[Self];

    /// Whether adding `self` would clash with `existing`.
    fn conflicts_with(&self, existing: &Self) -> bool;
}

impl PatchEntry for EnvVar {
    const FIELD: &'static str = "env";

    fn existing(container: &Container) -> &[Self] { container.env.as_deref().unwrap_or_default() }

    fn conflicts_with(&self, existing: &Self) -> bool { self.name == existing.name }
}

impl PatchEntry for VolumeMount {
    const FIELD: &'static str = "volumeMounts";

    fn existing(container: &Container) -> &[Self] {
        container.volume_mounts.as_deref().unwrap_or_default()
    }

    // The API server rejects two mounts at one path as well as two mounts of
    // one name.
    fn conflicts_with(&self, existing: &Self) -> bool {
        self.name == existing.name || self.mount_path == existing.mount_path
    }
}

/// How the surviving entries reach a container.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Emission {
    /// The field is absent or empty: add it as a whole array.
    CreateWhole,
    /// The field has elements: append one entry at a time.
    AppendEach,
}

impl Emission {
    const fn for_existing<T>(existing: &[T]) -> Self {
        if existing.is_empty() { Self::CreateWhole } else { Self::AppendEach }
    }
}

/// Desired entries that do not conflict with anything on `container`.
pub fn missing_entries<T: PatchEntry>(container: &Container, desired: &[T]) -> Vec<T> {
    let existing = T::existing(container);
    desired
        .iter()
        .filter(|entry| !existing.iter().any(|present| entry.conflicts_with(present)))
        .cloned()
        .collect()
}

/// Computes, per container index, the operations adding every entry of
/// `desired` that the container does not already have.
pub fn patch_missing<T: PatchEntry>(containers: &[Container], desired: &[T]) -> Vec<PatchOperation> {
    containers
        .iter()
        .enumerate()
        .flat_map(|(index, container)| {
            let missing = missing_entries(container, desired);
            if missing.is_empty() {
                return Vec::new();
            }
            let index = index.to_string();
            let pointer = |tail: &[&str]| {
                PointerBuf::from_tokens(
                    ["spec", "containers", index.as_str()].into_iter().chain(tail.iter().copied()),
                )
            };
            match Emission::for_existing(T::existing(container)) {
                Emission::CreateWhole => vec![add(pointer(&[T::FIELD]), json!(missing))],
                Emission::AppendEach => missing
                    .into_iter()
                    .map(|entry| add(pointer(&[T::FIELD, "-"]), json!(entry)))
                    .collect(),
            }
        })
        .collect()
}

pub(crate) const fn add(path: PointerBuf, value: serde_json::Value) -> PatchOperation {
    PatchOperation::Add(AddOperation { path, value })
}

/// Adds `DAPR_HTTP_PORT` and `DAPR_GRPC_PORT` to every application container
/// that does not declare them yet.
pub fn add_dapr_env_vars_to_containers(
    containers: &[Container],
    defaults: &Defaults,
) -> Vec<PatchOperation> {
    patch_missing(containers, &defaults.user_container_env())
}

/// Mounts the socket volume into every application container that has no
/// mount of that name or path yet.
pub fn add_socket_volume_to_containers(
    containers: &[Container],
    socket_mount: Option<&VolumeMount>,
) -> Vec<PatchOperation> {
    socket_mount.map_or_else(Vec::new, |mount| patch_missing(containers, std::slice::from_ref(mount)))
}

#[cfg(test)]
mod tests {
    use daprd_injector_base::consts::sidecar::UNIX_DOMAIN_SOCKET_VOLUME;
    use serde_json::Value;

    use super::*;

    fn env(name: &str, value: &str) -> EnvVar {
        EnvVar { name: name.to_string(), value: Some(value.to_string()), ..EnvVar::default() }
    }

    fn mount(name: &str, mount_path: &str) -> VolumeMount {
        VolumeMount {
            name: name.to_string(),
            mount_path: mount_path.to_string(),
            ..VolumeMount::default()
        }
    }

    fn container(env: Vec<EnvVar>, volume_mounts: Vec<VolumeMount>) -> Container {
        Container {
            name: "app".to_string(),
            env: (!env.is_empty()).then_some(env),
            volume_mounts: (!volume_mounts.is_empty()).then_some(volume_mounts),
            ..Container::default()
        }
    }

    fn to_json(ops: &[PatchOperation]) -> Value { serde_json::to_value(ops).expect("serializable") }

    #[test]
    fn test_add_dapr_env_vars_to_containers() {
        let defaults = Defaults::default();
        let cases = [
            (
                "empty environment vars",
                container(vec![], vec![]),
                json!([{
                    "op": "add",
                    "path": "/spec/containers/0/env",
                    "value": [
                        {"name": "DAPR_HTTP_PORT", "value": "3500"},
                        {"name": "DAPR_GRPC_PORT", "value": "50001"},
                    ],
                }]),
            ),
            (
                "existing env var",
                container(vec![env("TEST", "Existing value")], vec![]),
                json!([
                    {
                        "op": "add",
                        "path": "/spec/containers/0/env/-",
                        "value": {"name": "DAPR_HTTP_PORT", "value": "3500"},
                    },
                    {
                        "op": "add",
                        "path": "/spec/containers/0/env/-",
                        "value": {"name": "DAPR_GRPC_PORT", "value": "50001"},
                    },
                ]),
            ),
            (
                "existing conflicting env var",
                container(
                    vec![env("TEST", "Existing value"), env("DAPR_GRPC_PORT", "550000")],
                    vec![],
                ),
                json!([{
                    "op": "add",
                    "path": "/spec/containers/0/env/-",
                    "value": {"name": "DAPR_HTTP_PORT", "value": "3500"},
                }]),
            ),
            (
                "multiple existing conflicting env vars",
                container(
                    vec![env("DAPR_HTTP_PORT", "3510"), env("DAPR_GRPC_PORT", "550000")],
                    vec![],
                ),
                json!([]),
            ),
        ];

        for (name, container, expected) in cases {
            let ops = add_dapr_env_vars_to_containers(&[container], &defaults);
            assert_eq!(to_json(&ops), expected, "{name}");
        }
    }

    #[test]
    fn test_add_socket_volume_to_containers() {
        let socket = mount(UNIX_DOMAIN_SOCKET_VOLUME, "/tmp");
        let cases = [
            ("empty var, empty volume", container(vec![], vec![]), None, json!([])),
            (
                "existing var, empty volume",
                container(vec![], vec![]),
                Some(&socket),
                json!([{
                    "op": "add",
                    "path": "/spec/containers/0/volumeMounts",
                    "value": [{"name": UNIX_DOMAIN_SOCKET_VOLUME, "mountPath": "/tmp"}],
                }]),
            ),
            (
                "existing var, existing volume",
                container(vec![], vec![mount("mock1", "/mock1")]),
                Some(&socket),
                json!([{
                    "op": "add",
                    "path": "/spec/containers/0/volumeMounts/-",
                    "value": {"name": UNIX_DOMAIN_SOCKET_VOLUME, "mountPath": "/tmp"},
                }]),
            ),
            (
                "existing var, multiple existing volumes",
                container(vec![], vec![mount("mock1", "/mock1"), mount("mock2", "/mock2")]),
                Some(&socket),
                json!([{
                    "op": "add",
                    "path": "/spec/containers/0/volumeMounts/-",
                    "value": {"name": UNIX_DOMAIN_SOCKET_VOLUME, "mountPath": "/tmp"},
                }]),
            ),
            (
                "existing var, conflict volume name",
                container(vec![], vec![mount(UNIX_DOMAIN_SOCKET_VOLUME, "/elsewhere")]),
                Some(&socket),
                json!([]),
            ),
            (
                "existing var, conflict volume mount path",
                container(vec![], vec![mount("", "/tmp")]),
                Some(&socket),
                json!([]),
            ),
        ];

        for (name, container, socket_mount, expected) in cases {
            let ops = add_socket_volume_to_containers(&[container], socket_mount);
            assert_eq!(to_json(&ops), expected, "{name}");
        }
    }

    #[test]
    fn test_patch_is_per_container_index() {
        let containers = [
            container(vec![env("DAPR_HTTP_PORT", "1"), env("DAPR_GRPC_PORT", "2")], vec![]),
            container(vec![], vec![]),
        ];

        let ops = add_dapr_env_vars_to_containers(&containers, &Defaults::default());

        assert_eq!(
            to_json(&ops),
            json!([{
                "op": "add",
                "path": "/spec/containers/1/env",
                "value": [
                    {"name": "DAPR_HTTP_PORT", "value": "3500"},
                    {"name": "DAPR_GRPC_PORT", "value": "50001"},
                ],
            }])
        );
    }

    #[test]
    fn test_patch_missing_is_idempotent() {
        let desired = Defaults::default().user_container_env();
        let mut containers = [
            container(vec![], vec![]),
            container(vec![env("TEST", "x")], vec![]),
            container(vec![env("DAPR_GRPC_PORT", "1")], vec![]),
        ];

        assert!(!patch_missing(&containers, &desired).is_empty());

        for container in &mut containers {
            let missing = missing_entries(container, &desired);
            container.env.get_or_insert_with(Vec::new).extend(missing);
        }

        assert!(patch_missing(&containers, &desired).is_empty());
    }
}
