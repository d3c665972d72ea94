use daprd_injector_base::consts::sidecar;
use json_patch::{Patch, jsonptr::PointerBuf};
use k8s_openapi::api::core::v1::{Container, Pod, VolumeMount};
use serde::Serialize;
use snafu::ResultExt;

use crate::{
    Defaults,
    config::Config,
    error::{self, Error},
    ext::PodExt,
    patch::{self, add_dapr_env_vars_to_containers, add_socket_volume_to_containers},
    sidecar::SidecarConfig,
};

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// The sidecar container and the patch that adds it to the pod.
#[derive(Clone, Debug, Serialize)]
pub struct Injection {
    pub container: Container,

    pub patch: Patch,
}

/// Decides whether a pod gets a sidecar and computes the patch that adds it.
#[derive(Clone, Debug, Default)]
pub struct Injector {
    config: Config,

    defaults: Defaults,
}

impl Injector {
    pub const fn new(config: Config, defaults: Defaults) -> Self { Self { config, defaults } }

    /// Computes the injection for `pod`.
    ///
    /// Returns `Ok(None)` when the pod did not opt in or already runs a
    /// sidecar. When a socket path is requested, the socket volume is added to
    /// `pod` as well as to the returned patch.
    ///
    /// # Errors
    ///
    /// Fails when the sidecar cannot be assembled or the patch values cannot
    /// be serialized.
    pub fn inject(&self, pod: &mut Pod) -> Result<Option<Injection>, Error> {
        let pod_name = pod.metadata.name.clone().unwrap_or_default();
        if !pod.injection_enabled() {
            tracing::debug!("Pod {pod_name} did not opt in to sidecar injection");
            return Ok(None);
        }
        if pod.has_container(sidecar::CONTAINER_NAME) {
            tracing::debug!("Pod {pod_name} already has a {} container", sidecar::CONTAINER_NAME);
            return Ok(None);
        }

        let mut operations = Vec::new();

        let had_volumes = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.volumes.as_ref())
            .is_some_and(|volumes| !volumes.is_empty());
        let socket_mount = pod.ensure_socket_volume();
        if socket_mount.is_some()
            && let Some(volume) =
                pod.spec.as_ref().and_then(|spec| spec.volumes.as_ref()).and_then(|v| v.first())
        {
            let operation = if had_volumes {
                patch::add(
                    pointer(&["spec", "volumes", "0"]),
                    to_value(volume, "socket volume")?,
                )
            } else {
                patch::add(pointer(&["spec", "volumes"]), to_value(&[volume], "socket volume")?)
            };
            operations.push(operation);
        }

        let mut container =
            self.sidecar_config(pod, socket_mount.clone()).build_container(&self.defaults)?;
        let extra_mounts = pod.extra_volume_mounts();
        if !extra_mounts.is_empty() {
            container.volume_mounts.get_or_insert_with(Vec::new).extend(extra_mounts);
        }

        operations.push(if pod.containers().is_empty() {
            patch::add(pointer(&["spec", "containers"]), to_value(&[&container], "sidecar")?)
        } else {
            patch::add(pointer(&["spec", "containers", "-"]), to_value(&container, "sidecar")?)
        });
        operations.extend(add_dapr_env_vars_to_containers(pod.containers(), &self.defaults));
        operations.extend(add_socket_volume_to_containers(pod.containers(), socket_mount.as_ref()));

        tracing::info!(
            "Injecting sidecar into pod {pod_name} with {} patch operations",
            operations.len()
        );
        Ok(Some(Injection { container, patch: Patch(operations) }))
    }

    fn sidecar_config(
        &self,
        pod: &Pod,
        socket_volume_mount: Option<VolumeMount>,
    ) -> SidecarConfig {
        let Config {
            sidecar_image,
            sidecar_image_pull_policy,
            mtls_enabled,
            ignore_entrypoint_tolerations,
            trust_anchors,
            cert_chain,
            cert_key,
            ..
        } = &self.config;
        let namespace = pod.metadata.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        let service_account = pod
            .spec
            .as_ref()
            .and_then(|spec| spec.service_account_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SERVICE_ACCOUNT);

        SidecarConfig {
            app_id: pod.app_id(),
            annotations: pod.annotations().clone(),
            sidecar_image: sidecar_image.clone(),
            image_pull_policy: *sidecar_image_pull_policy,
            namespace: namespace.to_string(),
            control_plane_address: self.config.control_plane_address(),
            placement_address: self.config.placement_address(),
            sentry_address: self.config.sentry_address(),
            mtls_enabled: *mtls_enabled,
            identity: format!("{namespace}:{service_account}"),
            trust_anchors: trust_anchors.clone(),
            cert_chain: cert_chain.clone(),
            cert_key: cert_key.clone(),
            socket_volume_mount,
            tolerations: pod.tolerations().to_vec(),
            ignore_entrypoint_tolerations: ignore_entrypoint_tolerations.clone(),
        }
    }
}

fn pointer(tokens: &[&str]) -> PointerBuf { PointerBuf::from_tokens(tokens.iter().copied()) }

fn to_value<T: Serialize>(value: &T, resource: &'static str) -> Result<serde_json::Value, Error> {
    serde_json::to_value(value).context(error::SerializePatchValueSnafu { resource })
}
