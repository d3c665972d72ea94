use std::collections::BTreeMap;

use daprd_injector_base::consts::{k8s::annotations, sidecar};
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, Pod, PodSpec, Toleration, Volume, VolumeMount,
};

use crate::annotations::AnnotationsExt;

static NO_ANNOTATIONS: BTreeMap<String, String> = BTreeMap::new();

pub trait PodExt {
    fn annotations(&self) -> &BTreeMap<String, String>;

    /// The `dapr.io/app-id` annotation, or the pod name without it.
    fn app_id(&self) -> String;

    /// Whether the pod opted in through `dapr.io/enabled`.
    fn injection_enabled(&self) -> bool;

    fn containers(&self) -> &[Container];

    fn has_container(&self, name: &str) -> bool;

    fn tolerations(&self) -> &[Toleration];

    fn has_volume(&self, name: &str) -> bool;

    /// Adds the socket volume requested by `dapr.io/unix-domain-socket-path`
    /// at the front of the pod volumes and returns its mount.
    ///
    /// Nothing changes when the annotation is absent or empty. The volume is
    /// inserted unconditionally otherwise, so callers invoke this at most
    /// once per pod.
    fn ensure_socket_volume(&mut self) -> Option<VolumeMount>;

    /// Resolves `dapr.io/volume-mounts` (read-only) followed by
    /// `dapr.io/volume-mounts-rw` (read-write). Pairs naming a volume the pod
    /// does not declare are dropped.
    fn extra_volume_mounts(&self) -> Vec<VolumeMount>;
}

impl PodExt for Pod {
    fn annotations(&self) -> &BTreeMap<String, String> {
        self.metadata.annotations.as_ref().unwrap_or(&NO_ANNOTATIONS)
    }

    fn app_id(&self) -> String {
        self.annotations()
            .string(annotations::APP_ID)
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
            .or_else(|| self.metadata.name.clone())
            .unwrap_or_default()
    }

    fn injection_enabled(&self) -> bool { self.annotations().bool_or(annotations::ENABLED, false) }

    fn containers(&self) -> &[Container] {
        self.spec.as_ref().map(|spec| spec.containers.as_slice()).unwrap_or_default()
    }

    fn has_container(&self, name: &str) -> bool {
        self.containers().iter().any(|container| container.name == name)
    }

    fn tolerations(&self) -> &[Toleration] {
        self.spec.as_ref().and_then(|spec| spec.tolerations.as_deref()).unwrap_or_default()
    }

    fn has_volume(&self, name: &str) -> bool {
        self.spec
            .as_ref()
            .and_then(|spec| spec.volumes.as_ref())
            .is_some_and(|volumes| volumes.iter().any(|volume| volume.name == name))
    }

    fn ensure_socket_volume(&mut self) -> Option<VolumeMount> {
        let mount_path = self
            .annotations()
            .string(annotations::UNIX_DOMAIN_SOCKET_PATH)
            .filter(|path| !path.is_empty())?
            .to_string();

        self.spec.get_or_insert_with(PodSpec::default).volumes.get_or_insert_with(Vec::new).insert(
            0,
            Volume {
                name: sidecar::UNIX_DOMAIN_SOCKET_VOLUME.to_string(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Volume::default()
            },
        );
        tracing::debug!("Added socket volume for {mount_path}");

        Some(VolumeMount {
            name: sidecar::UNIX_DOMAIN_SOCKET_VOLUME.to_string(),
            mount_path,
            ..VolumeMount::default()
        })
    }

    fn extra_volume_mounts(&self) -> Vec<VolumeMount> {
        let pod_annotations = self.annotations();
        [(annotations::VOLUME_MOUNTS_READ_ONLY, true), (annotations::VOLUME_MOUNTS_READ_WRITE, false)]
            .into_iter()
            .flat_map(|(key, read_only)| {
                pod_annotations.pairs(key, ':').into_iter().map(move |pair| (pair, read_only))
            })
            .filter(|((name, _), _)| {
                let declared = self.has_volume(name);
                if !declared {
                    tracing::warn!("Skipping volume mount for undeclared volume {name}");
                }
                declared
            })
            .map(|((name, mount_path), read_only)| VolumeMount {
                name,
                mount_path,
                read_only: Some(read_only),
                ..VolumeMount::default()
            })
            .collect()
    }
}
