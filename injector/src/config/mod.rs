mod error;
mod image_pull_policy;

use std::path::{Path, PathBuf};

use daprd_injector_base::consts::control_plane;
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

pub use self::{
    error::Error,
    image_pull_policy::{ImagePullPolicy, ParseImagePullPolicyError},
};

/// Injector settings shared by every pod it processes.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Sidecar image used when a pod does not override it; empty selects the
    /// built-in default.
    #[serde(default)]
    pub sidecar_image: String,

    #[serde(default)]
    pub sidecar_image_pull_policy: ImagePullPolicy,

    #[serde(default = "default_control_plane_namespace")]
    pub control_plane_namespace: String,

    #[serde(default = "default_kube_cluster_domain")]
    pub kube_cluster_domain: String,

    #[serde(default = "default_mtls_enabled")]
    pub mtls_enabled: bool,

    /// JSON list of `{key, effect}` tolerations whose nodes need an explicit
    /// sidecar command.
    #[serde(default)]
    pub ignore_entrypoint_tolerations: String,

    #[serde(default)]
    pub trust_anchors: String,

    #[serde(default)]
    pub cert_chain: String,

    #[serde(default)]
    pub cert_key: String,

    #[serde(default = "daprd_injector_cli::config::LogConfig::default")]
    pub log: daprd_injector_cli::config::LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sidecar_image: String::new(),
            sidecar_image_pull_policy: ImagePullPolicy::default(),
            control_plane_namespace: default_control_plane_namespace(),
            kube_cluster_domain: default_kube_cluster_domain(),
            mtls_enabled: default_mtls_enabled(),
            ignore_entrypoint_tolerations: String::new(),
            trust_anchors: String::new(),
            cert_chain: String::new(),
            cert_key: String::new(),
            log: daprd_injector_cli::config::LogConfig::default(),
        }
    }
}

impl Config {
    pub fn search_config_file_path() -> PathBuf {
        let paths = vec![Self::default_path()]
            .into_iter()
            .chain(daprd_injector_base::fallback_project_config_directories().into_iter().map(
                |mut path| {
                    path.push(daprd_injector_base::CLI_CONFIG_NAME);
                    path
                },
            ))
            .collect::<Vec<_>>();
        for path in paths {
            let Ok(exists) = path.try_exists() else {
                continue;
            };
            if exists {
                return path;
            }
        }
        Self::default_path()
    }

    #[inline]
    pub fn default_path() -> PathBuf {
        [
            daprd_injector_base::PROJECT_CONFIG_DIR.to_path_buf(),
            PathBuf::from(daprd_injector_base::CLI_CONFIG_NAME),
        ]
        .into_iter()
        .collect()
    }

    /// Reads the configuration at `path`, expanding `~` in it and in the log
    /// file path.
    ///
    /// # Errors
    ///
    /// Fails when a path cannot be resolved or the file cannot be read or
    /// parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut config: Self = {
            let path =
                path.as_ref().try_resolve().map(|path| path.to_path_buf()).with_context(|_| {
                    error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() }
                })?;
            let data =
                std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
            serde_yaml::from_slice(&data).context(error::ParseConfigSnafu { filename: path })?
        };

        config.log.file_path = config
            .log
            .file_path
            .map(|path| {
                path.try_resolve()
                    .map(|resolved| resolved.to_path_buf())
                    .with_context(|_| error::ResolveFilePathSnafu { file_path: path.clone() })
            })
            .transpose()?;

        Ok(config)
    }

    /// Renders the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Fails when serialization fails.
    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yaml::to_string(self).context(error::SerializeConfigSnafu)
    }

    fn service_address(&self, service: &str, port: u16) -> String {
        format!(
            "{service}.{namespace}.svc.{domain}:{port}",
            namespace = self.control_plane_namespace,
            domain = self.kube_cluster_domain
        )
    }

    /// Address of the control-plane API service.
    pub fn control_plane_address(&self) -> String {
        self.service_address(control_plane::API_SERVICE, control_plane::API_PORT)
    }

    pub fn placement_address(&self) -> String {
        self.service_address(control_plane::PLACEMENT_SERVICE, control_plane::PLACEMENT_PORT)
    }

    pub fn sentry_address(&self) -> String {
        self.service_address(control_plane::SENTRY_SERVICE, control_plane::SENTRY_PORT)
    }
}

fn default_control_plane_namespace() -> String { control_plane::NAMESPACE.to_string() }

fn default_kube_cluster_domain() -> String { control_plane::CLUSTER_DOMAIN.to_string() }

const fn default_mtls_enabled() -> bool { true }
