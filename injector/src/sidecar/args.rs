use std::collections::BTreeMap;

use daprd_injector_base::consts::k8s::annotations;

use crate::{Defaults, annotations::AnnotationsExt};

/// Settings passed to `daprd` on its command line, resolved from the pod
/// annotations with fallbacks to the injector configuration and defaults.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DaprdArgs {
    pub http_port: i32,
    pub api_grpc_port: i32,
    pub internal_grpc_port: i32,
    pub listen_addresses: String,
    pub public_port: i32,
    pub app_port: Option<i32>,
    pub app_id: String,
    pub control_plane_address: String,
    pub app_protocol: String,
    pub placement_address: String,
    pub config: String,
    pub log_level: String,
    pub max_concurrency: i32,
    pub sentry_address: String,
    pub metrics_enabled: bool,
    pub metrics_port: i32,
    pub http_max_request_size: i32,
    pub http_read_buffer_size: i32,
    pub graceful_shutdown_seconds: Option<u64>,
    pub api_logging: bool,
    pub disable_builtin_k8s_secret_store: bool,
    pub app_ssl: bool,
    pub profiling: bool,
    pub log_as_json: bool,
    pub mtls: bool,
}

/// Addresses and identity known to the injector rather than the pod.
#[derive(Clone, Copy, Debug)]
pub struct Endpoints<'a> {
    pub app_id: &'a str,
    pub control_plane_address: &'a str,
    pub placement_address: &'a str,
    pub sentry_address: &'a str,
    pub mtls_enabled: bool,
}

impl DaprdArgs {
    pub fn resolve(
        pod_annotations: &BTreeMap<String, String>,
        endpoints: Endpoints<'_>,
        defaults: &Defaults,
    ) -> Self {
        let app_port = pod_annotations.int32(annotations::APP_PORT).filter(|port| *port > 0);
        // Present-but-empty still overrides: it disables placement.
        let placement_address = pod_annotations
            .string(annotations::PLACEMENT_HOST_ADDRESS)
            .unwrap_or(endpoints.placement_address)
            .to_string();
        let graceful_shutdown_seconds = pod_annotations
            .duration_secs(annotations::GRACEFUL_SHUTDOWN_SECONDS)
            .map(|duration| duration.as_secs());

        Self {
            http_port: defaults.http_port,
            api_grpc_port: defaults.api_grpc_port,
            internal_grpc_port: defaults.internal_grpc_port,
            listen_addresses: pod_annotations
                .string_or(annotations::LISTEN_ADDRESSES, &defaults.listen_addresses),
            public_port: defaults.public_port,
            app_port,
            app_id: endpoints.app_id.to_string(),
            control_plane_address: endpoints.control_plane_address.to_string(),
            app_protocol: pod_annotations.string_or(annotations::APP_PROTOCOL, &defaults.app_protocol),
            placement_address,
            config: pod_annotations.string_or(annotations::CONFIG, ""),
            log_level: pod_annotations.string_or(annotations::LOG_LEVEL, &defaults.log_level),
            max_concurrency: pod_annotations
                .int32_or(annotations::APP_MAX_CONCURRENCY, defaults.max_concurrency),
            sentry_address: endpoints.sentry_address.to_string(),
            metrics_enabled: pod_annotations.bool_or(annotations::ENABLE_METRICS, true),
            metrics_port: pod_annotations.int32_or(annotations::METRICS_PORT, defaults.metrics_port),
            http_max_request_size: pod_annotations
                .int32_or(annotations::HTTP_MAX_REQUEST_SIZE, defaults.http_max_request_size),
            http_read_buffer_size: pod_annotations
                .int32_or(annotations::HTTP_READ_BUFFER_SIZE, defaults.http_read_buffer_size),
            graceful_shutdown_seconds,
            api_logging: pod_annotations.bool_or(annotations::ENABLE_API_LOGGING, false),
            disable_builtin_k8s_secret_store: pod_annotations
                .bool_or(annotations::DISABLE_BUILTIN_K8S_SECRET_STORE, false),
            app_ssl: pod_annotations.bool_or(annotations::APP_SSL, false),
            profiling: pod_annotations.bool_or(annotations::ENABLE_PROFILING, false),
            log_as_json: pod_annotations.bool_or(annotations::LOG_AS_JSON, false),
            mtls: endpoints.mtls_enabled,
        }
    }

    /// The `daprd` command line, without the executable.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--mode".to_string(),
            "kubernetes".to_string(),
            "--dapr-http-port".to_string(),
            self.http_port.to_string(),
            "--dapr-grpc-port".to_string(),
            self.api_grpc_port.to_string(),
            "--dapr-internal-grpc-port".to_string(),
            self.internal_grpc_port.to_string(),
            "--dapr-listen-addresses".to_string(),
            self.listen_addresses.clone(),
            "--dapr-public-port".to_string(),
            self.public_port.to_string(),
            "--app-port".to_string(),
            self.app_port.as_ref().map(ToString::to_string).unwrap_or_default(),
            "--app-id".to_string(),
            self.app_id.clone(),
            "--control-plane-address".to_string(),
            self.control_plane_address.clone(),
            "--app-protocol".to_string(),
            self.app_protocol.clone(),
            "--placement-host-address".to_string(),
            self.placement_address.clone(),
            "--config".to_string(),
            self.config.clone(),
            "--log-level".to_string(),
            self.log_level.clone(),
            "--app-max-concurrency".to_string(),
            self.max_concurrency.to_string(),
            "--sentry-address".to_string(),
            self.sentry_address.clone(),
            format!("--enable-metrics={}", self.metrics_enabled),
            "--metrics-port".to_string(),
            self.metrics_port.to_string(),
            "--dapr-http-max-request-size".to_string(),
            self.http_max_request_size.to_string(),
            "--dapr-http-read-buffer-size".to_string(),
            self.http_read_buffer_size.to_string(),
            "--dapr-graceful-shutdown-seconds".to_string(),
            self.graceful_shutdown_seconds.map_or_else(|| "-1".to_string(), |secs| secs.to_string()),
            format!("--enable-api-logging={}", self.api_logging),
            format!("--disable-builtin-k8s-secret-store={}", self.disable_builtin_k8s_secret_store),
        ];

        args.extend(
            [
                (self.app_ssl, "--app-ssl"),
                (self.profiling, "--enable-profiling"),
                (self.log_as_json, "--log-as-json"),
                (self.mtls, "--enable-mtls"),
            ]
            .into_iter()
            .filter_map(|(enabled, flag)| enabled.then(|| flag.to_string())),
        );
        args
    }
}
