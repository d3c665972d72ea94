use daprd_injector_base::consts::{env, sidecar};
use k8s_openapi::api::core::v1::EnvVar;

use crate::probe::ProbeTimings;

/// Values used when neither an annotation nor the injector configuration
/// provides a setting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Defaults {
    pub sidecar_image: String,

    pub daprd_path: String,

    pub debugger_path: String,

    pub http_port: i32,

    pub public_port: i32,

    pub api_grpc_port: i32,

    pub internal_grpc_port: i32,

    pub metrics_port: i32,

    pub debug_port: i32,

    pub listen_addresses: String,

    pub log_level: String,

    pub app_protocol: String,

    pub max_concurrency: i32,

    pub http_max_request_size: i32,

    pub http_read_buffer_size: i32,

    /// Path segments of the sidecar health endpoint.
    pub health_path: Vec<String>,

    pub liveness_probe: ProbeTimings,

    pub readiness_probe: ProbeTimings,
}

impl Default for Defaults {
    fn default() -> Self {
        let probe = ProbeTimings {
            initial_delay_seconds: sidecar::PROBE_INITIAL_DELAY_SECONDS,
            timeout_seconds: sidecar::PROBE_TIMEOUT_SECONDS,
            period_seconds: sidecar::PROBE_PERIOD_SECONDS,
            failure_threshold: sidecar::PROBE_FAILURE_THRESHOLD,
        };
        Self {
            sidecar_image: sidecar::DEFAULT_IMAGE.to_string(),
            daprd_path: sidecar::DAPRD_PATH.to_string(),
            debugger_path: sidecar::DEBUGGER_PATH.to_string(),
            http_port: sidecar::HTTP_PORT,
            public_port: sidecar::PUBLIC_PORT,
            api_grpc_port: sidecar::API_GRPC_PORT,
            internal_grpc_port: sidecar::INTERNAL_GRPC_PORT,
            metrics_port: sidecar::METRICS_PORT,
            debug_port: sidecar::DEBUG_PORT,
            listen_addresses: sidecar::LISTEN_ADDRESSES.to_string(),
            log_level: sidecar::LOG_LEVEL.to_string(),
            app_protocol: sidecar::APP_PROTOCOL.to_string(),
            max_concurrency: sidecar::UNLIMITED,
            http_max_request_size: sidecar::UNLIMITED,
            http_read_buffer_size: sidecar::UNLIMITED,
            health_path: vec![sidecar::API_VERSION.to_string(), sidecar::HEALTHZ_PATH.to_string()],
            liveness_probe: probe,
            readiness_probe: probe,
        }
    }
}

impl Defaults {
    /// Variables telling application containers where to reach the sidecar.
    pub fn user_container_env(&self) -> Vec<EnvVar> {
        [
            (env::USER_CONTAINER_HTTP_PORT, self.http_port),
            (env::USER_CONTAINER_GRPC_PORT, self.api_grpc_port),
        ]
        .into_iter()
        .map(|(name, port)| EnvVar {
            name: name.to_string(),
            value: Some(port.to_string()),
            ..EnvVar::default()
        })
        .collect()
    }
}
