pub mod k8s {
    pub mod annotations {
        //! Pod annotations understood by the injector.

        pub const ENABLED: &str = "dapr.io/enabled";
        pub const APP_ID: &str = "dapr.io/app-id";
        pub const APP_PORT: &str = "dapr.io/app-port";
        pub const APP_PROTOCOL: &str = "dapr.io/app-protocol";
        pub const APP_SSL: &str = "dapr.io/app-ssl";
        pub const CONFIG: &str = "dapr.io/config";
        pub const LOG_LEVEL: &str = "dapr.io/log-level";
        pub const LOG_AS_JSON: &str = "dapr.io/log-as-json";
        pub const API_TOKEN_SECRET: &str = "dapr.io/api-token-secret";
        pub const APP_TOKEN_SECRET: &str = "dapr.io/app-token-secret";
        pub const ENABLE_METRICS: &str = "dapr.io/enable-metrics";
        pub const METRICS_PORT: &str = "dapr.io/metrics-port";
        pub const ENABLE_DEBUG: &str = "dapr.io/enable-debug";
        pub const DEBUG_PORT: &str = "dapr.io/debug-port";
        pub const ENABLE_PROFILING: &str = "dapr.io/enable-profiling";
        pub const ENABLE_API_LOGGING: &str = "dapr.io/enable-api-logging";
        pub const APP_MAX_CONCURRENCY: &str = "dapr.io/app-max-concurrency";
        pub const HTTP_MAX_REQUEST_SIZE: &str = "dapr.io/http-max-request-size";
        pub const HTTP_READ_BUFFER_SIZE: &str = "dapr.io/http-read-buffer-size";
        pub const GRACEFUL_SHUTDOWN_SECONDS: &str = "dapr.io/graceful-shutdown-seconds";
        pub const PLACEMENT_HOST_ADDRESS: &str = "dapr.io/placement-host-address";
        pub const LISTEN_ADDRESSES: &str = "dapr.io/sidecar-listen-addresses";
        pub const DISABLE_BUILTIN_K8S_SECRET_STORE: &str =
            "dapr.io/disable-builtin-k8s-secret-store";
        pub const SIDECAR_IMAGE: &str = "dapr.io/sidecar-image";
        pub const SIDECAR_IMAGE_PULL_POLICY: &str = "dapr.io/sidecar-image-pull-policy";
        pub const SIDECAR_RUN_AS_NON_ROOT: &str = "dapr.io/sidecar-run-as-non-root";
        pub const ENV: &str = "dapr.io/env";
        pub const UNIX_DOMAIN_SOCKET_PATH: &str = "dapr.io/unix-domain-socket-path";
        pub const VOLUME_MOUNTS_READ_ONLY: &str = "dapr.io/volume-mounts";
        pub const VOLUME_MOUNTS_READ_WRITE: &str = "dapr.io/volume-mounts-rw";

        pub const CPU_LIMIT: &str = "dapr.io/sidecar-cpu-limit";
        pub const MEMORY_LIMIT: &str = "dapr.io/sidecar-memory-limit";
        pub const CPU_REQUEST: &str = "dapr.io/sidecar-cpu-request";
        pub const MEMORY_REQUEST: &str = "dapr.io/sidecar-memory-request";

        pub const LIVENESS_PROBE_DELAY_SECONDS: &str =
            "dapr.io/sidecar-liveness-probe-delay-seconds";
        pub const LIVENESS_PROBE_TIMEOUT_SECONDS: &str =
            "dapr.io/sidecar-liveness-probe-timeout-seconds";
        pub const LIVENESS_PROBE_PERIOD_SECONDS: &str =
            "dapr.io/sidecar-liveness-probe-period-seconds";
        pub const LIVENESS_PROBE_THRESHOLD: &str = "dapr.io/sidecar-liveness-probe-threshold";
        pub const READINESS_PROBE_DELAY_SECONDS: &str =
            "dapr.io/sidecar-readiness-probe-delay-seconds";
        pub const READINESS_PROBE_TIMEOUT_SECONDS: &str =
            "dapr.io/sidecar-readiness-probe-timeout-seconds";
        pub const READINESS_PROBE_PERIOD_SECONDS: &str =
            "dapr.io/sidecar-readiness-probe-period-seconds";
        pub const READINESS_PROBE_THRESHOLD: &str = "dapr.io/sidecar-readiness-probe-threshold";
    }
}

pub mod sidecar {
    //! Built-in defaults for the injected `daprd` container.

    pub const CONTAINER_NAME: &str = "daprd";
    pub const DEFAULT_IMAGE: &str = "docker.io/daprio/daprd:latest";

    pub const DAPRD_PATH: &str = "/daprd";
    pub const DEBUGGER_PATH: &str = "/dlv";

    pub const HTTP_PORT: i32 = 3500;
    pub const PUBLIC_PORT: i32 = 3501;
    pub const API_GRPC_PORT: i32 = 50001;
    pub const INTERNAL_GRPC_PORT: i32 = 50002;
    pub const METRICS_PORT: i32 = 9090;
    pub const DEBUG_PORT: i32 = 40000;

    pub const HTTP_PORT_NAME: &str = "dapr-http";
    pub const API_GRPC_PORT_NAME: &str = "dapr-grpc";
    pub const INTERNAL_GRPC_PORT_NAME: &str = "dapr-internal";
    pub const METRICS_PORT_NAME: &str = "dapr-metrics";
    pub const DEBUG_PORT_NAME: &str = "dapr-debug";

    pub const LISTEN_ADDRESSES: &str = "[::1],127.0.0.1";
    pub const LOG_LEVEL: &str = "info";
    pub const APP_PROTOCOL: &str = "http";

    /// Marks a limit as unset; `daprd` applies its own default.
    pub const UNLIMITED: i32 = -1;

    pub const API_VERSION: &str = "v1.0";
    pub const HEALTHZ_PATH: &str = "healthz";

    pub const PROBE_INITIAL_DELAY_SECONDS: i32 = 3;
    pub const PROBE_TIMEOUT_SECONDS: i32 = 3;
    pub const PROBE_PERIOD_SECONDS: i32 = 6;
    pub const PROBE_FAILURE_THRESHOLD: i32 = 3;

    pub const UNIX_DOMAIN_SOCKET_VOLUME: &str = "dapr-unix-domain-socket";
    pub const API_TOKEN_SECRET_KEY: &str = "token";
    pub const WINDOWS_ADMINISTRATOR_USER: &str = "ContainerAdministrator";
}

pub mod env {
    //! Environment variable names shared with the injected containers.

    pub const NAMESPACE: &str = "NAMESPACE";
    pub const POD_NAME: &str = "POD_NAME";
    pub const TRUST_ANCHORS: &str = "DAPR_TRUST_ANCHORS";
    pub const CERT_CHAIN: &str = "DAPR_CERT_CHAIN";
    pub const CERT_KEY: &str = "DAPR_CERT_KEY";
    pub const SENTRY_LOCAL_IDENTITY: &str = "SENTRY_LOCAL_IDENTITY";
    pub const API_TOKEN: &str = "DAPR_API_TOKEN";
    pub const APP_API_TOKEN: &str = "APP_API_TOKEN";

    pub const USER_CONTAINER_HTTP_PORT: &str = "DAPR_HTTP_PORT";
    pub const USER_CONTAINER_GRPC_PORT: &str = "DAPR_GRPC_PORT";

    /// Presence of this variable in the user supplied sidecar environment
    /// marks a Windows node that needs the administrator user.
    pub const SSL_CERT_DIR: &str = "SSL_CERT_DIR";
}

pub mod control_plane {
    pub const NAMESPACE: &str = "dapr-system";
    pub const CLUSTER_DOMAIN: &str = "cluster.local";

    pub const API_SERVICE: &str = "dapr-api";
    pub const API_PORT: u16 = 80;
    pub const PLACEMENT_SERVICE: &str = "dapr-placement-server";
    pub const PLACEMENT_PORT: u16 = 50005;
    pub const SENTRY_SERVICE: &str = "dapr-sentry";
    pub const SENTRY_PORT: u16 = 80;
}
