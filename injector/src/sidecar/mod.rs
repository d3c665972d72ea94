//! Assembly of the `daprd` sidecar container.
//!
//! Every setting resolves from the pod annotations first, then from the
//! injector configuration carried by [`SidecarConfig`], then from
//! [`Defaults`]. Malformed annotation values degrade to their fallback with a
//! warning; only an unparseable sidecar image annotation fails the build.

mod args;
mod entrypoint;
mod env;
mod error;
mod resources;

use std::collections::BTreeMap;

use daprd_injector_base::consts::{env::SSL_CERT_DIR, k8s::annotations, sidecar};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, SecurityContext, Toleration, VolumeMount,
    WindowsSecurityContextOptions,
};
use snafu::ResultExt;

pub use self::{
    args::{DaprdArgs, Endpoints},
    entrypoint::{Entrypoint, Invocation},
    env::{SidecarEnv, user_env},
    error::Error,
    resources::{InvalidQuantityError, parse_quantity, resource_requirements},
};
use crate::{
    Defaults, annotations::AnnotationsExt, config::ImagePullPolicy, image::ImageReference,
    probe::ProbeTimings, tolerations,
};

/// Everything the injector knows about the pod and the control plane when
/// building the sidecar.
#[derive(Clone, Debug, Default)]
pub struct SidecarConfig {
    pub app_id: String,

    pub annotations: BTreeMap<String, String>,

    /// Image from the injector configuration; empty selects the default.
    pub sidecar_image: String,

    pub image_pull_policy: ImagePullPolicy,

    pub namespace: String,

    pub control_plane_address: String,

    pub placement_address: String,

    pub sentry_address: String,

    pub mtls_enabled: bool,

    pub identity: String,

    pub trust_anchors: String,

    pub cert_chain: String,

    pub cert_key: String,

    pub socket_volume_mount: Option<VolumeMount>,

    pub tolerations: Vec<Toleration>,

    /// JSON list of tolerations that require an explicit container command.
    pub ignore_entrypoint_tolerations: String,
}

struct ProbeKeys {
    delay: &'static str,
    timeout: &'static str,
    period: &'static str,
    threshold: &'static str,
}

const LIVENESS_PROBE_KEYS: ProbeKeys = ProbeKeys {
    delay: annotations::LIVENESS_PROBE_DELAY_SECONDS,
    timeout: annotations::LIVENESS_PROBE_TIMEOUT_SECONDS,
    period: annotations::LIVENESS_PROBE_PERIOD_SECONDS,
    threshold: annotations::LIVENESS_PROBE_THRESHOLD,
};

const READINESS_PROBE_KEYS: ProbeKeys = ProbeKeys {
    delay: annotations::READINESS_PROBE_DELAY_SECONDS,
    timeout: annotations::READINESS_PROBE_TIMEOUT_SECONDS,
    period: annotations::READINESS_PROBE_PERIOD_SECONDS,
    threshold: annotations::READINESS_PROBE_THRESHOLD,
};

impl SidecarConfig {
    /// Builds the sidecar container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidImage`] when `dapr.io/sidecar-image` is not a
    /// valid image reference.
    pub fn build_container(&self, defaults: &Defaults) -> Result<Container, Error> {
        let image = self.image(defaults)?;
        let image_pull_policy = self.image_pull_policy();

        let daprd = DaprdArgs::resolve(&self.annotations, self.endpoints(), defaults);
        let invocation =
            Invocation { executable: defaults.daprd_path.clone(), args: daprd.to_args() };
        let debug_port = self
            .annotations
            .bool_or(annotations::ENABLE_DEBUG, false)
            .then(|| self.annotations.int32_or(annotations::DEBUG_PORT, defaults.debug_port));
        let invocation = match debug_port {
            Some(port) => invocation.under_debugger(&defaults.debugger_path, port),
            None => invocation,
        };
        let explicit = tolerations::requires_explicit_entrypoint(
            &self.tolerations,
            &self.ignore_entrypoint_tolerations,
        );
        let (command, args) = Entrypoint::new(invocation, explicit).into_container_fields();

        let user_env = user_env(&self.annotations);
        let windows_administrator = user_env.iter().any(|var| var.name == SSL_CERT_DIR);
        let env = self.sidecar_env().build(user_env);

        let health_path = defaults.health_path.iter().map(String::as_str).collect::<Vec<_>>();
        let handler = crate::probe::http_get(defaults.http_port, &health_path);
        let liveness = self.probe_timings(&LIVENESS_PROBE_KEYS, defaults.liveness_probe);
        let readiness = self.probe_timings(&READINESS_PROBE_KEYS, defaults.readiness_probe);

        let resources = resource_requirements(&self.annotations).unwrap_or_else(|err| {
            tracing::warn!("Ignoring sidecar resource requirements, error: {err}");
            None
        });

        tracing::debug!(
            "Built sidecar for app {} with image {image}, explicit command: {explicit}",
            self.app_id
        );

        Ok(Container {
            name: sidecar::CONTAINER_NAME.to_string(),
            image: Some(image),
            image_pull_policy: Some(image_pull_policy.to_string()),
            command,
            args: Some(args),
            env: Some(env),
            ports: Some(Self::ports(daprd.metrics_port, debug_port, defaults)),
            liveness_probe: Some(liveness.probe(handler.clone())),
            readiness_probe: Some(readiness.probe(handler)),
            security_context: Some(SecurityContext {
                allow_privilege_escalation: Some(false),
                run_as_non_root: Some(
                    self.annotations.bool_or(annotations::SIDECAR_RUN_AS_NON_ROOT, false),
                ),
                windows_options: windows_administrator.then(|| WindowsSecurityContextOptions {
                    run_as_user_name: Some(sidecar::WINDOWS_ADMINISTRATOR_USER.to_string()),
                    ..WindowsSecurityContextOptions::default()
                }),
                ..SecurityContext::default()
            }),
            resources,
            volume_mounts: self.socket_volume_mount.clone().map(|mount| vec![mount]),
            ..Container::default()
        })
    }

    fn image(&self, defaults: &Defaults) -> Result<String, Error> {
        if let Some(image) = self.annotations.string(annotations::SIDECAR_IMAGE)
            && !image.is_empty()
        {
            return image
                .parse::<ImageReference>()
                .map(|_| image.to_string())
                .context(error::InvalidImageSnafu { image });
        }
        if self.sidecar_image.is_empty() {
            Ok(defaults.sidecar_image.clone())
        } else {
            Ok(self.sidecar_image.clone())
        }
    }

    fn image_pull_policy(&self) -> ImagePullPolicy {
        self.annotations.string(annotations::SIDECAR_IMAGE_PULL_POLICY).map_or(
            self.image_pull_policy,
            |value| {
                value.parse().unwrap_or_else(|err| {
                    tracing::warn!("{err}, using {}", self.image_pull_policy);
                    self.image_pull_policy
                })
            },
        )
    }

    const fn endpoints(&self) -> Endpoints<'_> {
        Endpoints {
            app_id: self.app_id.as_str(),
            control_plane_address: self.control_plane_address.as_str(),
            placement_address: self.placement_address.as_str(),
            sentry_address: self.sentry_address.as_str(),
            mtls_enabled: self.mtls_enabled,
        }
    }

    fn sidecar_env(&self) -> SidecarEnv<'_> {
        let secret = |key: &'static str| self.annotations.string(key).filter(|name| !name.is_empty());
        SidecarEnv {
            namespace: &self.namespace,
            trust_anchors: &self.trust_anchors,
            cert_chain: &self.cert_chain,
            cert_key: &self.cert_key,
            identity: &self.identity,
            api_token_secret: secret(annotations::API_TOKEN_SECRET),
            app_token_secret: secret(annotations::APP_TOKEN_SECRET),
        }
    }

    fn probe_timings(&self, keys: &ProbeKeys, fallback: ProbeTimings) -> ProbeTimings {
        ProbeTimings {
            initial_delay_seconds: self
                .annotations
                .int32_or(keys.delay, fallback.initial_delay_seconds),
            timeout_seconds: self.annotations.int32_or(keys.timeout, fallback.timeout_seconds),
            period_seconds: self.annotations.int32_or(keys.period, fallback.period_seconds),
            failure_threshold: self
                .annotations
                .int32_or(keys.threshold, fallback.failure_threshold),
        }
    }

    fn ports(metrics_port: i32, debug_port: Option<i32>, defaults: &Defaults) -> Vec<ContainerPort> {
        [
            (sidecar::HTTP_PORT_NAME, defaults.http_port),
            (sidecar::API_GRPC_PORT_NAME, defaults.api_grpc_port),
            (sidecar::INTERNAL_GRPC_PORT_NAME, defaults.internal_grpc_port),
            (sidecar::METRICS_PORT_NAME, metrics_port),
        ]
        .into_iter()
        .chain(debug_port.map(|port| (sidecar::DEBUG_PORT_NAME, port)))
        .map(|(name, container_port)| ContainerPort {
            name: Some(name.to_string()),
            container_port,
            ..ContainerPort::default()
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::EnvVar;

    use super::*;

    const DEFAULT_TEST_CONFIG: &str = "config";
    const API_TOKEN_SECRET: &str = "secret";
    const APP_TOKEN_SECRET: &str = "appsecret";

    const BASE_ARGS: [&str; 42] = [
        "/daprd",
        "--mode",
        "kubernetes",
        "--dapr-http-port",
        "3500",
        "--dapr-grpc-port",
        "50001",
        "--dapr-internal-grpc-port",
        "50002",
        "--dapr-listen-addresses",
        "[::1],127.0.0.1",
        "--dapr-public-port",
        "3501",
        "--app-port",
        "",
        "--app-id",
        "app_id",
        "--control-plane-address",
        "controlplane:9000",
        "--app-protocol",
        "http",
        "--placement-host-address",
        "placement:50000",
        "--config",
        DEFAULT_TEST_CONFIG,
        "--log-level",
        "info",
        "--app-max-concurrency",
        "-1",
        "--sentry-address",
        "sentry:50000",
        "--enable-metrics=true",
        "--metrics-port",
        "9090",
        "--dapr-http-max-request-size",
        "-1",
        "--dapr-http-read-buffer-size",
        "-1",
        "--dapr-graceful-shutdown-seconds",
        "-1",
        "--enable-api-logging=false",
        "--disable-builtin-k8s-secret-store=false",
    ];

    /// The default argument list with flag values replaced by `overrides`
    /// and `extra` flags inserted before `--enable-mtls`.
    fn expected_args(overrides: &[(&str, &str)], extra: &[&str]) -> Vec<String> {
        let mut args = BASE_ARGS.map(ToString::to_string).to_vec();
        for (flag, value) in overrides {
            let prefix = format!("{flag}=");
            if let Some(idx) = args.iter().position(|arg| arg == flag) {
                args[idx + 1] = (*value).to_string();
            } else if let Some(idx) = args.iter().position(|arg| arg.starts_with(&prefix)) {
                args[idx] = format!("{prefix}{value}");
            }
        }
        args.extend(extra.iter().map(ToString::to_string));
        args.push("--enable-mtls".to_string());
        args
    }

    fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    fn config(pairs: &[(&str, &str)]) -> SidecarConfig {
        SidecarConfig {
            app_id: "app_id".to_string(),
            annotations: annotations(pairs),
            control_plane_address: "controlplane:9000".to_string(),
            placement_address: "placement:50000".to_string(),
            sentry_address: "sentry:50000".to_string(),
            mtls_enabled: true,
            ..SidecarConfig::default()
        }
    }

    fn full_config(extra: &[(&str, &str)]) -> SidecarConfig {
        let mut pairs = vec![
            (annotations::CONFIG, DEFAULT_TEST_CONFIG),
            (annotations::APP_PORT, "5000"),
            (annotations::LOG_AS_JSON, "true"),
            (annotations::API_TOKEN_SECRET, API_TOKEN_SECRET),
            (annotations::APP_TOKEN_SECRET, APP_TOKEN_SECRET),
        ];
        pairs.extend_from_slice(extra);
        SidecarConfig {
            sidecar_image: "daprio/dapr".to_string(),
            image_pull_policy: ImagePullPolicy::Always,
            namespace: "dapr-system".to_string(),
            identity: "pod_identity".to_string(),
            ..config(&pairs)
        }
    }

    fn build(config: &SidecarConfig) -> Container {
        config.build_container(&Defaults::default()).expect("sidecar container")
    }

    fn env(container: &Container) -> &[EnvVar] { container.env.as_deref().unwrap_or_default() }

    #[test]
    fn test_sidecar_container_without_debugging() {
        let container = build(&full_config(&[]));

        assert_eq!(container.command, None);
        assert_eq!(
            container.args,
            Some(expected_args(&[("--app-port", "5000")], &["--log-as-json"]))
        );
        assert_eq!(container.image.as_deref(), Some("daprio/dapr"));
        assert_eq!(container.image_pull_policy.as_deref(), Some("Always"));

        let env = env(&container);
        assert_eq!(env[0].value.as_deref(), Some("dapr-system"));
        assert_eq!(
            env[1].value_from.as_ref().and_then(|s| s.field_ref.as_ref()).map(|f| f.field_path.as_str()),
            Some("metadata.name")
        );
        assert_eq!(
            env[6].value_from.as_ref().and_then(|s| s.secret_key_ref.as_ref()).map(|s| s.name.as_str()),
            Some(API_TOKEN_SECRET)
        );
        assert_eq!(
            env[7].value_from.as_ref().and_then(|s| s.secret_key_ref.as_ref()).map(|s| s.name.as_str()),
            Some(APP_TOKEN_SECRET)
        );
    }

    #[test]
    fn test_sidecar_container_with_debugging() {
        let container = build(&full_config(&[
            (annotations::ENABLE_DEBUG, "true"),
            (annotations::DEBUG_PORT, "55555"),
        ]));

        let mut expected = [
            "/dlv",
            "--listen=:55555",
            "--accept-multiclient",
            "--headless=true",
            "--log",
            "--api-version=2",
            "exec",
        ]
        .map(ToString::to_string)
        .to_vec();
        let daprd = expected_args(&[("--app-port", "5000")], &["--log-as-json"]);
        expected.push(daprd[0].clone());
        expected.push("--".to_string());
        expected.extend(daprd.into_iter().skip(1));

        assert_eq!(container.args, Some(expected));
        let ports = container.ports.unwrap_or_default();
        assert!(
            ports
                .iter()
                .any(|port| port.name.as_deref() == Some("dapr-debug") && port.container_port == 55555)
        );
    }

    #[test]
    fn test_sidecar_container_with_empty_placement_address() {
        let container = build(&full_config(&[
            (annotations::ENABLE_DEBUG, "true"),
            (annotations::PLACEMENT_HOST_ADDRESS, ""),
        ]));

        let args = container.args.unwrap_or_default();
        assert_eq!(args[1], "--listen=:40000");
        let idx = args.iter().position(|arg| arg == "--placement-host-address");
        assert_eq!(idx.map(|idx| args[idx + 1].as_str()), Some(""));
    }

    #[test]
    fn test_sidecar_container_with_listen_addresses() {
        let container = build(&config(&[
            (annotations::CONFIG, DEFAULT_TEST_CONFIG),
            (annotations::LISTEN_ADDRESSES, "1.2.3.4,::1"),
        ]));

        assert_eq!(
            container.args,
            Some(expected_args(&[("--dapr-listen-addresses", "1.2.3.4,::1")], &[]))
        );
    }

    #[test]
    fn test_graceful_shutdown_seconds() {
        let cases = [("invalid", "-1"), ("5", "5")];

        for (annotation, expected) in cases {
            let container = build(&config(&[
                (annotations::CONFIG, DEFAULT_TEST_CONFIG),
                (annotations::GRACEFUL_SHUTDOWN_SECONDS, annotation),
            ]));
            assert_eq!(
                container.args,
                Some(expected_args(&[("--dapr-graceful-shutdown-seconds", expected)], &[])),
                "{annotation}"
            );
        }
    }

    #[test]
    fn test_disable_builtin_k8s_secret_store() {
        let container = build(&config(&[
            (annotations::CONFIG, DEFAULT_TEST_CONFIG),
            (annotations::DISABLE_BUILTIN_K8S_SECRET_STORE, "true"),
        ]));

        assert_eq!(
            container.args,
            Some(expected_args(&[("--disable-builtin-k8s-secret-store", "true")], &[]))
        );
    }

    #[test]
    fn test_override_image() {
        let config = SidecarConfig {
            sidecar_image: "daprio/dapr".to_string(),
            annotations: annotations(&[(annotations::SIDECAR_IMAGE, "daprio/override")]),
            ..SidecarConfig::default()
        };

        assert_eq!(build(&config).image.as_deref(), Some("daprio/override"));
    }

    #[test]
    fn test_default_image() {
        let container = build(&SidecarConfig::default());

        assert_eq!(container.image.as_deref(), Some(sidecar::DEFAULT_IMAGE));
        assert_eq!(container.image_pull_policy.as_deref(), Some("IfNotPresent"));
    }

    #[test]
    fn test_invalid_image_annotation_fails() {
        let config = SidecarConfig {
            annotations: annotations(&[(annotations::SIDECAR_IMAGE, "Not An Image")]),
            ..SidecarConfig::default()
        };

        assert!(matches!(
            config.build_container(&Defaults::default()),
            Err(Error::InvalidImage { .. })
        ));
    }

    #[test]
    fn test_image_pull_policy_annotation() {
        let with = |value: &str| {
            let config = SidecarConfig {
                annotations: annotations(&[(annotations::SIDECAR_IMAGE_PULL_POLICY, value)]),
                image_pull_policy: ImagePullPolicy::Never,
                ..SidecarConfig::default()
            };
            build(&config).image_pull_policy
        };

        assert_eq!(with("Always").as_deref(), Some("Always"));
        assert_eq!(with("sometimes").as_deref(), Some("Never"));
    }

    #[test]
    fn test_socket_volume_mount() {
        assert_eq!(build(&SidecarConfig::default()).volume_mounts, None);

        let mount = VolumeMount {
            name: sidecar::UNIX_DOMAIN_SOCKET_VOLUME.to_string(),
            mount_path: "/tmp".to_string(),
            ..VolumeMount::default()
        };
        let config = SidecarConfig {
            annotations: annotations(&[(annotations::UNIX_DOMAIN_SOCKET_PATH, "/tmp")]),
            socket_volume_mount: Some(mount.clone()),
            ..SidecarConfig::default()
        };

        assert_eq!(build(&config).volume_mounts, Some(vec![mount]));
    }

    #[test]
    fn test_windows_user() {
        let cases = [
            ("SSL_CERT_DIR=/tmp/certificates", true),
            ("SSL_CERT_FILE=/tmp/certificates/cert.pem", false),
        ];

        for (env, administrator) in cases {
            let config = SidecarConfig {
                annotations: annotations(&[(annotations::ENV, env)]),
                ..SidecarConfig::default()
            };
            let security_context = build(&config).security_context.unwrap_or_default();
            let user = security_context.windows_options.and_then(|options| options.run_as_user_name);

            if administrator {
                assert_eq!(user.as_deref(), Some("ContainerAdministrator"), "{env}");
            } else {
                assert_eq!(user, None, "{env}");
            }
            assert_eq!(security_context.allow_privilege_escalation, Some(false));
        }
    }

    #[test]
    fn test_user_env_follows_sidecar_env() {
        let config = SidecarConfig {
            annotations: annotations(&[(annotations::ENV, "HELLO=world")]),
            ..SidecarConfig::default()
        };
        let container = build(&config);
        let last = env(&container).last().map(|var| (var.name.as_str(), var.value.as_deref()));

        assert_eq!(last, Some(("HELLO", Some("world"))));
        assert_eq!(env(&container).len(), 7);
    }

    #[test]
    fn test_command_follows_entrypoint_tolerations() {
        let toleration = |key: &str| Toleration {
            key: Some(key.to_string()),
            effect: Some("NoSchedule".to_string()),
            ..Toleration::default()
        };
        let cases = [
            ("no tolerations", vec![], "", false),
            (
                "pod contains tolerations from ignoreEntrypointTolerations (single)",
                vec![toleration("foo.com/bar")],
                r#"[{"key":"foo.com/bar","Effect":"NoSchedule"}]"#,
                true,
            ),
            (
                "pod contains tolerations from ignoreEntrypointTolerations (multiple)",
                vec![toleration("foo.com/bar"), toleration("foo.com/baz"), toleration("foo.com/qux")],
                r#"[{"key":"foo.com/bar","Effect":"NoSchedule"},{"key":"foo.com/baz","Effect":"NoSchedule"}]"#,
                true,
            ),
            (
                "pod contains partial tolerations from ignoreEntrypointTolerations",
                vec![toleration("foo.com/bar"), toleration("foo.com/qux")],
                r#"[{"key":"foo.com/bar","Effect":"NoSchedule"},{"key":"foo.com/baz","Effect":"NoSchedule"}]"#,
                true,
            ),
            (
                "pod contains no tolerations from ignoreEntrypointTolerations",
                vec![],
                r#"[{"key":"foo.com/bar","Effect":"NoSchedule"}]"#,
                false,
            ),
        ];

        for (name, tolerations, allow_list, explicit) in cases {
            let config = SidecarConfig {
                tolerations,
                ignore_entrypoint_tolerations: allow_list.to_string(),
                ..SidecarConfig::default()
            };
            let container = build(&config);
            let args = container.args.unwrap_or_default();

            assert!(!args.is_empty(), "{name}");
            if explicit {
                assert_eq!(container.command, Some(vec!["/daprd".to_string()]), "{name}");
                assert_eq!(args[0], "--mode", "{name}");
            } else {
                assert_eq!(container.command, None, "{name}");
                assert_eq!(args[0], "/daprd", "{name}");
            }
        }
    }

    #[test]
    fn test_ports_and_probes() {
        let container = build(&config(&[(annotations::METRICS_PORT, "9999")]));

        let ports = container
            .ports
            .unwrap_or_default()
            .into_iter()
            .map(|port| (port.name.unwrap_or_default(), port.container_port))
            .collect::<Vec<_>>();
        assert_eq!(
            ports,
            vec![
                ("dapr-http".to_string(), 3500),
                ("dapr-grpc".to_string(), 50001),
                ("dapr-internal".to_string(), 50002),
                ("dapr-metrics".to_string(), 9999),
            ]
        );

        let readiness = container.readiness_probe.unwrap_or_default();
        let path = readiness.http_get.as_ref().and_then(|action| action.path.as_deref());
        assert_eq!(path, Some("/v1.0/healthz"));
        assert_eq!(readiness.period_seconds, Some(6));
    }

    #[test]
    fn test_probe_timing_annotations() {
        let container = build(&config(&[
            (annotations::LIVENESS_PROBE_DELAY_SECONDS, "10"),
            (annotations::READINESS_PROBE_THRESHOLD, "not-a-number"),
        ]));

        let liveness = container.liveness_probe.unwrap_or_default();
        let readiness = container.readiness_probe.unwrap_or_default();
        assert_eq!(liveness.initial_delay_seconds, Some(10));
        assert_eq!(readiness.failure_threshold, Some(3));
    }

    #[test]
    fn test_invalid_resources_are_dropped() {
        let container = build(&config(&[(annotations::CPU_LIMIT, "a lot")]));
        assert_eq!(container.resources, None);

        let container = build(&config(&[(annotations::CPU_LIMIT, "500m")]));
        assert!(container.resources.is_some_and(|resources| resources.limits.is_some()));
    }
}
