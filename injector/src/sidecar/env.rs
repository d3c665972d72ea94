use std::collections::BTreeMap;

use daprd_injector_base::consts::{env, k8s::annotations, sidecar};
use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector, SecretKeySelector};

use crate::annotations::AnnotationsExt;

fn plain(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..EnvVar::default() }
}

fn from_secret(name: &str, secret: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret.to_string(),
                key: sidecar::API_TOKEN_SECRET_KEY.to_string(),
                ..SecretKeySelector::default()
            }),
            ..EnvVarSource::default()
        }),
        ..EnvVar::default()
    }
}

/// Variables requested through `dapr.io/env` as `KEY=value,KEY2=value2`.
pub fn user_env(pod_annotations: &BTreeMap<String, String>) -> Vec<EnvVar> {
    pod_annotations
        .pairs(annotations::ENV, '=')
        .into_iter()
        .map(|(name, value)| plain(&name, &value))
        .collect()
}

/// Identity and credentials of the sidecar.
#[derive(Clone, Copy, Debug, Default)]
pub struct SidecarEnv<'a> {
    pub namespace: &'a str,
    pub trust_anchors: &'a str,
    pub cert_chain: &'a str,
    pub cert_key: &'a str,
    pub identity: &'a str,
    pub api_token_secret: Option<&'a str>,
    pub app_token_secret: Option<&'a str>,
}

impl SidecarEnv<'_> {
    /// The sidecar environment followed by `user_env`.
    pub fn build(self, user_env: Vec<EnvVar>) -> Vec<EnvVar> {
        let mut vars = vec![
            plain(env::NAMESPACE, self.namespace),
            EnvVar {
                name: env::POD_NAME.to_string(),
                value_from: Some(EnvVarSource {
                    field_ref: Some(ObjectFieldSelector {
                        field_path: "metadata.name".to_string(),
                        ..ObjectFieldSelector::default()
                    }),
                    ..EnvVarSource::default()
                }),
                ..EnvVar::default()
            },
            plain(env::TRUST_ANCHORS, self.trust_anchors),
            plain(env::CERT_CHAIN, self.cert_chain),
            plain(env::CERT_KEY, self.cert_key),
            plain(env::SENTRY_LOCAL_IDENTITY, self.identity),
        ];
        vars.extend(self.api_token_secret.map(|secret| from_secret(env::API_TOKEN, secret)));
        vars.extend(self.app_token_secret.map(|secret| from_secret(env::APP_API_TOKEN, secret)));
        vars.extend(user_env);
        vars
    }
}
