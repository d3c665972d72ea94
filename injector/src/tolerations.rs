//! Decides whether the sidecar needs an explicit entrypoint.
//!
//! Some node pools run images whose default entrypoint cannot be trusted
//! (e.g. Windows nodes selected through taints). Operators list the
//! tolerations of such pools; a pod carrying any of them gets the `daprd`
//! executable set as the container command.

use k8s_openapi::api::core::v1::Toleration;
use serde::Deserialize;

/// An allow-list entry. Field names are matched as `key`/`Key` and
/// `effect`/`Effect`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
struct EntrypointToleration {
    #[serde(default, alias = "Key")]
    key: Option<String>,

    #[serde(default, alias = "Effect")]
    effect: Option<String>,
}

impl EntrypointToleration {
    fn matches(&self, toleration: &Toleration) -> bool {
        self.key.as_deref().unwrap_or_default() == toleration.key.as_deref().unwrap_or_default()
            && self.effect.as_deref().unwrap_or_default()
                == toleration.effect.as_deref().unwrap_or_default()
    }
}

/// Parses the operator supplied allow-list. Malformed JSON yields an empty
/// list.
fn parse_allow_list(allow_list_json: &str) -> Vec<EntrypointToleration> {
    if allow_list_json.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(allow_list_json).unwrap_or_else(|err| {
        tracing::warn!("Ignoring malformed entrypoint toleration list: {err}");
        Vec::new()
    })
}

/// Returns `true` when any pod toleration equals any allow-list entry on
/// `(key, effect)`.
pub fn requires_explicit_entrypoint(tolerations: &[Toleration], allow_list_json: &str) -> bool {
    let allow_list = parse_allow_list(allow_list_json);
    let matched = tolerations
        .iter()
        .any(|toleration| allow_list.iter().any(|allowed| allowed.matches(toleration)));
    if matched {
        tracing::debug!("Pod toleration matches the entrypoint allow-list");
    }
    matched
}
