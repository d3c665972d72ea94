use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Pull policy of the sidecar image.
///
/// Configuration values are matched case-insensitively; anything unknown,
/// including an empty value, falls back to `IfNotPresent`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Serialize, PartialEq)]
#[serde(from = "String", into = "String")]
pub enum ImagePullPolicy {
    #[default]
    IfNotPresent,
    Always,
    Never,
}

impl ImagePullPolicy {
    pub fn from_config_value(value: &str) -> Self {
        value.parse().unwrap_or_else(|err| {
            if !value.is_empty() {
                tracing::warn!("{err}, falling back to {}", Self::default());
            }
            Self::default()
        })
    }
}

impl fmt::Display for ImagePullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val = match self {
            Self::IfNotPresent => "IfNotPresent",
            Self::Always => "Always",
            Self::Never => "Never",
        };
        f.write_str(val)
    }
}

impl FromStr for ImagePullPolicy {
    type Err = ParseImagePullPolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "ifnotpresent" => Ok(Self::IfNotPresent),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err(ParseImagePullPolicyError::Invalid { value: value.to_string() }),
        }
    }
}

impl From<String> for ImagePullPolicy {
    fn from(value: String) -> Self { Self::from_config_value(&value) }
}

impl From<ImagePullPolicy> for String {
    fn from(policy: ImagePullPolicy) -> Self { policy.to_string() }
}

#[derive(Debug, Snafu)]
pub enum ParseImagePullPolicyError {
    #[snafu(display("'{value}' is not a valid image pull policy"))]
    Invalid { value: String },
}
