use std::{fmt, str::FromStr};

use snafu::Snafu;

const MAX_TAG_LENGTH: usize = 128;
const MIN_DIGEST_HEX_LENGTH: usize = 32;

/// A container image reference: `[registry[:port]/]path[:tag][@algorithm:hex]`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageReference {
    pub registry: Option<String>,

    pub repository: String,

    pub tag: Option<String>,

    pub digest: Option<String>,
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { registry, repository, tag, digest } = self;
        if let Some(registry) = registry {
            write!(f, "{registry}/")?;
        }
        f.write_str(repository)?;
        if let Some(tag) = tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

impl FromStr for ImageReference {
    type Err = ParseImageReferenceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return EmptySnafu.fail();
        }
        if input.chars().any(char::is_whitespace) {
            return InvalidFormatSnafu { input }.fail();
        }

        let (name, digest) = match input.split_once('@') {
            Some((name, digest)) => (name, Some(parse_digest(digest)?)),
            None => (input, None),
        };

        // A colon after the last slash separates the tag; earlier colons
        // belong to a registry port.
        let last_slash = name.rfind('/').map_or(0, |idx| idx + 1);
        let (name, tag) = match name[last_slash..].rfind(':') {
            Some(idx) => {
                let (name, tag) = name.split_at(last_slash + idx);
                (name, Some(parse_tag(&tag[1..])?))
            }
            None => (name, None),
        };

        let (registry, repository) = match name.split_once('/') {
            Some((first, rest)) if is_registry(first) => (Some(first), rest),
            _ => (None, name),
        };

        if let Some(registry) = registry {
            validate_registry(registry)?;
        }
        if repository.is_empty() {
            return InvalidFormatSnafu { input }.fail();
        }
        for component in repository.split('/') {
            validate_path_component(component)?;
        }

        Ok(Self {
            registry: registry.map(ToString::to_string),
            repository: repository.to_string(),
            tag,
            digest,
        })
    }
}

fn is_registry(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

fn validate_registry(registry: &str) -> Result<(), ParseImageReferenceError> {
    let (host, port) = match registry.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (registry, None),
    };
    let valid_host = !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                && !label.starts_with('-')
                && !label.ends_with('-')
        });
    let valid_port = port.is_none_or(|port| port.parse::<u16>().is_ok());
    if valid_host && valid_port {
        Ok(())
    } else {
        InvalidRegistrySnafu { registry }.fail()
    }
}

/// Path components are lowercase alphanumerics joined by `.`, `_` or `-`.
fn validate_path_component(component: &str) -> Result<(), ParseImageReferenceError> {
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let valid = component.chars().next().is_some_and(allowed)
        && component.chars().next_back().is_some_and(allowed)
        && component.chars().all(|c| allowed(c) || matches!(c, '.' | '_' | '-'));
    if valid { Ok(()) } else { InvalidPathComponentSnafu { component }.fail() }
}

fn parse_tag(tag: &str) -> Result<String, ParseImageReferenceError> {
    let valid = !tag.is_empty()
        && tag.len() <= MAX_TAG_LENGTH
        && !tag.starts_with(['.', '-'])
        && tag.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid { Ok(tag.to_string()) } else { InvalidTagSnafu { tag }.fail() }
}

fn parse_digest(digest: &str) -> Result<String, ParseImageReferenceError> {
    let valid = digest.split_once(':').is_some_and(|(algorithm, hex)| {
        !algorithm.is_empty()
            && algorithm.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            && hex.len() >= MIN_DIGEST_HEX_LENGTH
            && hex.chars().all(|c| c.is_ascii_hexdigit())
    });
    if valid { Ok(digest.to_string()) } else { InvalidDigestSnafu { digest }.fail() }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum ParseImageReferenceError {
    #[snafu(display("Image reference is empty"))]
    Empty,

    #[snafu(display("Invalid image reference '{input}'"))]
    InvalidFormat { input: String },

    #[snafu(display("Invalid registry '{registry}'"))]
    InvalidRegistry { registry: String },

    #[snafu(display("Invalid repository path component '{component}'"))]
    InvalidPathComponent { component: String },

    #[snafu(display("Invalid tag '{tag}'"))]
    InvalidTag { tag: String },

    #[snafu(display("Invalid digest '{digest}'"))]
    InvalidDigest { digest: String },
}
