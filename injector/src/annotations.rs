//! Typed lookups over a pod's annotation map.
//!
//! Annotation values are free-form strings written by users. A value that
//! does not parse never fails the lookup: it is logged and the caller's
//! default is used instead.

use std::{collections::BTreeMap, str::FromStr, time::Duration};

pub trait AnnotationsExt {
    /// Returns the raw value of `key`, if present.
    fn string(&self, key: &str) -> Option<&str>;

    /// Returns the value of `key`, or `default` when the key is absent or
    /// empty.
    fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).filter(|value| !value.is_empty()).unwrap_or(default).to_string()
    }

    /// Parses `key` as an `i32`; absent or unparseable values yield `None`.
    fn int32(&self, key: &str) -> Option<i32> { self.parsed(key) }

    /// Parses `key` as an `i32`, falling back to `default`.
    fn int32_or(&self, key: &str, default: i32) -> i32 { self.int32(key).unwrap_or(default) }

    /// Reads `key` as a flag. Only the literal `"true"` enables it; any other
    /// present value disables it.
    fn bool_or(&self, key: &str, default: bool) -> bool {
        self.string(key).map_or(default, |value| value == "true")
    }

    /// Reads `key` as a whole number of seconds. Negative values are treated
    /// like unparseable ones.
    fn duration_secs(&self, key: &str) -> Option<Duration> {
        let seconds = self.parsed::<i64>(key)?;
        match u64::try_from(seconds) {
            Ok(seconds) => Some(Duration::from_secs(seconds)),
            Err(_) => {
                tracing::warn!("Ignoring negative duration {seconds} in annotation {key}");
                None
            }
        }
    }

    /// Splits `key` on commas, trimming entries and dropping empty ones.
    fn list(&self, key: &str) -> Vec<String> {
        self.string(key)
            .into_iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Splits `key` into `name<separator>value` pairs. Elements without the
    /// separator or with an empty name are skipped.
    fn pairs(&self, key: &str, separator: char) -> Vec<(String, String)> {
        self.list(key)
            .into_iter()
            .filter_map(|item| match item.split_once(separator) {
                Some((name, value)) if !name.trim().is_empty() => {
                    Some((name.trim().to_string(), value.trim().to_string()))
                }
                _ => {
                    tracing::warn!("Skipping malformed entry '{item}' in annotation {key}");
                    None
                }
            })
            .collect()
    }

    /// Parses `key` with `FromStr`, logging values that do not parse.
    fn parsed<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.string(key)?;
        match value.trim().parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!("Ignoring invalid value '{value}' in annotation {key}: {err}");
                None
            }
        }
    }
}

impl AnnotationsExt for BTreeMap<String, String> {
    fn string(&self, key: &str) -> Option<&str> { self.get(key).map(String::as_str) }
}
