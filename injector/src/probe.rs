//! HTTP health-check probes for the sidecar.

use k8s_openapi::{
    api::core::v1::{HTTPGetAction, Probe},
    apimachinery::pkg::util::intstr::IntOrString,
};

/// Joins path segments into an absolute URL path.
///
/// Leading and trailing slashes are stripped from each segment, empty
/// segments are dropped and the result always starts with a single `/`.
pub fn format_path(segments: &[&str]) -> String {
    let joined = segments
        .iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// An HTTP GET handler on `port` at the path made of `segments`.
pub fn http_get(port: i32, segments: &[&str]) -> HTTPGetAction {
    HTTPGetAction {
        path: Some(format_path(segments)),
        port: IntOrString::Int(port),
        ..HTTPGetAction::default()
    }
}

/// Probe timings, in seconds apart from the threshold.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProbeTimings {
    pub initial_delay_seconds: i32,
    pub timeout_seconds: i32,
    pub period_seconds: i32,
    pub failure_threshold: i32,
}

impl ProbeTimings {
    pub fn probe(self, handler: HTTPGetAction) -> Probe {
        let Self { initial_delay_seconds, timeout_seconds, period_seconds, failure_threshold } =
            self;
        Probe {
            http_get: Some(handler),
            initial_delay_seconds: Some(initial_delay_seconds),
            timeout_seconds: Some(timeout_seconds),
            period_seconds: Some(period_seconds),
            failure_threshold: Some(failure_threshold),
            ..Probe::default()
        }
    }
}
