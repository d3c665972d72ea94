use std::collections::BTreeMap;

use daprd_injector_base::consts::k8s::annotations;
use k8s_openapi::{
    api::core::v1::ResourceRequirements, apimachinery::pkg::api::resource::Quantity,
};
use snafu::{OptionExt, Snafu};

use crate::annotations::AnnotationsExt;

const BINARY_SUFFIXES: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const DECIMAL_SUFFIXES: [&str; 9] = ["n", "u", "m", "k", "M", "G", "T", "P", "E"];

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("Invalid quantity '{value}' in annotation {annotation}"))]
pub struct InvalidQuantityError {
    annotation: String,
    value: String,
}

/// Validates `value` against the Kubernetes quantity grammar:
/// `[+-]digits[.digits](binarySI | decimalSI | [eE][+-]digits)?`.
pub fn parse_quantity(value: &str) -> Option<Quantity> {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let number_len = unsigned.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_len);

    let valid_number = match number.split_once('.') {
        Some((whole, fraction)) => {
            !(whole.is_empty() && fraction.is_empty()) && !fraction.contains('.')
        }
        None => !number.is_empty(),
    };
    let valid_suffix = suffix.is_empty()
        || BINARY_SUFFIXES.contains(&suffix)
        || DECIMAL_SUFFIXES.contains(&suffix)
        || suffix.strip_prefix(['e', 'E']).is_some_and(|exponent| {
            let digits = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        });

    (valid_number && valid_suffix).then(|| Quantity(value.to_string()))
}

/// Reads the cpu and memory limit and request annotations.
///
/// Returns `Ok(None)` when none is set.
///
/// # Errors
///
/// Fails on the first value that is not a valid quantity.
pub fn resource_requirements(
    pod_annotations: &BTreeMap<String, String>,
) -> Result<Option<ResourceRequirements>, InvalidQuantityError> {
    let collect = |entries: [(&str, &str); 2]| {
        entries
            .into_iter()
            .filter_map(|(resource, annotation)| {
                pod_annotations
                    .string(annotation)
                    .filter(|value| !value.is_empty())
                    .map(|value| (resource, annotation, value))
            })
            .map(|(resource, annotation, value)| {
                parse_quantity(value)
                    .map(|quantity| (resource.to_string(), quantity))
                    .context(InvalidQuantitySnafu { annotation, value })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
    };

    let limits = collect([("cpu", annotations::CPU_LIMIT), ("memory", annotations::MEMORY_LIMIT)])?;
    let requests =
        collect([("cpu", annotations::CPU_REQUEST), ("memory", annotations::MEMORY_REQUEST)])?;

    if limits.is_empty() && requests.is_empty() {
        return Ok(None);
    }
    Ok(Some(ResourceRequirements {
        limits: (!limits.is_empty()).then_some(limits),
        requests: (!requests.is_empty()).then_some(requests),
        ..ResourceRequirements::default()
    }))
}
