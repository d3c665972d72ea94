use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Sidecar { source: crate::sidecar::Error },

    #[snafu(display("Failed to serialize {resource} for the patch, error: {source}"))]
    SerializePatchValue { resource: &'static str, source: serde_json::Error },
}

impl From<crate::sidecar::Error> for Error {
    fn from(source: crate::sidecar::Error) -> Self { Self::Sidecar { source } }
}
