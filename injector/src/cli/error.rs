use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("{source}"))]
    Injection { source: crate::Error },

    #[snafu(display("Failed to read pod manifest {}, error: {source}", file_path.display()))]
    ReadPod { file_path: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to parse pod manifest {}, error: {source}", file_path.display()))]
    ParsePod { file_path: PathBuf, source: serde_yaml::Error },

    #[snafu(display("Failed to serialize injection, error: {source}"))]
    SerializeInjection { source: serde_json::Error },

    #[snafu(display("Failed to write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}

impl From<crate::Error> for Error {
    fn from(source: crate::Error) -> Self { Self::Injection { source } }
}
