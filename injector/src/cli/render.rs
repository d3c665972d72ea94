use std::{io::Write, path::PathBuf};

use clap::Args;
use k8s_openapi::api::core::v1::Pod;
use snafu::ResultExt;

use crate::{
    Config, Defaults, Injector,
    cli::{Error, error},
};

#[derive(Args, Clone)]
pub struct RenderCommand {
    #[arg(
        long = "pod",
        short = 'p',
        help = "Pod manifest in YAML or JSON. The sidecar and the patch are printed as JSON."
    )]
    pod: PathBuf,
}

impl RenderCommand {
    pub fn run(self, config: Config) -> Result<i32, Error> {
        let Self { pod: file_path } = self;

        let data = std::fs::read(&file_path)
            .with_context(|_| error::ReadPodSnafu { file_path: file_path.clone() })?;
        let mut pod: Pod =
            serde_yaml::from_slice(&data).context(error::ParsePodSnafu { file_path })?;

        let injector = Injector::new(config, Defaults::default());
        let Some(injection) = injector.inject(&mut pod)? else {
            let name = pod.metadata.name.unwrap_or_default();
            std::io::stderr()
                .write_all(format!("Pod {name} is not selected for sidecar injection\n").as_bytes())
                .context(error::WriteStdoutSnafu)?;
            return Ok(0);
        };

        let mut output =
            serde_json::to_vec_pretty(&injection).context(error::SerializeInjectionSnafu)?;
        output.push(b'\n');
        std::io::stdout().write_all(&output).context(error::WriteStdoutSnafu)?;

        Ok(0)
    }
}
