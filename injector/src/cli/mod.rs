//! Command line interface of the injector.
//!
//! ```bash
//! # Render the sidecar container and patch for a pod manifest
//! daprd-injector render --pod pod.yaml
//!
//! # Use a specific configuration file
//! daprd-injector --config ./injector.yaml render --pod pod.json
//!
//! # Print the default configuration
//! daprd-injector default-config
//! ```

pub mod error;
mod render;

use std::{io::Write, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use daprd_injector_base::{CLI_PROGRAM_NAME, PROJECT_VERSION};
use snafu::ResultExt;

pub use self::error::Error;
use self::render::RenderCommand;
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    about = "Builds the daprd sidecar container and the JSON patch that injects it into a pod",
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[clap(
        long = "config",
        short = 'c',
        env = "DAPRD_INJECTOR_CONFIG_FILE_PATH",
        help = "Specify a configuration file. Defaults to ~/.config/daprd-injector/config.yaml \
                or DAPRD_INJECTOR_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    #[clap(
        long = "log-level",
        env = "DAPRD_INJECTOR_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Print version information")]
    Version,

    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,

    #[command(
        alias = "r",
        about = "Print the sidecar container and JSON patch for a pod manifest"
    )]
    Render(RenderCommand),
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    /// Loads the configuration file, or the defaults when no file was given
    /// and none exists at the searched locations. `--log-level` overrides the
    /// file.
    fn load_config(&self) -> Result<Config, Error> {
        let mut config = match &self.config_file {
            Some(path) => Config::load(path)?,
            None => {
                let path = Config::search_config_file_path();
                if path.try_exists().unwrap_or(false) {
                    Config::load(path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }

        Ok(config)
    }

    /// Runs the selected command and returns the process exit code.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration cannot be loaded, the pod
    /// manifest cannot be read, or the injection fails.
    pub fn run(self) -> Result<i32, Error> {
        match self.commands {
            Some(Commands::Version) => {
                std::io::stdout()
                    .write_all(format!("{CLI_PROGRAM_NAME} {PROJECT_VERSION}\n").as_bytes())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                std::io::stdout()
                    .write_all(Config::default().to_yaml()?.as_bytes())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            _ => {}
        }

        let config = self.load_config()?;
        config.log.registry();

        match self.commands {
            Some(Commands::Render(cmd)) => cmd.run(config),
            _ => {
                let help = Self::command().render_long_help().ansi().to_string();
                std::io::stderr().write_all(help.as_bytes()).context(error::WriteStdoutSnafu)?;
                Ok(-1)
            }
        }
    }
}
