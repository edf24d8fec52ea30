//! Command-line interface for Grow.
//!
//! # Commands
//!
//! - `render` - Render the page for a request path
//! - `check` - Resolve a request path and report every reachable document
//! - `routes` - List the routes registered by the manifest
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all output except errors
//! - `--config` - Path to `grow.toml` (default: `./grow.toml`)
//!
//! # Examples
//!
//! ```bash
//! grow render /blog/hello
//! grow render / --output public/index.html
//! grow --config site/grow.toml check /blog/hello
//! grow routes
//! ```

mod check;
mod render;
mod routes;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::PodConfig;
use crate::constants::CONFIG_FILE_NAME;
use crate::pod::Pod;

/// Runtime configuration derived from the global flags.
///
/// Kept apart from [`Cli`] so tests and embedders can drive
/// [`Cli::execute_with_config`] without touching process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter directive. `None` means honor `RUST_LOG`, falling back to `info`.
    pub log_level: Option<String>,

    /// Location of `grow.toml`.
    pub config_path: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            config_path: PathBuf::from(CONFIG_FILE_NAME),
        }
    }
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log filter for this configuration.
    pub fn env_filter(&self) -> EnvFilter {
        match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        }
    }

    /// Install the global tracing subscriber. Logs go to stderr so rendered
    /// pages on stdout stay clean. A second call is a no-op.
    pub fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load the pod configuration and build the pod.
    pub async fn load_pod(&self) -> Result<Pod> {
        let config = PodConfig::load(&self.config_path)
            .await
            .with_context(|| format!("Failed to load {}", self.config_path.display()))?;
        Ok(Pod::new(config))
    }
}

/// Grow renders YAML-described documents into pages through routed templates.
#[derive(Parser, Debug)]
#[command(name = "grow", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output. Mutually exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the pod configuration file.
    #[arg(short, long, global = true, env = "GROW_CONFIG", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the page for a request path.
    Render(render::RenderCommand),

    /// Resolve a request path and report the state of every reachable document.
    Check(check::CheckCommand),

    /// List the routes registered by the routes manifest.
    Routes(routes::RoutesCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    ///
    /// `--verbose` maps to `debug`, `--quiet` to `error`; otherwise `RUST_LOG`
    /// decides.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let pod = config.load_pod().await?;

        match self.command {
            Commands::Render(cmd) => cmd.execute(&pod).await,
            Commands::Check(cmd) => cmd.execute(&pod).await,
            Commands::Routes(cmd) => cmd.execute(&pod).await,
        }
    }
}
