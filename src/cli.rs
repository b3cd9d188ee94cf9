use crate::config::{ConfigError, HarnessConfig};
use clap::Parser;
use std::path::PathBuf;

const DEFAULT_COMMAND: &str = "dump";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
pub struct Cli {
    /// YAML file with the harness configuration. Defaults are used when not provided.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subject tool command to exercise (`dump`, `trace`, `gcdump`, ...). Can be repeated.
    #[arg(long = "command", default_values_t = [DEFAULT_COMMAND.to_string()])]
    commands: Vec<String>,

    #[arg(long)]
    namespace: Option<String>,

    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    #[arg(long)]
    subject_binary: Option<PathBuf>,

    #[arg(long)]
    dumper_image: Option<String>,
}

impl Cli {
    /// Parses command line arguments
    pub fn init_harness_cli() -> Self {
        Self::parse()
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Loads the config file (if any) and applies the command line overrides on top of it.
    pub fn harness_config(&self) -> Result<HarnessConfig, ConfigError> {
        let config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };
        Ok(self.apply_overrides(config))
    }

    fn apply_overrides(&self, mut config: HarnessConfig) -> HarnessConfig {
        if let Some(namespace) = &self.namespace {
            config.cluster.namespace.clone_from(namespace);
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            config.cluster.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(binary) = &self.subject_binary {
            config.subject_binary.clone_from(binary);
        }
        if let Some(image) = &self.dumper_image {
            config.images.dumper.clone_from(image);
        }
        config
    }
}
