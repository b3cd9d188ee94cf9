//! Harness configuration.
//!
//! A [HarnessConfig] is built once at startup (from an optional YAML file plus command line
//! overrides) and then handed by reference to every component that needs it.
use duration_str::deserialize_duration;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

pub const DEFAULT_NAMESPACE: &str = "default";

pub const DEFAULT_DUMPER_IMAGE: &str = "kubectl-shovel/dumper-integration-tests";
pub const DEFAULT_TARGET_IMAGE: &str = "kubectl-shovel/sample-integration-tests";
pub const DEFAULT_SIDECAR_IMAGE: &str = "gcr.io/google_containers/pause:3.1";

pub const DEFAULT_PLUGIN_NAME: &str = "kubectl-shovel";
pub const DEFAULT_SUBJECT_BINARY: &str = "kubectl-shovel";

const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: `{err}`")]
    Read { path: PathBuf, err: std::io::Error },

    #[error("error deserializing harness config: `{0}`")]
    SerdeYaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    /// Path (or name in `$PATH`) of the tool under test.
    #[serde(default = "default_subject_binary")]
    pub subject_binary: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            cluster: ClusterConfig::default(),
            images: ImagesConfig::default(),
            staging: StagingConfig::default(),
            readiness: ReadinessConfig::default(),
            subject_binary: default_subject_binary(),
        }
    }
}

impl HarnessConfig {
    /// Loads the configuration from a YAML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            err,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClusterConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Explicit kubeconfig location. See [ClusterConfig::kubeconfig_path].
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            kubeconfig: None,
        }
    }
}

impl ClusterConfig {
    /// Returns the explicitly configured kubeconfig file. `None` leaves the lookup to kube's
    /// loader, which merges every file listed in `$KUBECONFIG` or reads `~/.kube/config`.
    pub fn kubeconfig_path(&self) -> Option<&Path> {
        self.kubeconfig.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_dumper_image")]
    pub dumper: String,
    #[serde(default = "default_target_image")]
    pub target: String,
    #[serde(default = "default_sidecar_image")]
    pub sidecar: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            dumper: default_dumper_image(),
            target: default_target_image(),
            sidecar: default_sidecar_image(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StagingConfig {
    /// Root under which `<plugin_name>/<command>` output directories are created.
    #[serde(default = "env::temp_dir")]
    pub temp_root: PathBuf,
    #[serde(default = "default_plugin_name")]
    pub plugin_name: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            temp_root: env::temp_dir(),
            plugin_name: default_plugin_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ReadinessConfig {
    #[serde(
        default = "default_readiness_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub poll_interval: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_READINESS_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_dumper_image() -> String {
    DEFAULT_DUMPER_IMAGE.to_string()
}

fn default_target_image() -> String {
    DEFAULT_TARGET_IMAGE.to_string()
}

fn default_sidecar_image() -> String {
    DEFAULT_SIDECAR_IMAGE.to_string()
}

fn default_plugin_name() -> String {
    DEFAULT_PLUGIN_NAME.to_string()
}

fn default_subject_binary() -> PathBuf {
    PathBuf::from(DEFAULT_SUBJECT_BINARY)
}

fn default_readiness_timeout() -> Duration {
    DEFAULT_READINESS_TIMEOUT
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}
