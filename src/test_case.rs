//! Declarative description of a single test case.
use crate::args::Args;
use crate::error::HarnessError;
use crate::topology::PodFactory;
use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the file the subject tool writes its output to, inside the staged directory.
pub const OUTPUT_FILE_NAME: &str = "output";

const POD_NAME_KEY: &str = "pod-name";
const IMAGE_KEY: &str = "image";
const OUTPUT_KEY: &str = "output";
const HOST_OUTPUT_KEY: &str = "store-output-on-host";

/// Where the subject tool leaves its output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMode {
    /// Output is written to the node's filesystem.
    Host,
    /// Output is downloaded to `path`. The path is only known once the case is staged.
    Download { path: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct TestCase {
    name: String,
    pod: Pod,
    args: Vec<(String, String)>,
    output: OutputMode,
}

impl TestCase {
    /// Creates a case targeting a single container pod with the output stored on host.
    ///
    /// The pod uses the default images. Use [PodFactory::case] to build it out of the configured ones.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pod: PodFactory::default().single_container_pod(),
            args: Vec::new(),
            output: OutputMode::Host,
        }
    }

    pub fn with_pod(mut self, pod: Pod) -> Self {
        self.pod = pod;
        self
    }

    pub fn download_output(mut self) -> Self {
        self.output = OutputMode::Download { path: None };
        self
    }

    /// Appends extra `key, value, key, value, ...` arguments.
    ///
    /// Fails without modifying the case when an odd number of tokens is provided.
    pub fn with_args<S: AsRef<str>>(mut self, args: &[S]) -> Result<Self, HarnessError> {
        if args.len() % 2 != 0 {
            return Err(HarnessError::Configuration(format!(
                "case `{}`: length of args must be divided by two, got {}",
                self.name,
                args.len()
            )));
        }
        self.args.extend(
            args.chunks_exact(2)
                .map(|pair| (pair[0].as_ref().to_string(), pair[1].as_ref().to_string())),
        );
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pod(&self) -> &Pod {
        &self.pod
    }

    pub fn pod_name(&self) -> &str {
        self.pod.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn pod_labels(&self) -> BTreeMap<String, String> {
        self.pod.metadata.labels.clone().unwrap_or_default()
    }

    pub fn output(&self) -> &OutputMode {
        &self.output
    }

    pub fn extra_args(&self) -> &[(String, String)] {
        &self.args
    }

    /// Resolved download path, when the case downloads its output and has been staged.
    pub fn output_path(&self) -> Option<&Path> {
        match &self.output {
            OutputMode::Download { path } => path.as_deref(),
            OutputMode::Host => None,
        }
    }

    /// Points the download output to [OUTPUT_FILE_NAME] inside `dir`. No-op for host output.
    pub fn stage_output(&mut self, dir: &Path) {
        if let OutputMode::Download { path } = &mut self.output {
            *path = Some(dir.join(OUTPUT_FILE_NAME));
        }
    }

    /// Renders the subject tool invocation:
    /// `<command> --pod-name <name> --image <dumper_image> [--store-output-on-host | --output <path>] [--<k> <v>]...`
    pub fn format_args(&self, command: &str, dumper_image: &str) -> Result<Vec<String>, HarnessError> {
        let mut args = Args::new()
            .append_raw(command)
            .append(POD_NAME_KEY, self.pod_name())
            .append(IMAGE_KEY, dumper_image);

        args = match &self.output {
            OutputMode::Host => args.append_key(HOST_OUTPUT_KEY),
            OutputMode::Download { path: Some(path) } => {
                args.append(OUTPUT_KEY, path.to_string_lossy())
            }
            OutputMode::Download { path: None } => {
                return Err(HarnessError::Configuration(format!(
                    "case `{}`: output path requested before staging",
                    self.name
                )));
            }
        };

        for (key, value) in self.args.iter() {
            args = args.append(key, value.as_str());
        }

        Ok(args.get())
    }
}
