use crate::k8s::error::K8sError;
use std::fmt;
use thiserror::Error;

/// Errors aborting a test case.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The case was built with an invalid configuration. Raised before touching the cluster.
    #[error("invalid test case configuration: {0}")]
    Configuration(String),

    #[error("cluster API call failed: `{0}`")]
    ClusterApi(K8sError),

    #[error("pod not ready: `{0}`")]
    ReadinessTimeout(K8sError),

    #[error("test run cancelled while {0}")]
    Cancelled(String),

    #[error("subject tool invocation failed: {0}")]
    Invocation(String),

    #[error("test case panicked: {0}")]
    Panicked(String),

    #[error("output staging failed: `{0}`")]
    Staging(#[from] std::io::Error),
}

impl From<K8sError> for HarnessError {
    fn from(err: K8sError) -> Self {
        match err {
            K8sError::ReadinessTimeout { .. } => HarnessError::ReadinessTimeout(err),
            K8sError::WaitCancelled(selector) => {
                HarnessError::Cancelled(format!("waiting for pods matching `{selector}`"))
            }
            _ => HarnessError::ClusterApi(err),
        }
    }
}

/// Step of a test case, used to report where a case was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Staging,
    Deploy,
    WaitReady,
    Invoke,
    Verify,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Step::Staging => "staging",
            Step::Deploy => "deploy",
            Step::WaitReady => "wait-ready",
            Step::Invoke => "invoke",
            Step::Verify => "verify",
        };
        f.write_str(step)
    }
}
