use kube::config::KubeconfigError;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum K8sError {
    #[error("the kube client returned an error: `{0}`")]
    Generic(#[from] kube::Error),

    #[error("it is not possible to read kubeconfig: `{0}`")]
    UnableToSetupClientKubeconfig(#[from] KubeconfigError),

    #[error("pod object has no name")]
    MissingName,

    #[error("no ready pod matched selector `{selector}` within {timeout:?}")]
    ReadinessTimeout { selector: String, timeout: Duration },

    #[error("waiting for pods matching `{0}` was cancelled")]
    WaitCancelled(String),
}
