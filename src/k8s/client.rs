use super::error::K8sError;
use crate::config::ClusterConfig;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

/// Constructs a new Kubernetes client for the harness namespace.
pub async fn try_new_client(cluster: &ClusterConfig) -> Result<Client, K8sError> {
    let config = load_config(cluster).await?;
    let client = Client::try_from(config)?;
    debug!(namespace = %cluster.namespace, "k8s client creation succeeded");

    Ok(client)
}

/// Loads the client config from [ClusterConfig::kubeconfig_path] when set. Otherwise kube's
/// loader is used: every file listed in `$KUBECONFIG` is merged, falling back to
/// `~/.kube/config`.
async fn load_config(cluster: &ClusterConfig) -> Result<Config, K8sError> {
    let options = KubeConfigOptions::default();

    let mut config = match cluster.kubeconfig_path() {
        Some(path) => {
            debug!("loading kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &options).await?
        }
        None => {
            debug!("loading kubeconfig from the default location");
            Config::from_kubeconfig(&options).await?
        }
    };
    config.default_namespace = cluster.namespace.clone();

    Ok(config)
}
