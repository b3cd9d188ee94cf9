use super::error::K8sError;
use crate::config::ReadinessConfig;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::runtime::conditions::is_pod_running;
use kube::runtime::wait::Condition;
use kube::{Api, Client};
use tokio::runtime::Handle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const READY_CONDITION: &str = "Ready";
const CONDITION_TRUE: &str = "True";

/// Creates, waits for and deletes test pods in a single namespace.
///
/// The cluster owns the pod lifetime: the controller only creates it, observes it through
/// label-selector polling and issues the deletion request on teardown.
#[derive(Clone)]
pub struct PodLifecycle {
    client: Client,
    namespace: String,
    readiness: ReadinessConfig,
}

impl PodLifecycle {
    pub fn new(client: Client, namespace: impl Into<String>, readiness: ReadinessConfig) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            readiness,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn api(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Creates the pod and returns the object stored by the cluster. Does not wait for readiness
    /// and does not retry.
    pub async fn deploy(&self, pod: &Pod) -> Result<Pod, K8sError> {
        let name = pod.metadata.name.as_deref().ok_or(K8sError::MissingName)?;
        info!(pod = name, namespace = %self.namespace, "Deploying target pod to cluster...");

        Ok(self.api().create(&PostParams::default(), pod).await?)
    }

    /// Polls pods matching `selector` until exactly one of them is running and ready.
    ///
    /// Fails with [K8sError::ReadinessTimeout] once the configured timeout elapses, or with
    /// [K8sError::WaitCancelled] as soon as `cancel` is triggered.
    pub async fn wait_ready(
        &self,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Pod, K8sError> {
        info!(selector, namespace = %self.namespace, "Waiting target pod to start...");
        let api = self.api();
        let params = ListParams::default().labels(selector);

        let poll = async {
            loop {
                match api.list(&params).await {
                    Ok(list) => {
                        if let Some(pod) = single_ready_pod(list.items) {
                            return pod;
                        }
                    }
                    // Listing errors are retried until the readiness deadline.
                    Err(err) => debug!(selector, %err, "listing pods failed"),
                }
                sleep(self.readiness.poll_interval).await;
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(K8sError::WaitCancelled(selector.to_string())),
            result = timeout(self.readiness.timeout, poll) => {
                result.map_err(|_| K8sError::ReadinessTimeout {
                    selector: selector.to_string(),
                    timeout: self.readiness.timeout,
                })
            }
        }
    }

    /// Deletes the pod with foreground cascading propagation, so dependents are removed before
    /// the pod itself.
    pub async fn try_teardown(&self, name: &str) -> Result<(), K8sError> {
        info!(pod = name, namespace = %self.namespace, "Delete test pod");
        self.api().delete(name, &DeleteParams::foreground()).await?;
        Ok(())
    }

    /// Same as [PodLifecycle::try_teardown] but failures are only logged. The deletion is not retried.
    pub async fn teardown(&self, name: &str) {
        if let Err(err) = self.try_teardown(name).await {
            warn!(pod = name, namespace = %self.namespace, %err, "failed to delete test pod");
        }
    }
}

/// Returns the pod when `pods` holds exactly one pod and it is ready.
fn single_ready_pod(mut pods: Vec<Pod>) -> Option<Pod> {
    if pods.len() == 1 && is_pod_ready(&pods[0]) {
        pods.pop()
    } else {
        None
    }
}

pub fn is_pod_ready(pod: &Pod) -> bool {
    is_pod_running().matches_object(Some(pod))
        && pod
            .status
            .as_ref()
            .and_then(|status| status.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == READY_CONDITION && c.status == CONDITION_TRUE)
            })
}

/// Tears the pod down when the guarded region ends.
///
/// [PodGuard::release] awaits the deletion. If the guard is dropped while still armed (the owning
/// future was dropped before releasing it) the deletion is spawned on the current runtime.
pub struct PodGuard {
    lifecycle: PodLifecycle,
    pod_name: String,
    armed: bool,
}

impl PodGuard {
    pub fn new(lifecycle: PodLifecycle, pod_name: impl Into<String>) -> Self {
        Self {
            lifecycle,
            pod_name: pod_name.into(),
            armed: true,
        }
    }

    pub fn pod_name(&self) -> &str {
        &self.pod_name
    }

    /// Awaits the deletion. The guard stays armed until it returns, so dropping this future
    /// midway still triggers the deletion from [Drop].
    pub async fn release(mut self) {
        self.lifecycle.teardown(&self.pod_name).await;
        self.armed = false;
    }
}

impl Drop for PodGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let lifecycle = self.lifecycle.clone();
        let pod_name = std::mem::take(&mut self.pod_name);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { lifecycle.teardown(&pod_name).await });
            }
            Err(err) => {
                warn!(pod = %pod_name, %err, "no runtime available to delete test pod");
            }
        }
    }
}
