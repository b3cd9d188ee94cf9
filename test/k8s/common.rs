use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{Api, DeleteParams, PostParams},
    Client,
};
use shovel_harness::config::{ClusterConfig, HarnessConfig, ReadinessConfig};
use shovel_harness::k8s::client::try_new_client;
use std::time::Duration;

/// Namespaces created through [K8sEnv::test_namespace] are deleted when the env is dropped.
pub struct K8sEnv {
    client: Client,
    generated_namespaces: Vec<String>,
}

impl K8sEnv {
    /// Connects using `$KUBECONFIG` or the default kubeconfig location.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(K8sEnv {
            client: try_new_client(&ClusterConfig::default()).await?,
            generated_namespaces: Vec::new(),
        })
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub async fn test_namespace(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        let mut test_namespace = Namespace::default();
        test_namespace.metadata.generate_name = Some("shovel-harness-test-".to_string());

        let namespaces: Api<Namespace> = Api::all(self.client.clone());

        let created_namespace = namespaces
            .create(&PostParams::default(), &test_namespace)
            .await?;

        let ns = created_namespace
            .metadata
            .name
            .ok_or("created namespace has no name")?;
        self.generated_namespaces.push(ns.clone());
        Ok(ns)
    }

    async fn clean_up(&self) {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());

        for ns in self.generated_namespaces.iter() {
            let _ = namespaces
                .delete(ns.as_str(), &DeleteParams::default())
                .await;
        }
    }
}

impl Drop for K8sEnv {
    fn drop(&mut self) {
        // clean up test environment even if the test panics.
        // async drop doesn't exist so this needs to be run sync code.
        futures::executor::block_on(self.clean_up());
    }
}

/// Harness config pointing to `namespace`, with a readiness timeout suited for slow image pulls.
pub fn harness_config(namespace: &str) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.cluster.namespace = namespace.to_string();
    config.readiness = ReadinessConfig {
        timeout: Duration::from_secs(300),
        poll_interval: Duration::from_secs(1),
    };
    config
}
