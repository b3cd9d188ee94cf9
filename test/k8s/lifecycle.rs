use crate::common::{harness_config, K8sEnv};
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use shovel_harness::k8s::annotations::resolve_target_container;
use shovel_harness::k8s::labels;
use shovel_harness::k8s::lifecycle::{is_pod_ready, PodLifecycle};
use shovel_harness::topology::{PodFactory, Topology, TARGET_CONTAINER_NAME};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

// tokio test runs with 1 thread by default causing deadlock when executing `block_on` code (clean-up).
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "needs k8s cluster"]
async fn k8s_every_topology_becomes_ready_and_is_deleted() -> Result<(), Box<dyn std::error::Error>>
{
    let mut env = K8sEnv::new().await?;
    let namespace = env.test_namespace().await?;
    let config = harness_config(&namespace);
    let lifecycle = PodLifecycle::new(env.client(), namespace.clone(), config.readiness);
    let factory = PodFactory::new(&config.images);
    let pods: Api<Pod> = Api::namespaced(env.client(), &namespace);

    for topology in Topology::ALL {
        let pod = factory.pod(topology);
        let name = pod.metadata.name.clone().ok_or("pod without name")?;
        let selector = labels::selector(pod.metadata.labels.as_ref().ok_or("pod without labels")?);

        lifecycle.deploy(&pod).await?;
        let ready = lifecycle
            .wait_ready(&selector, &CancellationToken::new())
            .await?;
        assert!(is_pod_ready(&ready), "{topology} pod is not ready");

        // The cluster keeps the annotation, so tooling lands on the target container.
        if topology == Topology::MultiContainerWithDefaultContainer {
            assert_eq!(
                resolve_target_container(&ready, None)?,
                TARGET_CONTAINER_NAME
            );
        }

        lifecycle.try_teardown(&name).await?;
        wait_until_deleted(&pods, &name).await;
    }

    Ok(())
}

async fn wait_until_deleted(pods: &Api<Pod>, name: &str) {
    for _ in 0..120 {
        if let Ok(None) = pods.get_opt(name).await {
            return;
        }
        sleep(Duration::from_secs(1)).await;
    }
    panic!("pod {name} was not deleted");
}
