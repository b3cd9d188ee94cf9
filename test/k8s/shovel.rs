use crate::common::{harness_config, K8sEnv};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use shovel_harness::cases::standard_cases;
use shovel_harness::harness::Harness;
use shovel_harness::subject::ShovelBinary;
use shovel_harness::test_case::TestCase;
use shovel_harness::topology::{PodFactory, TARGET_POD_NAME_PREFIX};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs the catalogue for a command with the `kubectl-shovel` binary found in `$PATH`.
async fn run_catalogue(
    command: &str,
    additional: impl FnOnce(&PodFactory) -> Vec<TestCase>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut env = K8sEnv::new().await?;
    let namespace = env.test_namespace().await?;
    let config = harness_config(&namespace);
    let factory = PodFactory::new(&config.images);
    let subject = Arc::new(ShovelBinary::new(config.subject_binary.clone()));
    let harness = Harness::new(config, env.client(), subject, CancellationToken::new());

    let cases = standard_cases(&factory, additional(&factory))?;
    let report = harness.run_command(command, cases).await?;

    for case in report.failures() {
        eprintln!("{}: {:?}", case.name, case.result);
    }
    assert!(report.passed());

    // Every target pod has been deleted (or is being deleted).
    let pods: Api<Pod> = Api::namespaced(env.client(), &namespace);
    let leftovers = pods
        .list(&ListParams::default())
        .await?
        .items
        .into_iter()
        .filter(|pod| {
            pod.metadata
                .name
                .as_deref()
                .is_some_and(|name| name.starts_with(TARGET_POD_NAME_PREFIX))
                && pod.metadata.deletion_timestamp.is_none()
        })
        .count();
    assert_eq!(leftovers, 0);

    Ok(())
}

// tokio test runs with 1 thread by default causing deadlock when executing `block_on` code (clean-up).
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "needs k8s cluster"]
async fn k8s_dump() -> Result<(), Box<dyn std::error::Error>> {
    run_catalogue("dump", |_| Vec::new()).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "needs k8s cluster"]
async fn k8s_gcdump() -> Result<(), Box<dyn std::error::Error>> {
    run_catalogue("gcdump", |_| Vec::new()).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "needs k8s cluster"]
async fn k8s_trace() -> Result<(), Box<dyn std::error::Error>> {
    run_catalogue("trace", |factory| {
        vec![factory
            .case("Trace with duration")
            .with_args(&["duration", "00:00:00:05"])
            .expect("even number of args")]
    })
    .await
}
