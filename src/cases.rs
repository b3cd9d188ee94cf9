use crate::error::HarnessError;
use crate::test_case::TestCase;
use crate::topology::{PodFactory, TARGET_CONTAINER_NAME};

const CONTAINER_KEY: &str = "container";

/// Cases every command is exercised with, followed by the command specific `additional` ones.
pub fn standard_cases(
    factory: &PodFactory,
    additional: Vec<TestCase>,
) -> Result<Vec<TestCase>, HarnessError> {
    let mut cases = vec![
        factory.case("Basic test with output on host"),
        factory
            .case("Basic test with downloading output")
            .download_output(),
        factory
            .case("MultiContainer pod")
            .with_pod(factory.multi_container_pod())
            .with_args(&[CONTAINER_KEY, TARGET_CONTAINER_NAME])?
            .download_output(),
        factory
            .case("MultiContainer pod with default-container annotation")
            .with_pod(factory.multi_container_pod_with_default_container())
            .download_output(),
        factory
            .case("MultiContainer pod with shared mount")
            .with_pod(factory.multi_container_pod_with_shared_mount())
            .with_args(&[CONTAINER_KEY, TARGET_CONTAINER_NAME])?
            .download_output(),
    ];
    cases.extend(additional);

    Ok(cases)
}
