//! Test pod topologies.
//!
//! Every constructor returns a complete [Pod] with a freshly generated name and `app` label, so
//! test cases running concurrently never collide on name nor on label selector.
use crate::config::ImagesConfig;
use crate::k8s::annotations::Annotations;
use crate::k8s::labels::PodLabels;
use crate::test_case::TestCase;
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EmptyDirVolumeSource, HTTPGetAction, Pod, PodSpec, Probe, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::ObjectMeta;
use std::fmt;
use uuid::Uuid;

pub const TARGET_POD_NAME_PREFIX: &str = "sample-app";
pub const TARGET_CONTAINER_NAME: &str = "target";
pub const SIDECAR_CONTAINER_NAME: &str = "sidecar";

pub const SHARED_VOLUME_NAME: &str = "shared-path-to-tmp";
/// Folder the dumper writes its artifacts to inside the target container.
pub const SHARED_MOUNT_PATH: &str = "/tmp";

const APP_PORT_NAME: &str = "app";
const APP_PORT: i32 = 6000;
const LIVENESS_PATH: &str = "/health/live";
const LIVENESS_INITIAL_DELAY_SECONDS: i32 = 2;
const LIVENESS_TIMEOUT_SECONDS: i32 = 1;
const LIVENESS_PERIOD_SECONDS: i32 = 1;
const LIVENESS_SUCCESS_THRESHOLD: i32 = 1;
const LIVENESS_FAILURE_THRESHOLD: i32 = 5;

/// Shape of a test pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    SingleContainer,
    MultiContainer,
    MultiContainerWithDefaultContainer,
    MultiContainerWithSharedMount,
}

impl Topology {
    pub const ALL: [Topology; 4] = [
        Topology::SingleContainer,
        Topology::MultiContainer,
        Topology::MultiContainerWithDefaultContainer,
        Topology::MultiContainerWithSharedMount,
    ];
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Topology::SingleContainer => "single-container",
            Topology::MultiContainer => "multi-container",
            Topology::MultiContainerWithDefaultContainer => "multi-container-default-container",
            Topology::MultiContainerWithSharedMount => "multi-container-shared-mount",
        };
        f.write_str(name)
    }
}

/// Builds test pods out of the configured images.
#[derive(Debug, Clone)]
pub struct PodFactory {
    target_image: String,
    sidecar_image: String,
}

impl Default for PodFactory {
    fn default() -> Self {
        Self::new(&ImagesConfig::default())
    }
}

impl PodFactory {
    pub fn new(images: &ImagesConfig) -> Self {
        Self {
            target_image: images.target.clone(),
            sidecar_image: images.sidecar.clone(),
        }
    }

    /// Test case targeting a single container pod built out of the configured images.
    pub fn case(&self, name: impl Into<String>) -> TestCase {
        TestCase::new(name).with_pod(self.single_container_pod())
    }

    pub fn pod(&self, topology: Topology) -> Pod {
        match topology {
            Topology::SingleContainer => self.single_container_pod(),
            Topology::MultiContainer => self.multi_container_pod(),
            Topology::MultiContainerWithDefaultContainer => {
                self.multi_container_pod_with_default_container()
            }
            Topology::MultiContainerWithSharedMount => self.multi_container_pod_with_shared_mount(),
        }
    }

    pub fn single_container_pod(&self) -> Pod {
        Pod {
            metadata: random_pod_meta(),
            spec: Some(PodSpec {
                containers: vec![self.target_container()],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn multi_container_pod(&self) -> Pod {
        Pod {
            metadata: random_pod_meta(),
            spec: Some(PodSpec {
                containers: vec![self.target_container(), self.sidecar_container()],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Same as [PodFactory::multi_container_pod] but annotated so the target container is the default one.
    pub fn multi_container_pod_with_default_container(&self) -> Pod {
        let mut pod = self.multi_container_pod();
        pod.metadata.annotations =
            Some(Annotations::new_default_container_annotation(TARGET_CONTAINER_NAME).get());
        pod
    }

    /// Same as [PodFactory::multi_container_pod] plus an `emptyDir` volume mounted at
    /// [SHARED_MOUNT_PATH] in both containers.
    pub fn multi_container_pod_with_shared_mount(&self) -> Pod {
        let mounts = vec![VolumeMount {
            name: SHARED_VOLUME_NAME.to_string(),
            mount_path: SHARED_MOUNT_PATH.to_string(),
            ..Default::default()
        }];

        let mut target = self.target_container();
        target.volume_mounts = Some(mounts.clone());

        let mut sidecar = self.sidecar_container();
        sidecar.volume_mounts = Some(mounts);

        Pod {
            metadata: random_pod_meta(),
            spec: Some(PodSpec {
                containers: vec![target, sidecar],
                volumes: Some(vec![Volume {
                    name: SHARED_VOLUME_NAME.to_string(),
                    empty_dir: Some(EmptyDirVolumeSource::default()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn target_container(&self) -> Container {
        Container {
            name: TARGET_CONTAINER_NAME.to_string(),
            image: Some(self.target_image.clone()),
            image_pull_policy: Some("IfNotPresent".to_string()),
            ports: Some(vec![ContainerPort {
                container_port: APP_PORT,
                name: Some(APP_PORT_NAME.to_string()),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            liveness_probe: Some(Probe {
                http_get: Some(HTTPGetAction {
                    path: Some(LIVENESS_PATH.to_string()),
                    port: IntOrString::String(APP_PORT_NAME.to_string()),
                    scheme: Some("HTTP".to_string()),
                    ..Default::default()
                }),
                initial_delay_seconds: Some(LIVENESS_INITIAL_DELAY_SECONDS),
                timeout_seconds: Some(LIVENESS_TIMEOUT_SECONDS),
                period_seconds: Some(LIVENESS_PERIOD_SECONDS),
                success_threshold: Some(LIVENESS_SUCCESS_THRESHOLD),
                failure_threshold: Some(LIVENESS_FAILURE_THRESHOLD),
                ..Default::default()
            }),
            termination_message_policy: Some("FallbackToLogsOnError".to_string()),
            ..Default::default()
        }
    }

    fn sidecar_container(&self) -> Container {
        Container {
            name: SIDECAR_CONTAINER_NAME.to_string(),
            image: Some(self.sidecar_image.clone()),
            ..Default::default()
        }
    }
}

/// Metadata with a unique name (`sample-app-<uuid>`) and the matching `app` label.
pub fn random_pod_meta() -> ObjectMeta {
    let name = format!("{TARGET_POD_NAME_PREFIX}-{}", Uuid::new_v4());

    ObjectMeta {
        labels: Some(PodLabels::new(&name).get()),
        name: Some(name),
        ..Default::default()
    }
}
