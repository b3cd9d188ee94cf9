use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;
use thiserror::Error;

/// Well-known annotation naming the container tooling should target when no container is given.
pub const DEFAULT_CONTAINER_ANNOTATION_KEY: &str = "kubectl.kubernetes.io/default-container";

/// Collection of annotations set on test pods.
#[derive(Debug, PartialEq, Default, Clone)]
pub struct Annotations(BTreeMap<String, String>);

impl Annotations {
    pub fn new_default_container_annotation(container_name: &str) -> Self {
        let mut annotations = Self::default();
        annotations.0.insert(
            DEFAULT_CONTAINER_ANNOTATION_KEY.to_string(),
            container_name.to_string(),
        );
        annotations
    }

    pub fn get(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }
}

pub fn get_default_container_value(annotations: &BTreeMap<String, String>) -> Option<&String> {
    annotations.get(DEFAULT_CONTAINER_ANNOTATION_KEY)
}

#[derive(Error, Debug, PartialEq)]
pub enum ContainerResolutionError {
    #[error("container `{0}` not found in pod")]
    NotFound(String),

    #[error("pod has {0} containers, a container name must be provided")]
    Ambiguous(usize),

    #[error("pod has no containers")]
    NoContainers,
}

/// Resolves the container a tool acts on: the explicit name when provided, then the
/// default-container annotation, then the only container of the pod.
pub fn resolve_target_container(
    pod: &Pod,
    explicit: Option<&str>,
) -> Result<String, ContainerResolutionError> {
    let containers = pod
        .spec
        .as_ref()
        .map(|spec| spec.containers.as_slice())
        .unwrap_or_default();

    let annotated = pod
        .metadata
        .annotations
        .as_ref()
        .and_then(get_default_container_value)
        .map(String::as_str);

    let wanted = match (explicit, annotated) {
        (Some(name), _) | (None, Some(name)) => name,
        (None, None) => {
            return match containers {
                [] => Err(ContainerResolutionError::NoContainers),
                [only] => Ok(only.name.clone()),
                many => Err(ContainerResolutionError::Ambiguous(many.len())),
            };
        }
    };

    containers
        .iter()
        .find(|c| c.name == wanted)
        .map(|c| c.name.clone())
        .ok_or_else(|| ContainerResolutionError::NotFound(wanted.to_string()))
}
