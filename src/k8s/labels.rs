use std::collections::BTreeMap;

pub const APP_LABEL_KEY: &str = "app";

/// Collection of labels identifying a single test pod.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PodLabels(BTreeMap<String, String>);

impl PodLabels {
    /// Creates the label set `{"app": <app_name>}`.
    pub fn new(app_name: &str) -> Self {
        PodLabels(BTreeMap::from([(
            APP_LABEL_KEY.to_string(),
            app_name.to_string(),
        )]))
    }

    pub fn get(&self) -> BTreeMap<String, String> {
        self.0.clone()
    }

    /// Prints a label selector that matches all labels in the set.
    pub fn selector(&self) -> String {
        selector(&self.0)
    }
}

impl From<BTreeMap<String, String>> for PodLabels {
    fn from(labels: BTreeMap<String, String>) -> Self {
        PodLabels(labels)
    }
}

/// Prints a label selector that matches all the provided labels.
pub fn selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}=={v}"))
        .collect::<Vec<_>>()
        .join(",")
}
