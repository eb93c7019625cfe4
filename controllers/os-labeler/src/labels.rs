//! OS label schema.
//!
//! Every node gets one label of the form `k8c.io/uses-<os>` with value
//! `"true"`, where `<os>` is the node's reported OS image lowercased with all
//! spaces removed (spaces are not allowed in label names).

use k8s_openapi::api::core::v1::Node;
use std::collections::BTreeMap;

/// Prefix shared by every label this controller writes.
pub const LABEL_NAMESPACE: &str = "k8c.io";

/// Value carried by every OS label.
pub const LABEL_VALUE: &str = "true";

/// Keys produced for the bare distribution names, as used in node selectors.
#[cfg_attr(not(test), allow(dead_code, reason = "node selector keys for workloads"))]
pub mod known {
    /// OS image "Ubuntu"
    pub const UBUNTU_LABEL: &str = "k8c.io/uses-ubuntu";
    /// OS image "CentOS"
    pub const CENTOS_LABEL: &str = "k8c.io/uses-centos";
    /// OS image "Flatcar"
    pub const FLATCAR_LABEL: &str = "k8c.io/uses-flatcar";
    /// OS image "Fedora"
    pub const FEDORA_LABEL: &str = "k8c.io/uses-fedora";
    /// OS image "RHEL"
    pub const RHEL_LABEL: &str = "k8c.io/uses-rhel";
}

/// Canonical OS key: lowercase, every space character stripped.
#[must_use]
pub fn os_key(os_image: &str) -> String {
    os_image.replace(' ', "").to_lowercase()
}

/// Label key for a reported OS image.
#[must_use]
pub fn os_label_key(os_image: &str) -> String {
    format!("{LABEL_NAMESPACE}/uses-{}", os_key(os_image))
}

/// OS image the kubelet reported in `status.nodeInfo.osImage`, if any.
#[must_use]
pub fn os_image(node: &Node) -> Option<&str> {
    node.status
        .as_ref()
        .and_then(|status| status.node_info.as_ref())
        .map(|info| info.os_image.as_str())
        .filter(|image| !os_key(image).is_empty())
}

/// Whether `labels` already carries `key` set to `"true"`.
#[must_use]
pub fn has_os_label(labels: Option<&BTreeMap<String, String>>, key: &str) -> bool {
    labels
        .and_then(|labels| labels.get(key))
        .is_some_and(|value| value == LABEL_VALUE)
}
