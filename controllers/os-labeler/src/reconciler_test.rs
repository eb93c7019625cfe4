//! Unit tests for the Node reconciler

#[cfg(test)]
mod tests {
    use crate::error::ControllerError;
    use crate::labels::LABEL_VALUE;
    use crate::labels::known::{FLATCAR_LABEL, UBUNTU_LABEL};
    use crate::reconciler::{ReconcileOutcome, RequeueReason};
    use crate::test_utils::*;
    use k8s_openapi::api::core::v1::Node;
    use node_store::NodeStoreError;
    use std::collections::BTreeMap;

    fn labels_of(node: &Node) -> BTreeMap<String, String> {
        node.metadata.labels.clone().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_reconcile_labels_node_without_labels() {
        let (reconciler, store) =
            create_test_reconciler(vec![create_test_node("n1", Some("CentOS Linux 8"), None)]);

        let outcome = reconciler.reconcile_node("n1").await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Labeled { label: "k8c.io/uses-centoslinux8".to_string() }
        );
        let expected = BTreeMap::from([("k8c.io/uses-centoslinux8".to_string(), "true".to_string())]);
        assert_eq!(labels_of(&store.node("n1").unwrap()), expected);
        assert_eq!(store.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_existing_label_issues_no_write() {
        let label = "k8c.io/uses-flatcarcontainerlinuxbykinvolk";
        let (reconciler, store) = create_test_reconciler(vec![create_test_node(
            "n2",
            Some("Flatcar Container Linux by Kinvolk"),
            Some(&[(label, "true")]),
        )]);

        let outcome = reconciler.reconcile_node("n2").await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Unchanged { label: label.to_string() });
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (reconciler, store) =
            create_test_reconciler(vec![create_test_node("n1", Some("Ubuntu 22.04.1 LTS"), None)]);

        let first = reconciler.reconcile_node("n1").await.unwrap();
        let second = reconciler.reconcile_node("n1").await.unwrap();

        assert!(matches!(first, ReconcileOutcome::Labeled { .. }));
        assert_eq!(
            second,
            ReconcileOutcome::Unchanged { label: "k8c.io/uses-ubuntu22.04.1lts".to_string() }
        );
        assert_eq!(store.update_calls(), 1, "only the first reconcile should write");
        assert_eq!(store.get_calls(), 2);
    }

    #[tokio::test]
    async fn test_reconcile_preserves_unrelated_labels() {
        let (reconciler, store) = create_test_reconciler(vec![create_test_node(
            "worker-1",
            Some("Ubuntu"),
            Some(&[("kubernetes.io/hostname", "worker-1"), ("node-role.kubernetes.io/worker", "")]),
        )]);

        reconciler.reconcile_node("worker-1").await.unwrap();

        let labels = labels_of(&store.node("worker-1").unwrap());
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(UBUNTU_LABEL).map(String::as_str), Some(LABEL_VALUE));
        assert_eq!(labels.get("kubernetes.io/hostname").map(String::as_str), Some("worker-1"));
    }

    #[tokio::test]
    async fn test_reconcile_overwrites_non_true_value() {
        let (reconciler, store) = create_test_reconciler(vec![create_test_node(
            "worker-1",
            Some("Flatcar"),
            Some(&[(FLATCAR_LABEL, "false")]),
        )]);

        let outcome = reconciler.reconcile_node("worker-1").await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Labeled { label: FLATCAR_LABEL.to_string() });
        let labels = labels_of(&store.node("worker-1").unwrap());
        assert_eq!(labels.get(FLATCAR_LABEL).map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_reconcile_new_os_image_adds_second_label() {
        // An OS upgrade adds the new label; the old one is left in place
        let (reconciler, store) = create_test_reconciler(vec![create_test_node(
            "worker-1",
            Some("Ubuntu 24.04 LTS"),
            Some(&[("k8c.io/uses-ubuntu22.04lts", "true")]),
        )]);

        reconciler.reconcile_node("worker-1").await.unwrap();

        let labels = labels_of(&store.node("worker-1").unwrap());
        assert_eq!(labels.get("k8c.io/uses-ubuntu24.04lts").map(String::as_str), Some("true"));
        assert_eq!(labels.get("k8c.io/uses-ubuntu22.04lts").map(String::as_str), Some("true"));
    }

    #[tokio::test]
    async fn test_reconcile_missing_node_is_noop() {
        let (reconciler, store) = create_test_reconciler(vec![]);

        let outcome = reconciler.reconcile_node("ghost").await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::NodeGone);
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_node_without_os_image_is_noop() {
        let (reconciler, store) = create_test_reconciler(vec![
            create_test_node("booting", None, None),
            create_test_node("blank", Some(""), None),
        ]);

        assert_eq!(reconciler.reconcile_node("booting").await.unwrap(), ReconcileOutcome::AwaitingOsImage);
        assert_eq!(reconciler.reconcile_node("blank").await.unwrap(), ReconcileOutcome::AwaitingOsImage);
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_fetch_failure_is_error() {
        let (reconciler, store) =
            create_test_reconciler(vec![create_test_node("n1", Some("Ubuntu"), None)]);
        store.fail_next_get(NodeStoreError::Unavailable("connection refused".to_string()));

        let result = reconciler.reconcile_node("n1").await;

        match result {
            Err(ControllerError::FetchNode { name, .. }) => assert_eq!(name, "n1"),
            other => panic!("expected FetchNode error, got {other:?}"),
        }
        assert_eq!(store.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_update_conflict_requeues() {
        let (reconciler, store) =
            create_test_reconciler(vec![create_test_node("n1", Some("RHEL"), None)]);
        store.fail_next_update(NodeStoreError::Conflict("n1".to_string()));

        let outcome = reconciler.reconcile_node("n1").await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Requeue(RequeueReason::Conflict));
        assert!(labels_of(&store.node("n1").unwrap()).is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_update_not_found_requeues() {
        let (reconciler, store) =
            create_test_reconciler(vec![create_test_node("n1", Some("Fedora"), None)]);
        store.fail_next_update(NodeStoreError::NotFound("n1".to_string()));

        let outcome = reconciler.reconcile_node("n1").await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Requeue(RequeueReason::NodeDeleted));
    }

    #[tokio::test]
    async fn test_reconcile_update_failure_is_error() {
        let (reconciler, store) =
            create_test_reconciler(vec![create_test_node("n1", Some("Fedora"), None)]);
        store.fail_next_update(NodeStoreError::Unavailable("admission webhook timed out".to_string()));

        let result = reconciler.reconcile_node("n1").await;

        assert!(matches!(result, Err(ControllerError::UpdateNode { ref name, .. }) if name == "n1"));
        assert_eq!(store.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_requeue_after_conflict_then_settles() {
        let (reconciler, store) =
            create_test_reconciler(vec![create_test_node("n1", Some("CentOS"), None)]);
        store.fail_next_update(NodeStoreError::Conflict("n1".to_string()));

        let first = reconciler.reconcile_node("n1").await.unwrap();
        let second = reconciler.reconcile_node("n1").await.unwrap();
        let third = reconciler.reconcile_node("n1").await.unwrap();

        assert_eq!(first, ReconcileOutcome::Requeue(RequeueReason::Conflict));
        assert!(matches!(second, ReconcileOutcome::Labeled { .. }));
        assert!(matches!(third, ReconcileOutcome::Unchanged { .. }));
        assert_eq!(store.update_calls(), 2);
    }

    #[tokio::test]
    async fn test_requeue_after_delete_then_settles() {
        let (reconciler, store) =
            create_test_reconciler(vec![create_test_node("n1", Some("CentOS"), None)]);
        store.fail_next_update(NodeStoreError::NotFound("n1".to_string()));

        let first = reconciler.reconcile_node("n1").await.unwrap();
        store.remove_node("n1");
        let second = reconciler.reconcile_node("n1").await.unwrap();

        assert_eq!(first, ReconcileOutcome::Requeue(RequeueReason::NodeDeleted));
        assert_eq!(second, ReconcileOutcome::NodeGone);
        assert_eq!(store.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_node_from_kubelet_json() {
        let node: Node = serde_json::from_value(serde_json::json!({
            "apiVersion": "v1",
            "kind": "Node",
            "metadata": {
                "name": "ip-10-0-1-23.ec2.internal",
                "labels": { "kubernetes.io/os": "linux" }
            },
            "status": {
                "nodeInfo": {
                    "architecture": "arm64",
                    "bootID": "",
                    "containerRuntimeVersion": "containerd://1.7.11",
                    "kernelVersion": "6.1.66",
                    "kubeProxyVersion": "v1.29.0",
                    "kubeletVersion": "v1.29.0",
                    "machineID": "",
                    "operatingSystem": "linux",
                    "osImage": "Amazon Linux 2023.3.20240122",
                    "systemUUID": ""
                }
            }
        }))
        .unwrap();
        let (reconciler, store) = create_test_reconciler(vec![node]);

        let outcome = reconciler.reconcile_node("ip-10-0-1-23.ec2.internal").await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Labeled { label: "k8c.io/uses-amazonlinux2023.3.20240122".to_string() }
        );
        assert_eq!(store.update_calls(), 1);
    }
}
