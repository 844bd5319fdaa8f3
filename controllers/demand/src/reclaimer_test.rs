//! Unit tests for the demand reclaimer

#[cfg(test)]
mod tests {
    use crate::reclaimer::{DemandReclaimer, is_managed_pod, newly_scheduled};
    use crate::test_utils::create_test_pod;
    use crds::demand_name_for_pod;
    use demand_client::{MockDemandClient, delete_demand_if_exists};
    use std::sync::Arc;

    #[test]
    fn test_managed_pod_filter() {
        let managed = create_test_pod("driver-1", "jobs", true, None);
        let unmanaged = create_test_pod("driver-1", "jobs", false, None);

        assert!(is_managed_pod(&managed));
        assert!(!is_managed_pod(&unmanaged));
    }

    #[test]
    fn test_newly_scheduled_transitions() {
        let unscheduled = create_test_pod("driver-1", "jobs", true, None);
        let scheduled = create_test_pod("driver-1", "jobs", true, Some("node-a"));

        assert!(newly_scheduled(&unscheduled, &scheduled));
        assert!(
            !newly_scheduled(&scheduled, &scheduled),
            "an already-present node assignment is not a transition"
        );
        assert!(!newly_scheduled(&unscheduled, &unscheduled));
    }

    #[test]
    fn test_empty_node_name_is_not_scheduled() {
        let empty_node = create_test_pod("driver-1", "jobs", true, Some(""));
        let scheduled = create_test_pod("driver-1", "jobs", true, Some("node-a"));

        assert!(newly_scheduled(&empty_node, &scheduled));
    }

    #[tokio::test]
    async fn test_scheduled_transition_deletes_demand() {
        let client = Arc::new(MockDemandClient::new());
        client.add_demand("jobs", "demand-driver-1");
        let reclaimer = DemandReclaimer::new(client.clone());

        let old = create_test_pod("driver-1", "jobs", true, None);
        let new = create_test_pod("driver-1", "jobs", true, Some("node-a"));
        reclaimer.on_pod_update(&old, &new).await;

        let calls = client.delete_calls();
        assert_eq!(
            calls,
            vec![("jobs".to_string(), demand_name_for_pod("driver-1"))]
        );
    }

    #[tokio::test]
    async fn test_unmanaged_pod_triggers_no_delete() {
        let client = Arc::new(MockDemandClient::new());
        let reclaimer = DemandReclaimer::new(client.clone());

        let old = create_test_pod("driver-1", "jobs", false, None);
        let new = create_test_pod("driver-1", "jobs", false, Some("node-a"));
        reclaimer.on_pod_update(&old, &new).await;

        assert!(client.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn test_already_scheduled_pod_triggers_no_delete() {
        let client = Arc::new(MockDemandClient::new());
        let reclaimer = DemandReclaimer::new(client.clone());

        let old = create_test_pod("driver-1", "jobs", true, Some("node-a"));
        let new = create_test_pod("driver-1", "jobs", true, Some("node-a"));
        reclaimer.on_pod_update(&old, &new).await;

        assert!(client.delete_calls().is_empty());
    }

    #[tokio::test]
    async fn test_reclaim_without_matching_demand_is_quiet() {
        // No demand seeded: the delete reports absence, which the handler
        // must treat as success.
        let client = Arc::new(MockDemandClient::new());
        let reclaimer = DemandReclaimer::new(client.clone());

        let old = create_test_pod("driver-1", "jobs", true, None);
        let new = create_test_pod("driver-1", "jobs", true, Some("node-a"));
        reclaimer.on_pod_update(&old, &new).await;

        assert_eq!(client.delete_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        // Both the scheduling path and the reclaimer may delete the same
        // demand; whichever runs second must still succeed.
        let client = MockDemandClient::new();
        client.add_demand("jobs", "demand-driver-1");

        delete_demand_if_exists(&client, "jobs", "demand-driver-1", "test")
            .await
            .expect("first delete");
        delete_demand_if_exists(&client, "jobs", "demand-driver-1", "test")
            .await
            .expect("second delete succeeds without a matching demand");

        assert_eq!(client.delete_calls().len(), 2);
    }
}
