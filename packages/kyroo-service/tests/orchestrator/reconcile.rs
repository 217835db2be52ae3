use std::sync::atomic::Ordering;

use kyroo_service::{CreateCollectionRequest, WorkspaceStore};
use kyroo_testkit::StubResponse;

use super::Harness;

async fn pending_collection(harness: &Harness) -> (uuid::Uuid, uuid::Uuid) {
	let workspace = harness.create_workspace("u1", false).await;
	let created = harness
		.service
		.create_collection(CreateCollectionRequest {
			workspace_id: workspace.workspace_id,
			requester_id: "u1".to_string(),
			name: "Notes".to_string(),
			description: None,
			schema: None,
		})
		.await
		.expect("Collection creation failed.");

	assert_eq!(created.collection.status, "pending");

	harness
		.store
		.set_workspace_cluster(workspace.workspace_id, "in01-late")
		.await
		.expect("Failed to attach cluster.");

	(workspace.workspace_id, created.collection.collection_id)
}

#[tokio::test]
async fn reports_dangling_and_untracked_clusters() {
	let harness = Harness::with_defaults(false).await;

	harness.cluster_ok("in01-gone");

	let workspace = harness.create_workspace("u1", true).await;
	let stray_name = format!("workspace-{}", uuid::Uuid::new_v4());

	harness.stub.push(
		"GET",
		"/v1/clusters",
		StubResponse::ok(serde_json::json!({
			"clusters": [
				{ "clusterId": "in01-stray", "clusterName": stray_name, "status": "RUNNING" },
				{ "clusterId": "in01-other", "clusterName": "analytics", "status": "RUNNING" },
			],
		})),
	);

	let report = harness.service.reconcile_clusters().await.expect("Reconciliation failed.");

	assert_eq!(report.tracked_clusters, 1);
	assert_eq!(report.remote_clusters, 2);
	assert_eq!(report.dangling.len(), 1);
	assert_eq!(report.dangling[0].workspace_id, workspace.workspace_id);
	assert_eq!(report.dangling[0].cluster_id, "in01-gone");
	assert_eq!(report.untracked.len(), 1);
	assert_eq!(report.untracked[0].cluster_id, "in01-stray");
	assert!(harness.store.workspace(workspace.workspace_id).is_some());
	assert_eq!(harness.stub.count("DELETE", "/v1"), 0);
}

#[tokio::test]
async fn reprovisioning_activates_pending_collections() {
	let harness = Harness::with_defaults(false).await;
	let (workspace_id, collection_id) = pending_collection(&harness).await;

	harness.collections_ok();

	let report = harness.service.reprovision_collections().await.expect("Reprovisioning failed.");
	let stored = harness.store.collections(workspace_id);

	assert_eq!(report.attempted, 1);
	assert_eq!(report.activated, vec![collection_id]);
	assert!(report.failed.is_empty());
	assert_eq!(stored[0].status, "active");
	assert!(stored[0].remote_name.as_deref().is_some_and(|name| name.starts_with("notes_")));

	let requests = harness.stub.requests();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].cluster_id.as_deref(), Some("in01-late"));
}

#[tokio::test]
async fn failed_reprovisioning_marks_the_collection_as_error() {
	let harness = Harness::with_defaults(false).await;
	let (workspace_id, collection_id) = pending_collection(&harness).await;

	harness.stub.push(
		"POST",
		"/v1/vector/collections",
		StubResponse::status(400, serde_json::json!({ "message": "bad schema" })),
	);

	let report = harness.service.reprovision_collections().await.expect("Reprovisioning failed.");
	let stored = harness.store.collections(workspace_id);

	assert_eq!(report.attempted, 1);
	assert!(report.activated.is_empty());
	assert_eq!(report.failed.len(), 1);
	assert_eq!(report.failed[0].collection_id, collection_id);
	assert!(report.failed[0].error.contains("bad schema"));
	assert_eq!(stored[0].status, "error");
	assert_eq!(stored[0].remote_name, None);
}

#[tokio::test]
async fn unrecorded_failures_keep_both_errors() {
	let harness = Harness::with_defaults(false).await;
	let (workspace_id, collection_id) = pending_collection(&harness).await;

	harness.stub.push(
		"POST",
		"/v1/vector/collections",
		StubResponse::status(400, serde_json::json!({ "message": "bad schema" })),
	);
	harness.store.fail_status_update.store(true, Ordering::SeqCst);

	let report = harness.service.reprovision_collections().await.expect("Reprovisioning failed.");

	assert_eq!(report.failed.len(), 1);
	assert_eq!(report.failed[0].collection_id, collection_id);
	assert!(report.failed[0].error.contains("bad schema"));
	assert!(report.failed[0].error.contains("Injected status update failure."));
	assert_eq!(harness.store.collections(workspace_id)[0].status, "pending");
}

#[tokio::test]
async fn collections_without_a_cluster_are_left_alone() {
	let harness = Harness::with_defaults(false).await;
	let workspace = harness.create_workspace("u1", false).await;

	harness
		.service
		.create_collection(CreateCollectionRequest {
			workspace_id: workspace.workspace_id,
			requester_id: "u1".to_string(),
			name: "Notes".to_string(),
			description: None,
			schema: None,
		})
		.await
		.expect("Collection creation failed.");

	let report = harness.service.reprovision_collections().await.expect("Reprovisioning failed.");

	assert_eq!(report.attempted, 0);
	assert_eq!(harness.store.collections(workspace.workspace_id)[0].status, "pending");
	assert!(harness.stub.requests().is_empty());
}
