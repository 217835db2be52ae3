use std::sync::atomic::Ordering;

use kyroo_domain::CollectionStatus;
use kyroo_providers::ErrorKind;
use kyroo_service::{ClusterOutcome, CreateWorkspaceRequest, Error};
use kyroo_testkit::StubResponse;

use super::Harness;

fn acme(provision_remote: bool) -> CreateWorkspaceRequest {
	CreateWorkspaceRequest {
		name: "Acme".to_string(),
		description: None,
		owner_id: "u1".to_string(),
		provision_remote,
	}
}

#[tokio::test]
async fn cluster_outage_leaves_a_valid_workspace() {
	let harness = Harness::new().await;

	harness.stub.set_default(
		"POST",
		"/v1/clusters",
		StubResponse::status(503, serde_json::json!({ "message": "capacity exhausted" })),
	);

	let created =
		harness.service.create_workspace(acme(true)).await.expect("Creation must not fail.");
	let workspace_id = created.workspace.workspace_id;
	let stored = harness.store.workspace(workspace_id).expect("Workspace row must exist.");
	let members = harness.store.members(workspace_id);

	assert_eq!(stored.cluster_id, None);
	assert_eq!(created.workspace.cluster_id, None);
	assert_eq!(members.len(), 1);
	assert_eq!(members[0].user_id, "u1");
	assert_eq!(members[0].role, "owner");
	assert_eq!(members[0].permissions, vec!["read", "write", "admin"]);
	assert!(matches!(
		&created.cluster,
		ClusterOutcome::Failed { error } if error.kind == ErrorKind::ServerError
	));
	assert_eq!(harness.stub.count("POST", "/v1/clusters"), 3);
	assert!(created.collections.is_empty());
	assert_eq!(harness.stub.count("POST", "/v1/vector/collections"), 0);
}

#[tokio::test]
async fn failed_ownership_grant_removes_the_workspace() {
	let harness = Harness::new().await;

	harness.store.fail_member_insert.store(true, Ordering::SeqCst);

	let err = harness
		.service
		.create_workspace(acme(true))
		.await
		.expect_err("A failed grant must abort creation.");

	assert!(matches!(err, Error::Conflict { .. }));
	assert_eq!(harness.store.workspace_count(), 0);
	assert!(harness.stub.requests().is_empty());
}

#[tokio::test]
async fn provisioned_workspace_gets_default_collections() {
	let harness = Harness::new().await;

	harness.cluster_ok("in01-abc");
	harness.collections_ok();

	let created =
		harness.service.create_workspace(acme(true)).await.expect("Creation must not fail.");
	let workspace_id = created.workspace.workspace_id;

	assert_eq!(created.cluster, ClusterOutcome::Provisioned { cluster_id: "in01-abc".to_string() });
	assert_eq!(created.workspace.cluster_id.as_deref(), Some("in01-abc"));
	assert_eq!(
		harness.store.workspace(workspace_id).and_then(|ws| ws.cluster_id).as_deref(),
		Some("in01-abc")
	);

	let names: Vec<&str> = created.collections.iter().map(|c| c.name.as_str()).collect();

	assert_eq!(names, vec!["Text Embeddings", "Image Embeddings"]);
	assert!(created.collections.iter().all(|c| c.status == Some(CollectionStatus::Active)));

	let requests = harness.stub.requests();
	let cluster_request = requests
		.iter()
		.find(|req| req.path == "/v1/clusters")
		.expect("Cluster request missing.");
	let collection_requests: Vec<_> =
		requests.iter().filter(|req| req.path == "/v1/vector/collections").collect();

	assert_eq!(cluster_request.body["clusterName"], format!("workspace-{workspace_id}"));
	assert_eq!(collection_requests.len(), 2);
	assert!(collection_requests.iter().all(|req| req.cluster_id.as_deref() == Some("in01-abc")));
	assert_eq!(collection_requests[0].body["schema"]["fields"][1]["elementTypeParams"]["dim"], 1_536);
	assert_eq!(collection_requests[1].body["schema"]["fields"][1]["elementTypeParams"]["dim"], 512);

	let stored = harness.store.collections(workspace_id);

	assert!(stored.iter().any(|c| {
		c.remote_name.as_deref().is_some_and(|name| name.starts_with("text_embeddings_"))
	}));
	assert!(stored.iter().any(|c| {
		c.remote_name.as_deref().is_some_and(|name| name.starts_with("image_embeddings_"))
	}));
}

#[tokio::test]
async fn one_failed_default_collection_does_not_block_the_other() {
	let harness = Harness::new().await;

	harness.cluster_ok("in01-abc");
	harness.stub.push(
		"POST",
		"/v1/vector/collections",
		StubResponse::status(400, serde_json::json!({ "message": "invalid index params" })),
	);
	harness.collections_ok();

	let created =
		harness.service.create_workspace(acme(true)).await.expect("Creation must not fail.");

	assert_eq!(created.collections.len(), 2);
	assert_eq!(created.collections[0].status, Some(CollectionStatus::Error));
	assert!(
		created.collections[0]
			.error
			.as_deref()
			.is_some_and(|message| message.contains("invalid index params"))
	);
	assert_eq!(created.collections[1].status, Some(CollectionStatus::Active));
	assert_eq!(created.collections[1].error, None);
	assert_eq!(harness.stub.count("POST", "/v1/vector/collections"), 2);
}

#[tokio::test]
async fn unrecorded_cluster_leaves_defaults_pending() {
	let harness = Harness::new().await;

	harness.cluster_ok("in01-abc");
	harness.collections_ok();
	harness.store.fail_set_cluster.store(true, Ordering::SeqCst);

	let created =
		harness.service.create_workspace(acme(true)).await.expect("Creation must not fail.");

	assert!(matches!(
		&created.cluster,
		ClusterOutcome::PersistFailed { cluster_id, .. } if cluster_id == "in01-abc"
	));
	assert_eq!(created.workspace.cluster_id, None);
	assert!(created.collections.iter().all(|c| c.status == Some(CollectionStatus::Pending)));
	assert_eq!(harness.stub.count("POST", "/v1/vector/collections"), 0);
}

#[tokio::test]
async fn remote_provisioning_is_optional() {
	let harness = Harness::new().await;
	let created =
		harness.service.create_workspace(acme(false)).await.expect("Creation must not fail.");

	assert_eq!(created.cluster, ClusterOutcome::Skipped);
	assert!(created.collections.is_empty());
	assert!(harness.stub.requests().is_empty());
	assert_eq!(created.workspace.settings["default_collections"], true);
}

#[tokio::test]
async fn blank_names_are_rejected_before_any_write() {
	let harness = Harness::new().await;
	let mut req = acme(true);

	req.name = "   ".to_string();

	let err = harness.service.create_workspace(req).await.expect_err("Blank names are invalid.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(harness.store.workspace_count(), 0);
}

#[tokio::test]
async fn only_the_owner_can_delete() {
	let harness = Harness::new().await;
	let workspace = harness.create_workspace("u1", false).await;
	let err = harness
		.service
		.delete_workspace(workspace.workspace_id, "u2")
		.await
		.expect_err("A non-owner must be refused.");

	assert!(matches!(err, Error::Forbidden { .. }));
	assert!(harness.store.workspace(workspace.workspace_id).is_some());
}

#[tokio::test]
async fn deleting_an_unknown_workspace_looks_like_a_foreign_one() {
	let harness = Harness::new().await;
	let err = harness
		.service
		.delete_workspace(uuid::Uuid::new_v4(), "u2")
		.await
		.expect_err("An unknown workspace must be refused.");

	assert!(matches!(err, Error::Forbidden { .. }));
}

#[tokio::test]
async fn deletion_is_best_effort_for_remote_collections() {
	let harness = Harness::new().await;

	harness.cluster_ok("in01-abc");
	harness.collections_ok();

	let workspace = harness.create_workspace("u1", true).await;

	harness.stub.set_default(
		"DELETE",
		"/v1/vector/collections/text_embeddings",
		StubResponse::status(500, serde_json::json!({ "message": "internal" })),
	);
	harness.stub.set_default(
		"DELETE",
		"/v1/vector/collections",
		StubResponse::ok(serde_json::json!({ "code": 0 })),
	);

	let deleted = harness
		.service
		.delete_workspace(workspace.workspace_id, "u1")
		.await
		.expect("Deletion must succeed.");

	assert_eq!(deleted.remote_deletions.len(), 2);

	for deletion in &deleted.remote_deletions {
		let failed = deletion.remote_name.starts_with("text_embeddings_");

		assert_eq!(deletion.error.is_some(), failed, "{}", deletion.remote_name);
	}

	assert!(harness.store.workspace(workspace.workspace_id).is_none());
	assert!(harness.store.collections(workspace.workspace_id).is_empty());
	assert!(harness.store.members(workspace.workspace_id).is_empty());
	assert_eq!(harness.stub.count("DELETE", "/v1/vector/collections/text_embeddings"), 3);
}
