use kyroo_domain::{IndexType, MetricType, VectorSchema};
use kyroo_providers::ErrorKind;
use kyroo_service::{CreateCollectionRequest, Error};

use super::Harness;

fn zero_dimension_schema() -> VectorSchema {
	VectorSchema {
		name: "broken".to_string(),
		description: None,
		dimension: 0,
		metric_type: MetricType::L2,
		index_type: IndexType::IvfFlat,
	}
}

fn request(workspace_id: uuid::Uuid, requester: &str, schema: Option<VectorSchema>) -> CreateCollectionRequest {
	CreateCollectionRequest {
		workspace_id,
		requester_id: requester.to_string(),
		name: "Docs".to_string(),
		description: None,
		schema,
	}
}

#[tokio::test]
async fn zero_dimension_is_recorded_as_error_without_a_remote_call() {
	let harness = Harness::with_defaults(false).await;

	harness.cluster_ok("in01-abc");
	harness.collections_ok();

	let workspace = harness.create_workspace("u1", true).await;
	let created = harness
		.service
		.create_collection(request(workspace.workspace_id, "u1", Some(zero_dimension_schema())))
		.await
		.expect("The relational record must still be written.");

	assert_eq!(created.collection.status, "error");
	assert_eq!(created.collection.remote_name, None);
	assert_eq!(created.remote_error.map(|err| err.kind), Some(ErrorKind::ClientError));
	assert_eq!(harness.stub.count("POST", "/v1/vector/collections"), 0);
	assert_eq!(harness.store.collections(workspace.workspace_id).len(), 1);
}

#[tokio::test]
async fn zero_dimension_without_a_cluster_stays_pending() {
	let harness = Harness::new().await;
	let workspace = harness.create_workspace("u1", false).await;
	let created = harness
		.service
		.create_collection(request(workspace.workspace_id, "u1", Some(zero_dimension_schema())))
		.await
		.expect("Creation must succeed.");

	assert_eq!(created.collection.status, "pending");
	assert_eq!(created.collection.remote_name, None);
	assert!(created.remote_error.is_none());
	assert!(harness.stub.requests().is_empty());
}

#[tokio::test]
async fn omitted_schema_defaults_to_text_embeddings() {
	let harness = Harness::with_defaults(false).await;

	harness.cluster_ok("in01-abc");
	harness.collections_ok();

	let workspace = harness.create_workspace("u1", true).await;
	let created = harness
		.service
		.create_collection(request(workspace.workspace_id, "u1", None))
		.await
		.expect("Creation must succeed.");
	let schema: VectorSchema =
		serde_json::from_value(created.collection.schema.clone()).expect("Schema snapshot is readable.");

	assert_eq!(created.collection.status, "active");
	assert!(created.collection.remote_name.as_deref().is_some_and(|name| name.starts_with("docs_")));
	assert_eq!(schema.dimension, 1_536);
	assert_eq!(schema.metric_type, MetricType::Cosine);

	let requests = harness.stub.requests();
	let body = &requests
		.iter()
		.find(|req| req.path == "/v1/vector/collections")
		.expect("Collection request missing.")
		.body;

	assert_eq!(body["collectionName"].as_str(), created.collection.remote_name.as_deref());
	assert_eq!(body["indexParams"][0]["indexConfig"]["metric_type"], "COSINE");
}

#[tokio::test]
async fn non_members_cannot_create_collections() {
	let harness = Harness::new().await;
	let workspace = harness.create_workspace("u1", false).await;
	let err = harness
		.service
		.create_collection(request(workspace.workspace_id, "u2", None))
		.await
		.expect_err("Outsiders must be refused.");

	assert!(matches!(err, Error::Forbidden { .. }));
	assert!(harness.store.collections(workspace.workspace_id).is_empty());
}

#[tokio::test]
async fn unknown_workspaces_are_not_found() {
	let harness = Harness::new().await;
	let err = harness
		.service
		.create_collection(request(uuid::Uuid::new_v4(), "u1", None))
		.await
		.expect_err("Missing workspaces must be reported.");

	assert!(matches!(err, Error::NotFound { .. }));
}
