use uuid::Uuid;

use kyroo_domain::{IndexType, MetricType, SearchQuery, VectorRecord, VectorSchema};
use kyroo_service::{CreateCollectionRequest, Error};
use kyroo_storage::models::Workspace;
use kyroo_testkit::StubResponse;

use super::Harness;

fn small_schema() -> VectorSchema {
	VectorSchema {
		name: "small".to_string(),
		description: None,
		dimension: 3,
		metric_type: MetricType::L2,
		index_type: IndexType::IvfFlat,
	}
}

async fn active_collection(harness: &Harness) -> (Workspace, Uuid) {
	harness.cluster_ok("in01-abc");
	harness.collections_ok();

	let workspace = harness.create_workspace("u1", true).await;
	let created = harness
		.service
		.create_collection(CreateCollectionRequest {
			workspace_id: workspace.workspace_id,
			requester_id: "u1".to_string(),
			name: "Small".to_string(),
			description: None,
			schema: Some(small_schema()),
		})
		.await
		.expect("Collection creation failed.");

	assert_eq!(created.collection.status, "active");

	(workspace, created.collection.collection_id)
}

fn record(id: &str, vector: Vec<f32>) -> VectorRecord {
	VectorRecord { id: id.to_string(), vector, metadata: Default::default() }
}

#[tokio::test]
async fn search_returns_hits_in_remote_order() {
	let harness = Harness::with_defaults(false).await;
	let (workspace, collection_id) = active_collection(&harness).await;

	harness.stub.push(
		"POST",
		"/v1/vector/search",
		StubResponse::ok(serde_json::json!({
			"code": 0,
			"data": [
				{ "id": "c", "distance": 0.1 },
				{ "id": "a", "distance": 0.4, "metadata": { "lang": "en" } },
				{ "id": "b", "distance": 0.9 },
			],
		})),
	);

	let found = harness
		.service
		.search_vectors(
			workspace.workspace_id,
			collection_id,
			"u1",
			SearchQuery::new(vec![0.1, 0.2, 0.3]),
		)
		.await
		.expect("Search failed.");
	let ids: Vec<&str> = found.hits.iter().map(|hit| hit.id.as_str()).collect();

	assert_eq!(ids, vec!["c", "a", "b"]);
	assert_eq!(found.hits[1].metadata, Some(serde_json::json!({ "lang": "en" })));

	let requests = harness.stub.requests();
	let search = requests
		.iter()
		.find(|req| req.path == "/v1/vector/search")
		.expect("Search request missing.");

	assert_eq!(search.body["limit"], 10);
	assert_eq!(search.cluster_id.as_deref(), Some("in01-abc"));
}

#[tokio::test]
async fn insert_reports_the_batch_size() {
	let harness = Harness::with_defaults(false).await;
	let (workspace, collection_id) = active_collection(&harness).await;

	harness.stub.push("POST", "/v1/vector/insert", StubResponse::ok(serde_json::json!({ "code": 0 })));

	let inserted = harness
		.service
		.insert_vectors(
			workspace.workspace_id,
			collection_id,
			"u1",
			vec![record("a", vec![1.0, 0.0, 0.0]), record("b", vec![0.0, 1.0, 0.0])],
		)
		.await
		.expect("Insert failed.");

	assert_eq!(inserted.inserted, 2);
	assert_eq!(harness.stub.count("POST", "/v1/vector/insert"), 1);
}

#[tokio::test]
async fn dimension_mismatch_is_rejected_before_the_remote_call() {
	let harness = Harness::with_defaults(false).await;
	let (workspace, collection_id) = active_collection(&harness).await;
	let err = harness
		.service
		.insert_vectors(
			workspace.workspace_id,
			collection_id,
			"u1",
			vec![record("a", vec![1.0, 0.0, 0.0]), record("b", vec![1.0, 0.0])],
		)
		.await
		.expect_err("Mismatched records must be refused.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(harness.stub.count("POST", "/v1/vector/insert"), 0);
}

#[tokio::test]
async fn pending_collections_cannot_serve_vectors() {
	let harness = Harness::with_defaults(false).await;
	let workspace = harness.create_workspace("u1", false).await;
	let created = harness
		.service
		.create_collection(CreateCollectionRequest {
			workspace_id: workspace.workspace_id,
			requester_id: "u1".to_string(),
			name: "Small".to_string(),
			description: None,
			schema: Some(small_schema()),
		})
		.await
		.expect("Collection creation failed.");
	let err = harness
		.service
		.insert_vectors(
			workspace.workspace_id,
			created.collection.collection_id,
			"u1",
			vec![record("a", vec![1.0, 0.0, 0.0])],
		)
		.await
		.expect_err("Pending collections must be refused.");

	assert!(matches!(err, Error::Conflict { .. }));
	assert!(harness.stub.requests().is_empty());
}

#[tokio::test]
async fn outsiders_cannot_search() {
	let harness = Harness::with_defaults(false).await;
	let (workspace, collection_id) = active_collection(&harness).await;
	let err = harness
		.service
		.search_vectors(
			workspace.workspace_id,
			collection_id,
			"intruder",
			SearchQuery::new(vec![0.1, 0.2, 0.3]),
		)
		.await
		.expect_err("Outsiders must be refused.");

	assert!(matches!(err, Error::Forbidden { .. }));
	assert_eq!(harness.stub.count("POST", "/v1/vector/search"), 0);
}
