use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::net::TcpListener;

use kyroo_domain::{IndexType, MetricType, SearchQuery, VectorRecord, VectorSchema};
use kyroo_providers::{Actor, ErrorKind, NetworkMonitor, RetryOptions, VectorStoreClient};
use kyroo_testkit::{StubControlPlane, StubResponse};

fn vector_store_config(endpoint: &str) -> kyroo_config::VectorStore {
	kyroo_config::VectorStore {
		endpoint: endpoint.to_string(),
		token: "secret-token".to_string(),
		timeout_ms: 5_000,
		cluster_plan: "Starter".to_string(),
		cluster_cu: 1,
		cluster_name_prefix: "workspace-".to_string(),
	}
}

fn fast_retry(max_attempts: u32) -> RetryOptions {
	RetryOptions {
		max_attempts,
		base_delay: Duration::from_millis(1),
		max_delay: Duration::from_millis(5),
		backoff_factor: 2.0,
		retry_predicate: None,
	}
}

fn client(endpoint: &str, max_attempts: u32) -> VectorStoreClient {
	VectorStoreClient::new(
		&vector_store_config(endpoint),
		fast_retry(max_attempts),
		NetworkMonitor::default(),
	)
	.expect("Failed to build client.")
}

async fn stub() -> StubControlPlane {
	StubControlPlane::start().await.expect("Failed to start stub control plane.")
}

fn schema(dimension: u32) -> VectorSchema {
	VectorSchema {
		name: "docs_1700000000000".to_string(),
		description: Some("Docs".to_string()),
		dimension,
		metric_type: MetricType::Cosine,
		index_type: IndexType::Hnsw,
	}
}

fn record(id: &str, dimension: usize) -> VectorRecord {
	VectorRecord { id: id.to_string(), vector: vec![0.25; dimension], metadata: Map::new() }
}

#[tokio::test]
async fn create_cluster_sends_plan_and_bearer_token() {
	let stub = stub().await;

	stub.push("POST", "/v1/clusters", StubResponse::ok(serde_json::json!({ "clusterId": "in01-abc" })));

	let cluster_id = client(stub.base_url(), 3)
		.create_cluster("workspace-1", &Actor::user("u1"))
		.await
		.expect("Cluster creation failed.");
	let requests = stub.requests();

	assert_eq!(cluster_id, "in01-abc");
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret-token"));
	assert_eq!(
		requests[0].body,
		serde_json::json!({ "clusterName": "workspace-1", "plan": "Starter", "cu": 1 })
	);
}

#[tokio::test]
async fn server_errors_exhaust_every_attempt() {
	let stub = stub().await;

	stub.set_default(
		"POST",
		"/v1/clusters",
		StubResponse::status(503, serde_json::json!({ "message": "overloaded" })),
	);

	let err = client(stub.base_url(), 3)
		.create_cluster("workspace-1", &Actor::default())
		.await
		.expect_err("Expected cluster creation to fail.");

	assert_eq!(err.kind, ErrorKind::ServerError);
	assert_eq!(err.status, Some(503));
	assert_eq!(err.message, "HTTP 503: overloaded");
	assert_eq!(err.details, Some(serde_json::json!({ "message": "overloaded" })));
	assert_eq!(stub.count("POST", "/v1/clusters"), 3);
}

#[tokio::test]
async fn client_errors_make_a_single_attempt() {
	let stub = stub().await;

	stub.set_default(
		"DELETE",
		"/v1/vector/collections",
		StubResponse::status(404, serde_json::json!({ "message": "collection not found" })),
	);

	let err = client(stub.base_url(), 5)
		.delete_collection("in01-abc", "docs", &Actor::default())
		.await
		.expect_err("Expected delete to fail.");

	assert_eq!(err.kind, ErrorKind::ClientError);
	assert_eq!(stub.count("DELETE", "/v1/vector/collections/docs"), 1);
}

#[tokio::test]
async fn rate_limits_wait_for_retry_after() {
	let stub = stub().await;

	stub.push(
		"GET",
		"/v1/clusters/in01-abc",
		StubResponse::status(429, serde_json::json!({ "message": "slow down" }))
			.with_header("retry-after", "1"),
	);
	stub.push("GET", "/v1/clusters/in01-abc", StubResponse::ok(serde_json::json!({ "status": "RUNNING" })));

	let started = Instant::now();
	let status = client(stub.base_url(), 3)
		.get_cluster_status("in01-abc", &Actor::default())
		.await
		.expect("Expected the retry to succeed.");

	assert_eq!(status, "RUNNING");
	assert!(started.elapsed() >= Duration::from_secs(1));
	assert_eq!(stub.count("GET", "/v1/clusters/in01-abc"), 2);
}

#[tokio::test]
async fn create_collection_declares_fixed_layout() {
	let stub = stub().await;

	stub.push("POST", "/v1/vector/collections", StubResponse::ok(serde_json::json!({ "code": 0 })));

	client(stub.base_url(), 3)
		.create_collection("in01-abc", &schema(8), &Actor::default())
		.await
		.expect("Collection creation failed.");

	let requests = stub.requests();
	let body = &requests[0].body;
	let fields: Vec<&str> = body["schema"]["fields"]
		.as_array()
		.expect("fields")
		.iter()
		.filter_map(|field| field["fieldName"].as_str())
		.collect();

	assert_eq!(requests[0].cluster_id.as_deref(), Some("in01-abc"));
	assert_eq!(body["collectionName"], "docs_1700000000000");
	assert_eq!(fields, vec!["id", "vector", "metadata"]);
	assert_eq!(body["schema"]["fields"][1]["elementTypeParams"]["dim"], 8);
	assert_eq!(body["indexParams"][0]["indexName"], "vector_index");
	assert_eq!(body["indexParams"][0]["fieldName"], "vector");
	assert_eq!(body["indexParams"][0]["indexConfig"]["index_type"], "HNSW");
	assert_eq!(body["indexParams"][0]["indexConfig"]["metric_type"], "COSINE");
	assert_eq!(body["indexParams"][0]["indexConfig"]["params"]["nlist"], 1_024);
}

#[tokio::test]
async fn zero_dimension_never_reaches_the_network() {
	let stub = stub().await;
	let err = client(stub.base_url(), 3)
		.create_collection("in01-abc", &schema(0), &Actor::default())
		.await
		.expect_err("Expected a zero dimension to be rejected.");

	assert_eq!(err.kind, ErrorKind::ClientError);
	assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn dimension_mismatch_never_reaches_the_network() {
	let stub = stub().await;
	let client = client(stub.base_url(), 3);
	let err = client
		.insert_vectors("in01-abc", "docs", 4, &[record("a", 4), record("b", 3)], &Actor::default())
		.await
		.expect_err("Expected a dimension mismatch.");

	assert_eq!(err.kind, ErrorKind::ClientError);
	assert_eq!(err.message, "Vector b has dimension 3, collection expects 4.");

	let err = client
		.search_vectors("in01-abc", "docs", 4, &SearchQuery::new(vec![0.1; 2]), &Actor::default())
		.await
		.expect_err("Expected a query dimension mismatch.");

	assert_eq!(err.kind, ErrorKind::ClientError);
	assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn empty_insert_batches_still_round_trip() {
	let stub = stub().await;

	stub.push("POST", "/v1/vector/insert", StubResponse::ok(serde_json::json!({ "data": {} })));

	client(stub.base_url(), 3)
		.insert_vectors("in01-abc", "docs", 4, &[], &Actor::default())
		.await
		.expect("Empty insert failed.");

	let requests = stub.requests();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].body["data"], Value::Array(Vec::new()));
}

#[tokio::test]
async fn insert_sends_records_with_metadata() {
	let stub = stub().await;
	let mut tagged = record("a", 2);

	tagged.metadata.insert("lang".to_string(), serde_json::json!("en"));
	stub.push("POST", "/v1/vector/insert", StubResponse::ok(serde_json::json!({})));

	client(stub.base_url(), 3)
		.insert_vectors("in01-abc", "docs", 2, &[tagged, record("b", 2)], &Actor::default())
		.await
		.expect("Insert failed.");

	let requests = stub.requests();
	let body = &requests[0].body;

	assert_eq!(body["collectionName"], "docs");
	assert_eq!(body["data"][0]["metadata"], serde_json::json!({ "lang": "en" }));
	assert_eq!(body["data"][1]["metadata"], serde_json::json!({}));
}

#[tokio::test]
async fn search_keeps_remote_ranking() {
	let stub = stub().await;

	stub.push(
		"POST",
		"/v1/vector/search",
		StubResponse::ok(serde_json::json!({
			"data": [
				{ "id": "c", "distance": 0.12, "metadata": { "n": 3 } },
				{ "id": "a", "distance": 0.87, "metadata": { "n": 1 } },
				{ "id": "b", "distance": 0.45, "metadata": { "n": 2 } },
			]
		})),
	);

	let hits = client(stub.base_url(), 3)
		.search_vectors("in01-abc", "docs", 3, &SearchQuery::new(vec![0.1, 0.2, 0.3]), &Actor::default())
		.await
		.expect("Search failed.");
	let ids: Vec<&str> = hits.iter().map(|hit| hit.id.as_str()).collect();
	let requests = stub.requests();
	let body = &requests[0].body;

	assert_eq!(ids, vec!["c", "a", "b"]);
	assert!((hits[1].score - 0.87).abs() < 1e-6);
	assert_eq!(body["limit"], 10);
	assert_eq!(body["filter"], "");
	assert_eq!(body["outputFields"], serde_json::json!(["id", "metadata"]));
}

#[tokio::test]
async fn list_clusters_parses_summaries() {
	let stub = stub().await;

	stub.push(
		"GET",
		"/v1/clusters",
		StubResponse::ok(serde_json::json!({
			"clusters": [
				{ "clusterId": "in01-a", "clusterName": "workspace-1", "status": "RUNNING" },
				{ "clusterId": "in01-b", "clusterName": "other" },
			]
		})),
	);

	let clusters = client(stub.base_url(), 3)
		.list_clusters(&Actor::default())
		.await
		.expect("Listing clusters failed.");

	assert_eq!(clusters.len(), 2);
	assert_eq!(clusters[0].cluster_name, "workspace-1");
	assert_eq!(clusters[1].status, None);
}

#[tokio::test]
async fn list_clusters_rejects_a_body_without_clusters() {
	let stub = stub().await;

	stub.push("GET", "/v1/clusters", StubResponse::ok(serde_json::json!({ "code": 0 })));

	let err = client(stub.base_url(), 3)
		.list_clusters(&Actor::default())
		.await
		.expect_err("Expected a malformed list to fail.");

	assert_eq!(err.kind, ErrorKind::Unknown);
	assert_eq!(stub.count("GET", "/v1/clusters"), 1);
}

#[tokio::test]
async fn server_errors_are_retried_after_a_connection_blip() {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind.");
	let addr = listener.local_addr().expect("Failed to read address.");

	drop(listener);

	let network = NetworkMonitor::default();
	let unreachable = VectorStoreClient::new(
		&vector_store_config(&format!("http://{addr}")),
		fast_retry(1),
		network.clone(),
	)
	.expect("Failed to build client.");
	let err = unreachable
		.get_cluster_status("in01-abc", &Actor::default())
		.await
		.expect_err("Expected the connection to be refused.");

	network.observe(Some(&err));

	assert!(!network.is_online());

	let stub = stub().await;

	stub.push(
		"GET",
		"/v1/clusters/in01-abc",
		StubResponse::status(503, serde_json::json!({ "message": "overloaded" })),
	);
	stub.push(
		"GET",
		"/v1/clusters/in01-abc",
		StubResponse::ok(serde_json::json!({ "status": "RUNNING" })),
	);

	let reachable =
		VectorStoreClient::new(&vector_store_config(stub.base_url()), fast_retry(3), network.clone())
			.expect("Failed to build client.");
	let status = reachable
		.get_cluster_status("in01-abc", &Actor::default())
		.await
		.expect("Expected the second attempt to succeed.");

	assert_eq!(status, "RUNNING");
	assert_eq!(stub.count("GET", "/v1/clusters/in01-abc"), 2);
	assert!(network.is_online());
}

#[tokio::test]
async fn refused_connections_are_connection_errors() {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind.");
	let addr = listener.local_addr().expect("Failed to read address.");

	drop(listener);

	let err = client(&format!("http://{addr}"), 2)
		.get_cluster_status("in01-abc", &Actor::default())
		.await
		.expect_err("Expected the connection to be refused.");

	assert_eq!(err.kind, ErrorKind::ConnectionError);
	assert!(err.is_retryable());
}
