use std::time::Duration;

use reqwest::{
	Client, Method,
	header::{HeaderMap, RETRY_AFTER},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use kyroo_domain::{
	SearchHit, SearchQuery, VectorRecord, VectorSchema,
	record::{check_query_dimension, check_record_dimensions},
};

use crate::{
	network::NetworkMonitor,
	retry::{Actor, RetryContext, RetryExecutor, RetryOptions},
	taxonomy::{ClassifiedError, Failure},
};

pub const CLUSTER_ID_HEADER: &str = "cluster-id";

const INDEX_NAME: &str = "vector_index";
const INDEX_NLIST: u32 = 1_024;
const ID_MAX_LENGTH: u32 = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
	pub cluster_id: String,
	#[serde(default)]
	pub cluster_name: String,
	#[serde(default)]
	pub status: Option<String>,
}

/// Typed client for the hosted vector-search control plane. Every operation runs through the
/// retry executor and fails with a [`ClassifiedError`].
#[derive(Clone, Debug)]
pub struct VectorStoreClient {
	http: Client,
	base_url: String,
	headers: HeaderMap,
	plan: String,
	cu: u32,
	executor: RetryExecutor,
}
impl VectorStoreClient {
	pub fn new(
		cfg: &kyroo_config::VectorStore,
		retry: RetryOptions,
		network: NetworkMonitor,
	) -> crate::Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let headers = crate::auth_headers(&cfg.token)?;

		Ok(Self {
			http,
			base_url: format!("{}/v1", cfg.endpoint.trim_end_matches('/')),
			headers,
			plan: cfg.cluster_plan.clone(),
			cu: cfg.cluster_cu,
			executor: RetryExecutor::new(retry, network),
		})
	}

	pub async fn create_cluster(&self, name: &str, actor: &Actor) -> Result<String, ClassifiedError> {
		let body = serde_json::json!({
			"clusterName": name,
			"plan": self.plan,
			"cu": self.cu,
		});
		let json = self
			.executor
			.execute(RetryContext::new("create_cluster", actor), move || {
				self.call(Method::POST, "/clusters".to_string(), None, Some(body.clone()))
			})
			.await?;

		string_field(&json, "clusterId").ok_or_else(|| {
			ClassifiedError::unknown("Cluster creation response is missing clusterId.")
				.with_details(json)
		})
	}

	pub async fn get_cluster_status(
		&self,
		cluster_id: &str,
		actor: &Actor,
	) -> Result<String, ClassifiedError> {
		let path = format!("/clusters/{cluster_id}");
		let json = self
			.executor
			.execute(RetryContext::new("get_cluster_status", actor), move || {
				self.call(Method::GET, path.clone(), None, None)
			})
			.await?;

		string_field(&json, "status").ok_or_else(|| {
			ClassifiedError::unknown("Cluster status response is missing status.").with_details(json)
		})
	}

	pub async fn list_clusters(&self, actor: &Actor) -> Result<Vec<ClusterSummary>, ClassifiedError> {
		let json = self
			.executor
			.execute(RetryContext::new("list_clusters", actor), move || {
				self.call(Method::GET, "/clusters".to_string(), None, None)
			})
			.await?;
		let Some(items) = json
			.get("clusters")
			.or_else(|| json.pointer("/data/clusters"))
			.or_else(|| json.get("data"))
			.cloned()
		else {
			return Err(ClassifiedError::unknown("Cluster list response is missing clusters.")
				.with_details(json));
		};

		serde_json::from_value(items).map_err(|err| {
			ClassifiedError::unknown(format!("Cluster list response is malformed: {err}."))
				.with_details(json)
		})
	}

	/// Declares the `id`/`vector`/`metadata` layout and a single vector index.
	pub async fn create_collection(
		&self,
		cluster_id: &str,
		schema: &VectorSchema,
		actor: &Actor,
	) -> Result<(), ClassifiedError> {
		schema.validate().map_err(|err| ClassifiedError::client(err.to_string()))?;

		let body = serde_json::json!({
			"collectionName": schema.name,
			"description": schema.description.clone().unwrap_or_default(),
			"schema": {
				"fields": [
					{
						"fieldName": "id",
						"dataType": "VarChar",
						"isPrimary": true,
						"elementTypeParams": { "max_length": ID_MAX_LENGTH },
					},
					{
						"fieldName": "vector",
						"dataType": "FloatVector",
						"elementTypeParams": { "dim": schema.dimension },
					},
					{
						"fieldName": "metadata",
						"dataType": "JSON",
					},
				],
			},
			"indexParams": [
				{
					"fieldName": "vector",
					"indexName": INDEX_NAME,
					"indexConfig": {
						"index_type": schema.index_type.as_str(),
						"metric_type": schema.metric_type.as_str(),
						"params": { "nlist": INDEX_NLIST },
					},
				},
			],
		});
		let cluster_id = cluster_id.to_string();

		self.executor
			.execute(RetryContext::new("create_collection", actor), move || {
				self.call(
					Method::POST,
					"/vector/collections".to_string(),
					Some(cluster_id.clone()),
					Some(body.clone()),
				)
			})
			.await?;

		Ok(())
	}

	pub async fn delete_collection(
		&self,
		cluster_id: &str,
		collection_name: &str,
		actor: &Actor,
	) -> Result<(), ClassifiedError> {
		let path = format!("/vector/collections/{collection_name}");
		let cluster_id = cluster_id.to_string();

		self.executor
			.execute(RetryContext::new("delete_collection", actor), move || {
				self.call(Method::DELETE, path.clone(), Some(cluster_id.clone()), None)
			})
			.await?;

		Ok(())
	}

	/// Empty batches are still sent so connectivity problems surface early.
	pub async fn insert_vectors(
		&self,
		cluster_id: &str,
		collection_name: &str,
		dimension: u32,
		records: &[VectorRecord],
		actor: &Actor,
	) -> Result<(), ClassifiedError> {
		check_record_dimensions(dimension, records)
			.map_err(|err| ClassifiedError::client(err.to_string()))?;

		let body = serde_json::json!({
			"collectionName": collection_name,
			"data": records,
		});
		let cluster_id = cluster_id.to_string();

		self.executor
			.execute(RetryContext::new("insert_vectors", actor), move || {
				self.call(
					Method::POST,
					"/vector/insert".to_string(),
					Some(cluster_id.clone()),
					Some(body.clone()),
				)
			})
			.await?;

		Ok(())
	}

	/// Hits come back in the remote ranking order.
	pub async fn search_vectors(
		&self,
		cluster_id: &str,
		collection_name: &str,
		dimension: u32,
		query: &SearchQuery,
		actor: &Actor,
	) -> Result<Vec<SearchHit>, ClassifiedError> {
		check_query_dimension(dimension, &query.vector)
			.map_err(|err| ClassifiedError::client(err.to_string()))?;

		if query.top_k == 0 {
			return Err(ClassifiedError::client("top_k must be greater than zero."));
		}

		let body = serde_json::json!({
			"collectionName": collection_name,
			"vector": query.vector,
			"limit": query.top_k,
			"filter": query.filter.clone().unwrap_or_default(),
			"outputFields": ["id", "metadata"],
		});
		let cluster_id = cluster_id.to_string();
		let json = self
			.executor
			.execute(RetryContext::new("search_vectors", actor), move || {
				self.call(
					Method::POST,
					"/vector/search".to_string(),
					Some(cluster_id.clone()),
					Some(body.clone()),
				)
			})
			.await?;

		parse_search_hits(&json)
	}

	async fn call(
		&self,
		method: Method,
		path: String,
		cluster_id: Option<String>,
		body: Option<Value>,
	) -> Result<Value, Failure> {
		let mut req = self
			.http
			.request(method, format!("{}{path}", self.base_url))
			.headers(self.headers.clone());

		if let Some(cluster_id) = cluster_id {
			req = req.header(CLUSTER_ID_HEADER, cluster_id);
		}
		if let Some(body) = body {
			req = req.json(&body);
		}

		let res = req.send().await?;
		let status = res.status();
		let retry_after = parse_retry_after(res.headers());
		let bytes = res.bytes().await?;

		if !status.is_success() {
			let details: Option<Value> = serde_json::from_slice(&bytes).ok();
			let reason = details
				.as_ref()
				.and_then(|body| body.get("message"))
				.and_then(Value::as_str)
				.map(str::to_string)
				.unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown status").to_string());

			return Err(Failure::Http {
				status: status.as_u16(),
				message: format!("HTTP {}: {reason}", status.as_u16()),
				retry_after,
				details,
			});
		}
		if bytes.is_empty() {
			return Ok(Value::Null);
		}

		serde_json::from_slice(&bytes).map_err(|err| {
			Failure::Classified(
				ClassifiedError::unknown(format!("Control plane returned invalid JSON: {err}."))
					.with_status(status.as_u16()),
			)
		})
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?;

	raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn string_field(json: &Value, key: &str) -> Option<String> {
	json.get(key)
		.or_else(|| json.get("data").and_then(|data| data.get(key)))
		.and_then(Value::as_str)
		.map(str::to_string)
}

fn parse_search_hits(json: &Value) -> Result<Vec<SearchHit>, ClassifiedError> {
	let Some(items) = json.get("data").and_then(Value::as_array) else {
		return Ok(Vec::new());
	};
	let mut hits = Vec::with_capacity(items.len());

	for item in items {
		let id = match item.get("id") {
			Some(Value::String(id)) => id.clone(),
			Some(Value::Number(id)) => id.to_string(),
			_ =>
				return Err(ClassifiedError::unknown("Search hit is missing id.")
					.with_details(item.clone())),
		};
		let score = item
			.get("distance")
			.or_else(|| item.get("score"))
			.and_then(Value::as_f64)
			.unwrap_or_default();

		hits.push(SearchHit {
			id,
			score: score as f32,
			metadata: item.get("metadata").filter(|value| !value.is_null()).cloned(),
		});
	}

	Ok(hits)
}
