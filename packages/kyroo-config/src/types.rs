use std::fmt;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub vector_store: VectorStore,
	#[serde(default)]
	pub retry: Retry,
	#[serde(default)]
	pub workspace: Workspace,
	#[serde(default)]
	pub reconcile: Reconcile,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Control-plane endpoint of the hosted vector-search service.
///
/// The bearer token only ever leaves the process inside the `Authorization` header of outgoing
/// requests, so [`fmt::Debug`] prints it redacted.
#[derive(Deserialize)]
pub struct VectorStore {
	pub endpoint: String,
	pub token: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_cluster_plan")]
	pub cluster_plan: String,
	#[serde(default = "default_cluster_cu")]
	pub cluster_cu: u32,
	#[serde(default = "default_cluster_name_prefix")]
	pub cluster_name_prefix: String,
}
impl fmt::Debug for VectorStore {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("VectorStore")
			.field("endpoint", &self.endpoint)
			.field("token", &"<redacted>")
			.field("timeout_ms", &self.timeout_ms)
			.field("cluster_plan", &self.cluster_plan)
			.field("cluster_cu", &self.cluster_cu)
			.field("cluster_name_prefix", &self.cluster_name_prefix)
			.finish()
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Retry {
	pub max_attempts: u32,
	pub base_delay_ms: u64,
	pub max_delay_ms: u64,
	pub backoff_factor: f64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_attempts: 3, base_delay_ms: 1_000, max_delay_ms: 10_000, backoff_factor: 2.0 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Workspace {
	pub provision_default_collections: bool,
}
impl Default for Workspace {
	fn default() -> Self {
		Self { provision_default_collections: true }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Reconcile {
	pub interval_seconds: u64,
	pub reprovision_collections: bool,
}
impl Default for Reconcile {
	fn default() -> Self {
		Self { interval_seconds: 300, reprovision_collections: true }
	}
}

#[derive(Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
	/// Header carrying the authenticated user id, set by the upstream auth gateway.
	pub user_header: String,
	pub admin_auth_token: Option<String>,
}
impl Default for Security {
	fn default() -> Self {
		Self {
			bind_localhost_only: true,
			user_header: "x-kyroo-user-id".to_string(),
			admin_auth_token: None,
		}
	}
}
impl fmt::Debug for Security {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Security")
			.field("bind_localhost_only", &self.bind_localhost_only)
			.field("user_header", &self.user_header)
			.field("admin_auth_token", &self.admin_auth_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_cluster_plan() -> String {
	"Starter".to_string()
}

fn default_cluster_cu() -> u32 {
	1
}

fn default_cluster_name_prefix() -> String {
	"workspace-".to_string()
}
