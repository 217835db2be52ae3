use axum::{
	Json, Router,
	extract::{Path, Request, State},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kyroo_domain::{SearchQuery, VectorRecord, VectorSchema};
use kyroo_providers::{ErrorKind, NetworkStatus};
use kyroo_service::{
	ClusterOutcome, ClusterStatusResponse, CreateCollectionRequest, CreateCollectionResponse,
	CreateWorkspaceRequest, CreateWorkspaceResponse, DeleteWorkspaceResponse, Error as ServiceError,
	InsertVectorsResponse, ReconcileReport, ReprovisionReport, SearchVectorsResponse, WorkspaceView,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/workspaces", post(create_workspace).get(list_workspaces))
		.route("/v1/workspaces/{workspace_id}", get(get_workspace).delete(delete_workspace))
		.route("/v1/workspaces/{workspace_id}/cluster", get(cluster_status))
		.route("/v1/workspaces/{workspace_id}/collections", post(create_collection))
		.route(
			"/v1/workspaces/{workspace_id}/collections/{collection_id}/vectors",
			post(insert_vectors),
		)
		.route(
			"/v1/workspaces/{workspace_id}/collections/{collection_id}/search",
			post(search_vectors),
		)
		.with_state(state)
}

pub fn admin_router(state: AppState) -> Router {
	Router::new()
		.route("/v1/admin/reconcile", post(reconcile))
		.layer(middleware::from_fn_with_state(state.clone(), admin_auth))
		.with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub network: NetworkStatus,
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceBody {
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default = "default_provision_remote")]
	pub provision_remote: bool,
}

#[derive(Debug, Serialize)]
pub struct ListWorkspacesResponse {
	pub workspaces: Vec<WorkspaceView>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCollectionBody {
	pub name: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub schema: Option<VectorSchema>,
}

#[derive(Debug, Deserialize)]
pub struct InsertVectorsBody {
	pub records: Vec<VectorRecord>,
}

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
	pub clusters: ReconcileReport,
	pub collections: ReprovisionReport,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	let network = state.network.status();

	// A recovered outage is reported once.
	if network.was_offline {
		state.network.acknowledge();
	}

	Json(HealthResponse { status: "ok", network })
}

async fn create_workspace(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<CreateWorkspaceBody>,
) -> Result<Json<CreateWorkspaceResponse>, ApiError> {
	let owner_id = requester(&state, &headers)?;
	let response = state
		.service
		.create_workspace(CreateWorkspaceRequest {
			name: payload.name,
			description: payload.description,
			owner_id,
			provision_remote: payload.provision_remote,
		})
		.await?;

	match &response.cluster {
		ClusterOutcome::Failed { error } => {
			state.network.observe(Some(error));
		},
		ClusterOutcome::Provisioned { .. } | ClusterOutcome::PersistFailed { .. } => {
			state.network.observe(None);
		},
		ClusterOutcome::Skipped => {},
	}

	Ok(Json(response))
}

async fn list_workspaces(
	State(state): State<AppState>,
	headers: HeaderMap,
) -> Result<Json<ListWorkspacesResponse>, ApiError> {
	let user_id = requester(&state, &headers)?;
	let workspaces = state.service.list_user_workspaces(&user_id).await?;

	Ok(Json(ListWorkspacesResponse { workspaces }))
}

async fn get_workspace(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(workspace_id): Path<Uuid>,
) -> Result<Json<WorkspaceView>, ApiError> {
	let user_id = requester(&state, &headers)?;

	state.service.get_workspace(workspace_id, &user_id).await?.map(Json).ok_or_else(|| {
		json_error(
			StatusCode::NOT_FOUND,
			"not_found",
			format!("Workspace {workspace_id} was not found."),
			None,
		)
	})
}

async fn delete_workspace(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(workspace_id): Path<Uuid>,
) -> Result<Json<DeleteWorkspaceResponse>, ApiError> {
	let user_id = requester(&state, &headers)?;
	let response = state.service.delete_workspace(workspace_id, &user_id).await?;

	Ok(Json(response))
}

async fn cluster_status(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(workspace_id): Path<Uuid>,
) -> Result<Json<ClusterStatusResponse>, ApiError> {
	let user_id = requester(&state, &headers)?;
	let result = state.service.cluster_status(workspace_id, &user_id).await;

	if let Ok(ClusterStatusResponse { status: Some(_), .. }) = &result {
		state.network.observe(None);
	}

	Ok(Json(observe_remote(&state, result)?))
}

async fn create_collection(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path(workspace_id): Path<Uuid>,
	Json(payload): Json<CreateCollectionBody>,
) -> Result<Json<CreateCollectionResponse>, ApiError> {
	let requester_id = requester(&state, &headers)?;
	let response = state
		.service
		.create_collection(CreateCollectionRequest {
			workspace_id,
			requester_id,
			name: payload.name,
			description: payload.description,
			schema: payload.schema,
		})
		.await?;

	if let Some(err) = &response.remote_error {
		state.network.observe(Some(err));
	}

	Ok(Json(response))
}

async fn insert_vectors(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path((workspace_id, collection_id)): Path<(Uuid, Uuid)>,
	Json(payload): Json<InsertVectorsBody>,
) -> Result<Json<InsertVectorsResponse>, ApiError> {
	let requester_id = requester(&state, &headers)?;
	let result = state
		.service
		.insert_vectors(workspace_id, collection_id, &requester_id, payload.records)
		.await;

	if result.is_ok() {
		state.network.observe(None);
	}

	Ok(Json(observe_remote(&state, result)?))
}

async fn search_vectors(
	State(state): State<AppState>,
	headers: HeaderMap,
	Path((workspace_id, collection_id)): Path<(Uuid, Uuid)>,
	Json(query): Json<SearchQuery>,
) -> Result<Json<SearchVectorsResponse>, ApiError> {
	let requester_id = requester(&state, &headers)?;
	let result =
		state.service.search_vectors(workspace_id, collection_id, &requester_id, query).await;

	if result.is_ok() {
		state.network.observe(None);
	}

	Ok(Json(observe_remote(&state, result)?))
}

async fn reconcile(State(state): State<AppState>) -> Result<Json<ReconcileResponse>, ApiError> {
	let clusters = observe_remote(&state, state.service.reconcile_clusters().await)?;

	state.network.observe(None);

	let collections = state.service.reprovision_collections().await?;

	Ok(Json(ReconcileResponse { clusters, collections }))
}

async fn admin_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
	if let Some(expected) = state.admin_auth_token.as_deref()
		&& read_bearer_token(req.headers()) != Some(expected)
	{
		return json_error(
			StatusCode::UNAUTHORIZED,
			"unauthenticated",
			"Admin bearer token is missing or invalid.",
			None,
		)
		.into_response();
	}

	next.run(req).await
}

fn default_provision_remote() -> bool {
	true
}

fn requester(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
	headers
		.get(&state.user_header)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.map(str::to_string)
		.ok_or_else(|| {
			json_error(
				StatusCode::UNAUTHORIZED,
				"unauthenticated",
				format!("{} header is required.", state.user_header.as_str()),
				None,
			)
		})
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

/// Feeds control-plane failures into the network monitor before they become responses.
fn observe_remote<T>(state: &AppState, result: Result<T, ServiceError>) -> Result<T, ServiceError> {
	if let Err(ServiceError::VectorStore(err)) = &result {
		state.network.observe(Some(err));
	}

	result
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			ServiceError::Forbidden { message } =>
				json_error(StatusCode::FORBIDDEN, "forbidden", message, None),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message, None),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "conflict", message, None),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage failure while serving a request.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"storage_error",
					"Storage operation failed.",
					None,
				)
			},
			ServiceError::VectorStore(err) => json_error(
				vector_store_status(err.kind),
				"vector_store_error",
				err.to_string(),
				None,
			),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

fn vector_store_status(kind: ErrorKind) -> StatusCode {
	match kind {
		ErrorKind::ClientError => StatusCode::BAD_REQUEST,
		ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
		ErrorKind::Offline
		| ErrorKind::ConnectionError
		| ErrorKind::Timeout
		| ErrorKind::ServerError => StatusCode::BAD_GATEWAY,
		ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
	}
}
