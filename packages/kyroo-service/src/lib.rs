pub mod collections;
pub mod reads;
pub mod reconcile;
pub mod store;
pub mod vectors;
pub mod workspaces;

mod error;

pub use collections::{CreateCollectionRequest, CreateCollectionResponse};
pub use error::{Error, Result};
pub use reads::{ClusterStatusResponse, WorkspaceView};
pub use reconcile::{
	DanglingCluster, ReconcileReport, ReprovisionFailure, ReprovisionReport,
};
pub use vectors::{InsertVectorsResponse, SearchVectorsResponse};
pub use workspaces::{
	ClusterOutcome, CollectionOutcome, CreateWorkspaceRequest, CreateWorkspaceResponse,
	DeleteWorkspaceResponse, RemoteDeletion,
};

use std::{future::Future, pin::Pin, sync::Arc};

use uuid::Uuid;

use kyroo_domain::{SearchHit, SearchQuery, VectorRecord, VectorSchema};
use kyroo_providers::{Actor, ClassifiedError, ClusterSummary, VectorStoreClient};
use kyroo_storage::models::{
	Collection, MemberWorkspace, NewCollection, NewMember, NewWorkspace, Workspace,
	WorkspaceMember,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type StoreResult<T> = kyroo_storage::Result<T>;
type RemoteResult<T> = std::result::Result<T, ClassifiedError>;

/// Row-level access to workspaces, memberships and collections.
pub trait WorkspaceStore
where
	Self: Send + Sync,
{
	fn insert_workspace<'a>(&'a self, new: &'a NewWorkspace) -> BoxFuture<'a, StoreResult<Workspace>>;

	fn get_workspace(&self, workspace_id: Uuid) -> BoxFuture<'_, StoreResult<Option<Workspace>>>;

	fn delete_workspace(&self, workspace_id: Uuid) -> BoxFuture<'_, StoreResult<bool>>;

	fn set_workspace_cluster<'a>(
		&'a self,
		workspace_id: Uuid,
		cluster_id: &'a str,
	) -> BoxFuture<'a, StoreResult<()>>;

	fn list_workspaces_with_cluster(&self) -> BoxFuture<'_, StoreResult<Vec<Workspace>>>;

	fn insert_member<'a>(&'a self, new: &'a NewMember) -> BoxFuture<'a, StoreResult<WorkspaceMember>>;

	fn get_member<'a>(
		&'a self,
		workspace_id: Uuid,
		user_id: &'a str,
	) -> BoxFuture<'a, StoreResult<Option<WorkspaceMember>>>;

	fn list_member_workspaces<'a>(
		&'a self,
		user_id: &'a str,
	) -> BoxFuture<'a, StoreResult<Vec<MemberWorkspace>>>;

	fn insert_collection<'a>(
		&'a self,
		new: &'a NewCollection,
	) -> BoxFuture<'a, StoreResult<Collection>>;

	fn get_collection(
		&self,
		workspace_id: Uuid,
		collection_id: Uuid,
	) -> BoxFuture<'_, StoreResult<Option<Collection>>>;

	fn list_collections(&self, workspace_id: Uuid) -> BoxFuture<'_, StoreResult<Vec<Collection>>>;

	fn list_unprovisioned_collections(&self) -> BoxFuture<'_, StoreResult<Vec<Collection>>>;

	fn update_collection_status<'a>(
		&'a self,
		collection_id: Uuid,
		status: &'a str,
		remote_name: Option<&'a str>,
	) -> BoxFuture<'a, StoreResult<()>>;
}

/// Remote control-plane operations the orchestrator depends on.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn create_cluster<'a>(&'a self, name: &'a str, actor: &'a Actor) -> BoxFuture<'a, RemoteResult<String>>;

	fn get_cluster_status<'a>(
		&'a self,
		cluster_id: &'a str,
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<String>>;

	fn list_clusters<'a>(&'a self, actor: &'a Actor) -> BoxFuture<'a, RemoteResult<Vec<ClusterSummary>>>;

	fn create_collection<'a>(
		&'a self,
		cluster_id: &'a str,
		schema: &'a VectorSchema,
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<()>>;

	fn delete_collection<'a>(
		&'a self,
		cluster_id: &'a str,
		collection_name: &'a str,
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<()>>;

	fn insert_vectors<'a>(
		&'a self,
		cluster_id: &'a str,
		collection_name: &'a str,
		dimension: u32,
		records: &'a [VectorRecord],
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<()>>;

	fn search_vectors<'a>(
		&'a self,
		cluster_id: &'a str,
		collection_name: &'a str,
		dimension: u32,
		query: &'a SearchQuery,
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<Vec<SearchHit>>>;
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
	pub cluster_name_prefix: String,
	pub provision_default_collections: bool,
}
impl ServiceSettings {
	pub fn from_config(cfg: &kyroo_config::Config) -> Self {
		Self {
			cluster_name_prefix: cfg.vector_store.cluster_name_prefix.clone(),
			provision_default_collections: cfg.workspace.provision_default_collections,
		}
	}
}

/// Composes relational writes and remote provisioning into workspace-level operations.
#[derive(Clone)]
pub struct KyrooService {
	pub settings: ServiceSettings,
	pub store: Arc<dyn WorkspaceStore>,
	pub vectors: Arc<dyn VectorStore>,
}
impl KyrooService {
	pub fn new(
		settings: ServiceSettings,
		store: Arc<dyn WorkspaceStore>,
		vectors: Arc<dyn VectorStore>,
	) -> Self {
		Self { settings, store, vectors }
	}

	/// Loads the requester's membership and checks it grants `permission`. Owners hold every
	/// permission.
	pub(crate) async fn require_member(
		&self,
		workspace_id: Uuid,
		user_id: &str,
		permission: &str,
	) -> Result<WorkspaceMember> {
		let Some(member) = self.store.get_member(workspace_id, user_id).await? else {
			return Err(Error::Forbidden {
				message: format!("User {user_id} is not a member of workspace {workspace_id}."),
			});
		};
		let is_owner =
			member.role.parse::<kyroo_domain::MemberRole>() == Ok(kyroo_domain::MemberRole::Owner);

		if !is_owner && !member.permissions.iter().any(|granted| granted == permission) {
			return Err(Error::Forbidden {
				message: format!("User {user_id} lacks {permission} on workspace {workspace_id}."),
			});
		}

		Ok(member)
	}

	pub(crate) async fn load_workspace(&self, workspace_id: Uuid) -> Result<Workspace> {
		self.store
			.get_workspace(workspace_id)
			.await?
			.ok_or_else(|| Error::not_found(format!("Workspace {workspace_id} does not exist.")))
	}
}

impl VectorStore for VectorStoreClient {
	fn create_cluster<'a>(&'a self, name: &'a str, actor: &'a Actor) -> BoxFuture<'a, RemoteResult<String>> {
		Box::pin(VectorStoreClient::create_cluster(self, name, actor))
	}

	fn get_cluster_status<'a>(
		&'a self,
		cluster_id: &'a str,
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<String>> {
		Box::pin(VectorStoreClient::get_cluster_status(self, cluster_id, actor))
	}

	fn list_clusters<'a>(&'a self, actor: &'a Actor) -> BoxFuture<'a, RemoteResult<Vec<ClusterSummary>>> {
		Box::pin(VectorStoreClient::list_clusters(self, actor))
	}

	fn create_collection<'a>(
		&'a self,
		cluster_id: &'a str,
		schema: &'a VectorSchema,
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<()>> {
		Box::pin(VectorStoreClient::create_collection(self, cluster_id, schema, actor))
	}

	fn delete_collection<'a>(
		&'a self,
		cluster_id: &'a str,
		collection_name: &'a str,
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<()>> {
		Box::pin(VectorStoreClient::delete_collection(self, cluster_id, collection_name, actor))
	}

	fn insert_vectors<'a>(
		&'a self,
		cluster_id: &'a str,
		collection_name: &'a str,
		dimension: u32,
		records: &'a [VectorRecord],
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<()>> {
		Box::pin(VectorStoreClient::insert_vectors(
			self,
			cluster_id,
			collection_name,
			dimension,
			records,
			actor,
		))
	}

	fn search_vectors<'a>(
		&'a self,
		cluster_id: &'a str,
		collection_name: &'a str,
		dimension: u32,
		query: &'a SearchQuery,
		actor: &'a Actor,
	) -> BoxFuture<'a, RemoteResult<Vec<SearchHit>>> {
		Box::pin(VectorStoreClient::search_vectors(
			self,
			cluster_id,
			collection_name,
			dimension,
			query,
			actor,
		))
	}
}
