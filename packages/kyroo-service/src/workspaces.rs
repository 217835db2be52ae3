use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use kyroo_domain::{
	CollectionStatus, MemberRole, OWNER_PERMISSIONS, naming, schema::default_collections,
};
use kyroo_providers::{Actor, ClassifiedError};
use kyroo_storage::models::{NewMember, NewWorkspace, Workspace};

use crate::{CreateCollectionRequest, Error, KyrooService, Result};

#[derive(Debug, Clone)]
pub struct CreateWorkspaceRequest {
	pub name: String,
	pub description: Option<String>,
	pub owner_id: String,
	pub provision_remote: bool,
}

/// What happened to the remote cluster during workspace creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterOutcome {
	/// Remote provisioning was not requested.
	Skipped,
	Provisioned { cluster_id: String },
	Failed { error: ClassifiedError },
	/// The cluster exists remotely but its id could not be recorded.
	PersistFailed { cluster_id: String, message: String },
}
impl ClusterOutcome {
	pub fn cluster_id(&self) -> Option<&str> {
		match self {
			Self::Provisioned { cluster_id } | Self::PersistFailed { cluster_id, .. } =>
				Some(cluster_id),
			Self::Skipped | Self::Failed { .. } => None,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionOutcome {
	pub name: String,
	/// Absent when the relational record itself could not be written.
	pub collection_id: Option<Uuid>,
	pub status: Option<CollectionStatus>,
	pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkspaceResponse {
	pub workspace: Workspace,
	pub cluster: ClusterOutcome,
	pub collections: Vec<CollectionOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteDeletion {
	pub collection_id: Uuid,
	pub remote_name: String,
	pub error: Option<ClassifiedError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteWorkspaceResponse {
	pub workspace_id: Uuid,
	pub remote_deletions: Vec<RemoteDeletion>,
}

impl KyrooService {
	/// Creates the workspace row and owner membership, then provisions remote capability on a
	/// best-effort basis. Only relational failures are returned as errors.
	pub async fn create_workspace(
		&self,
		req: CreateWorkspaceRequest,
	) -> Result<CreateWorkspaceResponse> {
		let name = req.name.trim();

		if name.is_empty() {
			return Err(Error::invalid("Workspace name must be non-empty."));
		}
		if req.owner_id.trim().is_empty() {
			return Err(Error::invalid("owner_id must be non-empty."));
		}

		let now = OffsetDateTime::now_utc();
		let settings = serde_json::json!({
			"default_collections": self.settings.provision_default_collections,
			"created_at": now.format(&Rfc3339).unwrap_or_default(),
		});
		let mut workspace = self
			.store
			.insert_workspace(&NewWorkspace {
				name: name.to_string(),
				description: req.description.clone(),
				owner_id: req.owner_id.clone(),
				settings,
			})
			.await?;
		let workspace_id = workspace.workspace_id;
		let membership = NewMember {
			workspace_id,
			user_id: req.owner_id.clone(),
			role: MemberRole::Owner.as_str().to_string(),
			permissions: OWNER_PERMISSIONS.iter().map(|perm| perm.to_string()).collect(),
		};

		if let Err(err) = self.store.insert_member(&membership).await {
			tracing::error!(
				workspace_id = %workspace_id,
				user_id = %req.owner_id,
				error = %err,
				"Failed to grant workspace ownership. Removing the workspace."
			);

			if let Err(cleanup_err) = self.store.delete_workspace(workspace_id).await {
				tracing::error!(
					workspace_id = %workspace_id,
					error = %cleanup_err,
					"Failed to remove workspace after a failed ownership grant."
				);
			}

			return Err(err.into());
		}

		let actor = Actor::user(req.owner_id.as_str()).in_workspace(workspace_id);
		let cluster = if req.provision_remote {
			self.provision_cluster(workspace_id, &actor).await
		} else {
			ClusterOutcome::Skipped
		};

		if let ClusterOutcome::Provisioned { cluster_id } = &cluster {
			workspace.cluster_id = Some(cluster_id.clone());
		}

		let mut collections = Vec::new();

		if self.settings.provision_default_collections && cluster.cluster_id().is_some() {
			for default in default_collections() {
				let outcome = self
					.create_collection(CreateCollectionRequest {
						workspace_id,
						requester_id: req.owner_id.clone(),
						name: default.name.to_string(),
						description: Some(default.description.to_string()),
						schema: Some(default.schema),
					})
					.await;

				collections.push(match outcome {
					Ok(created) => CollectionOutcome {
						name: default.name.to_string(),
						collection_id: Some(created.collection.collection_id),
						status: created.collection.status.parse().ok(),
						error: created.remote_error.map(|err| err.to_string()),
					},
					Err(err) => {
						tracing::warn!(
							workspace_id = %workspace_id,
							collection = default.name,
							error = %err,
							"Failed to create default collection."
						);

						CollectionOutcome {
							name: default.name.to_string(),
							collection_id: None,
							status: None,
							error: Some(err.to_string()),
						}
					},
				});
			}
		}

		tracing::info!(
			workspace_id = %workspace_id,
			user_id = %req.owner_id,
			cluster_id = ?workspace.cluster_id,
			"Workspace created."
		);

		Ok(CreateWorkspaceResponse { workspace, cluster, collections })
	}

	async fn provision_cluster(&self, workspace_id: Uuid, actor: &Actor) -> ClusterOutcome {
		let name = naming::cluster_name(&self.settings.cluster_name_prefix, workspace_id);
		let cluster_id = match self.vectors.create_cluster(&name, actor).await {
			Ok(cluster_id) => cluster_id,
			Err(err) => {
				tracing::warn!(
					workspace_id = %workspace_id,
					kind = %err.kind,
					error = %err,
					"Remote cluster provisioning failed. Continuing without vector capability."
				);

				return ClusterOutcome::Failed { error: err };
			},
		};

		match self.store.set_workspace_cluster(workspace_id, &cluster_id).await {
			Ok(()) => ClusterOutcome::Provisioned { cluster_id },
			Err(err) => {
				tracing::error!(
					workspace_id = %workspace_id,
					cluster_id = %cluster_id,
					error = %err,
					"Failed to record the remote cluster. Reconciliation will report it."
				);

				ClusterOutcome::PersistFailed { cluster_id, message: err.to_string() }
			},
		}
	}

	/// Removes remote collections on a best-effort basis, then the workspace row with everything
	/// hanging off it. The remote cluster itself is left in place.
	pub async fn delete_workspace(
		&self,
		workspace_id: Uuid,
		requester_id: &str,
	) -> Result<DeleteWorkspaceResponse> {
		// Outsiders get Forbidden whether or not the workspace exists.
		let member = self.store.get_member(workspace_id, requester_id).await?;

		if member.map(|member| member.role.parse::<MemberRole>()) != Some(Ok(MemberRole::Owner)) {
			return Err(Error::Forbidden {
				message: format!("Only the owner can delete workspace {workspace_id}."),
			});
		}

		let workspace = self.load_workspace(workspace_id).await?;

		let mut remote_deletions = Vec::new();

		if let Some(cluster_id) = workspace.cluster_id.as_deref() {
			let actor = Actor::user(requester_id).in_workspace(workspace_id);

			for collection in self.store.list_collections(workspace_id).await? {
				let Some(remote_name) = collection.remote_name else {
					continue;
				};
				let error =
					self.vectors.delete_collection(cluster_id, &remote_name, &actor).await.err();

				if let Some(err) = &error {
					tracing::warn!(
						workspace_id = %workspace_id,
						cluster_id,
						collection = %remote_name,
						error = %err,
						"Failed to delete remote collection. Continuing with workspace deletion."
					);
				}

				remote_deletions.push(RemoteDeletion {
					collection_id: collection.collection_id,
					remote_name,
					error,
				});
			}
		}

		if !self.store.delete_workspace(workspace_id).await? {
			return Err(Error::not_found(format!("Workspace {workspace_id} does not exist.")));
		}

		tracing::info!(workspace_id = %workspace_id, user_id = requester_id, "Workspace deleted.");

		Ok(DeleteWorkspaceResponse { workspace_id, remote_deletions })
	}
}
