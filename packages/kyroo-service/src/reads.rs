use serde::Serialize;
use uuid::Uuid;

use kyroo_providers::Actor;
use kyroo_storage::models::{Collection, Workspace};

use crate::{KyrooService, Result};

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceView {
	#[serde(flatten)]
	pub workspace: Workspace,
	pub role: String,
	pub collections: Vec<Collection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterStatusResponse {
	pub workspace_id: Uuid,
	pub cluster_id: Option<String>,
	/// Remote status string, absent when the workspace has no cluster.
	pub status: Option<String>,
}

impl KyrooService {
	pub async fn list_user_workspaces(&self, user_id: &str) -> Result<Vec<WorkspaceView>> {
		let rows = self.store.list_member_workspaces(user_id).await?;
		let mut views = Vec::with_capacity(rows.len());

		for row in rows {
			let collections = self.store.list_collections(row.workspace.workspace_id).await?;

			views.push(WorkspaceView { workspace: row.workspace, role: row.role, collections });
		}

		Ok(views)
	}

	/// `None` when the workspace does not exist or the user is not a member of it.
	pub async fn get_workspace(
		&self,
		workspace_id: Uuid,
		user_id: &str,
	) -> Result<Option<WorkspaceView>> {
		let Some(member) = self.store.get_member(workspace_id, user_id).await? else {
			return Ok(None);
		};
		let Some(workspace) = self.store.get_workspace(workspace_id).await? else {
			return Ok(None);
		};
		let collections = self.store.list_collections(workspace_id).await?;

		Ok(Some(WorkspaceView { workspace, role: member.role, collections }))
	}

	pub async fn cluster_status(
		&self,
		workspace_id: Uuid,
		requester_id: &str,
	) -> Result<ClusterStatusResponse> {
		self.require_member(workspace_id, requester_id, "read").await?;

		let workspace = self.load_workspace(workspace_id).await?;
		let Some(cluster_id) = workspace.cluster_id else {
			return Ok(ClusterStatusResponse { workspace_id, cluster_id: None, status: None });
		};
		let actor = Actor::user(requester_id).in_workspace(workspace_id);
		let status = self.vectors.get_cluster_status(&cluster_id, &actor).await?;

		Ok(ClusterStatusResponse { workspace_id, cluster_id: Some(cluster_id), status: Some(status) })
	}
}
