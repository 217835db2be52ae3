//! [`WorkspaceStore`] over the Postgres tables.

use uuid::Uuid;

use kyroo_storage::{
	Result, collections,
	db::Db,
	models::{
		Collection, MemberWorkspace, NewCollection, NewMember, NewWorkspace, Workspace,
		WorkspaceMember,
	},
	workspaces,
};

use crate::{BoxFuture, WorkspaceStore};

impl WorkspaceStore for Db {
	fn insert_workspace<'a>(&'a self, new: &'a NewWorkspace) -> BoxFuture<'a, Result<Workspace>> {
		Box::pin(workspaces::insert_workspace(self, new))
	}

	fn get_workspace(&self, workspace_id: Uuid) -> BoxFuture<'_, Result<Option<Workspace>>> {
		Box::pin(workspaces::get_workspace(self, workspace_id))
	}

	fn delete_workspace(&self, workspace_id: Uuid) -> BoxFuture<'_, Result<bool>> {
		Box::pin(workspaces::delete_workspace(self, workspace_id))
	}

	fn set_workspace_cluster<'a>(
		&'a self,
		workspace_id: Uuid,
		cluster_id: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(workspaces::set_workspace_cluster(self, workspace_id, cluster_id))
	}

	fn list_workspaces_with_cluster(&self) -> BoxFuture<'_, Result<Vec<Workspace>>> {
		Box::pin(workspaces::list_workspaces_with_cluster(self))
	}

	fn insert_member<'a>(&'a self, new: &'a NewMember) -> BoxFuture<'a, Result<WorkspaceMember>> {
		Box::pin(workspaces::insert_member(self, new))
	}

	fn get_member<'a>(
		&'a self,
		workspace_id: Uuid,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Option<WorkspaceMember>>> {
		Box::pin(workspaces::get_member(self, workspace_id, user_id))
	}

	fn list_member_workspaces<'a>(
		&'a self,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<MemberWorkspace>>> {
		Box::pin(workspaces::list_member_workspaces(self, user_id))
	}

	fn insert_collection<'a>(&'a self, new: &'a NewCollection) -> BoxFuture<'a, Result<Collection>> {
		Box::pin(collections::insert_collection(self, new))
	}

	fn get_collection(
		&self,
		workspace_id: Uuid,
		collection_id: Uuid,
	) -> BoxFuture<'_, Result<Option<Collection>>> {
		Box::pin(collections::get_collection(self, workspace_id, collection_id))
	}

	fn list_collections(&self, workspace_id: Uuid) -> BoxFuture<'_, Result<Vec<Collection>>> {
		Box::pin(collections::list_collections(self, workspace_id))
	}

	fn list_unprovisioned_collections(&self) -> BoxFuture<'_, Result<Vec<Collection>>> {
		Box::pin(collections::list_unprovisioned_collections(self))
	}

	fn update_collection_status<'a>(
		&'a self,
		collection_id: Uuid,
		status: &'a str,
		remote_name: Option<&'a str>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(collections::update_collection_status(self, collection_id, status, remote_name))
	}
}
