//! An in-memory [`WorkspaceStore`] with switchable failures.
//!
//! Row constraints mirror the Postgres schema: a collection's remote name is set exactly when it
//! is `active`, and a workspace's cluster can only be attached once.

use std::sync::{
	Mutex,
	atomic::{AtomicBool, Ordering},
};

use time::OffsetDateTime;
use uuid::Uuid;

use kyroo_domain::CollectionStatus;
use kyroo_service::{BoxFuture, WorkspaceStore};
use kyroo_storage::{
	Error, Result,
	models::{
		Collection, MemberWorkspace, NewCollection, NewMember, NewWorkspace, Workspace,
		WorkspaceMember,
	},
};

#[derive(Default)]
struct Rows {
	workspaces: Vec<Workspace>,
	members: Vec<WorkspaceMember>,
	collections: Vec<Collection>,
}

#[derive(Default)]
pub struct MemoryStore {
	rows: Mutex<Rows>,
	/// Makes the next membership inserts fail with a conflict.
	pub fail_member_insert: AtomicBool,
	/// Makes cluster attachment fail with a conflict.
	pub fail_set_cluster: AtomicBool,
	/// Makes collection status updates fail.
	pub fail_status_update: AtomicBool,
}
impl MemoryStore {
	fn with_rows<T>(&self, f: impl FnOnce(&mut Rows) -> T) -> T {
		let mut rows = self.rows.lock().unwrap_or_else(|err| err.into_inner());

		f(&mut rows)
	}

	pub fn workspace_count(&self) -> usize {
		self.with_rows(|rows| rows.workspaces.len())
	}

	pub fn workspace(&self, workspace_id: Uuid) -> Option<Workspace> {
		self.with_rows(|rows| {
			rows.workspaces.iter().find(|ws| ws.workspace_id == workspace_id).cloned()
		})
	}

	pub fn members(&self, workspace_id: Uuid) -> Vec<WorkspaceMember> {
		self.with_rows(|rows| {
			rows.members.iter().filter(|m| m.workspace_id == workspace_id).cloned().collect()
		})
	}

	pub fn collections(&self, workspace_id: Uuid) -> Vec<Collection> {
		self.with_rows(|rows| {
			rows.collections.iter().filter(|c| c.workspace_id == workspace_id).cloned().collect()
		})
	}
}
impl WorkspaceStore for MemoryStore {
	fn insert_workspace<'a>(&'a self, new: &'a NewWorkspace) -> BoxFuture<'a, Result<Workspace>> {
		let now = OffsetDateTime::now_utc();
		let workspace = Workspace {
			workspace_id: Uuid::new_v4(),
			name: new.name.clone(),
			description: new.description.clone(),
			owner_id: new.owner_id.clone(),
			cluster_id: None,
			settings: new.settings.clone(),
			is_active: true,
			created_at: now,
			updated_at: now,
		};

		self.with_rows(|rows| rows.workspaces.push(workspace.clone()));

		Box::pin(async move { Ok(workspace) })
	}

	fn get_workspace(&self, workspace_id: Uuid) -> BoxFuture<'_, Result<Option<Workspace>>> {
		let found = self.workspace(workspace_id);

		Box::pin(async move { Ok(found) })
	}

	fn delete_workspace(&self, workspace_id: Uuid) -> BoxFuture<'_, Result<bool>> {
		let removed = self.with_rows(|rows| {
			let before = rows.workspaces.len();

			rows.workspaces.retain(|ws| ws.workspace_id != workspace_id);
			rows.members.retain(|m| m.workspace_id != workspace_id);
			rows.collections.retain(|c| c.workspace_id != workspace_id);

			rows.workspaces.len() < before
		});

		Box::pin(async move { Ok(removed) })
	}

	fn set_workspace_cluster<'a>(
		&'a self,
		workspace_id: Uuid,
		cluster_id: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		let result = if self.fail_set_cluster.load(Ordering::SeqCst) {
			Err(Error::Conflict("Injected cluster persistence failure.".to_string()))
		} else {
			self.with_rows(|rows| {
				match rows.workspaces.iter_mut().find(|ws| ws.workspace_id == workspace_id) {
					Some(ws) if ws.cluster_id.is_none() => {
						ws.cluster_id = Some(cluster_id.to_string());
						ws.updated_at = OffsetDateTime::now_utc();

						Ok(())
					},
					Some(_) => Err(Error::Conflict(format!(
						"Workspace {workspace_id} already has a cluster."
					))),
					None => Err(Error::NotFound(format!("Workspace {workspace_id} not found."))),
				}
			})
		};

		Box::pin(async move { result })
	}

	fn list_workspaces_with_cluster(&self) -> BoxFuture<'_, Result<Vec<Workspace>>> {
		let found = self.with_rows(|rows| {
			rows.workspaces.iter().filter(|ws| ws.cluster_id.is_some()).cloned().collect()
		});

		Box::pin(async move { Ok(found) })
	}

	fn insert_member<'a>(&'a self, new: &'a NewMember) -> BoxFuture<'a, Result<WorkspaceMember>> {
		let result = if self.fail_member_insert.load(Ordering::SeqCst) {
			Err(Error::Conflict("Injected membership failure.".to_string()))
		} else {
			let member = WorkspaceMember {
				workspace_id: new.workspace_id,
				user_id: new.user_id.clone(),
				role: new.role.clone(),
				permissions: new.permissions.clone(),
				created_at: OffsetDateTime::now_utc(),
			};

			self.with_rows(|rows| rows.members.push(member.clone()));

			Ok(member)
		};

		Box::pin(async move { result })
	}

	fn get_member<'a>(
		&'a self,
		workspace_id: Uuid,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Option<WorkspaceMember>>> {
		let found = self.with_rows(|rows| {
			rows.members
				.iter()
				.find(|m| m.workspace_id == workspace_id && m.user_id == user_id)
				.cloned()
		});

		Box::pin(async move { Ok(found) })
	}

	fn list_member_workspaces<'a>(
		&'a self,
		user_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<MemberWorkspace>>> {
		let found = self.with_rows(|rows| {
			rows.members
				.iter()
				.filter(|m| m.user_id == user_id)
				.filter_map(|m| {
					rows.workspaces
						.iter()
						.find(|ws| ws.workspace_id == m.workspace_id)
						.map(|ws| MemberWorkspace { workspace: ws.clone(), role: m.role.clone() })
				})
				.collect()
		});

		Box::pin(async move { Ok(found) })
	}

	fn insert_collection<'a>(
		&'a self,
		new: &'a NewCollection,
	) -> BoxFuture<'a, Result<Collection>> {
		let result = check_status(&new.status, new.remote_name.as_deref()).map(|()| {
			let now = OffsetDateTime::now_utc();
			let collection = Collection {
				collection_id: Uuid::new_v4(),
				workspace_id: new.workspace_id,
				name: new.name.clone(),
				description: new.description.clone(),
				remote_name: new.remote_name.clone(),
				schema: new.schema.clone(),
				status: new.status.clone(),
				created_at: now,
				updated_at: now,
			};

			self.with_rows(|rows| rows.collections.push(collection.clone()));

			collection
		});

		Box::pin(async move { result })
	}

	fn get_collection(
		&self,
		workspace_id: Uuid,
		collection_id: Uuid,
	) -> BoxFuture<'_, Result<Option<Collection>>> {
		let found = self.with_rows(|rows| {
			rows.collections
				.iter()
				.find(|c| c.workspace_id == workspace_id && c.collection_id == collection_id)
				.cloned()
		});

		Box::pin(async move { Ok(found) })
	}

	fn list_collections(&self, workspace_id: Uuid) -> BoxFuture<'_, Result<Vec<Collection>>> {
		let found = self.collections(workspace_id);

		Box::pin(async move { Ok(found) })
	}

	fn list_unprovisioned_collections(&self) -> BoxFuture<'_, Result<Vec<Collection>>> {
		let found = self.with_rows(|rows| {
			rows.collections
				.iter()
				.filter(|c| {
					let needs = c
						.status
						.parse::<CollectionStatus>()
						.is_ok_and(CollectionStatus::needs_provisioning);
					let has_cluster = rows.workspaces.iter().any(|ws| {
						ws.workspace_id == c.workspace_id && ws.cluster_id.is_some()
					});

					needs && has_cluster
				})
				.cloned()
				.collect()
		});

		Box::pin(async move { Ok(found) })
	}

	fn update_collection_status<'a>(
		&'a self,
		collection_id: Uuid,
		status: &'a str,
		remote_name: Option<&'a str>,
	) -> BoxFuture<'a, Result<()>> {
		if self.fail_status_update.load(Ordering::SeqCst) {
			return Box::pin(async {
				Err(Error::Conflict("Injected status update failure.".to_string()))
			});
		}

		let result = check_status(status, remote_name).and_then(|()| {
			self.with_rows(|rows| {
				let Some(collection) =
					rows.collections.iter_mut().find(|c| c.collection_id == collection_id)
				else {
					return Err(Error::NotFound(format!("Collection {collection_id} not found.")));
				};

				collection.status = status.to_string();
				collection.remote_name = remote_name.map(str::to_string);
				collection.updated_at = OffsetDateTime::now_utc();

				Ok(())
			})
		});

		Box::pin(async move { result })
	}
}

fn check_status(status: &str, remote_name: Option<&str>) -> Result<()> {
	let parsed = status.parse::<CollectionStatus>().map_err(Error::InvalidArgument)?;

	if !parsed.is_consistent_with(remote_name) {
		return Err(Error::InvalidArgument(format!(
			"A {parsed} collection must {} a remote name.",
			if parsed == CollectionStatus::Active { "have" } else { "not have" }
		)));
	}

	Ok(())
}
