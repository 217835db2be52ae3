use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{MemberWorkspace, NewMember, NewWorkspace, Workspace, WorkspaceMember},
};

const WORKSPACE_COLUMNS: &str = "\
workspace_id,
	name,
	description,
	owner_id,
	cluster_id,
	settings,
	is_active,
	created_at,
	updated_at";

pub async fn insert_workspace(db: &Db, new: &NewWorkspace) -> Result<Workspace> {
	if new.name.trim().is_empty() {
		return Err(Error::InvalidArgument("Workspace name must be non-empty.".to_string()));
	}

	let sql = format!(
		"\
INSERT INTO workspaces (name, description, owner_id, settings)
VALUES ($1, $2, $3, $4)
RETURNING
	{WORKSPACE_COLUMNS}"
	);
	let workspace = sqlx::query_as::<_, Workspace>(&sql)
		.bind(new.name.as_str())
		.bind(new.description.as_deref())
		.bind(new.owner_id.as_str())
		.bind(&new.settings)
		.fetch_one(&db.pool)
		.await?;

	Ok(workspace)
}

pub async fn get_workspace(db: &Db, workspace_id: Uuid) -> Result<Option<Workspace>> {
	let sql = format!(
		"\
SELECT
	{WORKSPACE_COLUMNS}
FROM workspaces
WHERE workspace_id = $1"
	);
	let workspace =
		sqlx::query_as::<_, Workspace>(&sql).bind(workspace_id).fetch_optional(&db.pool).await?;

	Ok(workspace)
}

/// Deletes the workspace row. Memberships and collections go with it.
pub async fn delete_workspace(db: &Db, workspace_id: Uuid) -> Result<bool> {
	let result = sqlx::query("DELETE FROM workspaces WHERE workspace_id = $1")
		.bind(workspace_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

/// Records the remote cluster of a workspace. A cluster id that is already set is never
/// replaced.
pub async fn set_workspace_cluster(db: &Db, workspace_id: Uuid, cluster_id: &str) -> Result<()> {
	let result = sqlx::query(
		"\
UPDATE workspaces
SET
	cluster_id = $2,
	updated_at = now()
WHERE workspace_id = $1
	AND cluster_id IS NULL",
	)
	.bind(workspace_id)
	.bind(cluster_id)
	.execute(&db.pool)
	.await
	.map_err(|err| Error::from_write(err, "Cluster assignment"))?;

	if result.rows_affected() > 0 {
		return Ok(());
	}

	match get_workspace(db, workspace_id).await? {
		Some(_) => Err(Error::Conflict(format!(
			"Workspace {workspace_id} already has a cluster assigned."
		))),
		None => Err(Error::NotFound(format!("Workspace {workspace_id} does not exist."))),
	}
}

pub async fn list_workspaces_with_cluster(db: &Db) -> Result<Vec<Workspace>> {
	let sql = format!(
		"\
SELECT
	{WORKSPACE_COLUMNS}
FROM workspaces
WHERE cluster_id IS NOT NULL
ORDER BY created_at"
	);
	let workspaces = sqlx::query_as::<_, Workspace>(&sql).fetch_all(&db.pool).await?;

	Ok(workspaces)
}

pub async fn insert_member(db: &Db, new: &NewMember) -> Result<WorkspaceMember> {
	let member = sqlx::query_as::<_, WorkspaceMember>(
		"\
INSERT INTO workspace_members (workspace_id, user_id, role, permissions)
VALUES ($1, $2, $3, $4)
RETURNING
	workspace_id,
	user_id,
	role,
	permissions,
	created_at",
	)
	.bind(new.workspace_id)
	.bind(new.user_id.as_str())
	.bind(new.role.as_str())
	.bind(&new.permissions)
	.fetch_one(&db.pool)
	.await
	.map_err(|err| Error::from_write(err, "Membership"))?;

	Ok(member)
}

pub async fn get_member(
	db: &Db,
	workspace_id: Uuid,
	user_id: &str,
) -> Result<Option<WorkspaceMember>> {
	let member = sqlx::query_as::<_, WorkspaceMember>(
		"\
SELECT
	workspace_id,
	user_id,
	role,
	permissions,
	created_at
FROM workspace_members
WHERE workspace_id = $1 AND user_id = $2",
	)
	.bind(workspace_id)
	.bind(user_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(member)
}

pub async fn list_member_workspaces(db: &Db, user_id: &str) -> Result<Vec<MemberWorkspace>> {
	let rows = sqlx::query_as::<_, MemberWorkspace>(
		"\
SELECT
	w.workspace_id,
	w.name,
	w.description,
	w.owner_id,
	w.cluster_id,
	w.settings,
	w.is_active,
	w.created_at,
	w.updated_at,
	m.role
FROM workspace_members m
JOIN workspaces w ON w.workspace_id = m.workspace_id
WHERE m.user_id = $1
ORDER BY w.created_at DESC",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
