use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{Collection, NewCollection},
};

const COLLECTION_COLUMNS: &str = "\
collection_id,
	workspace_id,
	name,
	description,
	remote_name,
	schema,
	status,
	created_at,
	updated_at";

pub async fn insert_collection(db: &Db, new: &NewCollection) -> Result<Collection> {
	if new.name.trim().is_empty() {
		return Err(Error::InvalidArgument("Collection name must be non-empty.".to_string()));
	}

	let sql = format!(
		"\
INSERT INTO collections (workspace_id, name, description, remote_name, schema, status)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING
	{COLLECTION_COLUMNS}"
	);
	let collection = sqlx::query_as::<_, Collection>(&sql)
		.bind(new.workspace_id)
		.bind(new.name.as_str())
		.bind(new.description.as_deref())
		.bind(new.remote_name.as_deref())
		.bind(&new.schema)
		.bind(new.status.as_str())
		.fetch_one(&db.pool)
		.await?;

	Ok(collection)
}

pub async fn get_collection(
	db: &Db,
	workspace_id: Uuid,
	collection_id: Uuid,
) -> Result<Option<Collection>> {
	let sql = format!(
		"\
SELECT
	{COLLECTION_COLUMNS}
FROM collections
WHERE workspace_id = $1 AND collection_id = $2"
	);
	let collection = sqlx::query_as::<_, Collection>(&sql)
		.bind(workspace_id)
		.bind(collection_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(collection)
}

pub async fn list_collections(db: &Db, workspace_id: Uuid) -> Result<Vec<Collection>> {
	let sql = format!(
		"\
SELECT
	{COLLECTION_COLUMNS}
FROM collections
WHERE workspace_id = $1
ORDER BY created_at, name"
	);
	let collections =
		sqlx::query_as::<_, Collection>(&sql).bind(workspace_id).fetch_all(&db.pool).await?;

	Ok(collections)
}

/// Collections still waiting for a remote counterpart in workspaces that have a cluster.
pub async fn list_unprovisioned_collections(db: &Db) -> Result<Vec<Collection>> {
	let sql = "\
SELECT
	c.collection_id,
	c.workspace_id,
	c.name,
	c.description,
	c.remote_name,
	c.schema,
	c.status,
	c.created_at,
	c.updated_at
FROM collections c
JOIN workspaces w ON w.workspace_id = c.workspace_id
WHERE c.status IN ('pending', 'error')
	AND w.cluster_id IS NOT NULL
ORDER BY c.created_at";
	let collections = sqlx::query_as::<_, Collection>(sql).fetch_all(&db.pool).await?;

	Ok(collections)
}

/// Moves a collection to `status`. `remote_name` must be present exactly when the new status is
/// `active`.
pub async fn update_collection_status(
	db: &Db,
	collection_id: Uuid,
	status: &str,
	remote_name: Option<&str>,
) -> Result<()> {
	if (status == "active") != remote_name.is_some() {
		return Err(Error::InvalidArgument(
			"remote_name must be set if and only if status is active.".to_string(),
		));
	}

	let result = sqlx::query(
		"\
UPDATE collections
SET
	status = $2,
	remote_name = $3,
	updated_at = now()
WHERE collection_id = $1",
	)
	.bind(collection_id)
	.bind(status)
	.bind(remote_name)
	.execute(&db.pool)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("Collection {collection_id} does not exist.")));
	}

	Ok(())
}
