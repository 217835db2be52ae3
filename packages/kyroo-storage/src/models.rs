use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Workspace {
	pub workspace_id: Uuid,
	pub name: String,
	pub description: Option<String>,
	pub owner_id: String,
	/// Remote cluster backing this workspace. Null until provisioning succeeds and never
	/// reassigned afterwards.
	pub cluster_id: Option<String>,
	pub settings: Value,
	pub is_active: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WorkspaceMember {
	pub workspace_id: Uuid,
	pub user_id: String,
	pub role: String,
	pub permissions: Vec<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

/// A workspace seen through one member's membership row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberWorkspace {
	#[sqlx(flatten)]
	pub workspace: Workspace,
	pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Collection {
	pub collection_id: Uuid,
	pub workspace_id: Uuid,
	pub name: String,
	pub description: Option<String>,
	/// Set if and only if `status` is `active`.
	pub remote_name: Option<String>,
	pub schema: Value,
	pub status: String,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewWorkspace {
	pub name: String,
	pub description: Option<String>,
	pub owner_id: String,
	pub settings: Value,
}

#[derive(Debug, Clone)]
pub struct NewMember {
	pub workspace_id: Uuid,
	pub user_id: String,
	pub role: String,
	pub permissions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewCollection {
	pub workspace_id: Uuid,
	pub name: String,
	pub description: Option<String>,
	pub remote_name: Option<String>,
	pub schema: Value,
	pub status: String,
}
