use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use kyroo_domain::{CollectionStatus, VectorSchema, naming};
use kyroo_providers::{Actor, ClassifiedError};
use kyroo_storage::models::{Collection, NewCollection};

use crate::{Error, KyrooService, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollectionRequest {
	pub workspace_id: Uuid,
	pub requester_id: String,
	pub name: String,
	pub description: Option<String>,
	/// Defaults to the text-embedding layout.
	pub schema: Option<VectorSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCollectionResponse {
	pub collection: Collection,
	/// Why remote provisioning failed when the collection ended up in `error`.
	pub remote_error: Option<ClassifiedError>,
}

impl KyrooService {
	/// Always writes the relational record. The status says how far remote provisioning got:
	/// `pending` without a cluster, `active` on success and `error` on failure.
	pub async fn create_collection(
		&self,
		req: CreateCollectionRequest,
	) -> Result<CreateCollectionResponse> {
		let name = req.name.trim();

		if name.is_empty() {
			return Err(Error::invalid("Collection name must be non-empty."));
		}

		let workspace = self.load_workspace(req.workspace_id).await?;

		self.require_member(req.workspace_id, &req.requester_id, "write").await?;

		let schema = req.schema.clone().unwrap_or_else(VectorSchema::text_embeddings);
		let snapshot = serde_json::to_value(&schema)
			.map_err(|err| Error::invalid(format!("Schema is not serializable: {err}.")))?;
		let (status, remote_name, remote_error) = match workspace.cluster_id.as_deref() {
			None => {
				tracing::info!(
					workspace_id = %req.workspace_id,
					collection = name,
					"Workspace has no cluster. Collection stays pending."
				);

				(CollectionStatus::Pending, None, None)
			},
			Some(cluster_id) => {
				let actor = Actor::user(req.requester_id.as_str()).in_workspace(req.workspace_id);

				match self
					.provision_remote_collection(
						cluster_id,
						name,
						&schema,
						req.description.as_deref(),
						&actor,
					)
					.await
				{
					Ok(remote_name) => (CollectionStatus::Active, Some(remote_name), None),
					Err(err) => (CollectionStatus::Error, None, Some(err)),
				}
			},
		};
		let collection = self
			.store
			.insert_collection(&NewCollection {
				workspace_id: req.workspace_id,
				name: name.to_string(),
				description: req.description.clone(),
				remote_name,
				schema: snapshot,
				status: status.as_str().to_string(),
			})
			.await?;

		Ok(CreateCollectionResponse { collection, remote_error })
	}

	/// Creates the remote collection under a fresh remote name and returns that name. A schema
	/// that fails validation never reaches the client.
	pub(crate) async fn provision_remote_collection(
		&self,
		cluster_id: &str,
		display_name: &str,
		schema: &VectorSchema,
		description: Option<&str>,
		actor: &Actor,
	) -> std::result::Result<String, ClassifiedError> {
		if let Err(err) = schema.validate() {
			tracing::warn!(
				cluster_id,
				collection = display_name,
				error = %err,
				"Rejected collection schema before provisioning."
			);

			return Err(ClassifiedError::client(err.to_string()));
		}

		let remote_name = naming::remote_collection_name(display_name, OffsetDateTime::now_utc());
		let remote_schema = schema.for_remote(&remote_name, description);

		match self.vectors.create_collection(cluster_id, &remote_schema, actor).await {
			Ok(()) => Ok(remote_name),
			Err(err) => {
				tracing::warn!(
					cluster_id,
					collection = display_name,
					kind = %err.kind,
					error = %err,
					"Remote collection provisioning failed. Collection marked as error."
				);

				Err(err)
			},
		}
	}
}
