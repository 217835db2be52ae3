use serde::Serialize;
use uuid::Uuid;

use kyroo_domain::{
	CollectionStatus, SearchHit, SearchQuery, VectorRecord, VectorSchema,
	record::{check_query_dimension, check_record_dimensions},
};
use kyroo_providers::Actor;

use crate::{Error, KyrooService, Result};

#[derive(Debug, Clone, Serialize)]
pub struct InsertVectorsResponse {
	pub collection_id: Uuid,
	pub inserted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchVectorsResponse {
	pub collection_id: Uuid,
	pub hits: Vec<SearchHit>,
}

struct Target {
	cluster_id: String,
	remote_name: String,
	dimension: u32,
	actor: Actor,
}

impl KyrooService {
	pub async fn insert_vectors(
		&self,
		workspace_id: Uuid,
		collection_id: Uuid,
		requester_id: &str,
		records: Vec<VectorRecord>,
	) -> Result<InsertVectorsResponse> {
		let target = self.resolve_target(workspace_id, collection_id, requester_id, "write").await?;

		check_record_dimensions(target.dimension, &records)
			.map_err(|err| Error::invalid(err.to_string()))?;

		self.vectors
			.insert_vectors(
				&target.cluster_id,
				&target.remote_name,
				target.dimension,
				&records,
				&target.actor,
			)
			.await?;

		Ok(InsertVectorsResponse { collection_id, inserted: records.len() })
	}

	pub async fn search_vectors(
		&self,
		workspace_id: Uuid,
		collection_id: Uuid,
		requester_id: &str,
		query: SearchQuery,
	) -> Result<SearchVectorsResponse> {
		let target = self.resolve_target(workspace_id, collection_id, requester_id, "read").await?;

		check_query_dimension(target.dimension, &query.vector)
			.map_err(|err| Error::invalid(err.to_string()))?;

		if query.top_k == 0 {
			return Err(Error::invalid("top_k must be greater than zero."));
		}

		let hits = self
			.vectors
			.search_vectors(
				&target.cluster_id,
				&target.remote_name,
				target.dimension,
				&query,
				&target.actor,
			)
			.await?;

		Ok(SearchVectorsResponse { collection_id, hits })
	}

	async fn resolve_target(
		&self,
		workspace_id: Uuid,
		collection_id: Uuid,
		requester_id: &str,
		permission: &str,
	) -> Result<Target> {
		self.require_member(workspace_id, requester_id, permission).await?;

		let workspace = self.load_workspace(workspace_id).await?;
		let collection =
			self.store.get_collection(workspace_id, collection_id).await?.ok_or_else(|| {
				Error::not_found(format!(
					"Collection {collection_id} does not exist in workspace {workspace_id}."
				))
			})?;
		let Some(cluster_id) = workspace.cluster_id else {
			return Err(Error::Conflict {
				message: format!("Workspace {workspace_id} has no remote cluster yet."),
			});
		};
		let status = collection.status.parse::<CollectionStatus>().map_err(|message| {
			Error::Storage { message: format!("Collection {collection_id}: {message}") }
		})?;
		let remote_name = match (status, collection.remote_name) {
			(CollectionStatus::Active, Some(remote_name)) => remote_name,
			_ =>
				return Err(Error::Conflict {
					message: format!(
						"Collection {collection_id} is {status} and cannot serve vectors yet."
					),
				}),
		};
		let schema: VectorSchema = serde_json::from_value(collection.schema).map_err(|err| {
			Error::Storage {
				message: format!("Collection {collection_id} has an unreadable schema: {err}."),
			}
		})?;

		Ok(Target {
			cluster_id,
			remote_name,
			dimension: schema.dimension,
			actor: Actor::user(requester_id).in_workspace(workspace_id),
		})
	}
}
