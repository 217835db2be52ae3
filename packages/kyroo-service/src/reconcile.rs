//! Cross-checks between the relational store and the remote control plane.
//!
//! The relational store is the source of truth for existence. Nothing here deletes remote
//! resources: orphans are reported for an operator to act on.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use kyroo_domain::{CollectionStatus, VectorSchema, naming};
use kyroo_providers::{Actor, ClassifiedError, ClusterSummary};

use crate::{KyrooService, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingCluster {
	pub workspace_id: Uuid,
	pub cluster_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
	pub tracked_clusters: usize,
	pub remote_clusters: usize,
	/// Recorded on a workspace but missing remotely.
	pub dangling: Vec<DanglingCluster>,
	/// Named like a workspace cluster but referenced by no workspace.
	pub untracked: Vec<ClusterSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReprovisionFailure {
	pub collection_id: Uuid,
	pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReprovisionReport {
	pub attempted: usize,
	pub activated: Vec<Uuid>,
	pub failed: Vec<ReprovisionFailure>,
}

impl KyrooService {
	pub async fn reconcile_clusters(&self) -> Result<ReconcileReport> {
		let remote = self.vectors.list_clusters(&Actor::default()).await?;
		let tracked = self.store.list_workspaces_with_cluster().await?;
		let remote_ids: HashSet<&str> =
			remote.iter().map(|cluster| cluster.cluster_id.as_str()).collect();
		let tracked_ids: HashSet<&str> =
			tracked.iter().filter_map(|workspace| workspace.cluster_id.as_deref()).collect();
		let mut report = ReconcileReport {
			tracked_clusters: tracked_ids.len(),
			remote_clusters: remote.len(),
			..Default::default()
		};

		for workspace in &tracked {
			let Some(cluster_id) = workspace.cluster_id.as_deref() else {
				continue;
			};

			if !remote_ids.contains(cluster_id) {
				tracing::warn!(
					workspace_id = %workspace.workspace_id,
					cluster_id,
					"Workspace references a cluster that does not exist remotely."
				);

				report.dangling.push(DanglingCluster {
					workspace_id: workspace.workspace_id,
					cluster_id: cluster_id.to_string(),
				});
			}
		}
		for cluster in &remote {
			let is_workspace_cluster = naming::workspace_id_from_cluster_name(
				&self.settings.cluster_name_prefix,
				&cluster.cluster_name,
			)
			.is_some();

			if is_workspace_cluster && !tracked_ids.contains(cluster.cluster_id.as_str()) {
				tracing::warn!(
					cluster_id = %cluster.cluster_id,
					cluster_name = %cluster.cluster_name,
					"Remote cluster is not referenced by any workspace."
				);

				report.untracked.push(cluster.clone());
			}
		}

		tracing::info!(
			tracked = report.tracked_clusters,
			remote = report.remote_clusters,
			dangling = report.dangling.len(),
			untracked = report.untracked.len(),
			"Cluster reconciliation finished."
		);

		Ok(report)
	}

	/// Retries remote creation of `pending` and `error` collections in workspaces that now have
	/// a cluster.
	pub async fn reprovision_collections(&self) -> Result<ReprovisionReport> {
		let pending = self.store.list_unprovisioned_collections().await?;
		let mut clusters: HashMap<Uuid, Option<String>> = HashMap::new();
		let mut report = ReprovisionReport::default();

		for collection in pending {
			let workspace_id = collection.workspace_id;
			let cluster_id = match clusters.get(&workspace_id) {
				Some(cluster_id) => cluster_id.clone(),
				None => {
					let cluster_id = self
						.store
						.get_workspace(workspace_id)
						.await?
						.and_then(|workspace| workspace.cluster_id);

					clusters.insert(workspace_id, cluster_id.clone());

					cluster_id
				},
			};
			let Some(cluster_id) = cluster_id else {
				continue;
			};

			report.attempted += 1;

			let actor = Actor::default().in_workspace(workspace_id);
			let provisioned = match serde_json::from_value::<VectorSchema>(collection.schema) {
				Ok(schema) =>
					self.provision_remote_collection(
						&cluster_id,
						&collection.name,
						&schema,
						collection.description.as_deref(),
						&actor,
					)
					.await,
				Err(err) => Err(ClassifiedError::client(format!(
					"Stored schema is unreadable: {err}."
				))),
			};
			let stored = match &provisioned {
				Ok(remote_name) =>
					self.store
						.update_collection_status(
							collection.collection_id,
							CollectionStatus::Active.as_str(),
							Some(remote_name.as_str()),
						)
						.await,
				Err(_) =>
					self.store
						.update_collection_status(
							collection.collection_id,
							CollectionStatus::Error.as_str(),
							None,
						)
						.await,
			};

			match (provisioned, stored) {
				(Ok(_), Ok(())) => report.activated.push(collection.collection_id),
				(Err(err), Ok(())) => report.failed.push(ReprovisionFailure {
					collection_id: collection.collection_id,
					error: err.to_string(),
				}),
				(Err(err), Err(store_err)) => {
					tracing::error!(
						collection_id = %collection.collection_id,
						error = %store_err,
						"Failed to record the collection error status."
					);

					report.failed.push(ReprovisionFailure {
						collection_id: collection.collection_id,
						error: format!("{err} Status not recorded: {store_err}"),
					});
				},
				(Ok(remote_name), Err(err)) => {
					tracing::error!(
						collection_id = %collection.collection_id,
						collection = %remote_name,
						error = %err,
						"Remote collection exists but its status could not be recorded."
					);

					report.failed.push(ReprovisionFailure {
						collection_id: collection.collection_id,
						error: err.to_string(),
					});
				},
			}
		}

		tracing::info!(
			attempted = report.attempted,
			activated = report.activated.len(),
			failed = report.failed.len(),
			"Collection reprovisioning finished."
		);

		Ok(report)
	}
}
