//! Periodic reconciliation between the relational store and the remote control plane.
//!
//! Every pass cross-checks clusters and then retries provisioning of collections that never
//! reached `active`. A failed pass is logged and the loop carries on with the next tick.

use std::time::Duration;

use serde::Serialize;
use tokio::time::{self, MissedTickBehavior};

use kyroo_providers::NetworkMonitor;
use kyroo_service::{Error, KyrooService, ReconcileReport, ReprovisionReport};

pub struct WorkerState {
	pub service: KyrooService,
	pub network: NetworkMonitor,
	pub interval: Duration,
	pub reprovision_collections: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct PassReport {
	pub clusters: Option<ReconcileReport>,
	pub collections: Option<ReprovisionReport>,
	pub errors: Vec<String>,
}

pub async fn run_worker(state: WorkerState) {
	let mut ticker = time::interval(state.interval);

	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		ticker.tick().await;

		let report = run_pass(&state).await;

		tracing::info!(
			dangling = report.clusters.as_ref().map(|clusters| clusters.dangling.len()),
			untracked = report.clusters.as_ref().map(|clusters| clusters.untracked.len()),
			activated = report.collections.as_ref().map(|collections| collections.activated.len()),
			failed = report.collections.as_ref().map(|collections| collections.failed.len()),
			errors = report.errors.len(),
			"Reconciliation pass finished."
		);
	}
}

pub async fn run_pass(state: &WorkerState) -> PassReport {
	let mut report = PassReport::default();

	match state.service.reconcile_clusters().await {
		Ok(clusters) => {
			state.network.observe(None);

			report.clusters = Some(clusters);
		},
		Err(err) => {
			observe_failure(&state.network, &err);
			tracing::error!(error = %err, "Cluster reconciliation failed.");

			report.errors.push(err.to_string());
		},
	}

	if !state.reprovision_collections {
		return report;
	}
	if !state.network.is_online() {
		tracing::warn!("Control plane is unreachable. Skipping collection reprovisioning.");

		return report;
	}

	match state.service.reprovision_collections().await {
		Ok(collections) => report.collections = Some(collections),
		Err(err) => {
			observe_failure(&state.network, &err);
			tracing::error!(error = %err, "Collection reprovisioning failed.");

			report.errors.push(err.to_string());
		},
	}

	report
}

fn observe_failure(network: &NetworkMonitor, err: &Error) {
	if let Error::VectorStore(err) = err {
		network.observe(Some(err));
	}
}
