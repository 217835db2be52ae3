pub mod worker;

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use kyroo_providers::{NetworkMonitor, RetryOptions, VectorStoreClient};
use kyroo_service::{KyrooService, ServiceSettings};
use kyroo_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = kyroo_cli::VERSION,
	rename_all = "kebab",
	styles = kyroo_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = kyroo_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).try_init().map_err(|err| eyre::eyre!(err))?;

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let network = NetworkMonitor::default();
	let client = VectorStoreClient::new(
		&config.vector_store,
		RetryOptions::from_config(&config.retry),
		network.clone(),
	)?;
	let service =
		KyrooService::new(ServiceSettings::from_config(&config), Arc::new(db), Arc::new(client));
	let state = worker::WorkerState {
		service,
		network,
		interval: Duration::from_secs(config.reconcile.interval_seconds),
		reprovision_collections: config.reconcile.reprovision_collections,
	};

	tracing::info!(
		interval_seconds = config.reconcile.interval_seconds,
		reprovision_collections = config.reconcile.reprovision_collections,
		"Reconciliation worker started."
	);

	worker::run_worker(state).await;

	Ok(())
}
