use std::sync::Arc;

use axum::http::HeaderName;

use kyroo_providers::{NetworkMonitor, RetryOptions, VectorStoreClient};
use kyroo_service::{KyrooService, ServiceSettings};
use kyroo_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<KyrooService>,
	pub network: NetworkMonitor,
	/// Header carrying the requester id.
	pub user_header: HeaderName,
	pub admin_auth_token: Option<Arc<str>>,
}
impl AppState {
	pub async fn new(config: kyroo_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let network = NetworkMonitor::default();
		let client = VectorStoreClient::new(
			&config.vector_store,
			RetryOptions::from_config(&config.retry),
			network.clone(),
		)?;
		let service = KyrooService::new(
			ServiceSettings::from_config(&config),
			Arc::new(db),
			Arc::new(client),
		);

		Self::from_parts(service, network, &config.security)
	}

	pub fn from_parts(
		service: KyrooService,
		network: NetworkMonitor,
		security: &kyroo_config::Security,
	) -> color_eyre::Result<Self> {
		let user_header = HeaderName::from_bytes(security.user_header.trim().as_bytes())?;

		Ok(Self {
			service: Arc::new(service),
			network,
			user_header,
			admin_auth_token: security.admin_auth_token.as_deref().map(Arc::from),
		})
	}
}
