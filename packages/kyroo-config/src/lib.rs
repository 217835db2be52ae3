mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Postgres, Reconcile, Retry, Security, Service, Storage, VectorStore, Workspace,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (key, value) in [
		("service.http_bind", &cfg.service.http_bind),
		("service.admin_bind", &cfg.service.admin_bind),
		("storage.postgres.dsn", &cfg.storage.postgres.dsn),
		("vector_store.endpoint", &cfg.vector_store.endpoint),
		("vector_store.token", &cfg.vector_store.token),
		("vector_store.cluster_plan", &cfg.vector_store.cluster_plan),
		("vector_store.cluster_name_prefix", &cfg.vector_store.cluster_name_prefix),
		("security.user_header", &cfg.security.user_header),
	] {
		if value.trim().is_empty() {
			return Err(Error::Missing { key });
		}
	}

	if !cfg.vector_store.endpoint.starts_with("http://")
		&& !cfg.vector_store.endpoint.starts_with("https://")
	{
		return Err(Error::Validation {
			message: "vector_store.endpoint must be an http or https URL.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.vector_store.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "vector_store.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.vector_store.cluster_cu == 0 {
		return Err(Error::Validation {
			message: "vector_store.cluster_cu must be greater than zero.".to_string(),
		});
	}
	if cfg.retry.max_attempts == 0 {
		return Err(Error::Validation {
			message: "retry.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.retry.base_delay_ms > cfg.retry.max_delay_ms {
		return Err(Error::Validation {
			message: "retry.base_delay_ms must not exceed retry.max_delay_ms.".to_string(),
		});
	}
	if !cfg.retry.backoff_factor.is_finite() {
		return Err(Error::Validation {
			message: "retry.backoff_factor must be a finite number.".to_string(),
		});
	}
	if cfg.retry.backoff_factor < 1.0 {
		return Err(Error::Validation {
			message: "retry.backoff_factor must be 1.0 or greater.".to_string(),
		});
	}
	if cfg.reconcile.interval_seconds == 0 {
		return Err(Error::Validation {
			message: "reconcile.interval_seconds must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let endpoint = cfg.vector_store.endpoint.trim().trim_end_matches('/').to_string();

	cfg.vector_store.endpoint = endpoint;

	if cfg
		.security
		.admin_auth_token
		.as_deref()
		.map(|token| token.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.security.admin_auth_token = None;
	}
}
