pub mod network;
pub mod retry;
pub mod taxonomy;
pub mod vector_store;

mod error;

pub use error::{Error, Result};
pub use network::{NetworkMonitor, NetworkStatus, Transition};
pub use retry::{Actor, RetryContext, RetryExecutor, RetryOptions, RetryPredicate};
pub use taxonomy::{ClassifiedError, ErrorKind, Failure, classify};
pub use vector_store::{ClusterSummary, VectorStoreClient};

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};

pub fn auth_headers(token: &str) -> Result<HeaderMap> {
	if token.trim().is_empty() {
		return Err(Error::InvalidConfig { message: "Bearer token must be non-empty.".to_string() });
	}

	let mut headers = HeaderMap::new();
	let mut authorization: HeaderValue = format!("Bearer {token}").parse()?;

	authorization.set_sensitive(true);
	headers.insert(AUTHORIZATION, authorization);
	headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

	Ok(headers)
}
