pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures while constructing a client. Request failures are [`crate::ClassifiedError`]s.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
}
