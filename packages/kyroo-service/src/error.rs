use kyroo_providers::ClassifiedError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Forbidden: {message}")]
	Forbidden { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Vector store error: {0}")]
	VectorStore(#[from] ClassifiedError),
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}

	pub(crate) fn not_found(message: impl Into<String>) -> Self {
		Self::NotFound { message: message.into() }
	}
}
impl From<kyroo_storage::Error> for Error {
	fn from(err: kyroo_storage::Error) -> Self {
		match err {
			kyroo_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			kyroo_storage::Error::NotFound(message) => Self::NotFound { message },
			kyroo_storage::Error::Conflict(message) => Self::Conflict { message },
			kyroo_storage::Error::Sqlx(err) => Self::Storage { message: err.to_string() },
		}
	}
}
