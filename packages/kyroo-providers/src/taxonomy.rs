//! Failure classification.
//!
//! Every failure observed while talking to the control plane is reduced to one [`ErrorKind`].
//! The kind alone decides whether a retry is worthwhile, so call sites never inspect raw
//! transport errors or response bodies themselves.

use std::{error::Error as StdError, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	Offline,
	Timeout,
	ConnectionError,
	RateLimited,
	ServerError,
	ClientError,
	Unknown,
}
impl ErrorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Offline => "offline",
			Self::Timeout => "timeout",
			Self::ConnectionError => "connection_error",
			Self::RateLimited => "rate_limited",
			Self::ServerError => "server_error",
			Self::ClientError => "client_error",
			Self::Unknown => "unknown",
		}
	}

	pub fn is_retryable(self) -> bool {
		matches!(self, Self::Timeout | Self::ConnectionError | Self::RateLimited | Self::ServerError)
	}
}
impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
	pub kind: ErrorKind,
	pub message: String,
	pub status: Option<u16>,
	pub details: Option<Value>,
	#[serde(skip)]
	pub retry_after: Option<Duration>,
}
impl ClassifiedError {
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into(), status: None, details: None, retry_after: None }
	}

	pub fn client(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ClientError, message)
	}

	pub fn unknown(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Unknown, message)
	}

	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	pub fn with_details(mut self, details: Value) -> Self {
		self.details = Some(details);

		self
	}

	pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
		self.retry_after = Some(retry_after);

		self
	}

	pub fn is_retryable(&self) -> bool {
		self.kind.is_retryable()
	}

	fn with_optional_status(mut self, status: Option<u16>) -> Self {
		self.status = status;

		self
	}
}

/// Any failure shape an operation can produce before classification.
#[derive(Debug)]
pub enum Failure {
	/// Already classified by the code that raised it.
	Classified(ClassifiedError),
	/// The remote answered with a non-success status.
	Http { status: u16, message: String, retry_after: Option<Duration>, details: Option<Value> },
	/// The request never produced a response.
	Transport(reqwest::Error),
	Message(String),
}
impl Failure {
	/// Whether the remote answered, whatever the status.
	pub fn has_response(&self) -> bool {
		status_of(self).is_some()
	}
}
impl From<ClassifiedError> for Failure {
	fn from(err: ClassifiedError) -> Self {
		Self::Classified(err)
	}
}
impl From<reqwest::Error> for Failure {
	fn from(err: reqwest::Error) -> Self {
		Self::Transport(err)
	}
}

/// Reduces a failure to a [`ClassifiedError`]. First match wins:
///
/// 1. already classified failures pass through unchanged;
/// 2. no connectivity is `offline`;
/// 3. an HTTP status decides between `rate_limited`, `server_error` and `client_error`;
/// 4. timeout-like failures are `timeout`;
/// 5. low-level connection failures are `connection_error`;
/// 6. anything else is `unknown`.
///
/// Status codes are checked before message heuristics, so a timed out 503 is a `server_error`.
pub fn classify(failure: Failure, online: bool) -> ClassifiedError {
	if let Failure::Classified(err) = failure {
		return err;
	}
	if !online {
		return ClassifiedError::new(ErrorKind::Offline, "No network connectivity.")
			.with_optional_status(status_of(&failure));
	}

	match failure {
		Failure::Classified(err) => err,
		Failure::Http { status, message, retry_after, details } => {
			let mut err = match classify_status(status) {
				Some(kind) => ClassifiedError::new(kind, message),
				None => classify_text(&message).unwrap_or_else(|| {
					tracing::error!(status, message = %message, "Unclassified HTTP failure.");

					ClassifiedError::unknown(message.clone())
				}),
			}
			.with_status(status);

			if let Some(details) = details {
				err = err.with_details(details);
			}
			if let Some(retry_after) = retry_after
				&& err.kind.is_retryable()
			{
				err = err.with_retry_after(retry_after);
			}

			err
		},
		Failure::Transport(err) => classify_transport(&err),
		Failure::Message(message) => classify_text(&message).unwrap_or_else(|| {
			tracing::error!(message = %message, "Unclassified failure.");

			ClassifiedError::unknown(message)
		}),
	}
}

fn classify_status(status: u16) -> Option<ErrorKind> {
	match status {
		429 => Some(ErrorKind::RateLimited),
		500.. => Some(ErrorKind::ServerError),
		400..=499 => Some(ErrorKind::ClientError),
		_ => None,
	}
}

fn classify_transport(err: &reqwest::Error) -> ClassifiedError {
	let text = error_chain_text(err);

	if let Some(status) = err.status() {
		let kind = classify_status(status.as_u16()).unwrap_or(ErrorKind::Unknown);

		return ClassifiedError::new(kind, text).with_status(status.as_u16());
	}
	if err.is_timeout() {
		return ClassifiedError::new(ErrorKind::Timeout, text);
	}
	if let Some(classified) = classify_text(&text) {
		return classified;
	}
	if err.is_connect() || err.is_request() {
		return ClassifiedError::new(ErrorKind::ConnectionError, text);
	}

	tracing::error!(error = ?err, "Unclassified transport failure.");

	ClassifiedError::unknown(text)
}

fn classify_text(message: &str) -> Option<ClassifiedError> {
	let lowered = message.to_lowercase();

	if ["timeout", "timed out", "abort"].iter().any(|needle| lowered.contains(needle)) {
		return Some(ClassifiedError::new(ErrorKind::Timeout, message));
	}
	if ["failed to fetch", "network", "connection", "connect", "dns", "resolve"]
		.iter()
		.any(|needle| lowered.contains(needle))
	{
		return Some(ClassifiedError::new(ErrorKind::ConnectionError, message));
	}

	None
}

fn status_of(failure: &Failure) -> Option<u16> {
	match failure {
		Failure::Http { status, .. } => Some(*status),
		Failure::Transport(err) => err.status().map(|status| status.as_u16()),
		Failure::Classified(err) => err.status,
		Failure::Message(_) => None,
	}
}

fn error_chain_text(err: &reqwest::Error) -> String {
	let mut out = err.to_string();
	let mut source = err.source();

	while let Some(inner) = source {
		out.push_str(": ");
		out.push_str(&inner.to_string());

		source = inner.source();
	}

	out
}
