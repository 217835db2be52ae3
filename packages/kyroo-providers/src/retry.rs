use std::{fmt, future::Future, sync::Arc, time::Duration};

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
	network::NetworkMonitor,
	taxonomy::{self, ClassifiedError, Failure},
};

pub type RetryPredicate = Arc<dyn Fn(&ClassifiedError) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct RetryOptions {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	/// Defaults to the retry eligibility of the classified kind.
	pub retry_predicate: Option<RetryPredicate>,
}
impl RetryOptions {
	pub fn from_config(cfg: &kyroo_config::Retry) -> Self {
		Self {
			max_attempts: cfg.max_attempts,
			base_delay: Duration::from_millis(cfg.base_delay_ms),
			max_delay: Duration::from_millis(cfg.max_delay_ms),
			backoff_factor: cfg.backoff_factor,
			retry_predicate: None,
		}
	}

	pub fn with_predicate<F>(mut self, predicate: F) -> Self
	where
		F: Fn(&ClassifiedError) -> bool + Send + Sync + 'static,
	{
		self.retry_predicate = Some(Arc::new(predicate));

		self
	}

	/// `min(max_delay, base_delay * backoff_factor^(attempt - 1))` for a 1-based attempt.
	pub fn backoff_delay(&self, attempt: u32) -> Duration {
		let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
		let millis = self.base_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
		let cap = self.max_delay.as_millis() as f64;

		if !millis.is_finite() || millis >= cap {
			return self.max_delay;
		}

		Duration::from_millis(millis.max(0.0) as u64)
	}

	/// Delay before the attempt following a failed `attempt`. A `retry-after` hint overrides the
	/// exponential schedule.
	pub fn delay_for(&self, attempt: u32, err: &ClassifiedError) -> Duration {
		err.retry_after.unwrap_or_else(|| self.backoff_delay(attempt))
	}

	pub fn should_retry(&self, err: &ClassifiedError) -> bool {
		match &self.retry_predicate {
			Some(predicate) => predicate(err),
			None => err.is_retryable(),
		}
	}
}
impl Default for RetryOptions {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(1_000),
			max_delay: Duration::from_millis(10_000),
			backoff_factor: 2.0,
			retry_predicate: None,
		}
	}
}
impl fmt::Debug for RetryOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RetryOptions")
			.field("max_attempts", &self.max_attempts)
			.field("base_delay", &self.base_delay)
			.field("max_delay", &self.max_delay)
			.field("backoff_factor", &self.backoff_factor)
			.field("retry_predicate", &self.retry_predicate.as_ref().map(|_| "custom"))
			.finish()
	}
}

/// Who a request is made on behalf of. Only used for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Actor {
	pub user_id: Option<String>,
	pub workspace_id: Option<String>,
}
impl Actor {
	pub fn user(user_id: impl Into<String>) -> Self {
		Self { user_id: Some(user_id.into()), workspace_id: None }
	}

	pub fn in_workspace(mut self, workspace_id: impl ToString) -> Self {
		self.workspace_id = Some(workspace_id.to_string());

		self
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct RetryContext {
	pub operation: String,
	pub attempt: u32,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	pub user_id: Option<String>,
	pub workspace_id: Option<String>,
}
impl RetryContext {
	pub fn new(operation: impl Into<String>, actor: &Actor) -> Self {
		Self {
			operation: operation.into(),
			attempt: 0,
			timestamp: OffsetDateTime::now_utc(),
			user_id: actor.user_id.clone(),
			workspace_id: actor.workspace_id.clone(),
		}
	}
}

/// Runs an operation until it succeeds, fails with a non-retryable error, or runs out of
/// attempts. Attempts of one call never overlap; separate calls share nothing.
#[derive(Clone, Debug)]
pub struct RetryExecutor {
	options: RetryOptions,
	network: NetworkMonitor,
}
impl RetryExecutor {
	pub fn new(options: RetryOptions, network: NetworkMonitor) -> Self {
		Self { options, network }
	}

	pub async fn execute<T, F, Fut>(
		&self,
		context: RetryContext,
		operation: F,
	) -> Result<T, ClassifiedError>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, Failure>>,
	{
		self.execute_with(&self.options, context, operation).await
	}

	pub async fn execute_with<T, F, Fut>(
		&self,
		options: &RetryOptions,
		mut context: RetryContext,
		mut operation: F,
	) -> Result<T, ClassifiedError>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, Failure>>,
	{
		let max_attempts = options.max_attempts.max(1);
		let mut attempt = 1;

		loop {
			context.attempt = attempt;
			context.timestamp = OffsetDateTime::now_utc();

			let failure = match operation().await {
				Ok(value) => {
					self.network.set_online(true);

					if attempt > 1 {
						tracing::info!(
							operation = %context.operation,
							attempt,
							user_id = ?context.user_id,
							workspace_id = ?context.workspace_id,
							"Operation succeeded after retrying."
						);
					}

					return Ok(value);
				},
				Err(failure) => failure,
			};

			// A response of any status proves the remote is reachable.
			if failure.has_response() {
				self.network.set_online(true);
			}

			let err = taxonomy::classify(failure, self.network.is_online());

			if attempt >= max_attempts || !options.should_retry(&err) {
				tracing::error!(
					operation = %context.operation,
					attempt,
					max_attempts,
					kind = %err.kind,
					status = ?err.status,
					user_id = ?context.user_id,
					workspace_id = ?context.workspace_id,
					error = %err,
					"Operation failed."
				);

				return Err(err);
			}

			let delay = options.delay_for(attempt, &err);

			tracing::warn!(
				operation = %context.operation,
				attempt,
				max_attempts,
				delay_ms = delay.as_millis() as u64,
				kind = %err.kind,
				status = ?err.status,
				user_id = ?context.user_id,
				workspace_id = ?context.workspace_id,
				timestamp = %context.timestamp,
				"Operation failed, retrying."
			);

			tokio::time::sleep(delay).await;

			attempt += 1;
		}
	}
}
