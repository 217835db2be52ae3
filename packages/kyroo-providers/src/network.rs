//! Connectivity tracking.
//!
//! The monitor is passive: it never probes the network itself. The executor marks it online
//! whenever the remote answers, with any status. Only transport failures reported through
//! [`NetworkMonitor::observe`] mark it offline.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;

use crate::taxonomy::{ClassifiedError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
	pub online: bool,
	/// Set when connectivity comes back after an outage, until acknowledged.
	pub was_offline: bool,
	#[serde(with = "time::serde::rfc3339")]
	pub changed_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
	WentOffline,
	Restored,
}

#[derive(Clone, Debug)]
pub struct NetworkMonitor {
	tx: Arc<watch::Sender<NetworkStatus>>,
}
impl NetworkMonitor {
	pub fn new(online: bool) -> Self {
		let (tx, _rx) = watch::channel(NetworkStatus {
			online,
			was_offline: false,
			changed_at: OffsetDateTime::now_utc(),
		});

		Self { tx: Arc::new(tx) }
	}

	pub fn is_online(&self) -> bool {
		self.tx.borrow().online
	}

	pub fn status(&self) -> NetworkStatus {
		*self.tx.borrow()
	}

	pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
		self.tx.subscribe()
	}

	/// Records the current connectivity. Returns the transition when the state flipped.
	pub fn set_online(&self, online: bool) -> Option<Transition> {
		let mut transition = None;

		self.tx.send_if_modified(|status| {
			if status.online == online {
				return false;
			}

			status.online = online;
			status.changed_at = OffsetDateTime::now_utc();

			if online {
				status.was_offline = true;
				transition = Some(Transition::Restored);
			} else {
				transition = Some(Transition::WentOffline);
			}

			true
		});

		match transition {
			Some(Transition::WentOffline) => tracing::warn!("Network connectivity lost."),
			Some(Transition::Restored) => tracing::info!("Network connectivity restored."),
			None => {},
		}

		transition
	}

	/// Clears the `was_offline` marker once the recovery has been surfaced.
	pub fn acknowledge(&self) {
		self.tx.send_if_modified(|status| {
			if !status.was_offline {
				return false;
			}

			status.was_offline = false;

			true
		});
	}

	/// Feeds the outcome of a request. Success means the remote was reachable; connection
	/// failures mean it was not. Other failures say nothing about connectivity.
	pub fn observe(&self, outcome: Option<&ClassifiedError>) -> Option<Transition> {
		match outcome.map(|err| err.kind) {
			None => self.set_online(true),
			Some(ErrorKind::ConnectionError | ErrorKind::Offline) => self.set_online(false),
			Some(_) => None,
		}
	}
}
impl Default for NetworkMonitor {
	fn default() -> Self {
		Self::new(true)
	}
}
