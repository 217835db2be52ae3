//! A scripted stand-in for the vector-store control plane.
//!
//! Responses are scripted per HTTP method and path prefix. Queued responses are served once in
//! order; a default response is served whenever the queue for its route is empty. Every request
//! is recorded so tests can count attempts and inspect payloads.

use std::{
	collections::VecDeque,
	future::IntoFuture,
	sync::{Arc, Mutex},
};

use axum::{
	Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
	response::{IntoResponse, Response},
};
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot};

use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
	pub method: String,
	pub path: String,
	pub cluster_id: Option<String>,
	pub authorization: Option<String>,
	pub body: Value,
}

#[derive(Debug, Clone)]
pub struct StubResponse {
	pub status: u16,
	pub body: Value,
	pub headers: Vec<(String, String)>,
}
impl StubResponse {
	pub fn ok(body: Value) -> Self {
		Self::status(200, body)
	}

	pub fn status(status: u16, body: Value) -> Self {
		Self { status, body, headers: Vec::new() }
	}

	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		self.headers.push((name.to_string(), value.to_string()));

		self
	}
}

struct Route {
	method: String,
	prefix: String,
	queue: VecDeque<StubResponse>,
	default: Option<StubResponse>,
}

#[derive(Default)]
struct Shared {
	routes: Mutex<Vec<Route>>,
	requests: Mutex<Vec<RecordedRequest>>,
}
impl Shared {
	fn route_mut<'a>(routes: &'a mut Vec<Route>, method: &str, prefix: &str) -> &'a mut Route {
		let index = match routes.iter().position(|route| route.method == method && route.prefix == prefix)
		{
			Some(index) => index,
			None => {
				routes.push(Route {
					method: method.to_string(),
					prefix: prefix.to_string(),
					queue: VecDeque::new(),
					default: None,
				});

				routes.len() - 1
			},
		};

		&mut routes[index]
	}

	fn next_response(&self, method: &str, path: &str) -> Option<StubResponse> {
		let mut routes = self.routes.lock().unwrap_or_else(|err| err.into_inner());
		let route = routes
			.iter_mut()
			.filter(|route| {
				route.method == method
					&& path.starts_with(route.prefix.as_str())
					&& (!route.queue.is_empty() || route.default.is_some())
			})
			.max_by_key(|route| route.prefix.len())?;

		route.queue.pop_front().or_else(|| route.default.clone())
	}
}

pub struct StubControlPlane {
	base_url: String,
	shared: Arc<Shared>,
	shutdown: Option<oneshot::Sender<()>>,
}
impl StubControlPlane {
	pub async fn start() -> Result<Self> {
		let shared = Arc::new(Shared::default());
		let app = Router::new().fallback(handle).with_state(shared.clone());
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			let _ = server.into_future().await;
		});

		Ok(Self { base_url: format!("http://{addr}"), shared, shutdown: Some(tx) })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Queues a one-shot response for requests whose path starts with `prefix`.
	pub fn push(&self, method: &str, prefix: &str, response: StubResponse) {
		let mut routes = self.shared.routes.lock().unwrap_or_else(|err| err.into_inner());

		Shared::route_mut(&mut routes, method, prefix).queue.push_back(response);
	}

	/// Sets the response served once the queue for this route is drained.
	pub fn set_default(&self, method: &str, prefix: &str, response: StubResponse) {
		let mut routes = self.shared.routes.lock().unwrap_or_else(|err| err.into_inner());

		Shared::route_mut(&mut routes, method, prefix).default = Some(response);
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.shared.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn count(&self, method: &str, prefix: &str) -> usize {
		self.shared
			.requests
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.filter(|req| req.method == method && req.path.starts_with(prefix))
			.count()
	}
}
impl Drop for StubControlPlane {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

async fn handle(
	State(shared): State<Arc<Shared>>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> Response {
	let header = |name: &str| {
		headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_string)
	};
	let recorded = RecordedRequest {
		method: method.as_str().to_string(),
		path: uri.path().to_string(),
		cluster_id: header("cluster-id"),
		authorization: header("authorization"),
		body: serde_json::from_slice(&body).unwrap_or(Value::Null),
	};

	shared.requests.lock().unwrap_or_else(|err| err.into_inner()).push(recorded);

	let Some(scripted) = shared.next_response(method.as_str(), uri.path()) else {
		let body = serde_json::json!({
			"message": format!("No stub for {} {}.", method, uri.path()),
		});

		return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
	};
	let status = StatusCode::from_u16(scripted.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
	let mut response_headers = HeaderMap::new();

	for (name, value) in &scripted.headers {
		if let (Ok(name), Ok(value)) =
			(HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value))
		{
			response_headers.insert(name, value);
		}
	}

	if scripted.body.is_null() {
		return (status, response_headers).into_response();
	}

	(status, response_headers, axum::Json(scripted.body)).into_response()
}
