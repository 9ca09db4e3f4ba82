//! Canned-response HTTP server for client tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves queued `(status, body)` responses in order, one per request.
///
/// Once the queue is empty every request gets a 500. The URI of each request
/// (path plus query) is recorded for assertions.
///
/// # Example
///
/// ```rust,ignore
/// let server = StubServer::start(vec![(200, r#"{"results":[]}"#.to_string())]).await;
/// let client = TmdbClient::new(&config_pointing_at(server.base_url()), ...)?;
/// ```
pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
struct StubState {
    responses: Arc<Mutex<VecDeque<(u16, String)>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Bind to a random local port and start serving.
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address");

        let state = StubState {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = Arc::clone(&state.requests);
        let app = Router::new().fallback(respond).with_state(state);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// Number of requests served so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Recorded request URIs, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond(State(state): State<StubState>, request: Request) -> Response {
    state
        .requests
        .lock()
        .unwrap()
        .push(request.uri().to_string());

    let next = state.responses.lock().unwrap().pop_front();
    let (status, body) = next.unwrap_or((500, "stub exhausted".to_string()));
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
