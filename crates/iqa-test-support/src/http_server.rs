//! Canned-response HTTP server for exercising the fetcher.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::runtime::{Builder, Runtime};

#[derive(Clone)]
enum Route {
    Respond { status: StatusCode, body: Vec<u8> },
    Stall(Duration),
}

#[derive(Clone, Default)]
struct ServerState {
    routes: Arc<Mutex<HashMap<String, Route>>>,
    hits: Arc<Mutex<Vec<String>>>,
}

/// axum server on `127.0.0.1` answering every path from a route table.
///
/// Unknown paths get `404 Not Found`. The server runs on its own tokio
/// runtime, which is torn down when the server is dropped.
pub struct StaticHttpServer {
    addr: SocketAddr,
    state: ServerState,
    runtime: Option<Runtime>,
}

impl StaticHttpServer {
    /// Binds an ephemeral port and starts serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot start or the listener cannot
    /// be bound.
    pub fn start() -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let listener = runtime.block_on(TcpListener::bind("127.0.0.1:0"))?;
        let addr = listener.local_addr()?;

        let state = ServerState::default();
        let app = Router::new().fallback(answer).with_state(state.clone());
        runtime.spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("test server on {addr} stopped: {e}");
            }
        });

        Ok(Self {
            addr,
            state,
            runtime: Some(runtime),
        })
    }

    /// Serves `body` with status 200 at `path`.
    pub fn serve(&self, path: &str, body: Vec<u8>) {
        self.respond(path, 200, body);
    }

    /// Serves `body` with an arbitrary status at `path`.
    ///
    /// An invalid status code is served as 500.
    pub fn respond(&self, path: &str, status: u16, body: Vec<u8>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.insert(path, Route::Respond { status, body });
    }

    /// Holds requests to `path` for `delay` before answering `504`.
    pub fn stall(&self, path: &str, delay: Duration) {
        self.insert(path, Route::Stall(delay));
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Paths requested so far, in arrival order.
    #[must_use]
    pub fn hits(&self) -> Vec<String> {
        self.state
            .hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn insert(&self, path: &str, route: Route) {
        self.state
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), route);
    }
}

impl Drop for StaticHttpServer {
    fn drop(&mut self) {
        // Stalled handlers are abandoned rather than awaited.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn answer(State(state): State<ServerState>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    state
        .hits
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(path.clone());
    let route = state
        .routes
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&path)
        .cloned();

    match route {
        Some(Route::Respond { status, body }) => (status, body).into_response(),
        Some(Route::Stall(delay)) => {
            tokio::time::sleep(delay).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        None => (StatusCode::NOT_FOUND, "not found").into_response(),
    }
}
