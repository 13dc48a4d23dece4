//! Mock JeewanJyoti backend for E2E tests.
//!
//! The `MockBackend` answers every request with a configurable reply and
//! records what it received, so tests can assert both on the flow outcome
//! and on the exact number and shape of requests sent.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;
use jeewanjyoti_client::{
    ClientConfig, FlowBuilder, FlowController, FlowKind, StaticCredential, VerificationClient,
    VerificationClientConfig,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::info;

/// Error type for harness operations.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Could not bind or run the mock server.
    #[error("mock backend error: {0}")]
    Server(#[from] std::io::Error),

    /// Client library error.
    #[error("client error: {0}")]
    Client(#[from] jeewanjyoti_client::Error),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Reply the mock backend sends.
#[derive(Debug, Clone)]
pub struct Reply {
    /// HTTP status.
    pub status: u16,
    /// Raw response body.
    pub body: String,
    /// Delay before answering.
    pub delay: Duration,
}

impl Reply {
    /// JSON reply with the given status.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Raw (possibly non-JSON) reply.
    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Same reply, sent after `delay`.
    pub fn delayed(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }
}

/// A request the mock backend received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request path.
    pub path: String,
    /// `Authorization` header.
    pub authorization: Option<String>,
    /// `Content-Type` header.
    pub content_type: Option<String>,
    /// Body parsed as JSON (`Null` if it was not JSON).
    pub body: serde_json::Value,
}

struct BackendState {
    hits: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
    reply: Reply,
}

/// Mock backend bound to a random loopback port.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    /// Start a backend that answers every request with `reply`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(reply: Reply) -> Result<Self> {
        let state = Arc::new(BackendState {
            hits: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            reply,
        });

        let app = Router::new()
            .fallback(handle)
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        info!("Mock backend listening on {addr}");

        Ok(Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        })
    }

    /// Base URL of the backend.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of requests received so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }

    /// Wait until at least `count` requests arrived, up to two seconds.
    pub async fn wait_for_hits(&self, count: usize) -> bool {
        for _ in 0..200 {
            if self.hits() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    /// Client configuration pointing at this backend.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self.url(),
            request_timeout_secs: 5,
            ..ClientConfig::default()
        }
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.hits.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().push(RecordedRequest {
        path: uri.path().to_string(),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    });

    let reply = state.reply.clone();
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply.body)
}

/// Base URL on which nothing listens.
pub fn closed_port_url() -> Result<String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

/// Build a flow of `kind` against `config` with an optional stored token.
///
/// # Errors
///
/// Returns an error if the client or flow cannot be built.
pub fn build_flow(
    kind: FlowKind,
    config: &ClientConfig,
    query: &str,
    token: Option<&str>,
) -> Result<FlowController> {
    let flow_config = config.flow(kind).clone();
    let client = VerificationClient::new(VerificationClientConfig::from_flow(config, &flow_config)?)?;
    let credentials = token.map_or_else(StaticCredential::absent, StaticCredential::new);

    Ok(FlowBuilder::new(kind, flow_config, query)
        .credentials(Arc::new(credentials))
        .verifier(Arc::new(client))
        .build()?)
}
