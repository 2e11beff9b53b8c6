//! Exposes an in-process fake of the search index REST API for use in integration tests.
//!
//! The server understands the three calls the benchmark makes: checking whether an index exists,
//! creating an index with a mapping, and appending a document.
//!
//! ```
//! use s3perf_test::index::TestIndexServer;
//!
//! #[tokio::main]
//! async fn main() {
//!    let server = TestIndexServer::new().await;
//!    let url = server.base_url();
//!    // point the sink at the URL in tests...
//! }
//! ```

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{head, post};
use axum::{Json, Router};
use serde_json::{Value, json};

#[derive(Debug, Default)]
struct Indexes {
    mappings: HashMap<String, Value>,
    documents: Vec<(String, Value)>,
    create_requests: usize,
    reject_documents: bool,
}

type SharedIndexes = Arc<Mutex<Indexes>>;

async fn index_exists(State(state): State<SharedIndexes>, Path(index): Path<String>) -> StatusCode {
    if state.lock().unwrap().mappings.contains_key(&index) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn create_index(
    State(state): State<SharedIndexes>,
    Path(index): Path<String>,
    Json(mapping): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    state.create_requests += 1;

    if state.mappings.contains_key(&index) {
        let error = json!({
            "error": {
                "type": "resource_already_exists_exception",
                "reason": format!("index [{index}] already exists"),
            },
            "status": 400,
        });
        return (StatusCode::BAD_REQUEST, Json(error));
    }

    state.mappings.insert(index.clone(), mapping);
    let body = json!({ "acknowledged": true, "index": index });
    (StatusCode::OK, Json(body))
}

async fn index_document(
    State(state): State<SharedIndexes>,
    Path(index): Path<String>,
    Json(document): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();

    if state.reject_documents {
        let error = json!({
            "error": { "type": "cluster_block_exception", "reason": "index is read-only" },
            "status": 503,
        });
        return (StatusCode::SERVICE_UNAVAILABLE, Json(error));
    }

    // Like the real thing, writing into a missing index creates it with a dynamic mapping.
    state
        .mappings
        .entry(index.clone())
        .or_insert_with(|| json!({}));
    state.documents.push((index.clone(), document));

    let body = json!({ "_index": index, "result": "created" });
    (StatusCode::CREATED, Json(body))
}

/// An in-process fake search index for use in integration tests.
///
/// It listens on a random available port on localhost and keeps everything in memory.
#[derive(Debug)]
pub struct TestIndexServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    state: SharedIndexes,
}

impl TestIndexServer {
    pub async fn new() -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let state = SharedIndexes::default();
        let app = Router::new()
            .route("/{index}", head(index_exists).put(create_index))
            .route("/{index}/_doc", post(index_document))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            handle,
            socket,
            state,
        }
    }

    /// Returns the base URL of the server, without a trailing slash.
    ///
    /// This URL uses `localhost` as hostname.
    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.socket.port())
    }

    /// Creates an index directly, bypassing the HTTP API.
    pub fn insert_index(&self, index: &str, mapping: Value) {
        let mut state = self.state.lock().unwrap();
        state.mappings.insert(index.to_owned(), mapping);
    }

    /// Returns the mapping of an index, if it exists.
    pub fn mapping(&self, index: &str) -> Option<Value> {
        self.state.lock().unwrap().mappings.get(index).cloned()
    }

    /// Returns all documents written to the index, in arrival order.
    pub fn documents(&self, index: &str) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state
            .documents
            .iter()
            .filter(|(name, _)| name == index)
            .map(|(_, document)| document.clone())
            .collect()
    }

    /// Returns how many index creation requests were received.
    pub fn create_requests(&self) -> usize {
        self.state.lock().unwrap().create_requests
    }

    /// Makes the server reject all further documents with `503 Service Unavailable`.
    pub fn reject_documents(&self) {
        self.state.lock().unwrap().reject_documents = true;
    }
}

impl Drop for TestIndexServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
