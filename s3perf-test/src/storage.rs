//! Exposes an in-process fake of the S3 `ListObjectsV2` API for use in integration tests.
//!
//! Buckets are addressed path-style. Listings are paginated like the real service: at most 1000
//! keys per page, with an opaque continuation token pointing at the next page.
//!
//! ```
//! use s3perf_test::storage::TestStorageServer;
//!
//! #[tokio::main]
//! async fn main() {
//!    let server = TestStorageServer::new().await;
//!    server.insert("bench", "object", 1024);
//!    // point the storage backend at `server.endpoint()`...
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;

/// The largest page the service returns, regardless of the requested `max-keys`.
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Default)]
struct Buckets {
    objects: HashMap<String, BTreeMap<String, u64>>,
    list_requests: usize,
}

type SharedBuckets = Arc<Mutex<Buckets>>;

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(rename = "continuation-token")]
    continuation_token: Option<String>,
    #[serde(rename = "max-keys")]
    max_keys: Option<usize>,
}

async fn list_objects(
    State(state): State<SharedBuckets>,
    Path(bucket): Path<String>,
    Query(params): Query<ListParams>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.list_requests += 1;

    let Some(objects) = state.objects.get(&bucket) else {
        let body = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
            <Error><Code>NoSuchBucket</Code><Message>The specified bucket does not exist</Message></Error>";
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/xml")],
            body,
        )
            .into_response();
    };

    let start: usize = params
        .continuation_token
        .as_deref()
        .and_then(|token| token.parse().ok())
        .unwrap_or(0);
    let page_size = params.max_keys.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE);

    let mut contents = String::new();
    let mut count = 0;
    for (key, size) in objects.iter().skip(start).take(page_size) {
        count += 1;
        write!(
            contents,
            "<Contents>\
                <Key>{key}</Key>\
                <LastModified>2024-01-01T00:00:00.000Z</LastModified>\
                <Size>{size}</Size>\
            </Contents>"
        )
        .unwrap();
    }

    let next = start + count;
    let is_truncated = next < objects.len();
    let next_token = if is_truncated {
        format!("<NextContinuationToken>{next}</NextContinuationToken>")
    } else {
        String::new()
    };

    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
        <ListBucketResult>\
            <Name>{bucket}</Name>\
            <KeyCount>{count}</KeyCount>\
            <MaxKeys>{page_size}</MaxKeys>\
            <IsTruncated>{is_truncated}</IsTruncated>\
            {contents}\
            {next_token}\
        </ListBucketResult>"
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        body,
    )
        .into_response()
}

/// An in-process fake S3 endpoint for use in integration tests.
///
/// It listens on a random available port on localhost and keeps object sizes in memory. Only
/// listing is served, objects have no contents.
#[derive(Debug)]
pub struct TestStorageServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    state: SharedBuckets,
}

impl TestStorageServer {
    pub async fn new() -> Self {
        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).unwrap();
        listener.set_nonblocking(true).unwrap();
        let socket = listener.local_addr().unwrap();

        let state = SharedBuckets::default();
        let app = Router::new()
            .route("/{bucket}", get(list_objects))
            .route("/{bucket}/", get(list_objects))
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

    /// Returns the endpoint URL of the server, without a trailing slash.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.socket.port())
    }

    /// Stores an object of the given size, creating the bucket if needed.
    pub fn insert(&self, bucket: &str, key: &str, size: u64) {
        let mut state = self.state.lock().unwrap();
        state
            .objects
            .entry(bucket.to_owned())
            .or_default()
            .insert(key.to_owned(), size);
    }

    /// Returns how many listing requests were received.
    pub fn list_requests(&self) -> usize {
        self.state.lock().unwrap().list_requests
    }
}

impl Drop for TestStorageServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
