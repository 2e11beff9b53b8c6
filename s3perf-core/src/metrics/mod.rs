//! Recording of measurements into a search/analytics index.
//!
//! [`MetricsRecorder`] wraps a [`MetricsSink`], makes sure the target index exists with the
//! [`index_mapping`], and writes one document per [`MeasurementRecord`].

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::error::RecordingError;
use crate::record::MeasurementRecord;

pub mod elasticsearch;
pub mod in_memory;

pub use elasticsearch::ElasticsearchSink;
pub use in_memory::InMemorySink;

/// Name of the index all measurements are written to.
pub const INDEX_NAME: &str = "s3-perf-index";

/// A shared, type-erased [`MetricsSink`] instance.
pub type BoxedSink = Arc<dyn MetricsSink>;

/// Result type for recording operations.
pub type RecordingResult<T> = Result<T, RecordingError>;

/// The explicit schema of the measurement index.
///
/// Only `timestamp` is declared, as a date. All other fields are typed dynamically by the backend.
pub fn index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "timestamp": { "type": "date" }
            }
        }
    })
}

/// The operations needed from an indexing backend.
#[async_trait::async_trait]
pub trait MetricsSink: Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Returns whether the index exists.
    async fn index_exists(&self, index: &str) -> RecordingResult<bool>;

    /// Creates the index with the given mapping.
    async fn create_index(&self, index: &str, mapping: &Value) -> RecordingResult<()>;

    /// Appends a document to the index.
    async fn index_document(&self, index: &str, document: &Value) -> RecordingResult<()>;
}

/// Writes measurements to a fixed index.
#[derive(Debug)]
pub struct MetricsRecorder {
    sink: BoxedSink,
    index: String,
    /// Indexes known to exist, which are not checked again.
    ensured: Mutex<HashSet<String>>,
}

impl MetricsRecorder {
    /// Creates a recorder writing to [`INDEX_NAME`].
    pub fn new(sink: BoxedSink) -> Self {
        Self::with_index(sink, INDEX_NAME)
    }

    /// Creates a recorder writing to a custom index.
    pub fn with_index(sink: BoxedSink, index: impl Into<String>) -> Self {
        Self {
            sink,
            index: index.into(),
            ensured: Mutex::new(HashSet::new()),
        }
    }

    /// The index records are written to.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Creates the index with `mapping` unless it already exists.
    ///
    /// Safe to call any number of times. After the first successful call for a name, further calls
    /// for the same name do not reach the backend.
    pub async fn ensure_index(&self, name: &str, mapping: &Value) -> RecordingResult<()> {
        let mut ensured = self.ensured.lock().await;
        if ensured.contains(name) {
            return Ok(());
        }

        if self.sink.index_exists(name).await? {
            tracing::debug!(index = name, "Index already exists");
        } else {
            tracing::info!(index = name, sink = self.sink.name(), "Creating index");
            self.sink.create_index(name, mapping).await?;
        }

        ensured.insert(name.to_owned());
        Ok(())
    }

    /// Writes a single measurement to the index.
    pub async fn record(&self, entry: &MeasurementRecord) -> RecordingResult<()> {
        let document = serde_json::to_value(entry).map_err(|cause| RecordingError::Serde {
            context: format!("failed to serialize record for `{}`", entry.object_name),
            cause,
        })?;

        self.sink.index_document(&self.index, &document).await?;
        tracing::trace!(
            object_name = %entry.object_name,
            latency = entry.latency,
            "Recorded measurement"
        );
        Ok(())
    }
}
