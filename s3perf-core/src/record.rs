//! The latency measurement persisted for every storage operation.

use serde::{Deserialize, Serialize};

use crate::config::Workload;
use crate::timing;

/// A single latency measurement, persisted as one document in the metrics index.
///
/// Field names match the persisted document shape.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MeasurementRecord {
    /// Elapsed wall-clock time of the storage operation in milliseconds.
    pub latency: f64,
    /// Creation time of this record in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// The workload the operation belongs to.
    pub workload: Workload,
    /// Object size in bytes.
    pub size: u64,
    /// Name of the object the operation touched.
    pub object_name: String,
    /// The host that ran the operation.
    pub source: String,
}

impl MeasurementRecord {
    /// Creates a record stamped with the current time.
    pub fn new(
        latency: f64,
        workload: Workload,
        size: u64,
        object_name: String,
        source: impl Into<String>,
    ) -> Self {
        Self {
            latency,
            timestamp: timing::now_epoch_millis(),
            workload,
            size,
            object_name,
            source: source.into(),
        }
    }
}
