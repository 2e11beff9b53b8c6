//! Micro-benchmarks for S3-compatible object storage.
//!
//! A [`BenchmarkRunner`] writes or reads a configured number of objects, times every single
//! storage operation, and records each measurement as a timestamped document in a search index
//! (see [`metrics`]), where it can be visualized later.
//!
//! The storage and the indexing backend sit behind the [`ObjectStorage`] and
//! [`MetricsSink`](metrics::MetricsSink) traits. Both come with an S3/Elasticsearch implementation
//! and an in-memory one for tests.
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod naming;
pub mod payload;
pub mod record;
pub mod runner;
pub mod storage;
pub mod timing;

pub use crate::config::{BenchmarkConfig, Workload};
pub use crate::error::{Error, Result};
pub use crate::runner::{BenchmarkRunner, RunSummary};
pub use crate::storage::ObjectStorage;

/// User agent string used for outgoing requests.
pub const USER_AGENT: &str = concat!("s3perf/", env!("CARGO_PKG_VERSION"));
