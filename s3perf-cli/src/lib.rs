//! The benchmark command line.
//!
//! This builds on top of [`s3perf_core`], wiring the S3 storage backend and the Elasticsearch
//! sink to a [`BenchmarkRunner`](s3perf_core::BenchmarkRunner) configured from the command line.

pub mod cli;
pub mod config;
pub mod observability;
