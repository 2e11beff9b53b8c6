//! Test utilities for s3perf.
//!
//! This crate provides utilities to facilitate testing of the benchmark against its external
//! collaborators. See the modules for all available utilities.

pub mod index;
pub mod storage;
pub mod tracing;
