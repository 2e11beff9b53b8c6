//! The immutable description of a single benchmark run.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The benchmark mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Workload {
    /// Write `num_objects` freshly named objects of the configured size.
    Write,
    /// Read back up to `num_objects` objects already present in the bucket.
    Read,
}

impl Workload {
    /// The lowercase name used on the command line and in recorded documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Workload::Write => "write",
            Workload::Read => "read",
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown workload name.
#[derive(Clone, Debug)]
pub struct WorkloadParseError(String);

impl fmt::Display for WorkloadParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"error parsing "{}" as workload: expected one of "write", "read""#,
            self.0
        )
    }
}

impl std::error::Error for WorkloadParseError {}

impl FromStr for Workload {
    type Err = WorkloadParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            s if s.eq_ignore_ascii_case("write") => Ok(Workload::Write),
            s if s.eq_ignore_ascii_case("read") => Ok(Workload::Read),
            s => Err(WorkloadParseError(s.into())),
        }
    }
}

/// Everything a benchmark run needs to know, constructed once at startup.
#[derive(Debug)]
pub struct BenchmarkConfig {
    /// URL of the S3-compatible endpoint.
    pub endpoint_url: String,
    /// Access key for the endpoint.
    pub access_key: String,
    /// Secret key for the endpoint.
    pub secret_key: SecretString,
    /// Bucket the objects are written to or read from.
    pub bucket_name: String,
    /// Human-readable object size, such as `10 MiB`.
    pub object_size: String,
    /// URL of the metrics indexing cluster.
    pub elastic_url: String,
    /// Number of objects to write, or the maximum number of objects to read.
    pub num_objects: usize,
    /// Whether to write or read.
    pub workload: Workload,
    /// Maximum number of storage operations in flight. `1` runs strictly sequentially.
    pub concurrency: NonZeroUsize,
    /// Identity of the host running the benchmark, attached to every record.
    pub source: String,
}
