//! Writes or reads objects against an S3-compatible endpoint and records the latency of every
//! single operation in an Elasticsearch index.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

fn main() -> anyhow::Result<()> {
    s3perf_cli::cli::execute()
}
