use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use s3perf_core::metrics::{ElasticsearchSink, INDEX_NAME, MetricsRecorder};
use s3perf_core::storage::{S3CompatibleConfig, S3CompatibleStorage};
use s3perf_core::{BenchmarkConfig, BenchmarkRunner, RunSummary, Workload};
use secrecy::{ExposeSecret, SecretString};

use crate::config::Settings;
use crate::observability;

/// Object storage latency benchmark.
///
/// Writes or reads a number of objects against an S3-compatible endpoint and records the latency
/// of every operation in an Elasticsearch index.
#[derive(Debug, FromArgs)]
struct Args {
    /// endpoint url for s3 object storage
    #[argh(option, short = 'e')]
    endpoint_url: String,

    /// access key for s3 object storage
    #[argh(option, short = 'a')]
    access_key: String,

    /// secret key for s3 object storage
    #[argh(option, short = 's')]
    secret_key: String,

    /// s3 bucket name
    #[argh(option, short = 'b')]
    bucket_name: String,

    /// s3 object size, such as "10 MiB"
    #[argh(option, short = 'o')]
    object_size: String,

    /// elastic cluster url
    #[argh(option, short = 'u')]
    elastic_url: String,

    /// number of objects to put/get
    #[argh(option, short = 'n')]
    num_objects: usize,

    /// workload running on s3: read or write
    #[argh(option, short = 'w')]
    workload: Workload,

    /// path to the YAML settings file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,
}

impl Args {
    fn into_config(self, settings: &Settings) -> BenchmarkConfig {
        BenchmarkConfig {
            endpoint_url: self.endpoint_url,
            access_key: self.access_key,
            secret_key: SecretString::from(self.secret_key),
            bucket_name: self.bucket_name,
            object_size: self.object_size,
            elastic_url: self.elastic_url,
            num_objects: self.num_objects,
            workload: self.workload,
            concurrency: settings.concurrency,
            source: resolve_source(settings),
        }
    }
}

/// Returns the configured source, falling back to the hostname.
fn resolve_source(settings: &Settings) -> String {
    if let Some(source) = &settings.source {
        return source.clone();
    }

    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to determine hostname");
            "unknown".to_owned()
        }
    }
}

/// Bootstrap the runtime and execute the benchmark.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    let settings = Settings::load(args.config.as_deref())?;
    observability::init_tracing(&settings.logging);
    tracing::debug!(?settings);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("main-rt")
        .enable_all()
        .build()?;

    let summary = runtime.block_on(run(args.into_config(&settings), &settings))?;
    tracing::info!(
        workload = %summary.workload,
        operations = summary.operations,
        index = INDEX_NAME,
        "Benchmark finished"
    );

    Ok(())
}

async fn run(config: BenchmarkConfig, settings: &Settings) -> Result<RunSummary> {
    tracing::info!(
        endpoint = %config.endpoint_url,
        bucket = %config.bucket_name,
        workload = %config.workload,
        num_objects = config.num_objects,
        "Starting benchmark"
    );

    let storage = S3CompatibleStorage::new(S3CompatibleConfig {
        endpoint: config.endpoint_url.clone(),
        region: settings.region.clone(),
        access_key: config.access_key.clone(),
        secret_key: SecretString::from(config.secret_key.expose_secret().to_owned()),
        path_style: settings.path_style,
        request_timeout: settings.request_timeout,
    })
    .context("failed to configure object storage")?;

    let sink = ElasticsearchSink::new(&config.elastic_url, settings.request_timeout)
        .context("failed to configure metrics index")?;

    let runner = BenchmarkRunner::new(
        config,
        Arc::new(storage),
        MetricsRecorder::new(Arc::new(sink)),
    );
    let summary = runner.run().await.context("benchmark aborted")?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: &[&str] = &[
        "-e",
        "http://localhost:9000",
        "-a",
        "access",
        "-s",
        "secret",
        "-b",
        "bench",
        "-o",
        "10 KiB",
        "-u",
        "http://localhost:9200",
        "-n",
        "3",
    ];

    fn parse(extra: &[&str]) -> Result<Args, argh::EarlyExit> {
        let args: Vec<&str> = REQUIRED.iter().chain(extra).copied().collect();
        Args::from_args(&["s3perf"], &args)
    }

    #[test]
    fn parses_all_flags() {
        let args = parse(&["-w", "write", "-c", "settings.yaml"]).unwrap();

        assert_eq!(args.endpoint_url, "http://localhost:9000");
        assert_eq!(args.object_size, "10 KiB");
        assert_eq!(args.num_objects, 3);
        assert_eq!(args.workload, Workload::Write);
        assert_eq!(args.config, Some(PathBuf::from("settings.yaml")));
    }

    #[test]
    fn rejects_unknown_workload() {
        let exit = parse(&["-w", "delete"]).unwrap_err();
        assert!(exit.status.is_err());
        assert!(exit.output.contains("delete"));
    }

    #[test]
    fn workload_is_required() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn builds_config() {
        let settings = Settings {
            source: Some("bench-01".into()),
            ..Default::default()
        };
        let config = parse(&["--workload", "read"])
            .unwrap()
            .into_config(&settings);

        assert_eq!(config.workload, Workload::Read);
        assert_eq!(config.source, "bench-01");
        assert_eq!(config.concurrency.get(), 1);
        assert_eq!(config.secret_key.expose_secret(), "secret");
        assert!(!format!("{config:?}").contains("\"secret\""));
    }

    #[test]
    fn source_defaults_to_hostname() {
        let source = resolve_source(&Settings::default());
        assert!(!source.is_empty());
    }
}
