//! Orchestration of a benchmark run.
//!
//! A run moves through `Init -> Prepared -> Running -> Done`. [`BenchmarkRunner::prepare`] takes it
//! to `Prepared`: the size is validated, the write payload is generated, and the metrics index and
//! the bucket are created if missing. [`PreparedRun::run`] then performs the workload and finishes
//! the run. Nothing created along the way is cleaned up.
//!
//! Every storage operation is timed and turned into a [`MeasurementRecord`] as soon as it
//! completes. The first failing operation aborts the run. Records written until then stay in the
//! index.

use bytes::Bytes;
use futures_util::{StreamExt, TryStreamExt, stream};

use crate::config::{BenchmarkConfig, Workload};
use crate::error::{Error, Result};
use crate::metrics::{MetricsRecorder, index_mapping};
use crate::naming::ObjectNamer;
use crate::payload;
use crate::record::MeasurementRecord;
use crate::storage::{BoxedStorage, ListedObject};
use crate::timing;

/// Runs a configured workload against object storage and records every measurement.
#[derive(Debug)]
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
    storage: BoxedStorage,
    recorder: MetricsRecorder,
    namer: ObjectNamer,
}

/// A run whose index, bucket and payload are in place.
#[derive(Debug)]
pub struct PreparedRun {
    runner: BenchmarkRunner,
    plan: Plan,
}

#[derive(Debug)]
enum Plan {
    Write { payload: Bytes },
    Read,
}

/// The outcome of a completed run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunSummary {
    pub workload: Workload,
    /// Number of operations that were performed and recorded.
    pub operations: usize,
}

impl BenchmarkRunner {
    /// Creates a runner in its initial state.
    pub fn new(config: BenchmarkConfig, storage: BoxedStorage, recorder: MetricsRecorder) -> Self {
        Self {
            config,
            storage,
            recorder,
            namer: ObjectNamer::new(),
        }
    }

    /// Prepares and performs the whole run.
    pub async fn run(self) -> Result<RunSummary> {
        self.prepare().await?.run().await
    }

    /// Moves the run from `Init` to `Prepared`.
    ///
    /// The object size is validated before any backend is contacted, even for reads.
    pub async fn prepare(self) -> Result<PreparedRun> {
        let size = payload::parse_size(&self.config.object_size)?;
        let plan = match self.config.workload {
            Workload::Write => Plan::Write {
                payload: payload::generate(&self.config.object_size)?,
            },
            Workload::Read => Plan::Read,
        };

        self.recorder
            .ensure_index(self.recorder.index(), &index_mapping())
            .await?;

        let bucket = self.config.bucket_name.as_str();
        if !self.storage.bucket_exists(bucket).await? {
            tracing::info!(%bucket, "Creating bucket");
            self.storage.create_bucket(bucket).await?;
        }

        tracing::debug!(
            workload = %self.config.workload,
            object_size = size,
            storage = self.storage.name(),
            "Benchmark prepared"
        );
        Ok(PreparedRun { runner: self, plan })
    }

    async fn write_object(&self, payload: &Bytes) -> Result<()> {
        let object_name = self.namer.next_name();
        let put = self
            .storage
            .put(&self.config.bucket_name, &object_name, payload.clone());

        let (result, latency) = timing::time_operation(put).await;
        if let Err(err) = result {
            tracing::error!(%object_name, latency_ms = latency, "Write failed");
            return Err(err.into());
        }

        let record = MeasurementRecord::new(
            latency,
            Workload::Write,
            payload.len() as u64,
            object_name,
            &self.config.source,
        );
        self.recorder.record(&record).await?;
        Ok(())
    }

    async fn read_object(&self, object: ListedObject) -> Result<()> {
        let get = self.storage.get(&self.config.bucket_name, &object.name);

        let (result, latency) = timing::time_operation(get).await;
        if let Err(err) = result {
            tracing::error!(object_name = %object.name, latency_ms = latency, "Read failed");
            return Err(err.into());
        }

        let record = MeasurementRecord::new(
            latency,
            Workload::Read,
            object.size,
            object.name,
            &self.config.source,
        );
        self.recorder.record(&record).await?;
        Ok(())
    }
}

impl PreparedRun {
    /// The workload this run will perform.
    pub fn workload(&self) -> Workload {
        self.runner.config.workload
    }

    /// Performs the workload and finishes the run.
    pub async fn run(self) -> Result<RunSummary> {
        let runner = &self.runner;
        let concurrency = runner.config.concurrency.get();
        tracing::debug!(
            workload = %self.workload(),
            concurrency = concurrency,
            "Benchmark running"
        );

        let operations = match &self.plan {
            Plan::Write { payload } => {
                let count = runner.config.num_objects;
                stream::iter(0..count)
                    .map(Ok::<_, Error>)
                    .try_for_each_concurrent(concurrency, |_| runner.write_object(payload))
                    .await?;
                count
            }
            Plan::Read => {
                let listed = runner
                    .storage
                    .list(&runner.config.bucket_name, runner.config.num_objects)
                    .await?;
                let count = listed.len();
                stream::iter(listed)
                    .map(Ok::<_, Error>)
                    .try_for_each_concurrent(concurrency, |object| runner.read_object(object))
                    .await?;
                count
            }
        };

        let summary = RunSummary {
            workload: self.workload(),
            operations,
        };
        tracing::debug!(?summary, "Benchmark done");
        Ok(summary)
    }
}
