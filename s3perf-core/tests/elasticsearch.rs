//! Blackbox tests for recording measurements over the Elasticsearch REST API.

use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::Result;
use s3perf_core::error::{Error, RecordingError};
use s3perf_core::metrics::{
    ElasticsearchSink, INDEX_NAME, MetricsRecorder, MetricsSink, index_mapping,
};
use s3perf_core::record::MeasurementRecord;
use s3perf_core::storage::InMemoryStorage;
use s3perf_core::{BenchmarkConfig, BenchmarkRunner, Workload};
use s3perf_test::index::TestIndexServer;
use secrecy::SecretString;
use serde_json::json;

fn make_recorder(server: &TestIndexServer) -> Result<MetricsRecorder> {
    let sink = ElasticsearchSink::new(&server.base_url(), None)?;
    Ok(MetricsRecorder::new(Arc::new(sink)))
}

#[tokio::test]
async fn test_index_exists() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestIndexServer::new().await;
    let sink = ElasticsearchSink::new(&server.base_url(), None)?;

    assert!(!sink.index_exists(INDEX_NAME).await?);
    server.insert_index(INDEX_NAME, json!({}));
    assert!(sink.index_exists(INDEX_NAME).await?);

    Ok(())
}

#[tokio::test]
async fn test_ensure_index_creates_mapping_once() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestIndexServer::new().await;
    let recorder = make_recorder(&server)?;

    recorder.ensure_index(INDEX_NAME, &index_mapping()).await?;
    recorder.ensure_index(INDEX_NAME, &index_mapping()).await?;

    assert_eq!(server.create_requests(), 1);
    assert_eq!(
        server.mapping(INDEX_NAME),
        Some(json!({
            "mappings": { "properties": { "timestamp": { "type": "date" } } }
        }))
    );

    Ok(())
}

#[tokio::test]
async fn test_ensure_index_across_recorders() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestIndexServer::new().await;

    // A second run finds the index of the first one.
    make_recorder(&server)?
        .ensure_index(INDEX_NAME, &index_mapping())
        .await?;
    make_recorder(&server)?
        .ensure_index(INDEX_NAME, &index_mapping())
        .await?;

    assert_eq!(server.create_requests(), 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_creation_is_tolerated() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestIndexServer::new().await;
    let sink = ElasticsearchSink::new(&server.base_url(), None)?;

    sink.create_index(INDEX_NAME, &index_mapping()).await?;
    sink.create_index(INDEX_NAME, &index_mapping()).await?;

    assert_eq!(server.create_requests(), 2);
    Ok(())
}

#[tokio::test]
async fn test_record_document_shape() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestIndexServer::new().await;
    let recorder = make_recorder(&server)?;

    let record = MeasurementRecord {
        latency: 7.25,
        timestamp: 1_700_000_000_123,
        workload: Workload::Write,
        size: 10240,
        object_name: "0b6c3c6e-3f7c-4f0e-9d55-6f3cd1a7d7f4".into(),
        source: "bench-01".into(),
    };
    recorder.record(&record).await?;

    assert_eq!(
        server.documents(INDEX_NAME),
        vec![json!({
            "latency": 7.25,
            "timestamp": 1_700_000_000_123i64,
            "workload": "write",
            "size": 10240,
            "object_name": "0b6c3c6e-3f7c-4f0e-9d55-6f3cd1a7d7f4",
            "source": "bench-01",
        })]
    );
    Ok(())
}

#[tokio::test]
async fn test_rejected_document() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestIndexServer::new().await;
    let recorder = make_recorder(&server)?;
    server.reject_documents();

    let record = MeasurementRecord::new(1.0, Workload::Read, 1, "obj".into(), "host");
    let err = recorder.record(&record).await.unwrap_err();

    match err {
        RecordingError::UnexpectedStatus { status, body, .. } => {
            assert_eq!(status, 503);
            assert!(body.contains("cluster_block_exception"));
        }
        err => panic!("unexpected error: {err}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_unreachable_cluster() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestIndexServer::new().await;
    let url = server.base_url();
    drop(server);
    // give the aborted server task a moment to release the socket
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let sink = ElasticsearchSink::new(&url, None)?;
    let err = sink.index_exists(INDEX_NAME).await.unwrap_err();
    assert!(matches!(err, RecordingError::Reqwest { .. }));

    Ok(())
}

#[tokio::test]
async fn test_write_run_end_to_end() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestIndexServer::new().await;
    let storage = InMemoryStorage::new();

    let config = BenchmarkConfig {
        endpoint_url: "http://localhost:9000".into(),
        access_key: "access".into(),
        secret_key: SecretString::from("secret".to_owned()),
        bucket_name: "e2e".into(),
        object_size: "10 KiB".into(),
        elastic_url: server.base_url(),
        num_objects: 3,
        workload: Workload::Write,
        concurrency: NonZeroUsize::MIN,
        source: "e2e-host".into(),
    };
    let runner = BenchmarkRunner::new(config, Arc::new(storage.clone()), make_recorder(&server)?);

    let summary = runner.run().await?;

    assert_eq!(summary.operations, 3);
    assert_eq!(storage.calls().put, 3);
    assert_eq!(storage.calls().create_bucket, 1);

    let documents = server.documents(INDEX_NAME);
    assert_eq!(documents.len(), 3);
    for document in documents {
        assert_eq!(document["size"], 10240);
        assert_eq!(document["workload"], "write");
        assert_eq!(document["source"], "e2e-host");
        assert!(document["timestamp"].is_i64());

        let name = document["object_name"].as_str().unwrap();
        assert_eq!(storage.stored("e2e", name).map(|b| b.len()), Some(10240));
    }

    Ok(())
}

#[tokio::test]
async fn test_read_run_stops_on_rejected_document() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestIndexServer::new().await;
    server.reject_documents();

    let storage = InMemoryStorage::new();
    storage.insert("e2e", "a", vec![1u8; 4]);
    storage.insert("e2e", "b", vec![1u8; 8]);

    let config = BenchmarkConfig {
        endpoint_url: "http://localhost:9000".into(),
        access_key: "access".into(),
        secret_key: SecretString::from("secret".to_owned()),
        bucket_name: "e2e".into(),
        object_size: "1 KiB".into(),
        elastic_url: server.base_url(),
        num_objects: 5,
        workload: Workload::Read,
        concurrency: NonZeroUsize::MIN,
        source: "e2e-host".into(),
    };
    let runner = BenchmarkRunner::new(config, Arc::new(storage.clone()), make_recorder(&server)?);

    let err = runner.run().await.unwrap_err();

    assert!(matches!(err, Error::Recording(_)));
    assert_eq!(storage.calls().get, 1);
    Ok(())
}
