//! Blackbox tests for listing objects through the S3 API.

use anyhow::Result;
use s3perf_core::ObjectStorage;
use s3perf_core::storage::{S3CompatibleConfig, S3CompatibleStorage};
use s3perf_test::storage::TestStorageServer;
use secrecy::SecretString;

const BUCKET: &str = "bench";

fn make_storage(server: &TestStorageServer) -> Result<S3CompatibleStorage> {
    let storage = S3CompatibleStorage::new(S3CompatibleConfig {
        endpoint: server.endpoint(),
        region: "us-east-1".into(),
        access_key: "access".into(),
        secret_key: SecretString::from("secret".to_owned()),
        path_style: true,
        request_timeout: None,
    })?;
    Ok(storage)
}

fn fill(server: &TestStorageServer, count: usize) {
    for i in 0..count {
        server.insert(BUCKET, &format!("object-{i:05}"), i as u64);
    }
}

#[tokio::test]
async fn test_list_follows_continuation_tokens() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestStorageServer::new().await;
    fill(&server, 2500);
    let storage = make_storage(&server)?;

    let listed = storage.list(BUCKET, 1200).await?;

    assert_eq!(server.list_requests(), 2);
    assert_eq!(listed.len(), 1200);
    assert_eq!(listed[0].name, "object-00000");
    assert_eq!(listed[999].name, "object-00999");
    assert_eq!(listed[1000].name, "object-01000");
    assert_eq!(listed[1199].name, "object-01199");
    assert_eq!(listed[1199].size, 1199);

    Ok(())
}

#[tokio::test]
async fn test_list_stops_on_last_page() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestStorageServer::new().await;
    fill(&server, 1500);
    let storage = make_storage(&server)?;

    let listed = storage.list(BUCKET, 5000).await?;

    assert_eq!(server.list_requests(), 2);
    assert_eq!(listed.len(), 1500);
    assert_eq!(listed[1499].name, "object-01499");

    Ok(())
}

#[tokio::test]
async fn test_list_small_bucket() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestStorageServer::new().await;
    fill(&server, 3);
    let storage = make_storage(&server)?;

    let listed = storage.list(BUCKET, 10).await?;

    assert_eq!(server.list_requests(), 1);
    let names: Vec<_> = listed.iter().map(|object| object.name.as_str()).collect();
    assert_eq!(names, ["object-00000", "object-00001", "object-00002"]);

    Ok(())
}

#[tokio::test]
async fn test_list_nothing_requested() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestStorageServer::new().await;
    fill(&server, 3);
    let storage = make_storage(&server)?;

    let listed = storage.list(BUCKET, 0).await?;

    assert!(listed.is_empty());
    assert_eq!(server.list_requests(), 0);

    Ok(())
}

#[tokio::test]
async fn test_list_missing_bucket() -> Result<()> {
    s3perf_test::tracing::init();
    let server = TestStorageServer::new().await;
    let storage = make_storage(&server)?;

    assert!(storage.list("missing", 10).await.is_err());

    Ok(())
}
