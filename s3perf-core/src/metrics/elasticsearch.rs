//! An indexing backend speaking the Elasticsearch (and OpenSearch) REST API.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde_json::Value;

use super::{MetricsSink, RecordingResult};
use crate::USER_AGENT;
use crate::error::RecordingError;

/// Error type reported when creating an index that was created concurrently.
const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// Writes documents to an Elasticsearch cluster over HTTP.
#[derive(Debug)]
pub struct ElasticsearchSink {
    client: reqwest::Client,
    base_url: String,
}

impl ElasticsearchSink {
    /// Creates a sink for the cluster at `url`, such as `http://localhost:9200`.
    pub fn new(url: &str, request_timeout: Option<Duration>) -> RecordingResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(RecordingError::reqwest("failed to build HTTP client"))?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

async fn unexpected_status(context: String, response: Response) -> RecordingError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    RecordingError::UnexpectedStatus {
        context,
        status,
        body,
    }
}

#[async_trait::async_trait]
impl MetricsSink for ElasticsearchSink {
    fn name(&self) -> &'static str {
        "elasticsearch"
    }

    #[tracing::instrument(level = "trace", fields(%index), skip_all)]
    async fn index_exists(&self, index: &str) -> RecordingResult<bool> {
        let context = || format!("failed to check index `{index}`");
        let response = self
            .client
            .head(self.url(index))
            .send()
            .await
            .map_err(RecordingError::reqwest(context()))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(unexpected_status(context(), response).await),
        }
    }

    #[tracing::instrument(level = "trace", fields(%index), skip_all)]
    async fn create_index(&self, index: &str, mapping: &Value) -> RecordingResult<()> {
        let context = || format!("failed to create index `{index}`");
        let response = self
            .client
            .put(self.url(index))
            .json(mapping)
            .send()
            .await
            .map_err(RecordingError::reqwest(context()))?;

        if response.status().is_success() {
            return Ok(());
        }

        match unexpected_status(context(), response).await {
            RecordingError::UnexpectedStatus {
                status: 400, body, ..
            } if body.contains(ALREADY_EXISTS) => {
                tracing::debug!("Index was created concurrently");
                Ok(())
            }
            err => Err(err),
        }
    }

    #[tracing::instrument(level = "trace", fields(%index), skip_all)]
    async fn index_document(&self, index: &str, document: &Value) -> RecordingResult<()> {
        let context = || format!("failed to index document into `{index}`");
        let response = self
            .client
            .post(self.url(&format!("{index}/_doc")))
            .json(document)
            .send()
            .await
            .map_err(RecordingError::reqwest(context()))?;

        if !response.status().is_success() {
            return Err(unexpected_status(context(), response).await);
        }
        Ok(())
    }
}
