use s3::error::S3Error;
use thiserror::Error;

/// Errors raised by the object storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Errors returned by the S3 client, which covers network failures as well as error responses
    /// from the endpoint (authentication, missing buckets, capacity).
    #[error("s3 error: {context}")]
    S3 {
        context: String,
        #[source]
        cause: S3Error,
    },

    /// The endpoint answered, but with a status code that does not indicate success.
    #[error("{context}: unexpected status code {status}")]
    UnexpectedStatus { context: String, status: u16 },

    /// Any other error stemming from a storage backend.
    #[error("storage backend error: {context}")]
    Generic {
        context: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    pub(crate) fn s3(context: impl Into<String>) -> impl FnOnce(S3Error) -> Self {
        let context = context.into();
        move |cause| Self::S3 { context, cause }
    }
}

/// Errors raised by the metrics indexing backend.
#[derive(Debug, Error)]
pub enum RecordingError {
    /// Network or protocol errors from the HTTP client.
    #[error("reqwest error: {context}")]
    Reqwest {
        context: String,
        #[source]
        cause: reqwest::Error,
    },

    /// The indexing backend rejected the request.
    #[error("{context}: unexpected status code {status}: {body}")]
    UnexpectedStatus {
        context: String,
        status: u16,
        body: String,
    },

    /// A record could not be serialized into a document.
    #[error("serde error: {context}")]
    Serde {
        context: String,
        #[source]
        cause: serde_json::Error,
    },
}

impl RecordingError {
    pub(crate) fn reqwest(context: impl Into<String>) -> impl FnOnce(reqwest::Error) -> Self {
        let context = context.into();
        move |cause| Self::Reqwest { context, cause }
    }
}

/// Errors that abort a benchmark run.
#[derive(Debug, Error)]
pub enum Error {
    /// The object size could not be parsed into a byte count.
    #[error("invalid object size `{spec}`: {reason}")]
    InvalidSizeSpec { spec: String, reason: String },

    /// An object storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Writing a measurement to the indexing backend failed.
    #[error("recording error: {0}")]
    Recording(#[from] RecordingError),
}

/// Result type for benchmark operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
