//! In-memory object storage for tests.
//!
//! The backend is [`Clone`], so tests can keep a handle for inspecting stored objects and call
//! counters while the runner owns another copy.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;

use super::{ListedObject, ObjectStorage, StorageResult};
use crate::error::StorageError;

/// Number of calls made to each storage operation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StorageCalls {
    pub bucket_exists: usize,
    pub create_bucket: usize,
    pub put: usize,
    pub get: usize,
    pub list: usize,
}

#[derive(Debug, Default)]
struct State {
    buckets: HashMap<String, BTreeMap<String, Bytes>>,
    calls: StorageCalls,
    fail_puts_after: Option<usize>,
    fail_gets_after: Option<usize>,
}

/// A [`ObjectStorage`] backed by a `HashMap` of buckets.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStorage {
    state: Arc<Mutex<State>>,
}

impl InMemoryStorage {
    /// Creates an empty storage without any buckets.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds an object directly, creating the bucket if needed. This is not counted as a call.
    pub fn insert(&self, bucket: &str, name: &str, contents: impl Into<Bytes>) {
        self.state()
            .buckets
            .entry(bucket.to_owned())
            .or_default()
            .insert(name.to_owned(), contents.into());
    }

    /// Creates an empty bucket directly. This is not counted as a call.
    pub fn insert_bucket(&self, bucket: &str) {
        self.state().buckets.entry(bucket.to_owned()).or_default();
    }

    /// Returns the contents of a stored object.
    pub fn stored(&self, bucket: &str, name: &str) -> Option<Bytes> {
        self.state().buckets.get(bucket)?.get(name).cloned()
    }

    /// Returns the number of objects in the bucket.
    pub fn object_count(&self, bucket: &str) -> usize {
        self.state().buckets.get(bucket).map_or(0, BTreeMap::len)
    }

    /// Returns how often each operation has been called so far.
    pub fn calls(&self) -> StorageCalls {
        self.state().calls
    }

    /// Makes every `put` after the first `successes` calls fail.
    pub fn fail_puts_after(&self, successes: usize) {
        self.state().fail_puts_after = Some(successes);
    }

    /// Makes every `get` after the first `successes` calls fail.
    pub fn fail_gets_after(&self, successes: usize) {
        self.state().fail_gets_after = Some(successes);
    }
}

fn missing_bucket(bucket: &str) -> StorageError {
    StorageError::UnexpectedStatus {
        context: format!("bucket `{bucket}` does not exist"),
        status: 404,
    }
}

fn injected_failure(context: String) -> StorageError {
    StorageError::UnexpectedStatus {
        context,
        status: 503,
    }
}

#[async_trait::async_trait]
impl ObjectStorage for InMemoryStorage {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn bucket_exists(&self, bucket: &str) -> StorageResult<bool> {
        let mut state = self.state();
        state.calls.bucket_exists += 1;
        Ok(state.buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> StorageResult<()> {
        let mut state = self.state();
        state.calls.create_bucket += 1;
        state.buckets.entry(bucket.to_owned()).or_default();
        Ok(())
    }

    async fn put(&self, bucket: &str, name: &str, payload: Bytes) -> StorageResult<()> {
        let mut state = self.state();
        state.calls.put += 1;
        if state.fail_puts_after.is_some_and(|n| state.calls.put > n) {
            return Err(injected_failure(format!("failed to put `{name}`")));
        }

        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| missing_bucket(bucket))?;
        objects.insert(name.to_owned(), payload);
        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> StorageResult<Bytes> {
        let mut state = self.state();
        state.calls.get += 1;
        if state.fail_gets_after.is_some_and(|n| state.calls.get > n) {
            return Err(injected_failure(format!("failed to get `{name}`")));
        }

        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| missing_bucket(bucket))?;
        objects
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::UnexpectedStatus {
                context: format!("object `{name}` does not exist"),
                status: 404,
            })
    }

    async fn list(&self, bucket: &str, max_keys: usize) -> StorageResult<Vec<ListedObject>> {
        let mut state = self.state();
        state.calls.list += 1;

        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| missing_bucket(bucket))?;
        Ok(objects
            .iter()
            .take(max_keys)
            .map(|(name, contents)| ListedObject {
                name: name.clone(),
                size: contents.len() as u64,
            })
            .collect())
    }
}
