//! In-memory indexing backend for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::{MetricsSink, RecordingResult};
use crate::error::RecordingError;

/// Number of calls made to each sink operation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SinkCalls {
    pub index_exists: usize,
    pub create_index: usize,
    pub index_document: usize,
}

#[derive(Debug, Default)]
struct State {
    mappings: HashMap<String, Value>,
    documents: Vec<(String, Value)>,
    calls: SinkCalls,
    fail_documents_after: Option<usize>,
}

/// A [`MetricsSink`] that keeps all indexes and documents in memory.
///
/// Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct InMemorySink {
    state: Arc<Mutex<State>>,
}

impl InMemorySink {
    /// Creates a sink without any indexes.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Creates an index directly. This is not counted as a call.
    pub fn insert_index(&self, index: &str, mapping: Value) {
        self.state().mappings.insert(index.to_owned(), mapping);
    }

    /// Returns the mapping an index was created with.
    pub fn mapping(&self, index: &str) -> Option<Value> {
        self.state().mappings.get(index).cloned()
    }

    /// Returns all documents written to the index, in write order.
    pub fn documents(&self, index: &str) -> Vec<Value> {
        self.state()
            .documents
            .iter()
            .filter(|(name, _)| name == index)
            .map(|(_, document)| document.clone())
            .collect()
    }

    /// Returns how often each operation has been called so far.
    pub fn calls(&self) -> SinkCalls {
        self.state().calls
    }

    /// Rejects every document after the first `successes` writes.
    pub fn fail_documents_after(&self, successes: usize) {
        self.state().fail_documents_after = Some(successes);
    }
}

#[async_trait::async_trait]
impl MetricsSink for InMemorySink {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn index_exists(&self, index: &str) -> RecordingResult<bool> {
        let mut state = self.state();
        state.calls.index_exists += 1;
        Ok(state.mappings.contains_key(index))
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> RecordingResult<()> {
        let mut state = self.state();
        state.calls.create_index += 1;
        state
            .mappings
            .entry(index.to_owned())
            .or_insert_with(|| mapping.clone());
        Ok(())
    }

    async fn index_document(&self, index: &str, document: &Value) -> RecordingResult<()> {
        let mut state = self.state();
        state.calls.index_document += 1;
        if state
            .fail_documents_after
            .is_some_and(|n| state.calls.index_document > n)
        {
            return Err(RecordingError::UnexpectedStatus {
                context: format!("failed to index document into `{index}`"),
                status: 503,
                body: String::new(),
            });
        }

        state.documents.push((index.to_owned(), document.clone()));
        Ok(())
    }
}
