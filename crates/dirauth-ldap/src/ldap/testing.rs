//! In-memory directory for tests

use crate::error::DirectoryError;
use crate::ldap::{DirectoryEntry, DirectorySession, SearchRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

type Response = Result<Vec<DirectoryEntry>, DirectoryError>;

/// Answers searches by exact filter string and records every request.
/// Unscripted filters match nothing.
#[derive(Default)]
pub(crate) struct MockDirectory {
    responses: Mutex<HashMap<String, Response>>,
    requests: Mutex<Vec<SearchRequest>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, filter: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.set(filter, entries);
        self
    }

    pub fn fail(self, filter: &str, error: DirectoryError) -> Self {
        self.responses.lock().insert(filter.to_string(), Err(error));
        self
    }

    /// Replace the entries returned for `filter`
    pub fn set(&self, filter: &str, entries: Vec<DirectoryEntry>) {
        self.responses.lock().insert(filter.to_string(), Ok(entries));
    }

    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DirectorySession for MockDirectory {
    async fn search(&self, request: SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let response = self
            .responses
            .lock()
            .get(&request.filter)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()));
        self.requests.lock().push(request);
        response
    }
}
