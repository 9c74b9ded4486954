//! In-memory health data store.
//!
//! Holds mindful records in process memory, optionally loaded from a JSON
//! export. The user's authorization decision is part of the store state, so
//! asking for access never blocks on a prompt.

use crate::error::StoreError;
use crate::store::types::{MindfulRecord, RecordTypeHandle, RecordTypeId, SampleQuery, SortOrder};
use crate::store::HealthStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

/// How the user answers a read authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authorization {
    #[default]
    Granted,
    Denied,
}

/// Number of calls made against a store, per capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCalls {
    pub availability_checks: u64,
    pub type_resolutions: u64,
    pub authorization_requests: u64,
    pub queries: u64,
}

impl StoreCalls {
    /// Total number of calls of any kind.
    pub fn total(&self) -> u64 {
        self.availability_checks + self.type_resolutions + self.authorization_requests + self.queries
    }
}

/// On-disk format of a records file.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default = "default_available")]
    data_available: bool,
    #[serde(default)]
    authorization: Authorization,
    #[serde(default)]
    records: Vec<MindfulRecord>,
}

fn default_available() -> bool {
    true
}

/// A health data store backed by a vector of records.
#[derive(Debug)]
pub struct InMemoryStore {
    data_available: bool,
    authorization: Authorization,
    supported_types: Vec<RecordTypeId>,
    records: RwLock<Vec<MindfulRecord>>,
    granted: AtomicBool,
    availability_checks: AtomicU64,
    type_resolutions: AtomicU64,
    authorization_requests: AtomicU64,
    queries: AtomicU64,
}

impl InMemoryStore {
    /// Create an available store that grants access and holds `records`.
    pub fn new(records: Vec<MindfulRecord>) -> Self {
        Self {
            data_available: true,
            authorization: Authorization::Granted,
            supported_types: vec![RecordTypeId::mindful_session()],
            records: RwLock::new(records),
            granted: AtomicBool::new(false),
            availability_checks: AtomicU64::new(0),
            type_resolutions: AtomicU64::new(0),
            authorization_requests: AtomicU64::new(0),
            queries: AtomicU64::new(0),
        }
    }

    /// Set whether the store reports health data as available.
    pub fn with_availability(mut self, available: bool) -> Self {
        self.data_available = available;
        self
    }

    /// Set how authorization requests are answered.
    pub fn with_authorization(mut self, authorization: Authorization) -> Self {
        self.authorization = authorization;
        self
    }

    /// Restrict the record types this store can resolve.
    pub fn with_supported_types(mut self, types: Vec<RecordTypeId>) -> Self {
        self.supported_types = types;
        self
    }

    /// Load a store from a JSON records file.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Backend(format!("Failed to read {path:?}: {e}")))?;
        Self::from_json(&content)
    }

    /// Parse a store from JSON text.
    pub fn from_json(content: &str) -> Result<Self, StoreError> {
        let file: StoreFile =
            serde_json::from_str(content).map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(Self::new(file.records)
            .with_availability(file.data_available)
            .with_authorization(file.authorization))
    }

    /// Add a record, as another app writing to the store would.
    pub fn insert(&self, record: MindfulRecord) {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Check if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of how many calls each capability has received.
    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            availability_checks: self.availability_checks.load(Ordering::Relaxed),
            type_resolutions: self.type_resolutions.load(Ordering::Relaxed),
            authorization_requests: self.authorization_requests.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
        }
    }

    fn handle_for(id: &RecordTypeId) -> RecordTypeHandle {
        RecordTypeHandle::new(format!("memory:{id}"))
    }

    fn is_known(&self, handle: &RecordTypeHandle) -> bool {
        self.supported_types
            .iter()
            .any(|id| Self::handle_for(id) == *handle)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl HealthStore for InMemoryStore {
    async fn is_data_available(&self) -> bool {
        self.availability_checks.fetch_add(1, Ordering::Relaxed);
        self.data_available
    }

    async fn resolve_record_type(&self, id: &RecordTypeId) -> Option<RecordTypeHandle> {
        self.type_resolutions.fetch_add(1, Ordering::Relaxed);
        self.supported_types
            .contains(id)
            .then(|| Self::handle_for(id))
    }

    async fn request_authorization(&self, read: &[RecordTypeHandle]) -> Result<bool, StoreError> {
        self.authorization_requests.fetch_add(1, Ordering::Relaxed);

        if let Some(unknown) = read.iter().find(|h| !self.is_known(h)) {
            return Err(StoreError::UnknownRecordType(unknown.as_str().to_string()));
        }

        let granted = self.authorization == Authorization::Granted;
        if granted {
            self.granted.store(true, Ordering::SeqCst);
        }
        Ok(granted)
    }

    async fn execute_query(
        &self,
        query: SampleQuery,
    ) -> Result<Option<Vec<MindfulRecord>>, StoreError> {
        self.queries.fetch_add(1, Ordering::Relaxed);

        if !self.is_known(&query.record_type) {
            return Err(StoreError::UnknownRecordType(
                query.record_type.as_str().to_string(),
            ));
        }
        if !self.granted.load(Ordering::SeqCst) {
            return Err(StoreError::NotAuthorized);
        }

        let mut selected: Vec<MindfulRecord> = self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| query.selects(r))
            .cloned()
            .collect();

        match query.sort {
            Some(SortOrder::StartAscending) => selected.sort_by_key(|r| r.start),
            Some(SortOrder::StartDescending) => {
                selected.sort_by_key(|r| std::cmp::Reverse(r.start))
            }
            None => {}
        }
        selected.truncate(query.limit);

        Ok(Some(selected))
    }
}
