//! Store for configurations without any health data.
//!
//! Devices without a health store (and builds with no backend configured)
//! still need something to hand the service; this reports unavailability.

use crate::error::StoreError;
use crate::store::types::{MindfulRecord, RecordTypeHandle, RecordTypeId, SampleQuery};
use crate::store::HealthStore;
use async_trait::async_trait;

/// A store that never has data.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl UnavailableStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HealthStore for UnavailableStore {
    async fn is_data_available(&self) -> bool {
        false
    }

    async fn resolve_record_type(&self, _id: &RecordTypeId) -> Option<RecordTypeHandle> {
        None
    }

    async fn request_authorization(
        &self,
        _read: &[RecordTypeHandle],
    ) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn execute_query(
        &self,
        _query: SampleQuery,
    ) -> Result<Option<Vec<MindfulRecord>>, StoreError> {
        Err(StoreError::Unavailable)
    }
}
