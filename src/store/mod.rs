//! Health data store abstraction for the mindful minutes service.
//!
//! The service never talks to a concrete platform. It calls through the
//! [`HealthStore`] trait, which any backend (in-memory, remote gateway,
//! or a test fake) can implement.

pub mod memory;
pub mod types;
pub mod unavailable;

#[cfg(feature = "remote")]
pub mod remote;

use crate::error::StoreError;
use async_trait::async_trait;

// Re-export commonly used types
pub use memory::{Authorization, InMemoryStore, StoreCalls};
pub use types::{
    MindfulRecord, RecordTypeHandle, RecordTypeId, SampleQuery, SortOrder, MINDFUL_SESSION,
    NO_LIMIT,
};
pub use unavailable::UnavailableStore;

#[cfg(feature = "remote")]
pub use remote::{RemoteStore, RemoteStoreConfig};

/// Capabilities the aggregation pipeline needs from a health data store.
#[async_trait]
pub trait HealthStore: Send + Sync {
    /// Whether this device/configuration can supply health data at all.
    async fn is_data_available(&self) -> bool;

    /// Resolve a record type identifier into a store handle.
    ///
    /// `None` means the store does not know the type (platform/version mismatch).
    async fn resolve_record_type(&self, id: &RecordTypeId) -> Option<RecordTypeHandle>;

    /// Ask for read access to the given record types.
    ///
    /// `Ok(false)` means the user denied access.
    async fn request_authorization(&self, read: &[RecordTypeHandle]) -> Result<bool, StoreError>;

    /// Run a sample query.
    ///
    /// `Ok(None)` means the store produced no result container at all, which
    /// is distinct from an empty one.
    async fn execute_query(
        &self,
        query: SampleQuery,
    ) -> Result<Option<Vec<MindfulRecord>>, StoreError>;
}
