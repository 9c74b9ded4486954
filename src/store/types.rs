//! Record and query types shared by every store backend.
//!
//! These types describe only what the aggregation needs: when a mindful
//! session started and ended. Nothing else about the session is read.

use crate::core::window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query limit meaning "return every matching record".
pub const NO_LIMIT: usize = usize::MAX;

/// Identifier of the mindful session record type.
pub const MINDFUL_SESSION: &str = "mindful_session";

/// One mindful session as stored by the health data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindfulRecord {
    /// Store-assigned identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// When the session started
    pub start: DateTime<Utc>,
    /// When the session ended (assumed, not checked, to be >= start)
    pub end: DateTime<Utc>,
    /// App or device that wrote the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl MindfulRecord {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start,
            end,
            source: None,
        }
    }

    /// Elapsed time in seconds, keeping sub-second precision.
    pub fn elapsed_secs(&self) -> f64 {
        let elapsed = self.end - self.start;
        match elapsed.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0,
            None => elapsed.num_milliseconds() as f64 / 1000.0,
        }
    }
}

/// Textual record type identifier, resolved by the store into a handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordTypeId(String);

impl RecordTypeId {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// The mindful session type, the only one this crate ever reads.
    pub fn mindful_session() -> Self {
        Self::new(MINDFUL_SESSION)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque store token scoping queries and authorization to one record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordTypeHandle(String);

impl RecordTypeHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Sort order of query results.
///
/// Aggregation is order-independent, so the service never asks for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    StartAscending,
    StartDescending,
}

/// A sample query against one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleQuery {
    pub record_type: RecordTypeHandle,
    /// Records whose time range intersects this window; `None` selects all.
    pub window: Option<TimeWindow>,
    pub limit: usize,
    pub sort: Option<SortOrder>,
}

impl SampleQuery {
    /// Query every record of `record_type` intersecting `window`, uncapped and unsorted.
    pub fn uncapped(record_type: RecordTypeHandle, window: Option<TimeWindow>) -> Self {
        Self {
            record_type,
            window,
            limit: NO_LIMIT,
            sort: None,
        }
    }

    /// Check whether a record is selected by this query's predicate.
    pub fn selects(&self, record: &MindfulRecord) -> bool {
        match &self.window {
            Some(window) => window.intersects(record.start, record.end),
            None => true,
        }
    }
}
