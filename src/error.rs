//! Error taxonomy for mindful minute aggregation.

use serde::{Deserialize, Serialize};

/// Why no minute total could be produced.
///
/// Every variant is terminal: the service never retries internally, it only
/// classifies the failure so the caller can decide what to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MindfulError {
    /// The store reports that health data is not available on this device
    /// (e.g. a form factor without a health store).
    DataUnavailable,
    /// Read permission for mindful sessions was denied or never granted.
    NotAuthorized,
    /// The query ran but no usable result container came back.
    NoSamples,
    /// The mindful session record type could not be resolved by the store.
    PlatformError,
}

impl MindfulError {
    /// All error kinds, in pipeline order.
    pub const ALL: [MindfulError; 4] = [
        MindfulError::DataUnavailable,
        MindfulError::PlatformError,
        MindfulError::NotAuthorized,
        MindfulError::NoSamples,
    ];

    /// Whether the user can fix this without changing device or platform version.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(self, MindfulError::NotAuthorized)
    }

    /// Stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MindfulError::DataUnavailable => "data_unavailable",
            MindfulError::NotAuthorized => "not_authorized",
            MindfulError::NoSamples => "no_samples",
            MindfulError::PlatformError => "platform_error",
        }
    }
}

impl std::fmt::Display for MindfulError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MindfulError::DataUnavailable => write!(f, "Health data is not available"),
            MindfulError::NotAuthorized => {
                write!(f, "Not authorized to read mindful sessions")
            }
            MindfulError::NoSamples => write!(f, "No samples were returned by the store"),
            MindfulError::PlatformError => {
                write!(f, "The store could not resolve the mindful session type")
            }
        }
    }
}

impl std::error::Error for MindfulError {}

/// Result of one aggregation: whole minutes, or the reason there are none.
pub type AggregationResult = Result<u64, MindfulError>;

/// Errors reported by a [`HealthStore`](crate::store::HealthStore) backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store has no health data at all
    Unavailable,
    /// The caller has not been granted read access
    NotAuthorized,
    /// The record type handle is not known to the store
    UnknownRecordType(String),
    /// Network/transport failure talking to the store
    Network(String),
    /// The store answered with an error status
    Server { status: u16, message: String },
    /// The store answered with something we could not decode
    Serialization(String),
    /// Any other backend failure
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable => write!(f, "Store unavailable"),
            StoreError::NotAuthorized => write!(f, "Store access not authorized"),
            StoreError::UnknownRecordType(t) => write!(f, "Unknown record type: {t}"),
            StoreError::Network(msg) => write!(f, "Store network error: {msg}"),
            StoreError::Server { status, message } => {
                write!(f, "Store server error ({status}): {message}")
            }
            StoreError::Serialization(msg) => write!(f, "Store serialization error: {msg}"),
            StoreError::Backend(msg) => write!(f, "Store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}
