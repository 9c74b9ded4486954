//! Mindful Minutes - read-only aggregation of mindful session time.
//!
//! This library asks a health data store for permission to read mindful
//! session records, fetches every matching record (all time, or just today)
//! and reduces them to a total in whole minutes.
//!
//! # Access Guarantees
//!
//! - **Read only**: health data is never written or modified
//! - **One record type**: only mindful session start and end times are read
//! - **No caching**: every call queries the store afresh
//! - **Transparency**: every read is counted and auditable
//!
//! # Architecture
//!
//! ```text
//!  caller ──▶ MindfulService ──▶ Pipeline (one per call)
//!                                  │ 1. availability
//!                                  │ 2. resolve type + authorization
//!                                  │ 3. query ──▶ HealthStore (memory / remote / unavailable)
//!                                  │ 4. reduce to whole minutes
//!                                  ▼
//!                           DeliveryQueue thread ──▶ completion(result)
//!                                  │
//!                                  ▼
//!                           TransparencyLog (request + outcome counters)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mindful_minutes::{store::InMemoryStore, BlockingMindfulService};
//!
//! let store = Arc::new(InMemoryStore::default());
//! let service = BlockingMindfulService::new(store).expect("Failed to start service");
//!
//! match service.total_minutes_for_today() {
//!     Ok(minutes) => println!("{minutes} mindful minutes today"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod config;
pub mod core;
pub mod delivery;
pub mod error;
pub mod service;
pub mod store;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, Scope};
pub use crate::core::{total_minutes, Pipeline, PipelineStage, TimeWindow};
pub use delivery::{DeliveryError, DeliveryQueue};
pub use error::{AggregationResult, MindfulError, StoreError};
pub use service::{BlockingMindfulService, MindfulService, ServiceError};
pub use store::{HealthStore, InMemoryStore, MindfulRecord, UnavailableStore};
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

#[cfg(feature = "remote")]
pub use store::{RemoteStore, RemoteStoreConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Access declaration that can be displayed to users.
pub const ACCESS_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              MINDFUL MINUTES - ACCESS DECLARATION                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This tool totals the time you spent in mindful sessions.        ║
║                                                                  ║
║  ✓ WHAT WE READ:                                                 ║
║    • When each mindful session started and ended                 ║
║                                                                  ║
║  ✗ WHAT WE NEVER DO:                                             ║
║    • Write, change or delete any health data                     ║
║    • Read any other kind of health record                        ║
║    • Keep a copy of your sessions or totals                      ║
║    • Ask for permission again after you said no                  ║
║                                                                  ║
║  You can see how often your data was read anytime with:          ║
║    mindful-minutes stats                                         ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_declaration_contents() {
        assert!(ACCESS_DECLARATION.contains("ACCESS DECLARATION"));
        assert!(ACCESS_DECLARATION.contains("NEVER DO"));
        assert!(ACCESS_DECLARATION.contains("mindful session"));
    }
}
