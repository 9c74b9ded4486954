//! Transparency module for mindful minutes.
//!
//! Tracks and exposes how often health data was read and with what outcome.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
