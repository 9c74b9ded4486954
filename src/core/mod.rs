//! Core aggregation logic.
//!
//! This module contains:
//! - Time windows bounding a query (including "today")
//! - Reduction of records into whole minutes
//! - The staged authorization/query pipeline

pub mod aggregate;
pub mod pipeline;
pub mod window;

// Re-export commonly used types
pub use aggregate::{total_elapsed_secs, total_minutes};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineStage};
pub use window::TimeWindow;
