//! The availability → authorization → query → reduction pipeline.
//!
//! One [`Pipeline`] runs per invocation. It walks an explicit stage
//! sequence and stops at the first failure, so every failure branch maps to
//! exactly one [`MindfulError`].

use crate::core::aggregate::total_minutes;
use crate::core::window::TimeWindow;
use crate::error::{AggregationResult, MindfulError};
use crate::store::types::{RecordTypeId, SampleQuery};
use crate::store::HealthStore;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where a pipeline run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    CheckingAvailability,
    RequestingAuthorization,
    Querying,
    Done,
}

/// Outcome of a finished pipeline run, with the details the access log keeps.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub result: AggregationResult,
    /// Number of records the store returned (0 on failure)
    pub records_read: usize,
}

/// A single mindful minutes aggregation.
pub struct Pipeline {
    store: Arc<dyn HealthStore>,
    window: Option<TimeWindow>,
    stage: PipelineStage,
    request_id: Uuid,
}

impl Pipeline {
    pub fn new(store: Arc<dyn HealthStore>, window: Option<TimeWindow>) -> Self {
        Self {
            store,
            window,
            stage: PipelineStage::Idle,
            request_id: Uuid::new_v4(),
        }
    }

    /// Identifier used to correlate this run's log lines.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn advance(&mut self, next: PipelineStage) {
        debug!(request_id = %self.request_id, from = ?self.stage, to = ?next, "pipeline stage");
        self.stage = next;
    }

    fn fail(&mut self, error: MindfulError) -> PipelineOutcome {
        warn!(request_id = %self.request_id, stage = ?self.stage, %error, "aggregation failed");
        self.advance(PipelineStage::Done);
        PipelineOutcome {
            result: Err(error),
            records_read: 0,
        }
    }

    /// Run every stage to completion.
    pub async fn run(mut self) -> PipelineOutcome {
        self.advance(PipelineStage::CheckingAvailability);
        if !self.store.is_data_available().await {
            return self.fail(MindfulError::DataUnavailable);
        }

        self.advance(PipelineStage::RequestingAuthorization);
        let record_type = match self
            .store
            .resolve_record_type(&RecordTypeId::mindful_session())
            .await
        {
            Some(handle) => handle,
            None => return self.fail(MindfulError::PlatformError),
        };

        match self
            .store
            .request_authorization(std::slice::from_ref(&record_type))
            .await
        {
            Ok(true) => {}
            Ok(false) => return self.fail(MindfulError::NotAuthorized),
            Err(e) => {
                debug!(request_id = %self.request_id, error = %e, "authorization request failed");
                return self.fail(MindfulError::NotAuthorized);
            }
        }

        self.advance(PipelineStage::Querying);
        let query = SampleQuery::uncapped(record_type, self.window);
        let records = match self.store.execute_query(query).await {
            Ok(Some(records)) => records,
            Ok(None) => return self.fail(MindfulError::NoSamples),
            Err(e) => {
                debug!(request_id = %self.request_id, error = %e, "query failed");
                return self.fail(MindfulError::NoSamples);
            }
        };

        self.advance(PipelineStage::Done);
        if records.is_empty() {
            info!(request_id = %self.request_id, "no mindful sessions in range");
            return PipelineOutcome {
                result: Ok(0),
                records_read: 0,
            };
        }

        let minutes = total_minutes(&records);
        info!(
            request_id = %self.request_id,
            records = records.len(),
            minutes,
            "aggregated mindful minutes"
        );
        PipelineOutcome {
            result: Ok(minutes),
            records_read: records.len(),
        }
    }
}
